/// Counters for the events received on one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    events: u64,
    final_transcripts: u64,
    errors: u64,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_event(&mut self) {
        self.events += 1;
    }

    pub(crate) fn record_final_transcript(&mut self) {
        self.final_transcripts += 1;
    }

    pub(crate) fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn final_transcripts(&self) -> u64 {
        self.final_transcripts
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }
}
