use anyhow::{Context, Result};
use async_trait::async_trait;
use interview_core::call_session::{
    CallSessionService, CallTarget, EventHandler, EventHub, HandlerId, StartRequest,
};
use interview_core::events::{EventKind, Role, SessionEvent, TranscriptMessage, TranscriptType};
use realtime_call::CallClient;
use realtime_call::types::{MessageRole, ServerEvent, StartCallEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// An adapter that implements the core `CallSessionService` trait for a
/// `realtime_call` client.
/// It is generic over `CallClient` so the underlying client can be mocked in
/// tests.
pub struct RealtimeAdapter<C: CallClient> {
    client: Mutex<C>,
    hub: Arc<EventHub>,
    pump: JoinHandle<()>,
}

impl RealtimeAdapter<realtime_call::Client> {
    pub async fn connect(config: realtime_call::Config) -> Result<Self> {
        let client = realtime_call::connect_with_config(1024, config)
            .await
            .context("Failed to connect to the call service")?;
        Self::new(client).await
    }
}

impl<C: CallClient> RealtimeAdapter<C> {
    /// Subscribes to the client's server events and starts forwarding them to
    /// registered handlers.
    pub async fn new(mut client: C) -> Result<Self> {
        let mut server_rx = client
            .server_events()
            .await
            .context("Failed to subscribe to server events")?;
        let hub = Arc::new(EventHub::new());
        let pump_hub = hub.clone();

        let pump = tokio::spawn(async move {
            loop {
                match server_rx.recv().await {
                    Ok(event) => {
                        let closed = matches!(event, ServerEvent::Close { .. });
                        if let Some(session_event) = to_session_event(event) {
                            pump_hub.emit(&session_event);
                        }
                        if closed {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("call event pump lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("server event channel closed, stopping pump");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            client: Mutex::new(client),
            hub,
            pump,
        })
    }
}

impl<C: CallClient> Drop for RealtimeAdapter<C> {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

fn to_role(role: MessageRole) -> Role {
    match role {
        MessageRole::User => Role::User,
        MessageRole::System => Role::System,
        MessageRole::Assistant => Role::Assistant,
    }
}

fn to_transcript_type(transcript_type: realtime_call::types::TranscriptType) -> TranscriptType {
    match transcript_type {
        realtime_call::types::TranscriptType::Partial => TranscriptType::Partial,
        realtime_call::types::TranscriptType::Final => TranscriptType::Final,
    }
}

/// Maps a wire event to the core's event vocabulary. A closed connection ends
/// the call.
fn to_session_event(event: ServerEvent) -> Option<SessionEvent> {
    match event {
        ServerEvent::CallStart => Some(SessionEvent::CallStart),
        ServerEvent::CallEnd => Some(SessionEvent::CallEnd),
        ServerEvent::Close { reason } => {
            tracing::info!("call connection closed: {:?}", reason);
            Some(SessionEvent::CallEnd)
        }
        ServerEvent::SpeechStart => Some(SessionEvent::SpeechStart),
        ServerEvent::SpeechEnd => Some(SessionEvent::SpeechEnd),
        ServerEvent::Message(data) => {
            let message = data.message();
            Some(SessionEvent::Message(TranscriptMessage {
                message_type: message.message_type().to_string(),
                transcript_type: message.transcript_type().map(to_transcript_type),
                role: message.role().map(to_role),
                transcript: message.text().map(str::to_string),
            }))
        }
        ServerEvent::Error(e) => {
            let error = e.error();
            match error.code() {
                Some(code) => Some(SessionEvent::Error(format!("{} ({})", error.message(), code))),
                None => Some(SessionEvent::Error(error.message().to_string())),
            }
        }
    }
}

fn to_start_event(request: StartRequest) -> Result<StartCallEvent> {
    let event = match request.target {
        CallTarget::Workflow(workflow_id) => StartCallEvent::workflow(&workflow_id),
        CallTarget::Assistant(assistant) => StartCallEvent::assistant(
            serde_json::to_value(&assistant).context("Failed to serialize assistant config")?,
        ),
    };
    Ok(event.with_variable_values(request.variable_values))
}

#[async_trait]
impl<C: CallClient + 'static> CallSessionService for RealtimeAdapter<C> {
    async fn start(&self, request: StartRequest) -> Result<()> {
        let event = to_start_event(request)?;
        self.client
            .lock()
            .await
            .start_call(event)
            .await
            .context("Adapter failed to send start event")
    }

    async fn stop(&self) -> Result<()> {
        let mut client = self.client.lock().await;
        client
            .stop_call()
            .await
            .context("Adapter failed to send stop event")?;
        match client.stats() {
            Ok(stats) => tracing::info!(
                "call stopped after {} events ({} final transcripts, {} errors)",
                stats.events(),
                stats.final_transcripts(),
                stats.errors()
            ),
            Err(e) => tracing::warn!("failed to read call stats: {}", e),
        }
        Ok(())
    }

    fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId {
        self.hub.on(kind, handler)
    }

    fn off(&self, kind: EventKind, id: HandlerId) {
        if !self.hub.off(kind, id) {
            tracing::debug!("no {} handler {:?} to remove", kind.as_str(), id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::interviewer::AssistantConfig;
    use mockall::mock;
    use realtime_call::types::{ErrorDetails, ErrorEvent, MessageEvent, ServerMessage};
    use realtime_call::{ServerRx, Stats};
    use std::collections::BTreeMap;
    use tokio::sync::{broadcast, mpsc};

    mock! {
        pub Client {}
        #[async_trait]
        impl CallClient for Client {
            async fn start_call(&mut self, event: StartCallEvent) -> Result<()>;
            async fn stop_call(&mut self) -> Result<()>;
            async fn server_events(&mut self) -> Result<ServerRx>;
            fn stats(&self) -> Result<Stats>;
        }
    }

    fn client_with_events() -> (MockClient, broadcast::Sender<ServerEvent>) {
        let (tx, rx) = broadcast::channel(16);
        let mut client = MockClient::new();
        client
            .expect_server_events()
            .times(1)
            .return_once(move || Ok(rx));
        (client, tx)
    }

    fn record_all(
        adapter: &RealtimeAdapter<MockClient>,
    ) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        for kind in EventKind::ALL {
            let tx = tx.clone();
            adapter.on(
                kind,
                Arc::new(move |event: &SessionEvent| {
                    let _ = tx.send(event.clone());
                }),
            );
        }
        rx
    }

    #[tokio::test]
    async fn server_events_reach_handlers_in_order() -> Result<()> {
        let (client, server_tx) = client_with_events();
        let adapter = RealtimeAdapter::new(client).await?;
        let mut events = record_all(&adapter);

        server_tx.send(ServerEvent::CallStart)?;
        server_tx.send(ServerEvent::Message(MessageEvent::new(ServerMessage::transcript(
            MessageRole::User,
            realtime_call::types::TranscriptType::Final,
            "I like Rust.",
        ))))?;
        server_tx.send(ServerEvent::SpeechStart)?;
        server_tx.send(ServerEvent::Error(ErrorEvent::new(
            ErrorDetails::new("quota exceeded").with_code("429"),
        )))?;
        server_tx.send(ServerEvent::Close { reason: None })?;

        assert_eq!(events.recv().await, Some(SessionEvent::CallStart));
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Message(TranscriptMessage::transcript(
                Role::User,
                TranscriptType::Final,
                "I like Rust."
            )))
        );
        assert_eq!(events.recv().await, Some(SessionEvent::SpeechStart));
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Error("quota exceeded (429)".to_string()))
        );
        // A closed socket ends the call.
        assert_eq!(events.recv().await, Some(SessionEvent::CallEnd));
        Ok(())
    }

    #[tokio::test]
    async fn removed_handlers_no_longer_fire() -> Result<()> {
        let (client, server_tx) = client_with_events();
        let adapter = RealtimeAdapter::new(client).await?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = adapter.on(
            EventKind::CallStart,
            Arc::new(move |event: &SessionEvent| {
                let _ = tx.send(event.clone());
            }),
        );
        let mut ends = record_all(&adapter);

        adapter.off(EventKind::CallStart, id);
        server_tx.send(ServerEvent::CallStart)?;
        server_tx.send(ServerEvent::CallEnd)?;

        // Events are delivered in order, so once call-end arrives the
        // call-start has been dispatched too.
        assert_eq!(ends.recv().await, Some(SessionEvent::CallStart));
        assert_eq!(ends.recv().await, Some(SessionEvent::CallEnd));
        assert!(rx.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn start_sends_inline_assistant_with_variables() -> Result<()> {
        let (mut client, _server_tx) = client_with_events();
        client
            .expect_start_call()
            .withf(|event| {
                event.workflow_id().is_none()
                    && event
                        .assistant_config()
                        .and_then(|assistant| assistant.get("firstMessage"))
                        .is_some()
                    && event.variable_values().get("questions").map(String::as_str)
                        == Some("- Why Rust?")
            })
            .times(1)
            .returning(|_| Ok(()));
        let adapter = RealtimeAdapter::new(client).await?;

        let mut variable_values = BTreeMap::new();
        variable_values.insert("questions".to_string(), "- Why Rust?".to_string());
        adapter
            .start(StartRequest {
                target: CallTarget::Assistant(AssistantConfig::interviewer()),
                variable_values,
            })
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn start_sends_workflow_id() -> Result<()> {
        let (mut client, _server_tx) = client_with_events();
        client
            .expect_start_call()
            .withf(|event| {
                event.workflow_id() == Some("wf-1") && event.assistant_config().is_none()
            })
            .times(1)
            .returning(|_| Ok(()));
        let adapter = RealtimeAdapter::new(client).await?;

        adapter
            .start(StartRequest {
                target: CallTarget::Workflow("wf-1".to_string()),
                variable_values: BTreeMap::new(),
            })
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn start_failure_is_reported() -> Result<()> {
        let (mut client, _server_tx) = client_with_events();
        client
            .expect_start_call()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("not connected yet")));
        let adapter = RealtimeAdapter::new(client).await?;

        let result = adapter
            .start(StartRequest {
                target: CallTarget::Workflow("wf-1".to_string()),
                variable_values: BTreeMap::new(),
            })
            .await;

        assert!(result.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn stop_sends_stop_and_reads_stats() -> Result<()> {
        let (mut client, _server_tx) = client_with_events();
        client.expect_stop_call().times(1).returning(|| Ok(()));
        client
            .expect_stats()
            .times(1)
            .returning(|| Ok(Stats::default()));
        let adapter = RealtimeAdapter::new(client).await?;

        adapter.stop().await?;
        Ok(())
    }
}
