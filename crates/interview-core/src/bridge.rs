//! Bridges the events of a [`CallSessionService`] into [`Signal`]s for the
//! call state machine.
//!
//! Handlers registered here never touch machine state. They normalize the
//! event and push it on a channel; the run loop delivers the signals to the
//! machine one at a time.

use crate::call_session::{CallSessionService, EventHandler, HandlerId};
use crate::events::{EventKind, SessionEvent};
use crate::transcript::Message;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// A normalized, locally owned state update.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    CallStarted,
    CallEnded,
    FinalMessage(Message),
    Speaking(bool),
    SessionError(String),
}

/// Translates a raw session event into a signal. Returns `None` for events
/// the state machine does not care about (partial transcripts and
/// non-transcript messages).
pub fn normalize(event: &SessionEvent) -> Option<Signal> {
    match event {
        SessionEvent::CallStart => Some(Signal::CallStarted),
        SessionEvent::CallEnd => Some(Signal::CallEnded),
        SessionEvent::Message(message) => {
            if !message.is_final_transcript() {
                tracing::trace!(
                    "skipping {} message ({:?})",
                    message.message_type,
                    message.transcript_type
                );
                return None;
            }
            match (message.role, message.transcript.as_deref()) {
                (Some(role), Some(text)) => Some(Signal::FinalMessage(Message::new(role, text))),
                _ => {
                    tracing::warn!("final transcript without role or text: {:?}", message);
                    None
                }
            }
        }
        SessionEvent::SpeechStart => Some(Signal::Speaking(true)),
        SessionEvent::SpeechEnd => Some(Signal::Speaking(false)),
        SessionEvent::Error(error) => Some(Signal::SessionError(error.clone())),
    }
}

pub struct EventBridge;

impl EventBridge {
    /// Registers one handler per event kind. Dropping the returned
    /// [`Subscription`] removes all of them.
    pub fn subscribe(
        service: Arc<dyn CallSessionService>,
        signal_tx: UnboundedSender<Signal>,
    ) -> Subscription {
        let registrations = EventKind::ALL
            .iter()
            .map(|kind| {
                let signal_tx = signal_tx.clone();
                let handler: EventHandler = Arc::new(move |event: &SessionEvent| {
                    if let Some(signal) = normalize(event) {
                        if signal_tx.send(signal).is_err() {
                            tracing::debug!("signal receiver dropped, ignoring {:?}", event.kind());
                        }
                    }
                });
                (*kind, service.on(*kind, handler))
            })
            .collect();
        tracing::debug!("subscribed to call session events");

        Subscription {
            service,
            registrations,
        }
    }
}

/// Owns the handlers registered by [`EventBridge::subscribe`].
pub struct Subscription {
    service: Arc<dyn CallSessionService>,
    registrations: Vec<(EventKind, HandlerId)>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for (kind, id) in self.registrations.drain(..) {
            self.service.off(kind, id);
        }
        tracing::debug!("unsubscribed from call session events");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_session::{EventHub, MockCallSessionService, StartRequest};
    use crate::events::{Role, TranscriptMessage, TranscriptType};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::mpsc;

    struct HubService {
        hub: EventHub,
    }

    #[async_trait]
    impl CallSessionService for HubService {
        async fn start(&self, _request: StartRequest) -> Result<()> {
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            Ok(())
        }

        fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId {
            self.hub.on(kind, handler)
        }

        fn off(&self, kind: EventKind, id: HandlerId) {
            self.hub.off(kind, id);
        }
    }

    #[test]
    fn subscription_deregisters_every_handler_it_registered() {
        let mut service = MockCallSessionService::new();
        let next = Arc::new(AtomicU64::new(0));
        service
            .expect_on()
            .times(6)
            .returning(move |_, _| HandlerId::new(next.fetch_add(1, Ordering::SeqCst)));
        service.expect_off().times(6).return_const(());

        let (tx, _rx) = mpsc::unbounded_channel();
        let subscription = EventBridge::subscribe(Arc::new(service), tx);
        subscription.unsubscribe();
    }

    #[test]
    fn drop_leaves_no_handlers_behind() {
        let service = Arc::new(HubService {
            hub: EventHub::new(),
        });
        let (tx, _rx) = mpsc::unbounded_channel();

        let subscription = EventBridge::subscribe(service.clone(), tx);
        for kind in EventKind::ALL {
            assert_eq!(service.hub.handler_count(kind), 1);
        }
        drop(subscription);
        for kind in EventKind::ALL {
            assert_eq!(service.hub.handler_count(kind), 0);
        }
    }

    #[test]
    fn forwards_only_final_transcripts() {
        let service = Arc::new(HubService {
            hub: EventHub::new(),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = EventBridge::subscribe(service.clone(), tx);

        service.hub.emit(&SessionEvent::Message(TranscriptMessage::transcript(
            Role::User,
            TranscriptType::Partial,
            "h",
        )));
        service.hub.emit(&SessionEvent::Message(TranscriptMessage::transcript(
            Role::User,
            TranscriptType::Final,
            "hi",
        )));

        assert_eq!(
            rx.try_recv().unwrap(),
            Signal::FinalMessage(Message::new(Role::User, "hi"))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn maps_lifecycle_and_speech_events() {
        let service = Arc::new(HubService {
            hub: EventHub::new(),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = EventBridge::subscribe(service.clone(), tx);

        service.hub.emit(&SessionEvent::CallStart);
        service.hub.emit(&SessionEvent::SpeechStart);
        service.hub.emit(&SessionEvent::SpeechEnd);
        service.hub.emit(&SessionEvent::Error("network".into()));
        service.hub.emit(&SessionEvent::CallEnd);

        assert_eq!(rx.try_recv().unwrap(), Signal::CallStarted);
        assert_eq!(rx.try_recv().unwrap(), Signal::Speaking(true));
        assert_eq!(rx.try_recv().unwrap(), Signal::Speaking(false));
        assert_eq!(
            rx.try_recv().unwrap(),
            Signal::SessionError("network".into())
        );
        assert_eq!(rx.try_recv().unwrap(), Signal::CallEnded);
    }

    #[test]
    fn final_transcript_without_text_is_dropped() {
        let message = TranscriptMessage {
            message_type: TranscriptMessage::TRANSCRIPT.to_string(),
            transcript_type: Some(TranscriptType::Final),
            role: Some(Role::Assistant),
            transcript: None,
        };
        assert_eq!(normalize(&SessionEvent::Message(message)), None);
    }
}
