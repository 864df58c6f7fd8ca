use crate::client::stats::Stats as StatsInner;
use crate::types::{self, StartCallEvent, TranscriptType};
use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio_tungstenite::tungstenite::Message;

mod config;
mod consts;
mod stats;
mod utils;

pub use config::{Config, ConfigBuilder};
pub use stats::Stats;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type ServerTx = tokio::sync::broadcast::Sender<types::ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::ServerEvent>;

/// The operations a call session adapter needs from a connected client.
#[async_trait]
pub trait CallClient: Send {
    async fn start_call(&mut self, event: StartCallEvent) -> Result<()>;
    async fn stop_call(&mut self) -> Result<()>;
    async fn server_events(&mut self) -> Result<ServerRx>;
    fn stats(&self) -> Result<Stats>;
}

// Holds the channel capacity, the client/server transmitters once connected,
// and the event counters shared with the reader task.
pub struct Client {
    capacity: usize,
    config: Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    stats: Arc<Mutex<StatsInner>>,
}

impl Client {
    fn new(capacity: usize, config: Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
            stats: Arc::new(Mutex::new(StatsInner::new())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        tracing::info!("connected to call service at {}", self.config.base_url());

        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());

        // Writer: serializes client events onto the socket.
        tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                }
            }
        });

        let stats = self.stats.clone();
        // Reader: parses server events and broadcasts them to subscribers.
        tokio::spawn(async move {
            // Every way out of this loop reports a close, so a dropped
            // connection still ends the call.
            let mut close_reason = None;
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        close_reason = Some(e.to_string());
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => match serde_json::from_str::<types::ServerEvent>(&text) {
                        Ok(event) => {
                            record(&stats, &event);
                            tracing::debug!("received event: {:?}", event);
                            if let Err(e) = s_tx.send(event) {
                                tracing::error!("failed to send event: {}", e);
                            }
                        }
                        Err(e) => {
                            tracing::error!("failed to deserialize event: {}, text=> {:?}", e, text);
                        }
                    },
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message of {} bytes", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        close_reason = reason.map(|v| format!("{:?}", v));
                        break;
                    }
                    _ => {}
                }
            }
            if let Err(e) = s_tx.send(types::ServerEvent::Close {
                reason: close_reason,
            }) {
                tracing::error!("failed to send close event: {}", e);
            }
            drop(c_tx);
            drop(s_tx);
        });
        Ok(())
    }

    async fn send_client_event(&mut self, event: types::ClientEvent) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(event).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }
}

fn record(stats: &Mutex<StatsInner>, event: &types::ServerEvent) {
    let Ok(mut stats) = stats.lock() else {
        tracing::error!("failed to update stats");
        return;
    };
    stats.record_event();
    match event {
        types::ServerEvent::Message(message)
            if message.message().transcript_type() == Some(TranscriptType::Final) =>
        {
            stats.record_final_transcript()
        }
        types::ServerEvent::Error(_) => stats.record_error(),
        _ => {}
    }
}

#[async_trait]
impl CallClient for Client {
    async fn start_call(&mut self, event: StartCallEvent) -> Result<()> {
        self.send_client_event(types::ClientEvent::Start(event)).await
    }

    async fn stop_call(&mut self) -> Result<()> {
        self.send_client_event(types::ClientEvent::Stop).await
    }

    // A fresh receiver; events sent before subscribing are not replayed.
    async fn server_events(&mut self) -> Result<ServerRx> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }
}

pub async fn connect_with_config(capacity: usize, config: Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}

pub async fn connect() -> Result<Client> {
    connect_with_config(1024, Config::new()).await
}
