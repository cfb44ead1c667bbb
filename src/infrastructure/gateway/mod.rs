//! Gateway session manager
//!
//! Owns the single persistent WebSocket connection to the chat platform:
//! handshake, heartbeats, event dispatch, reconnect with capped backoff,
//! and graceful shutdown. Everything else in the crate interacts with the
//! connection only through [`ReplyHandle`] and the registered
//! [`EventHandler`].

mod backoff;
mod protocol;
mod reply;
mod session;

pub use reply::{OutboundReply, ReplyHandle, MAX_REPLY_CHARS};
pub use session::SessionState;

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::application::errors::GatewayError;
use crate::domain::entities::{HealthStatus, MessageEvent, ReadyInfo};
use crate::domain::traits::EventHandler;

use backoff::Backoff;
use protocol::Frame;
use session::Session;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Connection settings, read once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub token: String,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    /// Consecutive failed connects before health degrades.
    pub max_failed_connects: u32,
    /// How long in-flight event handlers may run after shutdown.
    pub shutdown_grace: Duration,
}

enum ConnectionEnd {
    Shutdown,
    Lost,
}

pub struct GatewayManager {
    config: GatewayConfig,
    handler: Option<Arc<dyn EventHandler>>,
    session: Session,
    backoff: Backoff,
    failed_connects: u32,
    state_tx: watch::Sender<SessionState>,
    health_tx: watch::Sender<HealthStatus>,
    outbound_tx: mpsc::UnboundedSender<OutboundReply>,
    outbound_rx: mpsc::UnboundedReceiver<OutboundReply>,
    tasks: JoinSet<()>,
}

impl GatewayManager {
    pub fn new(config: GatewayConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        let (health_tx, _) = watch::channel(HealthStatus::Ok);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let backoff = Backoff::new(config.backoff_base, config.backoff_cap);

        Self {
            config,
            handler: None,
            session: Session::new(),
            backoff,
            failed_connects: 0,
            state_tx,
            health_tx,
            outbound_tx,
            outbound_rx,
            tasks: JoinSet::new(),
        }
    }

    /// Register the event callback. The registration survives reconnects.
    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handler = Some(handler);
    }

    /// Capability handed to the controller.
    pub fn reply_handle(&self) -> ReplyHandle {
        ReplyHandle::new(self.outbound_tx.clone(), self.state_tx.subscribe())
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn watch_health(&self) -> watch::Receiver<HealthStatus> {
        self.health_tx.subscribe()
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.session.state());
    }

    /// Run until the shutdown signal flips. Consumes the manager.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            self.session.begin_connect();
            self.publish_state();

            match self.run_connection(&mut shutdown).await {
                Ok(ConnectionEnd::Shutdown) => break,
                Ok(ConnectionEnd::Lost) => {}
                Err(e) => tracing::warn!("Gateway connection error: {}", e),
            }

            if *shutdown.borrow() {
                break;
            }

            // A connection that never reached ready counts against health.
            if self.session.state() != SessionState::Ready {
                self.failed_connects = self.failed_connects.saturating_add(1);
                if self.failed_connects == self.config.max_failed_connects {
                    tracing::warn!(
                        "{} consecutive failed connects, marking health degraded",
                        self.failed_connects
                    );
                }
                if self.failed_connects >= self.config.max_failed_connects {
                    self.health_tx.send_replace(HealthStatus::Degraded);
                }
            }

            self.session.reconnecting();
            self.publish_state();

            let delay = self.backoff.next_delay();
            tracing::info!("Reconnecting in {}ms", delay.as_millis());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {}
            }
        }

        self.drain_tasks().await;
        self.session.disconnected();
        self.publish_state();
        tracing::info!("Gateway session closed");
    }

    async fn run_connection(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<ConnectionEnd, GatewayError> {
        tracing::info!("Connecting to gateway: {}", self.config.url);
        let (ws, _) = connect_async(self.config.url.as_str())
            .await
            .map_err(|e| GatewayError::Handshake(e.to_string()))?;
        let (mut sink, mut stream) = ws.split();

        // Armed once HELLO announces the interval.
        let mut heartbeat: Option<Interval> = None;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Closing gateway connection");
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(ConnectionEnd::Shutdown);
                }
                Some(reply) = self.outbound_rx.recv() => {
                    let text = Frame::message_send(&reply.channel_id, &reply.content).to_text()?;
                    sink.send(Message::Text(text))
                        .await
                        .map_err(|e| GatewayError::Transport(e.to_string()))?;
                }
                _ = async {
                    match heartbeat.as_mut() {
                        Some(timer) => { timer.tick().await; }
                        None => std::future::pending().await,
                    }
                } => {
                    if !self.session.record_heartbeat_sent() {
                        tracing::warn!("Two heartbeats unacknowledged, dropping connection");
                        return Ok(ConnectionEnd::Lost);
                    }
                    let text = Frame::heartbeat(self.session.last_seq()).to_text()?;
                    sink.send(Message::Text(text))
                        .await
                        .map_err(|e| GatewayError::Transport(e.to_string()))?;
                }
                Some(_) = self.tasks.join_next(), if !self.tasks.is_empty() => {}
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        self.handle_frame(&text, &mut sink, &mut heartbeat).await?;
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // tungstenite answers pongs on its own.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!("Gateway closed the connection: {:?}", frame);
                        return Ok(ConnectionEnd::Lost);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(GatewayError::Transport(e.to_string())),
                    None => return Ok(ConnectionEnd::Lost),
                }
            }
        }
    }

    async fn handle_frame(
        &mut self,
        text: &str,
        sink: &mut WsSink,
        heartbeat: &mut Option<Interval>,
    ) -> Result<(), GatewayError> {
        let frame = match Frame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Ignoring malformed gateway frame: {}", e);
                return Ok(());
            }
        };

        if let Some(seq) = frame.s {
            self.session.record_seq(seq);
        }

        match frame.op {
            protocol::OP_HELLO => {
                let hello: protocol::Hello = frame.data()?;
                let interval = Duration::from_millis(hello.heartbeat_interval);

                let mut timer = interval_at(Instant::now() + interval, interval);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *heartbeat = Some(timer);

                let identify = Frame::identify(&self.config.token).to_text()?;
                sink.send(Message::Text(identify))
                    .await
                    .map_err(|e| GatewayError::Transport(e.to_string()))?;

                self.session.authenticated(interval);
                self.publish_state();
                tracing::debug!("Identified, awaiting ready");
            }
            protocol::OP_HEARTBEAT => {
                // Server may request an immediate heartbeat.
                let text = Frame::heartbeat(self.session.last_seq()).to_text()?;
                sink.send(Message::Text(text))
                    .await
                    .map_err(|e| GatewayError::Transport(e.to_string()))?;
            }
            protocol::OP_HEARTBEAT_ACK => self.session.record_heartbeat_ack(),
            protocol::OP_DISPATCH => self.handle_dispatch(&frame),
            other => tracing::debug!("Ignoring unknown opcode {}", other),
        }

        Ok(())
    }

    fn handle_dispatch(&mut self, frame: &Frame) {
        match frame.event_type() {
            Some(protocol::DISPATCH_READY) => {
                let ready: protocol::Ready = match frame.data() {
                    Ok(ready) => ready,
                    Err(e) => {
                        tracing::warn!("Ignoring malformed READY payload: {}", e);
                        return;
                    }
                };

                self.session.ready();
                self.publish_state();
                self.backoff.reset();
                self.failed_connects = 0;
                self.health_tx.send_replace(HealthStatus::Ok);
                tracing::info!("Gateway session ready: {}", ready.session_id);

                if let Some(handler) = &self.handler {
                    let handler = handler.clone();
                    let info = ReadyInfo {
                        session_id: ready.session_id,
                        bot_user_id: ready.user.id,
                    };
                    self.tasks.spawn(async move { handler.on_ready(info).await });
                }
            }
            Some(protocol::DISPATCH_MESSAGE_CREATE) => {
                // Events are only relayed while ready.
                if self.session.state() != SessionState::Ready {
                    return;
                }
                let mc: protocol::MessageCreate = match frame.data() {
                    Ok(mc) => mc,
                    Err(e) => {
                        tracing::warn!("Ignoring malformed MESSAGE_CREATE payload: {}", e);
                        return;
                    }
                };

                let event = MessageEvent::new(mc.id, mc.channel_id, mc.author.id, mc.content);
                if let Some(handler) = &self.handler {
                    let handler = handler.clone();
                    // Fire-and-forget per event, tracked for shutdown drain.
                    self.tasks
                        .spawn(async move { handler.on_message(event).await });
                }
            }
            _ => {}
        }
    }

    /// Let in-flight handlers finish, then abort whatever is left.
    async fn drain_tasks(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        tracing::info!("Draining {} in-flight handlers", self.tasks.len());
        let drained = tokio::time::timeout(self.config.shutdown_grace, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!("Grace period elapsed, aborting remaining handlers");
            self.tasks.shutdown().await;
        }
    }
}
