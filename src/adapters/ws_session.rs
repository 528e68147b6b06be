//! WebSocket session transport.
//!
//! Implements [`SessionTransport`] on top of the ESP-IDF WebSocket client.
//! The client runs its own task and reports through a callback; the
//! callback only forwards owned [`WsSignal`]s into a bounded `mpsc`
//! channel.  The control loop drains that channel in
//! [`SessionTransport::poll`], so no state is shared across tasks.
//!
//! ```text
//!  esp_websocket task ──callback──▶ SyncSender ──▶ Receiver ──▶ poll()
//!                                  (INBOUND_DEPTH)
//! ```
//!
//! A full channel drops the signal.  A peer that outpaces the drain loses
//! frames instead of growing the heap; a dropped close is still caught by
//! the heartbeat.
//!
//! On non-espidf targets the same channel is fed by a simulated peer
//! ([`WsSession::sim_peer`]).

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use log::{debug, info, warn};

use crate::app::ports::{SessionFrame, SessionTransport};
use crate::error::SessionError;

/// What the client task reports to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsSignal {
    Connected,
    Text(String),
    Ping,
    Pong,
    Closed,
}

/// Signals buffered between the client task and the control loop.
pub const INBOUND_DEPTH: usize = 16;

/// Queue one signal without blocking the client task.  Returns `false`
/// when it was dropped.
fn forward(tx: &SyncSender<WsSignal>, signal: WsSignal) -> bool {
    match tx.try_send(signal) {
        Ok(()) => true,
        Err(TrySendError::Full(s)) => {
            debug!("WS: inbound channel full, dropping {:?}", s);
            false
        }
        // Receiver gone means the session is being torn down.
        Err(TrySendError::Disconnected(_)) => false,
    }
}

pub struct WsSession {
    tx: SyncSender<WsSignal>,
    rx: Receiver<WsSignal>,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::ws::client::EspWebSocketClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimState,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimState {
    refuse_connect: bool,
    connected: bool,
    sent: Vec<String>,
    pings: u32,
}

impl Default for WsSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WsSession {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(INBOUND_DEPTH);
        Self {
            tx,
            rx,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim: SimState::default(),
        }
    }

    /// Wait for the handshake outcome, discarding stale signals from a
    /// previous connection.
    fn await_connected(&mut self, timeout_ms: u32) -> Result<(), SessionError> {
        let deadline =
            std::time::Instant::now() + std::time::Duration::from_millis(u64::from(timeout_ms));
        loop {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(WsSignal::Connected) => return Ok(()),
                Ok(WsSignal::Closed) => return Err(SessionError::ConnectFailed),
                Ok(other) => debug!("WS: discarding {:?} before handshake", other),
                Err(_) => return Err(SessionError::ConnectFailed),
            }
        }
    }

    fn drain_stale(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, url: &str, timeout_ms: u32) -> Result<(), SessionError> {
        use core::time::Duration;
        use esp_idf_svc::ws::client::{
            EspWebSocketClient, EspWebSocketClientConfig, WebSocketEventType,
        };

        let tx = self.tx.clone();
        let config = EspWebSocketClientConfig {
            network_timeout_ms: Duration::from_millis(u64::from(timeout_ms)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };

        let client = EspWebSocketClient::new(
            url,
            &config,
            Duration::from_millis(u64::from(timeout_ms)),
            move |event| {
                let signal = match event {
                    Ok(ev) => match ev.event_type {
                        WebSocketEventType::Connected => Some(WsSignal::Connected),
                        WebSocketEventType::Text(text) => Some(WsSignal::Text(text.to_string())),
                        WebSocketEventType::Ping => Some(WsSignal::Ping),
                        WebSocketEventType::Pong => Some(WsSignal::Pong),
                        WebSocketEventType::Close(_)
                        | WebSocketEventType::Closed
                        | WebSocketEventType::Disconnected => Some(WsSignal::Closed),
                        _ => None,
                    },
                    Err(_) => Some(WsSignal::Closed),
                };
                if let Some(s) = signal {
                    forward(&tx, s);
                }
            },
        )
        .map_err(|e| {
            warn!("WS: client create failed ({})", e);
            SessionError::ConnectFailed
        })?;

        self.client = Some(client);
        self.await_connected(timeout_ms)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, _url: &str, timeout_ms: u32) -> Result<(), SessionError> {
        let outcome = if self.sim.refuse_connect {
            WsSignal::Closed
        } else {
            WsSignal::Connected
        };
        forward(&self.tx, outcome);
        self.await_connected(timeout_ms)?;
        self.sim.connected = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_send(&mut self, frame: esp_idf_svc::ws::FrameType, data: &[u8]) -> Result<(), SessionError> {
        let client = self.client.as_mut().ok_or(SessionError::NotConnected)?;
        client.send(frame, data).map_err(|_| SessionError::SendFailed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_close(&mut self) {
        // Dropping the client stops its task and closes the socket.
        self.client = None;
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_close(&mut self) {
        self.sim.connected = false;
    }
}

impl SessionTransport for WsSession {
    fn connect(&mut self, url: &str, timeout_ms: u32) -> Result<(), SessionError> {
        self.platform_close();
        self.drain_stale();
        info!("WS: connecting to {}", url);
        self.platform_connect(url, timeout_ms)
    }

    #[cfg(target_os = "espidf")]
    fn send_text(&mut self, payload: &str) -> Result<(), SessionError> {
        self.platform_send(esp_idf_svc::ws::FrameType::Text(false), payload.as_bytes())
    }

    #[cfg(not(target_os = "espidf"))]
    fn send_text(&mut self, payload: &str) -> Result<(), SessionError> {
        if !self.sim.connected {
            return Err(SessionError::NotConnected);
        }
        self.sim.sent.push(payload.to_string());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn send_ping(&mut self) -> Result<(), SessionError> {
        self.platform_send(esp_idf_svc::ws::FrameType::Ping, &[])
    }

    #[cfg(not(target_os = "espidf"))]
    fn send_ping(&mut self) -> Result<(), SessionError> {
        if !self.sim.connected {
            return Err(SessionError::NotConnected);
        }
        self.sim.pings += 1;
        Ok(())
    }

    fn poll(&mut self) -> Option<SessionFrame> {
        match self.rx.try_recv() {
            Ok(WsSignal::Text(t)) => Some(SessionFrame::Text(t)),
            Ok(WsSignal::Ping) => Some(SessionFrame::Ping),
            Ok(WsSignal::Pong) => Some(SessionFrame::Pong),
            Ok(WsSignal::Closed) => Some(SessionFrame::Closed),
            // Late handshake confirmation; nothing to report.
            Ok(WsSignal::Connected) => None,
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(SessionFrame::Closed),
        }
    }

    fn close(&mut self) {
        self.platform_close();
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation helpers
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WsSession {
    /// A handle that injects signals as if the client task sent them.
    pub fn sim_peer(&self) -> SimPeer {
        SimPeer {
            tx: self.tx.clone(),
        }
    }

    pub fn sim_refuse_connect(&mut self, refuse: bool) {
        self.sim.refuse_connect = refuse;
    }

    pub fn sim_sent(&self) -> &[String] {
        &self.sim.sent
    }

    pub fn sim_pings(&self) -> u32 {
        self.sim.pings
    }
}

/// Simulated client task.  Sends go through the same bounded path as the
/// ESP-IDF callback.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone)]
pub struct SimPeer {
    tx: SyncSender<WsSignal>,
}

#[cfg(not(target_os = "espidf"))]
impl SimPeer {
    /// Returns `false` when the signal was dropped.
    pub fn send(&self, signal: WsSignal) -> bool {
        forward(&self.tx, signal)
    }
}
