//! Persistent backend session.
//!
//! ```text
//!                connect ok                 register sent
//!  Disconnected ───────────▶ Connected ─────────────────▶ Registered
//!       ▲                        │                            │
//!       └──── close / send error / heartbeat death ───────────┘
//! ```
//!
//! The manager is polled from the scheduler; it never blocks beyond the
//! transport's connect timeout.  Reconnects run on a flat interval.  The
//! only exception is heartbeat death, which reconnects on the very next
//! maintenance tick.

use log::{debug, info, warn};

use crate::app::events::ControlMessage;
use crate::app::ports::{SessionFrame, SessionTransport};
use crate::config::SystemConfig;
use crate::error::SessionError;
use crate::identity::DeviceId;

/// Upper bound on frames consumed per scheduler tick.
pub const MAX_FRAMES_PER_TICK: usize = 8;

/// Inbound text payloads collected by one [`SessionManager::drain`].
pub type InboundBatch = heapless::Vec<String, MAX_FRAMES_PER_TICK>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Registered,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "offline",
            Self::Connected => "online",
            Self::Registered => "registered",
        }
    }
}

/// Session timing knobs, lifted out of [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub heartbeat_interval_ms: u64,
    pub dead_after_ms: u64,
    pub reconnect_interval_ms: u64,
    pub connect_timeout_ms: u32,
}

impl SessionTimings {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            heartbeat_interval_ms: u64::from(config.heartbeat_interval_ms),
            dead_after_ms: u64::from(config.heartbeat_dead_after_ms),
            reconnect_interval_ms: u64::from(config.reconnect_interval_ms),
            connect_timeout_ms: config.request_timeout_ms,
        }
    }
}

pub struct SessionManager<T> {
    transport: T,
    url: heapless::String<128>,
    timings: SessionTimings,
    state: SessionState,
    /// Uptime of the last inbound frame (or of the connect).
    last_alive_ms: u64,
    last_probe_ms: u64,
    next_connect_at_ms: u64,
    /// Consecutive failed connects.  Reported, never acted upon.
    failed_attempts: u32,
}

impl<T: SessionTransport> SessionManager<T> {
    pub fn new(transport: T, url: &str, timings: SessionTimings) -> Self {
        let mut u = heapless::String::new();
        if u.push_str(url).is_err() {
            warn!(
                "Session: endpoint URL over {} bytes, endpoint left empty",
                u.capacity()
            );
        }
        Self {
            transport,
            url: u,
            timings,
            state: SessionState::Disconnected,
            last_alive_ms: 0,
            last_probe_ms: 0,
            next_connect_at_ms: 0,
            failed_attempts: 0,
        }
    }

    /// Connect or keep the connection alive.
    ///
    /// Returns `true` when this call opened a new connection.
    pub fn maintain(&mut self, now_ms: u64, link_up: bool) -> bool {
        if self.state != SessionState::Disconnected {
            self.check_heartbeat(now_ms);
            return false;
        }

        if !link_up || now_ms < self.next_connect_at_ms {
            return false;
        }

        match self
            .transport
            .connect(&self.url, self.timings.connect_timeout_ms)
        {
            Ok(()) => {
                info!(
                    "Session: connected to {} after {} failed attempt(s)",
                    self.url, self.failed_attempts
                );
                self.state = SessionState::Connected;
                self.failed_attempts = 0;
                self.last_alive_ms = now_ms;
                self.last_probe_ms = now_ms;
                true
            }
            Err(e) => {
                self.failed_attempts = self.failed_attempts.saturating_add(1);
                self.next_connect_at_ms = now_ms + self.timings.reconnect_interval_ms;
                warn!(
                    "Session: {} (attempt {}), retry in {} ms",
                    e, self.failed_attempts, self.timings.reconnect_interval_ms
                );
                false
            }
        }
    }

    fn check_heartbeat(&mut self, now_ms: u64) {
        let silent_for = now_ms.saturating_sub(self.last_alive_ms);
        if silent_for >= self.timings.dead_after_ms {
            warn!(
                "Session: {} after {} ms of silence, reconnecting",
                SessionError::HeartbeatTimeout,
                silent_for
            );
            self.transport.close();
            self.state = SessionState::Disconnected;
            self.next_connect_at_ms = now_ms;
            return;
        }

        if now_ms.saturating_sub(self.last_probe_ms) >= self.timings.heartbeat_interval_ms {
            self.last_probe_ms = now_ms;
            if let Err(e) = self.transport.send_ping() {
                warn!("Session: heartbeat probe failed ({})", e);
                self.handle_closed(now_ms);
            }
        }
    }

    /// Send the registration message if connected and not yet registered.
    ///
    /// Returns `true` when the message went out.
    pub fn try_register(&mut self, identity: Option<DeviceId>, now_ms: u64) -> bool {
        if self.state != SessionState::Connected {
            return false;
        }
        let Some(id) = identity else {
            debug!("Session: connected without identity, registration deferred");
            return false;
        };

        let msg = match (ControlMessage::Register { device_id: id }).to_json() {
            Ok(m) => m,
            Err(e) => {
                warn!("Session: register encode failed ({})", e);
                return false;
            }
        };
        match self.transport.send_text(&msg) {
            Ok(()) => {
                info!("Session: registered as device {}", id);
                self.state = SessionState::Registered;
                true
            }
            Err(e) => {
                warn!("Session: register send failed ({})", e);
                self.handle_closed(now_ms);
                false
            }
        }
    }

    /// Send one text payload.  No-op returning `false` while disconnected.
    pub fn send(&mut self, payload: &str, now_ms: u64) -> bool {
        if self.state == SessionState::Disconnected {
            debug!("Session: not connected, dropping {}", payload);
            return false;
        }
        match self.transport.send_text(payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("Session: {}", e);
                self.handle_closed(now_ms);
                false
            }
        }
    }

    /// Pull up to [`MAX_FRAMES_PER_TICK`] frames off the transport.
    ///
    /// Every frame counts as liveness.  Text payloads are returned in
    /// arrival order.
    pub fn drain(&mut self, now_ms: u64) -> InboundBatch {
        let mut batch = InboundBatch::new();
        if self.state == SessionState::Disconnected {
            return batch;
        }

        for _ in 0..MAX_FRAMES_PER_TICK {
            let Some(frame) = self.transport.poll() else {
                break;
            };
            match frame {
                SessionFrame::Text(text) => {
                    self.last_alive_ms = now_ms;
                    // Capacity equals the loop bound.
                    let _ = batch.push(text);
                }
                SessionFrame::Ping | SessionFrame::Pong => {
                    self.last_alive_ms = now_ms;
                }
                SessionFrame::Closed => {
                    self.handle_closed(now_ms);
                    break;
                }
            }
        }
        batch
    }

    fn handle_closed(&mut self, now_ms: u64) {
        if self.state != SessionState::Disconnected {
            info!(
                "Session: closed, reconnect in {} ms",
                self.timings.reconnect_interval_ms
            );
        }
        self.transport.close();
        self.state = SessionState::Disconnected;
        self.next_connect_at_ms = now_ms + self.timings.reconnect_interval_ms;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state != SessionState::Disconnected
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
