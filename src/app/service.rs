//! Application service: the hexagonal core.
//!
//! [`MailboxService`] owns the device context, the identity store and the
//! network clients.  It is driven by the [`Scheduler`]: every tick it
//! drains inbound session frames, then runs whichever periodic tasks are
//! due.  All I/O flows through port traits injected at call sites,
//! making the entire service testable with mock adapters.
//!
//! ```text
//!  MotionSensorPort ──▶ ┌──────────────────────────┐ ──▶ SessionTransport
//!                       │      MailboxService      │
//!  DoorActuatorPort ◀── │ Pipeline · Dispatcher    │ ◀── HttpPort
//!       DisplayPort ◀── │ Session · Identity       │ ◀─▶ Region / File
//!                       └──────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::{OpenMode, SystemConfig};
use crate::dispatcher;
use crate::error::LinkError;
use crate::identity::{DeviceId, IdentityStore};
use crate::pipeline::EventPipeline;
use crate::registration::RegistrationClient;
use crate::scheduler::{Scheduler, TaskId};
use crate::screen;
use crate::session::{SessionManager, SessionState, SessionTimings};

use super::commands::DoorCommand;
use super::context::{DeviceContext, DoorState};
use super::events::{ControlMessage, DeviceEvent, EventKind, format_timestamp};
use super::ports::{
    DevicePorts, FileStore, HttpPort, RegionStore, SchedulerDelegate, SessionTransport,
};

// ───────────────────────────────────────────────────────────────
// MailboxService
// ───────────────────────────────────────────────────────────────

pub struct MailboxService<T, H, R, F> {
    config: SystemConfig,
    ctx: DeviceContext,
    identity: IdentityStore<R, F>,
    registration: RegistrationClient<H>,
    session: SessionManager<T>,
    pipeline: EventPipeline,
}

impl<T, H, R, F> MailboxService<T, H, R, F>
where
    T: SessionTransport,
    H: HttpPort,
    R: RegionStore,
    F: FileStore,
{
    /// Build the service and load the stored identity.
    pub fn new(
        config: SystemConfig,
        transport: T,
        http: H,
        identity: IdentityStore<R, F>,
    ) -> Self {
        let ctx = DeviceContext::new(identity.load());
        let registration =
            RegistrationClient::new(http, &config.registration_url, config.request_timeout_ms);
        let session = SessionManager::new(
            transport,
            &config.session_url,
            SessionTimings::from_config(&config),
        );
        let pipeline = EventPipeline::new(&config);

        Self {
            config,
            ctx,
            identity,
            registration,
            session,
            pipeline,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot sequence: splash, door to its rest position, bring the link up.
    ///
    /// A link that cannot be provisioned is fatal; the caller restarts.
    pub fn boot(&mut self, hw: &mut impl DevicePorts) -> Result<(), LinkError> {
        screen::booting().show(hw);
        hw.set_open(false);

        if !hw.connect() {
            warn!("Service: link provisioning failed");
            screen::link_failed().show(hw);
            return Err(LinkError::ProvisioningFailed);
        }
        if !hw.resync() {
            warn!("Service: initial clock sync failed, timestamps start at 1970");
        }
        info!(
            "Service: booted, identity {}",
            self.ctx
                .identity
                .map_or_else(|| "unset".into(), |id| id.to_string())
        );
        Ok(())
    }

    /// Run one scheduler tick against `hw`.
    pub fn tick<P: DevicePorts>(&mut self, scheduler: &mut Scheduler, hw: &mut P) {
        let now = hw.uptime_ms();
        let mut delegate = TickDelegate { svc: self, hw };
        scheduler.tick(now, &mut delegate);
    }

    /// Report a fault to the backend.  Dropped when the session is down.
    pub fn report_error(&mut self, now_ms: u64, epoch_secs: u64) -> bool {
        self.emit(EventKind::Error, now_ms, epoch_secs)
    }

    // ── Tasks ─────────────────────────────────────────────────

    fn drain_inbound(&mut self, now: u64, hw: &mut impl DevicePorts) {
        for payload in self.session.drain(now) {
            let outcome = dispatcher::dispatch(&mut self.ctx, &payload, hw);
            if let Some(kind) = outcome.door_event {
                self.emit(kind, now, hw.epoch_secs());
            }
            if outcome.screen_changed {
                self.refresh_display(hw);
            }
        }
    }

    fn run_task(&mut self, task: TaskId, now: u64, hw: &mut impl DevicePorts) {
        match task {
            TaskId::MotionPoll => self.poll_motion(now, hw),
            TaskId::SessionMaintain => {
                self.session.maintain(now, hw.is_up());
                self.register_session(now, hw);
            }
            TaskId::Registration => self.ensure_identity(now, hw),
            TaskId::ClockSync => {
                if !hw.resync() {
                    debug!("Service: clock sync pending");
                }
            }
            TaskId::DisplayRefresh => self.refresh_display(hw),
        }
    }

    fn poll_motion(&mut self, now: u64, hw: &mut impl DevicePorts) {
        let Some(hit) = self.pipeline.poll(&mut self.ctx, hw, now) else {
            return;
        };
        info!("Service: mail detected, opening door ({:?})", hit.open_mode);

        match hit.open_mode {
            OpenMode::Local => {
                hw.set_open(true);
                self.ctx.door = DoorState::Open;
            }
            // Door stays closed until the backend relays `open`.
            OpenMode::ViaBackend => {
                let cmd = ControlMessage::Command {
                    command: DoorCommand::Open,
                };
                match cmd.to_json() {
                    Ok(json) => {
                        if !self.session.send(&json, now) {
                            warn!("Service: open request not delivered");
                        }
                    }
                    Err(e) => warn!("Service: open request encode failed ({})", e),
                }
            }
        }

        let epoch = hw.epoch_secs();
        self.ctx.last_mail_time = Some(format_timestamp(epoch));
        self.emit(EventKind::NewMail, now, epoch);
    }

    /// Send the session registration if possible; announce the boot on
    /// the first success.
    fn register_session(&mut self, now: u64, hw: &mut impl DevicePorts) {
        if !self.session.try_register(self.ctx.identity, now) {
            return;
        }
        if !self.ctx.boot_announced {
            self.ctx.boot_announced = true;
            self.emit(EventKind::Rebooted, now, hw.epoch_secs());
        }
        self.refresh_display(hw);
    }

    /// Registration task: obtain an identity while none is stored,
    /// otherwise retry the session registration.
    fn ensure_identity(&mut self, now: u64, hw: &mut impl DevicePorts) {
        if self.ctx.identity.is_some() {
            self.register_session(now, hw);
            return;
        }
        if !hw.is_up() {
            return;
        }

        match self.registration.register(&self.config.registration_secret) {
            Ok(id) => {
                self.adopt_identity(id);
                self.register_session(now, hw);
            }
            Err(e) => debug!("Service: registration failed ({}), retrying", e),
        }
    }

    fn adopt_identity(&mut self, id: DeviceId) {
        self.ctx.identity = Some(id);
        if let Err(e) = self.identity.save(id) {
            warn!("Service: identity {} not fully persisted ({})", id, e);
        }
    }

    fn refresh_display(&mut self, hw: &mut impl DevicePorts) {
        screen::status(&self.ctx, self.session.state(), hw.epoch_secs()).show(hw);
    }

    /// Build and send one event.  Never queued, never retried.
    fn emit(&mut self, kind: EventKind, now: u64, epoch_secs: u64) -> bool {
        let Some(id) = self.ctx.identity else {
            debug!("Service: no identity, {:?} dropped", kind);
            return false;
        };
        let event = DeviceEvent::new(kind, id, epoch_secs);
        match event.to_json() {
            Ok(json) => self.session.send(&json, now),
            Err(e) => {
                warn!("Service: {:?} encode failed ({})", kind, e);
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager<T> {
        &mut self.session
    }

    pub fn registration_mut(&mut self) -> &mut RegistrationClient<H> {
        &mut self.registration
    }

    pub fn identity_store(&self) -> &IdentityStore<R, F> {
        &self.identity
    }
}

// ───────────────────────────────────────────────────────────────
// Scheduler glue
// ───────────────────────────────────────────────────────────────

/// Borrows the service and the board for the duration of one tick.
struct TickDelegate<'a, T, H, R, F, P> {
    svc: &'a mut MailboxService<T, H, R, F>,
    hw: &'a mut P,
}

impl<T, H, R, F, P> SchedulerDelegate for TickDelegate<'_, T, H, R, F, P>
where
    T: SessionTransport,
    H: HttpPort,
    R: RegionStore,
    F: FileStore,
    P: DevicePorts,
{
    fn drain_inbound(&mut self, now_ms: u64) {
        self.svc.drain_inbound(now_ms, self.hw);
    }

    fn run_task(&mut self, task: TaskId, now_ms: u64) {
        self.svc.run_task(task, now_ms, self.hw);
    }
}
