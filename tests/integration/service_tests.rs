//! End-to-end scenarios for `MailboxService` driven by the scheduler.

use pochtomat::app::commands::ScreenMode;
use pochtomat::app::context::DoorState;
use pochtomat::config::{OpenMode, SystemConfig};
use pochtomat::error::LinkError;
use pochtomat::identity::DeviceId;
use pochtomat::scheduler::Scheduler;
use pochtomat::session::SessionState;

use crate::mock_hw::{
    DoorCall, MemFile, MemRegion, MockBoard, MockHttp, TestService, door_open, region_with,
    service_with,
};

const REGISTER_42: &str = r#"{"type":"register","device_id":42}"#;

struct Rig {
    svc: TestService,
    sched: Scheduler,
    board: MockBoard,
}

impl Rig {
    fn new(config: SystemConfig, http: MockHttp, region: MemRegion) -> Self {
        let sched = Scheduler::from_config(&config);
        Self {
            svc: service_with(config, http, region, MemFile::default()),
            sched,
            board: MockBoard::new(),
        }
    }

    /// Registered device with id 7 and the default config.
    fn registered() -> Self {
        let mut rig = Self::new(SystemConfig::default(), MockHttp::failing(), region_with(7));
        rig.tick_at(0);
        assert_eq!(rig.svc.session_state(), SessionState::Registered);
        rig
    }

    fn tick_at(&mut self, now_ms: u64) {
        self.board.now_ms = now_ms;
        self.svc.tick(&mut self.sched, &mut self.board);
    }

    /// Tick every 100 ms over `from..=to`.
    fn run(&mut self, from: u64, to: u64) {
        let mut t = from;
        while t <= to {
            self.tick_at(t);
            t += 100;
        }
    }

    fn sent(&self, needle: &str) -> usize {
        self.svc.session().transport().sent_matching(needle)
    }

    fn push(&mut self, text: &str) {
        self.svc.session_mut().transport_mut().push_text(text);
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_closes_door_and_brings_link_up() {
    let mut rig = Rig::new(SystemConfig::default(), MockHttp::failing(), region_with(7));
    rig.board.link_up = false;
    assert_eq!(rig.svc.boot(&mut rig.board), Ok(()));
    assert_eq!(rig.board.door_calls, vec![DoorCall::Close]);
    assert!(rig.board.link_up);
    assert_eq!(rig.board.screens[0], vec!["Pochtomat", "booting..."]);
}

#[test]
fn boot_fails_when_link_cannot_be_provisioned() {
    let mut rig = Rig::new(SystemConfig::default(), MockHttp::failing(), region_with(7));
    rig.board.link_up = false;
    rig.board.link_connectable = false;
    assert_eq!(
        rig.svc.boot(&mut rig.board),
        Err(LinkError::ProvisioningFailed)
    );
    assert_eq!(
        rig.board.last_screen(),
        Some(&["WiFi error".to_string(), "Rebooting...".to_string()][..])
    );
}

// ── Registration ──────────────────────────────────────────────

#[test]
fn fresh_device_registers_and_binds_session_once() {
    let mut rig = Rig::new(
        SystemConfig::default(),
        MockHttp::created("42"),
        MemRegion::default(),
    );
    rig.run(0, 5_000);

    assert_eq!(rig.svc.context().identity, DeviceId::from_raw(42));
    assert_eq!(rig.svc.session_state(), SessionState::Registered);
    assert_eq!(rig.sent(REGISTER_42), 1);
    assert_eq!(rig.svc.registration_mut().http().requests.len(), 1);
    assert_eq!(
        rig.svc.registration_mut().http().requests[0],
        r#"{"secretWord":"change-me"}"#
    );
}

#[test]
fn no_register_message_without_identity() {
    let mut rig = Rig::new(
        SystemConfig::default(),
        MockHttp::failing(),
        MemRegion::default(),
    );
    rig.run(0, 5_000);

    assert_eq!(rig.svc.session_state(), SessionState::Connected);
    assert_eq!(rig.sent(r#""type":"register""#), 0);
    // Retried on the 1 s registration cadence.
    assert_eq!(rig.svc.registration_mut().http().requests.len(), 6);
}

#[test]
fn registration_waits_for_link() {
    let mut rig = Rig::new(
        SystemConfig::default(),
        MockHttp::created("42"),
        MemRegion::default(),
    );
    rig.board.link_up = false;
    rig.run(0, 2_000);
    assert!(rig.svc.registration_mut().http().requests.is_empty());
    assert_eq!(rig.svc.session().transport().connects, 0);

    rig.board.link_up = true;
    rig.run(2_100, 3_000);
    assert_eq!(rig.sent(REGISTER_42), 1);
}

#[test]
fn rebooted_is_announced_once_per_boot() {
    let mut rig = Rig::registered();
    assert_eq!(rig.sent(r#""event":"rebooted""#), 1);

    // Peer drops the connection; the re-registration is not a reboot.
    rig.svc
        .session_mut()
        .transport_mut()
        .inbound
        .push_back(pochtomat::app::ports::SessionFrame::Closed);
    rig.run(100, 6_000);
    assert_eq!(rig.sent(r#"{"type":"register","device_id":7}"#), 2);
    assert_eq!(rig.sent(r#""event":"rebooted""#), 1);
}

// ── Mail detection ────────────────────────────────────────────

#[test]
fn sustained_motion_yields_one_mail_event() {
    let mut rig = Rig::registered();
    rig.board.motion = true;
    rig.run(100, 10_100);

    assert_eq!(rig.sent(r#""event":"new_mail""#), 1);
    assert_eq!(rig.board.opens(), 1);
    assert!(door_open(rig.svc.context()));
    assert_eq!(
        rig.svc.context().last_mail_time.as_deref(),
        Some("2024-05-01 08:00:00")
    );
}

#[test]
fn rising_edge_while_open_is_ignored() {
    let mut rig = Rig::registered();
    rig.board.motion = true;
    rig.tick_at(100);
    assert_eq!(rig.sent("new_mail"), 1);

    rig.board.motion = false;
    rig.run(200, 2_900);
    rig.board.motion = true;
    rig.tick_at(3_000);

    assert_eq!(rig.sent("new_mail"), 1);
    assert_eq!(rig.board.opens(), 1);
}

#[test]
fn cooldown_applies_after_remote_close() {
    let mut rig = Rig::registered();
    rig.board.motion = true;
    rig.tick_at(100);

    rig.board.motion = false;
    rig.push("close");
    rig.tick_at(200);
    assert_eq!(rig.svc.context().door, DoorState::Closed);

    rig.board.motion = true;
    rig.tick_at(3_000);
    assert_eq!(rig.sent("new_mail"), 1, "inside the 10 s cooldown");

    rig.board.motion = false;
    rig.tick_at(10_000);
    rig.board.motion = true;
    rig.tick_at(10_100);
    assert_eq!(rig.sent("new_mail"), 2);
}

#[test]
fn backend_mode_requests_open_over_session() {
    let config = SystemConfig {
        open_mode: OpenMode::ViaBackend,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config, MockHttp::failing(), region_with(7));
    rig.tick_at(0);
    rig.board.motion = true;
    rig.tick_at(100);

    assert_eq!(rig.board.opens(), 0);
    assert_eq!(rig.svc.context().door, DoorState::Closed);
    assert_eq!(rig.sent(r#"{"type":"command","command":"open"}"#), 1);
    assert_eq!(rig.sent("new_mail"), 1);
}

#[test]
fn backend_relayed_open_drives_the_servo() {
    let config = SystemConfig {
        open_mode: OpenMode::ViaBackend,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config, MockHttp::failing(), region_with(7));
    rig.tick_at(0);
    rig.board.motion = true;
    rig.tick_at(100);

    rig.push("open");
    rig.tick_at(200);
    assert_eq!(rig.board.opens(), 1);
    assert_eq!(rig.sent("door_opened"), 1);
    assert!(door_open(rig.svc.context()));

    rig.push("close");
    rig.tick_at(300);
    assert_eq!(rig.board.closes(), 1);

    // Next visit inside the cooldown asks for nothing.
    rig.board.motion = false;
    rig.tick_at(400);
    rig.board.motion = true;
    rig.tick_at(3_000);
    assert_eq!(rig.sent(r#""command":"open""#), 1);
    assert_eq!(rig.sent("new_mail"), 1);

    rig.board.motion = false;
    rig.tick_at(10_000);
    rig.board.motion = true;
    rig.tick_at(10_100);
    assert_eq!(rig.sent(r#""command":"open""#), 2);
}

#[test]
fn mail_without_session_still_opens_locally() {
    let mut rig = Rig::new(SystemConfig::default(), MockHttp::failing(), region_with(7));
    rig.board.link_up = false;
    rig.board.motion = true;
    rig.tick_at(0);

    assert_eq!(rig.board.opens(), 1);
    assert!(rig.svc.context().last_mail_time.is_some());
    assert!(rig.svc.session().transport().sent.is_empty());
}

// ── Inbound commands ──────────────────────────────────────────

#[test]
fn open_and_close_are_idempotent() {
    let mut rig = Rig::registered();
    rig.push("open");
    rig.push("\"open\"");
    rig.tick_at(100);
    assert_eq!(rig.board.opens(), 1);
    assert_eq!(rig.sent("door_opened"), 1);

    rig.push(r#"{"command":"close","source":"app"}"#);
    rig.push("close");
    rig.tick_at(200);
    assert_eq!(rig.board.closes(), 1);
    assert_eq!(rig.sent("door_closed"), 1);
}

#[test]
fn junk_payloads_are_dropped() {
    let mut rig = Rig::registered();
    for junk in ["", "{not json", "launch", r#"{"command":"fly"}"#] {
        rig.push(junk);
    }
    rig.tick_at(100);
    assert!(rig.board.door_calls.is_empty());
    assert_eq!(rig.svc.session_state(), SessionState::Registered);
}

#[test]
fn screen_mode_switches_display() {
    let mut rig = Rig::registered();
    rig.push(r#"{"screen_mode":1}"#);
    rig.tick_at(100);

    assert_eq!(rig.svc.context().screen_mode, ScreenMode::LastMail);
    assert_eq!(
        rig.board.last_screen(),
        Some(
            &[
                "Last mail:".to_string(),
                "N/A".to_string(),
                "registered #7".to_string()
            ][..]
        )
    );
}

#[test]
fn error_report_needs_a_session() {
    let mut rig = Rig::new(SystemConfig::default(), MockHttp::failing(), region_with(7));
    assert!(!rig.svc.report_error(0, 0));

    rig.tick_at(0);
    assert!(rig.svc.report_error(100, 0));
    assert_eq!(rig.sent(r#""event":"error""#), 1);
}
