//! Session upkeep driven through the scheduler: heartbeat, reconnect and
//! inbound bounds.

use pochtomat::app::ports::SessionFrame;
use pochtomat::config::SystemConfig;
use pochtomat::scheduler::Scheduler;
use pochtomat::session::{MAX_FRAMES_PER_TICK, SessionState};

use crate::mock_hw::{MemFile, MockBoard, MockHttp, TestService, region_with, service_with};

fn registered_rig() -> (TestService, Scheduler, MockBoard) {
    let config = SystemConfig::default();
    let mut sched = Scheduler::from_config(&config);
    let mut svc = service_with(config, MockHttp::failing(), region_with(7), MemFile::default());
    let mut board = MockBoard::new();
    svc.tick(&mut sched, &mut board);
    assert_eq!(svc.session_state(), SessionState::Registered);
    (svc, sched, board)
}

fn run(svc: &mut TestService, sched: &mut Scheduler, board: &mut MockBoard, from: u64, to: u64) {
    let mut t = from;
    while t <= to {
        board.now_ms = t;
        svc.tick(sched, board);
        t += 100;
    }
}

#[test]
fn silent_peer_is_declared_dead_and_redialed_next_tick() {
    let (mut svc, mut sched, mut board) = registered_rig();
    run(&mut svc, &mut sched, &mut board, 100, 59_900);
    assert_eq!(svc.session_state(), SessionState::Registered);
    assert_eq!(svc.session().transport().pings, 1, "probe at 30 s");

    board.now_ms = 60_000;
    svc.tick(&mut sched, &mut board);
    assert_eq!(svc.session_state(), SessionState::Disconnected);
    assert_eq!(svc.session().transport().connects, 1);

    board.now_ms = 60_100;
    svc.tick(&mut sched, &mut board);
    assert_eq!(svc.session().transport().connects, 2);
    assert_eq!(svc.session_state(), SessionState::Registered);
}

#[test]
fn pong_keeps_session_alive() {
    let (mut svc, mut sched, mut board) = registered_rig();
    run(&mut svc, &mut sched, &mut board, 100, 30_000);
    svc.session_mut()
        .transport_mut()
        .inbound
        .push_back(SessionFrame::Pong);
    run(&mut svc, &mut sched, &mut board, 30_100, 75_000);

    assert_eq!(svc.session_state(), SessionState::Registered);
    assert_eq!(svc.session().transport().connects, 1);
}

#[test]
fn refused_connect_retries_every_five_seconds() {
    let config = SystemConfig::default();
    let mut sched = Scheduler::from_config(&config);
    let mut svc = service_with(config, MockHttp::failing(), region_with(7), MemFile::default());
    let mut board = MockBoard::new();
    svc.session_mut().transport_mut().refuse_connect = true;

    run(&mut svc, &mut sched, &mut board, 0, 12_000);
    // Attempts at 0, 5000 and 10000.
    assert_eq!(svc.session().transport().connects, 3);
    assert_eq!(svc.session().failed_attempts(), 3);

    svc.session_mut().transport_mut().refuse_connect = false;
    run(&mut svc, &mut sched, &mut board, 12_100, 15_000);
    assert_eq!(svc.session_state(), SessionState::Registered);
    assert_eq!(svc.session().failed_attempts(), 0);
}

#[test]
fn peer_close_waits_before_redialing() {
    let (mut svc, mut sched, mut board) = registered_rig();
    svc.session_mut()
        .transport_mut()
        .inbound
        .push_back(SessionFrame::Closed);
    run(&mut svc, &mut sched, &mut board, 100, 5_000);
    assert_eq!(svc.session_state(), SessionState::Disconnected);

    run(&mut svc, &mut sched, &mut board, 5_100, 5_100);
    assert_eq!(svc.session_state(), SessionState::Registered);
}

#[test]
fn inbound_drain_is_bounded_per_tick() {
    let (mut svc, mut sched, mut board) = registered_rig();
    for _ in 0..MAX_FRAMES_PER_TICK + 3 {
        svc.session_mut().transport_mut().push_text("noop");
    }
    board.now_ms = 100;
    svc.tick(&mut sched, &mut board);
    assert_eq!(svc.session().transport().inbound.len(), 3);

    board.now_ms = 200;
    svc.tick(&mut sched, &mut board);
    assert!(svc.session().transport().inbound.is_empty());
}
