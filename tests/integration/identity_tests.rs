//! Identity persistence through the service's registration path.

use pochtomat::config::SystemConfig;
use pochtomat::identity::{DeviceId, IdentityStore};

use crate::mock_hw::{MemFile, MemRegion, MockBoard, MockHttp, region_with, service_with};

fn id(n: i64) -> DeviceId {
    DeviceId::from_raw(n).unwrap()
}

#[test]
fn region_path_round_trip() {
    let mut store = IdentityStore::new(MemRegion::default(), MemFile::default());
    store.save(id(1234)).unwrap();

    let reopened = IdentityStore::new(store.region().clone(), MemFile::default());
    assert_eq!(reopened.load(), Some(id(1234)));
}

#[test]
fn file_only_path_round_trip() {
    let mut store = IdentityStore::new(MemRegion::default(), MemFile::default());
    store.save(id(77)).unwrap();
    assert_eq!(store.file().contents.as_deref(), Some("77\n"));

    let reopened = IdentityStore::new(MemRegion::default(), store.file().clone());
    assert_eq!(reopened.load(), Some(id(77)));
}

#[test]
fn region_wins_over_file() {
    let file = MemFile {
        contents: Some("5\n".into()),
    };
    let store = IdentityStore::new(region_with(9), file);
    assert_eq!(store.load(), Some(id(9)));
}

#[test]
fn failed_region_commit_still_writes_file() {
    let region = MemRegion {
        fail_commit: true,
        ..MemRegion::default()
    };
    let mut store = IdentityStore::new(region, MemFile::default());
    assert!(store.save(id(3)).is_err());
    assert_eq!(store.file().contents.as_deref(), Some("3\n"));
}

#[test]
fn registration_result_lands_in_both_stores() {
    let mut svc = service_with(
        SystemConfig::default(),
        MockHttp::created("42"),
        MemRegion::default(),
        MemFile::default(),
    );
    let mut board = MockBoard::new();
    let mut sched = pochtomat::scheduler::Scheduler::from_config(svc.config());

    svc.tick(&mut sched, &mut board);
    assert_eq!(svc.context().identity, Some(id(42)));

    let store = svc.identity_store();
    let via_region = IdentityStore::new(store.region().clone(), MemFile::default());
    let via_file = IdentityStore::new(MemRegion::default(), store.file().clone());
    assert_eq!(via_region.load(), Some(id(42)));
    assert_eq!(via_file.load(), Some(id(42)));
}

#[test]
fn stored_identity_skips_registration() {
    let mut http = MockHttp::created("99");
    http.requests.clear();
    let mut svc = service_with(
        SystemConfig::default(),
        http,
        region_with(7),
        MemFile::default(),
    );
    let mut board = MockBoard::new();
    let mut sched = pochtomat::scheduler::Scheduler::from_config(svc.config());

    for t in (0..=3_000).step_by(100) {
        board.now_ms = t;
        svc.tick(&mut sched, &mut board);
    }
    assert_eq!(svc.context().identity, Some(id(7)));
    assert!(svc.registration_mut().http().requests.is_empty());
}
