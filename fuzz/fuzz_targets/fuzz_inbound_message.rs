//! Fuzz target: `commands::decode`
//!
//! Feeds arbitrary session payloads into the inbound decoder and the
//! dispatcher.  Neither may panic, and a decoded message must drive the
//! door at most once.
//!
//! cargo fuzz run fuzz_inbound_message

#![no_main]

use libfuzzer_sys::fuzz_target;
use pochtomat::app::commands::decode;
use pochtomat::app::context::DeviceContext;
use pochtomat::app::ports::DoorActuatorPort;
use pochtomat::dispatcher;

struct CountingDoor(u32);

impl DoorActuatorPort for CountingDoor {
    fn set_open(&mut self, _open: bool) {
        self.0 += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = core::str::from_utf8(data) else {
        return;
    };

    let decoded = decode(payload);

    let mut ctx = DeviceContext::default();
    let mut door = CountingDoor(0);
    let outcome = dispatcher::dispatch(&mut ctx, payload, &mut door);

    assert!(door.0 <= 1, "one payload drives the door at most once");
    assert_eq!(outcome.door_event.is_some(), door.0 == 1);
    if decoded.is_err() {
        assert_eq!(door.0, 0, "rejected payloads never actuate");
    }
});
