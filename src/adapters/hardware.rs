//! Hardware adapter: bridges the board to the domain port traits.
//!
//! Owns the PIR sensor, door servo, display, WiFi link and clock and
//! exposes them through the five peripheral ports, so the service takes a
//! single `&mut impl DevicePorts`.  On non-espidf targets the underlying
//! drivers use their simulation stubs.

use embedded_hal::digital::InputPin;
use log::info;

use crate::adapters::log_display::LogDisplay;
use crate::adapters::time::TimeAdapter;
use crate::adapters::wifi::WifiAdapter;
use crate::app::ports::{ClockPort, DisplayPort, DoorActuatorPort, LinkPort, MotionSensorPort};
use crate::drivers::pir::PirSensor;
use crate::drivers::servo::ServoDriver;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P> {
    pir: PirSensor<P>,
    servo: ServoDriver,
    display: LogDisplay,
    wifi: WifiAdapter,
    clock: TimeAdapter,
}

impl<P: InputPin> HardwareAdapter<P> {
    pub fn new(
        pir: PirSensor<P>,
        servo: ServoDriver,
        display: LogDisplay,
        wifi: WifiAdapter,
        clock: TimeAdapter,
    ) -> Self {
        Self {
            pir,
            servo,
            display,
            wifi,
            clock,
        }
    }
}

// ── Peripheral ports ──────────────────────────────────────────

impl<P: InputPin> MotionSensorPort for HardwareAdapter<P> {
    fn sample(&mut self) -> bool {
        self.pir.motion()
    }
}

impl<P: InputPin> DoorActuatorPort for HardwareAdapter<P> {
    fn set_open(&mut self, open: bool) {
        self.servo.drive(open);
        info!(
            "DOOR | {} (angle={})",
            if open { "open" } else { "closed" },
            self.servo.angle().unwrap_or_default()
        );
    }
}

impl<P: InputPin> DisplayPort for HardwareAdapter<P> {
    fn render(&mut self, lines: &[&str]) {
        self.display.render(lines);
    }
}

impl<P: InputPin> LinkPort for HardwareAdapter<P> {
    fn is_up(&self) -> bool {
        self.wifi.is_up()
    }

    fn connect(&mut self) -> bool {
        self.wifi.connect()
    }
}

impl<P: InputPin> ClockPort for HardwareAdapter<P> {
    fn uptime_ms(&self) -> u64 {
        self.clock.uptime_ms()
    }

    fn epoch_secs(&self) -> u64 {
        self.clock.epoch_secs()
    }

    fn resync(&mut self) -> bool {
        self.clock.resync()
    }
}
