//! PIR motion sensor driver.
//!
//! Generic over any `embedded-hal` input pin so the same driver runs on
//! the board ([`GpioInput`](super::hw_init::GpioInput)) and in tests.
//! A pin read error is reported as "no motion".

use embedded_hal::digital::InputPin;
use log::warn;

pub struct PirSensor<P> {
    pin: P,
    read_errors: u32,
}

impl<P: InputPin> PirSensor<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            read_errors: 0,
        }
    }

    /// `true` while the sensor output is high.
    pub fn motion(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(level) => level,
            Err(_) => {
                self.read_errors = self.read_errors.saturating_add(1);
                if self.read_errors == 1 {
                    warn!("PIR: pin read failed, treating as idle");
                }
                false
            }
        }
    }

    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    struct FakePin {
        levels: Vec<Result<bool, ErrorKind>>,
    }

    impl ErrorType for FakePin {
        type Error = ErrorKind;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            self.levels.remove(0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|h| !h)
        }
    }

    #[test]
    fn follows_pin_level() {
        let mut pir = PirSensor::new(FakePin {
            levels: vec![Ok(false), Ok(true), Ok(true), Ok(false)],
        });
        let seen: Vec<bool> = (0..4).map(|_| pir.motion()).collect();
        assert_eq!(seen, vec![false, true, true, false]);
    }

    #[test]
    fn read_error_is_idle() {
        let mut pir = PirSensor::new(FakePin {
            levels: vec![Err(ErrorKind::Other), Ok(true)],
        });
        assert!(!pir.motion());
        assert!(pir.motion());
        assert_eq!(pir.read_errors(), 1);
    }
}
