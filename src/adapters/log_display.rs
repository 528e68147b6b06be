//! Log-backed display adapter.
//!
//! Implements [`DisplayPort`] by writing each new screen to the serial
//! logger.  Refreshes that repeat the previous screen are suppressed so a
//! 1 Hz clock refresh only logs when the minute rolls over.

use log::info;

use crate::app::ports::DisplayPort;
use crate::screen::{Line, MAX_LINES};

type Frame = heapless::Vec<Line, MAX_LINES>;

#[derive(Default)]
pub struct LogDisplay {
    last: Frame,
    renders: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screens actually written (duplicates excluded).
    pub fn renders(&self) -> u32 {
        self.renders
    }

    pub fn last_frame(&self) -> impl Iterator<Item = &str> {
        self.last.iter().map(heapless::String::as_str)
    }
}

fn to_frame(lines: &[&str]) -> Frame {
    let mut frame = Frame::new();
    for line in lines.iter().take(MAX_LINES) {
        let mut out = Line::new();
        for c in line.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        // Capacity is MAX_LINES and take() bounds the loop.
        let _ = frame.push(out);
    }
    frame
}

impl DisplayPort for LogDisplay {
    fn render(&mut self, lines: &[&str]) {
        let frame = to_frame(lines);
        if frame == self.last && self.renders > 0 {
            return;
        }
        info!("SCREEN | {}", lines.join(" | "));
        self.last = frame;
        self.renders += 1;
    }
}
