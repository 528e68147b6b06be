//! Screen layouts.
//!
//! Builds the few fixed text layouts the device shows and pushes them to
//! a [`DisplayPort`].  Lines longer than [`LINE_WIDTH`] are cut.

use core::fmt::Write;

use crate::app::commands::ScreenMode;
use crate::app::context::DeviceContext;
use crate::app::events::format_timestamp;
use crate::app::ports::DisplayPort;
use crate::session::SessionState;

pub const LINE_WIDTH: usize = 24;
pub const MAX_LINES: usize = 4;

pub type Line = heapless::String<LINE_WIDTH>;

/// One full screen of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    lines: heapless::Vec<Line, MAX_LINES>,
}

impl Screen {
    fn from_lines(lines: &[&str]) -> Self {
        let mut s = Self::default();
        for l in lines {
            s.push(l);
        }
        s
    }

    fn push(&mut self, text: &str) {
        let mut line = Line::new();
        for c in text.chars() {
            if line.push(c).is_err() {
                break;
            }
        }
        let _ = self.lines.push(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(Line::as_str)
    }

    pub fn show(&self, display: &mut impl DisplayPort) {
        let refs: heapless::Vec<&str, MAX_LINES> = self.lines().collect();
        display.render(&refs);
    }
}

pub fn booting() -> Screen {
    Screen::from_lines(&["Pochtomat", "booting..."])
}

pub fn link_failed() -> Screen {
    Screen::from_lines(&["WiFi error", "Rebooting..."])
}

pub fn fatal(reason: &str) -> Screen {
    Screen::from_lines(&["Init error", reason, "Rebooting..."])
}

/// The periodic screen: clock or last mail, plus a status line.
pub fn status(ctx: &DeviceContext, session: SessionState, epoch_secs: u64) -> Screen {
    let mut s = Screen::default();
    match ctx.screen_mode {
        ScreenMode::Clock => {
            let ts = format_timestamp(epoch_secs);
            let (date, time) = ts.split_once(' ').unwrap_or((ts.as_str(), ""));
            s.push(date);
            s.push(time);
        }
        ScreenMode::LastMail => {
            s.push("Last mail:");
            s.push(ctx.last_mail_time.as_deref().unwrap_or("N/A"));
        }
    }

    let mut line = Line::new();
    let _ = match ctx.identity {
        Some(id) => write!(line, "{} #{}", session.label(), id),
        None => write!(line, "{} #--", session.label()),
    };
    s.push(&line);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::Timestamp;
    use crate::identity::DeviceId;

    fn lines(s: &Screen) -> Vec<&str> {
        s.lines().collect()
    }

    #[test]
    fn clock_mode_splits_date_and_time() {
        let ctx = DeviceContext::new(DeviceId::from_raw(42));
        let s = status(&ctx, SessionState::Registered, 1_714_550_400);
        assert_eq!(lines(&s), vec!["2024-05-01", "08:00:00", "registered #42"]);
    }

    #[test]
    fn last_mail_mode_without_mail() {
        let mut ctx = DeviceContext::default();
        ctx.screen_mode = ScreenMode::LastMail;
        let s = status(&ctx, SessionState::Disconnected, 0);
        assert_eq!(lines(&s), vec!["Last mail:", "N/A", "offline #--"]);
    }

    #[test]
    fn last_mail_mode_with_mail() {
        let mut ctx = DeviceContext::default();
        ctx.screen_mode = ScreenMode::LastMail;
        let mut ts = Timestamp::new();
        ts.push_str("2024-05-01 08:00:00").unwrap();
        ctx.last_mail_time = Some(ts);
        let s = status(&ctx, SessionState::Connected, 0);
        assert_eq!(lines(&s)[1], "2024-05-01 08:00:00");
    }

    #[test]
    fn long_lines_are_cut() {
        let s = fatal("a reason far longer than the panel is wide");
        assert_eq!(lines(&s)[1].len(), LINE_WIDTH);
    }
}
