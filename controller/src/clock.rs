use chrono::{Local, Utc};
use chrono_tz::Tz;
use thermostat_common::{DisplayFrame, SecondLine, StatusSnapshot};
use tracing::warn;

/// Wall clock used for the first display line.
#[derive(Debug, Clone, Copy)]
pub enum DisplayClock {
    Local,
    Zone(Tz),
}

impl DisplayClock {
    pub fn from_timezone(timezone: &str) -> Self {
        if timezone.is_empty() {
            return Self::Local;
        }
        match timezone.parse::<Tz>() {
            Ok(tz) => Self::Zone(tz),
            Err(err) => {
                warn!("invalid timezone {timezone:?} ({err}), using local time");
                Self::Local
            }
        }
    }

    pub fn frame(&self, second_line: SecondLine, snapshot: &StatusSnapshot) -> DisplayFrame {
        match self {
            Self::Local => DisplayFrame::compose(&Local::now(), second_line, snapshot),
            Self::Zone(tz) => {
                DisplayFrame::compose(&Utc::now().with_timezone(tz), second_line, snapshot)
            }
        }
    }
}
