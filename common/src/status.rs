use chrono::{DateTime, TimeZone};

use crate::{config::CadenceConfig, types::StatusSnapshot, Mode};

pub const DISPLAY_WIDTH: usize = 16;

/// What the second display line shows on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondLine {
    Temperature,
    ModeSetPoint,
}

/// Work the status loop owes for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub second_line: SecondLine,
    pub refresh_actuators: bool,
    pub send_telemetry: bool,
}

/// Alternation and telemetry counters. Both start at 1 and count the tick
/// being planned.
#[derive(Debug, Clone)]
pub struct StatusCadence {
    config: CadenceConfig,
    window_tick: u32,
    telemetry_tick: u32,
}

impl StatusCadence {
    pub fn new(config: CadenceConfig) -> Self {
        Self {
            config,
            window_tick: 1,
            telemetry_tick: 1,
        }
    }

    pub fn next_tick(&mut self) -> TickPlan {
        let second_line = if self.window_tick <= self.config.temperature_ticks {
            SecondLine::Temperature
        } else {
            SecondLine::ModeSetPoint
        };

        let refresh_actuators = self.window_tick >= self.config.window_ticks;
        self.window_tick = if refresh_actuators {
            1
        } else {
            self.window_tick + 1
        };

        let send_telemetry = self.telemetry_tick >= self.config.telemetry_every_ticks;
        self.telemetry_tick = if send_telemetry {
            1
        } else {
            self.telemetry_tick + 1
        };

        TickPlan {
            second_line,
            refresh_actuators,
            send_telemetry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub line1: String,
    pub line2: String,
}

impl DisplayFrame {
    /// Builds a frame with both lines fitted to the display width.
    pub fn new(line1: &str, line2: &str) -> Self {
        Self {
            line1: fit_line(line1),
            line2: fit_line(line2),
        }
    }

    pub fn compose<Tz: TimeZone>(
        now: &DateTime<Tz>,
        second_line: SecondLine,
        snapshot: &StatusSnapshot,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let line2 = match second_line {
            SecondLine::Temperature => temperature_line(snapshot.temperature_f),
            SecondLine::ModeSetPoint => mode_line(snapshot.mode, snapshot.set_point_f),
        };
        Self::new(&clock_line(now), &line2)
    }
}

pub fn fit_line(text: &str) -> String {
    let truncated: String = text.chars().take(DISPLAY_WIDTH).collect();
    format!("{truncated:<width$}", width = DISPLAY_WIDTH)
}

pub fn clock_line<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%m/%d %H:%M").to_string()
}

pub fn temperature_line(temperature_f: Option<f32>) -> String {
    match temperature_f {
        Some(temp) => format!("Temp: {temp:.1}F"),
        None => "Temp: --.-F".to_string(),
    }
}

pub fn mode_line(mode: Mode, set_point_f: i32) -> String {
    format!("{} {}F", mode.label(), set_point_f)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub mode: Mode,
    pub temperature_f: f32,
    pub set_point_f: i32,
}

impl TelemetryRecord {
    /// `None` until a temperature sample exists; the line has no placeholder.
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Option<Self> {
        Some(Self {
            mode: snapshot.mode,
            temperature_f: snapshot.temperature_f?,
            set_point_f: snapshot.set_point_f,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{},{:.1},{}\n",
            self.mode.as_str(),
            self.temperature_f,
            self.set_point_f
        )
    }
}
