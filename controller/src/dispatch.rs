use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::control::SharedControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    CycleMode,
    RaiseSetPoint,
    LowerSetPoint,
}

impl InputSource {
    /// Declaration order; doubles as the dispatch table layout.
    pub const ALL: [InputSource; 3] = [
        InputSource::CycleMode,
        InputSource::RaiseSetPoint,
        InputSource::LowerSetPoint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CycleMode => "cycle-mode",
            Self::RaiseSetPoint => "raise-set-point",
            Self::LowerSetPoint => "lower-set-point",
        }
    }

    /// Console spelling used by the host input source.
    #[cfg(any(test, not(feature = "rpi")))]
    pub fn from_command(command: &str) -> Option<Self> {
        match command.trim().to_ascii_lowercase().as_str() {
            "m" | "mode" => Some(Self::CycleMode),
            "+" | "up" => Some(Self::RaiseSetPoint),
            "-" | "down" => Some(Self::LowerSetPoint),
            _ => None,
        }
    }
}

type Handler = Box<dyn FnMut() + Send>;

fn handler_for(source: InputSource, control: SharedControl) -> Handler {
    match source {
        InputSource::CycleMode => Box::new(move || {
            control.with(|control| control.advance_mode());
        }),
        InputSource::RaiseSetPoint => Box::new(move || {
            control.with(|control| control.raise_set_point());
        }),
        InputSource::LowerSetPoint => Box::new(move || {
            control.with(|control| control.lower_set_point());
        }),
    }
}

/// Table from input source to its handler.
///
/// Each entry sits behind its own lock: a source cannot re-enter its handler
/// while a previous press is still running, but different sources proceed
/// independently and only meet on the shared controller lock.
#[derive(Clone)]
pub struct InputDispatcher {
    table: Arc<[Mutex<Handler>; 3]>,
}

impl InputDispatcher {
    pub fn new(control: SharedControl) -> Self {
        let table = InputSource::ALL.map(|source| Mutex::new(handler_for(source, control.clone())));
        Self {
            table: Arc::new(table),
        }
    }

    pub fn dispatch(&self, source: InputSource) {
        debug!("input event {}", source.as_str());
        let mut handler = self.table[source as usize]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        handler();
    }

    /// Callback suitable for handing to an interrupt-driven input source.
    #[cfg(any(test, feature = "rpi"))]
    pub fn callback(&self, source: InputSource) -> impl FnMut() + Send + 'static {
        let dispatcher = self.clone();
        move || dispatcher.dispatch(source)
    }
}
