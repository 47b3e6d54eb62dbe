//! Simulated upload progress.
//!
//! The storage API gives no transfer events, so the admin upload bar is a
//! timer-driven animation. It is labeled as simulated in the UI and never
//! reaches 100 until the upload has actually resolved.

use std::time::Duration;

use serde::Serialize;

/// Percentage points added per tick.
pub const STEP: u8 = 5;
/// Time between ticks.
pub const INTERVAL: Duration = Duration::from_millis(150);
/// Highest value reachable by ticking alone.
pub const CAP: u8 = 90;

/// Where an upload stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    InFlight,
    Done,
    Failed,
}

/// A cosmetic progress value for one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulatedProgress {
    percent: u8,
    state: UploadState,
    /// Always `true`; lets the client label the bar honestly.
    simulated: bool,
}

impl Default for SimulatedProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProgress {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            percent: 0,
            state: UploadState::InFlight,
            simulated: true,
        }
    }

    /// Advance by one tick: `+5` while below 90.
    #[must_use]
    pub const fn tick(self) -> Self {
        if !matches!(self.state, UploadState::InFlight) || self.percent >= CAP {
            return self;
        }
        let next = self.percent + STEP;
        Self {
            percent: if next > CAP { CAP } else { next },
            ..self
        }
    }

    /// The upload resolved successfully.
    #[must_use]
    pub const fn finish(self) -> Self {
        Self {
            percent: 100,
            state: UploadState::Done,
            ..self
        }
    }

    /// The upload failed; the bar resets.
    #[must_use]
    pub const fn fail(self) -> Self {
        Self {
            percent: 0,
            state: UploadState::Failed,
            ..self
        }
    }

    #[must_use]
    pub const fn percent(self) -> u8 {
        self.percent
    }

    #[must_use]
    pub const fn state(self) -> UploadState {
        self.state
    }
}
