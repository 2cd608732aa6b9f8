//! Pull-to-Refresh Gesture
//!
//! Converts vertical drag distance on the scroll container into a damped
//! pull distance and decides, on release, whether a refresh should start.

/// Multiplier from raw finger travel to pull distance
pub const DAMPING: f64 = 0.4;

/// Hard cap on pull distance
pub const MAX_PULL: f64 = 80.0;

/// Pull distance that must be exceeded on release to refresh
pub const REFRESH_THRESHOLD: f64 = 50.0;

/// Indicator height and content offset while refreshing
pub const REFRESHING_OFFSET: f64 = 60.0;

/// Pull distance above which the indicator becomes visible
pub const INDICATOR_VISIBLE_AFTER: f64 = 10.0;

/// Outcome of lifting the finger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// Threshold crossed: pull distance is held until the refresh completes
    Refresh,
    /// Threshold not reached: pull distance was reset to zero
    Cancelled,
    /// No armed gesture was in progress
    Idle,
}

/// Transient per-touch gesture state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureController {
    /// Drag origin; `None` while disarmed
    origin: Option<f64>,

    /// Damped pull distance in `[0, MAX_PULL]`
    pull_distance: f64,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn pull_distance(&self) -> f64 {
        self.pull_distance
    }

    pub const fn is_armed(&self) -> bool {
        self.origin.is_some()
    }

    /// Arm the gesture only when the container is scrolled to the top.
    ///
    /// Negative offsets (overscroll bounce) count as top.
    pub fn on_touch_start(&mut self, y: f64, scroll_top: f64) {
        self.origin = (scroll_top <= 0.0).then_some(y);
        tracing::trace!(y, scroll_top, armed = self.is_armed(), "touch start");
    }

    /// Track the finger. Upward or zero travel leaves the distance as is.
    pub fn on_touch_move(&mut self, y: f64) {
        let Some(origin) = self.origin else {
            return;
        };

        let diff = y - origin;
        if diff > 0.0 {
            self.pull_distance = (diff * DAMPING).min(MAX_PULL);
        }
    }

    /// End the touch sequence. Always disarms.
    pub fn on_touch_end(&mut self) -> Release {
        let was_armed = self.origin.take().is_some();

        if self.pull_distance > REFRESH_THRESHOLD {
            Release::Refresh
        } else {
            self.pull_distance = 0.0;
            if was_armed { Release::Cancelled } else { Release::Idle }
        }
    }

    /// Collapse the indicator after a refresh
    pub const fn reset(&mut self) {
        self.pull_distance = 0.0;
    }
}
