//! Fallback controller used when no policy model is available.
//!
//! The controller counts ball touches and reports the count on the debug
//! overlay. After [`TOUCH_LIMIT`] touches, the next touch clears the overlay,
//! resets the count, and jumps. Every other axis stays neutral. This is not
//! meant to play well; it keeps the agent responsive and visibly alive.

use boostrap_game::{ControlCommand, DebugOverlay, GameState};

/// Number of touches reported before the counter wraps around.
pub const TOUCH_LIMIT: u32 = 10;

/// Ball-touch bookkeeping for one session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TouchTracker {
    last_touch: f32,
    total_touches: u32,
}

impl TouchTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the last counted touch, zero before the first one.
    #[must_use]
    pub fn last_touch(&self) -> f32 {
        self.last_touch
    }

    #[must_use]
    pub fn total_touches(&self) -> u32 {
        self.total_touches
    }

    /// Records the snapshot's latest touch.
    ///
    /// Returns the updated touch count when the snapshot reports a new,
    /// non-zero touch timestamp, and `None` otherwise.
    #[expect(clippy::float_cmp)]
    pub fn observe(&mut self, state: &GameState) -> Option<u32> {
        let touched_at = state.latest_touch_seconds()?;
        if touched_at == 0.0 || touched_at == self.last_touch {
            return None;
        }
        self.last_touch = touched_at;
        self.total_touches += 1;
        Some(self.total_touches)
    }

    fn reset_count(&mut self) {
        self.total_touches = 0;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeuristicFallback {
    touches: TouchTracker,
}

impl HeuristicFallback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn touches(&self) -> &TouchTracker {
        &self.touches
    }

    /// Computes the command for one tick, updating touch tracking and the
    /// debug overlay.
    pub fn decide(
        &mut self,
        state: &GameState,
        overlay: &mut dyn DebugOverlay,
    ) -> ControlCommand {
        let mut command = ControlCommand::NEUTRAL;
        match self.touches.observe(state) {
            Some(count) if count <= TOUCH_LIMIT => {
                tracing::debug!(count, "ball touched");
                overlay.add_message(&format!("The ball was touched {count} times"));
            }
            Some(count) => {
                tracing::debug!(count, "touch limit exceeded, jumping");
                overlay.clear();
                self.touches.reset_count();
                command.jump = true;
            }
            None => {}
        }
        command
    }
}
