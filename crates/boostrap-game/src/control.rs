use serde::{Deserialize, Serialize};

/// Controller input for one tick.
///
/// Analog axes are expected in `[-1.0, 1.0]`. The default value is the
/// neutral command: every axis centered and no button pressed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub throttle: f32,
    pub steer: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub jump: bool,
    pub boost: bool,
}

impl ControlCommand {
    pub const NEUTRAL: Self = Self {
        throttle: 0.0,
        steer: 0.0,
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
        jump: false,
        boost: false,
    };

    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}
