//! Action decoding: policy output vector to [`ControlCommand`].

use boostrap_game::ControlCommand;

/// Length of the action vector produced by the policy.
pub const ACTION_SIZE: usize = 7;

pub const INDEX_THROTTLE: usize = 0;
pub const INDEX_STEER: usize = 1;
pub const INDEX_PITCH: usize = 2;
pub const INDEX_YAW: usize = 3;
pub const INDEX_ROLL: usize = 4;
pub const INDEX_JUMP: usize = 5;
pub const INDEX_BOOST: usize = 6;

/// Digital outputs strictly above this value are pressed.
pub const DIGITAL_THRESHOLD: f32 = 0.5;

pub type Action = [f32; ACTION_SIZE];

/// Converts a policy output into a control command.
///
/// A missing action, or one shorter than [`ACTION_SIZE`], decodes to
/// [`ControlCommand::NEUTRAL`]. Extra trailing values are ignored.
///
/// All five analog axes are clamped to `[-1.0, 1.0]`; NaN reads as a
/// centered axis.
// TODO: yaw and roll may need their own ranges once the trained policy's
// output scale is known; every analog axis is clamped the same way for now.
#[must_use]
pub fn decode(action: Option<&[f32]>) -> ControlCommand {
    let Some(action) = action.filter(|action| action.len() >= ACTION_SIZE) else {
        return ControlCommand::NEUTRAL;
    };
    let axis = |index: usize| {
        let value = action[index];
        if value.is_nan() {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        }
    };
    let pressed = |index: usize| action[index] > DIGITAL_THRESHOLD;
    ControlCommand {
        throttle: axis(INDEX_THROTTLE),
        steer: axis(INDEX_STEER),
        pitch: axis(INDEX_PITCH),
        yaw: axis(INDEX_YAW),
        roll: axis(INDEX_ROLL),
        jump: pressed(INDEX_JUMP),
        boost: pressed(INDEX_BOOST),
    }
}
