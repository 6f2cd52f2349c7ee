//! Feature extraction: game-state snapshot to observation vector.
//!
//! The observation layout is part of the model contract shared with the
//! training pipeline. Changing the order or the length of any field is a
//! breaking change for every exported model.
//!
//! ```text
//! [0..3)   ball position
//! [3..6)   ball velocity
//! [6..9)   agent position
//! [9..12)  agent velocity
//! [12..15) agent rotation (pitch, yaw, roll)
//! [15..18) agent angular velocity
//! [18]     agent boost
//! [19..25) reserved, always zero
//! ```

use std::f32::consts::PI;

use boostrap_game::GameState;

/// Number of values describing the ball.
pub const BALL_FEATURES: usize = 6;
/// Number of values describing the controlled agent.
pub const AGENT_FEATURES: usize = 13;
/// Number of reserved values at the end of the observation.
pub const OBS_PADDING: usize = 6;
/// Length of the observation vector.
pub const OBS_SIZE: usize = BALL_FEATURES + AGENT_FEATURES + OBS_PADDING;

const AGENT_OFFSET: usize = BALL_FEATURES;
const BOOST_INDEX: usize = AGENT_OFFSET + AGENT_FEATURES - 1;
const MAX_BOOST: u8 = 100;

pub type Observation = [f32; OBS_SIZE];

/// Writes the observation for the player at `agent_index` into `buffer`.
///
/// Returns `false` and leaves `buffer` untouched when the buffer is shorter
/// than [`OBS_SIZE`] or the snapshot has no tick payload. In that case there
/// is no observation for this tick and the previous buffer contents must not
/// be used.
///
/// An `agent_index` that does not select a player is not an error: the agent
/// fields are left at zero.
pub fn populate(buffer: &mut [f32], state: &GameState, agent_index: i32) -> bool {
    let Some(tick) = state.game_tick() else {
        return false;
    };
    let Some(buffer) = buffer.get_mut(..OBS_SIZE) else {
        return false;
    };

    let ball = &tick.ball.physics;
    buffer[0..3].copy_from_slice(&ball.location.to_array());
    buffer[3..6].copy_from_slice(&ball.velocity.to_array());

    buffer[AGENT_OFFSET..].fill(0.0);
    if let Some(player) = tick.player(agent_index) {
        let physics = &player.physics;
        buffer[6..9].copy_from_slice(&physics.location.to_array());
        buffer[9..12].copy_from_slice(&physics.velocity.to_array());
        buffer[12..15].copy_from_slice(&physics.rotation.to_array());
        buffer[15..18].copy_from_slice(&physics.angular_velocity.to_array());
        if let Some(boost) = u8::try_from(player.boost)
            .ok()
            .filter(|boost| *boost <= MAX_BOOST)
        {
            buffer[BOOST_INDEX] = f32::from(boost);
        }
    }

    true
}

/// Value ranges the policy was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSpace {
    low: Observation,
    high: Observation,
}

impl Default for ObservationSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationSpace {
    const FIELD_EXTENT: f32 = 4096.0;
    const MAX_SPEED: f32 = 2300.0;
    const MAX_ANGULAR_SPEED: f32 = 5.5;

    #[must_use]
    pub fn new() -> Self {
        let mut low = [0.0; OBS_SIZE];
        let mut high = [0.0; OBS_SIZE];
        let ranges: [(usize, usize, f32, f32); 8] = [
            (0, 3, -Self::FIELD_EXTENT, Self::FIELD_EXTENT),
            (3, 6, -Self::MAX_SPEED, Self::MAX_SPEED),
            (6, 9, -Self::FIELD_EXTENT, Self::FIELD_EXTENT),
            (9, 12, -Self::MAX_SPEED, Self::MAX_SPEED),
            (12, 15, -PI, PI),
            (15, 18, -Self::MAX_ANGULAR_SPEED, Self::MAX_ANGULAR_SPEED),
            (BOOST_INDEX, BOOST_INDEX + 1, 0.0, f32::from(MAX_BOOST)),
            (BOOST_INDEX + 1, OBS_SIZE, -1.0, 1.0),
        ];
        for (start, end, lo, hi) in ranges {
            low[start..end].fill(lo);
            high[start..end].fill(hi);
        }
        Self { low, high }
    }

    #[must_use]
    pub fn low(&self) -> &Observation {
        &self.low
    }

    #[must_use]
    pub fn high(&self) -> &Observation {
        &self.high
    }

    /// Indices of `observation` whose values fall outside the trained range.
    pub fn out_of_bounds<'a>(
        &'a self,
        observation: &'a [f32],
    ) -> impl Iterator<Item = usize> + 'a {
        observation
            .iter()
            .zip(self.low.iter().zip(&self.high))
            .enumerate()
            .filter(|(_, (value, (low, high)))| !(**low..=**high).contains(*value))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use boostrap_game::{BallInfo, GameTick, Physics, PlayerInfo, Rotator, Vector3};

    use super::*;

    fn physics(base: f32) -> Physics {
        Physics {
            location: Vector3::new(base, base + 1.0, base + 2.0),
            velocity: Vector3::new(base + 3.0, base + 4.0, base + 5.0),
            rotation: Rotator::new(0.1, 0.2, 0.3),
            angular_velocity: Vector3::new(1.0, 2.0, 3.0),
        }
    }

    fn state(num_players: usize) -> GameState {
        GameState::new(GameTick {
            ball: BallInfo {
                physics: physics(100.0),
                ..BallInfo::default()
            },
            players: (0..num_players)
                .map(|i| PlayerInfo {
                    physics: physics(10.0 * (i + 1) as f32),
                    boost: 42,
                })
                .collect(),
        })
    }

    #[test]
    fn test_populate_layout() {
        let mut buffer = [f32::NAN; OBS_SIZE];
        assert!(populate(&mut buffer, &state(2), 1));

        assert_eq!(buffer[0..6], [100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        assert_eq!(buffer[6..12], [20.0, 21.0, 22.0, 23.0, 24.0, 25.0]);
        assert_eq!(buffer[12..15], [0.1, 0.2, 0.3]);
        assert_eq!(buffer[15..18], [1.0, 2.0, 3.0]);
        assert_eq!(buffer[18], 42.0);
        assert!(buffer[19..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_out_of_range_agent_leaves_agent_fields_zero() {
        for agent_index in [-1, 2, 3, i32::MAX, i32::MIN] {
            let mut buffer = [f32::NAN; OBS_SIZE];
            assert!(populate(&mut buffer, &state(2), agent_index));
            assert_eq!(buffer[0], 100.0);
            assert!(buffer[AGENT_OFFSET..].iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn test_no_payload_is_noop() {
        let mut buffer = [7.0; OBS_SIZE];
        assert!(!populate(&mut buffer, &GameState::default(), 0));
        assert!(buffer.iter().all(|v| *v == 7.0));
    }

    #[test]
    fn test_short_buffer_is_noop() {
        let mut buffer = [7.0; OBS_SIZE - 1];
        assert!(!populate(&mut buffer, &state(1), 0));
        assert!(buffer.iter().all(|v| *v == 7.0));
    }

    #[test]
    fn test_longer_buffer_only_writes_prefix() {
        let mut buffer = [7.0; OBS_SIZE + 3];
        assert!(populate(&mut buffer, &state(1), 0));
        assert!(buffer[19..OBS_SIZE].iter().all(|v| *v == 0.0));
        assert!(buffer[OBS_SIZE..].iter().all(|v| *v == 7.0));
    }

    #[test]
    fn test_boost_outside_range_is_ignored() {
        for boost in [-1, 101, i32::MAX] {
            let mut state = state(1);
            state.game_tick.as_mut().unwrap().players[0].boost = boost;
            let mut buffer = [f32::NAN; OBS_SIZE];
            assert!(populate(&mut buffer, &state, 0));
            assert_eq!(buffer[BOOST_INDEX], 0.0);
        }
    }

    #[test]
    fn test_stale_agent_fields_are_cleared() {
        let mut buffer = [0.0; OBS_SIZE];
        assert!(populate(&mut buffer, &state(1), 0));
        assert_eq!(buffer[18], 42.0);
        assert!(populate(&mut buffer, &state(1), 5));
        assert!(buffer[AGENT_OFFSET..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_observation_space_bounds() {
        let space = ObservationSpace::new();
        assert_eq!(space.low()[0], -4096.0);
        assert_eq!(space.high()[5], 2300.0);
        assert_eq!(space.high()[12], PI);
        assert_eq!(space.low()[17], -5.5);
        assert_eq!((space.low()[18], space.high()[18]), (0.0, 100.0));
        assert_eq!(space.high()[OBS_SIZE - 1], 1.0);

        let mut buffer = [0.0; OBS_SIZE];
        assert!(populate(&mut buffer, &state(1), 0));
        assert_eq!(space.out_of_bounds(&buffer).count(), 0);

        buffer[3] = 5000.0;
        buffer[18] = -1.0;
        assert_eq!(space.out_of_bounds(&buffer).collect::<Vec<_>>(), [3, 18]);
    }
}
