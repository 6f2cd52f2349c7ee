use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Orientation in radians.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    #[must_use]
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Returns `[pitch, yaw, roll]`.
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.pitch, self.yaw, self.roll]
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Physics {
    pub location: Vector3,
    pub velocity: Vector3,
    pub rotation: Rotator,
    pub angular_velocity: Vector3,
}

/// The most recent contact between a player and the ball.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Touch {
    /// Game clock at the moment of the touch. Zero means the ball has not
    /// been touched yet.
    pub game_seconds: f32,
    pub player_index: i32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallInfo {
    pub physics: Physics,
    pub latest_touch: Touch,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInfo {
    pub physics: Physics,
    /// Boost amount as reported by the framework, normally in `0..=100`.
    pub boost: i32,
}

/// Per-tick payload of a [`GameState`].
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTick {
    pub ball: BallInfo,
    pub players: Vec<PlayerInfo>,
}

impl GameTick {
    /// Returns the player at `index`, or `None` when the index is negative or
    /// past the end of the player list.
    #[must_use]
    pub fn player(&self, index: i32) -> Option<&PlayerInfo> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.players.get(index))
    }
}

/// Snapshot of the game delivered once per tick.
///
/// The framework may deliver snapshots without a tick payload (for example
/// before the match has started). Consumers must treat those as "nothing to
/// observe" rather than as an all-zero game.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub game_tick: Option<GameTick>,
}

impl GameState {
    #[must_use]
    pub fn new(game_tick: GameTick) -> Self {
        Self {
            game_tick: Some(game_tick),
        }
    }

    #[must_use]
    pub fn game_tick(&self) -> Option<&GameTick> {
        self.game_tick.as_ref()
    }

    /// Timestamp of the latest ball touch, if the snapshot carries a payload.
    #[must_use]
    pub fn latest_touch_seconds(&self) -> Option<f32> {
        self.game_tick
            .as_ref()
            .map(|tick| tick.ball.latest_touch.game_seconds)
    }
}
