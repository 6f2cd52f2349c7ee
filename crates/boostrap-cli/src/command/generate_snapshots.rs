use std::{array, path::PathBuf};

use boostrap_agent::observation::ObservationSpace;
use boostrap_game::{BallInfo, GameState, GameTick, Physics, PlayerInfo, Rotator, Touch, Vector3};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64;

use crate::util::Output;

const TICK_RATE: f64 = 120.0;

// Offsets into the observation layout.
const BALL_LOCATION: usize = 0;
const BALL_VELOCITY: usize = 3;
const AGENT_LOCATION: usize = 6;
const AGENT_VELOCITY: usize = 9;
const AGENT_ROTATION: usize = 12;
const AGENT_ANGULAR_VELOCITY: usize = 15;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct GenerateSnapshotsArg {
    /// Number of snapshots to generate
    #[arg(long, default_value_t = 1000)]
    count: usize,
    /// Number of players in each snapshot
    #[arg(long, default_value_t = 2)]
    players: usize,
    /// Probability that the ball is touched on a tick
    #[arg(long, default_value_t = 0.05)]
    touch_probability: f64,
    /// Random seed. A random seed is chosen and logged when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path. Writes stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateSnapshotsArg) -> anyhow::Result<()> {
    let GenerateSnapshotsArg {
        count,
        players,
        touch_probability,
        seed,
        output,
    } = arg;

    anyhow::ensure!(
        (0.0..=1.0).contains(touch_probability),
        "touch probability must be within [0, 1], got {touch_probability}"
    );

    let seed = seed.unwrap_or_else(|| rand::rng().random());
    tracing::info!(seed, count, players, "generating snapshots");
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut generator = SnapshotGenerator::new(*players, *touch_probability);

    let mut output = Output::from_output_path(output.clone())?;
    for _ in 0..*count {
        let state = generator.next_snapshot(&mut rng);
        output.write_json_line(&state)?;
    }
    output.finish()
}

/// Random game states drawn uniformly from the trained observation ranges.
#[derive(Debug)]
struct SnapshotGenerator {
    space: ObservationSpace,
    num_players: usize,
    touch_probability: f64,
    tick: u64,
    latest_touch: Touch,
}

impl SnapshotGenerator {
    fn new(num_players: usize, touch_probability: f64) -> Self {
        Self {
            space: ObservationSpace::new(),
            num_players,
            touch_probability,
            tick: 0,
            latest_touch: Touch::default(),
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    fn next_snapshot<R>(&mut self, rng: &mut R) -> GameState
    where
        R: Rng,
    {
        self.tick += 1;
        if self.num_players > 0 && rng.random_bool(self.touch_probability) {
            let player_index = rng.random_range(0..self.num_players) as i32;
            let game_seconds = (self.tick as f64 / TICK_RATE) as f32;
            // Late ticks can round to the previous touch time in f32.
            if game_seconds > self.latest_touch.game_seconds {
                self.latest_touch = Touch {
                    game_seconds,
                    player_index,
                };
            }
        }

        let ball = Physics {
            location: self.vector(rng, BALL_LOCATION),
            velocity: self.vector(rng, BALL_VELOCITY),
            ..Physics::default()
        };
        let players = (0..self.num_players)
            .map(|_| {
                let [pitch, yaw, roll] = self.sample(rng, AGENT_ROTATION);
                PlayerInfo {
                    physics: Physics {
                        location: self.vector(rng, AGENT_LOCATION),
                        velocity: self.vector(rng, AGENT_VELOCITY),
                        rotation: Rotator::new(pitch, yaw, roll),
                        angular_velocity: self.vector(rng, AGENT_ANGULAR_VELOCITY),
                    },
                    boost: rng.random_range(0..=100),
                }
            })
            .collect();

        GameState::new(GameTick {
            ball: BallInfo {
                physics: ball,
                latest_touch: self.latest_touch,
            },
            players,
        })
    }

    fn sample<R>(&self, rng: &mut R, start: usize) -> [f32; 3]
    where
        R: Rng,
    {
        let (low, high) = (self.space.low(), self.space.high());
        array::from_fn(|i| rng.random_range(low[start + i]..=high[start + i]))
    }

    fn vector<R>(&self, rng: &mut R, start: usize) -> Vector3
    where
        R: Rng,
    {
        let [x, y, z] = self.sample(rng, start);
        Vector3::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use boostrap_agent::observation::{self, OBS_SIZE};
    use rand::SeedableRng as _;

    use super::*;

    fn ball_touch(state: &GameState) -> Touch {
        state.game_tick().unwrap().ball.latest_touch
    }

    #[test]
    fn test_same_seed_same_snapshots() {
        let generate = |seed| {
            let mut rng = Pcg64::seed_from_u64(seed);
            let mut generator = SnapshotGenerator::new(2, 0.5);
            (0..20)
                .map(|_| generator.next_snapshot(&mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(generate(7), generate(7));
        assert_ne!(generate(7), generate(8));
    }

    #[test]
    fn test_snapshots_within_trained_range() {
        let mut rng = Pcg64::seed_from_u64(42);
        let mut generator = SnapshotGenerator::new(3, 0.3);
        let space = ObservationSpace::new();
        let mut buffer = [0.0; OBS_SIZE];
        for _ in 0..200 {
            let state = generator.next_snapshot(&mut rng);
            assert_eq!(state.game_tick().unwrap().players.len(), 3);
            for agent_index in 0..3 {
                assert!(observation::populate(&mut buffer, &state, agent_index));
                assert_eq!(space.out_of_bounds(&buffer).count(), 0);
            }
        }
    }

    #[test]
    fn test_touch_timestamps_increase() {
        let mut rng = Pcg64::seed_from_u64(3);
        let mut generator = SnapshotGenerator::new(2, 0.2);
        let mut last = 0.0;
        let mut touches = 0;
        for _ in 0..500 {
            let state = generator.next_snapshot(&mut rng);
            let touch = state.latest_touch_seconds().unwrap();
            assert!(touch >= last);
            if touch > last {
                touches += 1;
            }
            last = touch;
        }
        assert!(touches > 0);
    }

    #[test]
    fn test_touch_timestamps_increase_on_late_ticks() {
        let mut rng = Pcg64::seed_from_u64(5);
        let mut generator = SnapshotGenerator::new(2, 1.0);
        generator.tick = 1 << 40;
        let mut last = ball_touch(&generator.next_snapshot(&mut rng));
        for _ in 0..100 {
            let touch = ball_touch(&generator.next_snapshot(&mut rng));
            assert!(touch == last || touch.game_seconds > last.game_seconds);
            last = touch;
        }
    }

    #[test]
    fn test_no_players_never_touches() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut generator = SnapshotGenerator::new(0, 1.0);
        for _ in 0..10 {
            let state = generator.next_snapshot(&mut rng);
            assert_eq!(state.latest_touch_seconds(), Some(0.0));
        }
    }
}
