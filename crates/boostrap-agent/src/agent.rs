//! Per-tick decision making.

use std::path::Path;

use boostrap_game::{ControlCommand, DebugOverlay, GameState};

use crate::{
    action,
    heuristic::HeuristicFallback,
    inference::{InferenceAdapter, ModelLoader},
    observation::{self, OBS_SIZE, Observation},
};

/// The controller the transport calls once per tick.
///
/// Runs the policy model when one is loaded and falls back to
/// [`HeuristicFallback`] for any tick where the model cannot produce an
/// action. [`Agent::on_tick`] never fails.
#[derive(Debug)]
pub struct Agent {
    inference: Option<InferenceAdapter>,
    heuristic: HeuristicFallback,
    observation: Observation,
}

impl Agent {
    #[must_use]
    pub fn heuristic_only() -> Self {
        Self {
            inference: None,
            heuristic: HeuristicFallback::new(),
            observation: [0.0; OBS_SIZE],
        }
    }

    #[must_use]
    pub fn with_inference(adapter: InferenceAdapter) -> Self {
        Self {
            inference: Some(adapter),
            ..Self::heuristic_only()
        }
    }

    /// Builds an agent for `model_path`, downgrading to heuristic-only control
    /// when no path is given or the model cannot be loaded.
    #[must_use]
    pub fn from_model_path(model_path: Option<&Path>, loader: &dyn ModelLoader) -> Self {
        let Some(model_path) = model_path else {
            tracing::info!("no model configured, using heuristic control only");
            return Self::heuristic_only();
        };
        match InferenceAdapter::initialize(model_path, loader) {
            Ok(adapter) => {
                tracing::info!(path = %model_path.display(), "inference model loaded");
                Self::with_inference(adapter)
            }
            Err(err) => {
                tracing::warn!(
                    %err,
                    path = %model_path.display(),
                    "inference disabled, using heuristic control only"
                );
                Self::heuristic_only()
            }
        }
    }

    #[must_use]
    pub fn has_inference(&self) -> bool {
        self.inference.is_some()
    }

    #[must_use]
    pub fn heuristic(&self) -> &HeuristicFallback {
        &self.heuristic
    }

    /// Computes the command for the player at `agent_index`.
    pub fn on_tick(
        &mut self,
        state: &GameState,
        agent_index: i32,
        overlay: &mut dyn DebugOverlay,
    ) -> ControlCommand {
        if let Some(command) = self.infer(state, agent_index) {
            return command;
        }
        self.heuristic.decide(state, overlay)
    }

    fn infer(&mut self, state: &GameState, agent_index: i32) -> Option<ControlCommand> {
        let adapter = self.inference.as_ref()?;
        if !observation::populate(&mut self.observation, state, agent_index) {
            return None;
        }
        match adapter.run(&self.observation) {
            Ok(action) => Some(action::decode(Some(&*action))),
            Err(err) => {
                tracing::warn!(%err, "falling back to heuristic for this tick");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use boostrap_game::{BallInfo, DebugMessages, GameTick, Physics, PlayerInfo, Touch, Vector3};

    use super::*;
    use crate::{
        action::ACTION_SIZE,
        inference::{BackendError, BoxedInferenceBackend, InferenceBackend, UnsupportedLoader},
    };

    #[derive(Debug)]
    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn run(
            &mut self,
            _input: &[f32; OBS_SIZE],
            _output: &mut [f32; ACTION_SIZE],
        ) -> Result<(), BackendError> {
            Err(BackendError::new("session run failed"))
        }
    }

    /// Full throttle toward the ball, boosting when the agent has boost left.
    #[derive(Debug)]
    struct ChaseBackend;

    impl InferenceBackend for ChaseBackend {
        fn run(
            &mut self,
            input: &[f32; OBS_SIZE],
            output: &mut [f32; ACTION_SIZE],
        ) -> Result<(), BackendError> {
            let dx = input[0] - input[6];
            *output = [2.0, dx.signum(), 0.0, 0.0, 0.0, 0.0, input[18] / 100.0];
            Ok(())
        }
    }

    #[derive(Debug)]
    struct ChaseLoader;

    impl ModelLoader for ChaseLoader {
        fn load(&self, _model_path: &Path) -> Result<BoxedInferenceBackend, BackendError> {
            Ok(Box::new(ChaseBackend))
        }
    }

    fn snapshot(touch: f32, ball_x: f32, boost: i32) -> GameState {
        GameState::new(GameTick {
            ball: BallInfo {
                physics: Physics {
                    location: Vector3::new(ball_x, 0.0, 93.0),
                    ..Physics::default()
                },
                latest_touch: Touch {
                    game_seconds: touch,
                    player_index: 0,
                },
            },
            players: vec![PlayerInfo {
                physics: Physics::default(),
                boost,
            }],
        })
    }

    fn touch_sequence() -> Vec<GameState> {
        let mut states = vec![GameState::default(), snapshot(0.0, 10.0, 50)];
        for i in 1..=13 {
            let t = i as f32 * 0.5;
            states.push(snapshot(t, -10.0, 50));
            states.push(snapshot(t, 10.0, 50));
        }
        states
    }

    #[test]
    fn test_without_model_matches_heuristic() {
        let mut agent = Agent::heuristic_only();
        let mut heuristic = HeuristicFallback::new();
        let mut agent_overlay = DebugMessages::new();
        let mut heuristic_overlay = DebugMessages::new();

        for state in touch_sequence() {
            let expected = heuristic.decide(&state, &mut heuristic_overlay);
            assert_eq!(agent.on_tick(&state, 0, &mut agent_overlay), expected);
            assert_eq!(agent_overlay, heuristic_overlay);
        }
        assert_eq!(agent.heuristic(), &heuristic);
    }

    #[test]
    fn test_failing_model_matches_heuristic() {
        let mut agent =
            Agent::with_inference(InferenceAdapter::from_backend(Box::new(FailingBackend)));
        assert!(agent.has_inference());
        let mut heuristic = HeuristicFallback::new();
        let mut agent_overlay = DebugMessages::new();
        let mut heuristic_overlay = DebugMessages::new();

        for state in touch_sequence() {
            for agent_index in [0, 1, -1] {
                let expected = heuristic.decide(&state, &mut heuristic_overlay);
                let command = agent.on_tick(&state, agent_index, &mut agent_overlay);
                assert_eq!(command, expected);
                assert_eq!(agent_overlay, heuristic_overlay);
            }
        }
        assert_eq!(agent.heuristic(), &heuristic);
    }

    #[test]
    fn test_model_drives_when_available() {
        let mut agent = Agent::from_model_path(Some(Path::new("chase.onnx")), &ChaseLoader);
        assert!(agent.has_inference());
        let mut overlay = DebugMessages::new();

        let command = agent.on_tick(&snapshot(1.0, 500.0, 100), 0, &mut overlay);
        assert_eq!(
            command,
            ControlCommand {
                throttle: 1.0,
                steer: 1.0,
                boost: true,
                ..ControlCommand::NEUTRAL
            }
        );

        let command = agent.on_tick(&snapshot(2.0, -500.0, 20), 0, &mut overlay);
        assert_eq!(command.steer, -1.0);
        assert!(!command.boost);

        // Touches are only tracked on ticks the heuristic decides.
        assert_eq!(agent.heuristic().touches().total_touches(), 0);
        assert!(overlay.messages().is_empty());
    }

    #[test]
    fn test_model_skipped_without_payload() {
        let mut agent =
            Agent::with_inference(InferenceAdapter::from_backend(Box::new(ChaseBackend)));
        let mut overlay = DebugMessages::new();
        let command = agent.on_tick(&GameState::default(), 0, &mut overlay);
        assert_eq!(command, ControlCommand::NEUTRAL);
    }

    #[test]
    fn test_model_path_downgrades_to_heuristic() {
        assert!(!Agent::from_model_path(None, &ChaseLoader).has_inference());
        assert!(!Agent::from_model_path(Some(Path::new("")), &ChaseLoader).has_inference());
        assert!(
            !Agent::from_model_path(Some(Path::new("policy.onnx")), &UnsupportedLoader)
                .has_inference()
        );
    }

    #[test]
    fn test_snapshot_from_json_fixture() {
        let json = r#"{
            "game_tick": {
                "ball": {
                    "physics": { "location": { "x": 0.0, "y": 0.0, "z": 93.0 } },
                    "latest_touch": { "game_seconds": 4.25, "player_index": 1 }
                },
                "players": [
                    { "physics": { "location": { "x": 100.0, "y": 0.0, "z": 17.0 } }, "boost": 34 },
                    { "boost": 100 }
                ]
            }
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        let mut agent = Agent::heuristic_only();
        let mut overlay = DebugMessages::new();
        let command = agent.on_tick(&state, 0, &mut overlay);
        assert_eq!(command, ControlCommand::NEUTRAL);
        assert_eq!(overlay.last(), Some("The ball was touched 1 times"));
    }
}
