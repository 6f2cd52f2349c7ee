use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use boostrap_agent::{Agent, inference};
use boostrap_game::{DebugMessages, DebugOverlay};

use crate::util::{self, Input, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Path to the policy model (ONNX). Heuristic control only when omitted
    #[arg(long, env = "BOOSTRAP_MODEL")]
    model: Option<PathBuf>,
    /// Index of the controlled player in each snapshot
    #[arg(
        long,
        env = "BOOSTRAP_AGENT_INDEX",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    agent_index: i32,
    /// Snapshot file (one JSON game state per line). Reads stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// Command output file (one JSON command per line). Writes stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Overlay that mirrors every change into the log.
#[derive(Debug, Default)]
struct LoggingOverlay {
    tick: usize,
    messages: DebugMessages,
}

impl DebugOverlay for LoggingOverlay {
    fn add_message(&mut self, message: &str) {
        tracing::info!(tick = self.tick, "overlay: {message}");
        self.messages.add_message(message);
    }

    fn clear(&mut self) {
        tracing::info!(
            tick = self.tick,
            cleared = self.messages.messages().len(),
            "overlay cleared"
        );
        self.messages.clear();
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        model,
        agent_index,
        input,
        output,
    } = arg;

    let loader = inference::default_loader();
    let mut agent = Agent::from_model_path(model.as_deref(), loader.as_ref());

    let mut input = Input::from_input_path(input.as_deref())?;
    let mut output = Output::from_output_path(output.clone())?;
    let source = input.display_path();
    tracing::info!(
        input = %source,
        output = %output.display_path(),
        inference = agent.has_inference(),
        agent_index,
        "playing snapshots"
    );

    let ticks = play_snapshots(
        &mut agent,
        *agent_index,
        input.reader(),
        &source,
        &mut output,
    )?;

    tracing::info!(
        ticks,
        touches = agent.heuristic().touches().total_touches(),
        "finished"
    );
    output.finish()
}

/// Runs one tick per snapshot and writes each command as a JSON line.
/// Returns the number of ticks played.
fn play_snapshots<R, W>(
    agent: &mut Agent,
    agent_index: i32,
    reader: R,
    source: &str,
    writer: &mut W,
) -> anyhow::Result<usize>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut overlay = LoggingOverlay::default();
    let mut ticks = 0_usize;
    util::for_each_snapshot(reader, source, |line_number, state| {
        overlay.tick = line_number;
        let command = agent.on_tick(&state, agent_index, &mut overlay);
        ticks += 1;
        util::write_json_line(writer, &command)
            .with_context(|| format!("Failed to write command for {source} line {line_number}"))
    })?;
    Ok(ticks)
}
