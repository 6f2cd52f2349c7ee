use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use boostrap_agent::observation::{self, OBS_SIZE, ObservationSpace};

use crate::util::{self, Input, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ObserveArg {
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
    /// Output file (one JSON array per line). Writes stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ObserveArg) -> anyhow::Result<()> {
    let ObserveArg {
        agent_index,
        input,
        output,
    } = arg;

    let mut input = Input::from_input_path(input.as_deref())?;
    let mut output = Output::from_output_path(output.clone())?;
    let source = input.display_path();

    let counts = observe_snapshots(*agent_index, input.reader(), &source, &mut output)?;

    tracing::info!(
        written = counts.written,
        skipped = counts.skipped,
        "finished"
    );
    output.finish()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ObserveCounts {
    written: usize,
    skipped: usize,
}

/// Writes the observation of each snapshot as a JSON array line. Snapshots
/// without a tick payload are skipped.
fn observe_snapshots<R, W>(
    agent_index: i32,
    reader: R,
    source: &str,
    writer: &mut W,
) -> anyhow::Result<ObserveCounts>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let space = ObservationSpace::new();
    let mut buffer = [0.0; OBS_SIZE];
    let mut counts = ObserveCounts::default();
    util::for_each_snapshot(reader, source, |line_number, state| {
        if !observation::populate(&mut buffer, &state, agent_index) {
            tracing::warn!(line = line_number, "snapshot has no tick payload, skipped");
            counts.skipped += 1;
            return Ok(());
        }
        let out_of_bounds = space.out_of_bounds(&buffer).collect::<Vec<_>>();
        if !out_of_bounds.is_empty() {
            tracing::warn!(
                line = line_number,
                indices = ?out_of_bounds,
                "observation outside trained range"
            );
        }
        counts.written += 1;
        util::write_json_line(writer, &buffer).with_context(|| {
            format!("Failed to write observation for {source} line {line_number}")
        })
    })?;
    Ok(counts)
}
