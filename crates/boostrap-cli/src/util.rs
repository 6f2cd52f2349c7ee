use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, StdinLock, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use boostrap_game::GameState;

/// Destination of a command's newline-delimited JSON output.
#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    /// Writes `value` as a single line of JSON.
    pub fn write_json_line<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        write_json_line(self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))
    }

    pub fn finish(mut self) -> anyhow::Result<()> {
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Source of newline-delimited JSON snapshots.
#[derive(Debug)]
pub enum Input {
    Stdin { reader: StdinLock<'static> },
    File { reader: BufReader<File>, path: PathBuf },
}

impl Input {
    pub fn from_input_path(input_path: Option<&Path>) -> anyhow::Result<Self> {
        match input_path {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open input file: {}", path.display()))?;
                Ok(Input::File {
                    reader: BufReader::new(file),
                    path: path.to_path_buf(),
                })
            }
            None => Ok(Input::Stdin {
                reader: io::stdin().lock(),
            }),
        }
    }

    pub fn display_path(&self) -> String {
        match self {
            Input::Stdin { .. } => "stdin".to_string(),
            Input::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn reader(&mut self) -> &mut dyn BufRead {
        match self {
            Input::Stdin { reader } => reader,
            Input::File { reader, .. } => reader,
        }
    }
}

/// Writes `value` followed by a newline.
pub fn write_json_line<W, T>(writer: &mut W, value: &T) -> anyhow::Result<()>
where
    W: io::Write + ?Sized,
    T: serde::Serialize + ?Sized,
{
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Reads newline-delimited JSON snapshots from `reader`, calling `f` with the
/// 1-based line number of each one. Blank lines are skipped; the first
/// unreadable or malformed line stops the loop. `source` names the reader in
/// error messages.
pub fn for_each_snapshot<R, F>(reader: R, source: &str, mut f: F) -> anyhow::Result<()>
where
    R: BufRead,
    F: FnMut(usize, GameState) -> anyhow::Result<()>,
{
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("Failed to read {source} line {line_number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let state = parse_snapshot(&line)
            .with_context(|| format!("Invalid snapshot at {source} line {line_number}"))?;
        f(line_number, state)?;
    }
    Ok(())
}

pub fn parse_snapshot(line: &str) -> anyhow::Result<GameState> {
    let state = serde_json::from_str(line)?;
    Ok(state)
}
