//! 1-D plotting through an external `gnuplot` process.
//!
//! The series is written as a two-column `index value` text file, then
//! gnuplot is driven over stdin. A missing or failing gnuplot only produces
//! a warning; the data file stays behind either way.

use crate::IoResult;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::{Command, Stdio};
#[allow(unused_imports)]
use tracing::{debug, warn};

/// Default data file for plotted series.
pub const DEFAULT_SERIES_FILE: &str = "cosine_data.txt";

/// Writes `values` as `index value` lines.
pub fn write_series<P: AsRef<Path>>(path: P, values: &[f64]) -> IoResult<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for (i, v) in values.iter().enumerate() {
        writeln!(out, "{i} {v}")?;
    }
    out.flush()?;
    Ok(())
}

/// gnuplot commands plotting `data` as a line titled `title`.
pub fn gnuplot_script(title: &str, data: &Path) -> String {
    let title = title.replace('"', "\\\"");
    let data = data.display().to_string().replace('\'', "''");
    format!("set title \"{title}\"\nplot '{data}' with line\n")
}

/// Writes `values` to `data` and plots them with `gnuplot -persistent`.
///
/// Returns whether gnuplot ran successfully.
///
/// # Errors
///
/// Only failures writing the data file; plotter failures are logged.
pub fn plot_1d<P: AsRef<Path>>(data: P, title: &str, values: &[f64]) -> IoResult<bool> {
    let data = data.as_ref();
    write_series(data, values)?;
    debug!(path = %data.display(), samples = values.len(), "series written");

    match run_gnuplot(&gnuplot_script(title, data)) {
        Ok(true) => Ok(true),
        Ok(false) => {
            warn!("gnuplot exited with an error");
            Ok(false)
        }
        Err(e) => {
            warn!(error = %e, "cannot run gnuplot, skipping plot");
            Ok(false)
        }
    }
}

fn run_gnuplot(script: &str) -> io::Result<bool> {
    let mut command = Command::new("gnuplot");
    command
        .arg("-persistent")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    feed_script(command, script)
}

/// Spawns `command`, writes `script` to its stdin and waits for it.
fn feed_script(mut command: Command, script: &str) -> io::Result<bool> {
    let mut child = command.spawn()?;
    let written = match child.stdin.take() {
        // stdin is dropped at the end of the arm so the child sees EOF.
        Some(mut stdin) => stdin.write_all(script.as_bytes()),
        None => Err(io::Error::other("plotter stdin unavailable")),
    };
    // Reap the child on every path.
    let status = child.wait()?;
    written?;
    Ok(status.success())
}
