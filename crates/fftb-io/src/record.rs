//! Append-only JSON results log.
//!
//! The log is one JSON object keyed by local timestamp:
//!
//! ```text
//! {
//!     "2026-3-14 9:26:53": {
//!         "performance_results": { ... }
//!     },
//!     "2026-3-14 9:31:07": {
//!         "performance_results": { ... }
//!     }
//! }
//! ```
//!
//! Appending is textual. The existing document is kept byte-for-byte up to
//! the end of its last entry; only the closing brace is rewritten. The new
//! document goes to a temporary file next to the log and is renamed over it,
//! so an interrupted write never leaves a truncated log behind.

use crate::{IoError, IoResult};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// `strftime` pattern of log keys (`Y-M-D H:M:S`, unpadded).
pub const TIMESTAMP_FORMAT: &str = "%Y-%-m-%-d %-H:%-M:%-S";

const INDENT: &str = "    ";

/// Current local time formatted as a log key.
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Results log file.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    /// Log stored at `path`. Nothing is touched until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` under the current local timestamp.
    ///
    /// Returns the key actually used (see [`ResultLog::append_with_key`]).
    pub fn append<T: Serialize>(&self, record: &T) -> IoResult<String> {
        self.append_with_key(&timestamp_now(), record)
    }

    /// Appends `record` under `key`.
    ///
    /// A key already present gets a ` #2`, ` #3`… suffix. Returns the key
    /// written.
    ///
    /// # Errors
    ///
    /// - [`IoError::MalformedRecord`] if the existing file is not a JSON object
    /// - [`IoError::Serialize`] if `record` cannot be serialized
    /// - [`IoError::Io`] on read/write failure
    pub fn append_with_key<T: Serialize>(&self, key: &str, record: &T) -> IoResult<String> {
        let value = to_pretty(record)?;
        let existing = match fs::read_to_string(&self.path) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let (document, key) = match existing {
            None => {
                let key = key.to_string();
                (format!("{{\n{}\n}}\n", entry(&key, &value)), key)
            }
            Some(text) => {
                let entries = self.parse(&text)?;
                let key = unique_key(&entries, key);
                let prefix = body_prefix(&text);
                let separator = if entries.is_empty() { "\n" } else { ",\n" };
                (
                    format!("{prefix}{separator}{}\n}}\n", entry(&key, &value)),
                    key,
                )
            }
        };

        self.replace_with(&document)?;
        info!(path = %self.path.display(), key = %key, "results appended");
        Ok(key)
    }

    fn parse(&self, text: &str) -> IoResult<Map<String, Value>> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(self.malformed(format!("expected a JSON object, found {}", kind(&other)))),
            Err(e) => Err(self.malformed(e.to_string())),
        }
    }

    fn malformed(&self, reason: String) -> IoError {
        IoError::MalformedRecord {
            path: self.path.clone(),
            reason,
        }
    }

    fn replace_with(&self, document: &str) -> IoResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(document.as_bytes())?;
        tmp.flush()?;
        // The temp file starts owner-only; keep the log's existing mode.
        match fs::metadata(&self.path) {
            Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tmp.persist(&self.path).map_err(|e| IoError::Io(e.error))?;
        trace!(path = %self.path.display(), bytes = document.len(), "log persisted");
        Ok(())
    }
}

/// Pretty JSON with the log's four-space indentation.
fn to_pretty<T: Serialize>(value: &T) -> IoResult<String> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(out).map_err(|e| IoError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// `    "key": value` with `value` re-indented one level.
fn entry(key: &str, value: &str) -> String {
    let quoted = Value::String(key.to_string()).to_string();
    let body = value.replace('\n', &format!("\n{INDENT}"));
    format!("{INDENT}{quoted}: {body}")
}

/// Text up to the end of the last entry: everything before the closing
/// brace, minus trailing whitespace.
fn body_prefix(text: &str) -> &str {
    let end = text.rfind('}').unwrap_or(text.len());
    text[..end].trim_end()
}

fn unique_key(entries: &Map<String, Value>, key: &str) -> String {
    if !entries.contains_key(key) {
        return key.to_string();
    }
    (2..)
        .map(|n| format!("{key} #{n}"))
        .find(|k| !entries.contains_key(k))
        .unwrap_or_else(|| key.to_string())
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
