//! Per-step dumps of the document pipelines

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Capture the local UTC offset for debug stamps.
///
/// Must run before the process spawns threads; `time` will not read the
/// offset from a multi-threaded process.
pub fn init_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

pub enum DebugData<'a> {
    Text(&'a str),
    Xml(&'a str),
    Json(Value),
}

impl DebugData<'_> {
    fn extension(&self) -> &'static str {
        match self {
            DebugData::Text(_) => "txt",
            DebugData::Xml(_) => "xml",
            DebugData::Json(_) => "json",
        }
    }
}

/// Writes `{dir}/{base}_{step}_{YYYYmmdd_HHMMSS}.{ext}` when enabled
#[derive(Debug, Clone)]
pub struct DebugSink {
    dir: PathBuf,
    enabled: bool,
}

impl DebugSink {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Dump one step. Failures are logged and otherwise ignored.
    pub fn save(&self, filename: &str, step: &str, data: DebugData<'_>) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }

        let base = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let path = self
            .dir
            .join(format!("{}_{}_{}.{}", base, step, timestamp(), data.extension()));

        let result = std::fs::create_dir_all(&self.dir).and_then(|_| match &data {
            DebugData::Text(s) | DebugData::Xml(s) => std::fs::write(&path, s),
            DebugData::Json(v) => {
                let body = serde_json::to_string_pretty(v).map_err(std::io::Error::other)?;
                std::fs::write(&path, body)
            }
        });

        match result {
            Ok(()) => {
                tracing::info!("debug output saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!("failed to save debug output {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn timestamp() -> String {
    let offset = LOCAL_OFFSET
        .get()
        .copied()
        .or_else(|| UtcOffset::current_local_offset().ok())
        .unwrap_or(UtcOffset::UTC);
    stamp(OffsetDateTime::now_utc(), offset)
}

fn stamp(now: OffsetDateTime, offset: UtcOffset) -> String {
    now.to_offset(offset)
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_default()
}
