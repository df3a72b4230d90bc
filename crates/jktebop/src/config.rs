//! Engine configuration loaded from environment variables.

use std::path::{Path, PathBuf};

/// Default engine install / working directory.
pub const DEFAULT_JKTEBOP_DIR: &str = "~/jktebop/";

/// Default engine executable, resolved relative to the in-file directory.
pub const DEFAULT_JKTEBOP_PROGRAM: &str = "./jktebop";

/// Where the engine lives and how to invoke it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JktebopConfig {
    /// Engine directory, also the default working directory for tasks.
    pub dir: PathBuf,
    /// Engine executable.
    pub program: String,
}

impl Default for JktebopConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl JktebopConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var           | Default       |
    /// |-------------------|---------------|
    /// | `JKTEBOP_DIR`     | `~/jktebop/`  |
    /// | `JKTEBOP_PROGRAM` | `./jktebop`   |
    ///
    /// A leading `~` is expanded from `HOME` and the directory is made absolute.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let dir = lookup("JKTEBOP_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_JKTEBOP_DIR.into());

        let program = lookup("JKTEBOP_PROGRAM")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_JKTEBOP_PROGRAM.into());

        Self {
            dir: absolute(expand_home(&dir, lookup("HOME").as_deref())),
            program,
        }
    }
}

/// Expand a leading `~` using `home`. Paths without one are returned as-is.
fn expand_home(path: &str, home: Option<&str>) -> PathBuf {
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            Path::new(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
