//! Operator-tunable runtime defaults, distinct from the repository manifest.
//!
//! Read once at startup from `VCSPULL_CONFIGDIR/vcspull.toml`, or
//! `$XDG_CONFIG_HOME/vcspull/vcspull.toml` (`~/.config/vcspull/…` when
//! unset). A missing file is not an error: built-in defaults apply.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default worker-pool size for the sync executor.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VcspullConfig {
    /// Worker pool size for the sync executor.
    pub max_concurrent: usize,
    /// Whether the planner may refresh remote state with a best-effort
    /// fetch before deciding on an action.
    pub fetch: bool,
    /// Per-subprocess timeout; `None` means no timeout.
    pub timeout_secs: Option<u64>,
}

impl Default for VcspullConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            fetch: true,
            timeout_secs: None,
        }
    }
}

impl VcspullConfig {
    /// Load from the conventional path, falling back to defaults when the
    /// file is absent. Malformed TOML is still an error.
    pub fn load() -> anyhow::Result<Self> {
        let Some(path) = config_path() else {
            return Ok(Self::default());
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config: Self = toml::from_str(&contents)
                    .map_err(|e| anyhow::anyhow!("invalid config at {}: {e}", path.display()))?;
                log::debug!("loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!("reading {}: {e}", path.display())),
        }
    }
}

/// Resolve the conventional config file path without reading it.
///
/// Priority: `VCSPULL_CONFIGDIR`, then `$XDG_CONFIG_HOME/vcspull`, then
/// `~/.config/vcspull`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("VCSPULL_CONFIGDIR") {
        return Some(PathBuf::from(dir).join("vcspull.toml"));
    }
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir).join("vcspull").join("vcspull.toml"));
    }
    dirs::home_dir().map(|home| home.join(".config").join("vcspull").join("vcspull.toml"))
}
