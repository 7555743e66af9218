//! Reading and writing the JSON config file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use tcpwatch_core::MonitorConfig;

/// Read the config at `path`. `Ok(None)` when the file does not exist.
pub fn load(path: &Path) -> Result<Option<MonitorConfig>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let config = MonitorConfig::from_json_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(config))
}

/// Like [`load`], but a broken file is logged and treated as absent.
pub fn load_or_none(path: &Path) -> Option<MonitorConfig> {
    match load(path) {
        Ok(Some(config)) => {
            info!(path = %path.display(), hosts = config.hosts.len(), "config loaded");
            Some(config)
        }
        Ok(None) => {
            debug!(path = %path.display(), "no config file");
            None
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "ignoring unreadable config");
            None
        }
    }
}

/// Write `config` to `path`, replacing the file in one rename.
pub fn save(path: &Path, config: &MonitorConfig) -> Result<()> {
    let json = config.to_json_string()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move config into place at {}", path.display()))?;

    info!(path = %path.display(), hosts = config.hosts.len(), "config saved");
    Ok(())
}
