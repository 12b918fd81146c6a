use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub socket_path: String,
    pub palette_seed: u64,
    /// Drop duplicate probes and loopback listeners before building the graph.
    pub cleanup: bool,
    pub show_denied: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            palette_seed: 2,
            cleanup: true,
            show_denied: false,
        }
    }
}

fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        format!("{dir}/kubesonde.sock")
    } else {
        "/tmp/kubesonde.sock".to_string()
    }
}

fn settings_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "kubesonde")?;
    Some(proj.config_dir().join("agent.toml"))
}

pub fn load_or_default() -> AgentSettings {
    let Some(path) = settings_file_path() else {
        return AgentSettings::default();
    };
    load_or_default_from_path(&path)
}

fn load_or_default_from_path(path: &Path) -> AgentSettings {
    let Ok(contents) = fs::read_to_string(path) else {
        return AgentSettings::default();
    };
    toml::from_str(&contents).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), %err, "ignoring malformed settings file");
        AgentSettings::default()
    })
}

pub fn save(settings: &AgentSettings) -> anyhow::Result<()> {
    let Some(path) = settings_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(settings, &path)
}

fn save_to_path(settings: &AgentSettings, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(settings).context("failed to serialize agent settings")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write agent settings {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn settings_roundtrip_save_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("agent.toml");
        let settings = AgentSettings {
            socket_path: "/tmp/test.sock".to_string(),
            palette_seed: 11,
            cleanup: false,
            show_denied: true,
        };

        save_to_path(&settings, &path).expect("save settings");
        assert_eq!(load_or_default_from_path(&path), settings);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("agent.toml");
        fs::write(&path, "palette_seed = 5\n").expect("write");

        let loaded = load_or_default_from_path(&path);
        assert_eq!(loaded.palette_seed, 5);
        assert!(loaded.cleanup);
        assert!(!loaded.show_denied);
    }

    #[test]
    fn unreadable_or_malformed_file_falls_back() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("absent.toml");
        assert_eq!(load_or_default_from_path(&missing), AgentSettings::default());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "palette_seed = \"two\"").expect("write");
        assert_eq!(load_or_default_from_path(&bad), AgentSettings::default());
    }
}
