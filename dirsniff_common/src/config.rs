use crate::SniffError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "dirsniff.toml";

/// A named comparison setup: two roots plus the ignore lists used with them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub left: PathBuf,
    pub right: PathBuf,
    /// Glob patterns matched against directory names
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
    /// Glob patterns matched against file names
    #[serde(default)]
    pub ignore_files: Vec<String>,
}

impl Preset {
    /// Both roots exist on this machine
    pub fn is_available(&self) -> bool {
        self.left.is_dir() && self.right.is_dir()
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Preset used when none is named explicitly
    #[serde(default)]
    pub default_preset: Option<String>,

    /// Saved comparison presets
    #[serde(default)]
    pub presets: Vec<Preset>,
}

impl AppConfig {
    pub fn preset(&self, name: &str) -> Result<&Preset, SniffError> {
        self.presets
            .iter()
            .find(|preset| preset.name == name)
            .ok_or_else(|| SniffError::UnknownPreset(name.to_string()))
    }

    /// Presets whose two roots both exist, sorted by name
    pub fn available_presets(&self) -> Vec<&Preset> {
        let mut presets: Vec<&Preset> = self
            .presets
            .iter()
            .filter(|preset| preset.is_available())
            .collect();
        presets.sort_by(|a, b| a.name.cmp(&b.name));
        presets
    }

    /// Insert a preset, replacing any existing one with the same name
    pub fn upsert_preset(&mut self, preset: Preset) {
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn remove_preset(&mut self, name: &str) -> Result<Preset, SniffError> {
        let index = self
            .presets
            .iter()
            .position(|preset| preset.name == name)
            .ok_or_else(|| SniffError::UnknownPreset(name.to_string()))?;
        if self.default_preset.as_deref() == Some(name) {
            self.default_preset = None;
        }
        Ok(self.presets.remove(index))
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    /// False when nothing has been saved yet and `config` is the default
    pub exists: bool,
    /// The file sits next to the executable rather than in the user config dir
    pub portable: bool,
}

/// Load the configuration, preferring a `dirsniff.toml` next to the
/// executable over the platform config directory
pub fn load_config() -> Result<LoadedConfig, SniffError> {
    let (path, portable) = resolve_config_path()?;
    load_config_at(&path, portable)
}

/// Load the configuration stored at `path`; a missing file gives the default
pub fn load_config_at(path: &Path, portable: bool) -> Result<LoadedConfig, SniffError> {
    let path = path.to_path_buf();
    let exists = path.exists();

    let config = if exists {
        read_config(&path)?
    } else {
        AppConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
        portable,
    })
}

pub fn read_config(path: &Path) -> Result<AppConfig, SniffError> {
    let data = fs::read_to_string(path)?;
    toml::from_str(&data).map_err(|e| SniffError::Serialization(e.to_string()))
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), SniffError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| SniffError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path() -> Result<(PathBuf, bool), SniffError> {
    if let Some(portable_path) = portable_config_path() {
        if portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "dirsniff", "dirsniff")
        .ok_or_else(|| SniffError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
