use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod defaults;

/// Environment variables checked, in order, for the Gemini key.
const API_KEY_ENV: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub notes: NotesConfig,
    pub palette: PaletteConfig,
    pub paths: PathsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// iTunes Search API root.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    /// Gemini API key. `GEMINI_API_KEY` / `API_KEY` take precedence.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Artwork load timeout in seconds (0 = wait forever).
    pub timeout_secs: u64,
    /// In-memory palette cache entries (0 disables the cache).
    pub cache_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Cached searches and palettes older than this are refetched.
    pub max_age_secs: i64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://itunes.apple.com".to_string(),
        }
    }
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl NotesConfig {
    /// Key from the environment, falling back to the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        API_KEY_ENV
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .or_else(|| self.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            cache_size: 32,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "sleevd", "sleevd");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("sleevd"));
        Self { data_dir }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl PathsConfig {
    pub fn database(&self) -> PathBuf {
        self.data_dir.join("sleevd.sqlite3")
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    write_config(cfg, &path)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    // the file may hold an API key
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "sleevd", "sleevd").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = defaults::defaults();
        write_config(&cfg, &path).context("write default config")?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
