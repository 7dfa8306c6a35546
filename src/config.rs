//! Client configuration: defaults, TOML file, `DROPCODE_*` environment

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dispatch::{GalleryPermission, Platform};
use crate::error::ConfigError;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_ALBUM: &str = "Download";
const ENV_PREFIX: &str = "DROPCODE_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    /// Documents storage root; downloads land directly under it
    pub download_dir: PathBuf,
    /// Overrides platform detection when set
    pub platform: Option<Platform>,
    pub connect_timeout_secs: Option<u64>,
    pub gallery: GalleryConfig,
    pub share: ShareConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub root: PathBuf,
    pub album: String,
    pub permission: GalleryPermission,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub command: String,
    pub args: Vec<String>,
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            download_dir: home_dir()
                .map(|home| home.join("Documents").join("dropcode"))
                .unwrap_or_else(|| PathBuf::from("downloads")),
            platform: None,
            connect_timeout_secs: None,
            gallery: GalleryConfig::default(),
            share: ShareConfig::default(),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            root: home_dir()
                .map(|home| home.join("Pictures"))
                .unwrap_or_else(|| PathBuf::from("gallery")),
            album: DEFAULT_ALBUM.to_string(),
            permission: GalleryPermission::Granted,
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        let command = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        Self {
            command: command.to_string(),
            args: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Layer the TOML file at `path` (if present) and `DROPCODE_*` variables
    /// over the built-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();

        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: ClientConfig = figment.extract()?;
        config.server_base()?;
        Ok(config)
    }

    /// Parsed server URL, guaranteed to end in `/` so endpoint paths join under it
    pub fn server_base(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidServerUrl {
            url: self.server_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.server_url).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Configured platform, or the one detected for this build target
    pub fn resolved_platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::detect)
    }
}

/// Config file location: explicit path, then `DROPCODE_CONFIG`, then the XDG
/// config directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Some(path) = std::env::var_os("DROPCODE_CONFIG") {
        return PathBuf::from(path);
    }

    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(path) => PathBuf::from(path),
        None => home_dir()
            .map(|home| home.join(".config"))
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    base.join("dropcode").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_point_at_local_server() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.gallery.album, "Download");
        assert_eq!(config.gallery.permission, GalleryPermission::Granted);
        assert!(config.platform.is_none());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
server_url = "http://files.example:5000"
download_dir = "/tmp/dropcode-test"
platform = "gallery"

[gallery]
album = "Transfers"
permission = "denied"
"#,
        )
        .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.server_url, "http://files.example:5000");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/dropcode-test"));
        assert_eq!(config.platform, Some(Platform::GalleryCapable));
        assert_eq!(config.gallery.album, "Transfers");
        assert_eq!(config.gallery.permission, GalleryPermission::Denied);
        // untouched nested keys keep their defaults
        assert_eq!(config.share.command, ShareConfig::default().command);
    }

    #[test]
    fn invalid_server_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server_url = \"ftp://files.example\"\n").unwrap();

        let err = ClientConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidServerUrl { .. }));
    }

    #[test]
    fn server_base_gains_trailing_slash() {
        let config = ClientConfig {
            server_url: "http://host:5000/api".to_string(),
            ..ClientConfig::default()
        };
        let base = config.server_base().unwrap();
        assert_eq!(base.as_str(), "http://host:5000/api/");
        assert_eq!(base.join("upload").unwrap().as_str(), "http://host:5000/api/upload");
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = config_path(Some(Path::new("/etc/dropcode.toml")));
        assert_eq!(path, PathBuf::from("/etc/dropcode.toml"));
    }
}
