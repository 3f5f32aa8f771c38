use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

/// Files copied into the static tree at startup, relative to `project_dir`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub project_dir: PathBuf,
    pub images: Vec<String>,
    pub icons: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        AssetsConfig {
            project_dir: PathBuf::from("."),
            images: vec!["header.png".to_string()],
            icons: vec![
                "linkedin_logo.png".to_string(),
                "instagram_logo.png".to_string(),
                "github_logo.png".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub raw_data_path: PathBuf,
    pub processed_data_path: PathBuf,
    pub static_dir: PathBuf,
    pub visualization_dir: PathBuf,
    pub site_dir: PathBuf,
    pub assets: AssetsConfig,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            raw_data_path: PathBuf::from("data/raw/spoty_tracks.csv"),
            processed_data_path: PathBuf::from("data/processed/processed_spotify.csv"),
            static_dir: PathBuf::from("static"),
            visualization_dir: PathBuf::from("static/visualization"),
            site_dir: PathBuf::from("docs"),
            assets: AssetsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "server": {{ "port": 8080 }}, "site_dir": "public" }}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.site_dir, PathBuf::from("public"));
        assert_eq!(
            config.processed_data_path,
            PathBuf::from("data/processed/processed_spotify.csv")
        );
        assert_eq!(config.assets.icons.len(), 3);
    }

    #[test]
    fn invalid_json_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_config(Path::new("/definitely/not/here/config.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
