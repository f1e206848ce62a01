use std::{fs, path::PathBuf, time::Duration};

use color_eyre::{eyre::WrapErr, Result};
use directories::BaseDirs;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::core::query::{EmptySelectionPolicy, QueryBuilder};
use crate::services::CatalogSource;
use crate::tui::{KeyBindings, Theme};

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub endpoint: String,
    /// URL or local path of the attribute catalog
    pub catalog: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub empty_selection: EmptySelectionPolicy,
    #[serde(default)]
    pub notify_emails: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub keybindings: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { theme: default_theme(), keybindings: None }
    }
}

fn default_theme() -> String {
    "dark".to_string()
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
}

impl Config {
    /// Embedded defaults, then the user file, then `WIGGLETUI__*` variables
    ///
    /// Without `config_path` the user file is `~/.wiggletui-config.json5`,
    /// created from the defaults on first run.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let selected_path = match config_path {
            Some(p) => expand_tilde(p),
            None => {
                let home_cfg = default_home_config_path();
                if !home_cfg.exists() {
                    if let Some(parent) = home_cfg.parent() {
                        let _ = fs::create_dir_all(parent);
                    }
                    let _ = fs::write(&home_cfg, CONFIG);
                }
                home_cfg
            }
        };

        config::Config::builder()
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5))
            .add_source(
                config::File::from(selected_path)
                    .format(config::FileFormat::Json5)
                    .required(config_path.is_some()),
            )
            .add_source(
                config::Environment::with_prefix(&PROJECT_NAME)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("query.notify_emails"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn endpoint(&self) -> Result<Url> {
        Url::parse(&self.backend.endpoint)
            .wrap_err_with(|| format!("Invalid backend endpoint {:?}", self.backend.endpoint))
    }

    pub fn catalog_source(&self) -> CatalogSource {
        CatalogSource::parse(&expand_tilde(&PathBuf::from(&self.backend.catalog)).to_string_lossy())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.backend.timeout_secs.map(Duration::from_secs)
    }

    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.query.empty_selection).with_emails(self.query.notify_emails.clone())
    }

    pub fn theme(&self) -> Theme {
        Theme::from_name(&self.ui.theme)
    }

    /// Configured keybinding file, or the defaults
    pub fn keybindings(&self) -> Result<KeyBindings> {
        let bindings = match &self.ui.keybindings {
            Some(path) => {
                let path = expand_tilde(path);
                KeyBindings::load_from_file(&path)
                    .wrap_err_with(|| format!("Failed to load keybindings from {}", path.display()))?
            }
            None => KeyBindings::default(),
        };
        for problem in bindings.validate() {
            warn!("Keybindings: {}", problem);
        }
        Ok(bindings)
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if s.starts_with('~') {
            if let Some(base) = BaseDirs::new() {
                return PathBuf::from(s.replacen('~', base.home_dir().to_str().unwrap_or(""), 1));
            }
        }
    }
    path.clone()
}

fn default_home_config_path() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".wiggletui-config.json5");
    }
    PathBuf::from(".wiggletui-config.json5")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.json5");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let cfg: Config = json5::from_str(CONFIG).unwrap();
        assert_eq!(cfg.backend.timeout_secs, None);
        assert_eq!(cfg.query.empty_selection, EmptySelectionPolicy::Ignore);
        assert_eq!(cfg.ui, UiConfig::default());
        assert!(cfg.endpoint().is_ok());
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                backend: { endpoint: "https://wiggle.example.org/cgi-bin/wiggleCGI.py", timeout_secs: 30 },
                query: { empty_selection: "reject", notify_emails: ["me@example.org"] },
                ui: { theme: "light" },
            }"#,
        );
        let cfg = Config::from_path(Some(&path)).unwrap();
        assert_eq!(cfg.endpoint().unwrap().host_str(), Some("wiggle.example.org"));
        // Untouched keys keep their defaults
        assert_eq!(cfg.backend.catalog, "http://localhost/datasets.attribs.json");
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(30)));
        let builder = cfg.query_builder();
        assert_eq!(builder.policy, EmptySelectionPolicy::Reject);
        assert_eq!(builder.notify_emails, vec!["me@example.org".to_string()]);
        assert_eq!(cfg.theme().name, crate::tui::theme::ThemeName::Light);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json5");
        assert!(Config::from_path(Some(&path)).is_err());
    }

    #[test]
    fn test_local_catalog_source() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{ backend: { catalog: "/srv/wiggle/datasets.attribs.json" } }"#);
        let cfg = Config::from_path(Some(&path)).unwrap();
        assert_eq!(
            cfg.catalog_source(),
            CatalogSource::File(PathBuf::from("/srv/wiggle/datasets.attribs.json"))
        );
    }

    #[test]
    fn test_keybinding_file() {
        let dir = TempDir::new().unwrap();
        let bindings_path = dir.path().join("keys.json");
        KeyBindings::default().save_to_file(&bindings_path).unwrap();
        let path = write_config(
            &dir,
            &format!(r#"{{ ui: {{ keybindings: "{}" }} }}"#, bindings_path.display()),
        );
        let cfg = Config::from_path(Some(&path)).unwrap();
        let bindings = cfg.keybindings().unwrap();
        assert!(!bindings.keys_for(crate::tui::Action::Submit).is_empty());
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        let p = PathBuf::from("/tmp/x.json5");
        assert_eq!(expand_tilde(&p), p);
    }
}
