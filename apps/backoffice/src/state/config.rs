//! # Configuration State
//!
//! Store-wide settings shared by every command.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. AppConfig::default()          Lustre Jewellers, INV, CGST+SGST 1.5% │
//! │  2. lustre.toml                   platform config dir or LUSTRE_CONFIG  │
//! │  3. saved settings (database)     edits made from the back office       │
//! │  4. LUSTRE_* environment          deployment overrides                  │
//! │  5. validate()                    refuse to start on a bad value        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Environment Variables
//! | Variable                     | Field                  |
//! |------------------------------|------------------------|
//! | `LUSTRE_STORE_NAME`          | `store_name`           |
//! | `LUSTRE_STORE_PHONE`         | `store_phone`          |
//! | `LUSTRE_GSTIN`               | `gstin`                |
//! | `LUSTRE_INVOICE_PREFIX`      | `invoice_prefix`       |
//! | `LUSTRE_LOW_STOCK_THRESHOLD` | `low_stock_threshold`  |
//! | `LUSTRE_GST_MODE`            | `gst` (`flat`/`split`) |

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, info};

use lustre_core::{AppConfig, CoreError, GstPolicy};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "LUSTRE_CONFIG";

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "lustre.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// Shared, replaceable configuration.
///
/// Commands read a clone of the current value; `save_config` swaps it.
#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigState {
    pub fn new(config: AppConfig) -> Self {
        ConfigState {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// The configuration as it is right now.
    pub fn current(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replace(&self, config: AppConfig) {
        let mut guard = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = config;
    }

    /// GST policy shortcut used by every pricing command.
    pub fn gst(&self) -> GstPolicy {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gst
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Where `lustre.toml` is looked up: `LUSTRE_CONFIG`, else the platform
/// config directory.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("com", "lustre", "backoffice")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Reads a config file. A missing file yields the defaults; fields the file
/// leaves out keep their defaults.
pub fn load_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Applies `LUSTRE_*` overrides. `lookup` is `std::env::var` in production.
pub fn apply_env<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup("LUSTRE_STORE_NAME") {
        config.store_name = name;
    }
    if let Some(phone) = lookup("LUSTRE_STORE_PHONE") {
        config.store_phone = Some(phone);
    }
    if let Some(gstin) = lookup("LUSTRE_GSTIN") {
        config.gstin = Some(gstin.to_ascii_uppercase());
    }
    if let Some(prefix) = lookup("LUSTRE_INVOICE_PREFIX") {
        config.invoice_prefix = prefix;
    }
    if let Some(threshold) = lookup("LUSTRE_LOW_STOCK_THRESHOLD") {
        config.low_stock_threshold = threshold.trim().parse().map_err(|_| ConfigError::Env {
            var: "LUSTRE_LOW_STOCK_THRESHOLD",
            reason: format!("'{}' is not a whole number", threshold),
        })?;
    }
    if let Some(mode) = lookup("LUSTRE_GST_MODE") {
        config.gst = gst_mode(&mode, config.gst.total_bps())?;
    }
    Ok(config)
}

/// Switches between flat and split GST keeping the combined rate.
fn gst_mode(mode: &str, total_bps: u32) -> Result<GstPolicy, ConfigError> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "flat" => Ok(GstPolicy::Flat { rate_bps: total_bps }),
        "split" => {
            let cgst_bps = total_bps / 2;
            Ok(GstPolicy::Split {
                cgst_bps,
                sgst_bps: total_bps - cgst_bps,
            })
        }
        other => Err(ConfigError::Env {
            var: "LUSTRE_GST_MODE",
            reason: format!("'{}' is not flat or split", other),
        }),
    }
}

/// Builds the startup configuration.
///
/// `saved` is what the back office last stored in the database; when
/// present it replaces the file layer entirely.
pub fn resolve<F>(
    file: AppConfig,
    saved: Option<AppConfig>,
    lookup: F,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let base = saved.unwrap_or(file);
    let config = apply_env(base, lookup)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env(
            AppConfig::default(),
            env(&[
                ("LUSTRE_STORE_NAME", "Kanak Jewellers"),
                ("LUSTRE_INVOICE_PREFIX", "KJ"),
                ("LUSTRE_GST_MODE", "flat"),
                ("LUSTRE_LOW_STOCK_THRESHOLD", "2"),
            ]),
        )
        .unwrap();

        assert_eq!(config.store_name, "Kanak Jewellers");
        assert_eq!(config.invoice_prefix, "KJ");
        assert_eq!(config.gst, GstPolicy::Flat { rate_bps: 300 });
        assert_eq!(config.low_stock_threshold, 2);
    }

    #[test]
    fn test_gst_mode_split_keeps_total() {
        let mut base = AppConfig::default();
        base.gst = GstPolicy::Flat { rate_bps: 301 };

        let config = apply_env(base, env(&[("LUSTRE_GST_MODE", "Split")])).unwrap();
        assert_eq!(
            config.gst,
            GstPolicy::Split {
                cgst_bps: 150,
                sgst_bps: 151
            }
        );
    }

    #[test]
    fn test_bad_env_values() {
        let err = apply_env(AppConfig::default(), env(&[("LUSTRE_GST_MODE", "igst")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "LUSTRE_GST_MODE", .. }));

        let err = apply_env(
            AppConfig::default(),
            env(&[("LUSTRE_LOW_STOCK_THRESHOLD", "few")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));
    }

    #[test]
    fn test_resolve_prefers_saved_and_validates() {
        let mut file = AppConfig::default();
        file.store_name = "From File".to_string();
        let mut saved = AppConfig::default();
        saved.store_name = "Saved".to_string();

        let config = resolve(file.clone(), Some(saved), env(&[])).unwrap();
        assert_eq!(config.store_name, "Saved");

        let config = resolve(file.clone(), None, env(&[])).unwrap();
        assert_eq!(config.store_name, "From File");

        let err = resolve(file, None, env(&[("LUSTRE_INVOICE_PREFIX", "inv-")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_file_missing_and_partial() {
        let dir = std::env::temp_dir().join(format!("lustre-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let missing = load_file(&dir.join("nope.toml")).unwrap();
        assert_eq!(missing, AppConfig::default());

        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
            store_name = "Kanak Jewellers"
            invoice_prefix = "KJ"

            [gst]
            kind = "flat"
            rate_bps = 300
            "#,
        )
        .unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.store_name, "Kanak Jewellers");
        assert_eq!(config.gst, GstPolicy::Flat { rate_bps: 300 });
        assert_eq!(config.low_stock_threshold, AppConfig::default().low_stock_threshold);

        std::fs::write(&path, "store_name = [").unwrap();
        assert!(matches!(load_file(&path), Err(ConfigError::Parse { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_state_replace() {
        let state = ConfigState::new(AppConfig::default());
        let mut next = AppConfig::default();
        next.gst = GstPolicy::Flat { rate_bps: 300 };

        state.replace(next);
        assert_eq!(state.gst(), GstPolicy::Flat { rate_bps: 300 });
        assert_eq!(state.current().invoice_prefix, "INV");
    }
}
