//! Loader for `camdict.yaml` with environment overlays.
//!
//! Sources are merged in the order they are added, then `CAMDICT__*`
//! environment variables win (`CAMDICT__REMOTE__HOST=localhost:8080` sets
//! `remote.host`). After merging, `${VAR}` placeholders in any string are
//! expanded from the environment. Every section has defaults, so an empty
//! configuration is valid:
//!
//! ```yaml
//! listen: 127.0.0.1:8080
//! remote:
//!   scheme: https
//!   host: dictionary.cambridge.org
//!   timeout_secs: 15
//!   max_workers: 0          # 0 = one per CPU
//!   extra_headers:
//!     User-Agent: "Mozilla/5.0 ..."
//! cache:
//!   enabled: true
//!   error_ttl_secs: 86400
//! logging:
//!   format: text            # or json
//!   filter: info
//!   stderr: false
//!   dir: ~/.local/share/camdict
//! ```
use camdict_common::{LogConfig, LogFormat};
use camdict_querier::config::{MAX_TTL_SECS, MAX_WORKERS};
use camdict_querier::{CacheConfig, RemoteConfig};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "CAMDICT";

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CamdictConfig {
    /// Bind address of the HTTP front-end.
    pub listen: String,
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl Default for CamdictConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            remote: RemoteConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub stderr: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".to_string(),
            stderr: false,
            dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

/// Expand `$VAR`/`${VAR}` until the text stops changing. Unknown variables
/// stay as written; a reference cycle gives up after a few rounds.
fn expand_str(raw: String) -> String {
    let mut current = raw;
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        let next = shellexpand::env(&current)
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| current.clone());
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => *s = expand_str(std::mem::take(s)),
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(map) => map.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Layers YAML sources and `CAMDICT__*` variables into a [`CamdictConfig`].
pub struct CamdictConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CamdictConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CamdictConfigLoader {
    /// Start with no files; only `CAMDICT__*` environment overrides.
    ///
    /// ```
    /// use camdict_config::CamdictConfigLoader;
    ///
    /// let config = CamdictConfigLoader::new()
    ///     .with_yaml_str("listen: 0.0.0.0:9000\nremote:\n  host: localhost:9001")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.listen, "0.0.0.0:9000");
    /// assert_eq!(config.remote.host, "localhost:9001");
    /// assert_eq!(config.remote.scheme, "https");
    /// assert!(!config.cache.enabled);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format follows the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`Self::with_file`], but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use camdict_config::CamdictConfigLoader;
    ///
    /// unsafe { std::env::set_var("DICT_HOST", "mirror.example"); }
    ///
    /// let config = CamdictConfigLoader::new()
    ///     .with_yaml_str("remote:\n  host: \"${DICT_HOST}\"")
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.remote.host, "mirror.example");
    ///
    /// unsafe { std::env::remove_var("DICT_HOST"); }
    /// ```
    pub fn load(self) -> Result<CamdictConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: CamdictConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        validate(&typed)?;
        Ok(typed)
    }
}

fn validate(cfg: &CamdictConfig) -> Result<(), ConfigError> {
    if cfg.listen.trim().is_empty() {
        return Err(ConfigError::Message("listen must not be empty".into()));
    }
    if cfg.remote.timeout_secs == Some(0) {
        return Err(ConfigError::Message(
            "remote.timeout_secs must be positive".into(),
        ));
    }
    if cfg.remote.max_workers > MAX_WORKERS {
        return Err(ConfigError::Message(format!(
            "remote.max_workers must be at most {MAX_WORKERS}"
        )));
    }
    let ttls = [
        ("cache.ttl_secs", cfg.cache.ttl_secs),
        ("cache.error_ttl_secs", Some(cfg.cache.error_ttl_secs)),
    ];
    for (name, secs) in ttls {
        if secs.is_some_and(|secs| secs > MAX_TTL_SECS) {
            return Err(ConfigError::Message(format!(
                "{name} must be at most {MAX_TTL_SECS}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn host_placeholder_is_filled_in() {
        temp_env::with_var("CAMDICT_T_HOST", Some("mirror.local"), || {
            let mut v = json!("https://${CAMDICT_T_HOST}/dictionary");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("https://mirror.local/dictionary"));
        });
    }

    #[test]
    fn nested_sections_and_lists_are_walked() {
        temp_env::with_vars(
            [("CAMDICT_T_UA", Some("camdict/1.0")), ("CAMDICT_T_LANG", Some("en"))],
            || {
                let mut v = json!({
                    "remote": { "extra_headers": { "User-Agent": "$CAMDICT_T_UA" } },
                    "langs": ["${CAMDICT_T_LANG}-GB", 3, false],
                });
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!({
                        "remote": { "extra_headers": { "User-Agent": "camdict/1.0" } },
                        "langs": ["en-GB", 3, false],
                    })
                );
            },
        );
    }

    #[test]
    fn variables_may_point_at_other_variables() {
        temp_env::with_vars(
            [
                ("CAMDICT_T_PORT", Some("9000")),
                ("CAMDICT_T_ADDR", Some("localhost:${CAMDICT_T_PORT}")),
            ],
            || assert_eq!(expand_str("${CAMDICT_T_ADDR}".into()), "localhost:9000"),
        );
    }

    #[test]
    fn reference_cycles_terminate() {
        temp_env::with_vars(
            [("CAMDICT_T_PING", Some("${CAMDICT_T_PONG}")), ("CAMDICT_T_PONG", Some("${CAMDICT_T_PING}"))],
            || {
                let out = expand_str("<${CAMDICT_T_PING}>".into());
                assert!(out.starts_with('<') && out.ends_with('>'));
                assert!(out.contains("${CAMDICT_T_P"));
            },
        );
    }

    #[test]
    fn unset_variables_are_kept_verbatim() {
        let mut v = json!("host-${CAMDICT_T_NEVER_SET}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("host-${CAMDICT_T_NEVER_SET}"));
    }

    #[test]
    fn logging_section_maps_onto_log_config() {
        let logging = LoggingConfig {
            format: LogFormat::Json,
            filter: "camdict=debug".into(),
            stderr: true,
            dir: Some(PathBuf::from("/tmp/camdict")),
        };
        let log = logging.to_log_config("camdict");
        assert_eq!(log.app_name, "camdict");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.default_filter, "camdict=debug");
        assert!(log.emit_stderr);
        assert_eq!(log.log_dir.as_deref(), Some(Path::new("/tmp/camdict")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = CamdictConfig::default();
        cfg.remote.timeout_secs = Some(0);
        assert!(validate(&cfg).is_err());
        assert!(validate(&CamdictConfig::default()).is_ok());
    }

    #[test]
    fn cache_lifetimes_are_bounded() {
        let mut cfg = CamdictConfig::default();
        cfg.cache.ttl_secs = Some(MAX_TTL_SECS);
        cfg.cache.error_ttl_secs = MAX_TTL_SECS;
        assert!(validate(&cfg).is_ok());

        cfg.cache.ttl_secs = Some(MAX_TTL_SECS + 1);
        let err = validate(&cfg).unwrap_err().to_string();
        assert!(err.contains("cache.ttl_secs"), "{err}");

        cfg.cache.ttl_secs = None;
        cfg.cache.error_ttl_secs = u64::MAX;
        let err = validate(&cfg).unwrap_err().to_string();
        assert!(err.contains("cache.error_ttl_secs"), "{err}");
    }

    #[test]
    fn worker_count_is_bounded() {
        let mut cfg = CamdictConfig::default();
        cfg.remote.max_workers = MAX_WORKERS;
        assert!(validate(&cfg).is_ok());
        cfg.remote.max_workers = MAX_WORKERS + 1;
        assert!(validate(&cfg).is_err());
    }
}
