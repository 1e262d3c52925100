#![allow(dead_code)]

use std::sync::OnceLock;

use camdict_common::{init_logging, LogConfig, LogFormat};
use camdict_querier::{JsonPageParser, Remote, RemoteConfig};
use wiremock::MockServer;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "camdict-tests",
            log_dir: Some(std::env::temp_dir().join("camdict-tests")),
            emit_stderr: true,
            format: if std::env::var("CAMDICT_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
        };

        init_logging(config).unwrap_or_default()
    });
}

pub fn config_for(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        scheme: "http".into(),
        host: server.address().to_string(),
        timeout_secs: Some(5),
        max_workers: 2,
        ..RemoteConfig::default()
    }
}

pub fn json_remote(server: &MockServer) -> Remote<JsonPageParser> {
    Remote::with_parser(&config_for(server), JsonPageParser).expect("remote")
}
