use serde::Deserialize;

/// Controls metrics/health-check observability (`SPEC_FULL.md` §3),
/// grounded on the teacher's `config::telemetry::TelemetryConfig`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelemetryConfig {
    /// If set, starts an HTTP server on this port serving `/metrics`,
    /// `/health`, `/ready`, `/live`.
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_otel_log_level")]
    pub otel_log_level: String,
}

fn default_otel_log_level() -> String {
    "warn".to_string()
}

/// Application-level structured logging (`SPEC_FULL.md` §3).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub show_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
