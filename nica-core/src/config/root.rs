use serde::Deserialize;

use super::custom_ring::CustomRingConfig;
use super::ikernels::IkernelConfig;
use super::pipeline::PipelineConfig;
use super::telemetry::{LoggingConfig, TelemetryConfig};

/// Root configuration loaded from the `nica` binary's TOML file
/// (`SPEC_FULL.md` §3). Mirrors the teacher's `Config` root, with the
/// dataplane's own shape in place of routes/backends.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Kernel-bypass interface name the boundary implementation binds to
    /// (`spec.md` §6 `-I/--interface`; consumed only by the boundary, not
    /// by `nica-core` itself).
    pub interface: String,
    /// Host-to-net direction pipeline configuration.
    #[serde(default)]
    pub host_to_net: PipelineConfig,
    /// Net-to-host direction pipeline configuration.
    #[serde(default)]
    pub net_to_host: PipelineConfig,
    /// Ikernels attached to both directions, keyed by `ikernel_id`.
    #[serde(default)]
    pub ikernels: Vec<IkernelConfig>,
    /// Statically-provisioned custom-ring contexts (n2h only).
    #[serde(default)]
    pub custom_rings: Vec<CustomRingConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
