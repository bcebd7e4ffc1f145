//! Configuration surface for the `nica` runtime (`SPEC_FULL.md` §3):
//! TOML-loaded via `toml` + `serde`, validated the way the teacher's
//! `config::loader::load_from_path` validates its own configuration.

mod custom_ring;
mod ikernels;
mod loader;
mod pipeline;
mod root;
mod telemetry;

pub use custom_ring::CustomRingConfig;
pub use ikernels::IkernelConfig;
pub use loader::load_from_path;
pub use pipeline::PipelineConfig;
pub use root::Config;
pub use telemetry::{LoggingConfig, TelemetryConfig};
