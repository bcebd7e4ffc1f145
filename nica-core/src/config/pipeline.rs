use serde::Deserialize;

/// Per-direction pipeline configuration (`spec.md` §6 "Pipeline enable",
/// flow-table/scheduler registers).
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Mirrors the `0x10` enable register; a disabled pipeline forces
    /// every packet to `Passthrough` (`spec.md` §4.2).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// `log2` of the flow table capacity. `spec.md` §3 fixes `S = 1024`
    /// (`log_size = 10`) for the reference hardware; the port keeps it
    /// configurable per direction since h2n and n2h tables are disjoint.
    #[serde(default = "default_flow_table_log_size")]
    pub flow_table_log_size: u32,
    /// Default DRR quantum (in flits) newly-seen scheduler flows start
    /// with (`spec.md` §4.5).
    #[serde(default = "default_quantum")]
    pub scheduler_default_quantum: u32,
}

fn default_true() -> bool {
    true
}

fn default_flow_table_log_size() -> u32 {
    crate::flow::table::LOG_SIZE
}

fn default_quantum() -> u32 {
    1500u32.div_ceil(32)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            flow_table_log_size: default_flow_table_log_size(),
            scheduler_default_quantum: default_quantum(),
        }
    }
}
