use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{NicaError, Result};
use crate::ikernel::NUM_TC;
use crate::pipeline::custom_ring::NUM_RINGS;

use super::root::Config;

/// Number of distinct `ikernel_id` values a flow can steer into
/// (`spec.md` §3: 6-bit field).
const MAX_IKERNEL_ID: u8 = 63;

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let text = fs::read_to_string(&path).map_err(NicaError::Io)?;
    let cfg: Config = toml::from_str(&text)
        .map_err(|e| NicaError::Config(format!("failed to parse config: {e}")))?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<()> {
    if cfg.host_to_net.flow_table_log_size != crate::flow::table::LOG_SIZE
        || cfg.net_to_host.flow_table_log_size != crate::flow::table::LOG_SIZE
    {
        return Err(NicaError::Config(format!(
            "flow_table_log_size must be {}: the table is a fixed-capacity linear-probed array \
             (spec.md \u{a7}3), not a resizable one",
            crate::flow::table::LOG_SIZE
        )));
    }

    let mut seen_ids = HashSet::new();
    for ik in &cfg.ikernels {
        let id = ik.ikernel_id();
        if id > MAX_IKERNEL_ID {
            return Err(NicaError::IkernelIdOutOfRange(id));
        }
        if !seen_ids.insert(id) {
            return Err(NicaError::Config(format!("duplicate ikernel_id {id}")));
        }
        if let super::ikernels::IkernelConfig::Passthrough { ring_id, .. } = ik {
            if *ring_id != 0 && usize::from(*ring_id) > NUM_RINGS {
                return Err(NicaError::Config(format!("ring_id {ring_id} out of range")));
            }
        }
    }

    if cfg.ikernels.len() >= NUM_TC {
        return Err(NicaError::Config(format!(
            "too many ikernels configured: traffic classes are demultiplexed mod {}",
            NUM_TC - 1
        )));
    }

    for ring in &cfg.custom_rings {
        if ring.ring_id == 0 || usize::from(ring.ring_id) > NUM_RINGS {
            return Err(NicaError::Config(format!("custom ring id {} out of range", ring.ring_id)));
        }
    }

    Ok(())
}
