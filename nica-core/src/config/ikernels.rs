use serde::Deserialize;

/// One configured ikernel instance, tagged by engine kind
/// (`spec.md` §4.11). `ikernel_id` is the 6-bit engine id flows steer
/// into (`spec.md` §3 "Ikernel metadata").
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IkernelConfig {
    Threshold {
        ikernel_id: u8,
        #[serde(default)]
        threshold_value: u32,
    },
    CountMinSketch {
        ikernel_id: u8,
        #[serde(default = "default_top_k")]
        top_k: usize,
    },
    Passthrough {
        ikernel_id: u8,
        #[serde(default)]
        ring_id: u8,
        #[serde(default)]
        ignore_credits: bool,
    },
    Pktgen {
        ikernel_id: u8,
        #[serde(default = "default_burst_size")]
        burst_size: u32,
    },
    Memcached {
        ikernel_id: u8,
        #[serde(default = "default_cache_log_size")]
        log_size: u32,
    },
    Echo {
        ikernel_id: u8,
    },
    Coap {
        ikernel_id: u8,
        hmac_key_path: String,
    },
}

fn default_top_k() -> usize {
    256
}

fn default_burst_size() -> u32 {
    1
}

fn default_cache_log_size() -> u32 {
    10
}

impl IkernelConfig {
    pub fn ikernel_id(&self) -> u8 {
        match self {
            Self::Threshold { ikernel_id, .. }
            | Self::CountMinSketch { ikernel_id, .. }
            | Self::Passthrough { ikernel_id, .. }
            | Self::Pktgen { ikernel_id, .. }
            | Self::Memcached { ikernel_id, .. }
            | Self::Echo { ikernel_id }
            | Self::Coap { ikernel_id, .. } => *ikernel_id,
        }
    }
}
