#![forbid(unsafe_code)]

//! Software-equivalent core of the NICA smart-NIC UDP offload dataplane
//! (`spec.md` §1): the bidirectional packet pipeline, the flow table, the
//! ikernel runtime contracts, the custom-ring RoCE egress path, and the
//! representative ikernel engines, wired into a single `step()` by
//! [`glue::Nica`].

pub mod boundary;
pub mod config;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod glue;
pub mod ikernel;
pub mod ikernels;
pub mod pipeline;
pub mod telemetry;

pub use config::{load_from_path, Config, IkernelConfig};
pub use error::{NicaError, Result};
pub use glue::{Direction as PipelineDirection, Nica};
