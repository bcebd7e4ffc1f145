//! Representative ikernel engines (`spec.md` §4.11): concrete
//! [`crate::ikernel::Ikernel`] implementations, each grounded on a register
//! map in [`crate::gateway::addr`]. These model the engines at the level of
//! their state machines and register contracts, not the byte layout of
//! every payload format they parse.

pub mod cms;
pub mod coap;
pub mod echo;
pub mod memcached;
pub mod passthrough;
pub mod pktgen;
pub mod threshold;

pub use cms::CmsIkernel;
pub use coap::CoapIkernel;
pub use echo::EchoIkernel;
pub use memcached::MemcachedIkernel;
pub use passthrough::PassthroughIkernel;
pub use pktgen::PktgenIkernel;
pub use threshold::ThresholdIkernel;
