pub mod gateway;
pub mod key;
pub mod table;

pub use gateway::FlowTableGateway;
pub use key::{FieldMask, FlowKey};
pub use table::{FlowAction, FlowTable, FlowValue, LookupResult};
