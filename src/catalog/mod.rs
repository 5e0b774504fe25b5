mod filter;
mod load;
mod record;

pub use filter::{FlowFilter, matching_systems, search_flows};
pub use load::{Catalogue, load_catalogue, parse_catalogue};
pub use record::{FlowRecord, ProcessStep, StepType, UNKNOWN, flow_node_id, or_unknown};
