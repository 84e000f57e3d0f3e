mod diagram;
mod marker;
mod protocol;

pub use diagram::{EMPTY_DIAGRAM, render_mermaid, sanitize_node_name};
pub use marker::{
    HandoffContext, HandoffState, HandshakeMarker, ValidationResult, parse_timestamp,
};
pub use protocol::HandshakeProtocol;
