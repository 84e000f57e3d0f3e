//! Mermaid flowchart rendering of a handoff chain.

use std::fmt::Write;

use super::marker::{HandoffState, HandshakeMarker};

pub const EMPTY_DIAGRAM: &str = "graph LR\n  Empty[\"No handoffs found\"]";

/// Renders `chain` as a left-to-right Mermaid graph.
///
/// One edge per marker in chain order, then one `style` line per marker for its
/// target node. Repeated style lines for the same node are kept as is.
pub fn render_mermaid(chain: &[HandshakeMarker]) -> String {
    if chain.is_empty() {
        return EMPTY_DIAGRAM.to_string();
    }

    let mut out = String::from("graph LR\n");
    for marker in chain {
        let _ = writeln!(
            out,
            "  {} -->|{}| {}",
            sanitize_node_name(&marker.from_agent),
            state_label(marker),
            sanitize_node_name(&marker.to_agent)
        );
    }
    for marker in chain {
        if let Some(style) = marker.handoff_state().map(node_style) {
            let _ = writeln!(out, "  style {} {style}", sanitize_node_name(&marker.to_agent));
        }
    }
    out
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
///
/// Distinct names can collapse to the same node id (`a-b` and `a.b`); the
/// diagram then draws them as one node.
pub fn sanitize_node_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn state_label(marker: &HandshakeMarker) -> String {
    match (marker.handoff_state(), marker.coherence_score) {
        (Some(HandoffState::Wave), Some(score)) => format!("{}({score}%)", marker.state),
        _ => marker.state.clone(),
    }
}

fn node_style(state: HandoffState) -> &'static str {
    match state {
        HandoffState::Wave => "fill:#90EE90,stroke:#006400,stroke-width:2px",
        HandoffState::Pass => "fill:#87CEEB,stroke:#0000CD,stroke-width:2px",
        HandoffState::Block => "fill:#FFB6C1,stroke:#DC143C,stroke-width:2px",
        HandoffState::Hold => "fill:#FFD700,stroke:#FF8C00,stroke-width:2px",
        HandoffState::Push => "fill:#DDA0DD,stroke:#8B008B,stroke-width:2px",
    }
}
