//! Saída de terminal do `wave`: texto colorido para cadeias, validações e trilhas.
//!
//! As funções `render_*` produzem texto puro (testável); o [`Terminal`] aplica
//! estilos da crate `console` aos cabeçalhos e marcadores de status.

use console::Style;
use serde_json::Value;
use wave_handoff::{HandshakeMarker, TrailEntry, ValidationResult};

/// Estilos usados na saída do terminal.
pub struct Terminal {
    // Verde para sucesso.
    green: Style,
    // Vermelho para erros.
    red: Style,
    // Amarelo para avisos.
    yellow: Style,
    // Ciano para cabeçalhos.
    cyan: Style,
}

impl Default for Terminal {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan().bold(),
        }
    }
}

impl Terminal {
    /// Imprime o marcador recém-criado em JSON formatado.
    pub fn print_created(&self, marker: &HandshakeMarker) -> serde_json::Result<()> {
        let json = render_created(marker)?;
        println!("{}", self.green.apply_to("Handoff created successfully:"));
        println!("{json}");
        Ok(())
    }

    /// Imprime o resultado da validação com listas de erros e avisos.
    pub fn print_validation(&self, result: &ValidationResult) {
        println!("{}", self.cyan.apply_to("Validation result:"));
        let verdict = if result.valid {
            self.green.apply_to("true")
        } else {
            self.red.apply_to("false")
        };
        println!("Valid: {verdict}");

        if !result.errors().is_empty() {
            println!("\n{}", self.red.apply_to("Errors:"));
            print!("{}", render_bullets(result.errors()));
        }
        if !result.warnings().is_empty() {
            println!("\n{}", self.yellow.apply_to("Warnings:"));
            print!("{}", render_bullets(result.warnings()));
        }
    }

    pub fn print_chain(&self, session_id: &str, chain: &[HandshakeMarker]) {
        if chain.is_empty() {
            println!("No handoffs found for session: {session_id}");
            return;
        }
        println!(
            "{}",
            self.cyan
                .apply_to(format!("Handoff chain for session: {session_id}"))
        );
        println!("Total handoffs: {}\n", chain.len());
        print!("{}", render_chain(chain));
    }

    pub fn print_markers(&self, markers: &[HandshakeMarker]) {
        println!(
            "{}",
            self.cyan.apply_to(format!("Matching handoffs: {}", markers.len()))
        );
        for marker in markers {
            println!("{}", render_marker_line(marker));
        }
    }

    pub fn print_sessions<'a>(&self, sessions: impl IntoIterator<Item = &'a String>) {
        println!("{}", self.cyan.apply_to("Sessions:"));
        for session in sessions {
            println!("  {session}");
        }
    }

    pub fn print_trail(&self, session_id: &str, entries: &[TrailEntry]) {
        if entries.is_empty() {
            println!("No trail entries for session: {session_id}");
            return;
        }
        println!(
            "{}",
            self.cyan.apply_to(format!("Trail for session: {session_id}"))
        );
        print!("{}", render_trail(entries));
    }

    pub fn print_diagram(&self, diagram: &str) {
        println!("{}", self.cyan.apply_to("Workflow diagram (Mermaid format):"));
        println!("{diagram}");
    }

    pub fn print_written(&self, path: &std::path::Path) {
        println!(
            "  {} Workflow diagram written to: {}",
            self.green.apply_to("✓"),
            path.display()
        );
    }

    pub fn print_error(&self, err: &anyhow::Error) {
        eprintln!("{} {err:#}", self.red.apply_to("Error:"));
    }
}

fn render_bullets(items: &[String]) -> String {
    items.iter().map(|item| format!("  - {item}\n")).collect()
}

/// Bloco numerado por marcador: horário, aresta, coerência opcional e contexto.
/// JSON formatado do marcador, com os nomes de campo do armazenamento.
pub fn render_created(marker: &HandshakeMarker) -> serde_json::Result<String> {
    serde_json::to_string_pretty(marker)
}

pub fn render_chain(chain: &[HandshakeMarker]) -> String {
    let mut out = String::new();
    for (i, marker) in chain.iter().enumerate() {
        out.push_str(&format!("{}. [{}]\n", i + 1, marker.timestamp));
        out.push_str(&format!(
            "   {} --{}--> {}\n",
            marker.from_agent, marker.state, marker.to_agent
        ));
        if let Some(score) = marker.coherence_score {
            out.push_str(&format!("   Coherence: {score}%\n"));
        }
        let context = Value::Object(marker.context.clone());
        out.push_str(&format!("   Context: {context}\n\n"));
    }
    out
}

/// Uma linha por marcador: `[sessão] id origem --ESTADO--> destino`.
pub fn render_marker_line(marker: &HandshakeMarker) -> String {
    format!(
        "[{}] {} {} --{}--> {}",
        marker.session_id, marker.id, marker.from_agent, marker.state, marker.to_agent
    )
}

pub fn render_trail(entries: &[TrailEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let ts = entry.timestamp.as_deref().unwrap_or("-");
        out.push_str(&format!("[{ts}] {}: {}\n", entry.actor, entry.decision));
        out.push_str(&format!("   {}\n", entry.rationale));
    }
    out
}
