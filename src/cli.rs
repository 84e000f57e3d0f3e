//! Interface de linha de comando do `wave` baseada em clap.
//!
//! Define a struct [`Cli`] com o grupo de subcomandos `handoff`
//! (create, validate, chain, viz, query, sessions, trail) e flags globais
//! (--config, --handoff-dir, --trail-dir, --verbose).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use wave_handoff::HandoffState;

/// wave: registro de handoffs entre agentes (protocolo H&&S).
#[derive(Debug, Parser)]
#[command(name = "wave", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Arquivo de configuração TOML (padrão: `wave.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Sobrescreve o diretório de marcadores.
    #[arg(long, global = true)]
    pub handoff_dir: Option<PathBuf>,

    /// Sobrescreve o diretório da trilha.
    #[arg(long, global = true)]
    pub trail_dir: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Operações sobre marcadores de handoff.
    #[command(subcommand)]
    Handoff(HandoffCommand),
}

#[derive(Debug, Subcommand)]
pub enum HandoffCommand {
    /// Cria um novo marcador de handoff.
    Create {
        /// Agente de origem.
        #[arg(long)]
        from: String,

        /// Agente de destino.
        #[arg(long)]
        to: String,

        /// Estado do handoff.
        #[arg(long, value_enum, ignore_case = true, default_value_t = StateArg::Pass)]
        state: StateArg,

        /// Objeto JSON com o contexto transferido.
        #[arg(long)]
        context: Option<String>,

        /// Identificador da sessão.
        #[arg(long)]
        session: Option<String>,

        /// Pontuação de coerência (0-100).
        #[arg(long, value_parser = parse_score)]
        score: Option<f64>,
    },

    /// Valida um marcador armazenado.
    Validate {
        /// Identificador do marcador.
        marker_id: String,
    },

    /// Mostra a cadeia de handoffs de uma sessão.
    Chain {
        /// Identificador da sessão.
        session: Option<String>,
    },

    /// Gera um diagrama Mermaid da sessão.
    Viz {
        /// Identificador da sessão.
        session: Option<String>,

        /// Arquivo de saída (imprime no stdout se omitido).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Filtra marcadores de todas as sessões.
    Query {
        #[arg(long)]
        session: Option<String>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long, value_enum, ignore_case = true)]
        state: Option<StateArg>,

        /// Limite inferior inclusivo (RFC 3339).
        #[arg(long)]
        since: Option<DateTime<Utc>>,

        /// Limite superior inclusivo (RFC 3339).
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },

    /// Lista as sessões conhecidas.
    Sessions,

    /// Mostra as entradas da trilha de uma sessão.
    Trail {
        /// Identificador da sessão.
        session: Option<String>,
    },
}

/// Estado aceito pela CLI, mapeado para [`HandoffState`] internamente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    /// Verificação de coerência aprovada.
    #[value(name = "WAVE")]
    Wave,
    /// Handoff explícito.
    #[value(name = "PASS")]
    Pass,
    /// Falha de gate.
    #[value(name = "BLOCK")]
    Block,
    /// Aguardando entrada externa.
    #[value(name = "HOLD")]
    Hold,
    /// Nova iteração forçada.
    #[value(name = "PUSH")]
    Push,
}

/// Aceita apenas números finitos: `NaN` e `inf` não sobrevivem ao JSON.
fn parse_score(raw: &str) -> Result<f64, String> {
    let score: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if score.is_finite() {
        Ok(score)
    } else {
        Err(format!("score must be a finite number, got {raw}"))
    }
}

impl From<StateArg> for HandoffState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Wave => HandoffState::Wave,
            StateArg::Pass => HandoffState::Pass,
            StateArg::Block => HandoffState::Block,
            StateArg::Hold => HandoffState::Hold,
            StateArg::Push => HandoffState::Push,
        }
    }
}
