mod cli;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, HandoffCommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use ui::Terminal;
use wave_handoff::{
    HandoffConfig, HandoffContext, HandoffError, HandoffQuery, HandoffState, HandshakeProtocol,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let term = Terminal::default();
    match run(cli, &term).await {
        Ok(code) => code,
        Err(err) => {
            term.print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "wave_handoff=debug"
    } else {
        "wave_handoff=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<HandoffConfig> {
    let mut config = match &cli.config {
        Some(path) => HandoffConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => HandoffConfig::load().context("failed to load wave.toml")?,
    };
    if let Some(dir) = &cli.handoff_dir {
        config.handoff_dir = dir.clone();
    }
    if let Some(dir) = &cli.trail_dir {
        config.trail_dir = dir.clone();
    }
    Ok(config)
}

async fn run(cli: Cli, term: &Terminal) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    let protocol = HandshakeProtocol::new(&config);
    let session_or_default = |session: Option<String>| {
        session.unwrap_or_else(|| config.default_session.clone())
    };

    let Command::Handoff(command) = cli.command;
    match command {
        HandoffCommand::Create {
            from,
            to,
            state,
            context,
            session,
            score,
        } => {
            let context: HandoffContext = match context {
                Some(raw) => serde_json::from_str(&raw)
                    .context("--context must be a JSON object")?,
                None => HandoffContext::new(),
            };
            let session = session_or_default(session);
            let marker = protocol
                .create_handoff(&from, &to, HandoffState::from(state), context, &session, score)
                .await?;
            term.print_created(&marker)?;
        }
        HandoffCommand::Validate { marker_id } => {
            let marker = protocol
                .find_marker_by_id(&marker_id)
                .await?
                .ok_or_else(|| HandoffError::MarkerNotFound(marker_id.clone()))?;
            let result = protocol.validate_handoff(&marker).await?;
            term.print_validation(&result);
            if !result.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        HandoffCommand::Chain { session } => {
            let session = session_or_default(session);
            let chain = protocol.get_handoff_chain(&session).await?;
            term.print_chain(&session, &chain);
        }
        HandoffCommand::Viz { session, output } => {
            let session = session_or_default(session);
            let diagram = protocol.visualize_workflow(&session).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &diagram)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    term.print_written(&path);
                }
                None => term.print_diagram(&diagram),
            }
        }
        HandoffCommand::Query {
            session,
            from,
            to,
            state,
            since,
            until,
        } => {
            let query = HandoffQuery {
                session_id: session,
                from_agent: from,
                to_agent: to,
                state: state.map(HandoffState::from),
                start_time: since,
                end_time: until,
            };
            let markers = protocol.query_handoffs(&query).await?;
            term.print_markers(&markers);
        }
        HandoffCommand::Sessions => {
            let sessions = protocol.get_all_sessions().await?;
            term.print_sessions(&sessions);
        }
        HandoffCommand::Trail { session } => {
            let session = session_or_default(session);
            let entries = protocol.trail_entries(&session).await?;
            term.print_trail(&session, &entries);
        }
    }

    Ok(ExitCode::SUCCESS)
}
