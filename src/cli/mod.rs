//! Command-line interface for concord.
//!
//! Provides commands for running a query through an advisor panel,
//! inspecting stored sessions, and showing the resolved configuration.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::adapters::{HttpSynthesizer, Synthesizer};
use crate::config;
use crate::core::{
    ConflictDetector, DecisionBuilder, EventStreamer, FileSessionStore, KeywordSignalExtractor,
    Orchestrator, Panel, SessionStore,
};
use crate::domain::CollaborationSession;

/// concord - multi-advisor collaboration and conflict-resolution engine
#[derive(Parser, Debug)]
#[command(name = "concord")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query through an advisor panel
    Run {
        /// Panel name (will look for panels/<name>.yaml) or a path to
        /// a panel file
        panel: String,

        /// The query (reads from stdin if not provided)
        #[arg(short, long)]
        query: Option<String>,

        /// Print each pipeline event as line-delimited JSON while the
        /// run progresses
        #[arg(long)]
        stream: bool,
    },

    /// Show a stored session
    Status {
        /// Session ID (UUID)
        session_id: String,
    },

    /// List stored sessions
    Sessions {
        /// Maximum number of sessions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Remove a stored session
    Clear {
        /// Session ID to remove
        session_id: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                panel,
                query,
                stream,
            } => run_query(&panel, query, stream).await,
            Commands::Status { session_id } => show_status(&session_id).await,
            Commands::Sessions { limit } => list_sessions(limit).await,
            Commands::Clear { session_id } => clear_session(&session_id).await,
            Commands::Config => show_config(),
        }
    }
}

/// Run a query through a panel, optionally streaming events.
async fn run_query(panel_name: &str, query: Option<String>, stream: bool) -> Result<()> {
    let panel = load_panel(panel_name)?;
    panel.validate()?;

    let query = match query {
        Some(q) => q,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read query from stdin")?;
            buffer.trim().to_string()
        }
    };
    if query.is_empty() {
        anyhow::bail!("Query is empty; pass --query or pipe text on stdin");
    }

    let orchestrator = Arc::new(build_orchestrator(&panel).await?);

    let session = if stream {
        let streamer = EventStreamer::new(orchestrator);
        let (mut rx, handle) = streamer.stream(query);

        while let Some(event) = rx.recv().await {
            println!("{}", event.encode());
        }

        handle.await.context("Run task failed")?
    } else {
        orchestrator.run(&query).await
    };

    print_session(&session, false);
    Ok(())
}

/// Wire a panel into a ready-to-run orchestrator.
async fn build_orchestrator(panel: &Panel) -> Result<Orchestrator> {
    let cfg = config::config()?;

    // Panel synthesis wins; the config file provides a shared default
    let synthesizer: Option<Box<dyn Synthesizer>> = panel.build_synthesizer().or_else(|| {
        cfg.synthesis
            .endpoint
            .as_ref()
            .map(|endpoint| Box::new(HttpSynthesizer::new(endpoint)) as Box<dyn Synthesizer>)
    });

    let store = FileSessionStore::open(config::sessions_dir()?)
        .await
        .context("Failed to open session store")?;

    Ok(Orchestrator::new(
        panel.build_members(),
        Arc::new(KeywordSignalExtractor::new(&panel.thresholds)),
        ConflictDetector::new(panel.thresholds.clone()),
        DecisionBuilder::new(synthesizer, panel.synthesis_timeout()),
        Arc::new(store),
        panel.default_confidence,
    ))
}

/// Load a panel by name from the panels directory, or directly from a
/// path.
fn load_panel(name: &str) -> Result<Panel> {
    let direct = PathBuf::from(name);
    if direct.exists() {
        return Panel::from_file(&direct);
    }

    let path = config::panels_dir()?.join(format!("{}.yaml", name));
    if !path.exists() {
        anyhow::bail!(
            "Panel '{}' not found (looked for {})",
            name,
            path.display()
        );
    }

    Panel::from_file(&path)
}

/// Show a stored session.
async fn show_status(session_id: &str) -> Result<()> {
    let session_id =
        Uuid::parse_str(session_id).context("Session ID must be a valid UUID")?;

    let store = FileSessionStore::open(config::sessions_dir()?).await?;
    let session = store.get(session_id).await?;

    print_session(&session, true);
    Ok(())
}

/// List stored sessions, most recent first.
async fn list_sessions(limit: usize) -> Result<()> {
    let store = FileSessionStore::open(config::sessions_dir()?).await?;
    let ids = store.list_active().await?;

    let mut sessions = Vec::new();
    for id in ids {
        if let Ok(session) = store.get(id).await {
            sessions.push(session);
        }
    }
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if sessions.is_empty() {
        println!("No stored sessions.");
        return Ok(());
    }

    for session in sessions.into_iter().take(limit) {
        println!(
            "{}  {}  {}  {}",
            session.session_id,
            session.created_at.format("%Y-%m-%d %H:%M:%S"),
            state_label(&session),
            truncate(&session.query, 60)
        );
    }
    Ok(())
}

/// Remove a stored session.
async fn clear_session(session_id: &str) -> Result<()> {
    let session_id =
        Uuid::parse_str(session_id).context("Session ID must be a valid UUID")?;

    let store = FileSessionStore::open(config::sessions_dir()?).await?;
    store.clear(session_id).await?;

    println!("Cleared session {}", session_id);
    Ok(())
}

/// Show resolved configuration.
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("home:      {}", cfg.home.display());
    println!("panels:    {}", cfg.panels.display());
    println!("sessions:  {}", cfg.sessions.display());
    match &cfg.config_file {
        Some(path) => println!("config:    {}", path.display()),
        None => println!("config:    (defaults)"),
    }
    println!(
        "synthesis: {}",
        cfg.synthesis.endpoint.as_deref().unwrap_or("(fallback only)")
    );
    println!(
        "thresholds: budget_relative_diff={} ordinal_spread={} confidence_spread={}",
        cfg.thresholds.budget_relative_diff,
        cfg.thresholds.ordinal_spread,
        cfg.thresholds.confidence_spread
    );
    Ok(())
}

/// Render a session to stdout.
fn print_session(session: &CollaborationSession, full: bool) {
    println!();
    println!("Session:  {}", session.session_id);
    println!("State:    {}", state_label(session));
    println!("Query:    {}", truncate(&session.query, 100));
    println!(
        "Advisors: {} consulted, {} failed",
        session.metrics.advisors_consulted, session.metrics.advisors_failed
    );
    println!(
        "Conflicts: {} detected, {} resolved (score {:.2})",
        session.metrics.conflicts_detected,
        session.metrics.conflicts_resolved,
        session.metrics.collaboration_score
    );

    if full {
        for (advisor_id, result) in &session.advisor_results {
            println!();
            println!(
                "--- {} (confidence {:.2}{}) ---",
                advisor_id,
                result.confidence,
                if result.failed { ", failed" } else { "" }
            );
            println!("{}", truncate(&result.analysis_text, 500));
        }
        for conflict in &session.conflicts {
            println!();
            println!(
                "Conflict: {} [{}] involving {}",
                conflict.conflict_type.as_str(),
                conflict.severity.as_str(),
                conflict.agents_involved.join(", ")
            );
        }
    }

    println!();
    println!("{}", session.unified_response);
}

fn state_label(session: &CollaborationSession) -> String {
    match &session.state {
        crate::domain::SessionState::Running => "running".to_string(),
        crate::domain::SessionState::Completed => "completed".to_string(),
        crate::domain::SessionState::Failed { error } => format!("failed ({})", error),
        crate::domain::SessionState::Cancelled => "cancelled".to_string(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let cut: String = flat.chars().take(limit).collect();
    format!("{}...", cut)
}
