use anyhow::{bail, Context, Result};
use clap::Parser;
use project_documenter::app::{self, commands, state::AppState};
use project_documenter::config::{session, settings};
use project_documenter::core::{DocumentAssembler, TokenEstimator, TriState};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Bundle selected project files into one Markdown document for an AI assistant."
)]
struct Cli {
    /// Project directory to document (default: the last opened project).
    #[arg(value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Objective placed at the top of the document.
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Check an entry by its project-relative path. Repeatable.
    #[arg(long = "select", value_name = "REL", conflicts_with = "all")]
    select: Vec<PathBuf>,

    /// Check every scanned entry.
    #[arg(long)]
    all: bool,

    /// Write the document to FILE instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Omit the project structure section.
    #[arg(long)]
    no_structure: bool,

    /// Print only the approximate token count.
    #[arg(long)]
    tokens: bool,

    /// Read and write config and session files in DIR.
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = cli.config_dir.as_deref();

    let config = settings::load_config(config_dir).context("Failed to load configuration")?;
    let session = session::load_session(config_dir).context("Failed to load session")?;
    let mut state = AppState::new(config, session, cli.config_dir.clone());

    let project = match cli.directory.clone() {
        Some(dir) => std::fs::canonicalize(&dir).unwrap_or(dir),
        None => remembered_project(&state)?,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    commands::load_project(project, tx.clone(), &mut state).await?;
    app::wait_for_scan(&mut rx, &tx, &mut state).await?;
    tracing::info!("Loaded {} entries.", state.tree.len());

    if cli.all {
        commands::toggle_all(TriState::Checked, &tx, &mut state)?;
    } else if !cli.select.is_empty() {
        commands::toggle_all(TriState::Unchecked, &tx, &mut state)?;
        for rel in &cli.select {
            commands::toggle_entry(rel, Some(TriState::Checked), &tx, &mut state)?;
        }
    }

    if let Some(prompt) = cli.prompt {
        commands::update_prompt(prompt, &tx, &mut state);
    }
    if cli.no_structure {
        state.config.show_project_structure = false;
    }

    if cli.tokens {
        println!("{}", TokenEstimator::format_estimate(commands::estimate_tokens(&state)));
        return Ok(());
    }

    match cli.output.as_deref() {
        Some(destination) => {
            let written = commands::export_document(Some(destination), &tx, &state)?;
            eprintln!("Wrote {}", written.display());
        }
        None => {
            let request = state.export_request();
            if request.checked_file_paths.is_empty() && request.prompt_text.trim().is_empty() {
                bail!("No files selected and no prompt provided");
            }
            print!("{}", DocumentAssembler::assemble(&request));
        }
    }

    Ok(())
}

fn remembered_project(state: &AppState) -> Result<PathBuf> {
    let last = &state.session.last_project_path;
    if !state.config.remember_project_path || last.is_empty() {
        bail!("No project directory given and none remembered");
    }
    let path = Path::new(last);
    if !path.is_dir() {
        bail!("The remembered project {} no longer exists", path.display());
    }
    Ok(path.to_path_buf())
}
