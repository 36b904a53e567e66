//! trickle - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::Confirm;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trickle::config::API_KEY_ENV;
use trickle::git::inspect;
use trickle::{
    ChangeSet, ChatCompletionsClient, Config, GitCli, LlmConfig, MessageGenerator,
    ProcessingOrder, Sequencer, TextGenerator,
};

/// Commit and push pending changes one file at a time with generated messages.
#[derive(Parser, Debug)]
#[command(name = "trickle")]
#[command(about = "Commit and push pending changes one file at a time with generated messages")]
#[command(version)]
struct Cli {
    /// Repository root (the top-level working tree). Defaults to the current directory
    #[arg(long, env = "TRICKLE_ROOT")]
    root: Option<PathBuf>,

    /// Config file (defaults to <root>/.trickle.toml when present)
    #[arg(long, env = "TRICKLE_CONFIG")]
    config: Option<PathBuf>,

    /// Remote to push to
    #[arg(long)]
    remote: Option<String>,

    /// Branch to push
    #[arg(long)]
    branch: Option<String>,

    /// Path prefix to leave alone (repeatable)
    #[arg(long = "exclude", value_name = "PATH")]
    exclude: Vec<String>,

    /// Seconds to wait between files
    #[arg(long, value_name = "SECS")]
    pacing: Option<u64>,

    /// Commit locally without pushing
    #[arg(long)]
    no_push: bool,

    /// Skip the remote text-generation call and use templates only
    #[arg(long)]
    offline: bool,

    /// Dry run - list detected changes without committing
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Step 1: Load configuration and apply CLI overrides
    let lookup_root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut config =
        Config::load(cli.config.as_deref(), &lookup_root).context("Invalid configuration")?;
    apply_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    // Step 2: Open the repository
    let root = cli
        .root
        .clone()
        .or_else(|| config.root.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let vcs = GitCli::open(&root).with_context(|| {
        format!(
            "Cannot run in {}. Point --root at the top-level directory of a git working tree.",
            root.display()
        )
    })?;

    // Step 3: Detect changes
    let filter = config.exclusion_filter(vcs.root());
    let changes = inspect(&vcs, &filter).context("Failed to inspect working tree")?;

    if changes.is_empty() {
        println!("No new, modified, or deleted files to commit.");
        return Ok(());
    }

    print_changes(&changes, &config.order);

    if cli.dry_run {
        println!();
        println!("Dry run complete. No changes made.");
        return Ok(());
    }

    // Step 4: Confirm
    if !cli.yes {
        println!();
        let target = if config.push {
            format!("push each to {}/{}", config.remote, config.branch)
        } else {
            "keep the commits local".to_string()
        };
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Commit {} path(s) one at a time and {target}?",
                changes.len()
            ))
            .default(false)
            .interact()
            .context("Confirmation prompt failed")?;
        if !confirmed {
            bail!("Cancelled");
        }
    }

    // Step 5: Commit, push and pace
    let messages = MessageGenerator::new(build_text_generator(&config.llm, cli.offline));
    let summary = Sequencer::new(&vcs, &messages, config.sequencer())
        .run(&changes)
        .await;

    println!();
    println!("{summary}");

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "trickle=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(remote) = &cli.remote {
        config.remote = remote.clone();
    }
    if let Some(branch) = &cli.branch {
        config.branch = branch.clone();
    }
    config.exclude.extend(cli.exclude.iter().cloned());
    if let Some(pacing) = cli.pacing {
        config.pacing_secs = pacing;
    }
    if cli.no_push {
        config.push = false;
    }
}

/// The remote generator, or `None` when offline or no key is configured.
fn build_text_generator(llm: &LlmConfig, offline: bool) -> Option<Box<dyn TextGenerator>> {
    if offline {
        info!("Offline mode, commit messages will come from templates");
        return None;
    }
    match ChatCompletionsClient::new(llm) {
        Ok(client) => Some(Box::new(client)),
        Err(e) => {
            warn!(
                "{e}. Set {API_KEY_ENV} or llm.api_key; modified files will get fallback messages"
            );
            None
        }
    }
}

fn print_changes(changes: &ChangeSet, order: &ProcessingOrder) {
    println!("Found {} change(s):", changes.len());
    for (kind, path) in changes.ordered(order) {
        println!("  {:<8} {path}", kind.as_str());
    }
}
