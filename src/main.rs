use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use release_push::config;
use release_push::domain::RefKind;
use release_push::ui;
use release_push::{PublisherConfig, RefPublisher};

#[derive(clap::Parser)]
#[command(
    name = "release-push",
    version,
    about = "Idempotently push release branches and tags to a remote"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, default_value = ".", help = "Path to the repository")]
    repo: String,

    #[arg(long, help = "Simulate pushes without changing the remote")]
    dry_run: bool,

    #[arg(long, help = "Extra attempts for pushes failing on the network")]
    max_retries: Option<u32>,

    #[arg(long, help = "Remote to publish to")]
    remote: Option<String>,

    #[arg(long, help = "Branch to check out before publishing")]
    default_branch: Option<String>,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish release branches (release-<major>.<minor>)
    Branch {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Publish release tags reachable from the default branch
    Tag {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref())?;

    let mut settings = config.publish;
    settings.dry_run |= args.dry_run;
    if let Some(max_retries) = args.max_retries {
        settings.max_retries = max_retries;
    }
    if let Some(remote) = args.remote {
        settings.remote = remote;
    }
    if let Some(branch) = args.default_branch {
        settings.default_branch = branch;
    }

    let publisher_config = PublisherConfig::from_settings(&settings, &args.repo);
    let mut publisher = RefPublisher::open(publisher_config)?;

    let (kind, names) = match args.command {
        Command::Branch { names } => (RefKind::Branch, names),
        Command::Tag { names } => (RefKind::Tag, names),
    };

    for name in &names {
        let outcome = match kind {
            RefKind::Branch => publisher.publish_branch(name)?,
            RefKind::Tag => publisher.publish_tag(name)?,
        };
        ui::display_outcome(kind, name, outcome, settings.dry_run);
    }

    Ok(())
}
