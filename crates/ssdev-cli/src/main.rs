mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::prepare_input::InputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ssdev",
    about = "Developer workflow helpers: forks, pull requests and composer constraints for CMS projects",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from composer.json or .git/)
    #[arg(long, global = true, env = "SSDEV_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Show debug logging
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Point composer.json at forks or pull request branches
    Fork {
        /// GitHub references: org/repo, org/repo#123, org/repo/tree/branch or full URLs
        #[arg(required = true)]
        refs: Vec<String>,
    },

    /// Clone a repository, checking out the pull request branch if one is given
    Clone {
        /// GitHub repository or pull request reference
        reference: String,
        /// Parent directory for the clone (default: clone_dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Add the creative-commoners or security remote to the current checkout
    Remotes {
        /// Keep the origin remote's name instead of renaming it to 'orig'
        #[arg(long)]
        no_rename_origin: bool,
        /// Add the silverstripe-security remote instead of creative-commoners
        #[arg(long)]
        security: bool,
        /// Fetch all remotes afterwards
        #[arg(long)]
        fetch: bool,
    },

    /// Check out pull request branches inside vendor/
    Checkout {
        /// Pull request references
        #[arg(required = true)]
        refs: Vec<String>,
    },

    /// Work out which PHP version the project should use
    PhpVersion,

    /// Turn a markdown list of pull requests into command arguments
    PrepareInput {
        /// Lines of the form "- org/repo#123"
        #[arg(allow_hyphen_values = true)]
        text: String,
        #[arg(long, value_enum, short = 'f', default_value_t = InputFormat::Spaces)]
        format: InputFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Fork { refs } => cmd::fork::run(&root, &refs, cli.json),
        Commands::Clone { reference, dir } => cmd::clone::run(&reference, dir.as_deref(), cli.json),
        Commands::Remotes {
            no_rename_origin,
            security,
            fetch,
        } => cmd::remotes::run(&root, !no_rename_origin, security, fetch, cli.json),
        Commands::Checkout { refs } => cmd::checkout::run(&root, &refs, cli.json),
        Commands::PhpVersion => cmd::php_version::run(&root, cli.json),
        Commands::PrepareInput { text, format } => cmd::prepare_input::run(&text, format, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
