mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, invite::InviteSubcommand, member::MemberSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "quadra",
    about = "Futsal club rosters: issue team invitations and accept or decline them",
    version,
    propagate_version = true
)]
struct Cli {
    /// Club root (default: auto-detect from .quadra/ or .git/)
    #[arg(long, global = true, env = "QUADRA_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a club in the current directory
    Init {
        /// Club display name (defaults to the directory name)
        #[arg(long)]
        club: Option<String>,
    },

    /// Issue, list and decide team invitations
    Invite {
        #[command(subcommand)]
        subcommand: InviteSubcommand,
    },

    /// Inspect team rosters
    Member {
        #[command(subcommand)]
        subcommand: MemberSubcommand,
    },

    /// Show or validate the club configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run the roster HTTP API
    Serve {
        /// Port to listen on (default: server.port from config; 0 = OS-assigned)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. }
        | Commands::Invite {
            subcommand: InviteSubcommand::Watch { .. },
        } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { club } => cmd::init::run(&root, club.as_deref(), cli.json),
        Commands::Invite { subcommand } => cmd::invite::run(&root, subcommand, cli.json),
        Commands::Member { subcommand } => cmd::member::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
