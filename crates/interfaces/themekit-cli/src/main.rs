use clap::{Parser, Subcommand};
use themekit_cli::{commands, parse_batch_size, ApiArgs, ThemeArgs};
use themekit_config::{DEFAULT_PULL_BATCH_SIZE, DEFAULT_PUSH_BATCH_SIZE};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(flatten)]
    api: ApiArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload local changes and delete remote-only resources
    Push {
        #[command(flatten)]
        theme: ThemeArgs,
        #[arg(long, help = "Keep resources that only exist remotely")]
        omit_delete: bool,
        #[arg(long, value_parser = parse_batch_size, default_value_t = DEFAULT_PUSH_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Replace the local theme directory with the remote theme
    Pull {
        #[command(flatten)]
        theme: ThemeArgs,
        #[arg(short, long, help = "Clear a non-empty theme directory without asking")]
        yes: bool,
        #[arg(long, value_parser = parse_batch_size, default_value_t = DEFAULT_PULL_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Push local changes as they happen
    Watch {
        #[command(flatten)]
        theme: ThemeArgs,
        #[arg(long, help = "Do not delete remote resources when local files are removed")]
        omit_delete: bool,
        #[arg(long)]
        skip_initial_push: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).expect("default subscriber");

    match cli.command {
        Commands::Push {
            theme,
            omit_delete,
            batch_size,
        } => commands::cmd_push(&cli.api, &theme, omit_delete, batch_size).await?,
        Commands::Pull {
            theme,
            yes,
            batch_size,
        } => commands::cmd_pull(&cli.api, &theme, yes, batch_size).await?,
        Commands::Watch {
            theme,
            omit_delete,
            skip_initial_push,
        } => commands::cmd_watch(&cli.api, &theme, omit_delete, skip_initial_push).await?,
    }

    Ok(())
}
