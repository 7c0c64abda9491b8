use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "tunegrid",
    about = "TuneGrid — study configuration and trial resolution",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve trial parameters against a study's search space.
    ///
    /// The trial file holds one JSON trial or an array of them. Raw values
    /// are cast to their external types and `name[i]` parameters are
    /// grouped into lists.
    Resolve {
        /// Path to study.toml
        #[arg(short, long)]
        config: String,
        /// Path to the trial JSON file
        #[arg(short, long)]
        trial: String,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List study metadata at and below a namespace
    Metadata {
        #[arg(short, long)]
        config: String,
        /// Encoded namespace, e.g. `designer:gp` (default: root)
        #[arg(long, default_value = "")]
        ns: String,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Parse and validate a study config
    Validate {
        #[arg(short, long)]
        config: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { config, trial, format } => {
            commands::resolve::resolve(&config, &trial, format)
        }
        Commands::Metadata { config, ns, format } => {
            commands::metadata::list(&config, &ns, format)
        }
        Commands::Validate { config } => commands::validate::validate(&config),
    }
}
