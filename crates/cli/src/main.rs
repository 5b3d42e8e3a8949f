mod doctor_commands;
mod run_commands;
mod settings;
mod status_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    courier_config::TransportMode,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "courier",
    about = "Courier: Telegram message relay with away-mode auto-replies"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./courier.toml and ~/.config/courier/).
    #[arg(long, global = true, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,
    /// Directory holding the routing database.
    #[arg(long, global = true, env = "COURIER_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Webhook listener port (overrides config and PORT).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Update delivery: auto, polling or webhook.
    #[arg(long, global = true)]
    mode: Option<TransportMode>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay (default when no subcommand is provided).
    Run,
    /// Check configuration, storage and credentials.
    Doctor,
    /// Print the persisted availability flag and routing table size.
    Status,
}

impl Cli {
    fn overrides(&self) -> settings::Overrides {
        settings::Overrides {
            port: self.port,
            mode: self.mode,
        }
    }
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "courier starting");
            let config = settings::load(cli.config.as_deref(), &cli.overrides())?;
            run_commands::handle_run(config, cli.data_dir.as_deref()).await
        },
        Some(Commands::Doctor) => {
            doctor_commands::handle_doctor(
                cli.config.as_deref(),
                cli.data_dir.as_deref(),
                &cli.overrides(),
            )
            .await
        },
        Some(Commands::Status) => {
            let config = settings::load(cli.config.as_deref(), &cli.overrides())?;
            status_commands::handle_status(&config, cli.data_dir.as_deref()).await
        },
    }
}
