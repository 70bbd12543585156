use anyhow::Result;
use clap::Parser;
use gitintel::{
    app,
    cli::{handle_meeting_command, handle_project_command, handle_session_command, Cli, CliCommand},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("GitIntel {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Project(args)) => {
            let config = app::load_config(config_path)?;
            let db = app::open_database(&config)?;
            handle_project_command(&db, args)?;
            return Ok(());
        }
        Some(CliCommand::Meeting(args)) => {
            let config = app::load_config(config_path)?;
            let db = app::open_database(&config)?;
            handle_meeting_command(&db, args)?;
            return Ok(());
        }
        Some(CliCommand::Session(args)) => {
            let config = app::load_config(config_path)?;
            let db = app::open_database(&config)?;
            handle_session_command(&db, &config, args)?;
            return Ok(());
        }
        Some(CliCommand::Serve) | None => {}
    }

    app::run_service(config_path).await
}
