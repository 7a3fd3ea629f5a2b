use clap::Parser;
use pr_watcher::app::Application;
use pr_watcher::cli::{Cli, Commands, handle_command};
use pr_watcher::errors::AppError;
use pr_watcher::logger::setup_logging;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // Load config first to get log level
    let config = cli.load_config().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}", e);
        std::process::exit(1);
    });

    // Keep the guard alive to ensure log messages are flushed
    let _guard = setup_logging(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => Application::serve(config).await,
        command => {
            if let Err(e) = handle_command(&command, &config) {
                eprintln!("{}", e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
