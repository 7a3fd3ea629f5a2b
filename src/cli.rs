use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, load_config};
use crate::errors::AppError;
use crate::notification::mailer::validate_recipients;
use crate::watch::ConfigResolver;

/// PR Watcher - email notifications for pull requests touching watched files
#[derive(Parser)]
#[command(name = "pr-watcher")]
#[command(about = "Receives GitHub pull request webhooks and emails watchers of matching files", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (defaults to $WATCH_CONFIG_FILE)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (overrides the configuration file)
    #[arg(short, long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Start the webhook server (default)
    Serve,

    /// Load and validate the configuration, then print a summary
    CheckConfig,

    /// Show which watch rule applies to a repository
    Resolve(ResolveArgs),
}

#[derive(Args, Clone)]
pub struct ResolveArgs {
    /// Repository in owner/name form (e.g., "org/repo")
    #[arg(value_name = "REPO")]
    pub repo: String,
}

impl Cli {
    /// Load the configuration and apply command line overrides
    pub fn load_config(&self) -> Result<Config, AppError> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }
}

/// Handle the commands that do not start the server
pub fn handle_command(command: &Commands, config: &Config) -> Result<(), AppError> {
    match command {
        Commands::Serve => Ok(()),
        Commands::CheckConfig => handle_check_config(config),
        Commands::Resolve(args) => handle_resolve(args, config),
    }
}

fn handle_check_config(config: &Config) -> Result<(), AppError> {
    let resolver = ConfigResolver::from_config(&config.watch)?;
    validate_recipients(resolver.rules())?;

    println!("Configuration OK: {} watch rule(s)", resolver.rules().len());
    for rule in resolver.rules() {
        println!(
            "  {} -> {} ({} pattern(s){})",
            rule.key(),
            rule.recipients().join(", "),
            rule.patterns().len(),
            if rule.notify_for_private_repos() {
                ", private repos included"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn handle_resolve(args: &ResolveArgs, config: &Config) -> Result<(), AppError> {
    let resolver = ConfigResolver::from_config(&config.watch)?;

    match resolver.resolve(&args.repo) {
        Some(resolved) => {
            println!("Repository: {}", args.repo);
            println!("Rule: {}", resolved.rule.key());
            println!("Wildcard match: {}", resolved.wildcard_matched);
            println!(
                "Patterns: {}",
                resolved.rule.patterns().raw().collect::<Vec<_>>().join(", ")
            );
            println!("Recipients: {}", resolved.rule.recipients().join(", "));
        }
        None => println!("No watch rule applies to {}", args.repo),
    }
    Ok(())
}
