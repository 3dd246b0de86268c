use clap::{Parser, Subcommand};
use radius_pair::ValidationMode;
use radius_pairtool::{Config, Session};
use std::process;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Load, print and validate RADIUS attribute-value pair lists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "pairtool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration file and print a summary
    CheckConfig {
        /// Path to configuration file
        #[arg(value_name = "CONFIG")]
        config_path: String,
    },

    /// Parse a pair file and print it back
    Print {
        /// Path to configuration file
        #[arg(value_name = "CONFIG")]
        config_path: String,

        /// Pair file to read
        #[arg(value_name = "FILE")]
        file: String,

        /// Sort pairs by attribute number before printing
        #[arg(short, long)]
        sort: bool,
    },

    /// Check a pair file against a filter file
    Validate {
        /// Path to configuration file
        #[arg(value_name = "CONFIG")]
        config_path: String,

        /// Filter file holding the conditions
        #[arg(value_name = "FILTER")]
        filter: String,

        /// Pair file to check
        #[arg(value_name = "INPUT")]
        input: String,

        /// Skip filter attributes missing from the input
        #[arg(short, long)]
        relaxed: bool,
    },
}

impl Command {
    fn config_path(&self) -> &str {
        match self {
            Command::CheckConfig { config_path }
            | Command::Print { config_path, .. }
            | Command::Validate { config_path, .. } => config_path,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_file(cli.command.config_path()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Could not load configuration from {}", cli.command.config_path());
            eprintln!("   Error: {}", e);
            process::exit(2);
        }
    };

    init_tracing(&config.log_level);

    match cli.command {
        Command::CheckConfig { config_path } => {
            println!("✓ Configuration validated successfully!");
            println!();
            println!("Configuration summary:");
            println!("  File: {}", config_path);
            println!("  Attributes: {}", config.attributes.len());
            println!("  Log level: {}", config.log_level);
            println!("  Strict validation: {}", config.strict_validation);
            match config.arena.max_pairs {
                Some(max) => println!("  Pair limit: {}", max),
                None => println!("  Pair limit: unlimited"),
            }
            println!();
            for attr in &config.attributes {
                println!("  {} ({}) {}", attr.full_name(), attr.number, attr.value_type);
            }
        }

        Command::Print { file, sort, .. } => {
            let mut session = session_or_exit(&config);
            let list = match session.load(&file) {
                Ok(list) => list,
                Err(e) => {
                    error!("Failed to load {}: {}", file, e);
                    process::exit(2);
                }
            };
            match session.print(list, sort) {
                Ok(lines) => {
                    for line in lines {
                        println!("{}", line);
                    }
                }
                Err(e) => {
                    error!("Failed to print {}: {}", file, e);
                    process::exit(2);
                }
            }
        }

        Command::Validate {
            filter,
            input,
            relaxed,
            ..
        } => {
            let mut session = session_or_exit(&config);
            if relaxed {
                session.set_mode(ValidationMode::Relaxed);
            }

            let loaded = session
                .load(&filter)
                .and_then(|f| session.load(&input).map(|i| (f, i)));
            let (filter_list, input_list) = match loaded {
                Ok(lists) => lists,
                Err(e) => {
                    error!("Failed to load pair files: {}", e);
                    process::exit(2);
                }
            };

            match session.validate(input_list, filter_list) {
                Ok(result) => match result.failure() {
                    None => {
                        info!("{} passed {}", input, filter);
                        println!("✓ {} matches {}", input, filter);
                    }
                    Some(failure) => {
                        println!("✗ {}", session.describe_failure(failure));
                        process::exit(1);
                    }
                },
                Err(e) => {
                    error!("Validation error: {}", e);
                    process::exit(2);
                }
            }
        }
    }
}

fn session_or_exit(config: &Config) -> Session {
    match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(2);
        }
    }
}
