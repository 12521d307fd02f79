use clap::Parser;
use padrao::cli::{Cli, Commands};
use padrao::types::config::Config;
use padrao::PadraoResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> PadraoResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config).unwrap_or_else(|e| {
            eprintln!("Invalid configuration ({}), using defaults", e);
            Config::default_config()
        })
    } else {
        Config::default_config()
    };

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("padrao={}", log_level)
            .parse()
            .unwrap_or_else(|_| "padrao=info".parse().expect("fallback directive is valid")),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            padrao::cli::commands::init(path).await?;
        }
        Commands::Learn { dir, project_id } => {
            padrao::cli::commands::learn(&dir, project_id, &config).await?;
        }
        Commands::Improve { patterns, write } => {
            padrao::cli::commands::improve(&patterns, write, &config, &cli.config).await?;
        }
        Commands::Match { file, pattern } => {
            padrao::cli::commands::match_file(&file, pattern.as_deref(), &config).await?;
        }
        Commands::Insights => {
            padrao::cli::commands::insights(&config).await?;
        }
        Commands::Export { output } => {
            padrao::cli::commands::export(&output, &config).await?;
        }
        Commands::Import { input } => {
            padrao::cli::commands::import(&input, &config).await?;
        }
        Commands::Reset { yes } => {
            padrao::cli::commands::reset(yes, &config).await?;
        }
        Commands::Config => {
            padrao::cli::commands::config_cmd(&cli.config).await?;
        }
        Commands::Doctor => {
            padrao::cli::commands::doctor(&config).await?;
        }
        Commands::Version => {
            padrao::cli::commands::version();
        }
    }

    Ok(())
}
