mod cli;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use tubecast_core::{ChannelName, Config};
use tubecast_server::context::AppContext;
use tubecast_server::prep;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tubecast=trace,tubecast_core=trace,tubecast_av=trace,tubecast_server=trace,tower_http=debug"
                .to_string()
        } else {
            "tubecast=info,tubecast_core=info,tubecast_av=info,tubecast_server=info,tower_http=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    let config_path = resolve_config_path(cli.config);

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, config_path.as_deref()))
        }
        Commands::Fetch { channel } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch_once(&channel, config_path.as_deref()))
        }
        Commands::CheckTools => check_tools(config_path.as_deref()),
        Commands::Validate {
            config: config_path_arg,
        } => {
            let path = config_path_arg.or(config_path);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tubecast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// `--config` beats the `TUBECAST_CONFIG` environment variable.
fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
    cli_path.or_else(|| std::env::var("TUBECAST_CONFIG").ok().map(PathBuf::from))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path);

    // CLI overrides beat the config file.
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting tubecast server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    tubecast_server::start(config).await?;
    Ok(())
}

async fn fetch_once(channel: &str, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let name: ChannelName = channel.parse()?;

    let ctx = AppContext::build(config)?;
    if !ctx.store.contains(&name) {
        anyhow::bail!("channel {name} is not configured");
    }

    tracing::info!("Preparing rendition for {name}");
    let path = prep::get_or_fetch(&ctx, &name).await?;
    println!("{}", path.display());
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let registry = tubecast_av::ToolRegistry::discover(&config.tools);

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in registry.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Cache dir: {}", config.cache.dir.display());
            println!("  Refresh interval: {}s", config.refresh.interval_secs);
            println!("  Channels: {}", config.channels.len());
            for channel in &config.channels {
                println!("    {} -> {}", channel.name, channel.url);
            }
            for warning in config.validate() {
                println!("  Warning: {warning}");
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Cache dir: {}", config.cache.dir.display());
        }
    }

    Ok(())
}
