use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schedkit_config::ProfileLoader;
use schedkit_plugins::{BasicHandle, Features, Framework, in_tree_registry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "schedkit",
    version,
    about = "schedkit - scheduler plugin registry tooling"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List plugins in the default registry
    Plugins,

    /// Load a profile and instantiate its plugins
    Check {
        /// Profile file (defaults to the profile in the config directory)
        #[arg(long, env = "SCHEDKIT_PROFILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match cli.command {
        Commands::Plugins => {
            let registry = in_tree_registry(&Features::new())?;
            println!("Registered plugins:");
            for name in registry.names() {
                println!("  {name}");
            }
        }
        Commands::Check { config } => {
            let profile = match &config {
                Some(path) => ProfileLoader::load_file(path)
                    .with_context(|| format!("loading profile {}", path.display()))?,
                None => ProfileLoader::new().load().context("loading profile")?,
            };

            let features = Features::from_profile(&profile);
            let registry = in_tree_registry(&features)?.freeze();
            let handle = BasicHandle::new(profile.scheduler_name.clone());
            let framework = Framework::new(&registry, &profile, &handle)
                .with_context(|| format!("profile {}", profile.scheduler_name))?;

            println!("Profile {}:", framework.profile_name());
            if framework.plugins().is_empty() {
                println!("  (no plugins enabled)");
            }
            for plugin in framework.plugins() {
                println!("  {} - {:?}", plugin.name(), plugin);
            }
            let gates: Vec<&str> = features.iter().collect();
            if !gates.is_empty() {
                println!("Feature gates: {}", gates.join(", "));
            }
        }
    }

    Ok(())
}
