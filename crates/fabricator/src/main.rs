//! Hive Fabricator - writes the shared deployment configuration
//!
//! Addresses default to this host's outbound IP. An existing configuration is
//! kept unless `--force` (or `HIVE_FORCE`) is given. The empty registry seed
//! is created alongside.

use anyhow::Context;
use clap::Parser;
use hive_common::registry::load_seed;
use hive_common::{net, HiveConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "hive-fabricator",
    version,
    about = "Generate the Hive deployment configuration",
    after_help = "EXAMPLES:\n    \
        hive-fabricator 10.0.0.1 10.0.0.9\n    \
        hive-fabricator --force --vendor acme"
)]
struct Args {
    /// Coordinator host (defaults to this host's outbound IP)
    #[arg(value_name = "COORDINATOR_ADDR")]
    coordinator_addr: Option<String>,

    /// Standby host (defaults to this host's outbound IP)
    #[arg(value_name = "STANDBY_ADDR")]
    standby_addr: Option<String>,

    /// Overwrite an existing configuration
    #[arg(long, env = "HIVE_FORCE")]
    force: bool,

    /// Vendor label recorded in the configuration
    #[arg(long, env = "HIVE_VENDOR", default_value = "")]
    vendor: String,

    /// Configuration file to write
    #[arg(long, env = "HIVE_CONFIG", default_value = hive_common::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hive_fabricator=info,hive_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let local = net::local_ip().to_string();
    info!("Hive fabricator, local IP {}", local);

    let path = &args.config;

    let config = if path.exists() && !args.force {
        let existing = HiveConfig::from_file(path)
            .with_context(|| format!("existing configuration at {} is invalid", path.display()))?;
        info!(
            "Keeping configuration at {}: coordinator {}, standby {}",
            path.display(),
            existing.coordinator_addr,
            existing.standby_addr
        );
        existing
    } else {
        let coordinator_addr = args.coordinator_addr.clone().unwrap_or_else(|| local.clone());
        let standby_addr = args.standby_addr.clone().unwrap_or_else(|| local.clone());
        let config = HiveConfig::generate(coordinator_addr, standby_addr, args.vendor.clone());
        config
            .validate()
            .context("generated configuration is invalid")?;
        config
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {} (worker id {})", path.display(), config.worker_id);
        config
    };

    load_seed(&config.registry_seed_path)
        .with_context(|| format!("failed to prepare {}", config.registry_seed_path.display()))?;

    info!(
        "Deployment ready. Coordinator {}, standby {}",
        config.coordinator_url(),
        config.standby_url()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_positional_addresses() {
        let args = Args::try_parse_from(["hive-fabricator", "10.0.0.1", "10.0.0.9", "--force"]).unwrap();

        assert_eq!(args.coordinator_addr.as_deref(), Some("10.0.0.1"));
        assert_eq!(args.standby_addr.as_deref(), Some("10.0.0.9"));
        assert!(args.force);
    }

    #[test]
    fn test_help_is_not_an_address() {
        let err = Args::try_parse_from(["hive-fabricator", "--help"]).unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_extra_arguments_rejected() {
        assert!(Args::try_parse_from(["hive-fabricator", "a", "b", "c"]).is_err());
        assert!(Args::try_parse_from(["hive-fabricator", "--bogus"]).is_err());
    }
}
