use crate::conf::{ConfigOverrides, MonitorConfig, resolve_config};
use anyhow::Context;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Validate configuration and exit
    Check {
        /// Path to an HCL config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Print resolved configuration
    Dump {
        /// Path to an HCL config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Output as JSON
        #[arg(long, conflicts_with = "hcl")]
        json: bool,

        /// Output as HCL (default)
        #[arg(long)]
        hcl: bool,
    },
}

pub fn run(cmd: ConfigCmd) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Check { config, overrides } => {
            let cfg = resolve_config(config.as_deref(), &overrides)
                .context("configuration check failed")?;
            check(&cfg);
            Ok(())
        }
        ConfigCmd::Dump {
            config,
            overrides,
            json,
            hcl: _,
        } => {
            let cfg = resolve_config(config.as_deref(), &overrides)?;
            println!("{}", dump(&cfg, json)?);
            Ok(())
        }
    }
}

fn check(cfg: &MonitorConfig) {
    println!("✔ Config loaded successfully");
    println!("✔ following {}", cfg.file.display());
    println!(
        "✔ stats every {}s, top {} per ranking",
        cfg.stats_period_seconds, cfg.top_k
    );
    println!(
        "✔ alert above {} req/s over {}s",
        cfg.threshold, cfg.alert_period_seconds
    );
}

pub fn dump(cfg: &MonitorConfig, json: bool) -> anyhow::Result<String> {
    let out = if json {
        serde_json::to_string_pretty(cfg)?
    } else {
        hcl::to_string(cfg)?
    };
    Ok(out)
}
