use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use toml::Table;

use crate::agent::config::AxiAgentConfig;
use crate::sim::config::{Config, SimConfig};
use crate::sim::top::Sim;

#[derive(Parser, Debug, Default)]
#[command(version, about = "Loopback AXI4 master/slave bus-functional model")]
pub struct BfmArgs {
    #[arg(help = "Path to config.toml")]
    pub config_path: PathBuf,
    #[arg(long, help = "Override cycle budget")]
    pub cycles: Option<u64>,
    #[arg(long, help = "Override number of transactions to complete")]
    pub txns: Option<u64>,
    #[arg(long, help = "Override the seed mixed into every agent")]
    pub seed: Option<u64>,
    #[arg(long, help = "Enable log at level (0:warn, 1:info, 2:debug, 3:trace)")]
    pub log: Option<u64>,
    #[arg(long, help = "Write a JSON run summary to this path")]
    pub summary_json: Option<PathBuf>,
}

pub fn read_toml(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))
}

/// Make a Sim object from the TOML configuration.
/// If `cli_args` is given, override TOML options with CLI arguments.
pub fn make_sim(toml_string: &str, cli_args: Option<BfmArgs>) -> anyhow::Result<Sim> {
    let config_table: Table = toml::from_str(toml_string).context("cannot parse config toml")?;
    let mut sim_config = SimConfig::from_section(config_table.get("sim")).context("[sim]")?;
    let master_config = AxiAgentConfig::from_section(config_table.get("master")).context("[master]")?;
    let slave_config = AxiAgentConfig::from_section(config_table.get("slave")).context("[slave]")?;

    // override toml configs with CLI args
    if let Some(args) = cli_args {
        sim_config.cycles = args.cycles.unwrap_or(sim_config.cycles);
        sim_config.txns = args.txns.unwrap_or(sim_config.txns);
        sim_config.seed = args.seed.unwrap_or(sim_config.seed);
        sim_config.log_level = args.log.unwrap_or(sim_config.log_level);
        sim_config.summary_json = args.summary_json.or(sim_config.summary_json);
    }

    Sim::new(sim_config, master_config, slave_config).context("failed to build the loopback")
}
