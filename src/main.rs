use std::fs;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use axi_bfm::ui::{make_sim, read_toml, BfmArgs};

fn level_filter(level: u64) -> LevelFilter {
    match level {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn main() -> anyhow::Result<()> {
    let argv = BfmArgs::parse();
    let toml_string = read_toml(&argv.config_path)?;
    let log_override = argv.log;
    let mut sim = make_sim(&toml_string, Some(argv))?;

    let mut logger = env_logger::Builder::from_default_env();
    if log_override.is_some() || std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(level_filter(sim.config().log_level));
    }
    logger.init();

    let summary = sim.simulate()?;
    println!(
        "[BFM] {} transactions completed in {} cycles ({} writes, {} reads)",
        summary.completed,
        summary.cycles,
        summary.master.writes_completed,
        summary.master.reads_completed
    );

    if let Some(path) = &sim.config().summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    if !summary.finished {
        anyhow::bail!("simulation did not finish within {} cycles", sim.config().cycles);
    }
    Ok(())
}
