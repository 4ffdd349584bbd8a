use anyhow::Context;
use haar::app::{load_config, run_detection};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let path: PathBuf = std::env::args()
        .nth(1)
        .context("usage: run_config <config.json>")?
        .into();
    let cfg = load_config(&path)?;
    haar::logger::init_logging(cfg.log_level.as_deref())?;

    let dump = run_detection(cfg)?;
    for f in &dump.faces {
        println!(
            "face at ({:.1}, {:.1}) side {:.1} confidence {:.2}",
            f.x, f.y, f.side, f.confidence
        );
    }
    Ok(())
}
