use anyhow::Result;
use clap::Parser;

mod keymap;
mod render;
mod run;

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = run::Args::parse();
    run::run(args)
}
