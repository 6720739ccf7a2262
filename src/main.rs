use anyhow::Result;

mod assets;
mod camera;
mod config;
mod decor;
mod editor;
mod engine;
mod math;
mod rendering;
mod scene_graph;
mod ui;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let config = config::SandboxConfig::load()?;
    pollster::block_on(window::run(config))?;

    Ok(())
}
