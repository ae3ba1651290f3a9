mod engine;
mod utils;

use clap::Parser;

use engine::assets::HttpAssetLoader;
use engine::cli::{Cli, CliCommand};
use engine::config::AppConfig;
use engine::graphics::DrawListRenderer;
use engine::{AnimationLoop, EngineResult, demos, headless, windowing::Windowing};

fn main() {
    utils::logger::init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> EngineResult<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    let command = cli.effective_command();
    command.apply_overrides(&mut config);
    config.validate()?;

    let loader = HttpAssetLoader::new()?;
    let demo = demos::build(config.demo, &config, Box::new(loader));
    let mut animation = AnimationLoop::new(demo, Box::new(DrawListRenderer::new()));

    match command {
        CliCommand::Run { .. } => Windowing::run_app(animation, config.window, config.simulation),
        CliCommand::Simulate { dump_scene, .. } => {
            headless::run(&mut animation, &config.simulation, dump_scene.as_deref())?;
            Ok(())
        }
    }
}
