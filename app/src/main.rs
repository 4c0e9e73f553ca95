use std::process::ExitCode;

use clap::Parser;
use prism_app::{App, Args, Config};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Prism");
    log::info!("Core version: {}", prism_core::VERSION);
    log::info!("Graphics version: {}", prism_graphics::VERSION);

    prism_app::init();

    let args = Args::parse();
    let result = Config::resolve(&args).and_then(|config| App::new(config).run());
    match result {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
