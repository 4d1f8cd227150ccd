use std::process::ExitCode;

use sparkfield::{Settings, TextureConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wgpu_core=warn,wgpu_hal=warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);

    let settings = match args.next() {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => {
                info!(%path, "loaded preset");
                settings
            }
            Err(e) => {
                error!(%path, "could not load preset: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    let sprite = match args.next() {
        Some(path) => match TextureConfig::from_file(&path) {
            Ok(sprite) => sprite,
            Err(e) => {
                error!(%path, "could not load sprite: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => TextureConfig::default(),
    };

    match sparkfield::run(settings, sprite) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
