use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tridraw::{summarize, Scene, SceneLoader, ShaderLibrary};

mod app;
mod args;

use app::{App, AppError};
use args::Args;

fn main() -> ExitCode {
    initialise_tracing();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<(), AppError> {
    let (mut scene, library) = match &args.scene {
        Some(path) => {
            let loaded = SceneLoader::new().load_path(path)?;
            tracing::info!(?path, "read scene file");
            loaded
        }
        None => (Scene::default(), ShaderLibrary::embedded()),
    };

    if let Some(width) = args.width {
        scene.surface.width = width;
    }
    if let Some(height) = args.height {
        scene.surface.height = height;
    }

    if args.dry_run {
        return dry_run(&scene, &library);
    }

    App::new(scene, library)?.run()
}

fn dry_run(scene: &Scene, library: &ShaderLibrary) -> Result<(), AppError> {
    let summary = summarize(scene, library)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
