use std::error::Error;
use std::path::Path;
use std::sync::mpsc;

use log::info;

use shader_pathtracer::config::Config;
use shader_pathtracer::render_system::bridge::RecordingBridge;
use shader_pathtracer::session::Session;
use shader_pathtracer::world::Scene;

// usage: shader-pathtracer [config.json] [--still]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let still = args.iter().any(|a| a == "--still");
    let config = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::default(),
    };

    let scene = Scene::load(&config)?;
    let mut session = Session::new(config, scene, RecordingBridge::new())?;

    // one frame against the recording bridge fills in every per-frame uniform
    session.step(0.0)?;

    if still {
        let (tx, rx) = mpsc::channel();
        let outcome = session.render_high_quality(None, Some(tx))?;
        for progress in rx.try_iter() {
            info!(
                "pass {}/{} ({:.0}%)",
                progress.completed,
                progress.total,
                progress.fraction() * 100.0
            );
        }
        info!("{:?}", outcome);
    }

    println!("{}", serde_json::to_string_pretty(&session.bridge().to_json())?);
    Ok(())
}
