//! Renders an emitter offline and writes the frames as PNG.
//!
//! ```text
//! pieces-render --config snow.json --frames 300 --fps 60 --width 800 --height 600 --out snow.png
//! pieces-render --config snow.json --frames 60 --out frames/ --every-frame
//! ```
//!
//! Set `RUST_LOG=pieces=debug` for per-frame diagnostics.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use pieces::{ConfigPatch, Emitter, FileAssetLoader, ManualClock, PiecesError, Registry, Viewport};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "pieces-render", version, about = "Simulate a particle emitter and save the result as PNG")]
struct Args {
    /// Emitter settings as JSON. Missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Simulated frame rate.
    #[arg(long, default_value_t = 60.0, value_parser = parse_fps)]
    fps: f64,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Output PNG, or a directory with `--every-frame`.
    #[arg(long)]
    out: PathBuf,

    /// Write every frame as `frame-NNNN.png` into `--out`.
    #[arg(long)]
    every_frame: bool,

    /// Overrides the configured random seed.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), PiecesError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pieces=info")))
        .init();

    let args = Args::parse();

    let mut patch = match &args.config {
        Some(path) => ConfigPatch::from_json(&fs::read_to_string(path)?)?,
        None => ConfigPatch::new(),
    };
    if args.seed.is_some() {
        patch.seed = args.seed;
    }

    // Relative image paths are resolved next to the config file.
    let loader = match args.config.as_deref().and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => FileAssetLoader::with_base_dir(dir),
        _ => FileAssetLoader::new(),
    };

    let registry = Registry::with_defaults();
    let mut viewport = Viewport::new(args.width, args.height);
    let mut emitter = Emitter::from_patch(&registry, patch, &mut viewport)?;
    emitter.prepare_asset(&registry, &loader)?;

    let mut clock = ManualClock::from_fps(args.fps)?;

    if args.every_frame {
        fs::create_dir_all(&args.out)?;
        for index in 0..args.frames {
            emitter.run_frames(&mut clock, 1)?;
            write_frame(&emitter, &args.out.join(format!("frame-{index:04}.png")))?;
        }
    } else {
        emitter.run_frames(&mut clock, args.frames)?;
        write_frame(&emitter, &args.out)?;
    }

    info!(
        frames = args.frames,
        particles = emitter.particle_count(),
        out = %args.out.display(),
        "render complete"
    );

    emitter.destroy();
    Ok(())
}

fn write_frame(emitter: &Emitter, path: &Path) -> Result<(), PiecesError> {
    let Some(frame) = emitter.surface().snapshot() else {
        warn!(path = %path.display(), "surface keeps no pixels, nothing written");
        return Ok(());
    };
    frame.save(path).map_err(PiecesError::Encode)
}

fn parse_fps(value: &str) -> Result<f64, String> {
    let fps: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if !fps.is_finite() || fps <= 0.0 {
        return Err(format!("must be a positive finite number, got {value}"));
    }
    Ok(fps)
}
