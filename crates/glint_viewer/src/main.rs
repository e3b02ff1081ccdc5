use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use glint_renderer::{CameraCommand, RenderConfig, Renderer, Viewport};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod demo;

/// Progressively render the demo scene and save it as a PNG
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Width of the rendered image
    #[arg(long, default_value_t = 600)]
    width: u32,

    /// Height of the rendered image
    #[arg(long, default_value_t = 400)]
    height: u32,

    /// Number of refinement iterations to run
    #[arg(long, default_value_t = 64)]
    frames: u32,

    /// JSON render configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (overrides the config file)
    #[arg(long)]
    threads: Option<usize>,

    /// Samples per pixel per iteration (overrides the config file)
    #[arg(long)]
    samples: Option<u32>,

    /// Output image
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Orbit the camera around the scene (radians)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rotate: f32,

    /// Tilt the camera towards (negative) or away from the top pole (radians)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    elevate: f32,

    /// Move the camera closer (negative) or further away
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    zoom: f32,

    /// Seed for the demo scene layout
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => RenderConfig::default(),
    };

    if let Some(threads) = args.threads {
        config.threads = Some(threads);
    }
    if let Some(samples) = args.samples {
        config.samples_per_pixel = samples;
    }
    Ok(config)
}

/// Reorder packed pixels into RGBA8 bytes on any host.
fn to_rgba8(pixels: &[u32]) -> Vec<u8> {
    // R lives in the low byte, so the little-endian layout is RGBA
    let little_endian: Vec<u32> = pixels.iter().map(|pixel| pixel.to_le()).collect();
    bytemuck::cast_slice(&little_endian).to_vec()
}

fn save_png(path: &Path, viewport: &Viewport, pixels: &[u32]) -> Result<()> {
    let image = image::RgbaImage::from_raw(viewport.width(), viewport.height(), to_rgba8(pixels))
        .context("Pixel buffer does not match the image size")?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting Glint viewer");

    let config = load_config(&args)?;
    let viewport = Viewport::new(args.width, args.height);
    let mut renderer = Renderer::new(viewport, config).context("Failed to start renderer")?;

    let scene = demo::demo_scene(&mut StdRng::seed_from_u64(args.seed))
        .context("Failed to build demo scene")?;
    let scene = Arc::new(scene);

    // Initial view of the demo scene
    {
        let trackball = renderer.trackball_mut();
        trackball.update_elevation_angle(-0.3);
        trackball.set_radius(3.3);
        trackball.update_polar_angle(0.5);
    }
    renderer.clear_framebuffer();

    for command in [
        CameraCommand::Rotate(args.rotate),
        CameraCommand::Elevate(args.elevate),
        CameraCommand::Zoom(args.zoom),
    ] {
        renderer.apply(command);
    }

    let mut pixels = vec![0u32; viewport.pixel_count()];
    let start = Instant::now();
    for frame in 1..=args.frames {
        renderer.render(&scene, &mut pixels)?;
        if frame % 16 == 0 || frame == args.frames {
            log::info!(
                "Frame {}/{} ({} iterations, {:.2?} elapsed)",
                frame,
                args.frames,
                renderer.iteration(),
                start.elapsed()
            );
        }
    }

    save_png(&args.output, &viewport, &pixels)?;
    log::info!("Wrote {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_renderer::{color_to_rgba, Color};

    #[test]
    fn test_to_rgba8_byte_order() {
        let pixels = [
            color_to_rgba(Color::new(1.0, 0.0, 0.0)),
            color_to_rgba(Color::new(0.0, 1.0, 0.0)),
            color_to_rgba(Color::new(0.0, 0.0, 1.0)),
        ];

        assert_eq!(
            to_rgba8(&pixels),
            vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255]
        );
    }

    #[test]
    fn test_config_flags_override_file_defaults() {
        let args = Args::parse_from(["glint_viewer", "--threads", "2", "--samples", "9"]);
        let config = load_config(&args).unwrap();

        assert_eq!(config.threads, Some(2));
        assert_eq!(config.samples_per_pixel, 9);
        assert_eq!(config.max_iterations, RenderConfig::default().max_iterations);
    }
}
