use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use log::info;

use terrain_shading::fade::{fade_in_opacity, DEFAULT_FADE};
use terrain_shading::{render_frame, PlanetScene, RenderOptions, ShadingConfig};

/// Largest accepted edge length for `--size`.
const MAX_DIMENSION: u32 = 16_384;

const USAGE: &str = "Usage: terrain-shading <output.png> [--size WxH] [--shadow-size N] \
[--opacity A] [--fade-elapsed SECONDS] [--config shading.xml]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let config = match &options.config {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config = ShadingConfig::from_xml(&xml)
                .with_context(|| format!("failed to parse config {}", path.display()))?;
            println!("Loaded shading config from {}", path.display());
            config
        }
        None => ShadingConfig::default(),
    };

    let mut scene = PlanetScene::default();
    if let Some(opacity) = options.moon_opacity() {
        let moon = scene
            .object_mut("moon")
            .ok_or_else(|| anyhow!("scene has no moon"))?;
        moon.opacity = opacity;
        info!("moon opacity set to {opacity:.3}");
    }

    let frame = render_frame(&scene, &config, &options.render).context("failed to render frame")?;
    println!(
        "Baked {0}x{0} shadow map",
        options.render.shadow_map_size
    );
    println!(
        "Rendered {}x{} frame ({} shaded, {} discarded, {} background)",
        frame.width,
        frame.height,
        frame.stats.shaded,
        frame.stats.discarded,
        frame.stats.background
    );

    let image = image::RgbImage::from_raw(frame.width, frame.height, frame.rgb)
        .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", frame.width, frame.height))?;
    image
        .save(&options.output)
        .with_context(|| format!("failed to write {}", options.output.display()))?;
    println!("Wrote {}", options.output.display());
    Ok(())
}

struct CliOptions {
    output: PathBuf,
    render: RenderOptions,
    opacity: Option<f32>,
    fade_elapsed: Option<Duration>,
    config: Option<PathBuf>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(output) = args.next() else {
            bail!("{USAGE}");
        };
        if output.starts_with("--") {
            bail!("{USAGE}");
        }

        let mut options = Self {
            output: PathBuf::from(output),
            render: RenderOptions::default(),
            opacity: None,
            fade_elapsed: None,
            config: None,
        };
        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects a value"))
            };
            match arg.as_str() {
                "--size" => {
                    let (width, height) = parse_size(&value()?)?;
                    options.render.width = width;
                    options.render.height = height;
                }
                "--shadow-size" => {
                    let text = value()?;
                    options.render.shadow_map_size = text
                        .parse()
                        .with_context(|| format!("invalid shadow map size {text:?}"))?;
                }
                "--opacity" => {
                    let text = value()?;
                    let opacity: f32 = text
                        .parse()
                        .with_context(|| format!("invalid opacity {text:?}"))?;
                    if !(0.0..=1.0).contains(&opacity) {
                        bail!("opacity must be within [0, 1], got {opacity}");
                    }
                    options.opacity = Some(opacity);
                }
                "--fade-elapsed" => {
                    let text = value()?;
                    let seconds: f32 = text
                        .parse()
                        .with_context(|| format!("invalid fade time {text:?}"))?;
                    let elapsed = Duration::try_from_secs_f32(seconds)
                        .with_context(|| format!("invalid fade time {text:?}"))?;
                    options.fade_elapsed = Some(elapsed);
                }
                "--config" => options.config = Some(PathBuf::from(value()?)),
                other => {
                    bail!("Unknown argument: {other}. {USAGE}");
                }
            }
        }
        Ok(options)
    }

    /// An explicit opacity wins over a fade time.
    fn moon_opacity(&self) -> Option<f32> {
        self.opacity.or_else(|| {
            self.fade_elapsed
                .map(|elapsed| fade_in_opacity(elapsed, DEFAULT_FADE))
        })
    }
}

fn parse_size(text: &str) -> Result<(u32, u32)> {
    let (width, height) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("size must look like WxH, got {text:?}"))?;
    let width: u32 = width
        .parse()
        .with_context(|| format!("invalid width in {text:?}"))?;
    let height: u32 = height
        .parse()
        .with_context(|| format!("invalid height in {text:?}"))?;
    if width == 0 || height == 0 {
        bail!("size must be non-zero, got {text:?}");
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        bail!("size must be at most {MAX_DIMENSION}x{MAX_DIMENSION}, got {text:?}");
    }
    Ok((width, height))
}
