use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{ info, LevelFilter };

use phong_tracer::color::Color;
use phong_tracer::canvas::Canvas;
use phong_tracer::scene::SceneFile;
use phong_tracer::tracer::SimpleRayTracer;
use phong_tracer::consts::DEFAULT_OUT_FILE;

/// Renders a JSON scene description to a PPM image.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Scene description to render.
    #[clap(parse(from_os_str))]
    scene: PathBuf,

    /// Where to write the image.
    #[clap(short, long, parse(from_os_str), default_value = DEFAULT_OUT_FILE)]
    output: PathBuf,

    /// Number of render threads, overriding the scene file. 0 renders on the
    /// main thread.
    #[clap(short, long)]
    threads: Option<usize>,

    /// Logging level (off, error, warn, info, debug, trace).
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,

    /// Overlay a white grid every INTERVAL pixels.
    #[clap(long, value_name = "INTERVAL")]
    grid: Option<usize>,
}

fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level);

    let SceneFile { scene, view } = SceneFile::load(&args.scene)
        .with_context(|| format!("loading {}", args.scene.display()))?;

    let mut builder = view.builder();
    if let Some(threads) = args.threads {
        builder.threads = threads;
    }
    builder.sink = Some(Canvas::new(view.nx, view.ny));
    builder.tracer = Some(SimpleRayTracer::new(&scene));

    let camera = builder.build().context("setting up the camera")?;
    camera.render_image().context("rendering")?;

    if let Some(interval) = args.grid {
        camera.print_grid(interval, Color::white())
            .context("drawing the grid")?;
    }

    let canvas = camera.into_sink();
    canvas.save(&args.output)
        .with_context(|| format!("saving {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    Ok(())
}
