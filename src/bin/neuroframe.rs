use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

use neuroframe::{
    ActivityVolume, Colormap, Compositor, CompositorConfig, NormalizeRange, SaveOutcome, Threshold,
};

#[derive(Parser, Debug)]
#[command(name = "neuroframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a single frame as a PNG.
    Frame(FrameArgs),
    /// Render an animation (GIF, or MP4 with `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a deterministic synthetic activity volume, no input needed.
    Demo(DemoArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input volume JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input volume JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path (.gif or .mp4).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Output path (.gif or .mp4).
    #[arg(long, default_value = "neuroframe-demo.gif")]
    out: PathBuf,

    /// Demo volume height in pixels.
    #[arg(long, default_value_t = 64)]
    height: usize,

    /// Demo volume width in pixels.
    #[arg(long, default_value_t = 64)]
    width: usize,

    /// Demo volume time extent.
    #[arg(long, default_value_t = 50)]
    frames: usize,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Colormap for the overlay.
    #[arg(long, value_enum, default_value_t = ColormapChoice::Hot)]
    colormap: ColormapChoice,

    /// Overlay opacity in [0,1].
    #[arg(long, default_value_t = 0.7)]
    alpha: f32,

    /// Activity threshold: `auto`, `none`, or a literal in [0,1].
    #[arg(long, default_value = "auto")]
    threshold: String,

    /// Normalization range: `slice`, `volume`, or `LO:HI`.
    #[arg(long, default_value = "slice")]
    range: String,

    /// Frame interval in milliseconds.
    #[arg(long, default_value_t = 100)]
    interval: u32,

    /// Background image path (PNG/JPEG/BMP/TIFF).
    #[arg(long)]
    background: Option<PathBuf>,

    /// Probe the working directory for `background.png`.
    #[arg(long, default_value_t = false)]
    auto_background: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColormapChoice {
    Hot,
    Plasma,
    Inferno,
    Viridis,
}

impl From<ColormapChoice> for Colormap {
    fn from(choice: ColormapChoice) -> Self {
        match choice {
            ColormapChoice::Hot => Colormap::Hot,
            ColormapChoice::Plasma => Colormap::Plasma,
            ColormapChoice::Inferno => Colormap::Inferno,
            ColormapChoice::Viridis => Colormap::Viridis,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Demo(args) => cmd_demo(args),
    }
}

fn parse_threshold(raw: &str) -> anyhow::Result<Threshold> {
    match raw {
        "auto" => Ok(Threshold::Auto),
        "none" => Ok(Threshold::None),
        other => {
            let v: f32 = other
                .parse()
                .with_context(|| format!("--threshold expects `auto`, `none` or a number, got '{other}'"))?;
            Ok(Threshold::Value(v))
        }
    }
}

fn parse_range(raw: &str) -> anyhow::Result<NormalizeRange> {
    match raw {
        "slice" => Ok(NormalizeRange::Slice),
        "volume" => Ok(NormalizeRange::Volume),
        other => {
            let (lo, hi) = other.split_once(':').with_context(|| {
                format!("--range expects `slice`, `volume` or `LO:HI`, got '{other}'")
            })?;
            let lo: f32 = lo.parse().with_context(|| format!("parse range lo '{lo}'"))?;
            let hi: f32 = hi.parse().with_context(|| format!("parse range hi '{hi}'"))?;
            Ok(NormalizeRange::Fixed { lo, hi })
        }
    }
}

fn read_volume_json(path: &Path) -> anyhow::Result<ActivityVolume> {
    let f = File::open(path).with_context(|| format!("open volume '{}'", path.display()))?;
    let volume = ActivityVolume::from_json_reader(BufReader::new(f))?;
    Ok(volume)
}

fn make_compositor(common: &CommonArgs) -> anyhow::Result<Compositor> {
    let config = CompositorConfig::default()
        .with_colormap(common.colormap.into())
        .with_overlay_alpha(common.alpha)
        .with_threshold(parse_threshold(&common.threshold)?)
        .with_range(parse_range(&common.range)?)
        .with_interval_ms(common.interval);

    let mut compositor = Compositor::new(config)?;

    if let Some(path) = &common.background {
        compositor.load_background(neuroframe::load_background_file(path)?);
    } else if common.auto_background {
        match neuroframe::detect_background(Path::new(".")) {
            Some(path) => compositor.load_background(neuroframe::load_background_file(&path)?),
            None => eprintln!("no {} in working directory; rendering without background", neuroframe::DEFAULT_BACKGROUND_FILE),
        }
    }

    Ok(compositor)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut compositor = make_compositor(&args.common)?;
    compositor.load_data(read_volume_json(&args.in_path)?);

    let frame = compositor.get_frame(args.frame)?;
    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
        .context("frame buffer does not match its dimensions")?;
    image
        .save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut compositor = make_compositor(&args.common)?;
    compositor.load_data(read_volume_json(&args.in_path)?);
    render_to(&compositor, &args.out)
}

fn cmd_demo(args: DemoArgs) -> anyhow::Result<()> {
    let mut compositor = make_compositor(&args.common)?;
    compositor.load_data(synthetic_volume(args.height, args.width, args.frames)?);
    render_to(&compositor, &args.out)
}

fn render_to(compositor: &Compositor, out: &Path) -> anyhow::Result<()> {
    match neuroframe::save_animation(compositor, out)? {
        SaveOutcome::Written(path) => println!("wrote {}", path.display()),
        SaveOutcome::SkippedMissingEncoder => {
            eprintln!("warning: ffmpeg not found on PATH, MP4 encode skipped");
        }
    }
    Ok(())
}

/// Deterministic fMRI-like test volume: three Gaussian activation centers,
/// each oscillating sinusoidally at its own frequency.
fn synthetic_volume(height: usize, width: usize, frames: usize) -> anyhow::Result<ActivityVolume> {
    let centers: [(f32, f32, f32, f32); 3] = [
        // (x, y, intensity, cycles per 50 frames)
        (width as f32 / 4.0, height as f32 / 4.0, 0.8, 5.0),
        (3.0 * width as f32 / 4.0, height as f32 / 4.0, 0.6, 10.0),
        (width as f32 / 2.0, 3.0 * height as f32 / 4.0, 0.9, 2.5),
    ];
    let sigma = (width.min(height) as f32 / 10.0).max(1.0);

    let mut data = Vec::with_capacity(height * width * frames);
    for t in 0..frames {
        for y in 0..height {
            for x in 0..width {
                let mut v = 0.0f32;
                for &(cx, cy, intensity, cycles) in &centers {
                    let phase = std::f32::consts::TAU * cycles * t as f32 / 50.0;
                    let temporal = intensity * (0.5 + 0.5 * phase.sin());
                    let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
                    let spatial = (-d2 / (2.0 * sigma * sigma)).exp();
                    v += temporal * spatial;
                }
                data.push(v.min(1.0));
            }
        }
    }

    Ok(ActivityVolume::from_vec([height, width, frames], data)?)
}
