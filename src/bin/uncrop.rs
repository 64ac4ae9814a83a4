use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "uncrop", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose every image in a directory (non-recursive) into an output directory.
    Batch(BatchArgs),
    /// Compose a single image.
    File(FileArgs),
    /// Print the placement computed for an image as JSON, without composing it.
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Portrait canvas as WIDTHxHEIGHT (landscape is the transpose).
    #[arg(long, value_parser = parse_size)]
    canvas: Option<(u32, u32)>,

    /// Gaussian blur radius for the background fill.
    #[arg(long)]
    blur_radius: Option<f32>,

    /// JPEG quality (1-100).
    #[arg(long)]
    quality: Option<u8>,

    /// Suffix appended to output file stems.
    #[arg(long)]
    suffix: Option<String>,

    /// Program used to decode HEIF/HEIC inputs.
    #[arg(long)]
    heif_decoder: Option<String>,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Input directory.
    #[arg(long = "in")]
    in_dir: PathBuf,

    /// Output directory (created if missing).
    #[arg(long)]
    out: PathBuf,

    /// Worker threads (default: available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// What to do when two inputs map to the same output name.
    #[arg(long, value_enum)]
    collisions: Option<CollisionChoice>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Parser, Debug)]
struct FileArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CollisionChoice {
    Overwrite,
    Warn,
    Fail,
}

impl From<CollisionChoice> for uncrop::CollisionPolicy {
    fn from(c: CollisionChoice) -> Self {
        match c {
            CollisionChoice::Overwrite => Self::Overwrite,
            CollisionChoice::Warn => Self::Warn,
            CollisionChoice::Fail => Self::Fail,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uncrop=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Batch(args) => cmd_batch(args),
        Command::File(args) => cmd_file(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("width: {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("height: {e}"))?;
    Ok((w, h))
}

fn load_config(args: &ConfigArgs) -> anyhow::Result<uncrop::UncropConfig> {
    let mut cfg = match &args.config {
        Some(path) => uncrop::UncropConfig::from_path(path)?,
        None => uncrop::UncropConfig::default(),
    };
    if let Some((w, h)) = args.canvas {
        cfg.portrait_width = w;
        cfg.portrait_height = h;
    }
    if let Some(r) = args.blur_radius {
        cfg.blur_radius = r;
    }
    if let Some(q) = args.quality {
        cfg.jpeg_quality = q;
    }
    if let Some(s) = &args.suffix {
        cfg.output_suffix = s.clone();
    }
    if let Some(p) = &args.heif_decoder {
        cfg.heif_decoder = p.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.config)?;
    if let Some(n) = args.workers {
        cfg.workers = Some(n);
    }
    if let Some(c) = args.collisions {
        cfg.collisions = c.into();
    }
    cfg.validate()?;

    let support = uncrop::FormatSupport::detect(&cfg);
    if support.heif_decoder().is_none() {
        tracing::info!(program = %cfg.heif_decoder, "HEIF/HEIC support disabled");
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || {
            cancel.store(true, Ordering::Relaxed);
        })
        .context("install Ctrl-C handler")?;
    }

    let job = uncrop::BatchJob::plan(&args.in_dir, &args.out, cfg, &support)?
        .with_cancel_flag(cancel);
    let report = uncrop::run_with_observer(&job, &print_outcome)?;

    println!("{}", report.summary_line());
    for failure in &report.failed {
        println!(
            "  failed [{}] {}: {}",
            failure.stage,
            failure.source.display(),
            failure.detail
        );
    }
    Ok(())
}

fn print_outcome(outcome: &uncrop::ItemOutcome) {
    match outcome {
        uncrop::ItemOutcome::Succeeded(s) => println!("wrote {}", s.output.display()),
        uncrop::ItemOutcome::Failed(f) => {
            println!("failed {}: {}", f.source.display(), f.detail)
        }
        uncrop::ItemOutcome::Skipped(s) => {
            println!("skipped {}: {}", s.path.display(), s.reason)
        }
    }
}

fn cmd_file(args: FileArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.config)?;
    let support = uncrop::FormatSupport::detect(&cfg);

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let success = uncrop::process_file(
        &args.in_path,
        &args.out,
        &cfg.compose_config()?,
        cfg.jpeg_quality,
        &support,
    )
    .with_context(|| format!("compose '{}'", args.in_path.display()))?;

    println!("wrote {}", success.output.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.config)?;
    let support = uncrop::FormatSupport::detect(&cfg);

    let raw = uncrop::decode_path(&args.in_path, &support)
        .with_context(|| format!("decode '{}'", args.in_path.display()))?;
    let source = uncrop::normalize(raw)?;
    let placement = uncrop::plan_placement(source.width(), source.height(), &cfg.canvas_spec()?);

    let out = serde_json::json!({
        "source": {
            "path": args.in_path.display().to_string(),
            "width": source.width(),
            "height": source.height(),
        },
        "placement": placement,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
