use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "cocoaug", version)]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Augment images annotated with the given classes and append them to the catalog.
    Augment(AugmentArgs),
    /// Delete derived images that no annotation references.
    PurgeOrphans(PurgeOrphansArgs),
    /// Delete images whose file name contains every search substring.
    DeleteMatching(DeleteMatchingArgs),
    /// Resize every image in a directory to a fixed size.
    Resize(ResizeArgs),
    /// Validate the id and reference invariants of a catalog.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct AugmentArgs {
    /// Input COCO annotations JSON.
    #[arg(long)]
    annotations: PathBuf,

    /// Directory the catalog's image file names are relative to.
    #[arg(long)]
    image_dir: PathBuf,

    /// Directory for augmented images (defaults to `--image-dir`).
    #[arg(long)]
    augmented_image_dir: Option<PathBuf>,

    /// Output annotations JSON (defaults to `--annotations`).
    #[arg(long)]
    updated_annotations: Option<PathBuf>,

    /// Category names to augment.
    #[arg(long, num_args = 1.., required = true)]
    classes: Vec<String>,

    /// Add the vignette, grayscale and sensor-noise stages (also enabled by `"nighttime": true`
    /// in the pipeline file).
    #[arg(long)]
    nighttime: bool,

    /// Only augment images whose file name starts with `<ID_PREFIX>_`.
    #[arg(long)]
    id_prefix: Option<String>,

    /// Seed for reproducible transforms.
    #[arg(long)]
    seed: Option<u64>,

    /// Pipeline settings JSON (defaults to the built-in pipeline).
    #[arg(long)]
    pipeline: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PurgeOrphansArgs {
    /// COCO annotations JSON, rewritten in place.
    #[arg(long)]
    annotations: PathBuf,

    /// Directory holding the image files.
    #[arg(long)]
    images: PathBuf,
}

#[derive(Parser, Debug)]
struct DeleteMatchingArgs {
    /// COCO annotations JSON, rewritten in place.
    #[arg(long)]
    annotations: PathBuf,

    /// Directory holding the image files.
    #[arg(long)]
    images: PathBuf,

    /// Substrings that must all appear in a file name for it to be deleted.
    #[arg(long, num_args = 1.., required = true)]
    search: Vec<String>,
}

#[derive(Parser, Debug)]
struct ResizeArgs {
    /// Directory of images to resize.
    #[arg(long)]
    image_dir: PathBuf,

    /// Directory for resized copies.
    #[arg(long)]
    output_dir: PathBuf,

    /// Target width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Target height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// COCO annotations JSON.
    #[arg(long)]
    annotations: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    match cli.cmd {
        Command::Augment(args) => cmd_augment(args),
        Command::PurgeOrphans(args) => cmd_purge(
            args.annotations,
            args.images,
            cocoaug::PurgePolicy::Orphans,
        ),
        Command::DeleteMatching(args) => cmd_purge(
            args.annotations,
            args.images,
            cocoaug::PurgePolicy::MatchingFiles {
                required: args.search,
            },
        ),
        Command::Resize(args) => cmd_resize(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logger: {e}"))
}

fn cmd_augment(args: AugmentArgs) -> anyhow::Result<()> {
    let pipeline = match &args.pipeline {
        Some(path) => cocoaug::PipelineConfig::from_path(path)?,
        None => cocoaug::PipelineConfig::default(),
    };
    let night = args.nighttime || pipeline.nighttime;
    let pipeline = pipeline.with_nighttime(night);

    let mut criteria = cocoaug::SelectionCriteria::for_categories(args.classes);
    if let Some(prefix) = args.id_prefix {
        criteria = criteria.with_id_prefix(prefix);
    }

    let mut job = cocoaug::AugmentJob::new(args.annotations, args.image_dir, criteria);
    job.updated_annotations = args.updated_annotations;
    job.augmented_image_dir = args.augmented_image_dir;
    job.pipeline = pipeline;
    job.seed = args.seed;

    let outcome = job.run()?;
    eprintln!(
        "augmented {} image(s), skipped {}",
        outcome.report.augmented(),
        outcome.report.skipped.len()
    );
    if let Some(path) = outcome.written {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_purge(
    annotations: PathBuf,
    images: PathBuf,
    policy: cocoaug::PurgePolicy,
) -> anyhow::Result<()> {
    let job = cocoaug::PurgeJob {
        annotations,
        image_dir: images,
        policy,
    };
    let outcome = job.run()?;
    eprintln!(
        "removed {} image(s) and {} annotation(s), deleted {} file(s)",
        outcome.report.removed.len(),
        outcome.report.annotations_removed,
        outcome.report.files_deleted
    );
    if outcome.written {
        eprintln!("wrote {}", job.annotations.display());
    }
    Ok(())
}

fn cmd_resize(args: ResizeArgs) -> anyhow::Result<()> {
    let opts = cocoaug::ResizeOpts {
        image_dir: args.image_dir,
        output_dir: args.output_dir,
        width: args.width,
        height: args.height,
    };
    let report = cocoaug::resize_directory(&opts)?;
    eprintln!(
        "resized {} image(s) to {}x{}, skipped {}",
        report.resized.len(),
        opts.width,
        opts.height,
        report.skipped.len()
    );
    eprintln!("wrote {}", opts.output_dir.display());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let catalog = cocoaug::Catalog::from_path(&args.annotations)?;
    catalog.validate()?;
    eprintln!(
        "ok: {} image(s), {} annotation(s), {} categories",
        catalog.images.len(),
        catalog.annotations.len(),
        catalog.categories.len()
    );
    Ok(())
}
