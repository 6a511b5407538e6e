//! localnorm CLI: local Gaussian normalization of image planes and z-stacks.

use clap::{Args, Parser, Subcommand, ValueEnum};
use localnorm::{
    plane, AxisSigmas, BorderMode, Calibration, GaussianKernel1D, NormalizationSpec,
    NormalizeConfig, PlaneStats, ScaleKind, SmoothingScale,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "localnorm")]
#[command(about = "Local Gaussian mean/variance normalization for 2D images and z-stacks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize one image or a z-stack of images.
    Normalize(CliNormalizeArgs),

    /// Print how a smoothing scale resolves under a calibration.
    ScaleInfo(CliScaleInfoArgs),
}

#[derive(Debug, Clone, Args)]
struct CliNormalizeArgs {
    /// Input image; repeat to build a z-stack, first plane first.
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    /// JSON normalization config. Explicit flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mean smoothing sigma in pixels.
    #[arg(long, required_unless_present = "config")]
    sigma: Option<f64>,

    /// Variance smoothing sigma in pixels (0 disables variance normalization).
    #[arg(long, conflicts_with = "variance_ratio")]
    variance_sigma: Option<f64>,

    /// Variance sigma as a multiple of --sigma (<= 0 disables variance normalization).
    #[arg(long)]
    variance_ratio: Option<f64>,

    /// How smoothing extends along z.
    #[arg(long, value_enum, default_value_t = ScaleArg::TwoD)]
    scale: ScaleArg,

    #[command(flatten)]
    calibration: CliCalibrationArgs,

    /// Border extension for all filters.
    #[arg(long, value_enum)]
    border: Option<BorderArg>,

    /// Lower bound for the local standard deviation.
    #[arg(long)]
    variance_floor: Option<f32>,

    /// Process planes one after another instead of on the thread pool.
    #[arg(long)]
    sequential: bool,

    /// Directory for 8-bit previews of the normalized planes.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Values in [-range, range] span the full preview gray scale.
    #[arg(long, default_value = "3.0")]
    preview_range: f32,

    /// Path to write per-plane statistics (JSON).
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliScaleInfoArgs {
    /// Smoothing sigma in pixels.
    #[arg(long)]
    sigma: f64,

    /// How smoothing extends along z.
    #[arg(long, value_enum, default_value_t = ScaleArg::TwoD)]
    scale: ScaleArg,

    /// Variance sigma as a multiple of --sigma.
    #[arg(long, default_value_t = 0.0)]
    variance_ratio: f64,

    #[command(flatten)]
    calibration: CliCalibrationArgs,
}

#[derive(Debug, Clone, Args, Default)]
struct CliCalibrationArgs {
    /// Pixel width in physical units. Sets the pixel height too unless given.
    #[arg(long)]
    pixel_width: Option<f64>,
    /// Pixel height in physical units.
    #[arg(long)]
    pixel_height: Option<f64>,
    /// Distance between z planes in the same units.
    #[arg(long)]
    z_spacing: Option<f64>,
}

impl CliCalibrationArgs {
    /// Apply explicit flags on top of `base`.
    fn apply(&self, mut base: Calibration) -> Calibration {
        if let Some(w) = self.pixel_width {
            base.pixel_width = w;
            base.pixel_height = self.pixel_height.unwrap_or(w);
        } else if let Some(h) = self.pixel_height {
            base.pixel_height = h;
        }
        if let Some(z) = self.z_spacing {
            base.z_spacing = z;
        }
        base
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScaleArg {
    #[value(name = "2d")]
    TwoD,
    #[value(name = "3d")]
    ThreeD,
    #[value(name = "3d-isotropic")]
    ThreeDIsotropic,
}

impl ScaleArg {
    fn to_core(self) -> ScaleKind {
        match self {
            Self::TwoD => ScaleKind::Scale2D,
            Self::ThreeD => ScaleKind::Scale3D,
            Self::ThreeDIsotropic => ScaleKind::Scale3DIsotropic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BorderArg {
    Constant,
    Replicate,
    Reflect,
    Reflect101,
    Wrap,
}

impl BorderArg {
    fn to_core(self) -> BorderMode {
        match self {
            Self::Constant => BorderMode::Constant,
            Self::Replicate => BorderMode::Replicate,
            Self::Reflect => BorderMode::Reflect,
            Self::Reflect101 => BorderMode::Reflect101,
            Self::Wrap => BorderMode::Wrap,
        }
    }
}

/// Spec from `--sigma` and the variance flags; `None` when no sigma was given.
fn spec_from_args(
    sigma: Option<f64>,
    kind: ScaleKind,
    variance_sigma: Option<f64>,
    variance_ratio: Option<f64>,
) -> Option<NormalizationSpec> {
    let scale = SmoothingScale::new(kind, sigma?);
    let spec = match (variance_sigma, variance_ratio) {
        (Some(v), _) if v > 0.0 => NormalizationSpec::new(scale, Some(scale.with_sigma(v))),
        (Some(_), _) => NormalizationSpec::subtract_only(scale),
        (None, Some(ratio)) => NormalizationSpec::with_variance_ratio(scale, ratio),
        (None, None) => NormalizationSpec::subtract_only(scale),
    };
    Some(spec)
}

fn build_normalize_config(args: &CliNormalizeArgs) -> CliResult<NormalizeConfig> {
    let from_flags = spec_from_args(
        args.sigma,
        args.scale.to_core(),
        args.variance_sigma,
        args.variance_ratio,
    );
    let mut config = match (&args.config, from_flags) {
        (Some(path), flags) => {
            tracing::info!("Loading config: {}", path.display());
            let mut cfg = NormalizeConfig::from_json_file(path).map_err(|e| -> CliError {
                format!("Failed to load config {}: {}", path.display(), e).into()
            })?;
            if let Some(spec) = flags {
                cfg.spec = spec;
            }
            cfg
        }
        (None, Some(spec)) => NormalizeConfig::new(spec),
        (None, None) => return Err("either --sigma or --config is required".into()),
    };

    config.calibration = args.calibration.apply(config.calibration);
    if let Some(border) = args.border {
        config.options.border = border.to_core();
    }
    if args.variance_floor.is_some() {
        config.options.variance_floor = args.variance_floor;
    }
    if args.sequential {
        config.options.parallel = false;
    }
    Ok(config)
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize(args) => run_normalize(&args),
        Commands::ScaleInfo(args) => run_scale_info(&args),
    }
}

// ── scale-info ─────────────────────────────────────────────────────────

fn run_scale_info(args: &CliScaleInfoArgs) -> CliResult<()> {
    let scale = SmoothingScale::new(args.scale.to_core(), args.sigma);
    let cal = args.calibration.apply(Calibration::default());
    let spec = NormalizationSpec::with_variance_ratio(scale, args.variance_ratio);
    let (mean, variance) = spec.resolve(&cal);

    println!("localnorm smoothing scale");
    println!("  scale:          {}", scale);
    println!(
        "  calibration:    {} x {} px, z spacing {}",
        cal.pixel_width, cal.pixel_height, cal.z_spacing
    );
    println!("  normalization:  {:?}", spec.normalization_type());
    print_sigmas("mean", &mean);
    if variance.any_positive() {
        print_sigmas("variance", &variance);
    }
    Ok(())
}

fn print_sigmas(label: &str, s: &AxisSigmas) {
    let radius = |sigma: f64| GaussianKernel1D::new(sigma).radius;
    println!(
        "  {:<9} sigma x/y/z = {:.3}/{:.3}/{:.3}, radius {}/{}/{}",
        format!("{label}:"),
        s.x,
        s.y,
        s.z,
        radius(s.x),
        radius(s.y),
        radius(s.z)
    );
}

// ── normalize ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PlaneReport {
    image: String,
    before: PlaneStats,
    after: PlaneStats,
}

#[derive(Debug, Serialize)]
struct NormalizeReport {
    config: NormalizeConfig,
    planes: Vec<PlaneReport>,
}

fn load_plane(path: &Path) -> CliResult<localnorm::Plane> {
    let img = image::open(path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", path.display(), e).into()
    })?;
    Ok(plane::from_dynamic(&img))
}

fn preview_path(out_dir: &Path, image: &Path, index: usize) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("plane{index}"));
    out_dir.join(format!("{index:03}_{stem}_norm.png"))
}

fn run_normalize(args: &CliNormalizeArgs) -> CliResult<()> {
    let config = build_normalize_config(args)?;

    let mut stack = Vec::with_capacity(args.images.len());
    for path in &args.images {
        tracing::info!("Loading image: {}", path.display());
        stack.push(load_plane(path)?);
    }
    let (w, h) = stack[0].dimensions();
    tracing::info!(
        "Stack: {} plane(s) of {}x{}, {}",
        stack.len(),
        w,
        h,
        config.spec.scale
    );

    let before: Vec<PlaneStats> = stack.iter().map(localnorm::plane_stats).collect();
    config.apply_in_place(&mut stack)?;
    let after: Vec<PlaneStats> = stack.iter().map(localnorm::plane_stats).collect();

    let non_finite: usize = after.iter().map(|s| s.non_finite).sum();
    tracing::info!(
        "Normalized {} plane(s) ({:?}), {} non-finite pixel(s)",
        stack.len(),
        config.spec.normalization_type(),
        non_finite
    );

    if let Some(out_dir) = &args.out_dir {
        std::fs::create_dir_all(out_dir)?;
        for (i, (p, src)) in stack.iter().zip(&args.images).enumerate() {
            let path = preview_path(out_dir, src, i);
            plane::to_preview(p, args.preview_range).save(&path)?;
            tracing::debug!("Preview written to {}", path.display());
        }
        tracing::info!("Previews written to {}", out_dir.display());
    }

    if let Some(report_path) = &args.report {
        let report = NormalizeReport {
            config,
            planes: args
                .images
                .iter()
                .zip(before)
                .zip(after)
                .map(|((image, before), after)| PlaneReport {
                    image: image.display().to_string(),
                    before,
                    after,
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(report_path, &json)?;
        tracing::info!("Report written to {}", report_path.display());
    }

    Ok(())
}
