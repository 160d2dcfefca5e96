//! Topografía CLI - surveying calculations and contour generation

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use topografia_algorithms::contour::{
    contours_from_points, contours_from_raster, contours_to_features, sample_points_from_layer,
    ContourParams, InterpolationMethod,
};
use topografia_algorithms::survey::{
    line_survey_with_progress, polygon_survey_with_progress, AngleFormat, AreaUnit, SurveyConfig,
    SurveyContext, SurveyOutput, MAX_PRECISION,
};
use topografia_core::io::{
    read_geojson, read_geotiff, write_csv, write_geojson, write_geotiff, write_report,
    ExportTargets,
};
use topografia_core::{FeatureCollection, Raster, CRS};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "topografia")]
#[command(author, version, about = "Surveying calculations for vector layers", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with [polygons] and [lines] calculation settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Angles, azimuths, bearings, sides, area and perimeter of polygons
    Polygons {
        /// Input polygon layer (GeoJSON)
        input: PathBuf,
        #[command(flatten)]
        calc: CalcArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Azimuths, bearings and lengths of line segments
    Lines {
        /// Input line layer (GeoJSON)
        input: PathBuf,
        #[command(flatten)]
        calc: CalcArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Contour lines from a DEM (GeoTIFF) or elevation points (GeoJSON)
    Contours {
        /// Input DEM (.tif) or point layer (.geojson)
        input: PathBuf,
        /// Output contour layer (GeoJSON)
        #[arg(short, long)]
        output: PathBuf,
        /// Elevation attribute of the point layer
        #[arg(short, long)]
        field: Option<String>,
        /// Interpolation for point layers
        #[arg(short, long, value_enum, default_value = "tin")]
        method: MethodArg,
        /// Cell size of the interpolated surface
        #[arg(long, default_value = "10.0")]
        pixel_size: f64,
        /// Contour interval
        #[arg(short, long, default_value = "10.0")]
        interval: f64,
        /// Base contour
        #[arg(short, long, default_value = "0.0")]
        base: f64,
        /// Multiplier applied to elevations
        #[arg(short, long, default_value = "1.0")]
        z_factor: f64,
        /// Every n-th contour is flagged as major
        #[arg(long, default_value = "5")]
        major_every: u32,
        /// Also write the interpolated surface (GeoTIFF)
        #[arg(long)]
        save_surface: Option<PathBuf>,
        /// Attribute table of the contours (CSV)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// CRS of the input, e.g. EPSG:32719
        #[arg(long)]
        crs: Option<String>,
    },
    /// Show information about the tools
    About,
}

// ─── Shared arguments ───────────────────────────────────────────────────

/// Calculation selection. When any flag is given only those are computed;
/// otherwise the tool defaults (or the config file) apply.
#[derive(Args)]
struct CalcArgs {
    /// Interior angles
    #[arg(long)]
    interior: bool,
    /// Exterior angles
    #[arg(long)]
    exterior: bool,
    /// Azimuths
    #[arg(long)]
    azimuth: bool,
    /// Bearings (rumbos)
    #[arg(long)]
    bearing: bool,
    /// Side or segment lengths
    #[arg(long)]
    distance: bool,
    /// Accumulated lengths
    #[arg(long)]
    accumulated: bool,
    /// Polygon area
    #[arg(long)]
    area: bool,
    /// Polygon perimeter
    #[arg(long)]
    perimeter: bool,
    /// Angle format
    #[arg(short, long, value_enum)]
    angle_format: Option<AngleFormatArg>,
    /// Area unit
    #[arg(short = 'u', long, value_enum)]
    area_unit: Option<AreaUnitArg>,
    /// Decimal places (0-10)
    #[arg(short, long)]
    precision: Option<usize>,
    /// CRS of the input, e.g. EPSG:32719
    #[arg(long)]
    crs: Option<String>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output point layer (GeoJSON)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Attribute table (CSV)
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Text report
    #[arg(short, long)]
    report: Option<PathBuf>,
    /// Print the report to the console
    #[arg(long)]
    print_report: bool,
}

impl OutputArgs {
    fn targets(&self) -> ExportTargets {
        ExportTargets {
            features: self.output.clone(),
            csv: self.csv.clone(),
            report: self.report.clone(),
            print_report: self.print_report,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AngleFormatArg {
    /// Decimal degrees
    Dd,
    /// Degrees, minutes, seconds
    Dms,
    /// Radians
    Rad,
}

impl From<AngleFormatArg> for AngleFormat {
    fn from(arg: AngleFormatArg) -> Self {
        match arg {
            AngleFormatArg::Dd => AngleFormat::DecimalDegrees,
            AngleFormatArg::Dms => AngleFormat::Dms,
            AngleFormatArg::Rad => AngleFormat::Radians,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AreaUnitArg {
    /// Square metres
    M2,
    /// Hectares
    Ha,
    /// Square kilometres
    Km2,
}

impl From<AreaUnitArg> for AreaUnit {
    fn from(arg: AreaUnitArg) -> Self {
        match arg {
            AreaUnitArg::M2 => AreaUnit::SquareMeters,
            AreaUnitArg::Ha => AreaUnit::Hectares,
            AreaUnitArg::Km2 => AreaUnit::SquareKilometers,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Tin,
    Idw,
}

impl From<MethodArg> for InterpolationMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Tin => InterpolationMethod::Tin,
            MethodArg::Idw => InterpolationMethod::Idw,
        }
    }
}

/// Settings file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    polygons: Option<SurveyConfig>,
    lines: Option<SurveyConfig>,
}

#[derive(Clone, Copy)]
enum Tool {
    Polygons,
    Lines,
}

impl Tool {
    fn name(self) -> &'static str {
        match self {
            Tool::Polygons => "polygons",
            Tool::Lines => "lines",
        }
    }
}

const ABOUT: &str = "\
Plugin Topografía
Versión: 1.1a

Herramientas topográficas: cálculo de ángulos, azimuts, rumbos,
distancias, áreas y perímetros, generación de curvas de nivel y reportes.

Desarrollado por: Omar Ruelas Santa Cruz
Licencia: GPL v3
Página de inicio: https://github.com/Hikuritamete/topografia-qgis";

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message("Procesando...");
    pb
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn load_config_file(path: Option<&Path>) -> Result<ConfigFile> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn parse_crs(crs: Option<&str>) -> Result<Option<CRS>> {
    crs.map(|s| s.parse::<CRS>().with_context(|| format!("Invalid CRS: {}", s)))
        .transpose()
}

/// Tool defaults, then the config file section, then command-line flags
fn build_config(tool: Tool, file: &ConfigFile, calc: &CalcArgs) -> Result<SurveyConfig> {
    let mut config = match tool {
        Tool::Polygons => file.polygons.clone().unwrap_or_else(SurveyConfig::polygon_defaults),
        Tool::Lines => file.lines.clone().unwrap_or_else(SurveyConfig::line_defaults),
    };

    let selected = [
        calc.interior,
        calc.exterior,
        calc.azimuth,
        calc.bearing,
        calc.distance,
        calc.accumulated,
        calc.area,
        calc.perimeter,
    ];
    if selected.iter().any(|&s| s) {
        config.compute_interior = calc.interior;
        config.compute_exterior = calc.exterior;
        config.compute_azimuth = calc.azimuth;
        config.compute_bearing = calc.bearing;
        config.compute_distance = calc.distance;
        config.compute_accumulated_distance = calc.accumulated;
        config.compute_area = calc.area;
        config.compute_perimeter = calc.perimeter;
    }
    if let Some(fmt) = calc.angle_format {
        config.angle_format = fmt.into();
    }
    if let Some(unit) = calc.area_unit {
        config.area_unit = unit.into();
    }
    if let Some(p) = calc.precision {
        if p > MAX_PRECISION {
            anyhow::bail!("Precision must be between 0 and {}, got {}", MAX_PRECISION, p);
        }
        config.decimal_precision = p;
    }

    match tool {
        Tool::Polygons => config.validate_polygon(),
        Tool::Lines => config.validate_line(),
    }
    .context("Invalid calculation settings")?;

    Ok(config)
}

fn read_layer(path: &Path) -> Result<FeatureCollection> {
    let pb = spinner("Reading layer...");
    let layer = read_geojson(path)
        .with_context(|| format!("Failed to read layer {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} features", layer.len());
    Ok(layer)
}

fn read_dem(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path).context("Failed to read raster")?;
    pb.finish_and_clear();
    info!("Input: {} x {}, cell size {}", raster.cols(), raster.rows(), raster.cell_size());
    let (min_x, min_y, max_x, max_y) = raster.bounds();
    debug!("Extent: ({}, {}) - ({}, {})", min_x, min_y, max_x, max_y);
    match raster.crs() {
        Some(crs) => info!("CRS: {}", crs),
        None => warn!("Raster has no CRS; pass --crs to tag the output"),
    }
    Ok(raster)
}

fn layer_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn timestamp() -> Option<String> {
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&format).ok()
}

fn write_outputs(name: &str, output: &SurveyOutput, targets: &ExportTargets, elapsed: std::time::Duration) -> Result<()> {
    if let Some(path) = &targets.features {
        write_geojson(&output.features, path).context("Failed to write output layer")?;
        done(name, path, elapsed);
    }
    if let Some(path) = &targets.csv {
        write_csv(&output.features, path).context("Failed to write CSV table")?;
        done("Table", path, elapsed);
    }
    if let Some(path) = &targets.report {
        write_report(output.report.lines(), path).context("Failed to write report")?;
        done("Report", path, elapsed);
    }
    if targets.print_report {
        println!("{}", output.report);
    }
    Ok(())
}

fn run_survey(tool: Tool, input: &Path, calc: &CalcArgs, out: &OutputArgs, file: &ConfigFile) -> Result<()> {
    let config = build_config(tool, file, calc)?;
    let targets = out.targets();
    targets.validate(tool.name())?;

    let mut layer = read_layer(input)?;
    if let Some(crs) = parse_crs(calc.crs.as_deref())? {
        layer.crs = Some(crs);
    }
    let crs = layer.crs.clone().unwrap_or_else(|| {
        info!("No CRS in the input, reading coordinates as WGS84 longitude/latitude");
        CRS::wgs84()
    });
    let mut ctx = SurveyContext::new(layer_name(input), Some(crs));
    ctx.timestamp = timestamp();

    let pb = progress_bar(layer.len());
    let start = Instant::now();
    let on_progress = |n: usize, _total: usize| pb.set_position(n as u64);
    let output = match tool {
        Tool::Polygons => polygon_survey_with_progress(&layer, &config, &ctx, on_progress),
        Tool::Lines => line_survey_with_progress(&layer, &config, &ctx, on_progress),
    }
    .with_context(|| format!("Failed to run {} (use --crs if the layer CRS is wrong)", tool.name()))?;
    let elapsed = start.elapsed();
    pb.finish_and_clear();

    info!(
        "{} features processed, {} skipped, {} points",
        output.processed,
        output.skipped,
        output.features.len()
    );
    if output.features.is_empty() {
        warn!("No features could be surveyed");
    }

    let name = match tool {
        Tool::Polygons => "Vertices",
        Tool::Lines => "Segments",
    };
    write_outputs(name, &output, &targets, elapsed)
}

fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "tif" | "tiff"))
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let file = load_config_file(cli.config.as_deref())?;

    match cli.command {
        Commands::Polygons { input, calc, out } => {
            run_survey(Tool::Polygons, &input, &calc, &out, &file)?;
        }

        Commands::Lines { input, calc, out } => {
            run_survey(Tool::Lines, &input, &calc, &out, &file)?;
        }

        Commands::Contours {
            input,
            output,
            field,
            method,
            pixel_size,
            interval,
            base,
            z_factor,
            major_every,
            save_surface,
            csv,
            crs,
        } => {
            let params = ContourParams {
                interval,
                base,
                z_factor,
                major_every,
            };
            params.validate().context("Invalid contour settings")?;
            let crs_override = parse_crs(crs.as_deref())?;

            let start = Instant::now();
            let (lines, crs) = if is_raster(&input) {
                let dem = read_dem(&input)?;
                let pb = spinner("Tracing contours...");
                let lines = contours_from_raster(&dem, &params).context("Failed to trace contours")?;
                pb.finish_and_clear();
                if save_surface.is_some() {
                    warn!("--save-surface only applies to point layers");
                }
                (lines, crs_override.or_else(|| dem.crs().cloned()))
            } else {
                let layer = read_layer(&input)?;
                let field = match field {
                    Some(f) => f,
                    None => layer
                        .numeric_property_names()
                        .into_iter()
                        .next()
                        .context("Point layer has no numeric attribute; pass --field")?,
                };
                info!("Elevation field: {}", field);
                let points = sample_points_from_layer(&layer, &field)
                    .context("Failed to read elevation points")?;

                let pb = spinner("Interpolating surface...");
                let result = contours_from_points(&points, method.into(), pixel_size, &params)
                    .context("Failed to generate contours")?;
                pb.finish_and_clear();

                let crs = crs_override.or(layer.crs);
                if let Some(path) = &save_surface {
                    let mut surface = result.surface;
                    surface.set_crs(crs.clone());
                    write_geotiff(&surface, path).context("Failed to write surface")?;
                    done("Surface", path, start.elapsed());
                }
                (result.lines, crs)
            };
            let elapsed = start.elapsed();

            info!("{} contour lines", lines.len());
            let layer = contours_to_features(&lines, crs);
            write_geojson(&layer, &output).context("Failed to write contours")?;
            done("Contours", &output, elapsed);
            if let Some(path) = &csv {
                write_csv(&layer, path).context("Failed to write CSV table")?;
                done("Table", path, elapsed);
            }
        }

        Commands::About => {
            println!("{}", ABOUT);
        }
    }

    Ok(())
}
