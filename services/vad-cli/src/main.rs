//! VAD wind profile command line.
//!
//! Retrieves VAD winds from a day of radar volumes into a NetCDF profile,
//! and renders daily quicklooks of such profiles.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use radar_scan::{CfRadialReader, VadSettings, DEFAULT_VELOCITY_FIELD};
use renderer::{render_quicklook, QuicklookOptions};
use vad_common::{HeightGrid, SiteRegistry};
use vad_profile::{AssemblerOptions, ProfileAssembler, ProfileEncoder, Provenance};

#[derive(Parser, Debug)]
#[command(name = "vad")]
#[command(about = "VAD wind profiles from scanning radar volumes", long_about = None)]
struct Cli {
    /// Site registry file (YAML, or JSON by extension). Defaults to the
    /// built-in table.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a daily profile from radar volumes
    Profile {
        /// Radar volume files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Site key in the registry (e.g., xsaprvadI5)
        #[arg(short, long)]
        site: String,

        /// Directory the profile is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Radial velocity field to retrieve from
        #[arg(long, default_value = DEFAULT_VELOCITY_FIELD)]
        velocity_field: String,

        /// Height grid in meters as start:stop:count
        #[arg(long, default_value = "0:10000:101")]
        heights: String,

        /// Minimum valid rays per range ring
        #[arg(long, default_value_t = VadSettings::default().min_valid_rays)]
        min_valid_rays: usize,

        /// Retrieve scans in parallel
        #[arg(long)]
        parallel: bool,

        /// Also render the quicklook into this directory
        #[arg(long)]
        quicklook_dir: Option<PathBuf>,
    },

    /// Render the daily quicklook of a profile
    Quicklook {
        /// Profile NetCDF file
        file: PathBuf,

        /// Site key in the registry
        #[arg(short, long)]
        site: String,

        /// Directory the image is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Image width in pixels
        #[arg(long, default_value_t = QuicklookOptions::default().width)]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value_t = QuicklookOptions::default().height)]
        height: u32,
    },

    /// List registered sites
    Sites,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;
    radar_scan::silence_hdf5_errors();

    let registry = load_registry(cli.registry.as_deref())?;

    match cli.command {
        Commands::Profile {
            files,
            site,
            output_dir,
            velocity_field,
            heights,
            min_valid_rays,
            parallel,
            quicklook_dir,
        } => {
            let grid = HeightGrid::parse_spec(&heights)
                .with_context(|| format!("Invalid height grid '{}'", heights))?;
            let path = run_profile(
                &registry,
                &files,
                &site,
                &output_dir,
                AssemblerOptions {
                    velocity_field,
                    grid,
                    parallel,
                },
                min_valid_rays,
            )?;

            if let Some(dir) = quicklook_dir {
                let image = render_quicklook(&path, &site, &registry, &dir, &QuicklookOptions::default())
                    .with_context(|| format!("Failed to render quicklook of {}", path.display()))?;
                println!("{}", image.display());
            }
            println!("{}", path.display());
        }
        Commands::Quicklook {
            file,
            site,
            output_dir,
            width,
            height,
        } => {
            let options = QuicklookOptions {
                width,
                height,
                ..QuicklookOptions::default()
            };
            let image = render_quicklook(&file, &site, &registry, &output_dir, &options)
                .with_context(|| format!("Failed to render quicklook of {}", file.display()))?;
            println!("{}", image.display());
        }
        Commands::Sites => {
            for site in registry.sites() {
                let datastream = registry
                    .get_metadata(site)
                    .map(|m| m.datastream().to_string())
                    .unwrap_or_default();
                let title = registry
                    .get_plot_values(site)
                    .map(|p| p.title.trim_end().to_string())
                    .unwrap_or_default();
                println!("{:<14} {:<20} {}", site, datastream, title);
            }
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<SiteRegistry> {
    match path {
        Some(path) => SiteRegistry::from_file(path)
            .with_context(|| format!("Failed to load site registry from {}", path.display())),
        None => SiteRegistry::builtin().context("Built-in site registry is invalid"),
    }
}

fn run_profile(
    registry: &SiteRegistry,
    files: &[PathBuf],
    site: &str,
    output_dir: &Path,
    options: AssemblerOptions,
    min_valid_rays: usize,
) -> Result<PathBuf> {
    // Fail on an unknown site before reading any radar data
    if registry.get_metadata(site).is_none() {
        bail!("Missing site configuration: {}", site);
    }

    info!(
        site,
        files = files.len(),
        velocity_field = %options.velocity_field,
        levels = options.grid.len(),
        parallel = options.parallel,
        "Building VAD profile"
    );

    let reader = CfRadialReader::with_settings(VadSettings {
        min_valid_rays,
        ..VadSettings::default()
    });
    let record = ProfileAssembler::new(reader, options)
        .assemble(files)
        .context("Failed to assemble profile")?;

    ProfileEncoder::new(registry)
        .write(&record, site, output_dir, &Provenance::capture())
        .with_context(|| format!("Failed to write profile for {}", site))
}
