use clap::{Parser, Subcommand};
use gallery_manifest::config::{self, ToolConfig};
use gallery_manifest::exif::ExifTool;
use gallery_manifest::init::{self, InitRequest};
use gallery_manifest::paths::Project;
use gallery_manifest::{generate, merge, output, validate};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "GALLERY_MANIFEST_LOG";

#[derive(Parser)]
#[command(name = "gallery-manifest")]
#[command(about = "Build photo-gallery pages from curated layout manifests")]
#[command(long_about = "\
Build photo-gallery pages from curated layout manifests

Workflow:

  1. init      Read image dimensions (exiftool) into a new manifest
  2. (review)  Write batch-N.json layout files for each group of images
  3. merge     Combine the batch files into the manifest
  4. validate  Repair common mistakes, report duplicate images
  5. generate  Write the data file and one page per chapter

Project layout (defaults, see 'gallery-manifest gen-config'):

  src/assets/images/photos/<folder>/      # photos
  src/data/gallery-manifests/<g>.json     # manifests
  /tmp/gallery-batches/<g>/batch-N.json   # batch review files
  src/data/<g>.ts                         # generated data file
  src/pages/photographing/<slug>/         # generated pages

Set GALLERY_MANIFEST_LOG (e.g. 'debug') to control diagnostics.")]
#[command(version)]
struct Cli {
    /// Project root that configured paths are relative to
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/gallery-manifest.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a manifest from a folder of photos
    Init {
        /// Folder name under the image root, or a path to it
        folder: String,
        /// Gallery title
        title: String,
        /// URL slug of the gallery
        slug: String,
        /// Manifest name, for versioned galleries (default: the slug)
        gallery: Option<String>,
    },
    /// Merge batch review files into the manifest
    Merge {
        /// Manifest name
        gallery: String,
    },
    /// Normalize a manifest and report problems
    Validate {
        /// Manifest path or name
        manifest: String,
    },
    /// Write the data file and chapter pages
    Generate {
        /// Manifest name
        gallery: String,
    },
    /// Print a stock gallery-manifest.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Init {
            folder,
            title,
            slug,
            gallery,
        } => {
            let (config, project) = setup(&cli.root, cli.config.as_deref())?;
            let reader = ExifTool::new(config.init.exiftool.as_str());
            let request = InitRequest {
                folder: &folder,
                title: &title,
                slug: &slug,
                gallery: gallery.as_deref(),
            };
            let report = init::init(
                &project,
                &config.init,
                config.merge.batch_size,
                &reader,
                &request,
            )?;
            output::print_init_output(&report, project.root());
        }
        Command::Merge { gallery } => {
            let (config, project) = setup(&cli.root, cli.config.as_deref())?;
            let report = merge::merge(&project, &config.merge, &gallery)?;
            output::print_merge_output(&report, project.root());
        }
        Command::Validate { manifest } => {
            let (_, project) = setup(&cli.root, cli.config.as_deref())?;
            let report = validate::validate(&project.manifest_arg(&manifest))?;
            output::print_validate_output(&report, project.root());
        }
        Command::Generate { gallery } => {
            let (config, project) = setup(&cli.root, cli.config.as_deref())?;
            let report = generate::generate(&project, &config.generate, &gallery)?;
            output::print_generate_output(&report, project.root());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config and anchor its paths at the project root.
fn setup(root: &Path, explicit: Option<&Path>) -> Result<(ToolConfig, Project), config::ConfigError> {
    let config = load_config(root, explicit)?;
    let project = Project::new(root.to_path_buf(), config.paths.clone());
    Ok((config, project))
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<ToolConfig, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => config::load_config(root),
    }
}

/// Diagnostics go to stderr so stdout stays a clean report.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
