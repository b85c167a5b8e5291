//! Packstead CLI
//!
//! Entry point for the `packstead` command-line tool.

use std::path::{Path, PathBuf};
use std::process;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::Level;

use packstead::commands::FsLineSource;
use packstead::config::{project_config_path, user_config_path};
use packstead::release::{DistroResolver, OfflineResolver};
use packstead::{
    AppConfig, Catalog, Collaborators, GenerateError, GeneratedBuild, Generator, ReleaseResolver,
    Selection,
};

#[derive(Parser)]
#[command(name = "packstead")]
#[command(about = "Generate Packer templates from layered build definitions", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Project config file (default: ./packstead.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Placeholder delimiter, overriding param_delim
    #[arg(long, global = true)]
    delim: Option<char>,

    /// Print templates to stdout instead of writing them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Fail ISO builds that need a release lookup instead of fetching
    #[arg(long, global = true)]
    offline: bool,

    /// More output per occurrence
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate templates
    Build {
        /// Generate the default build of this distro
        #[arg(long, conflicts_with_all = ["names", "list"])]
        distro: Option<String>,

        /// Architecture for --distro
        #[arg(long, requires = "distro")]
        arch: Option<String>,

        /// Image for --distro
        #[arg(long, requires = "distro")]
        image: Option<String>,

        /// Release for --distro
        #[arg(long, requires = "distro")]
        release: Option<String>,

        /// Generate every build in this build list
        #[arg(long, conflicts_with = "names")]
        list: Option<String>,

        /// Named builds to generate
        names: Vec<String>,
    },

    /// Print the effective application configuration
    Config,

    /// List supported distros and their selections
    Distros,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match load_config(&cli.global) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(2);
        }
    };
    init_logging(&cli.global, config.log_level());

    let code = match cli.command {
        Commands::Config => run_config(&config),
        Commands::Distros => run_distros(&mut config),
        Commands::Build {
            distro,
            arch,
            image,
            release,
            list,
            names,
        } => {
            let target = match (distro, list) {
                (Some(distro), _) => Target::Distro(distro, Selection { arch, image, release }),
                (None, Some(list)) => Target::List(list),
                (None, None) if !names.is_empty() => Target::Named(names),
                (None, None) => {
                    eprintln!("Nothing to build: pass --distro, --list or build names");
                    process::exit(2);
                }
            };
            run_build(&cli.global, &mut config, target)
        }
    };
    process::exit(code);
}

fn load_config(global: &GlobalArgs) -> Result<AppConfig, packstead::ConfigError> {
    let project = global.config.clone().unwrap_or_else(project_config_path);
    let user = user_config_path();
    let overrides = global.delim.map(|d| json!({ "param_delim": d.to_string() }));
    AppConfig::build(user.as_deref(), Some(project.as_path()), overrides)
}

fn init_logging(global: &GlobalArgs, configured: &str) {
    let base = configured.parse::<Level>().unwrap_or(Level::INFO);
    let level = match (global.quiet, global.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => base,
        (false, 1) => base.max(Level::DEBUG),
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run_config(config: &AppConfig) -> i32 {
    match config.to_json() {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            1
        }
    }
}

fn run_distros(config: &mut AppConfig) -> i32 {
    let catalog = match Catalog::load(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading templates: {}", e);
            return 1;
        }
    };
    for (name, distro) in &catalog.distros {
        println!("{}", name);
        for field in ["arch", "image", "release"] {
            let supported = distro.supported(field);
            let default = distro.default_image.get(field).unwrap_or("-");
            println!("  {:<8} {} (default: {})", field, supported.join(", "), default);
        }
    }
    0
}

enum Target {
    Distro(String, Selection),
    Named(Vec<String>),
    List(String),
}

fn run_build(global: &GlobalArgs, config: &mut AppConfig, target: Target) -> i32 {
    let catalog = match Catalog::load(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading templates: {}", e);
            return 1;
        }
    };

    let resolver: Box<dyn ReleaseResolver> = if global.offline {
        Box::new(OfflineResolver)
    } else {
        Box::new(DistroResolver::with_timeout(config.fetch_timeout()))
    };
    let collab = Collaborators {
        release: resolver.as_ref(),
        lines: &FsLineSource,
    };
    let today = Utc::now().date_naive();
    let mut generator = Generator::new(&catalog, collab, today, config.param_delim());

    let results = match target {
        Target::Distro(distro, selection) => {
            let result = generator.distro(&distro, &selection);
            vec![(distro, result)]
        }
        Target::Named(names) => generator.batch(&names),
        Target::List(list) => match generator.list(&list) {
            Ok(results) => results,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
    };

    report(&results, global.dry_run, &config.output_root())
}

/// Emit or write each build and summarize; returns the exit code.
fn report(results: &[(String, Result<GeneratedBuild, GenerateError>)], dry_run: bool, root: &Path) -> i32 {
    let mut failed = 0;
    for (name, result) in results {
        let outcome = result.as_ref().map_err(|e| e.to_string()).and_then(|built| {
            if dry_run {
                built
                    .template
                    .to_json()
                    .map(|json| println!("{}", json))
                    .map_err(|e| e.to_string())
            } else {
                built
                    .write(root)
                    .map(|path| println!("{}: {}", name, path.display()))
                    .map_err(|e| e.to_string())
            }
        });
        match outcome {
            Ok(()) => {
                if let Ok(built) = result {
                    if !built.diagnostics.is_empty() {
                        eprintln!("{}: {} warning(s)", name, built.diagnostics.len());
                    }
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                failed += 1;
            }
        }
    }

    if results.len() > 1 {
        eprintln!(
            "{} build(s): {} succeeded, {} failed",
            results.len(),
            results.len() - failed,
            failed
        );
    }
    if failed > 0 {
        1
    } else {
        0
    }
}
