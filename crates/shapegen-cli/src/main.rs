use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::debug;
use serde::Serialize;

use shapegen_core::config::{self, CONFIG_FILE_NAME, ShapegenConfig};
use shapegen_core::driver::ServiceDriver;
use shapegen_core::ir::{TypeCategory, TypeDefinition};
use shapegen_core::parse::{self, ValidationLevel};
use shapegen_core::pipeline::parse_problem_base;
use shapegen_core::problem::ProblemRfc;
use shapegen_core::target::{FeatureSet, GenerationMode, TargetProfile};
use shapegen_core::{GeneratedTypes, GenerationError, GenerationOptions, generate};
use shapegen_jvm::{JaxRsDriver, JvmProblemLibrary, JvmTarget, ReactiveDriver};
use shapegen_swift::{SwiftClientDriver, SwiftTarget};
use shapegen_typescript::{TypeScriptClientDriver, TypeScriptTarget};

#[derive(Parser)]
#[command(
    name = "shapegen",
    about = "Type and service model generator for API schema documents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Kotlin JAX-RS client interfaces or server resource stubs
    #[command(name = "jvm-jaxrs")]
    JvmJaxrs {
        #[command(flatten)]
        common: CommonArgs,

        /// Problem library generated problem types extend
        #[arg(long)]
        problem_library: Option<String>,
    },

    /// Kotlin reactive client
    #[command(name = "jvm-reactive")]
    JvmReactive {
        #[command(flatten)]
        common: CommonArgs,

        /// Problem library generated problem types extend
        #[arg(long)]
        problem_library: Option<String>,
    },

    /// Swift client with async methods
    Swift {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// TypeScript client with observable results
    Typescript {
        #[command(flatten)]
        common: CommonArgs,

        /// Return promises instead of observables from non-streaming methods
        #[arg(long)]
        enable_abortable_promises: bool,
    },

    /// Run the validation pass only
    Validate {
        /// Schema source files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Initialize a new shapegen configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Flags shared by every generation sub-command. Unset flags fall back to
/// the project config file.
#[derive(Args)]
struct CommonArgs {
    /// Root package or module name
    #[arg(long = "pkg")]
    package: Option<String>,

    /// Package of model types (defaults to -pkg)
    #[arg(long = "model-pkg")]
    model_package: Option<String>,

    /// Package of service types (defaults to -pkg)
    #[arg(long = "service-pkg")]
    service_package: Option<String>,

    /// Default problem base URI
    #[arg(long)]
    problem_base: Option<String>,

    /// Problem details revision generated problem types comply with
    #[arg(long, value_enum)]
    problem_rfc: Option<Rfc>,

    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Suffix of service type names
    #[arg(long)]
    service_suffix: Option<String>,

    /// Enable a type generation option
    #[arg(long)]
    enable: Vec<String>,

    /// Disable a type generation option
    #[arg(long)]
    disable: Vec<String>,

    /// Supported media types, most preferred first
    #[arg(long = "media-type")]
    media_types: Vec<String>,

    /// Categories of types to write (all when omitted)
    #[arg(long = "category", value_enum)]
    categories: Vec<Category>,

    /// Output directory; must already exist
    #[arg(long)]
    out: PathBuf,

    /// Schema source files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Client,
    Server,
}

impl From<Mode> for GenerationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Client => GenerationMode::Client,
            Mode::Server => GenerationMode::Server,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Rfc {
    Rfc7807,
    Rfc9457,
}

impl From<Rfc> for ProblemRfc {
    fn from(rfc: Rfc) -> Self {
        match rfc {
            Rfc::Rfc7807 => ProblemRfc::Rfc7807,
            Rfc::Rfc9457 => ProblemRfc::Rfc9457,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Category {
    Model,
    Service,
}

impl From<Category> for TypeCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Model => TypeCategory::Model,
            Category::Service => TypeCategory::Service,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse_from(long_flags(std::env::args()));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<GenerationError>() {
            Some(GenerationError::Validation(entries)) => {
                print_entries(entries.iter());
                ExitCode::from(1)
            }
            _ => {
                eprintln!("error: {err:#}");
                ExitCode::from(2)
            }
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::JvmJaxrs {
            common,
            problem_library,
        } => {
            let cfg = try_load_config()?.unwrap_or_default();
            let profile = JvmTarget::new(jvm_problem_library(problem_library, &cfg)?);
            cmd_generate(&common, &cfg, profile, &JaxRsDriver, true)
        }

        Commands::JvmReactive {
            common,
            problem_library,
        } => {
            let cfg = try_load_config()?.unwrap_or_default();
            let profile = JvmTarget::new(jvm_problem_library(problem_library, &cfg)?);
            cmd_generate(&common, &cfg, profile, &ReactiveDriver, false)
        }

        Commands::Swift { common } => {
            let cfg = try_load_config()?.unwrap_or_default();
            cmd_generate(&common, &cfg, SwiftTarget, &SwiftClientDriver, false)
        }

        Commands::Typescript {
            common,
            enable_abortable_promises,
        } => {
            let cfg = try_load_config()?.unwrap_or_default();
            let driver = TypeScriptClientDriver {
                abortable_promises: enable_abortable_promises,
            };
            cmd_generate(&common, &cfg, TypeScriptTarget, &driver, false)
        }

        Commands::Validate { files } => cmd_validate(&files),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "shapegen", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Accepts the single-dash spelling of long flags (`-pkg`) alongside `--pkg`.
fn long_flags(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            let single_dash_word = arg.len() > 2
                && arg.starts_with('-')
                && !arg.starts_with("--")
                && arg[1..].starts_with(|c: char| c.is_ascii_alphabetic());
            if index > 0 && single_dash_word {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<ShapegenConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn jvm_problem_library(flag: Option<String>, cfg: &ShapegenConfig) -> Result<JvmProblemLibrary> {
    match flag.or_else(|| cfg.problem.library.clone()) {
        None => Ok(JvmProblemLibrary::default()),
        Some(id) => JvmProblemLibrary::from_id(&id).with_context(|| {
            let known: Vec<&str> = JvmProblemLibrary::ALL.iter().map(|l| l.id()).collect();
            format!("unknown problem library '{id}', expected one of: {}", known.join(", "))
        }),
    }
}

/// Config file values with flags layered on top.
fn generation_options(common: &CommonArgs, cfg: &ShapegenConfig) -> Result<GenerationOptions> {
    let mut options = cfg.options()?;
    if let Some(package) = &common.package {
        options.package = package.clone();
    }
    if common.model_package.is_some() {
        options.model_package = common.model_package.clone();
    }
    if common.service_package.is_some() {
        options.service_package = common.service_package.clone();
    }
    if let Some(base) = &common.problem_base {
        options.problem_base = parse_problem_base(base)?;
    }
    if let Some(mode) = common.mode {
        options.mode = mode.into();
    }
    if let Some(rfc) = common.problem_rfc {
        options.problem_rfc = rfc.into();
    }
    if let Some(suffix) = &common.service_suffix {
        options.service_suffix = suffix.clone();
    }
    if !common.media_types.is_empty() {
        options.media_types = common.media_types.clone();
    }
    Ok(options)
}

/// Runs one target; `serves` tells whether the driver can emit server stubs.
fn cmd_generate<T, D>(
    common: &CommonArgs,
    cfg: &ShapegenConfig,
    profile: T,
    driver: &D,
    serves: bool,
) -> Result<()>
where
    T: TargetProfile,
    D: ServiceDriver<T>,
{
    if !common.out.is_dir() {
        bail!("output directory {} does not exist", common.out.display());
    }

    let options = generation_options(common, cfg)?;
    if options.mode == GenerationMode::Server && !serves {
        bail!("{} only generates clients", driver.name());
    }

    let enable: Vec<&str> = cfg.enable.iter().chain(&common.enable).map(String::as_str).collect();
    let disable: Vec<&str> = cfg.disable.iter().chain(&common.disable).map(String::as_str).collect();
    let features = FeatureSet::<T::Feature>::from_cli_names(enable.as_slice(), disable.as_slice())?;

    let documents = parse::load_files(&common.files)?;
    let generation = generate(&documents, &options, profile, features, driver)?;
    print_entries(generation.diagnostics.iter());

    let types = if common.categories.is_empty() {
        generation.types
    } else {
        let categories: Vec<TypeCategory> = common.categories.iter().map(|&c| c.into()).collect();
        generation.types.filter_categories(&categories)
    };

    let written = write_types(&common.out, &types)?;
    eprintln!("Generated {written} files in {}", common.out.display());
    Ok(())
}

/// A top-level definition together with the definitions nested in it.
#[derive(Serialize)]
struct EmittedType<'a> {
    #[serde(flatten)]
    definition: &'a TypeDefinition,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nested_definitions: Vec<&'a TypeDefinition>,
}

/// Writes each top-level definition as `{out}/{package path}/{Name}.json`.
fn write_types(out: &Path, types: &GeneratedTypes) -> Result<usize> {
    let mut written = 0;
    for definition in types.top_level() {
        let nested_definitions = types
            .iter()
            .filter(|(name, _)| **name != definition.name && name.top_level() == definition.name)
            .map(|(_, nested)| nested)
            .collect();
        let emitted = EmittedType {
            definition,
            nested_definitions,
        };

        let dir = definition
            .name
            .package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .fold(out.to_path_buf(), |dir, segment| dir.join(segment));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;

        let path = dir.join(format!("{}.json", definition.name.simple_name()));
        let content = serde_json::to_string_pretty(&emitted)?;
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        debug!("wrote {}", path.display());
        written += 1;
    }
    Ok(written)
}

fn print_entries<'a>(entries: impl Iterator<Item = &'a parse::ValidationEntry>) {
    for entry in entries {
        eprintln!("{entry}");
    }
}

fn cmd_validate(files: &[PathBuf]) -> Result<()> {
    let documents = parse::load_files(files)?;
    let entries = parse::validate(&documents);
    if parse::has_errors(&entries) {
        return Err(GenerationError::Validation(entries).into());
    }
    print_entries(entries.iter());
    let warnings = entries
        .iter()
        .filter(|entry| entry.level == ValidationLevel::Warning)
        .count();
    eprintln!("Validation successful ({warnings} warning(s)).");
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
