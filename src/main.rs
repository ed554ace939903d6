//! F4PGA flow configuration CLI
//!
//! Entry point for the `f4pga-flow` command-line tool: edits a project's
//! override document and prints the configuration resolved for a platform.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use f4pga_flow::config::{ConfigError, OverrideError, ProjectFlowConfig, Scope, SlotKind};
use f4pga_flow::flow::{FlowConfig, FlowError};
use f4pga_flow::platform::{PlatformDir, PlatformOracle};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "f4pga-flow")]
#[command(about = "Edit and resolve F4PGA flow configuration", version)]
struct Cli {
    /// Project flow configuration file
    #[arg(long, short = 'p', env = "F4PGA_FLOW_PROJECT", default_value = "flow.json", global = true)]
    project: PathBuf,

    /// Share directory holding `platforms/<platform>.json` definitions
    #[arg(long, env = "F4PGA_SHARE_DIR", default_value = ".", global = true)]
    share: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Scope an override is written to (global when no platform is given)
#[derive(Args)]
struct ScopeArgs {
    /// Platform scope
    #[arg(long)]
    platform: Option<String>,

    /// Stage scope within the platform
    #[arg(long, requires = "platform")]
    stage: Option<String>,
}

impl ScopeArgs {
    fn scope(&self) -> Scope<'_> {
        Scope::from_parts(self.platform.as_deref(), self.stage.as_deref())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the platforms configured in the project
    Platforms {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Add a platform to the project
    AddPlatform { platform: String },

    /// Set the platform used when none is given
    SetDefaultPlatform { platform: String },

    /// Set the stage a platform builds by default
    SetDefaultTarget { platform: String, target: String },

    /// Append dependencies to an entry
    AddDep {
        #[command(flatten)]
        scope: ScopeArgs,
        name: String,
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Remove dependencies from an entry by value or by --index
    RmDep {
        #[command(flatten)]
        scope: ScopeArgs,
        name: String,
        values: Vec<String>,
        /// Positions to remove (comma-separated)
        #[arg(long, value_delimiter = ',', conflicts_with = "values")]
        index: Vec<usize>,
    },

    /// Remove a dependency entry entirely
    UnsetDep {
        #[command(flatten)]
        scope: ScopeArgs,
        name: String,
    },

    /// Append values to an entry (JSON literals are parsed, anything else is a string)
    AddValue {
        #[command(flatten)]
        scope: ScopeArgs,
        name: String,
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Remove values from an entry by value or by --index
    RmValue {
        #[command(flatten)]
        scope: ScopeArgs,
        name: String,
        values: Vec<String>,
        /// Positions to remove (comma-separated)
        #[arg(long, value_delimiter = ',', conflicts_with = "values")]
        index: Vec<usize>,
    },

    /// Remove a value entry entirely
    UnsetValue {
        #[command(flatten)]
        scope: ScopeArgs,
        name: String,
    },

    /// Print the resolved configuration of a platform as JSON
    Show {
        /// Platform to resolve (default platform when omitted)
        #[arg(long)]
        platform: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown platform `{platform}` (no definition in {dir})")]
    UnknownPlatform { platform: String, dir: PathBuf },

    #[error("unknown stage `{stage}` for platform `{platform}`")]
    UnknownStage { platform: String, stage: String },

    #[error("no platform given and no default platform set")]
    NoPlatform,

    #[error("nothing to remove: give values or --index")]
    NothingToRemove,
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Serialization(_) => 1,
            CliError::Override(_) => 2,
            CliError::Flow(_) => 3,
            CliError::UnknownPlatform { .. } | CliError::UnknownStage { .. } | CliError::NoPlatform => 4,
            CliError::NothingToRemove => 2,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let share = PlatformDir::new(&cli.share);
    let mut project = ProjectFlowConfig::open(&cli.project)?;

    match cli.command {
        Commands::Platforms { json } => {
            run_platforms(&project, json)?;
            return Ok(());
        }
        Commands::Show { platform } => {
            run_show(&project, &share, platform)?;
            return Ok(());
        }
        Commands::AddPlatform { platform } => {
            require_platform(&share, &platform)?;
            project.add_platform(&platform)?;
        }
        Commands::SetDefaultPlatform { platform } => {
            require_platform(&share, &platform)?;
            project.set_default_platform(&platform);
        }
        Commands::SetDefaultTarget { platform, target } => {
            prepare_scope(&mut project, &share, Scope::Stage { platform: &platform, stage: &target })?;
            project.set_default_target(&platform, &target)?;
        }
        Commands::AddDep { scope, name, values } => {
            prepare_scope(&mut project, &share, scope.scope())?;
            let deps = values.into_iter().map(Value::String).collect();
            project.add_dependencies(scope.scope(), &name, deps)?;
        }
        Commands::RmDep { scope, name, values, index } => {
            prepare_scope(&mut project, &share, scope.scope())?;
            let values: Vec<Value> = values.into_iter().map(Value::String).collect();
            remove(&mut project, SlotKind::Dependencies, scope.scope(), &name, &values, &index)?;
        }
        Commands::UnsetDep { scope, name } => {
            prepare_scope(&mut project, &share, scope.scope())?;
            project.unset_dependency(scope.scope(), &name)?;
        }
        Commands::AddValue { scope, name, values } => {
            prepare_scope(&mut project, &share, scope.scope())?;
            let values = values.iter().map(|raw| parse_value(raw)).collect();
            project.add_values(scope.scope(), &name, values)?;
        }
        Commands::RmValue { scope, name, values, index } => {
            prepare_scope(&mut project, &share, scope.scope())?;
            let values: Vec<Value> = values.iter().map(|raw| parse_value(raw)).collect();
            remove(&mut project, SlotKind::Values, scope.scope(), &name, &values, &index)?;
        }
        Commands::UnsetValue { scope, name } => {
            prepare_scope(&mut project, &share, scope.scope())?;
            project.unset_value(scope.scope(), &name)?;
        }
    }

    project.save()?;
    Ok(())
}

fn run_platforms(project: &ProjectFlowConfig, json: bool) -> Result<(), CliError> {
    let default = project.default_platform();
    let platforms: Vec<&str> = project.platforms().collect();

    if json {
        let output = serde_json::json!({
            "default_platform": default,
            "platforms": platforms,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for platform in platforms {
            let marker = if Some(platform) == default { "*" } else { " " };
            println!("{} {}", marker, platform);
        }
    }
    Ok(())
}

fn run_show(project: &ProjectFlowConfig, share: &PlatformDir, platform: Option<String>) -> Result<(), CliError> {
    let platform = platform
        .or_else(|| project.default_platform().map(str::to_string))
        .ok_or(CliError::NoPlatform)?;
    require_platform(share, &platform)?;

    let definition = share.load_definition(&platform)?;
    let flow = FlowConfig::new(project, &definition, &platform)?;
    println!("{}", serde_json::to_string_pretty(&flow.summary()?)?);
    Ok(())
}

fn require_platform(share: &PlatformDir, platform: &str) -> Result<(), CliError> {
    if share.has_platform(platform) {
        Ok(())
    } else {
        Err(CliError::UnknownPlatform {
            platform: platform.to_string(),
            dir: share.platforms_dir(),
        })
    }
}

/// Check a scope against the platform definitions and make sure the project
/// has an entry for its platform.
fn prepare_scope(project: &mut ProjectFlowConfig, share: &PlatformDir, scope: Scope<'_>) -> Result<(), CliError> {
    let Some(platform) = scope.platform() else {
        return Ok(());
    };
    require_platform(share, platform)?;
    if let Some(stage) = scope.stage() {
        if !share.has_stage(platform, stage) {
            return Err(CliError::UnknownStage {
                platform: platform.to_string(),
                stage: stage.to_string(),
            });
        }
    }
    if !project.has_platform(platform) {
        project.add_platform(platform)?;
    }
    Ok(())
}

fn remove(
    project: &mut ProjectFlowConfig,
    kind: SlotKind,
    scope: Scope<'_>,
    name: &str,
    values: &[Value],
    indices: &[usize],
) -> Result<(), CliError> {
    if !indices.is_empty() {
        project.remove_by_indices(kind, scope, name, indices)?;
    } else if !values.is_empty() {
        project.remove_by_values(kind, scope, name, values)?;
    } else {
        return Err(CliError::NothingToRemove);
    }
    Ok(())
}

/// JSON literal if it parses as one, plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
