//! CLI entrypoint for the capsule API generator.

mod logger;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use capsule_api::{CapsuleError, CapsuleResult, CapsulesConfig, ModuleConfig, ModulePlan};
use capsule_c::{CapsuleGenerator, RunSummary, WriteMode};
use clap::Parser;
use log::{error, info};

/// Generate capsule headers and export fragments for C modules.
#[derive(Debug, Parser)]
#[command(name = "capsulegen")]
#[command(about = "Generate versioned call-table headers for C modules")]
struct Cli {
    /// Module paths to process (default: every module in the config).
    modules: Vec<String>,

    /// Configuration file.
    #[arg(long, default_value = "capsules.json")]
    config: PathBuf,

    /// Compare with the files on disk instead of writing; fail on any difference.
    #[arg(long)]
    check: bool,

    /// Process modules concurrently.
    #[arg(long)]
    parallel: bool,

    /// Continue with the remaining modules after a failure.
    #[arg(long)]
    keep_going: bool,

    /// Print run metrics as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Load the config, or fall back to defaults when modules are named
/// explicitly and no config file exists.
fn load_config(cli: &Cli) -> CapsuleResult<CapsulesConfig> {
    if !cli.config.exists() && !cli.modules.is_empty() {
        return Ok(CapsulesConfig::default());
    }
    CapsulesConfig::load(&cli.config)
}

/// Directory module paths are resolved against
fn base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Plans for the requested modules, in request order; all configured
/// modules when none are requested.
fn select_plans(
    config: &CapsulesConfig,
    requested: &[String],
    base: &Path,
) -> CapsuleResult<Vec<ModulePlan>> {
    if requested.is_empty() {
        return config.plans(base);
    }

    let defaults = ModuleConfig::default();
    requested
        .iter()
        .map(|path| {
            let module = config.module(path).unwrap_or(&defaults);
            config.plan(path, module, base)
        })
        .collect()
}

fn run(cli: &Cli) -> CapsuleResult<RunSummary> {
    let config = load_config(cli)?;
    let plans = select_plans(&config, &cli.modules, &base_dir(&cli.config))?;
    if plans.is_empty() {
        return Err(CapsuleError::Config {
            path: cli.config.clone(),
            message: "no modules configured".to_string(),
        });
    }

    let mode = if cli.check {
        WriteMode::Check
    } else {
        WriteMode::Write
    };
    let generator = CapsuleGenerator::new(config.generator_config()).with_mode(mode);
    Ok(generator.generate_all(&plans, cli.parallel, cli.keep_going))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose, cli.quiet));

    let summary = match run(&cli) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    for (module, e) in &summary.failures {
        error!("{module}: {e}");
    }

    let m = &summary.metrics;
    info!(
        "{} modules: {} generated, {} skipped, {} failed ({} functions in {} groups, {} ms)",
        m.modules_attempted,
        m.modules_generated,
        m.modules_skipped,
        m.modules_failed,
        m.functions,
        m.groups,
        m.total_time.as_millis()
    );

    if cli.json {
        match serde_json::to_string_pretty(m) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                error!("Failed to serialize metrics: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
