// # converged - Converge Driver
//
// Thin integration layer: it reads process settings from the environment,
// installs logging, registers provider modules and runs ONE reconciliation
// of a declaration file. All reconciliation logic lives in converge-core and
// the provider crates.
//
// ## Configuration
//
// - `CONVERGE_CONFIG`: Path to the JSON declaration file (required)
// - `CONVERGE_ACTION`: `apply` (default) or `teardown`
// - `CONVERGE_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// Provider modules read their own credentials:
//
// - `DH_API_KEY`: DreamHost API key (module disabled when unset)
// - `CONVERGE_DRY_RUN`: `1` to list records without changing them
//
// ## Example
//
// ```bash
// export CONVERGE_CONFIG=/etc/converge/site.json
// export DH_API_KEY=your_key
//
// converged
// CONVERGE_ACTION=teardown converged
// ```

use anyhow::{Context, Result};
use converge_core::{
    BlankRegistry, CollectingReporter, DeployConfig, Error, ReconcileEvent, Reconciler, Reporter,
    RunSummary,
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: The run completed
/// - 1: Configuration error (process settings, declarations, diagnostics)
/// - 2: Runtime error (provider failure, internal error, interruption)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConvergeExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ConvergeExitCode> for ExitCode {
    fn from(code: ConvergeExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What to do with the declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Apply,
    TearDown,
}

impl Action {
    fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "apply" => Ok(Action::Apply),
            "teardown" | "tear-down" => Ok(Action::TearDown),
            other => anyhow::bail!(
                "CONVERGE_ACTION '{}' is not valid. Valid actions: apply, teardown",
                other
            ),
        }
    }
}

/// Process settings
struct Config {
    config_path: PathBuf,
    action: Action,
    log_level: String,
}

impl Config {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        let config_path = env::var("CONVERGE_CONFIG").context(
            "CONVERGE_CONFIG is required. Set it via: export CONVERGE_CONFIG=/path/to/site.json",
        )?;
        let action = Action::parse(
            &env::var("CONVERGE_ACTION").unwrap_or_else(|_| "apply".to_string()),
        )?;

        Ok(Self {
            config_path: PathBuf::from(config_path),
            action,
            log_level: env::var("CONVERGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("CONVERGE_CONFIG cannot be empty");
        }
        if !self.config_path.is_file() {
            anyhow::bail!(
                "CONVERGE_CONFIG does not name a readable file: {}",
                self.config_path.display()
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "CONVERGE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ConvergeExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ConvergeExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ConvergeExitCode::ConfigError.into();
    }

    info!("Starting converged ({:?})", config.action);

    // Lifecycle calls are strictly sequential
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ConvergeExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Run one reconciliation
async fn run(config: Config) -> ConvergeExitCode {
    let registry = Arc::new(BlankRegistry::new());
    register_modules(&registry);

    let declarations = match DeployConfig::from_file(&config.config_path) {
        Ok(declarations) => declarations,
        Err(e) => {
            error!("Failed to load {}: {}", config.config_path.display(), e);
            return ConvergeExitCode::ConfigError;
        }
    };
    info!(
        "Loaded {} declaration(s) from {}",
        declarations.resources.len(),
        declarations.source
    );

    let reporter = Arc::new(CollectingReporter::new());
    let (reconciler, mut events) =
        match Reconciler::new(registry.clone(), reporter.clone(), declarations) {
            Ok(pair) => pair,
            Err(e) => {
                error!("Invalid declarations: {}", e);
                return ConvergeExitCode::ConfigError;
            }
        };

    let outcome = tokio::select! {
        result = async {
            match config.action {
                Action::Apply => reconciler.apply().await,
                Action::TearDown => reconciler.tear_down().await,
            }
        } => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; the run was not completed");
            return ConvergeExitCode::RuntimeError;
        }
    };

    while let Ok(event) = events.try_recv() {
        log_event(&event);
    }

    for diagnostic in reporter.diagnostics() {
        eprintln!("{}", diagnostic);
    }

    match outcome {
        Ok(summary) => {
            log_summary(config.action, &summary);
            ConvergeExitCode::Success
        }
        Err(e @ Error::Config(_)) => {
            error!("{}", e);
            ConvergeExitCode::ConfigError
        }
        Err(e) if e.is_fatal_internal() => {
            error!("Internal error (this is a bug): {}", e);
            ConvergeExitCode::RuntimeError
        }
        Err(e) => {
            error!("Run failed: {}", e);
            ConvergeExitCode::RuntimeError
        }
    }
}

/// Register every compiled-in provider module
///
/// A module that cannot initialize is reported and left out; declarations
/// using its kinds then fail as unknown.
fn register_modules(registry: &BlankRegistry) {
    #[cfg(feature = "dreamhost")]
    {
        info!("Registering DreamHost module");
        if let Err(e) = converge_provider_dreamhost::register_with_driver(registry) {
            warn!("DreamHost module disabled: {}", e);
        }
    }

    debug!("Registered kinds: {:?}", registry.list_blanks());
}

fn log_event(event: &ReconcileEvent) {
    match event {
        ReconcileEvent::Skipped { resource } => warn!("Skipped {}", resource),
        ReconcileEvent::Stopped { reason } => info!("Stopped: {}", reason),
        other => debug!("{:?}", other),
    }
}

fn log_summary(action: Action, summary: &RunSummary) {
    match action {
        Action::Apply => info!(
            "Apply complete: {} created, {} already existed, {} found, {} skipped",
            summary.created, summary.already_existed, summary.found, summary.skipped
        ),
        Action::TearDown => info!(
            "Teardown complete: {} removed, {} already absent, {} skipped",
            summary.removed, summary.already_absent, summary.skipped
        ),
    }
}
