// # ddns6d - IPv6 Dynamic DNS Daemon
//
// The ddns6d daemon is a thin integration layer. It is responsible for:
// 1. Reading configuration (JSON file or environment variables)
// 2. Validating it before any network I/O
// 3. Initializing logging and the runtime
// 4. Wiring the netlink sources and the Cloudflare updater into the engine
// 5. Translating SIGTERM/SIGINT into engine shutdown
//
// All selection and update logic lives in ddns6-core.
//
// ## Configuration
//
// If `DDNS_CONFIG_FILE` is set, the JSON file it names is the configuration.
// Otherwise:
//
// - `DDNS_EMAIL`: Account email sent as X-Auth-Email
// - `DDNS_API_KEY`: API token sent as Bearer authorization
// - `DDNS_TARGETS`: Comma-separated `zone_id/record_id[=domain]` list
// - `DDNS_API_BASE_URL`: Zones endpoint override (optional)
// - `DDNS_REQUEST_TIMEOUT_SECS`: Per-request timeout (default 10)
// - `DDNS_TTL`: TTL to set on each update (optional; 1 = automatic)
//
// Always read from the environment:
//
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `DDNS_MODE`: `live` (default) or `dry-run`
//
// ## Example
//
// ```bash
// export DDNS_EMAIL=ops@example.com
// export DDNS_API_KEY=your_token
// export DDNS_TARGETS=023e105f4ecef8ad9ca31a8372d0c353/372e67954025e0ba6aaa6d586b9e0b59=home.example.com
//
// ddns6d
// ```

use anyhow::{Context, Result};
use ddns6_core::{DdnsConfig, DdnsEngine, EngineEvent, RecordTarget};
use ddns6_ip_netlink::{NetlinkInterfaces, NetlinkMonitor};
use ddns6_provider_cloudflare::CloudflareUpdater;
use std::env;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon settings: the engine configuration plus process-level knobs
struct Settings {
    ddns: DdnsConfig,
    log_level: String,
    dry_run: bool,
}

impl Settings {
    /// Load settings from the process environment
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through `lookup`, which maps a variable name to its value
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ddns = match lookup("DDNS_CONFIG_FILE").filter(|p| !p.is_empty()) {
            Some(path) => DdnsConfig::from_json_file(&path)
                .with_context(|| format!("Failed to load DDNS_CONFIG_FILE '{}'", path))?,
            None => Self::ddns_from_lookup(&lookup)?,
        };

        let dry_run = match lookup("DDNS_MODE").as_deref().map(str::to_lowercase) {
            None => false,
            Some(mode) if mode == "live" => false,
            Some(mode) if mode == "dry-run" => true,
            Some(mode) => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                mode
            ),
        };

        Ok(Self {
            ddns,
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            dry_run,
        })
    }

    fn ddns_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<DdnsConfig> {
        let targets = lookup("DDNS_TARGETS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<RecordTarget>())
            .collect::<ddns6_core::Result<Vec<_>>>()
            .context("Invalid DDNS_TARGETS")?;

        let mut config = DdnsConfig::new(
            lookup("DDNS_EMAIL").unwrap_or_default(),
            lookup("DDNS_API_KEY").unwrap_or_default(),
            targets,
        );

        config.api_base_url = lookup("DDNS_API_BASE_URL").filter(|u| !u.is_empty());

        if let Some(secs) = lookup("DDNS_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = secs.trim().parse().with_context(|| {
                format!("DDNS_REQUEST_TIMEOUT_SECS must be a number. Got: {}", secs)
            })?;
        }

        if let Some(ttl) = lookup("DDNS_TTL") {
            config.ttl = Some(
                ttl.trim()
                    .parse()
                    .with_context(|| format!("DDNS_TTL must be a number. Got: {}", ttl))?,
            );
        }

        Ok(config)
    }

    /// Validate the settings
    fn validate(&self) -> Result<()> {
        self.ddns.validate()?;
        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let log_level = settings.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddns6d daemon");
    info!(
        "Configuration loaded: {} record target(s)",
        settings.ddns.targets.len()
    );

    let updater = match CloudflareUpdater::from_config(&settings.ddns, settings.dry_run) {
        Ok(updater) => updater,
        Err(e) => {
            error!("Failed to create Cloudflare updater: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(settings.ddns, updater).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal or a fatal engine error
async fn run_daemon(config: DdnsConfig, updater: CloudflareUpdater) -> Result<()> {
    for target in &config.targets {
        info!("Managing record: {}", target);
    }

    let (engine, events) = DdnsEngine::new(
        Box::new(NetlinkInterfaces::new()),
        Box::new(NetlinkMonitor::new()),
        Box::new(updater),
        config,
    )?;

    let signals = ShutdownSignals::install()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        let signal = signals.recv().await;
        info!("Received shutdown signal: {}", signal);
        let _ = shutdown_tx.send(());
    });

    tokio::spawn(log_events(events));

    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Drain engine events into the debug log
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        debug!(?event, "Engine event");
    }
}

/// SIGTERM/SIGINT handlers, installed before the engine starts
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?,
            sigint: signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?,
        })
    }

    /// Wait for either signal and return its name
    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Fallback for non-Unix platforms: CTRL-C only
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending().await
            }
        }
    }
}
