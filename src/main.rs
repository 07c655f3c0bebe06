//! Service entry point.
//!
//! Wires configuration, stores, and notification channels together and
//! runs monitoring cycles on the configured interval.
//!
//! Usage:
//!   watermon_service [--config PATH] [--once] [--simulate]
//!
//! With no gateway configured (or with --simulate) readings come from the
//! dev-mode simulator. With DATABASE_URL set, readings and alerts persist
//! to Postgres; otherwise everything stays in memory for the run.

use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use chrono::{Local, Utc};

use watermon_service::alert::rules::DEFAULT_RULES;
use watermon_service::config::Config;
use watermon_service::households::{all_household_ids, RegistryBaselines};
use watermon_service::ingest::gateway;
use watermon_service::logging::{self, Component, LogLevel};
use watermon_service::model::WaterReading;
use watermon_service::monitor::Monitor;
use watermon_service::notify::console::ConsoleChannel;
use watermon_service::notify::gateway::MessagingGatewayChannel;
use watermon_service::notify::NotificationChannel;
use watermon_service::simulate::Simulator;
use watermon_service::store::memory::{
    MemoryAlertStore, MemoryReadingStore, MemoryRecipientStore,
};
use watermon_service::store::sql::SqlStore;
use watermon_service::store::{AlertStore, ReadingStore};

struct CliArgs {
    config_path: PathBuf,
    once: bool,
    simulate: bool,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        config_path: PathBuf::from("watermon.toml"),
        once: false,
        simulate: false,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                parsed.config_path = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or("--config requires a path")?;
            }
            "--once" => parsed.once = true,
            "--simulate" => parsed.simulate = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

fn main() {
    if let Err(e) = run() {
        eprintln!("watermon_service: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    // Secrets (DATABASE_URL, GATEWAY_API_KEY) come from the environment;
    // .env is a dev convenience and may be absent.
    let _ = dotenv::dotenv();

    let config = Config::load(&args.config_path)?;

    let level = LogLevel::from_str(&config.log.level)?;
    logging::init_logger(level, config.log.file.as_deref(), config.log.console_timestamps);

    // Stores: Postgres when configured, memory otherwise. Readings and
    // alerts get separate connections so the two roles don't contend for
    // one client.
    let (mut reading_store, mut alert_store): (Box<dyn ReadingStore>, Box<dyn AlertStore>) =
        match Config::database_url() {
            Some(url) => {
                logging::info(Component::Db, None, "using Postgres persistence");
                (
                    Box::new(SqlStore::connect(&url)?),
                    Box::new(SqlStore::connect(&url)?),
                )
            }
            None => {
                logging::info(Component::Db, None, "no DATABASE_URL, using in-memory stores");
                (
                    Box::new(MemoryReadingStore::new()),
                    Box::new(MemoryAlertStore::new()),
                )
            }
        };
    let mut recipient_store = MemoryRecipientStore::with_defaults(Utc::now());

    // Notification channels: the messaging gateway when configured,
    // console channels in dev mode.
    let channels: Vec<Box<dyn NotificationChannel>> = match config.notify.gateway_url {
        Some(ref url) => {
            let api_key = Config::gateway_api_key();
            config
                .enabled_channels()
                .into_iter()
                .map(|kind| {
                    Box::new(MessagingGatewayChannel::new(url, api_key.clone(), kind))
                        as Box<dyn NotificationChannel>
                })
                .collect()
        }
        None => config
            .enabled_channels()
            .into_iter()
            .map(|kind| Box::new(ConsoleChannel::new(kind)) as Box<dyn NotificationChannel>)
            .collect(),
    };

    let use_simulator = args.simulate || config.service.simulate || config.gateway.base_url.is_none();
    let simulator = Simulator::new(config.service.samples_per_cycle.max(1));
    let http_client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.gateway.timeout_secs.max(1)))
        .build()?;

    logging::info(
        Component::System,
        None,
        &format!(
            "monitoring {} households every {}s ({})",
            all_household_ids().len(),
            config.service.poll_interval_secs,
            if use_simulator { "simulated readings" } else { "device gateway" }
        ),
    );

    loop {
        let cycle_started = std::time::Instant::now();

        let batch: Option<Vec<WaterReading>> = if use_simulator {
            Some(simulator.readings_for_all(Local::now().fixed_offset()))
        } else {
            // base_url is present when use_simulator is false.
            let base_url = config.gateway.base_url.as_deref().unwrap_or_default();
            match gateway::fetch_current(
                &http_client,
                base_url,
                &all_household_ids(),
                config.service.samples_per_cycle.max(1),
            ) {
                Ok(readings) => Some(readings),
                Err(e) => {
                    logging::log_gateway_failure("fetch current readings", &e);
                    None
                }
            }
        };

        if let Some(batch) = batch {
            let mut monitor = Monitor {
                readings: reading_store.as_mut(),
                alerts: alert_store.as_mut(),
                recipients: &mut recipient_store,
                channels: &channels,
                rules: DEFAULT_RULES,
            };
            if let Err(e) = monitor.run_cycle(&batch, &RegistryBaselines, Utc::now()) {
                // Invalid input from the gateway; the batch was rejected
                // as a whole and the next cycle starts clean.
                logging::error(Component::Classifier, None, &e.to_string());
            }
        }

        if args.once {
            break;
        }

        let interval = Duration::from_secs(config.service.poll_interval_secs.max(1));
        if let Some(remaining) = interval.checked_sub(cycle_started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    Ok(())
}
