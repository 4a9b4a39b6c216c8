// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use zonemigrate::{
    cli::Cli,
    config::resolve_password,
    constants::{EXIT_USAGE, EXIT_ZONE_FAILURE},
    orchestrator::BatchOrchestrator,
    report::{exit_code, render_summary},
    source::{
        dynect::{DynectClient, DynectSource},
        xfr::ZoneTransferClient,
        SourceProvider,
    },
    target::{
        oci::{regional_endpoint, OciDnsClient},
        oci_config::load_profile,
        TargetProvider,
    },
};

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .thread_name("zonemigrate")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            std::process::exit(EXIT_USAGE);
        }
    };

    let code = runtime.block_on(async_main(cli));
    std::process::exit(code);
}

fn init_logging() {
    // Respects RUST_LOG (default "info") and RUST_LOG_FORMAT=json|text
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> i32 {
    init_logging();
    info!("Starting zonemigrate");

    let setup = match Setup::new(&cli).await {
        Ok(setup) => setup,
        Err(SetupError::Usage(e)) => {
            error!(error = %format!("{e:#}"), "Invalid configuration");
            return EXIT_USAGE;
        }
        Err(SetupError::Source(e)) => {
            error!(error = %format!("{e:#}"), "Failed to connect to Dyn");
            return EXIT_ZONE_FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current zone");
            signal_token.cancel();
        }
    });

    let source: Arc<dyn SourceProvider> = Arc::new(DynectSource::new(
        Arc::clone(&setup.dynect),
        setup.xfr,
    ));
    let mut orchestrator = BatchOrchestrator::new(setup.config, source, setup.target);
    let outcomes = orchestrator.run(&setup.zones, &cancel).await;

    if let Err(e) = setup.dynect.logout().await {
        warn!(error = %e, "Failed to close Dyn session");
    }

    print!("{}", render_summary(&outcomes));
    exit_code(&outcomes, cancel.is_cancelled())
}

enum SetupError {
    /// Arguments or local configuration are unusable
    Usage(anyhow::Error),
    /// The source provider could not be reached or rejected the credentials
    Source(anyhow::Error),
}

struct Setup {
    zones: Vec<String>,
    config: zonemigrate::config::MigrationConfig,
    dynect: Arc<DynectClient>,
    xfr: ZoneTransferClient,
    target: Arc<dyn TargetProvider>,
}

impl Setup {
    async fn new(cli: &Cli) -> Result<Self, SetupError> {
        let zones = cli.zone_names().map_err(SetupError::Usage)?;
        if zones.is_empty() {
            return Err(SetupError::Usage(anyhow::anyhow!("No zones to migrate")));
        }

        let profile = load_profile(&cli.oci_config_file, &cli.oci_config_profile)
            .map_err(SetupError::Usage)?;
        let signer = profile.signer().map_err(SetupError::Usage)?;
        let endpoint = cli
            .oci_endpoint
            .clone()
            .unwrap_or_else(|| regional_endpoint(&profile.region));
        debug!(endpoint = %endpoint, key_id = %signer.key_id(), "OCI DNS client configured");
        let target: Arc<dyn TargetProvider> = Arc::new(
            OciDnsClient::new(&endpoint, signer)
                .context("Failed to create OCI DNS client")
                .map_err(SetupError::Usage)?,
        );

        let config = cli.migration_config(&profile.tenancy);
        let password = resolve_password(cli.dynect_password.clone(), &cli.dynect_username)
            .map_err(SetupError::Usage)?;

        let mut dynect = DynectClient::new(cli.dynect_api_url.as_deref())
            .context("Failed to create Dyn client")
            .map_err(SetupError::Usage)?;
        dynect
            .login(&cli.dynect_customer, &cli.dynect_username, &password)
            .await
            .context("Dyn login failed")
            .map_err(SetupError::Source)?;
        let dynect = Arc::new(dynect);

        let mut xfr = ZoneTransferClient::new(cli.transfer_server.clone());
        if let Some(key_name) = &cli.transfer_tsig_key {
            let source = DynectSource::new(Arc::clone(&dynect), xfr.clone());
            let key = source
                .transfer_tsig_key(key_name)
                .await
                .context("Failed to read transfer TSIG key from Dyn")
                .map_err(SetupError::Source)?
                .ok_or_else(|| anyhow::anyhow!("TSIG key '{key_name}' not found in Dyn"))
                .map_err(SetupError::Usage)?;
            xfr = xfr.with_tsig(key);
        }

        info!(
            zones = zones.len(),
            compartment = %config.target_compartment,
            policy = ?config.failure_policy,
            "Configuration loaded"
        );

        Ok(Self {
            zones,
            config,
            dynect,
            xfr,
            target,
        })
    }
}
