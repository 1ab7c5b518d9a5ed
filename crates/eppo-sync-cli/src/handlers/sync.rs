//! Sync command handler

use super::utils::write_json;
use crate::cli::{OutputFormat, SyncArgs};
use crate::config::{first_set, Config};
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use eppo_sync_core::{
    run_sync, ClientConfig, SyncMode, SyncOptions, SyncOutcome, TimeoutConfig, DEFAULT_BASE_URL,
};
use tracing::{debug, info, instrument, warn};

/// Handle the sync command
#[instrument(skip_all, fields(project_dir = %args.project_dir.display(), dry_run = args.dry_run))]
pub fn handle_sync(args: SyncArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("sync_command", &format!("project: {}", args.project_dir.display()));
    let options = build_sync_options(&args, config)?;
    debug!(
        base_url = %options.client.base_url,
        manifest = %options.resolved_manifest_path().display(),
        "Resolved sync options"
    );

    output.info(&format!(
        "Syncing dbt project at {} ({})",
        options.project_dir.display(),
        options.mode
    ))?;

    let spinner = match options.mode {
        SyncMode::Live => output.spinner("Syncing definitions to Eppo..."),
        SyncMode::DryRun => None,
    };
    let result = run_sync(&options);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    if let Some(path) = &args.save_to {
        match &report.payload {
            Some(payload) => {
                write_json(path, payload)?;
                info!(path = %path.display(), "Payload saved");
                output.success(&format!("✓ Payload saved to {}", path.display()))?;
            }
            None => {
                warn!("No payload was built; nothing saved");
                output.warning(&format!("No payload was built; {} not written", path.display()))?;
            }
        }
    }

    output.sync_report(&report)?;

    if output.format() == OutputFormat::Human {
        if let SyncOutcome::Rendered { payload_json } = &report.outcome {
            if args.save_to.is_none() {
                output.section("Payload")?;
                output.writeln(payload_json)?;
            }
        }
    }

    match report.outcome {
        SyncOutcome::Submitted { .. } => output.success("✓ Sync complete")?,
        SyncOutcome::Rendered { .. } => output.success("✓ Dry run complete")?,
        SyncOutcome::NothingToSync => {}
    }

    Ok(())
}

/// Combine arguments, environment and config file into run options
///
/// clap has already applied the environment to `args`; the config file
/// fills whatever is still unset.
pub fn build_sync_options(args: &SyncArgs, config: &Config) -> Result<SyncOptions> {
    let api_key = first_set([args.api_key.clone(), config.eppo.api_key.clone()]).ok_or_else(|| {
        Error::config(
            "Eppo API key is required. Pass --api-key, set EPPO_API_KEY or add eppo.api_key to the config file",
        )
    })?;

    let base_url = first_set([args.base_url.clone(), config.eppo.base_url.clone()])
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // A short request timeout also caps the default connect timeout
    let request_secs = args.timeout.or(config.eppo.timeout_secs);
    let default_connect_secs = TimeoutConfig::default().connect_timeout.as_secs();
    let connect_secs = config
        .eppo
        .connect_timeout_secs
        .or_else(|| request_secs.map(|secs| secs.min(default_connect_secs)));
    let timeouts = TimeoutConfig::from_secs(connect_secs, request_secs);
    timeouts
        .validate()
        .map_err(|e| Error::invalid_args(format!("Invalid timeout: {}", e)))?;

    let mut options = SyncOptions::new(&args.project_dir, api_key);
    options.manifest_path = args.manifest_path.clone();
    options.client = ClientConfig { base_url, timeouts };
    options.mode = if args.dry_run {
        SyncMode::DryRun
    } else {
        SyncMode::Live
    };
    options.sync_tag = args.sync_tag.clone().or_else(|| config.sync.sync_tag.clone());
    options.schema_path = args.schema.clone().or_else(|| config.sync.schema_path.clone());
    options.reference_url_base = first_set([
        args.reference_url_base.clone(),
        config.sync.reference_url_base.clone(),
    ]);

    Ok(options)
}
