//! One job, start to finish.
//!
//! [`JobOrchestrator`] drives a validated [`JobConfig`] through script
//! materialization, credential lookup, interpreter execution and result
//! collection, emitting events at each milestone. Collaborators are passed
//! in as trait objects; [`run`] wires the production ones.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lgr_core::command::{CommandSpec, JobInvocation};
use lgr_core::job::JobConfig;
use lgr_core::output::files_dir;
use lgr_core::script::{materialize, WorkDir};
use lgr_core::scripting::outcome::classify;
use lgr_core::scripting::subprocess::run_command;
use lgr_events::{EventLog, EventSink, NoopSink, StorageApiEventSink};
use lgr_provisioning::{
    CredentialProvider, ProvisioningClient, BACKEND_REDSHIFT, RESOURCE_TRANSFORMATIONS,
};
use lgr_storage::StorageApiClient;
use serde_json::json;

use crate::collector::{collect_outputs, FileSink, LocalFileSink, StorageFileSink, StoredOutput};
use crate::config::{OutputMode, RunnerConfig};
use crate::error::{ErrorKind, RunError};
use crate::warehouse::{PgWarehouse, Warehouse};

/// Component name stamped on every event.
pub const COMPONENT: &str = "lgr-runner";

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Intermediate table ids reported by the script.
    pub intermediate_tables: Vec<String>,
    /// Stored output files, in catalogue order.
    pub outputs: Vec<StoredOutput>,
    /// The run's working directory. Only still present for debug runs.
    pub work_dir: PathBuf,
}

/// Runs one job against the given collaborators.
pub struct JobOrchestrator<'a> {
    config: &'a RunnerConfig,
    provider: &'a dyn CredentialProvider,
    warehouse: &'a dyn Warehouse,
    sink: &'a dyn FileSink,
    events: &'a EventLog,
}

impl<'a> JobOrchestrator<'a> {
    pub fn new(
        config: &'a RunnerConfig,
        provider: &'a dyn CredentialProvider,
        warehouse: &'a dyn Warehouse,
        sink: &'a dyn FileSink,
        events: &'a EventLog,
    ) -> Self {
        Self {
            config,
            provider,
            warehouse,
            sink,
            events,
        }
    }

    /// Run `job`. The first error ends the run.
    ///
    /// The working directory is removed after a successful non-debug run
    /// and kept in every other case so it can be inspected.
    pub async fn run(&self, job: &JobConfig) -> Result<RunSummary, RunError> {
        let work_dir = WorkDir::create(&self.config.work_dir_root).await?;
        let script = materialize(work_dir.path(), &job.script).await?;

        let credentials = self.provider.credentials(RESOURCE_TRANSFORMATIONS).await?;

        self.events
            .info(&format!(
                "Running R-script {}, this may take some time.",
                display_name(&script)
            ))
            .await;

        let command = CommandSpec::for_job(
            &self.config.interpreter,
            &credentials,
            JobInvocation {
                script: &script,
                work_dir: work_dir.path(),
                source_table: &job.source_table,
                parameters: &job.script_parameters,
                debug: job.debug,
            },
        );
        tracing::debug!(command = %command.masked_line(), "Executing command line");

        let output = run_command(&command).await?;
        tracing::debug!(
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            "Execution done"
        );

        let tables = classify(&output, job.debug, &work_dir.debug_artifact(), &credentials)
            .await?
            .into_result()?;
        self.events
            .info(&format!(
                "R-script successful, intermediate tables: {}",
                tables.join(", ")
            ))
            .await;

        let catalog = self.warehouse.open(&credentials).await?;
        let outputs =
            collect_outputs(catalog.as_ref(), self.sink, work_dir.path(), &job.file_tags).await?;

        let path = work_dir.path().to_path_buf();
        if job.debug {
            tracing::info!(work_dir = %path.display(), "Debug run, working directory kept");
        } else if let Err(e) = work_dir.remove().await {
            tracing::warn!(error = %e, work_dir = %path.display(), "Cannot remove working directory");
        }

        self.events
            .info_with_results(
                "Everything finished.",
                json!({ "intermediateTables": tables, "files": outputs.len() }),
            )
            .await;

        Ok(RunSummary {
            intermediate_tables: tables,
            outputs,
            work_dir: path,
        })
    }
}

/// Report a failed run through `events`.
///
/// Input and execution errors reach the event stream verbatim; anything
/// else is sent as a generic application error. The raw error is always
/// logged at debug level.
pub async fn report_failure(events: &EventLog, err: &RunError) {
    tracing::debug!(error = ?err, "Run failed");
    match err.kind() {
        ErrorKind::Input => {
            events
                .error(&format!("There was an error in input: {err}"))
                .await;
        }
        ErrorKind::Execution => events.error(&err.to_string()).await,
        ErrorKind::Internal => events.application_error(&err.to_string()).await,
    }
}

/// Load the job in `data_dir` and run it with the production collaborators.
///
/// The descriptor is validated before anything external is contacted.
/// Every failure is reported through the event log before it is returned.
pub async fn run(config: &RunnerConfig, data_dir: &Path) -> Result<RunSummary, RunError> {
    let fallback = EventLog::new(
        Arc::new(NoopSink),
        COMPONENT,
        config.run_id.clone().unwrap_or_default(),
    );

    let job = match JobConfig::load(data_dir, &config.job_environment()).await {
        Ok(job) => job,
        Err(e) => return Err(fail(&fallback, e.into()).await),
    };
    tracing::debug!(?job, "Job configuration loaded");

    let events = match event_log(config, &job) {
        Ok(events) => events,
        Err(e) => return Err(fail(&fallback, e).await),
    };

    match run_loaded(config, data_dir, &job, &events).await {
        Ok(summary) => Ok(summary),
        Err(e) => Err(fail(&events, e).await),
    }
}

async fn run_loaded(
    config: &RunnerConfig,
    data_dir: &Path,
    job: &JobConfig,
    events: &EventLog,
) -> Result<RunSummary, RunError> {
    let provider = ProvisioningClient::new(
        &config.provisioning_url,
        BACKEND_REDSHIFT,
        &job.token,
        &job.run_id,
    )?;

    let sink: Box<dyn FileSink> = match config.output_mode {
        OutputMode::Local => Box::new(LocalFileSink::new(files_dir(data_dir))),
        OutputMode::Storage => Box::new(StorageFileSink::new(StorageApiClient::new(
            &config.storage_api_url,
            &job.token,
            &job.run_id,
        )?)),
    };

    JobOrchestrator::new(config, &provider, &PgWarehouse, sink.as_ref(), events)
        .run(job)
        .await
}

fn event_log(config: &RunnerConfig, job: &JobConfig) -> Result<EventLog, RunError> {
    let sink: Arc<dyn EventSink> = if config.events_enabled {
        Arc::new(StorageApiEventSink::new(&config.storage_api_url, &job.token)?)
    } else {
        Arc::new(NoopSink)
    };
    Ok(EventLog::new(sink, COMPONENT, &job.run_id))
}

async fn fail(events: &EventLog, err: RunError) -> RunError {
    report_failure(events, &err).await;
    err
}

fn display_name(script: &Path) -> String {
    script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
