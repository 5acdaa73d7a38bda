//! Run driver: sets up a workspace and logger, then runs the standard
//! pipeline for one set of options or a batch of them.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::captions::CaptionGenerator;
use crate::config::Settings;
use crate::logging::{sanitize_filename, LogCallback, RunLogger};
use crate::media::MediaEngine;

use super::errors::PipelineError;
use super::pipeline::CancelHandle;
use super::types::{Context, ProgressCallback, RunOptions, RunState};
use super::workspace::Workspace;
use super::{create_standard_pipeline, PipelineRunResult};

/// Result of one run.
#[derive(Debug)]
pub struct RunReport {
    pub run_name: String,
    /// Final file (if successful).
    pub output_path: Option<PathBuf>,
    /// Why the run failed (if it did).
    pub error: Option<PipelineError>,
    /// Per-step reports; empty when the run failed.
    pub pipeline: PipelineRunResult,
    /// Everything the steps recorded, up to the failure if there was one.
    pub state: RunState,
    /// Workspace left on disk when `keep_temp` was set.
    pub workspace: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl RunReport {
    pub fn success(
        run_name: impl Into<String>,
        output_path: PathBuf,
        run_result: PipelineRunResult,
        state: RunState,
    ) -> Self {
        Self {
            run_name: run_name.into(),
            output_path: Some(output_path),
            error: None,
            pipeline: run_result,
            state,
            workspace: None,
            log_path: None,
        }
    }

    pub fn failure(run_name: impl Into<String>, error: PipelineError, state: RunState) -> Self {
        Self {
            run_name: run_name.into(),
            output_path: None,
            error: Some(error),
            pipeline: PipelineRunResult::default(),
            state,
            workspace: None,
            log_path: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn steps_completed(&self) -> Vec<&str> {
        self.pipeline.steps_completed()
    }

    pub fn steps_skipped(&self) -> Vec<&str> {
        self.pipeline.steps_skipped()
    }

    fn with_locations(mut self, workspace: Option<PathBuf>, log_path: Option<PathBuf>) -> Self {
        self.workspace = workspace;
        self.log_path = log_path;
        self
    }
}

/// Runs the standard pipeline against a media engine.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vmerge_core::config::Settings;
/// use vmerge_core::media::SystemEngine;
/// use vmerge_core::orchestrator::{RunOptions, Runner};
///
/// let settings = Settings::default();
/// let options = RunOptions::from_settings(&settings);
/// let runner = Runner::new(settings, Arc::new(SystemEngine::new()));
///
/// let report = runner.run(&options);
/// if let Some(err) = &report.error {
///     eprintln!("{}", err);
/// }
/// ```
pub struct Runner {
    settings: Settings,
    engine: Arc<dyn MediaEngine>,
    captioner: Option<Arc<dyn CaptionGenerator>>,
    /// Parent for workspaces; the system temp dir when unset.
    temp_root: Option<PathBuf>,
    cancel: CancelHandle,
}

impl Runner {
    pub fn new(settings: Settings, engine: Arc<dyn MediaEngine>) -> Self {
        Self {
            settings,
            engine,
            captioner: None,
            temp_root: None,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_captioner(mut self, captioner: Arc<dyn CaptionGenerator>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(temp_root.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle that stops the current run at its next step boundary and
    /// prevents further runs of a batch.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn run(&self, options: &RunOptions) -> RunReport {
        self.run_with(options, None, None)
    }

    /// Run once with optional log-line and progress callbacks.
    pub fn run_with(
        &self,
        options: &RunOptions,
        log_callback: Option<LogCallback>,
        progress_callback: Option<ProgressCallback>,
    ) -> RunReport {
        let run_name = sanitize_filename(&options.run_name());
        let setup_failed = |message: String| {
            RunReport::failure(
                &run_name,
                PipelineError::setup_failed(&run_name, message),
                RunState::new(&run_name),
            )
        };

        if let Err(e) = fs::create_dir_all(&options.output_dir) {
            return setup_failed(format!(
                "Failed to create output directory {}: {}",
                options.output_dir.display(),
                e
            ));
        }

        let workspace = match &self.temp_root {
            Some(root) => Workspace::create_in(root, options.keep_temp),
            None => Workspace::create(options.keep_temp),
        };
        let workspace = match workspace {
            Ok(w) => w,
            Err(e) => return setup_failed(format!("Failed to create workspace: {}", e)),
        };

        let logger = match RunLogger::new(
            &run_name,
            self.settings.paths.logs_dir.as_deref(),
            self.settings.logging.clone(),
            log_callback,
        ) {
            Ok(l) => Arc::new(l),
            Err(e) => return setup_failed(format!("Failed to create logger: {}", e)),
        };

        let mut ctx = Context::new(
            &run_name,
            options.clone(),
            self.settings.clone(),
            workspace.path().to_path_buf(),
            Arc::clone(&logger),
            Arc::clone(&self.engine),
        );
        if let Some(captioner) = &self.captioner {
            ctx = ctx.with_captioner(Arc::clone(captioner));
        }
        if let Some(callback) = progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = RunState::new(&run_name);
        let pipeline = create_standard_pipeline().with_cancel_handle(&self.cancel);

        logger.info(&format!("Starting run: {}", run_name));
        logger.info(&format!("Workspace: {}", workspace.path().display()));

        let report = match pipeline.run(&ctx, &mut state) {
            Ok(run_result) => {
                logger.info(&format!("Run completed: {}", options.output.display()));
                RunReport::success(&run_name, options.output.clone(), run_result, state)
            }
            Err(e) => {
                logger.error(&format!("Pipeline failed: {}", e));
                if let Some(failure) = e.transcode_error() {
                    logger.error(&format!("Last command: {}", failure.command));
                }
                RunReport::failure(&run_name, e, state)
            }
        };

        let kept = workspace
            .is_retained()
            .then(|| workspace.path().to_path_buf());
        if let Some(path) = &kept {
            logger.info(&format!("Workspace kept at {}", path.display()));
        }
        let log_path = logger.log_path().map(PathBuf::from);
        logger.close();

        report.with_locations(kept, log_path)
    }

    /// Run each option set in order, stopping early if cancelled.
    pub fn run_batch(&self, runs: &[RunOptions]) -> Vec<RunReport> {
        let mut reports = Vec::with_capacity(runs.len());

        for (i, options) in runs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("Batch cancelled at run {}/{}", i + 1, runs.len());
                break;
            }

            tracing::info!(
                "Processing run {}/{}: {}",
                i + 1,
                runs.len(),
                options.output.display()
            );
            reports.push(self.run(options));
        }

        reports
    }
}
