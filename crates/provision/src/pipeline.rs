//! Pipeline: discovery, validation, image assembly and transfer, in order.
//!
//! Each stage either hands its output to the next or aborts the run with an
//! [`UploadError`]. Progress is pushed to a [`Reporter`] as it happens so the
//! console shows every file's findings even when the run later aborts.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use audio_check::{check_file, discover, AudioCandidate, FileReport};

use crate::command::Executor;
use crate::config::UploadOptions;
use crate::error::UploadError;
use crate::flash;
use crate::image::{self, DeviceImage};
use crate::plan::{self, PlanAdvisory, UploadPlan};
use crate::port::{resolve_port, PortEnumerator, ResolvedPort};
use crate::scratch::Scratch;
use crate::tool::{ESPTOOL, MKSPIFFS};

/// Long-running stages worth timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `mkspiffs` run.
    ImageAssembly,
    /// `esptool` run.
    Transfer,
}

/// Receives progress from [`Pipeline::run`]. Every method defaults to a no-op.
pub trait Reporter {
    /// Files found in the input folder.
    fn discovered(&mut self, _folder: &Path, _files: &[PathBuf]) {}
    /// One file inspected and validated.
    fn file_checked(&mut self, _report: &FileReport) {}
    /// Validation finished with at least one accepted file.
    fn validated(&mut self, _accepted: &[AudioCandidate], _total_bytes: u64) {}
    /// Serial port chosen.
    fn port_resolved(&mut self, _port: &ResolvedPort) {}
    /// Plan built; nothing has been written yet.
    fn plan_ready(&mut self, _plan: &UploadPlan, _advisories: &[PlanAdvisory]) {}
    /// A stage is about to run.
    fn stage_started(&mut self, _stage: Stage) {}
    /// A stage finished successfully.
    fn stage_finished(&mut self, _stage: Stage, _elapsed: Duration) {}
}

/// [`Reporter`] that discards everything.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// How a successful run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// `check_only` was set: the plan was built and nothing was written.
    Checked(UploadPlan),
    /// The image was built and flashed.
    Uploaded {
        /// What was flashed.
        plan: UploadPlan,
        /// Image size in bytes.
        image_bytes: u64,
    },
}

impl RunOutcome {
    /// The plan, however the run ended.
    #[must_use]
    pub fn plan(&self) -> &UploadPlan {
        match self {
            Self::Checked(plan) | Self::Uploaded { plan, .. } => plan,
        }
    }
}

/// One provisioning run's collaborators.
#[derive(Debug)]
pub struct Pipeline<E, P> {
    executor: E,
    ports: P,
    scratch_root: Option<PathBuf>,
}

impl<E: Executor, P: PortEnumerator> Pipeline<E, P> {
    /// Build a pipeline around an executor and a port enumerator.
    pub fn new(executor: E, ports: P) -> Self {
        Self {
            executor,
            ports,
            scratch_root: None,
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    #[must_use]
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// The executor, for inspection after a run.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// The scratch directory holding the staged files and the image is
    /// removed before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`UploadError`] of the stage that aborted the run.
    pub fn run(
        &self,
        opts: &UploadOptions,
        reporter: &mut impl Reporter,
    ) -> Result<RunOutcome, UploadError> {
        // 1. Discovery
        let files = discover(&opts.wav_folder)?;
        if files.is_empty() {
            return Err(UploadError::NoWavFiles(opts.wav_folder.clone()));
        }
        reporter.discovered(&opts.wav_folder, &files);

        // 2. Validation
        let accepted: Vec<AudioCandidate> = files
            .iter()
            .filter_map(|path| {
                let report = check_file(path);
                reporter.file_checked(&report);
                report.accepted().cloned()
            })
            .collect();
        if accepted.is_empty() {
            return Err(UploadError::NoValidFiles);
        }
        let total_bytes = plan::total_size(&accepted);
        reporter.validated(&accepted, total_bytes);
        plan::ensure_capacity(total_bytes, opts.partition)?;

        // 3. Port
        let port = resolve_port(opts.port.as_deref(), &self.ports)?;
        reporter.port_resolved(&port);

        let plan = UploadPlan {
            files: accepted,
            total_bytes,
            partition: opts.partition,
            port,
            offset: opts.offset,
        };
        let advisories = plan.advisories();
        for advisory in &advisories {
            tracing::warn!(%advisory, "upload plan");
        }
        reporter.plan_ready(&plan, &advisories);
        if opts.check_only {
            return Ok(RunOutcome::Checked(plan));
        }

        // 4. Image + transfer. Both tools are resolved before anything is
        // written so a missing flasher never costs an image build.
        let mkspiffs = MKSPIFFS.resolve(&self.executor)?;
        let esptool = ESPTOOL.resolve(&self.executor)?;

        let scratch = Scratch::create(self.scratch_root.as_deref()).map_err(UploadError::Scratch)?;
        let result = self.build_and_flash(&plan, &scratch, &mkspiffs, &esptool, reporter);
        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            tracing::warn!(path = %scratch_path.display(), error = %e, "failed to remove scratch directory");
        }

        let image = result?;
        Ok(RunOutcome::Uploaded {
            plan,
            image_bytes: image.size,
        })
    }

    fn build_and_flash(
        &self,
        plan: &UploadPlan,
        scratch: &Scratch,
        mkspiffs: &Path,
        esptool: &Path,
        reporter: &mut impl Reporter,
    ) -> Result<DeviceImage, UploadError> {
        let staging = scratch.stage(&plan.files).map_err(UploadError::Scratch)?;

        reporter.stage_started(Stage::ImageAssembly);
        let start = Instant::now();
        let image = image::assemble(
            &self.executor,
            mkspiffs,
            &staging,
            plan.partition,
            &scratch.image_path(),
        )?;
        reporter.stage_finished(Stage::ImageAssembly, start.elapsed());

        reporter.stage_started(Stage::Transfer);
        let start = Instant::now();
        flash::transfer(&self.executor, esptool, &plan.port.name, plan.offset, &image)?;
        reporter.stage_finished(Stage::Transfer, start.elapsed());

        Ok(image)
    }
}
