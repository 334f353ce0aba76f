//! Serialized org install execution.
//!
//! Salesforce processes metadata operations per org behind a lock, so
//! firing installs in parallel trades queue position for contention
//! errors. The queue runs one plan step at a time in order, polling
//! each asynchronous install request until it finishes or the wait
//! deadline passes.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::core::{PackageVersion, ReleaseDefinition};
use crate::ops::plan::{InstallPlan, PlanStep, StepAction};
use crate::org::{InstallStatus, OrgClient};
use crate::util::diagnostic::InstallTimeoutError;

/// Single-concurrency install executor.
pub struct InstallQueue<'a> {
    client: &'a dyn OrgClient,
    release: Option<&'a ReleaseDefinition>,
    wait: Duration,
    poll: Duration,
    keep_going: bool,
    verbose: bool,
}

impl<'a> InstallQueue<'a> {
    pub fn new(client: &'a dyn OrgClient) -> Self {
        InstallQueue {
            client,
            release: None,
            wait: Duration::from_secs(30 * 60),
            poll: Duration::from_secs(30),
            keep_going: false,
            verbose: false,
        }
    }

    /// Take installation keys from a release definition.
    pub fn release(mut self, release: Option<&'a ReleaseDefinition>) -> Self {
        self.release = release;
        self
    }

    /// Set the per-install wait deadline and poll interval.
    pub fn timing(mut self, wait_mins: u64, poll_secs: u64) -> Self {
        self.wait = Duration::from_secs(wait_mins * 60);
        self.poll = Duration::from_secs(poll_secs);
        self
    }

    /// Continue past failed steps instead of stopping at the first.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute a plan's pending steps strictly in order.
    ///
    /// `root` anchors relative source directory paths. Unresolved steps
    /// abort up front; they can never succeed, so `--keep-going` does
    /// not apply to them.
    pub fn run(&self, plan: &InstallPlan, root: &Path) -> Result<InstallReport> {
        if let Some(step) = plan.unresolved().first() {
            bail!(
                "cannot install `{}`: the plan has unresolved steps, run `quay plan` for details",
                step.package
            );
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let pending = plan.pending();

        if self.verbose {
            let installs = pending
                .iter()
                .filter(|s| matches!(s.action, StepAction::InstallSubscriber { .. }))
                .count();
            let deploys = pending
                .iter()
                .filter(|s| matches!(s.action, StepAction::DeploySource { .. }))
                .count();
            eprintln!("  Installing {} package(s)", installs);
            eprintln!("   Deploying {} source dir(s)", deploys);
        }

        let pb = if !self.verbose && pending.len() > 1 {
            let pb = ProgressBar::new(pending.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut results = Vec::new();
        for step in &plan.steps {
            if let Some(reason) = &step.skip {
                if self.verbose {
                    eprintln!("    Skipping {} ({})", step.label(), reason);
                }
                results.push(StepResult {
                    package: step.package.clone(),
                    version: step.version.clone(),
                    status: StepStatus::Skipped,
                    request_id: None,
                    duration_secs: 0.0,
                    message: Some(reason.to_string()),
                });
                continue;
            }

            if let Some(pb) = &pb {
                pb.set_message(step.label());
            }

            let step_start = Instant::now();
            let outcome = self.run_step(step, root);
            let duration_secs = step_start.elapsed().as_secs_f64();

            match outcome {
                Ok((status, request_id)) => results.push(StepResult {
                    package: step.package.clone(),
                    version: step.version.clone(),
                    status,
                    request_id,
                    duration_secs,
                    message: None,
                }),
                Err(err) => {
                    if !self.keep_going {
                        if let Some(pb) = pb {
                            pb.finish_and_clear();
                        }
                        return Err(err);
                    }

                    let timeout = err.downcast_ref::<InstallTimeoutError>();
                    let status = if timeout.is_some() {
                        StepStatus::TimedOut
                    } else {
                        StepStatus::Failed
                    };
                    tracing::warn!(
                        package = %step.package,
                        error = %format_args!("{:#}", err),
                        "step failed, continuing"
                    );
                    results.push(StepResult {
                        package: step.package.clone(),
                        version: step.version.clone(),
                        status,
                        request_id: timeout.map(|e| e.request_id.clone()),
                        duration_secs,
                        message: Some(format!("{:#}", err)),
                    });
                }
            }

            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        let elapsed = start.elapsed();
        eprintln!(
            "    Finished {} step(s) in {:.2}s",
            results.len(),
            elapsed.as_secs_f64()
        );

        Ok(InstallReport {
            org: self.client.org().to_string(),
            started_at,
            finished_at: Utc::now(),
            steps: results,
        })
    }

    fn run_step(&self, step: &PlanStep, root: &Path) -> Result<(StepStatus, Option<String>)> {
        match &step.action {
            StepAction::InstallSubscriber { subscriber_id } => {
                if self.verbose {
                    eprintln!("  Installing {} [{}]", step.label(), subscriber_id);
                }
                let key = self
                    .release
                    .and_then(|r| r.installation_key(&step.package));
                let request_id = self
                    .client
                    .start_install(subscriber_id, key)
                    .with_context(|| format!("failed to start install of `{}`", step.package))?;
                tracing::debug!(
                    package = %step.package,
                    request = %request_id,
                    "install request started"
                );
                self.await_install(&step.package, &request_id)?;
                Ok((StepStatus::Installed, Some(request_id)))
            }
            StepAction::DeploySource { path } => {
                if self.verbose {
                    eprintln!("   Deploying {}", path.display());
                }
                self.client
                    .deploy_source(&root.join(path))
                    .with_context(|| format!("failed to deploy `{}`", path.display()))?;
                Ok((StepStatus::Deployed, None))
            }
            StepAction::Unresolved { reason } => {
                bail!("cannot install `{}`: {}", step.package, reason)
            }
        }
    }

    /// Poll one install request until it reaches a terminal status.
    fn await_install(&self, package: &str, request_id: &str) -> Result<()> {
        let start = Instant::now();
        loop {
            let status = self
                .client
                .install_status(request_id)
                .with_context(|| format!("failed to poll install request `{}`", request_id))?;
            match status {
                InstallStatus::Succeeded => return Ok(()),
                InstallStatus::Failed(message) => {
                    bail!("install of `{}` failed: {}", package, message)
                }
                InstallStatus::Queued | InstallStatus::InProgress => {}
            }

            if start.elapsed() >= self.wait {
                return Err(InstallTimeoutError {
                    package: package.to_string(),
                    request_id: request_id.to_string(),
                    waited_secs: start.elapsed().as_secs(),
                }
                .into());
            }
            std::thread::sleep(self.poll);
        }
    }
}

/// Outcome of an install run.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub org: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepResult>,
}

impl InstallReport {
    pub fn succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn installed_count(&self) -> usize {
        self.count(StepStatus::Installed)
    }

    pub fn deployed_count(&self) -> usize {
        self.count(StepStatus::Deployed)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(StepStatus::Skipped)
    }

    pub fn failure_count(&self) -> usize {
        self.count(StepStatus::Failed) + self.count(StepStatus::TimedOut)
    }

    fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// One-line summary for command output.
    pub fn summary(&self) -> String {
        format!(
            "installed {}, deployed {}, skipped {}, failed {}",
            self.installed_count(),
            self.deployed_count(),
            self.skipped_count(),
            self.failure_count()
        )
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<PackageVersion>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Installed,
    Deployed,
    Skipped,
    Failed,
    TimedOut,
}
