//! Build result types.

use std::path::PathBuf;
use std::time::Duration;

/// Status of a single build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Output written
    Success,
    /// Output already up to date, or nothing to build
    Skipped,
    /// Build failed with error
    Failed(String),
}

impl BuildStatus {
    /// Success or skipped.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Skipped)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failed(_))
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Skipped => write!(f, "skipped"),
            BuildStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of building a single target.
#[derive(Debug, Clone)]
pub struct TargetResult {
    /// Target ID, e.g. "package:main"
    pub target_id: String,
    pub status: BuildStatus,
    /// Files written
    pub outputs: Vec<PathBuf>,
    pub duration: Duration,
    /// Non-fatal problems, such as sprite rules that could not be resolved
    pub warnings: Vec<String>,
}

impl TargetResult {
    pub fn success(target_id: impl Into<String>, outputs: Vec<PathBuf>, duration: Duration) -> Self {
        Self::with_status(target_id.into(), BuildStatus::Success, outputs, duration)
    }

    pub fn skipped(target_id: impl Into<String>) -> Self {
        Self::with_status(target_id.into(), BuildStatus::Skipped, vec![], Duration::ZERO)
    }

    pub fn failed(target_id: impl Into<String>, error: impl ToString, duration: Duration) -> Self {
        Self::with_status(target_id.into(), BuildStatus::Failed(error.to_string()), vec![], duration)
    }

    fn with_status(
        target_id: String,
        status: BuildStatus,
        outputs: Vec<PathBuf>,
        duration: Duration,
    ) -> Self {
        Self { target_id, status, outputs, duration, warnings: vec![] }
    }

    /// Attach warnings to the result.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each target, in build order
    pub targets: Vec<TargetResult>,
    pub total_duration: Duration,
}

impl BuildResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: TargetResult) {
        self.targets.push(result);
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    fn count(&self, pred: impl Fn(&BuildStatus) -> bool) -> usize {
        self.targets.iter().filter(|r| pred(&r.status)).count()
    }

    pub fn success_count(&self) -> usize {
        self.count(|s| *s == BuildStatus::Success)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|s| *s == BuildStatus::Skipped)
    }

    pub fn failed_count(&self) -> usize {
        self.count(BuildStatus::is_failure)
    }

    /// No target failed.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.targets.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    pub fn all_warnings(&self) -> Vec<&String> {
        self.targets.iter().flat_map(|r| r.warnings.iter()).collect()
    }

    pub fn failures(&self) -> Vec<&TargetResult> {
        self.targets.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Human-readable summary for the CLI.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let (success, skipped, failed) =
            (self.success_count(), self.skipped_count(), self.failed_count());
        let total = self.targets.len();

        if failed > 0 {
            lines.push(format!(
                "Build failed: {} built, {} skipped, {} failed ({} total)",
                success, skipped, failed, total
            ));
            for target in self.failures() {
                lines.push(format!("  - {}: {}", target.target_id, target.status));
            }
        } else {
            lines.push(format!(
                "Build succeeded: {} built, {} skipped ({} total) in {:?}",
                success, skipped, total, self.total_duration
            ));
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}):", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}
