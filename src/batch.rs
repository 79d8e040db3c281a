// lucidumtool/src/batch.rs
use std::fmt;

use crate::errors::{AppError, Result};

/// The closed set of backupable/restorable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    /// Relational database (mysql container)
    Mysql,
    /// Document database
    Mongo,
    /// Full application directory
    Lucidum,
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Target::Mysql => "mysql",
            Target::Mongo => "mongo",
            Target::Lucidum => "lucidum",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "mysql" => Ok(Target::Mysql),
            "mongo" => Ok(Target::Mongo),
            "lucidum" => Ok(Target::Lucidum),
            other => Err(AppError::Config(format!(
                "Unknown target '{other}' (expected mysql, mongo or lucidum)"
            ))),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-invocation runner inputs, built fresh for every target in a batch.
#[derive(Debug, Clone)]
pub struct RunnerContext {
    pub target: Target,
    /// Final artifact location: explicit, or the timestamped default.
    pub destination: String,
    pub collection: Option<String>,
    pub exclude_collections: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => f.write_str("success"),
            OutcomeStatus::Failed => f.write_str("failed"),
        }
    }
}

/// One per target per batch, created after the runner returns or errors.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub target: String,
    pub status: OutcomeStatus,
    pub message: String,
}

impl Outcome {
    pub fn success(target: &str, message: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            status: OutcomeStatus::Success,
            message: message.into(),
        }
    }

    pub fn failed(target: &str, message: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            status: OutcomeStatus::Failed,
            message: message.into(),
        }
    }
}

/// One human-readable line per target, for the whole batch.
pub fn render_summary(outcomes: &[Outcome]) -> String {
    outcomes
        .iter()
        .map(|o| format!("{} ({}): {}", o.target, o.status, o.message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn any_failed(outcomes: &[Outcome]) -> bool {
    outcomes.iter().any(|o| o.status == OutcomeStatus::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_names_round_trip() -> Result<()> {
        for target in [Target::Mysql, Target::Mongo, Target::Lucidum] {
            assert_eq!(Target::from_name(target.name())?, target);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_target_is_config_error() {
        let err = Target::from_name("postgres").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_render_summary_lines() {
        let outcomes = vec![
            Outcome::failed("mysql", "mysqldump exited with exit status: 2"),
            Outcome::success("mongo", "Backed up successfully"),
        ];

        let summary = render_summary(&outcomes);
        assert_eq!(
            summary,
            "mysql (failed): mysqldump exited with exit status: 2\n\
             mongo (success): Backed up successfully"
        );
        assert!(any_failed(&outcomes));
    }

    #[test]
    fn test_all_success_batch() {
        let outcomes = vec![Outcome::success("lucidum", "Backed up successfully")];
        assert!(!any_failed(&outcomes));
    }
}
