pub(crate) mod archive;
mod lucidum_dir;
mod mysql;

pub use archive::extract_tar_gz_archive;

use anyhow::Result;
use tracing::error;

use crate::batch::{Outcome, RunnerContext, Target};
use crate::config::AppConfig;
use crate::context::Context;
use crate::errors::AppError;
use crate::mongo::{self, DumpOptions};
use crate::utils::timestamped_file_name;

/// One batch of backup work, as requested on the command line.
#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub targets: Vec<Target>,
    pub destination: Option<String>,
    pub collection: Option<String>,
    pub exclude_collections: Vec<String>,
}

fn default_destination(config: &AppConfig, target: Target) -> String {
    let (prefix, extension) = match target {
        Target::Mysql => ("mysql_dump", "sql"),
        Target::Mongo => ("mongo_dump", "gz"),
        Target::Lucidum => ("lucidum", "tar.gz"),
    };
    config
        .backup_dir
        .join(timestamped_file_name(prefix, extension))
        .to_string_lossy()
        .into_owned()
}

fn runner_contexts(
    config: &AppConfig,
    request: &BackupRequest,
) -> crate::errors::Result<Vec<RunnerContext>> {
    let targets = if request.targets.is_empty() {
        vec![Target::Lucidum]
    } else {
        request.targets.clone()
    };

    if request.destination.is_some() && targets.len() > 1 {
        return Err(AppError::Config(
            "--destination applies to a single target; with multiple targets each one \
             gets its timestamped default"
                .to_string(),
        ));
    }

    Ok(targets
        .into_iter()
        .map(|target| RunnerContext {
            target,
            destination: request
                .destination
                .clone()
                .unwrap_or_else(|| default_destination(config, target)),
            collection: request.collection.clone(),
            exclude_collections: request.exclude_collections.clone(),
        })
        .collect())
}

async fn backup_target(ctx: &Context, runner: &RunnerContext) -> Result<()> {
    match runner.target {
        Target::Mysql => mysql::backup(ctx, &runner.destination).await,
        Target::Mongo => {
            let options = DumpOptions {
                collection: runner.collection.clone(),
                exclude_collections: runner.exclude_collections.clone(),
                ..DumpOptions::default()
            };
            mongo::dump(ctx, "mongo", &runner.destination, &options).await
        }
        Target::Lucidum => lucidum_dir::backup(ctx, &runner.destination).await,
    }
}

/// Runs every requested backup target in order, catching failures per
/// target so one broken component does not abort the batch.
pub async fn run_backup_flow(ctx: &Context, request: &BackupRequest) -> Result<Vec<Outcome>> {
    let runners = runner_contexts(&ctx.config, request)?;

    let mut outcomes = Vec::with_capacity(runners.len());
    for runner in &runners {
        match backup_target(ctx, runner).await {
            Ok(()) => outcomes.push(Outcome::success(
                runner.target.name(),
                format!("Saved to {}", runner.destination),
            )),
            Err(e) => {
                error!("Backup of '{}' failed: {e:#}", runner.target);
                outcomes.push(Outcome::failed(runner.target.name(), format!("{e:#}")));
            }
        }
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let fixture = serde_json::json!({
            "lucidum_dir": "/usr/lucidum",
            "backup_dir": "/usr/lucidum/backup",
            "database_config": {
                "mysql_host": "mysql",
                "mysql_user": "root",
                "mysql_pwd": "secret",
                "mysql_port": 3306,
                "mysql_db": "lucidum"
            },
            "mongo_config": {
                "mongo_host": "mongo",
                "mongo_user": "admin",
                "mongo_pwd": "secret",
                "mongo_port": 27017,
                "mongo_db": "test_database"
            }
        });
        let raw = serde_json::from_value(fixture).unwrap();
        AppConfig::from_raw(raw).unwrap()
    }

    fn request(targets: Vec<Target>, destination: Option<&str>) -> BackupRequest {
        BackupRequest {
            targets,
            destination: destination.map(str::to_string),
            collection: None,
            exclude_collections: vec![],
        }
    }

    #[test]
    fn test_default_targets_fall_back_to_full_directory() {
        let runners = runner_contexts(&test_config(), &request(vec![], None)).unwrap();

        assert_eq!(runners.len(), 1);
        assert_eq!(runners[0].target, Target::Lucidum);
        assert!(runners[0].destination.starts_with("/usr/lucidum/backup/lucidum_"));
        assert!(runners[0].destination.ends_with(".tar.gz"));
    }

    #[test]
    fn test_explicit_destination_single_target() {
        let runners = runner_contexts(
            &test_config(),
            &request(vec![Target::Mysql], Some("s3://backups/out.sql")),
        )
        .unwrap();

        assert_eq!(runners[0].destination, "s3://backups/out.sql");
    }

    #[test]
    fn test_explicit_destination_rejected_for_multiple_targets() {
        let err = runner_contexts(
            &test_config(),
            &request(vec![Target::Mysql, Target::Mongo], Some("/tmp/out.sql")),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_each_target_gets_its_own_default() {
        let mut req = request(vec![Target::Mysql, Target::Mongo], None);
        req.collection = Some("assets".to_string());
        req.exclude_collections = vec!["audit_log".to_string()];

        let runners = runner_contexts(&test_config(), &req).unwrap();
        assert!(runners[0].destination.contains("mysql_dump_"));
        assert!(runners[1].destination.contains("mongo_dump_"));
        assert_eq!(runners[1].collection.as_deref(), Some("assets"));
        assert_eq!(runners[1].exclude_collections, vec!["audit_log"]);
    }
}
