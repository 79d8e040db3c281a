mod lucidum_dir;
mod mysql;

use std::path::PathBuf;

use anyhow::Result;
use tracing::error;
use uuid::Uuid;

use crate::batch::{Outcome, Target};
use crate::context::Context;
use crate::errors::AppError;
use crate::mongo;
use crate::storage::is_object_url;
use crate::utils::temp::TempArtifact;

/// Makes an artifact available on the local filesystem, pulling it down
/// from object storage into a uniquely named staging file when needed. The
/// returned guard (if any) deletes the staged copy when dropped.
async fn stage_local(
    ctx: &Context,
    name: &str,
    artifact: &str,
) -> Result<(PathBuf, Option<TempArtifact>)> {
    if is_object_url(artifact) {
        let file_name = artifact.rsplit('/').next().unwrap_or("artifact");
        std::fs::create_dir_all(&ctx.config.backup_dir)?;
        let staged = ctx
            .config
            .backup_dir
            .join(format!("{}_{file_name}", Uuid::new_v4()));
        ctx.storage
            .for_path(artifact)
            .place_file(artifact, &staged)
            .await?;
        Ok((staged.clone(), Some(TempArtifact::new(staged))))
    } else {
        let path = PathBuf::from(artifact);
        if !path.is_file() {
            return Err(AppError::ArtifactNotFound(format!(
                "'{artifact}' backup file for '{name}' restoring does not exist"
            ))
            .into());
        }
        Ok((path, None))
    }
}

async fn restore_target(ctx: &Context, target: Target, artifact: &str) -> Result<()> {
    match target {
        Target::Mysql => {
            let (local, _staged) = stage_local(ctx, target.name(), artifact).await?;
            mysql::restore(ctx, &local).await
        }
        Target::Mongo => {
            let (local, _staged) = stage_local(ctx, target.name(), artifact).await?;
            mongo::restore(ctx, target.name(), &local, true).await
        }
        Target::Lucidum => lucidum_dir::restore(ctx, artifact).await,
    }
}

/// Runs every requested (target, artifact) restore in order. Each target's
/// failure is recorded as its own outcome; the batch is never aborted by a
/// single failure.
pub async fn run_restore_flow(ctx: &Context, pairs: &[(String, String)]) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(pairs.len());
    for (name, artifact) in pairs {
        let result = match Target::from_name(name) {
            Ok(target) => restore_target(ctx, target, artifact).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => outcomes.push(Outcome::success(name, "Restored successfully")),
            Err(e) => {
                error!("Restore of '{name}' failed: {e:#}");
                outcomes.push(Outcome::failed(name, format!("{e:#}")));
            }
        }
    }
    outcomes
}
