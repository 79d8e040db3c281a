// lucidumtool/src/backup/lucidum_dir.rs
use anyhow::{Context as _, Result};
use tracing::{debug, info};
use uuid::Uuid;

use super::{archive, mysql};
use crate::context::Context;
use crate::mongo::{self, DumpOptions};
use crate::utils::temp::TempArtifact;
use crate::utils::timestamped_file_name;

/// Backs up the full application directory into a tar.gz artifact at
/// `destination`.
///
/// The relational and document dumps are first produced into the
/// application root so they travel inside the archive; the deny-list keeps
/// the live database data directories out. All three local intermediates
/// (both dumps and the staged tarball) are removed on every exit path,
/// each independently.
pub async fn backup(ctx: &Context, destination: &str) -> Result<()> {
    let lucidum_dir = &ctx.config.lucidum_dir;
    info!("Dumping data for 'lucidum' into {destination} file...");

    debug!("staging component dumps into {}", lucidum_dir.display());
    let mysql_dump = lucidum_dir.join(timestamped_file_name("mysql_dump", "sql"));
    let mongo_dump = lucidum_dir.join(timestamped_file_name("mongo_dump", "gz"));
    let _mysql_cleanup = TempArtifact::new(mysql_dump.clone());
    let _mongo_cleanup = TempArtifact::new(mongo_dump.clone());

    mysql::backup(ctx, &mysql_dump.to_string_lossy()).await?;
    mongo::dump(
        ctx,
        "mongo",
        &mongo_dump.to_string_lossy(),
        &DumpOptions::default(),
    )
    .await?;

    debug!("transforming application root into tarball");
    std::fs::create_dir_all(&ctx.config.backup_dir).with_context(|| {
        format!(
            "Failed to create backup directory: {}",
            ctx.config.backup_dir.display()
        )
    })?;
    let staged_tarball = ctx
        .config
        .backup_dir
        .join(format!("{}_lucidum.tar.gz", Uuid::new_v4()));
    let _tarball_cleanup = TempArtifact::new(staged_tarball.clone());
    archive::create_tar_gz_archive(lucidum_dir, &staged_tarball)?;

    debug!("transferring tarball to {destination}");
    ctx.storage
        .for_path(destination)
        .copy_file(&staged_tarball, destination)
        .await?;

    info!("'lucidum' backup data is saved to {destination}");
    Ok(())
}
