// lucidumtool/src/restore/mysql.rs
use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::context::Context;
use crate::errors::AppError;

const CONTAINER_DEST_DIR: &str = "/home";

/// Restores the relational database from a local SQL dump.
///
/// The dump is transferred into the `mysql` container, fed to the client
/// there (credentials via container env), and the in-container copy is
/// removed whether or not the load succeeded.
pub async fn restore(ctx: &Context, filepath: &Path) -> Result<()> {
    if !filepath.is_file() {
        return Err(AppError::ArtifactNotFound(format!(
            "'{}' backup file for 'mysql' restoring does not exist",
            filepath.display()
        ))
        .into());
    }
    info!("Restoring data for 'mysql' from '{}' file...", filepath.display());

    ctx.docker.copy_into(filepath, "mysql", CONTAINER_DEST_DIR)?;
    let file_name = filepath
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let container_path = format!("{CONTAINER_DEST_DIR}/{file_name}");

    let db = &ctx.config.db;
    let script = format!("mysql --user={} {} < {container_path}", db.user, db.database);
    let result: Result<()> = (|| {
        let output = ctx
            .docker
            .shell_exec("mysql", &script, &[("MYSQL_PWD", &db.password)])?;
        if !output.status.success() {
            return Err(AppError::from_output("mysql", &output).into());
        }
        Ok(())
    })();
    // The staged copy inside the container goes away on both paths.
    ctx.docker.remove_in_container("mysql", &container_path);
    result?;

    info!("'mysql' data was restored from '{}' file", filepath.display());
    Ok(())
}
