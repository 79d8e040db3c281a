// lucidumtool/src/backup/mysql.rs
use anyhow::Result;
use tracing::info;

use crate::context::Context;
use crate::errors::AppError;

/// Dumps the relational database through the running `mysql` container and
/// writes the captured dump to `destination`.
///
/// Credentials travel via the container environment (`MYSQL_PWD`), never on
/// the command line.
pub async fn backup(ctx: &Context, destination: &str) -> Result<()> {
    let db = &ctx.config.db;
    info!("Dumping data for 'mysql' into {destination} file...");

    let user_arg = format!("--user={}", db.user);
    let output = ctx.docker.exec(
        "mysql",
        &["mysqldump", "--no-tablespaces", &user_arg, &db.database],
        &[("MYSQL_PWD", &db.password)],
    )?;
    if !output.status.success() {
        return Err(AppError::from_output("mysqldump", &output).into());
    }

    ctx.storage
        .for_path(destination)
        .write(destination, &output.stdout)
        .await?;
    info!("'mysql' backup data is saved to {destination}");
    Ok(())
}
