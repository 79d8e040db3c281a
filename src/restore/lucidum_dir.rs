// lucidumtool/src/restore/lucidum_dir.rs
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use super::{mysql, stage_local};
use crate::backup::extract_tar_gz_archive;
use crate::context::Context;
use crate::docker::ServiceGuard;
use crate::errors::AppError;
use crate::mongo;
use crate::utils::temp::{TempArtifact, remove_if_exists};

const MYSQL_DUMP_PREFIX: &str = "mysql_dump_";
const MYSQL_DUMP_SUFFIX: &str = ".sql";
const MONGO_DUMP_PREFIX: &str = "mongo_dump_";
const MONGO_DUMP_SUFFIX: &str = ".gz";

/// Finds the first file in `dir` whose name matches `prefix`*`suffix`.
fn find_file_by_pattern(dir: &Path, prefix: &str, suffix: &str) -> crate::errors::Result<PathBuf> {
    let entries = std::fs::read_dir(dir)?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(prefix) && name.ends_with(suffix) && entry.path().is_file() {
            return Ok(entry.path());
        }
    }
    Err(AppError::ArtifactNotFound(format!(
        "File with '{prefix}*{suffix}' pattern was not found in '{}' directory",
        dir.display()
    )))
}

/// Restores the full application directory from a tar.gz artifact.
///
/// The dependent web service is quiesced exactly once here, spanning
/// extraction and both embedded component restores, and is restarted on
/// every exit path. The embedded dumps are deleted independently once the
/// runner finishes, success or not.
pub async fn restore(ctx: &Context, artifact: &str) -> Result<()> {
    let lucidum_dir = ctx.config.lucidum_dir.clone();
    let (local_archive, _staged) = stage_local(ctx, "lucidum", artifact).await?;
    info!(
        "Restoring data for 'lucidum' from '{}' file...",
        local_archive.display()
    );

    let _web = ServiceGuard::stop(&ctx.compose, &ctx.config.web_service)?;

    debug!("transforming: extracting archive over {}", lucidum_dir.display());
    if let Err(error) = extract_tar_gz_archive(&local_archive, &lucidum_dir) {
        // Report whatever dumps the partial extraction produced, then
        // surface the extraction error itself.
        for (prefix, suffix) in [
            (MYSQL_DUMP_PREFIX, MYSQL_DUMP_SUFFIX),
            (MONGO_DUMP_PREFIX, MONGO_DUMP_SUFFIX),
        ] {
            match find_file_by_pattern(&lucidum_dir, prefix, suffix) {
                Ok(found) => {
                    warn!(
                        "Extraction failed after producing {}; removing it",
                        found.display()
                    );
                    remove_if_exists(&found);
                }
                Err(e) => warn!("{e}"),
            }
        }
        return Err(error);
    }

    let mysql_dump = find_file_by_pattern(&lucidum_dir, MYSQL_DUMP_PREFIX, MYSQL_DUMP_SUFFIX)?;
    let mongo_dump = find_file_by_pattern(&lucidum_dir, MONGO_DUMP_PREFIX, MONGO_DUMP_SUFFIX)?;
    let _mysql_cleanup = TempArtifact::new(mysql_dump.clone());
    let _mongo_cleanup = TempArtifact::new(mongo_dump.clone());

    mysql::restore(ctx, &mysql_dump).await?;
    // Quiescence is owned here, so the embedded mongo restore must not
    // bounce the service again.
    mongo::restore(ctx, "mongo", &mongo_dump, false).await?;

    info!(
        "'lucidum' data was restored from '{}' file",
        local_archive.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_file_by_pattern() -> crate::errors::Result<()> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mysql_dump_20240131_154500.sql"), b"sql").unwrap();
        fs::write(dir.path().join("mongo_dump_20240131_154500.gz"), b"gz").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let found = find_file_by_pattern(dir.path(), MYSQL_DUMP_PREFIX, MYSQL_DUMP_SUFFIX)?;
        assert!(found.to_string_lossy().ends_with("mysql_dump_20240131_154500.sql"));

        let found = find_file_by_pattern(dir.path(), MONGO_DUMP_PREFIX, MONGO_DUMP_SUFFIX)?;
        assert!(found.to_string_lossy().ends_with("mongo_dump_20240131_154500.gz"));
        Ok(())
    }

    #[test]
    fn test_find_file_by_pattern_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_file_by_pattern(dir.path(), MYSQL_DUMP_PREFIX, MYSQL_DUMP_SUFFIX).unwrap_err();
        assert!(matches!(err, AppError::ArtifactNotFound(_)));
        assert!(err.to_string().contains("mysql_dump_*.sql"));
    }

    #[test]
    fn test_find_file_by_pattern_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("mysql_dump_dir.sql")).unwrap();
        assert!(find_file_by_pattern(dir.path(), MYSQL_DUMP_PREFIX, MYSQL_DUMP_SUFFIX).is_err());
    }
}
