// lucidumtool/src/backup/archive.rs
use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tar::Builder;
use tracing::info;
use walkdir::WalkDir;

/// Paths never included in a full-directory artifact, relative to the
/// application root. Single names match that directory at any depth (tar
/// --exclude semantics); entries with a slash match from the root only.
/// The database data directories would duplicate the component dumps that
/// are captured separately.
pub const ARCHIVE_DENY_LIST: [&str; 8] = [
    "update-manager",
    "venv",
    ".venv",
    "__pycache__",
    "tmp",
    "logs",
    "mysql/data",
    "mongo/db",
];

const PID_SUFFIX: &str = ".pid";

fn is_denied(relative: &Path) -> bool {
    for entry in ARCHIVE_DENY_LIST {
        if entry.contains('/') {
            if relative.starts_with(entry) {
                return true;
            }
        } else if relative
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == entry))
        {
            return true;
        }
    }
    relative
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(PID_SUFFIX))
}

/// Creates a GZipped TAR archive of `source_dir` with the deny-list applied.
///
/// Paths inside the archive are relative to `source_dir`. The archive file
/// itself is skipped if it lies inside the tree being archived.
pub fn create_tar_gz_archive(source_dir: &Path, archive_dest_path: &Path) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Source for archival is not a directory: {}",
            source_dir.display()
        ));
    }
    if let Some(parent) = archive_dest_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Failed to create parent directory for archive: {}",
                    parent.display()
                )
            })?;
        }
    }

    info!(
        "Creating tar.gz archive from {} to {}",
        source_dir.display(),
        archive_dest_path.display()
    );

    let archive_file = File::create(archive_dest_path).with_context(|| {
        format!(
            "Failed to create archive file: {}",
            archive_dest_path.display()
        )
    })?;
    let enc = GzEncoder::new(archive_file, Compression::default());
    let mut tar_builder = Builder::new(enc);

    let walker = WalkDir::new(source_dir).into_iter().filter_entry(|entry| {
        entry
            .path()
            .strip_prefix(source_dir)
            .map(|relative| !is_denied(relative))
            .unwrap_or(true)
    });

    for entry in walker {
        let entry =
            entry.with_context(|| format!("Failed to walk directory: {}", source_dir.display()))?;
        let path = entry.path();
        if path == archive_dest_path {
            continue;
        }
        let name = path.strip_prefix(source_dir).with_context(|| {
            format!(
                "Failed to strip prefix {} from {}",
                source_dir.display(),
                path.display()
            )
        })?;

        if name.as_os_str().is_empty() {
            // Skip the root directory itself
            continue;
        }

        if path.is_dir() {
            tar_builder.append_dir(name, path).with_context(|| {
                format!("Failed to append directory {} to archive", path.display())
            })?;
        } else if path.is_file() {
            tar_builder.append_path_with_name(path, name).with_context(|| {
                format!(
                    "Failed to append file {} as {} to archive",
                    path.display(),
                    name.display()
                )
            })?;
        }
    }

    let encoder = tar_builder.into_inner().with_context(|| {
        format!(
            "Failed to get inner encoder from tar builder for archive: {}",
            archive_dest_path.display()
        )
    })?;

    encoder.finish().with_context(|| {
        format!(
            "Failed to finish Gzip encoding for archive: {}",
            archive_dest_path.display()
        )
    })?;

    info!(
        "Tar.gz archive created successfully at {}",
        archive_dest_path.display()
    );
    Ok(archive_dest_path.to_path_buf())
}

/// Extracts a GZipped TAR archive over `extract_to_dir`.
pub fn extract_tar_gz_archive(archive_path: &Path, extract_to_dir: &Path) -> Result<PathBuf> {
    if !archive_path.is_file() {
        return Err(anyhow::anyhow!(
            "Archive for extraction is not a file: {}",
            archive_path.display()
        ));
    }

    if !extract_to_dir.exists() {
        std::fs::create_dir_all(extract_to_dir).with_context(|| {
            format!(
                "Failed to create extraction directory: {}",
                extract_to_dir.display()
            )
        })?;
    } else if !extract_to_dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Extraction path exists but is not a directory: {}",
            extract_to_dir.display()
        ));
    }

    info!(
        "Extracting tar.gz archive from {} to {}",
        archive_path.display(),
        extract_to_dir.display()
    );

    let archive_file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive file: {}", archive_path.display()))?;
    let gz_decoder = flate2::read::GzDecoder::new(archive_file);
    let mut archive = tar::Archive::new(gz_decoder);

    archive.unpack(extract_to_dir).with_context(|| {
        format!(
            "Failed to unpack archive {} to {}",
            archive_path.display(),
            extract_to_dir.display()
        )
    })?;

    Ok(extract_to_dir.to_path_buf())
}
