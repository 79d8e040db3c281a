// lucidumtool/src/storage/mod.rs
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::primitives::ByteStream;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::S3StorageConfig;
use crate::errors::{AppError, Result};

const S3_SCHEMES: [&str; 3] = ["s3://", "s3n://", "s3a://"];

/// Whether a path refers to object storage rather than the local filesystem.
pub fn is_object_url(path: &str) -> bool {
    S3_SCHEMES.iter().any(|scheme| path.starts_with(scheme))
}

/// Parses an S3 URI (s3://bucket/key) into bucket and key.
pub fn parse_s3_uri(s3_uri: &str) -> Result<(String, String)> {
    let uri = url::Url::parse(s3_uri)?;
    if !matches!(uri.scheme(), "s3" | "s3n" | "s3a") {
        return Err(AppError::Transfer(format!(
            "Not an object storage URI: {s3_uri}"
        )));
    }
    let bucket = uri
        .host_str()
        .ok_or_else(|| AppError::Transfer(format!("S3 URI missing bucket name: {s3_uri}")))?
        .to_string();
    let key = uri.path().trim_start_matches('/').to_string();
    if key.is_empty() {
        return Err(AppError::Transfer(format!(
            "S3 URI missing key (object path): {s3_uri}"
        )));
    }
    Ok((bucket, key))
}

/// Uniform placement operations over a backup artifact, independent of
/// whether its location is a local path or an object-storage URL.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes raw bytes to `dst`.
    async fn write(&self, dst: &str, data: &[u8]) -> Result<()>;

    /// Copies the local file `src` to `dst`.
    async fn copy_file(&self, src: &Path, dst: &str) -> Result<()>;

    /// Pulls the artifact at `src` down to the local path `dst`.
    async fn place_file(&self, src: &str, dst: &Path) -> Result<()>;
}

pub struct LocalStore;

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

#[async_trait]
impl FileStore for LocalStore {
    async fn write(&self, dst: &str, data: &[u8]) -> Result<()> {
        let dst = Path::new(dst);
        ensure_parent_dir(dst).await?;
        tokio::fs::write(dst, data).await?;
        Ok(())
    }

    async fn copy_file(&self, src: &Path, dst: &str) -> Result<()> {
        let dst = Path::new(dst);
        ensure_parent_dir(dst).await?;
        tokio::fs::copy(src, dst).await?;
        Ok(())
    }

    async fn place_file(&self, src: &str, dst: &Path) -> Result<()> {
        ensure_parent_dir(dst).await?;
        tokio::fs::copy(Path::new(src), dst).await?;
        Ok(())
    }
}

/// S3-compatible backend. The SDK client is created lazily on first use and
/// reused for the lifetime of the process.
pub struct S3Store {
    config: Option<S3StorageConfig>,
    client: OnceCell<s3::Client>,
}

impl S3Store {
    pub fn new(config: Option<S3StorageConfig>) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> &s3::Client {
        self.client
            .get_or_init(|| async {
                let sdk_config = match &self.config {
                    Some(cfg) => {
                        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest())
                            .region(Region::new(cfg.region.clone()))
                            .credentials_provider(s3::config::Credentials::new(
                                &cfg.access_key_id,
                                &cfg.secret_access_key,
                                None,
                                None,
                                "Static",
                            ));
                        if let Some(endpoint) = &cfg.endpoint_url {
                            loader = loader.endpoint_url(endpoint);
                        }
                        loader.load().await
                    }
                    None => {
                        aws_config::load_defaults(s3::config::BehaviorVersion::latest()).await
                    }
                };
                s3::Client::new(&sdk_config)
            })
            .await
    }
}

#[async_trait]
impl FileStore for S3Store {
    async fn write(&self, dst: &str, data: &[u8]) -> Result<()> {
        let (bucket, key) = parse_s3_uri(dst)?;
        self.client()
            .await
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| {
                AppError::Transfer(format!("Failed to write object s3://{bucket}/{key}: {e}"))
            })?;
        Ok(())
    }

    async fn copy_file(&self, src: &Path, dst: &str) -> Result<()> {
        let (bucket, key) = parse_s3_uri(dst)?;
        let body = ByteStream::from_path(src).await.map_err(|e| {
            AppError::Transfer(format!(
                "Failed to read upload source {}: {e}",
                src.display()
            ))
        })?;
        self.client()
            .await
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                AppError::Transfer(format!(
                    "Failed to upload {} to s3://{bucket}/{key}: {e}",
                    src.display()
                ))
            })?;
        info!(
            "Uploaded {} to s3://{}/{}",
            src.display(),
            bucket,
            key
        );
        Ok(())
    }

    async fn place_file(&self, src: &str, dst: &Path) -> Result<()> {
        let (bucket, key) = parse_s3_uri(src)?;
        ensure_parent_dir(dst).await?;

        let mut object = self
            .client()
            .await
            .get_object()
            .bucket(&bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                AppError::Transfer(format!("Failed to get object s3://{bucket}/{key}: {e}"))
            })?;

        let mut output_file = tokio::fs::File::create(dst).await?;
        let mut total_bytes = 0usize;
        while let Some(chunk) = object.body.try_next().await.map_err(|e| {
            AppError::Transfer(format!(
                "Failed to stream object s3://{bucket}/{key}: {e}"
            ))
        })? {
            output_file.write_all(&chunk).await?;
            total_bytes += chunk.len();
        }
        output_file.flush().await?;

        info!(
            "Downloaded {} bytes from s3://{}/{} to {}",
            total_bytes,
            bucket,
            key,
            dst.display()
        );
        Ok(())
    }
}

/// Both backends, constructed once at process start. `for_path` dispatches
/// on the URL scheme alone.
pub struct Storage {
    local: LocalStore,
    s3: S3Store,
}

impl Storage {
    pub fn new(s3_config: Option<S3StorageConfig>) -> Self {
        Self {
            local: LocalStore,
            s3: S3Store::new(s3_config),
        }
    }

    pub fn for_path(&self, path: &str) -> &dyn FileStore {
        if is_object_url(path) {
            &self.s3
        } else {
            &self.local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_object_url() {
        assert!(is_object_url("s3://bucket/key"));
        assert!(is_object_url("s3n://bucket/key"));
        assert!(is_object_url("s3a://bucket/key"));
        assert!(!is_object_url("/usr/lucidum/backup/mysql_dump.sql"));
        assert!(!is_object_url("relative/path.sql"));
        assert!(!is_object_url("https://example.com/file"));
    }

    #[test]
    fn test_parse_s3_uri() -> Result<()> {
        let (bucket, key) = parse_s3_uri("s3://backups/lucidum/mysql_dump.sql")?;
        assert_eq!(bucket, "backups");
        assert_eq!(key, "lucidum/mysql_dump.sql");
        Ok(())
    }

    #[test]
    fn test_parse_s3_uri_rejects_missing_key() {
        assert!(parse_s3_uri("s3://backups").is_err());
        assert!(parse_s3_uri("s3://backups/").is_err());
    }

    #[test]
    fn test_parse_s3_uri_rejects_other_schemes() {
        assert!(parse_s3_uri("https://backups/key").is_err());
    }

    #[test]
    fn test_for_path_selects_backend_by_scheme() {
        let storage = Storage::new(None);
        // Pointer identity against the fields is enough to pin the dispatch.
        let local = storage.for_path("/tmp/a.sql") as *const dyn FileStore;
        let s3 = storage.for_path("s3://b/k") as *const dyn FileStore;
        assert!(std::ptr::addr_eq(local, &storage.local));
        assert!(std::ptr::addr_eq(s3, &storage.s3));
    }

    #[tokio::test]
    async fn test_local_store_write_copy_place() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore;

        let written = dir.path().join("nested/out.sql");
        store
            .write(written.to_str().unwrap(), b"-- dump\n")
            .await?;
        assert_eq!(std::fs::read(&written).unwrap(), b"-- dump\n");

        let copied = dir.path().join("copy.sql");
        store.copy_file(&written, copied.to_str().unwrap()).await?;
        assert_eq!(std::fs::read(&copied).unwrap(), b"-- dump\n");

        let placed = dir.path().join("staging/placed.sql");
        store.place_file(copied.to_str().unwrap(), &placed).await?;
        assert_eq!(std::fs::read(&placed).unwrap(), b"-- dump\n");
        Ok(())
    }
}
