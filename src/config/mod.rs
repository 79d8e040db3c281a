// lucidumtool/src/config/mod.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{AppError, Result};

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_WEB_SERVICE: &str = "web";

// Structs for deserializing config.json
#[derive(Debug, Clone, Deserialize)]
pub struct JsonDatabaseConfig {
    pub mysql_host: Option<String>,
    pub mysql_user: Option<String>,
    pub mysql_pwd: Option<String>,
    pub mysql_port: Option<u16>,
    pub mysql_db: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonMongoConfig {
    pub mongo_host: Option<String>,
    pub mongo_user: Option<String>,
    pub mongo_pwd: Option<String>,
    pub mongo_port: Option<u16>,
    pub mongo_db: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonS3StorageConfig {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJsonConfig {
    pub lucidum_dir: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub web_service: Option<String>,
    pub mongo_staging_dir: Option<PathBuf>,
    pub database_config: Option<JsonDatabaseConfig>,
    pub mongo_config: Option<JsonMongoConfig>,
    pub s3_storage: Option<JsonS3StorageConfig>,
}

// Application's internal configuration structs
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub database: String,
}

impl MongoConfig {
    /// A host carrying the SRV prefix selects managed-service connectivity.
    pub fn is_srv(&self) -> bool {
        self.host.starts_with("mongodb+srv://")
    }
}

#[derive(Debug, Clone)]
pub struct S3StorageConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub lucidum_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub web_service: String,
    pub mongo_staging_dir: PathBuf,
    pub db: DbConfig,
    pub mongo: MongoConfig,
    pub s3_storage: Option<S3StorageConfig>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| AppError::Config(format!("Config field is required: {field}")))
}

impl AppConfig {
    /// Resolves the config file path: `LUCIDUM_CONFIG` env var, falling back
    /// to `config.json` next to the working directory.
    pub fn default_path() -> PathBuf {
        env::var("LUCIDUM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read config file at {}: {e}",
                config_path.display()
            ))
        })?;
        let raw: RawJsonConfig = serde_json::from_str(&config_content)?;
        Self::from_raw(raw)
    }

    pub(crate) fn from_raw(raw: RawJsonConfig) -> Result<Self> {
        let lucidum_dir = required(raw.lucidum_dir, "lucidum_dir")?;
        let backup_dir = required(raw.backup_dir, "backup_dir")?;

        let db_raw = required(raw.database_config, "database_config")?;
        let db = DbConfig {
            host: required(db_raw.mysql_host, "database_config.mysql_host")?,
            user: required(db_raw.mysql_user, "database_config.mysql_user")?,
            password: required(db_raw.mysql_pwd, "database_config.mysql_pwd")?,
            port: required(db_raw.mysql_port, "database_config.mysql_port")?,
            database: required(db_raw.mysql_db, "database_config.mysql_db")?,
        };

        let mongo_raw = required(raw.mongo_config, "mongo_config")?;
        let mongo = MongoConfig {
            host: required(mongo_raw.mongo_host, "mongo_config.mongo_host")?,
            user: required(mongo_raw.mongo_user, "mongo_config.mongo_user")?,
            password: required(mongo_raw.mongo_pwd, "mongo_config.mongo_pwd")?,
            port: required(mongo_raw.mongo_port, "mongo_config.mongo_port")?,
            database: required(mongo_raw.mongo_db, "mongo_config.mongo_db")?,
        };

        let s3_storage = raw.s3_storage.and_then(|s3_raw| {
            if let (Some(region), Some(key_id), Some(secret)) = (
                s3_raw.region.as_ref().filter(|s| !s.is_empty()),
                s3_raw.access_key_id.as_ref().filter(|s| !s.is_empty()),
                s3_raw.secret_access_key.as_ref().filter(|s| !s.is_empty()),
            ) {
                Some(S3StorageConfig {
                    region: region.clone(),
                    access_key_id: key_id.clone(),
                    secret_access_key: secret.clone(),
                    endpoint_url: s3_raw.endpoint_url.clone().filter(|s| !s.is_empty()),
                })
            } else {
                if s3_raw.region.is_some()
                    || s3_raw.access_key_id.is_some()
                    || s3_raw.secret_access_key.is_some()
                {
                    tracing::warn!(
                        "s3_storage section is present but incomplete (region, \
                         access_key_id and secret_access_key are required); \
                         falling back to the ambient AWS credential chain"
                    );
                }
                None
            }
        });

        let mongo_staging_dir = raw
            .mongo_staging_dir
            .unwrap_or_else(|| lucidum_dir.join("mongo/db"));

        Ok(AppConfig {
            lucidum_dir,
            backup_dir,
            web_service: raw
                .web_service
                .unwrap_or_else(|| DEFAULT_WEB_SERVICE.to_string()),
            mongo_staging_dir,
            db,
            mongo,
            s3_storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_from(value: serde_json::Value) -> RawJsonConfig {
        serde_json::from_value(value).expect("fixture should deserialize")
    }

    fn full_fixture() -> serde_json::Value {
        json!({
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
        })
    }

    #[test]
    fn test_full_config_loads() -> Result<()> {
        let config = AppConfig::from_raw(raw_from(full_fixture()))?;

        assert_eq!(config.lucidum_dir, PathBuf::from("/usr/lucidum"));
        assert_eq!(config.web_service, "web");
        assert_eq!(config.db.port, 3306);
        assert_eq!(config.mongo.database, "test_database");
        assert_eq!(
            config.mongo_staging_dir,
            PathBuf::from("/usr/lucidum/mongo/db")
        );
        assert!(config.s3_storage.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_mysql_field_fails_fast() {
        let mut fixture = full_fixture();
        fixture["database_config"]
            .as_object_mut()
            .unwrap()
            .remove("mysql_pwd");

        let err = AppConfig::from_raw(raw_from(fixture)).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("database_config.mysql_pwd"));
    }

    #[test]
    fn test_missing_lucidum_dir_fails_fast() {
        let mut fixture = full_fixture();
        fixture.as_object_mut().unwrap().remove("lucidum_dir");

        let err = AppConfig::from_raw(raw_from(fixture)).unwrap_err();
        assert!(err.to_string().contains("lucidum_dir"));
    }

    #[test]
    fn test_complete_s3_section_is_kept() -> Result<()> {
        let mut fixture = full_fixture();
        fixture["s3_storage"] = json!({
            "region": "us-west-1",
            "access_key_id": "AKIA",
            "secret_access_key": "secret",
            "endpoint_url": "https://nyc3.digitaloceanspaces.com"
        });

        let config = AppConfig::from_raw(raw_from(fixture))?;
        let s3 = config.s3_storage.expect("s3 section should be kept");
        assert_eq!(s3.region, "us-west-1");
        assert_eq!(
            s3.endpoint_url.as_deref(),
            Some("https://nyc3.digitaloceanspaces.com")
        );
        Ok(())
    }

    #[test]
    fn test_incomplete_s3_section_is_dropped() -> Result<()> {
        let mut fixture = full_fixture();
        fixture["s3_storage"] = json!({ "region": "us-west-1" });

        let config = AppConfig::from_raw(raw_from(fixture))?;
        assert!(config.s3_storage.is_none());
        Ok(())
    }

    #[test]
    fn test_srv_host_detection() -> Result<()> {
        let mut fixture = full_fixture();
        fixture["mongo_config"]["mongo_host"] =
            json!("mongodb+srv://cluster0.example.mongodb.net");

        let config = AppConfig::from_raw(raw_from(fixture))?;
        assert!(config.mongo.is_srv());

        let local = AppConfig::from_raw(raw_from(full_fixture()))?;
        assert!(!local.mongo.is_srv());
        Ok(())
    }

    #[test]
    fn test_staging_dir_override() -> Result<()> {
        let mut fixture = full_fixture();
        fixture["mongo_staging_dir"] = json!("/var/tmp/mongo-staging");

        let config = AppConfig::from_raw(raw_from(fixture))?;
        assert_eq!(
            config.mongo_staging_dir,
            PathBuf::from("/var/tmp/mongo-staging")
        );
        Ok(())
    }
}
