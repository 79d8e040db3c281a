// lucidumtool/src/context.rs
use crate::config::AppConfig;
use crate::docker::{ComposeCli, DockerCli};
use crate::storage::Storage;

/// Everything a runner needs, constructed once at process start and passed
/// by reference. There is no hidden global state behind this.
pub struct Context {
    pub config: AppConfig,
    pub storage: Storage,
    pub docker: DockerCli,
    pub compose: ComposeCli,
}

impl Context {
    pub fn new(config: AppConfig) -> Self {
        let storage = Storage::new(config.s3_storage.clone());
        let compose = ComposeCli::new(config.lucidum_dir.clone());
        Self {
            config,
            storage,
            docker: DockerCli::new(),
            compose,
        }
    }
}
