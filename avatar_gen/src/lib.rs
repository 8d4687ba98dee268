use std::{fs, path::Path, path::PathBuf, time::Duration};

use color_eyre::{Result, eyre::eyre};
use engine::{
    DEFAULT_THROTTLE_SECS,
    catalog::Batch,
    image_model::{Imagen, ImagenConfig, Model},
    notice::StdoutNotices,
    runner::{RunSummary, Runner},
};
use log::info;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

pub mod catalogs;

const CONFIG_FILE_NAME: &str = "avatar_gen.ron";

/// Access settings for the Vertex AI project, read from `avatar_gen.ron`
/// in the local config dir.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub project: String,
    /// Bearer token, e.g. from `gcloud auth print-access-token`
    pub access_token: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub model: Model,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_location() -> String {
    "us-central1".into()
}

fn default_throttle_secs() -> u64 {
    DEFAULT_THROTTLE_SECS
}

impl Config {
    pub fn imagen_config(&self) -> ImagenConfig {
        ImagenConfig {
            project: self.project.clone(),
            location: self.location.clone(),
            model: self.model,
            access_token: self.access_token.clone(),
            endpoint: self.endpoint.clone(),
        }
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_secs(self.throttle_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path)?;
    Ok(ron::from_str(&src)?)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join(CONFIG_FILE_NAME))
}

pub fn load_config() -> Result<Option<Config>> {
    let path = config_path()?;
    if !path.exists() {
        Ok(None)
    } else {
        load_ron_file(&path).map(Some)
    }
}

/// Runs one of the embedded batches against the configured project. The
/// output dir of the batch is relative to the working directory.
pub async fn run_batch(batch_src: &str) -> Result<RunSummary> {
    let batch = Batch::from_ron(batch_src)?;
    let path = config_path()?;
    let cfg = load_config()?.ok_or_else(|| {
        eyre!(
            "No config found. Create {} with at least `project` and `access_token`",
            path.display()
        )
    })?;
    info!("Loaded config from {}", path.display());

    let imagen = Imagen::new(cfg.imagen_config());
    let runner = Runner::new(Box::new(imagen))
        .with_throttle(cfg.throttle())
        .with_request_timeout(cfg.request_timeout());

    runner.run(&batch, &mut StdoutNotices).await
}
