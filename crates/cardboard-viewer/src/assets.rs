//! Font and icon loading.
//!
//! Locations are either `http(s)://` URLs or filesystem paths. Decoding
//! happens off the event-loop thread; only finished rasters are handed back.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use cardboard_engine::raster::{rasterize_svg, SvgError, SvgRaster};
use cardboard_engine::text::{FontLoadError, LabelFont};

use crate::config::AssetConfig;
use crate::scene::ICON_PX_PER_UNIT;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Placeholder replaced by the icon id in the icon template.
pub const ICON_PLACEHOLDER: &str = "{icon}";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Font(#[from] FontLoadError),

    #[error("icon {icon}: {source}")]
    Svg {
        icon: String,
        #[source]
        source: SvgError,
    },

    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Fetches and decodes viewer assets.
///
/// Cheap to clone; clones share one HTTP connection pool.
#[derive(Clone)]
pub struct AssetLoader {
    http: reqwest::Client,
    config: AssetConfig,
}

impl AssetLoader {
    pub fn new(config: AssetConfig) -> Result<Self, AssetError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(AssetError::Client)?;
        Ok(Self { http, config })
    }

    /// Resolves an icon id such as `System/time` to its location.
    pub fn icon_location(&self, icon: &str) -> String {
        self.config.icon_template.replace(ICON_PLACEHOLDER, icon)
    }

    /// Reads raw bytes from a URL or a filesystem path.
    pub async fn fetch(&self, location: &str) -> Result<Vec<u8>, AssetError> {
        if is_remote(location) {
            let response = self
                .http
                .get(location)
                .send()
                .await
                .map_err(|source| AssetError::Request { url: location.to_string(), source })?;

            let status = response.status();
            if !status.is_success() {
                return Err(AssetError::Status {
                    url: location.to_string(),
                    status: status.as_u16(),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|source| AssetError::Request { url: location.to_string(), source })?;
            Ok(bytes.to_vec())
        } else {
            tokio::fs::read(location).await.map_err(|source| AssetError::Io {
                path: PathBuf::from(location),
                source,
            })
        }
    }

    pub async fn load_font(&self) -> Result<LabelFont, AssetError> {
        let bytes = self.fetch(&self.config.font).await?;
        log::debug!("font fetched ({} bytes) from {}", bytes.len(), self.config.font);
        let font = tokio::task::spawn_blocking(move || LabelFont::from_bytes(&bytes)).await??;
        Ok(font)
    }

    pub async fn load_icon(&self, icon: &str) -> Result<SvgRaster, AssetError> {
        let location = self.icon_location(icon);
        let bytes = self.fetch(&location).await?;
        log::debug!("icon {icon} fetched ({} bytes)", bytes.len());

        let raster =
            tokio::task::spawn_blocking(move || rasterize_svg(&bytes, ICON_PX_PER_UNIT)).await?;
        raster.map_err(|source| AssetError::Svg { icon: icon.to_string(), source })
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}
