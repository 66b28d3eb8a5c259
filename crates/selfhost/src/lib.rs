//! Self-hosting for Font Awesome kits.
//!
//! Given a READY [`KitBuild`], [`SelfHosting::download_and_prepare`] fetches
//! the kit's metadata and archive, reshapes the archive into a layout that
//! can be served as static files, and publishes it to
//! `<base>/fontawesome-kit/<kit token>/<build id>`.
//!
//! ```ignore
//! let config = Config::load(None)?;
//! let fs: FsHandle = Arc::new(LocalFilesystem::new());
//! let transport: TransportHandle = Arc::new(ReqwestTransport::new()?);
//! let tokens = token_manager(&config, transport.clone())?;
//! let selfhost = SelfHosting::from_config(&config, fs, transport)?;
//!
//! let mut build = KitBuild::create(selfhost.client(), &tokens, "kit-token").await?;
//! while !build.poll(selfhost.client(), &tokens).await? {
//!     tokio::time::sleep(Duration::from_secs(2)).await;
//! }
//! let path = selfhost.download_and_prepare(&build, &tokens, &config.destination, PrepareOptions::default()).await?;
//! ```

pub mod error;
pub mod fetch;
#[cfg(test)]
mod fixtures;
pub mod prepare;

use crate::error::{ErrorKind, Result};
use crate::fetch::ArchiveFetcher;
use crate::prepare::{kit_document_path, prepare_self_hosting};
use exn::ResultExt;
use fakit_api::transport::TransportHandle;
use fakit_api::{AccessTokenManager, KitBuild, QueryClient, TokenProvider, fetch_kit_metadata};
use fakit_config::Config;
use fakit_storage::{FsHandle, is_plain_file_name};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Directory under the destination base that holds every published kit.
pub const KITS_DIR: &str = "fontawesome-kit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOptions {
    /// Rebuild the kit even if it has already been published.
    pub overwrite: bool,
}
impl Default for PrepareOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

/// Where a build of a kit is published under `base`.
pub fn kit_destination(base: &Path, kit_token: &str, build_id: &str) -> Result<PathBuf> {
    if !is_plain_file_name(kit_token) {
        exn::bail!(ErrorKind::InvalidArgument("kit token"));
    }
    if !is_plain_file_name(build_id) {
        exn::bail!(ErrorKind::InvalidArgument("build id"));
    }
    Ok(base.join(KITS_DIR).join(kit_token).join(build_id))
}

/// Access-token manager for the API token in `config`.
pub fn token_manager(config: &Config, transport: TransportHandle) -> Result<AccessTokenManager> {
    let Some(token) = config.api.token.as_deref() else {
        exn::bail!(ErrorKind::Configuration("api.token"));
    };
    AccessTokenManager::new(token, &config.api.base_url, transport).or_raise(|| ErrorKind::Configuration("api.token"))
}

/// The collaborators a self-hosting run needs, bundled together.
pub struct SelfHosting {
    fs: FsHandle,
    client: QueryClient,
    fetcher: ArchiveFetcher,
}
impl SelfHosting {
    /// Default timeouts; per-download temp dirs go under `temp_root`.
    pub fn new(fs: FsHandle, transport: TransportHandle, base_url: &str, temp_root: impl Into<PathBuf>) -> Result<Self> {
        let client = QueryClient::new(base_url, transport.clone()).or_raise(|| ErrorKind::Configuration("api.base_url"))?;
        let fetcher = ArchiveFetcher::new(fs.clone(), transport, temp_root);
        Ok(Self { fs, client, fetcher })
    }

    pub fn from_config(config: &Config, fs: FsHandle, transport: TransportHandle) -> Result<Self> {
        let client = QueryClient::new(config.api.base_url.as_str(), transport.clone())
            .or_raise(|| ErrorKind::Configuration("api.base_url"))?
            .with_timeout(config.query_timeout());
        let fetcher = ArchiveFetcher::new(fs.clone(), transport, &config.download.temp_dir)
            .with_timeout(config.download_timeout());
        Ok(Self { fs, client, fetcher })
    }

    /// Query client, for creating and polling builds.
    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn fetcher(&self) -> &ArchiveFetcher {
        &self.fetcher
    }

    /// Publish `build` under `base` and return where it was published.
    ///
    /// With `overwrite` off, a build that is already published (its
    /// destination holds a readable `metadata/kit.json`) is returned without
    /// any network request. The temporary download directory is removed after a
    /// successful run and kept after a failed preparation.
    #[instrument(
        skip_all,
        fields(kit_token = %build.kit_token(), build_id = %build.build_id(), overwrite = options.overwrite)
    )]
    pub async fn download_and_prepare(
        &self,
        build: &KitBuild,
        tokens: &dyn TokenProvider,
        base: &Path,
        options: PrepareOptions,
    ) -> Result<PathBuf> {
        let destination = kit_destination(base, build.kit_token(), build.build_id())?;
        if !options.overwrite && self.is_published(&destination).await? {
            info!(path = %destination.display(), "kit already published, skipping");
            return Ok(destination);
        }

        let metadata = fetch_kit_metadata(&self.client, tokens, build.kit_token())
            .await
            .or_raise(|| ErrorKind::KitMetadata)?;
        let temp_dir = self.fetcher.fetch(build).await.or_raise(|| ErrorKind::Fetch)?;
        match prepare_self_hosting(&*self.fs, &temp_dir, &metadata, build.build_id(), &destination).await {
            Ok(()) => {
                if let Err(e) = self.fs.remove_dir_all(&temp_dir).await {
                    warn!(path = %temp_dir.display(), error = ?e, "could not remove temporary directory");
                }
                Ok(destination)
            },
            Err(e) => {
                warn!(path = %temp_dir.display(), "kit preparation failed, temporary directory kept for inspection");
                Err(e).or_raise(|| ErrorKind::Prepare)
            },
        }
    }

    /// A bare directory may be left over from a failed run; only the kit
    /// document marks a published kit.
    async fn is_published(&self, destination: &Path) -> Result<bool> {
        self.fs
            .is_readable(&kit_document_path(destination))
            .await
            .or_raise(|| ErrorKind::Destination(destination.to_path_buf()))
    }
}
impl fmt::Debug for SelfHosting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfHosting")
            .field("fs", &self.fs.name())
            .field("client", &self.client)
            .field("fetcher", &self.fetcher)
            .finish()
    }
}
