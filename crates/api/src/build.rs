//! Kit builds: request one, then poll it until it is ready to download.

use crate::error::{ErrorKind, Result};
use crate::query::{Query, QueryClient};
use crate::token::TokenProvider;
use derive_more::Display;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildStatus {
    #[display("PENDING")]
    Pending,
    #[display("READY")]
    Ready,
    #[display("FAILED")]
    Failed,
}
impl BuildStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// The download URL only exists in the ready state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BuildState {
    Pending,
    Ready { url: String },
    Failed,
}
impl BuildState {
    fn from_parts(status: BuildStatus, url: Option<String>) -> Result<Self> {
        Ok(match (status, url) {
            (BuildStatus::Ready, Some(url)) if !url.is_empty() => Self::Ready { url },
            (BuildStatus::Ready, _) => {
                exn::bail!(ErrorKind::UnexpectedShape("build is READY without a download url".to_string()))
            },
            (status, url) => {
                if url.is_some() {
                    warn!(%status, "ignoring download url on a build that is not ready");
                }
                match status {
                    BuildStatus::Failed => Self::Failed,
                    _ => Self::Pending,
                }
            },
        })
    }

    fn status(&self) -> BuildStatus {
        match self {
            Self::Pending => BuildStatus::Pending,
            Self::Ready { .. } => BuildStatus::Ready,
            Self::Failed => BuildStatus::Failed,
        }
    }
}

/// Build as described by the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildPayload {
    build_id: String,
    status: BuildStatus,
    // Key must be present, value may be null.
    #[serde(deserialize_with = "Option::deserialize")]
    url: Option<String>,
}

/// One requested build of a kit.
///
/// Once READY or FAILED a build never changes again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitBuild {
    kit_token: String,
    build_id: String,
    state: BuildState,
}
impl KitBuild {
    /// Rebuild a build from previously stored parts, validated the same way
    /// as a server response.
    pub fn new(
        kit_token: impl Into<String>,
        build_id: impl Into<String>,
        status: BuildStatus,
        url: Option<String>,
    ) -> Result<Self> {
        let kit_token = kit_token.into();
        let build_id = build_id.into();
        if kit_token.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("kit token"));
        }
        if build_id.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("build id"));
        }
        Ok(Self { kit_token, build_id, state: BuildState::from_parts(status, url)? })
    }

    /// Ask the API to build a kit. The build may already be READY.
    #[instrument(skip(client, tokens))]
    pub async fn create(client: &QueryClient, tokens: &dyn TokenProvider, kit_token: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "createKitDownload")]
            build: BuildPayload,
        }

        if kit_token.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("kit token"));
        }
        let query = Query::new(format!(
            "mutation {{ createKitDownload(buildType: WEB, kitToken: {}) {{ buildId status url }} }}",
            literal(kit_token),
        ));
        let Data { build } = client.query_data(&query, tokens, client.options()).await?;
        if build.build_id.is_empty() {
            exn::bail!(ErrorKind::UnexpectedShape("empty buildId".to_string()));
        }
        let build = Self::new(kit_token, build.build_id, build.status, build.url)?;
        info!(build_id = %build.build_id, status = %build.status(), "created kit build");
        Ok(build)
    }

    /// Refresh the status from the API and return whether the build is ready.
    ///
    /// A build that is already READY returns `true`, and a FAILED one
    /// `false`, without touching the network.
    #[instrument(skip_all, fields(kit_token = %self.kit_token, build_id = %self.build_id))]
    pub async fn poll(&mut self, client: &QueryClient, tokens: &dyn TokenProvider) -> Result<bool> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "getKitDownload")]
            build: BuildPayload,
        }

        match self.state {
            BuildState::Ready { .. } => return Ok(true),
            BuildState::Failed => return Ok(false),
            BuildState::Pending => {},
        }
        let query = Query::new(format!(
            "query {{ getKitDownload(buildId: {}, buildType: WEB, kitToken: {}) {{ buildId status url }} }}",
            literal(&self.build_id),
            literal(&self.kit_token),
        ));
        let Data { build } = client.query_data(&query, tokens, client.options()).await?;
        if build.build_id != self.build_id {
            exn::bail!(ErrorKind::UnexpectedShape(format!("asked for build {}, got {}", self.build_id, build.build_id)));
        }
        // Validate fully before overwriting anything.
        self.state = BuildState::from_parts(build.status, build.url)?;
        info!(status = %self.status(), "polled kit build");
        Ok(self.is_ready())
    }

    pub fn kit_token(&self) -> &str {
        &self.kit_token
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn status(&self) -> BuildStatus {
        self.state.status()
    }

    /// Download URL, present exactly when the build is READY.
    pub fn url(&self) -> Option<&str> {
        match &self.state {
            BuildState::Ready { url } => Some(url),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, BuildState::Ready { .. })
    }
}

/// A GraphQL string literal (JSON string syntax is valid GraphQL).
pub(crate) fn literal(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}
