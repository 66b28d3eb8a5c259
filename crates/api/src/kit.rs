//! Kit-level metadata: license, release version and known family styles.

use crate::build::literal;
use crate::error::{ErrorKind, Result};
use crate::query::{Query, QueryClient};
use crate::token::TokenProvider;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

/// Kit metadata exactly as the API returns it.
///
/// Every field is optional on the wire; checking that what the caller needs
/// is present is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitMetadata {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub license_selected: Option<String>,
    #[serde(default)]
    pub release: Option<Release>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    #[serde(default)]
    pub version: Option<String>,
    /// Raw list of `{family, style, prefix}` records.
    #[serde(default)]
    pub family_styles: Option<Value>,
}

impl KitMetadata {
    pub fn version(&self) -> Option<&str> {
        self.release.as_ref()?.version.as_deref()
    }

    pub fn family_styles(&self) -> Option<&Value> {
        self.release.as_ref()?.family_styles.as_ref()
    }
}

/// Fetch metadata for the kit identified by `kit_token`.
///
/// A kit the account cannot see comes back as `null`, reported as
/// [`UnexpectedShape`](ErrorKind::UnexpectedShape).
#[instrument(skip(client, tokens))]
pub async fn fetch_kit_metadata(client: &QueryClient, tokens: &dyn TokenProvider, kit_token: &str) -> Result<KitMetadata> {
    #[derive(Deserialize)]
    struct Data {
        me: Me,
    }
    #[derive(Deserialize)]
    struct Me {
        #[serde(default)]
        kit: Option<KitMetadata>,
    }

    if kit_token.is_empty() {
        exn::bail!(ErrorKind::InvalidArgument("kit token"));
    }
    let query = Query::new(format!(
        "query {{ me {{ kit(token: {}) {{ token licenseSelected release {{ version familyStyles {{ family style prefix }} }} }} }} }}",
        literal(kit_token),
    ));
    let Data { me } = client.query_data(&query, tokens, client.options()).await?;
    let Some(kit) = me.kit else {
        exn::bail!(ErrorKind::UnexpectedShape(format!("no kit {kit_token} for this account")));
    };
    info!(version = ?kit.version(), "fetched kit metadata");
    Ok(kit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::StaticToken;
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    async fn fetch(reply: Value) -> (Result<KitMetadata>, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new().with_json(200, &reply));
        let client = QueryClient::new("https://api.test", transport.clone()).unwrap();
        (fetch_kit_metadata(&client, &StaticToken::new("access"), "kt-1").await, transport)
    }

    #[tokio::test]
    async fn test_fetch() {
        let (result, transport) = fetch(json!({"data": {"me": {"kit": {
            "token": "kt-1",
            "licenseSelected": "pro",
            "release": {
                "version": "6.7.2",
                "familyStyles": [{"family": "classic", "style": "solid", "prefix": "fas"}],
            },
        }}}}))
        .await;
        let kit = result.unwrap();
        assert_eq!(kit.token.as_deref(), Some("kt-1"));
        assert_eq!(kit.license_selected.as_deref(), Some("pro"));
        assert_eq!(kit.version(), Some("6.7.2"));
        assert_eq!(kit.family_styles(), Some(&json!([{"family": "classic", "style": "solid", "prefix": "fas"}])));

        let requests = transport.requests().await;
        let body: Value = serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert!(body["query"].as_str().unwrap().contains(r#"kit(token: "kt-1")"#));
    }

    #[tokio::test]
    async fn test_partial_metadata_is_not_an_error() {
        let (result, _) = fetch(json!({"data": {"me": {"kit": {"token": "kt-1"}}}})).await;
        let kit = result.unwrap();
        assert_eq!(kit.version(), None);
        assert_eq!(kit.family_styles(), None);
    }

    #[tokio::test]
    async fn test_unknown_kit() {
        let (result, _) = fetch(json!({"data": {"me": {"kit": null}}})).await;
        assert!(matches!(&*result.unwrap_err(), ErrorKind::UnexpectedShape(_)));
    }
}
