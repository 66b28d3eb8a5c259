//! Client for the Font Awesome API.
//!
//! [`AccessTokenManager`] exchanges an API token for short-lived access
//! tokens, [`QueryClient`] sends GraphQL queries with them, and
//! [`KitBuild`] drives a kit build from creation until its archive is
//! ready to download. All network access goes through a
//! [`transport::HttpTransport`].

mod build;
pub mod error;
mod kit;
mod query;
mod token;
pub mod transport;

pub use crate::build::{BuildStatus, KitBuild};
pub use crate::kit::{KitMetadata, Release, fetch_kit_metadata};
pub use crate::query::{Query, QueryClient, QueryOptions, decode, has_any_error, is_authorization_error};
pub use crate::token::{AccessTokenManager, StaticToken, TokenProvider};
