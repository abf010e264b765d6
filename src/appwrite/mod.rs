//! Minimal Appwrite REST client (server API key auth).
//!
//! Client::new -> authenticated JSON client bound to one project.
//! Covers users, teams (+ memberships), databases, collections, attributes
//! and storage buckets: just what the faker / bootstrap / wiper tools need.
//!
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::{Host, Url};

use crate::config::endpoint_string;

/// Literal id that asks Appwrite to generate a unique identifier.
pub const UNIQUE_ID: &str = "unique()";

const RESPONSE_FORMAT: &str = "1.5.0";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/* -------------------------------------------------------------------------- */
/* Errors                                                                     */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Appwrite answered with a non-2xx status.
    #[error("Appwrite error {status} ({kind}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    /// Credential could not be used as an HTTP header value.
    #[error("invalid {0} (contains characters not allowed in headers)")]
    InvalidHeader(&'static str),
}

impl ApiError {
    /// HTTP status when the error came from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidHeader(_) => None,
        }
    }

    /// 409: a resource with that id already exists.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Turn a non-2xx response body into an `ApiError::Api`.
pub fn decode_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(b) if !b.message.is_empty() => ApiError::Api {
            status,
            kind: if b.kind.is_empty() {
                "unknown".to_string()
            } else {
                b.kind
            },
            message: b.message,
        },
        _ => ApiError::Api {
            status,
            kind: "unknown".to_string(),
            message: if body.trim().is_empty() {
                "<empty response body>".to_string()
            } else {
                body.trim().to_string()
            },
        },
    }
}

/* -------------------------------------------------------------------------- */
/* Models                                                                     */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Any resource we only need the id and name of.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserList {
    pub total: u64,
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct TeamList {
    pub total: u64,
    pub teams: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseList {
    pub total: u64,
    pub databases: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
pub struct BucketList {
    pub total: u64,
    pub buckets: Vec<Resource>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewTeam<'a> {
    team_id: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewMembership<'a> {
    user_id: &'a str,
    roles: &'a [&'a str],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewDatabase<'a> {
    database_id: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCollection<'a> {
    collection_id: &'a str,
    name: &'a str,
    document_security: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewBucket<'a> {
    bucket_id: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct NewStringAttribute<'a> {
    key: &'a str,
    size: u32,
    required: bool,
}

#[derive(Debug, Serialize)]
struct NewBooleanAttribute<'a> {
    key: &'a str,
    required: bool,
}

/* -------------------------------------------------------------------------- */
/* Client                                                                     */
/* -------------------------------------------------------------------------- */

fn is_loopback(endpoint: &Url) -> bool {
    match endpoint.host() {
        Some(Host::Domain(d)) => d.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Authenticated client for one Appwrite project.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: String,
    project: String,
}

impl Client {
    pub fn new(endpoint: &Url, project: &str, key: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-appwrite-response-format",
            HeaderValue::from_static(RESPONSE_FORMAT),
        );
        headers.insert(
            "x-appwrite-project",
            HeaderValue::from_str(project).map_err(|_| ApiError::InvalidHeader("project id"))?,
        );
        let mut key_value =
            HeaderValue::from_str(key).map_err(|_| ApiError::InvalidHeader("API key"))?;
        key_value.set_sensitive(true);
        headers.insert("x-appwrite-key", key_value);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("appwrite-toolkit/", env!("CARGO_PKG_VERSION")));
        // A local Appwrite instance is never reached through HTTP(S)_PROXY.
        if is_loopback(endpoint) {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: endpoint_string(endpoint),
            project: project.to_string(),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        crate::log_trace!("<- {}", status);
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(decode_error(status.as_u16(), &body));
        }
        Ok(resp.json::<T>().await?)
    }

    async fn send_empty(&self, req: reqwest::RequestBuilder) -> Result<(), ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        crate::log_trace!("<- {}", status);
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(decode_error(status.as_u16(), &body));
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        crate::log_debug!("GET {path}");
        self.send(self.http.get(self.url(path))).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        crate::log_debug!("POST {path}");
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        crate::log_debug!("DELETE {path}");
        self.send_empty(self.http.delete(self.url(path))).await
    }

    /* ---- Users ---- */

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post("/users", user).await
    }

    pub async fn list_users(&self) -> Result<UserList, ApiError> {
        self.get("/users").await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/users/{id}")).await
    }

    /* ---- Teams ---- */

    pub async fn create_team(&self, team_id: &str, name: &str) -> Result<Resource, ApiError> {
        self.post("/teams", &NewTeam { team_id, name }).await
    }

    pub async fn list_teams(&self) -> Result<TeamList, ApiError> {
        self.get("/teams").await
    }

    pub async fn delete_team(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/teams/{id}")).await
    }

    /// Server-side membership: with an API key the user joins immediately.
    pub async fn create_membership(
        &self,
        team_id: &str,
        user_id: &str,
        roles: &[&str],
    ) -> Result<serde_json::Value, ApiError> {
        self.post(
            &format!("/teams/{team_id}/memberships"),
            &NewMembership { user_id, roles },
        )
        .await
    }

    /* ---- Databases ---- */

    pub async fn create_database(
        &self,
        database_id: &str,
        name: &str,
    ) -> Result<Resource, ApiError> {
        self.post("/databases", &NewDatabase { database_id, name })
            .await
    }

    pub async fn list_databases(&self) -> Result<DatabaseList, ApiError> {
        self.get("/databases").await
    }

    pub async fn delete_database(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/databases/{id}")).await
    }

    pub async fn create_collection(
        &self,
        database_id: &str,
        collection_id: &str,
        name: &str,
    ) -> Result<Resource, ApiError> {
        self.post(
            &format!("/databases/{database_id}/collections"),
            &NewCollection {
                collection_id,
                name,
                document_security: false,
            },
        )
        .await
    }

    pub async fn create_string_attribute(
        &self,
        database_id: &str,
        collection_id: &str,
        key: &str,
        size: u32,
        required: bool,
    ) -> Result<serde_json::Value, ApiError> {
        self.post(
            &format!("/databases/{database_id}/collections/{collection_id}/attributes/string"),
            &NewStringAttribute {
                key,
                size,
                required,
            },
        )
        .await
    }

    pub async fn create_boolean_attribute(
        &self,
        database_id: &str,
        collection_id: &str,
        key: &str,
        required: bool,
    ) -> Result<serde_json::Value, ApiError> {
        self.post(
            &format!("/databases/{database_id}/collections/{collection_id}/attributes/boolean"),
            &NewBooleanAttribute { key, required },
        )
        .await
    }

    /* ---- Storage ---- */

    pub async fn create_bucket(&self, bucket_id: &str, name: &str) -> Result<Resource, ApiError> {
        self.post("/storage/buckets", &NewBucket { bucket_id, name })
            .await
    }

    pub async fn list_buckets(&self) -> Result<BucketList, ApiError> {
        self.get("/storage/buckets").await
    }

    pub async fn delete_bucket(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/storage/buckets/{id}")).await
    }
}
