//! REST target store
//!
//! Talks to a PostgREST-style endpoint (`{url}/rest/v1/{table}`) such as the
//! one exposed by Supabase projects.

use super::{Credential, StoreError, TargetStore};
use crate::record::Record;
use async_trait::async_trait;
use eyre::Result;
use reqwest::{Client, Method, header};
use serde::{Deserialize, Serialize};
use url::Url;

const REST_PREFIX: &str = "rest/v1/";

/// Shape of the access-control table consulted before any write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTable {
    /// Table holding `(tenant, principal)` memberships
    pub table: String,
    /// Column holding the tenant key
    pub tenant_column: String,
    /// Column holding the principal id
    pub principal_column: String,
}

impl Default for AccessTable {
    fn default() -> Self {
        Self {
            table: "user_confinamentos".to_string(),
            tenant_column: "confinamento_id".to_string(),
            principal_column: "user_id".to_string(),
        }
    }
}

/// HTTP client for a PostgREST-style target store.
///
/// # Example
/// ```no_run
/// use tenant_loader::client::{AccessTable, Credential, RestStore, TargetStore};
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("https://project.supabase.co")?;
/// let store = RestStore::try_new(url, Credential::new("anon-key", None), AccessTable::default())?;
///
/// let page = store.select("fato_trato", &["unique_key"], 0, 1000).await?;
/// println!("{} keys in first page", page.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RestStore {
    client: Client,
    url: Url,
    access: AccessTable,
}

impl RestStore {
    /// Create a new store client.
    ///
    /// # Errors
    /// Returns an error if the credential contains characters that cannot be
    /// sent as a header or the HTTP client cannot be built.
    pub fn try_new(mut url: Url, credential: Credential, access: AccessTable) -> Result<Self> {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", credential.apikey().parse()?);
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", credential.bearer()).parse()?,
        );
        headers.insert(header::ACCEPT, "application/json".parse()?);
        let client = Client::builder().default_headers(headers).build()?;

        log::debug!("Target store {} using {} credential", url, credential);

        Ok(Self {
            client,
            url,
            access,
        })
    }

    /// Get the base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the access-control table description.
    pub fn access_table(&self) -> &AccessTable {
        &self.access
    }

    /// Resolve the REST endpoint for a table.
    pub fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        self.url
            .join(&format!("{}{}", REST_PREFIX, table))
            .map_err(|e| StoreError::InvalidRequest(format!("table url for '{}': {}", table, e)))
    }

    /// Send a request and fail on non-success statuses.
    async fn send(
        &self,
        method: Method,
        table: &str,
        query: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, StoreError> {
        let url = self.table_url(table)?;
        log::trace!("{} {} {:?}", method, url, query);

        let mut request = self.client.request(method, url).query(query);
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .header("Prefer", "return=minimal")
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status, body });
        }

        Ok(response)
    }
}

/// Query pairs for a windowed projection, ordered by the first column
pub(crate) fn select_query(columns: &[&str], offset: usize, limit: usize) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), columns.join(","))];
    if let Some(first) = columns.first() {
        query.push(("order".to_string(), format!("{}.asc", first)));
    }
    query.push(("offset".to_string(), offset.to_string()));
    query.push(("limit".to_string(), limit.to_string()));
    query
}

/// Query pairs for an access-control membership lookup
pub(crate) fn access_query(
    access: &AccessTable,
    tenant_key: &str,
    principal_id: &str,
) -> Vec<(String, String)> {
    vec![
        ("select".to_string(), access.tenant_column.clone()),
        (access.tenant_column.clone(), format!("eq.{}", tenant_key)),
        (access.principal_column.clone(), format!("eq.{}", principal_id)),
        ("limit".to_string(), "1".to_string()),
    ]
}

#[async_trait]
impl TargetStore for RestStore {
    async fn select(
        &self,
        table: &str,
        columns: &[&str],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let query = select_query(columns, offset, limit);
        let response = self.send(Method::GET, table, &query, None).await?;
        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn insert(&self, table: &str, records: &[Record]) -> Result<(), StoreError> {
        let body = serde_json::to_vec(records).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.send(Method::POST, table, &[], Some(body)).await?;
        log::debug!("POST {} ({} record(s))", table, records.len());
        Ok(())
    }

    async fn has_access(&self, tenant_key: &str, principal_id: &str) -> Result<bool, StoreError> {
        let query = access_query(&self.access, tenant_key, principal_id);
        let response = self
            .send(Method::GET, &self.access.table, &query, None)
            .await?;
        let rows = response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(!rows.is_empty())
    }
}

impl std::fmt::Display for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
