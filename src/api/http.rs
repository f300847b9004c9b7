//! HTTP implementation of the corpus service client.

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

use crate::api::{ApiError, CorpusApi, LoginStatus, PaperPage};
use crate::models::{SavedFilterCollection, SavedQueryForm};
use crate::query::RequestParams;

#[derive(Debug, Deserialize)]
struct CategoriesEnvelope {
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OrganizationsEnvelope {
    organizations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SavedEnvelope {
    saved_queries: Vec<SavedFilterCollection>,
}

/// Corpus service client over HTTP.
///
/// Wraps a shared `reqwest::Client` with sensible defaults and replays the
/// session cookie captured at login on every request.
#[derive(Debug)]
pub struct HttpApi {
    base_url: Url,
    client: Client,
    session_cookie: RwLock<Option<String>>,
}

impl HttpApi {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Parse(format!("invalid base url: {e}")))?;
        // Url::join drops the last segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            base_url,
            client,
            session_cookie: RwLock::new(None),
        })
    }

    /// Replay `cookie` as the session on subsequent requests
    pub fn set_session_cookie(&self, cookie: Option<String>) {
        *self.session_cookie.write().expect("cookie lock poisoned") = cookie;
    }

    /// The session cookie currently replayed, if any
    pub fn session_cookie(&self) -> Option<String> {
        self.session_cookie
            .read()
            .expect("cookie lock poisoned")
            .clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Parse(format!("invalid endpoint {path}: {e}")))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session_cookie() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn check(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::ServerRejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        let response = self.request(self.client.get(url)).send().await?;
        let response = self.check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn send_json(
        &self,
        builder: reqwest::RequestBuilder,
        body: &serde_json::Value,
    ) -> Result<Response, ApiError> {
        let response = self.request(builder).json(body).send().await?;
        self.check(response).await
    }
}

#[async_trait]
impl CorpusApi for HttpApi {
    async fn fetch_page(&self, params: &RequestParams) -> Result<PaperPage, ApiError> {
        let mut url = self.endpoint("api/papers")?;
        url.set_query(Some(&params.query_string()));
        self.get_json(url).await
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let envelope: CategoriesEnvelope = self.get_json(self.endpoint("api/categories")?).await?;
        Ok(envelope.categories)
    }

    async fn organizations(&self) -> Result<Vec<String>, ApiError> {
        let envelope: OrganizationsEnvelope =
            self.get_json(self.endpoint("api/organizations")?).await?;
        Ok(envelope.organizations)
    }

    async fn saved_collections(&self) -> Result<Vec<SavedFilterCollection>, ApiError> {
        let envelope: SavedEnvelope = self.get_json(self.endpoint("api/saved")?).await?;
        Ok(envelope.saved_queries)
    }

    async fn save_collection(&self, form: &SavedQueryForm) -> Result<(), ApiError> {
        let url = self.endpoint("api/saved")?;
        tracing::debug!(%url, description = %form.description, "POST saved collection");
        let body = serde_json::to_value(form).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send_json(self.client.post(url), &body).await?;
        Ok(())
    }

    async fn delete_collection(&self, query_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint("api/saved")?;
        tracing::debug!(%url, query_id, "DELETE saved collection");
        self.send_json(self.client.delete(url), &json!({ "query_id": query_id }))
            .await?;
        Ok(())
    }

    async fn add_favorite(&self, paper_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint("api/users/favorites")?;
        tracing::debug!(%url, paper_id, "POST favorite");
        self.send_json(self.client.post(url), &json!({ "paper_id": paper_id }))
            .await?;
        Ok(())
    }

    async fn remove_favorite(&self, paper_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint("api/users/favorites")?;
        tracing::debug!(%url, paper_id, "DELETE favorite");
        self.send_json(self.client.delete(url), &json!({ "paper_id": paper_id }))
            .await?;
        Ok(())
    }

    async fn login(&self, name: &str, password: &str) -> Result<String, ApiError> {
        let url = self.endpoint("api/login")?;
        tracing::debug!(%url, name, "POST login");
        let response = self
            .client
            .post(url)
            .json(&json!({ "name": name, "password": password }))
            .send()
            .await?;
        let response = self.check(response).await?;

        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            // Keep only the name=value pair; attributes like Path don't
            // belong in a Cookie header
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .find(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Parse("login response carried no session cookie".into()))?
            .to_string();

        self.set_session_cookie(Some(cookie.clone()));
        Ok(cookie)
    }

    async fn login_check(&self) -> Result<LoginStatus, ApiError> {
        self.get_json(self.endpoint("api/logincheck")?).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint("api/logout")?;
        let response = self.request(self.client.post(url)).send().await?;
        self.check(response).await?;
        self.set_session_cookie(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let api = HttpApi::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        assert_eq!(
            api.endpoint("api/papers").unwrap().as_str(),
            "http://localhost:5000/api/papers"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpApi::new("not a url", Duration::from_secs(5)),
            Err(ApiError::Parse(_))
        ));
    }
}
