//! HTTP client for the REST collaborators (unread count, zone maps)

use std::time::Duration;

use argonvale_shared::{ZoneId, ZoneMapData};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::ports::outbound::{ApiError, MessageCountPort, ZoneMapPort};

/// Timeout for REST calls; these are small JSON documents.
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnreadCountResponse {
    count: u32,
}

impl HttpApiClient {
    pub fn new(mut base_url: Url, token: Option<String>) -> Self {
        // `join` treats the last segment as a file unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            token,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::RequestFailed(format!("invalid path {path}: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json::<T>().await?),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(url.to_string())),
            status => Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl MessageCountPort for HttpApiClient {
    async fn unread_count(&self) -> Result<u32, ApiError> {
        let body: UnreadCountResponse = self.get_json("api/messages/unread-count").await?;
        Ok(body.count)
    }
}

#[async_trait]
impl ZoneMapPort for HttpApiClient {
    async fn fetch_zone_map(&self, zone_id: &ZoneId) -> Result<ZoneMapData, ApiError> {
        self.get_json(&format!("maps/{}.json", zone_id.as_str())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_resolve_against_the_api_root() {
        let client = HttpApiClient::new(Url::parse("http://localhost:8000/").unwrap(), None);
        assert_eq!(
            client.endpoint("api/messages/unread-count").unwrap().as_str(),
            "http://localhost:8000/api/messages/unread-count"
        );
        assert_eq!(
            client.endpoint("maps/town.json").unwrap().as_str(),
            "http://localhost:8000/maps/town.json"
        );
    }

    #[test]
    fn api_root_with_a_path_keeps_its_prefix() {
        let client = HttpApiClient::new(Url::parse("https://example.com/game").unwrap(), None);
        assert_eq!(
            client.endpoint("maps/wild.json").unwrap().as_str(),
            "https://example.com/game/maps/wild.json"
        );
    }

    #[test]
    fn unread_count_body_decodes() {
        let body: UnreadCountResponse = serde_json::from_str(r#"{"count": 4}"#).unwrap();
        assert_eq!(body.count, 4);
    }
}
