use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;
use zackweg_api_types::{ListingResponse, ListingWriteRequest};

use super::client::ApiClient;
use crate::application::ports::{ApiError, ListingsApi};

/// Listing endpoints under `{base}/posts`.
#[derive(Clone, Debug)]
pub struct HttpListingsApi {
    api: ApiClient,
}

impl HttpListingsApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, ApiError> {
        self.api
            .url(path)
            .map_err(|err| ApiError::Transport(format!("invalid URL `{path}`: {err}")))
    }
}

#[async_trait]
impl ListingsApi for HttpListingsApi {
    async fn fetch(&self, id: Uuid) -> Result<ListingResponse, ApiError> {
        let url = self.url(&format!("posts/{id}"))?;
        self.api.send_json(self.api.request(Method::GET, url)).await
    }

    async fn create(&self, request: &ListingWriteRequest) -> Result<ListingResponse, ApiError> {
        let url = self.url("posts")?;
        self.api
            .send_json(self.api.request(Method::POST, url).json(request))
            .await
    }

    async fn update(
        &self,
        id: Uuid,
        request: &ListingWriteRequest,
    ) -> Result<ListingResponse, ApiError> {
        let url = self.url(&format!("posts/{id}"))?;
        self.api
            .send_json(self.api.request(Method::PUT, url).json(request))
            .await
    }
}
