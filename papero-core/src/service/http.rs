//! reqwest-backed client for the library service's `/api/v1` endpoints

use super::{ReadingService, ServiceResult};
use crate::config::ClientConfig;
use crate::error::ServiceError;
use crate::types::{
    AccessStamp, Ack, BookId, ContentResolution, EntryRef, ErrorBody, LibraryEntry,
    ProgressUpdate, UserId,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

pub struct HttpReadingService {
    client: Client,
    api_root: String,
}

impl HttpReadingService {
    pub fn new(config: &ClientConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_root: format!("{}/api/v1", config.base_url.trim_end_matches('/')),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path)
    }
}

fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::Transport(err.to_string())
}

/// Decode a success body, or turn the status and error body into a rejection
async fn decode<T: DeserializeOwned>(response: Response) -> ServiceResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()));
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
    };
    Err(ServiceError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ReadingService for HttpReadingService {
    async fn resolve_content(
        &self,
        book_id: BookId,
        user_id: Option<UserId>,
    ) -> ServiceResult<ContentResolution> {
        let mut query = vec![("book_id", book_id.to_string())];
        if let Some(user_id) = user_id {
            query.push(("user_id", user_id.to_string()));
        }

        let response = self
            .client
            .get(self.endpoint("content-resolution"))
            .query(&query)
            .send()
            .await
            .map_err(transport)?;

        // A 4xx with an error body is the service saying "nothing to render"
        match decode::<ContentResolution>(response).await {
            Err(ServiceError::Rejected { status, message }) if (400..500).contains(&status) => {
                Ok(ContentResolution::error(message))
            }
            other => other,
        }
    }

    async fn fetch_library(&self, user_id: UserId) -> ServiceResult<Vec<LibraryEntry>> {
        let response = self
            .client
            .get(self.endpoint("library"))
            .query(&[("user_id", user_id.to_string())])
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn save_progress(&self, update: ProgressUpdate) -> ServiceResult<Ack> {
        let response = self
            .client
            .post(self.endpoint("progress"))
            .json(&update)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn touch_accessed(&self, entry: EntryRef) -> ServiceResult<AccessStamp> {
        let response = self
            .client
            .post(self.endpoint("accessed"))
            .json(&entry)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }
}
