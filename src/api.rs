
use crate::errors::{ApiError, AuthFailure};
use crate::models::{
    CreateRecordsRequest, ListRecordsResponse, LoginRequest, NewRecordBatch, ServiceRecord,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const TOKEN_FIELDS: [&str; 4] = ["token", "access_token", "accessToken", "idToken"];

#[async_trait]
pub trait HoursApi: Send + Sync {
    async fn login(&self, chapter_id: &str, password: &str) -> Result<String, ApiError>;

    async fn list_records(&self, token: &str, limit: u32) -> Result<Vec<ServiceRecord>, ApiError>;

    async fn create_records(&self, token: &str, batch: &NewRecordBatch) -> Result<(), ApiError>;

    /// `volunteer_name` disambiguates ids that the upstream store does not
    /// keep unique.
    async fn delete_record(
        &self,
        token: &str,
        record_id: &str,
        volunteer_name: &str,
    ) -> Result<(), ApiError>;
}

pub struct HttpHoursApi {
    client: Client,
    base_url: Url,
}

impl HttpHoursApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| ApiError::Protocol(format!("invalid API url {base_url:?}: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Protocol(format!("API url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl HoursApi for HttpHoursApi {
    async fn login(&self, chapter_id: &str, password: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["login"])?)
            .json(&LoginRequest {
                chapter: chapter_id,
                password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "login rejected");
            return Err(ApiError::Auth(AuthFailure::InvalidCredentials));
        }

        let body: Value = response.json().await?;
        extract_token(&body).ok_or_else(|| {
            warn!("login response carried no token field");
            ApiError::Protocol("login response has no token".to_string())
        })
    }

    async fn list_records(&self, token: &str, limit: u32) -> Result<Vec<ServiceRecord>, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["hours"])?)
            .query(&[("limit", limit)])
            .bearer_auth(token)
            .send()
            .await?;

        let body: ListRecordsResponse = check_status(response).await?.json().await?;
        Ok(body.items)
    }

    async fn create_records(&self, token: &str, batch: &NewRecordBatch) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["hours"])?)
            .bearer_auth(token)
            .json(&CreateRecordsRequest::from(batch))
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn delete_record(
        &self,
        token: &str,
        record_id: &str,
        volunteer_name: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoint(&["hours", record_id])?)
            .query(&[("volunteer", volunteer_name)])
            .bearer_auth(token)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

pub fn extract_token(body: &Value) -> Option<String> {
    TOKEN_FIELDS.iter().find_map(|field| {
        body.get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(classify_failure(status, message))
}

pub fn classify_failure(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ApiError::Auth(AuthFailure::SessionExpired)
        }
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_is_found_under_any_accepted_name() {
        assert_eq!(extract_token(&json!({"token": "a"})), Some("a".into()));
        assert_eq!(extract_token(&json!({"access_token": "b"})), Some("b".into()));
        assert_eq!(extract_token(&json!({"accessToken": "c"})), Some("c".into()));
        assert_eq!(extract_token(&json!({"idToken": "d"})), Some("d".into()));
    }

    #[test]
    fn empty_or_non_string_token_is_unusable() {
        assert_eq!(extract_token(&json!({"token": ""})), None);
        assert_eq!(extract_token(&json!({"token": 42})), None);
        assert_eq!(extract_token(&json!({"message": "ok"})), None);
    }

    #[test]
    fn auth_statuses_expire_the_session() {
        assert!(classify_failure(StatusCode::UNAUTHORIZED, String::new()).is_session_expired());
        assert!(classify_failure(StatusCode::FORBIDDEN, String::new()).is_session_expired());
        assert_eq!(
            classify_failure(StatusCode::BAD_GATEWAY, "down".into()),
            ApiError::Server {
                status: 502,
                message: "down".into()
            }
        );
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let api = HttpHoursApi::new("https://example.org/prod", None).unwrap();
        let url = api.endpoint(&["hours", "a b/1"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/prod/hours/a%20b%2F1");
    }
}
