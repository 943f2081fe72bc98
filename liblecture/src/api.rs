use crate::errors::{LectureError, Result};
use crate::models::{DeliveryInfo, Folder, Session, SessionsEnvelope};
use crate::{send_message, Update};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::mpsc::Sender;
use url::Url;

pub const FOLDERS_ENDPOINT: &str = "/Panopto/Api/v1.0-beta/Folders";
pub const SESSIONS_ENDPOINT: &str = "/Panopto/Services/Data.svc/GetSessions";
pub const DELIVERY_INFO_ENDPOINT: &str = "/Panopto/Pages/Viewer/DeliveryInfo.aspx";
/// Name of the session cookie carrying the token
pub const AUTH_COOKIE: &str = ".ASPXAUTH";

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// How the parameters of an api call are sent.
#[derive(Debug, Clone)]
pub enum Params {
    /// GET with the pairs as query parameters
    Query(Vec<(String, String)>),
    /// POST with a json body
    Json(Value),
    /// POST with a form encoded body
    Form(Vec<(String, String)>),
}

/// Authenticated client for the platform api. Built once per run and shared by reference.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    update_tx: Option<Sender<Update>>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(LectureError::MissingPrecondition("token".to_string()));
        }
        if Url::parse(base_url).is_err() {
            return Err(LectureError::InvalidBaseUrl(base_url.to_string()));
        }

        let cookie = HeaderValue::from_str(&format!("{AUTH_COOKIE}={token}"))
            .map_err(|_| LectureError::InvalidToken)?;
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, cookie);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build http client : {}", e);
                LectureError::NetworkError(e.to_string())
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            update_tx: None,
        })
    }

    /// Failure bodies of api calls are also reported on this channel.
    pub fn with_updates(mut self, update_tx: Sender<Update>) -> Self {
        self.update_tx = Some(update_tx);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Calls `endpoint` (relative to the base url) and parses the body as json.
    ///
    /// A non-success status is logged together with its body, but the body is still
    /// parsed and returned. Callers get whatever the server said.
    #[tracing::instrument(skip(self))]
    pub async fn call(&self, endpoint: &str, params: Params) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = match params {
            Params::Query(query) => self.client.get(&url).query(&query),
            Params::Json(body) => self.client.post(&url).json(&body),
            Params::Form(form) => self.client.post(&url).form(&form),
        };

        let response = request.send().await.map_err(|e| {
            tracing::error!("Error calling {}", url);
            tracing::error!("{}", e);
            LectureError::NetworkError(e.to_string())
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Error reading response body from {}", url);
            LectureError::NetworkError(e.to_string())
        })?;

        if !status.is_success() {
            tracing::error!("Error status code received : {} |{}|", status, url);
            tracing::error!("{}", body);
            if let Some(update_tx) = &self.update_tx {
                send_message(update_tx, endpoint, body.clone(), true).await;
            }
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Response from {} isn't json : {}", url, e);
            LectureError::InvalidJson {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Top level folders visible to the user, in the order the platform returns them.
    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        let value = self
            .call(
                FOLDERS_ENDPOINT,
                Params::Query(vec![
                    ("parentId".to_string(), "null".to_string()),
                    ("folderSet".to_string(), "1".to_string()),
                ]),
            )
            .await?;
        decode(FOLDERS_ENDPOINT, value)
    }

    pub async fn list_sessions(&self, folder: &Folder) -> Result<Vec<Session>> {
        let value = self
            .call(
                SESSIONS_ENDPOINT,
                Params::Json(json!({
                    "queryParameters": {
                        "folderID": folder.id,
                    }
                })),
            )
            .await?;
        let envelope: SessionsEnvelope = decode(SESSIONS_ENDPOINT, value)?;
        Ok(envelope.d.results)
    }

    pub async fn delivery_info(&self, session: &Session) -> Result<DeliveryInfo> {
        let value = self
            .call(
                DELIVERY_INFO_ENDPOINT,
                Params::Form(vec![
                    ("deliveryId".to_string(), session.delivery_id.clone()),
                    ("responseType".to_string(), "json".to_string()),
                ]),
            )
            .await?;
        decode(DELIVERY_INFO_ENDPOINT, value)
    }

    /// Authenticated GET of an absolute url, the caller consumes the body.
    pub(crate) async fn get(&self, url: &str) -> Result<Response> {
        self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Error downloading file from {}", url);
            tracing::error!("{}", e);
            LectureError::NetworkError(e.to_string())
        })
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        tracing::error!("Unexpected payload from {} : {}", endpoint, e);
        LectureError::UnexpectedPayload {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(
            ApiClient::new("not a url", "t").unwrap_err(),
            LectureError::InvalidBaseUrl("not a url".to_string())
        );
        assert_eq!(
            ApiClient::new("https://x.panopto.eu", "bad\ntoken").unwrap_err(),
            LectureError::InvalidToken
        );
        assert_eq!(
            ApiClient::new("https://x.panopto.eu", "").unwrap_err(),
            LectureError::MissingPrecondition("token".to_string())
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = ApiClient::new("https://x.panopto.eu/", "t").unwrap();
        assert_eq!(client.base_url(), "https://x.panopto.eu");
    }

    #[test]
    fn test_decode_reports_endpoint() {
        let err = decode::<Vec<Folder>>(FOLDERS_ENDPOINT, json!({"Error": "nope"})).unwrap_err();
        assert!(matches!(
            err,
            LectureError::UnexpectedPayload { endpoint, .. } if endpoint == FOLDERS_ENDPOINT
        ));
    }
}
