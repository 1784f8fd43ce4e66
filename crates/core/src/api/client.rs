use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Response, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{ApiError, Operation, ResourceStore};
use crate::{
    config::AppConfig,
    models::{NaturalKey, Resource, ResourceKind},
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP client bound to the API root.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Build a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim())
            .map_err(|err| ApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                fallback: "Failed to initialise the HTTP client".to_string(),
                source,
            })?;

        Ok(Self { http, base })
    }

    /// Build a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/{resource}`
    pub fn collection_url(&self, kind: ResourceKind) -> Result<Url, ApiError> {
        self.record_url(kind, &[])
    }

    /// `{base}/{resource}/{segment...}`, each segment percent-encoded.
    pub fn record_url(&self, kind: ResourceKind, segments: &[String]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push(kind.path())
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            fallback: fallback.to_string(),
            source,
        })?;
        read_body(response, fallback).await
    }
}

async fn read_body(response: Response, fallback: &str) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|source| ApiError::Transport {
            fallback: fallback.to_string(),
            source,
        })?;

    if !status.is_success() {
        return Err(ApiError::from_status(status.as_u16(), &body, fallback));
    }

    Ok(body.to_vec())
}

/// Decode a collection body, keeping only elements that match `R`.
///
/// A body that is valid JSON but not an array yields an empty collection.
pub fn decode_collection<R: Resource>(body: &[u8], fallback: &str) -> Result<Vec<R>, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|source| ApiError::Decode {
        fallback: fallback.to_string(),
        source,
    })?;

    let Value::Array(items) = value else {
        warn!(resource = R::KIND.path(), "collection response is not an array");
        return Ok(Vec::new());
    };

    let total = items.len();
    let records: Vec<R> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<R>(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(resource = R::KIND.path(), "skipping malformed record: {err}");
                None
            }
        })
        .collect();

    if records.len() != total {
        debug!(
            resource = R::KIND.path(),
            kept = records.len(),
            total,
            "filtered collection response"
        );
    }

    Ok(records)
}

fn decode_record<R: Resource>(body: &[u8], fallback: &str) -> Result<R, ApiError> {
    serde_json::from_slice(body).map_err(|source| ApiError::Decode {
        fallback: fallback.to_string(),
        source,
    })
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for ApiClient {
    async fn list(&self) -> Result<Vec<R>, ApiError> {
        let fallback = Operation::Load.fallback(R::KIND);
        let url = self.collection_url(R::KIND)?;
        let body = self.send(self.http.get(url), &fallback).await?;
        let records = decode_collection::<R>(&body, &fallback)?;
        info!(resource = R::KIND.path(), count = records.len(), "fetched collection");
        Ok(records)
    }

    async fn get(&self, key: &R::Key) -> Option<R> {
        let fallback = Operation::Fetch.fallback(R::KIND);
        let result = async {
            let url = self.record_url(R::KIND, &key.segments())?;
            let body = self.send(self.http.get(url), &fallback).await?;
            decode_record::<R>(&body, &fallback)
        }
        .await;

        match result {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(resource = R::KIND.path(), %key, "lookup failed: {err}");
                None
            }
        }
    }

    async fn create(&self, record: &R) -> Result<R, ApiError> {
        let fallback = Operation::Create.fallback(R::KIND);
        let url = self.collection_url(R::KIND)?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(record);
        let body = self.send(request, &fallback).await?;
        let created = decode_record::<R>(&body, &fallback)?;
        info!(resource = R::KIND.path(), key = %created.key(), "created record");
        Ok(created)
    }

    async fn update(&self, key: &R::Key, record: &R) -> Result<R, ApiError> {
        let fallback = Operation::Update.fallback(R::KIND);
        let url = self.record_url(R::KIND, &key.segments())?;
        let request = self
            .http
            .put(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(record);
        let body = self.send(request, &fallback).await?;
        let updated = decode_record::<R>(&body, &fallback)?;
        info!(resource = R::KIND.path(), %key, "updated record");
        Ok(updated)
    }

    async fn delete(&self, key: &R::Key) -> Result<(), ApiError> {
        let fallback = Operation::Delete.fallback(R::KIND);
        let url = self.record_url(R::KIND, &key.segments())?;
        self.send(self.http.delete(url), &fallback).await?;
        info!(resource = R::KIND.path(), %key, "deleted record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MALFORMED_PAYLOAD_MESSAGE,
        models::{License, Participation, ParticipationKey, Racer},
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn builds_collection_and_record_urls() {
        let api = client("http://localhost:8080/api/");
        assert_eq!(
            api.collection_url(ResourceKind::Racers).unwrap().as_str(),
            "http://localhost:8080/api/racers"
        );

        let key = ParticipationKey {
            mem_num: "M 1".to_string(),
            rno: 3,
            lic_no: "L1".to_string(),
        };
        assert_eq!(
            api.record_url(ResourceKind::Participations, &key.segments())
                .unwrap()
                .as_str(),
            "http://localhost:8080/api/participates/M%201/3/L1"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:ops@example.com", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn collection_decoding_skips_malformed_entries() {
        let body = br#"[
            {"licNo":"L1","city":"Hue","date":"2025-01-02","issues":"none","cost":10,"dept":"D","contact":"c"},
            {"licNo":"L2","city":"Hue","date":"2025-01-02","issues":"none","cost":"free","dept":"D","contact":"c"},
            null
        ]"#;
        let licenses = decode_collection::<License>(body, "Failed to load licenses").unwrap();
        assert_eq!(licenses.len(), 1);
        assert_eq!(licenses[0].lic_no, "L1");
    }

    #[test]
    fn non_array_collection_is_empty() {
        let racers = decode_collection::<Racer>(br#"{"racers":[]}"#, "Failed to load racers").unwrap();
        assert!(racers.is_empty());
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = decode_collection::<Racer>(b"<html>", "Failed to load racers").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(err.to_string(), "Failed to load racers");
    }

    /// Answer one request with `status` and `body`; the handle yields the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("listener address");
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept connection");
            let request = read_request(&mut stream).await;
            stream
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = stream.shutdown().await;
            request
        });
        (format!("http://{addr}/api"), handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let read = stream.read(&mut chunk).await.expect("read request");
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..read]);
            let text = String::from_utf8_lossy(&raw);
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if body.len() >= length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    fn sample_racer() -> Racer {
        Racer {
            mem_num: "M 1".to_string(),
            name: "Anna".to_string(),
            address: "Hue".to_string(),
        }
    }

    #[tokio::test]
    async fn list_fetches_the_collection() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"memNum":"M1","name":"Anna","address":"Hue"}]"#,
        )
        .await;
        let api = client(&base);

        let racers = ResourceStore::<Racer>::list(&api).await.unwrap();

        assert_eq!(racers.len(), 1);
        assert_eq!(racers[0].name, "Anna");
        assert!(server.await.unwrap().starts_with("GET /api/racers HTTP/1.1"));
    }

    #[tokio::test]
    async fn lookup_of_missing_record_is_none() {
        let (base, server) = serve_once("404 Not Found", r#"{"message":"missing"}"#).await;
        let api = client(&base);

        let found = ResourceStore::<Racer>::get(&api, &"M 1".to_string()).await;

        assert!(found.is_none());
        assert!(server.await.unwrap().starts_with("GET /api/racers/M%201 HTTP/1.1"));
    }

    #[tokio::test]
    async fn create_declares_json_and_maps_415() {
        let (base, server) = serve_once("415 Unsupported Media Type", "").await;
        let api = client(&base);

        let err = ResourceStore::<Racer>::create(&api, &sample_racer())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UnsupportedMediaType));
        assert_eq!(err.to_string(), MALFORMED_PAYLOAD_MESSAGE);
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/racers HTTP/1.1"));
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: application/json"));
        assert!(request.contains(r#""memNum":"M 1""#));
    }

    #[tokio::test]
    async fn server_message_wins_over_fallback() {
        let (base, server) =
            serve_once("409 Conflict", r#"{"message":"Racer M 1 already exists"}"#).await;
        let api = client(&base);

        let err = ResourceStore::<Racer>::create(&api, &sample_racer())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "Racer M 1 already exists");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn update_puts_json_to_the_record_path() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"memNum":"M 1","name":"Anna B","address":"Hue"}"#,
        )
        .await;
        let api = client(&base);
        let draft = Racer {
            name: "Anna B".to_string(),
            ..sample_racer()
        };

        let updated = ResourceStore::<Racer>::update(&api, &draft.mem_num, &draft)
            .await
            .unwrap();

        assert_eq!(updated, draft);
        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /api/racers/M%201 HTTP/1.1"));
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn delete_accepts_no_content_on_composite_keys() {
        let (base, server) = serve_once("204 No Content", "").await;
        let api = client(&base);
        let key = ParticipationKey {
            mem_num: "M 1".to_string(),
            rno: 3,
            lic_no: "L1".to_string(),
        };

        ResourceStore::<Participation>::delete(&api, &key)
            .await
            .unwrap();

        assert!(server
            .await
            .unwrap()
            .starts_with("DELETE /api/participates/M%201/3/L1 HTTP/1.1"));
    }
}
