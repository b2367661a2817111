//! API client for communicating with the dashboard service

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use traffic_core::{Metric, Severity};
use url::Url;

/// API client for the dashboard service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // Prefer the service's own message over the raw body
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub window: String,
    pub count: usize,
    pub latest: Option<Metric>,
    pub severity: Option<Severity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use traffic_core::{ingest::TopicMessage, LiveSnapshot};

    const SNAPSHOT: &str = r#"{
        "trafficLevel": "medium",
        "vehicleCount": 27,
        "priorityVehicles": true,
        "priorityLabel": "detected",
        "prioritySince": "2024-05-01T12:00:00Z",
        "fireAlert": false,
        "smokeLevel": 0.0,
        "lastUpdated": "2024-05-01T12:00:05Z"
    }"#;

    #[tokio::test]
    async fn test_get_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SNAPSHOT)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let snapshot: LiveSnapshot = client.get("api/status").await.unwrap();

        assert_eq!(snapshot.traffic_level, Severity::Medium);
        assert_eq!(snapshot.vehicle_count, 27);
        assert_eq!(snapshot.priority_label, "detected");
        assert!(snapshot.priority_since.is_some());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_topic_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/ingest")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "topic": "vehicle_counter/counter11",
                "payload": "27"
            })))
            .with_status(202)
            .with_header("content-type", "application/json")
            .with_body(SNAPSHOT)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let message = TopicMessage::new("vehicle_counter/counter11", "27");
        let snapshot: LiveSnapshot = client.post("api/ingest", &message).await.unwrap();

        assert_eq!(snapshot.vehicle_count, 27);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/history")
            .match_query(Matcher::UrlEncoded("period".into(), "day".into()))
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Invalid period. Valid values are: second, minute, hour."}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .get::<serde_json::Value>("api/history?period=day")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("400"));
        assert!(message.contains("Invalid period. Valid values are: second, minute, hour."));
    }

    #[tokio::test]
    async fn test_aggregate_report_allows_empty_window() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/aggregate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"window":"1h","count":0,"latest":null,"severity":null}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let report: AggregateReport = client.get("api/aggregate?window=1h").await.unwrap();

        assert_eq!(report.window, "1h");
        assert_eq!(report.count, 0);
        assert!(report.latest.is_none());
        assert!(report.severity.is_none());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
