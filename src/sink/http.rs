use crate::error::SinkError;
use crate::signals::{ReadingId, Severity, SignalType};
use crate::sink::{AnomalyPayload, ReadingPayload, SinkFuture, StabilityPayload, TelemetrySink};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Sink posting JSON records to the collector's REST API
///
/// Readings go to `/api/sensor`, stability reports to `/api/stability` and
/// anomalies to `/api/anomaly`. Scores and slopes are rounded here, at the
/// wire boundary; the rest of the agent works on unrounded values.
pub struct HttpSink {
    client: Client,
    endpoint: String,
}

/// Request body for `/api/sensor`
#[derive(Debug, Serialize)]
struct SensorRequest<'a> {
    sensor_type: SignalType,
    value: f64,
    unit: &'a str,
    source: &'a str,
    metadata: RequestMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct RequestMetadata<'a> {
    model_version: &'a str,
}

/// Request body for `/api/stability`
#[derive(Debug, Serialize)]
struct StabilityRequest<'a> {
    sensor_type: SignalType,
    score: f64,
    /// The collector names this field in hours but stores the minute count
    window_hours: u64,
    model_version: &'a str,
    drift_detected: bool,
    drift_magnitude: Option<f64>,
}

/// Request body for `/api/anomaly`
#[derive(Debug, Serialize)]
struct AnomalyRequest<'a> {
    sensor_type: SignalType,
    value: f64,
    severity: Severity,
    model_version: &'a str,
    reading_id: Option<&'a ReadingId>,
    description: &'a str,
}

/// Envelope the collector wraps created records in
#[derive(Debug, Deserialize)]
struct CollectorResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl HttpSink {
    /// Create a new HTTP sink
    ///
    /// # Arguments
    /// * `endpoint` - Collector base URL (e.g., "http://localhost:5000")
    /// * `timeout` - Per-request timeout
    ///
    /// # Example
    /// ```
    /// use skywatch::sink::HttpSink;
    /// use std::time::Duration;
    ///
    /// let sink = HttpSink::new("http://localhost:5000".to_string(), Duration::from_secs(5)).unwrap();
    /// ```
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| SinkError::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    /// Format a collector API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.endpoint.trim_end_matches('/'), path)
    }

    /// POST a JSON body and decode the collector's envelope
    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<CollectorResponse, SinkError> {
        let url = self.api_url(path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SinkError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        // A created record with an unreadable body still counts as delivered
        let text = response.text().await?;
        let envelope = match serde_json::from_str::<CollectorResponse>(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Collector response from {} was not JSON: {}", url, e);
                CollectorResponse {
                    success: None,
                    data: None,
                    error: None,
                }
            }
        };

        if envelope.success == Some(false) {
            return Err(SinkError::Rejected(
                envelope
                    .error
                    .unwrap_or_else(|| "collector reported failure".to_string()),
            ));
        }

        Ok(envelope)
    }

    /// Extract the record identifier from `data.id`, string or numeric
    fn reading_id(envelope: &CollectorResponse) -> Option<ReadingId> {
        match envelope.data.as_ref()?.get("id")? {
            Value::String(id) => Some(ReadingId(id.clone())),
            Value::Number(id) => Some(ReadingId(id.to_string())),
            _ => None,
        }
    }
}

impl TelemetrySink for HttpSink {
    fn publish_reading<'a>(
        &'a self,
        payload: &'a ReadingPayload,
    ) -> SinkFuture<'a, Option<ReadingId>> {
        Box::pin(async move {
            let request = SensorRequest {
                sensor_type: payload.signal,
                value: payload.value,
                unit: &payload.unit,
                source: &payload.source_tag,
                metadata: RequestMetadata {
                    model_version: &payload.model_version,
                },
            };

            let envelope = self.post("sensor", &request).await?;
            Ok(Self::reading_id(&envelope))
        })
    }

    fn publish_stability<'a>(&'a self, payload: &'a StabilityPayload) -> SinkFuture<'a, ()> {
        Box::pin(async move {
            let request = StabilityRequest {
                sensor_type: payload.signal,
                score: round_to(payload.score, 3),
                window_hours: payload.window_minutes,
                model_version: &payload.model_version,
                drift_detected: payload.drift_detected,
                drift_magnitude: payload.drift_magnitude.map(|m| round_to(m, 4)),
            };

            self.post("stability", &request).await.map(|_| ())
        })
    }

    fn publish_anomaly<'a>(&'a self, payload: &'a AnomalyPayload) -> SinkFuture<'a, ()> {
        Box::pin(async move {
            let request = AnomalyRequest {
                sensor_type: payload.signal,
                value: payload.value,
                severity: payload.severity,
                model_version: &payload.model_version,
                reading_id: payload.related_reading_id.as_ref(),
                description: &payload.description,
            };

            self.post("anomaly", &request).await.map(|_| ())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(endpoint: String) -> HttpSink {
        HttpSink::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    /// Collector stub answering POSTs to `route` with a fixed response
    async fn collector(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    /// JSON body of the single request the stub received
    async fn received_body(server: &MockServer) -> Value {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        requests[0].body_json().unwrap()
    }

    #[test]
    fn test_api_url_formatting() {
        let with_slash = sink("http://localhost:5000/".to_string());
        assert_eq!(with_slash.api_url("sensor"), "http://localhost:5000/api/sensor");

        let without_slash = sink("http://localhost:5000".to_string());
        assert_eq!(
            without_slash.api_url("stability"),
            "http://localhost:5000/api/stability"
        );
    }

    #[test]
    fn test_reading_id_extraction() {
        let numeric: CollectorResponse =
            serde_json::from_str(r#"{"success": true, "data": {"id": 17}}"#).unwrap();
        assert_eq!(HttpSink::reading_id(&numeric), Some(ReadingId("17".to_string())));

        let uuid: CollectorResponse = serde_json::from_str(
            r#"{"success": true, "data": {"id": "0b8f3c7e-1111-4a4a-9d9d-2c2c2c2c2c2c"}}"#,
        )
        .unwrap();
        assert_eq!(
            HttpSink::reading_id(&uuid),
            Some(ReadingId("0b8f3c7e-1111-4a4a-9d9d-2c2c2c2c2c2c".to_string()))
        );

        let missing: CollectorResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(HttpSink::reading_id(&missing), None);
    }

    #[tokio::test]
    async fn test_publish_reading_posts_sensor_record() {
        let server = collector(
            "/api/sensor",
            ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "data": {"id": "abc-123", "sensor_type": "solar_wind"}
            })),
        )
        .await;

        let payload = ReadingPayload {
            signal: SignalType::SolarWind,
            value: 415.7,
            unit: "km/s".to_string(),
            source_tag: "skywatch".to_string(),
            model_version: "1.2.0".to_string(),
        };
        let id = sink(server.uri()).publish_reading(&payload).await.unwrap();
        assert_eq!(id, Some(ReadingId("abc-123".to_string())));

        let body = received_body(&server).await;
        assert_eq!(body["sensor_type"], "solar_wind");
        assert_eq!(body["value"], 415.7);
        assert_eq!(body["unit"], "km/s");
        assert_eq!(body["source"], "skywatch");
        assert_eq!(body["metadata"]["model_version"], "1.2.0");
    }

    #[tokio::test]
    async fn test_publish_stability_rounds_at_wire_boundary() {
        let server = collector(
            "/api/stability",
            ResponseTemplate::new(201).set_body_string(r#"{"success": true, "data": {}}"#),
        )
        .await;

        let payload = StabilityPayload {
            signal: SignalType::PlanetaryIndex,
            score: 0.973228,
            window_minutes: 1,
            drift_detected: true,
            drift_magnitude: Some(1.234567),
            model_version: "1.2.0".to_string(),
        };
        sink(server.uri()).publish_stability(&payload).await.unwrap();

        let body = received_body(&server).await;
        assert_eq!(body["sensor_type"], "weather");
        assert_eq!(body["score"], 0.973);
        assert_eq!(body["window_hours"], 1);
        assert_eq!(body["drift_detected"], true);
        assert_eq!(body["drift_magnitude"], 1.2346);
    }

    #[tokio::test]
    async fn test_publish_anomaly_body() {
        let server = collector(
            "/api/anomaly",
            ResponseTemplate::new(201).set_body_string(r#"{"success": true, "data": {}}"#),
        )
        .await;

        let payload = AnomalyPayload {
            signal: SignalType::SolarWind,
            value: 800.0,
            severity: Severity::Critical,
            model_version: "1.2.0".to_string(),
            related_reading_id: None,
            description: "Solar Wind exceeded critical threshold".to_string(),
        };
        sink(server.uri()).publish_anomaly(&payload).await.unwrap();

        let body = received_body(&server).await;
        assert_eq!(body["severity"], "critical");
        assert_eq!(body["reading_id"], Value::Null);
        assert_eq!(body["description"], "Solar Wind exceeded critical threshold");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = collector(
            "/api/stability",
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error": "score must be between 0.0 and 1.0"}"#),
        )
        .await;

        let payload = StabilityPayload {
            signal: SignalType::Radiation,
            score: 0.5,
            window_minutes: 2,
            drift_detected: false,
            drift_magnitude: None,
            model_version: "1.2.0".to_string(),
        };
        let err = sink(server.uri()).publish_stability(&payload).await.unwrap_err();
        match err {
            SinkError::BadStatus { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("score must be between"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reported_failure_is_rejected() {
        let server = collector(
            "/api/sensor",
            ResponseTemplate::new(200)
                .set_body_string(r#"{"success": false, "error": "duplicate"}"#),
        )
        .await;

        let payload = ReadingPayload {
            signal: SignalType::Radiation,
            value: 1.5,
            unit: "pfu".to_string(),
            source_tag: "skywatch".to_string(),
            model_version: "1.2.0".to_string(),
        };
        let err = sink(server.uri()).publish_reading(&payload).await.unwrap_err();
        assert_eq!(err, SinkError::Rejected("duplicate".to_string()));
    }

    #[tokio::test]
    async fn test_non_json_success_body_still_delivers() {
        let server =
            collector("/api/sensor", ResponseTemplate::new(201).set_body_string("created")).await;

        let payload = ReadingPayload {
            signal: SignalType::SolarWind,
            value: 400.0,
            unit: "km/s".to_string(),
            source_tag: "skywatch".to_string(),
            model_version: "1.2.0".to_string(),
        };
        assert_eq!(sink(server.uri()).publish_reading(&payload).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_an_error() {
        let payload = ReadingPayload {
            signal: SignalType::SolarWind,
            value: 400.0,
            unit: "km/s".to_string(),
            source_tag: "skywatch".to_string(),
            model_version: "1.2.0".to_string(),
        };
        let result = sink("http://127.0.0.1:1".to_string())
            .publish_reading(&payload)
            .await;
        assert!(matches!(
            result,
            Err(SinkError::RequestFailed(_)) | Err(SinkError::Timeout)
        ));
    }
}
