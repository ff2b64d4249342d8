//! Integration tests for HttpPredictionClient.
//!
//! Uses wiremock for the prediction service. Covers the success path, status
//! mapping, malformed bodies, transport failures and the health check.

use std::time::Duration;

use serde_json::json;
use vocation_core::{
    HttpPredictionClient, PredictionConfig, PredictionError, PredictionService,
    QuestionnaireResponse, QUESTION_COUNT,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(uri: &str) -> HttpPredictionClient {
    let config = PredictionConfig::default()
        .with_base_url(uri)
        .with_timeout_secs(1)
        .with_health_timeout_secs(1);
    HttpPredictionClient::new(config).expect("failed to create client")
}

fn all_threes() -> QuestionnaireResponse {
    QuestionnaireResponse::from_answers([3; QUESTION_COUNT]).unwrap()
}

fn all_threes_json() -> serde_json::Value {
    let mut body = json!({});
    for i in 1..=QUESTION_COUNT {
        body[format!("q{}", i)] = json!(3);
    }
    body
}

fn service_body() -> serde_json::Value {
    json!({
        "predictions": { "X": 80.0, "Y": 20.0 },
        "top_5": [{ "speciality": "X", "percentage": 80.0, "rank": 1 }]
    })
}

/// A base URL nothing listens on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_predict_success_sends_questionnaire_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(all_threes_json()))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    let result = client.predict(&all_threes()).await.expect("predict failed");

    assert_eq!(result.raw_scores.get("X"), Some(&80.0));
    assert_eq!(result.raw_scores.get("Y"), Some(&20.0));
    assert_eq!(result.top.len(), 1);
    assert_eq!(result.top[0].name, "X");
    assert_eq!(result.top[0].rank, 1);
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_body()))
        .mount(&mock_server)
        .await;

    let client = client_for(&format!("{}/", mock_server.uri()));
    assert!(client.predict(&all_threes()).await.is_ok());
}

#[tokio::test]
async fn test_every_call_reaches_the_service() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_body()))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    for _ in 0..3 {
        client.predict(&all_threes()).await.unwrap();
    }
}

#[tokio::test]
async fn test_non_success_status_keeps_body_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(503).set_body_string(r#"{"detail":"model not loaded"}"#),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    match client.predict(&all_threes()).await {
        Err(PredictionError::RemoteRejected { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, r#"{"detail":"model not loaded"}"#);
        }
        other => panic!("expected RemoteRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_error_from_service_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad input"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    let result = client.predict(&all_threes()).await;
    assert!(matches!(
        result,
        Err(PredictionError::RemoteRejected { status: 422, .. })
    ));
}

#[tokio::test]
async fn test_malformed_bodies() {
    let cases = vec![
        json!({ "predictions": { "X": 80.0 } }),
        json!({ "predictions": "X", "top_5": [] }),
        json!({
            "predictions": { "X": 80.0 },
            "top_5": [{ "speciality": "Z", "percentage": 80.0, "rank": 1 }]
        }),
        json!({
            "predictions": { "X": 80.0, "Y": 20.0 },
            "top_5": [
                { "speciality": "X", "percentage": 80.0, "rank": 2 },
                { "speciality": "Y", "percentage": 20.0, "rank": 1 }
            ]
        }),
        json!({
            "predictions": { "a": 1.0, "b": 1.0, "c": 1.0, "d": 1.0, "e": 1.0, "f": 1.0 },
            "top_5": [
                { "speciality": "a", "percentage": 1.0, "rank": 1 },
                { "speciality": "b", "percentage": 1.0, "rank": 2 },
                { "speciality": "c", "percentage": 1.0, "rank": 3 },
                { "speciality": "d", "percentage": 1.0, "rank": 4 },
                { "speciality": "e", "percentage": 1.0, "rank": 5 },
                { "speciality": "f", "percentage": 1.0, "rank": 6 }
            ]
        }),
    ];

    for body in cases {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server.uri());
        let result = client.predict(&all_threes()).await;
        assert!(
            matches!(result, Err(PredictionError::MalformedResponse { .. })),
            "body {} gave {:?}",
            body,
            result
        );
    }
}

#[tokio::test]
async fn test_non_json_success_body_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    let result = client.predict(&all_threes()).await;
    assert!(matches!(
        result,
        Err(PredictionError::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let client = client_for(&closed_port_url());
    let result = client.predict(&all_threes()).await;
    assert!(matches!(result, Err(PredictionError::Unreachable { .. })));
}

#[tokio::test]
async fn test_timeout_is_unreachable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(service_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    let result = client.predict(&all_threes()).await;
    assert!(matches!(result, Err(PredictionError::Unreachable { .. })));
}

#[tokio::test]
async fn test_specialties() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/specialties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "specialties": ["Medicine", "Law", "Software Engineering"],
            "count": 3
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    let names = client.specialties().await.unwrap();
    assert_eq!(names, vec!["Medicine", "Law", "Software Engineering"]);
}

#[tokio::test]
async fn test_specialties_when_model_not_loaded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/specialties"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    assert!(matches!(
        client.specialties().await,
        Err(PredictionError::RemoteRejected { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_is_live() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "healthy" })))
        .mount(&mock_server)
        .await;

    assert!(client_for(&mock_server.uri()).is_live().await);
}

#[tokio::test]
async fn test_is_live_false_on_503_or_refused() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    assert!(!client_for(&mock_server.uri()).is_live().await);
    assert!(!client_for(&closed_port_url()).is_live().await);
}

#[tokio::test]
async fn test_is_live_requires_exactly_200() {
    for status in [201, 202, 204] {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        assert!(
            !client_for(&mock_server.uri()).is_live().await,
            "HTTP {status} must not count as live"
        );
    }
}
