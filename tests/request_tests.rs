use std::sync::Arc;

use feedback_manager::ai::client::{FeedbackClient, build_request, interpret_response};
use feedback_manager::core::config::AppConfig;
use feedback_manager::core::credentials::CredentialStore;
use feedback_manager::core::models::{Credentials, FeedbackStyle};
use feedback_manager::core::storage::{KeyValueStore, MemoryStore};
use feedback_manager::errors::FeedbackError;
use feedback_manager::features::{ConfigurationStatus, FeedbackService};
use feedback_manager::prompt::prompt_for;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Local test servers must be reached directly, never through an environment proxy.
fn local_client() -> FeedbackClient {
    FeedbackClient::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

fn credentials_for(endpoint: &str) -> Credentials {
    Credentials::new("sk-test-key", "gpt-4o-mini", endpoint)
}

/// Serves exactly one HTTP response and hands back the raw request it received.
async fn serve_once(
    status_line: &'static str,
    body: &'static str,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if request_complete(&raw) {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
    });

    (format!("http://{addr}/v1/chat/completions"), rx)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    raw.len() >= header_end + 4 + content_length
}

fn request_body(raw: &str) -> Value {
    let start = raw.find("\r\n\r\n").unwrap() + 4;
    serde_json::from_str(&raw[start..]).unwrap()
}

async fn service_with(creds: Option<Credentials>) -> FeedbackService {
    let store = CredentialStore::new(Arc::new(MemoryStore::new()), "https://api.openai.com/v1/chat/completions");
    if let Some(creds) = creds {
        assert!(store.save(&creds).await);
    }
    FeedbackService::new(store, local_client(), AppConfig::default())
}

#[test]
fn test_build_request_for_concise_notes() {
    let creds = credentials_for("https://api.openai.com/v1/chat/completions");
    let spec = build_request(
        "Shipped the Q3 report on time",
        FeedbackStyle::Concise,
        None,
        &creds,
        0.7,
        500,
    )
    .unwrap();

    assert_eq!(spec.endpoint, creds.api_endpoint);
    assert_eq!(spec.headers[AUTHORIZATION], "Bearer sk-test-key");
    assert_eq!(
        spec.body["messages"][0]["content"],
        prompt_for(FeedbackStyle::Concise)
    );
    assert!(
        spec.body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("Shipped the Q3 report on time")
    );
}

#[test]
fn test_build_request_with_custom_instruction() {
    let creds = credentials_for("https://api.openai.com/v1/chat/completions");
    let custom = "Answer with exactly one encouraging sentence.";
    let spec = build_request("Fixed the flaky CI job", FeedbackStyle::Custom, Some(custom), &creds, 0.7, 500)
        .unwrap();

    assert_eq!(spec.body["messages"][0]["content"], custom);
    assert_ne!(
        spec.body["messages"][0]["content"],
        prompt_for(FeedbackStyle::Default)
    );
}

#[test]
fn test_remote_error_message_is_extracted() {
    let err = interpret_response(
        StatusCode::UNAUTHORIZED,
        r#"{"error":{"message":"invalid api key"}}"#,
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "invalid api key");
    match err {
        FeedbackError::Remote { status, .. } => assert_eq!(status, StatusCode::UNAUTHORIZED),
        other => panic!("Unexpected error type: {other:?}"),
    }
}

#[test]
fn test_unparseable_error_body_reports_status_code() {
    let err = interpret_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("500"), "message was {message:?}");
    assert_eq!(message, "API request failed: 500 Internal Server Error");
}

#[test]
fn test_success_returns_first_completion_unchanged() {
    let text = interpret_response(
        StatusCode::OK,
        r#"{"choices":[{"message":{"content":"Great work!"}},{"message":{"content":"ignored"}}]}"#,
    )
    .unwrap();
    assert_eq!(text, "Great work!");
}

#[tokio::test]
async fn test_execute_against_local_server() {
    let (endpoint, captured) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"Great work!"}}]}"#,
    )
    .await;

    let creds = credentials_for(&endpoint);
    let spec = build_request("Shipped the Q3 report on time", FeedbackStyle::Strength, None, &creds, 0.7, 500)
        .unwrap();
    let reply = local_client().execute(spec).await.unwrap();
    assert_eq!(reply, "Great work!");

    let raw = captured.await.unwrap();
    assert!(raw.starts_with("POST /v1/chat/completions HTTP/1.1"));
    assert!(
        raw.lines()
            .any(|l| l.eq_ignore_ascii_case("authorization: Bearer sk-test-key"))
    );

    let body = request_body(&raw);
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["max_tokens"], 500);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], prompt_for(FeedbackStyle::Strength));
}

#[tokio::test]
async fn test_execute_surfaces_remote_error() {
    let (endpoint, _captured) = serve_once(
        "401 Unauthorized",
        r#"{"error":{"message":"invalid api key","type":"invalid_request_error"}}"#,
    )
    .await;

    let spec = build_request("notes", FeedbackStyle::Default, None, &credentials_for(&endpoint), 0.7, 500)
        .unwrap();
    let err = local_client().execute(spec).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid api key");
}

#[tokio::test]
async fn test_execute_connection_refused_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let spec = build_request(
        "notes",
        FeedbackStyle::Default,
        None,
        &credentials_for(&format!("http://{addr}/v1/chat/completions")),
        0.7,
        500,
    )
    .unwrap();
    let err = local_client().execute(spec).await.unwrap_err();
    assert!(matches!(err, FeedbackError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_get_feedback_without_credentials() {
    let service = service_with(None).await;
    let err = service
        .get_feedback("Shipped the Q3 report on time", FeedbackStyle::Default, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::MissingCredentials));
}

#[tokio::test]
async fn test_get_feedback_rejects_blank_notes() {
    let service = service_with(Some(credentials_for("https://api.openai.com/v1/chat/completions"))).await;
    let err = service
        .get_feedback("  \n\t ", FeedbackStyle::Default, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::EmptyNotes));
}

#[tokio::test]
async fn test_get_feedback_custom_style_without_instruction() {
    let service = service_with(Some(credentials_for("https://api.openai.com/v1/chat/completions"))).await;
    let err = service
        .get_feedback("Ran the offsite", FeedbackStyle::Custom, Some(" "))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::InvalidCustomPrompt(_)));
}

#[tokio::test]
async fn test_get_feedback_end_to_end_trims_notes() {
    let (endpoint, captured) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"content":"Keep it up."}}]}"#,
    )
    .await;

    let service = service_with(Some(credentials_for(&endpoint))).await;
    let reply = service
        .get_feedback("   Shipped the Q3 report on time \n", FeedbackStyle::Concise, None)
        .await
        .unwrap();
    assert_eq!(reply, "Keep it up.");

    let body = request_body(&captured.await.unwrap());
    assert_eq!(body["temperature"], 0.7);
    let user_message = body["messages"][1]["content"].as_str().unwrap();
    assert!(user_message.contains("\"Shipped the Q3 report on time\""));
}

#[tokio::test]
async fn test_check_configuration_states() {
    let service = service_with(None).await;
    assert_eq!(
        service.check_configuration().await,
        ConfigurationStatus::MissingApiKey
    );

    let service = service_with(Some(Credentials::new(
        "sk-abc",
        "",
        "https://api.openai.com/v1/chat/completions",
    )))
    .await;
    assert_eq!(
        service.check_configuration().await,
        ConfigurationStatus::MissingModelName
    );

    let service = service_with(Some(credentials_for("https://api.openai.com/v1/chat/completions"))).await;
    let status = service.check_configuration().await;
    assert!(status.is_ready());
    assert_eq!(status.to_string(), "Ready to provide feedback");
}

#[tokio::test]
async fn test_check_configuration_unreadable_record() {
    let backend = Arc::new(MemoryStore::new());
    backend
        .set(feedback_manager::core::credentials::STORAGE_KEY, "enc_@@@")
        .await
        .unwrap();
    let store = CredentialStore::new(backend, "https://api.openai.com/v1/chat/completions");
    let service = FeedbackService::new(store, local_client(), AppConfig::default());

    assert_eq!(
        service.check_configuration().await,
        ConfigurationStatus::Unreadable
    );
}
