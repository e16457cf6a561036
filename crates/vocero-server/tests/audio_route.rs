//! `POST /audio` end to end against mock Gemini and ElevenLabs upstreams.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;
use vocero_server::api_audio::{AudioResponse, AudioResult};
use vocero_server::config::Config;
use vocero_server::{app, AppState};

const BOUNDARY: &str = "vocero-test-boundary";
const FAKE_MP3: &[u8] = b"ID3\x03\x00fake";

/// What the mock Gemini answers with.
#[derive(Clone)]
enum Script {
    /// Transcribes to `question`; answers via the website tool when the
    /// question mentions "web", directly otherwise.
    Answer { question: String },
    /// Refuses to transcribe.
    BlockTranscription,
    /// Transcribes, then blocks the question.
    BlockQuestion { question: String },
}

#[derive(Clone)]
struct Upstream {
    script: Script,
    gemini_bodies: Arc<Mutex<Vec<Value>>>,
}

fn text_reply(text: &str) -> Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}]})
}

fn gemini_reply(script: &Script, body: &Value) -> Value {
    let contents = body["contents"].as_array().cloned().unwrap_or_default();
    let is_transcription = contents
        .first()
        .map(|c| c["parts"][1].get("inlineData").is_some())
        .unwrap_or(false);

    match (script, is_transcription) {
        (Script::BlockTranscription, true) => json!({"promptFeedback": {"blockReason": "OTHER"}}),
        (Script::Answer { question } | Script::BlockQuestion { question }, true) => {
            text_reply(question)
        }
        (Script::BlockQuestion { .. }, false) => json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        (Script::Answer { question }, false) if contents.len() == 1 && question.contains("web") => {
            json!({"candidates": [{"content": {"role": "model", "parts": [
                {"functionCall": {"name": "get_official_website", "args": {}}}
            ]}, "finishReason": "STOP"}]})
        }
        (_, false) if contents.len() == 3 => {
            let website = contents[2]["parts"][0]["functionResponse"]["response"]["website"]
                .as_str()
                .unwrap_or("sin dato")
                .to_string();
            text_reply(&format!("Con gusto. {}.", website))
        }
        _ => text_reply("Fuimos fundados en 1972."),
    }
}

async fn upstream(State(state): State<Upstream>, uri: Uri, body: Bytes) -> Response {
    if uri.path().starts_with("/v1/text-to-speech/") {
        return (StatusCode::OK, FAKE_MP3.to_vec()).into_response();
    }
    let body: Value = serde_json::from_slice(&body).unwrap();
    state.gemini_bodies.lock().unwrap().push(body.clone());
    Json(gemini_reply(&state.script, &body)).into_response()
}

async fn spawn_upstream(script: Script) -> (String, Arc<Mutex<Vec<Value>>>) {
    let gemini_bodies = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new().fallback(upstream).with_state(Upstream {
        script,
        gemini_bodies: gemini_bodies.clone(),
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), gemini_bodies)
}

fn config(dir: &Path, base: &str, elevenlabs_key: &str) -> Config {
    let knowledge = dir.join("informacion_eci.txt");
    std::fs::write(&knowledge, "La Escuela fue fundada en 1972.").unwrap();

    let mut config = Config::default();
    config.paths.knowledge_path = knowledge;
    config.paths.static_dir = dir.join("static");
    config.paths.frontend_dir = dir.join("frontend");
    config.gemini.api_key = "g-key".to_string();
    config.gemini.base_url = format!("{}/v1beta", base);
    config.elevenlabs.api_key = elevenlabs_key.to_string();
    config.elevenlabs.base_url = base.to_string();
    config
}

fn multipart_request(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/audio")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn post_audio(config: &Config, request: Request<Body>) -> (StatusCode, Value) {
    let app = app(AppState::from_config(config).unwrap());
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn website_question_is_answered_and_spoken() {
    let (base, gemini_bodies) = spawn_upstream(Script::Answer {
        question: "¿Cuál es la página web oficial?".to_string(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &base, "e-key");

    let (status, body) = post_audio(
        &config,
        multipart_request("audio", "pregunta.webm", "application/octet-stream", b"webm-bytes"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: AudioResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.result, AudioResult::Ok);
    assert!(response.text.contains("www.escuelaing.edu.co"));
    assert!(response.reason.is_none());
    assert!(response.video.is_none());

    let file = response.file.expect("speech file");
    assert_eq!(
        std::fs::read(dir.path().join("static").join(&file)).unwrap(),
        FAKE_MP3
    );

    // transcription, phase one, phase two
    let bodies = gemini_bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 3);
    assert_eq!(
        bodies[0]["contents"][0]["parts"][1]["inlineData"]["mimeType"],
        "audio/webm"
    );
    assert_eq!(bodies[2]["contents"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn direct_answer_needs_no_tool() {
    let (base, gemini_bodies) = spawn_upstream(Script::Answer {
        question: "¿Cuándo fue fundada la escuela?".to_string(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &base, "e-key");

    let (_, body) = post_audio(
        &config,
        multipart_request("audio", "q.mp3", "audio/mpeg", b"mp3-bytes"),
    )
    .await;

    assert_eq!(body["result"], "ok");
    assert_eq!(body["text"], "Fuimos fundados en 1972.");
    assert_eq!(gemini_bodies.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn failed_transcription_is_spoken_back() {
    let (base, gemini_bodies) = spawn_upstream(Script::BlockTranscription).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &base, "e-key");

    let (status, body) = post_audio(
        &config,
        multipart_request("audio", "q.ogg", "audio/ogg", b"ogg-bytes"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "error");
    assert_eq!(body["reason"], "transcription_blocked");
    assert!(body["text"]
        .as_str()
        .unwrap()
        .starts_with("Transcripción bloqueada"));
    assert!(body["file"].is_string());
    assert_eq!(gemini_bodies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn blocked_answer_reports_reason() {
    let (base, _) = spawn_upstream(Script::BlockQuestion {
        question: "pregunta ofensiva".to_string(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &base, "e-key");

    let (_, body) = post_audio(
        &config,
        multipart_request("audio", "q.wav", "audio/wav", b"wav-bytes"),
    )
    .await;

    assert_eq!(body["result"], "error");
    assert_eq!(body["reason"], "SAFETY");
    assert!(body["text"].as_str().unwrap().contains("SAFETY"));
    assert!(body["file"].is_string());
}

#[tokio::test]
async fn speech_failure_leaves_file_empty() {
    let (base, _) = spawn_upstream(Script::Answer {
        question: "¿Cuándo fue fundada la escuela?".to_string(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &base, "");

    let (status, body) = post_audio(
        &config,
        multipart_request("audio", "q.webm", "audio/webm", b"webm-bytes"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "ok");
    assert!(body["file"].is_null());
}

#[tokio::test]
async fn missing_audio_field_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "http://127.0.0.1:9", "e-key");

    let (status, body) = post_audio(
        &config,
        multipart_request("recording", "q.webm", "audio/webm", b"webm-bytes"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("audio"));
}

#[tokio::test]
async fn generated_audio_is_served_from_static() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "http://127.0.0.1:9", "e-key");
    let static_dir = dir.path().join("static");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("response-test.mp3"), FAKE_MP3).unwrap();

    let app = app(AppState::from_config(&config).unwrap());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/static/response-test.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], FAKE_MP3);
}
