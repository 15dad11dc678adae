//! Remote playback source tests against a local HTTP server

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voice_bridge::application::ports::{
    AudioSession, EventSink, PlayerError, SessionCategory, SessionError,
};
use voice_bridge::application::{BridgeAdapter, BridgeConfig, BridgePorts};
use voice_bridge::domain::error::VoiceErrorCode;
use voice_bridge::domain::voice::{
    BridgeReply, BridgeRequest, MsgType, OutputRoute, ResourceResolver, ResourceUrl, VoiceEvent,
    VoiceState,
};
use voice_bridge::infrastructure::playback::fetch_remote;
use voice_bridge::infrastructure::{AmrTranscoder, CpalRecorder, RodioPlayer};

#[derive(Default)]
struct Recorded(Mutex<Vec<VoiceEvent>>);

impl EventSink for Recorded {
    fn emit(&self, event: VoiceEvent) {
        self.0.lock().unwrap().push(event);
    }
}

struct QuietSession;

#[async_trait]
impl AudioSession for QuietSession {
    async fn acquire(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn configure(&self, _category: SessionCategory) -> Result<(), SessionError> {
        Ok(())
    }

    async fn set_output_route(&self, _route: OutputRoute) -> Result<(), SessionError> {
        Ok(())
    }

    fn output_route(&self) -> OutputRoute {
        OutputRoute::Speaker
    }
}

fn bridge(dir: &Path, events: Arc<Recorded>) -> BridgeAdapter {
    let config = BridgeConfig::new(ResourceResolver::new(
        dir.join("storage"),
        dir.join("bundle"),
    ));
    let ports = BridgePorts {
        player: Arc::new(RodioPlayer::new()),
        recorder: Arc::new(CpalRecorder::new()),
        transcoder: Arc::new(AmrTranscoder::new()),
        session: Arc::new(QuietSession),
        events,
    };
    BridgeAdapter::new(config, ports)
}

#[tokio::test]
async fn fetch_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clips/beep.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFF-bytes".to_vec()))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let body = fetch_remote(&client, &format!("{}/clips/beep.wav", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, b"RIFF-bytes");
}

#[tokio::test]
async fn fetch_non_success_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let err = fetch_remote(&client, &format!("{}/missing.mp3", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, PlayerError::Network(_)));
}

#[tokio::test]
async fn player_loads_remote_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 64]))
        .mount(&server)
        .await;

    let player = RodioPlayer::new();
    let url = ResourceUrl::Remote(format!("{}/song.mp3", server.uri()));
    let bytes = player.load(&url).await.unwrap();
    assert_eq!(bytes.len(), 64);
}

#[tokio::test]
async fn failed_remote_playback_reports_network_then_stopped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let events = Arc::new(Recorded::default());
    let bridge = bridge(dir.path(), Arc::clone(&events));

    let url = format!("{}/y.mp3", server.uri());
    let reply = bridge
        .handle(&BridgeRequest::new(
            "startPlayingAudio",
            vec![json!("remote"), json!(url)],
        ))
        .await;
    assert_eq!(reply, BridgeReply::Ack);

    let seen = events.0.lock().unwrap().clone();
    assert_eq!(seen.len(), 2, "events: {:?}", seen);
    assert_eq!(seen[0].msg_type, MsgType::Error);
    assert_eq!(seen[0].as_error().unwrap().code, VoiceErrorCode::Network);
    assert_eq!(seen[1].as_state(), Some(VoiceState::Stopped));

    // The failed start created the entry, so it is gone again
    assert!(bridge.snapshot("remote").await.is_none());
}
