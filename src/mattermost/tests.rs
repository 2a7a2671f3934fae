use super::*;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> MattermostClient {
    let config = MattermostConfig {
        url: format!("{}/", server.uri()),
        token: "tok".into(),
        ..MattermostConfig::default()
    };
    MattermostClient::new(&config)
}

#[tokio::test]
async fn test_get_team_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/teams/name/test"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "team1", "name": "test"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let team = client_for(&server).get_team_by_name("test").await.unwrap();
    assert_eq!(team.id, "team1");
    assert_eq!(team.name, "test");
}

#[tokio::test]
async fn test_get_team_not_found_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/teams/name/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "id": "app.team.get_by_name.missing.app_error",
            "message": "Unable to find the existing team."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_team_by_name("missing")
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("get team"));
    assert!(msg.contains("404"));
    assert!(msg.contains("Unable to find the existing team."));
}

#[tokio::test]
async fn test_get_channel_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/teams/team1/channels/name/twilio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chan1",
            "team_id": "team1",
            "name": "twilio",
            "display_name": "Twilio"
        })))
        .mount(&server)
        .await;

    let channel = client_for(&server)
        .get_channel_by_name("team1", "twilio")
        .await
        .unwrap();
    assert_eq!(channel.id, "chan1");
    assert_eq!(channel.team_id, "team1");
}

#[tokio::test]
async fn test_upload_file_sends_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/files"))
        .and(header("Authorization", "Bearer tok"))
        .and(body_string_contains("name=\"channel_id\""))
        .and(body_string_contains("chan1"))
        .and(body_string_contains("filename=\"twilio-picture.jpeg\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "file_infos": [{"id": "f1", "name": "twilio-picture.jpeg"}],
            "client_ids": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client_for(&server)
        .upload_file(b"jpegdata".to_vec(), "chan1", "twilio-picture.jpeg")
        .await
        .unwrap();
    assert_eq!(info.id, "f1");
    assert_eq!(info.name, "twilio-picture.jpeg");
}

#[tokio::test]
async fn test_upload_file_without_file_infos_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/files"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"file_infos": []})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .upload_file(vec![1, 2, 3], "chan1", "x.png")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no file_infos"));
}

#[tokio::test]
async fn test_create_post_sends_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/posts"))
        .and(body_json(serde_json::json!({
            "channel_id": "chan1",
            "user_id": "bot1",
            "message": "hello",
            "file_ids": ["f1"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "post1",
            "channel_id": "chan1",
            "file_ids": ["f1"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let post = client_for(&server)
        .create_post(OutboundPost {
            channel_id: "chan1".into(),
            user_id: "bot1".into(),
            message: "hello".into(),
            file_ids: vec!["f1".into()],
        })
        .await
        .unwrap();
    assert_eq!(post.id, "post1");
    assert_eq!(post.file_ids, vec!["f1"]);
}

#[tokio::test]
async fn test_create_post_error_with_plain_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/posts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_post(OutboundPost {
            channel_id: "c".into(),
            user_id: "u".into(),
            message: "m".into(),
            file_ids: vec![],
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("upstream exploded"));
}

#[tokio::test]
async fn test_ensure_bot_reuses_existing_bot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users/username/twilio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "bot1",
            "username": "twilio",
            "is_bot": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/bots"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let id = client_for(&server)
        .ensure_bot(&BotConfig::default())
        .await
        .unwrap();
    assert_eq!(id, "bot1");
}

#[tokio::test]
async fn test_ensure_bot_creates_missing_bot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users/username/twilio"))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            serde_json::json!({"message": "Unable to find an existing account matching your username for this team."}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/bots"))
        .and(body_json(serde_json::json!({
            "username": "twilio",
            "display_name": "Twilio",
            "description": "Parses images sent from twilio"
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({"user_id": "bot2", "username": "twilio"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let id = client_for(&server)
        .ensure_bot(&BotConfig::default())
        .await
        .unwrap();
    assert_eq!(id, "bot2");
}

#[tokio::test]
async fn test_ensure_bot_rejects_regular_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users/username/twilio"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "u1", "username": "twilio"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .ensure_bot(&BotConfig::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not a bot"));
}

#[test]
fn test_endpoint_strips_trailing_slash() {
    let client = MattermostClient::new(&MattermostConfig {
        url: "https://chat.example.com///".into(),
        token: "t".into(),
        ..MattermostConfig::default()
    });
    assert_eq!(
        client.endpoint("/posts"),
        "https://chat.example.com/api/v4/posts"
    );
}
