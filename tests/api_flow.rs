//! End-to-end tests that run the real router on an ephemeral port with a
//! temporary database and local media store, driven over HTTP with reqwest.

use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use vidshare::config::Config;
use vidshare::state::AppState;
use vidshare::{db, media, routes};

struct TestApp {
    base: String,
    api: String,
    client: Client,
    temp_dir: PathBuf,
    _dir: TempDir,
}

async fn spawn_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");

    let mut config = Config::default();
    config.database.path = Some(dir.path().join("test.db"));
    config.storage.path = Some(dir.path().join("media"));
    config.storage.temp_path = Some(dir.path().join("tmp"));
    config.server.public_url = Some(base.clone());
    config.auth.secure_cookies = false;
    std::fs::create_dir_all(config.media_path()).unwrap();
    std::fs::create_dir_all(config.temp_path()).unwrap();
    let temp_dir = config.temp_path();

    let pool = db::create_pool(&config.db_path()).unwrap();
    db::run_migrations(&pool).unwrap();
    let store = media::from_config(&config).unwrap();
    let app = routes::app(AppState::new(pool, config, store)).unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        api: format!("{base}/api/v1"),
        base,
        client: Client::new(),
        temp_dir,
        _dir: dir,
    }
}

fn image(name: &str) -> Part {
    Part::bytes(b"\x89PNG fake image".to_vec())
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap()
}

impl TestApp {
    async fn register(&self, username: &str) -> Value {
        let form = Form::new()
            .text("fullName", format!("{username} Tester"))
            .text("username", username.to_string())
            .text("email", format!("{username}@example.com"))
            .text("password", "secret123")
            .part("avatar", image("avatar.png"));
        let res = self
            .client
            .post(format!("{}/user/register", self.api))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["data"].clone()
    }

    async fn login(&self, username: &str) -> Value {
        let res = self
            .client
            .post(format!("{}/user/login", self.api))
            .json(&json!({ "username": username, "password": "secret123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["data"].clone()
    }

    /// Registers and logs in; returns (user id, access token).
    async fn sign_up(&self, username: &str) -> (String, String) {
        let user = self.register(username).await;
        let session = self.login(username).await;
        (
            user["id"].as_str().unwrap().to_string(),
            session["accessToken"].as_str().unwrap().to_string(),
        )
    }

    async fn publish(&self, token: &str, title: &str) -> Value {
        let form = Form::new()
            .text("title", title.to_string())
            .text("description", format!("all about {title}"))
            .part(
                "videoFile",
                Part::bytes(b"fake mp4 bytes".to_vec())
                    .file_name("clip.mp4")
                    .mime_str("video/mp4")
                    .unwrap(),
            )
            .part("thumbnail", image("thumb.png"));
        let res = self
            .client
            .post(format!("{}/video", self.api))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["data"].clone()
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = self.client.get(format!("{}{}", self.api, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.api, path))
            .bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn healthcheck_reports_ok() {
    let app = spawn_app().await;
    let (status, body) = app.get("/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "OK");
}

#[tokio::test]
async fn register_login_and_fetch_current_user() {
    let app = spawn_app().await;
    let user = app.register("Alice").await;
    assert_eq!(user["username"], "alice");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("refreshToken").is_none());

    // Avatar is served by the local media store.
    let avatar = user["avatar"].as_str().unwrap();
    assert!(avatar.starts_with(&format!("{}/media/image/", app.base)));
    let res = app.client.get(avatar).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"\x89PNG fake image");

    let res = app
        .client
        .post(format!("{}/user/login", app.api))
        .json(&json!({ "email": "ALICE@example.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let access_cookie = res
        .cookies()
        .find(|c| c.name() == "accessToken")
        .expect("access token cookie");
    assert!(access_cookie.http_only());
    assert!(!access_cookie.secure());
    let access = access_cookie.value().to_string();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert_eq!(body["data"]["accessToken"], access.as_str());

    // Bearer header and cookie both authenticate.
    let (status, body) = app.get("/user/current-user", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@example.com");

    let res = app
        .client
        .get(format!("{}/user/current-user", app.api))
        .header("Cookie", format!("accessToken={access}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_and_login_failures() {
    let app = spawn_app().await;
    app.register("alice").await;

    // Same username again.
    let form = Form::new()
        .text("fullName", "Other")
        .text("username", "alice")
        .text("email", "other@example.com")
        .text("password", "secret123")
        .part("avatar", image("a.png"));
    let res = app
        .client
        .post(format!("{}/user/register", app.api))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Avatar is mandatory.
    let form = Form::new()
        .text("fullName", "Bob")
        .text("username", "bob")
        .text("email", "bob@example.com")
        .text("password", "secret123");
    let res = app
        .client
        .post(format!("{}/user/register", app.api))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .post(format!("{}/user/login", app.api))
        .json(&json!({ "username": "alice", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .client
        .post(format!("{}/user/login", app.api))
        .json(&json!({ "username": "nobody", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = spawn_app().await;
    let (status, body) = app.get("/user/current-user", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.get("/user/current-user", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/dashboard/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_tokens_rotate_and_logout_revokes() {
    let app = spawn_app().await;
    app.register("alice").await;
    let session = app.login("alice").await;
    let first = session["refreshToken"].as_str().unwrap().to_string();

    let refresh = |token: String| {
        let client = app.client.clone();
        let url = format!("{}/user/refresh-token", app.api);
        async move {
            client
                .post(url)
                .json(&json!({ "refreshToken": token }))
                .send()
                .await
                .unwrap()
        }
    };

    let res = refresh(first.clone()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let second = body["data"]["refreshToken"].as_str().unwrap().to_string();
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    // The replaced token is dead.
    assert_eq!(refresh(first).await.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .client
        .post(format!("{}/user/refresh-token", app.api))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(reqwest::Method::POST, "/user/logout", &access, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refresh(second).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_checks_the_old_one() {
    let app = spawn_app().await;
    let (_, token) = app.sign_up("alice").await;

    let (status, _) = app
        .send(
            reqwest::Method::POST,
            "/user/change-password",
            &token,
            Some(json!({ "oldPassword": "nope", "newPassword": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            reqwest::Method::POST,
            "/user/change-password",
            &token,
            Some(json!({ "oldPassword": "secret123", "newPassword": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let res = app
        .client
        .post(format!("{}/user/login", app.api))
        .json(&json!({ "username": "alice", "password": "fresh-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn publish_toggle_and_view_accounting() {
    let app = spawn_app().await;
    let (alice, alice_token) = app.sign_up("alice").await;
    let (_, bob_token) = app.sign_up("bob").await;

    let video = app.publish(&alice_token, "Rust in Practice").await;
    let id = video["id"].as_str().unwrap().to_string();
    assert_eq!(video["isPublished"], false);
    assert_eq!(video["duration"], 0.0);

    // Spooled uploads are gone once the request finishes.
    assert_eq!(std::fs::read_dir(&app.temp_dir).unwrap().count(), 0);

    // Drafts are invisible to everyone but the owner.
    let (status, _) = app.get(&format!("/video/v/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/video/v/{id}"), Some(&alice_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            reqwest::Method::PATCH,
            &format!("/video/toggle/publish/{id}"),
            &alice_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isPublished"], true);

    // Anonymous viewers can watch but are not counted.
    let (status, body) = app.get(&format!("/video/v/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner"]["username"], "alice");
    assert_eq!(body["data"]["isLiked"], false);

    // The owner's earlier visit counted once; bob's first visit counts, his
    // second does not.
    let (_, body) = app.get(&format!("/video/v/{id}"), Some(&bob_token)).await;
    assert_eq!(body["data"]["views"], 2);
    let (_, body) = app.get(&format!("/video/v/{id}"), Some(&bob_token)).await;
    assert_eq!(body["data"]["views"], 2);

    let (_, body) = app.get("/user/history", Some(&bob_token)).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], id.as_str());

    let (status, body) = app
        .get(&format!("/video?userId={alice}&limit=5"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalDocs"], 1);
    assert_eq!(body["data"]["limit"], 5);
    assert_eq!(body["data"]["docs"][0]["title"], "Rust in Practice");

    let (status, body) = app.get("/video?query=rust%20practise", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalDocs"], 1);

    let (status, _) = app.get("/video?limit=500", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .get(&format!("/video?page={}&limit=100", i64::MAX), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalDocs"], 1);
    assert!(body["data"]["docs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn only_owners_may_modify() {
    let app = spawn_app().await;
    let (_, alice_token) = app.sign_up("alice").await;
    let (_, bob_token) = app.sign_up("bob").await;
    let video = app.publish(&alice_token, "Mine").await;
    let id = video["id"].as_str().unwrap();

    let res = app
        .client
        .patch(format!("{}/video/v/{id}", app.api))
        .bearer_auth(&bob_token)
        .multipart(Form::new().text("title", "Stolen"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(reqwest::Method::DELETE, &format!("/video/v/{id}"), &bob_token, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let res = app
        .client
        .patch(format!("{}/video/v/{id}", app.api))
        .bearer_auth(&alice_token)
        .multipart(Form::new().text("title", "Renamed"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["description"], "all about Mine");
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let app = spawn_app().await;
    let (_, token) = app.sign_up("alice").await;
    let (status, _) = app.get("/video/v/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .send(reqwest::Method::POST, "/like/toggle/v/123", &token, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Only the stored spelling of a real id is accepted.
    let video = app.publish(&token, "Spelled").await;
    let id = video["id"].as_str().unwrap();
    let (status, _) = app.get(&format!("/video/v/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let upper = id.to_uppercase();
    let (status, _) = app.get(&format!("/video/v/{upper}"), Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let simple = id.replace('-', "");
    let (status, _) = app.get(&format!("/video/v/{simple}"), Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_video_cascades() {
    let app = spawn_app().await;
    let (_, alice_token) = app.sign_up("alice").await;
    let (_, bob_token) = app.sign_up("bob").await;
    let video = app.publish(&alice_token, "Short lived").await;
    let id = video["id"].as_str().unwrap().to_string();
    app.send(
        reqwest::Method::PATCH,
        &format!("/video/toggle/publish/{id}"),
        &alice_token,
        None,
    )
    .await;

    let (status, body) = app
        .send(
            reqwest::Method::POST,
            &format!("/comment/{id}"),
            &bob_token,
            Some(json!({ "content": "first!" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .send(reqwest::Method::POST, &format!("/like/toggle/v/{id}"), &bob_token, None)
        .await;
    assert_eq!(body["data"]["isLiked"], true);
    let (_, body) = app
        .send(
            reqwest::Method::POST,
            &format!("/like/toggle/c/{comment}"),
            &alice_token,
            None,
        )
        .await;
    assert_eq!(body["data"]["isLiked"], true);

    let (_, body) = app.get(&format!("/comment/{id}"), Some(&bob_token)).await;
    assert_eq!(body["data"]["totalDocs"], 1);
    assert_eq!(body["data"]["docs"][0]["likesCount"], 1);

    let (_, body) = app.get("/like/videos", Some(&bob_token)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(reqwest::Method::DELETE, &format!("/video/v/{id}"), &alice_token, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/video/v/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/comment/{id}"), Some(&bob_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.get("/like/videos", Some(&bob_token)).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // Stored files went with it.
    let res = app
        .client
        .get(video["videoFile"].as_str().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subscriptions_toggle_and_show_on_channel() {
    let app = spawn_app().await;
    let (alice, alice_token) = app.sign_up("alice").await;
    let (bob, bob_token) = app.sign_up("bob").await;

    let (status, _) = app
        .send(
            reqwest::Method::POST,
            &format!("/subscriptions/ch/{alice}"),
            &alice_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .send(
            reqwest::Method::POST,
            &format!("/subscriptions/ch/{alice}"),
            &bob_token,
            None,
        )
        .await;
    assert_eq!(body["data"]["isSubscribed"], true);

    let (status, body) = app.get("/user/c/alice", Some(&bob_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscribersCount"], 1);
    assert_eq!(body["data"]["isSubscribed"], true);

    let (_, body) = app
        .get(&format!("/subscriptions/ch/{alice}"), Some(&alice_token))
        .await;
    assert_eq!(body["data"][0]["username"], "bob");

    let (_, body) = app
        .get(&format!("/subscriptions/u/{bob}"), Some(&bob_token))
        .await;
    assert_eq!(body["data"][0]["username"], "alice");

    let (_, body) = app
        .send(
            reqwest::Method::POST,
            &format!("/subscriptions/ch/{alice}"),
            &bob_token,
            None,
        )
        .await;
    assert_eq!(body["data"]["isSubscribed"], false);

    let (_, body) = app.get("/dashboard/stats", Some(&alice_token)).await;
    assert_eq!(body["data"]["totalSubscribers"], 0);
}

#[tokio::test]
async fn playlists_and_tweets() {
    let app = spawn_app().await;
    let (alice, token) = app.sign_up("alice").await;
    let video = app.publish(&token, "Playlist item").await;
    let video_id = video["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            reqwest::Method::POST,
            "/playlist",
            &token,
            Some(json!({ "name": "Favourites" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let playlist = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            reqwest::Method::PATCH,
            &format!("/playlist/add/{video_id}/{playlist}"),
            &token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["videos"][0], video_id);

    let (_, body) = app.get(&format!("/playlist/{playlist}"), Some(&token)).await;
    assert_eq!(body["data"]["playlistSize"], 1);

    let (status, _) = app
        .send(
            reqwest::Method::PATCH,
            &format!("/playlist/{playlist}"),
            &token,
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/playlist/user/{alice}"), Some(&token)).await;
    assert_eq!(body["data"][0]["name"], "Favourites");

    let (status, body) = app
        .send(
            reqwest::Method::POST,
            "/tweet",
            &token,
            Some(json!({ "content": "hello world" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let tweet = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .send(reqwest::Method::POST, &format!("/like/toggle/t/{tweet}"), &token, None)
        .await;
    assert_eq!(body["data"]["isLiked"], true);

    let (_, body) = app.get(&format!("/tweet/user/{alice}"), Some(&token)).await;
    assert_eq!(body["data"][0]["content"], "hello world");
    assert_eq!(body["data"][0]["likesCount"], 1);

    let (status, _) = app
        .send(reqwest::Method::DELETE, &format!("/tweet/{tweet}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get(&format!("/tweet/user/{alice}"), Some(&token)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn replacing_images_swaps_stored_files() {
    let app = spawn_app().await;
    let user = app.register("alice").await;
    let token = app.login("alice").await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();
    let old_avatar = user["avatar"].as_str().unwrap().to_string();

    let patch_image = |path: &str, field: &'static str| {
        app.client
            .patch(format!("{}{}", app.api, path))
            .bearer_auth(&token)
            .multipart(Form::new().part(field, image("new.png")))
            .send()
    };
    let fetch = |url: String| {
        let client = app.client.clone();
        async move { client.get(url).send().await.unwrap().status() }
    };

    let res = patch_image("/user/avatar", "avatar").await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let new_avatar = body["data"]["avatar"].as_str().unwrap().to_string();
    assert_ne!(new_avatar, old_avatar);
    assert_eq!(fetch(new_avatar.clone()).await, StatusCode::OK);
    assert_eq!(fetch(old_avatar).await, StatusCode::NOT_FOUND);
    let (_, body) = app.get("/user/current-user", Some(&token)).await;
    assert_eq!(body["data"]["avatar"], new_avatar.as_str());

    // No cover yet, so nothing to drop; a second one replaces the first.
    let res = patch_image("/user/cover-image", "coverImage").await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let first_cover = body["data"]["coverImage"].as_str().unwrap().to_string();
    let res = patch_image("/user/cover-image", "coverImage").await.unwrap();
    let body: Value = res.json().await.unwrap();
    let second_cover = body["data"]["coverImage"].as_str().unwrap().to_string();
    assert_ne!(first_cover, second_cover);
    assert_eq!(fetch(first_cover).await, StatusCode::NOT_FOUND);
    assert_eq!(fetch(second_cover).await, StatusCode::OK);

    let video = app.publish(&token, "Thumbs").await;
    let id = video["id"].as_str().unwrap();
    let old_thumb = video["thumbnail"].as_str().unwrap().to_string();
    let res = patch_image(&format!("/video/v/{id}"), "thumbnail").await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let new_thumb = body["data"]["thumbnail"].as_str().unwrap().to_string();
    assert_ne!(new_thumb, old_thumb);
    assert_eq!(body["data"]["title"], "Thumbs");
    assert_eq!(fetch(old_thumb).await, StatusCode::NOT_FOUND);
    assert_eq!(fetch(new_thumb).await, StatusCode::OK);

    // A missing file is rejected before anything is stored.
    let res = app
        .client
        .patch(format!("{}/user/avatar", app.api))
        .bearer_auth(&token)
        .multipart(Form::new().text("note", "no file"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let (_, body) = app.get("/user/current-user", Some(&token)).await;
    assert_eq!(body["data"]["avatar"], new_avatar.as_str());

    assert_eq!(std::fs::read_dir(&app.temp_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn drafts_stay_hidden_from_likes_and_playlists() {
    let app = spawn_app().await;
    let (_, alice_token) = app.sign_up("alice").await;
    let (_, bob_token) = app.sign_up("bob").await;
    let video = app.publish(&alice_token, "Soon private").await;
    let id = video["id"].as_str().unwrap().to_string();
    let publish_path = format!("/video/toggle/publish/{id}");
    let toggle_publish =
        || app.send(reqwest::Method::PATCH, &publish_path, &alice_token, None);
    toggle_publish().await;

    let (_, body) = app
        .send(
            reqwest::Method::POST,
            &format!("/comment/{id}"),
            &bob_token,
            Some(json!({ "content": "nice" })),
        )
        .await;
    let comment = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .send(
            reqwest::Method::POST,
            "/playlist",
            &bob_token,
            Some(json!({ "name": "Watch later" })),
        )
        .await;
    let playlist = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(
            reqwest::Method::PATCH,
            &format!("/playlist/add/{id}/{playlist}"),
            &bob_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Back to draft.
    toggle_publish().await;

    let (status, _) = app
        .send(
            reqwest::Method::POST,
            &format!("/like/toggle/c/{comment}"),
            &bob_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app
        .send(
            reqwest::Method::POST,
            &format!("/like/toggle/c/{comment}"),
            &alice_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isLiked"], true);

    let (_, body) = app
        .get(&format!("/playlist/{playlist}"), Some(&bob_token))
        .await;
    assert!(body["data"]["videos"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["playlistSize"], 0);
    let (_, body) = app
        .get(&format!("/playlist/{playlist}"), Some(&alice_token))
        .await;
    assert_eq!(body["data"]["playlistSize"], 1);
}
