//! HTTP API integration tests
//! Runs the router on an ephemeral port with the in-memory store and drives it with reqwest

use std::io::{Cursor, Write};
use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use reqwest::{header, multipart, Client, StatusCode};
use serde_json::{json, Value};
use zip::write::SimpleFileOptions;

use contract_analyzer::analysis::{ContractAnalyzer, MockAnalyzer};
use contract_analyzer::api::{create_router, AppState};
use contract_analyzer::auth::{AuthService, PasswordHasher, TokenService};
use contract_analyzer::store::MemoryStore;

const SECRET: &[u8] = b"api-test-secret";
const UNAUTHENTICATED: &str = "Invalid or missing credentials";

struct TestServer {
    base: String,
    client: Client,
    store: MemoryStore,
    tokens: TokenService,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/users/register"))
            .json(&json!({
                "username": username,
                "full_name": format!("{} Tester", username),
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Register a user and return a bearer token for them
    async fn signed_in(&self, username: &str) -> String {
        let email = format!("{}@example.com", username);
        assert_eq!(
            self.register(username, &email, "password123").await.status(),
            StatusCode::CREATED
        );

        let body: Value = self
            .login(&email, "password123")
            .await
            .json()
            .await
            .unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn upload(&self, token: &str, filename: &str, bytes: Vec<u8>) -> reqwest::Response {
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        self.client
            .post(self.url("/contracts/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

async fn start_server(analyzer: Option<Arc<dyn ContractAnalyzer>>) -> TestServer {
    let store = MemoryStore::new();
    let tokens = TokenService::new(SECRET, Algorithm::HS256, Duration::minutes(600));
    let auth = AuthService::new(PasswordHasher::new(4), tokens.clone(), Arc::new(store.clone()));
    let state = AppState::new(auth, Arc::new(store.clone()), analyzer, 1024 * 1024);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        client: Client::new(),
        store,
        tokens,
    }
}

async fn start_with_mock() -> TestServer {
    start_server(Some(Arc::new(MockAnalyzer))).await
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

async fn assert_unauthenticated(response: reqwest::Response) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": UNAUTHENTICATED }));
}

// Public routes

#[tokio::test]
async fn test_root_is_public() {
    let server = start_with_mock().await;

    let response = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Contract analysis API is running");
}

#[tokio::test]
async fn test_register_returns_public_profile() {
    let server = start_with_mock().await;

    let response = server
        .register("alice", "alice@example.com", "password123")
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["full_name"], "alice Tester");
    assert!(body["id"].is_i64());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_is_bad_request() {
    let server = start_with_mock().await;
    server.register("alice", "alice@example.com", "pw").await;

    let response = server.register("alice2", "alice@example.com", "pw").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_issues_bearer_token() {
    let server = start_with_mock().await;
    server.register("bob", "bob@example.com", "hunter22").await;

    let response = server.login("bob@example.com", "hunter22").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap();
    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn test_login_failures_share_one_response() {
    let server = start_with_mock().await;
    server.register("bob", "bob@example.com", "hunter22").await;

    let wrong_password = server.login("bob@example.com", "nope").await;
    let unknown_email = server.login("ghost@example.com", "hunter22").await;

    for response in [wrong_password, unknown_email] {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Invalid email or password" }));
    }
}

// Gate

#[tokio::test]
async fn test_me_with_valid_token() {
    let server = start_with_mock().await;
    let token = server.signed_in("carol").await;

    let response = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "carol");
    assert_eq!(body["email"], "carol@example.com");
}

#[tokio::test]
async fn test_rejections_are_identical() {
    let server = start_with_mock().await;
    let token = server.signed_in("dave").await;
    let me: Value = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let user_id = me["id"].as_i64().unwrap();

    let expired = server
        .tokens
        .issue_at(user_id, Duration::minutes(1), Utc::now() - Duration::hours(1))
        .unwrap();
    let foreign = TokenService::new(b"another-secret", Algorithm::HS256, Duration::minutes(5))
        .issue(user_id, Duration::minutes(5))
        .unwrap();

    let no_header = server.client.get(server.url("/users/me"));
    let wrong_scheme = server
        .client
        .get(server.url("/users/me"))
        .header(header::AUTHORIZATION, format!("Basic {}", token));
    let garbage = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth("garbage");
    let expired = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth(&expired);
    let foreign = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth(&foreign);

    for request in [no_header, wrong_scheme, garbage, expired, foreign] {
        assert_unauthenticated(request.send().await.unwrap()).await;
    }
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let server = start_with_mock().await;
    let token = server.signed_in("erin").await;
    let user_id = server.tokens.verify(&token).unwrap();

    assert!(server.store.delete_user(user_id).await);

    let response = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_unauthenticated(response).await;
}

#[tokio::test]
async fn test_contract_routes_require_auth() {
    let server = start_with_mock().await;

    let list = server.client.get(server.url("/contracts")).send().await.unwrap();
    assert_unauthenticated(list).await;

    let get = server.client.get(server.url("/contracts/1")).send().await.unwrap();
    assert_unauthenticated(get).await;

    let delete = server
        .client
        .delete(server.url("/contracts/1"))
        .send()
        .await
        .unwrap();
    assert_unauthenticated(delete).await;

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(docx(&["x"])).file_name("x.docx"),
    );
    let upload = server
        .client
        .post(server.url("/contracts/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_unauthenticated(upload).await;
}

// Contracts

#[tokio::test]
async fn test_contract_lifecycle() {
    let server = start_with_mock().await;
    let token = server.signed_in("frank").await;

    // Empty listing is a 404
    let response = server
        .client
        .get(server.url("/contracts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Upload
    let response = server
        .upload(&token, "services.docx", docx(&["SERVICE AGREEMENT", "Between Acme and Globex"]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded: Value = response.json().await.unwrap();
    assert_eq!(uploaded["filename"], "services.docx");
    assert_eq!(uploaded["uploaded_by"], "frank");
    assert_eq!(uploaded["analysis"]["parties"], json!(["Company X", "Client Y"]));
    assert!(uploaded["analysis"]["additional_data"]
        .as_str()
        .unwrap()
        .contains("Between Acme and Globex"));
    let id = uploaded["id"].as_i64().unwrap();

    // Fetch by id and by name
    let by_id: Value = server
        .client
        .get(server.url(&format!("/contracts/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_id["parties"], "Company X; Client Y");
    assert_eq!(
        by_id["obligations"],
        "Deliver the service within 12 months.\nPay in 5 equal monthly installments."
    );

    let by_name: Value = server
        .client
        .get(server.url("/contracts/by-name/services.docx"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_name["id"], id);

    // List
    let list: Value = server
        .client
        .get(server.url("/contracts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total"], 1);
    assert_eq!(list["contracts"][0]["id"], id);

    // Partial update
    let response = server
        .client
        .put(server.url(&format!("/contracts/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "termination_clauses": "Ends on 2025-12-31" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert!(updated["message"].is_string());
    assert_eq!(
        updated["updated_contract"]["termination_clauses"],
        "Ends on 2025-12-31"
    );
    assert_eq!(updated["updated_contract"]["parties"], "Company X; Client Y");

    // Delete, then it is gone
    let response = server
        .client
        .delete(server.url(&format!("/contracts/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .client
        .get(server.url(&format!("/contracts/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_upload_rejects_unsupported_extension() {
    let server = start_with_mock().await;
    let token = server.signed_in("gina").await;

    let response = server
        .upload(&token, "notes.txt", b"plain text".to_vec())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_duplicate_filename_conflicts() {
    let server = start_with_mock().await;
    let token = server.signed_in("hank").await;

    let first = server.upload(&token, "lease.docx", docx(&["Lease"])).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = server.upload(&token, "lease.docx", docx(&["Lease v2"])).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_upload_unreadable_document() {
    let server = start_with_mock().await;
    let token = server.signed_in("ivy").await;

    let response = server
        .upload(&token, "broken.docx", b"not a zip archive".to_vec())
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_upload_without_analyzer_is_unavailable() {
    let server = start_server(None).await;
    let token = server.signed_in("jack").await;

    let response = server.upload(&token, "nda.docx", docx(&["NDA"])).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_update_and_delete_unknown_contract() {
    let server = start_with_mock().await;
    let token = server.signed_in("kate").await;

    let update = server
        .client
        .put(server.url("/contracts/999"))
        .bearer_auth(&token)
        .json(&json!({ "parties": "Nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let delete = server
        .client
        .delete(server.url("/contracts/999"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_onto_existing_filename_conflicts() {
    let server = start_with_mock().await;
    let token = server.signed_in("liam").await;

    server.upload(&token, "a.docx", docx(&["A"])).await;
    let second: Value = server
        .upload(&token, "b.docx", docx(&["B"]))
        .await
        .json()
        .await
        .unwrap();

    let response = server
        .client
        .put(server.url(&format!("/contracts/{}", second["id"])))
        .bearer_auth(&token)
        .json(&json!({ "filename": "a.docx" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_without_fields_is_bad_request() {
    let server = start_with_mock().await;
    let token = server.signed_in("mona").await;

    let uploaded: Value = server
        .upload(&token, "empty-update.docx", docx(&["Terms"]))
        .await
        .json()
        .await
        .unwrap();

    for body in [json!({}), json!({ "parties": null })] {
        let response = server
            .client
            .put(server.url(&format!("/contracts/{}", uploaded["id"])))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string());
    }
}
