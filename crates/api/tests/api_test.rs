//! Router tests over the in-memory store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use carteira_api::{AppState, create_router};
use carteira_core::ledger::TransactionCategory;
use carteira_core::ledger::types::User;
use carteira_core::store::{InMemoryStore, TransactionRepository as _};
use carteira_shared::config::{
    AppConfig, DatabaseConfig, JwtSettings, LedgerConfig, ServerConfig, UploadConfig,
};
use carteira_shared::{JwtConfig, JwtService};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "api-test-secret";

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
    jwt: JwtService,
}

fn jwt(secret: &str) -> JwtService {
    JwtService::new(JwtConfig {
        secret: secret.to_string(),
        access_token_expires_secs: 3600,
    })
}

fn app() -> TestApp {
    let config = AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtSettings {
            secret: SECRET.to_string(),
            access_token_expiry_secs: 3600,
        },
        ledger: LedgerConfig::default(),
        uploads: UploadConfig::default(),
    };
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(Arc::clone(&store), Arc::clone(&store), jwt(SECRET), &config);
    TestApp {
        router: create_router(state),
        store,
        jwt: jwt(SECRET),
    }
}

impl TestApp {
    fn seed(&self, balance: Decimal) -> (User, String) {
        let user = self.store.seed_user("Ana", "ana@example.com", balance);
        let token = self
            .jwt
            .generate_access_token(user.id.into_inner(), &user.email)
            .unwrap();
        (user, token)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let (status, headers, body) = self.send(request).await;
        (status, headers, serde_json::from_slice(&body).unwrap())
    }

    fn balance(&self, user: &User) -> Decimal {
        self.store.user(user.id).unwrap().balance
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(token: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    const BOUNDARY: &str = "carteira-boundary";
    let mut body = Vec::new();
    for (name, mime, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match mime {
            Some(mime) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"receipt\"\r\n\
                     Content-Type: {mime}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/transaction/statement")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app();

    let (status, _, body) = app
        .send_json(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _, body) = app
        .send(Request::get("/user").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), b"I'm healthy");
}

#[tokio::test]
async fn test_register_then_login() {
    let app = app();
    let credentials = json!({"email": "bia@example.com", "password": "Senha#123", "name": "Bia"});

    let (status, _, body) = app
        .send_json(json_request(Method::POST, "/user/register", None, &credentials))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "bia@example.com");
    assert_eq!(body["user"]["balance"], "0.00");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, _, body) = app
        .send_json(json_request(
            Method::POST,
            "/user/login",
            None,
            &json!({"email": "bia@example.com", "password": "Senha#123"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _, body) = app
        .send_json(authed(Method::GET, "/transaction/statement", &token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Bia");
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = app();
    let credentials = json!({"email": "bia@example.com", "password": "Senha#123", "name": "Bia"});

    app.send(json_request(Method::POST, "/user/register", None, &credentials))
        .await;
    let (status, _, body) = app
        .send_json(json_request(Method::POST, "/user/register", None, &credentials))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "E-mail já cadastrado");
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn test_register_weak_password_lists_field() {
    let app = app();
    let (status, _, body) = app
        .send_json(json_request(
            Method::POST,
            "/user/register",
            None,
            &json!({"email": "bia@example.com", "password": "fraca", "name": "Bia"}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn test_login_failure_is_uniform() {
    let app = app();
    let credentials = json!({"email": "bia@example.com", "password": "Senha#123", "name": "Bia"});
    app.send(json_request(Method::POST, "/user/register", None, &credentials))
        .await;

    for attempt in [
        json!({"email": "bia@example.com", "password": "Errada#123"}),
        json!({"email": "ghost@example.com", "password": "Senha#123"}),
    ] {
        let (status, _, body) = app
            .send_json(json_request(Method::POST, "/user/login", None, &attempt))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "E-mail e/ou Senha incorretos");
    }
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = app();
    let (user, _) = app.seed(dec!(10));
    let forged = jwt("someone-else")
        .generate_access_token(user.id.into_inner(), &user.email)
        .unwrap();

    let (status, _, body) = app
        .send_json(
            Request::get("/transaction/statement")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Usuário não autorizado");

    let (status, _, _) = app
        .send(authed(Method::GET, "/transaction/statement", &forged))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .send(authed(Method::GET, "/transaction/statement", "not.a.jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_withdraw_and_overdraw() {
    let app = app();
    let (user, token) = app.seed(dec!(100.00));

    let (status, _, body) = app
        .send_json(json_request(
            Method::POST,
            "/transaction/statement",
            Some(&token),
            &json!({"amount": 150, "type": "withdrawal"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Saldo insuficiente para realizar operação Saque");
    assert_eq!(app.balance(&user), dec!(100.00));

    let (status, _, body) = app
        .send_json(json_request(
            Method::POST,
            "/transaction/statement",
            Some(&token),
            &json!({"amount": "60", "type": "withdrawal"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"message": "Transação criada com sucesso", "status": 201}));
    assert_eq!(app.balance(&user), dec!(40.00));
}

#[tokio::test]
async fn test_create_rejects_invalid_body() {
    let app = app();
    let (_, token) = app.seed(dec!(100.00));

    let (status, _, body) = app
        .send_json(json_request(
            Method::POST,
            "/transaction/statement",
            Some(&token),
            &json!({"amount": "0.001", "type": "deposit"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _, _) = app
        .send(json_request(
            Method::POST,
            "/transaction/statement",
            Some(&token),
            &json!({"amount": "10", "type": "lottery"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_multipart_stores_receipt() {
    let app = app();
    let (user, token) = app.seed(Decimal::ZERO);
    let png: &[u8] = &[0x89, b'P', b'N', b'G'];

    let (status, _, _) = app
        .send(multipart_request(
            &token,
            &[
                ("amount", None, b"25"),
                ("type", None, b"deposit"),
                ("img", Some("image/png"), png),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.balance(&user), dec!(25.00));
    let stored = app.store.recent(user.id, 1).await.unwrap();
    assert_eq!(stored[0].file.as_deref(), Some("data:image/png;base64,iVBORw=="));
}

#[tokio::test]
async fn test_create_multipart_rejects_non_image() {
    let app = app();
    let (user, token) = app.seed(Decimal::ZERO);

    let (status, _, body) = app
        .send_json(multipart_request(
            &token,
            &[
                ("amount", None, b"25"),
                ("type", None, b"deposit"),
                ("img", Some("application/pdf"), b"%PDF"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_RECEIPT");
    assert_eq!(app.balance(&user), Decimal::ZERO);
}

#[tokio::test]
async fn test_create_multipart_rejects_oversized_receipt() {
    let app = app();
    let (user, token) = app.seed(Decimal::ZERO);
    let max = UploadConfig::default().max_attachment_bytes;

    let just_over = vec![0u8; max + 1];
    let (status, _, body) = app
        .send_json(multipart_request(
            &token,
            &[
                ("amount", None, b"25"),
                ("type", None, b"deposit"),
                ("img", Some("image/png"), just_over.as_slice()),
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_RECEIPT");

    let past_body_limit = vec![0u8; max + 32 * 1024];
    let (status, _, body) = app
        .send_json(multipart_request(
            &token,
            &[
                ("amount", None, b"25"),
                ("type", None, b"deposit"),
                ("img", Some("image/png"), past_body_limit.as_slice()),
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");

    assert_eq!(app.balance(&user), Decimal::ZERO);
    assert_eq!(app.store.transaction_count(), 0);
}

#[tokio::test]
async fn test_oversized_amounts_are_validation_errors() {
    let app = app();
    let (user, token) = app.seed(dec!(100.00));

    let (status, _, body) = app
        .send_json(json_request(
            Method::POST,
            "/transaction/statement",
            Some(&token),
            &json!({"amount": "79228162514264337593543950335", "type": "deposit"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "O valor máximo permitido é 999999999999.99");

    let deposit = app.store.seed_transaction(
        user.id,
        TransactionCategory::Deposit,
        dec!(20.00),
        Utc::now(),
    );
    let (status, _, body) = app
        .send_json(authed(
            Method::PATCH,
            &format!("/transaction/{}/1000000000000", deposit.id),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_AMOUNT");
    assert_eq!(app.balance(&user), dec!(100.00));
}

#[tokio::test]
async fn test_delete_and_edit() {
    let app = app();
    let (user, token) = app.seed(dec!(120.00));
    let deposit = app.store.seed_transaction(
        user.id,
        TransactionCategory::Deposit,
        dec!(20.00),
        Utc::now(),
    );

    let (status, _, body) = app
        .send_json(authed(
            Method::PATCH,
            &format!("/transaction/{}/5", deposit.id),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transação atualizada com sucesso");
    assert_eq!(app.balance(&user), dec!(105.00));

    let (status, _, body) = app
        .send_json(authed(
            Method::DELETE,
            &format!("/transaction/{}", deposit.id),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transação removida com sucesso");
    assert_eq!(app.balance(&user), dec!(100.00));

    let (status, _, _) = app
        .send(authed(
            Method::DELETE,
            &format!("/transaction/{}", deposit.id),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = app
        .send(authed(Method::DELETE, "/transaction/not-an-id", &token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_pages_with_headers() {
    let app = app();
    let (user, token) = app.seed(dec!(100.00));
    let base = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
    for minute in 0..12 {
        app.store.seed_transaction(
            user.id,
            TransactionCategory::Withdrawal,
            dec!(-1.00),
            base + chrono::Duration::minutes(minute),
        );
    }

    let uri = "/transaction/search?from=2026-03-31&to=2026-03-01&type=withdrawal&perPage=10";
    let (status, headers, body) = app.send_json(authed(Method::GET, uri, &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);
    assert_eq!(headers["x-can-load-more"], "true");
    let cursor = headers["x-next-cursor"].to_str().unwrap().to_string();
    assert_eq!(body[9]["id"], cursor.as_str());

    let (status, headers, body) = app
        .send_json(authed(Method::GET, &format!("{uri}&pick={cursor}"), &token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(headers["x-can-load-more"], "false");
}

#[tokio::test]
async fn test_search_requires_dates() {
    let app = app();
    let (_, token) = app.seed(dec!(1));

    let (status, _, _) = app
        .send(authed(Method::GET, "/transaction/search?to=2026-03-01", &token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_investments_summary() {
    let app = app();
    let (user, token) = app.seed(dec!(0));
    app.store.seed_transaction(
        user.id,
        TransactionCategory::FundInvestment,
        dec!(-100.00),
        Utc::now(),
    );

    let (status, _, body) = app
        .send_json(authed(Method::GET, "/transaction/investments", &token))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["investments"]["fund_investment"], "100.00");
    assert_eq!(body["investments"]["stock_investment"], "0.00");
    assert_eq!(body["total"], "100.00");
}
