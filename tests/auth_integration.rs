use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use actix_web::{web, App, HttpResponse, HttpServer};
use factions_auth::accounts::{Account, AccountStatus, AccountStore, InMemoryAccountStore};
use factions_auth::auth::{
    hash_password_with_cost, unknown_account_hash, BcryptVerifier, FixedClock, PasswordVerifier,
    Role, TimeSource, TokenService,
};
use factions_auth::configuration::JwtSettings;
use factions_auth::middleware::{AuthGate, RequestIdentity, RequireRoles};
use factions_auth::startup::run;
use serde_json::{json, Value};
use uuid::Uuid;

const PASSWORD: &str = "SecurePass123";
const ACCESS_TTL: i64 = 900;
const REFRESH_TTL: i64 = 3_600;
const START: i64 = 1_700_000_000;

pub struct TestApp {
    pub address: String,
    pub accounts: Arc<InMemoryAccountStore>,
    pub clock: Arc<FixedClock>,
    pub tokens: Arc<TokenService>,
}

fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-test-secret".to_string(),
        algorithm: "HS256".to_string(),
        access_token_expiry: ACCESS_TTL,
        refresh_token_expiry: REFRESH_TTL,
    }
}

fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(BcryptVerifier))
}

fn spawn_app_with(passwords: Arc<dyn PasswordVerifier>) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let clock = Arc::new(FixedClock::new(START));
    let tokens = Arc::new(
        TokenService::with_clock(&jwt_settings(), clock.clone() as Arc<dyn TimeSource>)
            .expect("Failed to build token service"),
    );
    let accounts = Arc::new(InMemoryAccountStore::new());

    let server = run(
        listener,
        tokens.clone(),
        accounts.clone() as Arc<dyn AccountStore>,
        passwords,
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        accounts,
        clock,
        tokens,
    }
}

impl TestApp {
    fn add_account(&self, email: &str, role: Role, status: AccountStatus) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: hash_password_with_cost(PASSWORD, 4).expect("Failed to hash password"),
            role,
            status,
        };
        self.accounts.upsert(account.clone());
        account
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/api/v1/auth/login", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/api/v1/auth/refresh", &self.address))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn me(&self, authorization: Option<&str>) -> reqwest::Response {
        let mut request = reqwest::Client::new().get(&format!("{}/api/v1/auth/me", &self.address));
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    async fn login_tokens(&self, email: &str) -> (String, String) {
        let response = self.login(email, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}

async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse error body");
    body["code"].as_str().unwrap_or_default().to_string()
}

// --- Login ---

#[tokio::test]
async fn login_returns_tokens_for_active_account() {
    let app = spawn_app();
    let account = app.add_account("alice@example.com", Role::Moderator, AccountStatus::Active);

    let response = app.login("alice@example.com", PASSWORD).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], ACCESS_TTL);
    assert_eq!(body["user"]["id"], account.id.to_string());
    assert_eq!(body["user"]["role"], "moderator");
    assert!(body["user"].get("password_hash").is_none());

    let claims = app
        .tokens
        .validate_access_token(body["access_token"].as_str().unwrap())
        .expect("access token should validate");
    assert_eq!(claims.user_id, account.id);
    assert_eq!(claims.role, Role::Moderator);
    assert_eq!(claims.exp, START + ACCESS_TTL);

    let refresh = app
        .tokens
        .validate_refresh_token(body["refresh_token"].as_str().unwrap())
        .expect("refresh token should validate");
    assert_eq!(refresh.exp, START + REFRESH_TTL);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app();
    app.add_account("bob@example.com", Role::Citizen, AccountStatus::Active);
    app.add_account("carol@example.com", Role::Citizen, AccountStatus::Suspended);

    let cases = vec![
        ("bob@example.com", "WrongPass123", "wrong password"),
        ("nobody@example.com", PASSWORD, "unknown email"),
        ("carol@example.com", PASSWORD, "inactive account"),
    ];

    for (email, password, case) in cases {
        let response = app.login(email, password).await;
        assert_eq!(401, response.status().as_u16(), "case: {}", case);
        assert_eq!(error_code(response).await, "INVALID_CREDENTIALS", "case: {}", case);
    }
}

/// Delegates to bcrypt and remembers which hashes it was asked to check.
#[derive(Default)]
struct RecordingVerifier {
    checked: Mutex<Vec<String>>,
}

impl PasswordVerifier for RecordingVerifier {
    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        self.checked.lock().unwrap().push(hash.to_string());
        BcryptVerifier.verify(plaintext, hash)
    }
}

#[tokio::test]
async fn login_runs_bcrypt_for_unknown_email() {
    let verifier = Arc::new(RecordingVerifier::default());
    let app = spawn_app_with(verifier.clone());
    let known = app.add_account("olga@example.com", Role::Citizen, AccountStatus::Active);

    let response = app.login("nobody@example.com", PASSWORD).await;
    assert_eq!(401, response.status().as_u16());
    let response = app.login("olga@example.com", "WrongPass123").await;
    assert_eq!(401, response.status().as_u16());

    let checked = verifier.checked.lock().unwrap().clone();
    assert_eq!(checked, vec![unknown_account_hash().to_string(), known.password_hash]);
}

#[tokio::test]
async fn login_returns_400_for_invalid_payload() {
    let app = spawn_app();

    for (email, password) in [("notanemail", PASSWORD), ("user@example.com", "123")] {
        let response = app.login(email, password).await;
        assert_eq!(400, response.status().as_u16(), "email: {}", email);
    }
}

// --- Current user ---

#[tokio::test]
async fn me_returns_profile_with_valid_token() {
    let app = spawn_app();
    let account = app.add_account("dave@example.com", Role::Collaborator, AccountStatus::Active);
    let (access, _) = app.login_tokens("dave@example.com").await;

    let response = app.me(Some(format!("Bearer {}", access).as_str())).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], account.id.to_string());
    assert_eq!(body["email"], "dave@example.com");
}

#[tokio::test]
async fn me_rejects_missing_and_malformed_headers() {
    let app = spawn_app();
    app.add_account("erin@example.com", Role::Citizen, AccountStatus::Active);
    let (access, _) = app.login_tokens("erin@example.com").await;

    let response = app.me(None).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "MISSING_TOKEN");

    for header in [
        access.clone(),
        format!("Token {}", access),
        format!("bearer {}", access),
        format!("Bearer  {}", access),
        format!("Bearer {} extra", access),
    ] {
        let response = app.me(Some(header.as_str())).await;
        assert_eq!(401, response.status().as_u16(), "header: {}", header);
        assert_eq!(error_code(response).await, "INVALID_AUTH_HEADER");
    }

    let response = app.me(Some("Bearer not.a.token")).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_INVALID");
}

#[tokio::test]
async fn me_rejects_expired_access_token() {
    let app = spawn_app();
    app.add_account("frank@example.com", Role::Citizen, AccountStatus::Active);
    let (access, _) = app.login_tokens("frank@example.com").await;

    app.clock.advance(ACCESS_TTL + 1);

    let response = app.me(Some(format!("Bearer {}", access).as_str())).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_INVALID");
}

#[tokio::test]
async fn me_rejects_refresh_token_as_bearer() {
    let app = spawn_app();
    app.add_account("gina@example.com", Role::Citizen, AccountStatus::Active);
    let (_, refresh) = app.login_tokens("gina@example.com").await;

    let response = app.me(Some(format!("Bearer {}", refresh).as_str())).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn me_returns_404_when_account_was_removed() {
    let app = spawn_app();
    let account = app.add_account("hank@example.com", Role::Citizen, AccountStatus::Active);
    let (access, _) = app.login_tokens("hank@example.com").await;

    app.accounts.remove(account.id);

    let response = app.me(Some(format!("Bearer {}", access).as_str())).await;
    assert_eq!(404, response.status().as_u16());
}

// --- Refresh ---

#[tokio::test]
async fn refresh_issues_access_token_from_current_account_data() {
    let app = spawn_app();
    let mut account = app.add_account("ivy@example.com", Role::Citizen, AccountStatus::Active);
    let (_, refresh) = app.login_tokens("ivy@example.com").await;

    account.role = Role::Moderator;
    account.email = "ivy.new@example.com".to_string();
    app.accounts.upsert(account.clone());
    app.clock.advance(60);

    let response = app.refresh(&refresh).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert!(body.get("refresh_token").is_none());
    let claims = app
        .tokens
        .validate_access_token(body["access_token"].as_str().unwrap())
        .expect("refreshed token should validate");
    assert_eq!(claims.role, Role::Moderator);
    assert_eq!(claims.email, "ivy.new@example.com");
    assert_eq!(claims.iat, START + 60);
}

#[tokio::test]
async fn refresh_rejects_expired_refresh_token() {
    let app = spawn_app();
    app.add_account("jack@example.com", Role::Citizen, AccountStatus::Active);
    let (_, refresh) = app.login_tokens("jack@example.com").await;

    app.clock.advance(REFRESH_TTL + 1);

    let response = app.refresh(&refresh).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_INVALID");
}

#[tokio::test]
async fn refresh_rejects_access_token() {
    let app = spawn_app();
    app.add_account("kate@example.com", Role::Citizen, AccountStatus::Active);
    let (access, _) = app.login_tokens("kate@example.com").await;

    let response = app.refresh(&access).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_INVALID");
}

#[tokio::test]
async fn refresh_rejects_removed_and_inactive_accounts() {
    let app = spawn_app();
    let removed = app.add_account("leo@example.com", Role::Citizen, AccountStatus::Active);
    let mut suspended = app.add_account("mia@example.com", Role::Citizen, AccountStatus::Active);
    let (_, removed_refresh) = app.login_tokens("leo@example.com").await;
    let (_, suspended_refresh) = app.login_tokens("mia@example.com").await;

    app.accounts.remove(removed.id);
    suspended.status = AccountStatus::Suspended;
    app.accounts.upsert(suspended);

    let response = app.refresh(&removed_refresh).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "ACCOUNT_NOT_FOUND");

    let response = app.refresh(&suspended_refresh).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn refresh_returns_400_for_empty_token() {
    let app = spawn_app();

    let response = app.refresh("").await;
    assert_eq!(400, response.status().as_u16());
}

// --- Gates on a protected scope ---

async fn whoami(identity: Option<RequestIdentity>) -> HttpResponse {
    match identity {
        Some(identity) => HttpResponse::Ok().body(identity.email),
        None => HttpResponse::Ok().body("anonymous"),
    }
}

fn spawn_gated_app(tokens: Arc<TokenService>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(move || {
        App::new()
            .service(
                web::scope("/moderation")
                    .wrap(RequireRoles::new([Role::Moderator]))
                    .wrap(AuthGate::strict(tokens.clone()))
                    .route("/queue", web::get().to(whoami)),
            )
            .service(
                web::scope("/public")
                    .wrap(AuthGate::optional(tokens.clone()))
                    .route("/whoami", web::get().to(whoami)),
            )
    })
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

async fn get_gated(address: &str, path: &str, token: Option<&str>) -> reqwest::Response {
    let mut request = reqwest::Client::new().get(&format!("{}{}", address, path));
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {}", token));
    }
    request.send().await.expect("Failed to execute request.")
}

#[tokio::test]
async fn role_gate_admits_members_and_admins_only() {
    let app = spawn_app();
    let address = spawn_gated_app(app.tokens.clone());

    let token_for = |role: Role| {
        app.tokens
            .issue_access_token(Uuid::new_v4(), "gated@example.com", role)
            .expect("Failed to issue token")
    };

    for (role, expected) in [
        (Role::Moderator, 200),
        (Role::Admin, 200),
        (Role::Collaborator, 403),
        (Role::Citizen, 403),
    ] {
        let response = get_gated(&address, "/moderation/queue", Some(token_for(role).as_str())).await;
        assert_eq!(expected, response.status().as_u16(), "role: {}", role);
    }

    let response = get_gated(&address, "/moderation/queue", None).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn optional_gate_passes_anonymous_and_bad_tokens_through() {
    let app = spawn_app();
    let address = spawn_gated_app(app.tokens.clone());
    let token = app
        .tokens
        .issue_access_token(Uuid::new_v4(), "nina@example.com", Role::Citizen)
        .unwrap();

    let response = get_gated(&address, "/public/whoami", Some(token.as_str())).await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!(response.text().await.unwrap(), "nina@example.com");

    let response = get_gated(&address, "/public/whoami", None).await;
    assert_eq!(response.text().await.unwrap(), "anonymous");

    let response = get_gated(&address, "/public/whoami", Some("garbage")).await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!(response.text().await.unwrap(), "anonymous");
}
