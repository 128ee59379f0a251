use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{DateTime, Duration, Utc};
use fsb_common::Secret;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::{auth::JwtClaims, config::AuthConfig};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("0f2cb52f9e1e40c3a676cbee691fbb46-endpoint-tests".to_string()),
        algorithm: Algorithm::HS256,
        session_lifetime: Duration::hours(24),
    }
}

/// Signs a session token directly so tests can control the expiry exactly.
pub fn issue_session_token(subject: &str, email: Option<&str>, expires_at: DateTime<Utc>) -> String {
    let config = get_auth_config();
    let claims = JwtClaims {
        sub: subject.to_string(),
        email: email.map(String::from),
        iat: Utc::now().timestamp(),
        exp: expires_at.timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()))
        .expect("Failed to sign token")
}

pub fn valid_session_token(subject: &str) -> String {
    issue_session_token(subject, Some("a@b.com"), Utc::now() + Duration::hours(1))
}

pub async fn get_request<F>(token: &str, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let app = App::new().configure(configure);
    let app = test::init_service(app).await;
    let (_, res) = test::call_service(&app, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub async fn post_request<F>(token: &str, path: &str, payload: serde_json::Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri(path).set_json(payload);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let app = App::new().configure(configure);
    let app = test::init_service(app).await;
    let (_, res) = test::call_service(&app, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
