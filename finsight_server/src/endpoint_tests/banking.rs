use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Duration, Utc};
use log::*;
use mockall::Sequence;
use plaid_tools::{LinkToken, LinkedItem, PlaidApiError};
use serde_json::json;

use super::{
    helpers::{get_auth_config, get_request, issue_session_token, post_request, valid_session_token},
    mocks::{MockAggregatorClient, MockStore},
};
use crate::{
    auth::SessionVerifier,
    routes::{CheckTokenRoute, LinkTokenRoute, SetAccessTokenRoute},
};

fn configure_app(api: MockAggregatorClient, store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let config = get_auth_config();
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(store))
            .app_data(web::Data::new(SessionVerifier::new(&config)))
            .service(
                web::scope("/api")
                    .service(CheckTokenRoute::new())
                    .service(LinkTokenRoute::<MockAggregatorClient>::new())
                    .service(SetAccessTokenRoute::<MockAggregatorClient, MockStore>::new()),
            );
    }
}

fn sample_link_token() -> LinkToken {
    LinkToken {
        link_token: "link-sandbox-7a1d79b6".to_string(),
        expiration: Utc::now() + Duration::minutes(30),
        request_id: "req-1".to_string(),
    }
}

fn sample_item() -> LinkedItem {
    LinkedItem {
        access_token: "access-sandbox-de3ce8ef".to_string(),
        item_id: "item-M5eVJqLnv3tbzdngLDp9FL5OlDNxlNhlE55op".to_string(),
        request_id: "req-2".to_string(),
    }
}

#[actix_web::test]
async fn link_token_requires_a_session() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("", "/api/banking/link-token", configure_app(MockAggregatorClient::new(), MockStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains(r#""error":"Unauthorized""#), "was: {body}");
}

#[actix_web::test]
async fn link_token_with_an_expired_session() {
    let _ = env_logger::try_init().ok();
    let token = issue_session_token("u1", None, Utc::now() - Duration::hours(1));
    let (status, body) =
        get_request(&token, "/api/banking/link-token", configure_app(MockAggregatorClient::new(), MockStore::new()))
            .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains(r#""error":"Unauthorized""#), "was: {body}");
}

#[actix_web::test]
async fn link_token_with_a_tampered_session() {
    let _ = env_logger::try_init().ok();
    let mut token = valid_session_token("u1");
    let len = token.len();
    token.replace_range(len - 10..len - 5, "00000");
    let (status, body) =
        get_request(&token, "/api/banking/link-token", configure_app(MockAggregatorClient::new(), MockStore::new()))
            .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains(r#""error":"Unauthorized""#), "was: {body}");
}

#[actix_web::test]
async fn link_token_is_scoped_to_the_session_user() {
    let _ = env_logger::try_init().ok();
    let mut api = MockAggregatorClient::new();
    api.expect_create_link_token()
        .withf(|user_id| user_id == "user-1")
        .returning(|_| Ok(sample_link_token()));
    let token = valid_session_token("user-1");
    let (status, body) = get_request(&token, "/api/banking/link-token", configure_app(api, MockStore::new())).await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    let link: LinkToken = serde_json::from_str(&body).expect("Could not parse link token response");
    assert_eq!(link.link_token, "link-sandbox-7a1d79b6");
    assert_eq!(link.request_id, "req-1");
}

#[actix_web::test]
async fn link_token_when_the_aggregator_rejects_the_request() {
    let _ = env_logger::try_init().ok();
    let mut api = MockAggregatorClient::new();
    api.expect_create_link_token().returning(|_| {
        Err(PlaidApiError::QueryError {
            status: 400,
            message: "client_id is not authorized for this environment (INVALID_API_KEYS)".to_string(),
        })
    });
    let token = valid_session_token("user-1");
    let (status, body) = get_request(&token, "/api/banking/link-token", configure_app(api, MockStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(r#""error":"UpstreamRejected""#), "was: {body}");
    assert!(body.contains("INVALID_API_KEYS"), "was: {body}");
}

#[actix_web::test]
async fn link_token_when_the_aggregator_is_unreachable() {
    let _ = env_logger::try_init().ok();
    let mut api = MockAggregatorClient::new();
    api.expect_create_link_token()
        .returning(|_| Err(PlaidApiError::RestResponseError("connection timed out".to_string())));
    let token = valid_session_token("user-1");
    let (status, body) = get_request(&token, "/api/banking/link-token", configure_app(api, MockStore::new())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains(r#""error":"UpstreamUnavailable""#), "was: {body}");
}

#[actix_web::test]
async fn exchange_stores_the_linked_account() {
    let _ = env_logger::try_init().ok();
    let mut api = MockAggregatorClient::new();
    api.expect_exchange_public_token()
        .withf(|public_token| public_token == "public-sandbox-123")
        .returning(|_| Ok(sample_item()));
    let mut store = MockStore::new();
    store
        .expect_save_linked_account()
        .withf(|account| {
            account.subject == "user-1" &&
                account.item_id == sample_item().item_id &&
                account.access_token.reveal() == "access-sandbox-de3ce8ef"
        })
        .returning(|_| Ok(()));
    let token = valid_session_token("user-1");
    let (status, body) = post_request(
        &token,
        "/api/banking/set-access-token",
        json!({ "public_token": "public-sandbox-123" }),
        configure_app(api, store),
    )
    .await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "was: {body}");
    assert!(body.contains(&sample_item().item_id), "was: {body}");
    // The durable access token never leaves the server
    assert!(!body.contains("access-sandbox-de3ce8ef"), "was: {body}");
}

#[actix_web::test]
async fn exchanging_the_same_public_token_twice_fails_the_second_time() {
    let _ = env_logger::try_init().ok();
    let mut api = MockAggregatorClient::new();
    let mut seq = Sequence::new();
    api.expect_exchange_public_token().times(1).in_sequence(&mut seq).returning(|_| Ok(sample_item()));
    api.expect_exchange_public_token().times(1).in_sequence(&mut seq).returning(|_| {
        Err(PlaidApiError::QueryError {
            status: 400,
            message: "the provided public token has already been exchanged (INVALID_PUBLIC_TOKEN)".to_string(),
        })
    });
    let mut store = MockStore::new();
    store.expect_save_linked_account().times(1).returning(|_| Ok(()));
    let token = valid_session_token("user-1");
    let app = App::new().configure(configure_app(api, store));
    let app = test::init_service(app).await;
    let payload = json!({ "public_token": "public-sandbox-123" });

    let req = TestRequest::post()
        .uri("/api/banking/set-access-token")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(payload.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = TestRequest::post()
        .uri("/api/banking/set-access-token")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(payload)
        .to_request();
    let (_, res) = test::call_service(&app, req).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(r#""error":"UpstreamRejected""#), "was: {body}");
}

#[actix_web::test]
async fn check_token_returns_the_session_subject() {
    let _ = env_logger::try_init().ok();
    let token = valid_session_token("user-1");
    let (status, body) =
        get_request(&token, "/api/check_token", configure_app(MockAggregatorClient::new(), MockStore::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""subject":"user-1""#), "was: {body}");
    assert!(body.contains(r#""email":"a@b.com""#), "was: {body}");
}
