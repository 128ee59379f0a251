use actix_web::{body::MessageBody, test, test::TestRequest, web, App};
use fsb_common::Secret;
use plaid_tools::{CountryCode, PlaidConfig, PlaidEnvironment, Product};

use crate::{
    data_objects::AggregatorSummary,
    routes::{health, ServerConfigRoute},
};

#[actix_web::test]
async fn health_check_is_public() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().service(health)).await;
    let req = TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
}

#[actix_web::test]
async fn config_reports_only_non_secret_aggregator_settings() {
    let _ = env_logger::try_init().ok();
    let plaid = PlaidConfig {
        environment: PlaidEnvironment::Sandbox,
        client_id: "client-id-1".to_string(),
        secret: Secret::new("super-secret-value".to_string()),
        client_name: "FinSight".to_string(),
        products: vec![Product::Transactions, Product::Auth],
        country_codes: vec![CountryCode::Us],
        language: "en".to_string(),
    };
    let summary = AggregatorSummary::from(&plaid);
    let app = test::init_service(
        App::new().app_data(web::Data::new(summary)).service(ServerConfigRoute::new()),
    )
    .await;
    let req = TestRequest::get().uri("/config").to_request();
    let (_, res) = test::call_service(&app, req).await.into_parts();
    assert!(res.status().is_success());
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    assert!(body.contains(r#""environment":"sandbox""#), "was: {body}");
    assert!(body.contains(r#""products":["transactions","auth"]"#), "was: {body}");
    assert!(body.contains(r#""country_codes":["US"]"#), "was: {body}");
    assert!(!body.contains("super-secret-value"), "was: {body}");
    assert!(!body.contains("client-id-1"), "was: {body}");
}
