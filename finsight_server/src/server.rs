use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use plaid_tools::PlaidApi;

use crate::{
    auth::{SessionVerifier, TokenIssuer},
    config::ServerConfig,
    data_objects::AggregatorSummary,
    errors::ServerError,
    identity::AppleIdentityVerifier,
    routes::{health, AppleAuthRoute, CheckTokenRoute, LinkTokenRoute, ServerConfigRoute, SetAccessTokenRoute},
    store::MemoryStore,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = MemoryStore::default();
    let srv = create_server_instance(config, store)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, store: MemoryStore) -> Result<Server, ServerError> {
    let plaid_api = PlaidApi::new(config.plaid.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = HttpServer::new(move || {
        let jwt_signer = TokenIssuer::new(&config.auth);
        let session_verifier = SessionVerifier::new(&config.auth);
        let identity_verifier = AppleIdentityVerifier::new(config.identity.clone());
        let aggregator_summary = AggregatorSummary::from(&config.plaid);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fsb::access_log"))
            .app_data(web::Data::new(plaid_api.clone()))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(session_verifier))
            .app_data(web::Data::new(identity_verifier))
            .app_data(web::Data::new(aggregator_summary));
        // Routes that require a valid session token
        let auth_scope = web::scope("/api")
            .service(CheckTokenRoute::new())
            .service(LinkTokenRoute::<PlaidApi>::new())
            .service(SetAccessTokenRoute::<PlaidApi, MemoryStore>::new());
        app.service(health)
            .service(ServerConfigRoute::new())
            .service(AppleAuthRoute::<AppleIdentityVerifier, MemoryStore>::new())
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
