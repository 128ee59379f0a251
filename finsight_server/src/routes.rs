//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, any long, non-cpu-bound operation (the upstream
//! identity-provider and aggregator calls in particular) must be expressed as futures or asynchronous functions.
//! Async handlers get executed concurrently by worker threads and thus don't block execution.

use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use fsb_common::Secret;
use log::*;
use plaid_tools::Aggregator;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{AggregatorSummary, AppleAuthRequest, AuthResponse, ExchangeResult, PublicTokenRequest, SessionInfo},
    errors::ServerError,
    identity::IdentityProvider,
    store::{LinkedAccount, UserStore},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Config  ----------------------------------------------------
route!(server_config => Get "/config");
/// Route handler for the config endpoint
///
/// Returns the non-secret slice of the aggregator configuration (environment, products, country codes) so a
/// client can sanity-check its deployment. Credentials and signing secrets are never included.
pub async fn server_config(summary: web::Data<AggregatorSummary>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received config request");
    Ok(HttpResponse::Ok().json(summary.as_ref()))
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(apple_auth => Post "/auth/apple" impl IdentityProvider, UserStore);
/// Route handler for the sign-in endpoint
///
/// Clients POST the identity assertion obtained from the identity provider's sign-in flow. The assertion is
/// fully verified (signature against the provider's published keys, audience, issuer, expiry) before any claim
/// is trusted. On success the user record is fetched or created and a session token is issued.
///
/// The session token is returned as `access_token` and must be presented as a bearer token on every `/api`
/// request.
pub async fn apple_auth<TIdentityProvider, TUserStore>(
    body: web::Json<AppleAuthRequest>,
    verifier: web::Data<TIdentityProvider>,
    store: web::Data<TUserStore>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    TIdentityProvider: IdentityProvider,
    TUserStore: UserStore,
{
    trace!("💻️ Received sign-in request");
    let identity = verifier.verify_identity(&body.identity_token).await.map_err(|e| {
        debug!("💻️ Identity verification failed. {e:?}");
        e
    })?;
    debug!("💻️ Identity verified for subject {}", identity.subject);
    let user = store.find_or_create(&identity.subject, identity.email.clone()).await?;
    let access_token = signer.issue_token(&user.subject, user.email.clone(), None)?;
    trace!("💻️ Issued session token for {}", user.subject);
    let response = AuthResponse { access_token, token_type: "bearer".to_string(), user: user.into() };
    Ok(HttpResponse::Ok().json(response))
}

route!(check_token => Get "/check_token");
/// Route handler for the check_token endpoint
///
/// Lets a client confirm that its session token is still valid. The subject and email are read from the
/// verified token itself; no store access is involved.
pub async fn check_token(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET check_token for {}", claims.sub);
    Ok(HttpResponse::Ok().json(SessionInfo { subject: claims.sub, email: claims.email }))
}

//----------------------------------------------   Banking  ----------------------------------------------------
route!(link_token => Get "/banking/link-token" impl Aggregator);
/// Route handler for the link-token endpoint
///
/// Requests a short-lived link token from the aggregator, scoped to the authenticated user. The aggregator's
/// response (token, expiry, request id) is relayed verbatim; nothing is persisted.
pub async fn link_token<TAggregator>(
    claims: JwtClaims,
    api: web::Data<TAggregator>,
) -> Result<HttpResponse, ServerError>
where
    TAggregator: Aggregator,
{
    debug!("💻️ GET link-token for {}", claims.sub);
    let token = api.create_link_token(&claims.sub).await.map_err(|e| {
        debug!("💻️ Could not create link token. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(token))
}

route!(set_access_token => Post "/banking/set-access-token" impl Aggregator, UserStore);
/// Route handler for the set-access-token endpoint
///
/// Exchanges the public token produced by the client-side linking UI for a durable access token and item id,
/// and stores the pair against the authenticated user. The aggregator enforces that a public token can only be
/// exchanged once; a second attempt is rejected upstream and surfaced as an `UpstreamRejected` error.
pub async fn set_access_token<TAggregator, TUserStore>(
    claims: JwtClaims,
    body: web::Json<PublicTokenRequest>,
    api: web::Data<TAggregator>,
    store: web::Data<TUserStore>,
) -> Result<HttpResponse, ServerError>
where
    TAggregator: Aggregator,
    TUserStore: UserStore,
{
    debug!("💻️ POST set-access-token for {}", claims.sub);
    let item = api.exchange_public_token(&body.public_token).await.map_err(|e| {
        debug!("💻️ Could not exchange public token. {e}");
        ServerError::from(e)
    })?;
    let account = LinkedAccount {
        subject: claims.sub.clone(),
        access_token: Secret::new(item.access_token),
        item_id: item.item_id.clone(),
        linked_at: Utc::now(),
    };
    store.save_linked_account(account).await?;
    info!("💻️ Linked aggregator item {} for {}", item.item_id, claims.sub);
    Ok(HttpResponse::Ok().json(ExchangeResult { success: true, item_id: item.item_id }))
}
