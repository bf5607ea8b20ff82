//! Integration tests for the commerce API client.
//!
//! Run against the in-process fake API: `cargo test -p vitrine-integration-tests`

use axum::http::Method;
use secrecy::SecretString;
use serde_json::{Value, json};
use vitrine_admin::api::{ApiError, ListQuery, SortDirection};
use vitrine_admin::session::{SessionEvent, SignOutReason};
use vitrine_admin::{CommerceClient, SessionHub};
use vitrine_integration_tests::{FakeCommerce, PASSWORD, TOKEN_EXPIRY, fake_jwt};

async fn signed_in(server: &FakeCommerce, hub: SessionHub) -> CommerceClient {
    let config = server.api_config().unwrap();
    let anonymous = CommerceClient::new(&config).unwrap();
    let session = anonymous
        .login("ana@vitrine.test", &SecretString::from(PASSWORD))
        .await
        .unwrap();
    CommerceClient::with_session(&config, &session, hub).unwrap()
}

#[tokio::test]
async fn test_login_returns_session_with_expiry() {
    let server = FakeCommerce::start().await.unwrap();
    let anonymous = CommerceClient::new(&server.api_config().unwrap()).unwrap();

    let session = anonymous
        .login("ana@vitrine.test", &SecretString::from(PASSWORD))
        .await
        .unwrap();

    assert_eq!(session.user().email, "ana@vitrine.test");
    assert_eq!(
        session.expires_at().map(|t| t.timestamp()),
        Some(TOKEN_EXPIRY)
    );

    let login = server.requests_to(Method::POST, "/auth/login").await;
    assert_eq!(login.len(), 1);
    assert_eq!(login[0].body["email"], "ana@vitrine.test");
    assert!(login[0].authorization.is_none());
}

#[tokio::test]
async fn test_bad_password_is_unauthorized() {
    let server = FakeCommerce::start().await.unwrap();
    let anonymous = CommerceClient::new(&server.api_config().unwrap()).unwrap();

    let result = anonymous
        .login("ana@vitrine.test", &SecretString::from("wrong"))
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_me_sends_bearer_and_is_cached() {
    let server = FakeCommerce::start().await.unwrap();
    let client = signed_in(&server, SessionHub::new()).await;

    let user = client.me().await.unwrap();
    assert_eq!(user.name, "Ana Operadora");
    assert_eq!(client.me().await.unwrap(), user);

    let me = server.requests_to(Method::GET, "/users/me").await;
    assert_eq!(me.len(), 1);
    assert_eq!(
        me[0].authorization.as_deref(),
        Some(format!("Bearer {}", fake_jwt(TOKEN_EXPIRY)).as_str())
    );

    client.cache().clear().await;
    client.me().await.unwrap();
    assert_eq!(server.requests_to(Method::GET, "/users/me").await.len(), 2);
}

#[tokio::test]
async fn test_list_encodes_nested_query() {
    let server = FakeCommerce::start().await.unwrap();
    let client = signed_in(&server, SessionHub::new()).await;

    let query = ListQuery::new()
        .page(2)
        .sort_by("name", SortDirection::Asc)
        .filter("slug", json!({"$contains": "camiseta"}));
    let page = client.list::<Value>("products", &query).await.unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.meta.page, 2);
    assert!(page.meta.has_next());

    let requests = server.requests_to(Method::GET, "/products").await;
    assert_eq!(
        requests[0].query.as_deref(),
        Some(
            "filters[slug][$contains]=camiseta&pagination[page]=2&pagination[pageSize]=25&sort[0]=name%3Aasc"
        )
    );
}

#[tokio::test]
async fn test_unknown_cep_is_not_found() {
    let server = FakeCommerce::start().await.unwrap();
    let client = signed_in(&server, SessionHub::new()).await;

    let cep = vitrine_core::PostalCode::parse("01001-000").unwrap();
    let result = vitrine_admin::CommerceApi::lookup_address(&client, &cep).await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_revoked_token_signs_out_everywhere() {
    let server = FakeCommerce::start().await.unwrap();
    let hub = SessionHub::new();
    let mut events = hub.subscribe();
    let client = signed_in(&server, hub).await;

    server.update(|b| b.revoke_tokens = true).await;
    client.cache().clear().await;

    let result = client.me().await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignedOut {
            reason: SignOutReason::Unauthorized
        }
    );
}

#[tokio::test]
async fn test_anonymous_client_sends_no_bearer() {
    let server = FakeCommerce::start().await.unwrap();
    let client = CommerceClient::new(&server.api_config().unwrap()).unwrap();

    assert!(matches!(client.me().await, Err(ApiError::Unauthorized)));
    let me = server.requests_to(Method::GET, "/users/me").await;
    assert!(me[0].authorization.is_none());
}
