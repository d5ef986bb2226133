//! End-to-end flows with authenticators kept in a backing store and only
//! the id in the cookie.

use std::sync::Arc;

use tollgate_core::{
    AuthState, AuthenticationPipeline, AuthenticatorProvider, BackingStore,
    BackingStoreValidator, MemoryBackingStore, StatefulTarget, StoreReader, Validators,
};

use crate::common::{john, CookieJar, Request, Response, User, Users};

fn provider(
    store: Arc<MemoryBackingStore>,
    users: Arc<Users>,
) -> AuthenticatorProvider<Request, Response, User> {
    let pipeline = AuthenticationPipeline::new(StoreReader::new(CookieJar, store.clone()), users)
        .with_validators(Validators::new().with(BackingStoreValidator::exists_in(store.clone())));
    AuthenticatorProvider::new(pipeline, StatefulTarget::new(store, CookieJar))
}

async fn identify(state: AuthState<User>) -> Response {
    match state.identity() {
        Some(user) => Response::new(200, user.email.clone()),
        None => Response::new(401, state.to_string()),
    }
}

#[tokio::test]
async fn test_stored_authenticator_round_trips_through_its_id() {
    let store = Arc::new(MemoryBackingStore::new());
    let provider = provider(store.clone(), Users::with(&["john@doe.com"]));

    let login = provider.embed(&john(), Response::new(200, "")).await.unwrap();
    assert_eq!(login.token(), Some("id"));
    assert_eq!(store.len().await, 1);

    let response = provider
        .authenticate(&Request::with_token("id"), identify)
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.token(), Some("id"));
}

#[tokio::test]
async fn test_unknown_id_is_missing_credentials() {
    let store = Arc::new(MemoryBackingStore::new());
    let provider = provider(store, Users::with(&["john@doe.com"]));

    let response = provider
        .authenticate(&Request::with_token("forged"), |state| async move {
            assert!(state.is_missing_credentials());
            identify(state).await
        })
        .await
        .unwrap();
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn test_logout_removes_the_stored_authenticator() {
    let store = Arc::new(MemoryBackingStore::new());
    let provider = provider(store.clone(), Users::with(&["john@doe.com"]));
    provider.embed(&john(), Response::default()).await.unwrap();

    let response = provider
        .discard_authenticator(&john(), Response::new(200, "bye"))
        .await
        .unwrap();
    assert_eq!(response.set_cookies.get("tollgate"), Some(&None));
    assert_eq!(store.find("id").await.unwrap(), None);
}
