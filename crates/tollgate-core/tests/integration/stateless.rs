//! End-to-end flows with the serialized authenticator in the cookie.

use chrono::Duration;
use tollgate_core::step::{Renew, StepExt, Touch};
use tollgate_core::{
    AuthState, AuthenticationPipeline, AuthenticatorProvider, AuthenticatorWriter, Clock,
    ExpirationValidator, StatelessTarget, TokenReader, Validators,
};

use crate::common::{clock, john, CookieJar, JsonCodec, Request, Response, User, Users};

fn provider(users: std::sync::Arc<Users>) -> AuthenticatorProvider<Request, Response, User> {
    let pipeline = AuthenticationPipeline::new(TokenReader::new(CookieJar, JsonCodec), users)
        .with_validators(Validators::new().with(ExpirationValidator::new(clock())));
    AuthenticatorProvider::new(pipeline, StatelessTarget::new(JsonCodec, CookieJar))
        .with_refresh(Touch::new(clock()))
}

async fn respond(state: AuthState<User>) -> Response {
    match state {
        AuthState::Authenticated { identity, .. } => Response::new(200, identity.email),
        AuthState::MissingCredentials | AuthState::InvalidCredentials { .. } => {
            Response::new(401, state.to_string())
        }
        AuthState::MissingIdentity { .. } => Response::new(403, state.to_string()),
        AuthState::Failure(error) => Response::new(500, error.to_string()),
    }
}

#[tokio::test]
async fn test_missing_cookie_is_missing_credentials() {
    let users = Users::with(&["john@doe.com"]);
    let provider = provider(users.clone());

    let mut seen = None;
    let response = provider
        .authenticate(&Request::anonymous(), |state| {
            seen = Some(state.is_missing_credentials());
            respond(state)
        })
        .await
        .unwrap();

    assert_eq!(seen, Some(true));
    assert_eq!(response.status, 401);
    assert!(response.set_cookies.is_empty(), "no write-back expected");
    assert_eq!(users.lookups(), 0);
}

#[tokio::test]
async fn test_valid_cookie_authenticates_and_is_re_embedded() {
    let users = Users::with(&["john@doe.com"]);
    let provider = provider(users.clone());
    let token = JsonCodec.write(&john()).await.unwrap();

    let response = provider
        .authenticate(&Request::with_token(token.clone()), |state| async move {
            match &state {
                AuthState::Authenticated {
                    identity,
                    authenticator,
                    login_info,
                } => {
                    assert_eq!(identity.email, "john@doe.com");
                    assert_eq!(authenticator, &john());
                    assert_eq!(login_info, john().login_info());
                }
                other => panic!("expected authenticated, got {other}"),
            }
            respond(state).await
        })
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "john@doe.com");
    assert_eq!(response.token(), Some(token.as_str()));
    assert_eq!(users.lookups(), 1);
}

#[tokio::test]
async fn test_expired_cookie_skips_identity_lookup() {
    let users = Users::with(&["john@doe.com"]);
    let provider = provider(users.clone());
    let expired = john().with_expires(Some(clock().now() - Duration::seconds(10)));
    let token = JsonCodec.write(&expired).await.unwrap();

    let response = provider
        .authenticate(&Request::with_token(token), |state| async move {
            match &state {
                AuthState::InvalidCredentials {
                    authenticator,
                    errors,
                } => {
                    assert_eq!(authenticator, &expired);
                    assert_eq!(errors, &vec!["Authenticator is expired 10s ago".to_string()]);
                }
                other => panic!("expected invalid credentials, got {other}"),
            }
            respond(state).await
        })
        .await
        .unwrap();

    assert_eq!(response.status, 401);
    assert!(response.token().is_none());
    assert_eq!(users.lookups(), 0);
}

#[tokio::test]
async fn test_undecodable_cookie_is_failure_with_decode_message() {
    let users = Users::with(&["john@doe.com"]);
    let provider = provider(users.clone());
    let expected = serde_json::from_str::<serde_json::Value>("{not json")
        .unwrap_err()
        .to_string();

    let response = provider
        .authenticate(&Request::with_token("{not json"), |state| async move {
            assert!(state.is_failure());
            assert_eq!(state.to_string(), expected);
            respond(state).await
        })
        .await
        .unwrap();

    assert_eq!(response.status, 500);
    assert_eq!(users.lookups(), 0);
}

#[tokio::test]
async fn test_unknown_user_is_missing_identity() {
    let users = Users::with(&["jane@doe.com"]);
    let provider = provider(users.clone());
    let token = JsonCodec.write(&john()).await.unwrap();

    let response = provider
        .authenticate(&Request::with_token(token), respond)
        .await
        .unwrap();

    assert_eq!(response.status, 403);
    assert_eq!(response.body, "no identity for credentials:john@doe.com");
    assert!(response.token().is_none());
}

#[tokio::test]
async fn test_sliding_authenticator_is_touched_on_write_back() {
    let users = Users::with(&["john@doe.com"]);
    let provider = provider(users);
    let sliding = john().touch(clock().now() - Duration::minutes(3));
    let token = JsonCodec.write(&sliding).await.unwrap();

    let response = provider
        .authenticate(&Request::with_token(token), respond)
        .await
        .unwrap();

    let written: tollgate_core::Authenticator =
        serde_json::from_str(response.token().unwrap()).unwrap();
    assert_eq!(written.touched(), Some(clock().now()));
}

#[tokio::test]
async fn test_login_embeds_a_renewed_authenticator() {
    let users = Users::with(&["john@doe.com"]);
    let provider = provider(users);
    let issue = Touch::new(clock()).and_then(Renew::new(Duration::hours(1), clock()));

    let issued = tollgate_core::step::Step::run(&issue, john()).await.unwrap();
    let response = provider.embed(&issued, Response::new(200, "welcome")).await.unwrap();

    let written: tollgate_core::Authenticator =
        serde_json::from_str(response.token().unwrap()).unwrap();
    assert_eq!(written.expires(), Some(clock().now() + Duration::hours(1)));

    let response = provider.discard(response).await.unwrap();
    assert!(response.token().is_none());
}
