//! The authentication pipeline: source → authenticator → validation →
//! identity → [`AuthState`].
//!
//! Each stage is terminal on anything but success:
//!
//! | stage           | error     | nothing              | value                     |
//! |-----------------|-----------|----------------------|---------------------------|
//! | read            | `Failure` | `MissingCredentials` | validate                  |
//! | validate        | `Failure` | (n/a)                | `InvalidCredentials` or lookup |
//! | identity lookup | `Failure` | `MissingIdentity`    | `Authenticated`           |
//!
//! Errors and panics raised by any capability are converted into
//! [`AuthState::Failure`]; [`AuthenticationPipeline::authenticate`] never
//! fails or panics itself. Dropping the returned future cancels whichever
//! stage is in flight.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::authenticator::Authenticator;
use crate::capability::{AuthenticatorReader, IdentityReader};
use crate::state::AuthState;
use crate::validator::{Status, Validator, Validators};
use crate::{Error, Result};

type SourceValidators<S> = Arc<dyn Fn(&S) -> Validators + Send + Sync>;

/// Composes a reader, a validator set and an identity lookup into a
/// total function from source to [`AuthState`].
pub struct AuthenticationPipeline<S, I> {
    reader: Arc<dyn AuthenticatorReader<S>>,
    identities: Arc<dyn IdentityReader<I>>,
    validators: Validators,
    source_validators: Option<SourceValidators<S>>,
}

impl<S, I> Clone for AuthenticationPipeline<S, I> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            identities: self.identities.clone(),
            validators: self.validators.clone(),
            source_validators: self.source_validators.clone(),
        }
    }
}

impl<S, I> fmt::Debug for AuthenticationPipeline<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationPipeline")
            .field("validators", &self.validators)
            .field("source_validators", &self.source_validators.is_some())
            .finish_non_exhaustive()
    }
}

impl<S, I> AuthenticationPipeline<S, I>
where
    S: Sync + 'static,
    I: Send + 'static,
{
    /// Create a pipeline without validators.
    pub fn new<R, L>(reader: R, identities: L) -> Self
    where
        R: AuthenticatorReader<S> + 'static,
        L: IdentityReader<I> + 'static,
    {
        Self {
            reader: Arc::new(reader),
            identities: Arc::new(identities),
            validators: Validators::new(),
            source_validators: None,
        }
    }

    /// Replace the validator set.
    #[must_use]
    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    /// Add one validator to the set.
    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators = self.validators.with(validator);
        self
    }

    /// Derive extra validators from each source, e.g. to compare the
    /// authenticator against the request's client fingerprint. They run
    /// after the fixed set.
    #[must_use]
    pub fn with_source_validators<F>(mut self, validators: F) -> Self
    where
        F: Fn(&S) -> Validators + Send + Sync + 'static,
    {
        self.source_validators = Some(Arc::new(validators));
        self
    }

    /// Run the pipeline against `source`.
    pub async fn authenticate(&self, source: &S) -> AuthState<I> {
        let authenticator = match guarded("reader", self.reader.read(source)).await {
            Ok(Some(authenticator)) => authenticator,
            Ok(None) => {
                log::debug!("No credentials in source");
                return AuthState::MissingCredentials;
            }
            Err(error) => {
                log::debug!("Reading credentials failed: {error}");
                return AuthState::Failure(error);
            }
        };

        let validators = match self.validators_for(source) {
            Ok(validators) => validators,
            Err(error) => return AuthState::Failure(error),
        };
        match guarded("validators", validators.is_valid(&authenticator)).await {
            Ok(Status::Valid) => {}
            Ok(Status::Invalid(errors)) => {
                log::debug!(
                    "Authenticator {} is invalid: {}",
                    authenticator.id(),
                    errors.join("; ")
                );
                return AuthState::InvalidCredentials {
                    authenticator,
                    errors,
                };
            }
            Err(error) => {
                log::debug!("Validating authenticator {} failed: {error}", authenticator.id());
                return AuthState::Failure(error);
            }
        }

        let login_info = authenticator.login_info().clone();
        match guarded("identity lookup", self.identities.retrieve(&login_info)).await {
            Ok(Some(identity)) => {
                log::debug!("Authenticated {login_info} with {}", authenticator.id());
                AuthState::Authenticated {
                    identity,
                    authenticator,
                    login_info,
                }
            }
            Ok(None) => {
                log::debug!("No identity for {login_info}");
                AuthState::MissingIdentity {
                    authenticator,
                    login_info,
                }
            }
            Err(error) => {
                log::debug!("Identity lookup for {login_info} failed: {error}");
                AuthState::Failure(error)
            }
        }
    }

    /// Check an authenticator against the fixed validator set only.
    pub async fn validate(&self, authenticator: &Authenticator) -> Result<Status> {
        guarded("validators", self.validators.is_valid(authenticator)).await
    }

    fn validators_for(&self, source: &S) -> Result<Validators> {
        let Some(derive) = &self.source_validators else {
            return Ok(self.validators.clone());
        };
        match std::panic::catch_unwind(AssertUnwindSafe(|| derive(source))) {
            Ok(extra) => Ok(self.validators.clone().merge(extra)),
            Err(payload) => Err(panicked("source validators", payload.as_ref())),
        }
    }
}

/// Await `future`, turning a panic into [`Error::Panicked`].
async fn guarded<T, F>(step: &'static str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panicked(step, payload.as_ref())),
    }
}

fn panicked(step: &'static str, payload: &(dyn Any + Send)) -> Error {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    };
    log::error!("{step} panicked: {message}");
    Error::Panicked { step, message }
}
