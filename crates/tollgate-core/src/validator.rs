//! Validators and the conjunction of their verdicts.
//!
//! A [`Validator`] checks one semantic property of an [`Authenticator`].
//! [`Validators`] runs a whole set concurrently, waits for every one of
//! them, and folds the verdicts: `Valid` only if all are valid, otherwise
//! `Invalid` with every error message in set order.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use futures::future::join_all;

use crate::authenticator::Authenticator;
use crate::capability::BackingStore;
use crate::clock::Clock;
use crate::settings::AuthenticatorSettings;
use crate::Result;

/// Verdict of a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The authenticator passed.
    Valid,
    /// The authenticator failed, with a non-empty list of reasons.
    ///
    /// Build it through [`Status::invalid`] or [`Status::from_errors`];
    /// an empty list constructed directly is treated as one unnamed reason
    /// when combined.
    Invalid(Vec<String>),
}

/// Reason reported for an `Invalid` verdict that named none.
const UNSPECIFIED: &str = "Authenticator is invalid";

impl Status {
    /// A failed verdict with a single reason.
    pub fn invalid(error: impl Into<String>) -> Self {
        Status::Invalid(vec![error.into()])
    }

    /// `Valid` for no errors, otherwise `Invalid` with all of them.
    pub fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Status::Valid
        } else {
            Status::Invalid(errors)
        }
    }

    /// Returns `true` if the verdict is `Valid`.
    pub fn is_valid(&self) -> bool {
        matches!(self, Status::Valid)
    }

    /// The reasons of an `Invalid` verdict; empty when valid.
    pub fn errors(&self) -> &[String] {
        match self {
            Status::Valid => &[],
            Status::Invalid(errors) => errors,
        }
    }

    /// Conjunction of two verdicts, concatenating errors in order.
    #[must_use]
    pub fn and(self, other: Status) -> Status {
        match (self.normalized(), other.normalized()) {
            (Status::Valid, Status::Valid) => Status::Valid,
            (Status::Valid, invalid) | (invalid, Status::Valid) => invalid,
            (Status::Invalid(mut first), Status::Invalid(second)) => {
                first.extend(second);
                Status::Invalid(first)
            }
        }
    }
}

impl Status {
    fn normalized(self) -> Status {
        match self {
            Status::Invalid(errors) if errors.is_empty() => Status::invalid(UNSPECIFIED),
            status => status,
        }
    }
}

impl FromIterator<Status> for Status {
    fn from_iter<T: IntoIterator<Item = Status>>(iter: T) -> Self {
        iter.into_iter().fold(Status::Valid, Status::and)
    }
}

/// A semantic check over an authenticator.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Check the authenticator.
    async fn is_valid(&self, authenticator: &Authenticator) -> Result<Status>;
}

#[async_trait]
impl<V: Validator + ?Sized> Validator for Arc<V> {
    async fn is_valid(&self, authenticator: &Authenticator) -> Result<Status> {
        (**self).is_valid(authenticator).await
    }
}

/// An ordered set of validators.
#[derive(Clone, Default)]
pub struct Validators {
    validators: Vec<Arc<dyn Validator>>,
}

impl Validators {
    /// An empty set, which accepts every authenticator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator to the set.
    #[must_use]
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// The validators `settings` call for: expiry always, and the idle
    /// timeout when one is configured. Fingerprint checks depend on the
    /// request and are added per source.
    pub fn from_settings<C: Clock + Clone>(settings: &AuthenticatorSettings, clock: C) -> Self {
        let validators = Self::new().with(ExpirationValidator::new(clock.clone()));
        match settings.idle_timeout() {
            Some(timeout) => validators.with(IdleTimeoutValidator::new(timeout, clock)),
            None => validators,
        }
    }

    /// Add a shared validator to the set.
    pub fn push(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
    }

    /// Append every validator of `other`.
    #[must_use]
    pub fn merge(mut self, other: Validators) -> Self {
        self.validators.extend(other.validators);
        self
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every validator concurrently and fold the verdicts.
    ///
    /// All validators run to completion even when one already failed. If
    /// any validator errors, the first error in set order is returned.
    pub async fn is_valid(&self, authenticator: &Authenticator) -> Result<Status> {
        let verdicts = join_all(
            self.validators
                .iter()
                .map(|validator| validator.is_valid(authenticator)),
        )
        .await;
        verdicts.into_iter().collect::<Result<Status>>()
    }
}

impl fmt::Debug for Validators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validators")
            .field("len", &self.validators.len())
            .finish()
    }
}

impl FromIterator<Arc<dyn Validator>> for Validators {
    fn from_iter<T: IntoIterator<Item = Arc<dyn Validator>>>(iter: T) -> Self {
        Self {
            validators: iter.into_iter().collect(),
        }
    }
}

/// Render a duration the way validator messages show it: whole seconds as
/// `10s`, anything finer as milliseconds.
pub(crate) fn format_duration(duration: Duration) -> String {
    let duration = duration.abs();
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.num_seconds())
    } else {
        format!("{}ms", duration.num_milliseconds())
    }
}

/// Rejects authenticators whose absolute expiry has passed.
#[derive(Debug, Clone)]
pub struct ExpirationValidator<C> {
    clock: C,
}

impl<C: Clock> ExpirationValidator<C> {
    /// Check expiry against `clock`.
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl<C: Clock> Validator for ExpirationValidator<C> {
    async fn is_valid(&self, authenticator: &Authenticator) -> Result<Status> {
        Ok(match authenticator.expires_in(self.clock.now()) {
            Some(remaining) if remaining < Duration::zero() => Status::invalid(format!(
                "Authenticator is expired {} ago",
                format_duration(remaining)
            )),
            _ => Status::Valid,
        })
    }
}

/// Rejects touched authenticators left unused for longer than a timeout.
#[derive(Debug, Clone)]
pub struct IdleTimeoutValidator<C> {
    timeout: Duration,
    clock: C,
}

impl<C: Clock> IdleTimeoutValidator<C> {
    /// Allow at most `timeout` between uses.
    pub fn new(timeout: Duration, clock: C) -> Self {
        Self { timeout, clock }
    }
}

#[async_trait]
impl<C: Clock> Validator for IdleTimeoutValidator<C> {
    async fn is_valid(&self, authenticator: &Authenticator) -> Result<Status> {
        Ok(match authenticator.touched_at(self.clock.now()) {
            Some(idle) if idle > self.timeout => Status::invalid(format!(
                "Authenticator timed out {} ago",
                format_duration(idle - self.timeout)
            )),
            _ => Status::Valid,
        })
    }
}

/// Rejects authenticators bound to a different client fingerprint.
#[derive(Debug, Clone)]
pub struct FingerprintValidator {
    expected: String,
}

impl FingerprintValidator {
    /// Expect the fingerprint of the current request.
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

#[async_trait]
impl Validator for FingerprintValidator {
    async fn is_valid(&self, authenticator: &Authenticator) -> Result<Status> {
        Ok(match authenticator.fingerprint() {
            Some(bound) if bound != self.expected => Status::invalid("Fingerprint does not match"),
            _ => Status::Valid,
        })
    }
}

/// Requires a set of tags.
#[derive(Debug, Clone)]
pub struct TagValidator {
    required: Vec<String>,
}

impl TagValidator {
    /// Require every tag in `required`.
    pub fn new<I, T>(required: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Validator for TagValidator {
    async fn is_valid(&self, authenticator: &Authenticator) -> Result<Status> {
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|tag| !authenticator.is_tagged_with([tag.as_str()]))
            .map(String::as_str)
            .collect();
        Ok(if missing.is_empty() {
            Status::Valid
        } else {
            Status::invalid(format!(
                "Authenticator is missing tags: {}",
                missing.join(", ")
            ))
        })
    }
}

/// Boxed future returned by a backing-store lookup.
pub type LookupFuture = Pin<Box<dyn Future<Output = Result<bool>> + Send>>;

type Lookup = Arc<dyn Fn(Authenticator) -> LookupFuture + Send + Sync>;

/// Checks an authenticator against a backing store.
///
/// The lookup decides the polarity: [`exists_in`](Self::exists_in) gives
/// whitelist semantics, [`absent_from`](Self::absent_from) blacklist
/// semantics.
#[derive(Clone)]
pub struct BackingStoreValidator {
    lookup: Lookup,
}

impl BackingStoreValidator {
    /// Message reported when the lookup answers `false`.
    pub const ERROR: &'static str = "Couldn't validate the authenticator against the backing store";

    /// Validate with an arbitrary lookup.
    pub fn new<F>(lookup: F) -> Self
    where
        F: Fn(Authenticator) -> LookupFuture + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Valid iff the store still holds the authenticator's id.
    pub fn exists_in<B: BackingStore + 'static>(store: Arc<B>) -> Self {
        Self::new(move |authenticator: Authenticator| {
            let store = store.clone();
            Box::pin(async move {
                let found = store.find(authenticator.id()).await?;
                Ok::<_, crate::Error>(found.is_some())
            })
        })
    }

    /// Valid iff the store does not hold the authenticator's id.
    pub fn absent_from<B: BackingStore + 'static>(store: Arc<B>) -> Self {
        Self::new(move |authenticator: Authenticator| {
            let store = store.clone();
            Box::pin(async move {
                let found = store.find(authenticator.id()).await?;
                Ok::<_, crate::Error>(found.is_none())
            })
        })
    }
}

impl fmt::Debug for BackingStoreValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackingStoreValidator").finish_non_exhaustive()
    }
}

#[async_trait]
impl Validator for BackingStoreValidator {
    async fn is_valid(&self, authenticator: &Authenticator) -> Result<Status> {
        let found = (self.lookup)(authenticator.clone()).await?;
        Ok(if found {
            Status::Valid
        } else {
            Status::invalid(Self::ERROR)
        })
    }
}
