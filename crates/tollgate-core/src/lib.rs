#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Tollgate core library.
//!
//! Request authentication as a pipeline of pluggable capabilities:
//!
//! - [`AuthenticationPipeline`]: reader → validators → identity lookup,
//!   producing exactly one [`AuthState`] and never failing
//! - [`TargetPipeline`]: write-back of refreshed authenticators into
//!   responses, stateless ([`StatelessTarget`]) or backed by a
//!   [`BackingStore`] ([`StatefulTarget`])
//! - [`AuthenticatorProvider`]: runs both around application logic
//!
//! Token formats and HTTP transports live in `tollgate-jwt` and
//! `tollgate-http`.

pub mod authenticator;
pub mod authorization;
pub mod capability;
pub mod clock;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod settings;
pub mod state;
pub mod step;
pub mod store;
pub mod target;
pub mod validator;

#[cfg(test)]
mod proptests;

// Re-exports for convenience
pub use authenticator::{Authenticator, LoginInfo};
pub use authorization::{Authorization, Authorized, Unauthorized};
pub use capability::{
    AuthenticatorReader, AuthenticatorWriter, BackingStore, Discarder, Embedder, IdWriter,
    IdentityReader, Retriever, StoreReader, TokenCodec, TokenReader,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use pipeline::AuthenticationPipeline;
pub use provider::AuthenticatorProvider;
pub use settings::AuthenticatorSettings;
pub use state::AuthState;
pub use store::MemoryBackingStore;
pub use target::{StatefulTarget, StatelessTarget, TargetPipeline};
pub use validator::{
    BackingStoreValidator, ExpirationValidator, FingerprintValidator, IdleTimeoutValidator,
    Status, TagValidator, Validator, Validators,
};
