//! Session Management
//!
//! Client-side session lifecycle: the persisted bearer token, decoding and
//! expiry checks, and the login/logout flow.
//!
//! ## Architecture
//!
//! - **TokenStore**: persistence for the single token string
//! - **token**: payload decoding and expiry rules
//! - **SessionService**: login, logout and the observable current user

mod error;
mod service;
mod store;
pub(crate) mod token;

pub use error::{SessionError, SessionResult, StoreError, StoreResult};
pub use service::{LoginOutcome, SessionService};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use token::{decode, TokenPayload};
