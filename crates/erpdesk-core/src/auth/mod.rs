//! Session handling.
//!
//! `SessionStore` keeps the signed-in flag and user identity in local
//! storage so a restart resumes the session. Signing in is simulated; no
//! credentials are checked against anything.

pub mod session;

pub use session::{SessionError, SessionStore, SessionUser, DEFAULT_LOGIN_DELAY};
