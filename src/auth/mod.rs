//! Authentication: credentials, sessions, identity resolution and the
//! super_admin organization switch.

pub mod credentials;
pub mod extract;
pub mod resolver;
pub mod session;
pub mod switch;
pub mod token;

pub use credentials::{CredentialVerifier, SqliteCredentialVerifier, VerifiedCredentials};
pub use extract::{AuthContext, SessionToken};
pub use resolver::IdentityResolver;
pub use session::{
    run_session_sweeper, IssuedSession, Session, SessionManager, SessionStore, SessionView, SqliteSessionStore,
    SESSION_COOKIE_NAME,
};
pub use switch::{clear_organization_override, switch_organization};
pub use token::{Claims, SessionConfig};
