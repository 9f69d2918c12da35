//! Authentication collaborator — trait plus the GoTrue REST backend.

pub mod gotrue;
pub mod provider;

pub use gotrue::GoTrueAuth;
pub use provider::{AuthProvider, Session, SessionEvent};
