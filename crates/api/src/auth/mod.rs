//! Authentication and authorization for Herodex

pub mod action_token;
pub mod blocklist;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use action_token::{ActionClaims, TokenAction};
pub use blocklist::TokenBlocklist;
pub use jwt::{AccessClaims, TokenError, TokenIssuer, TokenUser};
pub use middleware::{
    require_access_token, require_admin, require_refresh_token, AuthUser, TokenKind,
};
pub use password::{hash_password, validate_password, verify_password};
