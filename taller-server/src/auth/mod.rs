//! Authentication
//!
//! JWT sessions backed by the `access` list (lowercased-email key,
//! admin/employee roles) and argon2 password hashes.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
pub use password::{hash_password, verify_password};
