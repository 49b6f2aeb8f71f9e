//! Authentication and role-based authorization.

pub mod password;
pub mod permission;
pub mod roles;
pub mod session;
pub mod token;

pub use password::{hash_password, validate_password_strength, verify_password};
pub use permission::{is_super_admin, permissions_allow, require_permission, role_allows};
pub use roles::{
    backfill_role_ids, builtin_roles, ensure_initial_admin, promote_to_super_admin, resolve_role,
    seed_builtin_roles,
};
pub use session::{extract_token, AuthService, SESSION_COOKIE};
pub use token::{resolve_secret, Claims, TokenService};
