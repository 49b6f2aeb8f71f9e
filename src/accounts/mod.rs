//! User and role administration.

pub mod roles;
pub mod users;

pub use roles::{create_role, delete_role, list_roles, update_role, NewRole, RolePatch};
pub use users::{create_user, get_user, list_users, NewUser, UserWithRole};
