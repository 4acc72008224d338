pub mod role;
pub mod user;

pub use role::{CatalogChanges, Permission, Role, RolePermission};
pub use user::{NewUser, User, UserChanges, UserStatus};
