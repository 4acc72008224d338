pub mod memory;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod users;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    CatalogChanges, NewUser, Permission, Role, RolePermission, User, UserChanges,
};

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                StoreError::ForeignKeyViolation(db_err.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Credential store. Emails passed in are already normalized.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    /// Returns `None` when no user has this id.
    async fn update_user(&self, id: Uuid, changes: UserChanges)
        -> Result<Option<User>, StoreError>;
    /// Returns `false` when no user has this id.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;
    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;
    async fn insert_role(&self, name: &str, description: Option<&str>)
        -> Result<Role, StoreError>;
    async fn update_role(&self, id: Uuid, changes: CatalogChanges)
        -> Result<Option<Role>, StoreError>;
    /// Users holding the role lose it; its permission assignments go too.
    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError>;
    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>, StoreError>;
    async fn find_permission_by_name(&self, name: &str)
        -> Result<Option<Permission>, StoreError>;
    async fn insert_permission(&self, name: &str, description: Option<&str>)
        -> Result<Permission, StoreError>;
    async fn update_permission(&self, id: Uuid, changes: CatalogChanges)
        -> Result<Option<Permission>, StoreError>;
    async fn delete_permission(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_role_permissions(&self) -> Result<Vec<RolePermission>, StoreError>;
    async fn find_role_permission(&self, role_id: Uuid, permission_id: Uuid)
        -> Result<Option<RolePermission>, StoreError>;
    async fn insert_role_permission(&self, role_id: Uuid, permission_id: Uuid)
        -> Result<RolePermission, StoreError>;
    async fn delete_role_permission(&self, role_id: Uuid, permission_id: Uuid)
        -> Result<bool, StoreError>;
}

/// Everything the HTTP layer needs from persistence.
pub trait Store: UserStore + RoleStore + PermissionStore {}

impl<T> Store for T where T: UserStore + RoleStore + PermissionStore {}

/// Postgres-backed store. Cloning shares the pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(users::list_all(&self.pool).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(users::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(users::find_by_email(&self.pool, email).await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        Ok(users::create(&self.pool, &user).await?)
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        Ok(users::update(&self.pool, id, &changes).await?)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(users::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl RoleStore for PgStore {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(roles::list_all(&self.pool).await?)
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        Ok(roles::find_by_id(&self.pool, id).await?)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(roles::find_by_name(&self.pool, name).await?)
    }

    async fn insert_role(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, StoreError> {
        Ok(roles::create(&self.pool, name, description).await?)
    }

    async fn update_role(
        &self,
        id: Uuid,
        changes: CatalogChanges,
    ) -> Result<Option<Role>, StoreError> {
        Ok(roles::update(&self.pool, id, &changes).await?)
    }

    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(roles::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl PermissionStore for PgStore {
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        Ok(permissions::list_all(&self.pool).await?)
    }

    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>, StoreError> {
        Ok(permissions::find_by_id(&self.pool, id).await?)
    }

    async fn find_permission_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Permission>, StoreError> {
        Ok(permissions::find_by_name(&self.pool, name).await?)
    }

    async fn insert_permission(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Permission, StoreError> {
        Ok(permissions::create(&self.pool, name, description).await?)
    }

    async fn update_permission(
        &self,
        id: Uuid,
        changes: CatalogChanges,
    ) -> Result<Option<Permission>, StoreError> {
        Ok(permissions::update(&self.pool, id, &changes).await?)
    }

    async fn delete_permission(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(permissions::delete(&self.pool, id).await?)
    }

    async fn list_role_permissions(&self) -> Result<Vec<RolePermission>, StoreError> {
        Ok(role_permissions::list_all(&self.pool).await?)
    }

    async fn find_role_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<Option<RolePermission>, StoreError> {
        Ok(role_permissions::find(&self.pool, role_id, permission_id).await?)
    }

    async fn insert_role_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<RolePermission, StoreError> {
        Ok(role_permissions::create(&self.pool, role_id, permission_id).await?)
    }

    async fn delete_role_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(role_permissions::delete(&self.pool, role_id, permission_id).await?)
    }
}
