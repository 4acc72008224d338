use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{PermissionStore, RoleStore, StoreError, UserStore};
use crate::models::{
    CatalogChanges, NewUser, Permission, Role, RolePermission, User, UserChanges, UserStatus,
};

/// In-process store enforcing the same constraints as the Postgres schema:
/// unique emails and names, role references that must exist, role deletion
/// clearing user roles, and cascading assignment removal.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    // v7 ids sort by creation time
    users: BTreeMap<Uuid, User>,
    roles: BTreeMap<Uuid, Role>,
    permissions: BTreeMap<Uuid, Permission>,
    role_permissions: Vec<RolePermission>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn check_role(&self, role_id: Option<Uuid>) -> Result<(), StoreError> {
        match role_id {
            Some(id) if !self.roles.contains_key(&id) => Err(StoreError::ForeignKeyViolation(
                format!("role {id} does not exist"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.users.values().rev().cloned().collect())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.inner.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::UniqueViolation(format!(
                "email {} already exists",
                user.email
            )));
        }
        tables.check_role(user.role_id)?;

        let user = User {
            id: Uuid::now_v7(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            role_id: user.role_id,
            status: UserStatus::Active,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(email) = &changes.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::UniqueViolation(format!(
                    "email {email} already exists"
                )));
            }
        }
        if let Some(role_id) = changes.role_id {
            tables.check_role(role_id)?;
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        if let Some(role_id) = changes.role_id {
            user.role_id = role_id;
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let tables = self.inner.read().await;
        let mut roles: Vec<Role> = tables.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        Ok(self.inner.read().await.roles.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.roles.values().find(|r| r.name == name).cloned())
    }

    async fn insert_role(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, StoreError> {
        let mut tables = self.inner.write().await;
        if tables.roles.values().any(|r| r.name == name) {
            return Err(StoreError::UniqueViolation(format!("role {name} already exists")));
        }
        let role = Role {
            id: Uuid::now_v7(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(
        &self,
        id: Uuid,
        changes: CatalogChanges,
    ) -> Result<Option<Role>, StoreError> {
        let mut tables = self.inner.write().await;
        if let Some(name) = &changes.name {
            if tables.roles.values().any(|r| &r.name == name && r.id != id) {
                return Err(StoreError::UniqueViolation(format!("role {name} already exists")));
            }
        }
        let Some(role) = tables.roles.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            role.name = name;
        }
        if let Some(description) = changes.description {
            role.description = description;
        }
        Ok(Some(role.clone()))
    }

    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.inner.write().await;
        if tables.roles.remove(&id).is_none() {
            return Ok(false);
        }
        for user in tables.users.values_mut() {
            if user.role_id == Some(id) {
                user.role_id = None;
            }
        }
        tables.role_permissions.retain(|rp| rp.role_id != id);
        Ok(true)
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let tables = self.inner.read().await;
        let mut permissions: Vec<Permission> = tables.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>, StoreError> {
        Ok(self.inner.read().await.permissions.get(&id).cloned())
    }

    async fn find_permission_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Permission>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.permissions.values().find(|p| p.name == name).cloned())
    }

    async fn insert_permission(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Permission, StoreError> {
        let mut tables = self.inner.write().await;
        if tables.permissions.values().any(|p| p.name == name) {
            return Err(StoreError::UniqueViolation(format!(
                "permission {name} already exists"
            )));
        }
        let permission = Permission {
            id: Uuid::now_v7(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn update_permission(
        &self,
        id: Uuid,
        changes: CatalogChanges,
    ) -> Result<Option<Permission>, StoreError> {
        let mut tables = self.inner.write().await;
        if let Some(name) = &changes.name {
            if tables.permissions.values().any(|p| &p.name == name && p.id != id) {
                return Err(StoreError::UniqueViolation(format!(
                    "permission {name} already exists"
                )));
            }
        }
        let Some(permission) = tables.permissions.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            permission.name = name;
        }
        if let Some(description) = changes.description {
            permission.description = description;
        }
        Ok(Some(permission.clone()))
    }

    async fn delete_permission(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.inner.write().await;
        if tables.permissions.remove(&id).is_none() {
            return Ok(false);
        }
        tables.role_permissions.retain(|rp| rp.permission_id != id);
        Ok(true)
    }

    async fn list_role_permissions(&self) -> Result<Vec<RolePermission>, StoreError> {
        Ok(self.inner.read().await.role_permissions.clone())
    }

    async fn find_role_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<Option<RolePermission>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .role_permissions
            .iter()
            .find(|rp| rp.role_id == role_id && rp.permission_id == permission_id)
            .copied())
    }

    async fn insert_role_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<RolePermission, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.roles.contains_key(&role_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "role {role_id} does not exist"
            )));
        }
        if !tables.permissions.contains_key(&permission_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "permission {permission_id} does not exist"
            )));
        }
        let assignment = RolePermission {
            role_id,
            permission_id,
        };
        if tables.role_permissions.contains(&assignment) {
            return Err(StoreError::UniqueViolation(
                "role permission already exists".to_string(),
            ));
        }
        tables.role_permissions.push(assignment);
        Ok(assignment)
    }

    async fn delete_role_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut tables = self.inner.write().await;
        let before = tables.role_permissions.len();
        tables
            .role_permissions
            .retain(|rp| !(rp.role_id == role_id && rp.permission_id == permission_id));
        Ok(tables.role_permissions.len() < before)
    }
}
