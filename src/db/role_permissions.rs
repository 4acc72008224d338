use sqlx::PgPool;
use uuid::Uuid;

use crate::models::RolePermission;

pub async fn list_all(pool: &PgPool) -> Result<Vec<RolePermission>, sqlx::Error> {
    sqlx::query_as::<_, RolePermission>(
        "SELECT role_id, permission_id FROM role_permissions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
}

pub async fn find(
    pool: &PgPool,
    role_id: Uuid,
    permission_id: Uuid,
) -> Result<Option<RolePermission>, sqlx::Error> {
    sqlx::query_as::<_, RolePermission>(
        "SELECT role_id, permission_id FROM role_permissions
         WHERE role_id = $1 AND permission_id = $2",
    )
    .bind(role_id)
    .bind(permission_id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    role_id: Uuid,
    permission_id: Uuid,
) -> Result<RolePermission, sqlx::Error> {
    sqlx::query_as::<_, RolePermission>(
        "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)
         RETURNING role_id, permission_id",
    )
    .bind(role_id)
    .bind(permission_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(
    pool: &PgPool,
    role_id: Uuid,
    permission_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
            .bind(role_id)
            .bind(permission_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
