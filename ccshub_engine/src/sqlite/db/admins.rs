use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Admin, NewAdmin},
    traits::AccountApiError,
};

const ADMIN_COLUMNS: &str = "id, username, role, password_hash, created_at";

fn map_unique(e: sqlx::Error) -> AccountApiError {
    match e {
        sqlx::Error::Database(de) if de.is_unique_violation() => AccountApiError::UsernameTaken,
        e => e.into(),
    }
}

pub async fn fetch_admins(conn: &mut SqliteConnection) -> Result<Vec<Admin>, AccountApiError> {
    let q = format!("SELECT {ADMIN_COLUMNS} FROM admins ORDER BY id");
    let admins = sqlx::query_as::<_, Admin>(&q).fetch_all(conn).await?;
    Ok(admins)
}

pub async fn fetch_admin_by_id(admin_id: i64, conn: &mut SqliteConnection) -> Result<Option<Admin>, AccountApiError> {
    let q = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
    let admin = sqlx::query_as::<_, Admin>(&q).bind(admin_id).fetch_optional(conn).await?;
    Ok(admin)
}

pub async fn fetch_admin_by_username(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Admin>, AccountApiError> {
    let q = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE username = $1");
    let admin = sqlx::query_as::<_, Admin>(&q).bind(username).fetch_optional(conn).await?;
    Ok(admin)
}

pub async fn insert_admin(admin: NewAdmin, conn: &mut SqliteConnection) -> Result<Admin, AccountApiError> {
    let q = format!("INSERT INTO admins (username, role, password_hash) VALUES ($1, $2, $3) RETURNING {ADMIN_COLUMNS}");
    let admin = sqlx::query_as::<_, Admin>(&q)
        .bind(admin.username)
        .bind(admin.role)
        .bind(admin.password_hash)
        .fetch_one(conn)
        .await
        .map_err(map_unique)?;
    debug!("🗃️ Admin #{} ({}) created", admin.id, admin.username);
    Ok(admin)
}

pub async fn update_admin(
    admin_id: i64,
    admin: NewAdmin,
    conn: &mut SqliteConnection,
) -> Result<Option<Admin>, AccountApiError> {
    let q = format!(
        "UPDATE admins SET username = $1, role = $2, password_hash = $3 WHERE id = $4 RETURNING {ADMIN_COLUMNS}"
    );
    let admin = sqlx::query_as::<_, Admin>(&q)
        .bind(admin.username)
        .bind(admin.role)
        .bind(admin.password_hash)
        .bind(admin_id)
        .fetch_optional(conn)
        .await
        .map_err(map_unique)?;
    Ok(admin)
}

pub async fn delete_admin(admin_id: i64, conn: &mut SqliteConnection) -> Result<bool, AccountApiError> {
    let result = sqlx::query("DELETE FROM admins WHERE id = $1").bind(admin_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
