use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Store a fresh reset token, replacing whatever the user had before.
pub async fn replace_for_user(
    db: &PgPool,
    user_id: Uuid,
    token: &str,
    expires_at: OffsetDateTime,
) -> Result<PasswordReset, sqlx::Error> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    let reset = sqlx::query_as::<_, PasswordReset>(
        r#"
        INSERT INTO password_resets (token, user_id, expires_at)
        VALUES ($1, $2, $3)
        RETURNING token, user_id, expires_at, created_at
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(reset)
}

pub async fn find_by_token(
    db: &PgPool,
    token: &str,
) -> Result<Option<PasswordReset>, sqlx::Error> {
    sqlx::query_as::<_, PasswordReset>(
        "SELECT token, user_id, expires_at, created_at FROM password_resets WHERE token = $1",
    )
    .bind(token)
    .fetch_optional(db)
    .await
}

pub async fn delete_token(db: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM password_resets WHERE token = $1")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}
