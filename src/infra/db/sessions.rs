use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, SessionLookup, SessionUser};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    id: Uuid,
    email: String,
    username: Option<String>,
}

#[async_trait]
impl SessionLookup for PostgresRepositories {
    async fn find_active_session(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SessionUser>, RepoError> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT u.id, u.email, u.username
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.session_token = $1 AND s.expires > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| SessionUser {
            id: row.id,
            email: row.email,
            username: row.username,
        }))
    }
}
