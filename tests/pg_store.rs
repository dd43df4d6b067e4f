use serde_json::json;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use tarkov_wiki::application::repos::{CacheStore, SessionLookup};
use tarkov_wiki::infra::db::PostgresRepositories;

#[sqlx::test(migrations = "./migrations")]
async fn upsert_keeps_one_row_and_advances_updated_at(pool: PgPool) {
    let repos = PostgresRepositories::new(pool.clone());
    let expires = OffsetDateTime::now_utc() + Duration::hours(2);

    let first = repos
        .upsert("cache:items:list:ja:v1", &json!([{ "id": "a" }]), expires)
        .await
        .expect("first upsert");
    let second = repos
        .upsert("cache:items:list:ja:v1", &json!([{ "id": "b" }]), expires)
        .await
        .expect("second upsert");

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.value, json!([{ "id": "b" }]));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries")
        .fetch_one(&pool)
        .await
        .expect("count rows");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn read_fresh_honours_the_expiry_boundary(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let now = OffsetDateTime::now_utc();
    repos
        .upsert("cache:tasks:list:en:v1", &json!([]), now + Duration::minutes(5))
        .await
        .expect("upsert");

    let fresh = repos
        .read_fresh("cache:tasks:list:en:v1", now)
        .await
        .expect("read fresh");
    assert!(fresh.is_some());

    let later = now + Duration::minutes(10);
    let expired = repos
        .read_fresh("cache:tasks:list:en:v1", later)
        .await
        .expect("read after expiry");
    assert!(expired.is_none());

    let stale = repos
        .read("cache:tasks:list:en:v1")
        .await
        .expect("read regardless of expiry");
    assert!(stale.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn prefix_delete_treats_the_prefix_literally(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let expires = OffsetDateTime::now_utc() + Duration::hours(1);
    for key in [
        "cache:item:detail:ja:a_1:v1",
        "cache:item:detail:ja:b:v1",
        "cache:item:detail:en:a_1:v1",
        "cache:items:list:ja:v1",
    ] {
        repos.upsert(key, &json!({}), expires).await.expect("upsert");
    }

    let removed = repos
        .delete_by_prefix("cache:item:detail:ja:")
        .await
        .expect("prefix delete");
    assert_eq!(removed, 2);

    // `_` and `%` are ordinary characters, not LIKE wildcards.
    let removed = repos
        .delete_by_prefix("cache:item:detail:en:a%")
        .await
        .expect("wildcard-looking prefix");
    assert_eq!(removed, 0);

    assert!(repos.delete("cache:items:list:ja:v1").await.expect("delete"));
    assert!(!repos.delete("cache:items:list:ja:v1").await.expect("second delete"));
    repos.health_check().await.expect("store is healthy");
}

#[sqlx::test(migrations = "./migrations")]
async fn sessions_resolve_only_while_unexpired(pool: PgPool) {
    let user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, email, username, password_hash) VALUES ($1, $2, $3, 'x')",
    )
    .bind(user_id)
    .bind("scav@example.com")
    .bind("scav")
    .execute(&pool)
    .await
    .expect("insert user");

    let now = OffsetDateTime::now_utc();
    for (token, expires) in [
        ("live-token", now + Duration::days(1)),
        ("dead-token", now - Duration::days(1)),
    ] {
        sqlx::query(
            "INSERT INTO sessions (id, session_token, user_id, expires) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(token)
        .bind(user_id)
        .bind(expires)
        .execute(&pool)
        .await
        .expect("insert session");
    }

    let repos = PostgresRepositories::new(pool);
    let user = repos
        .find_active_session("live-token", now)
        .await
        .expect("lookup")
        .expect("live session resolves");
    assert_eq!(user.id, user_id);
    assert_eq!(user.email, "scav@example.com");
    assert_eq!(user.username.as_deref(), Some("scav"));

    assert!(
        repos
            .find_active_session("dead-token", now)
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(
        repos
            .find_active_session("missing", now)
            .await
            .expect("lookup")
            .is_none()
    );
}
