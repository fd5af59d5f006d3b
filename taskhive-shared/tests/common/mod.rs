/// Shared helpers for database integration tests
///
/// Tests run against the database named by `DATABASE_URL` and skip
/// themselves when it isn't set, so the pure-unit suite stays runnable
/// without PostgreSQL.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use taskhive_shared::auth::Actor;
use taskhive_shared::db::migrations;

/// Connects to the test database, or `None` when DATABASE_URL is unset
pub async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Should connect to test database");

    migrations::run_migrations(&pool)
        .await
        .expect("Should run migrations");

    Some(pool)
}

/// Creates a fresh user holding the given system role and loads its actor
pub async fn create_actor(pool: &PgPool, role_slug: &str) -> Actor {
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, email, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(format!("{id}@test.local"))
        .bind("Test User")
        .execute(pool)
        .await
        .expect("Should insert test user");

    sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE slug = $2")
        .bind(id)
        .bind(role_slug)
        .execute(pool)
        .await
        .expect("Should assign role");

    Actor::load(pool, id)
        .await
        .expect("Should load actor")
        .expect("Actor should exist")
}
