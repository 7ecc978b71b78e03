use sqlx::SqlitePool;

use crate::DbError;

const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial_schema",
    include_str!("migrations/0001_initial_schema.sql"),
)];

/// Apply every migration not yet recorded in `_migrations`. Safe to run on
/// every startup.
///
/// # Errors
///
/// * If any statement fails
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        ",
    )
    .execute(&mut *conn)
    .await?;

    for &(name, sql) in MIGRATIONS {
        let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        if applied.is_some() {
            log::trace!("run_migrations: {name} already applied");
            continue;
        }

        for statement in split_statements(sql) {
            sqlx::query(&statement)
                .execute(&mut *conn)
                .await
                .map_err(|e| DbError::Migration(format!("{name}: {e}")))?;
        }

        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        log::info!("run_migrations: applied {name}");
    }

    Ok(())
}

/// Split a migration file into statements, dropping `--` comments.
fn split_statements(sql: &str) -> Vec<String> {
    let without_comments = sql
        .lines()
        .map(|line| line.find("--").map_or(line, |idx| &line[..idx]))
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(ToString::to_string)
        .collect()
}
