use std::collections::HashSet;
use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::error::AppError;

/// SQL scalar that lowercases text with full Unicode case mapping (SQLite's own `lower` and
/// `LIKE` only fold ASCII). `NULL` stays `NULL`.
pub const UNICODE_LOWER_FN: &str = "unicode_lower";

/// Schema migrations, applied in this order.
const MIGRATIONS: [(&str, &str); 2] = [
    (
        "0001_init.sql",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../migrations/0001_init.sql"
        )),
    ),
    (
        "0002_add_updated_at_index.sql",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../migrations/0002_add_updated_at_index.sql"
        )),
    ),
];

fn migration_err(code: &'static str, message: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> AppError {
    let message = message.into();
    move |e| AppError::new(code, message).with_details(e.to_string())
}

/// Install the SQL functions the incident queries rely on. Safe to call more than once.
pub fn register_functions(conn: &Connection) -> Result<(), AppError> {
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|s| s.to_lowercase()))
        },
    )
    .map_err(|e| {
        AppError::new("DB_FUNCTION_FAILED", "Failed to register SQL functions")
            .with_details(e.to_string())
    })
}

pub fn open(path: &Path) -> Result<Connection, AppError> {
    let conn = Connection::open(path).map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to open SQLite database")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    register_functions(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection, AppError> {
    let conn = Connection::open_in_memory().map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to open in-memory SQLite database")
            .with_details(e.to_string())
    })?;
    register_functions(&conn)?;
    Ok(conn)
}

/// In-memory database with the schema applied; the common starting point for tests and demos.
pub fn open_in_memory_migrated() -> Result<Connection, AppError> {
    let mut conn = open_in_memory()?;
    migrate(&mut conn)?;
    Ok(conn)
}

fn applied_migrations(conn: &Connection) -> Result<HashSet<String>, AppError> {
    let mut stmt = conn
        .prepare("SELECT name FROM _migrations")
        .map_err(migration_err("DB_MIGRATIONS_QUERY_FAILED", "Failed to query applied migrations"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(migration_err("DB_MIGRATIONS_QUERY_FAILED", "Failed to read applied migrations"))?
        .collect::<rusqlite::Result<HashSet<_>>>()
        .map_err(migration_err("DB_MIGRATIONS_QUERY_FAILED", "Failed to read applied migration row"))?;
    Ok(names)
}

fn apply_migration(conn: &mut Connection, name: &str, sql: &str) -> Result<(), AppError> {
    let tx = conn
        .transaction()
        .map_err(migration_err("DB_TX_FAILED", "Failed to start migration transaction"))?;
    tx.execute_batch(sql)
        .map_err(migration_err("DB_MIGRATION_FAILED", format!("Migration {name} failed")))?;
    tx.execute(
        "INSERT INTO _migrations(name, applied_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
        [name],
    )
    .map_err(migration_err("DB_MIGRATION_FAILED", format!("Failed to record migration {name}")))?;
    tx.commit()
        .map_err(migration_err("DB_TX_FAILED", "Failed to commit migration transaction"))
}

/// Bring the incident schema up to date. Each migration runs once, in its own transaction.
pub fn migrate(conn: &mut Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
           name TEXT PRIMARY KEY NOT NULL,
           applied_at TEXT NOT NULL
         );",
    )
    .map_err(migration_err(
        "DB_MIGRATIONS_TABLE_FAILED",
        "Failed to ensure migrations table exists",
    ))?;

    let applied = applied_migrations(conn)?;
    for (name, sql) in MIGRATIONS.iter().filter(|(name, _)| !applied.contains(*name)) {
        apply_migration(conn, name, sql)?;
        tracing::debug!(migration = name, "applied migration");
    }
    Ok(())
}
