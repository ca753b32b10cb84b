use rusqlite::Connection;

/// Initialize the database schema, creating tables if they don't exist.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS states (
            target_id  TEXT PRIMARY KEY,
            updated_at TEXT NOT NULL,
            data       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS alerts (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at  TEXT    NOT NULL,
            target_id   TEXT    NOT NULL,
            from_status TEXT    NOT NULL,
            to_status   TEXT    NOT NULL,
            attempts    INTEGER NOT NULL,
            delivery    TEXT    NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_alerts_created_at ON alerts(created_at);
        CREATE INDEX IF NOT EXISTS idx_alerts_target_id ON alerts(target_id);",
    )?;
    Ok(())
}
