use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Sessions and characters carry no foreign keys: ids in a payload are
/// stored as given, whether or not they exist.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            host_user_id    TEXT NOT NULL,
            player_count    INTEGER NOT NULL,
            current_phase   INTEGER NOT NULL DEFAULT 0,
            is_active       INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_active
            ON sessions(is_active);

        CREATE TABLE IF NOT EXISTS characters (
            id                      TEXT PRIMARY KEY,
            session_id              TEXT NOT NULL,
            user_id                 TEXT NOT NULL,
            first_name              TEXT NOT NULL,
            last_name               TEXT NOT NULL,
            profession              TEXT NOT NULL,
            relationship_to_host    TEXT NOT NULL,
            is_murderer             INTEGER NOT NULL DEFAULT 0,
            created_at              TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_characters_session
            ON characters(session_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
