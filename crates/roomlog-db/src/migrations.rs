use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE entries (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name      TEXT,
                last_name       TEXT,
                room_number     INTEGER,
                additional_text TEXT,
                images          TEXT NOT NULL DEFAULT '[]',
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE timesheet_rows (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_id    INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
                row_index   INTEGER NOT NULL,
                room_number INTEGER,
                sign_in     TEXT,
                sign_out    TEXT,
                UNIQUE(entry_id, row_index)
            );

            -- Every entry starts with a blank row 0.
            CREATE TRIGGER entries_insert_row_zero
            AFTER INSERT ON entries
            BEGIN
                INSERT INTO timesheet_rows (entry_id, row_index) VALUES (NEW.id, 0);
            END;

            -- Deleting the last row of an entry refills a blank row 0.
            -- The EXISTS guard keeps the refill out of entry cascade deletes,
            -- where the owning entry is already gone.
            CREATE TRIGGER timesheet_rows_refill_row_zero
            AFTER DELETE ON timesheet_rows
            WHEN EXISTS (SELECT 1 FROM entries WHERE id = OLD.entry_id)
                 AND NOT EXISTS (SELECT 1 FROM timesheet_rows WHERE entry_id = OLD.entry_id)
            BEGIN
                INSERT INTO timesheet_rows (entry_id, row_index) VALUES (OLD.entry_id, 0);
            END;

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
