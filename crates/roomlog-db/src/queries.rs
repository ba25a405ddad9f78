use crate::Database;
use anyhow::Result;
use roomlog_types::models::{Entry, TimesheetRow};
use rusqlite::Connection;

impl Database {
    // -- Entries --

    /// Insert an entry. The row-zero timesheet row for the new entry is
    /// created by a trigger inside the same statement, so the two can never
    /// diverge.
    pub fn create_entry(
        &self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        room_number: Option<i64>,
        additional_text: Option<&str>,
        images: &[String],
    ) -> Result<i64> {
        let images_json = serde_json::to_string(images)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO entries (first_name, last_name, room_number, additional_text, images)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![first_name, last_name, room_number, additional_text, images_json],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<Entry>> {
        self.with_conn(|conn| query_entry(conn, id))
    }

    /// No query returns every entry; otherwise a case-insensitive substring
    /// match against any of the text fields or the room number as text.
    pub fn search_entries(&self, query: Option<&str>) -> Result<Vec<Entry>> {
        self.with_conn(|conn| match query {
            Some(q) if !q.is_empty() => query_entries_matching(conn, q),
            _ => query_all_entries(conn),
        })
    }

    /// Overwrites the four text/room fields; the image list is untouched.
    /// Returns the number of rows changed (0 means no such entry).
    pub fn update_entry(
        &self,
        id: i64,
        first_name: Option<&str>,
        last_name: Option<&str>,
        room_number: Option<i64>,
        additional_text: Option<&str>,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE entries
                 SET first_name = ?2, last_name = ?3, room_number = ?4, additional_text = ?5
                 WHERE id = ?1",
                rusqlite::params![id, first_name, last_name, room_number, additional_text],
            )?;
            Ok(changed)
        })
    }

    pub fn update_entry_images(&self, id: i64, images: &[String]) -> Result<usize> {
        let images_json = serde_json::to_string(images)?;
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE entries SET images = ?2 WHERE id = ?1",
                rusqlite::params![id, images_json],
            )?;
            Ok(changed)
        })
    }

    /// Deletes an entry; its timesheet rows go with it (CASCADE).
    pub fn delete_entry(&self, id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM entries WHERE id = ?1", [id])?;
            Ok(changed)
        })
    }

    // -- Timesheet rows --

    pub fn list_timesheet_rows(&self, entry_id: i64) -> Result<Vec<TimesheetRow>> {
        self.with_conn(|conn| query_timesheet_rows(conn, entry_id))
    }

    /// The row with the highest index for an entry — the "current" slot.
    pub fn latest_timesheet_row(&self, entry_id: i64) -> Result<Option<TimesheetRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, entry_id, row_index, room_number, sign_in, sign_out
                 FROM timesheet_rows
                 WHERE entry_id = ?1
                 ORDER BY row_index DESC
                 LIMIT 1",
                [entry_id],
                map_timesheet_row,
            )
            .optional()
        })
    }

    pub fn insert_timesheet_row(&self, entry_id: i64, row_index: i64) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO timesheet_rows (entry_id, row_index) VALUES (?1, ?2)",
                rusqlite::params![entry_id, row_index],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn sign_in_row(
        &self,
        entry_id: i64,
        row_index: i64,
        room_number: Option<i64>,
        sign_in: Option<&str>,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE timesheet_rows SET room_number = ?3, sign_in = ?4
                 WHERE entry_id = ?1 AND row_index = ?2",
                rusqlite::params![entry_id, row_index, room_number, sign_in],
            )?;
            Ok(changed)
        })
    }

    pub fn sign_out_row(
        &self,
        entry_id: i64,
        row_index: i64,
        sign_out: Option<&str>,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE timesheet_rows SET sign_out = ?3
                 WHERE entry_id = ?1 AND row_index = ?2",
                rusqlite::params![entry_id, row_index, sign_out],
            )?;
            Ok(changed)
        })
    }

    pub fn update_timesheet_row(
        &self,
        entry_id: i64,
        row_index: i64,
        room_number: Option<i64>,
        sign_in: Option<&str>,
        sign_out: Option<&str>,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE timesheet_rows SET room_number = ?3, sign_in = ?4, sign_out = ?5
                 WHERE entry_id = ?1 AND row_index = ?2",
                rusqlite::params![entry_id, row_index, room_number, sign_in, sign_out],
            )?;
            Ok(changed)
        })
    }

    /// Deletes a row. If it was the entry's last row, a trigger refills a
    /// blank row 0 within the same statement.
    pub fn delete_timesheet_row(&self, entry_id: i64, row_index: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM timesheet_rows WHERE entry_id = ?1 AND row_index = ?2",
                rusqlite::params![entry_id, row_index],
            )?;
            Ok(changed)
        })
    }
}

fn query_entry(conn: &Connection, id: i64) -> Result<Option<Entry>> {
    conn.query_row(
        "SELECT id, first_name, last_name, room_number, additional_text, images, created_at
         FROM entries WHERE id = ?1",
        [id],
        map_entry,
    )
    .optional()
}

fn query_all_entries(conn: &Connection) -> Result<Vec<Entry>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, room_number, additional_text, images, created_at
         FROM entries ORDER BY id",
    )?;

    let rows = stmt
        .query_map([], map_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_entries_matching(conn: &Connection, query: &str) -> Result<Vec<Entry>> {
    // LIKE is case-insensitive for ASCII; NULL fields never match.
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, room_number, additional_text, images, created_at
         FROM entries
         WHERE first_name LIKE '%' || ?1 || '%'
            OR last_name LIKE '%' || ?1 || '%'
            OR CAST(room_number AS TEXT) LIKE '%' || ?1 || '%'
            OR additional_text LIKE '%' || ?1 || '%'
         ORDER BY id",
    )?;

    let rows = stmt
        .query_map([query], map_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_timesheet_rows(conn: &Connection, entry_id: i64) -> Result<Vec<TimesheetRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, entry_id, row_index, room_number, sign_in, sign_out
         FROM timesheet_rows
         WHERE entry_id = ?1
         ORDER BY row_index",
    )?;

    let rows = stmt
        .query_map([entry_id], map_timesheet_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    let images_json: String = row.get(5)?;
    let images = serde_json::from_str(&images_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Entry {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        room_number: row.get(3)?,
        additional_text: row.get(4)?,
        images,
        created_at: row.get(6)?,
    })
}

fn map_timesheet_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TimesheetRow> {
    Ok(TimesheetRow {
        id: row.get(0)?,
        entry_id: row.get(1)?,
        timesheet_row: row.get(2)?,
        room_number: row.get(3)?,
        sign_in: row.get(4)?,
        sign_out: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn blank_entry(db: &Database) -> i64 {
        db.create_entry(None, None, None, None, &[]).unwrap()
    }

    #[test]
    fn test_create_entry_spawns_blank_row_zero() {
        let db = db();
        let id = db
            .create_entry(Some("Alice"), None, Some(101), None, &[])
            .unwrap();

        let rows = db.list_timesheet_rows(id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timesheet_row, 0);
        assert_eq!(rows[0].room_number, None);
        assert_eq!(rows[0].sign_in, None);
        assert_eq!(rows[0].sign_out, None);
    }

    #[test]
    fn test_deleting_last_row_refills_row_zero() {
        let db = db();
        let id = blank_entry(&db);

        // Put some data on row 0 so the refill is observable
        db.sign_in_row(id, 0, Some(7), Some("2024-01-01T09:00"))
            .unwrap();

        db.delete_timesheet_row(id, 0).unwrap();
        let rows = db.list_timesheet_rows(id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timesheet_row, 0);
        assert_eq!(rows[0].room_number, None);
        assert_eq!(rows[0].sign_in, None);

        // Idempotent: deleting the refilled row reproduces the same state
        db.delete_timesheet_row(id, 0).unwrap();
        let rows = db.list_timesheet_rows(id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timesheet_row, 0);
        assert_eq!(rows[0].sign_in, None);
    }

    #[test]
    fn test_deleting_one_of_many_rows_does_not_refill() {
        let db = db();
        let id = blank_entry(&db);
        db.insert_timesheet_row(id, 1).unwrap();

        db.delete_timesheet_row(id, 1).unwrap();
        let rows = db.list_timesheet_rows(id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timesheet_row, 0);
    }

    #[test]
    fn test_entry_delete_cascades_rows() {
        let db = db();
        let id = blank_entry(&db);
        db.insert_timesheet_row(id, 1).unwrap();
        db.insert_timesheet_row(id, 2).unwrap();

        assert_eq!(db.delete_entry(id).unwrap(), 1);
        assert!(db.list_timesheet_rows(id).unwrap().is_empty());
        assert!(db.get_entry(id).unwrap().is_none());
    }

    #[test]
    fn test_search_matches_any_field_case_insensitive() {
        let db = db();
        db.create_entry(Some("Alice"), Some("Smith"), Some(42), None, &[])
            .unwrap();
        db.create_entry(Some("Bob"), Some("Jones"), Some(7), Some("likes room 42"), &[])
            .unwrap();
        db.create_entry(None, None, None, None, &[]).unwrap();

        // No query (or empty) returns everything
        assert_eq!(db.search_entries(None).unwrap().len(), 3);
        assert_eq!(db.search_entries(Some("")).unwrap().len(), 3);

        // "42" matches room_number on one entry and additional_text on another
        let hits = db.search_entries(Some("42")).unwrap();
        assert_eq!(hits.len(), 2);

        let hits = db.search_entries(Some("aLiCe")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name.as_deref(), Some("Alice"));

        assert!(db.search_entries(Some("zzz")).unwrap().is_empty());
    }

    #[test]
    fn test_image_list_round_trip() {
        let db = db();
        let id = db
            .create_entry(None, None, None, None, &["a.png".into(), "b.png".into()])
            .unwrap();

        let entry = db.get_entry(id).unwrap().unwrap();
        assert_eq!(entry.images, vec!["a.png", "b.png"]);

        db.update_entry_images(id, &["b.png".into()]).unwrap();
        let entry = db.get_entry(id).unwrap().unwrap();
        assert_eq!(entry.images, vec!["b.png"]);
    }

    #[test]
    fn test_sign_in_out_scenario() {
        let db = db();
        let id = db
            .create_entry(Some("Alice"), None, Some(101), None, &[])
            .unwrap();

        db.insert_timesheet_row(id, 1).unwrap();
        assert_eq!(
            db.sign_in_row(id, 1, Some(101), Some("2024-01-01T09:00")).unwrap(),
            1
        );
        assert_eq!(db.sign_out_row(id, 1, Some("2024-01-01T17:00")).unwrap(), 1);

        let rows = db.list_timesheet_rows(id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timesheet_row, 0);
        assert_eq!(rows[0].sign_in, None);
        assert_eq!(rows[1].timesheet_row, 1);
        assert_eq!(rows[1].room_number, Some(101));
        assert_eq!(rows[1].sign_in.as_deref(), Some("2024-01-01T09:00"));
        assert_eq!(rows[1].sign_out.as_deref(), Some("2024-01-01T17:00"));

        let latest = db.latest_timesheet_row(id).unwrap().unwrap();
        assert_eq!(latest.timesheet_row, 1);
    }

    #[test]
    fn test_update_missing_entry_changes_nothing() {
        let db = db();
        let changed = db
            .update_entry(999, Some("Nobody"), None, None, None)
            .unwrap();
        assert_eq!(changed, 0);
        assert!(db.search_entries(None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_entry_reports_zero() {
        let db = db();
        let id = blank_entry(&db);
        assert_eq!(db.delete_entry(id).unwrap(), 1);
        assert_eq!(db.delete_entry(id).unwrap(), 0);
    }

    #[test]
    fn test_missing_row_updates_change_nothing() {
        let db = db();
        let id = blank_entry(&db);

        assert_eq!(db.sign_in_row(id, 5, Some(1), Some("x")).unwrap(), 0);
        assert_eq!(db.sign_out_row(id, 5, Some("x")).unwrap(), 0);
        assert_eq!(db.update_timesheet_row(id, 5, None, None, None).unwrap(), 0);
        assert_eq!(db.latest_timesheet_row(999).unwrap(), None);
    }

    #[test]
    fn test_duplicate_row_index_rejected() {
        let db = db();
        let id = blank_entry(&db);
        // Row 0 exists from the insert trigger
        assert!(db.insert_timesheet_row(id, 0).is_err());
    }
}
