use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashSet;
use tracing::info;

/// Columns that older `complaints` tables may lack, with the type each is
/// added as. Additive only: nothing here is ever dropped or renamed.
const COMPLAINT_COLUMNS: &[(&str, &str)] = &[
    ("latitude", "REAL"),
    ("longitude", "REAL"),
    ("voice", "TEXT"),
    ("assigned_department", "TEXT"),
    ("location_text", "TEXT"),
];

const USER_COLUMNS: &[(&str, &str)] = &[("is_admin", "INTEGER NOT NULL DEFAULT 0")];

/// Brings the schema up to date. Safe to run on every start.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL,
            email       TEXT UNIQUE NOT NULL,
            password    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS complaints (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            username            TEXT,
            title               TEXT,
            description         TEXT,
            category            TEXT,
            priority            TEXT,
            latitude            REAL,
            longitude           REAL,
            location_text       TEXT,
            image               TEXT,
            voice               TEXT,
            assigned_department TEXT,
            status              TEXT DEFAULT 'Pending',
            created_at          TEXT
        );
        ",
    )?;

    ensure_columns(conn, "users", USER_COLUMNS)?;
    ensure_columns(conn, "complaints", COMPLAINT_COLUMNS)?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_complaints_created ON complaints(created_at);",
    )?;

    info!("Database migrations complete");
    Ok(())
}

fn ensure_columns(conn: &Connection, table: &str, columns: &[(&str, &str)]) -> Result<()> {
    let existing = table_columns(conn, table)?;

    for (name, column_type) in columns {
        if !existing.contains(*name) {
            conn.execute_batch(&format!(
                "ALTER TABLE {table} ADD COLUMN {name} {column_type};"
            ))?;
            info!("Added column {}.{}", table, name);
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_twice_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let cols = table_columns(&conn, "complaints").unwrap();
        for (name, _) in COMPLAINT_COLUMNS {
            assert!(cols.contains(*name), "missing {name}");
        }
        assert!(table_columns(&conn, "users").unwrap().contains("is_admin"));
    }

    #[test]
    fn adds_missing_columns_to_legacy_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
            );
            CREATE TABLE complaints (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT,
                title TEXT,
                description TEXT,
                category TEXT,
                priority TEXT,
                image TEXT,
                status TEXT DEFAULT 'Pending',
                created_at TEXT
            );
            INSERT INTO complaints (username, title, created_at)
                VALUES ('bob', 'Pothole', '2024-01-01 10:00:00');
            ",
        )
        .unwrap();

        run(&conn).unwrap();

        let cols = table_columns(&conn, "complaints").unwrap();
        for name in ["latitude", "longitude", "voice", "assigned_department", "location_text"] {
            assert!(cols.contains(name), "missing {name}");
        }

        // Existing rows survive and read back NULL for the new columns
        let (title, lat): (String, Option<f64>) = conn
            .query_row("SELECT title, latitude FROM complaints", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(title, "Pothole");
        assert_eq!(lat, None);
    }
}
