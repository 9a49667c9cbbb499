use crate::Database;
use crate::models::{ComplaintRow, NewComplaint, UserRow};
use anyhow::Result;
use civicfix_types::models::DEFAULT_STATUS;
use rusqlite::{Connection, ErrorCode};

impl Database {
    // -- Users --

    /// Inserts a user. Returns `None` when the email is already registered.
    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| insert_user(conn, username, email, password_hash, false))
    }

    /// Inserts an administrator unless the email is already taken.
    /// Returns whether a row was created.
    pub fn seed_admin(&self, username: &str, email: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(insert_user(conn, username, email, password_hash, true)?.is_some())
        })
    }

    /// Looks a user up by email, ignoring case. Rows written before emails
    /// were normalized may differ only in case; the oldest wins.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Complaints --

    pub fn insert_complaint(&self, complaint: &NewComplaint) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO complaints
                    (username, title, description, category, priority,
                     latitude, longitude, location_text, image, voice, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    complaint.username,
                    complaint.title,
                    complaint.description,
                    complaint.category,
                    complaint.priority,
                    complaint.latitude,
                    complaint.longitude,
                    complaint.location_text,
                    complaint.image,
                    complaint.voice,
                    DEFAULT_STATUS,
                    complaint.created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All complaints, newest first. Rows sharing a timestamp are ordered by
    /// descending id.
    pub fn list_complaints(&self) -> Result<Vec<ComplaintRow>> {
        self.with_conn(query_complaints)
    }

    /// Overwrites a complaint's status. Returns the number of rows touched,
    /// which is 0 for an unknown id.
    pub fn update_complaint_status(&self, id: i64, status: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE complaints SET status = ?1 WHERE id = ?2",
                rusqlite::params![status, id],
            )?;
            Ok(changed)
        })
    }
}

fn insert_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<Option<i64>> {
    let inserted = conn.execute(
        "INSERT INTO users (username, email, password, is_admin) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![username, email, password_hash, is_admin],
    );

    match inserted {
        Ok(_) => Ok(Some(conn.last_insert_rowid())),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password, is_admin FROM users
         WHERE lower(email) = lower(?1)
         ORDER BY id
         LIMIT 1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                is_admin: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_complaints(conn: &Connection) -> Result<Vec<ComplaintRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, title, description, category, priority,
                latitude, longitude, location_text, image, voice,
                assigned_department, status, created_at
         FROM complaints
         ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ComplaintRow {
                id: row.get(0)?,
                username: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                category: row.get(4)?,
                priority: row.get(5)?,
                latitude: row.get(6)?,
                longitude: row.get(7)?,
                location_text: row.get(8)?,
                image: row.get(9)?,
                voice: row.get(10)?,
                assigned_department: row.get(11)?,
                status: row.get(12)?,
                created_at: row.get(13)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
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
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn complaint(title: &str, created_at: &str) -> NewComplaint {
        NewComplaint {
            username: "alice".into(),
            title: title.into(),
            created_at: created_at.into(),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_email_is_rejected_without_insert() {
        let (_dir, db) = open_temp();

        let first = db.create_user("alice", "a@x.com", "hash1").unwrap();
        assert!(first.is_some());

        let second = db.create_user("other", "a@x.com", "hash2").unwrap();
        assert!(second.is_none());

        let user = db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.password, "hash1");
        assert!(!user.is_admin);
    }

    #[test]
    fn email_lookup_ignores_case() {
        let (_dir, db) = open_temp();
        db.create_user("legacy", "Mixed@X.com", "hash").unwrap();

        let user = db.get_user_by_email("mixed@x.com").unwrap().unwrap();
        assert_eq!(user.username, "legacy");
        assert_eq!(user.email, "Mixed@X.com");
    }

    #[test]
    fn seed_admin_only_inserts_once() {
        let (_dir, db) = open_temp();

        assert!(db.seed_admin("Admin", "admin@civicfix.com", "h").unwrap());
        assert!(!db.seed_admin("Admin", "admin@civicfix.com", "h2").unwrap());

        let admin = db.get_user_by_email("admin@civicfix.com").unwrap().unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.password, "h");
    }

    #[test]
    fn missing_user_is_none() {
        let (_dir, db) = open_temp();
        assert!(db.get_user_by_email("nobody@x.com").unwrap().is_none());
    }

    #[test]
    fn complaints_list_newest_first() {
        let (_dir, db) = open_temp();

        db.insert_complaint(&complaint("older", "2024-03-01 09:00:00")).unwrap();
        db.insert_complaint(&complaint("newer", "2024-03-02 08:00:00")).unwrap();
        // Same second as "newer" but inserted later
        db.insert_complaint(&complaint("latest", "2024-03-02 08:00:00")).unwrap();

        let titles: Vec<_> = db
            .list_complaints()
            .unwrap()
            .into_iter()
            .map(|c| c.title.unwrap())
            .collect();
        assert_eq!(titles, ["latest", "newer", "older"]);
    }

    #[test]
    fn inserted_complaint_starts_pending() {
        let (_dir, db) = open_temp();

        let mut new = complaint("streetlight", "2024-03-01 09:00:00");
        new.latitude = Some(12.34);
        db.insert_complaint(&new).unwrap();

        let row = db.list_complaints().unwrap().remove(0);
        assert_eq!(row.status.as_deref(), Some(DEFAULT_STATUS));
        assert_eq!(row.latitude, Some(12.34));
        assert_eq!(row.longitude, None);
        assert_eq!(row.assigned_department, None);
    }

    #[test]
    fn status_update_reports_rows_touched() {
        let (_dir, db) = open_temp();
        let id = db.insert_complaint(&complaint("leak", "2024-03-01 09:00:00")).unwrap();

        assert_eq!(db.update_complaint_status(id, "Resolved").unwrap(), 1);
        assert_eq!(db.update_complaint_status(999_999, "Resolved").unwrap(), 0);

        let row = db.list_complaints().unwrap().remove(0);
        assert_eq!(row.status.as_deref(), Some("Resolved"));
    }
}
