//! Database row types. These map directly to SQLite rows.
//! Distinct from civicfix-types API models to keep the DB layer independent.

use civicfix_types::api::ComplaintResponse;

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// Columns are nullable because rows may predate columns added by migrations.
#[derive(Debug, Clone)]
pub struct ComplaintRow {
    pub id: i64,
    pub username: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: Option<String>,
    pub image: Option<String>,
    pub voice: Option<String>,
    pub assigned_department: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

/// Values for a complaint insert. Status is always the default on insert.
#[derive(Debug, Clone, Default)]
pub struct NewComplaint {
    pub username: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: String,
    pub image: Option<String>,
    pub voice: Option<String>,
    pub created_at: String,
}

impl From<ComplaintRow> for ComplaintResponse {
    fn from(row: ComplaintRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            title: row.title,
            description: row.description,
            category: row.category,
            priority: row.priority,
            lat: row.latitude,
            lng: row.longitude,
            location_text: row.location_text,
            image: row.image,
            voice: row.voice,
            assigned_department: row.assigned_department,
            status: row.status,
            created_at: row.created_at,
        }
    }
}
