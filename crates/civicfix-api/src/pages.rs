// Server-rendered pages (Askama templates under templates/)

use askama::Template;
use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::error;

use civicfix_db::models::ComplaintRow;
use civicfix_types::api::Claims;

use crate::auth::AppState;
use crate::blocking;

const HOME_PATH: &str = "/home";

// Helper to render templates and handle errors
fn render_template<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e)).into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "sign.html")]
pub struct SignTemplate {
    pub version: &'static str,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub username: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub username: String,
    pub complaints: Vec<DashboardRow>,
}

#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub username: String,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub username: String,
}

// Complaint row flattened for templates (empty strings instead of Option)
pub struct DashboardRow {
    pub id: i64,
    pub username: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub location: String,
    pub image: String,
    pub voice: String,
    pub status: String,
    pub created_at: String,
}

impl From<ComplaintRow> for DashboardRow {
    fn from(row: ComplaintRow) -> Self {
        let location = match (row.location_text.as_deref(), row.latitude, row.longitude) {
            (Some(text), _, _) if !text.trim().is_empty() => text.to_string(),
            (_, Some(lat), Some(lng)) => format!("{:.5}, {:.5}", lat, lng),
            _ => String::new(),
        };

        Self {
            id: row.id,
            username: row.username.unwrap_or_default(),
            title: row.title.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            category: row.category.unwrap_or_default(),
            priority: row.priority.unwrap_or_default(),
            location,
            image: row.image.unwrap_or_default(),
            voice: row.voice.unwrap_or_default(),
            status: row.status.unwrap_or_default(),
            created_at: row.created_at.unwrap_or_default(),
        }
    }
}

/// GET /: sign-in page, or straight to /home for a live session.
pub async fn sign(State(state): State<AppState>, jar: CookieJar) -> Response {
    if state.session.claims(&jar).is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    render_template(SignTemplate {
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn home(Extension(claims): Extension<Claims>) -> Response {
    render_template(HomeTemplate {
        username: claims.username,
    })
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, StatusCode> {
    let db = state.db.clone();
    let rows = blocking(move || db.list_complaints()).await?;

    Ok(render_template(DashboardTemplate {
        username: claims.username,
        complaints: rows.into_iter().map(DashboardRow::from).collect(),
    }))
}

pub async fn report(Extension(claims): Extension<Claims>) -> Response {
    render_template(ReportTemplate {
        username: claims.username,
    })
}

pub async fn admin(Extension(claims): Extension<Claims>) -> Response {
    render_template(AdminTemplate {
        username: claims.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ComplaintRow {
        ComplaintRow {
            id: 3,
            username: Some("alice".into()),
            title: Some("<b>Broken light".into()),
            description: None,
            category: Some("Electricity".into()),
            priority: Some("High".into()),
            latitude: Some(12.34),
            longitude: Some(56.78),
            location_text: Some("  ".into()),
            image: None,
            voice: None,
            assigned_department: None,
            status: Some("Pending".into()),
            created_at: Some("2024-05-01 10:00:00".into()),
        }
    }

    #[test]
    fn location_falls_back_to_coordinates() {
        let view = DashboardRow::from(row());
        assert_eq!(view.location, "12.34000, 56.78000");
        assert_eq!(view.description, "");
    }

    #[test]
    fn dashboard_escapes_complaint_text() {
        let html = DashboardTemplate {
            username: "alice".into(),
            complaints: vec![row().into()],
        }
        .render()
        .unwrap();

        assert!(html.contains("&lt;b&gt;Broken light"));
        assert!(!html.contains("<b>Broken"));
    }

    #[test]
    fn empty_dashboard_says_so() {
        let html = DashboardTemplate {
            username: "alice".into(),
            complaints: vec![],
        }
        .render()
        .unwrap();

        assert!(html.contains("No complaints yet"));
    }
}
