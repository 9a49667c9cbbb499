use serde::{Deserialize, Serialize};

// -- Session --

/// Account role carried in the session. Sessions minted without a role
/// decode as `User`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Session claims, signed into the session cookie and handed to every
/// gated handler as the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

/// Missing fields deserialize as empty strings so the handler can answer
/// with `success: false` instead of a framework rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

// -- Complaints --

#[derive(Debug, Serialize)]
pub struct SubmitComplaintResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
}

/// A complaint as returned by `GET /get-complaints`. Coordinates are
/// exposed as `lat`/`lng`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplaintResponse {
    pub id: i64,
    pub username: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location_text: Option<String>,
    pub image: Option<String>,
    pub voice: Option<String>,
    pub assigned_department: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}
