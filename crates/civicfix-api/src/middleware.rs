use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use civicfix_types::api::{Claims, Role};

use crate::auth::AppState;

/// Name of the cookie carrying the signed session.
pub const SESSION_COOKIE: &str = "civicfix_session";

/// Where unauthenticated page requests are sent.
pub const SIGN_IN_PATH: &str = "/";

const SESSION_TTL_DAYS: i64 = 30;

/// Signing secret and cookie attributes for sessions.
pub struct SessionConfig {
    pub secret: String,
    /// Sets the `Secure` cookie attribute. Only worth turning off for
    /// plain-HTTP development.
    pub secure_cookie: bool,
}

impl SessionConfig {
    pub fn issue(&self, user_id: i64, username: &str, email: &str, role: Role) -> anyhow::Result<Cookie<'static>> {
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            email: email.to_string(),
            role,
            exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS)).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .build())
    }

    /// Claims from a valid session cookie, if the request carries one.
    pub fn claims(&self, jar: &CookieJar) -> Option<Claims> {
        let token = jar.get(SESSION_COOKIE)?;

        decode::<Claims>(
            token.value(),
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims)
    }
}

/// Cookie that, once removed from the jar, clears the session.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Gate for page routes: requests without a session are redirected to the
/// sign-in page, otherwise the claims are handed to the handler.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    match state.session.claims(&jar) {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => Redirect::to(SIGN_IN_PATH).into_response(),
    }
}

/// Like [`require_session`], but the session must also carry the admin role.
pub async fn require_admin(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    match state.session.claims(&jar) {
        Some(claims) if claims.role.is_admin() => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        _ => Redirect::to(SIGN_IN_PATH).into_response(),
    }
}
