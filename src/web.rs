//! HTTP routes and page markup.
//!
//! Ordinary CRUD glue around the interesting part: the `/preview` handler
//! splices the logged-in user's display name into the preview template
//! *source* and evaluates it through the sandbox. That is the deliberate
//! SSTI — the sandbox policy is what stands between the visitor and the
//! host environment.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::{self, SessionStore};
use crate::db::UserStore;
use crate::sandbox::SandboxedRenderer;
use crate::shells;

/// Shared application state behind the router.
pub struct AppState {
    /// Credential store.
    pub store: UserStore,
    /// Live sessions.
    pub sessions: SessionStore,
    /// The restricted template evaluator.
    pub renderer: SandboxedRenderer,
}

/// Registration form fields.
///
/// Defaulted so a missing field behaves like an empty one: both get the
/// same 400.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    /// Login name.
    pub username: String,
    /// Password (hashed before storage).
    pub password: String,
    /// Display name, rendered as a template on the preview page.
    pub display_name: String,
}

/// Login form fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/register", get(register_form).post(register_submit))
        .route("/login", get(login_form).post(login_submit))
        .route("/logout", get(logout))
        .route("/preview", get(preview))
        .route("/simulated-shells", get(simulated_shells))
        .with_state(state)
}

/// Bind and serve the application until the process exits.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %bind, "museum listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

// ── Cookie handling ─────────────────────────────────────────────

/// Name of the session cookie.
const SESSION_COOKIE: &str = "sid";

/// Extract the session token from the request's `Cookie` header.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_owned())
    })
}

/// Resolve the current user ID from the request headers, if any.
fn current_user(state: &AppState, headers: &HeaderMap) -> Option<i64> {
    let token = session_token(headers)?;
    state.sessions.resolve(&token)
}

/// Redirect that also sets the session cookie.
fn redirect_with_session(token: &str, location: &str) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (
                header::SET_COOKIE,
                format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"),
            ),
            (header::LOCATION, location.to_owned()),
        ],
        "",
    )
        .into_response()
}

/// Redirect that clears the session cookie.
fn redirect_clearing_session(location: &str) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (
                header::SET_COOKIE,
                format!("{SESSION_COOKIE}=deleted; Path=/; HttpOnly; Max-Age=0"),
            ),
            (header::LOCATION, location.to_owned()),
        ],
        "",
    )
        .into_response()
}

/// Log and hide an internal failure.
fn internal_error(err: &anyhow::Error) -> Response {
    error!(error = %err, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
}

// ── Handlers ────────────────────────────────────────────────────

/// Home page. Logged-in visitors go straight to their preview.
async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if current_user(&state, &headers).is_some() {
        return Redirect::to("/preview").into_response();
    }
    Html(HOME_PAGE).into_response()
}

/// Registration form.
async fn register_form() -> Html<&'static str> {
    Html(REGISTER_PAGE)
}

/// Create an account with a fresh practice flag.
async fn register_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let username = form.username.trim();
    let display_name = form.display_name.trim();
    if username.is_empty() || form.password.is_empty() || display_name.is_empty() {
        return (StatusCode::BAD_REQUEST, "All fields are required!").into_response();
    }

    match state.store.username_exists(username).await {
        Ok(true) => {
            return (StatusCode::BAD_REQUEST, "Username already exists!").into_response();
        }
        Ok(false) => {}
        Err(e) => return internal_error(&e),
    }

    let password_hash = auth::hash_password(&form.password);
    let flag = auth::generate_flag(username);

    match state
        .store
        .create_user(username, &password_hash, display_name, &flag)
        .await
    {
        Ok(_) => {
            info!(username, "user registered");
            Redirect::to("/login").into_response()
        }
        Err(e) => {
            // Lost a race on the uniqueness constraint, or the store broke.
            error!(error = %e, "user creation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error creating user").into_response()
        }
    }
}

/// Login form.
async fn login_form() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// Validate credentials and start a session.
async fn login_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Username and password are required!").into_response();
    }

    let user = match state.store.user_by_username(username).await {
        Ok(user) => user,
        Err(e) => return internal_error(&e),
    };

    let Some(user) = user else {
        warn!(username, "login attempt for unknown user");
        return (StatusCode::UNAUTHORIZED, "Invalid credentials!").into_response();
    };

    if !auth::verify_password(&form.password, &user.password_hash) {
        warn!(username, "login attempt with wrong password");
        return (StatusCode::UNAUTHORIZED, "Invalid credentials!").into_response();
    }

    match state.sessions.create(user.id) {
        Ok(token) => {
            info!(username, "login succeeded");
            redirect_with_session(&token, "/preview")
        }
        Err(e) => internal_error(&anyhow::Error::from(e)),
    }
}

/// End the session and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token);
    }
    redirect_clearing_session("/")
}

/// Preview page — the SSTI lives here.
///
/// The display name is spliced into the template source before the sandbox
/// evaluates it, exactly the bug this museum exhibits. The sandbox's
/// whitelist and attribute policy are the only containment.
async fn preview(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(user_id) = current_user(&state, &headers) else {
        return Redirect::to("/login").into_response();
    };

    let user = match state.store.user_by_id(user_id).await {
        Ok(user) => user,
        Err(e) => return internal_error(&e),
    };

    let Some(user) = user else {
        // Session refers to a deleted user; treat as logged out.
        return redirect_clearing_session("/login");
    };

    let template_source = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><title>Museum Preview</title></head>\n\
         <body>\n\
         <h1>Welcome to Your Preview, {display_name}!</h1>\n\
         <p>Your flag: {flag}</p>\n\
         <p>Museum: {{{{ museum_meta('name') }}}}</p>\n\
         <p>Curator's Note: {{{{ curator_note() }}}}</p>\n\
         <p><a href=\"/logout\">Logout</a></p>\n\
         </body>\n\
         </html>",
        display_name = user.display_name,
        flag = user.flag,
    );

    match state.renderer.render(&template_source) {
        Ok(rendered) => Html(rendered).into_response(),
        Err(e) => {
            warn!(username = %user.username, error = %e, "preview render failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Template rendering error: {e}"),
            )
                .into_response()
        }
    }
}

/// Educational page with the simulated shell transcripts.
async fn simulated_shells() -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <title>Simulated Shell Transcripts</title>\n\
         <style>\n\
         pre {{ background: #f4f4f4; padding: 15px; border-radius: 5px; }}\n\
         .warning {{ color: red; font-weight: bold; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <h1>Simulated Shell Transcripts</h1>\n\
         <p class=\"warning\">IMPORTANT: These are SIMULATED transcripts for educational purposes.</p>\n\
         <p class=\"warning\">No actual system commands are executed. No real files, processes, or network connections are created.</p>\n\
         <h2>Template Shell (Simulated)</h2>\n\
         <pre>{template_shell}</pre>\n\
         <h2>OS Shell (Simulated)</h2>\n\
         <pre>{os_shell}</pre>\n\
         <p><a href=\"/\">Back to Home</a></p>\n\
         </body>\n\
         </html>",
        template_shell = shells::TEMPLATE_SHELL,
        os_shell = shells::OS_SHELL,
    ))
}

// ── Page markup ─────────────────────────────────────────────────

const HOME_PAGE: &str = "\
<!DOCTYPE html>
<html>
<head><title>Template Museum - Login</title></head>
<body>
    <h1>Welcome to the Template Museum</h1>
    <p><a href=\"/register\">Register</a> | <a href=\"/login\">Login</a></p>
    <p><a href=\"/simulated-shells\">View Simulated Shell Transcripts</a></p>
</body>
</html>
";

const REGISTER_PAGE: &str = "\
<!DOCTYPE html>
<html>
<head><title>Register - Template Museum</title></head>
<body>
    <h1>Register</h1>
    <form method=\"POST\">
        <label>Username: <input type=\"text\" name=\"username\" required></label><br>
        <label>Password: <input type=\"password\" name=\"password\" required></label><br>
        <label>Display Name: <input type=\"text\" name=\"display_name\" required></label><br>
        <button type=\"submit\">Register</button>
    </form>
    <p><a href=\"/\">Back to Home</a></p>
</body>
</html>
";

const LOGIN_PAGE: &str = "\
<!DOCTYPE html>
<html>
<head><title>Login - Template Museum</title></head>
<body>
    <h1>Login</h1>
    <form method=\"POST\">
        <label>Username: <input type=\"text\" name=\"username\" required></label><br>
        <label>Password: <input type=\"password\" name=\"password\" required></label><br>
        <button type=\"submit\">Login</button>
    </form>
    <p><a href=\"/\">Back to Home</a></p>
</body>
</html>
";
