//! Login, registration and logout endpoints.

use axum::{
    Form, Json,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::{AppState, NoticeQuery, NoticeView};
use crate::auth::{
    ACCESS_COOKIE_NAME, CurrentUser, LOGIN_PATH, append_set_cookies, cleared_session_cookies,
    get_cookie, session_cookies,
};
use crate::redirect::{Notice, found, found_with_notice};

const REGISTER_PATH: &str = "/register";

#[derive(Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub(super) struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(rename = "confirmPassword", default)]
    confirm_password: String,
}

#[derive(serde::Serialize)]
pub(super) struct HomeView {
    user_id: i64,
    #[serde(flatten)]
    notice: NoticeView,
}

/// GET / - landing page of a signed-in user.
pub(super) async fn home(
    CurrentUser(user): CurrentUser,
    Query(query): Query<NoticeQuery>,
) -> Json<HomeView> {
    Json(HomeView {
        user_id: user.user_id,
        notice: query.into(),
    })
}

/// GET /login - skips the form when an access cookie is already present.
pub(super) async fn login_page(headers: HeaderMap, Query(query): Query<NoticeQuery>) -> Response {
    if get_cookie(&headers, ACCESS_COOKIE_NAME).is_some() {
        return found("/");
    }
    Json(NoticeView::from(query)).into_response()
}

/// GET /register
pub(super) async fn register_page(Query(query): Query<NoticeQuery>) -> Json<NoticeView> {
    Json(query.into())
}

/// POST /login
pub(super) async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.sessions.login(&form.username, &form.password).await {
        Ok(pair) => {
            let mut response = found("/");
            append_set_cookies(
                response.headers_mut(),
                &session_cookies(&pair, state.sessions.secure_cookies()),
            );
            response
        }
        Err(e) => found_with_notice(LOGIN_PATH, e.notice()),
    }
}

/// POST /register
pub(super) async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    match state
        .sessions
        .register(&form.username, &form.password, &form.confirm_password)
        .await
    {
        Ok(_) => found_with_notice(LOGIN_PATH, Notice::success("Registration successful")),
        Err(e) => found_with_notice(REGISTER_PATH, e.notice()),
    }
}

/// GET /logout - revokes the refresh token and clears both cookies.
pub(super) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.sessions.logout(&headers).await;
    let mut response = found(LOGIN_PATH);
    append_set_cookies(
        response.headers_mut(),
        &cleared_session_cookies(state.sessions.secure_cookies()),
    );
    response
}
