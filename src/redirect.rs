//! `302 Found` redirects carrying a user-visible notice.
//!
//! Notices travel as `message` and `border` query parameters. Messages are
//! fixed strings chosen by the server; internal error text never ends up in a
//! redirect URL.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use url::form_urlencoded;

/// Style hint for a notice, rendered as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Border {
    #[serde(rename = "text-bg-success")]
    Success,
    #[serde(rename = "text-bg-warning")]
    Warning,
    #[serde(rename = "text-bg-danger")]
    Danger,
}

impl Border {
    pub fn as_class(&self) -> &'static str {
        match self {
            Border::Success => "text-bg-success",
            Border::Warning => "text-bg-warning",
            Border::Danger => "text-bg-danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub message: &'static str,
    pub border: Border,
}

impl Notice {
    pub const fn success(message: &'static str) -> Self {
        Self {
            message,
            border: Border::Success,
        }
    }

    pub const fn warning(message: &'static str) -> Self {
        Self {
            message,
            border: Border::Warning,
        }
    }

    pub const fn danger(message: &'static str) -> Self {
        Self {
            message,
            border: Border::Danger,
        }
    }

    /// `path?message=...&border=...`
    pub fn location(&self, path: &str) -> String {
        self.location_with(path, &[])
    }

    /// Like [`Notice::location`], with `params` placed before the notice.
    pub fn location_with(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            query.append_pair(key, value);
        }
        query
            .append_pair("message", self.message)
            .append_pair("border", self.border.as_class());
        format!("{}?{}", path, query.finish())
    }
}

/// A bare `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

/// A `302 Found` to `path` carrying `notice`.
pub fn found_with_notice(path: &str, notice: Notice) -> Response {
    found(&notice.location(path))
}
