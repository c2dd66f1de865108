use axum::http::{
    header::{self, InvalidHeaderValue},
    HeaderMap, HeaderValue,
};

/// A Set-Cookie header under construction
#[derive(Debug, Clone)]
pub struct Cookie<'a> {
    name: &'a str,
    value: &'a str,
    max_age_secs: i64,
    http_only: bool,
    secure: bool,
}

impl<'a> Cookie<'a> {
    pub fn new(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            value,
            max_age_secs: 0,
            http_only: false,
            secure: false,
        }
    }

    pub fn max_age_days(mut self, days: i64) -> Self {
        self.max_age_secs = days * 24 * 60 * 60;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// A cookie that makes the browser drop any stored value
    pub fn removal(name: &'a str) -> Self {
        Self::new(name, "")
    }

    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            self.name, self.value, self.max_age_secs
        );

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }

        if self.secure {
            cookie.push_str("; Secure");
        }

        HeaderValue::from_str(&cookie)
    }
}

/// Returns the value of a cookie sent by the client
pub fn read_cookie<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}
