//! Browser cookie loading for authenticated Drive sessions
//!
//! Cookies are read from a Netscape/Mozilla `cookies.txt` export, the format
//! written by browser "export cookies" extensions and by curl. Each non-comment
//! line carries seven tab-separated fields:
//!
//! ```text
//! domain  include_subdomains  path  secure  expires  name  value
//! ```

use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::cookie::Jar;
use url::Url;

use crate::constants::{env as env_constants, files};
use crate::errors::{CookieError, CookieResult};

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// One cookie from a cookie file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Unix timestamp, `None` for session cookies
    pub expires: Option<i64>,
    pub name: String,
    pub value: String,
    pub http_only: bool,
}

impl BrowserCookie {
    /// Whether the cookie expired before `now` (unix seconds)
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires.map_or(false, |expires| expires < now)
    }

    /// URL the cookie is scoped to
    pub fn origin(&self) -> Option<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.domain.trim_start_matches('.');
        Url::parse(&format!("{}://{}{}", scheme, host, self.path)).ok()
    }

    /// `Set-Cookie` form of the cookie; host-only cookies carry no `Domain`
    pub fn to_set_cookie(&self) -> String {
        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.include_subdomains {
            header.push_str("; Domain=");
            header.push_str(self.domain.trim_start_matches('.'));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        header
    }
}

/// Resolve the cookie file location
///
/// Precedence: explicit path, then the `DRIVE_FETCHER_COOKIES` environment
/// variable, then `<cache dir>/drive_fetcher/cookies.txt`.
pub fn cookie_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var(env_constants::COOKIES_FILE) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::cache_dir().map(|dir| dir.join(files::APP_DIR_NAME).join(files::COOKIES_FILE_NAME))
}

/// Parse cookie file content
///
/// # Errors
///
/// Returns `CookieError::InvalidLine` naming the first malformed line
pub fn parse_cookie_file(content: &str, path: &Path) -> CookieResult<Vec<BrowserCookie>> {
    let mut cookies = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let invalid = |reason: &str| CookieError::InvalidLine {
            path: path.to_path_buf(),
            line: index + 1,
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 7 {
            return Err(invalid(&format!(
                "expected 7 tab-separated fields, found {}",
                fields.len()
            )));
        }

        let expires: i64 = fields[4]
            .parse()
            .map_err(|_| invalid("expiry is not a unix timestamp"))?;

        cookies.push(BrowserCookie {
            domain: fields[0].to_string(),
            include_subdomains: parse_flag(fields[1]).ok_or_else(|| invalid("bad subdomain flag"))?,
            path: fields[2].to_string(),
            secure: parse_flag(fields[3]).ok_or_else(|| invalid("bad secure flag"))?,
            expires: (expires != 0).then_some(expires),
            name: fields[5].to_string(),
            value: fields[6].to_string(),
            http_only,
        });
    }

    Ok(cookies)
}

fn parse_flag(field: &str) -> Option<bool> {
    match field {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

/// Load the cookies of `path` into `jar`, skipping expired ones
///
/// A missing file leaves the jar empty.
///
/// # Errors
///
/// Returns `CookieError` if the file exists but cannot be read or parsed
pub fn load_into(jar: &Jar, path: &Path) -> CookieResult<usize> {
    if !path.exists() {
        tracing::debug!("Cookie file {} not found, using anonymous session", path.display());
        return Ok(0);
    }

    let content = std::fs::read_to_string(path).map_err(|source| CookieError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let now = Utc::now().timestamp();

    let mut loaded = 0;
    for cookie in parse_cookie_file(&content, path)? {
        if cookie.is_expired(now) {
            tracing::debug!("Skipping expired cookie {} for {}", cookie.name, cookie.domain);
            continue;
        }
        let Some(origin) = cookie.origin() else {
            tracing::warn!("Skipping cookie {} with unusable domain {}", cookie.name, cookie.domain);
            continue;
        };
        jar.add_cookie_str(&cookie.to_set_cookie(), &origin);
        loaded += 1;
    }

    Ok(loaded)
}
