//! Session authentication
//!
//! Drive folders shared by link need no credentials. Folders restricted to
//! signed-in users are reached by replaying the cookies of a browser session.

pub mod cookies;

pub use cookies::{cookie_file_path, load_into, parse_cookie_file, BrowserCookie};
