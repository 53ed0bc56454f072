//! Download confirmation page handling
//!
//! Drive answers some file requests (large files it cannot virus-scan, files
//! with exhausted quota) with an HTML interstitial instead of the body. The
//! real download URL hides in a link, a form or a JSON blob on that page.

use scraper::{Html, Selector};
use url::Url;

use crate::constants::drive;

/// Why a confirmation page did not yield a download URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationFailure {
    /// Drive reports the file's download quota is exhausted
    QuotaExceeded(String),
    /// Drive shows some other error caption
    Refused(String),
    /// Nothing on the page looks like a download link
    NoDownloadLink,
    /// A link was found but is not a valid URL
    InvalidUrl { url: String, error: String },
}

/// Extracts the real download URL from a confirmation page
///
/// Tried in order: a `/uc?export=download` link, the `#download-form` form
/// (action plus hidden inputs), and an embedded `"downloadUrl"` value.
/// Relative links resolve against `page_url`.
pub fn confirmation_url(page: &str, page_url: &Url) -> Result<Url, ConfirmationFailure> {
    let document = Html::parse_document(page);

    if let Some(href) = select_attr(&document, "a[href^=\"/uc?export=download\"]", "href") {
        return join(page_url, &href);
    }

    if let Some(url) = form_url(&document, page_url)? {
        return Ok(url);
    }

    if let Some(raw) = embedded_download_url(page) {
        let unescaped = raw.replace("\\u003d", "=").replace("\\u0026", "&");
        return join(page_url, &unescaped);
    }

    if let Some(caption) = select_text(&document, "p.uc-error-subcaption") {
        if caption.contains(drive::QUOTA_MARKER) {
            return Err(ConfirmationFailure::QuotaExceeded(caption));
        }
        return Err(ConfirmationFailure::Refused(caption));
    }

    Err(ConfirmationFailure::NoDownloadLink)
}

fn form_url(document: &Html, page_url: &Url) -> Result<Option<Url>, ConfirmationFailure> {
    let (Ok(form_selector), Ok(hidden_selector)) = (
        Selector::parse("form#download-form"),
        Selector::parse("input[type=\"hidden\"]"),
    ) else {
        return Ok(None);
    };

    let Some(form) = document.select(&form_selector).next() else {
        return Ok(None);
    };
    let action = form.value().attr("action").unwrap_or_default();
    let mut url = join(page_url, action)?;

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    for input in form.select(&hidden_selector) {
        let (Some(name), Some(value)) = (input.value().attr("name"), input.value().attr("value"))
        else {
            continue;
        };
        params.retain(|(key, _)| key != name);
        params.push((name.to_string(), value.to_string()));
    }

    url.query_pairs_mut().clear().extend_pairs(params);
    Ok(Some(url))
}

fn embedded_download_url(page: &str) -> Option<&str> {
    const KEY: &str = "\"downloadUrl\":\"";
    let start = page.find(KEY)? + KEY.len();
    let rest = &page[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn select_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .find_map(|element| element.value().attr(attr).map(str::to_string))
}

fn select_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

fn join(base: &Url, link: &str) -> Result<Url, ConfirmationFailure> {
    base.join(link).map_err(|e| ConfirmationFailure::InvalidUrl {
        url: link.to_string(),
        error: e.to_string(),
    })
}
