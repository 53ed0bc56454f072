//! Folder listing retrieval and parsing
//!
//! A shared folder's web page embeds its children as an escaped JavaScript
//! string assigned to `window['_DRIVE_ivd']`. This module fetches that page,
//! decodes the embedded listing and walks sub-folders recursively.

use futures::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::app::models::{DriveEntry, DriveFolder, DriveNode, FolderId};
use crate::app::progress::FetchProgress;
use crate::constants::drive;
use crate::errors::{FolderError, FolderResult};

/// Folder listing operations handler
pub struct ListingHandler<'a> {
    http_handler: &'a HttpHandler,
    base_url: &'a Url,
}

impl<'a> ListingHandler<'a> {
    /// Creates a new ListingHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler, base_url: &'a Url) -> Self {
        Self {
            http_handler,
            base_url,
        }
    }

    /// Lists a folder and all of its sub-folders
    ///
    /// # Arguments
    ///
    /// * `folder_id` - Folder to list
    /// * `remaining_ok` - Accept folders whose listing is truncated at the page limit
    /// * `progress` - Receives one status line per entry
    ///
    /// # Errors
    ///
    /// Returns `FolderError` if any folder page cannot be fetched or decoded
    pub async fn list(
        &self,
        folder_id: &FolderId,
        remaining_ok: bool,
        progress: &FetchProgress,
    ) -> FolderResult<DriveFolder> {
        self.list_recursive(folder_id.clone(), remaining_ok, progress)
            .await
    }

    fn list_recursive<'b>(
        &'b self,
        folder_id: FolderId,
        remaining_ok: bool,
        progress: &'b FetchProgress,
    ) -> BoxFuture<'b, FolderResult<DriveFolder>> {
        async move {
            let page = self.fetch_folder_page(&folder_id).await?;
            let (name, entries) = parse_folder_page(folder_id.as_str(), &page)?;

            let mut children = Vec::with_capacity(entries.len());
            for entry in entries {
                if !entry.is_folder() {
                    progress.status(format!("Processing file {} {}", entry.id, entry.name));
                    children.push(DriveNode::File(entry));
                    continue;
                }

                progress.status(format!("Retrieving folder {} {}", entry.id, entry.name));
                let child_id = FolderId::parse(&entry.id)?;
                let child = self
                    .list_recursive(child_id, remaining_ok, progress)
                    .await?;
                children.push(DriveNode::Folder(child));
            }

            if !remaining_ok && children.len() >= drive::MAX_FOLDER_ENTRIES {
                return Err(FolderError::TooManyFiles {
                    folder_id: folder_id.to_string(),
                    limit: drive::MAX_FOLDER_ENTRIES,
                });
            }

            debug!("Listed folder {} ({}) with {} entries", name, folder_id, children.len());
            Ok(DriveFolder {
                id: folder_id.to_string(),
                name,
                children,
            })
        }
        .boxed()
    }

    async fn fetch_folder_page(&self, folder_id: &FolderId) -> FolderResult<String> {
        let url = folder_id.folder_url(self.base_url);
        let response = self.http_handler.get_response(&url).await?;

        match response.status() {
            status if status.is_success() => Ok(response.text().await?),
            StatusCode::NOT_FOUND => Err(FolderError::NotFound {
                folder_id: folder_id.to_string(),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FolderError::AccessDenied {
                folder_id: folder_id.to_string(),
                status: response.status().as_u16(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(FolderError::RateLimited {
                folder_id: folder_id.to_string(),
            }),
            status => Err(FolderError::ServerError {
                status: status.as_u16(),
            }),
        }
    }
}

/// Extracts the folder name and its direct children from a folder page
///
/// # Errors
///
/// Returns `FolderError::ContentsUnavailable` when the page carries no listing
/// (private folder, sign-in wall or access throttling), and
/// `MalformedListing`/`Json`/`NameUnavailable` when it cannot be decoded
pub fn parse_folder_page(folder_id: &str, html: &str) -> FolderResult<(String, Vec<DriveEntry>)> {
    let document = Html::parse_document(html);

    let encoded = find_listing_literal(&document).ok_or_else(|| {
        FolderError::ContentsUnavailable {
            folder_id: folder_id.to_string(),
        }
    })?;
    let decoded = decode_js_string(&encoded)?;
    let listing: Value = serde_json::from_str(&decoded)?;
    let entries = parse_entries(&listing)?;

    let title = page_title(&document);
    let name = folder_name_from_title(&title)?;

    Ok((name, entries))
}

fn selector(css: &str) -> FolderResult<Selector> {
    Selector::parse(css).map_err(|e| FolderError::MalformedListing {
        reason: format!("invalid selector {}: {:?}", css, e),
    })
}

/// Second single-quoted literal of the script mentioning the listing marker
fn find_listing_literal(document: &Html) -> Option<String> {
    let scripts = selector("script").ok()?;
    document
        .select(&scripts)
        .map(|script| script.inner_html())
        .find(|text| text.contains(drive::LISTING_MARKER))
        .and_then(|text| single_quoted_literals(&text).into_iter().nth(1))
}

fn page_title(document: &Html) -> String {
    selector("title")
        .ok()
        .and_then(|title| document.select(&title).next())
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default()
}

/// Folder name from a title such as `Prices - 2024 - Google Drive`
pub fn folder_name_from_title(title: &str) -> FolderResult<String> {
    let parts: Vec<&str> = title.trim().split(drive::TITLE_SEPARATOR).collect();
    if parts.len() < 2 {
        return Err(FolderError::NameUnavailable {
            title: title.to_string(),
        });
    }
    Ok(parts[..parts.len() - 1].join(drive::TITLE_SEPARATOR))
}

fn parse_entries(listing: &Value) -> FolderResult<Vec<DriveEntry>> {
    let items = match listing.get(0) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(FolderError::MalformedListing {
                reason: format!("expected entry list, found {}", other),
            })
        }
    };

    items
        .iter()
        .map(|item| {
            let field = |index: usize| {
                item.get(index)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| FolderError::MalformedListing {
                        reason: format!("entry is missing field {}: {}", index, item),
                    })
            };
            Ok(DriveEntry {
                id: field(0)?,
                name: field(2)?,
                mime_type: field(3)?,
            })
        })
        .collect()
}

/// Contents of every `'...'` literal in `text`, escapes left intact
fn single_quoted_literals(text: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\'' {
            continue;
        }
        let mut literal = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    literal.push(c);
                    if let Some(escaped) = chars.next() {
                        literal.push(escaped);
                    }
                }
                '\'' => {
                    closed = true;
                    break;
                }
                _ => literal.push(c),
            }
        }
        if closed {
            literals.push(literal);
        }
    }

    literals
}

/// Decodes JavaScript string escapes
///
/// `\xHH` escapes are taken as raw bytes, which is how Drive encodes the UTF-8
/// of non-ASCII names. When the result is not valid UTF-8 they are reread as
/// Latin-1 code points instead.
pub fn decode_js_string(literal: &str) -> FolderResult<String> {
    let bytes = unescape(literal, false)?;
    match String::from_utf8(bytes) {
        Ok(decoded) => Ok(decoded),
        Err(_) => {
            let bytes = unescape(literal, true)?;
            String::from_utf8(bytes).map_err(|e| FolderError::MalformedListing {
                reason: format!("listing is not valid UTF-8: {}", e),
            })
        }
    }
}

fn unescape(literal: &str, latin1: bool) -> FolderResult<Vec<u8>> {
    let mut out = Vec::with_capacity(literal.len());
    let mut chars = literal.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }

        let escaped = chars.next().ok_or_else(|| FolderError::MalformedListing {
            reason: "dangling escape at end of listing".to_string(),
        })?;
        match escaped {
            'x' => {
                let value = read_hex(&mut chars, 2)?;
                if latin1 {
                    push_char(&mut out, char::from(value as u8));
                } else {
                    out.push(value as u8);
                }
            }
            'u' => {
                let high = read_hex(&mut chars, 4)?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    let mut lookahead = chars.clone();
                    let low = if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                        read_hex(&mut lookahead, 4).ok()
                    } else {
                        None
                    };
                    match low {
                        Some(low) if (0xDC00..0xE000).contains(&low) => {
                            chars = lookahead;
                            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                        }
                        // Unpaired high surrogate
                        _ => high,
                    }
                } else {
                    high
                };
                push_char(&mut out, char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'n' => out.push(b'\n'),
            't' => out.push(b'\t'),
            'r' => out.push(b'\r'),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'v' => out.push(0x0b),
            '0' => out.push(0),
            other => push_char(&mut out, other),
        }
    }

    Ok(out)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn read_hex<I>(chars: &mut I, digits: usize) -> FolderResult<u32>
where
    I: Iterator<Item = char>,
{
    let hex: String = chars.take(digits).collect();
    if hex.len() != digits {
        return Err(FolderError::MalformedListing {
            reason: format!("truncated escape \\{}", hex),
        });
    }
    u32::from_str_radix(&hex, 16).map_err(|_| FolderError::MalformedListing {
        reason: format!("invalid hex escape {}", hex),
    })
}
