//! Cursor-following pagination.
//!
//! List responses carry their items in a `value` array and a link to the next
//! page in `@odata.nextLink`. When a caller asks for all pages the engine
//! follows those links one at a time, appending every page's items, until no
//! link remains or the page cap is reached. Failures while paginating never
//! reach the caller: a parse or request error returns the untouched first
//! page, and an empty follow-up keeps what was accumulated so far.

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::ToolError;
use super::executor::{CallExecutor, PreparedRequest};
use super::overrides::CallParams;
use super::schema::FETCH_ALL_PAGES;
use crate::core::graph::ApiResponse;

/// Maximum number of pages fetched per invocation, first page included.
pub const MAX_PAGES: usize = 100;

/// Field holding the next-page cursor.
pub const NEXT_LINK: &str = "@odata.nextLink";

/// Field holding the total item count.
pub const COUNT: &str = "@odata.count";

const ITEMS: &str = "value";

/// API version prefixes stripped from cursor paths.
const VERSION_PREFIXES: &[&str] = &["/v1.0", "/beta"];

/// Base used to resolve relative cursor links.
const RELATIVE_BASE: &str = "https://localhost";

#[derive(Debug, Error)]
enum PaginationError {
    #[error("malformed page: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid next link '{0}'")]
    InvalidCursor(String),

    #[error("follow-up request failed: {0}")]
    Request(#[from] ToolError),
}

/// Whether the caller asked for every page.
pub fn wants_all_pages(params: &CallParams) -> bool {
    params
        .get(FETCH_ALL_PAGES)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Follow next-page links starting from `first`, the response to `request`.
///
/// Returns `first` unchanged when it is not a JSON list page or when
/// pagination fails part-way.
pub async fn fetch_all_pages(
    executor: &CallExecutor,
    request: &PreparedRequest,
    first: ApiResponse,
) -> ApiResponse {
    let Some(page) = first.first_text().and_then(parse_list_page) else {
        debug!("First response is not a list page, skipping pagination");
        return first;
    };

    match follow_cursors(executor, request, page).await {
        Ok(merged) => {
            let mut response = first;
            response.content[0] = merged;
            response
        }
        Err(e) => {
            warn!("Pagination aborted, returning first page: {}", e);
            first
        }
    }
}

/// Parse a page that holds a `value` array.
fn parse_list_page(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) if map.get(ITEMS).is_some_and(Value::is_array) => Some(map),
        _ => None,
    }
}

fn next_link(page: &Map<String, Value>) -> Option<String> {
    page.get(NEXT_LINK).and_then(Value::as_str).map(str::to_string)
}

async fn follow_cursors(
    executor: &CallExecutor,
    request: &PreparedRequest,
    mut first: Map<String, Value>,
) -> Result<String, PaginationError> {
    let mut items = match first.remove(ITEMS) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    let mut cursor = next_link(&first);
    let mut pages = 1;

    while let Some(link) = cursor.take() {
        if pages >= MAX_PAGES {
            info!("Reached the {} page limit, returning {} items", MAX_PAGES, items.len());
            break;
        }

        let (path, query) = parse_cursor(&link)?;
        let response = executor.send(&request.follow(path, query)).await?;
        let Some(text) = response.first_text() else {
            debug!("Page {} returned no content, stopping", pages + 1);
            break;
        };

        let page: Value = serde_json::from_str(text)?;
        if let Some(Value::Array(page_items)) = page.get(ITEMS) {
            items.extend(page_items.iter().cloned());
        }
        cursor = page.as_object().and_then(next_link);
        pages += 1;
    }

    debug!("Fetched {} pages, {} items", pages, items.len());

    if first.contains_key(COUNT) {
        first.insert(COUNT.to_string(), json!(items.len()));
    }
    first.insert(ITEMS.to_string(), Value::Array(items));
    first.remove(NEXT_LINK);

    Ok(serde_json::to_string_pretty(&Value::Object(first))?)
}

/// Split a next-page link into a version-less path and its query pairs.
fn parse_cursor(link: &str) -> Result<(String, Vec<(String, String)>), PaginationError> {
    let url = Url::parse(link)
        .or_else(|_| Url::parse(RELATIVE_BASE).and_then(|base| base.join(link)))
        .map_err(|_| PaginationError::InvalidCursor(link.to_string()))?;

    let mut path = url.path().to_string();
    for prefix in VERSION_PREFIXES {
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with('/') {
                path = rest.to_string();
                break;
            }
        }
    }

    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    Ok((path, query))
}
