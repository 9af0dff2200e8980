//! Page-number pagination for Motive list endpoints.
//!
//! List endpoints accept `page_no` and `per_page` and answer with the items
//! under a resource key plus a `pagination` block:
//!
//! ```json
//! { "vehicles": [...], "pagination": { "total": 47, "per_page": 25, "current_page": 1 } }
//! ```

use crate::client::MotiveClient;
use crate::errors::{MotiveError, MotiveResult};
use async_stream::try_stream;
use futures::Stream;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;

/// Default page size for lazy pagination.
pub const DEFAULT_PER_PAGE: u32 = 25;

/// Query parameter carrying the page number.
pub const PAGE_PARAM: &str = "page_no";

/// Query parameter carrying the page size.
pub const PER_PAGE_PARAM: &str = "per_page";

/// Number of pages needed for `total` items. Zero when `per_page` is zero.
pub fn last_page(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResponse<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total items across all pages.
    pub total: u64,
    /// Page size.
    pub per_page: u32,
    /// One-based page number.
    pub current_page: u32,
}

impl<T> PaginatedResponse<T> {
    /// Last page number.
    pub fn last_page(&self) -> u32 {
        last_page(self.total, self.per_page)
    }

    /// Returns true if a page follows this one.
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this page is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> IntoIterator for PaginatedResponse<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// The `pagination` block. Each field is read on its own so one malformed
/// value does not discard the others.
#[derive(Debug, Default, PartialEq)]
struct PaginationMeta {
    total: Option<u64>,
    per_page: Option<u32>,
    current_page: Option<u32>,
}

impl PaginationMeta {
    fn from_value(block: Option<&Value>) -> Self {
        let field = |name: &str| block.and_then(|b| b.get(name)).and_then(lenient_u64);
        Self {
            total: field("total"),
            per_page: field("per_page").and_then(|v| u32::try_from(v).ok()),
            current_page: field("current_page").and_then(|v| u32::try_from(v).ok()),
        }
    }
}

/// Non-negative integer from a JSON number or a numeric string.
fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

struct RawPage {
    items: Vec<Value>,
    meta: PaginationMeta,
}

/// Shared request state of both paginators.
#[derive(Clone)]
struct PageSource<'a> {
    client: &'a MotiveClient,
    path: String,
    resource_key: String,
    item_key: Option<String>,
    params: Map<String, Value>,
}

impl<'a> PageSource<'a> {
    fn new(client: &'a MotiveClient, path: String, resource_key: String) -> Self {
        Self {
            client,
            path,
            resource_key,
            item_key: None,
            params: Map::new(),
        }
    }

    async fn fetch(&self, page: u32, per_page: u32) -> MotiveResult<RawPage> {
        let mut query = self.params.clone();
        query.insert(PAGE_PARAM.to_string(), page.into());
        query.insert(PER_PAGE_PARAM.to_string(), per_page.into());

        let response = self
            .client
            .send(Method::GET, &self.path, query, Map::new())
            .await?;

        let items = match response.json_key(&self.resource_key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let meta = PaginationMeta::from_value(response.json_key("pagination"));

        Ok(RawPage { items, meta })
    }

    fn decode<T: DeserializeOwned>(&self, item: Value) -> MotiveResult<T> {
        decode_item(item, self.item_key.as_deref())
    }
}

/// Decodes one list item, unwrapping `{ "<item_key>": {...} }` envelopes.
fn decode_item<T: DeserializeOwned>(item: Value, item_key: Option<&str>) -> MotiveResult<T> {
    let value = match (item_key, item) {
        (Some(key), Value::Object(mut map)) if map.contains_key(key) => {
            map.remove(key).unwrap_or_default()
        }
        (_, item) => item,
    };

    serde_json::from_value(value).map_err(|e| {
        MotiveError::deserialization(format!("Failed to deserialize list item: {}", e))
            .with_source(e)
    })
}

/// Fetches a single page on demand.
pub struct Paginator<'a, T> {
    source: PageSource<'a>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Paginator<'a, T> {
    /// Creates a paginator for `path` reading items from `resource_key`.
    pub fn new(
        client: &'a MotiveClient,
        path: impl Into<String>,
        resource_key: impl Into<String>,
    ) -> Self {
        Self {
            source: PageSource::new(client, path.into(), resource_key.into()),
            _marker: PhantomData,
        }
    }

    /// Returns a copy with additional query parameters.
    pub fn with_params(&self, params: Map<String, Value>) -> Self {
        let mut next = self.clone();
        next.source.params.extend(params);
        next
    }

    /// Returns a copy with one additional query parameter.
    pub fn with_param(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.source.params.insert(key.into(), value.into());
        next
    }

    /// Returns a copy that unwraps each item from an `item_key` envelope.
    pub fn with_item_key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.source.item_key = Some(key.into());
        next
    }

    /// Fetches page `page` with `per_page` items.
    ///
    /// Missing pagination fields fall back to the item count, the requested
    /// page and the requested page size.
    pub async fn paginate(&self, page: u32, per_page: u32) -> MotiveResult<PaginatedResponse<T>> {
        let raw = self.source.fetch(page, per_page).await?;

        let total = raw.meta.total.unwrap_or(raw.items.len() as u64);
        let per_page = raw.meta.per_page.unwrap_or(per_page);
        let current_page = raw.meta.current_page.unwrap_or(page);

        let items = raw
            .items
            .into_iter()
            .map(|item| self.source.decode(item))
            .collect::<MotiveResult<Vec<T>>>()?;

        Ok(PaginatedResponse {
            items,
            total,
            per_page,
            current_page,
        })
    }
}

impl<T> Clone for Paginator<'_, T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Paginator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("path", &self.source.path)
            .field("resource_key", &self.source.resource_key)
            .field("params", &self.source.params)
            .finish()
    }
}

/// Walks every page of a list endpoint, fetching pages as they are consumed.
pub struct LazyPaginator<'a, T> {
    source: PageSource<'a>,
    per_page: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> LazyPaginator<'a, T> {
    /// Creates a lazy paginator for `path` reading items from `resource_key`.
    pub fn new(
        client: &'a MotiveClient,
        path: impl Into<String>,
        resource_key: impl Into<String>,
    ) -> Self {
        Self {
            source: PageSource::new(client, path.into(), resource_key.into()),
            per_page: DEFAULT_PER_PAGE,
            _marker: PhantomData,
        }
    }

    /// Returns a copy with a different page size.
    pub fn per_page(&self, per_page: u32) -> Self {
        let mut next = self.clone();
        next.per_page = per_page;
        next
    }

    /// Returns a copy with additional query parameters.
    pub fn with_params(&self, params: Map<String, Value>) -> Self {
        let mut next = self.clone();
        next.source.params.extend(params);
        next
    }

    /// Returns a copy with one additional query parameter.
    pub fn with_param(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.source.params.insert(key.into(), value.into());
        next
    }

    /// Returns a copy that unwraps each item from an `item_key` envelope.
    pub fn with_item_key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.source.item_key = Some(key.into());
        next
    }

    /// Configured page size.
    pub fn page_size(&self) -> u32 {
        self.per_page
    }

    /// Streams every item, starting again from page 1 on each call.
    ///
    /// Stops after an empty page or once the current page reaches the last
    /// page computed from the server's `total` and `per_page`. Dropping the
    /// stream stops further requests.
    pub fn cursor(&self) -> impl Stream<Item = MotiveResult<T>> + 'a
    where
        T: 'a,
    {
        let source = self.source.clone();
        let per_page = self.per_page;

        try_stream! {
            let mut page = 1u32;
            loop {
                let raw = source.fetch(page, per_page).await?;

                let fetched = raw.items.len();
                let total = raw.meta.total.unwrap_or(fetched as u64);
                let effective_per_page = raw.meta.per_page.unwrap_or(per_page);

                for item in raw.items {
                    let item: T = source.decode(item)?;
                    yield item;
                }

                if fetched == 0 || page >= last_page(total, effective_per_page) {
                    break;
                }
                page += 1;
            }
        }
    }
}

impl<T> Clone for LazyPaginator<'_, T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            per_page: self.per_page,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for LazyPaginator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyPaginator")
            .field("path", &self.source.path)
            .field("resource_key", &self.source.resource_key)
            .field("per_page", &self.per_page)
            .field("params", &self.source.params)
            .finish()
    }
}
