//! Normalizes the backend's inconsistent response envelopes.
//!
//! Observed shapes: a bare array, `{success, data}`, `{status: "success", data}`,
//! where `data` may itself be an array, a paginated object or a single record.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

use crate::error::{ApiError, ApiResult};

pub const MALFORMED_MESSAGE: &str = "Unexpected response format";

const LIST_KEYS: [&str; 4] = ["items", "docs", "results", "bookings"];

/// Uniform list contract every facade call returns
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub ok: bool,
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Page<T> {
    pub fn of(items: Vec<T>) -> Self {
        let len = items.len();
        Self {
            ok: true,
            items,
            page: 1,
            page_size: len as u32,
            total: len as u64,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            page: 1,
            page_size: 0,
            total: 0,
            message: Some(message.into()),
        }
    }

    /// `ok:false` becomes an application error carrying the backend message
    pub fn into_result(self) -> ApiResult<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(ApiError::Application(
                self.message.unwrap_or_else(|| MALFORMED_MESSAGE.to_string()),
            ))
        }
    }

    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }
}

impl Page<Value> {
    /// Decode each raw item, skipping ones that don't fit instead of failing the page
    pub fn decode_with<T, E, F>(self, mut decode: F) -> Page<T>
    where
        F: FnMut(Value) -> Result<T, E>,
        E: fmt::Display,
    {
        let mut items = Vec::with_capacity(self.items.len());
        for (index, raw) in self.items.into_iter().enumerate() {
            match decode(raw) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping undecodable item #{}: {}", index, e),
            }
        }
        Page {
            ok: self.ok,
            items,
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            message: self.message,
        }
    }
}

/// Normalize any response body into a `Page` of raw JSON items
pub fn normalize(body: &Value) -> Page<Value> {
    match body {
        Value::Array(items) => Page::of(items.clone()),
        Value::Object(obj) => normalize_object(obj),
        _ => Page::failed(MALFORMED_MESSAGE),
    }
}

fn normalize_object(obj: &Map<String, Value>) -> Page<Value> {
    let message = obj.get("message").and_then(Value::as_str).map(str::to_string);
    let is_envelope = obj.contains_key("success")
        || obj.contains_key("data")
        || (!is_record(obj)
            && matches!(
                obj.get("status").and_then(Value::as_str),
                Some("success" | "error" | "fail" | "failed")
            ));

    if !is_envelope {
        // Bare record or a flag-less paginated object
        if is_record(obj) {
            return Page::of(vec![Value::Object(obj.clone())]);
        }
        if let Some(page) = paginated(obj, obj.get("pagination")) {
            return page;
        }
        return Page::failed(message.unwrap_or_else(|| MALFORMED_MESSAGE.to_string()));
    }

    // 1. Explicit failure flags
    if let Some(message) = failure(obj) {
        return Page::failed(message);
    }

    // 2. Payload
    let mut page = match obj.get("data") {
        Some(Value::Array(items)) => with_pagination(Page::of(items.clone()), obj.get("pagination")),
        Some(Value::Object(inner)) => match paginated(inner, inner.get("pagination").or(obj.get("pagination"))) {
            Some(page) => page,
            None => Page::of(vec![Value::Object(inner.clone())]),
        },
        Some(Value::Null) | None => match paginated(obj, obj.get("pagination")) {
            Some(page) => page,
            // Acknowledgement without payload
            None => Page::of(Vec::new()),
        },
        Some(_) => Page::failed(MALFORMED_MESSAGE),
    };

    if page.message.is_none() {
        page.message = message;
    }
    page
}

/// Failure message when the body carries `success:false` or an error status,
/// even if it is otherwise empty
pub fn failure_message(body: &Value) -> Option<String> {
    body.as_object().and_then(failure)
}

fn failure(obj: &Map<String, Value>) -> Option<String> {
    // A record's own `status` (e.g. a failed payment) is not an envelope flag
    let failed = obj.get("success").and_then(Value::as_bool) == Some(false)
        || (!is_record(obj)
            && matches!(
                obj.get("status").and_then(Value::as_str),
                Some("error" | "fail" | "failed")
            ));
    if !failed {
        return None;
    }
    let message = obj.get("message").and_then(Value::as_str);
    Some(message.unwrap_or("Request failed").to_string())
}

fn is_record(obj: &Map<String, Value>) -> bool {
    obj.contains_key("id") || obj.contains_key("_id")
}

/// Object holding one of the known list keys plus optional paging fields
fn paginated(obj: &Map<String, Value>, pagination: Option<&Value>) -> Option<Page<Value>> {
    let items = LIST_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))?;
    let page = with_pagination(Page::of(items.clone()), Some(&Value::Object(obj.clone())));
    Some(with_pagination(page, pagination))
}

fn with_pagination(mut page: Page<Value>, source: Option<&Value>) -> Page<Value> {
    let Some(Value::Object(src)) = source else {
        return page;
    };
    if let Some(p) = first_number(src, &["page", "currentPage"]) {
        page.page = p.max(1) as u32;
    }
    if let Some(size) = first_number(src, &["limit", "pageSize", "perPage"]) {
        page.page_size = size as u32;
    }
    if let Some(total) = first_number(src, &["total", "totalDocs", "totalItems", "count"]) {
        page.total = total;
    }
    page
}

fn first_number(src: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| src.get(*k).and_then(Value::as_u64))
}
