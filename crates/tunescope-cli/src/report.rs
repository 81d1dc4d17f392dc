// SPDX-License-Identifier: GPL-3.0-or-later
//! Console formatting helpers shared by the commands.

use serde_json::Value;
use tunescope_spotify::RequestError;

pub fn banner(title: &str, width: usize) {
    println!("\n{}", "=".repeat(width));
    println!("{title}");
    println!("{}", "=".repeat(width));
}

/// `1234567` -> `1,234,567`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// First `max_chars` characters, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

/// Show only the first ten characters of a secret.
pub fn mask(secret: &str) -> String {
    let shown: String = secret.chars().take(10).collect();
    format!("{shown}...")
}

pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

pub fn u64_at(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(pointer).and_then(Value::as_u64)
}

pub fn f64_at(value: &Value, pointer: &str) -> Option<f64> {
    value.pointer(pointer).and_then(Value::as_f64)
}

/// Non-null entries of the array at `pointer`.
pub fn items_at<'a>(value: &'a Value, pointer: &str) -> Vec<&'a Value> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter(|item| !item.is_null()).collect())
        .unwrap_or_default()
}

/// Comma-joined string entries of the array at `pointer`.
pub fn joined_at(value: &Value, pointer: &str, limit: usize) -> String {
    items_at(value, pointer)
        .into_iter()
        .filter_map(Value::as_str)
        .take(limit)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comma-joined `name` fields of the objects in the array at `pointer`.
pub fn names_at(value: &Value, pointer: &str) -> String {
    items_at(value, pointer)
        .into_iter()
        .filter_map(|item| str_at(item, "/name"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-line console description of a failed request.
pub fn describe_failure(error: &RequestError) -> String {
    match error {
        RequestError::RateLimited {
            retry_after: Some(secs),
        } => format!("Rate limited! Retry after: {secs} seconds"),
        RequestError::RateLimited { retry_after: None } => "Rate limited!".to_string(),
        RequestError::Upstream {
            status,
            body_snippet,
        } => format!("Request failed: {status} - {body_snippet}"),
        other => format!("Error making request: {other}"),
    }
}
