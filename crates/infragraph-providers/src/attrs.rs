//! Helpers for reading references out of JSON attributes.
//!
//! State files and converted HCL share one representation: scalars, lists,
//! and nested blocks as lists of objects (a lone object is accepted too).

use serde_json::Value;

/// Every string under `value`, flattening nested lists.
pub fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(strings).collect(),
        _ => Vec::new(),
    }
}

/// Strings held by attribute `key`.
pub fn field(attrs: &Value, key: &str) -> Vec<String> {
    attrs.get(key).map(strings).unwrap_or_default()
}

/// First string held by attribute `key`.
pub fn first(attrs: &Value, key: &str) -> Option<String> {
    field(attrs, key).into_iter().next()
}

/// Nested blocks under `key`.
pub fn blocks<'a>(attrs: &'a Value, key: &str) -> Vec<&'a Value> {
    match attrs.get(key) {
        Some(Value::Array(items)) => items.iter().filter(|v| v.is_object()).collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    }
}

/// Strings at the end of a path of nested blocks, e.g.
/// `["network_interfaces", "security_groups"]`.
pub fn nested(attrs: &Value, path: &[&str]) -> Vec<String> {
    match path {
        [] => Vec::new(),
        [last] => field(attrs, last),
        [head, rest @ ..] => blocks(attrs, head)
            .into_iter()
            .flat_map(|block| nested(block, rest))
            .collect(),
    }
}

/// A boolean attribute, accepting the string forms found in flatmap state.
pub fn truthy(attrs: &Value, key: &str) -> bool {
    match attrs.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

/// A port number, accepting numbers and numeric strings.
pub fn port(attrs: &Value, key: &str) -> Option<u32> {
    match attrs.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|p| u32::try_from(p).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse `"80"` or `"8000-8080"` into an inclusive range.
pub fn port_range(spec: &str) -> Option<(u32, u32)> {
    match spec.split_once('-') {
        Some((from, to)) => Some((from.trim().parse().ok()?, to.trim().parse().ok()?)),
        None => {
            let port = spec.trim().parse().ok()?;
            Some((port, port))
        }
    }
}

/// True for the IPv4 and IPv6 all-addresses ranges.
pub fn is_open_range(cidr: &str) -> bool {
    matches!(cidr.trim(), "0.0.0.0/0" | "::/0")
}

/// True when any of the listed attributes holds an all-addresses range.
pub fn any_open_range(attrs: &Value, keys: &[&str]) -> bool {
    keys.iter()
        .flat_map(|key| field(attrs, key))
        .any(|cidr| is_open_range(&cidr))
}

/// True when the string is an unevaluated HCL interpolation.
pub fn is_interpolation(value: &str) -> bool {
    value.contains("${")
}

/// Namespaced alias key for a plain value (`ip:10.0.0.4`). Interpolations
/// are returned untouched so the builder can resolve them by address.
pub fn alias_key(namespace: &str, value: &str) -> String {
    if is_interpolation(value) {
        value.to_string()
    } else {
        format!("{}:{}", namespace, value)
    }
}
