use serde_json::Value;

/// Headline fields, most specific first. Nested objects such as `rating`
/// print their `code`.
const PRIORITY_KEYS: [&str; 8] = [
    "rating",
    "score",
    "direction",
    "total_cash_flow",
    "net_cash_flow",
    "cumulative_net_cash_flow",
    "liquidity",
    "years",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => {
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(val));
            }
        }
        // One line per year for list results.
        Value::Array(items) => {
            for item in items {
                let year = item.get("year").map(format_minimal).unwrap_or_default();
                let headline = item
                    .as_object()
                    .and_then(|m| PRIORITY_KEYS.iter().find_map(|k| m.get(*k)))
                    .map(format_minimal)
                    .unwrap_or_default();
                println!("{year}: {headline}");
            }
        }
        other => println!("{}", format_minimal(other)),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(map) => match map.get("code") {
            Some(code) => format_minimal(code),
            None => serde_json::to_string(value).unwrap_or_default(),
        },
        Value::Array(items) => format!("{} entries", items.len()),
    }
}
