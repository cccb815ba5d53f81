use crate::assertion::types::AssertError;
use serde_json::Value;

/// 把响应体解析为 JSON
pub fn parse_json_body(body: &[u8]) -> Result<Value, AssertError> {
    Ok(serde_json::from_slice(body)?)
}

/// 按点号分隔的路径从 JSON 中取值
///
/// 例如 `token`、`data.user.id`、`items.0.name`（数字段用于数组下标）。
pub fn extract_field<'a>(json: &'a Value, path: &str) -> Result<&'a Value, AssertError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(AssertError::PathNotFound("(empty path)".to_string()));
    }

    let mut current = json;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| AssertError::PathNotFound(format!("field '{}'", path)))?;
    }

    Ok(current)
}

/// 取数值字段：JSON 数字或可解析为数字的字符串
pub fn extract_number(json: &Value, path: &str) -> Result<f64, AssertError> {
    let value = extract_field(json, path)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number.ok_or_else(|| AssertError::TypeMismatch {
        path: path.to_string(),
        expected: "number".to_string(),
        actual: json_kind(value).to_string(),
    })
}

/// 取字符串字段（不做类型转换）
pub fn extract_string<'a>(json: &'a Value, path: &str) -> Result<&'a str, AssertError> {
    let value = extract_field(json, path)?;
    value.as_str().ok_or_else(|| AssertError::TypeMismatch {
        path: path.to_string(),
        expected: "string".to_string(),
        actual: json_kind(value).to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(s) if s.trim().parse::<f64>().is_err() => "non-numeric string",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
