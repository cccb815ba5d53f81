use crate::assertion::extractor::{extract_number, parse_json_body};
use crate::assertion::registry::ValidationContext;
use crate::assertion::types::AssertError;

/// numeric-field-between: `column`（或 `field`）、`min`、可选 `max`
///
/// 字段按点号路径从 JSON 响应体中取出；数值字符串同样接受。
pub fn numeric_field_between(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let field = ctx.params.first_non_empty(&["column", "field"])?;
    let min = ctx.params.float("min")?;
    let max = ctx.params.opt_float("max")?;
    if let Some(max) = max
        && min > max
    {
        return Err(AssertError::invalid(
            "min",
            format!("must be <= max (got {} > {})", min, max),
        ));
    }

    let json = parse_json_body(ctx.body)?;
    let value = extract_number(&json, &field)?;

    let outside = value < min || max.is_some_and(|max| value > max);
    if outside {
        let bounds = match max {
            Some(max) => format!("[{}, {}]", min, max),
            None => format!("[{}, +inf)", min),
        };
        return Err(AssertError::mismatch(format!(
            "{}={} outside {}",
            field, value, bounds
        )));
    }
    Ok(())
}
