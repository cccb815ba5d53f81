use crate::assertion::registry::ValidationContext;
use crate::assertion::types::AssertError;

/// status-equals: `code`
pub fn status_equals(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let actual = ctx.params.status_code()?;
    let expected = ctx.params.int("code")?;

    if i64::from(actual) != expected {
        return Err(AssertError::mismatch(format!(
            "status code mismatch: got={}, want={}",
            actual, expected
        )));
    }
    Ok(())
}

/// status-in-set: `codes`（列表或逗号分隔字符串）
pub fn status_in_set(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let actual = ctx.params.status_code()?;
    let allowed = ctx.params.int_list("codes")?;
    if allowed.is_empty() {
        return Err(AssertError::invalid(
            "codes",
            "must be a non-empty list of integers",
        ));
    }

    if !allowed.contains(&i64::from(actual)) {
        return Err(AssertError::mismatch(format!(
            "status code {} is not in allowed set {:?}",
            actual, allowed
        )));
    }
    Ok(())
}

/// status-between: `min`, `max`（闭区间）
pub fn status_between(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let actual = i64::from(ctx.params.status_code()?);
    let min = ctx.params.int("min")?;
    let max = ctx.params.int("max")?;
    if min > max {
        return Err(AssertError::invalid(
            "min",
            format!("must be <= max (got {} > {})", min, max),
        ));
    }

    if actual < min || actual > max {
        return Err(AssertError::mismatch(format!(
            "status {} is not within [{}..{}]",
            actual, min, max
        )));
    }
    Ok(())
}
