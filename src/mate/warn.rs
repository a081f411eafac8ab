fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if !ch.is_control() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Structured warning for a recovered failure (fallback taken, store degraded).
pub fn emit(code: &str, stage: &str, action: &str, reason: &str, err: &str) {
    tracing::warn!(
        code = %sanitize_value(code),
        stage = %sanitize_value(stage),
        action = %sanitize_value(action),
        reason = %sanitize_value(reason),
        err = %sanitize_value(err),
        "MATE_WARN"
    );
}

#[cfg(test)]
mod tests {
    use super::sanitize_value;

    #[test]
    fn sanitize_value_rewrites_whitespace() {
        assert_eq!(sanitize_value("a b\tc"), "a_b_c");
        assert_eq!(sanitize_value("status 400:\n bad input"), "status_400:_bad_input");
    }

    #[test]
    fn sanitize_value_falls_back_for_empty() {
        assert_eq!(sanitize_value("   "), "na");
    }
}
