use crate::error::ValidationError;

pub const MIN_WORDS: usize = 10;
pub const MAX_WORDS: usize = 1000;

/// Input that passed length validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedText {
    /// Exactly what the caller submitted.
    pub original: String,
    /// Whitespace collapsed to single spaces and trimmed; what gets sent upstream.
    pub cleaned: String,
    pub word_count: usize,
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn validate(text: &str) -> Result<ValidatedText, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    let words = word_count(text);
    if words < MIN_WORDS {
        return Err(ValidationError::TooShort {
            words,
            min: MIN_WORDS,
        });
    }
    if words > MAX_WORDS {
        return Err(ValidationError::TooLong {
            words,
            max: MAX_WORDS,
        });
    }
    Ok(ValidatedText {
        original: text.to_string(),
        cleaned: clean_text(text),
        word_count: words,
    })
}

#[cfg(test)]
mod tests {
    use super::{MAX_WORDS, MIN_WORDS, clean_text, validate, word_count};
    use crate::error::ValidationError;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn word_count_ignores_runs_of_whitespace() {
        assert_eq!(word_count("  one\t two\n\nthree  "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a \n b\t\tc "), "a b c");
    }

    #[test]
    fn blank_input_is_empty() {
        assert_eq!(validate("   \n\t"), Err(ValidationError::Empty));
        assert_eq!(validate(""), Err(ValidationError::Empty));
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(matches!(
            validate(&words(MIN_WORDS - 1)),
            Err(ValidationError::TooShort { words: 9, .. })
        ));
        assert!(validate(&words(MIN_WORDS)).is_ok());
        assert!(validate(&words(MAX_WORDS)).is_ok());
        assert!(matches!(
            validate(&words(MAX_WORDS + 1)),
            Err(ValidationError::TooLong { words: 1001, .. })
        ));
    }

    #[test]
    fn validated_text_keeps_original_and_cleaned_forms() {
        let raw = "  alpha  beta gamma delta epsilon\nzeta eta theta iota kappa ";
        let validated = validate(raw).expect("valid");
        assert_eq!(validated.original, raw);
        assert_eq!(
            validated.cleaned,
            "alpha beta gamma delta epsilon zeta eta theta iota kappa"
        );
        assert_eq!(validated.word_count, 10);
    }
}
