use thiserror::Error;

/// A syntax error from the markup tokenizer or the extension expression parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("markup error at {line}:{col}: {message}")]
pub struct MarkupError {
    pub message: String,
    /// 1-based source line number where the error occurred.
    pub line: usize,
    /// 1-based source column number where the error occurred.
    pub col: usize,
}

impl MarkupError {
    pub(crate) fn new(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self { message: msg.into(), line, col }
    }

    /// Builds an error positioned at byte `offset` of `src`.
    pub(crate) fn at_offset(msg: impl Into<String>, src: &str, offset: usize) -> Self {
        let (line, col) = line_col(src, offset);
        Self::new(msg, line, col)
    }
}

fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(src.len());
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    let before = &src[..end];
    let line = before.matches('\n').count() + 1;
    let col = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_on_first_line() {
        let err = MarkupError::at_offset("boom", "<Root>", 3);
        assert_eq!((err.line, err.col), (1, 4));
    }

    #[test]
    fn offset_after_newlines() {
        let err = MarkupError::at_offset("boom", "<A>\n  <B>\n<C", 12);
        assert_eq!((err.line, err.col), (3, 3));
    }

    #[test]
    fn offset_past_end_is_clamped() {
        let err = MarkupError::at_offset("boom", "ab", 99);
        assert_eq!((err.line, err.col), (1, 3));
    }

    #[test]
    fn display_mentions_position() {
        let err = MarkupError::new("unexpected '}'", 2, 7);
        assert_eq!(err.to_string(), "markup error at 2:7: unexpected '}'");
    }
}
