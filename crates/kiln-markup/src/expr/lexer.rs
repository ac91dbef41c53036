use crate::error::MarkupError;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LBrace,
    RBrace,
    Comma,
    Equals,
    /// Unquoted run, trimmed of surrounding whitespace.
    Text(String),
    /// `'single quoted'` run with `\` escapes resolved.
    Quoted(String),
    Eof,
}

/// A token with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWithPos {
    pub token: Token,
    pub offset: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithPos>, MarkupError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let offset = self.pos;
            let token = self.next_token()?;
            let eof = token == Token::Eof;
            tokens.push(TokenWithPos { token, offset });
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn err(&self, msg: impl Into<String>, offset: usize) -> MarkupError {
        MarkupError::new(msg, 1, self.src[..offset].chars().count() + 1)
    }

    fn next_token(&mut self) -> Result<Token, MarkupError> {
        let Some(ch) = self.peek() else {
            return Ok(Token::Eof);
        };

        match ch {
            '{' => { self.advance(); Ok(Token::LBrace) }
            '}' => { self.advance(); Ok(Token::RBrace) }
            ',' => { self.advance(); Ok(Token::Comma) }
            '=' => { self.advance(); Ok(Token::Equals) }
            '\'' => self.lex_quoted(),
            _ => Ok(self.lex_text()),
        }
    }

    fn lex_quoted(&mut self) -> Result<Token, MarkupError> {
        let start = self.pos;
        self.advance(); // consume opening `'`
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(self.err("unterminated quoted string", start)),
                Some('\'') => break,
                Some('\\') => match self.advance() {
                    Some(c) => s.push(c),
                    None => return Err(self.err("unterminated escape sequence", start)),
                },
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Quoted(s))
    }

    fn lex_text(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !matches!(c, '{' | '}' | ',' | '=' | '\'')) {
            self.advance();
        }
        Token::Text(self.src[start..self.pos].trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.token).collect()
    }

    fn text(s: &str) -> Token {
        Token::Text(s.to_string())
    }

    #[rstest]
    #[case("{Ref}", vec![Token::LBrace, text("Ref"), Token::RBrace, Token::Eof])]
    #[case("{ Ref  Other }", vec![Token::LBrace, text("Ref  Other"), Token::RBrace, Token::Eof])]
    #[case("{B Path=A,Mode=B}", vec![
        Token::LBrace, text("B Path"), Token::Equals, text("A"), Token::Comma,
        text("Mode"), Token::Equals, text("B"), Token::RBrace, Token::Eof,
    ])]
    #[case("{F 'a, {b}'}", vec![
        Token::LBrace, text("F"), Token::Quoted("a, {b}".into()), Token::RBrace, Token::Eof,
    ])]
    fn tokenizes(#[case] src: &str, #[case] expected: Vec<Token>) {
        assert_eq!(kinds(src), expected);
    }

    #[test]
    fn quoted_escapes() {
        assert_eq!(kinds(r"'it\'s \\ ok'")[0], Token::Quoted(r"it's \ ok".into()));
    }

    #[test]
    fn offsets_point_at_token_start() {
        let tokens = Lexer::new("{Ref  x}").tokenize().unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 1, 7, 8]);
    }

    #[test]
    fn unterminated_quote_reports_column() {
        let err = Lexer::new("{Ref 'oops}").tokenize().unwrap_err();
        assert_eq!(err.col, 6);
    }
}
