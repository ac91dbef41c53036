use crate::error::MarkupError;
use crate::expr::ast::{Argument, Expression, NamedArgument};
use crate::expr::lexer::{Lexer, Token, TokenWithPos};

// ── Parser ────────────────────────────────────────────────────────────────

/// Deepest `{...}` nesting accepted inside one expression.
pub const MAX_NESTING: usize = 64;

pub struct Parser<'s> {
    src: &'s str,
    tokens: Vec<TokenWithPos>,
    pos: usize,
    depth: usize,
}

impl<'s> Parser<'s> {
    pub fn new(src: &'s str, tokens: Vec<TokenWithPos>) -> Self {
        Self { src, tokens, pos: 0, depth: 0 }
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.offset)
            .unwrap_or(0)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn peek_ahead(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).map(|t| t.token.clone()).unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, msg: impl Into<String>) -> MarkupError {
        let offset = self.current_offset().min(self.src.len());
        MarkupError::new(msg, 1, self.src[..offset].chars().count() + 1)
    }

    fn expect_token(&mut self, expected: &Token) -> Result<(), MarkupError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {:?}, got {:?}", expected, self.peek())))
        }
    }

    // ── Expression ────────────────────────────────────────────────────────

    /// Parse a whole source string that must hold exactly one expression.
    pub fn parse_document(&mut self) -> Result<Expression, MarkupError> {
        let expr = self.parse_expression()?;
        if self.peek() != &Token::Eof {
            return Err(self.err(format!("unexpected {:?} after expression", self.peek())));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expression, MarkupError> {
        if self.depth == MAX_NESTING {
            return Err(self.err(format!("expression nested deeper than {} levels", MAX_NESTING)));
        }
        self.depth += 1;
        let expr = self.parse_braced();
        self.depth -= 1;
        expr
    }

    fn parse_braced(&mut self) -> Result<Expression, MarkupError> {
        self.expect_token(&Token::LBrace)?;
        let head_offset = self.current_offset();
        let head = match self.advance() {
            Token::Text(s) if !s.is_empty() => s,
            tok => return Err(self.err(format!("expected an extension name, got {:?}", tok))),
        };

        // `Ref Other` lexes as one text run: the first word is the name, the
        // remainder starts the first argument.
        let (name, rest) = match head.split_once(char::is_whitespace) {
            Some((name, rest)) => (name.to_string(), rest.trim_start().to_string()),
            None => (head, String::new()),
        };
        if !rest.is_empty() {
            let offset = head_offset + name.len();
            self.tokens.insert(self.pos, TokenWithPos { token: Token::Text(rest), offset });
        }

        let mut expr = Expression { name, positional: Vec::new(), named: Vec::new() };
        if self.peek() != &Token::RBrace {
            loop {
                self.parse_argument(&mut expr)?;
                match self.peek() {
                    Token::Comma => { self.advance(); }
                    Token::RBrace => break,
                    tok => {
                        return Err(self.err(format!("expected ',' or '}}', got {:?}", tok)));
                    }
                }
            }
        }
        self.expect_token(&Token::RBrace)?;
        Ok(expr)
    }

    // ── Arguments ─────────────────────────────────────────────────────────

    fn parse_argument(&mut self, expr: &mut Expression) -> Result<(), MarkupError> {
        let named = match (self.peek(), self.peek_ahead(1)) {
            (Token::Text(name), Token::Equals) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = named {
            if name.is_empty() {
                return Err(self.err("named argument is missing its name"));
            }
            self.advance(); // name
            self.advance(); // `=`
            let value = self.parse_value()?;
            expr.named.push(NamedArgument { name, value });
            return Ok(());
        }

        if !expr.named.is_empty() {
            return Err(self.err("positional argument after a named argument"));
        }
        let value = self.parse_value()?;
        expr.positional.push(value);
        Ok(())
    }

    fn parse_value(&mut self) -> Result<Argument, MarkupError> {
        match self.peek() {
            Token::LBrace => Ok(Argument::Expression(self.parse_expression()?)),
            Token::Text(_) | Token::Quoted(_) => match self.advance() {
                Token::Text(s) | Token::Quoted(s) => Ok(Argument::Text(s)),
                _ => Err(self.err("expected a value")),
            },
            tok => Err(self.err(format!("expected a value, got {:?}", tok))),
        }
    }
}

// ── Public parse entry point ──────────────────────────────────────────────

/// Parse a markup extension expression such as `{Ref Other}`.
pub fn parse_expression(src: &str) -> Result<Expression, MarkupError> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(src, tokens).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Argument {
        Argument::Text(s.to_string())
    }

    #[test]
    fn bare_name() {
        let expr = parse_expression("{Null}").unwrap();
        assert_eq!(expr.name, "Null");
        assert!(expr.positional.is_empty());
        assert!(expr.named.is_empty());
    }

    #[test]
    fn prefixed_name_with_positional() {
        let expr = parse_expression("{x:Ref Other}").unwrap();
        assert_eq!(expr.name, "x:Ref");
        assert_eq!(expr.positional, vec![text("Other")]);
    }

    #[test]
    fn named_arguments() {
        let expr = parse_expression("{Binding Path=Title, Mode=OneWay}").unwrap();
        assert_eq!(expr.name, "Binding");
        assert_eq!(expr.named("Path"), Some(&text("Title")));
        assert_eq!(expr.named("Mode"), Some(&text("OneWay")));
    }

    #[test]
    fn positional_then_named() {
        let expr = parse_expression("{Format 'a, b', Value=3}").unwrap();
        assert_eq!(expr.positional, vec![text("a, b")]);
        assert_eq!(expr.named("Value"), Some(&text("3")));
    }

    #[test]
    fn nested_expressions() {
        let expr = parse_expression("{Outer {Inner x}, Key={Ref y}}").unwrap();
        let Argument::Expression(inner) = &expr.positional[0] else { panic!("not nested") };
        assert_eq!(inner.name, "Inner");
        assert_eq!(inner.positional, vec![text("x")]);
        let Some(Argument::Expression(keyed)) = expr.named("Key") else { panic!("not nested") };
        assert_eq!(keyed.name, "Ref");
    }

    fn nested(depth: usize) -> String {
        format!("{}x{}", "{Ref ".repeat(depth), "}".repeat(depth))
    }

    #[test]
    fn nesting_up_to_the_limit() {
        let mut expr = parse_expression(&nested(MAX_NESTING)).unwrap();
        for _ in 1..MAX_NESTING {
            let Some(Argument::Expression(inner)) = expr.positional.pop() else { panic!("not nested") };
            expr = inner;
        }
        assert_eq!(expr.positional, vec![text("x")]);
    }

    #[test]
    fn err_nesting_too_deep() {
        let err = parse_expression(&nested(MAX_NESTING + 1)).unwrap_err();
        assert!(err.message.contains("nested deeper"), "{}", err.message);
        let err = parse_expression(&nested(3000)).unwrap_err();
        assert!(err.message.contains("nested deeper"), "{}", err.message);
    }

    #[test]
    fn err_positional_after_named() {
        let err = parse_expression("{Ref Name=a, b}").unwrap_err();
        assert!(err.message.contains("positional"));
    }

    #[test]
    fn err_missing_name() { parse_expression("{}").unwrap_err(); }
    #[test]
    fn err_unclosed() { parse_expression("{Ref a").unwrap_err(); }
    #[test]
    fn err_trailing_text() { parse_expression("{Ref a} tail").unwrap_err(); }
    #[test]
    fn err_dangling_equals() { parse_expression("{Ref Name=}").unwrap_err(); }
}
