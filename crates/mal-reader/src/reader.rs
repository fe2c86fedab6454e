use mal_core::{MalError, Span, Value};

use crate::lexer::{tokenize, SpannedToken, Token};

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or(Span::point(1, 1))
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn read_form(&mut self) -> Result<Value, MalError> {
        let span = self.span();
        match self.peek() {
            None => Err(MalError::reader("unexpected end of input", span)),
            Some(Token::LParen) => Ok(Value::list(self.read_seq(Token::RParen, '(')?)),
            Some(Token::LBracket) => Ok(Value::vector(self.read_seq(Token::RBracket, '[')?)),
            Some(Token::LBrace) => self.read_map(),
            Some(Token::RParen) | Some(Token::RBracket) | Some(Token::RBrace) => {
                let close = match self.peek() {
                    Some(Token::RParen) => ')',
                    Some(Token::RBracket) => ']',
                    _ => '}',
                };
                Err(MalError::reader(format!("unexpected '{close}'"), span))
            }
            Some(Token::Quote) => self.read_shorthand("quote"),
            Some(Token::Quasiquote) => self.read_shorthand("quasiquote"),
            Some(Token::Unquote) => self.read_shorthand("unquote"),
            Some(Token::SpliceUnquote) => self.read_shorthand("splice-unquote"),
            Some(Token::Deref) => self.read_shorthand("deref"),
            Some(Token::Meta) => {
                self.advance();
                let meta = self.read_form()?;
                let target = self.read_form()?;
                Ok(Value::list(vec![Value::symbol("with-meta"), target, meta]))
            }
            Some(Token::Atom(_)) => self.read_atom(),
        }
    }

    /// `'x` and friends: wrap the next form as `(name x)`.
    fn read_shorthand(&mut self, name: &str) -> Result<Value, MalError> {
        self.advance();
        let inner = self.read_form()?;
        Ok(Value::list(vec![Value::symbol(name), inner]))
    }

    /// Read forms up to `close`, consuming both delimiters.
    fn read_seq(&mut self, close: Token, open: char) -> Result<Vec<Value>, MalError> {
        let open_span = self.span();
        self.advance();
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(MalError::reader(format!("Unmatched '{open}'"), open_span));
                }
                Some(t) if *t == close => {
                    self.advance();
                    return Ok(items);
                }
                Some(_) => items.push(self.read_form()?),
            }
        }
    }

    fn read_map(&mut self) -> Result<Value, MalError> {
        let open_span = self.span();
        let forms = self.read_seq(Token::RBrace, '{')?;
        if forms.len() % 2 != 0 {
            return Err(MalError::reader(
                "odd number of keys in hash-map literal",
                open_span,
            ));
        }
        let mut entries = Vec::with_capacity(forms.len() / 2);
        let mut forms = forms.into_iter();
        while let (Some(key), Some(val)) = (forms.next(), forms.next()) {
            if !key.is_atomic() {
                return Err(MalError::reader(
                    format!("hash-map key must be atomic, got {}", key.type_name()),
                    open_span,
                ));
            }
            entries.push((key, val));
        }
        Value::hashmap(entries)
    }

    fn read_atom(&mut self) -> Result<Value, MalError> {
        let span = self.span();
        let text = match self.advance() {
            Some(SpannedToken {
                token: Token::Atom(text),
                ..
            }) => text.clone(),
            _ => return Err(MalError::reader("expected an atom", span)),
        };

        if is_number(&text) {
            return text
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|e| MalError::reader(format!("invalid number {text}: {e}"), span));
        }
        if let Some(body) = text.strip_prefix('"') {
            return unescape(body)
                .map(|s| Value::string(&s))
                .ok_or_else(|| MalError::reader("unbalanced string", span));
        }
        if let Some(name) = text.strip_prefix(':') {
            return Ok(Value::keyword(name));
        }
        Ok(match text.as_str() {
            "nil" => Value::Nil,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::symbol(&text),
        })
    }
}

/// Optional `-`, digits, optional `.digits`.
fn is_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}

/// Decode the body of a string token (everything after the opening quote).
/// Returns `None` when the closing quote is missing.
fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return chars.next().is_none().then_some(out),
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            _ => out.push(c),
        }
    }
    None
}

/// Read a single form. Empty input (or input that is only whitespace and
/// comments) reads as `nil`. Anything after the first form is ignored.
pub fn read(input: &str) -> Result<Value, MalError> {
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return Ok(Value::Nil);
    }
    Parser::new(tokens).read_form()
}

/// Read every top-level form in the input.
pub fn read_many(input: &str) -> Result<Vec<Value>, MalError> {
    let mut parser = Parser::new(tokenize(input));
    let mut forms = Vec::new();
    while parser.peek().is_some() {
        forms.push(parser.read_form()?);
    }
    Ok(forms)
}
