use mal_core::Span;
use regex::Regex;

const TOKEN_PATTERN: &str =
    r#"[\s,]*(~@|[\[\]{}()'`~^@]|"(?:\\.|[^\\"])*"?|;.*|[^\s\[\]{}('"`,;)]*)"#;

thread_local! {
    static TOKEN_RE: Regex = Regex::new(TOKEN_PATTERN).expect("token pattern compiles");
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Quote,
    Quasiquote,
    Unquote,
    SpliceUnquote,
    Deref,
    Meta,
    /// Anything else: numbers, strings (still quoted and escaped), keywords, symbols.
    Atom(String),
}

impl Token {
    fn from_text(text: &str) -> Token {
        match text {
            "(" => Token::LParen,
            ")" => Token::RParen,
            "[" => Token::LBracket,
            "]" => Token::RBracket,
            "{" => Token::LBrace,
            "}" => Token::RBrace,
            "'" => Token::Quote,
            "`" => Token::Quasiquote,
            "~" => Token::Unquote,
            "~@" => Token::SpliceUnquote,
            "@" => Token::Deref,
            "^" => Token::Meta,
            other => Token::Atom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tracks line/column while walking forward through the input.
struct Cursor<'a> {
    input: &'a str,
    offset: usize,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor {
            input,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    fn advance_to(&mut self, target: usize) -> Span {
        for ch in self.input[self.offset..target].chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.offset = target;
        Span::point(self.line, self.col)
    }
}

/// Split source text into tokens. Comments and empty matches are dropped.
///
/// Tokenizing never fails; malformed tokens (such as an unterminated string)
/// are reported by the parser when it classifies them.
pub fn tokenize(input: &str) -> Vec<SpannedToken> {
    let mut cursor = Cursor::new(input);
    TOKEN_RE.with(|re| {
        re.captures_iter(input)
            .filter_map(|cap| cap.get(1))
            .filter(|m| !m.as_str().is_empty() && !m.as_str().starts_with(';'))
            .map(|m| SpannedToken {
                token: Token::from_text(m.as_str()),
                span: cursor.advance_to(m.start()),
            })
            .collect()
    })
}
