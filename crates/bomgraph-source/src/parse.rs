//! Reader for the `.bpo` block syntax.
//!
//! ```text
//! import "parts"
//!
//! item "bike" {
//!   part_number = "BK-1"
//!   from = [
//!     { name = "wheel", ref = parts.wheel, qty = 2 },
//!   ]
//! }
//! ```
//!
//! Only top-level blocks are supported. Bodies hold attributes whose values
//! are strings, numbers, booleans, dotted references, lists, and objects.
//! Comments start with `#` or `//`, or sit between `/*` and `*/`.

use std::collections::BTreeMap;
use std::fs;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use crate::block::{Block, Value};
use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Equal,
    Colon,
    Comma,
    Dot,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier `{name}`"),
            Token::Str(s) => format!("string \"{s}\""),
            Token::Num(n) => format!("number {n}"),
            Token::LeftBrace => "`{`".to_string(),
            Token::RightBrace => "`}`".to_string(),
            Token::LeftBracket => "`[`".to_string(),
            Token::RightBracket => "`]`".to_string(),
            Token::Equal => "`=`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Dot => "`.`".to_string(),
            Token::Eof => "end of file".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    file: &'a Path,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, file: &'a Path) -> Self {
        Self {
            chars: input.chars().peekable(),
            file,
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> SourceError {
        SourceError::Syntax {
            file: self.file.to_path_buf(),
            line,
            column,
            message: message.into(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>, SourceError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let Some(&ch) = self.chars.peek() else {
                tokens.push(Spanned {
                    token: Token::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let token = match ch {
                '{' => self.single(Token::LeftBrace),
                '}' => self.single(Token::RightBrace),
                '[' => self.single(Token::LeftBracket),
                ']' => self.single(Token::RightBracket),
                '=' => self.single(Token::Equal),
                ':' => self.single(Token::Colon),
                ',' => self.single(Token::Comma),
                '.' => self.single(Token::Dot),
                '"' => self.string(line, column)?,
                '-' | '0'..='9' => self.number(line, column)?,
                c if c.is_alphabetic() || c == '_' => self.ident(),
                other => {
                    return Err(self.error(line, column, format!("unexpected character `{other}`")));
                }
            };
            tokens.push(Spanned {
                token,
                line,
                column,
            });
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn skip_trivia(&mut self) -> Result<(), SourceError> {
        while let Some(&ch) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' => self.skip_line(),
                '/' => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    match self.chars.peek() {
                        Some('/') => self.skip_line(),
                        Some('*') => {
                            self.bump();
                            self.skip_block_comment(line, column)?;
                        }
                        _ => return Err(self.error(line, column, "unexpected character `/`")),
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self, line: usize, column: usize) -> Result<(), SourceError> {
        let mut previous = '\0';
        while let Some(ch) = self.bump() {
            if previous == '*' && ch == '/' {
                return Ok(());
            }
            previous = ch;
        }
        Err(self.error(line, column, "unterminated block comment"))
    }

    fn string(&mut self, line: usize, column: usize) -> Result<Token, SourceError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Token::Str(out)),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(other) => {
                        return Err(self.error(
                            self.line,
                            self.column,
                            format!("unknown escape `\\{other}`"),
                        ));
                    }
                    None => break,
                },
                Some('\n') | None => break,
                Some(ch) => out.push(ch),
            }
        }
        Err(self.error(line, column, "unterminated string"))
    }

    fn number(&mut self, line: usize, column: usize) -> Result<Token, SourceError> {
        let mut raw = String::new();
        if let Some('-') = self.chars.peek() {
            raw.push('-');
            self.bump();
        }
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' {
                raw.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        raw.parse::<f64>()
            .map(Token::Num)
            .map_err(|_| self.error(line, column, format!("invalid number `{raw}`")))
    }

    fn ident(&mut self) -> Token {
        let mut name = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        Token::Ident(name)
    }
}

struct Parser<'a> {
    tokens: Vec<Spanned>,
    current: usize,
    file: &'a Path,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Spanned {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    fn advance(&mut self) -> Spanned {
        let token = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn error_at(&self, at: &Spanned, message: impl Into<String>) -> SourceError {
        SourceError::Syntax {
            file: self.file.to_path_buf(),
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }

    fn expect(&mut self, want: Token) -> Result<Spanned, SourceError> {
        let next = self.advance();
        if next.token == want {
            Ok(next)
        } else {
            Err(self.error_at(
                &next,
                format!("expected {}, found {}", want.describe(), next.token.describe()),
            ))
        }
    }

    fn eat(&mut self, want: &Token) -> bool {
        if &self.peek().token == want {
            self.advance();
            true
        } else {
            false
        }
    }

    fn blocks(&mut self) -> Result<Vec<Block>, SourceError> {
        let mut blocks = Vec::new();
        while self.peek().token != Token::Eof {
            blocks.push(self.block()?);
        }
        Ok(blocks)
    }

    fn block(&mut self) -> Result<Block, SourceError> {
        let head = self.advance();
        let Token::Ident(kind) = head.token.clone() else {
            return Err(self.error_at(
                &head,
                format!("expected block type, found {}", head.token.describe()),
            ));
        };

        let mut labels = Vec::new();
        while let Token::Str(label) = &self.peek().token {
            labels.push(label.clone());
            self.advance();
        }

        let mut attrs = BTreeMap::new();
        if self.eat(&Token::LeftBrace) {
            while !self.eat(&Token::RightBrace) {
                let key_token = self.advance();
                let key = match key_token.token.clone() {
                    Token::Ident(key) => key,
                    Token::Eof => {
                        return Err(self.error_at(&key_token, format!("unclosed `{kind}` block")));
                    }
                    other => {
                        return Err(self.error_at(
                            &key_token,
                            format!("expected attribute name, found {}", other.describe()),
                        ));
                    }
                };
                if matches!(self.peek().token, Token::Str(_) | Token::LeftBrace) {
                    return Err(self.error_at(&key_token, "nested blocks are not supported"));
                }
                self.expect(Token::Equal)?;
                let value = self.value()?;
                if attrs.insert(key.clone(), value).is_some() {
                    return Err(self.error_at(&key_token, format!("duplicate attribute `{key}`")));
                }
            }
        }

        Ok(Block {
            kind,
            labels,
            attrs,
            file: self.file.to_path_buf(),
            line: head.line,
        })
    }

    fn value(&mut self) -> Result<Value, SourceError> {
        let next = self.advance();
        match next.token {
            Token::Str(s) => Ok(Value::Str(s)),
            Token::Num(n) => Ok(Value::Num(n)),
            Token::Ident(name) if name == "true" => Ok(Value::Bool(true)),
            Token::Ident(name) if name == "false" => Ok(Value::Bool(false)),
            Token::Ident(name) => {
                let mut path = vec![name];
                while self.eat(&Token::Dot) {
                    let segment = self.advance();
                    match segment.token {
                        Token::Ident(part) => path.push(part),
                        ref other => {
                            return Err(self.error_at(
                                &segment,
                                format!("expected name after `.`, found {}", other.describe()),
                            ));
                        }
                    }
                }
                Ok(Value::Ref(path))
            }
            Token::LeftBracket => {
                let mut items = Vec::new();
                while !self.eat(&Token::RightBracket) {
                    items.push(self.value()?);
                    self.eat(&Token::Comma);
                }
                Ok(Value::List(items))
            }
            Token::LeftBrace => {
                let mut map = BTreeMap::new();
                while !self.eat(&Token::RightBrace) {
                    let key_token = self.advance();
                    let key = match key_token.token.clone() {
                        Token::Ident(key) | Token::Str(key) => key,
                        other => {
                            return Err(self.error_at(
                                &key_token,
                                format!("expected object key, found {}", other.describe()),
                            ));
                        }
                    };
                    if !self.eat(&Token::Equal) {
                        self.expect(Token::Colon)?;
                    }
                    let value = self.value()?;
                    if map.insert(key.clone(), value).is_some() {
                        return Err(self.error_at(&key_token, format!("duplicate key `{key}`")));
                    }
                    self.eat(&Token::Comma);
                }
                Ok(Value::Object(map))
            }
            other => Err(self.error_at(
                &Spanned {
                    token: other.clone(),
                    line: next.line,
                    column: next.column,
                },
                format!("expected value, found {}", other.describe()),
            )),
        }
    }
}

/// Parse source text. `file` is recorded on each block for diagnostics and
/// relative path resolution.
pub fn parse_str(input: &str, file: impl Into<PathBuf>) -> Result<Vec<Block>, SourceError> {
    let file = file.into();
    let tokens = Lexer::new(input, &file).tokenize()?;
    Parser {
        tokens,
        current: 0,
        file: &file,
    }
    .blocks()
}

/// Read and parse one `.bpo` file.
pub fn parse_file(path: &Path) -> Result<Vec<Block>, SourceError> {
    let input = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
    parse_str(&input, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<Block> {
        parse_str(input, "test.bpo").expect("source should parse")
    }

    #[test]
    fn parses_item_with_components() {
        let blocks = parse(
            r#"
            # a bike
            item "bike" {
              part_number = "BK-1"
              source = "make"
              from = [
                { name = "wheel", ref = parts.wheel, qty = 2 },
                { ref = frame },
              ]
            }
            "#,
        );
        assert_eq!(blocks.len(), 1);
        let bike = &blocks[0];
        assert_eq!(bike.kind, "item");
        assert_eq!(bike.name(), Some("bike"));
        assert_eq!(bike.line, 3);
        assert_eq!(bike.str_attr("part_number"), Some("BK-1"));

        let from = bike.attr("from").and_then(Value::as_list).expect("list");
        assert_eq!(from.len(), 2);
        let wheel = from[0].as_object().expect("object");
        assert_eq!(
            wheel.get("ref"),
            Some(&Value::Ref(vec!["parts".into(), "wheel".into()]))
        );
        assert_eq!(wheel.get("qty"), Some(&Value::Num(2.0)));
    }

    #[test]
    fn import_body_is_optional() {
        let blocks = parse("import \"lib/parts\"\ncontract \"m6\" { pitch = 1.0 }");
        assert_eq!(blocks[0].kind, "import");
        assert_eq!(blocks[0].name(), Some("lib/parts"));
        assert!(blocks[0].attrs.is_empty());
        assert_eq!(blocks[1].num_attr("pitch"), Some(1.0));
    }

    #[test]
    fn comments_and_scalars() {
        let blocks = parse(
            "/* header\n comment */ contract \"c\" { a = true // trailing\n b = -2.5\n c = \"x\\\"y\" }",
        );
        let c = &blocks[0];
        assert_eq!(c.attr("a"), Some(&Value::Bool(true)));
        assert_eq!(c.num_attr("b"), Some(-2.5));
        assert_eq!(c.str_attr("c"), Some("x\"y"));
    }

    #[test]
    fn object_keys_accept_colon_and_quotes() {
        let blocks = parse("item \"x\" { details = { \"color\": \"red\", weight = 3 } }");
        let details = blocks[0]
            .attr("details")
            .and_then(Value::as_object)
            .expect("details object");
        assert_eq!(details.get("color"), Some(&Value::Str("red".into())));
        assert_eq!(details.get("weight"), Some(&Value::Num(3.0)));
    }

    #[test]
    fn syntax_errors_carry_position() {
        let err = parse_str("item \"x\" {\n  qty = \n}", "bad.bpo").expect_err("missing value");
        match err {
            SourceError::Syntax { line, column, .. } => {
                assert_eq!((line, column), (3, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_attribute_is_rejected() {
        let err = parse_str("item \"x\" { a = 1\n a = 2 }", "dup.bpo").expect_err("duplicate");
        assert!(err.to_string().contains("duplicate attribute `a`"));
    }

    #[test]
    fn nested_blocks_are_rejected() {
        let err = parse_str("item \"x\" { inner \"y\" { } }", "nested.bpo").expect_err("nested");
        assert!(err.to_string().contains("nested blocks"));
    }

    #[test]
    fn unclosed_block_is_reported() {
        let err = parse_str("item \"x\" { a = 1", "open.bpo").expect_err("unclosed");
        assert!(err.to_string().contains("unclosed `item` block"));
    }
}
