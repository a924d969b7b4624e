//! Lexer for Malin source text
//!
//! Single pass with one character of look-ahead. Produces a token list
//! terminated by an `EndOfFile` token; comment tokens are produced but
//! filtered out before the parser sees the stream.

use std::fmt;

/// Every token kind the lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Invalid,
    Comment,
    Number,
    String,
    Identifier,
    Semicolon,
    Colon,
    Comma,
    Dot,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    KeywordLet,
    KeywordIf,
    KeywordWhile,
    KeywordElse,
    KeywordTrue,
    KeywordFalse,
    KeywordFun,
    KeywordExtern,
    KeywordReturn,
    KeywordClass,
    OperatorPlus,
    OperatorMinus,
    OperatorMultiply,
    OperatorDivide,
    OperatorAssign,
    OperatorEquals,
    OperatorNotEquals,
    OperatorGreaterThen,
    OperatorGreaterEqualThen,
    OperatorLessThen,
    OperatorLessEqualThen,
    OperatorLogicOr,
    OperatorLogicAnd,
    OperatorUnaryNot,
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Render a list of token kinds as `[A, B, C]` for "expected one of" messages.
pub fn token_kinds_to_string(kinds: &[TokenKind]) -> String {
    let names: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
    format!("[{}]", names.join(", "))
}

/// A position in the source text: 1-indexed line, column and the absolute
/// byte index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrcLocation {
    pub line: usize,
    pub column: usize,
    pub index: usize,
}

impl SrcLocation {
    pub fn new(line: usize, column: usize, index: usize) -> Self {
        SrcLocation { line, column, index }
    }
}

impl fmt::Display for SrcLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source range: a start location plus an optional end location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrcLocationRange {
    pub start: SrcLocation,
    pub end: Option<SrcLocation>,
}

impl SrcLocationRange {
    pub fn at(start: SrcLocation) -> Self {
        SrcLocationRange { start, end: None }
    }

    pub fn span(start: SrcLocation, end: SrcLocation) -> Self {
        SrcLocationRange {
            start,
            end: Some(end),
        }
    }

    pub fn last_location(&self) -> SrcLocation {
        self.end.unwrap_or(self.start)
    }
}

impl fmt::Display for SrcLocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{} to {}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

/// A token with its matched text and source range.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: SrcLocationRange,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SrcLocationRange) -> Self {
        Token {
            kind,
            text: text.into(),
            location,
        }
    }

    /// Placeholder token used when the parser has to report an error
    /// without a concrete token at hand.
    pub fn invalid() -> Self {
        Token {
            kind: TokenKind::Invalid,
            text: String::new(),
            location: SrcLocationRange::at(SrcLocation::new(0, 0, 0)),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "Token( {} ) at [{}]", self.kind, self.location)
        } else {
            write!(f, "Token( {}, {} ) at [{}]", self.kind, self.text, self.location)
        }
    }
}

/// Raised when the lexer has to read past the end of the file in the middle
/// of a token (unterminated string or block comment).
#[derive(Debug, Clone)]
pub struct LexicalError {
    pub message: String,
    pub location: SrcLocation,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

impl std::error::Error for LexicalError {}

enum SpaceKind {
    NoSpace,
    Space,
    NewLine,
}

fn space_kind(c: u8) -> SpaceKind {
    match c {
        b'\n' => SpaceKind::NewLine,
        b' ' | b'\t' | b'\r' => SpaceKind::Space,
        _ => SpaceKind::NoSpace,
    }
}

fn is_digit_char(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_identifier_start_char(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// The lexer. Consumes a byte buffer, produces tokens.
pub struct Lexer<'s> {
    text: &'s [u8],
    location: SrcLocation,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Lexer {
            text: source.as_bytes(),
            location: SrcLocation::new(1, 1, 0),
        }
    }

    /// Lex the whole input. Comments are dropped, an `EndOfFile` token is
    /// appended at the end.
    pub fn tokens(mut self) -> Result<Vec<Token>, LexicalError> {
        let mut tokens = Vec::new();
        while !self.at_end() {
            let token = self.next_token()?;
            if token.kind == TokenKind::EndOfFile {
                break;
            }
            if token.kind != TokenKind::Comment {
                tokens.push(token);
            }
        }
        tokens.push(Token::new(
            TokenKind::EndOfFile,
            "",
            SrcLocationRange::at(self.location),
        ));
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexicalError> {
        self.skip_spaces();

        if self.at_end() {
            return Ok(Token::new(
                TokenKind::EndOfFile,
                "",
                SrcLocationRange::at(self.location),
            ));
        }

        let c = self.current_char();

        if is_identifier_start_char(c) {
            return self.make_identifier_or_keyword();
        }
        if is_digit_char(c) {
            return self.make_number();
        }
        if c == b'"' {
            return self.make_string();
        }

        match c {
            b'+' => self.make_single_char_token(TokenKind::OperatorPlus),
            b'-' => self.make_single_char_token(TokenKind::OperatorMinus),
            b'*' => self.make_single_char_token(TokenKind::OperatorMultiply),
            b'/' => {
                if self.next_char_is(b'/') {
                    self.make_one_line_comment()
                } else if self.next_char_is(b'*') {
                    self.make_multi_line_comment()
                } else {
                    self.make_single_char_token(TokenKind::OperatorDivide)
                }
            }
            b'=' => {
                if self.next_char_is(b'=') {
                    self.make_double_char_token(TokenKind::OperatorEquals)
                } else {
                    self.make_single_char_token(TokenKind::OperatorAssign)
                }
            }
            b'!' => {
                if self.next_char_is(b'=') {
                    self.make_double_char_token(TokenKind::OperatorNotEquals)
                } else {
                    self.make_single_char_token(TokenKind::OperatorUnaryNot)
                }
            }
            b'>' => {
                if self.next_char_is(b'=') {
                    self.make_double_char_token(TokenKind::OperatorGreaterEqualThen)
                } else {
                    self.make_single_char_token(TokenKind::OperatorGreaterThen)
                }
            }
            b'<' => {
                if self.next_char_is(b'=') {
                    self.make_double_char_token(TokenKind::OperatorLessEqualThen)
                } else {
                    self.make_single_char_token(TokenKind::OperatorLessThen)
                }
            }
            b'|' if self.next_char_is(b'|') => {
                self.make_double_char_token(TokenKind::OperatorLogicOr)
            }
            b'&' if self.next_char_is(b'&') => {
                self.make_double_char_token(TokenKind::OperatorLogicAnd)
            }
            b',' => self.make_single_char_token(TokenKind::Comma),
            b';' => self.make_single_char_token(TokenKind::Semicolon),
            b':' => self.make_single_char_token(TokenKind::Colon),
            b'.' => self.make_single_char_token(TokenKind::Dot),
            b'(' => self.make_single_char_token(TokenKind::LeftParen),
            b')' => self.make_single_char_token(TokenKind::RightParen),
            b'{' => self.make_single_char_token(TokenKind::LeftBrace),
            b'}' => self.make_single_char_token(TokenKind::RightBrace),
            // anything that matches no rule becomes a recoverable Invalid token
            other => {
                let start = self.location;
                self.next_char()?;
                Ok(Token::new(
                    TokenKind::Invalid,
                    (other as char).to_string(),
                    SrcLocationRange::at(start),
                ))
            }
        }
    }

    fn at_end(&self) -> bool {
        self.location.index >= self.text.len()
    }

    fn current_char(&self) -> u8 {
        self.text[self.location.index]
    }

    fn next_char_is(&self, expected: u8) -> bool {
        self.text
            .get(self.location.index + 1)
            .is_some_and(|&c| c == expected)
    }

    fn next_char(&mut self) -> Result<(), LexicalError> {
        if self.at_end() {
            return Err(LexicalError {
                message: format!(
                    "read past end of file (file has {} characters)",
                    self.text.len()
                ),
                location: self.location,
            });
        }
        self.location.index += 1;
        self.location.column += 1;
        Ok(())
    }

    fn advance_over_newline(&mut self) -> Result<(), LexicalError> {
        self.location.line += 1;
        self.location.column = 0;
        self.next_char()
    }

    fn skip_spaces(&mut self) {
        while !self.at_end() {
            match space_kind(self.current_char()) {
                SpaceKind::NewLine => {
                    // advancing from a known in-bounds position can't fail
                    let _ = self.advance_over_newline();
                }
                SpaceKind::Space => {
                    let _ = self.next_char();
                }
                SpaceKind::NoSpace => break,
            }
        }
    }

    /// Advance while `condition` holds, keeping line accounting intact.
    fn skip_chars_while(
        &mut self,
        condition: impl Fn(&Self) -> bool,
    ) -> Result<(), LexicalError> {
        while !self.at_end() && condition(self) {
            if matches!(space_kind(self.current_char()), SpaceKind::NewLine) {
                self.advance_over_newline()?;
            } else {
                self.next_char()?;
            }
        }
        Ok(())
    }

    fn sub_text(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.text[start..end]).into_owned()
    }

    fn make_single_char_token(&mut self, kind: TokenKind) -> Result<Token, LexicalError> {
        let start = self.location;
        self.next_char()?;
        Ok(Token::new(kind, "", SrcLocationRange::at(start)))
    }

    fn make_double_char_token(&mut self, kind: TokenKind) -> Result<Token, LexicalError> {
        let start = self.location;
        self.next_char()?;
        self.next_char()?;
        Ok(Token::new(kind, "", SrcLocationRange::span(start, self.location)))
    }

    fn make_identifier_or_keyword(&mut self) -> Result<Token, LexicalError> {
        let start = self.location;
        self.skip_chars_while(|l| is_identifier_char(l.current_char()))?;
        let end = self.location;
        let text = self.sub_text(start.index, end.index);

        let kind = match text.as_str() {
            "let" => TokenKind::KeywordLet,
            "if" => TokenKind::KeywordIf,
            "while" => TokenKind::KeywordWhile,
            "else" => TokenKind::KeywordElse,
            "true" => TokenKind::KeywordTrue,
            "false" => TokenKind::KeywordFalse,
            "fun" => TokenKind::KeywordFun,
            "extern" => TokenKind::KeywordExtern,
            "return" => TokenKind::KeywordReturn,
            "class" => TokenKind::KeywordClass,
            _ => TokenKind::Identifier,
        };

        let text = if kind == TokenKind::Identifier { text } else { String::new() };
        Ok(Token::new(kind, text, SrcLocationRange::span(start, end)))
    }

    fn make_number(&mut self) -> Result<Token, LexicalError> {
        let start = self.location;
        self.skip_chars_while(|l| is_digit_char(l.current_char()))?;

        // optional fraction part
        if !self.at_end() && self.current_char() == b'.' && self.text.get(self.location.index + 1).is_some_and(|&c| is_digit_char(c)) {
            self.next_char()?;
            self.skip_chars_while(|l| is_digit_char(l.current_char()))?;
        }

        let end = self.location;
        Ok(Token::new(
            TokenKind::Number,
            self.sub_text(start.index, end.index),
            SrcLocationRange::span(start, end),
        ))
    }

    /// Lex `"asdf"`, skipping both quotes. The token text is the inner
    /// contents; there are no escape sequences.
    fn make_string(&mut self) -> Result<Token, LexicalError> {
        let start = self.location;

        // initial "
        self.next_char()?;
        let text_start = self.location;

        self.skip_chars_while(|l| l.current_char() != b'"')?;
        let text_end = self.location;

        if self.at_end() {
            return Err(LexicalError {
                message: "unterminated string literal, missing closing '\"'".to_string(),
                location: start,
            });
        }

        // closing "
        self.next_char()?;
        let end = self.location;

        Ok(Token::new(
            TokenKind::String,
            self.sub_text(text_start.index, text_end.index),
            SrcLocationRange::span(start, end),
        ))
    }

    fn make_one_line_comment(&mut self) -> Result<Token, LexicalError> {
        let start = self.location;

        // both '/'
        self.next_char()?;
        self.next_char()?;
        let text_start = self.location;

        self.skip_chars_while(|l| !matches!(space_kind(l.current_char()), SpaceKind::NewLine))?;
        let end = self.location;

        Ok(Token::new(
            TokenKind::Comment,
            self.sub_text(text_start.index, end.index),
            SrcLocationRange::span(start, end),
        ))
    }

    fn make_multi_line_comment(&mut self) -> Result<Token, LexicalError> {
        let start = self.location;

        // '/*'
        self.next_char()?;
        self.next_char()?;
        let text_start = self.location;

        self.skip_chars_while(|l| {
            !(l.current_char() == b'*' && l.next_char_is(b'/'))
        })?;
        let text_end = self.location;

        if self.at_end() {
            return Err(LexicalError {
                message: "unterminated block comment, missing closing '*/'".to_string(),
                location: start,
            });
        }

        // '*/'
        self.next_char()?;
        self.next_char()?;
        let end = self.location;

        Ok(Token::new(
            TokenKind::Comment,
            self.sub_text(text_start.index, text_end.index),
            SrcLocationRange::span(start, end),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokens().expect("lexing failed")
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input_yields_eof() {
        let tokens = lex("");
        assert_eq!(kinds(&tokens), vec![TokenKind::EndOfFile]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = lex("let foo fun extern return if else while true false class bar_2");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::KeywordLet,
                TokenKind::Identifier,
                TokenKind::KeywordFun,
                TokenKind::KeywordExtern,
                TokenKind::KeywordReturn,
                TokenKind::KeywordIf,
                TokenKind::KeywordElse,
                TokenKind::KeywordWhile,
                TokenKind::KeywordTrue,
                TokenKind::KeywordFalse,
                TokenKind::KeywordClass,
                TokenKind::Identifier,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[1].text, "foo");
        assert_eq!(tokens[11].text, "bar_2");
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 3.25 0");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].text, "3.25");
        assert_eq!(tokens[2].text, "0");
    }

    #[test]
    fn test_member_access_is_not_a_fraction() {
        // a dot not followed by a digit ends the number
        let tokens = lex("point.x");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = lex("+ - * / = == != > >= < <= || && !");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::OperatorPlus,
                TokenKind::OperatorMinus,
                TokenKind::OperatorMultiply,
                TokenKind::OperatorDivide,
                TokenKind::OperatorAssign,
                TokenKind::OperatorEquals,
                TokenKind::OperatorNotEquals,
                TokenKind::OperatorGreaterThen,
                TokenKind::OperatorGreaterEqualThen,
                TokenKind::OperatorLessThen,
                TokenKind::OperatorLessEqualThen,
                TokenKind::OperatorLogicOr,
                TokenKind::OperatorLogicAnd,
                TokenKind::OperatorUnaryNot,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        let tokens = lex("; : , . ( ) { }");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        let tokens = lex("\"hello world\"");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "hello world");
    }

    #[test]
    fn test_unterminated_string_fails() {
        let result = Lexer::new("\"no end").tokens();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn test_comments_are_filtered() {
        let tokens = lex("1 // line comment\n2 /* block\ncomment */ 3");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_fails() {
        let result = Lexer::new("/* never closed").tokens();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_character_is_recoverable() {
        let tokens = lex("1 ? 2");
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
        assert_eq!(tokens[1].text, "?");
        assert_eq!(tokens[2].kind, TokenKind::Number);
    }

    #[test]
    fn test_lone_pipe_and_ampersand_are_invalid() {
        let tokens = lex("| &");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let tokens = lex("a\n  b");
        assert_eq!(tokens[0].location.start.line, 1);
        assert_eq!(tokens[0].location.start.column, 1);
        assert_eq!(tokens[1].location.start.line, 2);
        assert_eq!(tokens[1].location.start.column, 3);
    }

    #[test]
    fn test_source_span_round_trip() {
        // for every identifier/number token, source[range] == token text;
        // for strings the range additionally covers the quotes
        let source = "let abc = 42;\nlet s = \"str value\";\nabc.xy";
        let tokens = lex(source);
        for token in &tokens {
            let start = token.location.start.index;
            let end = token.location.last_location().index;
            match token.kind {
                TokenKind::Identifier | TokenKind::Number => {
                    assert_eq!(&source[start..end], token.text, "span mismatch for {}", token);
                }
                TokenKind::String => {
                    assert_eq!(&source[start..end], format!("\"{}\"", token.text));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_token_display() {
        let tokens = lex("abc");
        let shown = tokens[0].to_string();
        assert!(shown.contains("Identifier"));
        assert!(shown.contains("abc"));
        assert!(shown.contains("1:1"));
    }
}
