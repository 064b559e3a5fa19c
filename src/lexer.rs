use std::fmt;
use std::str::Chars;

use num_bigint::BigInt;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    // Identifiers and keywords
    Identifier(String),
    /// An identifier spelled with `\u` escapes. Never acts as a keyword.
    IdentifierWithEscape(String),
    Keyword(Keyword),
    PrivateName(String),

    // Literals
    NumericLiteral(f64),
    /// `017`
    LegacyOctalLiteral(f64),
    /// `08`, `09.5`
    NonOctalDecimalLiteral(f64),
    /// Decimal digits of the value.
    BigIntLiteral(String),
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    RegExpLiteral { pattern: String, flags: String },

    // Template literals: (cooked, raw). cooked is None for invalid escapes.
    NoSubstitutionTemplate(Option<String>, String),
    TemplateHead(Option<String>, String),
    TemplateMiddle(Option<String>, String),
    TemplateTail(Option<String>, String),

    // Punctuators; spellings in `punctuator_text`
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    Ellipsis,
    Semicolon,
    Comma,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Plus,
    Minus,
    Star,
    Percent,
    Exponent,
    Increment,
    Decrement,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    Ampersand,
    Pipe,
    Caret,
    Bang,
    Tilde,
    LogicalAnd,
    LogicalOr,
    NullishCoalescing,
    Question,
    OptionalChain,
    Colon,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    PercentAssign,
    ExponentAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
    AmpersandAssign,
    PipeAssign,
    CaretAssign,
    LogicalAndAssign,
    LogicalOrAssign,
    NullishAssign,
    Arrow,
    Slash,
    SlashAssign,

    // Special
    LineTerminator,
    Eof,
}

impl Token {
    /// Identifier-like spelling of the token, for positions that accept any
    /// IdentifierName (property keys, export names, meta properties).
    pub fn identifier_name(&self) -> Option<String> {
        match self {
            Token::Identifier(name) | Token::IdentifierWithEscape(name) => Some(name.clone()),
            Token::Keyword(kw) => Some(kw.to_string()),
            Token::BooleanLiteral(true) => Some("true".to_string()),
            Token::BooleanLiteral(false) => Some("false".to_string()),
            Token::NullLiteral => Some("null".to_string()),
            _ => None,
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(self, Token::Identifier(n) if n == name)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) | Token::IdentifierWithEscape(name) => write!(f, "{name}"),
            Token::Keyword(kw) => write!(f, "{kw}"),
            Token::PrivateName(name) => write!(f, "#{name}"),
            Token::NumericLiteral(_)
            | Token::LegacyOctalLiteral(_)
            | Token::NonOctalDecimalLiteral(_)
            | Token::BigIntLiteral(_) => write!(f, "number"),
            Token::StringLiteral(_) => write!(f, "string"),
            Token::BooleanLiteral(b) => write!(f, "{b}"),
            Token::NullLiteral => write!(f, "null"),
            Token::RegExpLiteral { .. } => write!(f, "regular expression"),
            Token::NoSubstitutionTemplate(..)
            | Token::TemplateHead(..)
            | Token::TemplateMiddle(..)
            | Token::TemplateTail(..) => write!(f, "template"),
            Token::LineTerminator => write!(f, "line terminator"),
            Token::Eof => write!(f, "end of input"),
            punct => write!(f, "{}", punctuator_text(punct)),
        }
    }
}

fn punctuator_text(token: &Token) -> &'static str {
    match token {
        Token::LeftBrace => "{",
        Token::RightBrace => "}",
        Token::LeftParen => "(",
        Token::RightParen => ")",
        Token::LeftBracket => "[",
        Token::RightBracket => "]",
        Token::Dot => ".",
        Token::Ellipsis => "...",
        Token::Semicolon => ";",
        Token::Comma => ",",
        Token::LessThan => "<",
        Token::GreaterThan => ">",
        Token::LessThanEqual => "<=",
        Token::GreaterThanEqual => ">=",
        Token::Equal => "==",
        Token::NotEqual => "!=",
        Token::StrictEqual => "===",
        Token::StrictNotEqual => "!==",
        Token::Plus => "+",
        Token::Minus => "-",
        Token::Star => "*",
        Token::Percent => "%",
        Token::Exponent => "**",
        Token::Increment => "++",
        Token::Decrement => "--",
        Token::LeftShift => "<<",
        Token::RightShift => ">>",
        Token::UnsignedRightShift => ">>>",
        Token::Ampersand => "&",
        Token::Pipe => "|",
        Token::Caret => "^",
        Token::Bang => "!",
        Token::Tilde => "~",
        Token::LogicalAnd => "&&",
        Token::LogicalOr => "||",
        Token::NullishCoalescing => "??",
        Token::Question => "?",
        Token::OptionalChain => "?.",
        Token::Colon => ":",
        Token::Assign => "=",
        Token::PlusAssign => "+=",
        Token::MinusAssign => "-=",
        Token::StarAssign => "*=",
        Token::PercentAssign => "%=",
        Token::ExponentAssign => "**=",
        Token::LeftShiftAssign => "<<=",
        Token::RightShiftAssign => ">>=",
        Token::UnsignedRightShiftAssign => ">>>=",
        Token::AmpersandAssign => "&=",
        Token::PipeAssign => "|=",
        Token::CaretAssign => "^=",
        Token::LogicalAndAssign => "&&=",
        Token::LogicalOrAssign => "||=",
        Token::NullishAssign => "??=",
        Token::Arrow => "=>",
        Token::Slash => "/",
        Token::SlashAssign => "/=",
        _ => "token",
    }
}

macro_rules! keywords {
    ($($variant:ident => $text:literal,)*) => {
        /// Reserved words. Contextual words (`let`, `static`, `yield`, `await`,
        /// `async`, `of`, `get`, `set`, ...) lex as [`Token::Identifier`].
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            pub fn from_str(s: &str) -> Option<Keyword> {
                match s {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    Break => "break",
    Case => "case",
    Catch => "catch",
    Class => "class",
    Const => "const",
    Continue => "continue",
    Debugger => "debugger",
    Default => "default",
    Delete => "delete",
    Do => "do",
    Else => "else",
    Enum => "enum",
    Export => "export",
    Extends => "extends",
    Finally => "finally",
    For => "for",
    Function => "function",
    If => "if",
    Import => "import",
    In => "in",
    Instanceof => "instanceof",
    New => "new",
    Return => "return",
    Super => "super",
    Switch => "switch",
    This => "this",
    Throw => "throw",
    Try => "try",
    Typeof => "typeof",
    Var => "var",
    Void => "void",
    While => "while",
    With => "with",
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} ({line}:{column})")]
pub struct LexError {
    pub message: String,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

enum TemplateEnd {
    Backtick,
    Substitution,
}

struct TemplateChunk {
    cooked: Option<String>,
    raw: String,
    closer: TemplateEnd,
}

/// Source cursor. Cloning a lexer is a snapshot: the parser clones it to
/// look ahead and restores it to undo.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    current: Option<char>,
    offset: usize,
    line: u32,
    column: u32,
    token_start: usize,
    token_line: u32,
    token_column: u32,
    at_line_start: bool,
    html_comments: bool,
    legacy_escape: Option<usize>,
    lone_surrogate: Option<usize>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            current,
            offset: 0,
            line: 1,
            column: 0,
            token_start: 0,
            token_line: 1,
            token_column: 0,
            at_line_start: true,
            html_comments: false,
            legacy_escape: None,
            lone_surrogate: None,
        }
    }

    /// Recognize `<!--` and `-->` comments (script goal, web compatibility).
    pub fn set_html_comments(&mut self, enabled: bool) {
        self.html_comments = enabled;
    }

    pub fn token_start(&self) -> usize {
        self.token_start
    }

    pub fn token_start_position(&self) -> (u32, u32) {
        (self.token_line, self.token_column)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    /// Offset of the first legacy octal or `\8`/`\9` escape in the last
    /// string literal.
    pub fn legacy_escape(&self) -> Option<usize> {
        self.legacy_escape
    }

    /// Offset of the first `\u` escape in the last string that decoded to an
    /// unpaired surrogate.
    pub fn lone_surrogate(&self) -> Option<usize> {
        self.lone_surrogate
    }

    pub fn seek(&mut self, offset: usize, line: u32, column: u32) {
        self.chars = self.source[offset..].chars();
        self.current = self.chars.next();
        self.offset = offset;
        self.line = line;
        self.column = column;
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current;
        if let Some(c) = ch {
            self.offset += c.len_utf8();
            self.column += 1;
            self.current = self.chars.next();
        }
        ch
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn begin_token(&mut self) {
        self.token_start = self.offset;
        self.token_line = self.line;
        self.token_column = self.column;
        self.legacy_escape = None;
        self.lone_surrogate = None;
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn error_at_token(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            offset: self.token_start,
            line: self.token_line,
            column: self.token_column,
        }
    }

    pub fn is_line_terminator(ch: char) -> bool {
        matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
    }

    fn is_whitespace(ch: char) -> bool {
        matches!(
            ch,
            '\t' | '\u{000B}'
                | '\u{000C}'
                | ' '
                | '\u{00A0}'
                | '\u{FEFF}'
                | '\u{1680}'
                | '\u{2000}'..='\u{200A}'
                | '\u{202F}'
                | '\u{205F}'
                | '\u{3000}'
        )
    }

    pub fn is_identifier_start(ch: char) -> bool {
        ch == '_' || ch == '$' || ch.is_ascii_alphabetic() || unicode_id_start(ch)
    }

    pub fn is_identifier_continue(ch: char) -> bool {
        ch == '_'
            || ch == '$'
            || ch.is_ascii_alphanumeric()
            || ch == '\u{200C}'
            || ch == '\u{200D}'
            || unicode_id_continue(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(Self::is_whitespace) {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while self.peek().is_some_and(|ch| !Self::is_line_terminator(ch)) {
            self.advance();
        }
    }

    /// Skips past the closing `*/`. Returns whether the comment spanned a line.
    fn skip_block_comment(&mut self) -> Result<bool, LexError> {
        let mut crossed_line = false;
        while let Some(ch) = self.advance() {
            if ch == '*' && self.peek() == Some('/') {
                self.advance();
                return Ok(crossed_line);
            }
            if Self::is_line_terminator(ch) {
                crossed_line = true;
                self.handle_newline(ch);
            }
        }
        Err(self.error_at_token("Unterminated comment"))
    }

    /// Consumes the comment starting at `ch`, if any. `Some(true)` means the
    /// comment contained a line terminator.
    fn skip_comment(&mut self, ch: char) -> Result<Option<bool>, LexError> {
        let rest = self.rest();
        let hashbang = ch == '#' && self.offset == 0 && rest.starts_with("#!");
        let html = self.html_comments
            && (rest.starts_with("<!--") || (self.at_line_start && rest.starts_with("-->")));
        if hashbang || html || rest.starts_with("//") {
            self.skip_line_comment();
            return Ok(Some(false));
        }
        if rest.starts_with("/*") {
            self.advance();
            self.advance();
            return self.skip_block_comment().map(Some);
        }
        Ok(None)
    }

    fn handle_newline(&mut self, ch: char) {
        if ch == '\r' && self.peek() == Some('\n') {
            self.advance();
        }
        self.line += 1;
        self.column = 0;
        self.at_line_start = true;
    }

    fn read_string(&mut self, quote: char) -> Result<Token, LexError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None | Some('\n' | '\r') => {
                    return Err(self.error_at_token("Unterminated string constant"));
                }
                Some(ch) if ch == quote => return Ok(Token::StringLiteral(s)),
                Some('\\') => {
                    let at = self.offset - 1;
                    if self.read_escape(&mut s, false)? && self.legacy_escape.is_none() {
                        self.legacy_escape = Some(at);
                    }
                }
                Some(ch) => s.push(ch),
            }
        }
    }

    /// Decodes one escape after the backslash into `out`. Returns whether
    /// it was a legacy octal or `\8`/`\9` escape. Template mode rejects those.
    fn read_escape(&mut self, out: &mut String, in_template: bool) -> Result<bool, LexError> {
        match self.advance() {
            None => Err(self.error("Unterminated escape sequence")),
            Some('n') => {
                out.push('\n');
                Ok(false)
            }
            Some('r') => {
                out.push('\r');
                Ok(false)
            }
            Some('t') => {
                out.push('\t');
                Ok(false)
            }
            Some('b') => {
                out.push('\u{0008}');
                Ok(false)
            }
            Some('f') => {
                out.push('\u{000C}');
                Ok(false)
            }
            Some('v') => {
                out.push('\u{000B}');
                Ok(false)
            }
            Some('0') if !self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                out.push('\0');
                Ok(false)
            }
            Some(ch @ '0'..='7') => {
                if in_template {
                    return Err(self.error("Octal escape sequences are not allowed in template strings"));
                }
                let mut val = ch.to_digit(8).unwrap_or(0);
                let max_len = if ch <= '3' { 3 } else { 2 };
                for _ in 1..max_len {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            val = val * 8 + d;
                            self.advance();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(val).unwrap_or('\u{FFFD}'));
                Ok(true)
            }
            Some(ch @ ('8' | '9')) => {
                if in_template {
                    return Err(self.error("\\8 and \\9 are not allowed in template strings"));
                }
                out.push(ch);
                Ok(true)
            }
            Some('x') => {
                let mut val = 0;
                for _ in 0..2 {
                    let d = self
                        .peek()
                        .and_then(hex_val)
                        .ok_or_else(|| self.error("Bad character escape sequence"))?;
                    val = val * 16 + d;
                    self.advance();
                }
                out.push(char::from_u32(val).unwrap_or('\u{FFFD}'));
                Ok(false)
            }
            Some('u') => {
                let at = self.offset - 2;
                let code = self.read_unicode_escape_value()?;
                let ch = self.combine_surrogates(code);
                if ch == '\u{FFFD}' && (0xD800..=0xDFFF).contains(&code) {
                    self.lone_surrogate.get_or_insert(at);
                }
                out.push(ch);
                Ok(false)
            }
            Some(ch) if Self::is_line_terminator(ch) => {
                self.handle_newline(ch);
                Ok(false)
            }
            Some(ch) => {
                out.push(ch);
                Ok(false)
            }
        }
    }

    /// Pairs a high surrogate with a following `\uXXXX` low surrogate. Lone
    /// surrogates decode to U+FFFD.
    fn combine_surrogates(&mut self, code: u32) -> char {
        if (0xD800..=0xDBFF).contains(&code) && self.rest().starts_with("\\u") {
            let snapshot = self.clone();
            self.advance();
            self.advance();
            if let Ok(low) = self.read_unicode_escape_value() {
                if (0xDC00..=0xDFFF).contains(&low) {
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined).unwrap_or('\u{FFFD}');
                }
            }
            *self = snapshot;
        }
        char::from_u32(code).unwrap_or('\u{FFFD}')
    }

    /// Reads the part of a `\u` escape after the `u`.
    fn read_unicode_escape_value(&mut self) -> Result<u32, LexError> {
        if self.peek() == Some('{') {
            self.advance();
            let mut val: u32 = 0;
            let mut digits = 0;
            loop {
                match self.peek() {
                    Some('}') if digits > 0 => {
                        self.advance();
                        return Ok(val);
                    }
                    Some(ch) => {
                        let d = hex_val(ch).ok_or_else(|| self.error("Bad character escape sequence"))?;
                        val = val * 16 + d;
                        if val > 0x10FFFF {
                            return Err(self.error("Code point out of bounds"));
                        }
                        digits += 1;
                        self.advance();
                    }
                    None => return Err(self.error("Bad character escape sequence")),
                }
            }
        } else {
            let mut val: u32 = 0;
            for _ in 0..4 {
                let d = self
                    .peek()
                    .and_then(hex_val)
                    .ok_or_else(|| self.error("Bad character escape sequence"))?;
                val = val * 16 + d;
                self.advance();
            }
            Ok(val)
        }
    }

    fn read_numeric_literal(&mut self, first: char) -> Result<Token, LexError> {
        let token = if first == '.' {
            let mut s = String::from("0.");
            self.read_digits(10, &mut s, true, false)?;
            self.read_exponent(&mut s)?;
            Token::NumericLiteral(self.parse_decimal(&s)?)
        } else if first == '0' {
            match self.peek() {
                Some('x' | 'X') => self.read_radix_literal(16)?,
                Some('o' | 'O') => self.read_radix_literal(8)?,
                Some('b' | 'B') => self.read_radix_literal(2)?,
                Some('_') => {
                    return Err(self.error("Numeric separator can not be used after leading 0"));
                }
                Some(c) if c.is_ascii_digit() => self.read_legacy_octal_or_decimal()?,
                _ => self.read_decimal_rest(String::from("0"))?,
            }
        } else {
            self.read_decimal_rest(first.to_string())?
        };

        if self
            .peek()
            .is_some_and(|c| Self::is_identifier_start(c) || c.is_ascii_digit() || c == '\\')
        {
            return Err(self.error("Identifier directly after number"));
        }
        Ok(token)
    }

    fn read_decimal_rest(&mut self, mut s: String) -> Result<Token, LexError> {
        self.read_digits(10, &mut s, true, true)?;
        let mut is_integer = true;
        if self.peek() == Some('.') {
            is_integer = false;
            s.push('.');
            self.advance();
            self.read_digits(10, &mut s, true, false)?;
        }
        if self.read_exponent(&mut s)? {
            is_integer = false;
        }
        if self.peek() == Some('n') {
            if !is_integer {
                return Err(self.error("Invalid BigInt syntax"));
            }
            self.advance();
            return Ok(Token::BigIntLiteral(bigint_decimal(&s, 10)));
        }
        Ok(Token::NumericLiteral(self.parse_decimal(&s)?))
    }

    fn read_exponent(&mut self, s: &mut String) -> Result<bool, LexError> {
        if !self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            return Ok(false);
        }
        s.push('e');
        self.advance();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            s.push(sign);
            self.advance();
        }
        if self.read_digits(10, s, true, false)? == 0 {
            return Err(self.error("Invalid number"));
        }
        Ok(true)
    }

    fn parse_decimal(&self, s: &str) -> Result<f64, LexError> {
        s.parse().map_err(|_| self.error_at_token("Invalid number"))
    }

    /// Reads digits of `radix` into `s`, dropping numeric separators.
    /// `after_digit` is whether a digit directly precedes the cursor.
    fn read_digits(
        &mut self,
        radix: u32,
        s: &mut String,
        allow_separators: bool,
        after_digit: bool,
    ) -> Result<usize, LexError> {
        let mut count = 0;
        let mut prev_digit = after_digit;
        let mut last_separator = false;
        while let Some(ch) = self.peek() {
            if ch == '_' && allow_separators {
                if !prev_digit {
                    return Err(self.error("Numeric separators are not allowed here"));
                }
                prev_digit = false;
                last_separator = true;
                self.advance();
                continue;
            }
            if !ch.is_digit(radix) {
                break;
            }
            s.push(ch);
            self.advance();
            count += 1;
            prev_digit = true;
            last_separator = false;
        }
        if last_separator {
            return Err(self.error("Numeric separator is not allowed at the end of numeric literals"));
        }
        Ok(count)
    }

    fn read_radix_literal(&mut self, radix: u32) -> Result<Token, LexError> {
        self.advance(); // x/o/b
        let mut digits = String::new();
        if self.read_digits(radix, &mut digits, true, false)? == 0 {
            return Err(self.error(format!("Expected number in radix {radix}")));
        }
        if self.peek() == Some('n') {
            self.advance();
            return Ok(Token::BigIntLiteral(bigint_decimal(&digits, radix)));
        }
        let val = digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0f64, |acc, d| acc * radix as f64 + d as f64);
        Ok(Token::NumericLiteral(val))
    }

    fn read_legacy_octal_or_decimal(&mut self) -> Result<Token, LexError> {
        let mut s = String::from("0");
        let mut is_octal = true;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                if ch >= '8' {
                    is_octal = false;
                }
                s.push(ch);
                self.advance();
            } else if ch == '_' {
                return Err(self.error("Numeric separator can not be used after leading 0"));
            } else {
                break;
            }
        }
        if self.peek() == Some('n') {
            return Err(self.error("Invalid BigInt syntax"));
        }
        if is_octal {
            let val = s[1..]
                .chars()
                .filter_map(|c| c.to_digit(8))
                .fold(0f64, |acc, d| acc * 8.0 + d as f64);
            return Ok(Token::LegacyOctalLiteral(val));
        }
        if self.peek() == Some('.') {
            s.push('.');
            self.advance();
            self.read_digits(10, &mut s, true, false)?;
        }
        self.read_exponent(&mut s)?;
        if self.peek() == Some('n') {
            return Err(self.error("Invalid BigInt syntax"));
        }
        Ok(Token::NonOctalDecimalLiteral(self.parse_decimal(&s)?))
    }

    fn read_identifier_name(&mut self) -> Result<(String, bool), LexError> {
        let mut name = String::new();
        let mut escaped = false;
        while let Some(ch) = self.peek() {
            let first = name.is_empty();
            if ch == '\\' {
                let at = self.error("Invalid Unicode escape");
                self.advance();
                if self.advance() != Some('u') {
                    return Err(self.error("Expecting Unicode escape sequence \\uXXXX"));
                }
                let code = self.read_unicode_escape_value()?;
                let decoded = char::from_u32(code).filter(|&c| {
                    if first {
                        Self::is_identifier_start(c)
                    } else {
                        Self::is_identifier_continue(c)
                    }
                });
                match decoded {
                    Some(c) => name.push(c),
                    None => return Err(at),
                }
                escaped = true;
            } else if (first && Self::is_identifier_start(ch))
                || (!first && Self::is_identifier_continue(ch))
            {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Ok((name, escaped))
    }

    fn read_identifier(&mut self) -> Result<Token, LexError> {
        let (name, escaped) = self.read_identifier_name()?;
        if escaped {
            return Ok(Token::IdentifierWithEscape(name));
        }
        Ok(match name.as_str() {
            "true" => Token::BooleanLiteral(true),
            "false" => Token::BooleanLiteral(false),
            "null" => Token::NullLiteral,
            _ => match Keyword::from_str(&name) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Identifier(name),
            },
        })
    }

    fn read_private_name(&mut self) -> Result<Token, LexError> {
        self.advance(); // #
        match self.peek() {
            Some(ch) if ch == '\\' || Self::is_identifier_start(ch) => {
                let (name, _) = self.read_identifier_name()?;
                Ok(Token::PrivateName(name))
            }
            _ => Err(self.error("Unexpected character '#'")),
        }
    }

    /// Re-reads the token at `start` (a `/` or `/=`) as a regular expression.
    pub fn rescan_regex(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        self.seek(start, line, column);
        self.begin_token();
        self.advance(); // opening /
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.advance() {
                None => return Err(self.error_at_token("Unterminated regular expression")),
                Some(ch) if Self::is_line_terminator(ch) => {
                    return Err(self.error_at_token("Unterminated regular expression"));
                }
                Some('/') if !in_class => break,
                Some('\\') => {
                    pattern.push('\\');
                    match self.advance() {
                        Some(ch) if !Self::is_line_terminator(ch) => pattern.push(ch),
                        _ => return Err(self.error_at_token("Unterminated regular expression")),
                    }
                }
                Some(ch) => {
                    match ch {
                        '[' => in_class = true,
                        ']' => in_class = false,
                        _ => {}
                    }
                    pattern.push(ch);
                }
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                return Err(self.error("Invalid regular expression flags"));
            }
            if !Self::is_identifier_continue(c) {
                break;
            }
            if !"dgimsuyv".contains(c) || flags.contains(c) {
                return Err(self.error("Invalid regular expression flag"));
            }
            flags.push(c);
            self.advance();
        }
        if flags.contains('u') && flags.contains('v') {
            return Err(self.error_at_token("Invalid regular expression flag"));
        }
        self.at_line_start = false;
        Ok(Token::RegExpLiteral { pattern, flags })
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace();
            self.begin_token();
            let Some(ch) = self.peek() else {
                return Ok(Token::Eof);
            };
            if Self::is_line_terminator(ch) {
                self.advance();
                self.handle_newline(ch);
                return Ok(Token::LineTerminator);
            }
            match self.skip_comment(ch)? {
                Some(true) => return Ok(Token::LineTerminator),
                Some(false) => continue,
                None => {}
            }

            self.at_line_start = false;
            if ch == '\\' || Self::is_identifier_start(ch) {
                return self.read_identifier();
            }
            if ch == '#' {
                return self.read_private_name();
            }
            self.advance();
            return match ch {
                '\'' | '"' => self.read_string(ch),
                '`' => self.read_template_literal(),
                '0'..='9' => self.read_numeric_literal(ch),
                '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_numeric_literal(ch),
                _ => self.read_punctuator(ch),
            };
        }
    }

    /// Scans template characters up to the closing backtick or the next `${`.
    /// A malformed escape leaves `cooked` as `None`; whether that is an error
    /// depends on whether the template is tagged.
    fn scan_template_chunk(&mut self) -> Result<TemplateChunk, LexError> {
        let start = self.offset;
        let mut cooked = Some(String::new());
        let (end, closer) = loop {
            let before = self.offset;
            let Some(ch) = self.advance() else {
                return Err(self.error_at_token("Unterminated template"));
            };
            match ch {
                '`' => break (before, TemplateEnd::Backtick),
                '$' if self.peek() == Some('{') => {
                    self.advance();
                    break (before, TemplateEnd::Substitution);
                }
                '\\' => {
                    let mut escaped = String::new();
                    if self.read_escape(&mut escaped, true).is_err() {
                        cooked = None;
                    } else if let Some(text) = cooked.as_mut() {
                        text.push_str(&escaped);
                    }
                }
                _ => {
                    if Self::is_line_terminator(ch) {
                        self.handle_newline(ch);
                    }
                    if let Some(text) = cooked.as_mut() {
                        text.push(if ch == '\r' { '\n' } else { ch });
                    }
                }
            }
        };
        Ok(TemplateChunk {
            cooked,
            raw: normalize_raw(&self.source[start..end]),
            closer,
        })
    }

    fn read_template_literal(&mut self) -> Result<Token, LexError> {
        let TemplateChunk { cooked, raw, closer } = self.scan_template_chunk()?;
        Ok(match closer {
            TemplateEnd::Backtick => Token::NoSubstitutionTemplate(cooked, raw),
            TemplateEnd::Substitution => Token::TemplateHead(cooked, raw),
        })
    }

    /// Continues a template after the `}` closing a substitution. The cursor
    /// must sit directly after that `}`.
    pub fn read_template_continuation(&mut self) -> Result<Token, LexError> {
        self.token_start = self.offset.saturating_sub(1);
        self.token_line = self.line;
        self.token_column = self.column.saturating_sub(1);
        let TemplateChunk { cooked, raw, closer } = self.scan_template_chunk()?;
        Ok(match closer {
            TemplateEnd::Backtick => Token::TemplateTail(cooked, raw),
            TemplateEnd::Substitution => Token::TemplateMiddle(cooked, raw),
        })
    }

    fn read_punctuator(&mut self, ch: char) -> Result<Token, LexError> {
        let token = match ch {
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            '~' => Token::Tilde,
            ':' => Token::Colon,
            '.' if self.rest().starts_with("..") => {
                self.advance();
                self.advance();
                Token::Ellipsis
            }
            '.' => Token::Dot,
            '?' if self.eat('?') => self.with_assign(Token::NullishCoalescing, Token::NullishAssign),
            // `a?.5:b` is a conditional, not an optional chain.
            '?' if self.peek() == Some('.') && !self.peek_next().is_some_and(|c| c.is_ascii_digit()) => {
                self.advance();
                Token::OptionalChain
            }
            '?' => Token::Question,
            '<' => self.compound('<', Token::LessThan, Token::LessThanEqual, Token::LeftShift, Token::LeftShiftAssign),
            '>' if self.eat('>') => {
                if self.eat('>') {
                    self.with_assign(Token::UnsignedRightShift, Token::UnsignedRightShiftAssign)
                } else {
                    self.with_assign(Token::RightShift, Token::RightShiftAssign)
                }
            }
            '>' => self.with_assign(Token::GreaterThan, Token::GreaterThanEqual),
            '=' if self.eat('>') => Token::Arrow,
            '=' if self.eat('=') => self.with_assign(Token::Equal, Token::StrictEqual),
            '=' => Token::Assign,
            '!' if self.eat('=') => self.with_assign(Token::NotEqual, Token::StrictNotEqual),
            '!' => Token::Bang,
            '+' if self.eat('+') => Token::Increment,
            '+' => self.with_assign(Token::Plus, Token::PlusAssign),
            '-' if self.eat('-') => Token::Decrement,
            '-' => self.with_assign(Token::Minus, Token::MinusAssign),
            '*' => self.compound('*', Token::Star, Token::StarAssign, Token::Exponent, Token::ExponentAssign),
            '&' => self.compound('&', Token::Ampersand, Token::AmpersandAssign, Token::LogicalAnd, Token::LogicalAndAssign),
            '|' => self.compound('|', Token::Pipe, Token::PipeAssign, Token::LogicalOr, Token::LogicalOrAssign),
            '/' => self.with_assign(Token::Slash, Token::SlashAssign),
            '%' => self.with_assign(Token::Percent, Token::PercentAssign),
            '^' => self.with_assign(Token::Caret, Token::CaretAssign),
            _ => return Err(self.error_at_token(format!("Unexpected character '{ch}'"))),
        };
        Ok(token)
    }

    fn eat(&mut self, expected: char) -> bool {
        let matched = self.peek() == Some(expected);
        if matched {
            self.advance();
        }
        matched
    }

    /// `x`, `x=`
    fn with_assign(&mut self, plain: Token, assign: Token) -> Token {
        if self.eat('=') { assign } else { plain }
    }

    /// `x`, `x=`, `xx`, `xx=`
    fn compound(&mut self, ch: char, single: Token, single_assign: Token, double: Token, double_assign: Token) -> Token {
        if self.eat(ch) {
            self.with_assign(double, double_assign)
        } else {
            self.with_assign(single, single_assign)
        }
    }

    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

fn hex_val(ch: char) -> Option<u32> {
    ch.to_digit(16)
}

fn bigint_decimal(digits: &str, radix: u32) -> String {
    BigInt::parse_bytes(digits.as_bytes(), radix)
        .map(|value| value.to_string())
        .unwrap_or_else(|| digits.to_string())
}

/// Template raw strings normalize CR and CRLF to LF.
fn normalize_raw(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

fn unicode_id_start(ch: char) -> bool {
    !ch.is_ascii() && unicode_ident::is_xid_start(ch)
}

fn unicode_id_continue(ch: char) -> bool {
    !ch.is_ascii() && unicode_ident::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        lexer.tokenize_all().unwrap()
    }

    fn lex_no_lt(src: &str) -> Vec<Token> {
        lex(src)
            .into_iter()
            .filter(|t| !matches!(t, Token::LineTerminator))
            .collect()
    }

    fn lex_err(src: &str) -> LexError {
        Lexer::new(src).tokenize_all().unwrap_err()
    }

    #[test]
    fn empty_source() {
        assert_eq!(lex(""), vec![Token::Eof]);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            lex_no_lt("var x = 42;"),
            vec![
                Token::Keyword(Keyword::Var),
                Token::Identifier("x".into()),
                Token::Assign,
                Token::NumericLiteral(42.0),
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn contextual_words_are_identifiers() {
        assert_eq!(
            lex_no_lt("let yield await async of"),
            vec![
                Token::Identifier("let".into()),
                Token::Identifier("yield".into()),
                Token::Identifier("await".into()),
                Token::Identifier("async".into()),
                Token::Identifier("of".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn escaped_identifiers() {
        assert_eq!(
            lex_no_lt(r"v\u0061r a\u{62}"),
            vec![
                Token::IdentifierWithEscape("var".into()),
                Token::IdentifierWithEscape("ab".into()),
                Token::Eof,
            ]
        );
        assert_eq!(lex_err(r"\u0031abc").message, "Invalid Unicode escape");
        assert_eq!(lex_err(r"a\x41").message, "Expecting Unicode escape sequence \\uXXXX");
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            lex_no_lt(r#""hello""#),
            vec![Token::StringLiteral("hello".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt(r"'he\nllo'"),
            vec![Token::StringLiteral("he\nllo".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt("'a\\\nb'"),
            vec![Token::StringLiteral("ab".into()), Token::Eof]
        );
        assert!(lex_err("'abc").message.starts_with("Unterminated string"));
        assert!(lex_err("'a\nb'").message.starts_with("Unterminated string"));
    }

    #[test]
    fn legacy_escapes_are_flagged() {
        let mut lexer = Lexer::new(r#""a\012" "\8" "\0""#);
        assert_eq!(lexer.next_token().unwrap(), Token::StringLiteral("a\n".into()));
        assert_eq!(lexer.legacy_escape(), Some(2));
        assert_eq!(lexer.next_token().unwrap(), Token::StringLiteral("8".into()));
        assert!(lexer.legacy_escape().is_some());
        assert_eq!(lexer.next_token().unwrap(), Token::StringLiteral("\0".into()));
        assert_eq!(lexer.legacy_escape(), None);
    }

    #[test]
    fn surrogate_pairs_combine() {
        assert_eq!(
            lex_no_lt(r#""\uD83D\uDE00""#),
            vec![Token::StringLiteral("\u{1F600}".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt(r#""\uD83Dx""#),
            vec![Token::StringLiteral("\u{FFFD}x".into()), Token::Eof]
        );
    }

    #[test]
    fn lone_surrogates_are_flagged() {
        let mut lexer = Lexer::new(r#""a\uD800" "\uD83D\uDE00" "\u{DC00}" "\uFFFD""#);
        lexer.next_token().unwrap();
        assert_eq!(lexer.lone_surrogate(), Some(2));
        lexer.next_token().unwrap();
        assert_eq!(lexer.lone_surrogate(), None);
        lexer.next_token().unwrap();
        assert!(lexer.lone_surrogate().is_some());
        lexer.next_token().unwrap();
        assert_eq!(lexer.lone_surrogate(), None);
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(lex_no_lt("0xff"), vec![Token::NumericLiteral(255.0), Token::Eof]);
        assert_eq!(lex_no_lt("0b1010"), vec![Token::NumericLiteral(10.0), Token::Eof]);
        assert_eq!(lex_no_lt("0o77"), vec![Token::NumericLiteral(63.0), Token::Eof]);
        assert_eq!(lex_no_lt("1_000"), vec![Token::NumericLiteral(1000.0), Token::Eof]);
        assert_eq!(lex_no_lt("1e3"), vec![Token::NumericLiteral(1000.0), Token::Eof]);
        assert_eq!(lex_no_lt(".5"), vec![Token::NumericLiteral(0.5), Token::Eof]);
        assert_eq!(lex_no_lt("5."), vec![Token::NumericLiteral(5.0), Token::Eof]);
        assert_eq!(lex_no_lt("017"), vec![Token::LegacyOctalLiteral(15.0), Token::Eof]);
        assert_eq!(lex_no_lt("019"), vec![Token::NonOctalDecimalLiteral(19.0), Token::Eof]);
        assert_eq!(lex_no_lt("08.5"), vec![Token::NonOctalDecimalLiteral(8.5), Token::Eof]);
    }

    #[test]
    fn malformed_numbers() {
        for src in ["1__0", "1_", "0_1", "0x", "0x_1", "1._5", "1e", "3in x", "1.5n", "1e3n", "017n", "08n"] {
            Lexer::new(src)
                .tokenize_all()
                .expect_err(&format!("{src} should not lex"));
        }
    }

    #[test]
    fn boolean_null() {
        assert_eq!(
            lex_no_lt("true false null"),
            vec![
                Token::BooleanLiteral(true),
                Token::BooleanLiteral(false),
                Token::NullLiteral,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn punctuators() {
        assert_eq!(lex_no_lt("==="), vec![Token::StrictEqual, Token::Eof]);
        assert_eq!(lex_no_lt("!=="), vec![Token::StrictNotEqual, Token::Eof]);
        assert_eq!(lex_no_lt("=>"), vec![Token::Arrow, Token::Eof]);
        assert_eq!(lex_no_lt("..."), vec![Token::Ellipsis, Token::Eof]);
        assert_eq!(lex_no_lt(">>>="), vec![Token::UnsignedRightShiftAssign, Token::Eof]);
        assert_eq!(lex_no_lt("**="), vec![Token::ExponentAssign, Token::Eof]);
        assert_eq!(lex_no_lt("&&="), vec![Token::LogicalAndAssign, Token::Eof]);
        assert_eq!(
            lex_no_lt("a?.5:1"),
            vec![
                Token::Identifier("a".into()),
                Token::Question,
                Token::NumericLiteral(0.5),
                Token::Colon,
                Token::NumericLiteral(1.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments() {
        assert_eq!(lex_no_lt("// comment\n42"), vec![Token::NumericLiteral(42.0), Token::Eof]);
        assert_eq!(lex_no_lt("/* block */ 42"), vec![Token::NumericLiteral(42.0), Token::Eof]);
        assert_eq!(lex("/* a\n b */"), vec![Token::LineTerminator, Token::Eof]);
        assert_eq!(lex_no_lt("#!/usr/bin/env node\n1"), vec![Token::NumericLiteral(1.0), Token::Eof]);
        assert_eq!(lex_err("/* open").message, "Unterminated comment");
    }

    #[test]
    fn html_comments() {
        let mut lexer = Lexer::new("a <!-- gone\n--> also gone\nb");
        lexer.set_html_comments(true);
        let tokens: Vec<_> = lexer
            .tokenize_all()
            .unwrap()
            .into_iter()
            .filter(|t| !matches!(t, Token::LineTerminator))
            .collect();
        assert_eq!(
            tokens,
            vec![Token::Identifier("a".into()), Token::Identifier("b".into()), Token::Eof]
        );
        // Without the flag `-->` is a decrement and a comparison.
        assert_eq!(
            lex_no_lt("x-->y"),
            vec![
                Token::Identifier("x".into()),
                Token::Decrement,
                Token::GreaterThan,
                Token::Identifier("y".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn template_literal() {
        assert_eq!(
            lex_no_lt("`hello`"),
            vec![Token::NoSubstitutionTemplate(Some("hello".into()), "hello".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt("`a\r\nb`"),
            vec![Token::NoSubstitutionTemplate(Some("a\nb".into()), "a\nb".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt(r"`\unicode`"),
            vec![Token::NoSubstitutionTemplate(None, r"\unicode".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt(r"`\01`"),
            vec![Token::NoSubstitutionTemplate(None, r"\01".into()), Token::Eof]
        );
    }

    #[test]
    fn template_continuation() {
        let mut lexer = Lexer::new("`a${x}b${y}c`");
        assert_eq!(lexer.next_token().unwrap(), Token::TemplateHead(Some("a".into()), "a".into()));
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("x".into()));
        assert_eq!(lexer.next_token().unwrap(), Token::RightBrace);
        assert_eq!(
            lexer.read_template_continuation().unwrap(),
            Token::TemplateMiddle(Some("b".into()), "b".into())
        );
        assert_eq!(lexer.token_start(), 5);
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("y".into()));
        assert_eq!(lexer.next_token().unwrap(), Token::RightBrace);
        assert_eq!(
            lexer.read_template_continuation().unwrap(),
            Token::TemplateTail(Some("c".into()), "c".into())
        );
    }

    #[test]
    fn regex_rescan() {
        let mut lexer = Lexer::new("/[/]+\\//gi.x");
        assert_eq!(lexer.next_token().unwrap(), Token::Slash);
        let (line, column) = lexer.token_start_position();
        assert_eq!(
            lexer.rescan_regex(0, line, column).unwrap(),
            Token::RegExpLiteral { pattern: "[/]+\\/".into(), flags: "gi".into() }
        );
        assert_eq!(lexer.next_token().unwrap(), Token::Dot);
    }

    #[test]
    fn regex_flag_validation() {
        for src in ["/a/gg", "/a/uv", "/a/x", "/a\n/"] {
            let mut lexer = Lexer::new(src);
            lexer.next_token().unwrap();
            assert!(lexer.rescan_regex(0, 1, 0).is_err(), "{src} should be rejected");
        }
    }

    #[test]
    fn bigint_literal() {
        assert_eq!(lex_no_lt("42n"), vec![Token::BigIntLiteral("42".into()), Token::Eof]);
        assert_eq!(lex_no_lt("0xFFn"), vec![Token::BigIntLiteral("255".into()), Token::Eof]);
        assert_eq!(
            lex_no_lt("0x1_0000_0000_0000_0000n"),
            vec![Token::BigIntLiteral("18446744073709551616".into()), Token::Eof]
        );
    }

    #[test]
    fn unicode_escape_in_string() {
        assert_eq!(lex_no_lt(r#""\u0041""#), vec![Token::StringLiteral("A".into()), Token::Eof]);
        assert_eq!(
            lex_no_lt(r#""\u{1F600}""#),
            vec![Token::StringLiteral("\u{1F600}".into()), Token::Eof]
        );
        assert_eq!(lex_err(r#""\u{110000}""#).message, "Code point out of bounds");
    }

    #[test]
    fn private_names() {
        assert_eq!(lex_no_lt("#x"), vec![Token::PrivateName("x".into()), Token::Eof]);
        assert!(lex_err("# x").message.contains('#'));
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let mut lexer = Lexer::new("a\n  bb");
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::LineTerminator);
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("bb".into()));
        assert_eq!(lexer.token_start(), 4);
        assert_eq!(lexer.token_start_position(), (2, 2));
        assert_eq!(lexer.position(), (2, 4));
    }
}
