//! Lexer (tokenizer) for the project description language.

use crate::error::{Result, SpeakerSimError};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text (without quotes for strings)
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier (kind tag, element name, parameter key, ...)
    Identifier,
    /// A number (integer or floating point, possibly with suffix)
    Number,
    /// A directive (starts with '.')
    Directive,
    /// Double-quoted text
    String,
    /// Open brace '{'
    OpenBrace,
    /// Close brace '}'
    CloseBrace,
    /// Equals sign '='
    Equals,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// Lexer for tokenizing project descriptions.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
    /// Nothing but whitespace seen on the current line
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
            at_line_start: true,
        }
    }

    /// Tokenize the whole input, ending with [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let ch = match self.chars.peek() {
            Some(&(_, ch)) => ch,
            None => return Ok(self.token(TokenKind::Eof, String::new(), self.line, self.column)),
        };

        let start_column = self.column;
        let start_line = self.line;
        self.at_line_start = ch == '\n';

        let (kind, text) = match ch {
            '\n' => {
                self.advance();
                (TokenKind::Newline, "\n".to_string())
            }
            '.' => {
                self.advance();
                let name = self.read_identifier();
                if name.is_empty() {
                    return Err(SpeakerSimError::lexer(start_line, start_column, "directive name expected after '.'"));
                }
                (TokenKind::Directive, format!(".{}", name.to_ascii_lowercase()))
            }
            '"' => {
                self.advance();
                (TokenKind::String, self.read_string(start_line, start_column)?)
            }
            '{' => {
                self.advance();
                (TokenKind::OpenBrace, "{".to_string())
            }
            '}' => {
                self.advance();
                (TokenKind::CloseBrace, "}".to_string())
            }
            '=' => {
                self.advance();
                (TokenKind::Equals, "=".to_string())
            }
            '-' | '+' | '0'..='9' => (TokenKind::Number, self.read_number()),
            _ if ch.is_alphabetic() || ch == '_' => (TokenKind::Identifier, self.read_identifier()),
            _ => {
                return Err(SpeakerSimError::lexer(
                    start_line,
                    start_column,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        Ok(self.token(kind, text, start_line, start_column))
    }

    fn token(&self, kind: TokenKind, text: String, line: usize, column: usize) -> Token {
        Token { kind, text, line, column }
    }

    fn advance(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_to_line_end(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '#' | ';' => self.skip_to_line_end(),
                // SPICE-style comment line
                '*' if self.at_line_start => self.skip_to_line_end(),
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.chars.peek() {
                Some(&(_, '"')) => {
                    self.advance();
                    return Ok(text);
                }
                Some(&(_, '\n')) | None => {
                    return Err(SpeakerSimError::lexer(line, column, "unterminated string"));
                }
                Some(&(_, ch)) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> String {
        let mut text = String::new();

        // Optional sign
        if let Some(&(_, ch)) = self.chars.peek() {
            if ch == '-' || ch == '+' {
                text.push(ch);
                self.advance();
            }
        }

        self.read_digits(&mut text);

        // Decimal part
        if let Some(&(_, '.')) = self.chars.peek() {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        // Exponent part
        if let Some(&(_, ch)) = self.chars.peek() {
            if ch == 'e' || ch == 'E' {
                text.push(ch);
                self.advance();
                if let Some(&(_, sign)) = self.chars.peek() {
                    if sign == '-' || sign == '+' {
                        text.push(sign);
                        self.advance();
                    }
                }
                self.read_digits(&mut text);
            }
        }

        // Unit suffix (p, n, u, m, k, M, G)
        if let Some(&(_, ch)) = self.chars.peek() {
            if matches!(ch, 'p' | 'n' | 'u' | 'µ' | 'm' | 'k' | 'K' | 'M' | 'G') {
                text.push(ch);
                self.advance();
            }
        }

        text
    }
}

/// Parse a number string with optional unit suffix.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    let last = text.chars().last()?;
    let multiplier = match last {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => 1.0,
    };
    let digits = if multiplier != 1.0 {
        &text[..text.len() - last.len_utf8()]
    } else {
        text
    };
    digits.parse::<f64>().ok().map(|v| v * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_parse_value() {
        assert_relative_eq!(parse_value("10k").unwrap(), 10_000.0);
        assert_relative_eq!(parse_value("100n").unwrap(), 100e-9);
        assert_relative_eq!(parse_value("4.7u").unwrap(), 4.7e-6);
        assert_relative_eq!(parse_value("0.33m").unwrap(), 0.33e-3);
        assert_relative_eq!(parse_value("-6").unwrap(), -6.0);
        assert_relative_eq!(parse_value("1e-9").unwrap(), 1e-9);
        assert!(parse_value("").is_none());
        assert!(parse_value("abc").is_none());
    }

    #[test]
    fn test_element_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("lowpass LP1 2.5k order=4 family=lr {\n}"),
            vec![
                Identifier, Identifier, Number, Identifier, Equals, Number, Identifier, Equals, Identifier, OpenBrace,
                Newline, CloseBrace, Eof
            ]
        );
    }

    #[test]
    fn test_directive_and_string() {
        let tokens = Lexer::new(".DRIVER W1 response=\"woofer 0deg.frd\"").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Directive);
        assert_eq!(tokens[0].text, ".driver");
        assert_eq!(tokens[4].kind, TokenKind::String);
        assert_eq!(tokens[4].text, "woofer 0deg.frd");
        assert_eq!(tokens[4].column, 21);
    }

    #[test]
    fn test_comments() {
        use TokenKind::*;
        let input = "* title line\n  * indented title\nitem I # trailing\n; note\n";
        assert_eq!(
            kinds(input),
            vec![Newline, Newline, Identifier, Identifier, Newline, Newline, Eof]
        );
    }

    #[test]
    fn test_errors_carry_position() {
        match Lexer::new("item A\n  @").tokenize() {
            Err(SpeakerSimError::LexerError { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Lexer::new("x=\"open").tokenize().is_err());
    }
}
