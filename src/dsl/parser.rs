//! Parser for the project description language.

use std::collections::HashMap;

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::circuit::ElementRecord;
use crate::error::{Result, SpeakerSimError};

/// Numeric parameters and text options of one line.
#[derive(Debug, Default)]
struct Arguments {
    params: HashMap<String, f64>,
    options: HashMap<String, String>,
}

/// Parser for project descriptions.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire project description.
    pub fn parse(&mut self) -> Result<ProjectAst> {
        let mut ast = ProjectAst::new();

        loop {
            self.skip_newlines()?;
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                TokenKind::Identifier => {
                    let element = self.parse_element()?;
                    ast.elements.push(element);
                }
                TokenKind::CloseBrace => {
                    return Err(SpeakerSimError::parse(self.current.line, "unmatched '}'"));
                }
                _ => {
                    return Err(SpeakerSimError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn skip_newlines(&mut self) -> Result<()> {
        while self.current.kind == TokenKind::Newline {
            self.advance()?;
        }
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(SpeakerSimError::parse(
                self.current.line,
                format!("expected {}, got {:?}", what, self.current.text),
            ))
        }
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => self.advance(),
            TokenKind::Eof => Ok(()),
            _ => Err(SpeakerSimError::parse(
                self.current.line,
                format!("unexpected token: {:?}", self.current.text),
            )),
        }
    }

    fn number(&self, token: &Token) -> Result<f64> {
        parse_value(&token.text)
            .ok_or_else(|| SpeakerSimError::parse(token.line, format!("invalid number: {}", token.text)))
    }

    /// `key=value` pairs and bare flags up to the end of the line or a brace.
    fn parse_arguments(&mut self) -> Result<Arguments> {
        let mut args = Arguments::default();
        while self.current.kind == TokenKind::Identifier {
            let key = self.current.text.to_ascii_lowercase();
            let line = self.current.line;
            self.advance()?;

            if self.current.kind != TokenKind::Equals {
                // Bare flag
                args.options.insert(key, "true".to_string());
                continue;
            }
            self.advance()?;

            let value = self.current.clone();
            match value.kind {
                TokenKind::Number => {
                    args.params.insert(key, self.number(&value)?);
                }
                TokenKind::Identifier | TokenKind::String => {
                    args.options.insert(key, value.text);
                }
                _ => return Err(SpeakerSimError::parse(line, format!("expected a value for '{}'", key))),
            }
            self.advance()?;
        }
        Ok(args)
    }

    fn parse_directive(&mut self, ast: &mut ProjectAst) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        if let Some(kind) = SettingsDirective::from_directive(&directive) {
            let args = self.parse_arguments()?;
            ast.settings.push(SettingsDef {
                directive: kind,
                params: args.params,
                options: args.options,
                line,
            });
            return self.end_of_line();
        }

        match directive.as_str() {
            ".driver" => {
                let name = self.expect(TokenKind::Identifier, "driver name")?.text;
                let args = self.parse_arguments()?;
                ast.drivers.push(DriverDef {
                    name,
                    params: args.params,
                    options: args.options,
                    line,
                });
            }
            ".box" | ".enclosure" => {
                let name = self.expect(TokenKind::Identifier, "enclosure name")?.text;
                let kind = self.expect(TokenKind::Identifier, "enclosure kind")?.text;
                let args = self.parse_arguments()?;
                ast.enclosures.push(EnclosureDef {
                    name,
                    kind: kind.to_ascii_lowercase(),
                    params: args.params,
                    options: args.options,
                    line,
                });
            }
            _ => {
                return Err(SpeakerSimError::parse(line, format!("unknown directive: {}", directive)));
            }
        }
        self.end_of_line()
    }

    /// `kind NAME [value] {key=value | flag} [{ children }]`
    fn parse_element(&mut self) -> Result<ElementRecord> {
        let kind = self.current.text.to_ascii_lowercase();
        let line = self.current.line;
        self.advance()?;
        let name = self.expect(TokenKind::Identifier, "element name")?.text;

        let mut record = ElementRecord::new(kind, name);
        record.line = line;

        if self.current.kind == TokenKind::Number {
            let token = self.current.clone();
            record.value = Some(self.number(&token)?);
            self.advance()?;
        }

        let args = self.parse_arguments()?;
        record.params = args.params;
        record.options = args.options;

        if self.current.kind == TokenKind::OpenBrace {
            self.advance()?;
            loop {
                self.skip_newlines()?;
                match self.current.kind {
                    TokenKind::CloseBrace => {
                        self.advance()?;
                        break;
                    }
                    TokenKind::Identifier => record.children.push(self.parse_element()?),
                    TokenKind::Eof => {
                        return Err(SpeakerSimError::parse(
                            line,
                            format!("'{}' block is not closed", record.name),
                        ));
                    }
                    _ => {
                        return Err(SpeakerSimError::parse(
                            self.current.line,
                            format!("unexpected token in block: {:?}", self.current.text),
                        ));
                    }
                }
            }
        }

        // An element may end right before its parent's closing brace
        if self.current.kind == TokenKind::CloseBrace {
            return Ok(record);
        }
        self.end_of_line()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<ProjectAst> {
        Parser::new(Lexer::new(input))?.parse()
    }

    #[test]
    fn test_parse_element() {
        let ast = parse("resistor R1 3.3 connection=parallel").unwrap();
        assert_eq!(ast.elements.len(), 1);
        let r = &ast.elements[0];
        assert_eq!(r.kind, "resistor");
        assert_eq!(r.name, "R1");
        assert_eq!(r.value, Some(3.3));
        assert_eq!(r.option("connection"), Some("parallel"));
        assert_eq!(r.line, 1);
    }

    #[test]
    fn test_parse_nested_blocks() {
        let input = "\
item SYSTEM {
  lowpass LP 2.2k order=2 {
    speaker WOOF driver=W box=B inverted
  }
  highpass HP 2.2k { speaker TWEET driver=T }
}
";
        let ast = parse(input).unwrap();
        assert_eq!(ast.elements.len(), 1);
        let system = &ast.elements[0];
        assert_eq!(system.children.len(), 2);
        let lp = &system.children[0];
        assert_eq!(lp.value, Some(2200.0));
        assert_eq!(lp.param("order"), Some(2.0));
        assert_eq!(lp.children[0].kind, "speaker");
        assert!(lp.children[0].flag("inverted"));
        assert_eq!(lp.children[0].line, 3);
        assert_eq!(system.children[1].children[0].option("driver"), Some("T"));
    }

    #[test]
    fn test_parse_directives() {
        let input = "\
* two-way test
.env c=343 reflection=0.5
.sweep f_min=10 f_max=40k points=100 scale=linear
.driver W fs=40 qts=0.35 vas=40m response=\"w.frd\" h30=\"w 30.frd\"
.box B closed vb=20m qa=8
";
        let ast = parse(input).unwrap();
        assert_eq!(ast.settings.len(), 2);
        assert_eq!(ast.settings[0].directive, SettingsDirective::Environment);
        assert_eq!(ast.settings[1].params["f_max"], 40_000.0);
        assert_eq!(ast.settings[1].options["scale"], "linear");
        let driver = &ast.drivers[0];
        assert_eq!(driver.name, "W");
        assert!((driver.params["vas"] - 0.04).abs() < 1e-12);
        assert_eq!(driver.options["h30"], "w 30.frd");
        assert_eq!(ast.enclosures[0].kind, "closed");
        assert_eq!(ast.enclosures[0].line, 5);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(".bogus x"), Err(SpeakerSimError::ParseError { line: 1, .. })));
        assert!(matches!(parse("item A {\n"), Err(SpeakerSimError::ParseError { .. })));
        assert!(matches!(parse("}"), Err(SpeakerSimError::ParseError { .. })));
        assert!(matches!(parse("gain G1 3 4"), Err(SpeakerSimError::ParseError { .. })));
        assert!(matches!(parse("lowpass LP f="), Err(SpeakerSimError::ParseError { .. })));
    }
}
