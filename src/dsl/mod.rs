//! DSL (Domain Specific Language) parser for loudspeaker projects.
//!
//! This module provides a SPICE-inspired text-based language for describing
//! drivers, enclosures and the crossover tree that feeds them. The DSL is
//! line-oriented and human-editable; nesting is expressed with braces.
//!
//! # Grammar Overview
//!
//! ```text
//! project     = { line }
//! line        = comment | directive | element | empty
//! comment     = ('#' | ';') { any_char } | '*' { any_char }  (at line start)
//! directive   = '.' directive_name { argument }
//! element     = kind name [number] { argument } [ '{' { element } '}' ]
//! argument    = key '=' (number | identifier | string) | flag
//!
//! directive_name = "env" | "listen" | "center" | "sweep"
//!                | "driver" name | "box" name box_kind
//! box_kind    = "null" | "closed" | "reflex" | "aperiodic" | "open"
//! string      = '"' { any_char except '"' } '"'
//! number      = ['-'|'+'] digit+ ['.' digit+] [('e'|'E') ['-'|'+'] digit+] [unit_suffix]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! identifier  = (letter | '_') { letter | digit | '_' }
//! ```
//!
//! # Element Kinds
//!
//! | Kind | Value | Main keys |
//! |------|-------|-----------|
//! | item | | children in parallel |
//! | resistor / capacitor / inductor | R / C / L | `connection`, `r` (inductor DCR) |
//! | impedance | | `data` (impedance file), `connection` |
//! | lpad / zobel | | `attenuation`, `impedance` / `r`, `c` |
//! | serial_notch / parallel_notch | | `f`, `q`, `r` / `depth` |
//! | lowpass / highpass | f | `order`, `family`, `impedance` |
//! | active_lowpass / active_highpass | f | `order`, `family`, `q`, `linear_phase` |
//! | gain / delay | dB / ms | `inverted` |
//! | equalizer | | `shape`, `f`, `gain`, `q` or `bw` |
//! | amplifier | dB | `zout`, `power`, `hp_f`, `lp_f` |
//! | speaker | | `driver`, `box`, `x y z h v`, baffle keys, `inverted` |
//! | response | | `data` (response file) |
//!
//! # Example
//!
//! ```text
//! * Two-way bookshelf
//! .listen z=2
//! .driver W fs=40 qts=0.35 vas=40m re=6 bl=8 sd=0.02 response="w.frd"
//! .box B reflex vb=50m fb=30
//!
//! item SYSTEM {
//!   lowpass LP 2.2k order=2 family=lr { speaker WOOF driver=W box=B y=0.8 }
//!   highpass HP 2.2k order=2 family=lr { speaker TWEET driver=T y=1.0 inverted }
//! }
//! ```

mod ast;
mod lexer;
mod parser;
mod project;

pub use ast::*;
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;
pub use project::Project;

use crate::error::Result;

/// Parse a project description string into an AST.
pub fn parse(input: &str) -> Result<ProjectAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}
