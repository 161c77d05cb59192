//! Evaluator for a small bitwise expression language.
//!
//! Text flows through three stages: [`tokenize`] produces a lazy token
//! stream, [`parse`] builds a single [`Node`] tree, and [`evaluate`] walks it
//! against a caller-owned [`Environment`].
//!
//! ```
//! use bitcalc::{Environment, eval_str};
//!
//! let mut env = Environment::new();
//! assert_eq!(eval_str("a = 0xf0 | 0x0f", &mut env).unwrap(), 0xff);
//! assert_eq!(eval_str("a >> 4", &mut env).unwrap(), 0x0f);
//! ```

pub mod ast;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod radix;
pub mod repl;
pub mod source;

pub use ast::{BinaryOperator, Expr, Node, UnaryOperator};
pub use environment::{EnvError, Environment};
pub use evaluator::{Error, EvalError, eval_str, evaluate};
pub use lexer::{LexerError, Token, TokenKind, Tokenizer, tokenize, tokenize_all};
pub use parser::{ParseError, Parser, parse};
pub use radix::{Radix, render};
pub use source::Span;
