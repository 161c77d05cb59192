use crate::Span;
use crate::ast::{BinaryOperator, Node, UnaryOperator};
use crate::lexer::{LexerError, Token, TokenKind, Tokenizer};
use std::collections::VecDeque;
use std::num::ParseIntError;
use thiserror::Error;

// Grammar productions named in "expected ..." messages
const OPERAND: &str = "expression, number, identifier or unary";
const STATEMENT: &str = "assignment or expression";

// The grammar never needs to see further than `IDENT '='`.
const MAX_LOOKAHEAD: usize = 2;

// Parentheses open at once. Parsing and evaluation recurse once per level.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("lexical error at position {pos}: {msg}", pos = .0.span.start, msg = .0)]
    Lexical(#[from] LexerError),
    #[error("expected {expected} but got {found} at position {}", .found.span.start)]
    UnexpectedToken {
        expected: &'static str,
        found: Token,
    },
    #[error("premature end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("invalid number literal {text:?}: {source}")]
    InvalidNumber {
        text: String,
        span: Span,
        source: ParseIntError,
    },
    #[error(
        "parentheses nested deeper than {max} at position {pos}",
        max = MAX_NESTING,
        pos = .span.start
    )]
    TooDeep { span: Span },
}

// Result type alias for convenience
pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser over a lazy token stream.
///
/// Binary operators have no precedence: a chain such as `a | b & c` folds
/// strictly left to right into `((a | b) & c)`. Only parentheses regroup.
pub struct Parser<'source> {
    tokens: Tokenizer<'source>,
    // Tokens fetched but not consumed yet, never more than MAX_LOOKAHEAD.
    lookahead: VecDeque<Token>,
    end: usize,
    depth: usize,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        Parser {
            tokens: Tokenizer::new(source),
            lookahead: VecDeque::with_capacity(MAX_LOOKAHEAD),
            end: source.len(),
            depth: 0,
        }
    }

    // Pulls a token from the stream; an exhausted stream keeps answering EOF.
    fn pull(&mut self) -> ParseResult<Token> {
        let end = self.end;
        let token = self
            .tokens
            .next()
            .unwrap_or_else(|| Token::new(TokenKind::EndOfInput, "", Span::at(end)));
        if token.kind == TokenKind::Illegal {
            return Err(ParseError::Lexical(token.into()));
        }
        Ok(token)
    }

    /// Kind of the token `offset` positions ahead (0 is the next one),
    /// without consuming anything.
    fn peek_kind(&mut self, offset: usize) -> ParseResult<TokenKind> {
        debug_assert!(offset < MAX_LOOKAHEAD, "lookahead > {}", MAX_LOOKAHEAD);
        while self.lookahead.len() <= offset {
            let token = self.pull()?;
            self.lookahead.push_back(token);
        }
        Ok(self.lookahead[offset].kind)
    }

    // Consumes the next token, buffered ones first.
    fn next_token(&mut self) -> ParseResult<Token> {
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => self.pull(),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> ParseResult<Token> {
        let token = self.next_token()?;
        if token.kind == kind {
            Ok(token)
        } else if token.is_eof() {
            Err(ParseError::UnexpectedEof { expected })
        } else {
            Err(ParseError::UnexpectedToken {
                expected,
                found: token,
            })
        }
    }

    /// Parses the whole input into exactly one assignment or expression.
    pub fn parse(mut self) -> ParseResult<Node> {
        if self.peek_kind(0)? == TokenKind::EndOfInput {
            return Err(ParseError::UnexpectedEof {
                expected: STATEMENT,
            });
        }
        let node = self.parse_statement()?;

        let trailing = self.next_token()?;
        if trailing.is_eof() {
            Ok(node)
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "OPERATION",
                found: trailing,
            })
        }
    }

    // assignment | expr
    fn parse_statement(&mut self) -> ParseResult<Node> {
        if self.peek_kind(0)? == TokenKind::Identifier && self.peek_kind(1)? == TokenKind::Equal {
            self.parse_assignment()
        } else {
            self.parse_expr()
        }
    }

    // IDENT '=' expr
    fn parse_assignment(&mut self) -> ParseResult<Node> {
        let name = self.expect(TokenKind::Identifier, "IDENT")?;
        self.expect(TokenKind::Equal, "EQUAL")?;
        let value = self.parse_expr()?;
        let span = name.span.merge(value.span);
        Ok(Node::new_assignment(name.text, value, span))
    }

    // operand (binop operand)*, folded to the left
    fn parse_expr(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_operand()?;
        loop {
            match self.peek_kind(0)? {
                TokenKind::EndOfInput | TokenKind::RParen => return Ok(left),
                _ => {}
            }
            let op = self.parse_binary_operator()?;
            let right = self.parse_operand()?;
            left = Node::new_binary(op, left, right);
        }
    }

    fn parse_operand(&mut self) -> ParseResult<Node> {
        match self.peek_kind(0)? {
            TokenKind::LParen => self.parse_group(),
            TokenKind::Not => self.parse_unary(),
            TokenKind::Identifier => {
                let token = self.next_token()?;
                Ok(Node::new_variable(token.text, token.span))
            }
            TokenKind::EndOfInput => Err(ParseError::UnexpectedEof { expected: OPERAND }),
            _ => self.parse_number(),
        }
    }

    // '(' (assignment | expr) ')'
    fn parse_group(&mut self) -> ParseResult<Node> {
        let open = self.expect(TokenKind::LParen, "LPAREN")?;
        if self.depth == MAX_NESTING {
            return Err(ParseError::TooDeep { span: open.span });
        }
        self.depth += 1;
        let inner = self.parse_statement()?;
        self.depth -= 1;
        let close = self.expect(TokenKind::RParen, "RPAREN")?;
        Ok(Node::new(inner.kind, open.span.merge(close.span)))
    }

    // '~' number; the operand is a literal, not a general expression
    fn parse_unary(&mut self) -> ParseResult<Node> {
        let not = self.expect(TokenKind::Not, "NOT")?;
        let operand = self.parse_number()?;
        let span = not.span.merge(operand.span);
        Ok(Node::new_unary(UnaryOperator::Not, operand, span))
    }

    fn parse_number(&mut self) -> ParseResult<Node> {
        let token = self.expect(TokenKind::Number, "NUMBER")?;
        let (digits, radix) = if let Some(digits) = token.text.strip_prefix("0b") {
            (digits, 2)
        } else if let Some(digits) = token.text.strip_prefix("0x") {
            (digits, 16)
        } else {
            (token.text.as_str(), 10)
        };

        i64::from_str_radix(digits, radix)
            .map(|value| Node::new_integer(value, token.span))
            .map_err(|source| ParseError::InvalidNumber {
                text: token.text.clone(),
                span: token.span,
                source,
            })
    }

    fn parse_binary_operator(&mut self) -> ParseResult<BinaryOperator> {
        let token = self.next_token()?;
        let op = match token.kind {
            TokenKind::And => BinaryOperator::And,
            TokenKind::Or => BinaryOperator::Or,
            TokenKind::Xor => BinaryOperator::Xor,
            TokenKind::Shl => BinaryOperator::Shl,
            TokenKind::Shr => BinaryOperator::Shr,
            _ => {
                return Err(ParseError::UnexpectedToken {
                    expected: "OPERATION",
                    found: token,
                });
            }
        };
        Ok(op)
    }
}

/// Tokenizes and parses `input` into a single tree.
pub fn parse(input: &str) -> ParseResult<Node> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn assert_parse(input: &str, expected: Node) {
        match parse(input) {
            Ok(result) => assert_eq!(result, expected, "Input: '{}'", input),
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    // Compares the parenthesized rendering, which ignores spans.
    fn assert_parsed_string(input: &str, expected_output: &str) {
        let node = match parse(input) {
            Ok(result) => result,
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        };
        assert_eq!(node.to_string(), expected_output, "Input: '{}'", input);
    }

    fn parse_err(input: &str) -> ParseError {
        match parse(input) {
            Ok(result) => panic!(
                "Expected parsing to fail for input '{}', but got: {}",
                input, result
            ),
            Err(e) => e,
        }
    }

    fn int(value: i64, start: usize, end: usize) -> Node {
        Node::new_integer(value, Span::new(start, end))
    }

    fn var(name: &str, start: usize, end: usize) -> Node {
        Node::new_variable(name, Span::new(start, end))
    }

    #[test]
    fn test_parse_literals() {
        assert_parse("0", int(0, 0, 1));
        assert_parse("42", int(42, 0, 2));
        assert_parse("007", int(7, 0, 3));
        assert_parse("0b101", int(5, 0, 5));
        assert_parse("0xff", int(255, 0, 4));
        assert_parse("9223372036854775807", int(i64::MAX, 0, 19));
    }

    #[test]
    fn test_parse_variable() {
        assert_parse("a", var("a", 0, 1));
        assert_parse("  mask ", var("mask", 2, 6));
    }

    #[test]
    fn test_parse_binary() {
        assert_parse(
            "0|1",
            Node::new_binary(BinaryOperator::Or, int(0, 0, 1), int(1, 2, 3)),
        );
        assert_parse(
            "a|1",
            Node::new_binary(BinaryOperator::Or, var("a", 0, 1), int(1, 2, 3)),
        );
        assert_parsed_string("1 << 4", "(1 << 4)");
        assert_parsed_string("x >> y", "(x >> y)");
        assert_parsed_string("5 ^ 3", "(5 ^ 3)");
    }

    #[test]
    fn test_parse_chains_left_to_right() {
        assert_parsed_string("0|1|2", "((0 | 1) | 2)");
        assert_parsed_string("0|1|2|3", "(((0 | 1) | 2) | 3)");
        assert_parsed_string("1|2&1", "((1 | 2) & 1)");
        assert_parsed_string("0|1&2|3", "(((0 | 1) & 2) | 3)");
        assert_parsed_string("a ^ b << 2 >> c", "(((a ^ b) << 2) >> c)");
    }

    #[test]
    fn test_parse_groups() {
        assert_parsed_string("(a|1)", "(a | 1)");
        assert_parsed_string("((a|1))", "(a | 1)");
        assert_parsed_string("((a|1)|2)", "((a | 1) | 2)");
        assert_parsed_string("0|(1&2)", "(0 | (1 & 2))");
        assert_parsed_string("(0|1)&2", "((0 | 1) & 2)");
        assert_parsed_string("1|(2|(3|4))", "(1 | (2 | (3 | 4)))");
    }

    #[test]
    fn test_parse_group_span_includes_parens() {
        let node = parse(" (1|2) ").expect("should parse");
        assert_eq!(node.span, Span::new(1, 6));
    }

    #[test]
    fn test_parse_unary() {
        assert_parse(
            "~7",
            Node::new_unary(UnaryOperator::Not, int(7, 1, 2), Span::new(0, 2)),
        );
        assert_parsed_string("~0xff & a", "(~255 & a)");
        assert_parsed_string("a | ~0b1", "(a | ~1)");
    }

    #[test]
    fn test_parse_assignment() {
        assert_parse(
            "a = 1",
            Node::new_assignment("a", int(1, 4, 5), Span::new(0, 5)),
        );
        assert_parsed_string("a = a", "a = a");
        assert_parsed_string("a = a | b", "a = (a | b)");
        assert_parsed_string("mask = 0xff << 8", "mask = (255 << 8)");
    }

    #[test]
    fn test_parse_assignment_inside_group() {
        assert_parsed_string("(a = 1) | 2", "((a = 1) | 2)");
        assert_parsed_string("1 | (a = 2)", "(1 | (a = 2))");
        assert_parsed_string("1 | (a = 2 | 3)", "(1 | (a = (2 | 3)))");
        assert_parsed_string("(a = 1)", "a = 1");
        let node = parse("(a = 1) | 2").expect("should parse");
        match node.kind {
            Expr::BinaryOp { left, .. } => {
                assert!(matches!(left.kind, Expr::Assignment { ref name, .. } if name == "a"))
            }
            other => panic!("expected a binary node, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        for input in ["a = (1|b)&0xf0 >> 2", "~1 ^ x", "((0))"] {
            assert_eq!(parse(input), parse(input), "Input: '{}'", input);
        }
    }

    #[test]
    fn test_parse_errors_eof() {
        assert!(matches!(
            parse_err(""),
            ParseError::UnexpectedEof { expected } if expected == STATEMENT
        ));
        assert!(matches!(
            parse_err("1 |"),
            ParseError::UnexpectedEof { expected } if expected == OPERAND
        ));
        assert!(matches!(
            parse_err("a ="),
            ParseError::UnexpectedEof { expected } if expected == OPERAND
        ));
        assert!(matches!(
            parse_err("(1 | 2"),
            ParseError::UnexpectedEof { expected: "RPAREN" }
        ));
        assert!(matches!(
            parse_err("~"),
            ParseError::UnexpectedEof { expected: "NUMBER" }
        ));
    }

    #[test]
    fn test_parse_errors_unexpected_token() {
        match parse_err("1 2") {
            ParseError::UnexpectedToken { expected, found } => {
                assert_eq!(expected, "OPERATION");
                assert_eq!(found.kind, TokenKind::Number);
                assert_eq!(found.text, "2");
                assert_eq!(found.position(), 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(
            parse_err("1)"),
            ParseError::UnexpectedToken { expected: "OPERATION", found } if found.kind == TokenKind::RParen
        ));
        assert!(matches!(
            parse_err("(1 2)"),
            ParseError::UnexpectedToken { expected: "OPERATION", .. }
        ));
        assert!(matches!(
            parse_err("~a"),
            ParseError::UnexpectedToken { expected: "NUMBER", found } if found.kind == TokenKind::Identifier
        ));
        assert!(matches!(
            parse_err("~~1"),
            ParseError::UnexpectedToken { expected: "NUMBER", .. }
        ));
        assert!(matches!(
            parse_err("()"),
            ParseError::UnexpectedToken { expected: "NUMBER", .. }
        ));
        assert!(matches!(
            parse_err("a = b = 1"),
            ParseError::UnexpectedToken { expected: "OPERATION", found } if found.kind == TokenKind::Equal
        ));
    }

    #[test]
    fn test_parse_error_message() {
        assert_eq!(
            parse_err("a & )").to_string(),
            "expected NUMBER but got RPAREN(\")\") at position 4"
        );
        assert_eq!(
            parse_err("(1").to_string(),
            "premature end of input, expected RPAREN"
        );
    }

    #[test]
    fn test_parse_lexer_error_propagation() {
        assert_eq!(
            parse_err("1invalid = 0b10000"),
            ParseError::Lexical(LexerError {
                message: "malformed number".to_string(),
                span: Span::new(0, 8),
            })
        );
        assert!(matches!(
            parse_err("a | 0b"),
            ParseError::Lexical(LexerError { message, .. }) if message == "malformed binary number"
        ));
        // found while filling the two-token lookahead
        assert!(matches!(parse_err("a $"), ParseError::Lexical(_)));
    }

    #[test]
    fn test_parse_lexical_error_message() {
        assert_eq!(
            parse_err("$").to_string(),
            "lexical error at position 0: unexpected '$' at 0"
        );
        assert_eq!(
            parse_err("a | 0b").to_string(),
            "lexical error at position 4: malformed binary number"
        );
    }

    fn nested(depth: usize) -> String {
        format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn test_parse_nesting_limit() {
        assert_parsed_string(&nested(MAX_NESTING), "1");

        match parse_err(&nested(MAX_NESTING + 1)) {
            ParseError::TooDeep { span } => {
                assert_eq!(span, Span::new(MAX_NESTING, MAX_NESTING + 1))
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(
            parse_err(&nested(10_000)),
            ParseError::TooDeep { .. }
        ));
        assert_eq!(
            parse_err(&nested(MAX_NESTING + 1)).to_string(),
            format!(
                "parentheses nested deeper than {} at position {}",
                MAX_NESTING, MAX_NESTING
            )
        );
        // unbalanced input is rejected by the limit before the missing parens
        assert!(matches!(
            parse_err(&"(".repeat(10_000)),
            ParseError::TooDeep { .. }
        ));
    }

    #[test]
    fn test_parse_nesting_is_per_group() {
        // sibling groups do not add up
        let siblings = vec![nested(MAX_NESTING); 4].join(" | ");
        assert!(parse(&siblings).is_ok());
    }

    #[test]
    fn test_parse_number_overflow() {
        assert!(matches!(
            parse_err("9223372036854775808"),
            ParseError::InvalidNumber { text, .. } if text == "9223372036854775808"
        ));
        assert!(matches!(
            parse_err("0x8000000000000000"),
            ParseError::InvalidNumber { .. }
        ));
        assert_parsed_string("0x7fffffffffffffff", "9223372036854775807");
    }
}
