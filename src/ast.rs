use crate::source::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: Expr, // The expression itself
    pub span: Span, // The source span it covers
}

impl Node {
    pub fn new(kind: Expr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn new_integer(value: i64, span: Span) -> Self {
        Node::new(Expr::IntegerLiteral(value), span)
    }

    pub fn new_variable(name: impl Into<String>, span: Span) -> Self {
        Node::new(Expr::Variable(name.into()), span)
    }

    pub fn new_unary(op: UnaryOperator, operand: Node, span: Span) -> Self {
        Node::new(
            Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    /// Builds a binary node spanning both operands.
    pub fn new_binary(op: BinaryOperator, left: Node, right: Node) -> Self {
        let span = left.span.merge(right.span);
        Node::new(
            Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn new_assignment(name: impl Into<String>, value: Node, span: Span) -> Self {
        Node::new(
            Expr::Assignment {
                name: name.into(),
                value: Box::new(value),
            },
            span,
        )
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// The expression tree produced by the parser.
///
/// Every child is boxed and owned by exactly one parent, so the tree can
/// never share or cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    IntegerLiteral(i64),
    Variable(String),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Assignment {
        name: String,
        value: Box<Node>,
    },
}

// Fully parenthesized infix form: one pair of parens per binary node, and
// around any assignment that is not the root.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntegerLiteral(value) => write!(f, "{}", value),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::UnaryOp { op, operand } => write!(f, "{}{}", op, Nested(operand)),
            Expr::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", Nested(left), op, Nested(right))
            }
            Expr::Assignment { name, value } => write!(f, "{} = {}", name, Nested(value)),
        }
    }
}

struct Nested<'a>(&'a Node);

impl fmt::Display for Nested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            assignment @ Expr::Assignment { .. } => write!(f, "({})", assignment),
            other => write!(f, "{}", other),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => write!(f, "~"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinaryOperator {
    pub fn apply(self, left: i64, right: i64) -> i64 {
        match self {
            BinaryOperator::And => left & right,
            BinaryOperator::Or => left | right,
            BinaryOperator::Xor => left ^ right,
            // Shift counts wrap modulo 64; `>>` keeps the sign.
            BinaryOperator::Shl => left << shift_count(right),
            BinaryOperator::Shr => left >> shift_count(right),
        }
    }
}

fn shift_count(amount: i64) -> u32 {
    (amount & 0x3f) as u32
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::And => "&",
            BinaryOperator::Or => "|",
            BinaryOperator::Xor => "^",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
        };
        f.write_str(symbol)
    }
}
