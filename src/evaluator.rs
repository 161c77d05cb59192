use crate::ast::{Expr, Node, UnaryOperator};
use crate::environment::{EnvError, Environment};
use crate::parser::{ParseError, parse};
use thiserror::Error;

// --- Evaluation Error ---
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error(transparent)]
    EnvError(#[from] EnvError), // Errors from environment lookup
}

// Result type alias for convenience
pub type EvalResult<T = i64> = Result<T, EvalError>;

/// Anything that can go wrong between reading a line and getting its value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

// --- Evaluate Function ---

/// Evaluates a tree against `env`.
///
/// The left operand of a binary node is evaluated before the right one, so an
/// assignment nested in the left side is visible to the right side. The first
/// failure aborts the whole evaluation.
pub fn evaluate(node: &Node, env: &mut Environment) -> EvalResult {
    match &node.kind {
        Expr::IntegerLiteral(value) => Ok(*value),
        Expr::Variable(name) => Ok(env.get(name, node.span)?),
        Expr::UnaryOp { op, operand } => {
            let value = evaluate(operand, env)?;
            match op {
                UnaryOperator::Not => Ok(!value),
            }
        }
        Expr::BinaryOp { op, left, right } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            Ok(op.apply(left, right))
        }
        Expr::Assignment { name, value } => {
            let value = evaluate(value, env)?;
            env.assign(name.as_str(), value);
            Ok(value)
        }
    }
}

/// Parses and evaluates one line of input.
pub fn eval_str(input: &str, env: &mut Environment) -> Result<i64, Error> {
    let node = parse(input)?;
    Ok(evaluate(&node, env)?)
}
