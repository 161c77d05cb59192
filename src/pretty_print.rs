use crate::parser::MAX_NESTING;
use crate::{EnvError, Error, EvalError, ParseError, Span};
use ariadne::{Label, Report, ReportKind, Source};

const SOURCE_ID: &str = "input";

type Diagnostic = ariadne::ReportBuilder<'static, (&'static str, std::ops::Range<usize>)>;

fn report(span: Span, message: String, label: String) -> Diagnostic {
    Report::build(ReportKind::Error, (SOURCE_ID, span.to_range()))
        .with_message(message)
        .with_label(Label::new((SOURCE_ID, span.to_range())).with_message(label))
}

// Diagnostics go to stderr
fn emit(diagnostic: Diagnostic, input: &str) {
    if let Err(e) = diagnostic.finish().eprint((SOURCE_ID, Source::from(input))) {
        eprintln!("failed to print diagnostic: {}", e);
    }
}

impl EvalError {
    fn diagnostic(&self) -> Diagnostic {
        match self {
            EvalError::EnvError(EnvError::UndefinedVariable(name, span)) => report(
                *span,
                format!("Undefined variable `{}`", name),
                "This variable has not been assigned in this session".to_string(),
            ),
        }
    }

    pub fn pretty_print(&self, input: &str) {
        emit(self.diagnostic(), input);
    }
}

impl ParseError {
    fn diagnostic(&self, input: &str) -> Diagnostic {
        match self {
            ParseError::Lexical(lex_err) => report(
                lex_err.span,
                "Lexer Error".to_string(),
                lex_err.message.clone(),
            ),
            ParseError::UnexpectedToken { expected, found } => report(
                found.span,
                format!("Unexpected token: {}", found),
                format!("Expected {}", expected),
            ),
            ParseError::UnexpectedEof { expected } => report(
                Span::at(input.len()),
                "Premature end of input".to_string(),
                format!("Expected {}", expected),
            ),
            ParseError::InvalidNumber { text, span, source } => report(
                *span,
                format!("Invalid number `{}`", text),
                format!("{} (literals must fit in a signed 64-bit integer)", source),
            ),
            ParseError::TooDeep { span } => report(
                *span,
                "Parentheses nested too deeply".to_string(),
                format!("At most {} groups may be open at once", MAX_NESTING),
            ),
        }
    }

    pub fn pretty_print(&self, input: &str) {
        emit(self.diagnostic(input), input);
    }
}

impl Error {
    pub fn pretty_print(&self, input: &str) {
        match self {
            Error::Parse(e) => e.pretty_print(input),
            Error::Eval(e) => e.pretty_print(input),
        }
    }
}
