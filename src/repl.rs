//! Interactive read-eval-print loop.

use std::borrow::Cow;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer, Context, Editor, Helper, Highlighter, Hinter, Validator};

use crate::{Environment, eval_str, parse, render};

const PROMPT: &str = "bitcalc> ";

const HELP: &str = "\
Enter an expression such as `(0xff00 | 0x0f) >> 4` or an assignment `a = 0b101`.
Operators: & | ^ << >> and unary ~ (applied to a number literal).
There is no precedence: operators apply left to right unless parenthesized.
Commands:
  :vars         list variables assigned in this session
  :ast <expr>   show how an expression is grouped
  :help         show this message
  exit, quit    leave (or press Ctrl-D)";

/// One line of REPL input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Empty,
    Exit,
    Help,
    Vars,
    Ast(&'a str),
    Eval(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Command::Exit;
        }
        match line.strip_prefix(':') {
            Some("help") => Command::Help,
            Some("vars") => Command::Vars,
            Some("ast") => Command::Ast(""),
            Some(rest) => match rest.strip_prefix("ast") {
                Some(expr) if expr.starts_with(char::is_whitespace) => Command::Ast(expr.trim()),
                _ => Command::Eval(line),
            },
            None => Command::Eval(line),
        }
    }
}

/// `name = value` lines for every binding, sorted by name.
pub fn describe_vars(env: &Environment) -> String {
    if env.is_empty() {
        return "no variables assigned".to_string();
    }
    let mut bindings: Vec<(&str, i64)> = env.iter().collect();
    bindings.sort();
    bindings
        .into_iter()
        .map(|(name, value)| format!("{} = {} (0x{:x})", name, value, value))
        .collect::<Vec<_>>()
        .join("\n")
}

struct VariableCompleter {
    env: Rc<RefCell<Environment>>,
}

impl rustyline::completion::Completer for VariableCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let start = word_start(line, pos);
        let prefix = &line[start..pos];
        if prefix.is_empty() {
            return Ok((pos, vec![]));
        }
        let candidates = self
            .env
            .borrow()
            .identifiers()
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect();
        Ok((start, candidates))
    }
}

// Byte offset where the identifier ending at `pos` begins.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map_or(pos, |(i, _)| i)
}

struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth = 0usize;
        for (i, c) in ctx.input().char_indices() {
            match c {
                '(' => depth += 1,
                ')' if depth == 0 => {
                    return Ok(ValidationResult::Invalid(Some(format!(
                        "  - Unmatched ')' at position {}",
                        i
                    ))));
                }
                ')' => depth -= 1,
                _ => {}
            }
        }
        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct ParenHighlighter;

impl Highlighter for ParenHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let cursor = pos.checked_sub(1);
        // (offset in `line`, offset in `highlighted`) of each open paren
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::with_capacity(line.len());

        for (i, c) in line.char_indices() {
            match c {
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((open, at)) if cursor == Some(i) || cursor == Some(open) => {
                        highlighted.push_str("\x1b[1;34m)\x1b[0m"); // Blue for the pair at the cursor
                        highlighted.replace_range(at..=at, "\x1b[1;34m(\x1b[0m");
                    }
                    Some(_) => highlighted.push(c),
                    None => highlighted.push_str("\x1b[31m)\x1b[0m"), // Red for unmatched
                },
                _ => highlighted.push(c),
            }
        }

        // Unclosed parens, last first so earlier offsets stay valid
        while let Some((_, at)) = stack.pop() {
            highlighted.replace_range(at..=at, "\x1b[31m(\x1b[0m");
        }

        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Highlighter)]
    highlighter: ParenHighlighter,
    #[rustyline(Completer)]
    completer: VariableCompleter,
}

fn execute(command: Command<'_>, env: &mut Environment) {
    match command {
        Command::Empty | Command::Exit => {}
        Command::Help => println!("{}", HELP),
        Command::Vars => println!("{}", describe_vars(env)),
        Command::Ast(input) => match parse(input) {
            Ok(node) => println!("{}", node),
            Err(e) => e.pretty_print(input),
        },
        Command::Eval(input) => match eval_str(input, env) {
            Ok(value) => println!("{}", render(value)),
            Err(e) => e.pretty_print(input),
        },
    }
}

/// Runs the loop until `exit` or end of input. Variables live for the whole
/// session; a line that fails leaves them untouched.
pub fn run(history: Option<&Path>) -> rustyline::Result<()> {
    println!("bitcalc v{}", env!("CARGO_PKG_VERSION"));
    println!("Type ':help' for help, 'exit' or Ctrl-D to quit.");

    let env = Rc::new(RefCell::new(Environment::new()));
    let helper = ReplHelper {
        validator: ParenValidator,
        highlighter: ParenHighlighter,
        completer: VariableCompleter { env: env.clone() },
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(rustyline::EditMode::Emacs)
        .history_ignore_dups(true)?
        .auto_add_history(true)
        .build();
    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    if let Some(path) = history {
        if rl.load_history(path).is_err() {
            println!("No previous history.");
        }
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let command = Command::parse(&line);
                if command == Command::Exit {
                    break;
                }
                execute(command, &mut env.borrow_mut());
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!();
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }

    match history {
        Some(path) => rl.save_history(path),
        None => Ok(()),
    }
}
