use std::path::PathBuf;
use std::process::ExitCode;

use bitcalc::{Environment, eval_str, render, repl};
use clap::Parser;

/// Calculator for bitwise expressions over 64-bit signed integers.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Evaluate a single expression and exit instead of starting the REPL.
    #[arg(short, long)]
    cmd: Option<String>,

    /// File the REPL loads its history from and saves it to.
    #[arg(long, default_value = ".bitcalc_history")]
    history: PathBuf,

    /// Neither load nor save REPL history.
    #[arg(long)]
    no_history: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(cmd) = args.cmd.as_deref().filter(|cmd| !cmd.trim().is_empty()) {
        let input = cmd.trim();
        return match eval_str(input, &mut Environment::new()) {
            Ok(value) => {
                println!("{}", render(value));
                ExitCode::SUCCESS
            }
            Err(e) => {
                e.pretty_print(input);
                ExitCode::FAILURE
            }
        };
    }

    let history = (!args.no_history).then_some(args.history.as_path());
    match repl::run(history) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Readline Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
