use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use mal::{Interpreter, InterpreterBuilder, MalError, Value};

#[derive(Parser)]
#[command(name = "mal", version, about = "mal: a small Lisp with closures, tail calls and macros")]
struct Cli {
    /// File to execute
    file: Option<PathBuf>,

    /// Evaluate an expression and print the result
    #[arg(short, long)]
    eval: Option<String>,

    /// Maximum evaluation steps per top-level form (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    step_limit: usize,

    /// Start without the prelude definitions (`not`, `cond`)
    #[arg(long)]
    no_prelude: bool,

    /// REPL history file
    #[arg(long, env = "MAL_HISTORY")]
    history: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let interpreter = InterpreterBuilder::new()
        .with_prelude(!cli.no_prelude)
        .with_step_limit(cli.step_limit)
        .build();

    if let Some(expr) = &cli.eval {
        return match interpreter.eval_str(expr) {
            Ok(val) => {
                println!("{val}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                report(&e);
                ExitCode::FAILURE
            }
        };
    }

    if let Some(file) = &cli.file {
        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading {}: {e}", file.display());
                return ExitCode::FAILURE;
            }
        };
        return match interpreter.eval_str(&content) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprint!("In {}: ", file.display());
                report(&e);
                ExitCode::FAILURE
            }
        };
    }

    let history = cli.history.unwrap_or_else(default_history_path);
    repl(&interpreter, &history)
}

fn report(e: &MalError) {
    eprintln!("Error: {e}");
    if let Some(hint) = e.hint() {
        eprintln!("  hint: {hint}");
    }
}

fn repl(interpreter: &Interpreter, history: &Path) -> ExitCode {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: cannot start line editor: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = rl.load_history(history) {
        tracing::debug!(path = %history.display(), error = %e, "no history loaded");
    }

    println!("mal v{}", env!("CARGO_PKG_VERSION"));
    println!("Type ,help for help, ,quit to exit\n");

    let mut buffer = String::new();
    let mut in_multiline = false;

    loop {
        let prompt = if in_multiline { "  ... " } else { "user> " };
        match rl.readline(prompt) {
            Ok(line) => {
                if !in_multiline {
                    match line.trim() {
                        ",quit" | ",exit" | ",q" => break,
                        ",help" | ",h" => {
                            print_help();
                            continue;
                        }
                        ",env" => {
                            print_env(interpreter);
                            continue;
                        }
                        _ => {}
                    }
                }

                if in_multiline {
                    buffer.push('\n');
                    buffer.push_str(&line);
                } else {
                    buffer = line;
                }

                if !is_balanced(&buffer) {
                    in_multiline = true;
                    continue;
                }

                in_multiline = false;
                let input = std::mem::take(&mut buffer);
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(input);

                match interpreter.rep(input) {
                    Ok(out) => println!("{out}"),
                    Err(e) => report(&e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                if in_multiline {
                    buffer.clear();
                    in_multiline = false;
                    println!("^C");
                    continue;
                }
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    if let Some(dir) = history.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    if let Err(e) = rl.save_history(history) {
        tracing::warn!(path = %history.display(), error = %e, "failed to save history");
    }
    ExitCode::SUCCESS
}

/// True once every opened bracket is closed, ignoring strings and comments.
/// Extra closers count as balanced so the reader gets to report them.
fn is_balanced(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escape = false;
    for ch in input.chars() {
        if in_comment {
            in_comment = ch != '\n';
            continue;
        }
        if escape {
            escape = false;
            continue;
        }
        if ch == '\\' && in_string {
            escape = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match ch {
            ';' => in_comment = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0 && !in_string
}

fn print_help() {
    println!("REPL Commands:");
    println!("  ,quit / ,q    Exit the REPL");
    println!("  ,help / ,h    Show this help");
    println!("  ,env          Show user-defined bindings");
    println!();
    println!("Special Forms:");
    println!("  def! let* do if fn* quote quasiquote quasiquoteexpand");
    println!("  defmacro! macroexpand try*/catch*");
}

fn print_env(interpreter: &Interpreter) {
    let bindings = interpreter.global_env().bindings.borrow();
    let mut user_bindings: Vec<_> = bindings
        .iter()
        .filter(|(_, v)| !matches!(v, Value::NativeFn(_)))
        .map(|(k, v)| (mal::resolve(*k), v))
        .collect();
    user_bindings.sort_by(|(a, _), (b, _)| a.cmp(b));
    if user_bindings.is_empty() {
        println!("(no user-defined bindings)");
    } else {
        for (name, val) in user_bindings {
            println!("  {name} = {val}");
        }
    }
}

fn default_history_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".mal")
        .join("history.txt")
}
