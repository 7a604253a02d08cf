use clap::Args;
use std::{fs, thread};
use std::io::{self, Write};
use std::sync::{mpsc, Arc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cli_util::{print_interpreter_error, write_error, write_line};
use crate::config::{Limits, MAX_STEPS_ENV, TIMEOUT_MS_ENV};
use crate::interpreter::{EVAL_STACK_SIZE, MAX_NESTING_DEPTH};
use crate::{Interpreter, InterpreterError, StdConsole, StepControl};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct EvalArgs {
    /// Evaluate the contents of PATH as a single expression
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<String>,

    /// Wall-clock timeout for the whole run in milliseconds (fallback TAPEBF_TIMEOUT_MS; default unlimited)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps per expression before abort (fallback TAPEBF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<usize>,

    /// Expressions, each evaluated on a fresh tape
    #[arg(value_name = "EXPRESSIONS", allow_hyphen_values = true)]
    pub expressions: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

/// Why a run stopped early: which expression failed and how.
type Failure = (usize, InterpreterError);

pub fn run(program: &str, args: EvalArgs) -> i32 {
    if args.help {
        write_line(&usage(program));
        return 0;
    }

    let EvalArgs {
        file,
        timeout_ms,
        max_steps,
        expressions,
        ..
    } = args;

    if file.is_some() && !expressions.is_empty() {
        write_error(program, "cannot use positional expressions together with --file");
        usage_and_exit(program, 2);
    }

    let expressions = match file {
        Some(path) => match fs::read_to_string(&path) {
            Ok(s) => vec![s],
            Err(e) => {
                write_error(program, &format!("failed to read {path} as UTF-8: {e}"));
                return 1;
            }
        },
        None => expressions,
    };

    let limits = Limits::resolve(max_steps, timeout_ms);
    let cancel = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(AtomicBool::new(false));

    // First ctrl+c asks the interpreter to stop; a second one leaves at once
    // (the program may be blocked reading stdin).
    let cancel_handler = cancel.clone();
    let interrupted_handler = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        interrupted_handler.store(true, Ordering::Relaxed);
        if cancel_handler.swap(true, Ordering::Relaxed) {
            let _ = io::stdout().flush();
            let _ = io::stderr().flush();
            std::process::exit(130);
        }
    }) {
        write_error(program, &format!("failed to set ctrl+c handler: {e}"));
        return 1;
    }

    // Execute on a worker thread with cooperative cancellation
    let (tx, rx) = mpsc::channel::<Result<(), Failure>>();
    let worker_expressions = expressions.clone();
    let ctrl = StepControl::new(limits.max_steps, cancel.clone());

    let spawned = thread::Builder::new()
        .name("tapebf-eval".to_string())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || {
            let _ = tx.send(eval_all(&worker_expressions, ctrl));
        });
    if let Err(e) = spawned {
        write_error(program, &format!("failed to start interpreter thread: {e}"));
        return 1;
    }

    let outcome = match limits.timeout_ms {
        Some(ms) => rx.recv_timeout(Duration::from_millis(ms)),
        None => rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
    };

    match outcome {
        Ok(Ok(())) => 0,
        Ok(Err((_, InterpreterError::Canceled))) => {
            let reason = cancel_reason(interrupted.load(Ordering::Relaxed), limits.timeout_ms);
            write_error(program, &reason);
            1
        }
        Ok(Err((index, err))) => {
            print_interpreter_error(program, &expressions[index], &err);
            1
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            let _ = io::stdout().flush();
            let ms = limits.timeout_ms.unwrap_or_default();
            write_error(program, &format!("execution aborted: wall-clock timeout exceeded ({ms} ms)"));
            1
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            write_error(program, "interpreter thread stopped unexpectedly");
            1
        }
    }
}

/// Explain a cancellation: ctrl+c takes precedence, otherwise only the
/// timeout can have raised the flag.
fn cancel_reason(interrupted: bool, timeout_ms: Option<u64>) -> String {
    match timeout_ms {
        Some(ms) if !interrupted => {
            format!("execution aborted: wall-clock timeout exceeded ({ms} ms)")
        }
        _ => "execution aborted: interrupted".to_string(),
    }
}

/// Evaluate every expression in order on its own tape, stopping at the first failure.
fn eval_all(expressions: &[String], ctrl: StepControl) -> Result<(), Failure> {
    let mut bf = Interpreter::new(StdConsole::new());
    bf.set_step_control(ctrl);
    for (index, expression) in expressions.iter().enumerate() {
        bf.eval(expression).map_err(|err| (index, err))?;
    }
    Ok(())
}

fn usage(program: &str) -> String {
    format!(
        r#"Usage:
  {0} [OPTIONS] [EXPRESSIONS...]
  {0} [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>  Evaluate the contents of PATH instead of positional expressions
  --max-steps <N>     Abort an expression after N steps (fallback {1}; default unlimited)
  --timeout <MS>      Abort after MS milliseconds of wall-clock time (fallback {2}; default unlimited)
  --help,  -h         Show this help

Notes:
- Each expression runs on a fresh tape of 32768 cells; evaluation stops at the first error.
- Loops may nest at most {3} levels deep.
- Input (`,`) reads a single byte from stdin; reading past end of input is an error.
- Whitespace is ignored and `#` starts a comment that runs to the end of the line.
- Any other characters outside of ><+-.,[] will result in an error.
- Limits may also be set in the [limits] section of $XDG_CONFIG_HOME/tapebf.toml.

Examples:
- Print '@':
    {0} "++++++++[>++++++++<-]>."
- Echo stdin until a zero byte:
    {0} ",[.,]" < input.txt"#,
        program, MAX_STEPS_ENV, TIMEOUT_MS_ENV, MAX_NESTING_DEPTH
    )
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!("{}", usage(program));
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_names_the_program_and_limits() {
        let text = usage("tapebf");
        assert!(text.starts_with("Usage:\n  tapebf [OPTIONS] [EXPRESSIONS...]"));
        assert!(text.contains(MAX_STEPS_ENV));
        assert!(text.contains(TIMEOUT_MS_ENV));
    }

    #[test]
    fn cancel_reason_prefers_interrupt_over_timeout() {
        assert_eq!(cancel_reason(true, Some(100)), "execution aborted: interrupted");
        assert_eq!(cancel_reason(true, None), "execution aborted: interrupted");
        assert_eq!(
            cancel_reason(false, Some(100)),
            "execution aborted: wall-clock timeout exceeded (100 ms)"
        );
    }

    #[test]
    fn eval_all_stops_at_first_failing_expression() {
        let ctrl = StepControl::new(Some(100), Arc::new(AtomicBool::new(false)));
        let expressions = vec!["+-".to_string(), "+]".to_string(), "@".to_string()];
        let result = eval_all(&expressions, ctrl);
        assert!(matches!(
            result,
            Err((1, InterpreterError::UnbalancedStatement { pos: 1, .. }))
        ));
    }
}
