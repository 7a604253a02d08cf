//! Single-pass recursive interpreter.
//!
//! There is no separate lexer or syntax tree: [`Interpreter::eval`] walks the
//! source characters once per structural level, validating and executing in
//! the same pass. Every `[` recurses one level deeper with its own
//! `(position, level, executing)` state. When a loop's body has to be skipped,
//! the body is scanned with `executing = false` (a dry pass) purely to find the
//! matching `]`.
//!
//! Recognized characters:
//! - `>` `<` move the cursor (wrapping), `+` `-` change the cell (wrapping).
//! - `.` writes the current cell, `,` reads one byte into it; end of input is an error.
//! - `[` ... `]` loops while the current cell is non-zero.
//! - Space, tab, CR and LF are ignored; `#` starts a comment running to the next LF.
//! - Anything else is an error naming the character.
//!
//! ```
//! use tapebf::{BufferConsole, Interpreter};
//!
//! let mut bf = Interpreter::new(BufferConsole::new());
//! bf.eval("++++++++[>++++++++<-]>.").expect("program should run");
//! assert_eq!(bf.console().output(), b"@");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::console::Console;
use crate::tape::{Tape, TapeError, TAPE_CAPACITY};

/// Deepest loop nesting a program may use. Each level costs two stack frames.
pub const MAX_NESTING_DEPTH: usize = 4096;

/// Stack size for a thread that evaluates programs nested up to
/// [`MAX_NESTING_DEPTH`] levels, unoptimized builds included.
pub const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Errors that abort the evaluation of an expression.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// A character outside the language was found.
    #[error("unexpected character <{ch}> at position {pos}")]
    UnexpectedCharacter { ch: char, pos: usize },

    /// A `]` without an opening `[`, or a `[` never closed.
    #[error("unbalanced statement: unmatched {kind} at position {pos}")]
    UnbalancedStatement { pos: usize, kind: BracketKind },

    /// The tape cursor no longer indexes a cell.
    #[error(transparent)]
    OutOfRange(#[from] TapeError),

    /// `,` found no more input.
    #[error("end of input while reading at position {pos}")]
    EndOfInput { pos: usize },

    /// Reading or writing a byte failed.
    #[error("I/O error at position {pos}: {source}")]
    Io {
        pos: usize,
        #[source]
        source: io::Error,
    },

    /// Loops are nested deeper than the interpreter allows.
    #[error("loop nesting deeper than {limit} levels at position {pos}")]
    NestingTooDeep { pos: usize, limit: usize },

    /// The top-level scan stopped before the end of the source.
    #[error("error while parsing: scan stopped at position {pos}")]
    ParseIncomplete { pos: usize },

    /// Execution aborted due to step limit.
    #[error("execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted by raising the cancel flag.
    #[error("execution aborted: cancelled")]
    Canceled,
}

impl InterpreterError {
    /// Character index in the expression the error refers to, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            InterpreterError::UnexpectedCharacter { pos, .. }
            | InterpreterError::UnbalancedStatement { pos, .. }
            | InterpreterError::NestingTooDeep { pos, .. }
            | InterpreterError::EndOfInput { pos }
            | InterpreterError::Io { pos, .. }
            | InterpreterError::ParseIncomplete { pos } => Some(*pos),
            InterpreterError::OutOfRange(_)
            | InterpreterError::StepLimitExceeded { .. }
            | InterpreterError::Canceled => None,
        }
    }
}

/// Which side of a loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Open,
    Close,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Open => write!(f, "'['"),
            BracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Controls for cooperative cancellation and step limiting.
///
/// Without a `StepControl` a loop whose cell never reaches zero runs forever.
#[derive(Debug, Clone)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// Evaluates expressions against a fresh tape each, performing I/O through `C`.
pub struct Interpreter<C> {
    console: C,
    capacity: usize,
    max_depth: usize,
    step_control: Option<StepControl>,
}

impl<C: Console> Interpreter<C> {
    /// Interpreter using tapes of [`TAPE_CAPACITY`] cells.
    pub fn new(console: C) -> Self {
        Self::with_capacity(console, TAPE_CAPACITY)
    }

    pub fn with_capacity(console: C, capacity: usize) -> Self {
        Self {
            console,
            capacity,
            max_depth: MAX_NESTING_DEPTH,
            step_control: None,
        }
    }

    /// Bound every following `eval` by `step_control`.
    pub fn set_step_control(&mut self, step_control: StepControl) {
        self.step_control = Some(step_control);
    }

    /// Limit loop nesting to `max_depth` levels. The caller's stack must be
    /// able to hold that many levels; see [`EVAL_STACK_SIZE`].
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn into_console(self) -> C {
        self.console
    }

    /// Evaluate one expression on a brand new tape.
    ///
    /// Returns `Ok(())` once the whole source has been consumed, or the first
    /// [`InterpreterError`] raised anywhere in the nested scan.
    pub fn eval(&mut self, source: &str) -> Result<(), InterpreterError> {
        let mut tape = Tape::with_capacity(self.capacity);
        self.eval_on(&mut tape, source)
    }

    fn eval_on(&mut self, tape: &mut Tape, source: &str) -> Result<(), InterpreterError> {
        let code: Vec<char> = source.chars().collect();
        let mut scan = Scan {
            tape,
            console: &mut self.console,
            code: &code,
            loop_ends: HashMap::new(),
            max_depth: self.max_depth,
            control: self.step_control.as_ref(),
            steps: 0,
        };

        let end = scan.parse(0, 0, true)?;
        if end != code.len() {
            return Err(InterpreterError::ParseIncomplete { pos: end });
        }

        self.console
            .flush()
            .map_err(|source| InterpreterError::Io { pos: end, source })
    }
}

/// State shared by every level of one evaluation.
struct Scan<'a, C> {
    tape: &'a mut Tape,
    console: &'a mut C,
    code: &'a [char],
    // opening bracket position -> matching closing bracket position
    loop_ends: HashMap<usize, usize>,
    max_depth: usize,
    control: Option<&'a StepControl>,
    steps: usize,
}

impl<C: Console> Scan<'_, C> {
    /// Scan from `start` until the `]` closing this level (returned) or the
    /// end of the source (returns its length; only valid at level 0).
    fn parse(&mut self, start: usize, level: usize, executing: bool) -> Result<usize, InterpreterError> {
        let len = self.code.len();
        let mut pos = start;

        while pos < len {
            let ch = self.code[pos];
            match ch {
                ' ' | '\t' | '\r' | '\n' => {}
                '#' => {
                    while pos < len && self.code[pos] != '\n' {
                        pos += 1;
                    }
                }
                '[' => pos = self.enter_loop(pos, level, executing)?,
                ']' => {
                    if level == 0 {
                        return Err(InterpreterError::UnbalancedStatement {
                            pos,
                            kind: BracketKind::Close,
                        });
                    }
                    return Ok(pos);
                }
                '>' | '<' | '+' | '-' | '.' | ',' if !executing => {}
                '>' => {
                    self.tick()?;
                    self.tape.advance();
                }
                '<' => {
                    self.tick()?;
                    self.tape.retreat();
                }
                '+' => {
                    self.tick()?;
                    self.tape.increment()?;
                }
                '-' => {
                    self.tick()?;
                    self.tape.decrement()?;
                }
                '.' => {
                    self.tick()?;
                    self.output(pos)?;
                }
                ',' => {
                    self.tick()?;
                    self.input(pos)?;
                }
                _ => return Err(InterpreterError::UnexpectedCharacter { ch, pos }),
            }
            pos += 1;
        }

        if level > 0 {
            // `start` is just past the `[` that opened this level.
            return Err(InterpreterError::UnbalancedStatement {
                pos: start - 1,
                kind: BracketKind::Open,
            });
        }
        Ok(len)
    }

    /// Run the loop opened at `open` and return the position of its `]`.
    fn enter_loop(&mut self, open: usize, level: usize, executing: bool) -> Result<usize, InterpreterError> {
        if level >= self.max_depth {
            return Err(InterpreterError::NestingTooDeep {
                pos: open,
                limit: self.max_depth,
            });
        }

        let body = open + 1;
        let mut close = None;

        if executing {
            loop {
                self.tick()?;
                if self.tape.read()? == 0 {
                    break;
                }
                close = Some(self.parse(body, level + 1, true)?);
            }
        }

        // A body that never ran still has to be validated to find its end,
        // unless an earlier pass already did so.
        let close = match close.or_else(|| self.loop_ends.get(&open).copied()) {
            Some(close) => close,
            None => self.parse(body, level + 1, false)?,
        };
        self.loop_ends.insert(open, close);
        Ok(close)
    }

    fn output(&mut self, pos: usize) -> Result<(), InterpreterError> {
        let byte = self.tape.read()?;
        self.console
            .write_byte(byte)
            .map_err(|source| InterpreterError::Io { pos, source })
    }

    fn input(&mut self, pos: usize) -> Result<(), InterpreterError> {
        match self.console.read_byte() {
            Ok(Some(byte)) => {
                self.tape.write(byte)?;
                Ok(())
            }
            Ok(None) => Err(InterpreterError::EndOfInput { pos }),
            Err(source) => Err(InterpreterError::Io { pos, source }),
        }
    }

    fn tick(&mut self) -> Result<(), InterpreterError> {
        let Some(ctrl) = self.control else {
            return Ok(());
        };

        if ctrl.cancel_flag.load(Ordering::Relaxed) {
            return Err(InterpreterError::Canceled);
        }
        if let Some(max) = ctrl.max_steps {
            if self.steps >= max {
                return Err(InterpreterError::StepLimitExceeded { limit: max });
            }
        }
        self.steps += 1;
        Ok(())
    }
}
