//! A tiny interpreter for the eight-command tape language.
//!
//! Programs run against a ring of 32,768 byte cells with a single cursor.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0; a fresh tape for every evaluated expression.
//! - Cursor motion wraps at both ends; cell values wrap modulo 256.
//! - Input `,` reads a single byte; running out of input is an error.
//! - Output `.` writes the byte at the current cell (no newline).
//! - Loops `[]` nest; unbalanced brackets are reported as errors.
//! - Whitespace is ignored and `#` comments run to the end of the line.
//! - Any other character causes an error.
//!
//! Quick start:
//!
//! ```no_run
//! use tapebf::{Interpreter, StdConsole};
//!
//! // Classic "Hello World!"
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let mut bf = Interpreter::new(StdConsole::new());
//! bf.eval(code).expect("program should run");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod console;
pub mod interpreter;
pub mod tape;

pub use console::{BufferConsole, Console, StdConsole};
pub use interpreter::{BracketKind, Interpreter, InterpreterError, StepControl};
pub use tape::{Tape, TapeError, TAPE_CAPACITY};
