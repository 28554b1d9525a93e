//! rtcl: an embeddable command-language interpreter.
//!
//! rtcl implements a small Tcl-style scripting language: everything is a
//! string, a script is a sequence of commands, and a command is a list of
//! words.  The [`Interp`] struct is the primary API for embedding rtcl into
//! a Rust application.  Given an `Interp`, the application may:
//!
//! * Evaluate scripts and expressions
//! * Check scripts for completeness
//! * Extend the language by defining new commands in Rust
//! * Set and get variables
//! * Register I/O channels
//!
//! # Interp is not Sync!
//!
//! The `Interp` struct (and the rest of rtcl) is intended for use in a
//! single thread.  It is safe to have `Interp`s in different threads, but
//! use `String` (or another `Sync` type) when passing data between them.
//! In particular, [`Value`] is not `Sync`: its lazily-computed
//! representations live behind non-atomic cells.
//!
//! # Evaluating Scripts
//!
//! The simplest way to evaluate a script is to pass it as a string to
//! [`Interp::eval_string`]:
//!
//! ```
//! use rtcl::Interp;
//!
//! let mut interp = Interp::new();
//! let val = interp.eval_string("expr {2 + 2}").unwrap();
//! assert_eq!(val.as_str(), "4");
//! ```
//!
//! # Defining New Commands
//!
//! A command is a Rust function that receives the interpreter and the
//! command's arguments, and returns a [`Status`].  On [`Status::Ok`] the
//! result value has been stored with [`Interp::set_result`]; on
//! [`Status::Err`] the error payload has been stored with [`Interp::fail`].
//!
//! ```
//! use rtcl::{check_args, rtcl_try, Interp, Status, Value};
//!
//! // The command: square intValue
//! fn cmd_square(interp: &mut Interp, args: &[Value]) -> Status {
//!     rtcl_try!(interp, check_args("square", args, 1, 1, "intValue"));
//!     let n = rtcl_try!(interp, args[0].as_int());
//!     interp.set_result(Value::from(n * n))
//! }
//!
//! let mut interp = Interp::new();
//! interp.set_cmd("square", cmd_square);
//! assert_eq!(interp.eval_string("square 5").unwrap().as_str(), "25");
//! ```

mod expr;
mod list;
mod parser;
mod scope;

pub mod commands;
pub mod interp;
pub mod types;
pub mod value;

pub use interp::{Channel, Interp};
pub use parser::{Command, VarRef};
pub use types::*;
pub use value::Value;

use std::fmt::Write as _;

/// Checks a command's argument list against its arity, returning the
/// standard `wrong # args` error when it doesn't match.  `min` and `max`
/// are the allowed argument counts, not counting the command name itself;
/// a `max` of 0 means "any number".  `argsig` is the argument signature to
/// embed in the error message, e.g. `"varName ?newValue?"`.
pub fn check_args(
    name: &str,
    args: &[value::Value],
    min: usize,
    max: usize,
    argsig: &str,
) -> Result<(), Exception> {
    if args.len() >= min && (max == 0 || args.len() <= max) {
        return Ok(());
    }

    let mut msg = String::new();
    let _ = write!(msg, "wrong # args: should be \"{}", name);
    if !argsig.is_empty() {
        let _ = write!(msg, " {}", argsig);
    }
    msg.push('"');
    Err(Exception::new(msg))
}

/// Unwraps a `Result` inside a command implementation, converting an
/// `Err` into an early `Status::Err` return via [`Interp::fail`].
///
/// This is the command-body counterpart of the `?` operator: conversions
/// and variable accesses return `Result`, while commands return [`Status`].
#[macro_export]
macro_rules! rtcl_try {
    ($interp:expr, $e:expr) => {
        match $e {
            Ok(val) => val,
            Err(err) => return $interp.fail(err),
        }
    };
}
