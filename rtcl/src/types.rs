//! Public type declarations for the rtcl crate.
//!
//! The heart of the module is the [`Status`] protocol: every command
//! invocation returns one of five status codes, with the actual result
//! value or error payload stored in the interpreter
//! ([`Interp::set_result`](crate::Interp::set_result),
//! [`Interp::fail`](crate::Interp::fail)).

use crate::interp::Interp;
pub use crate::value::Value;
use std::fmt;

/// The integer type used by the language: `i64`.
pub type TclInt = i64;

/// A list of values, the representation of a language-level list.
pub type TclList = Vec<Value>;

/// The result type returned by the script-level entry points
/// [`Interp::eval_string`](crate::Interp::eval_string) and
/// [`Interp::run`](crate::Interp::run).
pub type EvalResult = Result<Value, Exception>;

/// The status code returned by every command invocation.
///
/// `Ok` means the interpreter's result value holds the outcome; `Err`
/// means the interpreter's error payload holds the failure.  `Return`,
/// `Break`, and `Continue` are control-flow codes: `Return` is rewritten
/// to `Ok` by the procedure wrapper, and `Break`/`Continue` are consumed
/// by the looping commands.  Any of the three reaching the top level is
/// promoted to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Err,
    Return,
    Break,
    Continue,
}

impl Status {
    /// The numeric code used when a status must surface as data, e.g. in
    /// the `catch` command's result or the top-level `uncaught error`
    /// message.
    pub fn code(self) -> TclInt {
        self as TclInt
    }
}

/// An error raised during parsing, conversion, or evaluation.
///
/// rtcl errors are messages, not structured variants: the language turns
/// every failure into a string that scripts can catch and inspect.  The
/// status code accompanying an error travels separately as [`Status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    msg: String,
}

impl Exception {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }

    /// The error message, as the `error` and `catch` commands see it.
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

/// A command implemented as a plain Rust function.
///
/// The slice holds the command's arguments, not including the command
/// name — except for the `unknown` fallback handler, which receives the
/// entire word vector so that it can see the name it is standing in for.
pub type CommandFunc = fn(&mut Interp, &[Value]) -> Status;

/// A command implemented as a boxed closure, for hosts that need to
/// capture state.  Registered with
/// [`Interp::set_cmd_closure`](crate::Interp::set_cmd_closure).
pub type CommandClosure = Box<dyn Fn(&mut Interp, &[Value]) -> Status>;
