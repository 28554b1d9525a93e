//! An interactive REPL and script runner for the rtcl interpreter.
//!
//! The crate provides two entry points: [`repl`] runs an interactive
//! read-eval-print loop with line editing, and [`script`] executes a
//! script file with command-line arguments.  Both operate on a caller-
//! provided [`rtcl::Interp`], so applications can register their own
//! commands before handing control over.

mod shell;

pub use shell::{repl, script};
