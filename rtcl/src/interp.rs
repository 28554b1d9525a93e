//! The rtcl interpreter.
//!
//! The [`Interp`] struct is the primary API for embedding rtcl into a
//! Rust application.  The application creates an `Interp`, registers any
//! application-specific commands, and then uses it to evaluate scripts
//! and expressions.
//!
//! # Creating an Interpreter
//!
//! [`Interp::new`] creates an interpreter pre-populated with the standard
//! command set.  [`Interp::empty`] creates one with no commands at all,
//! which is useful when crafting small command languages for data or
//! configuration files.
//!
//! # The status protocol
//!
//! Every command invocation returns a [`Status`].  The interpreter holds
//! the accompanying payload: [`Interp::result`] after `Status::Ok`, and
//! the error payload after `Status::Err`.  Command implementations store
//! their outcome with [`Interp::set_result`] or [`Interp::fail`]:
//!
//! ```
//! use rtcl::{check_args, rtcl_try, Interp, Status, Value};
//!
//! // The command: double intValue
//! fn cmd_double(interp: &mut Interp, args: &[Value]) -> Status {
//!     rtcl_try!(interp, check_args("double", args, 1, 1, "intValue"));
//!     let n = rtcl_try!(interp, args[0].as_int());
//!     interp.set_result(Value::from(2 * n))
//! }
//!
//! let mut interp = Interp::new();
//! interp.set_cmd("double", cmd_double);
//! assert_eq!(interp.eval_string("double 21").unwrap().as_str(), "42");
//! ```
//!
//! The script-level entry points [`Interp::eval_string`] and
//! [`Interp::run`] fold the protocol back into a plain `Result`: a
//! `Return`, `Break`, or `Continue` escaping to the top level becomes an
//! `uncaught error: <code>` error.
//!
//! # Variables
//!
//! Variables live in a chain of stack frames.  A procedure call pushes a
//! frame; `upvar` and `global` create link entries that forward reads and
//! writes to another frame.  Hosts usually go through
//! [`Interp::get_var_raw`] and [`Interp::set_var_raw`], which accept
//! string-form names (including `::name` for the global scope and
//! `name(index)` for array elements).

use crate::commands;
use crate::expr;
use crate::parser::{self, Command, Part, VarRef, Word};
use crate::scope::{self, Frame, FrameRef};
use crate::types::*;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

/// An opaque I/O handle, registered by name in the interpreter's channel
/// table.  The core pre-registers `stdin`, `stdout`, and `stderr`;
/// extension commands may add more with [`Interp::set_channel`].
#[derive(Clone)]
pub enum Channel {
    Reader(Rc<RefCell<dyn BufRead>>),
    Writer(Rc<RefCell<dyn Write>>),
}

/// A command defined in the interpreter.
enum CommandDef {
    /// A command implemented as a Rust function.
    Native(CommandFunc),
    /// A command implemented as a Rust closure.
    Closure(CommandClosure),
    /// A user-defined procedure.
    Proc(Procedure),
}

impl CommandDef {
    fn execute(&self, interp: &mut Interp, args: &[Value]) -> Status {
        match self {
            CommandDef::Native(f) => f(interp, args),
            CommandDef::Closure(f) => f(interp, args),
            CommandDef::Proc(p) => p.execute(interp, args),
        }
    }
}

/// The rtcl interpreter.  See the [module docs](self) for an overview.
pub struct Interp {
    // Command table
    commands: IndexMap<String, Rc<CommandDef>>,

    // Channel table
    channels: IndexMap<String, Channel>,

    // Current (top-of-stack) frame of the variable environment.
    frame: FrameRef,

    // The result of the last command (the OK payload).
    retval: Value,

    // The error payload accompanying Status::Err.
    err: Option<Exception>,

    // Guard against runaway recursion through eval_obj.
    recursion_limit: usize,
    num_levels: usize,
}

impl Default for Interp {
    fn default() -> Self {
        Interp::new()
    }
}

impl Interp {
    //--------------------------------------------------------------------
    // Constructors

    /// Creates an interpreter with no commands defined.  Use this when
    /// crafting command languages that shouldn't include the standard
    /// commands, or as a base for a custom command set.
    pub fn empty() -> Self {
        let mut channels = IndexMap::new();
        channels.insert(
            "stdin".to_string(),
            Channel::Reader(Rc::new(RefCell::new(BufReader::new(io::stdin())))),
        );
        channels.insert(
            "stdout".to_string(),
            Channel::Writer(Rc::new(RefCell::new(io::stdout()))),
        );
        channels.insert(
            "stderr".to_string(),
            Channel::Writer(Rc::new(RefCell::new(io::stderr()))),
        );

        Interp {
            commands: IndexMap::new(),
            channels,
            frame: Frame::global(),
            retval: Value::empty(),
            err: None,
            recursion_limit: 1000,
            num_levels: 0,
        }
    }

    /// Creates an interpreter pre-populated with the standard commands.
    pub fn new() -> Self {
        let mut interp = Interp::empty();

        let new_commands: &[(&str, CommandFunc)] = &[
            ("append", commands::cmd_append),
            ("break", commands::cmd_break),
            ("catch", commands::cmd_catch),
            ("concat", commands::cmd_concat),
            ("continue", commands::cmd_continue),
            ("error", commands::cmd_error),
            ("eval", commands::cmd_eval),
            ("exit", commands::cmd_exit),
            ("expr", commands::cmd_expr),
            ("for", commands::cmd_for),
            ("foreach", commands::cmd_foreach),
            ("gets", commands::cmd_gets),
            ("global", commands::cmd_global),
            ("if", commands::cmd_if),
            ("incr", commands::cmd_incr),
            ("join", commands::cmd_join),
            ("lappend", commands::cmd_lappend),
            ("lindex", commands::cmd_lindex),
            ("list", commands::cmd_list),
            ("llength", commands::cmd_llength),
            ("proc", commands::cmd_proc),
            ("puts", commands::cmd_puts),
            ("rename", commands::cmd_rename),
            ("return", commands::cmd_return),
            ("set", commands::cmd_set),
            ("source", commands::cmd_source),
            ("unset", commands::cmd_unset),
            ("uplevel", commands::cmd_uplevel),
            ("upvar", commands::cmd_upvar),
            ("while", commands::cmd_while),
        ];

        for &(name, func) in new_commands {
            interp.set_cmd(name, func);
        }

        interp
    }

    //--------------------------------------------------------------------
    // The status protocol

    /// Stores the result value and reports `Status::Ok`.  Written as the
    /// tail call of a successful command implementation.
    pub fn set_result(&mut self, value: Value) -> Status {
        self.retval = value;
        Status::Ok
    }

    /// The current result value: the payload of the last `Status::Ok`.
    pub fn result(&self) -> &Value {
        &self.retval
    }

    /// Stores the error payload and reports `Status::Err`.  Written as
    /// the tail call of a failing command implementation.
    pub fn fail(&mut self, err: Exception) -> Status {
        self.err = Some(err);
        Status::Err
    }

    /// Like [`fail`](Self::fail), building the exception from a message.
    pub fn fail_str(&mut self, msg: impl Into<String>) -> Status {
        self.fail(Exception::new(msg))
    }

    /// The current error payload, if any.
    pub fn error(&self) -> Option<&Exception> {
        self.err.as_ref()
    }

    /// Discards the current error payload.  The `catch` command uses
    /// this after capturing the message.
    pub fn clear_error(&mut self) {
        self.err = None;
    }

    /// Takes the error payload, synthesizing an `uncaught error` message
    /// when a non-OK status arrived without one.
    pub(crate) fn take_error_or(&mut self, status: Status) -> Exception {
        self.err
            .take()
            .unwrap_or_else(|| Exception::new(format!("uncaught error: {}", status.code())))
    }

    //--------------------------------------------------------------------
    // Script evaluation

    /// Parses and evaluates a script, returning the value of its last
    /// command or the error that stopped it.  A `return`, `break`, or
    /// `continue` escaping the script is promoted to an error here.
    pub fn eval_string(&mut self, script: &str) -> EvalResult {
        let cmds = parser::parse_commands(script)?;
        let status = self.eval(&cmds);
        if status == Status::Ok {
            Ok(self.retval.clone())
        } else {
            Err(self.take_error_or(status))
        }
    }

    /// Reads a script from `reader` and evaluates it as
    /// [`eval_string`](Self::eval_string) does.
    pub fn run<R: io::Read>(&mut self, mut reader: R) -> EvalResult {
        let mut source = String::new();
        reader
            .read_to_string(&mut source)
            .map_err(|e| Exception::new(e.to_string()))?;
        self.eval_string(&source)
    }

    /// Evaluates a value as a script, parsing it on first use; the
    /// parsed command list is cached in the value, so procedure bodies
    /// and control-structure bodies are parsed once.  Unlike
    /// [`eval_string`](Self::eval_string) this returns the raw
    /// [`Status`], leaving `return`/`break`/`continue` to the caller —
    /// it is the building block for control-flow commands.
    pub fn eval_obj(&mut self, value: &Value) -> Status {
        self.num_levels += 1;
        if self.num_levels > self.recursion_limit {
            self.num_levels -= 1;
            return self.fail_str("too many nested evaluations (infinite loop?)");
        }

        let value = value.clone();
        let status = match value.as_commands() {
            Ok(cmds) => self.eval(cmds),
            Err(e) => self.fail(e),
        };

        self.num_levels -= 1;
        status
    }

    /// Determines whether the script is syntactically complete: no
    /// unclosed quotes, brackets, or braces.  REPLs use this to decide
    /// whether to ask for another line of input.
    pub fn complete(&self, script: &str) -> bool {
        parser::parse_commands(script).is_ok()
    }

    /// Executes parsed commands in order.  The first non-OK status stops
    /// evaluation and is returned; otherwise the result value is that of
    /// the last command.
    pub(crate) fn eval(&mut self, cmds: &[Command]) -> Status {
        for cmd in cmds {
            let status = self.eval_command(cmd);
            if status != Status::Ok {
                return status;
            }
        }
        Status::Ok
    }

    /// Executes one command: evaluate the words into an argument vector,
    /// then dispatch on the first word.  An unregistered name falls back
    /// to the `unknown` handler (which receives the full vector,
    /// including the name) before failing.
    pub(crate) fn eval_command(&mut self, cmd: &Command) -> Status {
        if cmd.words.is_empty() {
            return self.set_result(Value::empty());
        }

        let args = match self.eval_words(&cmd.words) {
            Ok(args) => args,
            Err(status) => return status,
        };

        // Every word may have been an expansion of an empty list.
        if args.is_empty() {
            return self.set_result(Value::empty());
        }

        let name = args[0].as_str();
        if let Some(def) = self.commands.get(name) {
            let def = Rc::clone(def);
            return def.execute(self, &args[1..]);
        }
        if let Some(def) = self.commands.get("unknown") {
            let def = Rc::clone(def);
            return def.execute(self, &args);
        }
        let msg = format!("command not found: {}", name);
        self.fail_str(msg)
    }

    /// Evaluates a command's words left to right into the argument
    /// vector, splicing the list elements of any `{*}` word.
    fn eval_words(&mut self, words: &[Word]) -> Result<Vec<Value>, Status> {
        let mut argv = Vec::with_capacity(words.len());
        for word in words {
            let status = self.eval_word(word);
            if status != Status::Ok {
                return Err(status);
            }
            if word.is_expand() {
                let value = self.retval.clone();
                match value.as_list() {
                    Ok(items) => argv.extend(items.iter().cloned()),
                    Err(e) => return Err(self.fail(e)),
                }
            } else {
                argv.push(self.retval.clone());
            }
        }
        Ok(argv)
    }

    /// Evaluates a single word into the result value.
    fn eval_word(&mut self, word: &Word) -> Status {
        match word {
            Word::Literal(v) | Word::Block(v) => self.set_result(v.clone()),
            Word::Var(vr) => match self.get_var(vr) {
                Ok(v) => self.set_result(v),
                Err(e) => self.fail(e),
            },
            Word::Cmd(cmd) => self.eval_command(cmd),
            Word::Quoted(parts) => self.eval_quoted(parts),
            Word::Expand(inner) => self.eval_word(inner),
        }
    }

    /// Concatenates the string forms of a quoted string's parts.
    fn eval_quoted(&mut self, parts: &[Part]) -> Status {
        let mut out = String::new();
        for part in parts {
            match part {
                Part::Raw(s) => out.push_str(s),
                Part::Var(vr) => match self.get_var(vr) {
                    Ok(v) => out.push_str(v.as_str()),
                    Err(e) => return self.fail(e),
                },
                Part::Cmd(cmd) => {
                    let status = self.eval_command(cmd);
                    if status != Status::Ok {
                        return status;
                    }
                    out.push_str(self.retval.as_str());
                }
            }
        }
        self.set_result(Value::from(out))
    }

    //--------------------------------------------------------------------
    // Expression evaluation

    /// Evaluates a value as an expression and returns the computed
    /// value.  The parsed expression tree is cached in the value, so a
    /// braced loop condition parses once.
    pub fn expr(&mut self, value: &Value) -> Result<Value, Exception> {
        let value = value.clone();
        let tree = value.as_expr()?;
        expr::eval_expr(self, tree)
    }

    /// Evaluates a value as an expression and interprets the result as a
    /// boolean, as the conditions of `if` and `while` do.
    pub fn expr_bool(&mut self, value: &Value) -> Result<bool, Exception> {
        Ok(self.expr(value)?.as_bool())
    }

    /// Evaluates a value as an expression, requiring an integer result.
    pub fn expr_int(&mut self, value: &Value) -> Result<TclInt, Exception> {
        self.expr(value)?.as_int()
    }

    //--------------------------------------------------------------------
    // Variables

    /// Retrieves the value of the referenced variable, following links.
    /// An index token on the reference is evaluated and folded into the
    /// lookup key (`name(index)`).
    pub fn get_var(&mut self, vr: &VarRef) -> Result<Value, Exception> {
        let key = self.var_key(vr)?;
        scope::get_var(&self.frame, vr.is_global(), &key)
    }

    /// Sets the value of the referenced variable, creating it if
    /// necessary.  When the existing entry is a link, the store happens
    /// at the link chain's terminal.
    pub fn set_var(&mut self, vr: &VarRef, value: Value) -> Result<(), Exception> {
        let key = self.var_key(vr)?;
        scope::set_var(&self.frame, vr.is_global(), &key, value)
    }

    /// Removes the referenced variable from its frame.  Removing a
    /// linked name severs the link without touching the target; removing
    /// a missing name is a no-op.
    pub fn unset_var(&mut self, vr: &VarRef) -> Result<(), Exception> {
        let key = self.var_key(vr)?;
        scope::unset_var(&self.frame, vr.is_global(), &key);
        Ok(())
    }

    /// [`get_var`](Self::get_var) with a string-form variable name.
    pub fn get_var_raw(&mut self, name: &str) -> Result<Value, Exception> {
        self.get_var(&VarRef::parse(name))
    }

    /// [`set_var`](Self::set_var) with a string-form variable name.
    pub fn set_var_raw(&mut self, name: &str, value: Value) -> Result<(), Exception> {
        self.set_var(&VarRef::parse(name), value)
    }

    /// [`unset_var`](Self::unset_var) with a string-form variable name.
    pub fn unset_var_raw(&mut self, name: &str) -> Result<(), Exception> {
        self.unset_var(&VarRef::parse(name))
    }

    /// Creates the link entry `mine` in the current frame, forwarding to
    /// the variable `theirs` in the frame `level` steps up the call
    /// chain.  This is the mechanism behind `upvar`: subsequent reads
    /// and writes of `mine` transparently access the target.
    pub fn link_var(&mut self, level: usize, theirs: &str, mine: &str) -> Result<(), Exception> {
        scope::link_var(&self.frame, level, theirs, mine)
    }

    fn var_key(&mut self, vr: &VarRef) -> Result<String, Exception> {
        match vr.index() {
            None => Ok(vr.name().to_string()),
            Some(index) => {
                let status = self.eval_word(index);
                if status != Status::Ok {
                    return Err(self.take_error_or(status));
                }
                Ok(format!("{}({})", vr.name(), self.retval.as_str()))
            }
        }
    }

    //--------------------------------------------------------------------
    // Frames

    /// Pushes a frame onto the call stack.  Procedures use this to
    /// create their local scope; a command that pushes a frame must pop
    /// it before returning, whatever the status.
    pub fn push_scope(&mut self) {
        self.frame = Frame::push(&self.frame);
    }

    /// Pops the top frame off the call stack.
    pub fn pop_scope(&mut self) {
        let parent = scope::parent_of(&self.frame).expect("cannot pop the global frame");
        self.frame = parent;
    }

    /// The current frame's distance from the global frame; the global
    /// frame itself is level 0.
    pub fn scope_level(&self) -> usize {
        scope::depth_of(&self.frame)
    }

    pub(crate) fn current_frame(&self) -> FrameRef {
        Rc::clone(&self.frame)
    }

    pub(crate) fn set_current_frame(&mut self, frame: FrameRef) {
        self.frame = frame;
    }

    pub(crate) fn ancestor_frame(&self, level: usize) -> Option<FrameRef> {
        scope::ancestor(&self.frame, level)
    }

    //--------------------------------------------------------------------
    // Commands

    /// Registers a command implemented as a Rust function, replacing any
    /// previous command of that name.
    pub fn set_cmd(&mut self, name: &str, func: CommandFunc) {
        self.commands
            .insert(name.to_string(), Rc::new(CommandDef::Native(func)));
    }

    /// Registers a command implemented as a Rust closure, for hosts that
    /// need to capture state.
    pub fn set_cmd_closure(
        &mut self,
        name: &str,
        func: impl Fn(&mut Interp, &[Value]) -> Status + 'static,
    ) {
        self.commands.insert(
            name.to_string(),
            Rc::new(CommandDef::Closure(Box::new(func))),
        );
    }

    /// Unregisters a command.  Unregistering a missing name is a no-op.
    pub fn remove_cmd(&mut self, name: &str) {
        self.commands.shift_remove(name);
    }

    /// Renames a command.  Procedures that call the command under its
    /// old name are not updated: renaming an existing command and then
    /// wrapping it under the old name is the usual interposition
    /// technique.
    pub fn rename_cmd(&mut self, old_name: &str, new_name: &str) {
        if let Some(def) = self.commands.get(old_name) {
            let def = Rc::clone(def);
            self.commands.shift_remove(old_name);
            self.commands.insert(new_name.to_string(), def);
        }
    }

    /// Whether a command with the given name is registered.
    pub fn has_cmd(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// The names of the registered commands, in registration order.
    pub fn command_names(&self) -> TclList {
        self.commands.keys().map(Value::from).collect()
    }

    /// Defines a user procedure.  `sig` is the parsed signature list;
    /// `body` is parsed here, once, and a parse error is stored so that
    /// every invocation reports it.
    pub(crate) fn add_proc(&mut self, name: &str, sig: &[Value], body: Value) {
        self.commands.insert(
            name.to_string(),
            Rc::new(CommandDef::Proc(Procedure::new(sig, body))),
        );
    }

    //--------------------------------------------------------------------
    // Channels

    /// Looks up a channel by name.
    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.channels.get(name).cloned()
    }

    /// Registers a channel, replacing any previous channel of that name.
    pub fn set_channel(&mut self, name: &str, channel: Channel) {
        self.channels.insert(name.to_string(), channel);
    }

    /// Removes a channel from the registry.
    pub fn remove_channel(&mut self, name: &str) {
        self.channels.shift_remove(name);
    }

    //--------------------------------------------------------------------
    // Configuration

    /// The evaluation nesting limit; see
    /// [`set_recursion_limit`](Self::set_recursion_limit).
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Sets how deep script evaluations may nest (default 1000).  Each
    /// procedure call or `eval_obj` adds a level; exceeding the limit is
    /// an error, protecting the host stack from runaway recursion.
    pub fn set_recursion_limit(&mut self, limit: usize) {
        self.recursion_limit = limit;
    }
}

/// How a procedure is defined: an argument signature and a body value.
/// The name is not stored; it lives only in the command table and can be
/// changed there freely with `rename`.
struct Procedure {
    sigs: Vec<ArgSig>,
    body: Value,
    /// A parse error in the body, captured at definition time; every
    /// invocation fails with it.
    def_err: Option<Exception>,
}

/// One element of a procedure signature: a required name, or a name with
/// a default value.
struct ArgSig {
    name: String,
    default: Option<Value>,
}

impl Procedure {
    fn new(sig: &[Value], body: Value) -> Self {
        let sigs = sig
            .iter()
            .map(|spec| match spec.as_list() {
                Ok(pair) if pair.len() == 2 => ArgSig {
                    name: pair[0].as_str().to_string(),
                    default: Some(pair[1].clone()),
                },
                _ => ArgSig {
                    name: spec.as_str().to_string(),
                    default: None,
                },
            })
            .collect();

        let def_err = body.as_commands().err();
        Procedure {
            sigs,
            body,
            def_err,
        }
    }

    fn execute(&self, interp: &mut Interp, args: &[Value]) -> Status {
        if let Some(e) = &self.def_err {
            return interp.fail(e.clone());
        }

        interp.push_scope();

        if let Err(e) = self.bind_args(interp, args) {
            interp.pop_scope();
            return interp.fail(e);
        }

        let mut status = interp.eval_obj(&self.body);
        if status == Status::Return {
            status = Status::Ok;
        }

        interp.pop_scope();
        status
    }

    /// Binds arguments positionally in the procedure's fresh frame.  A
    /// final `args` element captures the remaining arguments as a list;
    /// defaults fill absent trailing arguments; a missing required
    /// argument is an error.
    fn bind_args(&self, interp: &mut Interp, args: &[Value]) -> Result<(), Exception> {
        let last = self.sigs.len().wrapping_sub(1);
        for (i, sig) in self.sigs.iter().enumerate() {
            if i == last && sig.name == "args" {
                let rest = args.get(i..).unwrap_or(&[]);
                interp.set_var_raw("args", Value::from(rest))?;
                return Ok(());
            }
            if let Some(arg) = args.get(i) {
                interp.set_var_raw(&sig.name, arg.clone())?;
            } else if let Some(default) = &sig.default {
                interp.set_var_raw(&sig.name, default.clone())?;
            } else {
                return Err(Exception::new("arg count mismatch"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_interp() {
        let mut interp = Interp::empty();
        assert!(interp.command_names().is_empty());
        let err = interp.eval_string("set a 1").unwrap_err();
        assert_eq!(err.message(), "command not found: set");
    }

    #[test]
    fn test_eval_string() {
        let mut interp = Interp::new();
        assert_eq!(interp.eval_string("set a 1").unwrap(), Value::from("1"));
        assert_eq!(
            interp.eval_string("error boom").unwrap_err().message(),
            "boom"
        );
    }

    #[test]
    fn test_empty_script() {
        let mut interp = Interp::new();
        assert_eq!(interp.eval_string("").unwrap().as_str(), "");
        assert_eq!(interp.eval_string("   \n  ").unwrap().as_str(), "");
    }

    #[test]
    fn test_empty_command_yields_empty() {
        let mut interp = Interp::new();
        assert_eq!(interp.eval_string("set a [list]; set b []").unwrap().as_str(), "");
    }

    #[test]
    fn test_uncaught_control_codes() {
        let mut interp = Interp::new();
        // A top-level return, break, or continue has no handler; the
        // status code surfaces in a synthesized error.
        assert_eq!(
            interp.eval_string("return 3").unwrap_err().message(),
            "uncaught error: 2"
        );
        assert_eq!(
            interp.eval_string("break").unwrap_err().message(),
            "uncaught error: 3"
        );
        assert_eq!(
            interp.eval_string("continue").unwrap_err().message(),
            "uncaught error: 4"
        );
    }

    #[test]
    fn test_run_reader() {
        let mut interp = Interp::new();
        let script = "set a 5; expr {$a * 2}";
        let value = interp.run(script.as_bytes()).unwrap();
        assert_eq!(value.as_str(), "10");
    }

    #[test]
    fn test_last_result_wins() {
        let mut interp = Interp::new();
        assert_eq!(
            interp.eval_string("set a 1\nset b 2\nset c 3").unwrap(),
            Value::from("3")
        );
    }

    #[test]
    fn test_command_not_found() {
        let mut interp = Interp::new();
        assert_eq!(
            interp.eval_string("frobnicate 1 2").unwrap_err().message(),
            "command not found: frobnicate"
        );
    }

    #[test]
    fn test_unknown_fallback() {
        let mut interp = Interp::new();
        // The unknown handler receives the full word vector, name included.
        interp.set_cmd_closure("unknown", |interp, args| {
            let words: Vec<&str> = args.iter().map(|a| a.as_str()).collect();
            let joined = words.join(",");
            interp.set_result(Value::from(joined))
        });
        assert_eq!(
            interp.eval_string("frobnicate 1 2").unwrap().as_str(),
            "frobnicate,1,2"
        );
    }

    #[test]
    fn test_set_cmd_closure_captures() {
        let mut interp = Interp::new();
        let greeting = String::from("hi");
        interp.set_cmd_closure("greet", move |interp, args| {
            let who = args.first().map(|a| a.as_str()).unwrap_or("world");
            let msg = format!("{} {}", greeting, who);
            interp.set_result(Value::from(msg))
        });
        assert_eq!(interp.eval_string("greet rtcl").unwrap().as_str(), "hi rtcl");
    }

    #[test]
    fn test_remove_and_rename_cmd() {
        let mut interp = Interp::new();
        interp.rename_cmd("expr", "=");
        assert!(!interp.has_cmd("expr"));
        assert_eq!(interp.eval_string("= {1 + 1}").unwrap().as_str(), "2");

        interp.remove_cmd("=");
        assert!(interp.eval_string("= {1 + 1}").is_err());
    }

    #[test]
    fn test_variable_substitution() {
        let mut interp = Interp::new();
        interp.set_var_raw("x", Value::from("hello")).unwrap();
        assert_eq!(interp.eval_string("set y $x").unwrap().as_str(), "hello");

        let err = interp.eval_string("set y $nope").unwrap_err();
        assert_eq!(err.message(), "variable not found: $nope");
    }

    #[test]
    fn test_global_reference() {
        let mut interp = Interp::new();
        interp
            .eval_string("set g 10; proc peek {} { set ::g }; proc poke {} { set ::g 20 }")
            .unwrap();
        assert_eq!(interp.eval_string("peek").unwrap().as_str(), "10");
        interp.eval_string("poke").unwrap();
        assert_eq!(interp.get_var_raw("g").unwrap().as_str(), "20");
    }

    #[test]
    fn test_array_element_keys() {
        let mut interp = Interp::new();
        interp.eval_string("set a(1) one; set a(2) two").unwrap();
        assert_eq!(interp.get_var_raw("a(1)").unwrap().as_str(), "one");
        assert_eq!(interp.eval_string("set a(2)").unwrap().as_str(), "two");
        // An index inside a $-reference is itself substituted.
        interp.set_var_raw("i", Value::from(1)).unwrap();
        assert_eq!(interp.eval_string("set x $a($i)").unwrap().as_str(), "one");
    }

    #[test]
    fn test_quoted_word_evaluation() {
        let mut interp = Interp::new();
        interp.set_var_raw("name", Value::from("world")).unwrap();
        assert_eq!(
            interp.eval_string(r#"set s "hello $name""#).unwrap().as_str(),
            "hello world"
        );
        assert_eq!(
            interp
                .eval_string(r#"set s "1+1=[expr {1 + 1}]""#)
                .unwrap()
                .as_str(),
            "1+1=2"
        );
    }

    #[test]
    fn test_side_effects_left_to_right() {
        let mut interp = Interp::new();
        let v = interp.eval_string("set a 1; list [set a 2] $a").unwrap();
        assert_eq!(v.as_str(), "2 2");
    }

    #[test]
    fn test_expansion() {
        let mut interp = Interp::new();
        interp.eval_string("set L {a b c}").unwrap();
        let v = interp.eval_string("list {*}$L d").unwrap();
        assert_eq!(v.as_str(), "a b c d");
        assert_eq!(v.as_list().unwrap().len(), 4);

        // An expansion of an empty list contributes nothing.
        interp.eval_string("set E {}").unwrap();
        let v = interp.eval_string("list {*}$E d").unwrap();
        assert_eq!(v.as_list().unwrap().len(), 1);

        // A command that expands to zero words is an empty command.
        assert_eq!(interp.eval_string("{*}$E").unwrap().as_str(), "");
    }

    #[test]
    fn test_expansion_matches_inline() {
        let mut interp = Interp::new();
        interp.eval_string("set L {a b c}").unwrap();
        let expanded = interp.eval_string("list {*}$L d").unwrap();
        let inline = interp.eval_string("list a b c d").unwrap();
        assert_eq!(expanded, inline);
    }

    #[test]
    fn test_proc_definition_and_call() {
        let mut interp = Interp::new();
        interp
            .eval_string("proc add {a b} { return [expr {$a + $b}] }")
            .unwrap();
        assert_eq!(interp.eval_string("add 3 4").unwrap().as_str(), "7");
    }

    #[test]
    fn test_proc_defaults_and_variadic() {
        let mut interp = Interp::new();
        interp
            .eval_string("proc greet {{who world} args} { list $who $args }")
            .unwrap();
        assert_eq!(interp.eval_string("greet").unwrap().as_str(), "world {}");
        assert_eq!(interp.eval_string("greet bob").unwrap().as_str(), "bob {}");
        assert_eq!(
            interp.eval_string("greet bob 1 2").unwrap().as_str(),
            "bob {1 2}"
        );
    }

    #[test]
    fn test_proc_arg_count_mismatch() {
        let mut interp = Interp::new();
        interp.eval_string("proc two {a b} { list $a $b }").unwrap();
        assert_eq!(
            interp.eval_string("two 1").unwrap_err().message(),
            "arg count mismatch"
        );
    }

    #[test]
    fn test_proc_frames_pop_on_error() {
        let mut interp = Interp::new();
        interp
            .eval_string("proc boom {} { set local 1; error bad }")
            .unwrap();
        assert_eq!(interp.scope_level(), 0);
        assert!(interp.eval_string("boom").is_err());
        assert_eq!(interp.scope_level(), 0);
        // The local did not leak into the global frame.
        assert!(interp.get_var_raw("local").is_err());
    }

    #[test]
    fn test_proc_body_parse_error_stored() {
        let mut interp = Interp::new();
        interp.eval_string("proc broken {} {set a [}").unwrap();
        let err = interp.eval_string("broken").unwrap_err();
        assert_eq!(err.message(), "Expected word, got 'EOF'");
    }

    #[test]
    fn test_recursion_limit() {
        let mut interp = Interp::new();
        assert_eq!(interp.recursion_limit(), 1000);
        interp.set_recursion_limit(100);

        interp.eval_string("proc spin {} { spin }").unwrap();
        let err = interp.eval_string("spin").unwrap_err();
        assert_eq!(
            err.message(),
            "too many nested evaluations (infinite loop?)"
        );
        // The level counter unwound cleanly.
        assert_eq!(interp.eval_string("expr {1 + 1}").unwrap().as_str(), "2");
    }

    #[test]
    fn test_complete() {
        let interp = Interp::new();
        assert!(interp.complete("set a 1"));
        assert!(interp.complete("a {bc} [def] \"ghi\" xyz"));
        assert!(!interp.complete("a {bc"));
        assert!(!interp.complete("a [bc"));
        assert!(!interp.complete("a \"bc"));
    }

    #[test]
    fn test_link_var_api() {
        let mut interp = Interp::new();
        interp.set_var_raw("x", Value::from("1")).unwrap();
        interp.push_scope();
        interp.link_var(1, "x", "y").unwrap();
        interp.set_var_raw("y", Value::from("2")).unwrap();
        interp.pop_scope();
        assert_eq!(interp.get_var_raw("x").unwrap().as_str(), "2");
    }
}
