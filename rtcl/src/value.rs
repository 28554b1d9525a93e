//! The rtcl value type.
//!
//! [`Value`] is the representation of all data passing through the
//! interpreter: command arguments, variable contents, results.  Logically
//! a value is just a string; operationally it is a tagged container that
//! carries up to six cached views of the same datum:
//!
//! * the canonical string form,
//! * a parsed integer,
//! * a parsed list of child values,
//! * a parsed script (list of commands),
//! * a parsed variable reference,
//! * a parsed expression tree.
//!
//! At least one view is populated at all times; the others are computed
//! on demand from the canonical string and then cached for the lifetime
//! of the value.  Values are immutable: once a view has been computed it
//! is never invalidated, and "mutation" always builds a new value.  The
//! caches use plain (non-atomic) cells, which is why `Value` is neither
//! `Send` nor `Sync`; an interpreter and its values belong to one thread.
//!
//! Cloning a value is cheap (a reference-count bump), and clones share
//! their caches: parsing a procedure body once makes every later
//! invocation reuse the parsed script.

use crate::expr::Expr;
use crate::list::list_to_string;
use crate::parser::{self, Command, VarRef};
use crate::types::{Exception, TclInt};
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

/// A single rtcl value.  See the [module docs](self) for the data model.
#[derive(Clone)]
pub struct Value(Rc<Inner>);

#[derive(Default)]
struct Inner {
    string: OnceCell<String>,
    int: OnceCell<TclInt>,
    list: OnceCell<Vec<Value>>,
    commands: OnceCell<Vec<Command>>,
    var_ref: OnceCell<VarRef>,
    expr: OnceCell<Expr>,
}

// Integers in [0, 256) are interned so that hot values (loop counters,
// booleans, status codes) share one allocation per thread.
const SMALL_INT_COUNT: usize = 256;

thread_local! {
    static SMALL_INTS: [Value; SMALL_INT_COUNT] =
        std::array::from_fn(|i| Value::raw_int(i as TclInt));
    static EMPTY: Value = Value::raw_str(String::new());
}

impl Value {
    fn raw_str(s: String) -> Self {
        let inner = Inner::default();
        let _ = inner.string.set(s);
        Value(Rc::new(inner))
    }

    fn raw_int(i: TclInt) -> Self {
        let inner = Inner::default();
        let _ = inner.int.set(i);
        Value(Rc::new(inner))
    }

    fn raw_list(items: Vec<Value>) -> Self {
        let inner = Inner::default();
        let _ = inner.list.set(items);
        Value(Rc::new(inner))
    }

    /// The empty value, used as the result of commands that have nothing
    /// to say.  Shared per thread.
    pub fn empty() -> Self {
        EMPTY.with(Value::clone)
    }

    /// Returns the value's string form, serializing it from the canonical
    /// populated view on first access (integers in base 10, lists by the
    /// brace-wrapping join rule).
    pub fn as_str(&self) -> &str {
        self.0.string.get_or_init(|| {
            if let Some(i) = self.0.int.get() {
                i.to_string()
            } else if let Some(items) = self.0.list.get() {
                list_to_string(items)
            } else {
                // Constructors always populate at least one view.
                panic!("value has no representation")
            }
        })
    }

    /// Interprets the value as an integer.
    pub fn as_int(&self) -> Result<TclInt, Exception> {
        if let Some(&i) = self.0.int.get() {
            return Ok(i);
        }
        let s = self.as_str();
        match s.parse::<TclInt>() {
            Ok(i) => {
                let _ = self.0.int.set(i);
                Ok(i)
            }
            Err(_) => Err(Exception::new(format!(
                "expected integer but got \"{}\"",
                s
            ))),
        }
    }

    /// Interprets the value as a boolean.  Numeric values are true iff
    /// non-zero; of the rest, the strings `false` and `no` are false and
    /// everything else is true.
    pub fn as_bool(&self) -> bool {
        match self.as_int() {
            Ok(i) => i != 0,
            Err(_) => {
                let s = self.as_str();
                s != "false" && s != "no"
            }
        }
    }

    /// Interprets the value as a list, parsing the string form on first
    /// access.  List parsing is pure lexing: no substitution is
    /// performed.
    pub fn as_list(&self) -> Result<&[Value], Exception> {
        if self.0.list.get().is_none() {
            let items: Vec<Value> = parser::parse_list(self.as_str())?
                .into_iter()
                .map(Value::from)
                .collect();
            let _ = self.0.list.set(items);
        }
        Ok(self.0.list.get().expect("list view just populated"))
    }

    /// Interprets the value as a script, parsing the string form into a
    /// command list on first access.  Procedure bodies rely on this
    /// cache: they parse once, at definition time.
    pub fn as_commands(&self) -> Result<&[Command], Exception> {
        if self.0.commands.get().is_none() {
            let cmds = parser::parse_commands(self.as_str())?;
            let _ = self.0.commands.set(cmds);
        }
        Ok(self.0.commands.get().expect("script view just populated"))
    }

    /// Interprets the value as a variable reference: an optional leading
    /// `::` marks the global scope, and a trailing `(index)` attaches an
    /// array index.
    pub fn as_var_ref(&self) -> &VarRef {
        self.0.var_ref.get_or_init(|| VarRef::parse(self.as_str()))
    }

    /// Interprets the value as an expression, parsing on first access so
    /// that loop conditions are parsed once, not per iteration.
    pub(crate) fn as_expr(&self) -> Result<&Expr, Exception> {
        if self.0.expr.get().is_none() {
            let expr = crate::expr::parse_expr(self.as_str())?;
            let _ = self.0.expr.set(expr);
        }
        Ok(self.0.expr.get().expect("expr view just populated"))
    }

    #[cfg(test)]
    pub(crate) fn is_same(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::raw_str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::raw_str(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::raw_str(s.clone())
    }
}

impl From<TclInt> for Value {
    fn from(i: TclInt) -> Self {
        if (0..SMALL_INT_COUNT as TclInt).contains(&i) {
            SMALL_INTS.with(|table| table[i as usize].clone())
        } else {
            Value::raw_int(i)
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        // Aliases for the interned 1 and 0.
        Value::from(if b { 1 } else { 0 })
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::raw_list(items)
    }
}

impl From<&[Value]> for Value {
    fn from(items: &[Value]) -> Self {
        Value::raw_list(items.to_vec())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// Values compare by their string forms, the only representation every
/// value is guaranteed to have.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Value {}
