//! Variable scopes.
//!
//! The call stack is a singly-linked chain of frames, child to parent;
//! the global frame is the one with no parent.  Each frame owns a
//! name→entry map.  An entry either holds a value directly or links to a
//! `(frame, name)` pair in some other frame — the mechanism behind
//! `upvar` and `global`.  Frames are reference-counted so that links keep
//! working while their target frame is on the stack; a link into a frame
//! that has been popped holds a dead weak handle and errors on access.

use crate::types::Exception;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub(crate) type FrameRef = Rc<RefCell<Frame>>;

/// Bound on link-chain traversal.  Chains are normally one or two hops;
/// the bound turns a cyclic chain (e.g. `upvar 0 x x`) into an error.
const MAX_LINK_HOPS: usize = 128;

pub(crate) struct Frame {
    vars: IndexMap<String, Entry>,
    parent: Option<FrameRef>,
}

#[derive(Clone)]
enum Entry {
    Value(Value),
    Link(Weak<RefCell<Frame>>, String),
}

impl Frame {
    /// Creates a fresh global frame.
    pub(crate) fn global() -> FrameRef {
        Rc::new(RefCell::new(Frame {
            vars: IndexMap::new(),
            parent: None,
        }))
    }

    /// Pushes a new frame on top of `parent`.
    pub(crate) fn push(parent: &FrameRef) -> FrameRef {
        Rc::new(RefCell::new(Frame {
            vars: IndexMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }
}

pub(crate) fn parent_of(frame: &FrameRef) -> Option<FrameRef> {
    frame.borrow().parent.clone()
}

/// The root of the chain: the global frame.
pub(crate) fn root_of(frame: &FrameRef) -> FrameRef {
    let mut f = Rc::clone(frame);
    loop {
        let parent = f.borrow().parent.clone();
        match parent {
            Some(p) => f = p,
            None => return f,
        }
    }
}

/// The frame `level` steps up the chain, or `None` if the chain is too
/// short.
pub(crate) fn ancestor(frame: &FrameRef, level: usize) -> Option<FrameRef> {
    let mut f = Rc::clone(frame);
    for _ in 0..level {
        let parent = f.borrow().parent.clone()?;
        f = parent;
    }
    Some(f)
}

/// Number of steps from `frame` to the global frame.
pub(crate) fn depth_of(frame: &FrameRef) -> usize {
    let mut depth = 0;
    let mut f = Rc::clone(frame);
    loop {
        let parent = f.borrow().parent.clone();
        match parent {
            Some(p) => {
                depth += 1;
                f = p;
            }
            None => return depth,
        }
    }
}

fn not_found(global: bool, name: &str) -> Exception {
    let scope = if global { "::" } else { "" };
    Exception::new(format!("variable not found: ${}{}", scope, name))
}

fn link_loop(name: &str) -> Exception {
    Exception::new(format!("variable link loop: ${}", name))
}

/// Reads the variable `name` in `frame` (or the global frame), following
/// link entries to the value-holding terminal.
pub(crate) fn get_var(frame: &FrameRef, global: bool, name: &str) -> Result<Value, Exception> {
    let start = if global { root_of(frame) } else { Rc::clone(frame) };
    let mut entry = start
        .borrow()
        .vars
        .get(name)
        .cloned()
        .ok_or_else(|| not_found(global, name))?;

    let mut hops = 0;
    loop {
        match entry {
            Entry::Value(v) => return Ok(v),
            Entry::Link(target, target_name) => {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(link_loop(name));
                }
                let target = target.upgrade().ok_or_else(|| not_found(global, name))?;
                entry = target
                    .borrow()
                    .vars
                    .get(&target_name)
                    .cloned()
                    .ok_or_else(|| not_found(global, name))?;
            }
        }
    }
}

/// Writes the variable `name` in `frame` (or the global frame).  When
/// the existing entry is a link chain, the chain is resolved to its
/// terminal `(frame, name)` and the store happens there; otherwise a
/// fresh value entry is created in place.
pub(crate) fn set_var(
    frame: &FrameRef,
    global: bool,
    name: &str,
    value: Value,
) -> Result<(), Exception> {
    let mut cur_frame = if global { root_of(frame) } else { Rc::clone(frame) };
    let mut cur_name = name.to_string();

    let mut hops = 0;
    loop {
        let existing = cur_frame.borrow().vars.get(&cur_name).cloned();
        match existing {
            Some(Entry::Link(target, target_name)) => {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(link_loop(name));
                }
                let target = target.upgrade().ok_or_else(|| not_found(global, name))?;
                cur_frame = target;
                cur_name = target_name;
            }
            _ => break,
        }
    }

    cur_frame
        .borrow_mut()
        .vars
        .insert(cur_name, Entry::Value(value));
    Ok(())
}

/// Removes the entry for `name` from the designated frame's map.  Links
/// are removed, not followed: unsetting a linked name severs the link
/// without touching its target.  Unsetting a missing name is a no-op.
pub(crate) fn unset_var(frame: &FrameRef, global: bool, name: &str) {
    let f = if global { root_of(frame) } else { Rc::clone(frame) };
    f.borrow_mut().vars.shift_remove(name);
}

/// Creates a link entry named `mine` in `frame`, forwarding to the
/// variable `theirs` in the frame `level` steps up the chain.
pub(crate) fn link_var(
    frame: &FrameRef,
    level: usize,
    theirs: &str,
    mine: &str,
) -> Result<(), Exception> {
    let target = ancestor(frame, level)
        .ok_or_else(|| Exception::new(format!("bad level \"{}\"", level)))?;
    frame.borrow_mut().vars.insert(
        mine.to_string(),
        Entry::Link(Rc::downgrade(&target), theirs.to_string()),
    );
    Ok(())
}
