//! The standard command set, registered by [`Interp::new`].
//!
//! Each command is an ordinary [`CommandFunc`](crate::CommandFunc)
//! implemented over the interpreter's public surface, so hosts can build
//! custom interpreters from subsets of these, or replace any of them.
//! Commands receive their arguments without the command name.

use crate::interp::{Channel, Interp};
use crate::types::{Status, TclInt, Value};
use crate::{check_args, parser, rtcl_try};
use std::io::{BufRead as _, Write as _};

/// # append varName ?value value ...?
///
/// Appends the string forms of the values to the variable, creating it
/// if it doesn't exist, and returns the new value.
pub fn cmd_append(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("append", args, 1, 0, "varName ?value value ...?")
    );
    let vr = args[0].as_var_ref();
    let mut s = match interp.get_var(vr) {
        Ok(v) => v.as_str().to_string(),
        Err(_) => String::new(),
    };
    for arg in &args[1..] {
        s.push_str(arg.as_str());
    }
    let value = Value::from(s);
    rtcl_try!(interp, interp.set_var(vr, value.clone()));
    interp.set_result(value)
}

/// # break
pub fn cmd_break(interp: &mut Interp, args: &[Value]) -> Status {
    if !args.is_empty() {
        return interp.fail_str("wrong # args: should be \"break\"");
    }
    Status::Break
}

/// # catch script ?varName?
///
/// Evaluates the script, swallowing any status, and returns the numeric
/// status code.  With `varName`, stores the error message (or, for
/// non-error statuses, the result value) in the variable.
pub fn cmd_catch(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("catch", args, 1, 2, "script ?varName?"));
    let status = interp.eval_obj(&args[0]);
    let payload = if status == Status::Err {
        let e = interp.take_error_or(status);
        Value::from(e.message())
    } else {
        interp.result().clone()
    };
    if args.len() == 2 {
        rtcl_try!(interp, interp.set_var(args[1].as_var_ref(), payload));
    }
    interp.set_result(Value::from(status.code()))
}

/// # concat ?arg arg ...?
pub fn cmd_concat(interp: &mut Interp, args: &[Value]) -> Status {
    let joined = args
        .iter()
        .map(|a| a.as_str().trim())
        .collect::<Vec<_>>()
        .join(" ");
    interp.set_result(Value::from(joined))
}

/// # continue
pub fn cmd_continue(interp: &mut Interp, args: &[Value]) -> Status {
    if !args.is_empty() {
        return interp.fail_str("wrong # args: should be \"continue\"");
    }
    Status::Continue
}

/// # error message
pub fn cmd_error(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("error", args, 1, 1, "message"));
    interp.fail_str(args[0].as_str())
}

/// # eval arg ?arg ...?
///
/// Concatenates its arguments and evaluates the result as a script,
/// passing any status through to the caller.
pub fn cmd_eval(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("eval", args, 1, 0, "arg ?arg ...?"));
    if args.len() == 1 {
        interp.eval_obj(&args[0])
    } else {
        let joined = args
            .iter()
            .map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        interp.eval_obj(&Value::from(joined))
    }
}

/// # exit ?returnCode?
pub fn cmd_exit(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("exit", args, 0, 1, "?returnCode?"));
    let code = match args.first() {
        Some(arg) => rtcl_try!(interp, arg.as_int()),
        None => 0,
    };
    std::process::exit(code as i32);
}

/// # expr arg ?arg ...?
pub fn cmd_expr(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("expr", args, 1, 0, "arg ?arg ...?"));
    let value = if args.len() == 1 {
        args[0].clone()
    } else {
        let joined = args
            .iter()
            .map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        Value::from(joined)
    };
    let result = rtcl_try!(interp, interp.expr(&value));
    interp.set_result(result)
}

/// # for start test next body
pub fn cmd_for(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("for", args, 4, 4, "start test next body"));
    let status = interp.eval_obj(&args[0]);
    if status != Status::Ok {
        return status;
    }
    loop {
        if !rtcl_try!(interp, interp.expr_bool(&args[1])) {
            break;
        }
        match interp.eval_obj(&args[3]) {
            Status::Break => break,
            Status::Ok | Status::Continue => {}
            status => return status,
        }
        let status = interp.eval_obj(&args[2]);
        if status != Status::Ok {
            return status;
        }
    }
    interp.set_result(Value::empty())
}

/// # foreach varName list body
///
/// Evaluates the body once for each element of the list, with the
/// variable bound to the element.  `break` and `continue` in the body do
/// the obvious things.
pub fn cmd_foreach(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("foreach", args, 3, 3, "varName list body")
    );
    let items = rtcl_try!(interp, args[1].as_list()).to_vec();
    for item in items {
        rtcl_try!(interp, interp.set_var(args[0].as_var_ref(), item));
        match interp.eval_obj(&args[2]) {
            Status::Break => break,
            Status::Ok | Status::Continue => {}
            status => return status,
        }
    }
    interp.set_result(Value::empty())
}

/// # gets channelId ?varName?
///
/// Reads a line from the channel.  With `varName`, stores the line and
/// returns the character count, or -1 at end of stream; without, returns
/// the line itself.
pub fn cmd_gets(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("gets", args, 1, 2, "channelId ?varName?")
    );
    let chan_name = args[0].as_str();
    let chan = match interp.channel(chan_name) {
        Some(Channel::Reader(r)) => r,
        Some(Channel::Writer(_)) => {
            return interp.fail_str(format!(
                "channel \"{}\" wasn't opened for reading",
                chan_name
            ))
        }
        None => {
            return interp.fail_str(format!("can not find channel named \"{}\"", chan_name))
        }
    };

    let mut line = String::new();
    let n = match chan.borrow_mut().read_line(&mut line) {
        Ok(n) => n,
        Err(e) => return interp.fail_str(e.to_string()),
    };
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    if args.len() == 2 {
        let count = if n == 0 {
            -1
        } else {
            line.chars().count() as TclInt
        };
        rtcl_try!(interp, interp.set_var(args[1].as_var_ref(), Value::from(line)));
        interp.set_result(Value::from(count))
    } else {
        interp.set_result(Value::from(line))
    }
}

/// # global varName ?varName ...?
///
/// Links the named variables in the current frame to their global
/// counterparts.  At the global level this is a no-op.
pub fn cmd_global(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("global", args, 1, 0, "varName ?varName ...?")
    );
    let level = interp.scope_level();
    if level > 0 {
        for arg in args {
            let name = arg.as_str();
            rtcl_try!(interp, interp.link_var(level, name, name));
        }
    }
    interp.set_result(Value::empty())
}

/// # if condition ?then? script ?elseif condition ?then? script ...? ?else? ?script?
pub fn cmd_if(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("if", args, 2, 0, "condition ?then? script ?elseif ...?")
    );
    let mut i = 0;
    loop {
        let Some(cond) = args.get(i) else {
            return interp.fail_str("wrong # args: no expression after \"if\" argument");
        };
        let go = rtcl_try!(interp, interp.expr_bool(cond));
        i += 1;
        if args.get(i).map(Value::as_str) == Some("then") {
            i += 1;
        }
        let Some(body) = args.get(i) else {
            return interp.fail_str("wrong # args: no script following \"if\" condition");
        };
        if go {
            return interp.eval_obj(body);
        }
        i += 1;
        match args.get(i).map(Value::as_str) {
            None => return interp.set_result(Value::empty()),
            Some("elseif") => i += 1,
            Some("else") => {
                let Some(body) = args.get(i + 1) else {
                    return interp
                        .fail_str("wrong # args: no script following \"else\" argument");
                };
                return interp.eval_obj(body);
            }
            // A final bare script is an implicit else.
            Some(_) => return interp.eval_obj(&args[i]),
        }
    }
}

/// # incr varName ?increment?
pub fn cmd_incr(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("incr", args, 1, 2, "varName ?increment?"));
    let amount = if args.len() == 2 {
        rtcl_try!(interp, args[1].as_int())
    } else {
        1
    };
    let vr = args[0].as_var_ref();
    let current = rtcl_try!(interp, interp.get_var(vr));
    let n = rtcl_try!(interp, current.as_int()).wrapping_add(amount);
    let value = Value::from(n);
    rtcl_try!(interp, interp.set_var(vr, value.clone()));
    interp.set_result(value)
}

/// # join list ?joinString?
pub fn cmd_join(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("join", args, 1, 2, "list ?joinString?"));
    let sep = if args.len() == 2 { args[1].as_str() } else { " " };
    let items = rtcl_try!(interp, args[0].as_list());
    let joined = items
        .iter()
        .map(Value::as_str)
        .collect::<Vec<_>>()
        .join(sep);
    interp.set_result(Value::from(joined))
}

/// # lappend varName ?value value ...?
///
/// Appends the values as elements to the list variable, creating it if
/// it doesn't exist, and returns the new list.
pub fn cmd_lappend(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("lappend", args, 1, 0, "varName ?value value ...?")
    );
    let vr = args[0].as_var_ref();
    let mut items = match interp.get_var(vr) {
        Ok(v) => rtcl_try!(interp, v.as_list()).to_vec(),
        Err(_) => Vec::new(),
    };
    items.extend(args[1..].iter().cloned());
    let value = Value::from(items);
    rtcl_try!(interp, interp.set_var(vr, value.clone()));
    interp.set_result(value)
}

/// # lindex list index
///
/// Returns the element at the index, or the empty value when the index
/// is out of range.
pub fn cmd_lindex(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("lindex", args, 2, 2, "list index"));
    let items = rtcl_try!(interp, args[0].as_list());
    let index = rtcl_try!(interp, args[1].as_int());
    let value = if index >= 0 && (index as usize) < items.len() {
        items[index as usize].clone()
    } else {
        Value::empty()
    };
    interp.set_result(value)
}

/// # list ?value value ...?
pub fn cmd_list(interp: &mut Interp, args: &[Value]) -> Status {
    interp.set_result(Value::from(args))
}

/// # llength list
pub fn cmd_llength(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("llength", args, 1, 1, "list"));
    let len = rtcl_try!(interp, args[0].as_list()).len();
    interp.set_result(Value::from(len as TclInt))
}

/// # proc name args body
///
/// Defines a procedure.  Each element of `args` is a parameter name or a
/// `{name default}` pair; a final `args` parameter collects any
/// remaining arguments as a list.  The body is parsed once, here.
pub fn cmd_proc(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("proc", args, 3, 3, "name args body"));
    let sig = rtcl_try!(interp, args[1].as_list()).to_vec();
    interp.add_proc(args[0].as_str(), &sig, args[2].clone());
    interp.set_result(Value::empty())
}

/// # puts ?-nonewline? ?channelId? string
///
/// Writes the string (plus a newline, unless suppressed) to the channel,
/// `stdout` by default.
pub fn cmd_puts(interp: &mut Interp, args: &[Value]) -> Status {
    let mut idx = 0;
    let mut newline = true;
    if args.first().map(Value::as_str) == Some("-nonewline") {
        newline = false;
        idx = 1;
    }
    let (chan_name, text) = match args.len() - idx {
        1 => ("stdout", &args[idx]),
        2 => (args[idx].as_str(), &args[idx + 1]),
        _ => {
            return interp
                .fail_str("wrong # args: should be \"puts ?-nonewline? ?channelId? string\"")
        }
    };

    let chan = match interp.channel(chan_name) {
        Some(Channel::Writer(w)) => w,
        Some(Channel::Reader(_)) => {
            return interp.fail_str(format!(
                "channel \"{}\" wasn't opened for writing",
                chan_name
            ))
        }
        None => {
            return interp.fail_str(format!("can not find channel named \"{}\"", chan_name))
        }
    };

    let mut w = chan.borrow_mut();
    let io_result = if newline {
        writeln!(w, "{}", text.as_str())
    } else {
        write!(w, "{}", text.as_str())
    };
    if let Err(e) = io_result.and_then(|_| w.flush()) {
        let msg = e.to_string();
        drop(w);
        return interp.fail_str(msg);
    }
    drop(w);
    interp.set_result(Value::empty())
}

/// # rename oldName newName
///
/// Renames a command; an empty `newName` removes it.  Procedures calling
/// the old name are not rewritten, so rename-and-wrap interposition
/// works as usual.
pub fn cmd_rename(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("rename", args, 2, 2, "oldName newName"));
    if args[1].as_str().is_empty() {
        interp.remove_cmd(args[0].as_str());
    } else {
        interp.rename_cmd(args[0].as_str(), args[1].as_str());
    }
    interp.set_result(Value::empty())
}

/// # return ?value?
pub fn cmd_return(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("return", args, 0, 1, "?value?"));
    let value = args.first().cloned().unwrap_or_else(Value::empty);
    interp.set_result(value);
    Status::Return
}

/// # set varName ?newValue?
pub fn cmd_set(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("set", args, 1, 2, "varName ?newValue?"));
    let vr = args[0].as_var_ref();
    if args.len() == 2 {
        rtcl_try!(interp, interp.set_var(vr, args[1].clone()));
        interp.set_result(args[1].clone())
    } else {
        let value = rtcl_try!(interp, interp.get_var(vr));
        interp.set_result(value)
    }
}

/// # source fileName
pub fn cmd_source(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("source", args, 1, 1, "fileName"));
    let path = args[0].as_str();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            return interp.fail_str(format!("couldn't read file \"{}\": {}", path, e))
        }
    };
    let cmds = rtcl_try!(interp, parser::parse_commands(&text));
    interp.eval(&cmds)
}

/// # unset varName ?varName ...?
pub fn cmd_unset(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("unset", args, 1, 0, "varName ?varName ...?")
    );
    for arg in args {
        rtcl_try!(interp, interp.unset_var(arg.as_var_ref()));
    }
    interp.set_result(Value::empty())
}

/// # uplevel ?level? arg ?arg ...?
///
/// Evaluates a script in the frame `level` steps up the call chain
/// (default 1), restoring the current frame afterwards whatever the
/// status.
pub fn cmd_uplevel(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("uplevel", args, 1, 0, "?level? arg ?arg ...?")
    );
    let (level, rest) = match args[0].as_int() {
        Ok(n) if args.len() >= 2 => (n, &args[1..]),
        _ => (1, args),
    };
    if level < 0 {
        return interp.fail_str(format!("bad level \"{}\"", level));
    }
    let Some(target) = interp.ancestor_frame(level as usize) else {
        return interp.fail_str(format!("bad level \"{}\"", level));
    };

    let saved = interp.current_frame();
    interp.set_current_frame(target);
    let status = if rest.len() == 1 {
        interp.eval_obj(&rest[0])
    } else {
        let joined = rest
            .iter()
            .map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        interp.eval_obj(&Value::from(joined))
    };
    interp.set_current_frame(saved);
    status
}

/// # upvar ?level? otherVar myVar
///
/// Links `myVar` in the current frame to `otherVar` in the frame `level`
/// steps up the call chain (default 1).
pub fn cmd_upvar(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(
        interp,
        check_args("upvar", args, 2, 3, "?level? otherVar myVar")
    );
    let (level, theirs, mine) = if args.len() == 3 {
        (rtcl_try!(interp, args[0].as_int()), &args[1], &args[2])
    } else {
        (1, &args[0], &args[1])
    };
    if level < 0 {
        return interp.fail_str(format!("bad level \"{}\"", level));
    }
    rtcl_try!(
        interp,
        interp.link_var(level as usize, theirs.as_str(), mine.as_str())
    );
    interp.set_result(Value::empty())
}

/// # while test body
pub fn cmd_while(interp: &mut Interp, args: &[Value]) -> Status {
    rtcl_try!(interp, check_args("while", args, 2, 2, "test body"));
    loop {
        if !rtcl_try!(interp, interp.expr_bool(&args[0])) {
            break;
        }
        match interp.eval_obj(&args[1]) {
            Status::Break => break,
            Status::Ok | Status::Continue => {}
            status => return status,
        }
    }
    interp.set_result(Value::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    fn eval(interp: &mut Interp, script: &str) -> String {
        match interp.eval_string(script) {
            Ok(v) => v.as_str().to_string(),
            Err(e) => panic!("script {:?} failed: {}", script, e),
        }
    }

    fn eval_err(interp: &mut Interp, script: &str) -> String {
        interp
            .eval_string(script)
            .expect_err("script should have failed")
            .message()
            .to_string()
    }

    #[test]
    fn test_set_get_unset() {
        let mut interp = Interp::new();
        assert_eq!(eval(&mut interp, "set a 1"), "1");
        assert_eq!(eval(&mut interp, "set a"), "1");
        assert_eq!(eval(&mut interp, "unset a"), "");
        assert_eq!(eval_err(&mut interp, "set a"), "variable not found: $a");
        assert_eq!(
            eval_err(&mut interp, "set a b c"),
            "wrong # args: should be \"set varName ?newValue?\""
        );
    }

    #[test]
    fn test_incr() {
        let mut interp = Interp::new();
        eval(&mut interp, "set n 5");
        assert_eq!(eval(&mut interp, "incr n"), "6");
        assert_eq!(eval(&mut interp, "incr n 10"), "16");
        assert_eq!(eval(&mut interp, "incr n -1"), "15");
        assert_eq!(
            eval_err(&mut interp, "incr missing"),
            "variable not found: $missing"
        );
        eval(&mut interp, "set s pear");
        assert_eq!(
            eval_err(&mut interp, "incr s"),
            "expected integer but got \"pear\""
        );
    }

    #[test]
    fn test_append() {
        let mut interp = Interp::new();
        assert_eq!(eval(&mut interp, "append fresh a b c"), "abc");
        assert_eq!(eval(&mut interp, "append fresh !"), "abc!");
        assert_eq!(eval(&mut interp, "set fresh"), "abc!");
    }

    #[test]
    fn test_list_commands() {
        let mut interp = Interp::new();
        assert_eq!(eval(&mut interp, "list a b c"), "a b c");
        assert_eq!(eval(&mut interp, "list {a b} c"), "{a b} c");
        assert_eq!(eval(&mut interp, "list"), "");
        assert_eq!(eval(&mut interp, "llength {a b c}"), "3");
        assert_eq!(eval(&mut interp, "llength {}"), "0");
        assert_eq!(eval(&mut interp, "lindex {a b c} 1"), "b");
        assert_eq!(eval(&mut interp, "lindex {a b c} 5"), "");
        assert_eq!(eval(&mut interp, "lindex {a b c} -1"), "");
        assert_eq!(eval(&mut interp, "join {a b c} -"), "a-b-c");
        assert_eq!(eval(&mut interp, "join {a b c}"), "a b c");
        assert_eq!(eval(&mut interp, "concat {a b} c {}"), "a b c ");
    }

    #[test]
    fn test_lappend() {
        let mut interp = Interp::new();
        assert_eq!(eval(&mut interp, "lappend xs a"), "a");
        assert_eq!(eval(&mut interp, "lappend xs b {c d}"), "a b {c d}");
        assert_eq!(eval(&mut interp, "llength $xs"), "3");
    }

    #[test]
    fn test_if_forms() {
        let mut interp = Interp::new();
        assert_eq!(eval(&mut interp, "if 1 {set r yes}"), "yes");
        assert_eq!(eval(&mut interp, "if 0 {set r yes}"), "");
        assert_eq!(eval(&mut interp, "if 0 {set r a} {set r b}"), "b");
        assert_eq!(eval(&mut interp, "if 0 {set r a} else {set r b}"), "b");
        assert_eq!(eval(&mut interp, "if 1 then {set r a} else {set r b}"), "a");
        assert_eq!(
            eval(
                &mut interp,
                "set x 7; if {$x < 5} {set r low} elseif {$x < 10} {set r mid} else {set r high}"
            ),
            "mid"
        );
    }

    #[test]
    fn test_while_loop() {
        let mut interp = Interp::new();
        assert_eq!(
            eval(
                &mut interp,
                "set i 0; set sum 0; while {$i < 5} { incr sum $i; incr i }; set sum"
            ),
            "10"
        );
    }

    #[test]
    fn test_while_break_continue() {
        let mut interp = Interp::new();
        assert_eq!(
            eval(
                &mut interp,
                "set i 0; while {1} { incr i; if {$i > 3} {break} }; set i"
            ),
            "4"
        );
        assert_eq!(
            eval(
                &mut interp,
                "set i 0; set n 0; while {$i < 5} { incr i; if {$i == 2} {continue}; incr n }; set n"
            ),
            "4"
        );
    }

    #[test]
    fn test_for_loop() {
        let mut interp = Interp::new();
        assert_eq!(
            eval(
                &mut interp,
                "set sum 0; for {set i 1} {$i <= 4} {incr i} { incr sum $i }; set sum"
            ),
            "10"
        );
    }

    #[test]
    fn test_foreach() {
        let mut interp = Interp::new();
        assert_eq!(
            eval(
                &mut interp,
                r#"set out {}; foreach x {a b c} { lappend out "<$x>" }; set out"#
            ),
            "<a> <b> <c>"
        );
    }

    #[test]
    fn test_foreach_break() {
        let mut interp = Interp::new();
        assert_eq!(
            eval(
                &mut interp,
                "set n 0; foreach x {1 2 3 4} { if {$x == 3} {break}; incr n }; set n"
            ),
            "2"
        );
    }

    #[test]
    fn test_catch() {
        let mut interp = Interp::new();
        assert_eq!(eval(&mut interp, "catch {set a 1}"), "0");
        assert_eq!(eval(&mut interp, "catch {error boom}"), "1");
        assert_eq!(eval(&mut interp, "catch {error boom} msg; set msg"), "boom");
        assert_eq!(eval(&mut interp, "catch {set a ok} out; set out"), "ok");
        assert_eq!(eval(&mut interp, "catch {break}"), "3");
        assert_eq!(eval(&mut interp, "catch {continue}"), "4");
        // The caught error does not leak out.
        assert_eq!(eval(&mut interp, "catch {nosuch}; set a"), "ok");
    }

    #[test]
    fn test_error_command() {
        let mut interp = Interp::new();
        assert_eq!(eval_err(&mut interp, "error {something bad}"), "something bad");
    }

    #[test]
    fn test_eval_command() {
        let mut interp = Interp::new();
        assert_eq!(eval(&mut interp, "eval {set a 3}"), "3");
        assert_eq!(eval(&mut interp, "eval set b 4"), "4");
        assert_eq!(eval(&mut interp, "set script {expr {6 * 7}}; eval $script"), "42");
    }

    #[test]
    fn test_expr_command_joins_args() {
        let mut interp = Interp::new();
        assert_eq!(eval(&mut interp, "expr 1 + 2"), "3");
        assert_eq!(eval(&mut interp, "expr {1 + 2}"), "3");
    }

    #[test]
    fn test_proc_and_return() {
        let mut interp = Interp::new();
        eval(&mut interp, "proc id {x} { return $x }");
        assert_eq!(eval(&mut interp, "id hello"), "hello");

        // A proc without an explicit return yields its last result.
        eval(&mut interp, "proc last {} { set a 1; set b 2 }");
        assert_eq!(eval(&mut interp, "last"), "2");

        // return stops the body early.
        eval(&mut interp, "proc early {} { return first; error unreached }");
        assert_eq!(eval(&mut interp, "early"), "first");
    }

    #[test]
    fn test_proc_locals_are_local() {
        let mut interp = Interp::new();
        eval(&mut interp, "set x global");
        eval(&mut interp, "proc shadow {} { set x local; set x }");
        assert_eq!(eval(&mut interp, "shadow"), "local");
        assert_eq!(eval(&mut interp, "set x"), "global");
    }

    #[test]
    fn test_upvar() {
        let mut interp = Interp::new();
        eval(
            &mut interp,
            "proc bump {varname} { upvar 1 $varname v; incr v }",
        );
        eval(&mut interp, "set counter 10");
        assert_eq!(eval(&mut interp, "bump counter"), "11");
        assert_eq!(eval(&mut interp, "set counter"), "11");
    }

    #[test]
    fn test_global_command() {
        let mut interp = Interp::new();
        eval(&mut interp, "set g 1");
        eval(&mut interp, "proc readg {} { global g; set g }");
        eval(&mut interp, "proc writeg {} { global g; set g 2 }");
        assert_eq!(eval(&mut interp, "readg"), "1");
        eval(&mut interp, "writeg");
        assert_eq!(eval(&mut interp, "set g"), "2");
    }

    #[test]
    fn test_uplevel() {
        let mut interp = Interp::new();
        eval(&mut interp, "proc setcaller {} { uplevel 1 {set here 5} }");
        eval(&mut interp, "proc outer {} { setcaller; set here }");
        assert_eq!(eval(&mut interp, "outer"), "5");
        // The variable was set in outer's frame, not globally.
        assert_eq!(eval_err(&mut interp, "set here"), "variable not found: $here");
    }

    #[test]
    fn test_rename() {
        let mut interp = Interp::new();
        eval(&mut interp, "rename llength count");
        assert_eq!(eval(&mut interp, "count {a b}"), "2");
        assert_eq!(
            eval_err(&mut interp, "llength {a b}"),
            "command not found: llength"
        );
        eval(&mut interp, "rename count {}");
        assert_eq!(
            eval_err(&mut interp, "count {a b}"),
            "command not found: count"
        );
    }

    #[test]
    fn test_puts_to_channel() {
        let mut interp = Interp::new();
        let buf: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        interp.set_channel("out", Channel::Writer(buf.clone()));

        eval(&mut interp, "puts out {hello there}");
        eval(&mut interp, "puts -nonewline out !");
        assert_eq!(String::from_utf8(buf.borrow().clone()).unwrap(), "hello there\n!");
    }

    #[test]
    fn test_puts_unknown_channel() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_err(&mut interp, "puts nochan hi"),
            "can not find channel named \"nochan\""
        );
    }

    #[test]
    fn test_gets_from_channel() {
        let mut interp = Interp::new();
        let input = Cursor::new(b"first line\nsecond\n".to_vec());
        interp.set_channel("in", Channel::Reader(Rc::new(RefCell::new(input))));

        assert_eq!(eval(&mut interp, "gets in"), "first line");
        assert_eq!(eval(&mut interp, "gets in line"), "6");
        assert_eq!(eval(&mut interp, "set line"), "second");
        // End of stream.
        assert_eq!(eval(&mut interp, "gets in line"), "-1");
        assert_eq!(eval(&mut interp, "set line"), "");
    }

    #[test]
    fn test_break_continue_outside_loop() {
        let mut interp = Interp::new();
        assert_eq!(eval_err(&mut interp, "break"), "uncaught error: 3");
        assert_eq!(eval_err(&mut interp, "continue"), "uncaught error: 4");
    }
}
