use rtcl::{Interp, TclList, Value};
use rustyline::{error::ReadlineError, history::MemHistory, Config, Editor};
use std::fs;

/// Invokes an interactive REPL for the given interpreter, using
/// `rustyline` line editing.
///
/// The REPL displays a `% ` prompt by default; to change it, set the
/// `tcl_prompt1` variable to a script that returns the desired prompt.
/// When a line is syntactically incomplete (an unclosed brace, bracket,
/// or quote), the REPL keeps reading continuation lines under a `> `
/// prompt and evaluates the accumulated input once it parses.  Press
/// `^C` to terminate the REPL, returning control to the caller; entering
/// `exit` will normally terminate the application.
///
/// # Example
///
/// ```no_run
/// use rtcl::Interp;
///
/// // FIRST, create and initialize the interpreter.
/// let mut interp = Interp::new();
///
/// // NOTE: commands can be added to the interpreter here.
///
/// // NEXT, invoke the REPL.
/// rtcl_shell::repl(&mut interp);
/// ```
pub fn repl(interp: &mut Interp) {
    let mut rl = Editor::<(), MemHistory>::with_history(Config::default(), MemHistory::new())
        .expect("failed to init rustyline");

    let mut pending = String::new();
    loop {
        let prompt = if !pending.is_empty() {
            "> ".to_string()
        } else {
            custom_prompt(interp).unwrap_or_else(|| "% ".to_string())
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                if !pending.is_empty() {
                    pending.push('\n');
                }
                pending.push_str(&line);
                if pending.trim().is_empty() {
                    pending.clear();
                    continue;
                }
                if !interp.complete(&pending) {
                    continue;
                }

                let script = std::mem::take(&mut pending);
                let script = script.trim();
                if let Err(e) = rl.add_history_entry(script) {
                    eprintln!("history error: {e}");
                }
                match interp.eval_string(script) {
                    Ok(value) => {
                        // Don't output empty values.
                        if !value.as_str().is_empty() {
                            println!("{}", value);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("I/O error: {:?}", err);
                break;
            }
        }
    }
}

/// The prompt produced by the user's `tcl_prompt1` script, if one is set
/// and runs cleanly.
fn custom_prompt(interp: &mut Interp) -> Option<String> {
    let pscript = interp.get_var_raw("tcl_prompt1").ok()?;
    match interp.eval_string(pscript.as_str()) {
        Ok(prompt) => Some(prompt.as_str().to_string()),
        Err(e) => {
            println!("{}", e);
            None
        }
    }
}

/// Executes a script from a set of command-line arguments.
///
/// `args[0]` is the name of a script file; any subsequent arguments are
/// passed to the script.  The calling information is exposed as
/// variables: `arg0` holds the script name and `argv` the remaining
/// arguments as a list.
///
/// # Example
///
/// ```no_run
/// use rtcl::Interp;
/// use std::env;
///
/// let args: Vec<String> = env::args().collect();
/// let mut interp = Interp::new();
///
/// if args.len() > 1 {
///     rtcl_shell::script(&mut interp, &args[1..]);
/// } else {
///     eprintln!("usage: myshell filename ?arg ...?");
/// }
/// ```
pub fn script(interp: &mut Interp, args: &[String]) {
    let arg0 = &args[0];
    let argv = &args[1..];
    match fs::read_to_string(arg0) {
        Ok(text) => execute_script(interp, &text, arg0, argv),
        Err(e) => println!("{}", e),
    }
}

/// Evaluates the script text with `arg0`/`argv` set, exiting the process
/// with status 1 on error.
fn execute_script(interp: &mut Interp, text: &str, arg0: &str, argv: &[String]) {
    let argv: TclList = argv.iter().map(Value::from).collect();
    interp
        .set_var_raw("arg0", Value::from(arg0))
        .expect("arg0 predefined as a link");
    interp
        .set_var_raw("argv", Value::from(argv))
        .expect("argv predefined as a link");

    match interp.eval_string(text) {
        Ok(_) => (),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
