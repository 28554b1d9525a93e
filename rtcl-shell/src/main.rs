use rtcl::Interp;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut interp = Interp::new();

    if args.len() > 1 {
        rtcl_shell::script(&mut interp, &args[1..]);
    } else {
        rtcl_shell::repl(&mut interp);
    }
}
