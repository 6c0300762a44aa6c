mod builtins;
mod executor;
mod job_control;
mod jobs;
mod parser;
mod signals;

use std::io::{self, BufRead, Write};

use jobs::SharedJobs;

struct Options {
    emit_prompt: bool,
    verbose: bool,
}

fn main() {
    let options = parse_options();

    // Everything, diagnostics included, goes out on stdout so a driver
    // reading that pipe sees the full transcript in order.
    if let Err(e) = job_control::merge_stderr_into_stdout() {
        eprintln!("dup2 error: {e}");
        std::process::exit(1);
    }

    let jobs = SharedJobs::new(options.verbose);
    if let Err(e) = signals::spawn_reactor(jobs.clone()) {
        eprintln!("failed to install signal handling: {e}");
        std::process::exit(1);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if options.emit_prompt {
            print!("tinysh> ");
            let _ = stdout.flush();
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // End of input (ctrl-d).
                println!();
                std::process::exit(0);
            }
            Ok(_) => {
                executor::eval(&line, &jobs);
                let _ = stdout.flush();
            }
            Err(e) => {
                eprintln!("read error: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn parse_options() -> Options {
    let mut options = Options {
        emit_prompt: true,
        verbose: false,
    };

    for arg in std::env::args().skip(1) {
        let Some(flags) = arg.strip_prefix('-') else {
            usage();
        };
        for flag in flags.chars() {
            match flag {
                'h' => usage(),
                'v' => options.verbose = true,
                'p' => options.emit_prompt = false,
                _ => usage(),
            }
        }
    }

    options
}

fn usage() -> ! {
    println!("Usage: tinysh [-hvp]");
    println!("   -h   print this message");
    println!("   -v   print additional diagnostic information");
    println!("   -p   do not emit a command prompt");
    std::process::exit(1);
}
