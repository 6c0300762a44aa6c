use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::ptr;

use crate::builtins;
use crate::job_control;
use crate::jobs::{JobState, SharedJobs};
use crate::parser::{self, Builtin};

/// Evaluate one command line: dispatch builtins directly, launch anything
/// else as a job.
pub fn eval(line: &str, jobs: &SharedJobs) {
    let cmd = match parser::parse(line) {
        Ok(Some(cmd)) => cmd,
        Ok(None) => return,
        Err(message) => {
            eprintln!("{message}");
            return;
        }
    };

    let mut out = std::io::stdout();
    match cmd.builtin {
        Builtin::Quit => std::process::exit(0),
        Builtin::Jobs => builtins::jobs(jobs, cmd.outfile.as_deref(), &mut out),
        Builtin::Bg | Builtin::Fg => builtins::bg_fg(&cmd.argv, jobs, &mut out),
        Builtin::Kill => builtins::kill(&cmd.argv, jobs, &mut out),
        Builtin::Nohup => builtins::nohup(&mut out),
        Builtin::None => launch(&cmd, jobs),
    }
}

/// Launch an external command as a new job.
///
/// The child detaches into its own process group and then parks on a pipe
/// barrier until the parent has registered the job, so neither the child
/// nor the signal reactor can observe the job before the table knows it.
/// The table lock is held from before fork until the registration and the
/// barrier release are done, which keeps the reactor's reaping ordered
/// after registration.
fn launch(cmd: &parser::CommandLine, jobs: &SharedJobs) {
    // Redirection targets open before anything is forked; a missing target
    // aborts only this job.
    let stdin_file = match cmd.infile.as_deref() {
        Some(path) => match File::open(path) {
            Ok(file) => Some(file),
            Err(_) => {
                println!("{path}: No such file or directory");
                return;
            }
        },
        None => None,
    };
    let stdout_file = match cmd.outfile.as_deref() {
        Some(path) => match open_output_target(path) {
            Ok(file) => Some(file),
            Err(_) => {
                println!("{path}: No such file or directory");
                return;
            }
        },
        None => None,
    };

    // Everything the child touches after fork is prepared here: the exec
    // vectors, the preformatted exec-failure message, the barrier pipe.
    // Between fork and exec only async-signal-safe calls are allowed.
    let Some((prog, argv_c)) = exec_vectors(&cmd.argv) else {
        eprintln!("{}: invalid command name", cmd.argv[0]);
        return;
    };
    let mut argv_ptrs: Vec<*const libc::c_char> = argv_c.iter().map(|a| a.as_ptr()).collect();
    argv_ptrs.push(ptr::null());
    let not_found = format!("{}: Command not found\n", cmd.argv[0]).into_bytes();

    let (barrier_rx, mut barrier_tx) = match os_pipe::pipe() {
        Ok(ends) => ends,
        Err(e) => {
            eprintln!("pipe error: {e}");
            std::process::exit(1);
        }
    };

    let mut table = jobs.lock();
    let pid = unsafe { libc::fork() };
    if pid < 0 {
        eprintln!("fork error: {}", std::io::Error::last_os_error());
        std::process::exit(1);
    }

    if pid == 0 {
        // Child. Detach into a new process group so keyboard signals reach
        // the shell alone, wire up redirection, then wait to be released.
        unsafe {
            libc::setpgid(0, 0);
            if let Some(file) = &stdin_file {
                libc::dup2(file.as_raw_fd(), libc::STDIN_FILENO);
            }
            if let Some(file) = &stdout_file {
                libc::dup2(file.as_raw_fd(), libc::STDOUT_FILENO);
            }
        }
        drop(barrier_tx);
        job_control::await_release(&barrier_rx);

        unsafe {
            libc::execvp(prog.as_ptr(), argv_ptrs.as_ptr());
            // exec only returns on failure; report with a raw write.
            libc::write(
                libc::STDOUT_FILENO,
                not_found.as_ptr().cast::<libc::c_void>(),
                not_found.len(),
            );
            libc::_exit(1);
        }
    }

    // Parent: register the job before the child may exec and before the
    // reactor (blocked on this same lock) may reap it. Setting the group
    // from this side too means a `kill` issued right after launch can't
    // outrun the child's own setpgid.
    let _ = job_control::set_process_group(pid, pid);
    let state = if cmd.background {
        JobState::Background
    } else {
        JobState::Foreground
    };
    let jid = table.add(pid, state, &cmd.raw);

    if cmd.background {
        if let Some(jid) = jid {
            println!("[{jid}] ({pid}) {}", cmd.raw);
        }
    }

    // Release the child: one byte, then EOF.
    drop(barrier_rx);
    let _ = barrier_tx.write_all(b"x");
    drop(barrier_tx);
    drop(table);

    if !cmd.background {
        jobs.wait_foreground();
    }
}

/// Create/truncate an output redirection target, rw for owner, group and
/// other.
pub(crate) fn open_output_target(path: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o666)
        .open(path)
}

/// Build the NUL-terminated program and argv strings for execvp. Fails only
/// if an argument contains an interior NUL byte.
fn exec_vectors(argv: &[String]) -> Option<(CString, Vec<CString>)> {
    let prog = CString::new(argv[0].as_str()).ok()?;
    let argv_c = argv
        .iter()
        .map(|a| CString::new(a.as_str()).ok())
        .collect::<Option<Vec<CString>>>()?;
    Some((prog, argv_c))
}
