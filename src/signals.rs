use std::io;
use std::thread;

use signal_hook::consts::signal::{SIGCHLD, SIGINT, SIGQUIT, SIGTSTP};
use signal_hook::iterator::Signals;

use crate::job_control;
use crate::jobs::{JobState, SharedJobs};

/// Install the shell's signal handling and start the reactor thread.
///
/// The reactor owns every Stopped/removed transition in the job table:
/// SIGCHLD drains all currently-reapable children, SIGINT/SIGTSTP are
/// forwarded to the foreground process group, and SIGQUIT terminates the
/// shell outright. Registering through `signal-hook` also keeps the
/// shell itself from being interrupted or stopped at the prompt.
pub fn spawn_reactor(jobs: SharedJobs) -> io::Result<()> {
    // The shell must survive a background child touching the terminal.
    job_control::ignore_signal(libc::SIGTTIN)?;
    job_control::ignore_signal(libc::SIGTTOU)?;

    let mut signals = Signals::new([SIGCHLD, SIGINT, SIGTSTP, SIGQUIT])?;

    thread::Builder::new()
        .name("signal-reactor".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGCHLD => reap_children(&jobs),
                    SIGINT | SIGTSTP => forward_to_foreground(&jobs, signal),
                    SIGQUIT => {
                        println!("Terminating after receipt of SIGQUIT signal");
                        std::process::exit(1);
                    }
                    _ => unreachable!(),
                }
            }
        })?;

    Ok(())
}

/// Reap every child that has already terminated or stopped, without
/// waiting for any that are still running.
///
/// Runs entirely under the table lock, so it can never interleave with a
/// registration in the launcher or with another drain of itself. The
/// foreground waiter is notified once at the end.
fn reap_children(jobs: &SharedJobs) {
    let mut table = jobs.lock();

    loop {
        let mut status: libc::c_int = 0;
        let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG | libc::WUNTRACED) };
        if pid < 0 {
            if io::Error::last_os_error().raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            break;
        }
        if pid == 0 {
            break;
        }

        if unsafe { libc::WIFSTOPPED(status) } {
            if let Some(job) = table.by_pid_mut(pid) {
                job.state = JobState::Stopped;
                let signal = unsafe { libc::WSTOPSIG(status) };
                println!("Job [{}] ({pid}) stopped by signal {signal}", job.jid);
            }
        } else {
            if unsafe { libc::WIFSIGNALED(status) } {
                if let Some(job) = table.by_pid(pid) {
                    let signal = unsafe { libc::WTERMSIG(status) };
                    println!("Job [{}] ({pid}) terminated by signal {signal}", job.jid);
                }
            }
            table.remove(pid);
        }
    }

    drop(table);
    jobs.notify();
}

/// Forward a keyboard-generated signal to the foreground job's entire
/// process group. No foreground job means nothing to do.
fn forward_to_foreground(jobs: &SharedJobs, signal: i32) {
    let foreground = jobs.lock().foreground_pid();
    if let Some(pid) = foreground {
        let _ = job_control::send_signal_to_group(pid, signal);
    }
}
