use std::io::Write;

use crate::job_control;
use crate::jobs::{JobState, SharedJobs};

/// How a `bg`/`fg`/`kill` argument addresses a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobRef {
    Jid(i32),
    Pid(i32),
}

/// List all active jobs: `[jid] (pid) <state label><command line>`.
///
/// With an output target (`jobs > file`) the listing goes to that file
/// instead; a target that cannot be opened aborts only the listing.
pub fn jobs(shared: &SharedJobs, outfile: Option<&str>, out: &mut dyn Write) {
    let listing: Vec<String> = {
        let table = shared.lock();
        table
            .iter()
            .map(|j| format!("[{}] ({}) {}{}", j.jid, j.pid, j.state.label(), j.cmdline))
            .collect()
    };

    match outfile {
        Some(path) => {
            let mut file = match crate::executor::open_output_target(path) {
                Ok(file) => file,
                Err(_) => {
                    let _ = writeln!(out, "{path}: No such file or directory");
                    return;
                }
            };
            for line in &listing {
                let _ = writeln!(file, "{line}");
            }
        }
        None => {
            for line in &listing {
                let _ = writeln!(out, "{line}");
            }
        }
    }
}

/// `bg <job>|<pid>` / `fg <job>|<pid>`: resume a job in the background, or
/// bring it to the foreground and wait for it.
pub fn bg_fg(argv: &[String], shared: &SharedJobs, out: &mut dyn Write) {
    let name = argv[0].as_str();
    let Some(arg) = argv.get(1) else {
        let _ = writeln!(out, "{name} command requires PID or %jobid argument");
        return;
    };

    let Some((job_ref, _)) = parse_job_ref(arg) else {
        let _ = write_lookup_failure(out, arg, false);
        return;
    };

    let is_fg = name == "fg";
    let target = {
        let mut table = shared.lock();
        let job = match job_ref {
            JobRef::Jid(jid) => table.by_jid_mut(jid),
            JobRef::Pid(pid) => table.by_pid_mut(pid),
        };
        match job {
            Some(job) => {
                job.state = if is_fg {
                    JobState::Foreground
                } else {
                    JobState::Background
                };
                Some((job.jid, job.pid, job.cmdline.clone()))
            }
            None => None,
        }
    };

    let Some((jid, pid, cmdline)) = target else {
        let _ = write_lookup_failure(out, arg, false);
        return;
    };

    if is_fg {
        // Resume the whole group, then wait until the job leaves the
        // foreground (exit, kill, or stop — the reactor decides).
        let _ = job_control::send_signal_to_group(pid, libc::SIGCONT);
        shared.wait_foreground();
    } else {
        let _ = writeln!(out, "[{jid}] ({pid}) {cmdline}");
        let _ = out.flush();
        let _ = job_control::send_signal_to_group(pid, libc::SIGCONT);
    }
}

/// `kill [-]<job>|[-]<pid>`: send SIGTERM to a job's group leader, or with
/// the group marker to its entire process group.
///
/// The table is never mutated here — the reactor removes the job once the
/// termination is reaped.
pub fn kill(argv: &[String], shared: &SharedJobs, out: &mut dyn Write) {
    let Some(arg) = argv.get(1) else {
        let _ = writeln!(out, "kill command requires PID or %jobid argument");
        return;
    };

    let Some((job_ref, group)) = parse_job_ref(arg) else {
        // Undecipherable id: report in the form the argument used.
        let _ = write_lookup_failure(out, arg, arg.starts_with('-') || arg.contains("%-"));
        return;
    };

    let pid = {
        let mut table = shared.lock();
        let job = match job_ref {
            JobRef::Jid(jid) => table.by_jid_mut(jid),
            JobRef::Pid(pid) => table.by_pid_mut(pid),
        };
        job.map(|j| j.pid)
    };

    let Some(pid) = pid else {
        let _ = write_lookup_failure(out, arg, group);
        return;
    };

    if group {
        let _ = job_control::send_signal_to_group(pid, libc::SIGTERM);
    } else {
        let _ = job_control::send_signal(pid, libc::SIGTERM);
    }
}

/// `nohup`: make subsequently launched commands ignore terminal hangup.
/// The ignored disposition is inherited across fork and exec.
pub fn nohup(out: &mut dyn Write) {
    if let Err(e) = job_control::ignore_signal(libc::SIGHUP) {
        let _ = writeln!(out, "nohup: {e}");
    }
}

/// Parse a job reference: `%5` (jid), `5` (pid), and the group forms
/// `-%5`, `%-5` and `-5`. Returns the reference and the group flag.
fn parse_job_ref(arg: &str) -> Option<(JobRef, bool)> {
    let (mut group, rest) = match arg.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, arg),
    };

    let (is_jid, rest) = match rest.strip_prefix('%') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };

    // The traditional group-by-jid spelling puts the marker after the `%`.
    let rest = match rest.strip_prefix('-') {
        Some(rest) if is_jid => {
            group = true;
            rest
        }
        _ => rest,
    };

    let n: i32 = rest.parse().ok()?;
    if n < 1 {
        return None;
    }
    if is_jid {
        Some((JobRef::Jid(n), group))
    } else {
        Some((JobRef::Pid(n), group))
    }
}

/// Print the lookup-failure line matching the id form and addressing mode:
/// `%<n>: No such job`, `(<n>): No such process`, or the process-group
/// variants.
fn write_lookup_failure(out: &mut dyn Write, arg: &str, group: bool) -> std::io::Result<()> {
    let digits: String = arg.chars().filter(|c| *c != '%' && *c != '-').collect();
    let is_jid = arg.contains('%');
    match (is_jid, group) {
        (true, false) => writeln!(out, "%{digits}: No such job"),
        (true, true) => writeln!(out, "%{digits}: No such process group"),
        (false, false) => writeln!(out, "({digits}): No such process"),
        (false, true) => writeln!(out, "({digits}): No such process group"),
    }
}
