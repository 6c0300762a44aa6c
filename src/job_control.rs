use std::io;
use std::os::unix::io::AsRawFd;

/// Put `pid` into process group `pgid`. The launcher calls this from the
/// parent as well as the child, so the group exists before either side
/// can act on it.
pub(crate) fn set_process_group(pid: libc::pid_t, pgid: libc::pid_t) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::setpgid(pid, pgid) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(code) if code == libc::EINTR => continue,
            // Already exec'd or gone; the other side won the race.
            Some(code) if code == libc::EACCES || code == libc::ESRCH => return Ok(()),
            _ => return Err(err),
        }
    }
}

/// Send `signal` to a single process.
pub(crate) fn send_signal(pid: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    kill_retrying(pid, signal)
}

/// Send `signal` to every member of the process group led by `pgid`
/// (negative-pid addressing).
pub(crate) fn send_signal_to_group(pgid: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid process group id",
        ));
    }
    kill_retrying(-pgid, signal)
}

fn kill_retrying(target: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::kill(target, signal) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Set `signal`'s disposition to ignore. The disposition survives fork and
/// exec, which is how `nohup` shields subsequently launched commands.
pub(crate) fn ignore_signal(signal: libc::c_int) -> io::Result<()> {
    let previous = unsafe { libc::signal(signal, libc::SIG_IGN) };
    if previous == libc::SIG_ERR {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Point stderr at stdout, so a driver reading the stdout pipe sees every
/// diagnostic in order.
pub(crate) fn merge_stderr_into_stdout() -> io::Result<()> {
    loop {
        let rc = unsafe { libc::dup2(libc::STDOUT_FILENO, libc::STDERR_FILENO) };
        if rc >= 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Child side of the launch barrier: block until the parent has registered
/// the job and closed its end of the pipe.
///
/// Runs between fork and exec, so only raw `read` — no buffered I/O, no
/// allocation.
pub(crate) fn await_release(rx: &os_pipe::PipeReader) {
    let mut byte = 0u8;
    loop {
        let n = unsafe {
            libc::read(
                rx.as_raw_fd(),
                (&mut byte as *mut u8).cast::<libc::c_void>(),
                1,
            )
        };
        if n > 0 {
            // Release byte seen; keep reading until the parent closes.
            continue;
        }
        if n == 0 {
            return;
        }
        if io::Error::last_os_error().raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return;
    }
}
