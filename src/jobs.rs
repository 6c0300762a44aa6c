use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Maximum number of jobs tracked at any point in time.
pub const MAX_JOBS: usize = 16;

/// The lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Foreground,
    Background,
    Stopped,
}

impl JobState {
    /// Fixed-width label used by the `jobs` listing.
    pub fn label(self) -> &'static str {
        match self {
            JobState::Foreground => "Foreground ",
            JobState::Background => "Running    ",
            JobState::Stopped => "Stopped    ",
        }
    }
}

/// A single tracked job: one process group, led by `pid`.
#[derive(Debug, Clone)]
pub struct Job {
    pub pid: i32,
    pub jid: i32,
    pub state: JobState,
    pub cmdline: String,
}

/// The shell's job table — a fixed-capacity slot array scanned linearly
/// by pid or job id.
///
/// The table does no locking of its own; callers serialize access through
/// [`SharedJobs`]. Job ids are allocated from a counter that wraps to 1
/// once it exceeds capacity, and the counter is recomputed as
/// (max active jid)+1 after every removal.
pub struct JobTable {
    slots: [Option<Job>; MAX_JOBS],
    next_jid: i32,
    verbose: bool,
}

impl JobTable {
    pub fn new(verbose: bool) -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            next_jid: 1,
            verbose,
        }
    }

    /// Register a new job. Returns the allocated job id, or `None` (after
    /// reporting) when every slot is occupied.
    pub fn add(&mut self, pid: i32, state: JobState, cmdline: &str) -> Option<i32> {
        if pid < 1 {
            return None;
        }

        for slot in &mut self.slots {
            if slot.is_none() {
                let jid = self.next_jid;
                self.next_jid += 1;
                if self.next_jid > MAX_JOBS as i32 {
                    self.next_jid = 1;
                }
                *slot = Some(Job {
                    pid,
                    jid,
                    state,
                    cmdline: cmdline.to_string(),
                });
                if self.verbose {
                    println!("Added job [{jid}] {pid} {cmdline}");
                }
                return Some(jid);
            }
        }
        println!("Tried to create too many jobs");
        None
    }

    /// Remove the job led by `pid`. Returns false if no such job is active.
    pub fn remove(&mut self, pid: i32) -> bool {
        if pid < 1 {
            return false;
        }

        for i in 0..self.slots.len() {
            if self.slots[i].as_ref().is_some_and(|j| j.pid == pid) {
                self.slots[i] = None;
                self.next_jid = self.max_jid() + 1;
                return true;
            }
        }
        false
    }

    fn max_jid(&self) -> i32 {
        self.iter().map(|j| j.jid).max().unwrap_or(0)
    }

    /// Pid of the current foreground job, if any.
    pub fn foreground_pid(&self) -> Option<i32> {
        self.iter()
            .find(|j| j.state == JobState::Foreground)
            .map(|j| j.pid)
    }

    pub fn by_pid(&self, pid: i32) -> Option<&Job> {
        if pid < 1 {
            return None;
        }
        self.iter().find(|j| j.pid == pid)
    }

    pub fn by_pid_mut(&mut self, pid: i32) -> Option<&mut Job> {
        if pid < 1 {
            return None;
        }
        self.iter_mut().find(|j| j.pid == pid)
    }

    pub fn by_jid_mut(&mut self, jid: i32) -> Option<&mut Job> {
        if jid < 1 {
            return None;
        }
        self.iter_mut().find(|j| j.jid == jid)
    }

    /// Active jobs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }
}

/// Shared handle to the job table.
///
/// One instance is owned by the shell's top level and cloned into the
/// signal reactor thread. The mutex serializes every table access from
/// both threads — it plays the role the all-signals-blocked mask plays in
/// a handler-based design — and the condvar carries "a job state changed"
/// wakeups to the foreground waiter.
#[derive(Clone)]
pub struct SharedJobs {
    inner: Arc<(Mutex<JobTable>, Condvar)>,
}

impl SharedJobs {
    pub fn new(verbose: bool) -> Self {
        Self {
            inner: Arc::new((Mutex::new(JobTable::new(verbose)), Condvar::new())),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, JobTable> {
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wake anyone blocked in [`SharedJobs::wait_foreground`]. Called by the
    /// reactor after every table mutation.
    pub fn notify(&self) {
        self.inner.1.notify_all();
    }

    /// Block the calling thread until no job holds foreground status.
    ///
    /// The condvar releases the lock and sleeps atomically, so a state
    /// change can't slip between the predicate check and the suspension;
    /// any wakeup (including spurious ones) just re-checks the predicate.
    pub fn wait_foreground(&self) {
        let mut table = self.lock();
        while table.foreground_pid().is_some() {
            table = self
                .inner
                .1
                .wait(table)
                .unwrap_or_else(|e| e.into_inner());
        }
    }
}
