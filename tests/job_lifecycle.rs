use std::io::Write;
use std::process::{Command, Stdio};

/// Drive the shell non-interactively: feed every line up front, append
/// `quit`, and collect the full transcript (stderr is merged into stdout
/// by the shell itself).
fn run_shell(lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tinysh"))
        .arg("-p")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn tinysh");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        writeln!(stdin, "quit").expect("write quit");
    }

    child.wait_with_output().expect("wait output")
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn background_launch_prints_one_announcement() {
    let output = run_shell(&["sleep 1 &"]);
    let stdout = stdout_of(&output);
    let announcements: Vec<&str> = stdout
        .lines()
        .filter(|l| l.starts_with("[1] ("))
        .collect();
    assert_eq!(announcements.len(), 1, "stdout was: {stdout}");
    assert!(
        announcements[0].ends_with(") sleep 1 &"),
        "stdout was: {stdout}"
    );
}

#[test]
fn foreground_command_blocks_and_leaves_no_table_entry() {
    let output = run_shell(&["echo MARKER", "jobs"]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("MARKER"), "stdout was: {stdout}");
    assert!(!stdout.contains("Running"), "stdout was: {stdout}");
    assert!(!stdout.contains("Foreground"), "stdout was: {stdout}");
}

#[test]
fn jobs_lists_running_background_job() {
    let output = run_shell(&["sleep 2 &", "jobs"]);
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("Running    sleep 2 &"),
        "stdout was: {stdout}"
    );
}

#[test]
fn finished_background_job_is_reaped() {
    // The foreground sleep outlives the background one, giving the reactor
    // time to reap it before `jobs` runs.
    let output = run_shell(&["sleep 1 &", "sleep 2", "jobs"]);
    let stdout = stdout_of(&output);
    assert!(!stdout.contains("Running"), "stdout was: {stdout}");
}

#[test]
fn fg_waits_for_background_job_to_finish() {
    let output = run_shell(&["sleep 1 &", "fg %1", "jobs"]);
    let stdout = stdout_of(&output);
    assert!(!stdout.contains("Running"), "stdout was: {stdout}");
    assert!(output.status.success());
}

#[test]
fn kill_group_terminates_job_and_reactor_reports_it() {
    let output = run_shell(&["sleep 5 &", "kill -%1", "sleep 1", "jobs"]);
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("terminated by signal 15"),
        "stdout was: {stdout}"
    );
    assert!(!stdout.contains("Running"), "stdout was: {stdout}");
}

#[test]
fn missing_input_redirect_aborts_only_that_job() {
    let output = run_shell(&["cat < /no/such/path", "jobs", "echo STILL-ALIVE"]);
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("/no/such/path: No such file or directory"),
        "stdout was: {stdout}"
    );
    assert!(!stdout.contains("Running"), "stdout was: {stdout}");
    assert!(stdout.contains("STILL-ALIVE"), "stdout was: {stdout}");
}

#[test]
fn unknown_command_is_reported_by_the_child() {
    let output = run_shell(&["definitely-not-a-command-xyz"]);
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("definitely-not-a-command-xyz: Command not found"),
        "stdout was: {stdout}"
    );
}

#[test]
fn output_redirect_truncates_and_writes_file() {
    let path = std::env::temp_dir().join("tinysh-redirect-out-test");
    let path_str = path.to_str().unwrap();
    std::fs::write(&path, "stale").unwrap();

    let line = format!("echo fresh > {path_str}");
    let output = run_shell(&[&line]);
    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn jobs_listing_can_be_redirected_to_a_file() {
    let path = std::env::temp_dir().join("tinysh-jobs-redirect-test");
    let path_str = path.to_str().unwrap();

    let line = format!("jobs > {path_str}");
    let output = run_shell(&["sleep 2 &", &line]);
    assert!(output.status.success());
    let listing = std::fs::read_to_string(&path).unwrap();
    assert!(
        listing.contains("Running    sleep 2 &"),
        "listing was: {listing}"
    );
    let _ = std::fs::remove_file(&path);
}

#[test]
fn seventeenth_job_is_rejected() {
    let mut lines: Vec<&str> = Vec::new();
    for _ in 0..17 {
        lines.push("sleep 3 &");
    }
    let output = run_shell(&lines);
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("Tried to create too many jobs"),
        "stdout was: {stdout}"
    );
}

#[test]
fn lookup_failures_use_distinct_messages() {
    let output = run_shell(&["bg %9", "fg 99999", "kill -%9", "kill 99999"]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("%9: No such job"), "stdout was: {stdout}");
    assert!(
        stdout.contains("(99999): No such process\n"),
        "stdout was: {stdout}"
    );
    assert!(
        stdout.contains("%9: No such process group"),
        "stdout was: {stdout}"
    );
}

#[test]
fn end_of_input_exits_zero() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tinysh"))
        .arg("-p")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn tinysh");
    drop(child.stdin.take());
    let output = child.wait_with_output().expect("wait output");
    assert!(output.status.success());
}

#[test]
fn unknown_flag_prints_usage_and_exits_one() {
    let output = Command::new(env!("CARGO_BIN_EXE_tinysh"))
        .arg("-x")
        .output()
        .expect("run tinysh");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage: tinysh [-hvp]"));
}

#[test]
fn prompt_is_emitted_unless_suppressed() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tinysh"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn tinysh");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "quit").expect("write quit");
    }
    let with_prompt = child.wait_with_output().expect("wait output");
    assert!(String::from_utf8_lossy(&with_prompt.stdout).contains("tinysh> "));

    let without_prompt = run_shell(&[]);
    assert!(!stdout_of(&without_prompt).contains("tinysh> "));
}

#[test]
fn verbose_mode_logs_job_registration() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tinysh"))
        .args(["-p", "-v"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn tinysh");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "sleep 1 &").expect("write");
        writeln!(stdin, "quit").expect("write");
    }
    let output = child.wait_with_output().expect("wait output");
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("Added job [1]"),
        "stdout was: {}",
        String::from_utf8_lossy(&output.stdout)
    );
}
