//! End-to-end scenarios against the built `superlog` binary, exercising
//! a real child process and a real pipe/signal path.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

fn superlog() -> Command {
    Command::new(env!("CARGO_BIN_EXE_superlog"))
}

fn run_to_completion(mut cmd: Command) -> String {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd.spawn().expect("spawn superlog");
    let status = wait_with_timeout(&mut child, Duration::from_secs(5));
    assert!(status.success(), "superlog exited with {status:?}");
    let mut out = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut out)
        .unwrap();
    out
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::process::ExitStatus {
    let start = std::time::Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("try_wait") {
            return status;
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            panic!("superlog did not exit within {timeout:?}");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn s1_single_fd_echo() {
    let mut cmd = superlog();
    cmd.args(["--", "/bin/sh", "-c", "echo a >&2; echo b >&2; echo c >&2"]);
    let out = run_to_completion(cmd);
    assert_eq!(out, "a\nb\nc\n");
}

#[test]
fn s2_classification_preserves_global_sequence() {
    let mut cmd = superlog();
    cmd.args([
        "--",
        "/bin/sh",
        "-c",
        "echo 't1 debug x' >&2; echo 't2 info y' >&2; echo 't3 warn z' >&2; echo 't4 debug q' >&2",
    ]);
    let out = run_to_completion(cmd);
    assert_eq!(out, "t1 debug x\nt2 info y\nt3 warn z\nt4 debug q\n");
}

#[test]
fn s3_eviction_keeps_only_the_most_recent_tail() {
    // -d 0 => 1000-byte test-mode budget for the debug buffer; every
    // line below matches the default " debug " pattern so it all lands
    // in that one bounded buffer.
    let mut cmd = superlog();
    cmd.args(["-d", "0", "--", "/bin/sh", "-c", s3_child_script()]);
    let out = run_to_completion(cmd);
    let lines: Vec<&str> = out.lines().collect();
    assert!(!lines.is_empty());
    assert!(lines.len() < 50, "expected eviction, got {} lines", lines.len());
    // the surviving lines are the tail of the 50 written, oldest-first
    assert!(lines.last().unwrap().starts_with("line49 debug "));
    let first_kept: usize = lines[0]
        .trim_start_matches("line")
        .split(' ')
        .next()
        .unwrap()
        .parse()
        .unwrap();
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(*line, format!("line{} debug {}", first_kept + i, "x".repeat(40)));
    }
}

fn s3_child_script() -> &'static str {
    // 50 lines, each "lineN debug xxxx...", ~60 bytes.
    Box::leak(
        (0..50)
            .map(|i| format!("echo 'line{i} debug {}' >&2", "x".repeat(40)))
            .collect::<Vec<_>>()
            .join("; ")
            .into_boxed_str(),
    )
}

#[test]
fn s4_exclude_drops_matching_lines() {
    let mut cmd = superlog();
    cmd.args([
        "-x",
        "heartbeat",
        "--",
        "/bin/sh",
        "-c",
        "echo a >&2; echo 'heartbeat 1' >&2; echo b >&2",
    ]);
    let out = run_to_completion(cmd);
    assert_eq!(out, "a\nb\n");
}

#[test]
fn s5_trigger_with_context_fires_once_and_drops_later_lines() {
    let mut cmd = superlog();
    cmd.args([
        "--Ts",
        "PANIC",
        "--Tc",
        "1",
        "--Tn",
        "2",
        "--",
        "/bin/sh",
        "-c",
        "echo ok >&2; echo ok >&2; echo 'PANIC now' >&2; echo ctx1 >&2; echo ctx2 >&2; echo after >&2",
    ]);
    let out = run_to_completion(cmd);
    assert_eq!(out, "ok\nok\nPANIC now\nctx1\nctx2\n");
}

#[test]
fn s6_sigusr1_dumps_and_clears_then_final_dump_has_only_new_lines() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("dump.txt");

    let mut cmd = superlog();
    cmd.args([
        "-o",
        out_path.to_str().unwrap(),
        "--",
        "/bin/sh",
        "-c",
        "echo x >&2; echo y >&2; sleep 2; echo z >&2",
    ]);
    let mut child = cmd.spawn().expect("spawn superlog");

    // Give the child time to write x/y before signaling a mid-run dump.
    std::thread::sleep(Duration::from_millis(500));
    let pid = nix::unistd::Pid::from_raw(child.id() as i32);
    nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGUSR1).expect("kill SIGUSR1");

    let status = wait_with_timeout(&mut child, Duration::from_secs(6));
    assert!(status.success(), "superlog exited with {status:?}");

    let contents = std::fs::read_to_string(&out_path).unwrap();
    // The SIGUSR1 dump writes "x\ny\n" first; buffers are cleared, then
    // the final dump on child exit writes just "z\n" afterward.
    assert_eq!(contents, "x\ny\nz\n");
}
