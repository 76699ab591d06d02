//! Process-level tests for the `boundcopy` binary: arguments, exit status,
//! and exactly what reaches stdout.

use std::process::{Command, Output};

fn boundcopy(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_boundcopy"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("spawn boundcopy")
}

fn a_times(n: usize) -> String {
    "A".repeat(n)
}

#[test]
fn no_argument_exits_zero_silently() {
    let out = boundcopy(&[]);
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
}

#[test]
fn short_argument_is_echoed_with_newline() {
    let out = boundcopy(&["hello"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(out.stdout, b"hello\n");
}

#[test]
fn sixty_three_bytes_succeed() {
    let arg = a_times(63);
    let out = boundcopy(&[arg.as_str()]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(out.stdout, format!("{arg}\n").into_bytes());
}

#[test]
fn sixty_four_bytes_exit_with_capacity_status() {
    let arg = a_times(64);
    let out = boundcopy(&[arg.as_str()]);
    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("capacity exceeded"), "stderr: {stderr}");
}

#[test]
fn truncate_policy_prints_prefix() {
    let arg = a_times(200);
    let out = boundcopy(&["--policy", "truncate", arg.as_str()]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(out.stdout, format!("{}\n", a_times(63)).into_bytes());
}

#[test]
fn guarded_flag_gives_same_output() {
    let out = boundcopy(&["--guarded", "same output"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(out.stdout, b"same output\n");

    let arg = a_times(64);
    let out = boundcopy(&["--guarded", arg.as_str()]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn custom_capacity_requires_guarded() {
    let out = boundcopy(&["--capacity", "16", "abc"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());

    let out = boundcopy(&["--guarded", "--capacity", "4", "abc"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(out.stdout, b"abc\n");
}

#[test]
fn unknown_policy_is_a_plain_failure() {
    let out = boundcopy(&["--policy", "overflow", "abc"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unknown overflow policy"), "stderr: {stderr}");
}

#[test]
fn second_positional_is_a_usage_error() {
    let out = boundcopy(&["one", "two"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
}

#[test]
fn repeated_invocations_agree() {
    for arg in [String::new(), "abc".to_string(), a_times(63), a_times(64), a_times(1000)] {
        let first = boundcopy(&[arg.as_str()]);
        let second = boundcopy(&[arg.as_str()]);
        assert_eq!(first.status.code(), second.status.code(), "arg len {}", arg.len());
        assert_eq!(first.stdout, second.stdout);
    }
}

#[cfg(unix)]
#[test]
fn non_utf8_bytes_pass_through_untouched() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let raw: &[u8] = b"\xff\xfeok\x80";
    let out = Command::new(env!("CARGO_BIN_EXE_boundcopy"))
        .arg(OsStr::from_bytes(raw))
        .env("RUST_LOG", "off")
        .output()
        .expect("spawn boundcopy");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(out.stdout, b"\xff\xfeok\x80\n");
}
