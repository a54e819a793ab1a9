use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    if let Some(path) = env::var_os("CARGO_BIN_EXE_fedifmt-cli") {
        return PathBuf::from(path);
    }
    if let Some(path) = env::var_os("CARGO_BIN_EXE_fedifmt_cli") {
        return PathBuf::from(path);
    }
    let exe = env::current_exe().expect("current exe");
    let mut debug_dir = exe.as_path();
    while let Some(parent) = debug_dir.parent() {
        if parent.file_name().and_then(|name| name.to_str()) == Some("debug") {
            let candidate = parent.join("fedifmt-cli");
            if candidate.exists() {
                return candidate;
            }
        }
        debug_dir = parent;
    }
    panic!("binary path missing");
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let mut path = env::temp_dir();
    let now = SystemTime::now().duration_since(UNIX_EPOCH).expect("time");
    let file_name = format!(
        "fedifmt_cli_{}_{}_{}.txt",
        name,
        now.as_secs(),
        now.subsec_nanos()
    );
    path.push(file_name);
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn formats_a_file_argument() {
    let path = temp_file("status", "check https://example.com/x out\n");
    let output = Command::new(bin_path())
        .arg(&path)
        .stdin(Stdio::null())
        .output()
        .expect("run fedifmt-cli");
    fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 output");
    assert!(stdout.starts_with("<p>check <a href=\"https://example.com/x\""));
}

#[test]
fn linkable_accounts_come_from_flags() {
    let path = temp_file("mention", "@alice hi\n");
    let output = Command::new(bin_path())
        .args(["--acct", "alice", "--base-url", "https://local.tld"])
        .arg(&path)
        .stdin(Stdio::null())
        .output()
        .expect("run fedifmt-cli");
    fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 output");
    assert!(stdout.contains("href=\"https://local.tld/@alice\""));
}

#[test]
fn remote_mode_sanitizes_only() {
    let path = temp_file("remote", "<p>hi</p><script>alert(1)</script>\n");
    let output = Command::new(bin_path())
        .args(["--remote"])
        .arg(&path)
        .stdin(Stdio::null())
        .output()
        .expect("run fedifmt-cli");
    fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 output");
    assert_eq!(stdout.trim_end(), "<p>hi</p>");
}

#[test]
fn rejects_unknown_content_types() {
    let output = Command::new(bin_path())
        .args(["--content-type", "docx"])
        .stdin(Stdio::null())
        .output()
        .expect("run fedifmt-cli");
    assert_eq!(output.status.code(), Some(2));
}
