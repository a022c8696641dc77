//! Subprocess management for crash tests

use std::io::Write;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Result of one `filedb` invocation
#[derive(Debug)]
pub struct CrashTestResult {
    /// Whether the process ended abnormally
    pub crashed: bool,
    /// Exit status if the process could be waited on
    pub exit_status: Option<ExitStatus>,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
}

/// Run `filedb --config <config> <args...>`, feeding `stdin` to the
/// process and enabling `crash_point` when given.
pub fn run_filedb(
    config: &Path,
    args: &[&str],
    stdin: Option<&str>,
    crash_point: Option<&str>,
) -> CrashTestResult {
    let mut command = Command::new(env!("CARGO_BIN_EXE_filedb"));
    command
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("FILEDB_CRASH_POINT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(point) = crash_point {
        command.env("FILEDB_CRASH_POINT", point);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return CrashTestResult {
                crashed: true,
                exit_status: None,
                stdout: String::new(),
                stderr: format!("Failed to execute: {}", e),
            }
        }
    };

    if let Some(mut pipe) = child.stdin.take() {
        if let Some(input) = stdin {
            let _ = pipe.write_all(input.as_bytes());
        }
    }

    match child.wait_with_output() {
        Ok(output) => CrashTestResult {
            crashed: !output.status.success(),
            exit_status: Some(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        },
        Err(e) => CrashTestResult {
            crashed: true,
            exit_status: None,
            stdout: String::new(),
            stderr: format!("Failed to wait: {}", e),
        },
    }
}

/// Run a command that is expected to abort at `crash_point`
pub fn execute_with_crash_point(
    config: &Path,
    crash_point: &str,
    args: &[&str],
    stdin: Option<&str>,
) -> CrashTestResult {
    let result = run_filedb(config, args, stdin, Some(crash_point));
    assert!(
        result.crashed,
        "expected crash at {}, got stdout={} stderr={}",
        crash_point, result.stdout, result.stderr
    );
    assert!(
        result.stderr.contains(crash_point),
        "crash message missing for {}: {}",
        crash_point,
        result.stderr
    );
    result
}

/// Run a command that is expected to succeed; returns its `data` payload
pub fn execute_ok(config: &Path, args: &[&str], stdin: Option<&str>) -> serde_json::Value {
    let result = run_filedb(config, args, stdin, None);
    assert!(
        !result.crashed,
        "filedb {:?} failed: stdout={} stderr={}",
        args, result.stdout, result.stderr
    );
    let response: serde_json::Value = serde_json::from_str(result.stdout.trim())
        .unwrap_or_else(|e| panic!("bad response '{}': {}", result.stdout, e));
    assert_eq!(response["status"], "ok");
    response["data"].clone()
}
