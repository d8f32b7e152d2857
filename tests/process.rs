//! End-to-end tests against the built binary.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

const BIN: &str = env!("CARGO_BIN_EXE_controller-agent");

#[test]
fn test_missing_kubeconfig_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("kubeconfig");

    let output = Command::new(BIN)
        .args(["--client-config-path", missing.to_str().unwrap()])
        .args(["--debug-addr", "127.0.0.1:0"])
        .env("RUST_LOG", "info")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Terminating"));
    assert!(!stdout.contains("Debug server listening"));
}

#[test]
fn test_invalid_flags_exit_non_zero() {
    let output = Command::new(BIN)
        .args(["--workers", "0", "--debug-addr", "127.0.0.1:0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn test_sigterm_exits_cleanly() {
    let mut kubeconfig = tempfile::NamedTempFile::new().unwrap();
    kubeconfig
        .write_all(
            br#"
apiVersion: v1
kind: Config
clusters:
- name: local
  cluster:
    server: http://127.0.0.1:9
contexts:
- name: local
  context:
    cluster: local
    user: local
current-context: local
users:
- name: local
  user:
    token: test
"#,
        )
        .unwrap();

    let mut child = Command::new(BIN)
        .args(["--client-config-path", kubeconfig.path().to_str().unwrap()])
        .args(["--debug-addr", "127.0.0.1:0"])
        .args(["--log-format", "json"])
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let ready = loop {
        match rx.recv_timeout(Duration::from_secs(20)) {
            Ok(line) if line.contains("waiting for termination signal") => break true,
            Ok(_) => continue,
            Err(_) => break false,
        }
    };
    if !ready {
        let _ = child.kill();
        panic!("agent never reached the running state");
    }

    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let exit = child.wait().unwrap();
    assert_eq!(exit.code(), Some(0));

    let rest: Vec<String> = rx.try_iter().collect();
    assert!(rest.iter().any(|line| line.contains("Shutdown complete")));
}
