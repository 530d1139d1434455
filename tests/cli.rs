//! Exit behaviour of the handle-sniper binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

fn sniper() -> Command {
    let mut cmd = Command::cargo_bin("handle-sniper").unwrap();
    for var in [
        "SNIPER_LENGTH",
        "SNIPER_DIGITS",
        "SNIPER_ALPHABET",
        "SNIPER_SUFFIX",
        "SNIPER_CONCURRENCY",
        "SNIPER_MIN_DELAY_MS",
        "SNIPER_MAX_DELAY_MS",
        "SNIPER_RATE",
        "SNIPER_TIMEOUT_MS",
        "SNIPER_ORDER",
        "SNIPER_SEED",
        "SNIPER_TARGET",
        "SNIPER_OUTPUT",
        "SNIPER_FORMAT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Answers 200 for `/a`, 404 for anything else, one request per connection
fn spawn_profile_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }

            let request = String::from_utf8_lossy(&request);
            let status = match request.split_whitespace().nth(1) {
                Some("/a") => "200 OK",
                _ => "404 Not Found",
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}/", addr)
}

#[test]
fn test_help_exits_zero() {
    sniper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("USAGE"));
}

#[test]
fn test_zero_length_is_configuration_error() {
    sniper()
        .args(["--length", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration problem"));
}

#[test]
fn test_duplicate_alphabet_is_configuration_error() {
    sniper().args(["--alphabet", "abca"]).assert().code(2);
}

#[test]
fn test_inverted_delay_window_is_configuration_error() {
    sniper()
        .args(["--min-delay", "10", "--max-delay", "5"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_flag_is_cli_error() {
    sniper()
        .arg("--frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown argument"));
}

#[test]
fn test_exhausted_keyspace_exits_zero() {
    let base = spawn_profile_server();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.txt");

    sniper()
        .args([
            "--alphabet",
            "ab",
            "--length",
            "1",
            "--min-delay",
            "0",
            "--max-delay",
            "0",
            "--target",
            &base,
        ])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("All possible handles have been checked"));

    let content = std::fs::read_to_string(&output).unwrap();
    let mut lines: Vec<&str> = content.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["a - taken - status 200", "b - free - status 404"]);
}
