//! Shared helpers for integration tests
//!
//! Console tests drive the router with an in-memory [`FakeTailscale`] runner.
//! CLI tests run the real binary against a shell script standing in for
//! `tailscale` (unix only).

#![allow(dead_code)] // Not every test file uses every helper

use assert_cmd::Command;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use twintail::console::{create_router, AppState};
use twintail::error::{Result, TwintailError};
use twintail::i18n::I18n;
use twintail::serve::{CommandOutput, CommandRunner, ServeManager};

/// Status document with three services, keys deliberately out of order.
pub const THREE_SERVICES: &str = r#"{
    "Services": {
        "svc:web-app": {
            "TCP": {"443": {"HTTPS": true}},
            "Web": {
                "web-app.example.ts.net:443": {
                    "Handlers": {"/": {"Proxy": "http://localhost:3000"}}
                }
            }
        },
        "svc:api-server": {
            "TCP": {"443": {"HTTPS": true}},
            "Web": {
                "api-server.example.ts.net:443": {
                    "Handlers": {"/": {"Proxy": "http://localhost:8080"}}
                }
            }
        },
        "svc:db-proxy": {
            "TCP": {"80": {"HTTP": true}},
            "Web": {
                "db-proxy.example.ts.net:80": {
                    "Handlers": {"/": {"Proxy": "http://localhost:5432"}}
                }
            }
        }
    }
}"#;

type Matcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// In-memory daemon holding a status document.
///
/// `serve --service=...` adds a handler, the same call with `off` removes it
/// (dropping the service with its last endpoint), and `serve clear` removes
/// the service; `serve status --json` prints the current document. A
/// registered failure short-circuits any matching call and leaves the state
/// untouched.
pub struct FakeTailscale {
    status: Mutex<String>,
    installed: bool,
    failures: Mutex<Vec<(Matcher, CommandOutput)>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeTailscale {
    pub fn new(status: &str) -> Self {
        Self {
            status: Mutex::new(status.to_string()),
            installed: true,
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every invocation fails as if the binary were missing.
    pub fn not_installed() -> Self {
        Self {
            installed: false,
            ..Self::new("{}")
        }
    }

    /// Fail any invocation whose arguments contain `needle`.
    pub fn fail_when_arg(self, needle: &str, stderr: &str) -> Self {
        let needle = needle.to_string();
        self.failures.lock().unwrap().push((
            Box::new(move |args: &[String]| args.iter().any(|a| a == &needle)),
            CommandOutput::failed(stderr),
        ));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded mutations (everything but status queries and version probes).
    pub fn mutations(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| args.first().map(String::as_str) == Some("serve"))
            .filter(|args| args.get(1).map(String::as_str) != Some("status"))
            .collect()
    }

    /// Apply a mutation to the document. A document that is not JSON is
    /// served as-is and mutations against it just succeed.
    fn mutate(&self, args: &[&str]) -> CommandOutput {
        let mut status = self.status.lock().unwrap();
        let Ok(mut doc) = serde_json::from_str::<Value>(&status) else {
            return CommandOutput::ok("");
        };
        if !doc["Services"].is_object() {
            doc["Services"] = json!({});
        }
        let Some(services) = doc["Services"].as_object_mut() else {
            return CommandOutput::failed("status document is not an object");
        };

        let output = match args {
            ["serve", "clear", key] => {
                services.remove(*key);
                CommandOutput::ok("")
            },
            ["serve", service, listener, destination, rest @ ..] => {
                let parsed = service
                    .strip_prefix("--service=")
                    .zip(listener.strip_prefix("--").and_then(|l| l.split_once('=')));
                match (parsed, rest) {
                    (Some((key, (protocol, port))), []) => {
                        add_handler(services, key, protocol, port, destination)
                    },
                    (Some((key, (_, port))), ["off"]) => {
                        remove_handler(services, key, port, destination)
                    },
                    _ => CommandOutput::failed("unsupported serve arguments"),
                }
            },
            _ => CommandOutput::ok(""),
        };

        *status = doc.to_string();
        output
    }
}

fn web_host(key: &str, port: &str) -> String {
    format!("{}.example.ts.net:{}", key.trim_start_matches("svc:"), port)
}

fn add_handler(
    services: &mut Map<String, Value>,
    key: &str,
    protocol: &str,
    port: &str,
    destination: &str,
) -> CommandOutput {
    let service = services.entry(key).or_insert_with(|| json!({}));
    service["TCP"][port] = json!({"HTTPS": protocol == "https", "HTTP": protocol == "http"});
    service["Web"][web_host(key, port)]["Handlers"]["/"] = json!({"Proxy": destination});
    CommandOutput::ok("")
}

fn remove_handler(
    services: &mut Map<String, Value>,
    key: &str,
    port: &str,
    destination: &str,
) -> CommandOutput {
    let host = web_host(key, port);
    let Some(service) = services.get_mut(key) else {
        return CommandOutput::failed("error: service does not exist");
    };
    if service["Web"][&host]["Handlers"]["/"]["Proxy"].as_str() != Some(destination) {
        return CommandOutput::failed("error: handler does not exist");
    }

    let now_empty = match service["Web"].as_object_mut() {
        Some(web) => {
            web.remove(&host);
            web.is_empty()
        },
        None => true,
    };
    if let Some(tcp) = service["TCP"].as_object_mut() {
        tcp.remove(port);
    }
    if now_empty {
        services.remove(key);
    }
    CommandOutput::ok("")
}

impl CommandRunner for FakeTailscale {
    fn run(&self, args: &[String]) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(args.to_vec());

        if !self.installed {
            return Err(TwintailError::Execution {
                command: format!("tailscale {}", args.join(" ")),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            });
        }

        if let Some((_, output)) = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(matches, _)| matches(args))
        {
            return Ok(output.clone());
        }

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["serve", "status", "--json"] => Ok(CommandOutput::ok(self.status.lock().unwrap().clone())),
            ["version"] => Ok(CommandOutput::ok("1.76.0")),
            _ => Ok(self.mutate(&args)),
        }
    }
}

/// Router over a fake daemon, plus the handle to inspect its calls.
pub fn console_app(fake: FakeTailscale) -> (axum::Router, Arc<FakeTailscale>) {
    let fake = Arc::new(fake);
    let manager = ServeManager::new(fake.clone());
    let i18n = I18n::load("en").expect("embedded locales load");
    (create_router(AppState::new(manager, i18n)), fake)
}

/// Path of the `twintail` binary under test
#[allow(deprecated)] // cargo_bin() is deprecated but needed for fallback
pub fn twintail_binary() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_twintail")
        .map(PathBuf::from)
        .unwrap_or_else(|_| assert_cmd::cargo::cargo_bin("twintail"))
}

/// `twintail` with an isolated environment
pub fn twintail_command() -> Command {
    let mut cmd = Command::new(twintail_binary());
    cmd.env("HOME", "/nonexistent")
        .env_remove("TAILSCALE_BIN")
        .env_remove("TWINTAIL_BIND")
        .env_remove("TWINTAIL_LANG")
        .env_remove("PORT")
        .env_remove("RUST_LOG");
    cmd
}

/// Write an executable `tailscale` stand-in into `dir`.
///
/// `serve status --json` prints `status`; `version` succeeds; any other call
/// is appended to `calls.log` and exits with `exit_code`, printing `stderr`.
#[cfg(unix)]
pub fn write_fake_tailscale(
    dir: &std::path::Path,
    status: &str,
    exit_code: i32,
    stderr: &str,
) -> PathBuf {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fs::write(dir.join("status.json"), status).unwrap();
    let script = format!(
        r#"#!/bin/sh
DIR="$(dirname "$0")"
if [ "$1" = "serve" ] && [ "$2" = "status" ]; then
    cat "$DIR/status.json"
    exit 0
fi
if [ "$1" = "version" ]; then
    echo "1.76.0"
    exit 0
fi
echo "$@" >> "$DIR/calls.log"
printf '%s' '{stderr}' >&2
exit {exit_code}
"#,
        stderr = stderr,
        exit_code = exit_code,
    );

    let path = dir.join("tailscale");
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
