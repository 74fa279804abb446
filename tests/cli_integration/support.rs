//! Support utilities for CLI integration tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use tlsmint::pki::backends::fixture::{CA_CERTIFICATE_PEM, CA_PRIVATE_KEY_PEM};

/// Scratch directory holding the test authority's documents.
pub struct Workspace {
    dir: TempDir,
    pub ca_cert: PathBuf,
    pub ca_key: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let ca_cert = dir.path().join("ca.pem");
        let ca_key = dir.path().join("ca-key.pem");
        std::fs::write(&ca_cert, CA_CERTIFICATE_PEM).expect("write CA chain");
        std::fs::write(&ca_key, CA_PRIVATE_KEY_PEM).expect("write CA key");
        Self { dir, ca_cert, ca_key }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `tlsmint issue` against the workspace authority with extra arguments.
    pub fn issue(&self, labels: &[&str], extra: &[&str]) -> Output {
        let mut args = vec!["issue".to_string()];
        for label in labels {
            args.push("--label".to_string());
            args.push(label.to_string());
        }
        args.push("--ca-cert".to_string());
        args.push(self.ca_cert.display().to_string());
        args.push("--ca-key".to_string());
        args.push(self.ca_key.display().to_string());
        args.extend(extra.iter().map(|arg| arg.to_string()));
        run_cli(&args)
    }
}

/// Run the binary with a clean logging environment.
pub fn run_cli<S: AsRef<std::ffi::OsStr>>(args: &[S]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tlsmint"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("TLSMINT_LOG_JSON")
        .env_remove("TLSMINT_LOG_LEVEL")
        .current_dir(std::env::temp_dir())
        .output()
        .expect("run tlsmint binary")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}
