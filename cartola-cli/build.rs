//! Stamps `cartola --version` with the source revision.

use std::path::Path;
use std::process::Command;

const SHA_VAR: &str = "CARTOLA_BUILD_SHA";

fn main() {
    // Packaged builds have no .git; they pass the revision in instead
    println!("cargo:rerun-if-env-changed={SHA_VAR}");
    let sha = std::env::var(SHA_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(git_revision)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env={SHA_VAR}={sha}");
}

/// `abc1234`, or `abc1234-dirty` when the tree has uncommitted changes.
fn git_revision() -> Option<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).parent()?;
    for tracked in [".git/HEAD", ".git/index"] {
        let path = root.join(tracked);
        if path.exists() {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }

    let out = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["describe", "--always", "--dirty", "--abbrev=7"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8(out.stdout).ok()?.trim().to_string();
    (!rev.is_empty()).then_some(rev)
}
