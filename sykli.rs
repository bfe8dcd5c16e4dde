//! Sykli CI pipeline for Portti
//!
//! Run locally: sykli run
//! Or: cargo run --bin sykli --features sykli -- --emit | sykli run -

use sykli::{Condition, Pipeline, Template};

fn main() {
    let mut p = Pipeline::new();

    // === RESOURCES ===
    let src = p.dir(".");
    let cargo_registry = p.cache("cargo-registry");
    let cargo_git = p.cache("cargo-git");
    let target_cache = p.cache("target");

    // === TEMPLATE ===
    // Common Rust container configuration
    let rust = Template::new()
        .container("rust:1.85")
        .mount_dir(&src, "/src")
        .mount_cache(&cargo_registry, "/usr/local/cargo/registry")
        .mount_cache(&cargo_git, "/usr/local/cargo/git")
        .mount_cache(&target_cache, "/src/target")
        .workdir("/src");

    // === TASKS ===

    // Test - run all tests
    let _ = p
        .task("test")
        .from(&rust)
        .run("cargo test --all-features")
        .inputs(&["**/*.rs", "Cargo.toml", "Cargo.lock"]);

    // Lint - run clippy with strict warnings
    let _ = p
        .task("lint")
        .from(&rust)
        .run("cargo clippy --all-targets --all-features -- -D warnings")
        .inputs(&["**/*.rs", "Cargo.toml", "Cargo.lock"]);

    // Format check - verify code formatting
    let _ = p
        .task("fmt")
        .from(&rust)
        .run("cargo fmt -- --check")
        .inputs(&["**/*.rs"]);

    // Build release binary (depends on test, lint, fmt)
    let _ = p
        .task("build")
        .from(&rust)
        .run("cargo build --release --bin portti")
        .inputs(&["**/*.rs", "Cargo.toml", "Cargo.lock"])
        .output("binary", "target/release/portti")
        .after(&["test", "lint", "fmt"]);

    // Integration test with kind cluster
    // Only run on push events (not draft PRs) - requires k8s environment
    let _ = p
        .task("integration-test")
        .container("ghcr.io/sykli/kind-runner:latest")
        .mount(&src, "/src")
        .workdir("/src")
        .run(
            r#"#!/bin/bash
set -e

# Create kind cluster
kind create cluster --name portti-ci

kubectl create namespace demo || true

# Three pods whose init container keeps running, so the init strategy
# counts them as ready
for i in 0 1 2; do
cat <<EOF | kubectl apply -f -
apiVersion: v1
kind: Pod
metadata:
  name: demo-$i
  namespace: demo
  labels:
    app: demo
spec:
  initContainers:
  - name: hold
    image: busybox:1.36
    command: ["sleep", "3600"]
  containers:
  - name: main
    image: busybox:1.36
    command: ["sleep", "3600"]
EOF
done

kubectl wait --for=jsonpath='{.status.initContainerStatuses[0].state.running}' \
  pod -n demo -l app=demo --timeout=120s

# Gate should open once all three init containers are running
RUST_LOG=info ./target/release/portti \
  -n demo -l app=demo -w 3 -t 60s --strategy init --linger 1s

# Gate should time out when asked for more pods than exist
if RUST_LOG=info ./target/release/portti \
  -n demo -l app=demo -w 5 -t 5s --strategy init; then
  echo "ERROR: gate opened although only 3 pods exist"
  exit 1
fi

echo "Integration tests passed"

# Cleanup
kind delete cluster --name portti-ci || true
"#,
        )
        .input_from("build", "binary", "/src/target/release/portti")
        .when_cond(Condition::event("push").or(Condition::negate(Condition::branch("*"))))
        .timeout(600); // 10 minute timeout

    p.emit();
}
