//! Build script for Brewlab
//!
//! Embeds a build number and timestamp. The number comes from the environment when a
//! release pipeline sets one, otherwise from a local counter bumped on each rebuild.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn next_local_build() -> u64 {
    let path = Path::new(COUNTER_FILE);
    let current: u64 = fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);

    let next = current + 1;
    if let Err(e) = fs::write(path, next.to_string()) {
        println!("cargo:warning=Could not update {}: {}", COUNTER_FILE, e);
    }
    next
}

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-env-changed=BREWLAB_RELEASE_BUILD");

    let build = std::env::var("BREWLAB_RELEASE_BUILD")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or_else(next_local_build);

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=BREWLAB_BUILD_NUMBER={}", build);
    println!("cargo:rustc-env=BREWLAB_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:warning=Brewlab Build #{} at {}", build, timestamp);
}
