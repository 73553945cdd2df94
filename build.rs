use std::env;
use std::process::Command;
use time::OffsetDateTime;

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_VERSION");

    println!("cargo:rustc-env=APP_BUILD_YEAR={}", build_year());

    let semver = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    println!("cargo:rustc-env=APP_VERSION_DISPLAY={}", display_version(&semver));
}

/// Reproducible builds pin the year through SOURCE_DATE_EPOCH.
fn build_year() -> i32 {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok())
        .map(|dt| dt.year())
        .unwrap_or_else(|| OffsetDateTime::now_utc().year())
}

/// Untagged debug builds get a `-dev` suffix; release builds skip git entirely.
fn display_version(semver: &str) -> String {
    if env::var("PROFILE").as_deref() == Ok("release") {
        return semver.to_string();
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    let tag = Command::new("git")
        .args(["describe", "--tags", "--exact-match"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string());

    match tag {
        Some(tag) if tag == format!("v{semver}") => semver.to_string(),
        _ => format!("{semver}-dev"),
    }
}
