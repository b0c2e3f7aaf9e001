use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=ASCIIANT_BUILD");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    let target = std::env::var("ASCIIANT_BUILD")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(target_label);
    println!("cargo:rustc-env=ASCIIANT_BUILD={}", target);

    let sha = short_sha_from_git()
        .or_else(|| std::env::var("GITHUB_SHA").ok().and_then(|v| short_hex(&v)))
        .unwrap_or_default();
    println!("cargo:rustc-env=ASCIIANT_GIT_SHA={}", sha);
}

fn short_hex(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let short = &raw[..raw.len().min(7)];
    if short.is_empty() || !short.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(short.to_ascii_lowercase())
}

fn short_sha_from_git() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    short_hex(std::str::from_utf8(&out.stdout).ok()?)
}

fn target_label() -> String {
    let os = match std::env::var("CARGO_CFG_TARGET_OS").as_deref() {
        Ok("macos") => "darwin".to_string(),
        Ok(other) => other.to_string(),
        Err(_) => "unknown".to_string(),
    };
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "unknown".to_string());
    format!("{os}-{arch}")
}
