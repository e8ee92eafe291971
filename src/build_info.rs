//! Build metadata stamped in by `build.rs` via `option_env!`.

use alloc::format;
use alloc::string::{String, ToString};
use core::cmp::min;

pub fn get_build_info() -> String {
    let commit = option_env!("GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("GIT_BRANCH").unwrap_or("unknown");
    let dirty = option_env!("GIT_DIRTY")
        .map(|s| s == "1")
        .unwrap_or(false);
    let ts = option_env!("BUILD_TIMESTAMP").unwrap_or("0");
    let rustv = option_env!("RUST_VERSION").unwrap_or("unknown");
    let feats = option_env!("FEATURES").unwrap_or("");
    let profile = option_env!("PROFILE").unwrap_or("unknown");
    let target = option_env!("TARGET").unwrap_or("unknown");

    format!(
        "commit {}{} on {}\nbuilt {} with {}\nfeatures: {}\nprofile: {} target: {}",
        &commit[..min(12, commit.len())],
        if dirty { "-dirty" } else { "" },
        branch,
        ts,
        rustv,
        if feats.is_empty() { "(none)".to_string() } else { feats.to_string() },
        profile,
        target
    )
}

pub fn get_version_string() -> String {
    let commit = option_env!("GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("GIT_BRANCH").unwrap_or("unknown");
    let dirty = option_env!("GIT_DIRTY")
        .map(|s| s == "1")
        .unwrap_or(false);
    format!(
        "nanokern {}{} ({})",
        &commit[..min(7, commit.len())],
        if dirty { "+" } else { "" },
        branch
    )
}
