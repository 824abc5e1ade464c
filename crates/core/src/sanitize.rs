// SPDX-License-Identifier: MIT

//! Sandbox name sanitization.
//!
//! A single pure function shared byte-for-byte by the Worker and the
//! Reaper (§9 REDESIGN FLAGS: "Reaper regex sanitization inside the loop").
//! Diverging sanitization logic between the two would leak sandboxes: the
//! Worker would create one under name A while the Reaper looked for name B
//! to delete.

/// Maps a user identity to a DNS-label-safe sandbox name fragment:
/// lowercase, non-`[a-z0-9]` collapsed to `-`, leading/trailing `-`
/// stripped, empty result replaced with `"anonymous"`.
///
/// Distinct identities can collide on the sanitized name; this is a known
/// limitation (SPEC_FULL §9) and is not detected here.
pub fn sanitize_user_id(user_id: &str) -> String {
    let mut out = String::with_capacity(user_id.len());
    let mut last_was_dash = false;
    for ch in user_id.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() { "anonymous".to_string() } else { trimmed.to_string() }
}

/// Full sandbox object name: `session-<sanitized_user_id>`.
pub fn sandbox_name(user_id: &str) -> String {
    format!("session-{}", sanitize_user_id(user_id))
}
