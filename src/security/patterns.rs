//! Token patterns recognized in command arguments.

use regex::Regex;
use std::sync::OnceLock;

fn stable_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9+/]{22}==$").expect("static regex"))
}

fn ip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}$").expect("static regex"))
}

/// Whether `token` has the shape of a stable player id
/// (22 base64 characters followed by `==`).
pub fn is_stable_id(token: &str) -> bool {
    stable_id_re().is_match(token)
}

/// Whether `token` looks like a dotted IPv4 address.
///
/// Octets are not range-checked, so `999.1.1.1` matches.
pub fn is_ip(token: &str) -> bool {
    ip_re().is_match(token)
}
