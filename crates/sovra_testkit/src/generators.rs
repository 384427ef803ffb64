//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random paths and payloads that
//! respect (or deliberately break) the vault's path rules.

use proptest::prelude::*;

/// Windows device names plus the vault's own top-level files. Generated
/// components avoid them so the same path is valid at every depth.
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9", "LOCK",
    "MANIFEST",
];

/// Strategy for one valid path component.
pub fn path_component_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,15}")
        .expect("Invalid regex")
        .prop_filter("Component must be usable on every platform", |c| {
            let stem = c.split('.').next().unwrap_or(c);
            !c.ends_with('.') && !RESERVED_STEMS.iter().any(|r| r.eq_ignore_ascii_case(stem))
        })
}

/// Strategy for valid relative paths of one to four components.
pub fn relative_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(path_component_strategy(), 1..=4).prop_map(|parts| parts.join("/"))
}

/// Strategy for payloads, including empty ones.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

/// Strategy for paths the vault must reject.
pub fn invalid_path_strategy() -> impl Strategy<Value = String> {
    let c = path_component_strategy;
    prop_oneof![
        Just(String::new()),
        c().prop_map(|c| format!("../{c}")),
        c().prop_map(|c| format!("{c}/../../{c}")),
        c().prop_map(|c| format!("/{c}")),
        c().prop_map(|c| format!("{c}\\..\\{c}")),
        c().prop_map(|c| format!("C:{c}")),
        c().prop_map(|c| format!("{c}//{c}")),
        c().prop_map(|c| format!("{c}/./{c}")),
        c().prop_map(|c| format!("{c}\0")),
        c().prop_map(|c| format!(".tmp-{c}")),
    ]
}
