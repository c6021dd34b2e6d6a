//! Container naming.
//!
//! Names follow `[prefix_]service_index`, where `index` is the lowest
//! non-negative integer not already taken on the host. Names stay
//! predictable for operators and never collide.

use std::collections::HashSet;

pub fn container_name(prefix: &str, service: &str, index: usize) -> String {
    if prefix.is_empty() {
        format!("{service}_{index}")
    } else {
        format!("{prefix}_{service}_{index}")
    }
}

/// Lowest-indexed name for `service` that is absent from `used`.
pub fn next_free_name(used: &HashSet<String>, prefix: &str, service: &str) -> String {
    let mut index = 0;
    loop {
        let name = container_name(prefix, service, index);
        if !used.contains(&name) {
            return name;
        }
        index += 1;
    }
}
