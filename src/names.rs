// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX names for the shared region and the three semaphores.
// Both shm_open and sem_open want a single leading '/' and, on macOS,
// at most 31 bytes in total.

/// FNV-1a 64-bit hash.
pub fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in data {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Maximum length of a POSIX shm/semaphore name. 0 disables shortening.
#[cfg(target_os = "macos")]
pub const NAME_MAX: usize = 31;

#[cfg(not(target_os = "macos"))]
pub const NAME_MAX: usize = 0;

/// Produce a POSIX-safe name (with leading '/').
///
/// When `NAME_MAX > 0` and the name would not fit, it becomes
/// `/<prefix>_<16 hex digits of FNV-1a>` so that distinct long names stay
/// distinct after shortening.
pub fn posix_name(name: &str) -> String {
    let full = format!("/{}", name.trim_start_matches('/'));
    if NAME_MAX == 0 || full.len() <= NAME_MAX {
        return full;
    }

    // '/' + '_' + 16 hex digits
    const FIXED: usize = 2 + 16;
    let keep = NAME_MAX.saturating_sub(FIXED);
    let body = &full[1..];
    let prefix: String = body.chars().take(keep).collect();
    format!("/{prefix}_{:016x}", fnv1a_64(full.as_bytes()))
}

/// The four named OS resources one supervisor owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub shm: String,
    pub free: String,
    pub used: String,
    pub wmutex: String,
}

impl ResourceNames {
    /// Derive all resource names from a namespace prefix.
    pub fn new(namespace: &str) -> Self {
        Self {
            shm: posix_name(&format!("{namespace}_shm")),
            free: posix_name(&format!("{namespace}_sem_free")),
            used: posix_name(&format!("{namespace}_sem_used")),
            wmutex: posix_name(&format!("{namespace}_sem_wmutex")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_known_values() {
        assert_eq!(fnv1a_64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn posix_name_has_single_leading_slash() {
        assert_eq!(posix_name("foo"), "/foo");
        assert_eq!(posix_name("/bar"), "/bar");
        assert_eq!(posix_name("//baz"), "/baz");
    }

    #[test]
    fn resource_names_are_distinct() {
        let names = ResourceNames::new("tricolor");
        assert_eq!(names.shm, "/tricolor_shm");
        assert_eq!(names.wmutex, "/tricolor_sem_wmutex");
        let all = [&names.shm, &names.free, &names.used, &names.wmutex];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn long_names_are_shortened() {
        let names = ResourceNames::new("a_rather_long_namespace_for_macos");
        assert!(names.free.len() <= NAME_MAX);
        assert_ne!(names.free, names.used);
    }
}
