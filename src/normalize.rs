// Name normalization
//
// Two functions, two jobs. Do not merge them: the whitelist is keyed by
// readable names with punctuation ("e.on ventures"), the cache by
// storage-safe keys ("eon_ventures").

/// Storage-safe cache key: lowercase, trimmed, whitespace runs become `_`,
/// anything outside `[a-z0-9_]` is dropped.
pub fn cache_key(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut key = String::with_capacity(lowered.len());
    let mut in_space = false;

    for c in lowered.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                key.push('_');
                in_space = true;
            }
            continue;
        }
        in_space = false;

        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            key.push(c);
        }
    }

    key
}

/// Whitelist lookup key: lowercase, trimmed, whitespace runs become a single
/// space. Punctuation is kept.
pub fn whitelist_key(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
