//! Deterministic 32-bit rolling string hash.

/// Rolling hash over the UTF-16 code units of `key`.
///
/// Each step computes `hash * 31 + unit` with two's-complement wrapping
/// (`(hash << 5) - hash + unit`), so the empty string hashes to 0.
pub fn string_hash(key: &str) -> i32 {
    key.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Map `key` into `[0, shard_count)` by `|string_hash(key)| mod shard_count`.
///
/// Callers must ensure `shard_count > 0`.
pub(crate) fn hash_index(key: &str, shard_count: usize) -> usize {
    // i32::MIN has no positive i32 counterpart; unsigned_abs keeps it at 2^31.
    string_hash(key).unsigned_abs() as usize % shard_count
}
