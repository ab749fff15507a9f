//! Chunk arithmetic, in 64 bits so large indices cannot overflow.

/// Relative `(start, length)` of chunk `index` of size `chunk_size` within
/// an object of `total` bytes.
///
/// The final chunk is short; chunks past the end are empty.
pub fn chunk_window(total: u64, index: u64, chunk_size: u64) -> (u64, u64) {
    let start = match index.checked_mul(chunk_size) {
        Some(start) if start < total => start,
        _ => return (total, 0),
    };
    (start, chunk_size.min(total - start))
}
