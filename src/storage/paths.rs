//! Record path sharding
//!
//! A record's directory is derived from the thousands part of its id:
//! the decimal digits of `id / 1000` are peeled least-significant first,
//! zero digits are skipped, and each remaining digit becomes one nested
//! directory. Ids below 1000 live directly under the root.
//!
//! | id      | path                 |
//! |---------|----------------------|
//! | 7       | `7.dat`              |
//! | 1234    | `1/1234.dat`         |
//! | 12345   | `2/1/12345.dat`      |
//! | 101000  | `1/1/101000.dat`     |

use std::path::{Path, PathBuf};

/// Extension of record files
pub const RECORD_EXT: &str = "dat";

/// Shard directory digits for `id`, in nesting order
pub fn shard_segments(id: u64) -> Vec<u8> {
    let mut segments = Vec::new();
    let mut q = id / 1000;
    while q > 0 {
        let digit = (q % 10) as u8;
        if digit > 0 {
            segments.push(digit);
        }
        q /= 10;
    }
    segments
}

/// Directory that holds the record file for `id`
pub fn shard_dir(root: &Path, id: u64) -> PathBuf {
    let mut dir = root.to_path_buf();
    for digit in shard_segments(id) {
        dir.push(digit.to_string());
    }
    dir
}

/// Full path of the record file for `id`
pub fn record_path(root: &Path, id: u64) -> PathBuf {
    shard_dir(root, id).join(format!("{}.{}", id, RECORD_EXT))
}

/// Parse a record file name (`<id>.dat`) back to its id.
///
/// Only plain decimal stems are accepted, so `_stat.dat` and other
/// `_`-prefixed bookkeeping files never parse.
pub fn parse_record_name(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(".dat")?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match stem.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(id),
    }
}

/// True for names that can be shard directories (`1`..`9`)
pub fn is_shard_dir_name(name: &str) -> bool {
    matches!(name.as_bytes(), [b'1'..=b'9'])
}
