use crate::error::{GritError, GritResult};

/// the longest path representable by the index flags field (§3: `flags`
/// bits 11:0 hold the path length)
pub const MAX_PATH_LEN: usize = 0xfff;

/// normalizes a path the way `add` does before it is staged: backslashes
/// become forward slashes (§4.B, §9 "Text-vs-bytes discipline")
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn check_path_len(path: &str) -> GritResult<()> {
    if path.len() > MAX_PATH_LEN {
        return Err(GritError::PathTooLong(path.to_owned()));
    }
    Ok(())
}
