use crate::error::GritResult;
use crate::hash::Oid;
use crate::io::{BufReadExt, ReadExt, WriteExt};
use crate::obj::FileMode;
use std::io::{BufRead, Write};

/// one entry of a tree object's payload: `"<octal-mode> <path>\0" ++
/// <20-byte-raw-sha1>` (§3)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub path: String,
    pub oid: Oid,
}

/// serializes entries in the order given; callers are responsible for
/// ascending path order (the index is already sorted, so `write_tree`
/// never needs to re-sort).
pub fn encode(entries: &[TreeEntry]) -> GritResult<Vec<u8>> {
    let mut buf = vec![];
    for entry in entries {
        write!(buf, "{:o} {}", entry.mode.as_u32(), entry.path)?;
        buf.write_u8(0)?;
        buf.write_all(entry.oid.as_bytes())?;
    }
    Ok(buf)
}

/// `read_tree`: scans a tree payload, yielding (mode, path, oid) for every
/// entry. The format has no length prefix, so entries must be parsed
/// streamingly (§3, §4.D).
pub fn decode(payload: &[u8]) -> GritResult<Vec<TreeEntry>> {
    let mut reader = std::io::BufReader::new(payload);
    let mut entries = vec![];
    while !reader.is_at_eof()? {
        let mut header = vec![];
        reader.read_until(0, &mut header)?;
        header.pop(); // drop the NUL
        let header = std::str::from_utf8(&header).map_err(|e| anyhow!(e))?;
        let (mode_str, path) =
            header.split_once(' ').ok_or_else(|| anyhow!("malformed tree entry `{}`", header))?;
        let mode = FileMode::new(u32::from_str_radix(mode_str, 8).map_err(|e| anyhow!(e))?)?;
        let oid = reader.read_oid()?;
        entries.push(TreeEntry { mode, path: path.to_owned(), oid });
    }
    Ok(entries)
}
