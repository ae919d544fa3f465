use crate::error::{GritError, GritResult};
use crate::hash::Oid;
use crate::io::{ReadExt, WriteExt};
use crate::lockfile;
use crate::obj::{FileMode, ObjKind};
use crate::odb::ObjectStore;
use crate::path;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const SIGNATURE: &[u8; 4] = b"DIRC";
const VERSION: u32 = 2;
const ENTRY_FIXED_LEN: usize = 62;

/// a single staged file, laid out exactly as the on-disk entry (§3); field
/// order is the wire order and must be preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub ctime_s: u32,
    pub ctime_n: u32,
    pub mtime_s: u32,
    pub mtime_n: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub oid: Oid,
    pub stage: u16,
    pub path: String,
}

impl IndexEntry {
    fn flags(&self) -> GritResult<u16> {
        path::check_path_len(&self.path)?;
        let path_len = (self.path.len() as u16) & 0xfff;
        Ok(((self.stage & 0x3) << 12) | path_len)
    }

    fn padding_len(&self) -> usize {
        let unpadded = ENTRY_FIXED_LEN + self.path.len() + 1; // +1 for the path's NUL
        let padded = (unpadded + 7) / 8 * 8;
        padded - unpadded
    }

    fn write(&self, out: &mut impl Write) -> GritResult<()> {
        out.write_u32(self.ctime_s)?;
        out.write_u32(self.ctime_n)?;
        out.write_u32(self.mtime_s)?;
        out.write_u32(self.mtime_n)?;
        out.write_u32(self.dev)?;
        out.write_u32(self.ino)?;
        out.write_u32(self.mode)?;
        out.write_u32(self.uid)?;
        out.write_u32(self.gid)?;
        out.write_u32(self.size)?;
        out.write_oid(self.oid)?;
        out.write_u16(self.flags()?)?;
        out.write_all(self.path.as_bytes())?;
        out.write_u8(0)?;
        out.write_all(&vec![0u8; self.padding_len()])?;
        Ok(())
    }
}

/// `read_index`: empty if the file is absent; otherwise verifies
/// signature, version, trailing checksum, and declared entry count before
/// returning the parsed entries (§4.B).
pub fn read_index(index_path: &Path) -> GritResult<Vec<IndexEntry>> {
    let data = match fs::read(index_path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    if data.len() < 12 + 20 {
        return Err(GritError::CorruptIndex("index file too short".to_owned()));
    }
    let (body, checksum) = data.split_at(data.len() - 20);
    let expected = crate::hash::hash_bytes(body);
    if expected.as_bytes() != checksum {
        return Err(GritError::CorruptIndex("checksum mismatch".to_owned()));
    }

    let mut reader = body;
    let mut signature = [0u8; 4];
    reader.read_exact(&mut signature)?;
    if &signature != SIGNATURE {
        return Err(GritError::CorruptIndex(format!(
            "bad signature {:?}",
            String::from_utf8_lossy(&signature)
        )));
    }
    let version = reader.read_u32()?;
    if version != VERSION {
        return Err(GritError::CorruptIndex(format!("unsupported version {}", version)));
    }
    let count = reader.read_u32()? as usize;

    let entry_data = reader;
    let mut entries = vec![];
    let mut i = 0;
    // design note: the bound must be `<=`, not `<`, or an entry whose
    // header starts exactly at `len - 62` is silently dropped.
    while i + ENTRY_FIXED_LEN <= entry_data.len() {
        let mut cursor = &entry_data[i..];
        let ctime_s = cursor.read_u32()?;
        let ctime_n = cursor.read_u32()?;
        let mtime_s = cursor.read_u32()?;
        let mtime_n = cursor.read_u32()?;
        let dev = cursor.read_u32()?;
        let ino = cursor.read_u32()?;
        let mode = cursor.read_u32()?;
        let uid = cursor.read_u32()?;
        let gid = cursor.read_u32()?;
        let size = cursor.read_u32()?;
        let oid = cursor.read_oid()?;
        let flags = cursor.read_u16()?;
        let path_len = (flags & 0xfff) as usize;
        let stage = (flags >> 12) & 0x3;

        let path_start = i + ENTRY_FIXED_LEN;
        let nul_at = entry_data[path_start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| GritError::CorruptIndex("unterminated path".to_owned()))?;
        let path_bytes = &entry_data[path_start..path_start + nul_at];
        if path_bytes.len() != path_len {
            return Err(GritError::CorruptIndex("path length disagrees with flags".to_owned()));
        }
        let path = std::str::from_utf8(path_bytes).map_err(|e| anyhow!(e))?.to_owned();

        let unpadded = ENTRY_FIXED_LEN + path_len + 1;
        let entry_len = (unpadded + 7) / 8 * 8;

        entries.push(IndexEntry {
            ctime_s,
            ctime_n,
            mtime_s,
            mtime_n,
            dev,
            ino,
            mode,
            uid,
            gid,
            size,
            oid,
            stage,
            path,
        });
        i += entry_len;
    }

    if entries.len() != count {
        return Err(GritError::CorruptIndex(format!(
            "declared entry count {} does not match parsed count {}",
            count,
            entries.len()
        )));
    }
    Ok(entries)
}

/// `write_index`: entries must already be sorted by path; packs the
/// header, entries, and trailing checksum and overwrites the file
/// wholesale (§4.B — single-writer, so a wholesale overwrite is
/// acceptable).
pub fn write_index(index_path: &Path, entries: &[IndexEntry]) -> GritResult<()> {
    let mut body = vec![];
    body.extend_from_slice(SIGNATURE);
    body.write_u32(VERSION)?;
    body.write_u32(entries.len() as u32)?;
    for entry in entries {
        entry.write(&mut body)?;
    }
    let checksum = crate::hash::hash_bytes(&body);
    body.write_all(checksum.as_bytes())?;
    lockfile::write_atomic(index_path, &body)?;
    Ok(())
}

fn stat_entry(odb: &ObjectStore, root: &Path, path: &str) -> GritResult<IndexEntry> {
    let full = root.join(path);
    let contents = fs::read(&full)?;
    let oid = odb.hash_object(&contents, ObjKind::Blob, true)?;
    let metadata = fs::metadata(&full)?;
    let mode = FileMode::from_metadata(&metadata);

    let (ctime_s, ctime_n) = stat_times::ctime(&metadata);
    let (mtime_s, mtime_n) = stat_times::mtime(&metadata);

    Ok(IndexEntry {
        ctime_s,
        ctime_n,
        mtime_s,
        mtime_n,
        dev: stat_times::dev(&metadata),
        ino: stat_times::ino(&metadata),
        mode: mode.as_u32(),
        uid: stat_times::uid(&metadata),
        gid: stat_times::gid(&metadata),
        size: contents.len() as u32,
        oid,
        stage: 0,
        path: path.to_owned(),
    })
}

#[cfg(unix)]
mod stat_times {
    use std::fs::Metadata;
    use std::os::unix::fs::MetadataExt;

    pub fn ctime(m: &Metadata) -> (u32, u32) {
        (m.ctime() as u32, m.ctime_nsec() as u32)
    }
    pub fn mtime(m: &Metadata) -> (u32, u32) {
        (m.mtime() as u32, m.mtime_nsec() as u32)
    }
    pub fn dev(m: &Metadata) -> u32 {
        m.dev() as u32
    }
    pub fn ino(m: &Metadata) -> u32 {
        m.ino() as u32
    }
    pub fn uid(m: &Metadata) -> u32 {
        m.uid()
    }
    pub fn gid(m: &Metadata) -> u32 {
        m.gid()
    }
}

#[cfg(not(unix))]
mod stat_times {
    use std::fs::Metadata;

    pub fn ctime(_m: &Metadata) -> (u32, u32) {
        (0, 0)
    }
    pub fn mtime(_m: &Metadata) -> (u32, u32) {
        (0, 0)
    }
    pub fn dev(_m: &Metadata) -> u32 {
        0
    }
    pub fn ino(_m: &Metadata) -> u32 {
        0
    }
    pub fn uid(_m: &Metadata) -> u32 {
        0
    }
    pub fn gid(_m: &Metadata) -> u32 {
        0
    }
}

/// `add`: normalizes each path, hashes and persists its blob, stats the
/// file, replaces any existing entry for the same path, re-sorts, and
/// writes the index wholesale (§4.B).
pub fn add(odb: &ObjectStore, root: &Path, index_path: &Path, paths: &[String]) -> GritResult<()> {
    let mut entries = read_index(index_path)?;
    for raw_path in paths {
        let normalized = path::normalize(raw_path);
        path::check_path_len(&normalized)?;
        let entry = stat_entry(odb, root, &normalized)?;
        entries.retain(|e| e.path != normalized);
        entries.push(entry);
    }
    entries.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));
    write_index(index_path, &entries)
}

/// `ls_files`: `detailed=false` yields bare paths; `detailed=true` yields
/// `<6-digit-octal-mode> <40-hex> <stage>\t<path>` (§4.B).
pub fn ls_files(entries: &[IndexEntry], detailed: bool) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            if detailed {
                format!("{:06o} {} {}\t{}", entry.mode, entry.oid, entry.stage, entry.path)
            } else {
                entry.path.clone()
            }
        })
        .collect()
}

pub fn index_path(git_dir: &Path) -> PathBuf {
    git_dir.join("index")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use tempfile::tempdir;

    fn entry(path: &str, oid: Oid) -> IndexEntry {
        IndexEntry {
            ctime_s: 1,
            ctime_n: 2,
            mtime_s: 3,
            mtime_n: 4,
            dev: 5,
            ino: 6,
            mode: FileMode::Reg.as_u32(),
            uid: 7,
            gid: 8,
            size: 6,
            oid,
            stage: 0,
            path: path.to_owned(),
        }
    }

    #[test]
    fn roundtrip_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        write_index(&path, &[]).unwrap();
        assert_eq!(read_index(&path).unwrap(), vec![]);
    }

    #[test]
    fn roundtrip_multiple_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        let entries =
            vec![entry("a.txt", Oid::new([1; 20])), entry("b/longer-name.rs", Oid::new([2; 20]))];
        write_index(&path, &entries).unwrap();
        assert_eq!(read_index(&path).unwrap(), entries);
    }

    #[quickcheck]
    fn write_read_roundtrip(raw_paths: Vec<String>, oid: Oid) -> bool {
        let mut seen = std::collections::HashSet::new();
        let entries: Vec<IndexEntry> = raw_paths
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let cleaned: String =
                    raw.chars().filter(|&c| c != '\0').take(path::MAX_PATH_LEN).collect();
                if cleaned.is_empty() { format!("entry-{}", i) } else { cleaned }
            })
            .filter(|path| seen.insert(path.clone()))
            .map(|path| entry(&path, oid))
            .collect();

        let dir = tempdir().unwrap();
        let index_path = dir.path().join("index");
        write_index(&index_path, &entries).unwrap();
        read_index(&index_path).unwrap() == entries
    }

    #[test]
    fn missing_index_reads_as_empty() {
        let dir = tempdir().unwrap();
        assert_eq!(read_index(&dir.path().join("no-such-index")).unwrap(), vec![]);
    }

    #[test]
    fn checksum_mismatch_is_corrupt_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        write_index(&path, &[entry("a.txt", Oid::new([1; 20]))]).unwrap();
        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        fs::write(&path, data).unwrap();
        assert!(matches!(read_index(&path), Err(GritError::CorruptIndex(..))));
    }

    #[test]
    fn add_stages_file_with_expected_blob_identity() {
        let dir = tempdir().unwrap();
        let git_dir = dir.path().join(".git");
        fs::create_dir_all(git_dir.join("objects")).unwrap();
        let odb = ObjectStore::new(git_dir.join("objects"));
        fs::write(dir.path().join("a.txt"), b"hello\n").unwrap();

        let idx_path = index_path(&git_dir);
        add(&odb, dir.path(), &idx_path, &["a.txt".to_owned()]).unwrap();

        let entries = read_index(&idx_path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "a.txt");
        assert_eq!(entries[0].oid.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn add_replaces_existing_entry_for_same_path() {
        let dir = tempdir().unwrap();
        let git_dir = dir.path().join(".git");
        fs::create_dir_all(git_dir.join("objects")).unwrap();
        let odb = ObjectStore::new(git_dir.join("objects"));
        let idx_path = index_path(&git_dir);

        fs::write(dir.path().join("a.txt"), b"first\n").unwrap();
        add(&odb, dir.path(), &idx_path, &["a.txt".to_owned()]).unwrap();
        fs::write(dir.path().join("a.txt"), b"second\n").unwrap();
        add(&odb, dir.path(), &idx_path, &["a.txt".to_owned()]).unwrap();

        let entries = read_index(&idx_path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].oid,
            odb.hash_object(b"second\n", ObjKind::Blob, false).unwrap()
        );
    }

    #[test]
    fn ls_files_detailed_format() {
        let e = entry("a.txt", Oid::new([0xab; 20]));
        let lines = ls_files(&[e], true);
        assert_eq!(lines[0], format!("100644 {} 0\ta.txt", Oid::new([0xab; 20])));
    }

    #[test]
    fn ls_files_plain_format() {
        let e = entry("a.txt", Oid::new([0xab; 20]));
        assert_eq!(ls_files(&[e], false), vec!["a.txt".to_owned()]);
    }
}
