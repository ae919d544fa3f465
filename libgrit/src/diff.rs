use crate::error::GritResult;
use crate::index::IndexEntry;
use crate::odb::ObjectStore;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const SEPARATOR: &str = "----------------------------------------------------------------------";

/// `diff`: for every changed path, renders a unified diff between the
/// index's blob and the working copy, separated by a 70-character rule
/// between files (§4.B).
pub fn diff(odb: &ObjectStore, root: &Path, entries: &[IndexEntry], changed: &[String]) -> GritResult<String> {
    let mut out = String::new();
    for (i, path) in changed.iter().enumerate() {
        if i > 0 {
            writeln!(out, "{}", SEPARATOR)?;
        }
        let entry = entries
            .iter()
            .find(|e| &e.path == path)
            .unwrap_or_else(|| panic!("diff requested for unstaged path `{}`", path));
        let (_, old_payload) = odb.read_object_by_oid(entry.oid)?;
        let old_text = String::from_utf8_lossy(&old_payload);
        let new_bytes = fs::read(root.join(path))?;
        let new_text = String::from_utf8_lossy(&new_bytes);

        writeln!(out, "diff --grit a/{} b/{}", path, path)?;
        writeln!(out, "--- a/{}", path)?;
        writeln!(out, "+++ b/{}", path)?;
        let text_diff = TextDiff::from_lines(old_text.as_ref(), new_text.as_ref());
        for change in text_diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            write!(out, "{}{}", sign, change)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::{FileMode, ObjKind};
    use tempfile::tempdir;

    fn entry(path: &str, oid: crate::hash::Oid) -> IndexEntry {
        IndexEntry {
            ctime_s: 0,
            ctime_n: 0,
            mtime_s: 0,
            mtime_n: 0,
            dev: 0,
            ino: 0,
            mode: FileMode::Reg.as_u32(),
            uid: 0,
            gid: 0,
            size: 0,
            oid,
            stage: 0,
            path: path.to_owned(),
        }
    }

    #[test]
    fn renders_a_single_file_change() {
        let dir = tempdir().unwrap();
        let odb = ObjectStore::new(dir.path().join(".git/objects"));
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        let oid = odb.hash_object(b"before\n", ObjKind::Blob, true).unwrap();
        fs::write(dir.path().join("a.txt"), b"after\n").unwrap();

        let output = diff(&odb, dir.path(), &[entry("a.txt", oid)], &["a.txt".to_owned()]).unwrap();
        assert!(output.contains("--- a/a.txt"));
        assert!(output.contains("-before"));
        assert!(output.contains("+after"));
        assert!(!output.contains(SEPARATOR));
    }

    #[test]
    fn separates_multiple_files_with_a_rule() {
        let dir = tempdir().unwrap();
        let odb = ObjectStore::new(dir.path().join(".git/objects"));
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        let oid_a = odb.hash_object(b"a-before\n", ObjKind::Blob, true).unwrap();
        let oid_b = odb.hash_object(b"b-before\n", ObjKind::Blob, true).unwrap();
        fs::write(dir.path().join("a.txt"), b"a-after\n").unwrap();
        fs::write(dir.path().join("b.txt"), b"b-after\n").unwrap();

        let entries = vec![entry("a.txt", oid_a), entry("b.txt", oid_b)];
        let output = diff(&odb, dir.path(), &entries, &["a.txt".to_owned(), "b.txt".to_owned()]).unwrap();
        assert_eq!(output.matches(SEPARATOR).count(), 1);
    }
}
