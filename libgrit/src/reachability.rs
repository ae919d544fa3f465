use crate::commit::CommitPayload;
use crate::error::{GritError, GritResult};
use crate::hash::Oid;
use crate::obj::ObjKind;
use crate::odb::ObjectStore;
use crate::tree;
use std::collections::HashSet;

/// `find_tree_objects`: the tree itself plus, for each entry, either the
/// recursive closure of a subtree or the entry's own identity. Uses an
/// explicit work list rather than recursion, so depth is bounded by heap
/// rather than stack.
pub fn find_tree_objects(odb: &ObjectStore, root: Oid) -> GritResult<HashSet<Oid>> {
    let mut seen = HashSet::new();
    let mut work = vec![root];
    while let Some(oid) = work.pop() {
        if !seen.insert(oid) {
            continue;
        }
        let (kind, payload) = odb.read_object_by_oid(oid)?;
        if kind != ObjKind::Tree {
            return Err(GritError::KindMismatch { oid, expected: ObjKind::Tree, actual: kind });
        }
        for entry in tree::decode(&payload)? {
            if entry.mode.is_tree() {
                work.push(entry.oid);
            } else {
                seen.insert(entry.oid);
            }
        }
    }
    Ok(seen)
}

/// `find_commit_objects`: the commit, its tree closure, and the closure of
/// every parent. This core only ever writes zero or one parent, but the
/// walk supports any number, matching how a commit object is actually
/// shaped (§4.D).
pub fn find_commit_objects(odb: &ObjectStore, root: Oid) -> GritResult<HashSet<Oid>> {
    let mut seen = HashSet::new();
    let mut work = vec![root];
    while let Some(oid) = work.pop() {
        if !seen.insert(oid) {
            continue;
        }
        let (kind, payload) = odb.read_object_by_oid(oid)?;
        if kind != ObjKind::Commit {
            return Err(GritError::KindMismatch { oid, expected: ObjKind::Commit, actual: kind });
        }
        let commit = CommitPayload::decode(&payload)?;
        seen.extend(find_tree_objects(odb, commit.tree)?);
        work.extend(commit.parents);
    }
    Ok(seen)
}

/// `find_missing`: the objects reachable from `local_tip` that are not
/// known to be reachable from `remote_tip`. A plain set difference, not a
/// common-ancestor negotiation: an overestimate when histories diverge,
/// exact for the fast-forward case this core supports.
pub fn find_missing(
    odb: &ObjectStore,
    local_tip: Oid,
    remote_tip: Option<Oid>,
) -> GritResult<HashSet<Oid>> {
    let local = find_commit_objects(odb, local_tip)?;
    let remote = match remote_tip {
        Some(tip) => find_commit_objects(odb, tip)?,
        None => HashSet::new(),
    };
    Ok(local.difference(&remote).copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit;
    use crate::index::IndexEntry;
    use crate::obj::FileMode;
    use crate::time::Timestamp;
    use tempfile::tempdir;

    fn make_repo_with_one_commit() -> (tempfile::TempDir, ObjectStore, Oid) {
        let dir = tempdir().unwrap();
        let odb = ObjectStore::new(dir.path());
        let blob = odb.hash_object(b"hello\n", ObjKind::Blob, true).unwrap();
        let entries = vec![IndexEntry {
            ctime_s: 0,
            ctime_n: 0,
            mtime_s: 0,
            mtime_n: 0,
            dev: 0,
            ino: 0,
            mode: FileMode::Reg.as_u32(),
            uid: 0,
            gid: 0,
            size: 6,
            oid: blob,
            stage: 0,
            path: "a.txt".into(),
        }];
        let tree = commit::write_tree(&odb, &entries).unwrap();
        let author = commit::Identity { name: "A".into(), email: "a@x".into() };
        let c = commit::commit(
            &odb,
            tree,
            None,
            &author,
            Timestamp { seconds: 1700000000, offset_minutes: 0 },
            "init",
        )
        .unwrap();
        (dir, odb, c)
    }

    #[test]
    fn commit_closure_includes_tree_and_blob() {
        let (_dir, odb, commit_oid) = make_repo_with_one_commit();
        let closure = find_commit_objects(&odb, commit_oid).unwrap();
        assert!(closure.contains(&commit_oid));
        assert_eq!(closure.len(), 3); // commit, tree, blob
    }

    #[test]
    fn missing_against_absent_remote_is_full_closure() {
        let (_dir, odb, commit_oid) = make_repo_with_one_commit();
        let closure = find_commit_objects(&odb, commit_oid).unwrap();
        let missing = find_missing(&odb, commit_oid, None).unwrap();
        assert_eq!(missing, closure);
    }

    #[test]
    fn missing_against_self_is_empty() {
        let (_dir, odb, commit_oid) = make_repo_with_one_commit();
        let missing = find_missing(&odb, commit_oid, Some(commit_oid)).unwrap();
        assert!(missing.is_empty());
    }
}
