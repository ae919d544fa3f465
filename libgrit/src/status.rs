use crate::error::GritResult;
use crate::index::IndexEntry;
use crate::obj::ObjKind;
use crate::odb::ObjectStore;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// the three-way classification working-directory state is sorted into
/// relative to the index (§4.B).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub changed: Vec<String>,
    pub new: Vec<String>,
    pub deleted: Vec<String>,
}

impl Status {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.new.is_empty() && self.deleted.is_empty()
    }
}

/// lists every regular file under `root`, excluding `.git`, as a path
/// relative to `root` with forward slashes.
fn walk_workdir(root: &Path) -> GritResult<BTreeSet<String>> {
    let mut paths = BTreeSet::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_entry(|e| e.file_name() != ".git") {
        let entry = entry.map_err(|e| anyhow!(e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).expect("walkdir yields paths under root");
        let path = relative.to_string_lossy().replace('\\', "/");
        paths.insert(path);
    }
    Ok(paths)
}

/// `status`: walks the working directory, compares its path set to the
/// index by set difference, and rehashes the working copy of every path
/// present in both to detect content changes (§4.B).
pub fn status(odb: &ObjectStore, root: &Path, entries: &[IndexEntry]) -> GritResult<Status> {
    let indexed: BTreeSet<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    let working = walk_workdir(root)?;

    let mut result = Status::default();
    for path in &working {
        if !indexed.contains(path.as_str()) {
            result.new.push(path.clone());
        }
    }
    for entry in entries {
        if !working.contains(&entry.path) {
            result.deleted.push(entry.path.clone());
            continue;
        }
        let contents = fs::read(root.join(&entry.path))?;
        let current = odb.hash_object(&contents, ObjKind::Blob, false)?;
        if current != entry.oid {
            result.changed.push(entry.path.clone());
        }
    }

    result.changed.sort();
    result.new.sort();
    result.deleted.sort();
    Ok(result)
}
