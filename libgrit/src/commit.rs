use crate::error::{GritError, GritResult};
use crate::hash::Oid;
use crate::index::IndexEntry;
use crate::obj::{FileMode, ObjKind};
use crate::odb::ObjectStore;
use crate::time::Timestamp;
use crate::tree::{self, TreeEntry};
use std::fmt::Write as _;

/// author/committer identity as recorded in a commit, `"Name <email>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// a parsed commit payload (§3)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPayload {
    pub tree: Oid,
    pub parents: Vec<Oid>,
    pub author: String,
    pub committer: String,
    pub message: String,
}

impl CommitPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = String::new();
        let _ = writeln!(out, "tree {}", self.tree);
        for parent in &self.parents {
            let _ = writeln!(out, "parent {}", parent);
        }
        let _ = writeln!(out, "author {}", self.author);
        let _ = writeln!(out, "committer {}", self.committer);
        out.push('\n');
        out.push_str(&self.message);
        if !self.message.ends_with('\n') {
            out.push('\n');
        }
        out.into_bytes()
    }

    pub fn decode(payload: &[u8]) -> GritResult<Self> {
        let text = std::str::from_utf8(payload).map_err(|e| anyhow!(e))?;
        let (header, message) =
            text.split_once("\n\n").ok_or_else(|| anyhow!("commit has no header/message separator"))?;

        let mut tree = None;
        let mut parents = vec![];
        let mut author = None;
        let mut committer = None;
        for line in header.lines() {
            if let Some(rest) = line.strip_prefix("tree ") {
                tree = Some(rest.parse()?);
            } else if let Some(rest) = line.strip_prefix("parent ") {
                parents.push(rest.parse()?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                author = Some(rest.to_owned());
            } else if let Some(rest) = line.strip_prefix("committer ") {
                committer = Some(rest.to_owned());
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| anyhow!("commit missing `tree` line"))?,
            parents,
            author: author.ok_or_else(|| anyhow!("commit missing `author` line"))?,
            committer: committer.ok_or_else(|| anyhow!("commit missing `committer` line"))?,
            message: message.to_owned(),
        })
    }
}

/// `write_tree`: flattens the index into a tree object. The index is
/// restricted to a flat top-level layout, so any entry whose path
/// contains `/` is rejected.
pub fn write_tree(odb: &ObjectStore, entries: &[IndexEntry]) -> GritResult<Oid> {
    let mut tree_entries = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.path.contains('/') {
            return Err(GritError::NestedTreeUnsupported(entry.path.clone()));
        }
        tree_entries.push(TreeEntry {
            mode: FileMode::new(entry.mode)?,
            path: entry.path.clone(),
            oid: entry.oid,
        });
    }
    let payload = tree::encode(&tree_entries)?;
    odb.hash_object(&payload, ObjKind::Tree, true)
}

/// `commit`: builds the commit payload, persists it, and returns its
/// identity. Does not touch refs; the caller advances the branch tip.
#[allow(clippy::too_many_arguments)]
pub fn commit(
    odb: &ObjectStore,
    tree: Oid,
    parent: Option<Oid>,
    author: &Identity,
    now: Timestamp,
    message: &str,
) -> GritResult<Oid> {
    let signature = format!("{} {}", author, now);
    let payload = CommitPayload {
        tree,
        parents: parent.into_iter().collect(),
        author: signature.clone(),
        committer: signature,
        message: message.to_owned(),
    };
    odb.hash_object(&payload.encode(), ObjKind::Commit, true)
}
