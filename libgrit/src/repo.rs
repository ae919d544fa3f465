use crate::commit::{self, Identity};
use crate::config;
use crate::error::{GritError, GritResult};
use crate::hash::Oid;
use crate::index::{self, IndexEntry};
use crate::obj::ObjKind;
use crate::odb::ObjectStore;
use crate::time::{Clock, SystemClock};
use crate::transport::{self, PushReport};
use crate::tree;
use std::fs;
use std::path::{Path, PathBuf};

pub const HEAD_FILE_PATH: &str = "HEAD";
pub const OBJECTS_DIR_PATH: &str = "objects";
pub const REFS_HEADS_DIR_PATH: &str = "refs/heads";

/// the one branch name this core ever writes.
pub const BRANCH: &str = "main";

/// a repository rooted at `root`, with `.git` laid out per §3.
pub struct Repository {
    root: PathBuf,
    git_dir: PathBuf,
    odb: ObjectStore,
}

impl Repository {
    /// opens a repository whose working directory is `root`, without
    /// touching the filesystem beyond path construction.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let git_dir = root.join(".git");
        let odb = ObjectStore::new(git_dir.join(OBJECTS_DIR_PATH));
        Self { root, git_dir, odb }
    }

    /// `init`: creates `.git`, `objects`, `refs/heads`, and `HEAD`
    /// pointing at `refs/heads/main`. Fails if `root` already exists (§6).
    pub fn init(root: impl Into<PathBuf>) -> GritResult<Self> {
        let root = root.into();
        if root.exists() {
            return Err(anyhow!("directory `{}` already exists", root.display()).into());
        }
        let repo = Self::open(&root);
        fs::create_dir_all(&root)?;
        fs::create_dir_all(repo.git_dir.join(OBJECTS_DIR_PATH))?;
        fs::create_dir_all(repo.git_dir.join(REFS_HEADS_DIR_PATH))?;
        // no trailing newline: matches the reference implementation's HEAD file exactly
        fs::write(repo.git_dir.join(HEAD_FILE_PATH), format!("ref: refs/heads/{}", BRANCH))?;
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn odb(&self) -> &ObjectStore {
        &self.odb
    }

    fn index_path(&self) -> PathBuf {
        index::index_path(&self.git_dir)
    }

    fn branch_ref_path(&self) -> PathBuf {
        self.git_dir.join(REFS_HEADS_DIR_PATH).join(BRANCH)
    }

    /// the current tip of `refs/heads/main`, or `None` before the first
    /// commit (§3, §4.C).
    pub fn branch_tip(&self) -> GritResult<Option<Oid>> {
        match fs::read_to_string(self.branch_ref_path()) {
            Ok(contents) => Ok(Some(contents.trim().parse()?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_branch_tip(&self, oid: Oid) -> GritResult<()> {
        crate::lockfile::write_atomic(&self.branch_ref_path(), format!("{}\n", oid).as_bytes())?;
        Ok(())
    }

    pub fn read_index(&self) -> GritResult<Vec<IndexEntry>> {
        index::read_index(&self.index_path())
    }

    /// `add`: stages `paths` into the index (§4.B).
    pub fn add(&self, paths: &[String]) -> GritResult<()> {
        index::add(&self.odb, &self.root, &self.index_path(), paths)
    }

    pub fn ls_files(&self, detailed: bool) -> GritResult<Vec<String>> {
        Ok(index::ls_files(&self.read_index()?, detailed))
    }

    pub fn status(&self) -> GritResult<crate::status::Status> {
        crate::status::status(&self.odb, &self.root, &self.read_index()?)
    }

    pub fn diff(&self) -> GritResult<String> {
        let entries = self.read_index()?;
        let status = self.status()?;
        crate::diff::diff(&self.odb, &self.root, &entries, &status.changed)
    }

    /// `hash_object`: hashes `payload` as `kind`, persisting it if `write`
    /// is set, and returns its identity (§4.A).
    pub fn hash_object(&self, payload: &[u8], kind: ObjKind, write: bool) -> GritResult<Oid> {
        self.odb.hash_object(payload, kind, write)
    }

    /// `cat`: renders an object per mode (§4.A). Raw-payload modes return
    /// the object's bytes untouched; `size`/`type`/tree-`pretty` render
    /// text derived from it.
    pub fn cat(&self, mode: &str, prefix: &str) -> GritResult<Vec<u8>> {
        let oid = self.odb.resolve_prefix(prefix)?;
        let (kind, payload) = self.odb.read_object_by_oid(oid)?;
        match mode {
            "size" => Ok(format!("{}\n", payload.len()).into_bytes()),
            "type" => Ok(format!("{}\n", kind).into_bytes()),
            "blob" | "tree" | "commit" => {
                let expected: ObjKind = mode.parse()?;
                if kind != expected {
                    return Err(GritError::KindMismatch { oid, expected, actual: kind });
                }
                Ok(payload)
            }
            "pretty" => pretty_print(kind, &payload),
            _ => Err(anyhow!("unknown cat-file mode `{}`", mode).into()),
        }
    }

    /// `commit`: flattens the index to a tree, builds a commit payload on
    /// top of the current branch tip, persists it, advances the branch,
    /// and returns the new identity (§4.C).
    pub fn commit(&self, message: &str, author: Option<Identity>) -> GritResult<Oid> {
        self.commit_at(message, author, &SystemClock)
    }

    pub fn commit_at(&self, message: &str, author: Option<Identity>, clock: &dyn Clock) -> GritResult<Oid> {
        let entries = self.read_index()?;
        let tree = commit::write_tree(&self.odb, &entries)?;
        let parent = self.branch_tip()?;
        let author = match author {
            Some(identity) => identity,
            None => config::author_identity()?,
        };
        let now = clock.now();
        let oid = commit::commit(&self.odb, tree, parent, &author, now, message)?;
        self.write_branch_tip(oid)?;
        Ok(oid)
    }

    /// `push`: the smart-HTTP receive-pack exchange for the local branch
    /// tip (§4.E). Fails with *not-found* if there is nothing to push.
    pub fn push(&self, url: &str, username: &str, password: &str) -> GritResult<PushReport> {
        let local_tip = self.branch_tip()?.ok_or_else(|| GritError::NotFound(BRANCH.to_owned()))?;
        transport::push(&self.odb, url, BRANCH, local_tip, username, password)
    }
}

/// `pretty`: raw payload for blob/commit; one `<mode> <kind>
/// <oid>\t<path>` line per entry for a tree (§4.A).
fn pretty_print(kind: ObjKind, payload: &[u8]) -> GritResult<Vec<u8>> {
    match kind {
        ObjKind::Blob | ObjKind::Commit => Ok(payload.to_vec()),
        ObjKind::Tree => {
            let mut out = String::new();
            for entry in tree::decode(payload)? {
                let kind_name = entry.mode.infer_obj_kind();
                out.push_str(&format!(
                    "{:06o} {} {}\t{}\n",
                    entry.mode.as_u32(),
                    kind_name,
                    entry.oid,
                    entry.path
                ));
            }
            Ok(out.into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Timestamp;
    use tempfile::tempdir;

    fn fixed_clock() -> crate::time::FixedClock {
        crate::time::FixedClock(Timestamp { seconds: 1700000000, offset_minutes: 0 })
    }

    #[test]
    fn init_creates_expected_layout() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("repo");
        let repo = Repository::init(&target).unwrap();
        assert!(repo.git_dir.join("objects").is_dir());
        assert!(repo.git_dir.join("refs/heads").is_dir());
        let head = fs::read_to_string(repo.git_dir.join("HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/main");
    }

    #[test]
    fn init_fails_if_directory_exists() {
        let dir = tempdir().unwrap();
        assert!(Repository::init(dir.path()).is_err());
    }

    #[test]
    fn add_then_commit_produces_expected_blob_and_tree() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("repo");
        let repo = Repository::init(&target).unwrap();
        fs::write(target.join("a.txt"), b"hello\n").unwrap();
        repo.add(&["a.txt".to_owned()]).unwrap();

        let entries = repo.read_index().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].oid.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");

        let author = Identity { name: "A".into(), email: "a@x".into() };
        let oid = repo.commit_at("init", Some(author), &fixed_clock()).unwrap();
        assert_eq!(repo.branch_tip().unwrap(), Some(oid));
    }

    #[test]
    fn second_commit_with_unchanged_index_still_succeeds() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("repo");
        let repo = Repository::init(&target).unwrap();
        fs::write(target.join("a.txt"), b"hello\n").unwrap();
        repo.add(&["a.txt".to_owned()]).unwrap();
        let author = Identity { name: "A".into(), email: "a@x".into() };
        let first = repo.commit_at("one", Some(author.clone()), &fixed_clock()).unwrap();
        let second = repo.commit_at("two", Some(author), &fixed_clock()).unwrap();
        assert_ne!(first, second);

        let (_, payload) = repo.odb().read_object_by_oid(second).unwrap();
        let decoded = commit::CommitPayload::decode(&payload).unwrap();
        assert_eq!(decoded.parents, vec![first]);
    }

    #[test]
    fn cat_file_type_and_size() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("repo");
        let repo = Repository::init(&target).unwrap();
        let oid = repo.hash_object(b"hello\n", ObjKind::Blob, true).unwrap();
        assert_eq!(repo.cat("type", &oid.to_hex()).unwrap(), b"blob\n");
        assert_eq!(repo.cat("size", &oid.to_hex()).unwrap(), b"6\n");
        assert_eq!(repo.cat("blob", &oid.to_hex()).unwrap(), b"hello\n");
    }

    #[test]
    fn cat_file_kind_mismatch() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("repo");
        let repo = Repository::init(&target).unwrap();
        let oid = repo.hash_object(b"hello\n", ObjKind::Blob, true).unwrap();
        assert!(matches!(repo.cat("tree", &oid.to_hex()), Err(GritError::KindMismatch { .. })));
    }

    #[test]
    fn push_without_prior_commit_is_not_found() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("repo");
        let repo = Repository::init(&target).unwrap();
        assert!(matches!(
            repo.push("http://example.invalid", "u", "p"),
            Err(GritError::NotFound(..))
        ));
    }
}
