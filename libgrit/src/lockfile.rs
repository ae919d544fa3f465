use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

const LOCK_EXT: &str = "lock";

/// writes `path` by first writing the full contents to `path.lock`, then
/// renaming it over `path`. Wholesale overwrite is acceptable for a
/// single-writer core; this still avoids leaving a half-written index or
/// ref behind if the process is killed mid-write, since a rename is the
/// atomic step.
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let lock_path = lock_path_for(path);
    {
        let mut lockfile = File::create(&lock_path)?;
        use std::io::Write;
        lockfile.write_all(contents)?;
        lockfile.sync_all()?;
    }
    fs::rename(&lock_path, path)
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(LOCK_EXT);
    path.with_file_name(name)
}
