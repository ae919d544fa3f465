use crate::error::{GritError, GritResult};
use crate::hash::{self, Oid};
use crate::io::{zlib_compress, zlib_decompress};
use crate::obj::{read_header, ObjKind};
use std::fs;
use std::path::PathBuf;

/// the loose object store rooted at `.git/objects`: hash, compress,
/// decompress, read and write single objects by content address.
pub struct ObjectStore {
    objects_path: PathBuf,
}

impl ObjectStore {
    pub fn new(objects_path: impl Into<PathBuf>) -> Self {
        Self { objects_path: objects_path.into() }
    }

    fn loose_path(&self, oid: Oid) -> PathBuf {
        let (dir, file) = oid.split();
        self.objects_path.join(dir).join(file)
    }

    /// builds the framed byte sequence, hashes it, and (if `persist`)
    /// writes the zlib-compressed frame. Writing is idempotent: an
    /// existing file at the target path is left untouched.
    pub fn hash_object(&self, payload: &[u8], kind: ObjKind, persist: bool) -> GritResult<Oid> {
        let frame = hash::frame(kind.as_str(), payload);
        let oid = hash::hash_bytes(&frame);
        if persist {
            let path = self.loose_path(oid);
            if !path.exists() {
                trace!("odb: writing new object {} ({})", oid, kind);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let compressed = zlib_compress(&frame)?;
                crate::lockfile::write_atomic(&path, &compressed)?;
            }
        }
        Ok(oid)
    }

    /// resolves a hex prefix (minimum two characters) to the unique loose
    /// object whose identity it names.
    pub fn resolve_prefix(&self, prefix: &str) -> GritResult<Oid> {
        if prefix.len() == 40 {
            return prefix.parse();
        }
        if prefix.len() < 2 {
            return Err(anyhow!("object prefix `{}` must be at least 2 characters", prefix).into());
        }
        let (dir_prefix, file_prefix) = prefix.split_at(2);
        let dir = self.objects_path.join(dir_prefix);
        let mut candidates = vec![];
        if dir.is_dir() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let filename = entry.file_name();
                let filename = filename.to_string_lossy();
                if filename.starts_with(file_prefix) {
                    let hex = format!("{}{}", dir_prefix, filename);
                    candidates.push(hex.parse::<Oid>()?);
                }
            }
        }
        match candidates.len() {
            0 => Err(GritError::NotFound(prefix.to_owned())),
            1 => Ok(candidates[0]),
            _ => Err(GritError::AmbiguousPrefix { prefix: prefix.to_owned(), candidates }),
        }
    }

    /// resolves `identity_or_prefix`, decompresses the frame, and splits it
    /// into its declared kind and payload, asserting declared size equals
    /// the payload's actual length.
    pub fn read_object(&self, identity_or_prefix: &str) -> GritResult<(ObjKind, Vec<u8>)> {
        let oid = self.resolve_prefix(identity_or_prefix)?;
        self.read_object_by_oid(oid)
    }

    pub fn read_object_by_oid(&self, oid: Oid) -> GritResult<(ObjKind, Vec<u8>)> {
        let path = self.loose_path(oid);
        let compressed = fs::read(&path).map_err(|_| GritError::NotFound(oid.to_string()))?;
        let frame = zlib_decompress(&compressed)
            .map_err(|e| GritError::CorruptObject { oid, reason: e.to_string() })?;
        let mut cursor = std::io::BufReader::new(frame.as_slice());
        let header = read_header(&mut cursor)
            .map_err(|e| GritError::CorruptObject { oid, reason: e.to_string() })?;
        let payload = frame[frame.len() - header.size as usize..].to_vec();
        if payload.len() as u64 != header.size {
            return Err(GritError::CorruptObject {
                oid,
                reason: format!(
                    "declared size {} does not match payload length {}",
                    header.size,
                    payload.len()
                ),
            });
        }
        Ok((header.kind, payload))
    }

    pub fn exists(&self, oid: Oid) -> bool {
        self.loose_path(oid).exists()
    }
}
