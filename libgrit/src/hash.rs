use crate::error::GritError;
use rustc_hex::{FromHex, ToHex};
use sha1::{Digest, Sha1};
use std::convert::TryInto;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

pub const OID_SIZE: usize = 20;

/// The identity of an object: 20-byte SHA-1 of the framed object
/// (`"<kind> <size>\0" ++ payload`), per §3.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Oid([u8; OID_SIZE]);

impl Oid {
    /// hash of a zero-byte blob
    // e69de29bb2d1d6434b8b29ae775ad8c2e48c5391
    pub const EMPTY_BLOB: Self = Self([
        0xe6, 0x9d, 0xe2, 0x9b, 0xb2, 0xd1, 0xd6, 0x43, 0x4b, 0x8b, 0x29, 0xae, 0x77, 0x5a, 0xd8,
        0xc2, 0xe4, 0x8c, 0x53, 0x91,
    ]);

    /// the value advertised by a remote with no commits on the branch
    pub const ZERO: Self = Self([0; OID_SIZE]);

    #[inline]
    pub fn new(bytes: [u8; OID_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; OID_SIZE] {
        &self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    pub fn to_hex(self) -> String {
        self.0.to_hex()
    }

    /// 7-character abbreviation, as printed by `commit`
    pub fn short(self) -> String {
        self.to_hex()[..7].to_owned()
    }

    /// splits into the loose-object directory name (first two hex chars)
    /// and the remaining 38-character filename
    pub fn split(self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_owned(), hex[2..].to_owned())
    }
}

#[cfg(test)]
impl<'a> From<&'a str> for Oid {
    fn from(s: &'a str) -> Self {
        Self::from_str(s).unwrap()
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Oid {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self((0..OID_SIZE).map(|_| u8::arbitrary(g)).collect::<Vec<_>>().try_into().unwrap())
    }
}

impl FromStr for Oid {
    type Err = GritError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end();
        if s.len() != 40 {
            return Err(anyhow!("invalid object id `{}` (expected 40 hex characters)", s).into());
        }
        let bytes: Vec<u8> = s.from_hex().map_err(|e| anyhow!("invalid object id: {}", e))?;
        Ok(Self(bytes.try_into().expect("checked length above")))
    }
}

impl AsRef<[u8]> for Oid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// raw SHA-1 over arbitrary bytes, used directly for the index and pack
/// trailers (which checksum framed bytes, not the object header format)
pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> Oid {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    Oid::new(hasher.finalize().into())
}

/// the framed byte sequence whose SHA-1 is an object's identity (§3)
pub fn frame(kind: &str, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(kind.len() + 1 + 20 + 1 + payload.len());
    buf.extend_from_slice(kind.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(payload.len().to_string().as_bytes());
    buf.push(0);
    buf.extend_from_slice(payload);
    buf
}

/// hashes `payload` as if framed with `kind`, without persisting anything
pub fn hash_object_bytes(kind: &str, payload: &[u8]) -> Oid {
    hash_bytes(frame(kind, payload))
}

#[cfg(test)]
mod tests {
    use super::Oid;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn oid_hex_roundtrip(oid: Oid) -> bool {
        oid.to_string().parse::<Oid>().unwrap() == oid
    }

    #[quickcheck]
    fn split_recombines_to_hex(oid: Oid) -> bool {
        let (dir, rest) = oid.split();
        format!("{}{}", dir, rest) == oid.to_hex()
    }
}
