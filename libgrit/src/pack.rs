use crate::error::{GritError, GritResult};
use crate::hash::{self, Oid};
use crate::io::{zlib_compress, WriteExt};
use crate::odb::ObjectStore;
use std::collections::BTreeSet;
use std::io::Write;

const PACK_MAGIC: &[u8; 4] = b"PACK";
const PACK_VERSION: u32 = 2;

/// encodes a pack object header: the first byte packs the 3-bit kind in
/// bits 6:4 and the low 4 bits of size in bits 3:0; the remaining size is
/// split 7 bits per subsequent byte, little-endian, MSB=1 on every byte but
/// the last (§4.D).
fn encode_obj_header(kind_code: u8, size: u64) -> Vec<u8> {
    let mut out = vec![];
    let mut byte = (kind_code << 4) | (size & 0xf) as u8;
    let mut size = size >> 4;
    while size != 0 {
        out.push(byte | 0x80);
        byte = (size & 0x7f) as u8;
        size >>= 7;
    }
    out.push(byte);
    out
}

/// `create_pack`: emits objects in ascending identity order, each as a
/// variable-length type+size header followed by its zlib-compressed
/// payload, trailed by a SHA-1 of the whole pack body.
pub fn create_pack(
    odb: &ObjectStore,
    identities: impl IntoIterator<Item = Oid>,
) -> GritResult<Vec<u8>> {
    let ordered: BTreeSet<Oid> = identities.into_iter().collect();

    let mut body = vec![];
    body.extend_from_slice(PACK_MAGIC);
    body.write_u32(PACK_VERSION)?;
    body.write_u32(ordered.len() as u32)?;

    for oid in &ordered {
        let (kind, payload) =
            odb.read_object_by_oid(*oid).map_err(|_| GritError::MissingObject(*oid))?;
        body.extend_from_slice(&encode_obj_header(kind.pack_type_code(), payload.len() as u64));
        body.extend_from_slice(&zlib_compress(&payload)?);
    }

    let trailer = hash::hash_bytes(&body);
    body.write_all(trailer.as_bytes())?;
    Ok(body)
}
