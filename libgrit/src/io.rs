use crate::error::{GritError, GritResult};
use crate::hash::Oid;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::str::FromStr;

/// big-endian binary reads, used by the index and pack codecs
pub trait ReadExt: Read {
    #[inline]
    fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    #[inline]
    fn read_u16(&mut self) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    #[inline]
    fn read_u32(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    #[inline]
    fn read_oid(&mut self) -> io::Result<Oid> {
        let mut buf = [0u8; 20];
        self.read_exact(&mut buf)?;
        Ok(Oid::new(buf))
    }

    #[inline]
    fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = vec![];
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read + ?Sized> ReadExt for R {
}

/// helpers for the textual/NUL-delimited fragments inside object and
/// protocol payloads
pub trait BufReadExt: BufRead {
    /// reads bytes up to (and consuming) `sep`, parsing the preceding bytes
    /// as a base-10 ASCII number
    fn read_ascii_num(&mut self, sep: u8) -> GritResult<i64> {
        let mut buf = vec![];
        let n = self.read_until(sep, &mut buf)?;
        let digits = std::str::from_utf8(&buf[..n - 1]).map_err(|e| anyhow!(e))?;
        digits.parse().map_err(|e| anyhow!("invalid ascii number `{}`: {}", digits, e).into())
    }

    /// reads bytes up to (and consuming) `sep`, parsing the preceding bytes
    /// with `T::from_str`
    fn read_ascii_str<T: FromStr<Err = GritError>>(&mut self, sep: u8) -> GritResult<T> {
        let mut buf = vec![];
        let n = self.read_until(sep, &mut buf)?;
        let s = std::str::from_utf8(&buf[..n - 1]).map_err(|e| anyhow!(e))?;
        s.parse()
    }

    /// reads bytes up to (and consuming) the next NUL byte, returning the
    /// bytes preceding it
    fn read_until_nul(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = vec![];
        let n = self.read_until(0, &mut buf)?;
        buf.truncate(n.saturating_sub(1));
        Ok(buf)
    }

    fn is_at_eof(&mut self) -> io::Result<bool> {
        Ok(self.fill_buf()?.is_empty())
    }

    fn decode_zlib(&mut self) -> BufReader<flate2::bufread::ZlibDecoder<&mut Self>>
    where
        Self: Sized,
    {
        BufReader::new(flate2::bufread::ZlibDecoder::new(self))
    }
}

impl<R: BufRead + ?Sized> BufReadExt for R {
}

pub trait WriteExt: Write {
    fn write_u8(&mut self, u: u8) -> io::Result<()> {
        self.write_all(&[u])
    }

    fn write_u16(&mut self, u: u16) -> io::Result<()> {
        self.write_all(&u.to_be_bytes())
    }

    fn write_u32(&mut self, u: u32) -> io::Result<()> {
        self.write_all(&u.to_be_bytes())
    }

    fn write_oid(&mut self, oid: Oid) -> io::Result<()> {
        self.write_all(oid.as_bytes())
    }
}

impl<W: Write + ?Sized> WriteExt for W {
}

/// deflate-compresses `payload` with the default compression level, per
/// §4.A ("compression is deflate with default level")
pub fn zlib_compress(payload: &[u8]) -> io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    encoder.finish()
}

/// inflates a full zlib stream; the read path tolerates any valid deflate
/// stream regardless of which implementation produced it
pub fn zlib_decompress(frame: &[u8]) -> io::Result<Vec<u8>> {
    use flate2::bufread::ZlibDecoder;
    let mut decoder = ZlibDecoder::new(frame);
    let mut out = vec![];
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
