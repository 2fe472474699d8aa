//! # Compression Codec
//!
//! The single deflate-family codec shared by the builder and the mounted view.
//!
//! Payloads are plain zlib streams: a two byte header that records the window
//! size (CINFO) and a level class (FLEVEL), the raw deflate body, and an
//! Adler-32 trailer. Any standard zlib decoder can read them. The zlib backend
//! of `flate2` is used because it honours small windows; a decoder on a small
//! device only has to reserve `2^window_bits` bytes of history.

use flate2::{Compress, Compression, FlushCompress, Status};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};

use crate::{FrozenError, Result};

pub const MIN_WINDOW_BITS: u8 = 9;
pub const MAX_WINDOW_BITS: u8 = 14;
pub const MAX_LEVEL: u32 = 9;
/// Upper bound of deflate's expansion: one stored byte never yields more
/// than this many output bytes.
pub const MAX_INFLATE_RATIO: u64 = 1032;

/// Parameters a payload was compressed with.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecParams {
    /// Deflate level, 0 (store) to 9 (best).
    pub level: u32,
    /// Window of `2^window_bits` bytes, 9 to 14.
    pub window_bits: u8,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self { level: 9, window_bits: 10 }
    }
}

impl CodecParams {
    pub fn new(level: u32, window_bits: u8) -> Result<Self> {
        let params = Self { level, window_bits };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.level > MAX_LEVEL {
            return Err(FrozenError::InvalidArgument(format!(
                "compression level must be between 0 and {MAX_LEVEL}, got {}",
                self.level
            )));
        }
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&self.window_bits) {
            return Err(FrozenError::InvalidArgument(format!(
                "window bits must be between {MIN_WINDOW_BITS} and {MAX_WINDOW_BITS}, got {}",
                self.window_bits
            )));
        }
        Ok(())
    }
}

/// Compresses `data` into a zlib stream with the given parameters.
pub fn compress(data: &[u8], params: CodecParams) -> Result<Vec<u8>> {
    params.validate()?;
    let mut encoder = Compress::new_with_window_bits(Compression::new(params.level), true, params.window_bits);
    let mut out = Vec::with_capacity(data.len() / 2 + 64);
    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity().max(64));
        }
        let consumed = encoder.total_in() as usize;
        let status = encoder
            .compress_vec(&data[consumed..], &mut out, FlushCompress::Finish)
            .map_err(|e| FrozenError::Codec(e.to_string()))?;
        if status == Status::StreamEnd {
            break;
        }
    }
    Ok(out)
}

/// Header fields of a zlib stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub window_bits: u8,
    /// FLEVEL: 0 fastest, 1 fast, 2 default, 3 maximum.
    pub level_class: u8,
}

/// Parses and checks the two byte zlib header.
pub fn read_header(stream: &[u8]) -> Result<StreamHeader> {
    let (cmf, flg) = match stream {
        [cmf, flg, ..] => (*cmf, *flg),
        _ => return Err(FrozenError::Codec("stream shorter than zlib header".into())),
    };
    if cmf & 0x0f != 8 {
        return Err(FrozenError::Codec(format!("unsupported compression method {}", cmf & 0x0f)));
    }
    if (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
        return Err(FrozenError::Codec("zlib header checksum mismatch".into()));
    }
    if flg & 0x20 != 0 {
        return Err(FrozenError::Codec("preset dictionaries are not supported".into()));
    }
    Ok(StreamHeader { window_bits: (cmf >> 4) + 8, level_class: flg >> 6 })
}

/// Streaming decoder: pulls compressed bytes from `R` and yields inflated
/// bytes in whatever chunk size the caller asks for.
pub struct Inflater<R: Read> {
    inner: flate2::read::ZlibDecoder<R>,
    produced: u64,
}

impl<R: Read> Inflater<R> {
    pub fn new(source: R) -> Self {
        Self { inner: flate2::read::ZlibDecoder::new(source), produced: 0 }
    }

    /// Inflated bytes handed out so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl<R: Read> Read for Inflater<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                io::Error::from(FrozenError::Codec(e.to_string()))
            }
            _ => e,
        })?;
        self.produced += n as u64;
        Ok(n)
    }
}

/// Largest original size `stored_len` compressed bytes can stand for.
pub fn max_inflated_size(stored_len: u64) -> u64 {
    stored_len.saturating_mul(MAX_INFLATE_RATIO)
}

/// Inflates a whole payload that must come out as exactly `expected` bytes.
pub fn inflate_all(stream: &[u8], expected: u64) -> Result<Vec<u8>> {
    let presize = expected.min(max_inflated_size(stream.len() as u64));
    let mut out = Vec::with_capacity(usize::try_from(presize).unwrap_or(0));
    Inflater::new(stream).take(expected.saturating_add(1)).read_to_end(&mut out)?;
    if out.len() as u64 != expected {
        return Err(FrozenError::Codec(format!(
            "stream inflated to {}{} bytes, entry records {expected}",
            out.len(),
            if out.len() as u64 > expected { "+" } else { "" }
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text() -> Vec<u8> {
        "the quick brown fox jumps over the lazy dog\n".repeat(200).into_bytes()
    }

    #[test]
    fn compress_inflate_restores_bytes() {
        let data = sample_text();
        for wbits in MIN_WINDOW_BITS..=MAX_WINDOW_BITS {
            let packed = compress(&data, CodecParams::new(9, wbits).unwrap()).unwrap();
            assert!(packed.len() < data.len());
            assert_eq!(inflate_all(&packed, data.len() as u64).unwrap(), data);
        }
    }

    #[test]
    fn header_records_window_and_level() {
        let packed = compress(&sample_text(), CodecParams::new(9, 10).unwrap()).unwrap();
        let header = read_header(&packed).unwrap();
        assert_eq!(header.window_bits, 10);
        assert_eq!(header.level_class, 3);

        let fast = compress(b"abcabcabc", CodecParams::new(1, 12).unwrap()).unwrap();
        let header = read_header(&fast).unwrap();
        assert_eq!(header.window_bits, 12);
        assert_eq!(header.level_class, 0);
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        assert!(CodecParams::new(10, 10).is_err());
        assert!(CodecParams::new(9, 8).is_err());
        assert!(CodecParams::new(9, 15).is_err());
        assert!(compress(b"x", CodecParams { level: 3, window_bits: 20 }).is_err());
    }

    #[test]
    fn inflater_streams_in_small_chunks() {
        let data = sample_text();
        let packed = compress(&data, CodecParams::default()).unwrap();
        let mut inflater = Inflater::new(&packed[..]);
        let mut buf = [0u8; 7];
        let mut out = Vec::new();
        loop {
            let n = inflater.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data);
        assert_eq!(inflater.produced(), data.len() as u64);
    }

    #[test]
    fn corrupt_stream_is_a_codec_error() {
        let mut packed = compress(&sample_text(), CodecParams::default()).unwrap();
        let last = packed.len() - 1;
        packed[last] ^= 0xff;
        assert!(matches!(inflate_all(&packed, sample_text().len() as u64), Err(FrozenError::Codec(_))));
    }

    #[test]
    fn recorded_size_must_match() {
        let data = sample_text();
        let packed = compress(&data, CodecParams::default()).unwrap();
        let len = data.len() as u64;
        assert!(matches!(inflate_all(&packed, len - 1), Err(FrozenError::Codec(_))));
        assert!(matches!(inflate_all(&packed, len + 1), Err(FrozenError::Codec(_))));
        assert!(matches!(inflate_all(&packed, u64::MAX), Err(FrozenError::Codec(_))));
        assert_eq!(max_inflated_size(u64::MAX), u64::MAX);
    }

    #[test]
    fn bad_header_is_rejected() {
        assert!(read_header(&[0x78]).is_err());
        assert!(read_header(&[0x78, 0x00]).is_err());
    }
}
