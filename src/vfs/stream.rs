//! Read-only file streams handed out by [`FrozenFs::open`](super::FrozenFs).
//!
//! Binary streams read the stored bytes directly, inflating on the fly for
//! compressed entries. Text streams decode UTF-8 in bounded chunks through a
//! reusable scratch buffer and always leave the byte cursor at the start of a
//! complete character, so `tell`/`seek` stay meaningful between reads.

use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom};

use crate::common::{Blob, FileEntry};
use crate::compress::{self, Inflater};
use crate::{FrozenError, Result};

/// Default scratch buffer size for sized text reads.
pub const DEFAULT_DECODE_BUFFER: usize = 400;
/// Smaller buffer sizes are ignored.
pub const MIN_DECODE_BUFFER: usize = 16;

/// Transfer size used when skipping forward in an inflating stream.
const SKIP_CHUNK: usize = 256;

/// Bytes a text stream reads from: the stored blob, or the inflated body of
/// a compressed entry.
enum Payload {
    Stored(Blob),
    Inflated(Vec<u8>),
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        match self {
            Payload::Stored(blob) => blob.as_ref(),
            Payload::Inflated(bytes) => bytes,
        }
    }
}

fn seek_target(pos: u64, size: u64, target: SeekFrom) -> io::Result<u64> {
    let (base, offset) = match target {
        SeekFrom::Start(n) => return Ok(n),
        SeekFrom::Current(d) => (pos, d),
        SeekFrom::End(d) => (size, d),
    };
    base.checked_add_signed(offset)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek before start of file"))
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

enum BinaryInner {
    Plain(Cursor<Blob>),
    Inflating {
        stream: Blob,
        inflater: Inflater<Cursor<Blob>>,
        /// Logical position; may lie past the end after a seek.
        pos: u64,
    },
}

/// A file opened in binary mode (`rb`).
pub struct BinaryFile {
    inner: BinaryInner,
    size: u64,
}

impl BinaryFile {
    pub(crate) fn open(entry: &FileEntry) -> Self {
        let inner = if entry.compressed {
            BinaryInner::Inflating {
                inflater: Inflater::new(Cursor::new(entry.data.clone())),
                stream: entry.data.clone(),
                pos: 0,
            }
        } else {
            BinaryInner::Plain(Cursor::new(entry.data.clone()))
        };
        Self { inner, size: entry.size }
    }

    /// Original (uncompressed) size.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.inner, BinaryInner::Inflating { .. })
    }

    /// Reads up to `n` bytes; fewer only at the end of the file.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let got = read_up_to(self, &mut buf)?;
        buf.truncate(got);
        Ok(buf)
    }

    /// Reads everything from the cursor to the end.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut remaining = self.size.saturating_sub(self.tell());
        remaining = match &self.inner {
            BinaryInner::Plain(cursor) => remaining.min(cursor.get_ref().len() as u64),
            BinaryInner::Inflating { stream, .. } => remaining.min(compress::max_inflated_size(stream.len() as u64)),
        };
        let mut out = Vec::with_capacity(usize::try_from(remaining).unwrap_or(0));
        self.read_to_end(&mut out)?;
        Ok(out)
    }

    /// Fills as much of `buf` as the file allows and returns the count.
    pub fn readinto(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(read_up_to(self, buf)?)
    }

    /// Reads through the next `\n` (included), or to the end of the file.
    pub fn readline(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        if let BinaryInner::Plain(cursor) = &mut self.inner {
            cursor.read_until(b'\n', &mut line)?;
            return Ok(line);
        }
        let mut byte = [0u8; 1];
        while self.read(&mut byte)? == 1 {
            line.push(byte[0]);
            if byte[0] == b'\n' {
                break;
            }
        }
        Ok(line)
    }

    pub fn tell(&self) -> u64 {
        match &self.inner {
            BinaryInner::Plain(cursor) => cursor.position(),
            BinaryInner::Inflating { pos, .. } => *pos,
        }
    }

    /// Always fails: the archive is read-only.
    pub fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(FrozenError::PermissionDenied("file opened read-only".into()))
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Read for BinaryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            BinaryInner::Plain(cursor) => cursor.read(buf),
            BinaryInner::Inflating { inflater, pos, .. } => {
                if *pos != inflater.produced() {
                    // Parked past the end by a seek.
                    return Ok(0);
                }
                let n = inflater.read(buf)?;
                *pos += n as u64;
                Ok(n)
            }
        }
    }
}

impl Seek for BinaryFile {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        let size = self.size;
        match &mut self.inner {
            BinaryInner::Plain(cursor) => cursor.seek(target),
            BinaryInner::Inflating { stream, inflater, pos } => {
                let wanted = seek_target(*pos, size, target)?;
                let reachable = wanted.min(size);
                if reachable < inflater.produced() {
                    // Deflate can't run backwards: restart and skip forward.
                    *inflater = Inflater::new(Cursor::new(stream.clone()));
                }
                let mut skip = [0u8; SKIP_CHUNK];
                while inflater.produced() < reachable {
                    let want = (reachable - inflater.produced()).min(SKIP_CHUNK as u64) as usize;
                    if inflater.read(&mut skip[..want])? == 0 {
                        break;
                    }
                }
                *pos = wanted;
                Ok(wanted)
            }
        }
    }
}

/// A file opened in text mode (`r`, `rt`).
pub struct TextFile {
    source: Cursor<Payload>,
    /// Allocated on the first sized read.
    scratch: Option<Vec<u8>>,
    capacity: usize,
    utf8_width: u8,
}

impl TextFile {
    /// Compressed entries are inflated in full here; text decoding needs a
    /// seekable byte source.
    pub(crate) fn open(entry: &FileEntry, capacity: usize) -> Result<Self> {
        let payload = if entry.compressed {
            Payload::Inflated(compress::inflate_all(entry.data.as_ref(), entry.size)?)
        } else {
            Payload::Stored(entry.data.clone())
        };
        Ok(Self {
            source: Cursor::new(payload),
            scratch: None,
            capacity: capacity.max(MIN_DECODE_BUFFER),
            utf8_width: entry.utf8_width.clamp(1, 4),
        })
    }

    /// Overrides the scratch buffer size; values below the minimum are ignored.
    pub fn set_decode_buffer_size(&mut self, capacity: usize) {
        if capacity >= MIN_DECODE_BUFFER && capacity != self.capacity {
            self.capacity = capacity;
            self.scratch = None;
        }
    }

    pub fn decode_buffer_size(&self) -> usize {
        self.capacity
    }

    /// Reads up to `n` characters.
    ///
    /// Each pass fills the scratch buffer, counts whole characters from its
    /// start and decodes only those, then parks the cursor right after the
    /// last decoded byte. Repeats until `n` characters or end of data.
    pub fn read(&mut self, n: usize) -> Result<String> {
        if n == 0 {
            return Ok(String::new());
        }
        let capacity = self.capacity;
        let max_chars = (capacity / usize::from(self.utf8_width)).max(1);
        let scratch = self.scratch.get_or_insert_with(|| vec![0u8; capacity]);

        let mut result = String::new();
        let mut remainder = n;
        while remainder > 0 {
            let origin = self.source.position();
            let filled = read_up_to(&mut self.source, scratch)?;
            if filled == 0 {
                break;
            }
            let at_end = filled < scratch.len();
            let counted = count_chars(&scratch[..filled], remainder.min(max_chars), at_end)
                .and_then(|(used, chars)| {
                    let text = std::str::from_utf8(&scratch[..used]).map_err(|e| (e.valid_up_to(), e.to_string()))?;
                    Ok((used, chars, text))
                });
            let (used, chars, text) = match counted {
                Ok(ok) => ok,
                Err((at, reason)) => {
                    self.source.set_position(origin);
                    return Err(FrozenError::UnicodeDecode { offset: origin + at as u64, reason });
                }
            };
            result.push_str(text);
            self.source.set_position(origin + used as u64);
            remainder -= chars;
        }
        Ok(result)
    }

    /// Decodes everything from the cursor to the end in one pass.
    pub fn read_to_string(&mut self) -> Result<String> {
        let origin = self.source.position();
        let mut rest = Vec::new();
        self.source.read_to_end(&mut rest)?;
        self.decode_owned(rest, origin)
    }

    /// Next line including its `\n`; empty string at the end.
    pub fn readline(&mut self) -> Result<String> {
        let origin = self.source.position();
        let mut line = Vec::new();
        self.source.read_until(b'\n', &mut line)?;
        self.decode_owned(line, origin)
    }

    /// Iterates the remaining lines without consuming the stream.
    pub fn lines(&mut self) -> impl Iterator<Item = Result<String>> + '_ {
        self.by_ref()
    }

    pub fn readlines(&mut self) -> Result<Vec<String>> {
        self.lines().collect()
    }

    /// Raw bytes, no decoding.
    pub fn readinto(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(read_up_to(&mut self.source, buf)?)
    }

    pub fn seek(&mut self, target: SeekFrom) -> Result<u64> {
        Ok(self.source.seek(target)?)
    }

    /// Raw byte offset of the cursor.
    pub fn tell(&self) -> u64 {
        self.source.position()
    }

    pub fn write(&mut self, _text: &str) -> Result<usize> {
        Err(FrozenError::PermissionDenied("file opened read-only".into()))
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn decode_owned(&mut self, bytes: Vec<u8>, origin: u64) -> Result<String> {
        String::from_utf8(bytes).map_err(|e| {
            let at = e.utf8_error().valid_up_to();
            self.source.set_position(origin);
            FrozenError::UnicodeDecode { offset: origin + at as u64, reason: e.to_string() }
        })
    }
}

impl Iterator for TextFile {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.readline() {
            Ok(line) if line.is_empty() => None,
            other => Some(other),
        }
    }
}

/// Counts up to `cap` whole UTF-8 sequences from the start of `buf`.
///
/// Returns bytes spanned and characters found. A sequence cut off by the end
/// of a full buffer is left for the next pass; cut off at the end of the data
/// it is an error, as is any byte that can't start a sequence.
fn count_chars(buf: &[u8], cap: usize, at_end: bool) -> std::result::Result<(usize, usize), (usize, String)> {
    let mut pos = 0;
    let mut chars = 0;
    while chars < cap && pos < buf.len() {
        let lead = buf[pos];
        let width = match lead {
            0x00..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Err((pos, format!("invalid start byte 0x{lead:02x}"))),
        };
        if pos + width > buf.len() {
            if at_end {
                return Err((pos, "truncated sequence at end of data".into()));
            }
            break;
        }
        pos += width;
        chars += 1;
    }
    Ok((pos, chars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{freeze_file, BuildOptions};
    use crate::compress::CodecParams;

    fn text_entry(text: &str, compress: bool) -> FileEntry {
        let options = BuildOptions { compress, codec: CodecParams::default() };
        freeze_file(text.as_bytes().to_vec(), &options).unwrap()
    }

    fn sample() -> String {
        let alphabet: Vec<char> = "aáéíóúÁÉÍÓÚäëïöüñÑ😀😃😄\r\n\txyz €".chars().collect();
        (0..3000).map(|i| alphabet[(i * 7 + i / 3) % alphabet.len()]).collect()
    }

    #[test]
    fn counting_respects_cap_and_width() {
        let bytes = "aé€😀".as_bytes();
        assert_eq!(count_chars(bytes, 10, true).unwrap(), (10, 4));
        assert_eq!(count_chars(bytes, 2, true).unwrap(), (3, 2));
        assert_eq!(count_chars(&bytes[..5], 10, false).unwrap(), (3, 2));
        assert!(count_chars(&bytes[..5], 10, true).is_err());
        assert!(count_chars(&[b'a', 0x80], 10, true).is_err());
    }

    #[test]
    fn chunked_reads_match_full_read() {
        let text = sample();
        for compress in [false, true] {
            let entry = text_entry(&text, compress);
            for buffer in [16, 17, 400] {
                for k in [1, 3, 7, 100, 1000] {
                    let mut file = TextFile::open(&entry, buffer).unwrap();
                    let mut out = String::new();
                    loop {
                        let chunk = file.read(k).unwrap();
                        if chunk.is_empty() {
                            break;
                        }
                        assert!(chunk.chars().count() <= k);
                        out.push_str(&chunk);
                    }
                    assert_eq!(out, text, "buffer={buffer} k={k} compress={compress}");
                }
            }
        }
    }

    #[test]
    fn cursor_parks_on_character_boundary() {
        let text = sample();
        let entry = text_entry(&text, false);
        let mut file = TextFile::open(&entry, 16).unwrap();
        let mut consumed = String::new();
        for k in [1, 5, 2, 33, 9] {
            consumed.push_str(&file.read(k).unwrap());
            assert_eq!(file.tell() as usize, consumed.len());
            assert!(text.is_char_boundary(file.tell() as usize));
        }
        let rest = file.read_to_string().unwrap();
        consumed.push_str(&rest);
        assert_eq!(consumed, text);
    }

    #[test]
    fn zero_sized_read_is_empty() {
        let entry = text_entry("hello world", false);
        let mut file = TextFile::open(&entry, 400).unwrap();
        assert_eq!(file.read(0).unwrap(), "");
        assert_eq!(file.read(5).unwrap(), "hello");
        assert_eq!(file.read(0).unwrap(), "");
        assert_eq!(file.read(20).unwrap(), " world");
        assert_eq!(file.read(20).unwrap(), "");
    }

    #[test]
    fn binary_data_fails_as_text() {
        let bytes: Vec<u8> = (0..200u32).map(|i| (i * 37 % 251) as u8 | 0x80).collect();
        let entry = freeze_file(bytes, &BuildOptions::default()).unwrap();
        let mut file = TextFile::open(&entry, 400).unwrap();
        assert!(matches!(file.read(10), Err(FrozenError::UnicodeDecode { .. })));
        assert_eq!(file.tell(), 0);
        assert!(matches!(file.read_to_string(), Err(FrozenError::UnicodeDecode { .. })));
    }

    #[test]
    fn lines_iterate_and_match_readline() {
        let entry = text_entry("uno\ndós\n\ntrês", true);
        let file = TextFile::open(&entry, 400).unwrap();
        let lines: Vec<String> = file.map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["uno\n", "dós\n", "\n", "três"]);

        let mut file = TextFile::open(&entry, 400).unwrap();
        assert_eq!(file.lines().next().unwrap().unwrap(), "uno\n");
        assert_eq!(file.read(2).unwrap(), "dó");
        assert_eq!(file.readlines().unwrap(), vec!["s\n", "\n", "três"]);
        assert_eq!(file.readline().unwrap(), "");
    }

    #[test]
    fn small_buffer_requests_are_ignored() {
        let entry = text_entry("abc", false);
        let mut file = TextFile::open(&entry, 400).unwrap();
        file.set_decode_buffer_size(4);
        assert_eq!(file.decode_buffer_size(), 400);
        file.set_decode_buffer_size(64);
        assert_eq!(file.decode_buffer_size(), 64);
    }

    #[test]
    fn compressed_binary_seek_and_tell() {
        let data: Vec<u8> = (0..4000u32).map(|i| (i % 97) as u8).collect();
        let options = BuildOptions { compress: true, codec: CodecParams::default() };
        let entry = freeze_file(data.clone(), &options).unwrap();
        assert!(entry.compressed);

        let mut file = BinaryFile::open(&entry);
        for (target, expect) in [
            (SeekFrom::Start(1), 1u64),
            (SeekFrom::Start(2051), 2051),
            (SeekFrom::Current(-29), 2023),
            (SeekFrom::Start(2), 2),
            (SeekFrom::End(-33), 3967),
        ] {
            assert_eq!(file.seek(target).unwrap(), expect);
            assert_eq!(file.tell(), expect);
            assert_eq!(file.read_bytes(1).unwrap(), vec![data[expect as usize]]);
        }
        file.seek(SeekFrom::End(10)).unwrap();
        assert!(file.read_bytes(4).unwrap().is_empty());
        file.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(file.read_all().unwrap(), data);
    }

    #[test]
    fn binary_readline_and_write_refused() {
        for compress in [false, true] {
            let entry = text_entry(&"line one\nline two\n".repeat(20), compress);
            let mut file = BinaryFile::open(&entry);
            assert_eq!(file.readline().unwrap(), b"line one\n");
            assert_eq!(file.readline().unwrap(), b"line two\n");
            assert!(matches!(file.write(b"x"), Err(FrozenError::PermissionDenied(_))));
        }
    }

    #[test]
    fn oversized_record_does_not_overallocate() {
        let text = "x".repeat(4000);
        let mut entry = text_entry(&text, true);
        assert!(entry.compressed);
        entry.size = u64::MAX;
        assert_eq!(BinaryFile::open(&entry).read_all().unwrap(), text.as_bytes());
        assert!(matches!(TextFile::open(&entry, 400), Err(FrozenError::Codec(_))));

        let mut raw = text_entry("abc", false);
        raw.size = u64::MAX;
        assert_eq!(BinaryFile::open(&raw).read_all().unwrap(), b"abc");
    }
}
