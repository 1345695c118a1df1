use std::str::Utf8Error;

/// Whether a store holds text or raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Binary,
}

/// A single record held by a line store
///
/// Implemented for `String` (text mode, UTF-8) and `Vec<u8>` (binary mode).
/// A record must not contain the `\n` terminator.
pub trait Line: Sized {
    const MODE: Mode;

    fn from_bytes(raw: &[u8]) -> Result<Self, Utf8Error>;

    fn as_bytes(&self) -> &[u8];
}

impl Line for String {
    const MODE: Mode = Mode::Text;

    fn from_bytes(raw: &[u8]) -> Result<Self, Utf8Error> {
        std::str::from_utf8(raw).map(str::to_owned)
    }

    fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }
}

impl Line for Vec<u8> {
    const MODE: Mode = Mode::Binary;

    fn from_bytes(raw: &[u8]) -> Result<Self, Utf8Error> {
        Ok(raw.to_vec())
    }

    fn as_bytes(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Split file content into records, dropping one terminator per record
///
/// A trailing `\n` does not produce an empty final record.
pub fn split(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = if content.is_empty() {
        None
    } else {
        Some(content.strip_suffix(b"\n").unwrap_or(content))
    };
    body.into_iter().flat_map(|b| b.split(|byte| *byte == b'\n'))
}

/// Join records with `\n`, without a trailing terminator
///
/// A trailing empty record is lost when the result is read back with
/// [`split`]: `["a", ""]` joins to `a\n`, which splits to `["a"]`, and a lone
/// `[""]` joins to an empty file, which reads as no records.
pub fn join<L: Line>(lines: &[L]) -> Vec<u8> {
    let total = lines.iter().map(|l| l.as_bytes().len() + 1).sum::<usize>();
    let mut buf = Vec::with_capacity(total);
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            buf.push(b'\n');
        }
        buf.extend_from_slice(line.as_bytes());
    }
    buf
}
