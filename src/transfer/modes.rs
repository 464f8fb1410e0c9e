//! FTP transfer types
//!
//! Binary and ASCII representation types, plus the line-ending translation
//! ASCII transfers need on the wire.

use std::fmt;

/// Representation type negotiated with `TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferType {
    #[default]
    Binary,
    Ascii,
}

impl TransferType {
    /// Type code used by `TYPE` and by the `;type=` URL suffix
    pub fn code(self) -> char {
        match self {
            TransferType::Binary => 'I',
            TransferType::Ascii => 'A',
        }
    }

    /// Parses a `;type=` URL suffix value
    pub fn from_url_code(code: &str) -> Option<TransferType> {
        match code {
            "i" | "I" => Some(TransferType::Binary),
            "a" | "A" => Some(TransferType::Ascii),
            _ => None,
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Binary => write!(f, "binary"),
            TransferType::Ascii => write!(f, "ascii"),
        }
    }
}

/// Converts local line endings to the CRLF form ASCII transfers send.
///
/// A CR at the end of one chunk is remembered so a LF opening the next
/// chunk is not doubled.
#[derive(Debug, Default)]
pub struct AsciiEncoder {
    last_was_cr: bool,
}

impl AsciiEncoder {
    pub fn encode(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
        out.clear();
        for &b in chunk {
            if b == b'\n' && !self.last_was_cr {
                out.push(b'\r');
            }
            out.push(b);
            self.last_was_cr = b == b'\r';
        }
    }
}

/// Converts CRLF received in ASCII transfers back to LF.
///
/// A CR ending one chunk is held back until the next chunk shows whether
/// it starts a line ending; [`finish`](Self::finish) releases it at EOF.
#[derive(Debug, Default)]
pub struct AsciiDecoder {
    pending_cr: bool,
}

impl AsciiDecoder {
    pub fn decode(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
        out.clear();
        for &b in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if b != b'\n' {
                    out.push(b'\r');
                }
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
    }

    pub fn finish(&mut self, out: &mut Vec<u8>) {
        out.clear();
        if self.pending_cr {
            self.pending_cr = false;
            out.push(b'\r');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_codes() {
        assert_eq!(TransferType::from_url_code("i"), Some(TransferType::Binary));
        assert_eq!(TransferType::from_url_code("A"), Some(TransferType::Ascii));
        assert_eq!(TransferType::from_url_code("d"), None);
        assert_eq!(TransferType::default(), TransferType::Binary);
    }

    #[test]
    fn encoder_adds_cr_once_across_chunks() {
        let mut encoder = AsciiEncoder::default();
        let mut out = Vec::new();

        encoder.encode(b"one\ntwo\r", &mut out);
        assert_eq!(out, b"one\r\ntwo\r");
        encoder.encode(b"\nthree\n", &mut out);
        assert_eq!(out, b"\nthree\r\n");
    }

    #[test]
    fn decoder_strips_cr_split_across_chunks() {
        let mut decoder = AsciiDecoder::default();
        let mut out = Vec::new();

        decoder.decode(b"one\r\ntwo\r", &mut out);
        assert_eq!(out, b"one\ntwo");
        decoder.decode(b"\nlone\rcr", &mut out);
        assert_eq!(out, b"\nlone\rcr");
        decoder.decode(b"end\r", &mut out);
        assert_eq!(out, b"end");
        decoder.finish(&mut out);
        assert_eq!(out, b"\r");
    }
}
