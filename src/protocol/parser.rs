//! FTP reply parsing
//!
//! Splits raw reply lines into codes and text, assembles multi-line replies
//! and decodes the address tuple of a `227` reply.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::FtpError;
use crate::protocol::Response;

/// A single reply line split into its parts
#[derive(Debug, PartialEq)]
pub(crate) struct ReplyLine<'a> {
    pub code: u16,
    /// `ddd-` opens a multi-line reply, `ddd ` (or a bare code) ends one
    pub continued: bool,
    pub text: &'a str,
}

/// Parses the first line of a reply. The line must already be stripped of CRLF.
pub(crate) fn parse_reply_line(line: &str) -> Result<ReplyLine<'_>, FtpError> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(FtpError::Protocol(format!("malformed reply line: {line:?}")));
    }

    let code = bytes[..3]
        .iter()
        .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
    if !(100..600).contains(&code) {
        return Err(FtpError::Protocol(format!("invalid reply code {code}")));
    }

    match bytes.get(3) {
        None => Ok(ReplyLine {
            code,
            continued: false,
            text: "",
        }),
        Some(b' ') => Ok(ReplyLine {
            code,
            continued: false,
            text: &line[4..],
        }),
        Some(b'-') => Ok(ReplyLine {
            code,
            continued: true,
            text: &line[4..],
        }),
        Some(_) => Err(FtpError::Protocol(format!("malformed reply line: {line:?}"))),
    }
}

/// Collects the lines of a multi-line reply until the closing `ddd ` line.
pub(crate) struct MultiLineParser {
    code: u16,
    end_prefix: String,
    continued_prefix: String,
    lines: Vec<String>,
    max_lines: usize,
}

impl MultiLineParser {
    pub(crate) fn new(first: &ReplyLine<'_>, max_lines: usize) -> Self {
        Self {
            code: first.code,
            end_prefix: format!("{} ", first.code),
            continued_prefix: format!("{}-", first.code),
            lines: vec![first.text.to_string()],
            max_lines,
        }
    }

    /// Feeds one more line, returns `true` once the reply is complete.
    pub(crate) fn feed_line(&mut self, line: &str) -> Result<bool, FtpError> {
        if self.lines.len() >= self.max_lines {
            return Err(FtpError::Protocol(format!(
                "reply {} exceeds {} lines",
                self.code, self.max_lines
            )));
        }

        if let Some(text) = line.strip_prefix(&self.end_prefix) {
            self.lines.push(text.to_string());
            return Ok(true);
        }
        if line == &self.end_prefix[..3] {
            self.lines.push(String::new());
            return Ok(true);
        }

        // do not trim leading whitespace of free-form continuation lines
        let text = line.strip_prefix(&self.continued_prefix).unwrap_or(line);
        self.lines.push(text.to_string());
        Ok(false)
    }

    pub(crate) fn finish(self) -> Response {
        Response::new(self.code, self.lines)
    }
}

/// Decodes `h1,h2,h3,h4,p1,p2` from the text of a `227` reply.
///
/// The tuple is usually parenthesised but some servers omit the brackets,
/// so the first run of digits and commas is used when there is no `(`.
pub fn parse_pasv_reply(text: &str) -> Option<SocketAddrV4> {
    let tuple = match text.find('(') {
        Some(open) => {
            let rest = &text[open + 1..];
            &rest[..rest.find(')')?]
        }
        None => {
            let start = text.find(|c: char| c.is_ascii_digit())?;
            let rest = &text[start..];
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == ' '))
                .unwrap_or(rest.len());
            &rest[..end]
        }
    };

    let mut parts = [0u8; 6];
    let mut count = 0;
    for field in tuple.split(',') {
        if count == parts.len() {
            return None;
        }
        parts[count] = field.trim().parse().ok()?;
        count += 1;
    }
    if count != parts.len() {
        return None;
    }

    let ip = Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3]);
    let port = u16::from(parts[4]) * 256 + u16::from(parts[5]);
    Some(SocketAddrV4::new(ip, port))
}
