//! FTP Response handling
//!
//! Defines FTP reply codes, reply classes and the parsed reply type.

/// Reply codes the client acts on
pub const SERVICE_READY: u16 = 220;
pub const LOGIN_SUCCESS: u16 = 230;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const ACCOUNT_REQUIRED: u16 = 332;
pub const ENTERING_PASSIVE_MODE: u16 = 227;

/// Outcome family encoded by the first digit of a reply code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    Preliminary,
    Completion,
    Intermediate,
    TransientNegative,
    PermanentNegative,
}

impl ReplyClass {
    pub fn of(code: u16) -> Option<ReplyClass> {
        match code / 100 {
            1 => Some(ReplyClass::Preliminary),
            2 => Some(ReplyClass::Completion),
            3 => Some(ReplyClass::Intermediate),
            4 => Some(ReplyClass::TransientNegative),
            5 => Some(ReplyClass::PermanentNegative),
            _ => None,
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(
            self,
            ReplyClass::TransientNegative | ReplyClass::PermanentNegative
        )
    }
}

/// One logical server reply, possibly spanning several lines
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    code: u16,
    lines: Vec<String>,
}

impl Response {
    pub(crate) fn new(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    /// Reply text without codes; continuation lines are joined with `\n`.
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn class(&self) -> ReplyClass {
        // parser only accepts codes in 100..=599
        ReplyClass::of(self.code).unwrap_or(ReplyClass::PermanentNegative)
    }

    pub fn is_preliminary(&self) -> bool {
        self.class() == ReplyClass::Preliminary
    }

    pub fn is_completion(&self) -> bool {
        self.class() == ReplyClass::Completion
    }

    pub fn is_negative(&self) -> bool {
        self.class().is_negative()
    }
}
