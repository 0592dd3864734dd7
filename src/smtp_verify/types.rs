use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use super::classify::Signal;

/// Why a probe could not reach a verdict.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inconclusive {
    /// The domain has no MX host to probe.
    NoMailServer,
    /// The MX host matched the provider exclusion filter.
    SkippedHost,
    ConnectFailed,
    /// The handshake deadline elapsed first.
    TimedOut,
    /// The socket failed or closed mid-handshake.
    ConnectionLost,
    /// A reply carried no usable status.
    UnexpectedReply,
}

impl fmt::Display for Inconclusive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoMailServer => "no mail server",
            Self::SkippedHost => "host excluded from probing",
            Self::ConnectFailed => "connection failed",
            Self::TimedOut => "timed out",
            Self::ConnectionLost => "connection lost",
            Self::UnexpectedReply => "unexpected reply",
        })
    }
}

/// Terminal result of one mailbox probe. Exactly one is produced per probe.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOutcome {
    /// RCPT TO was accepted.
    Accepted,
    /// Permanent mailbox error.
    Rejected,
    NotExists,
    Spf,
    Greylist,
    Unknown(Inconclusive),
}

impl ProbeOutcome {
    /// Outcome for a terminal classifier signal; `None` for `Continue`.
    pub(crate) fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Continue => None,
            Signal::Rejected => Some(Self::Rejected),
            Signal::NotExists => Some(Self::NotExists),
            Signal::Spf => Some(Self::Spf),
            Signal::Greylist => Some(Self::Greylist),
            Signal::Inconclusive => Some(Self::Unknown(Inconclusive::UnexpectedReply)),
        }
    }

    /// `Some` only for the two boolean verdicts.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Accepted => Some(true),
            Self::Rejected => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected => f.write_str("rejected"),
            Self::NotExists => f.write_str("not-exists"),
            Self::Spf => f.write_str("spf"),
            Self::Greylist => f.write_str("greylist"),
            Self::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

/// Outcome of [`probe_mailbox`](super::probe_mailbox) plus the dialogue that
/// led to it.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub host: Option<String>,
    pub outcome: ProbeOutcome,
    pub transcript: Vec<String>,
}

impl ProbeReport {
    pub fn new(host: Option<String>, outcome: ProbeOutcome, transcript: Vec<String>) -> Self {
        Self {
            host,
            outcome,
            transcript,
        }
    }

    pub(crate) fn without_connection(host: Option<&str>, reason: Inconclusive) -> Self {
        Self::new(
            host.map(str::to_string),
            ProbeOutcome::Unknown(reason),
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_accept_and_reject_are_boolean() {
        assert_eq!(ProbeOutcome::Accepted.as_bool(), Some(true));
        assert_eq!(ProbeOutcome::Rejected.as_bool(), Some(false));
        assert_eq!(ProbeOutcome::Greylist.as_bool(), None);
        assert_eq!(
            ProbeOutcome::Unknown(Inconclusive::TimedOut).as_bool(),
            None
        );
    }

    #[test]
    fn display_names_reason() {
        insta::assert_snapshot!(
            ProbeOutcome::Unknown(Inconclusive::SkippedHost).to_string(),
            @"unknown (host excluded from probing)"
        );
        insta::assert_snapshot!(ProbeOutcome::NotExists.to_string(), @"not-exists");
    }
}
