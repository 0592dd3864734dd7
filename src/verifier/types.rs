use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::address::MalformedAddress;
use crate::mx::MxRecord;
use crate::smtp_verify::{Inconclusive, ProbeOutcome, ProbeReport};

/// Why a mailbox could not be confirmed, beyond a plain rejection.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckError {
    NotExists,
    Spf,
    Greylist,
    Unknown(Inconclusive),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotExists => f.write_str("not-exists"),
            Self::Spf => f.write_str("spf"),
            Self::Greylist => f.write_str("greylist"),
            Self::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

/// Public result record. `None` means "not determined", never "invalid".
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerificationResult {
    pub well_formed: bool,
    pub valid_domain: Option<bool>,
    pub valid_mailbox: Option<bool>,
    pub check_error: Option<CheckError>,
}

impl VerificationResult {
    pub(crate) fn well_formed() -> Self {
        Self {
            well_formed: true,
            ..Self::default()
        }
    }

    /// Boolean verdicts map directly; every other outcome is "not valid" with
    /// the outcome kept as the check error.
    pub(crate) fn record_probe(&mut self, outcome: ProbeOutcome) {
        let (valid, error) = match outcome {
            ProbeOutcome::Accepted => (true, None),
            ProbeOutcome::Rejected => (false, None),
            ProbeOutcome::NotExists => (false, Some(CheckError::NotExists)),
            ProbeOutcome::Spf => (false, Some(CheckError::Spf)),
            ProbeOutcome::Greylist => (false, Some(CheckError::Greylist)),
            ProbeOutcome::Unknown(reason) => (false, Some(CheckError::Unknown(reason))),
        };
        self.valid_mailbox = Some(valid);
        self.check_error = error;
    }

    /// Well formed, and neither check came back negative.
    pub fn is_deliverable(&self) -> bool {
        self.well_formed && self.valid_domain != Some(false) && self.valid_mailbox != Some(false)
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn tri(value: Option<bool>) -> &'static str {
            match value {
                Some(true) => "true",
                Some(false) => "false",
                None => "null",
            }
        }
        write!(
            f,
            "well_formed={} valid_domain={} valid_mailbox={}",
            self.well_formed,
            tri(self.valid_domain),
            tri(self.valid_mailbox)
        )?;
        if let Some(error) = &self.check_error {
            write!(f, " check_error={error}")?;
        }
        Ok(())
    }
}

/// [`VerificationResult`] plus what led to it, for logging and reporting.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub address: String,
    pub result: VerificationResult,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub malformed: Option<MalformedAddress>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub mx_records: Vec<MxRecord>,
    /// DNS failure folded into "no records" in `result`.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub dns_error: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub probe: Option<ProbeReport>,
}

impl VerificationReport {
    pub(crate) fn new(address: &str, result: VerificationResult) -> Self {
        Self {
            address: address.to_string(),
            result,
            malformed: None,
            mx_records: Vec::new(),
            dns_error: None,
            probe: None,
        }
    }
}
