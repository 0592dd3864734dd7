#![forbid(unsafe_code)]
//! mailprobe_lib — vérification d'adresses e-mail sans envoi de message
//!
//! An address is checked in three steps: structural parsing, MX lookup, and a
//! partial SMTP handshake against the preferred MX host that stops before any
//! message is submitted. [`Verifier::verify`] runs them and folds every
//! failure into a [`VerificationResult`].

#[macro_use]
mod log;

pub mod address;
pub mod mx;
pub mod smtp_verify;
pub mod verifier;

pub use address::{Address, MalformedAddress, parse_address};
pub use mx::{Error as MxError, LookupMx, MxRecord, SystemResolver, resolve_mx};
pub use smtp_verify::{
    HostFilter, Inconclusive, ProbeMailbox, ProbeOptions, ProbeOutcome, ProbeReport, Signal,
    SmtpProber, classify, probe_mailbox,
};
pub use verifier::{
    CheckError, VerificationReport, VerificationResult, Verifier, VerifyOptions, verify_email,
};
