//! Mailbox probing over a partial SMTP handshake.
//!
//! The public entry point is [`probe_mailbox`], which connects to the first
//! MX host, sends `HELO`, `MAIL FROM` and `RCPT TO` one at a time, and stops
//! before any message is submitted. Replies are mapped to [`Signal`]s by the
//! pure [`classify`] function and the dialogue itself is the [`Probe`] state
//! machine, so both can be exercised without a network.

mod classify;
mod error;
mod machine;
mod options;
mod policy;
mod probe;
mod session;
mod types;

pub use classify::{Signal, classify, classify_bytes};
pub use error::SmtpVerifyError;
pub use machine::{Event, Probe, ProbeState, Script, ScriptStep, Step};
pub use options::{DEFAULT_HELO_DOMAIN, DEFAULT_TIMEOUT_MS, ProbeOptions, SMTP_PORT};
pub use policy::HostFilter;
pub use probe::{ProbeMailbox, SmtpProber, probe_mailbox};
pub use types::{Inconclusive, ProbeOutcome, ProbeReport};
