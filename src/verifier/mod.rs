//! Orchestration: parse, resolve MX, probe, aggregate.
//!
//! Nothing here fails. Malformed input, DNS errors and probe failures all end
//! up as fields of the [`VerificationResult`], so one bad address never
//! aborts a batch.

mod options;
mod types;

pub use options::VerifyOptions;
pub use types::{CheckError, VerificationReport, VerificationResult};

use crate::address::parse_address;
use crate::mx::{self, LookupMx, SystemResolver};
use crate::smtp_verify::{ProbeMailbox, SmtpProber};

/// Reusable verifier. Holds configuration only; no state is kept between
/// calls.
#[derive(Debug, Clone)]
pub struct Verifier<R = SystemResolver, P = SmtpProber> {
    options: VerifyOptions,
    resolver: R,
    prober: P,
}

impl Verifier {
    pub fn new(options: VerifyOptions) -> Self {
        Self::with_parts(options, SystemResolver, SmtpProber)
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(VerifyOptions::default())
    }
}

impl<R: LookupMx, P: ProbeMailbox> Verifier<R, P> {
    /// Build a verifier around custom DNS and probe implementations.
    pub fn with_parts(options: VerifyOptions, resolver: R, prober: P) -> Self {
        Self {
            options,
            resolver,
            prober,
        }
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    pub fn verify(&self, address: &str) -> VerificationResult {
        self.verify_with_report(address).result
    }

    pub fn verify_with_report(&self, address: &str) -> VerificationReport {
        let parsed = match parse_address(address) {
            Ok(parsed) => parsed,
            Err(err) => {
                log_debug!("{address:?} is malformed: {err}");
                let mut report = VerificationReport::new(address, VerificationResult::default());
                report.malformed = Some(err);
                return report;
            }
        };

        let mut report = VerificationReport::new(address, VerificationResult::well_formed());
        if !self.options.needs_dns() {
            return report;
        }

        report.mx_records = match mx::resolve_with(&self.resolver, parsed.domain()) {
            Ok(records) => records,
            Err(err) => {
                log_warn!("MX resolution for {} failed, treating as no records: {err}", parsed.domain());
                report.dns_error = Some(err.to_string());
                Vec::new()
            }
        };

        if self.options.verify_domain {
            report.result.valid_domain = Some(!report.mx_records.is_empty());
        }

        if self.options.verify_mailbox {
            let exchanges = mx::exchanges(&report.mx_records);
            let probe = self.prober.probe(&parsed, &exchanges, &self.options.probe);
            report.result.record_probe(probe.outcome);
            report.probe = Some(probe);
        }

        log_debug!("{address}: {}", report.result);
        report
    }
}

/// One-shot verification with the system resolver and a real SMTP probe.
pub fn verify_email(address: &str, options: &VerifyOptions) -> VerificationResult {
    Verifier::new(options.clone()).verify(address)
}
