use crate::smtp_verify::{HostFilter, ProbeOptions};

/// Controls which checks [`Verifier::verify`](super::Verifier::verify) runs.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub verify_domain: bool,
    pub verify_mailbox: bool,
    pub probe: ProbeOptions,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            verify_domain: true,
            verify_mailbox: true,
            probe: ProbeOptions::default(),
        }
    }
}

impl VerifyOptions {
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.probe.sender = Some(sender.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.probe.timeout_ms = timeout_ms;
        self
    }

    pub fn with_host_filter(mut self, filter: HostFilter) -> Self {
        self.probe.host_filter = filter;
        self
    }

    /// No DNS query is needed when both checks are off.
    pub(crate) fn needs_dns(&self) -> bool {
        self.verify_domain || self.verify_mailbox
    }
}
