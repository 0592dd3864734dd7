use std::borrow::Cow;
use std::time::Duration;

use super::policy::HostFilter;

pub const DEFAULT_HELO_DOMAIN: &str = "verify-email.org";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const SMTP_PORT: u16 = 25;

/// Configuration knobs for [`probe_mailbox`](super::probe_mailbox).
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Envelope sender for `MAIL FROM`. `None` uses the probed address.
    pub sender: Option<String>,
    /// Bound on the whole handshake, connection included. Not reset per step.
    /// The system lookup of the MX host cannot be interrupted; a budget it
    /// exhausts ends the probe as timed out before any connection attempt.
    pub timeout_ms: u64,
    pub helo_domain: String,
    pub port: u16,
    pub host_filter: HostFilter,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            sender: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            helo_domain: DEFAULT_HELO_DOMAIN.to_string(),
            port: SMTP_PORT,
            host_filter: HostFilter::default(),
        }
    }
}

impl ProbeOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sender<'a>(&'a self, fallback: &'a str) -> Cow<'a, str> {
        self.sender
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Borrowed(fallback))
    }

    pub fn helo_domain(&self) -> &str {
        if self.helo_domain.trim().is_empty() {
            DEFAULT_HELO_DOMAIN
        } else {
            &self.helo_domain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ProbeOptions::default();
        assert_eq!(options.timeout(), Duration::from_secs(10));
        assert_eq!(options.port, 25);
        assert_eq!(options.helo_domain(), "verify-email.org");
        assert_eq!(options.sender("bob@example.com"), "bob@example.com");
    }

    #[test]
    fn explicit_sender_wins_unless_empty() {
        let mut options = ProbeOptions {
            sender: Some("probe@checker.test".to_string()),
            ..ProbeOptions::default()
        };
        assert_eq!(options.sender("bob@example.com"), "probe@checker.test");
        options.sender = Some(String::new());
        assert_eq!(options.sender("bob@example.com"), "bob@example.com");
    }
}
