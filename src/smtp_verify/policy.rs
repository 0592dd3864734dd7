use std::fmt;
use std::sync::Arc;

use regex::RegexSet;

type Predicate = dyn Fn(&str) -> bool + Send + Sync;

/// Decides which MX hosts must not be probed at all.
///
/// Some providers block or blacklist senders that probe them; their hosts
/// resolve to an inconclusive outcome without opening a connection.
#[derive(Clone)]
pub struct HostFilter {
    skip: Arc<Predicate>,
    label: String,
}

impl HostFilter {
    /// Probe every host.
    pub fn none() -> Self {
        Self {
            skip: Arc::new(|_| false),
            label: "none".to_string(),
        }
    }

    pub fn from_fn<F>(label: impl Into<String>, skip: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            skip: Arc::new(skip),
            label: label.into(),
        }
    }

    /// Skip hosts matching any of the (case-sensitive) regex `patterns`.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = RegexSet::new(patterns)?;
        let label = set.patterns().join("|");
        Ok(Self::from_fn(label, move |host| set.is_match(host)))
    }

    pub fn should_skip(&self, host: &str) -> bool {
        (self.skip)(host)
    }
}

impl Default for HostFilter {
    fn default() -> Self {
        Self::from_fn("yahoo", |host| host.to_ascii_lowercase().contains("yahoo"))
    }
}

impl fmt::Debug for HostFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostFilter").field(&self.label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_skips_yahoo_hosts() {
        let filter = HostFilter::default();
        assert!(filter.should_skip("mta5.am0.YahooDNS.net"));
        assert!(!filter.should_skip("aspmx.l.google.com"));
    }

    #[test]
    fn none_skips_nothing() {
        assert!(!HostFilter::none().should_skip("mta5.am0.yahoodns.net"));
    }

    #[test]
    fn patterns_match_any() {
        let filter =
            HostFilter::from_patterns([r"\.outlook\.com$", r"^mx\d+\.corp\."]).expect("valid");
        assert!(filter.should_skip("example-com.mail.protection.outlook.com"));
        assert!(filter.should_skip("mx2.corp.example"));
        assert!(!filter.should_skip("mail.example.org"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(HostFilter::from_patterns(["("]).is_err());
    }
}
