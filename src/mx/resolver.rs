use trust_dns_resolver::{Resolver, error::ResolveErrorKind};

use super::{Error, MxRecord};

/// Source of raw MX records. Implemented by [`SystemResolver`] and by
/// trust-dns' own [`Resolver`]; tests plug in stubs.
pub trait LookupMx {
    /// Raw records for an ASCII domain, in answer order. A domain without MX
    /// records yields `Ok(vec![])`.
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error>;
}

/// Builds a resolver from the system configuration for every lookup.
/// Holds no state between calls (no cache).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl LookupMx for SystemResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error> {
        let resolver = Resolver::from_system_conf().map_err(Error::resolver_init)?;
        resolver.lookup_mx(domain)
    }
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error> {
        let lookup = match Resolver::mx_lookup(self, domain) {
            Ok(lookup) => lookup,
            Err(err) if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                return Ok(Vec::new());
            }
            Err(err) => return Err(Error::lookup(domain, err)),
        };
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }
}

/// Lookup MX records for `domain` using the system resolver.
///
/// The domain is normalized via IDNA before querying DNS. Records come back
/// sorted by ascending preference.
pub fn resolve_mx(domain: &str) -> Result<Vec<MxRecord>, Error> {
    resolve_with(&SystemResolver, domain)
}

/// Same as [`resolve_mx`] against any [`LookupMx`] implementation.
///
/// The sort is stable: records sharing a preference keep their answer order.
pub fn resolve_with<R>(resolver: &R, domain: &str) -> Result<Vec<MxRecord>, Error>
where
    R: LookupMx + ?Sized,
{
    let ascii = normalize_domain(domain)?;
    let mut records = resolver.lookup_mx(&ascii)?;
    records.sort_by_key(|record| record.preference);
    log_debug!("{} MX record(s) for {ascii}", records.len());
    Ok(records)
}

pub fn normalize_domain(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(Error::idna)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}
