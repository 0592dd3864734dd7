//! Minimal structural parsing of candidate addresses.
//!
//! Only the `@` count is checked: no RFC 5322 grammar, no length limits.

mod types;

use std::str::FromStr;

pub use types::{Address, MalformedAddress};

/// Split `input` into local part and domain.
///
/// Exactly one `@` is required; the parts on either side are kept verbatim
/// (possibly empty).
pub fn parse_address(input: &str) -> Result<Address, MalformedAddress> {
    let parts: Vec<&str> = input.split('@').collect();
    match parts.as_slice() {
        [_] => Err(MalformedAddress::MissingAt),
        [local, domain] => Ok(Address::new(*local, *domain)),
        more => Err(MalformedAddress::MultipleAt {
            count: more.len() - 1,
        }),
    }
}

impl FromStr for Address {
    type Err = MalformedAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s)
    }
}
