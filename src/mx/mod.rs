//! DNS MX resolution.
//!
//! [`resolve_mx`] performs a synchronous lookup with the system resolver and
//! returns the records sorted by ascending preference. Errors are returned
//! as-is here; the verifier decides to fold them into "no records".

mod error;
mod resolver;
mod types;

pub use error::MxError as Error;
pub use resolver::{LookupMx, SystemResolver, normalize_domain, resolve_mx, resolve_with};
pub use types::{MxRecord, exchanges};
