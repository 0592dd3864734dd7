#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// Exchange hostnames of `records`, in the order given (priority dropped).
pub fn exchanges(records: &[MxRecord]) -> Vec<String> {
    records.iter().map(|r| r.exchange.clone()).collect()
}
