/// One transaction row as delivered by the ingestion boundary.
///
/// Everything except the numeric fields is kept as text; `from`/`to` are
/// `None` when the source cell was missing or blank.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionRecord {
    pub signature: String,
    pub timestamp: String,
    pub kind: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<f64>,
    pub decimals: Option<u32>,
    pub token_address: String,
}

#[cfg(test)]
impl TransactionRecord {
    pub fn from_parts(from: &str, to: &str, amount: Option<f64>) -> Self {
        Self {
            from: non_blank(Some(from.to_owned())),
            to: non_blank(Some(to.to_owned())),
            amount,
            ..Self::default()
        }
    }
}

pub(super) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
