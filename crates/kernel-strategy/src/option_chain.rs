//! Filtering and sorting a fetched option chain by type, strike range, and
//! expiration range.

use chrono::NaiveDate;
use kernel_broker::adapter::ChainEntry;
use kernel_core::symbol::OptionType;
use kernel_core::types::Decimal;

/// Criteria for [`filter_chain`]; any field left `None` is unconstrained.
#[derive(Debug, Clone, Default)]
pub struct ChainFilter {
    pub option_type: Option<OptionType>,
    pub strike_range: Option<(Decimal, Decimal)>,
    pub expiration_range: Option<(NaiveDate, NaiveDate)>,
}

/// Filters `entries` by `filter`, returning matches sorted by
/// `(strike, expiration)`.
pub fn filter_chain(entries: &[ChainEntry], filter: &ChainFilter) -> Vec<ChainEntry> {
    let mut matches: Vec<ChainEntry> = entries
        .iter()
        .filter(|e| filter.option_type.is_none_or(|t| t == e.option_type))
        .filter(|e| {
            filter
                .strike_range
                .is_none_or(|(lo, hi)| e.strike >= lo && e.strike <= hi)
        })
        .filter(|e| {
            filter
                .expiration_range
                .is_none_or(|(lo, hi)| e.exp_date >= lo && e.exp_date <= hi)
        })
        .cloned()
        .collect();
    matches.sort_by(|a, b| a.strike.cmp(&b.strike).then(a.exp_date.cmp(&b.exp_date)));
    matches
}
