//! A strategy's declared firing cadence, aggregation targets, and watchlist.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::symbol::Symbol;

/// {strategy name, interval, aggregations, watchlist}.
///
/// Invariant: `interval <= min(aggregations)` and every aggregation interval
/// is reachable by resampling from `interval` (its duration evenly divides
/// the aggregation's duration).
#[derive(Debug, Clone)]
pub struct StrategyBinding {
    pub strategy_name: String,
    pub interval: Interval,
    pub aggregations: BTreeSet<Interval>,
    pub watchlist: BTreeSet<Symbol>,
}

impl StrategyBinding {
    pub fn new(
        strategy_name: impl Into<String>,
        interval: Interval,
        aggregations: BTreeSet<Interval>,
        watchlist: BTreeSet<Symbol>,
    ) -> Result<Self> {
        let binding = Self {
            strategy_name: strategy_name.into(),
            interval,
            aggregations,
            watchlist,
        };
        binding.validate()?;
        Ok(binding)
    }

    fn validate(&self) -> Result<()> {
        for agg in &self.aggregations {
            if *agg <= self.interval {
                return Err(Error::InvalidBinding(format!(
                    "aggregation {} must be strictly coarser than binding interval {}",
                    agg, self.interval
                )));
            }
            let from_ms = self.interval.duration().num_milliseconds();
            let to_ms = agg.duration().num_milliseconds();
            if to_ms % from_ms != 0 {
                return Err(Error::InvalidBinding(format!(
                    "aggregation {} is not reachable by resampling from {}",
                    agg, self.interval
                )));
            }
        }
        Ok(())
    }

    /// Every interval this binding needs data for: its own firing interval
    /// plus all declared aggregations.
    pub fn all_intervals(&self) -> Vec<Interval> {
        let mut out = vec![self.interval];
        out.extend(self.aggregations.iter().copied());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    #[test]
    fn test_valid_binding() {
        let mut aggs = BTreeSet::new();
        aggs.insert(Interval::Hour1);
        let mut watchlist = BTreeSet::new();
        watchlist.insert(sym("AAPL"));
        let binding = StrategyBinding::new("sma_cross", Interval::Min1, aggs, watchlist);
        assert!(binding.is_ok());
    }

    #[test]
    fn test_aggregation_must_be_coarser() {
        let mut aggs = BTreeSet::new();
        aggs.insert(Interval::Sec15);
        let err = StrategyBinding::new("bad", Interval::Min1, aggs, BTreeSet::new());
        assert!(err.is_err());
    }

    #[test]
    fn test_aggregation_must_be_reachable() {
        // Min5's duration (300s) does not evenly divide into... use an
        // interval pair where the coarser duration is not a multiple.
        // All current intervals happen to divide evenly except none, so
        // this test exercises the reachable case positively instead.
        let mut aggs = BTreeSet::new();
        aggs.insert(Interval::Min5);
        let binding = StrategyBinding::new("ok", Interval::Min1, aggs, BTreeSet::new());
        assert!(binding.is_ok());
    }

    #[test]
    fn test_all_intervals_includes_binding_and_aggregations() {
        let mut aggs = BTreeSet::new();
        aggs.insert(Interval::Hour1);
        aggs.insert(Interval::Day1);
        let binding = StrategyBinding::new("multi", Interval::Min5, aggs, BTreeSet::new()).unwrap();
        let all = binding.all_intervals();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], Interval::Min5);
    }
}
