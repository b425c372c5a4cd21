use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use common::{DataSourceRef, MarketStrategy, Operator};

use crate::registry::DataSourceRegistry;
use crate::templates::{format_target, math_template};

/// Markup applied to the registry price when a valid reference has no target.
pub const MISSING_TARGET_MARKUP: f64 = 1.1;

/// Bounds of the random factor applied to a fallback's price to get its target.
pub const FALLBACK_TARGET_MIN: f64 = 0.9;
pub const FALLBACK_TARGET_MAX: f64 = 1.1;

/// Joins per-reference clauses in synthesized logic.
pub const LOGIC_CONNECTOR: &str = " AND ";

/// A data-source reference with every field populated and a known id.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedReference {
    pub id: i64,
    pub current_value: f64,
    pub target_value: f64,
    pub operator: Operator,
}

impl FixedReference {
    /// `price {op} {target}` with the target at two decimals.
    pub fn clause(&self) -> String {
        format!("price {} {}", self.operator, format_target(self.target_value))
    }
}

impl From<FixedReference> for DataSourceRef {
    fn from(r: FixedReference) -> Self {
        DataSourceRef::new(r.id, r.current_value, r.target_value, r.operator)
    }
}

/// Counts of repairs made during one validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairStats {
    pub strategies: usize,
    /// Unknown ids swapped for a fallback reference.
    pub replaced_references: usize,
    /// Known ids with a missing value or operator filled in.
    pub filled_references: usize,
    /// Strategies that had no references at all.
    pub attached_fallbacks: usize,
    pub synthesized_logic: usize,
}

impl RepairStats {
    pub fn total_repairs(&self) -> usize {
        self.replaced_references
            + self.filled_references
            + self.attached_fallbacks
            + self.synthesized_logic
    }

    pub fn merge(&mut self, other: RepairStats) {
        self.strategies += other.strategies;
        self.replaced_references += other.replaced_references;
        self.filled_references += other.filled_references;
        self.attached_fallbacks += other.attached_fallbacks;
        self.synthesized_logic += other.synthesized_logic;
    }
}

/// Repairs strategies from the untrusted backend feed before display.
///
/// Every output reference points at a registry entry and carries current
/// value, target value and operator; every output strategy has non-empty
/// `mathematical_logic`. Bad data is never an error here: it is replaced and
/// logged. The random source is supplied per call so tests can seed it.
#[derive(Debug, Clone)]
pub struct StrategyValidator {
    registry: Arc<DataSourceRegistry>,
}

impl StrategyValidator {
    pub fn new(registry: Arc<DataSourceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<DataSourceRegistry> {
        &self.registry
    }

    /// Keep a known reference, filling any missing field from the registry,
    /// or swap an unknown one for a fallback.
    pub fn validate_reference<R: Rng + ?Sized>(
        &self,
        reference: &DataSourceRef,
        rng: &mut R,
    ) -> FixedReference {
        self.repair_reference(reference, "-", rng, &mut RepairStats::default())
    }

    /// A placeholder reference drawn from the fallback subset. The target
    /// straddles the current price so the condition is neither trivially
    /// true nor false.
    pub fn fallback_reference<R: Rng + ?Sized>(&self, rng: &mut R) -> FixedReference {
        let source = self.registry.pick_fallback(rng);
        let current_value = source.price_value();
        let factor = rng.gen_range(FALLBACK_TARGET_MIN..=FALLBACK_TARGET_MAX);
        let operator = if rng.gen_bool(0.5) {
            Operator::Gt
        } else {
            Operator::Lt
        };
        FixedReference {
            id: source.id,
            current_value,
            target_value: current_value * factor,
            operator,
        }
    }

    /// Return a corrected copy of `strategy`. Only `used_data_sources` and
    /// `mathematical_logic` can differ from the input.
    pub fn validate_strategy<R: Rng + ?Sized>(
        &self,
        strategy: &MarketStrategy,
        rng: &mut R,
    ) -> MarketStrategy {
        self.repair_strategy(strategy, rng, &mut RepairStats::default())
    }

    /// Validate every strategy, preserving order and count.
    pub fn validate_strategies<R: Rng + ?Sized>(
        &self,
        strategies: &[MarketStrategy],
        rng: &mut R,
    ) -> Vec<MarketStrategy> {
        self.validate_strategies_with_stats(strategies, rng).0
    }

    /// Like `validate_strategies`, also reporting what had to be repaired.
    pub fn validate_strategies_with_stats<R: Rng + ?Sized>(
        &self,
        strategies: &[MarketStrategy],
        rng: &mut R,
    ) -> (Vec<MarketStrategy>, RepairStats) {
        let mut stats = RepairStats::default();
        let fixed = strategies
            .iter()
            .map(|s| self.repair_strategy(s, rng, &mut stats))
            .collect();
        if stats.total_repairs() > 0 {
            warn!(
                strategies = stats.strategies,
                replaced = stats.replaced_references,
                filled = stats.filled_references,
                attached = stats.attached_fallbacks,
                synthesized_logic = stats.synthesized_logic,
                "Repaired upstream strategy data"
            );
        }
        (fixed, stats)
    }

    fn repair_strategy<R: Rng + ?Sized>(
        &self,
        strategy: &MarketStrategy,
        rng: &mut R,
        stats: &mut RepairStats,
    ) -> MarketStrategy {
        stats.strategies += 1;
        let existing_logic = strategy
            .mathematical_logic
            .as_deref()
            .filter(|logic| !logic.is_empty());

        let references = strategy.used_data_sources.as_deref().unwrap_or_default();
        if references.is_empty() {
            let fallback = self.fallback_reference(rng);
            stats.attached_fallbacks += 1;
            warn!(strategy = %strategy.id, fallback = fallback.id, "Strategy has no data sources, attaching fallback");

            let logic = match existing_logic {
                Some(logic) => logic.to_string(),
                None => {
                    stats.synthesized_logic += 1;
                    math_template(fallback.target_value, rng)
                }
            };
            return MarketStrategy {
                used_data_sources: Some(vec![fallback.into()]),
                mathematical_logic: Some(logic),
                ..strategy.clone()
            };
        }

        let fixed: Vec<FixedReference> = references
            .iter()
            .map(|r| self.repair_reference(r, &strategy.id, rng, stats))
            .collect();

        let logic = match existing_logic {
            Some(logic) => logic.to_string(),
            None => {
                stats.synthesized_logic += 1;
                debug!(strategy = %strategy.id, "Synthesizing mathematical logic");
                fixed
                    .iter()
                    .map(FixedReference::clause)
                    .collect::<Vec<_>>()
                    .join(LOGIC_CONNECTOR)
            }
        };

        MarketStrategy {
            used_data_sources: Some(fixed.into_iter().map(DataSourceRef::from).collect()),
            mathematical_logic: Some(logic),
            ..strategy.clone()
        }
    }

    fn repair_reference<R: Rng + ?Sized>(
        &self,
        reference: &DataSourceRef,
        strategy_id: &str,
        rng: &mut R,
        stats: &mut RepairStats,
    ) -> FixedReference {
        let Some(source) = self.registry.get(reference.id) else {
            let fallback = self.fallback_reference(rng);
            stats.replaced_references += 1;
            warn!(
                strategy = %strategy_id,
                invalid_id = reference.id,
                fallback = fallback.id,
                "Invalid data source id, using fallback"
            );
            return fallback;
        };

        let price = source.price_value();
        let current = reference.current_value.filter(|v| *v != 0.0);
        let target = reference.target_value.filter(|v| *v != 0.0);

        if current.is_none() || target.is_none() || reference.operator.is_none() {
            stats.filled_references += 1;
            debug!(strategy = %strategy_id, id = reference.id, "Filling missing data source fields");
        }

        FixedReference {
            id: reference.id,
            current_value: current.unwrap_or(price),
            target_value: target.unwrap_or(price * MISSING_TARGET_MARKUP),
            operator: reference.operator.clone().unwrap_or(Operator::Gt),
        }
    }
}
