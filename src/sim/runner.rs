//! Runs every panel × battery × tariff combination over the same sample data.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, info_span};

use crate::devices::{BatteryModel, PanelModel};
use crate::error::{Result, SimError};
use crate::tariff::{Bill, BillingPolicy, Tariff};

use super::engine::Engine;
use super::samples::SampleSet;
use super::types::{CombinationKey, SimConfig, StepResult};

/// Equipment and tariff options to combine.
///
/// The models are templates: every combination runs on fresh clones, so
/// degradation, state of charge and billing totals never carry over.
#[derive(Debug, Clone)]
pub struct Catalog<T = Tariff> {
    pub panels: Vec<PanelModel>,
    pub batteries: Vec<BatteryModel>,
    pub tariffs: Vec<T>,
}

impl<T: BillingPolicy> Catalog<T> {
    pub fn new(panels: Vec<PanelModel>, batteries: Vec<BatteryModel>, tariffs: Vec<T>) -> Self {
        Self {
            panels,
            batteries,
            tariffs,
        }
    }

    /// Number of combinations in the cross product.
    pub fn combinations(&self) -> usize {
        self.panels.len() * self.batteries.len() * self.tariffs.len()
    }

    /// Indices of every combination, panel-major, then battery, then tariff.
    fn index_triples(&self) -> Vec<(usize, usize, usize)> {
        let mut triples = Vec::with_capacity(self.combinations());
        for p in 0..self.panels.len() {
            for b in 0..self.batteries.len() {
                for t in 0..self.tariffs.len() {
                    triples.push((p, b, t));
                }
            }
        }
        triples
    }

    fn key(&self, (p, b, t): (usize, usize, usize)) -> CombinationKey {
        CombinationKey::new(
            self.panels[p].name(),
            self.batteries[b].name(),
            self.tariffs[t].name(),
        )
    }
}

/// Settled bills of one combination, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationRun {
    pub key: CombinationKey,
    pub bills: Vec<Bill>,
}

impl CombinationRun {
    /// Bill totals, one per billing period.
    pub fn amounts(&self) -> Vec<f64> {
        self.bills.iter().map(|b| b.total).collect()
    }
}

/// Outcome of a full catalog run.
///
/// Successful combinations are kept in catalog order. A combination that
/// failed contributes no bills at all; its error is kept in `failures`,
/// wrapped with the combination key.
#[derive(Debug, Default)]
pub struct SimulationResult {
    runs: Vec<CombinationRun>,
    failures: Vec<SimError>,
}

impl SimulationResult {
    /// Looks up a combination by its `"<panel>:<battery>:<tariff>"` key.
    pub fn get(&self, key: &str) -> Option<&CombinationRun> {
        self.runs.iter().find(|r| r.key.to_string() == key)
    }

    /// Bill totals of the combination `key`.
    pub fn amounts(&self, key: &str) -> Option<Vec<f64>> {
        self.get(key).map(CombinationRun::amounts)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombinationRun> {
        self.runs.iter()
    }

    pub fn runs(&self) -> &[CombinationRun] {
        &self.runs
    }

    pub fn failures(&self) -> &[SimError] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Converts into the successful runs, or the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failed combination's error, in catalog order.
    pub fn into_result(self) -> Result<Vec<CombinationRun>> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.runs),
        }
    }
}

/// Runs a single combination on pristine copies of its models.
///
/// # Errors
///
/// Returns the engine's error wrapped with the combination key.
pub fn run_combination<T: BillingPolicy + Clone>(
    config: &SimConfig,
    panel: &PanelModel,
    battery: &BatteryModel,
    tariff: &T,
    samples: &SampleSet,
) -> Result<CombinationRun> {
    let key = CombinationKey::new(panel.name(), battery.name(), tariff.name());
    let span = info_span!("combination", key = %key);
    let _enter = span.enter();

    let mut engine = Engine::new(*config, panel.clone(), battery.clone(), tariff.clone());
    let bills = engine
        .run(samples)
        .map_err(|e| e.in_combination(key.to_string()))?;

    let total: f64 = bills.iter().map(|b| b.total).sum();
    info!(bills = bills.len(), total, "combination finished");
    Ok(CombinationRun { key, bills })
}

/// Simulates the full cross product of the catalog.
///
/// With `parallel` set, combinations are spread over the rayon thread pool;
/// each worker returns its own bill sequence and results are gathered in
/// catalog order, so both modes produce identical output.
///
/// # Arguments
///
/// * `config` - Step size and number of passes over the sample year
/// * `catalog` - Panels, batteries and tariffs to combine
/// * `samples` - Shared, read-only input series
/// * `parallel` - Run combinations concurrently
pub fn simulate<T>(
    config: &SimConfig,
    catalog: &Catalog<T>,
    samples: &SampleSet,
    parallel: bool,
) -> SimulationResult
where
    T: BillingPolicy + Clone + Send + Sync,
{
    info!(
        combinations = catalog.combinations(),
        samples = samples.len(),
        years = config.years,
        parallel,
        "starting simulation"
    );

    let run = |&(p, b, t): &(usize, usize, usize)| {
        run_combination(
            config,
            &catalog.panels[p],
            &catalog.batteries[b],
            &catalog.tariffs[t],
            samples,
        )
    };
    let triples = catalog.index_triples();
    let outcomes: Vec<Result<CombinationRun>> = if parallel {
        triples.par_iter().map(run).collect()
    } else {
        triples.iter().map(run).collect()
    };

    let mut result = SimulationResult::default();
    for outcome in outcomes {
        match outcome {
            Ok(run) => result.runs.push(run),
            Err(err) => {
                error!(error = %err, "combination failed");
                result.failures.push(err);
            }
        }
    }
    info!(
        succeeded = result.runs.len(),
        failed = result.failures.len(),
        "simulation finished"
    );
    result
}

/// Runs one combination, picked by key, and returns its step log as well.
///
/// # Errors
///
/// Returns [`SimError::Configuration`] if no combination matches `key`, or
/// the engine's error.
pub fn trace_combination<T: BillingPolicy + Clone>(
    config: &SimConfig,
    catalog: &Catalog<T>,
    samples: &SampleSet,
    key: &str,
) -> Result<(Vec<Bill>, Vec<StepResult>)> {
    let triple = catalog
        .index_triples()
        .into_iter()
        .find(|&triple| catalog.key(triple).to_string() == key)
        .ok_or_else(|| SimError::configuration("combination", format!("unknown key {key:?}")))?;
    let (p, b, t) = triple;

    let mut engine = Engine::new(
        *config,
        catalog.panels[p].clone(),
        catalog.batteries[b].clone(),
        catalog.tariffs[t].clone(),
    );
    engine
        .run_recorded(samples)
        .map_err(|e| e.in_combination(key))
}
