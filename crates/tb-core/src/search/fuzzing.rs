//! Coverage-guided grey-box fuzzing over the same chromosome arena.
//!
//! Instead of fixed-size generations the fuzzer keeps a seed corpus. Each
//! cycle picks the seed with the highest coverage, assigns it an energy that
//! shrinks with its length, and spends that energy on single-step mutants.
//! Crashing mutants go to the crash corpus; mutants that raise the combined
//! coverage above the baseline join the seed corpus.

use super::chromosome::{ChromosomeArena, Lineage, Phenotype, Score};
use super::operators::{ChromosomeFactory, Mutation};
use super::termination::{AnyOf, SearchProgress, TerminationCondition};
use crate::logging::{event_names, Stage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tb_common::{ChromosomeId, Error, Result};
use tb_config::{CoveragePolicy, FuzzingParams};

/// Coverage and crash feedback for the fuzzer.
pub trait FuzzOracle<T, X> {
    /// Coverage reached by one chromosome, executing it if necessary.
    fn coverage(&self, value: &mut T, ctx: &mut X) -> f64;

    /// Coverage of everything executed so far in the campaign.
    fn combined_coverage(&self, ctx: &X) -> f64;

    /// Whether the (already executed) chromosome crashed the target.
    fn is_crash(&self, value: &T, ctx: &X) -> bool;
}

/// Mutation attempts for a seed of `length`.
///
/// `max(1, round(max_energy - max_energy / max_length * length))`: shorter
/// seeds are cheaper to execute and get more attempts.
pub fn energy(max_energy: f64, max_length: usize, length: usize) -> u64 {
    let raw = max_energy - max_energy / max_length.max(1) as f64 * length as f64;
    raw.round().max(1.0) as u64
}

const COVERAGE_EPSILON: f64 = 1e-9;

pub struct GreyBoxFuzzer<T, X> {
    initial_corpus_size: usize,
    max_energy: f64,
    max_length: usize,
    policy: CoveragePolicy,
    arena: ChromosomeArena<T>,
    corpus: Vec<ChromosomeId>,
    crashes: Vec<ChromosomeId>,
    rng: StdRng,
    factory: Box<dyn ChromosomeFactory<T, X>>,
    mutation: Box<dyn Mutation<T, X>>,
    oracle: Box<dyn FuzzOracle<T, X>>,
    termination: Box<dyn TerminationCondition>,
    progress: SearchProgress,
}

impl<T: Phenotype, X> GreyBoxFuzzer<T, X> {
    pub fn new(
        params: &FuzzingParams,
        seed: u64,
        factory: impl ChromosomeFactory<T, X> + 'static,
        mutation: impl Mutation<T, X> + 'static,
        oracle: impl FuzzOracle<T, X> + 'static,
    ) -> Result<Self> {
        if params.max_energy < 1.0 {
            return Err(Error::InvalidSearchConfig(format!(
                "max_energy must be at least 1, got {}",
                params.max_energy
            )));
        }
        if params.max_length == 0 {
            return Err(Error::InvalidSearchConfig(
                "max_length must be positive".to_string(),
            ));
        }
        Ok(Self {
            initial_corpus_size: params.initial_corpus_size,
            max_energy: params.max_energy,
            max_length: params.max_length,
            policy: params.coverage_policy,
            arena: ChromosomeArena::new(),
            corpus: Vec::new(),
            crashes: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            factory: Box::new(factory),
            mutation: Box::new(mutation),
            oracle: Box::new(oracle),
            termination: Box::new(AnyOf::from_limits(params.max_cycles, params.max_seconds)),
            progress: SearchProgress::start(),
        })
    }

    pub fn with_termination(mut self, termination: impl TerminationCondition + 'static) -> Self {
        self.termination = Box::new(termination);
        self
    }

    pub fn energy(&self, length: usize) -> u64 {
        energy(self.max_energy, self.max_length, length)
    }

    /// Generate and execute the initial seeds.
    pub fn create_initial_corpus(&mut self, ctx: &mut X) {
        for _ in 0..self.initial_corpus_size {
            self.add_fresh_seed(ctx);
        }
        tracing::debug!(
            event = event_names::POPULATION_CREATED,
            stage = %Stage::Fuzz,
            corpus = self.corpus.len(),
            crashes = self.crashes.len(),
            "initial corpus created"
        );
    }

    /// Seed with the highest coverage; the oldest wins ties.
    pub fn choose_next(&self) -> Option<ChromosomeId> {
        self.corpus
            .iter()
            .copied()
            .min_by(|&a, &b| self.coverage_of(b).total_cmp(&self.coverage_of(a)))
    }

    /// Draw one seed from the factory; crashing seeds go to the crash corpus.
    fn add_fresh_seed(&mut self, ctx: &mut X) -> ChromosomeId {
        let value = self.factory.create(&mut self.rng, ctx);
        let id = self.arena.alloc(value, Lineage::initial());
        self.evaluate(id, ctx);
        if self.oracle.is_crash(self.arena.value(id), ctx) {
            self.crashes.push(id);
        } else {
            self.corpus.push(id);
        }
        id
    }

    /// One energy assignment: mutate the chosen seed `energy` times.
    ///
    /// With an empty corpus (every seed so far crashed) the cycle instead
    /// draws one fresh seed, so termination still applies.
    pub fn run_cycle(&mut self, ctx: &mut X) -> Result<()> {
        let Some(seed) = self.choose_next() else {
            let id = self.add_fresh_seed(ctx);
            tracing::debug!(
                stage = %Stage::Fuzz,
                chromosome = %id,
                crashes = self.crashes.len(),
                "seed corpus empty, drew a fresh seed"
            );
            self.progress.iterations += 1;
            return Ok(());
        };
        let length = self.arena.value(seed).len();
        let energy = self.energy(length);
        tracing::debug!(
            event = event_names::FUZZ_ENERGY_ASSIGNED,
            stage = %Stage::Fuzz,
            seed = %seed,
            length,
            energy,
            "energy assigned"
        );

        let mut baseline = self.oracle.combined_coverage(ctx);
        for _ in 0..energy {
            if self.policy == CoveragePolicy::Recompute {
                baseline = self.oracle.combined_coverage(ctx);
            }
            let mutant = self
                .mutation
                .mutate(self.arena.value(seed), &mut self.rng, ctx);
            let id = self.arena.alloc(
                mutant,
                Lineage {
                    parents: vec![seed],
                    crossed: false,
                    mutated: true,
                },
            );
            self.evaluate(id, ctx);

            if self.oracle.is_crash(self.arena.value(id), ctx) {
                tracing::info!(
                    event = event_names::FUZZ_CRASH,
                    stage = %Stage::Fuzz,
                    chromosome = %id,
                    parent = %seed,
                    "mutant crashed the target"
                );
                self.crashes.push(id);
            } else if self.oracle.combined_coverage(ctx) > baseline + COVERAGE_EPSILON {
                tracing::debug!(
                    event = event_names::FUZZ_INTERESTING,
                    stage = %Stage::Fuzz,
                    chromosome = %id,
                    coverage = self.coverage_of(id),
                    "interesting mutant added to corpus"
                );
                self.corpus.push(id);
            }
        }
        self.progress.iterations += 1;
        Ok(())
    }

    /// Create the initial corpus and fuzz until termination.
    pub fn run(&mut self, ctx: &mut X) -> Result<()> {
        self.progress = SearchProgress::start();
        tracing::info!(
            event = event_names::SEARCH_STARTED,
            strategy = "greybox",
            initial_corpus_size = self.initial_corpus_size,
            max_energy = self.max_energy,
            "search started"
        );

        self.create_initial_corpus(ctx);
        while !self.termination.should_stop(&self.progress) {
            self.run_cycle(ctx)?;
        }

        tracing::info!(
            event = event_names::SEARCH_FINISHED,
            strategy = "greybox",
            cycles = self.progress.iterations,
            evaluations = self.progress.evaluations,
            corpus = self.corpus.len(),
            crashes = self.crashes.len(),
            coverage = self.oracle.combined_coverage(ctx),
            "search finished"
        );
        Ok(())
    }

    fn evaluate(&mut self, id: ChromosomeId, ctx: &mut X) -> f64 {
        if let Some(score) = self.arena.score(id) {
            return score.raw[0];
        }
        let coverage = self.oracle.coverage(self.arena.value_mut(id), ctx);
        let length = self.arena.value(id).len();
        self.arena.set_score(
            id,
            Score {
                raw: vec![coverage],
                oriented: vec![coverage],
                length,
            },
        );
        self.progress.evaluations += 1;
        coverage
    }

    fn coverage_of(&self, id: ChromosomeId) -> f64 {
        self.arena
            .score(id)
            .and_then(|s| s.raw.first().copied())
            .unwrap_or(0.0)
    }

    pub fn corpus(&self) -> &[ChromosomeId] {
        &self.corpus
    }

    pub fn crashes(&self) -> &[ChromosomeId] {
        &self.crashes
    }

    pub fn arena(&self) -> &ChromosomeArena<T> {
        &self.arena
    }

    pub fn progress(&self) -> &SearchProgress {
        &self.progress
    }
}
