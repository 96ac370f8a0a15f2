//! Generational genetic engine.
//!
//! Each generation grows the current population to `big_population_size`
//! with offspring (selection, crossover with probability `p_crossover`,
//! mutation of each offspring with probability `p_mutate`) and then lets
//! the survivor selection shrink it back to `population_size`.

use super::archive::Archive;
use super::chromosome::{ChromosomeArena, Lineage, Phenotype};
use super::fitness::FitnessFunction;
use super::operators::{ChromosomeFactory, Crossover, Mutation};
use super::selection::{SelectionFunction, Tournament};
use super::survivor::{MostRecent, SurvivorSelection};
use super::termination::{AnyOf, SearchProgress, TerminationCondition};
use crate::logging::{event_names, Stage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tb_common::{ChromosomeId, Error, Result};
use tb_config::GeneticParams;

pub struct GeneticEngine<T, X> {
    population_size: usize,
    big_population_size: usize,
    p_crossover: f64,
    p_mutate: f64,
    arena: ChromosomeArena<T>,
    population: Vec<ChromosomeId>,
    rng: StdRng,
    factory: Box<dyn ChromosomeFactory<T, X>>,
    crossover: Box<dyn Crossover<T, X>>,
    mutation: Box<dyn Mutation<T, X>>,
    objectives: Vec<Box<dyn FitnessFunction<T, X>>>,
    selection: Box<dyn SelectionFunction<T>>,
    survivor: Box<dyn SurvivorSelection<T>>,
    termination: Box<dyn TerminationCondition>,
    archive: Archive,
    progress: SearchProgress,
}

impl<T, X> GeneticEngine<T, X>
where
    T: Phenotype + Clone,
{
    /// Engine with tournament selection, most-recent survivors and the
    /// generation/time limits of `params`.
    pub fn new(
        params: &GeneticParams,
        seed: u64,
        factory: impl ChromosomeFactory<T, X> + 'static,
        crossover: impl Crossover<T, X> + 'static,
        mutation: impl Mutation<T, X> + 'static,
        objectives: Vec<Box<dyn FitnessFunction<T, X>>>,
    ) -> Result<Self> {
        if params.population_size == 0 {
            return Err(Error::InvalidSearchConfig(
                "population_size must be positive".to_string(),
            ));
        }
        if params.big_population_size < params.population_size {
            return Err(Error::InvalidSearchConfig(format!(
                "big_population_size ({}) is smaller than population_size ({})",
                params.big_population_size, params.population_size
            )));
        }
        for (name, p) in [("p_crossover", params.p_crossover), ("p_mutate", params.p_mutate)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidSearchConfig(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }
        if objectives.is_empty() {
            return Err(Error::InvalidSearchConfig(
                "at least one fitness function is required".to_string(),
            ));
        }

        Ok(Self {
            population_size: params.population_size,
            big_population_size: params.big_population_size,
            p_crossover: params.p_crossover,
            p_mutate: params.p_mutate,
            arena: ChromosomeArena::new(),
            population: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            factory: Box::new(factory),
            crossover: Box::new(crossover),
            mutation: Box::new(mutation),
            archive: Archive::new(objectives.len()),
            objectives,
            selection: Box::new(Tournament::new(params.tournament_size)),
            survivor: Box::new(MostRecent),
            termination: Box::new(AnyOf::from_limits(
                params.max_generations,
                params.max_seconds,
            )),
            progress: SearchProgress::start(),
        })
    }

    pub fn with_selection(mut self, selection: impl SelectionFunction<T> + 'static) -> Self {
        self.selection = Box::new(selection);
        self
    }

    pub fn with_survivor(mut self, survivor: impl SurvivorSelection<T> + 'static) -> Self {
        self.survivor = Box::new(survivor);
        self
    }

    pub fn with_termination(mut self, termination: impl TerminationCondition + 'static) -> Self {
        self.termination = Box::new(termination);
        self
    }

    /// Fill the population with `population_size` fresh individuals.
    pub fn create_initial_population(&mut self, ctx: &mut X) {
        self.population = (0..self.population_size)
            .map(|_| {
                let value = self.factory.create(&mut self.rng, ctx);
                self.arena.alloc(value, Lineage::initial())
            })
            .collect();
        let ids = self.population.clone();
        self.evaluate(&ids, ctx);
        for &id in &ids {
            self.archive.offer(&self.arena, id);
        }
        tracing::debug!(
            event = event_names::POPULATION_CREATED,
            stage = %Stage::Evolve,
            size = self.population.len(),
            "initial population created"
        );
    }

    /// Produce the next generation.
    pub fn evolve(&mut self, ctx: &mut X) -> Result<()> {
        if self.population.is_empty() {
            return Err(Error::EmptyPopulation(
                "evolve requires an initial population".to_string(),
            ));
        }
        let current = self.population.clone();
        self.evaluate(&current, ctx);
        self.selection.prepare(&mut self.arena, &current);

        let mut next = current.clone();
        while next.len() < self.big_population_size {
            let p1 = self.selection.select(&self.arena, &current, &mut self.rng);
            let p2 = self.selection.select(&self.arena, &current, &mut self.rng);

            let offspring: Vec<(Option<T>, Lineage)> = if self.rng.random_bool(self.p_crossover) {
                let (a, b) = self.crossover.crossover(
                    self.arena.value(p1),
                    self.arena.value(p2),
                    &mut self.rng,
                    ctx,
                );
                let lineage = Lineage {
                    parents: vec![p1, p2],
                    crossed: true,
                    mutated: false,
                };
                vec![(Some(a), lineage.clone()), (Some(b), lineage)]
            } else {
                vec![(None, lineage_of(p1)), (None, lineage_of(p2))]
            };

            for (value, mut lineage) in offspring {
                if next.len() >= self.big_population_size {
                    break;
                }
                let mutate = self.rng.random_bool(self.p_mutate);
                let id = match (value, mutate) {
                    (Some(value), false) => self.arena.alloc(value, lineage),
                    (Some(value), true) => {
                        let mutant = self.mutation.mutate(&value, &mut self.rng, ctx);
                        lineage.mutated = true;
                        self.arena.alloc(mutant, lineage)
                    }
                    (None, false) => self.arena.duplicate(lineage.parents[0]),
                    (None, true) => {
                        let parent = lineage.parents[0];
                        let mutant =
                            self.mutation
                                .mutate(self.arena.value(parent), &mut self.rng, ctx);
                        lineage.mutated = true;
                        self.arena.alloc(mutant, lineage)
                    }
                };
                next.push(id);
            }
        }

        if self.survivor.needs_scores() {
            self.evaluate(&next, ctx);
        }
        self.population = self
            .survivor
            .survive(&mut self.arena, next, self.population_size);

        let survivors = self.population.clone();
        self.evaluate(&survivors, ctx);
        let mut archive_updated = false;
        for &id in &survivors {
            archive_updated |= self.archive.offer(&self.arena, id);
        }
        self.progress.iterations += 1;

        tracing::debug!(
            event = event_names::GENERATION_EVOLVED,
            stage = %Stage::Evolve,
            generation = self.progress.iterations,
            evaluations = self.progress.evaluations,
            population = self.population.len(),
            best = self.best_fitness(0),
            "generation evolved"
        );
        if archive_updated {
            tracing::trace!(
                event = event_names::ARCHIVE_UPDATED,
                archived = self.archive.len(),
                "archive improved"
            );
        }
        Ok(())
    }

    /// Create the initial population and evolve until termination.
    pub fn run(&mut self, ctx: &mut X) -> Result<()> {
        self.progress = SearchProgress::start();
        tracing::info!(
            event = event_names::SEARCH_STARTED,
            strategy = "genetic",
            population_size = self.population_size,
            big_population_size = self.big_population_size,
            objectives = self.objectives.len(),
            "search started"
        );

        self.create_initial_population(ctx);
        while !self.termination.should_stop(&self.progress) {
            self.evolve(ctx)?;
        }

        tracing::info!(
            event = event_names::SEARCH_FINISHED,
            strategy = "genetic",
            generations = self.progress.iterations,
            evaluations = self.progress.evaluations,
            archived = self.archive.len(),
            elapsed_ms = self.progress.elapsed().as_millis() as u64,
            "search finished"
        );
        Ok(())
    }

    fn evaluate(&mut self, ids: &[ChromosomeId], ctx: &mut X) {
        for &id in ids {
            if self.arena.evaluate(id, &self.objectives, ctx) {
                self.progress.evaluations += 1;
            }
        }
    }

    fn best_fitness(&self, objective: usize) -> Option<f64> {
        self.archive
            .best(objective)
            .and_then(|id| self.arena.score(id))
            .and_then(|s| s.raw.get(objective).copied())
    }

    pub fn population(&self) -> &[ChromosomeId] {
        &self.population
    }

    pub fn arena(&self) -> &ChromosomeArena<T> {
        &self.arena
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn progress(&self) -> &SearchProgress {
        &self.progress
    }

    pub fn value(&self, id: ChromosomeId) -> &T {
        self.arena.value(id)
    }
}

fn lineage_of(parent: ChromosomeId) -> Lineage {
    Lineage {
        parents: vec![parent],
        crossed: false,
        mutated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::fitness::Direction;
    use crate::search::survivor::{Elitist, NonDominated};
    use crate::search::selection::CrowdedTournament;
    use crate::search::termination::IterationLimit;

    /// Sum of genes, maximized.
    struct Sum;

    impl FitnessFunction<Vec<u32>, ()> for Sum {
        fn name(&self) -> &str {
            "sum"
        }

        fn fitness(&self, value: &mut Vec<u32>, _: &mut ()) -> f64 {
            value.iter().sum::<u32>() as f64
        }
    }

    /// Count of odd genes, minimized.
    struct Odd;

    impl FitnessFunction<Vec<u32>, ()> for Odd {
        fn name(&self) -> &str {
            "odd"
        }

        fn fitness(&self, value: &mut Vec<u32>, _: &mut ()) -> f64 {
            value.iter().filter(|g| *g % 2 == 1).count() as f64
        }

        fn direction(&self) -> Direction {
            Direction::Minimize
        }
    }

    fn factory(rng: &mut StdRng, _: &mut ()) -> Vec<u32> {
        (0..4).map(|_| rng.random_range(0..10)).collect()
    }

    fn splice(a: &Vec<u32>, b: &Vec<u32>, _: &mut StdRng, _: &mut ()) -> (Vec<u32>, Vec<u32>) {
        let cut = a.len().min(b.len()) / 2;
        let mut left = a[..cut].to_vec();
        left.extend_from_slice(&b[cut..]);
        let mut right = b[..cut].to_vec();
        right.extend_from_slice(&a[cut..]);
        (left, right)
    }

    fn bump(value: &Vec<u32>, rng: &mut StdRng, _: &mut ()) -> Vec<u32> {
        let mut out = value.clone();
        if !out.is_empty() {
            let i = rng.random_range(0..out.len());
            out[i] += 1;
        }
        out
    }

    fn params(population: usize, big: usize, p_crossover: f64, p_mutate: f64) -> GeneticParams {
        GeneticParams {
            population_size: population,
            big_population_size: big,
            p_crossover,
            p_mutate,
            max_generations: Some(1),
            ..GeneticParams::default()
        }
    }

    #[test]
    fn test_one_generation_of_pure_crossover() {
        let mut engine = GeneticEngine::new(
            &params(4, 8, 1.0, 0.0),
            42,
            factory,
            splice,
            bump,
            vec![Box::new(Sum) as Box<dyn FitnessFunction<Vec<u32>, ()>>],
        )
        .unwrap()
        .with_termination(IterationLimit(1));

        engine.run(&mut ()).unwrap();

        let initial: Vec<ChromosomeId> = (0..4).map(ChromosomeId).collect();
        assert_eq!(engine.population().len(), 4);
        assert_eq!(engine.progress().iterations, 1);
        for &id in engine.population() {
            let lineage = engine.arena().get(id).lineage();
            assert!(lineage.crossed, "{id} was not produced by crossover");
            assert!(!lineage.mutated);
            assert_eq!(lineage.parents.len(), 2);
            assert!(lineage.parents.iter().all(|p| initial.contains(p)));
        }
    }

    #[test]
    fn test_pass_through_without_crossover() {
        let mut engine = GeneticEngine::new(
            &params(3, 6, 0.0, 0.0),
            1,
            factory,
            splice,
            bump,
            vec![Box::new(Sum) as Box<dyn FitnessFunction<Vec<u32>, ()>>],
        )
        .unwrap();
        engine.create_initial_population(&mut ());
        engine.evolve(&mut ()).unwrap();
        for &id in engine.population() {
            let chromosome = engine.arena().get(id);
            let parent = chromosome.lineage().parents[0];
            assert_eq!(chromosome.value(), engine.value(parent));
            assert!(!chromosome.lineage().crossed);
        }
    }

    #[test]
    fn test_elitist_run_improves_fitness() {
        let mut engine = GeneticEngine::new(
            &params(6, 12, 0.7, 0.5),
            7,
            factory,
            splice,
            bump,
            vec![Box::new(Sum) as Box<dyn FitnessFunction<Vec<u32>, ()>>],
        )
        .unwrap()
        .with_survivor(Elitist::default())
        .with_termination(IterationLimit(20));

        engine.create_initial_population(&mut ());
        let best_before = engine.best_fitness(0).unwrap();
        while engine.progress().iterations < 20 {
            engine.evolve(&mut ()).unwrap();
        }
        assert!(engine.best_fitness(0).unwrap() > best_before);
        assert_eq!(engine.population().len(), 6);
    }

    #[test]
    fn test_nsga2_configuration() {
        let objectives: Vec<Box<dyn FitnessFunction<Vec<u32>, ()>>> = vec![Box::new(Sum), Box::new(Odd)];
        let mut engine = GeneticEngine::new(&params(6, 12, 0.9, 0.3), 3, factory, splice, bump, objectives)
            .unwrap()
            .with_selection(CrowdedTournament::default())
            .with_survivor(NonDominated)
            .with_termination(IterationLimit(5));
        engine.run(&mut ()).unwrap();
        assert_eq!(engine.population().len(), 6);
        assert!(engine.archive().best(0).is_some());
        assert!(engine.archive().best(1).is_some());
    }

    #[test]
    fn test_invalid_parameters() {
        let sum = || vec![Box::new(Sum) as Box<dyn FitnessFunction<Vec<u32>, ()>>];
        assert!(GeneticEngine::new(&params(0, 8, 0.5, 0.5), 0, factory, splice, bump, sum()).is_err());
        assert!(GeneticEngine::new(&params(8, 4, 0.5, 0.5), 0, factory, splice, bump, sum()).is_err());
        assert!(GeneticEngine::new(&params(4, 8, 1.5, 0.5), 0, factory, splice, bump, sum()).is_err());
        assert!(GeneticEngine::new(&params(4, 8, 0.5, 0.5), 0, factory, splice, bump, Vec::new()).is_err());
    }

    #[test]
    fn test_evolve_requires_population() {
        let mut engine = GeneticEngine::new(
            &params(4, 8, 0.5, 0.5),
            0,
            factory,
            splice,
            bump,
            vec![Box::new(Sum) as Box<dyn FitnessFunction<Vec<u32>, ()>>],
        )
        .unwrap();
        assert!(matches!(engine.evolve(&mut ()), Err(Error::EmptyPopulation(_))));
    }
}
