//! Search engines and their building blocks.
//!
//! Both engines are generic over the phenotype `T` (anything with a
//! length) and an explicit campaign context `X` handed to every operator
//! and objective.

pub mod archive;
pub mod chromosome;
pub mod comparator;
pub mod fitness;
pub mod fuzzing;
pub mod genetic;
pub mod operators;
pub mod selection;
pub mod survivor;
pub mod termination;

pub use archive::Archive;
pub use chromosome::{Chromosome, ChromosomeArena, Lineage, Phenotype, Score};
pub use comparator::{crowding, dominance, dominates, fitness_then_length, Ranked};
pub use fitness::{orient, Direction, FitnessFunction};
pub use fuzzing::{energy, FuzzOracle, GreyBoxFuzzer};
pub use genetic::GeneticEngine;
pub use operators::{ChromosomeFactory, Crossover, Mutation};
pub use selection::{
    CrowdedTournament, FitnessProportionate, RandomSelection, SelectionFunction, Tournament,
};
pub use survivor::{assign_fronts, Elitist, MostRecent, NonDominated, SurvivorSelection};
pub use termination::{
    AnyOf, Deadline, EvaluationBudget, IterationLimit, SearchProgress, TerminationCondition,
};
