//! Variation operators for action-sequence test cases.

use super::campaign::Campaign;
use super::case::TestCase;
use crate::search::{ChromosomeFactory, Crossover, Mutation};
use crate::target::Target;
use rand::rngs::StdRng;
use rand::Rng;

/// Random exploration from a fresh launch, between 1 and `max_length` actions.
#[derive(Debug, Clone, Copy)]
pub struct RandomTestCaseFactory {
    pub max_length: usize,
}

impl<T: Target> ChromosomeFactory<TestCase<T::Action>, Campaign<T>> for RandomTestCaseFactory {
    fn create(&mut self, rng: &mut StdRng, campaign: &mut Campaign<T>) -> TestCase<T::Action> {
        let length = rng.random_range(1..=self.max_length.max(1));
        campaign.explore(&[], length, rng)
    }
}

/// Cut-and-splice: head of one parent joined to the tail of the other, at
/// independent cut points. Children are truncated to `max_length`.
#[derive(Debug, Clone, Copy)]
pub struct SinglePointCrossover {
    pub max_length: usize,
}

impl<T: Target> Crossover<TestCase<T::Action>, Campaign<T>> for SinglePointCrossover {
    fn crossover(
        &self,
        a: &TestCase<T::Action>,
        b: &TestCase<T::Action>,
        rng: &mut StdRng,
        _campaign: &mut Campaign<T>,
    ) -> (TestCase<T::Action>, TestCase<T::Action>) {
        let (a, b) = (a.actions(), b.actions());
        let cut_a = rng.random_range(0..=a.len());
        let cut_b = rng.random_range(0..=b.len());
        (
            TestCase::new(splice(&a[..cut_a], &b[cut_b..], self.max_length)),
            TestCase::new(splice(&b[..cut_b], &a[cut_a..], self.max_length)),
        )
    }
}

fn splice<A: Clone>(head: &[A], tail: &[A], max_length: usize) -> Vec<A> {
    head.iter().chain(tail).take(max_length).cloned().collect()
}

/// Keep a random prefix and replace the rest with fresh random exploration.
#[derive(Debug, Clone, Copy)]
pub struct CutPointMutation {
    pub max_length: usize,
}

impl<T: Target> Mutation<TestCase<T::Action>, Campaign<T>> for CutPointMutation {
    fn mutate(
        &self,
        value: &TestCase<T::Action>,
        rng: &mut StdRng,
        campaign: &mut Campaign<T>,
    ) -> TestCase<T::Action> {
        let actions = value.actions();
        let cut = rng.random_range(0..=actions.len().min(self.max_length.saturating_sub(1)));
        let room = self.max_length.saturating_sub(cut).max(1);
        let tail = rng.random_range(1..=room);
        campaign.explore(&actions[..cut], tail, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Phenotype;
    use crate::test_utils::FakeApp;
    use rand::SeedableRng;
    use tb_config::SearchConfig;

    fn campaign() -> Campaign<FakeApp> {
        Campaign::new(FakeApp::chain(5), &SearchConfig::default(), 3).unwrap()
    }

    #[test]
    fn test_splice_truncates() {
        assert_eq!(splice(&[1, 2], &[3, 4, 5], 4), vec![1, 2, 3, 4]);
        assert_eq!(splice::<u8>(&[], &[], 4), Vec::<u8>::new());
    }

    #[test]
    fn test_crossover_preserves_genes() {
        let mut campaign = campaign();
        let mut rng = StdRng::seed_from_u64(8);
        let a = TestCase::new(vec![FakeApp::NEXT; 4]);
        let b = TestCase::new(vec![FakeApp::HOME; 3]);
        let op = SinglePointCrossover { max_length: 50 };
        for _ in 0..20 {
            let (c, d) = op.crossover(&a, &b, &mut rng, &mut campaign);
            assert_eq!(c.len() + d.len(), 7);
            assert!(!c.is_executed() && !d.is_executed());
            // Head from the first parent, tail from the second.
            assert!(c
                .actions()
                .windows(2)
                .all(|w| !(w[0] == FakeApp::HOME && w[1] == FakeApp::NEXT)));
        }
    }

    #[test]
    fn test_factory_and_mutation_respect_max_length() {
        let mut campaign = campaign();
        let mut rng = StdRng::seed_from_u64(2);
        let mut factory = RandomTestCaseFactory { max_length: 6 };
        let mutation = CutPointMutation { max_length: 6 };
        for _ in 0..10 {
            let case = factory.create(&mut rng, &mut campaign);
            assert!((1..=6).contains(&case.len()));
            assert!(case.is_executed());
            let mutant = mutation.mutate(&case, &mut rng, &mut campaign);
            assert!((1..=6).contains(&mutant.len()));
            assert!(mutant.is_executed());
        }
    }
}
