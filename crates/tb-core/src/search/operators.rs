//! Variation operators: chromosome factories, crossover and mutation.
//!
//! All operators receive the engine's RNG and the campaign context; plain
//! closures with matching signatures implement the traits.

use rand::rngs::StdRng;

pub trait ChromosomeFactory<T, X> {
    fn create(&mut self, rng: &mut StdRng, ctx: &mut X) -> T;
}

impl<T, X, F> ChromosomeFactory<T, X> for F
where
    F: FnMut(&mut StdRng, &mut X) -> T,
{
    fn create(&mut self, rng: &mut StdRng, ctx: &mut X) -> T {
        self(rng, ctx)
    }
}

pub trait Crossover<T, X> {
    fn crossover(&self, a: &T, b: &T, rng: &mut StdRng, ctx: &mut X) -> (T, T);
}

impl<T, X, F> Crossover<T, X> for F
where
    F: Fn(&T, &T, &mut StdRng, &mut X) -> (T, T),
{
    fn crossover(&self, a: &T, b: &T, rng: &mut StdRng, ctx: &mut X) -> (T, T) {
        self(a, b, rng, ctx)
    }
}

pub trait Mutation<T, X> {
    fn mutate(&self, value: &T, rng: &mut StdRng, ctx: &mut X) -> T;
}

impl<T, X, F> Mutation<T, X> for F
where
    F: Fn(&T, &mut StdRng, &mut X) -> T,
{
    fn mutate(&self, value: &T, rng: &mut StdRng, ctx: &mut X) -> T {
        self(value, rng, ctx)
    }
}
