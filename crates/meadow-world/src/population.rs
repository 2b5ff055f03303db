//! The bunny registry. Owns every bunny; patches only hold ids.

use crate::bunny::Bunny;
use meadow_core::{BunnyConfig, BunnyId, Position, Sex, Tick};
use rand::Rng;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Population {
    bunnies: BTreeMap<BunnyId, Bunny>,
    last_id: u64,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bunny with the next id. Draws the sex (unless given), then the
    /// hop budget, then the lifespan.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        config: &BunnyConfig,
        birth_time: Tick,
        position: Position,
        energy: f64,
        sex: Option<Sex>,
    ) -> &Bunny {
        let sex = sex.unwrap_or_else(|| random_sex(rng));
        let hop_budget = rng.gen_range(config.min_hops..=config.max_hops);
        let lifespan = rng.gen_range(config.min_lifespan..=config.max_lifespan);

        self.last_id += 1;
        let id = BunnyId(self.last_id);
        let bunny = Bunny::new(id, birth_time, position, energy, sex, hop_budget, lifespan);
        self.bunnies.entry(id).or_insert(bunny)
    }

    pub fn get(&self, id: BunnyId) -> Option<&Bunny> {
        self.bunnies.get(&id)
    }

    pub fn get_mut(&mut self, id: BunnyId) -> Option<&mut Bunny> {
        self.bunnies.get_mut(&id)
    }

    pub fn remove(&mut self, id: BunnyId) -> Option<Bunny> {
        self.bunnies.remove(&id)
    }

    /// Ids of living bunnies, oldest (lowest id) first
    pub fn alive_ids(&self) -> Vec<BunnyId> {
        self.alive().map(|bunny| bunny.id).collect()
    }

    /// Ids of registered bunnies whose energy has run out
    pub fn dead_ids(&self) -> Vec<BunnyId> {
        self.iter()
            .filter(|bunny| !bunny.is_alive())
            .map(|bunny| bunny.id)
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    pub fn alive(&self) -> impl Iterator<Item = &Bunny> + '_ {
        self.iter().filter(|bunny| bunny.is_alive())
    }

    /// Every registered bunny in id order, including any not yet cleaned up
    pub fn iter(&self) -> impl Iterator<Item = &Bunny> + '_ {
        self.bunnies.values()
    }
}

fn random_sex<R: Rng + ?Sized>(rng: &mut R) -> Sex {
    if rng.gen_bool(0.5) {
        Sex::Male
    } else {
        Sex::Female
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = BunnyConfig::default();
        let mut population = Population::new();

        let first = population
            .spawn(&mut rng, &config, 0, Position::new(0, 0), 100.0, Some(Sex::Male))
            .id;
        let second = population
            .spawn(&mut rng, &config, 0, Position::new(0, 0), 100.0, None)
            .id;
        assert_eq!(first, BunnyId(1));
        assert_eq!(second, BunnyId(2));

        population.remove(second);
        let third = population
            .spawn(&mut rng, &config, 0, Position::new(0, 0), 100.0, None)
            .id;
        assert_eq!(third, BunnyId(3));
        assert_eq!(population.iter().count(), 2);
    }

    #[test]
    fn test_drawn_traits_within_config() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = BunnyConfig::default();
        let mut population = Population::new();

        for _ in 0..100 {
            let bunny = population.spawn(&mut rng, &config, 3, Position::new(1, 1), 40.0, None);
            assert!((config.min_hops..=config.max_hops).contains(&bunny.hop_budget));
            assert!((config.min_lifespan..=config.max_lifespan).contains(&bunny.lifespan));
            assert_eq!(bunny.birth_time, 3);
            assert_eq!(bunny.last_mate_time, 3);
        }

        let males = population.iter().filter(|b| b.sex == Sex::Male).count();
        assert!(males > 20 && males < 80);
    }

    #[test]
    fn test_alive_and_dead_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let config = BunnyConfig::default();
        let mut population = Population::new();
        for _ in 0..4 {
            population.spawn(&mut rng, &config, 0, Position::new(0, 0), 10.0, None);
        }
        population.get_mut(BunnyId(2)).unwrap().energy = 0.0;
        population.get_mut(BunnyId(4)).unwrap().energy = -5.0;

        assert_eq!(population.alive_ids(), vec![BunnyId(1), BunnyId(3)]);
        assert_eq!(population.dead_ids(), vec![BunnyId(2), BunnyId(4)]);
        assert_eq!(population.alive_count(), 2);
    }
}
