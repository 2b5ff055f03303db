//! Mating between bunnies that share a patch.

use crate::meadow::Meadow;
use crate::population::Population;
use meadow_core::{BunnyConfig, BunnyId, Tick};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A successful mating and the litter it produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mating {
    pub initiator: BunnyId,
    pub partner: BunnyId,
    pub litter: Vec<BunnyId>,
}

/// What one call to [`try_mate`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatingAttempt {
    /// Probability draws made against eligible partners
    pub draws: u32,
    pub mating: Option<Mating>,
}

/// Look for a partner on the initiator's patch and maybe produce a litter.
///
/// Occupants are scanned in arrival order from a copy of the list taken at
/// the start of the call. Every eligible partner gets one probability draw
/// until one succeeds; newborns are placed on the patch after the scan.
pub fn try_mate<R: Rng + ?Sized>(
    population: &mut Population,
    meadow: &mut Meadow,
    initiator: BunnyId,
    tick: Tick,
    config: &BunnyConfig,
    rng: &mut R,
) -> MatingAttempt {
    let mut attempt = MatingAttempt::default();

    let Some(bunny) = population.get(initiator) else {
        return attempt;
    };
    debug_assert!(bunny.is_alive(), "dead bunny {initiator} tried to mate");
    if !bunny.is_alive() || !bunny.ready_to_mate(tick, config.mating_cooldown) {
        return attempt;
    }
    let (position, sex, energy) = (bunny.position, bunny.sex, bunny.energy);

    let mut chance = config.mating_chance;
    if config.scale_mating_chance_with_energy {
        chance *= energy / config.starting_energy;
    }

    let occupants = meadow.patch(position).occupants().to_vec();
    for partner_id in occupants {
        let Some(partner) = population.get(partner_id) else {
            continue;
        };
        if !partner.is_alive()
            || partner.sex != sex.opposite()
            || !partner.ready_to_mate(tick, config.mating_cooldown)
        {
            continue;
        }
        let partner_energy = partner.energy;

        attempt.draws += 1;
        let roll: f64 = rng.gen();
        if roll >= chance {
            trace!(
                bunny_id = %initiator,
                partner_id = %partner_id,
                roll,
                chance,
                tick,
                "Mating attempt failed"
            );
            continue;
        }

        for id in [initiator, partner_id] {
            if let Some(parent) = population.get_mut(id) {
                parent.last_mate_time = tick;
            }
        }

        let litter_size = rng.gen_range(config.min_litter..=config.max_litter);
        let litter_energy = energy.max(partner_energy);
        let mut litter = Vec::with_capacity(litter_size as usize);
        for _ in 0..litter_size {
            let kit = population.spawn(rng, config, tick, position, litter_energy, None);
            meadow.place(kit);
            litter.push(kit.id);
        }

        debug!(
            event = "litter_born",
            bunny_id = %initiator,
            partner_id = %partner_id,
            litter_size,
            litter_energy,
            x = position.x,
            y = position.y,
            tick,
            "Litter born"
        );

        attempt.mating = Some(Mating {
            initiator,
            partner: partner_id,
            litter,
        });
        break;
    }

    attempt
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_core::{MeadowConfig, Position, Sex};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        population: Population,
        meadow: Meadow,
        config: BunnyConfig,
        rng: ChaCha8Rng,
    }

    impl Fixture {
        fn new(config: BunnyConfig) -> Self {
            Self {
                population: Population::new(),
                meadow: Meadow::from_config(&MeadowConfig {
                    width: 3,
                    height: 3,
                    ..Default::default()
                }),
                config,
                rng: ChaCha8Rng::seed_from_u64(21),
            }
        }

        fn add(&mut self, sex: Sex, energy: f64, born: Tick) -> BunnyId {
            let bunny = self.population.spawn(
                &mut self.rng,
                &self.config,
                born,
                Position::new(1, 1),
                energy,
                Some(sex),
            );
            self.meadow.place(bunny);
            bunny.id
        }

        fn mate(&mut self, id: BunnyId, tick: Tick) -> MatingAttempt {
            try_mate(
                &mut self.population,
                &mut self.meadow,
                id,
                tick,
                &self.config,
                &mut self.rng,
            )
        }
    }

    fn certain_config() -> BunnyConfig {
        BunnyConfig {
            mating_chance: 1.0,
            scale_mating_chance_with_energy: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_successful_mating_produces_litter() {
        let mut fx = Fixture::new(certain_config());
        let male = fx.add(Sex::Male, 60.0, -100);
        let female = fx.add(Sex::Female, 80.0, -100);

        let attempt = fx.mate(male, 0);
        let mating = attempt.mating.expect("mating should succeed");
        assert_eq!(attempt.draws, 1);
        assert_eq!(mating.partner, female);

        let size = mating.litter.len() as u32;
        assert!((fx.config.min_litter..=fx.config.max_litter).contains(&size));
        for kit in &mating.litter {
            let kit = fx.population.get(*kit).unwrap();
            assert_eq!(kit.energy, 80.0);
            assert_eq!(kit.birth_time, 0);
            assert_eq!(kit.position, Position::new(1, 1));
        }

        let occupants = fx.meadow.patch(Position::new(1, 1)).occupants();
        assert_eq!(occupants.len(), 2 + mating.litter.len());
        assert_eq!(&occupants[2..], mating.litter.as_slice());

        assert_eq!(fx.population.get(male).unwrap().last_mate_time, 0);
        assert_eq!(fx.population.get(female).unwrap().last_mate_time, 0);
    }

    #[test]
    fn test_cooldown_blocks_mating() {
        let mut fx = Fixture::new(certain_config());
        let male = fx.add(Sex::Male, 100.0, -100);
        fx.add(Sex::Female, 100.0, -100);

        assert!(fx.mate(male, 0).mating.is_some());
        for tick in 1..100 {
            let attempt = fx.mate(male, tick);
            assert!(attempt.mating.is_none());
            assert_eq!(attempt.draws, 0);
        }
        assert!(fx.mate(male, 100).mating.is_some());
    }

    #[test]
    fn test_partner_cooldown_blocks_mating() {
        let mut fx = Fixture::new(certain_config());
        let male = fx.add(Sex::Male, 100.0, -100);
        fx.add(Sex::Female, 100.0, 0);

        let attempt = fx.mate(male, 50);
        assert!(attempt.mating.is_none());
        assert_eq!(attempt.draws, 0);
    }

    #[test]
    fn test_same_sex_and_dead_partners_skipped() {
        let mut fx = Fixture::new(certain_config());
        let male = fx.add(Sex::Male, 100.0, -100);
        fx.add(Sex::Male, 100.0, -100);
        let dead = fx.add(Sex::Female, 100.0, -100);
        fx.population.get_mut(dead).unwrap().energy = 0.0;

        let attempt = fx.mate(male, 0);
        assert!(attempt.mating.is_none());
        assert_eq!(attempt.draws, 0);
    }

    #[test]
    fn test_failed_draw_moves_to_next_partner() {
        let mut config = certain_config();
        config.mating_chance = 0.5;
        let mut fx = Fixture::new(config);
        let female = fx.add(Sex::Female, 100.0, -100);
        for _ in 0..30 {
            fx.add(Sex::Male, 100.0, -100);
        }

        let attempt = fx.mate(female, 0);
        let mating = attempt.mating.expect("some partner should accept");
        // One draw per eligible partner up to and including the successful one.
        let position = fx
            .meadow
            .patch(Position::new(1, 1))
            .occupants()
            .iter()
            .position(|&id| id == mating.partner)
            .unwrap() as u32;
        assert_eq!(attempt.draws, position);
    }

    #[test]
    fn test_zero_chance_never_mates() {
        let mut config = certain_config();
        config.mating_chance = 0.0;
        let mut fx = Fixture::new(config);
        let male = fx.add(Sex::Male, 100.0, -100);
        fx.add(Sex::Female, 100.0, -100);
        fx.add(Sex::Female, 100.0, -100);

        let attempt = fx.mate(male, 0);
        assert!(attempt.mating.is_none());
        assert_eq!(attempt.draws, 2);
    }

    #[test]
    fn test_energy_scaling() {
        let config = BunnyConfig {
            mating_chance: 1.0,
            scale_mating_chance_with_energy: true,
            ..Default::default()
        };
        let mut fx = Fixture::new(config);
        // A nearly starved bunny has almost no chance.
        let male = fx.add(Sex::Male, 1e-9, -100);
        fx.add(Sex::Female, 100.0, -100);

        let mut matings = 0;
        for _ in 0..50 {
            if fx.mate(male, 0).mating.is_some() {
                matings += 1;
            }
        }
        assert_eq!(matings, 0);
    }
}
