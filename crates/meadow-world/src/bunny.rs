//! Bunny state and per-tick behavior.

use crate::meadow::Meadow;
use crate::patch::Patch;
use crate::weighted::WeightedTable;
use meadow_core::{BunnyId, Position, Sex, Tick};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::iter;
use tracing::trace;

/// A bunny in the meadow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bunny {
    pub id: BunnyId,
    pub birth_time: Tick,
    pub position: Position,
    pub energy: f64,
    pub sex: Sex,
    pub last_mate_time: Tick,
    /// Hops taken every tick, fixed at birth
    pub hop_budget: u32,
    /// Natural lifespan in ticks, fixed at birth
    pub lifespan: Tick,
}

impl Bunny {
    /// A bunny born at `birth_time`. It counts as having last mated at birth.
    pub fn new(
        id: BunnyId,
        birth_time: Tick,
        position: Position,
        energy: f64,
        sex: Sex,
        hop_budget: u32,
        lifespan: Tick,
    ) -> Self {
        Self {
            id,
            birth_time,
            position,
            energy,
            sex,
            last_mate_time: birth_time,
            hop_budget,
            lifespan,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    pub fn age(&self, tick: Tick) -> Tick {
        tick - self.birth_time
    }

    /// Whether the mating cooldown has elapsed by `tick`
    pub fn ready_to_mate(&self, tick: Tick, cooldown: Tick) -> bool {
        self.last_mate_time + cooldown <= tick
    }

    // It never stops.
    pub fn apply_hunger(&mut self, cost: f64) {
        debug_assert!(self.is_alive(), "dead bunny {} got hungry", self.id);
        self.energy -= cost;
    }

    /// Hop to the current patch or one of its neighbors, favoring greener
    /// patches. Returns true if the bunny changed patch.
    pub fn hop<R: Rng + ?Sized>(&mut self, meadow: &mut Meadow, rng: &mut R) -> bool {
        debug_assert!(self.is_alive(), "dead bunny {} tried to hop", self.id);
        let here = self.position;
        let options: Vec<Position> = iter::once(here).chain(meadow.neighbors(here)).collect();

        let Some(table) =
            WeightedTable::new(options.iter().map(|&pos| hop_weight(meadow.patch(pos))))
        else {
            return false;
        };
        let choice = options[table.sample(rng)];

        if choice == here {
            trace!(bunny_id = %self.id, x = here.x, y = here.y, "Bunny stayed put");
            return false;
        }

        meadow.move_bunny(self, choice);
        trace!(
            bunny_id = %self.id,
            from_x = here.x,
            from_y = here.y,
            to_x = choice.x,
            to_y = choice.y,
            "Bunny hopped"
        );
        true
    }

    /// Eat whatever greens are here, up to `appetite`. Returns the amount eaten.
    pub fn eat(&mut self, meadow: &mut Meadow, appetite: f64) -> f64 {
        debug_assert!(self.is_alive(), "dead bunny {} tried to eat", self.id);
        let eaten = meadow.patch_mut(self.position).consume(appetite);
        self.energy += eaten;
        eaten
    }

    /// Kill the bunny if it has outlived its lifespan. Returns true if it died now.
    pub fn maybe_die_of_age(&mut self, tick: Tick) -> bool {
        if self.birth_time + self.lifespan >= tick {
            return false;
        }
        let was_alive = self.is_alive();
        self.energy = 0.0;
        was_alive
    }
}

/// Hop weight of a patch: whole greens squared, plus one so bare patches stay possible.
pub fn hop_weight(patch: &Patch) -> u64 {
    let greens = patch.resource().floor() as u64;
    greens.saturating_mul(greens).saturating_add(1)
}
