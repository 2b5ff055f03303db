//! The meadow: a fixed 2D grid of patches, fenced or toroidal.

use crate::bunny::Bunny;
use crate::patch::Patch;
use meadow_core::{BunnyId, Direction, MeadowConfig, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meadow {
    pub width: i32,
    pub height: i32,
    pub wraps: bool,
    growth_rate: f64,
    patches: Vec<Patch>,
}

impl Meadow {
    /// Create a meadow with every patch at `starting_resource`
    pub fn from_config(config: &MeadowConfig) -> Self {
        assert!(config.width > 0 && config.height > 0, "meadow must not be empty");
        let size = config.width as usize * config.height as usize;
        Self {
            width: config.width,
            height: config.height,
            wraps: config.wraps,
            growth_rate: config.growth_rate,
            patches: vec![Patch::new(config.starting_resource, config.max_resource); size],
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    /// Get the patch at a position. Out-of-range positions panic.
    pub fn patch(&self, pos: Position) -> &Patch {
        let index = self.pos_to_index(pos);
        &self.patches[index]
    }

    /// Get the mutable patch at a position. Out-of-range positions panic.
    pub fn patch_mut(&mut self, pos: Position) -> &mut Patch {
        let index = self.pos_to_index(pos);
        &mut self.patches[index]
    }

    /// The neighbor one step away in `direction`, or `None` if that would
    /// leave a fenced meadow.
    pub fn neighbor(&self, pos: Position, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.to_delta();
        let candidate = pos.add(dx, dy);
        if self.wraps {
            Some(candidate.wrap(self.width, self.height))
        } else if self.contains(candidate) {
            Some(candidate)
        } else {
            None
        }
    }

    /// Valid neighbors in direction order (N, NE, E, SE, S, SW, W, NW)
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::all()
            .into_iter()
            .filter_map(move |direction| self.neighbor(pos, direction))
    }

    /// Put a newly created bunny on the patch at its position.
    pub fn place(&mut self, bunny: &Bunny) {
        self.patch_mut(bunny.position).move_in(bunny.id);
    }

    /// Take a bunny off the patch at `pos`.
    pub fn remove(&mut self, id: BunnyId, pos: Position) {
        self.patch_mut(pos).move_out(id);
    }

    /// Move a bunny between patches and update its position in one step.
    pub fn move_bunny(&mut self, bunny: &mut Bunny, to: Position) {
        // Validate the destination before touching the source patch.
        let to_index = self.pos_to_index(to);
        self.patch_mut(bunny.position).move_out(bunny.id);
        self.patches[to_index].move_in(bunny.id);
        bunny.position = to;
    }

    /// Grow the greens on every patch
    pub fn grow_all(&mut self) {
        let rate = self.growth_rate;
        for patch in &mut self.patches {
            patch.grow(rate);
        }
    }

    pub fn total_resource(&self) -> f64 {
        self.patches.iter().map(Patch::resource).sum()
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        assert!(
            self.contains(pos),
            "position {pos} outside {}x{} meadow",
            self.width,
            self.height
        );
        (pos.y * self.width + pos.x) as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all patches with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Patch)> + '_ {
        self.patches
            .iter()
            .enumerate()
            .map(move |(i, patch)| (self.index_to_pos(i), patch))
    }
}
