//! Simulation engine for running the meadow.

use crate::bunny::Bunny;
use crate::mating::try_mate;
use crate::meadow::Meadow;
use crate::population::Population;
use meadow_core::{BunnyId, Position, Result, Sex, SimulationConfig, Tick};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, event, info, instrument, Level};

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: Tick,
    /// Living bunnies at the end of the tick
    pub population: usize,
    pub births: u64,
    /// Dead bunnies cleared from the meadow at the start of the tick
    pub deaths: u64,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// All the bunnies in the meadow died
    Extinct,
    /// The stop signal was raised between ticks
    Stopped,
    /// The configured tick limit was reached
    TickLimit,
}

pub struct Simulation {
    meadow: Meadow,
    population: Population,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    tick: Tick,
    population_series: Vec<usize>,
    peak_population: usize,
    peak_tick: Tick,
    total_births: u64,
    total_deaths: u64,
    // Mating tracking for metrics
    mating_draws: u64,
    matings: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut meadow = Meadow::from_config(&config.meadow);
        let mut population = Population::new();

        // Seed bunnies count as born one cooldown ago, so they may mate at once.
        let born = -config.bunny.mating_cooldown;
        let seeds = std::iter::repeat(Sex::Male)
            .take(config.bunny.starting_males as usize)
            .chain(std::iter::repeat(Sex::Female).take(config.bunny.starting_females as usize));
        for sex in seeds {
            let x = rng.gen_range(0..meadow.width);
            let y = rng.gen_range(0..meadow.height);
            let bunny = population.spawn(
                &mut rng,
                &config.bunny,
                born,
                Position::new(x, y),
                config.bunny.starting_energy,
                Some(sex),
            );
            meadow.place(bunny);
        }

        let initial = population.alive_count();
        Ok(Self {
            meadow,
            population,
            config,
            rng,
            tick: 0,
            population_series: Vec::new(),
            peak_population: initial,
            peak_tick: 0,
            total_births: 0,
            total_deaths: 0,
            mating_draws: 0,
            matings: 0,
        })
    }

    /// Run until extinction, the stop signal, or the tick limit
    pub fn run(&mut self, stop: &AtomicBool) -> SimulationResult {
        self.run_with(stop, |_, _| {})
    }

    /// Like [`Simulation::run`], calling `observer` after every tick.
    #[instrument(skip(self, stop, observer), fields(seed = self.config.seed))]
    pub fn run_with<F>(&mut self, stop: &AtomicBool, mut observer: F) -> SimulationResult
    where
        F: FnMut(&TickReport, &Simulation),
    {
        info!(
            event = "run_start",
            width = self.meadow.width,
            height = self.meadow.height,
            wraps = self.meadow.wraps,
            population = self.population(),
            max_ticks = ?self.config.max_ticks,
            "Starting meadow simulation"
        );

        let outcome = loop {
            if self.population() == 0 {
                break RunOutcome::Extinct;
            }
            if stop.load(Ordering::Relaxed) {
                break RunOutcome::Stopped;
            }
            if self
                .config
                .max_ticks
                .is_some_and(|max| u64::try_from(self.tick).is_ok_and(|tick| tick >= max))
            {
                break RunOutcome::TickLimit;
            }

            let report = self.step();
            observer(&report, &*self);
        };

        let result = self.collect_results(outcome);
        self.emit_run_summary(&result);
        result
    }

    /// Advance the meadow by one tick
    pub fn step(&mut self) -> TickReport {
        let tick = self.tick;

        // Grow the greens and clear away the dead
        self.meadow.grow_all();
        let deaths = self.remove_dead_bunnies();

        // Everyone alive now acts, oldest first
        let births_before = self.total_births;
        for id in self.population.alive_ids() {
            self.process_bunny(id);
        }

        let population = self.population();
        self.population_series.push(population);
        if population > self.peak_population {
            self.peak_population = population;
            self.peak_tick = tick;
        }

        let report = TickReport {
            tick,
            population,
            births: self.total_births - births_before,
            deaths,
        };

        let interval = self.config.progress_interval;
        if interval > 0 && tick % interval as Tick == 0 {
            self.emit_population_metrics(&report);
        }

        self.tick += 1;
        report
    }

    fn process_bunny(&mut self, id: BunnyId) {
        let tick = self.tick;
        let bunny_config = &self.config.bunny;

        let Some(bunny) = self.population.get_mut(id) else {
            return;
        };
        // Only bunnies alive at the snapshot get here, and nothing another
        // bunny does can kill them.
        if !bunny.is_alive() {
            return;
        }

        bunny.apply_hunger(bunny_config.hunger);
        if bunny.is_alive() {
            for _ in 0..bunny.hop_budget {
                if let Some(bunny) = self.population.get_mut(id) {
                    bunny.hop(&mut self.meadow, &mut self.rng);
                }

                let attempt = try_mate(
                    &mut self.population,
                    &mut self.meadow,
                    id,
                    tick,
                    bunny_config,
                    &mut self.rng,
                );
                self.mating_draws += u64::from(attempt.draws);
                if let Some(mating) = attempt.mating {
                    self.matings += 1;
                    self.total_births += mating.litter.len() as u64;
                }
            }

            if let Some(bunny) = self.population.get_mut(id) {
                bunny.eat(&mut self.meadow, bunny_config.hunger);
            }
        }

        if let Some(bunny) = self.population.get_mut(id) {
            if bunny.maybe_die_of_age(tick) {
                debug!(
                    event = "bunny_died_of_age",
                    bunny_id = %id,
                    age = bunny.age(tick),
                    lifespan = bunny.lifespan,
                    tick,
                    "Bunny died of old age"
                );
            }
        }
    }

    fn remove_dead_bunnies(&mut self) -> u64 {
        let dead = self.population.dead_ids();
        let count = dead.len() as u64;

        for id in dead {
            if let Some(bunny) = self.population.remove(id) {
                self.meadow.remove(id, bunny.position);
                debug!(
                    event = "bunny_removed",
                    bunny_id = %id,
                    sex = %bunny.sex,
                    birth_time = bunny.birth_time,
                    age = bunny.age(self.tick),
                    x = bunny.position.x,
                    y = bunny.position.y,
                    tick = self.tick,
                    "Dead bunny cleared from the meadow"
                );
            }
        }

        self.total_deaths += count;
        count
    }

    /// Emit a population metrics snapshot
    fn emit_population_metrics(&self, report: &TickReport) {
        let energies: Vec<f64> = self.population.alive().map(|b| b.energy).collect();
        let avg_energy = if energies.is_empty() {
            0.0
        } else {
            energies.iter().sum::<f64>() / energies.len() as f64
        };
        let males = self
            .population
            .alive()
            .filter(|b| b.sex == Sex::Male)
            .count();
        let occupied = self.meadow.iter().filter(|(_, p)| !p.is_empty()).count();

        info!(
            event = "population_metrics",
            tick = report.tick,
            total_population = report.population,
            males,
            females = report.population - males,
            births = report.births,
            deaths = report.deaths,
            avg_energy = format!("{:.2}", avg_energy),
            occupied_patches = occupied,
            total_resource = format!("{:.1}", self.meadow.total_resource()),
            mating_draws = self.mating_draws,
            matings = self.matings,
            "Population metrics snapshot"
        );

        event!(
            Level::INFO,
            gauge_name = "population_total",
            gauge_value = report.population,
            tick = report.tick,
            "Population gauge"
        );
    }

    /// Emit the end-of-run summary
    fn emit_run_summary(&self, result: &SimulationResult) {
        let mating_rate = if self.mating_draws > 0 {
            (self.matings as f64 / self.mating_draws as f64) * 100.0
        } else {
            0.0
        };

        info!(
            event = "run_summary",
            outcome = ?result.outcome,
            final_tick = result.final_tick,
            peak_population = result.peak_population,
            peak_tick = result.peak_tick,
            total_births = result.total_births,
            total_deaths = result.total_deaths,
            survivors = result.survivors.len(),
            mating_draws = self.mating_draws,
            matings = self.matings,
            mating_success_rate = format!("{:.2}%", mating_rate),
            "🏁 Run complete"
        );
    }

    fn collect_results(&self, outcome: RunOutcome) -> SimulationResult {
        SimulationResult {
            outcome,
            final_tick: self.tick,
            population_series: self.population_series.clone(),
            peak_population: self.peak_population,
            peak_tick: self.peak_tick,
            total_births: self.total_births,
            total_deaths: self.total_deaths,
            survivors: self.population.alive().cloned().collect(),
        }
    }

    /// Ticks completed so far
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Living bunnies right now
    pub fn population(&self) -> usize {
        self.population.alive_count()
    }

    pub fn meadow(&self) -> &Meadow {
        &self.meadow
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn bunny(&self, id: BunnyId) -> Option<&Bunny> {
        self.population.get(id)
    }

    /// Every registered bunny in id order. Bunnies that died this tick stay
    /// listed until the next cleanup.
    pub fn bunnies(&self) -> impl Iterator<Item = &Bunny> + '_ {
        self.population.iter()
    }

    /// Sex of the first bunny on a patch, for highlighting
    pub fn representative_sex(&self, pos: Position) -> Option<Sex> {
        self.meadow
            .patch(pos)
            .first_occupant()
            .and_then(|id| self.population.get(id))
            .map(|bunny| bunny.sex)
    }

    /// Population at the end of each completed tick
    pub fn population_series(&self) -> &[usize] {
        &self.population_series
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub outcome: RunOutcome,
    pub final_tick: Tick,
    pub population_series: Vec<usize>,
    pub peak_population: usize,
    pub peak_tick: Tick,
    pub total_births: u64,
    pub total_deaths: u64,
    pub survivors: Vec<Bunny>,
}
