//! Wave director
//!
//! Walks the level script one phase at a time. Each phase owns a repeating
//! spawn timer and a one-shot duration timer; when the duration runs out both
//! are torn down (along with any staggered spawns still pending) and the next
//! phase starts. After the last phase of the last wave the director reports
//! the boss stage once and schedules nothing else.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::FrameEvent;
use super::timer::Timer;
use crate::consts::*;
use crate::ms_to_ticks;
use crate::tuning::{EnemyKind, SpawnPattern, WavePhase, WaveScript};

/// Swarm V-formation: sub-burst stagger and wing spacing
pub const SWARM_BURST_MS: u32 = 250;
pub const SWARM_WING_SPACING: f32 = 70.0;
/// Delay between the two halves of a heavy pair
pub const HEAVY_PAIR_MS: u32 = 400;
/// Horizontal half-gap for paired spawns
pub const PAIR_HALF_GAP: f32 = 90.0;

/// An enemy the orchestrator should create this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnOrder {
    pub kind: EnemyKind,
    pub pos: Vec2,
}

/// A phase that ran to completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub wave: u32,
    pub name: String,
    pub ticks: u32,
}

/// Output of one director tick
#[derive(Debug, Clone, Default)]
pub struct DirectorStep {
    pub spawns: Vec<SpawnOrder>,
    pub events: Vec<FrameEvent>,
    /// Set on the single tick the wave set is exhausted
    pub boss_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingSpawn {
    ticks_left: u32,
    order: SpawnOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveDirector {
    waves: Vec<WaveScript>,
    wave_index: usize,
    phase_index: usize,
    spawn_timer: Timer,
    phase_timer: Timer,
    phase_elapsed: u32,
    pending: Vec<PendingSpawn>,
    started: bool,
    finished: bool,
    completed: Vec<PhaseRecord>,
}

impl WaveDirector {
    pub fn new(waves: Vec<WaveScript>) -> Self {
        Self {
            waves,
            wave_index: 0,
            phase_index: 0,
            spawn_timer: Timer::inactive(),
            phase_timer: Timer::inactive(),
            phase_elapsed: 0,
            pending: Vec::new(),
            started: false,
            finished: false,
            completed: Vec::new(),
        }
    }

    /// Begin phase 0 of wave 0
    pub fn start(&mut self) -> DirectorStep {
        let mut step = DirectorStep::default();
        if self.started {
            return step;
        }
        self.started = true;
        self.wave_index = 0;
        self.phase_index = 0;
        self.enter_current(&mut step);
        step
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Wave number shown to the player (1-based); the last wave once finished
    pub fn wave_number(&self) -> u32 {
        let index = self.wave_index.min(self.waves.len().saturating_sub(1));
        self.waves.get(index).map(|w| w.number).unwrap_or(0)
    }

    pub fn current_phase(&self) -> Option<&WavePhase> {
        if self.finished || !self.started {
            return None;
        }
        self.waves.get(self.wave_index)?.phases.get(self.phase_index)
    }

    /// True while anything could still spawn
    pub fn has_scheduled_spawns(&self) -> bool {
        self.spawn_timer.is_active() || self.phase_timer.is_active() || !self.pending.is_empty()
    }

    pub fn completed_phases(&self) -> &[PhaseRecord] {
        &self.completed
    }

    /// Advance one tick
    pub fn step(&mut self, rng: &mut impl Rng) -> DirectorStep {
        let mut step = DirectorStep::default();
        if !self.started || self.finished {
            return step;
        }

        self.pending.retain_mut(|p| {
            p.ticks_left = p.ticks_left.saturating_sub(1);
            if p.ticks_left == 0 {
                step.spawns.push(p.order);
                false
            } else {
                true
            }
        });

        self.phase_elapsed += 1;
        if self.spawn_timer.tick() {
            if let Some(phase) = self.current_phase().cloned() {
                self.spawn_for_phase(&phase, rng, &mut step);
            }
        }

        if self.phase_timer.tick() {
            self.end_phase();
            self.phase_index += 1;
            self.enter_current(&mut step);
        }
        step
    }

    fn spawn_for_phase(&mut self, phase: &WavePhase, rng: &mut impl Rng, step: &mut DirectorStep) {
        let primary = EnemyKind::from_tag_or_default(&phase.enemy);
        self.schedule(primary, phase.pattern, 0, rng, step);

        if let Some(tag) = &phase.support {
            let support = EnemyKind::from_tag_or_default(tag);
            let delay = ms_to_ticks(phase.spawn_interval_ms) / 3;
            self.schedule(support, SpawnPattern::Solo, delay, rng, step);
        }
    }

    /// Lay out one spawn rule, starting `delay` ticks from now
    fn schedule(
        &mut self,
        kind: EnemyKind,
        pattern: SpawnPattern,
        delay: u32,
        rng: &mut impl Rng,
        step: &mut DirectorStep,
    ) {
        let lo = SPAWN_PADDING;
        let hi = ARENA_WIDTH - SPAWN_PADDING;

        if kind == EnemyKind::Gunship {
            let mid = ARENA_WIDTH / 2.0;
            let left = Vec2::new(rng.random_range(lo..mid - SPAWN_PADDING), SPAWN_Y);
            let right = Vec2::new(rng.random_range(mid + SPAWN_PADDING..hi), SPAWN_Y);
            self.push(SpawnOrder { kind, pos: left }, delay, step);
            self.push(SpawnOrder { kind, pos: right }, delay + ms_to_ticks(HEAVY_PAIR_MS), step);
            return;
        }

        match pattern {
            SpawnPattern::Swarm => {
                let reach = 2.0 * SWARM_WING_SPACING;
                let center = rng.random_range(lo + reach..hi - reach);
                let burst = ms_to_ticks(SWARM_BURST_MS);
                // Lead first, then the inner and outer wing pairs
                self.push(SpawnOrder { kind, pos: Vec2::new(center, SPAWN_Y) }, delay, step);
                for rank in 1..=2u32 {
                    let offset = rank as f32 * SWARM_WING_SPACING;
                    for side in [-1.0f32, 1.0] {
                        let pos = Vec2::new(center + side * offset, SPAWN_Y);
                        self.push(SpawnOrder { kind, pos }, delay + rank * burst, step);
                    }
                }
            }
            SpawnPattern::Paired => {
                let center = rng.random_range(lo + PAIR_HALF_GAP..hi - PAIR_HALF_GAP);
                for side in [-1.0f32, 1.0] {
                    let pos = Vec2::new(center + side * PAIR_HALF_GAP, SPAWN_Y);
                    self.push(SpawnOrder { kind, pos }, delay, step);
                }
            }
            SpawnPattern::Solo => {
                let pos = Vec2::new(rng.random_range(lo..hi), SPAWN_Y);
                self.push(SpawnOrder { kind, pos }, delay, step);
            }
        }
    }

    fn push(&mut self, order: SpawnOrder, delay: u32, step: &mut DirectorStep) {
        if delay == 0 {
            step.spawns.push(order);
        } else {
            self.pending.push(PendingSpawn { ticks_left: delay, order });
        }
    }

    fn end_phase(&mut self) {
        self.spawn_timer.cancel();
        self.phase_timer.cancel();
        self.pending.clear();
        let wave = self.wave_number();
        if let Some(name) = self.current_phase().map(|p| p.name.clone()) {
            self.completed.push(PhaseRecord {
                wave,
                name,
                ticks: self.phase_elapsed,
            });
        }
        self.phase_elapsed = 0;
    }

    /// Start the phase at the current indices, rolling over exhausted waves
    fn enter_current(&mut self, step: &mut DirectorStep) {
        while let Some(wave) = self.waves.get(self.wave_index) {
            if let Some(phase) = wave.phases.get(self.phase_index) {
                if self.phase_index == 0 {
                    log::info!("Wave {} started", wave.number);
                    step.events.push(FrameEvent::WaveStarted { wave: wave.number });
                }
                log::info!("Phase `{}` started ({} ms)", phase.name, phase.duration_ms);
                step.events.push(FrameEvent::PhaseStarted {
                    wave: wave.number,
                    phase: phase.name.clone(),
                });
                self.spawn_timer = Timer::repeating(ms_to_ticks(phase.spawn_interval_ms));
                self.phase_timer = Timer::once(ms_to_ticks(phase.duration_ms));
                self.phase_elapsed = 0;
                return;
            }
            self.wave_index += 1;
            self.phase_index = 0;
        }

        self.finished = true;
        self.spawn_timer.cancel();
        self.phase_timer.cancel();
        self.pending.clear();
        step.boss_start = true;
        step.events.push(FrameEvent::BossStageStarted);
        log::info!("All waves cleared, boss stage next");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::WavePhase;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn script() -> Vec<WaveScript> {
        vec![
            WaveScript {
                number: 1,
                phases: vec![
                    WavePhase::new("a", 1000, 250, "drone"),
                    WavePhase::new("b", 500, 250, "bouncer").with_support("kamikaze"),
                ],
            },
            WaveScript {
                number: 2,
                phases: vec![
                    WavePhase::new("c", 2000, 1000, "drone").with_pattern(SpawnPattern::Swarm),
                ],
            },
        ]
    }

    fn run(d: &mut WaveDirector, ticks: u32, rng: &mut Pcg32) -> (Vec<SpawnOrder>, u32) {
        let mut spawns = Vec::new();
        let mut boss = 0;
        for _ in 0..ticks {
            let s = d.step(rng);
            spawns.extend(s.spawns);
            boss += s.boss_start as u32;
        }
        (spawns, boss)
    }

    #[test]
    fn test_phase_durations_sum_and_boss_signal_once() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut d = WaveDirector::new(script());
        let start = d.start();
        assert_eq!(start.events[0], FrameEvent::WaveStarted { wave: 1 });
        let (_, boss) = run(&mut d, 60 + 30 + 120 + 600, &mut rng);
        assert_eq!(boss, 1);
        assert!(d.is_finished());
        assert!(!d.has_scheduled_spawns());
        let ticks: Vec<u32> = d.completed_phases().iter().map(|p| p.ticks).collect();
        assert_eq!(ticks, vec![60, 30, 120]);
        let total: u32 = ticks.iter().sum();
        assert_eq!(total, ms_to_ticks(1000 + 500 + 2000));
    }

    #[test]
    fn test_spawn_cadence() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut d = WaveDirector::new(script());
        d.start();
        let (spawns, _) = run(&mut d, 60, &mut rng);
        // Four spawn ticks fit in phase "a"
        assert_eq!(spawns.len(), 4);
        assert!(spawns.iter().all(|s| s.kind == EnemyKind::Drone && s.pos.y == SPAWN_Y));
        let lanes = SPAWN_PADDING..=ARENA_WIDTH - SPAWN_PADDING;
        assert!(spawns.iter().all(|s| lanes.contains(&s.pos.x)));
    }

    #[test]
    fn test_support_staggered_by_a_third() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut d = WaveDirector::new(vec![WaveScript {
            number: 1,
            phases: vec![WavePhase::new("s", 5000, 900, "drone").with_support("kamikaze")],
        }]);
        d.start();
        let interval = ms_to_ticks(900);
        let mut primary_tick = None;
        let mut support_tick = None;
        for t in 1..=interval * 2 {
            for s in d.step(&mut rng).spawns {
                match s.kind {
                    EnemyKind::Drone if primary_tick.is_none() => primary_tick = Some(t),
                    EnemyKind::Kamikaze if support_tick.is_none() => support_tick = Some(t),
                    _ => {}
                }
            }
        }
        assert_eq!(primary_tick, Some(interval));
        assert_eq!(support_tick, Some(interval + interval / 3));
    }

    #[test]
    fn test_swarm_v_formation() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut d = WaveDirector::new(vec![WaveScript {
            number: 1,
            phases: vec![
                WavePhase::new("v", 5000, 1000, "drone").with_pattern(SpawnPattern::Swarm),
            ],
        }]);
        d.start();
        let mut bursts = Vec::new();
        for t in 1..=60 + 30 {
            let s = d.step(&mut rng);
            if !s.spawns.is_empty() {
                bursts.push((t, s.spawns));
            }
        }
        let sizes: Vec<(u32, usize)> = bursts.iter().map(|(t, s)| (*t, s.len())).collect();
        assert_eq!(sizes, vec![(60, 1), (75, 2), (90, 2)]);
        let lead = bursts[0].1[0].pos.x;
        let outer = &bursts[2].1;
        assert!((outer[0].pos.x - (lead - 2.0 * SWARM_WING_SPACING)).abs() < 1e-3);
        assert!((outer[1].pos.x - (lead + 2.0 * SWARM_WING_SPACING)).abs() < 1e-3);
    }

    #[test]
    fn test_heavy_spawns_as_offset_pair() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut d = WaveDirector::new(vec![WaveScript {
            number: 1,
            phases: vec![WavePhase::new("g", 5000, 2000, "gunship")],
        }]);
        d.start();
        let mut seen = Vec::new();
        for t in 1..=120 + ms_to_ticks(HEAVY_PAIR_MS) {
            for s in d.step(&mut rng).spawns {
                seen.push((t, s));
            }
        }
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].0 - seen[0].0, ms_to_ticks(HEAVY_PAIR_MS));
        assert!(seen[0].1.pos.x < ARENA_WIDTH / 2.0);
        assert!(seen[1].1.pos.x > ARENA_WIDTH / 2.0);
    }

    #[test]
    fn test_unknown_tag_falls_back() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut d = WaveDirector::new(vec![WaveScript {
            number: 1,
            phases: vec![WavePhase::new("x", 1000, 500, "mothership")],
        }]);
        d.start();
        let (spawns, _) = run(&mut d, 30, &mut rng);
        assert_eq!(spawns[0].kind, EnemyKind::default());
    }

    #[test]
    fn test_empty_script_goes_straight_to_boss() {
        let mut d = WaveDirector::new(Vec::new());
        let step = d.start();
        assert!(step.boss_start);
        assert!(d.is_finished());
        let mut rng = Pcg32::seed_from_u64(0);
        assert!(!d.step(&mut rng).boss_start);
    }
}
