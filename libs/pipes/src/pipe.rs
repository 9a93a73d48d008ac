//! Growth engine for a single pipe.

use std::collections::VecDeque;

use nalgebra::UnitQuaternion;

use crate::color::PipeColor;
use crate::config::PipesConfig;
use crate::direction::{Dir, TurnOrder};
use crate::geometry::{grid_to_world, straight_position};
use crate::lattice::{GridCell, Lattice};
use crate::sink::{SegmentHandle, SegmentKind, SegmentSink, SegmentVisual};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeState {
    Growing,
    /// Boxed in. Terminal: the pipe only drains its remaining segments.
    Stopped,
}

/// What one call to [`Pipe::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One straight segment from `from` to `to`; the head is now `to`.
    /// `bent` is set when the step ended with a bend and a successful turn.
    Grew { from: GridCell, to: GridCell, bent: bool },
    /// A straight segment and a bend were emitted, then no turn was possible.
    /// `to` is occupied but the head stays on `from`.
    BentAndStopped { from: GridCell, to: GridCell },
    /// No move or turn was possible; nothing was emitted.
    Stopped,
    /// The pipe was already stopped.
    Idle,
}

/// A visual unit owned by a pipe, stamped with its creation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub handle: SegmentHandle,
    pub kind: SegmentKind,
    pub created_at: f32,
}

/// Shared state a pipe reads and mutates while it grows.
pub struct GrowthCtx<'a> {
    pub lattice: &'a mut Lattice,
    pub rng: &'a mut oorandom::Rand32,
    pub sink: &'a mut dyn SegmentSink,
    pub config: &'a PipesConfig,
    pub now: f32,
}

#[derive(Debug, Clone)]
pub struct Pipe {
    id: PipeId,
    cell: GridCell,
    dir: Dir,
    rotation: UnitQuaternion<f32>,
    color: PipeColor,
    state: PipeState,
    // Oldest first; always appended at the back.
    segments: VecDeque<Segment>,
    grown: usize,
}

impl Pipe {
    /// Starts a pipe on `start` heading in a random direction.
    ///
    /// `start` must already be occupied; the caller claims it before spawning.
    pub fn spawn(id: PipeId, start: GridCell, color: PipeColor, ctx: &mut GrowthCtx<'_>) -> Self {
        let dir = Dir::random(ctx.rng);
        Self::with_direction(id, start, dir, color, ctx)
    }

    pub fn with_direction(
        id: PipeId,
        start: GridCell,
        dir: Dir,
        color: PipeColor,
        ctx: &mut GrowthCtx<'_>,
    ) -> Self {
        debug_assert!(ctx.lattice.is_occupied(start), "start cell must be claimed");
        let mut pipe = Self {
            id,
            cell: start,
            dir,
            rotation: dir.rotation(),
            color,
            state: PipeState::Growing,
            segments: VecDeque::new(),
            grown: 0,
        };
        pipe.emit_bend(start, ctx);
        log::debug!("pipe {} started at {:?} heading {:?}", id.0, start, dir);
        pipe
    }

    pub fn id(&self) -> PipeId {
        self.id
    }

    pub fn cell(&self) -> GridCell {
        self.cell
    }

    pub fn dir(&self) -> Dir {
        self.dir
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    pub fn color(&self) -> PipeColor {
        self.color
    }

    pub fn state(&self) -> PipeState {
        self.state
    }

    pub fn is_growing(&self) -> bool {
        self.state == PipeState::Growing
    }

    /// Live segments, oldest first.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Straight segments emitted over the pipe's life, retired ones included.
    pub fn grown(&self) -> usize {
        self.grown
    }

    /// One growth iteration.
    pub fn step(&mut self, ctx: &mut GrowthCtx<'_>) -> StepOutcome {
        if self.state == PipeState::Stopped {
            return StepOutcome::Idle;
        }

        // Turning re-targets immediately; an adopted turn always has a free target.
        let mut next = self.cell.step(self.dir);
        while !ctx.lattice.is_valid(next) {
            if !self.try_turn(ctx.lattice, ctx.rng, ctx.config.turn_order) {
                self.stop();
                return StepOutcome::Stopped;
            }
            next = self.cell.step(self.dir);
        }

        let from = self.cell;
        let len = ctx.config.segment_length;
        self.emit(
            ctx,
            SegmentKind::Straight,
            straight_position(from, self.dir, len),
            self.rotation,
        );
        ctx.lattice.mark_occupied(next);
        self.grown += 1;

        let mut bent = false;
        if ctx.rng.rand_float() < ctx.config.bend_chance {
            self.emit_bend(next, ctx);
            // The turn is judged from the cell the pipe is still standing on.
            if !self.try_turn(ctx.lattice, ctx.rng, ctx.config.turn_order) {
                self.stop();
                return StepOutcome::BentAndStopped { from, to: next };
            }
            bent = true;
        }

        self.cell = next;
        StepOutcome::Grew { from, to: next, bent }
    }

    /// Adopts the first perpendicular direction whose target cell is valid.
    pub fn try_turn(
        &mut self,
        lattice: &Lattice,
        rng: &mut oorandom::Rand32,
        order: TurnOrder,
    ) -> bool {
        for dir in order.candidates(self.dir, rng) {
            if lattice.is_valid(self.cell.step(dir)) {
                log::trace!("pipe {} turned {:?} -> {:?}", self.id.0, self.dir, dir);
                self.dir = dir;
                self.rotation = dir.rotation();
                return true;
            }
        }
        false
    }

    /// Drops the maximal prefix of segments whose age has reached `lifetime`.
    pub fn retire_expired(&mut self, now: f32, lifetime: f32, sink: &mut dyn SegmentSink) -> usize {
        let mut retired = 0;
        while let Some(oldest) = self.segments.front() {
            if now - oldest.created_at < lifetime {
                break;
            }
            sink.destroy_segment(oldest.handle);
            self.segments.pop_front();
            retired += 1;
        }
        retired
    }

    /// Destroys every remaining segment.
    pub fn clear(&mut self, sink: &mut dyn SegmentSink) {
        for segment in self.segments.drain(..) {
            sink.destroy_segment(segment.handle);
        }
    }

    fn stop(&mut self) {
        self.state = PipeState::Stopped;
        log::debug!(
            "pipe {} stopped at {:?} after {} segments",
            self.id.0,
            self.cell,
            self.grown
        );
    }

    fn emit_bend(&mut self, cell: GridCell, ctx: &mut GrowthCtx<'_>) {
        let position = grid_to_world(cell, ctx.config.segment_length);
        self.emit(ctx, SegmentKind::Bend, position, UnitQuaternion::identity());
    }

    fn emit(
        &mut self,
        ctx: &mut GrowthCtx<'_>,
        kind: SegmentKind,
        position: nalgebra::Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) {
        let scale = match kind {
            SegmentKind::Straight => ctx.config.straight_scale(),
            SegmentKind::Bend => ctx.config.bend_scale(),
        };
        let handle = ctx.sink.create_segment(SegmentVisual {
            kind,
            pipe: self.id,
            position,
            rotation,
            scale,
            color: self.color,
        });
        self.segments.push_back(Segment {
            handle,
            kind,
            created_at: ctx.now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{EventLog, SinkEvent};

    struct Rig {
        lattice: Lattice,
        rng: oorandom::Rand32,
        sink: EventLog,
        config: PipesConfig,
    }

    impl Rig {
        fn new(grid_size: i32) -> Self {
            let config = PipesConfig {
                grid_size,
                ..PipesConfig::default()
            };
            Self {
                lattice: Lattice::new(grid_size),
                rng: oorandom::Rand32::new(11),
                sink: EventLog::new(),
                config,
            }
        }

        fn ctx(&mut self, now: f32) -> GrowthCtx<'_> {
            GrowthCtx {
                lattice: &mut self.lattice,
                rng: &mut self.rng,
                sink: &mut self.sink,
                config: &self.config,
                now,
            }
        }

        fn start(&mut self, cell: GridCell, dir: Dir) -> Pipe {
            self.lattice.mark_occupied(cell);
            let color = PipeColor::new(0.2, 0.4, 0.6);
            Pipe::with_direction(PipeId(0), cell, dir, color, &mut self.ctx(0.0))
        }
    }

    fn boxed_in_rig() -> Rig {
        let mut rig = Rig::new(1);
        for d in Dir::ALL {
            rig.lattice.mark_occupied(GridCell::ORIGIN.step(d));
        }
        rig
    }

    #[test]
    fn test_spawn_emits_bend_at_start() {
        let mut rig = Rig::new(3);
        let pipe = rig.start(GridCell::new(1, 1, 1), Dir::PosY);
        assert_eq!(pipe.segment_count(), 1);
        let (_, visual) = rig.sink.created().next().unwrap();
        assert_eq!(visual.kind, SegmentKind::Bend);
        assert_eq!(visual.position, nalgebra::Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(visual.rotation, UnitQuaternion::identity());
    }

    #[test]
    fn test_boxed_in_pipe_stops_without_emitting() {
        let mut rig = boxed_in_rig();
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX);
        let before = rig.sink.events.len();

        assert_eq!(pipe.step(&mut rig.ctx(0.05)), StepOutcome::Stopped);
        assert_eq!(pipe.state(), PipeState::Stopped);
        assert_eq!(pipe.cell(), GridCell::ORIGIN);
        assert_eq!(rig.sink.events.len(), before);

        assert_eq!(pipe.step(&mut rig.ctx(0.10)), StepOutcome::Idle);
        assert_eq!(rig.sink.events.len(), before);
    }

    #[test]
    fn test_bend_without_turn_stops_on_old_cell() {
        // Only the cell straight ahead is free; every perpendicular is taken.
        let mut rig = Rig::new(1);
        rig.config.bend_chance = 1.0;
        for d in [Dir::PosY, Dir::NegY, Dir::PosZ, Dir::NegZ] {
            rig.lattice.mark_occupied(GridCell::ORIGIN.step(d));
        }
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX);

        let to = GridCell::new(1, 0, 0);
        assert_eq!(
            pipe.step(&mut rig.ctx(0.05)),
            StepOutcome::BentAndStopped { from: GridCell::ORIGIN, to }
        );
        let kinds: Vec<_> = rig.sink.created().map(|(_, v)| v.kind).collect();
        assert_eq!(kinds, vec![SegmentKind::Bend, SegmentKind::Straight, SegmentKind::Bend]);
        let (_, bend) = rig.sink.created().last().unwrap();
        assert_eq!(bend.position, nalgebra::Vector3::new(1.0, 0.0, 0.0));
        assert!(rig.lattice.is_occupied(to));
        assert_eq!(pipe.cell(), GridCell::ORIGIN);
        assert_eq!(pipe.state(), PipeState::Stopped);
        assert_eq!(pipe.segment_count(), 3);

        let before = rig.sink.events.len();
        assert_eq!(pipe.step(&mut rig.ctx(0.10)), StepOutcome::Idle);
        assert_eq!(rig.sink.events.len(), before);
    }

    #[test]
    fn test_step_advances_to_adjacent_new_cell() {
        let mut rig = Rig::new(10);
        rig.config.bend_chance = 0.0;
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosZ);
        let occupied = rig.lattice.occupied_count();

        let outcome = pipe.step(&mut rig.ctx(0.05));
        let to = GridCell::new(0, 0, 1);
        assert_eq!(outcome, StepOutcome::Grew { from: GridCell::ORIGIN, to, bent: false });
        assert_eq!(pipe.cell(), to);
        assert!(rig.lattice.is_occupied(to));
        assert_eq!(rig.lattice.occupied_count(), occupied + 1);

        let (_, straight) = rig.sink.created().last().unwrap();
        assert_eq!(straight.kind, SegmentKind::Straight);
        assert_eq!(straight.position, nalgebra::Vector3::new(0.0, 0.0, 0.5));
        assert_eq!(straight.scale, rig.config.straight_scale());
    }

    #[test]
    fn test_blocked_step_turns_and_still_grows() {
        let mut rig = Rig::new(10);
        rig.config.bend_chance = 0.0;
        rig.lattice.mark_occupied(GridCell::new(1, 0, 0));
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX);

        let outcome = pipe.step(&mut rig.ctx(0.05));
        // First perpendicular of +X in declaration order is +Y.
        assert_eq!(
            outcome,
            StepOutcome::Grew { from: GridCell::ORIGIN, to: GridCell::new(0, 1, 0), bent: false }
        );
        assert_eq!(pipe.dir(), Dir::PosY);
        // Only the straight segment was emitted for the turn-and-retry.
        assert_eq!(pipe.segment_count(), 2);
    }

    #[test]
    fn test_pipe_at_wall_stops_when_boxed() {
        // Grid of a single cell: no move is ever valid.
        let mut rig = Rig::new(0);
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::NegZ);
        assert_eq!(pipe.step(&mut rig.ctx(0.05)), StepOutcome::Stopped);
    }

    #[test]
    fn test_try_turn_picks_perpendicular_valid_target() {
        let mut rig = Rig::new(2);
        rig.lattice.mark_occupied(GridCell::new(0, 1, 0));
        rig.lattice.mark_occupied(GridCell::new(0, -1, 0));
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX);

        let prior = pipe.dir();
        let Rig { lattice, rng, .. } = &mut rig;
        assert!(pipe.try_turn(lattice, rng, TurnOrder::Declaration));
        assert_eq!(pipe.dir(), Dir::PosZ);
        assert!(prior.is_perpendicular(pipe.dir()));
        assert_eq!(pipe.rotation(), Dir::PosZ.rotation());
    }

    #[test]
    fn test_shuffled_turns_are_perpendicular_and_valid() {
        let mut rig = Rig::new(4);
        rig.config.turn_order = TurnOrder::Shuffled;
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::NegY);
        for _ in 0..200 {
            let prior = pipe.dir();
            let cell = pipe.cell();
            let Rig { lattice, rng, .. } = &mut rig;
            if !pipe.try_turn(lattice, rng, TurnOrder::Shuffled) {
                break;
            }
            assert!(prior.is_perpendicular(pipe.dir()));
            assert!(rig.lattice.is_valid(cell.step(pipe.dir())));
            if pipe.step(&mut rig.ctx(0.0)) == StepOutcome::Stopped {
                break;
            }
        }
    }

    #[test]
    fn test_growth_never_revisits_cells() {
        let mut rig = Rig::new(3);
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX);
        let mut path = vec![GridCell::ORIGIN];
        for i in 0..500 {
            match pipe.step(&mut rig.ctx(i as f32 * 0.05)) {
                StepOutcome::Grew { from, to, .. } => {
                    assert_eq!(from, *path.last().unwrap());
                    assert!(from.is_adjacent(to));
                    assert!(!path.contains(&to));
                    path.push(to);
                }
                StepOutcome::BentAndStopped { from, to } => {
                    assert!(from.is_adjacent(to));
                    assert!(!path.contains(&to));
                    break;
                }
                StepOutcome::Stopped | StepOutcome::Idle => break,
            }
        }
        assert_eq!(pipe.state(), PipeState::Stopped);
        assert!(path.len() > 1);
        for cell in &path {
            assert!(rig.lattice.is_occupied(*cell));
        }
    }

    #[test]
    fn test_bend_chance_one_emits_bend_every_step() {
        let mut rig = Rig::new(10);
        rig.config.bend_chance = 1.0;
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX);
        let outcome = pipe.step(&mut rig.ctx(0.05));
        assert!(matches!(outcome, StepOutcome::Grew { bent: true, .. }));
        let kinds: Vec<_> = pipe.segments().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SegmentKind::Bend, SegmentKind::Straight, SegmentKind::Bend]);
        let (_, bend) = rig.sink.created().last().unwrap();
        assert_eq!(bend.position, nalgebra::Vector3::new(1.0, 0.0, 0.0));
        assert!(Dir::PosX.is_perpendicular(pipe.dir()));
    }

    #[test]
    fn test_retire_removes_expired_prefix_only() {
        let mut rig = Rig::new(10);
        rig.config.bend_chance = 0.0;
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX); // t = 0
        pipe.step(&mut rig.ctx(5.0));
        pipe.step(&mut rig.ctx(9.0));
        let handles: Vec<_> = pipe.segments().map(|s| s.handle).collect();

        assert_eq!(pipe.retire_expired(12.0, 10.0, &mut rig.sink), 1);
        let left: Vec<_> = pipe.segments().map(|s| s.created_at).collect();
        assert_eq!(left, vec![5.0, 9.0]);
        assert_eq!(rig.sink.destroyed().collect::<Vec<_>>(), vec![handles[0]]);

        // Exactly at the lifetime boundary counts as expired.
        assert_eq!(pipe.retire_expired(15.0, 10.0, &mut rig.sink), 1);
        assert_eq!(pipe.retire_expired(15.0, 10.0, &mut rig.sink), 0);
        assert_eq!(pipe.segment_count(), 1);
    }

    #[test]
    fn test_retire_stops_at_first_live_segment() {
        let mut rig = Rig::new(10);
        rig.config.bend_chance = 0.0;
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX);
        pipe.step(&mut rig.ctx(8.0));
        pipe.step(&mut rig.ctx(1.0));
        // The middle segment is young, so the old one behind it is untouched.
        assert_eq!(pipe.retire_expired(10.0, 5.0, &mut rig.sink), 1);
        let left: Vec<_> = pipe.segments().map(|s| s.created_at).collect();
        assert_eq!(left, vec![8.0, 1.0]);
    }

    #[test]
    fn test_clear_destroys_everything() {
        let mut rig = Rig::new(10);
        let mut pipe = rig.start(GridCell::ORIGIN, Dir::PosX);
        pipe.step(&mut rig.ctx(0.05));
        let live = pipe.segment_count();
        pipe.clear(&mut rig.sink);
        assert_eq!(pipe.segment_count(), 0);
        let destroyed = rig
            .sink
            .events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Destroy(_)))
            .count();
        assert_eq!(destroyed, live);
    }
}
