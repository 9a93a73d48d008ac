//! Renderer-facing side of the simulation.
//!
//! Pipes never draw anything themselves. They describe each visual unit as a
//! [`SegmentVisual`] and hand it to a [`SegmentSink`], which returns the handle
//! the pipe later uses to destroy it.

use std::collections::BTreeMap;

use nalgebra::{UnitQuaternion, Vector3};

use crate::color::PipeColor;
use crate::pipe::PipeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Spans the midpoint between two adjacent cells.
    Straight,
    /// Sits on a single cell where the pipe changes direction.
    Bend,
}

/// Opaque id of a visual owned by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentHandle(pub u64);

/// Everything a renderer needs to instantiate one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentVisual {
    pub kind: SegmentKind,
    pub pipe: PipeId,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
    pub color: PipeColor,
}

impl SegmentVisual {
    /// World-space endpoints of the visual's local Y axis, scaled.
    ///
    /// For a straight segment built from the unit cylinder these are the two cell
    /// centres it joins.
    pub fn axis_endpoints(&self) -> (Vector3<f32>, Vector3<f32>) {
        let half = self.rotation * Vector3::new(0.0, self.scale.y, 0.0);
        (self.position - half, self.position + half)
    }
}

pub trait SegmentSink {
    fn create_segment(&mut self, visual: SegmentVisual) -> SegmentHandle;
    fn destroy_segment(&mut self, handle: SegmentHandle);
}

/// Store of live visuals, for renderers that redraw everything each frame.
#[derive(Debug, Default)]
pub struct Scene {
    next_handle: u64,
    live: BTreeMap<SegmentHandle, SegmentVisual>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn get(&self, handle: SegmentHandle) -> Option<&SegmentVisual> {
        self.live.get(&handle)
    }

    /// Live visuals in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (SegmentHandle, &SegmentVisual)> {
        self.live.iter().map(|(h, v)| (*h, v))
    }
}

impl SegmentSink for Scene {
    fn create_segment(&mut self, visual: SegmentVisual) -> SegmentHandle {
        let handle = SegmentHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle, visual);
        handle
    }

    fn destroy_segment(&mut self, handle: SegmentHandle) {
        if self.live.remove(&handle).is_none() {
            log::warn!("destroy for unknown segment {:?}", handle);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Create(SegmentHandle, SegmentVisual),
    Destroy(SegmentHandle),
}

/// Sink that records every event in order.
#[derive(Debug, Default)]
pub struct EventLog {
    next_handle: u64,
    pub events: Vec<SinkEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> impl Iterator<Item = (SegmentHandle, &SegmentVisual)> {
        self.events.iter().filter_map(|e| match e {
            SinkEvent::Create(h, v) => Some((*h, v)),
            SinkEvent::Destroy(_) => None,
        })
    }

    pub fn destroyed(&self) -> impl Iterator<Item = SegmentHandle> + '_ {
        self.events.iter().filter_map(|e| match e {
            SinkEvent::Destroy(h) => Some(*h),
            SinkEvent::Create(..) => None,
        })
    }
}

impl SegmentSink for EventLog {
    fn create_segment(&mut self, visual: SegmentVisual) -> SegmentHandle {
        let handle = SegmentHandle(self.next_handle);
        self.next_handle += 1;
        self.events.push(SinkEvent::Create(handle, visual));
        handle
    }

    fn destroy_segment(&mut self, handle: SegmentHandle) {
        self.events.push(SinkEvent::Destroy(handle));
    }
}
