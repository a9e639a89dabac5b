//! Overlay scheduling.
//!
//! Holds overlays in insertion order (which is also render z-order) and
//! answers "what is visible at `t`, and in which animation phase".
//!
//! Activation times are latched by [`OverlayScheduler::observe`], called once
//! per primary tick. Querying with [`OverlayScheduler::visible_overlays`] never
//! mutates anything, so it can be repeated freely.

use serde::Serialize;

use reelsync_common::config::{AnimationTimings, OverlayDefaults};
use reelsync_common::error::{ReelsyncError, ReelsyncResult};
use reelsync_media_model::{Overlay, OverlayContent, OverlayId, OverlaySpec, Position};

use crate::animation::AnimationPhase;

#[derive(Debug, Clone)]
struct Slot {
    overlay: Overlay,
    /// Time the overlay became visible in the current pass.
    activated_at: Option<f64>,
}

/// One entry of a visibility query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibleOverlay<'a> {
    pub overlay: &'a Overlay,
    pub phase: AnimationPhase,
}

/// Ordered overlay collection with visibility and animation queries.
#[derive(Debug, Clone)]
pub struct OverlayScheduler {
    slots: Vec<Slot>,
    next_id: u64,
    defaults: OverlayDefaults,
    timings: AnimationTimings,
}

impl Default for OverlayScheduler {
    fn default() -> Self {
        Self::new(OverlayDefaults::default(), AnimationTimings::default())
    }
}

impl OverlayScheduler {
    pub fn new(defaults: OverlayDefaults, timings: AnimationTimings) -> Self {
        Self {
            slots: Vec::new(),
            next_id: 1,
            defaults,
            timings,
        }
    }

    /// Validate and append an overlay. Returns its id.
    pub fn add(&mut self, spec: OverlaySpec) -> ReelsyncResult<OverlayId> {
        let OverlaySpec {
            content,
            visible_from,
            visible_until,
            size,
            position,
        } = spec;

        if !(visible_from.is_finite() && visible_until.is_finite()) || visible_from < 0.0 {
            return Err(ReelsyncError::invalid_range(format!(
                "overlay window must be finite and non-negative, got [{visible_from}, {visible_until})"
            )));
        }
        if visible_from >= visible_until {
            return Err(ReelsyncError::invalid_range(format!(
                "overlay start {visible_from} must be before end {visible_until}"
            )));
        }

        let (bounds, origin) = match &content {
            OverlayContent::Text { .. } => (self.defaults.text_size, self.defaults.text_origin),
            OverlayContent::Image { .. } => (self.defaults.image_size, self.defaults.image_origin),
        };
        let size = size.unwrap_or(bounds.default);
        if !bounds.contains(size) {
            return Err(ReelsyncError::invalid_range(format!(
                "{} overlay size {size} outside [{}, {}]",
                content.kind_label(),
                bounds.min,
                bounds.max
            )));
        }

        let id = OverlayId(self.next_id);
        self.next_id += 1;

        tracing::info!(
            %id,
            kind = content.kind_label(),
            visible_from,
            visible_until,
            size,
            "Overlay added"
        );

        self.slots.push(Slot {
            overlay: Overlay {
                id,
                content,
                visible_from,
                visible_until,
                position: position.unwrap_or_else(|| Position::from(origin)),
                size,
            },
            activated_at: None,
        });
        Ok(id)
    }

    /// Move an overlay to an absolute position (last write wins).
    pub fn drag_to(&mut self, id: OverlayId, position: Position) -> ReelsyncResult<()> {
        self.slot_mut(id)?.overlay.position = position;
        Ok(())
    }

    /// Move an overlay by a drag translation. Returns the new position.
    pub fn drag_by(&mut self, id: OverlayId, dx: f64, dy: f64) -> ReelsyncResult<Position> {
        let overlay = &mut self.slot_mut(id)?.overlay;
        overlay.position = overlay.position.translated(dx, dy);
        Ok(overlay.position)
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.index_of(id).map(|i| &self.slots[i].overlay)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All overlays in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> + '_ {
        self.slots.iter().map(|slot| &slot.overlay)
    }

    /// Latch activation times for the primary position `t`.
    ///
    /// An overlay that becomes visible (or is seen again at an earlier time
    /// than its latch, e.g. after a backwards seek) restarts its animation.
    /// Returns how many overlays (re)activated.
    pub fn observe(&mut self, t: f64) -> usize {
        let mut activated = 0;
        for slot in &mut self.slots {
            if slot.overlay.is_visible_at(t) {
                let restart = slot.activated_at.map_or(true, |at| t < at);
                if restart {
                    slot.activated_at = Some(t);
                    activated += 1;
                }
            } else {
                slot.activated_at = None;
            }
        }
        activated
    }

    /// Start a new playback pass: every visible overlay re-enters.
    pub fn reset_pass(&mut self) {
        for slot in &mut self.slots {
            slot.activated_at = None;
        }
    }

    /// Overlays visible at `t`, in insertion order, with animation phases.
    ///
    /// An overlay visible but not yet observed reports a phase of zero
    /// elapsed time.
    pub fn visible_overlays(&self, t: f64) -> impl Iterator<Item = VisibleOverlay<'_>> + '_ {
        self.slots
            .iter()
            .filter(move |slot| slot.overlay.is_visible_at(t))
            .map(move |slot| {
                let since = slot.activated_at.filter(|at| *at <= t).unwrap_or(t);
                VisibleOverlay {
                    overlay: &slot.overlay,
                    phase: AnimationPhase::at(&slot.overlay.animations(), t - since, &self.timings),
                }
            })
    }

    fn index_of(&self, id: OverlayId) -> Option<usize> {
        // Ids are assigned in insertion order, so slots are sorted by id.
        self.slots
            .binary_search_by_key(&id, |slot| slot.overlay.id)
            .ok()
    }

    fn slot_mut(&mut self, id: OverlayId) -> ReelsyncResult<&mut Slot> {
        let index = self
            .index_of(id)
            .ok_or(ReelsyncError::UnknownOverlay { id: id.0 })?;
        Ok(&mut self.slots[index])
    }
}
