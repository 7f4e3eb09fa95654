//! Hit events raised by the collision pipeline
//!
//! Key principles:
//! - Fire-and-forget: the pipeline never waits for or retries a handler
//! - Multicast: every registered handler sees every hit, in order
//! - Queued: hits are collected during the frame and dispatched once the
//!   last pass has finished, so handlers never observe a half-resolved frame

use crate::ecs::Entity;
use crate::physics::body::BodyCategory;
use crate::physics::context::ContextKey;
use crate::physics::resolve::ResolveInfo;
use crate::physics::sat::Mtv;
use crate::physics::service::ServiceKind;

/// Two bodies were found overlapping by a service
///
/// What the hit *means* (damage, pickup, nothing) is up to the handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    /// Frame number the hit was raised in
    pub frame: u64,
    /// Service that found the overlap
    pub service: ServiceKind,
    /// First body of the pair
    pub entity_a: Entity,
    /// Category of the first body
    pub category_a: BodyCategory,
    /// Context of the first body
    pub context_a: ContextKey,
    /// Second body of the pair
    pub entity_b: Entity,
    /// Category of the second body
    pub category_b: BodyCategory,
    /// Context of the second body
    pub context_b: ContextKey,
    /// Penetration axis and depth, B towards A
    pub mtv: Mtv,
    /// Displacement applied to A (zero for trigger services)
    pub resolve_a: ResolveInfo,
    /// Displacement applied to B (zero for trigger services)
    pub resolve_b: ResolveInfo,
}

impl HitEvent {
    /// True if `entity` is either side of the hit
    pub fn involves(&self, entity: Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }

    /// The other side of the hit, if `entity` is one side
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if self.entity_a == entity {
            Some(self.entity_b)
        } else if self.entity_b == entity {
            Some(self.entity_a)
        } else {
            None
        }
    }
}

/// Hit handler trait
pub trait HitHandler {
    /// Called once per hit, in the order hits were raised
    fn on_hit(&mut self, hit: &HitEvent);
}

impl<F> HitHandler for F
where
    F: FnMut(&HitEvent),
{
    fn on_hit(&mut self, hit: &HitEvent) {
        self(hit);
    }
}

/// Identifier returned when registering a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u32);

/// Hit queue plus the handlers it is delivered to
pub struct HitDispatcher {
    queue: Vec<HitEvent>,
    handlers: Vec<(HandlerId, Box<dyn HitHandler>)>,
    next_handler: u32,
}

impl HitDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a dispatcher whose queue starts with room for `capacity` hits
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Vec::with_capacity(capacity),
            handlers: Vec::new(),
            next_handler: 0,
        }
    }

    /// Register a handler; it receives every hit from the next dispatch on
    pub fn register_handler(&mut self, handler: Box<dyn HitHandler>) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.push((id, handler));
        id
    }

    /// Remove a handler; unknown ids are ignored
    pub fn unregister_handler(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        before != self.handlers.len()
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Queue a hit for this frame's dispatch
    pub fn send(&mut self, hit: HitEvent) {
        self.queue.push(hit);
    }

    /// Deliver every queued hit to every handler
    ///
    /// The queue is kept until [`HitDispatcher::begin_frame`] so pull-style
    /// consumers can still read it through [`HitDispatcher::frame_hits`].
    pub fn dispatch(&mut self) {
        for hit in &self.queue {
            for (_, handler) in &mut self.handlers {
                handler.on_hit(hit);
            }
        }
    }

    /// Hits raised during the last frame
    pub fn frame_hits(&self) -> &[HitEvent] {
        &self.queue
    }

    /// Forget last frame's hits, keeping the allocation
    pub fn begin_frame(&mut self) {
        self.queue.clear();
    }
}

impl Default for HitDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HitDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitDispatcher")
            .field("queued", &self.queue.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
