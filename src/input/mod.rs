// Pointer input state machine
//
// Raw pointer-down/move/up events become press tracks. Each track is either
// open (pointer still down, accumulating move samples) or closed (released,
// classified by duration). The main loop polls `latest_complete` once per
// frame:
//
// - closed track at the tail → popped and returned as Click or LongClick
// - open track at the tail   → a DragUpdate carrying the latest sample,
//                              the track itself stays queued
//
// Invariant: at most one track is open, and it is always the tail. A new
// pointer-down closes a dangling open track at its last sample before
// starting the next one.

use crate::gfx::Point;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default press duration at which a click becomes a long click
pub const DEFAULT_LONG_CLICK: Duration = Duration::from_millis(300);

/// Bound on queued tracks; the oldest are dropped first
const MAX_PENDING: usize = 8;

/// Semantic pointer event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    LongClick,
    /// Intermediate position of a press still in progress
    DragUpdate,
}

/// Semantic pointer event handed to the component tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: EventKind,
    /// Where the press started; used to pick the target
    pub origin: Point,
    /// Latest (or release) position
    pub position: Point,
}

/// One pointer-down through its eventual release
#[derive(Debug, Clone)]
struct PressTrack {
    started: Instant,
    /// Coalesced samples, first is the press position
    path: Vec<Point>,
    released: Option<Instant>,
}

impl PressTrack {
    fn new(position: Point, at: Instant) -> Self {
        Self {
            started: at,
            path: vec![position],
            released: None,
        }
    }

    fn is_open(&self) -> bool {
        self.released.is_none()
    }

    fn origin(&self) -> Point {
        self.path.first().copied().unwrap_or_default()
    }

    fn latest(&self) -> Point {
        self.path.last().copied().unwrap_or_default()
    }

    /// Append unless identical to the previous sample
    fn record(&mut self, position: Point) {
        if self.path.last() != Some(&position) {
            self.path.push(position);
        }
    }

    fn close(&mut self, at: Instant) {
        self.released = Some(at);
    }

    fn classify(&self, threshold: Duration) -> EventKind {
        let released = self.released.unwrap_or(self.started);
        if released.saturating_duration_since(self.started) >= threshold {
            EventKind::LongClick
        } else {
            EventKind::Click
        }
    }
}

/// Pending press tracks plus the long-click threshold
#[derive(Debug, Clone)]
pub struct EventQueue {
    tracks: VecDeque<PressTrack>,
    long_click: Duration,
}

impl EventQueue {
    pub fn new(long_click: Duration) -> Self {
        Self {
            tracks: VecDeque::with_capacity(MAX_PENDING),
            long_click,
        }
    }

    fn open_track(&mut self) -> Option<&mut PressTrack> {
        self.tracks.back_mut().filter(|t| t.is_open())
    }

    pub fn has_open(&self) -> bool {
        self.tracks.back().is_some_and(|t| t.is_open())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn pointer_down(&mut self, position: Point, at: Instant) {
        if let Some(dangling) = self.open_track() {
            tracing::debug!("Closing dangling press track before new pointer-down");
            dangling.close(at);
        }
        if self.tracks.len() >= MAX_PENDING {
            self.tracks.pop_front();
        }
        self.tracks.push_back(PressTrack::new(position, at));
    }

    /// Moves without an open press are hover and are ignored
    pub fn pointer_move(&mut self, position: Point) {
        if let Some(track) = self.open_track() {
            track.record(position);
        }
    }

    pub fn pointer_up(&mut self, position: Point, at: Instant) {
        match self.open_track() {
            Some(track) => {
                track.record(position);
                track.close(at);
            }
            None => tracing::trace!(?position, "Pointer-up without an open press"),
        }
    }

    /// Most recent actionable event, per the rules at the top of this module
    pub fn latest_complete(&mut self) -> Option<PointerEvent> {
        let tail = self.tracks.back()?;
        if tail.is_open() {
            return Some(PointerEvent {
                kind: EventKind::DragUpdate,
                origin: tail.origin(),
                position: tail.latest(),
            });
        }
        let track = self.tracks.pop_back()?;
        Some(PointerEvent {
            kind: track.classify(self.long_click),
            origin: track.origin(),
            position: track.latest(),
        })
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_CLICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_long_click_after_hold() {
        let mut queue = EventQueue::default();
        let t0 = Instant::now();

        queue.pointer_down(Point::new(10, 10), t0);
        queue.pointer_up(Point::new(10, 10), t0 + ms(350));

        let event = queue.latest_complete().unwrap();
        assert_eq!(event.kind, EventKind::LongClick);
        assert_eq!(event.position, Point::new(10, 10));
        assert!(queue.latest_complete().is_none());
    }

    #[test]
    fn test_threshold_boundary_is_long() {
        let mut queue = EventQueue::default();
        let t0 = Instant::now();

        queue.pointer_down(Point::new(1, 1), t0);
        queue.pointer_up(Point::new(1, 1), t0 + ms(299));
        assert_eq!(queue.latest_complete().unwrap().kind, EventKind::Click);

        queue.pointer_down(Point::new(1, 1), t0);
        queue.pointer_up(Point::new(1, 1), t0 + ms(300));
        assert_eq!(queue.latest_complete().unwrap().kind, EventKind::LongClick);
    }

    #[test]
    fn test_open_press_yields_drag_without_consuming() {
        let mut queue = EventQueue::default();
        let t0 = Instant::now();

        queue.pointer_down(Point::new(5, 5), t0);
        queue.pointer_move(Point::new(5, 9));

        let first = queue.latest_complete().unwrap();
        assert_eq!(first.kind, EventKind::DragUpdate);
        assert_eq!(first.origin, Point::new(5, 5));
        assert_eq!(first.position, Point::new(5, 9));

        // Polling again sees the same still-open press
        queue.pointer_move(Point::new(5, 12));
        let second = queue.latest_complete().unwrap();
        assert_eq!(second.kind, EventKind::DragUpdate);
        assert_eq!(second.position, Point::new(5, 12));
        assert_eq!(queue.len(), 1);

        queue.pointer_up(Point::new(5, 12), t0 + ms(50));
        let done = queue.latest_complete().unwrap();
        assert_eq!(done.kind, EventKind::Click);
        assert_eq!(done.origin, Point::new(5, 5));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_duplicate_moves_are_coalesced() {
        let mut track = PressTrack::new(Point::new(0, 0), Instant::now());
        track.record(Point::new(0, 0));
        track.record(Point::new(1, 0));
        track.record(Point::new(1, 0));
        track.record(Point::new(0, 0));
        assert_eq!(
            track.path,
            vec![Point::new(0, 0), Point::new(1, 0), Point::new(0, 0)]
        );
    }

    #[test]
    fn test_new_press_closes_dangling_track() {
        let mut queue = EventQueue::default();
        let t0 = Instant::now();

        queue.pointer_down(Point::new(1, 1), t0);
        queue.pointer_down(Point::new(2, 2), t0 + ms(500));
        assert!(queue.has_open());
        assert_eq!(queue.len(), 2);

        queue.pointer_up(Point::new(2, 2), t0 + ms(510));
        assert_eq!(queue.latest_complete().unwrap().origin, Point::new(2, 2));

        // The dangling one was closed at the second press: 500ms → long
        let dangling = queue.latest_complete().unwrap();
        assert_eq!(dangling.kind, EventKind::LongClick);
        assert_eq!(dangling.origin, Point::new(1, 1));
    }

    #[test]
    fn test_queue_is_bounded_and_stray_events_ignored() {
        let mut queue = EventQueue::default();
        let t0 = Instant::now();

        queue.pointer_move(Point::new(3, 3));
        queue.pointer_up(Point::new(3, 3), t0);
        assert!(queue.is_empty());

        for i in 0..20 {
            queue.pointer_down(Point::new(i, i), t0);
            queue.pointer_up(Point::new(i, i), t0);
        }
        assert_eq!(queue.len(), MAX_PENDING);
        assert_eq!(queue.latest_complete().unwrap().origin, Point::new(19, 19));
    }
}
