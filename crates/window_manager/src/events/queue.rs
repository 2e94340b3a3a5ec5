//! FIFO event queue with resize coalescing

use super::WindowEvent;
use crate::window::WindowId;
use std::collections::VecDeque;

/// Pending events, oldest first.
///
/// Not synchronized: producer (the pump) and consumer run on the same thread.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<WindowEvent>,
}

impl EventQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty queue with room for `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an event.
    ///
    /// A resize replaces the newest pending event when that one is a resize of
    /// the same window, so a continuous drag-resize leaves a single entry.
    pub fn push(&mut self, event: WindowEvent) {
        if let WindowEvent::Resize { window, .. } = event {
            if let Some(last) = self.events.back_mut() {
                if matches!(*last, WindowEvent::Resize { window: pending, .. } if pending == window) {
                    *last = event;
                    return;
                }
            }
        }
        self.events.push_back(event);
    }

    /// Pop up to `capacity` events into `out`, returning how many were moved
    pub fn drain_into(&mut self, out: &mut Vec<WindowEvent>, capacity: usize) -> usize {
        let count = capacity.min(self.events.len());
        out.extend(self.events.drain(..count));
        count
    }

    /// Pop the oldest event
    pub fn pop(&mut self) -> Option<WindowEvent> {
        self.events.pop_front()
    }

    /// Drop every pending event of one window, keeping the order of the rest
    pub fn purge_window(&mut self, window: WindowId) -> usize {
        let before = self.events.len();
        self.events.retain(|event| event.window_id() != window);
        before - self.events.len()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// No pending events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate pending events without removing them
    pub fn iter(&self) -> impl Iterator<Item = &WindowEvent> {
        self.events.iter()
    }
}
