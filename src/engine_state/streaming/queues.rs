//! The five work queues of the streaming pipeline.
//!
//! Queues hold column coordinates in FIFO order. Duplicates are allowed: a
//! column in both the old and the new footprint of a moving player appears on
//! the Unload and the Load queue, and every drain step is written to cope with
//! repeated or stale entries.

use std::collections::VecDeque;

use cgmath::Point2;

/// Identifies one of the pipeline queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Load,
    Setup,
    Teardown,
    Unload,
    Save,
}

impl QueueKind {
    pub const ALL: [QueueKind; 5] = [
        QueueKind::Load,
        QueueKind::Setup,
        QueueKind::Teardown,
        QueueKind::Unload,
        QueueKind::Save,
    ];
}

/// Pending column coordinates per pipeline stage.
#[derive(Debug, Default)]
pub struct ChunkQueues {
    load: VecDeque<Point2<i32>>,
    setup: VecDeque<Point2<i32>>,
    teardown: VecDeque<Point2<i32>>,
    unload: VecDeque<Point2<i32>>,
    save: VecDeque<Point2<i32>>,
}

impl ChunkQueues {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, kind: QueueKind) -> &VecDeque<Point2<i32>> {
        match kind {
            QueueKind::Load => &self.load,
            QueueKind::Setup => &self.setup,
            QueueKind::Teardown => &self.teardown,
            QueueKind::Unload => &self.unload,
            QueueKind::Save => &self.save,
        }
    }

    fn queue_mut(&mut self, kind: QueueKind) -> &mut VecDeque<Point2<i32>> {
        match kind {
            QueueKind::Load => &mut self.load,
            QueueKind::Setup => &mut self.setup,
            QueueKind::Teardown => &mut self.teardown,
            QueueKind::Unload => &mut self.unload,
            QueueKind::Save => &mut self.save,
        }
    }

    pub fn push(&mut self, kind: QueueKind, column: Point2<i32>) {
        self.queue_mut(kind).push_back(column);
    }

    pub fn extend(&mut self, kind: QueueKind, columns: impl IntoIterator<Item = Point2<i32>>) {
        self.queue_mut(kind).extend(columns);
    }

    pub fn pop(&mut self, kind: QueueKind) -> Option<Point2<i32>> {
        self.queue_mut(kind).pop_front()
    }

    /// Removes up to `budget` entries from the front of a queue.
    pub fn take(&mut self, kind: QueueKind, budget: usize) -> Vec<Point2<i32>> {
        let queue = self.queue_mut(kind);
        let count = budget.min(queue.len());
        queue.drain(..count).collect()
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        self.queue(kind).len()
    }

    pub fn is_empty(&self, kind: QueueKind) -> bool {
        self.queue(kind).is_empty()
    }

    /// Number of entries over all queues.
    pub fn total_len(&self) -> usize {
        QueueKind::ALL.iter().map(|&kind| self.len(kind)).sum()
    }

    /// The entries of a queue in drain order.
    pub fn iter(&self, kind: QueueKind) -> impl Iterator<Item = Point2<i32>> + '_ {
        self.queue(kind).iter().copied()
    }
}
