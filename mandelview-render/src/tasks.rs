//! Work that must run on the render thread between frames.

use std::collections::VecDeque;

/// Deferred frame-loop work, queued by the UI and drained by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTask {
    /// Recreate the compute resources at the current resolution.
    RebuildResources,
    /// Flip frame recording on or off.
    ToggleRecording,
}

/// FIFO of tasks submitted from the UI, executed by the render thread.
///
/// Consecutive [`FrameTask::RebuildResources`] requests collapse into one.
#[derive(Debug)]
pub struct MainThreadQueue<T> {
    pending: VecDeque<T>,
}

impl<T> Default for MainThreadQueue<T> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }
}

impl<T> MainThreadQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending task, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.pending.drain(..).collect()
    }
}

impl MainThreadQueue<FrameTask> {
    pub fn submit(&mut self, task: FrameTask) {
        if task == FrameTask::RebuildResources
            && self.pending.back() == Some(&FrameTask::RebuildResources)
        {
            return;
        }
        self.pending.push_back(task);
    }

    /// Whether a rebuild is waiting to run.
    pub fn rebuild_pending(&self) -> bool {
        self.pending.contains(&FrameTask::RebuildResources)
    }
}
