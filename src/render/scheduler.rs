use std::time::Duration;

/// Identifies a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TaskId(u64);

/// A pending "next animation frame" request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FrameHandle(TaskId);

/// A pending one-shot timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TimerHandle(TaskId);

#[derive(Debug)]
struct PendingTimer<T> {
    id: TaskId,
    deadline: Duration,
    task: T,
}

/// A single threaded scheduler of frame callbacks and timers.
///
/// Tasks are plain values handed back to the caller when they are due; the scheduler never runs
/// anything by itself. A frame request is due on the next frame after it was made, a timer is due on
/// the first frame at or after its deadline.
#[derive(Debug)]
pub(crate) struct FrameScheduler<T> {
    next_id: u64,
    frames: Vec<(TaskId, T)>,
    timers: Vec<PendingTimer<T>>,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self { next_id: 0, frames: Vec::new(), timers: Vec::new() }
    }
}

impl<T> FrameScheduler<T> {
    pub(crate) fn request_frame(&mut self, task: T) -> FrameHandle {
        let id = self.allocate();
        self.frames.push((id, task));
        FrameHandle(id)
    }

    pub(crate) fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|(id, _)| *id != handle.0);
    }

    pub(crate) fn set_timeout(&mut self, now: Duration, delay: Duration, task: T) -> TimerHandle {
        let id = self.allocate();
        self.timers.push(PendingTimer { id, deadline: now + delay, task });
        TimerHandle(id)
    }

    pub(crate) fn clear_timeout(&mut self, handle: TimerHandle) {
        self.timers.retain(|timer| timer.id != handle.0);
    }

    /// The tasks due at `now`: expired timers by deadline, then every pending frame request.
    ///
    /// Nothing is removed; use [FrameScheduler::take] to claim each one, so tasks cancelled while an
    /// earlier one runs are skipped.
    pub(crate) fn due(&self, now: Duration) -> Vec<TaskId> {
        let mut timers: Vec<_> = self.timers.iter().filter(|t| t.deadline <= now).collect();
        timers.sort_by_key(|t| (t.deadline, t.id));
        timers.into_iter().map(|t| t.id).chain(self.frames.iter().map(|(id, _)| *id)).collect()
    }

    /// Removes a task, returning it if it was still pending.
    pub(crate) fn take(&mut self, id: TaskId) -> Option<T> {
        if let Some(index) = self.frames.iter().position(|(frame, _)| *frame == id) {
            return Some(self.frames.remove(index).1);
        }
        let index = self.timers.iter().position(|timer| timer.id == id)?;
        Some(self.timers.remove(index).task)
    }

    pub(crate) fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    #[cfg(test)]
    pub(crate) fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    fn allocate(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }
}
