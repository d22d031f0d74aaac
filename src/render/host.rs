use super::{
    properties::WindowSize,
    scheduler::{FrameHandle, FrameScheduler, TaskId, TimerHandle},
};
use std::{collections::VecDeque, time::Duration};

/// The state of a component after it handled a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PollableState {
    Unmodified,
    Modified,
    Done,
}

impl PollableState {
    /// Combines the outcome of two tasks run in the same frame.
    pub(crate) fn merge(self, other: PollableState) -> PollableState {
        use PollableState::*;
        match (self, other) {
            (Modified, _) | (_, Modified) => Modified,
            (Done, _) | (_, Done) => Done,
            _ => Unmodified,
        }
    }
}

/// A registered resize listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ListenerHandle(u64);

/// Something that runs inside a [Host].
pub(crate) trait Component<T> {
    fn run(&mut self, task: T, host: &mut Host<T>) -> PollableState;
}

#[derive(Debug)]
enum Pending {
    Scheduled(TaskId),
    Resize(ListenerHandle),
}

/// The environment a component lives in: a clock, a window, frame callbacks, timers and resize
/// notifications.
///
/// Hosts are driven from the outside: the presenter moves the clock forward with
/// [Host::begin_frame] or reports a new window with [Host::resize] and then calls [Host::pump] to let
/// components handle everything that became due.
#[derive(Debug)]
pub(crate) struct Host<T> {
    now: Duration,
    window: WindowSize,
    scheduler: FrameScheduler<T>,
    listeners: Vec<(ListenerHandle, T)>,
    next_listener: u64,
    pending: VecDeque<Pending>,
}

impl<T: Clone> Host<T> {
    pub(crate) fn new(window: WindowSize) -> Self {
        Self {
            now: Duration::ZERO,
            window,
            scheduler: FrameScheduler::default(),
            listeners: Vec::new(),
            next_listener: 0,
            pending: VecDeque::new(),
        }
    }

    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    pub(crate) fn window(&self) -> WindowSize {
        self.window
    }

    pub(crate) fn request_animation_frame(&mut self, task: T) -> FrameHandle {
        self.scheduler.request_frame(task)
    }

    pub(crate) fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        self.scheduler.cancel_frame(handle);
    }

    pub(crate) fn set_timeout(&mut self, delay: Duration, task: T) -> TimerHandle {
        self.scheduler.set_timeout(self.now, delay, task)
    }

    pub(crate) fn clear_timeout(&mut self, handle: TimerHandle) {
        self.scheduler.clear_timeout(handle);
    }

    pub(crate) fn add_resize_listener(&mut self, task: T) -> ListenerHandle {
        let handle = ListenerHandle(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((handle, task));
        handle
    }

    pub(crate) fn remove_resize_listener(&mut self, handle: ListenerHandle) {
        self.listeners.retain(|(listener, _)| *listener != handle);
    }

    /// Advances the clock and queues every task that is now due.
    ///
    /// The clock never goes backwards.
    pub(crate) fn begin_frame(&mut self, now: Duration) {
        self.now = self.now.max(now);
        let due = self.scheduler.due(self.now);
        self.pending.extend(due.into_iter().map(Pending::Scheduled));
    }

    /// Records a new window size and queues a notification for every resize listener.
    pub(crate) fn resize(&mut self, window: WindowSize) {
        self.window = window;
        let listeners = self.listeners.iter().map(|(handle, _)| Pending::Resize(*handle));
        self.pending.extend(listeners.collect::<Vec<_>>());
    }

    /// Runs every queued task on the component.
    pub(crate) fn pump<C: Component<T>>(&mut self, component: &mut C) -> PollableState {
        let mut state = PollableState::Unmodified;
        while let Some(task) = self.next_task() {
            state = state.merge(component.run(task, self));
        }
        state
    }

    pub(crate) fn pending_frames(&self) -> usize {
        self.scheduler.pending_frames()
    }

    pub(crate) fn pending_timers(&self) -> usize {
        self.scheduler.pending_timers()
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether nothing is registered at all.
    #[cfg(test)]
    pub(crate) fn is_quiet(&self) -> bool {
        self.pending_frames() == 0 && self.pending_timers() == 0 && self.listeners.is_empty()
    }

    fn next_task(&mut self) -> Option<T> {
        while let Some(pending) = self.pending.pop_front() {
            let task = match pending {
                Pending::Scheduled(id) => self.scheduler.take(id),
                Pending::Resize(handle) => {
                    self.listeners.iter().find(|(listener, _)| *listener == handle).map(|(_, task)| task.clone())
                }
            };
            if task.is_some() {
                return task;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Task {
        Tick,
        Resized,
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(Task, Duration)>,
        reschedule: bool,
    }

    impl Component<Task> for Recorder {
        fn run(&mut self, task: Task, host: &mut Host<Task>) -> PollableState {
            self.seen.push((task.clone(), host.now()));
            if task == Task::Tick && self.reschedule {
                host.request_animation_frame(Task::Tick);
            }
            PollableState::Modified
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn frames_repeat_once_per_pump() {
        let mut host = Host::new(WindowSize::new(100, 100));
        let mut recorder = Recorder { reschedule: true, ..Default::default() };
        host.request_animation_frame(Task::Tick);
        for frame in 1..=3 {
            host.begin_frame(ms(frame * 16));
            assert_eq!(host.pump(&mut recorder), PollableState::Modified);
        }
        assert_eq!(recorder.seen.len(), 3);
        assert_eq!(recorder.seen[2].1, ms(48));
    }

    #[test]
    fn resize_notifies_listeners_with_the_new_window() {
        let mut host = Host::new(WindowSize::new(100, 100));
        let mut recorder = Recorder::default();
        let listener = host.add_resize_listener(Task::Resized);
        host.resize(WindowSize::new(300, 200));
        host.pump(&mut recorder);
        assert_eq!(recorder.seen, vec![(Task::Resized, Duration::ZERO)]);
        assert_eq!(host.window(), WindowSize::new(300, 200));

        host.remove_resize_listener(listener);
        host.resize(WindowSize::new(10, 10));
        assert_eq!(host.pump(&mut recorder), PollableState::Unmodified);
        assert!(host.is_quiet());
    }

    #[test]
    fn clock_is_monotonic() {
        let mut host: Host<Task> = Host::new(WindowSize::new(1, 1));
        host.begin_frame(ms(50));
        host.begin_frame(ms(10));
        assert_eq!(host.now(), ms(50));
    }

    #[test]
    fn merge_prefers_modified() {
        assert_eq!(PollableState::Done.merge(PollableState::Modified), PollableState::Modified);
        assert_eq!(PollableState::Unmodified.merge(PollableState::Done), PollableState::Done);
    }
}
