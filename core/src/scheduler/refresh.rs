//! Display-refresh hosts
//!
//! The scheduler never loops on its own; it asks the host for the next
//! refresh opportunity and is ticked when it arrives.

use std::sync::Arc;

use winit::window::Window;

/// Identifies one requested refresh so it can be cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshHandle(pub u64);

/// Platform per-display-refresh callback
pub trait RefreshHost {
    /// Ask for one more refresh callback.
    fn request_refresh(&mut self) -> RefreshHandle;

    /// Withdraw a request. Unknown or already-fired handles are ignored.
    fn cancel_refresh(&mut self, handle: RefreshHandle);
}

/// Refresh host backed by a winit window.
///
/// `request_refresh` asks for a redraw; the application ticks the scheduler
/// from `WindowEvent::RedrawRequested` when [`take_pending`](Self::take_pending)
/// reports an outstanding request.
pub struct WindowRefreshHost {
    window: Arc<Window>,
    next_id: u64,
    pending: Option<RefreshHandle>,
}

impl WindowRefreshHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 0,
            pending: None,
        }
    }

    /// Consume the outstanding request, if any
    pub fn take_pending(&mut self) -> Option<RefreshHandle> {
        self.pending.take()
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl RefreshHost for WindowRefreshHost {
    fn request_refresh(&mut self) -> RefreshHandle {
        self.next_id += 1;
        let handle = RefreshHandle(self.next_id);
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_refresh(&mut self, handle: RefreshHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// Refresh host driven by hand, for headless loops and tests.
#[derive(Debug, Default)]
pub struct ManualRefreshHost {
    next_id: u64,
    pending: Option<RefreshHandle>,
    requests: u64,
    cancels: u64,
}

impl ManualRefreshHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the outstanding request. The caller should tick the scheduler
    /// only when this returns `Some`.
    pub fn fire(&mut self) -> Option<RefreshHandle> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Total refreshes requested so far
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Total requests withdrawn while still pending
    pub fn cancels(&self) -> u64 {
        self.cancels
    }
}

impl RefreshHost for ManualRefreshHost {
    fn request_refresh(&mut self) -> RefreshHandle {
        self.next_id += 1;
        self.requests += 1;
        let handle = RefreshHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_refresh(&mut self, handle: RefreshHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancels += 1;
        }
    }
}
