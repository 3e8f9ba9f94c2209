use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::Profile;
use crate::foundation::error::FrameResult;
use crate::frame::Frame;

/// Opaque per-service-instance identifier used to scope per-frame state.
///
/// Tokens come from a process-wide counter, so two live services never share one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceToken(u64);

impl ServiceToken {
    /// Issue a fresh token.
    pub fn issue() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value, for logging.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A node of the processing graph as seen by a frame.
///
/// Releasing a service is dropping its last [`ServiceHandle`].
pub trait Service: Send + Sync {
    /// Token scoping this instance's per-frame state.
    fn token(&self) -> ServiceToken;

    /// Output geometry, when the service knows it.
    fn profile(&self) -> Option<Profile> {
        None
    }

    /// Numeric locale used by this service's properties.
    fn lc_numeric(&self) -> Option<String> {
        None
    }

    /// Produce the frame for `position`.
    fn get_frame(&self, position: i64) -> FrameResult<Frame>;
}

/// Shared handle to a service.
pub type ServiceHandle = Arc<dyn Service>;
