use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::AbortHandle;
use tracing::debug;

use crate::form::response::Status;
use crate::surface::surface::Surface;

/// How long a banner stays up unless dismissed.
pub const DISPLAY_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: Status,
    pub created_at_ms: u128,
}

impl Notification {
    pub fn now(message: impl Into<String>, kind: Status) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
        }
    }
}

/// Renders transient banners on a surface and takes them down again.
///
/// Banners are independent: no dedup, no queue. Must be used from within a
/// Tokio runtime, the removal timer is a spawned task.
#[derive(Clone)]
pub struct Notifier {
    surface: Arc<dyn Surface>,
    display: Duration,
    next_id: Arc<AtomicU64>,
}

impl Notifier {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self::with_display(surface, DISPLAY_DURATION)
    }

    pub fn with_display(surface: Arc<dyn Surface>, display: Duration) -> Self {
        Self {
            surface,
            display,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn display_duration(&self) -> Duration {
        self.display
    }

    pub fn notify(&self, message: impl Into<String>, kind: Status) -> NotificationHandle {
        let id = NotificationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let notification = Notification::now(message, kind);

        self.surface.render_notification(id, &notification);
        debug!(notification = %id, kind = %kind, "notification shown");

        let banner = Arc::new(Banner {
            id,
            removed: AtomicBool::new(false),
            surface: Arc::clone(&self.surface),
            timer: Mutex::new(None),
        });

        let expiring = Arc::clone(&banner);
        let display = self.display;
        let task = tokio::spawn(async move {
            tokio::time::sleep(display).await;
            if expiring.take_down() {
                debug!(notification = %expiring.id, "notification expired");
            }
        });

        if let Ok(mut timer) = banner.timer.lock() {
            *timer = Some(task.abort_handle());
        }

        NotificationHandle { banner }
    }
}

struct Banner {
    id: NotificationId,
    removed: AtomicBool,
    surface: Arc<dyn Surface>,
    timer: Mutex<Option<AbortHandle>>,
}

impl Banner {
    /// Remove the banner from the surface. Returns false if it was already gone.
    fn take_down(&self) -> bool {
        if self.removed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.surface.remove_notification(self.id);
        true
    }
}

/// Handle to a rendered banner.
#[derive(Clone)]
pub struct NotificationHandle {
    banner: Arc<Banner>,
}

impl NotificationHandle {
    pub fn id(&self) -> NotificationId {
        self.banner.id
    }

    pub fn is_visible(&self) -> bool {
        !self.banner.removed.load(Ordering::SeqCst)
    }

    /// Remove the banner now and cancel its timer. Calling it again is a no-op.
    pub fn dismiss(&self) {
        if !self.banner.take_down() {
            return;
        }
        if let Ok(mut timer) = self.banner.timer.lock() {
            if let Some(task) = timer.take() {
                task.abort();
            }
        }
        debug!(notification = %self.banner.id, "notification dismissed");
    }
}

impl fmt::Debug for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHandle")
            .field("id", &self.banner.id)
            .field("visible", &self.is_visible())
            .finish()
    }
}
