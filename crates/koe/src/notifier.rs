use koe_core::{KoeError, NotificationKind, Notifier};
use notify_rust::Notification;
use tracing::{debug, instrument, warn};

const APP_NAME: &str = "koe";

/// Desktop notifications through the freedesktop notification service.
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    #[instrument(skip(self, error))]
    fn notify(&self, kind: NotificationKind, error: Option<&KoeError>) {
        let (title, body) = notification_payload(kind, error);

        match Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(&body)
            .show()
        {
            Ok(_) => debug!(title, "Notification shown"),
            Err(e) => warn!(error = %e, "Failed to show notification"),
        }
    }
}

/// Title and body for a notification.
///
/// Lock, focus and dependency problems get their own title and carry the
/// error message, or a fixed fallback without one. Everything else is
/// titled "Koe" with the error message, or the kind spelled out.
pub(crate) fn notification_payload(
    kind: NotificationKind,
    error: Option<&KoeError>,
) -> (&'static str, String) {
    let with_fallback = |fallback: &str| {
        error
            .map(|e| e.message().to_string())
            .unwrap_or_else(|| fallback.to_string())
    };

    match kind {
        NotificationKind::AlreadyRunning => (
            "Koe already running",
            with_fallback("Another Koe invocation is active."),
        ),
        NotificationKind::ErrorFocus => (
            "Koe focus required",
            with_fallback("No focused window is available."),
        ),
        NotificationKind::ErrorDependency => (
            "Koe dependency issue",
            with_fallback("A required dependency is missing."),
        ),
        other => ("Koe", with_fallback(&other.as_str().replace('_', " "))),
    }
}
