//! User-facing notices raised by the auth flow.

use tracing::warn;

/// A message the user should see, independent of how it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Login is needed but no username/password is stored.
    MissingCredentials,
}

impl Notice {
    /// Returns the default English rendering of the notice.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingCredentials => {
                "This content requires a VIER/VIJF/ZES account. Store your credentials with `vier auth login`."
            }
        }
    }
}

/// Surfaces [`Notice`]s to the user.
pub trait Notifier: Send + Sync {
    /// Shows a notice.
    fn notify(&self, notice: Notice);
}

/// [`Notifier`] that writes notices to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        warn!(?notice, "{}", notice.message());
    }
}
