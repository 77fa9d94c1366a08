//! Bookmark synchronization: keeps a user's stored bookmark set and the
//! per-card icon glyph consistent across asynchronous toggles.
//!
//! The flip is decided from the state the card last *rendered*, never
//! from a fresh membership read, and each toggle issues exactly one
//! atomic set mutation. Two rapid toggles of the same hike therefore
//! cannot lose an update; the icon's `Pending` state guards against
//! double submission while a mutation is in flight.

use tracing::error;

use crate::{error::AppError, services::store::HikeStore};

/// Membership state a card rendered for one hike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkState {
    Saved,
    Unsaved,
}

impl BookmarkState {
    pub fn from_saved(saved: bool) -> Self {
        if saved {
            Self::Saved
        } else {
            Self::Unsaved
        }
    }

    fn toggled(self) -> Self {
        match self {
            Self::Saved => Self::Unsaved,
            Self::Unsaved => Self::Saved,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Saved => "bookmark",
            Self::Unsaved => "bookmark_border",
        }
    }
}

/// The store mutation a press resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkAction {
    Add,
    Remove,
}

/// Per-icon state machine: `Unsaved` and `Saved` at rest, `Pending`
/// while a mutation is in flight. Cards render their initial glyph
/// through an icon at rest; `Pending` models the client-side window
/// between press and response, which a full-page POST settles within a
/// single request, so that glyph never reaches a template here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkIcon {
    state: IconState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IconState {
    Rest(BookmarkState),
    /// Holds the pre-press state so a failed mutation can restore it.
    Pending(BookmarkState),
}

impl BookmarkIcon {
    pub fn new(saved: bool) -> Self {
        Self {
            state: IconState::Rest(BookmarkState::from_saved(saved)),
        }
    }

    /// Press the icon. At rest this enters `Pending` and yields the
    /// mutation to run; while pending it yields nothing, so a second
    /// click during network latency cannot double-submit.
    pub fn press(&mut self) -> Option<BookmarkAction> {
        match self.state {
            IconState::Rest(prior) => {
                self.state = IconState::Pending(prior);
                Some(match prior {
                    BookmarkState::Unsaved => BookmarkAction::Add,
                    BookmarkState::Saved => BookmarkAction::Remove,
                })
            }
            IconState::Pending(_) => None,
        }
    }

    /// Settle the in-flight mutation: success lands on the toggled
    /// state, failure restores the pre-press state. Settling an icon at
    /// rest is a no-op.
    pub fn settle(&mut self, succeeded: bool) {
        if let IconState::Pending(prior) = self.state {
            self.state = IconState::Rest(if succeeded { prior.toggled() } else { prior });
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, IconState::Pending(_))
    }

    pub fn glyph(&self) -> &'static str {
        match self.state {
            IconState::Rest(state) => state.glyph(),
            IconState::Pending(_) => "hourglass_empty",
        }
    }
}

/// Reconciles bookmark membership between the store and the UI.
#[derive(Clone)]
pub struct BookmarkSync {
    store: HikeStore,
}

impl BookmarkSync {
    pub fn new(store: HikeStore) -> Self {
        Self { store }
    }

    /// Flip membership of `hike_id` in the user's bookmark set, based on
    /// the state the card rendered. Exactly one store mutation, chosen
    /// without a client-side membership read. Returns the state the icon
    /// should now show.
    pub async fn toggle(
        &self,
        user_uuid: &str,
        hike_id: &str,
        rendered: BookmarkState,
    ) -> Result<BookmarkState, AppError> {
        match rendered {
            BookmarkState::Unsaved => self.store.add_bookmark(user_uuid, hike_id).await?,
            BookmarkState::Saved => self.store.remove_bookmark(user_uuid, hike_id).await?,
        }
        Ok(rendered.toggled())
    }

    /// Handler-boundary wrapper: failures are logged and the pre-toggle
    /// state is returned unchanged, so the glyph never flips on error.
    pub async fn toggle_logged(
        &self,
        user_uuid: &str,
        hike_id: &str,
        rendered: BookmarkState,
    ) -> BookmarkState {
        match self.toggle(user_uuid, hike_id, rendered).await {
            Ok(next) => next,
            Err(err) => {
                error!("error toggling bookmark for hike {hike_id}: {err}");
                rendered
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_from_unsaved_requests_add() {
        let mut icon = BookmarkIcon::new(false);
        assert_eq!(icon.press(), Some(BookmarkAction::Add));
        assert!(icon.is_pending());
        assert_eq!(icon.glyph(), "hourglass_empty");
    }

    #[test]
    fn press_from_saved_requests_remove() {
        let mut icon = BookmarkIcon::new(true);
        assert_eq!(icon.press(), Some(BookmarkAction::Remove));
    }

    #[test]
    fn pending_icon_ignores_second_press() {
        let mut icon = BookmarkIcon::new(false);
        assert!(icon.press().is_some());
        assert_eq!(icon.press(), None);
    }

    #[test]
    fn successful_settle_lands_on_toggled_state() {
        let mut icon = BookmarkIcon::new(false);
        icon.press();
        icon.settle(true);
        assert_eq!(icon.glyph(), "bookmark");

        icon.press();
        icon.settle(true);
        assert_eq!(icon.glyph(), "bookmark_border");
    }

    #[test]
    fn failed_settle_restores_prior_glyph() {
        let mut icon = BookmarkIcon::new(true);
        icon.press();
        icon.settle(false);
        assert_eq!(icon.glyph(), "bookmark");
        assert!(!icon.is_pending());
    }

    #[test]
    fn settle_at_rest_is_a_no_op() {
        let mut icon = BookmarkIcon::new(false);
        icon.settle(true);
        assert_eq!(icon.glyph(), "bookmark_border");
    }
}
