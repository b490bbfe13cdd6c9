// Folio - Offline Document Reader
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Sequencing of page renders onto a single display surface
//!
//! A reader shows one page at a time. When the user turns the page while the
//! previous render is still in flight, the stale render must be cancelled
//! before the new one starts, or the two would race for the surface.
//! [`RenderSlot`] owns that handover; the actual rasterization lives behind
//! the [`PageRenderer`] trait and is not this crate's concern.

use std::sync::Mutex;

use crate::error::{FolioError, Result};
use crate::tasks::CancelToken;

/// A rendering engine capable of drawing one page of a document
///
/// Implementations should check `token` at reasonable intervals and bail out
/// with [`FolioError::Cancelled`] once it trips; partially drawn output must
/// be cleared by the implementation before the next render uses the surface.
pub trait PageRenderer: Send + Sync {
    /// What a finished render produces (an image handle, a frame id, ...)
    type Output;

    fn render_page(&self, data: &[u8], page: u32, token: &CancelToken) -> Result<Self::Output>;
}

/// Single-surface render coordinator
///
/// At most one render occupies the slot; claiming it cancels whichever render
/// held it before. Cancellation is a benign outcome: callers see
/// [`FolioError::Cancelled`] and drop it.
#[derive(Debug, Default)]
pub struct RenderSlot {
    in_flight: Mutex<Option<CancelToken>>,
}

impl RenderSlot {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(None),
        }
    }

    /// Claim the slot for a new render, cancelling the one in flight
    ///
    /// Returns the token the new render must watch.
    pub fn begin(&self) -> CancelToken {
        let mut slot = self.in_flight.lock().unwrap();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        let token = CancelToken::new();
        *slot = Some(token.clone());
        token
    }

    /// Release the slot once a render finishes
    ///
    /// A stale token (one that was already superseded by [`Self::begin`])
    /// leaves the slot untouched.
    pub fn finish(&self, token: &CancelToken) {
        let mut slot = self.in_flight.lock().unwrap();
        if let Some(current) = slot.as_ref() {
            if current.shares_state_with(token) {
                *slot = None;
            }
        }
    }

    /// Cancel the render in flight, if any, without starting a new one
    pub fn cancel_in_flight(&self) {
        let mut slot = self.in_flight.lock().unwrap();
        if let Some(current) = slot.take() {
            current.cancel();
        }
    }

    /// Whether a render currently occupies the slot
    pub fn is_busy(&self) -> bool {
        self.in_flight.lock().unwrap().is_some()
    }

    /// Render `page` through the slot
    ///
    /// Claims the slot, runs the renderer, releases the slot. A
    /// [`FolioError::Cancelled`] return means a newer request superseded this
    /// one and should be ignored by the caller.
    pub fn display<R: PageRenderer>(
        &self,
        renderer: &R,
        data: &[u8],
        page: u32,
    ) -> Result<R::Output> {
        let token = self.begin();
        let result = renderer.render_page(data, page, &token);
        self.finish(&token);

        match &result {
            Ok(_) => {}
            Err(err) if err.is_cancelled() => {
                log::debug!("Render of page {} superseded", page);
            }
            Err(err) => {
                log::warn!("Render of page {} failed: {}", page, err);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Renders "successfully" by echoing the page number
    struct EchoRenderer {
        calls: AtomicUsize,
    }

    impl EchoRenderer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PageRenderer for EchoRenderer {
        type Output = u32;

        fn render_page(&self, _data: &[u8], page: u32, token: &CancelToken) -> Result<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if token.is_cancelled() {
                return Err(FolioError::Cancelled);
            }
            Ok(page)
        }
    }

    /// Always observes cancellation before drawing anything
    struct SupersededRenderer;

    impl PageRenderer for SupersededRenderer {
        type Output = ();

        fn render_page(&self, _data: &[u8], _page: u32, _token: &CancelToken) -> Result<()> {
            Err(FolioError::Cancelled)
        }
    }

    /// Fails the way a real engine does on a corrupt page
    struct BrokenRenderer;

    impl PageRenderer for BrokenRenderer {
        type Output = ();

        fn render_page(&self, _data: &[u8], page: u32, _token: &CancelToken) -> Result<()> {
            Err(FolioError::RenderFailed(format!("page {} is corrupt", page)))
        }
    }

    #[test]
    fn test_display_renders_and_releases_slot() {
        let slot = RenderSlot::new();
        let renderer = EchoRenderer::new();

        let output = slot.display(&renderer, &[1, 2, 3], 7).unwrap();
        assert_eq!(output, 7);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_begin_cancels_previous_render() {
        let slot = RenderSlot::new();

        let first = slot.begin();
        let second = slot.begin();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(slot.is_busy());
    }

    #[test]
    fn test_finish_ignores_stale_token() {
        let slot = RenderSlot::new();

        let stale = slot.begin();
        let current = slot.begin();

        slot.finish(&stale);
        assert!(slot.is_busy());

        slot.finish(&current);
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_cancelled_render_surfaces_as_benign_error() {
        let slot = RenderSlot::new();

        let err = slot.display(&SupersededRenderer, &[], 2).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_render_failure_surfaces_and_releases_slot() {
        let slot = RenderSlot::new();

        let err = slot.display(&BrokenRenderer, &[], 4).unwrap_err();
        assert!(matches!(err, FolioError::RenderFailed(_)));
        assert!(!err.is_cancelled());
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_slot_is_reusable_after_cancelled_render() {
        let slot = RenderSlot::new();
        let renderer = EchoRenderer::new();

        slot.display(&SupersededRenderer, &[], 2).unwrap_err();
        let output = slot.display(&renderer, &[], 3).unwrap();
        assert_eq!(output, 3);
    }

    #[test]
    fn test_cancel_in_flight_empties_the_slot() {
        let slot = RenderSlot::new();

        let token = slot.begin();
        slot.cancel_in_flight();

        assert!(token.is_cancelled());
        assert!(!slot.is_busy());
    }
}
