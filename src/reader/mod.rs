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


//! The reading flow: import, navigation, rendering, progress
//!
//! Everything here is in-memory session state layered over the store.
//! Navigation is latency-sensitive and never waits on persistence; progress
//! writes ride the deferred task queue and failures stay in the log.

pub mod progress;
pub mod render;
pub mod session;
pub mod stats;
pub mod upload;

// Re-export commonly used types
pub use progress::ProgressTracker;
pub use render::{PageRenderer, RenderSlot};
pub use session::{ReadingSession, SessionStats};
pub use stats::PaceTracker;
pub use upload::UploadPolicy;
