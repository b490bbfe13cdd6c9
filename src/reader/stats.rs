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


//! Reading pace measurement
//!
//! Tracks how fast the user moves through a document using a sliding window
//! of page positions, so a long pause at one page does not poison the
//! estimate forever.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Pace tracker with a sliding sample window
#[derive(Debug)]
pub struct PaceTracker {
    /// Samples within the time window
    samples: VecDeque<PageSample>,

    /// How far back samples count toward the average
    window_duration: Duration,

    /// When tracking started
    start_time: Instant,

    /// Positions recorded over the whole session, pruned or not
    pages_viewed: u64,
}

#[derive(Debug, Clone)]
struct PageSample {
    timestamp: Instant,
    page: u32,
}

impl PaceTracker {
    /// Default window: two minutes of reading
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(120))
    }

    pub fn with_window(window_duration: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            window_duration,
            start_time: Instant::now(),
            pages_viewed: 0,
        }
    }

    /// Record that the reader is now on `page`
    pub fn add_position(&mut self, page: u32) {
        let now = Instant::now();
        self.pages_viewed += 1;

        self.samples.push_back(PageSample {
            timestamp: now,
            page,
        });

        // Drop samples that aged out of the window
        while let Some(sample) = self.samples.front() {
            if now.duration_since(sample.timestamp) > self.window_duration {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Average pace over the window, in pages per minute
    ///
    /// Flipping backwards yields 0.0 rather than a negative pace.
    pub fn pages_per_minute(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }

        let first = self.samples.front().unwrap();
        let last = self.samples.back().unwrap();

        let pages_delta = last.page.saturating_sub(first.page);
        let time_delta = last.timestamp.duration_since(first.timestamp).as_secs_f64();

        if time_delta > 0.0 {
            (pages_delta as f64 / time_delta) * 60.0
        } else {
            0.0
        }
    }

    /// Estimate how long the remaining pages will take at the current pace
    pub fn estimate_time_remaining(&self, pages_remaining: u32) -> Option<Duration> {
        let pace = self.pages_per_minute();
        if pace > 0.0 {
            let minutes = pages_remaining as f64 / pace;
            Some(Duration::from_secs_f64(minutes * 60.0))
        } else {
            None
        }
    }

    /// Time since tracking started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Positions recorded since tracking started
    pub fn pages_viewed(&self) -> u64 {
        self.pages_viewed
    }
}

impl Default for PaceTracker {
    fn default() -> Self {
        Self::new()
    }
}
