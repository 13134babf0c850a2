//! Humanized pacing for navigation, scrolling, and clicks.
//!
//! Fixed-interval automation is the cheapest signature for a detector to
//! match, so every action the engine takes goes through a uniformly sampled
//! delay. The named ranges mirror the cadence of a person reading a results
//! page: longer between pages, shorter between records.

use chromiumoxide::Page;
use rand::RngExt;
use std::time::Duration;

use crate::core::error::EngineError;

/// Inclusive millisecond range for one sampled pause.
#[derive(Debug, Clone, Copy)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

/// General-purpose pause between coarse actions.
pub const DEFAULT: DelayRange = DelayRange { min_ms: 2_000, max_ms: 5_000 };
/// Post-navigation settle, letting client-rendered content land.
pub const SETTLE: DelayRange = DelayRange { min_ms: 3_000, max_ms: 5_000 };
/// Between individual records on a results page.
pub const RECORD: DelayRange = DelayRange { min_ms: 500, max_ms: 1_500 };
/// After returning from a detail excursion to the results list.
pub const RETURN: DelayRange = DelayRange { min_ms: 1_000, max_ms: 2_000 };
/// After each scroll step.
pub const SCROLL: DelayRange = DelayRange { min_ms: 1_000, max_ms: 3_000 };

/// Suspend the calling flow for a uniformly sampled duration within `range`.
pub async fn pause(range: DelayRange) {
    // Sample before the await point; the thread rng is not Send.
    let ms = {
        let mut rng = rand::rng();
        rng.random_range(range.min_ms..=range.max_ms)
    };
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Issue `times` scroll actions, each a uniform 300–800 px distance followed
/// by a scroll-range pause. A dead page surfaces as a single generic
/// navigation error.
pub async fn scroll(page: &Page, times: usize) -> Result<(), EngineError> {
    for _ in 0..times {
        let px = {
            let mut rng = rand::rng();
            rng.random_range(300u32..=800)
        };
        page.evaluate(format!("window.scrollBy(0, {})", px))
            .await
            .map_err(|e| EngineError::nav("scroll failed", e))?;
        pause(SCROLL).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_ordered() {
        for r in [DEFAULT, SETTLE, RECORD, RETURN, SCROLL] {
            assert!(r.min_ms <= r.max_ms);
        }
    }

    #[tokio::test]
    async fn pause_stays_within_range() {
        let range = DelayRange { min_ms: 10, max_ms: 30 };
        let start = std::time::Instant::now();
        pause(range).await;
        let elapsed = start.elapsed().as_millis() as u64;
        assert!(elapsed >= 10, "paused only {}ms", elapsed);
        // Generous upper bound; scheduling jitter on loaded CI machines.
        assert!(elapsed < 1_000, "paused {}ms", elapsed);
    }
}
