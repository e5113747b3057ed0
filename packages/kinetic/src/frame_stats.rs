//! Per-carousel frame counters.
//!
//! Cheap enough to run every frame: a few additions, and a debug log line
//! every [`LOG_INTERVAL`] frames.

/// How often to log a summary (every N frames).
pub const LOG_INTERVAL: u64 = 300; // ~5 seconds at 60fps

#[derive(Debug, Default, Clone)]
pub struct FrameStats {
    frames: u64,
    clamped_frames: u64,
    paused_frames: u64,
    applied_ms: f64,
    longest_gap_ms: f32,
    warned_clamp: bool,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame. `requested_ms` is what the host reported,
    /// `applied_ms` what the driver actually used.
    pub fn record(&mut self, requested_ms: f32, applied_ms: f32, paused: bool, visible: usize) {
        self.frames += 1;
        self.applied_ms += f64::from(applied_ms);
        if paused {
            self.paused_frames += 1;
        }
        if requested_ms.is_finite() && requested_ms > self.longest_gap_ms {
            self.longest_gap_ms = requested_ms;
        }
        if requested_ms.is_finite() && applied_ms < requested_ms {
            self.clamped_frames += 1;
            if !self.warned_clamp {
                self.warned_clamp = true;
                log::warn!(
                    "Frame gap of {:.1} ms clamped to {:.1} ms (further clamps are counted, not logged)",
                    requested_ms,
                    applied_ms
                );
            }
        }
        if self.frames % LOG_INTERVAL == 0 {
            log::debug!(
                "carousel frames={} paused={} clamped={} longest_gap={:.1}ms applied={:.0}ms visible={}",
                self.frames,
                self.paused_frames,
                self.clamped_frames,
                self.longest_gap_ms,
                self.applied_ms,
                visible
            );
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clamped_frames(&self) -> u64 {
        self.clamped_frames
    }

    pub fn paused_frames(&self) -> u64 {
        self.paused_frames
    }

    pub fn longest_gap_ms(&self) -> f32 {
        self.longest_gap_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_clamped_and_paused_frames() {
        let mut stats = FrameStats::new();
        stats.record(16.0, 16.0, false, 3);
        stats.record(2_000.0, 100.0, false, 3);
        stats.record(16.0, 16.0, true, 3);
        stats.record(-5.0, 0.0, false, 3);
        assert_eq!(stats.frames(), 4);
        assert_eq!(stats.clamped_frames(), 1);
        assert_eq!(stats.paused_frames(), 1);
        assert_eq!(stats.longest_gap_ms(), 2_000.0);
    }
}
