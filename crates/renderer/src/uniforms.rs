use lensing::Vec2;

use crate::runtime::TimeSample;

/// Per-frame values shared read-only by every pixel invocation.
///
/// A new snapshot is built in full before each frame starts; nothing mutates
/// it while pixels are being shaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub resolution: (u32, u32),
    /// Seconds since the session started, never decreasing.
    pub time: f32,
    /// Seconds since the previous frame.
    pub time_delta: f32,
    pub frame: u64,
}

impl FrameUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: (width.max(1), height.max(1)),
            time: 0.0,
            time_delta: 0.0,
            frame: 0,
        }
    }

    pub fn resolution_vec(&self) -> Vec2 {
        Vec2::new(self.resolution.0 as f32, self.resolution.1 as f32)
    }

    /// Builds the snapshot for the next frame from a time sample.
    ///
    /// Samples that step backwards (a reset clock, float rounding) are clamped
    /// so `time` stays monotonic and `time_delta` never goes negative.
    pub fn advance(&self, sample: TimeSample, width: u32, height: u32) -> Self {
        let time = if sample.frame_index == 0 {
            sample.seconds.max(0.0)
        } else {
            sample.seconds.max(self.time)
        };
        Self {
            resolution: (width.max(1), height.max(1)),
            time,
            time_delta: if sample.frame_index == 0 { 0.0 } else { time - self.time },
            frame: sample.frame_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_has_no_delta() {
        let sample = TimeSample::new(0.25, 0);
        let uniforms = FrameUniforms::new(80, 60).advance(sample, 80, 60);
        assert_eq!(uniforms.time, 0.25);
        assert_eq!(uniforms.time_delta, 0.0);
        assert_eq!(uniforms.frame, 0);
    }

    #[test]
    fn time_never_runs_backwards() {
        let mut uniforms = FrameUniforms::new(80, 60);
        let samples = [(0.0, 0), (0.5, 1), (0.4, 2), (1.0, 3)];
        let mut last = 0.0;
        for (seconds, frame) in samples {
            uniforms = uniforms.advance(TimeSample::new(seconds, frame), 80, 60);
            assert!(uniforms.time >= last);
            assert!(uniforms.time_delta >= 0.0);
            assert_eq!(uniforms.frame, frame);
            last = uniforms.time;
        }
        assert_eq!(uniforms.time, 1.0);
        assert!((uniforms.time_delta - 0.5).abs() < 1e-6);
    }

    #[test]
    fn resolution_follows_latest_size() {
        let sample = TimeSample::new(0.0, 0);
        let uniforms = FrameUniforms::new(80, 60).advance(sample, 120, 0);
        assert_eq!(uniforms.resolution, (120, 1));
        assert_eq!(uniforms.resolution_vec(), Vec2::new(120.0, 1.0));
    }
}
