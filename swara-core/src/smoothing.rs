//! # Smoothing Module
//!
//! Post-processing for the dense, noisy segment streams of live input:
//! a 3-tap median to knock out single-frame spikes, then linear interpolation
//! across short dropouts.

use crate::segment::PitchSegment;

/// Default upper bound (exclusive) on the gaps bridged by [`fill_gaps`].
pub const DEFAULT_MAX_GAP_SECONDS: f64 = 1.5;

fn median3(a: f32, b: f32, c: f32) -> f32 {
    a.max(b).min(a.min(b).max(c))
}

/// Replaces each frequency with the median of itself and its neighbours in
/// list order. Edge segments reuse their own value for the missing neighbour.
///
/// Time spans are left untouched.
pub fn median_smooth(segments: Vec<PitchSegment>) -> Vec<PitchSegment> {
    let raw: Vec<f32> = segments.iter().map(|s| s.frequency).collect();
    let last = raw.len().saturating_sub(1);
    segments
        .into_iter()
        .enumerate()
        .map(|(i, mut segment)| {
            let prev = if i == 0 { raw[i] } else { raw[i - 1] };
            let next = if i == last { raw[i] } else { raw[i + 1] };
            segment.frequency = median3(prev, raw[i], next);
            segment
        })
        .collect()
}

/// Bridges gaps in `(0, max_gap)` seconds with interpolated segments.
///
/// A gap gets `max(1, round(gap / frame_period))` synthetic segments, each one
/// `frame_period` long starting at the earlier segment's end. Frequencies are
/// interpolated linearly at fractions `step / (steps + 1)`. Longer gaps are
/// kept as real silences.
pub fn fill_gaps(segments: Vec<PitchSegment>, frame_period: f64, max_gap: f64) -> Vec<PitchSegment> {
    let mut filled = Vec::with_capacity(segments.len());
    let mut iter = segments.into_iter().peekable();

    while let Some(current) = iter.next() {
        filled.push(current);
        let Some(next) = iter.peek() else { break };

        let gap = next.start_time - current.end_time;
        if gap <= 0.0 || gap >= max_gap || frame_period <= 0.0 {
            continue;
        }

        let steps = ((gap / frame_period).round() as usize).max(1);
        for step in 1..=steps {
            let fraction = step as f32 / (steps + 1) as f32;
            let start_time = current.end_time + (step - 1) as f64 * frame_period;
            filled.push(PitchSegment {
                start_time,
                end_time: start_time + frame_period,
                frequency: current.frequency + (next.frequency - current.frequency) * fraction,
                synthetic: true,
            });
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contiguous(freqs: &[f32]) -> Vec<PitchSegment> {
        freqs
            .iter()
            .enumerate()
            .map(|(i, &f)| PitchSegment::new(i as f64 * 0.01, (i + 1) as f64 * 0.01, f))
            .collect()
    }

    fn frequencies(segments: &[PitchSegment]) -> Vec<f32> {
        segments.iter().map(|s| s.frequency).collect()
    }

    #[test]
    fn isolated_spike_is_suppressed() {
        let smoothed = median_smooth(contiguous(&[220.0, 880.0, 225.0]));
        assert_eq!(frequencies(&smoothed), vec![220.0, 225.0, 225.0]);
    }

    #[test]
    fn monotone_runs_pass_through() {
        let rising = [200.0, 210.0, 220.0, 230.0];
        assert_eq!(frequencies(&median_smooth(contiguous(&rising))), rising.to_vec());
        let falling = [300.0, 290.0, 280.0];
        assert_eq!(frequencies(&median_smooth(contiguous(&falling))), falling.to_vec());
    }

    #[test]
    fn smoothing_keeps_time_spans() {
        let input = contiguous(&[100.0, 500.0, 110.0]);
        let smoothed = median_smooth(input.clone());
        for (a, b) in input.iter().zip(smoothed.iter()) {
            assert_eq!(a.start_time, b.start_time);
            assert_eq!(a.end_time, b.end_time);
        }
    }

    #[test]
    fn smoothing_handles_tiny_inputs() {
        assert!(median_smooth(Vec::new()).is_empty());
        assert_eq!(frequencies(&median_smooth(contiguous(&[440.0]))), vec![440.0]);
        assert_eq!(frequencies(&median_smooth(contiguous(&[440.0, 220.0]))), vec![440.0, 220.0]);
    }

    #[test]
    fn single_step_gap_interpolates_to_midpoint() {
        let segments = vec![
            PitchSegment::new(0.0, 0.01, 200.0),
            PitchSegment::new(0.015, 0.025, 300.0),
        ];
        let filled = fill_gaps(segments, 0.01, DEFAULT_MAX_GAP_SECONDS);

        assert_eq!(filled.len(), 3);
        assert!(filled[1].synthetic);
        assert_relative_eq!(filled[1].frequency, 250.0);
        assert_relative_eq!(filled[1].start_time, 0.01);
        assert_relative_eq!(filled[1].end_time, 0.02);
    }

    #[test]
    fn sub_frame_gap_still_gets_one_segment() {
        let segments = vec![
            PitchSegment::new(0.0, 0.01, 200.0),
            PitchSegment::new(0.013, 0.023, 300.0),
        ];
        let filled = fill_gaps(segments, 0.01, DEFAULT_MAX_GAP_SECONDS);

        assert_eq!(filled.len(), 3);
        assert_eq!(filled.iter().filter(|s| s.synthetic).count(), 1);
        assert_relative_eq!(filled[1].frequency, 250.0);
        assert_relative_eq!(filled[1].start_time, 0.01);
        assert_relative_eq!(filled[1].end_time, 0.02);
    }

    #[test]
    fn multi_step_gap_advances_by_frame_period() {
        let segments = vec![
            PitchSegment::new(0.0, 0.1, 100.0),
            PitchSegment::new(0.4, 0.5, 400.0),
        ];
        let filled = fill_gaps(segments, 0.1, DEFAULT_MAX_GAP_SECONDS);

        assert_eq!(filled.len(), 5);
        let synthetic: Vec<_> = filled.iter().filter(|s| s.synthetic).collect();
        assert_eq!(synthetic.len(), 3);
        assert_relative_eq!(synthetic[0].frequency, 175.0);
        assert_relative_eq!(synthetic[1].frequency, 250.0);
        assert_relative_eq!(synthetic[2].frequency, 325.0);
        assert_relative_eq!(synthetic[2].start_time, 0.3, epsilon = 1e-9);
    }

    #[test]
    fn contiguous_and_long_gaps_are_untouched() {
        let touching = contiguous(&[200.0, 300.0]);
        assert_eq!(fill_gaps(touching, 0.01, 1.5).len(), 2);

        let long = vec![
            PitchSegment::new(0.0, 0.1, 200.0),
            PitchSegment::new(1.6, 1.7, 300.0),
        ];
        assert_eq!(fill_gaps(long, 0.1, 1.5).len(), 2);

        let exact = vec![
            PitchSegment::new(0.0, 0.5, 200.0),
            PitchSegment::new(2.0, 2.5, 300.0),
        ];
        assert_eq!(fill_gaps(exact, 0.1, 1.5).len(), 2);
    }
}
