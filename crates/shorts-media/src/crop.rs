//! Dynamic crop window synthesis.
//!
//! Sparse keyframes `(time, cropX)` become a piecewise-constant function
//! mapping clip-relative time to the left pixel offset of a fixed `9:16`
//! crop window. Transitions between keyframes are hard cuts.
//!
//! The function is kept as data ([`CropPlan`]): an initial offset plus an
//! ordered list of `(threshold, offset)` steps. Serializing it to the
//! nested-conditional syntax FFmpeg's `crop` filter evaluates per frame is a
//! separate step ([`CropPlan::to_ffmpeg_expr`]).

use shorts_models::Keyframe;

/// Target aspect ratio numerator (width).
pub const TARGET_ASPECT_WIDTH: u32 = 9;

/// Target aspect ratio denominator (height).
pub const TARGET_ASPECT_HEIGHT: u32 = 16;

/// Fixed-size crop window for one source resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    /// Source frame width
    pub frame_width: u32,
    /// Crop width, `floor(H * 9 / 16)` capped at the frame width
    pub width: u32,
    /// Crop height, the full frame height
    pub height: u32,
    /// Largest left offset that keeps the window inside the frame
    pub max_x: u32,
}

impl CropWindow {
    /// Derive the crop window for a `frame_width x frame_height` source.
    pub fn for_frame(frame_width: u32, frame_height: u32) -> Self {
        let ideal = (u64::from(frame_height) * u64::from(TARGET_ASPECT_WIDTH)
            / u64::from(TARGET_ASPECT_HEIGHT)) as u32;
        let width = ideal.min(frame_width);

        Self {
            frame_width,
            width,
            height: frame_height,
            max_x: frame_width.saturating_sub(width),
        }
    }

    /// Left pixel offset that centers the window on a normalized position.
    ///
    /// `clamp(round(x * W) - floor(Wc / 2), 0, maxX)`
    pub fn pixel_offset(&self, crop_x: f64) -> u32 {
        let center = (crop_x * f64::from(self.frame_width)).round() as i64;
        let left = center - i64::from(self.width / 2);
        left.clamp(0, i64::from(self.max_x)) as u32
    }
}

/// One hard cut: from `threshold` seconds on, the window sits at `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropStep {
    pub threshold: f64,
    pub offset: u32,
}

/// Piecewise-constant crop offset over a clip.
#[derive(Debug, Clone, PartialEq)]
pub struct CropPlan {
    window: CropWindow,
    initial_offset: u32,
    steps: Vec<CropStep>,
}

impl CropPlan {
    /// Build the offset function for `keyframes` on a `frame_width x
    /// frame_height` source.
    ///
    /// Keyframes are ordered by time with a stable sort. Among keyframes
    /// sharing a timestamp the one that comes last holds from that time on.
    /// An empty slice behaves like a single centered keyframe.
    pub fn synthesize(keyframes: &[Keyframe], frame_width: u32, frame_height: u32) -> Self {
        let window = CropWindow::for_frame(frame_width, frame_height);

        let mut ordered: Vec<&Keyframe> = keyframes.iter().collect();
        ordered.sort_by(|a, b| a.time_offset.total_cmp(&b.time_offset));

        let Some((first, rest)) = ordered.split_first() else {
            return Self {
                window,
                initial_offset: window.pixel_offset(shorts_models::CROP_X_CENTER),
                steps: Vec::new(),
            };
        };

        let steps = rest
            .iter()
            .map(|k| CropStep {
                threshold: k.time_offset,
                offset: window.pixel_offset(k.crop_x),
            })
            .collect();

        Self {
            window,
            initial_offset: window.pixel_offset(first.crop_x),
            steps,
        }
    }

    pub fn window(&self) -> CropWindow {
        self.window
    }

    /// Offset before the first cut.
    pub fn initial_offset(&self) -> u32 {
        self.initial_offset
    }

    pub fn steps(&self) -> &[CropStep] {
        &self.steps
    }

    /// True when the window never moves.
    pub fn is_constant(&self) -> bool {
        self.steps.iter().all(|s| s.offset == self.initial_offset)
    }

    /// Offset at clip-relative time `t`.
    pub fn offset_at(&self, t: f64) -> u32 {
        self.steps
            .iter()
            .rev()
            .find(|s| s.threshold <= t)
            .map(|s| s.offset)
            .unwrap_or(self.initial_offset)
    }

    /// Render as an FFmpeg expression in `t`.
    ///
    /// Built right to left: the last offset is the default branch and every
    /// earlier segment wraps it as `if(lt(t,next_threshold),offset,rest)`.
    pub fn to_ffmpeg_expr(&self) -> String {
        let Some(last) = self.steps.last() else {
            return self.initial_offset.to_string();
        };

        let mut expr = last.offset.to_string();
        for (i, step) in self.steps.iter().enumerate().rev() {
            let before = if i == 0 {
                self.initial_offset
            } else {
                self.steps[i - 1].offset
            };
            expr = format!("if(lt(t,{}),{},{})", step.threshold, before, expr);
        }
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kf(time: f64, crop_x: f64) -> Keyframe {
        Keyframe {
            time_offset: time,
            crop_x,
            notes: String::new(),
        }
    }

    /// Evaluates the subset of FFmpeg expression syntax emitted above.
    fn eval(expr: &str, t: f64) -> u32 {
        if let Some(inner) = expr.strip_prefix("if(lt(t,").and_then(|e| e.strip_suffix(')')) {
            let (threshold, rest) = inner.split_once("),").unwrap();
            let (value, otherwise) = rest.split_once(',').unwrap();
            if t < threshold.parse::<f64>().unwrap() {
                value.parse().unwrap()
            } else {
                eval(otherwise, t)
            }
        } else {
            expr.parse().unwrap()
        }
    }

    #[test]
    fn test_window_for_landscape_1080p() {
        let window = CropWindow::for_frame(1920, 1080);
        assert_eq!(window.width, 607);
        assert_eq!(window.height, 1080);
        assert_eq!(window.max_x, 1313);
        assert_eq!(window.pixel_offset(0.2), 81);
        assert_eq!(window.pixel_offset(0.8), 1233);
    }

    #[test]
    fn test_pixel_offset_clamped_to_frame() {
        let window = CropWindow::for_frame(1920, 1080);
        assert_eq!(window.pixel_offset(0.0), 0);
        assert_eq!(window.pixel_offset(1.0), 1313);
    }

    #[test]
    fn test_narrow_source_caps_window() {
        let window = CropWindow::for_frame(500, 1080);
        assert_eq!(window.width, 500);
        assert_eq!(window.max_x, 0);
        assert_eq!(window.pixel_offset(0.9), 0);
    }

    #[test]
    fn test_two_keyframe_scenario() {
        let plan = CropPlan::synthesize(&[kf(0.0, 0.2), kf(5.0, 0.8)], 1920, 1080);
        let expr = plan.to_ffmpeg_expr();

        assert_eq!(expr, "if(lt(t,5),81,1233)");
        for t in [0.0, 1.0, 4.99] {
            assert_eq!(eval(&expr, t), 81);
            assert_eq!(plan.offset_at(t), 81);
        }
        for t in [5.0, 5.01, 30.0] {
            assert_eq!(eval(&expr, t), 1233);
            assert_eq!(plan.offset_at(t), 1233);
        }
    }

    #[test]
    fn test_single_keyframe_is_constant() {
        let plan = CropPlan::synthesize(&[kf(3.0, 0.4)], 1920, 1080);
        let expected = plan.window().pixel_offset(0.4);

        assert!(plan.is_constant());
        assert_eq!(plan.to_ffmpeg_expr(), expected.to_string());
        for t in [0.0, 2.9, 3.0, 45.0] {
            assert_eq!(plan.offset_at(t), expected);
        }
    }

    #[test]
    fn test_empty_keyframes_center() {
        let plan = CropPlan::synthesize(&[], 1920, 1080);
        assert_eq!(plan.to_ffmpeg_expr(), "657");
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let keyframes = [kf(10.0, 0.9), kf(0.0, 0.1), kf(4.5, 0.5)];
        let plan = CropPlan::synthesize(&keyframes, 1920, 1080);
        let w = plan.window();

        let thresholds: Vec<f64> = plan.steps().iter().map(|s| s.threshold).collect();
        assert_eq!(thresholds, vec![4.5, 10.0]);
        assert_eq!(plan.to_ffmpeg_expr(), format!(
            "if(lt(t,4.5),{},if(lt(t,10),{},{}))",
            w.pixel_offset(0.1),
            w.pixel_offset(0.5),
            w.pixel_offset(0.9)
        ));
    }

    #[test]
    fn test_segments_hold_earlier_keyframe() {
        let keyframes = [
            kf(0.0, 0.1),
            kf(2.5, 0.3),
            kf(7.25, 0.6),
            kf(12.0, 0.9),
            kf(20.0, 0.45),
        ];
        let plan = CropPlan::synthesize(&keyframes, 3840, 2160);
        let expr = plan.to_ffmpeg_expr();
        let w = plan.window();

        for pair in keyframes.windows(2) {
            let (cur, next) = (&pair[0], &pair[1]);
            let expected = w.pixel_offset(cur.crop_x);
            let mid = (cur.time_offset + next.time_offset) / 2.0;
            for t in [cur.time_offset, mid, next.time_offset - 1e-6] {
                assert_eq!(plan.offset_at(t), expected, "t={t}");
                assert_eq!(eval(&expr, t), expected, "t={t}");
            }
        }
        assert_eq!(eval(&expr, 25.0), w.pixel_offset(0.45));
    }

    #[test]
    fn test_duplicate_timestamps_last_wins() {
        let keyframes = [kf(0.0, 0.2), kf(5.0, 0.3), kf(5.0, 0.8)];
        let plan = CropPlan::synthesize(&keyframes, 1920, 1080);
        let expr = plan.to_ffmpeg_expr();
        let w = plan.window();

        assert_eq!(plan.offset_at(5.0), w.pixel_offset(0.8));
        assert_eq!(eval(&expr, 5.0), w.pixel_offset(0.8));
        assert_eq!(eval(&expr, 4.0), w.pixel_offset(0.2));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let keyframes = [kf(0.0, 0.25), kf(1.75, 0.65), kf(3.5, 0.4)];
        let a = CropPlan::synthesize(&keyframes, 1280, 720).to_ffmpeg_expr();
        let b = CropPlan::synthesize(&keyframes, 1280, 720).to_ffmpeg_expr();
        assert_eq!(a, b);
    }
}
