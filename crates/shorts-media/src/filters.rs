//! FFmpeg video filter definitions.

use crate::crop::CropPlan;

/// Output width of vertical clips.
pub const OUTPUT_WIDTH: u32 = 1080;

/// Output height of vertical clips.
pub const OUTPUT_HEIGHT: u32 = 1920;

/// Width of frames sent for keyframe estimation.
pub const SAMPLE_FRAME_WIDTH: u32 = 480;

/// Height of frames sent for keyframe estimation.
pub const SAMPLE_FRAME_HEIGHT: u32 = 270;

/// Crop the synthesized window and scale it to the vertical output size.
///
/// The offset expression is quoted so its commas are not read as filter
/// separators.
pub fn vertical_crop_filter(plan: &CropPlan) -> String {
    let window = plan.window();
    format!(
        "crop={}:{}:'{}':0,scale={}:{}",
        window.width,
        window.height,
        plan.to_ffmpeg_expr(),
        OUTPUT_WIDTH,
        OUTPUT_HEIGHT
    )
}

/// Downscale filter for sampled frames.
pub fn sample_frame_filter() -> String {
    format!("scale={}:{}", SAMPLE_FRAME_WIDTH, SAMPLE_FRAME_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorts_models::Keyframe;

    #[test]
    fn test_vertical_crop_filter() {
        let keyframes = vec![
            Keyframe::clamped(0.0, 0.2, "", 10.0),
            Keyframe::clamped(5.0, 0.8, "", 10.0),
        ];
        let plan = CropPlan::synthesize(&keyframes, 1920, 1080);
        assert_eq!(
            vertical_crop_filter(&plan),
            "crop=607:1080:'if(lt(t,5),81,1233)':0,scale=1080:1920"
        );
    }

    #[test]
    fn test_constant_filter() {
        let plan = CropPlan::synthesize(&[Keyframe::centered()], 1920, 1080);
        assert_eq!(
            vertical_crop_filter(&plan),
            "crop=607:1080:'657':0,scale=1080:1920"
        );
    }

    #[test]
    fn test_sample_frame_filter() {
        assert_eq!(sample_frame_filter(), "scale=480:270");
    }
}
