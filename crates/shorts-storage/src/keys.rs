//! Object key layout.
//!
//! - `uploads/{uuid}/{filename}` for source videos
//! - `clips/{job_id}/clip_{rank}.mp4` for extracted clips

use shorts_models::JobId;
use uuid::Uuid;

/// Filename used when the caller supplies none.
pub const DEFAULT_UPLOAD_FILENAME: &str = "video.mp4";

/// Content type used when the caller supplies none.
pub const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Reduce a caller-supplied filename to a single key segment.
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        DEFAULT_UPLOAD_FILENAME.to_string()
    } else {
        cleaned
    }
}

/// Fresh upload key for a source video.
pub fn upload_key(filename: Option<&str>) -> String {
    let name = sanitize_filename(filename.unwrap_or(DEFAULT_UPLOAD_FILENAME));
    format!("uploads/{}/{}", Uuid::new_v4(), name)
}

/// Key of an extracted clip.
pub fn clip_key(job_id: &JobId, rank: u32) -> String {
    format!("clips/{}/clip_{}.mp4", job_id, rank)
}
