use eframe::egui::ColorImage;

/// Fallback thumbnail location when the probe payload carries none.
pub fn default_thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}

/// Fetches and decodes a thumbnail, returning None on any network or
/// decode error. Blocking; run it on a blocking task.
pub fn fetch_thumbnail(url: &str) -> Option<ColorImage> {
    let bytes = reqwest::blocking::get(url).ok()?.bytes().ok()?;
    let img = image::load_from_memory(&bytes).ok()?.to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, &img))
}
