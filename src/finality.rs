//! Finality heuristic for provider media URLs
//!
//! Providers sometimes push an early, unstable preview URL before the final
//! artifact. Treating any non-empty URL as final would expose broken links to
//! end users, so a SUCCESS record is only served once its URL carries one of a
//! small set of markers. The heuristic is isolated here so it can be replaced
//! by a provider-native "final" flag if one becomes available.
//!
//! False negatives (a valid final URL without a marker) leave the client
//! polling; false positives cannot occur because the predicate is only
//! evaluated on provider-confirmed SUCCESS payloads.

/// Audio file extensions recognized as final artifacts
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".flac", ".m4a"];

/// Hostname fragments of known stable CDN endpoints
const CDN_MARKERS: &[&str] = &["cdn"];

/// Whether a media URL is a stable final artifact rather than a transient
/// preview
pub fn is_final_media_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    let lowered = url.to_ascii_lowercase();

    AUDIO_EXTENSIONS.iter().any(|ext| lowered.contains(ext))
        || CDN_MARKERS.iter().any(|marker| lowered.contains(marker))
}
