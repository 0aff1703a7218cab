use chrono::{NaiveDateTime, Timelike};

const LIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Format the position of `frame_index` in a `fps` stream as `HH:MM:SS`.
///
/// Hours are not wrapped. A non-positive or non-finite frame rate yields
/// `00:00:00`.
pub fn timestamp_for_frame(frame_index: u64, fps: f64) -> String {
    if !(fps.is_finite() && fps > 0.0) {
        return "00:00:00".to_string();
    }
    let total = (frame_index as f64 / fps) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Parse a record timestamp into seconds.
///
/// Accepts `HH:MM:SS`, `HH:MM:SS.fff` and the live-capture form
/// `YYYY-MM-DD HH:MM:SS[.fff]`. Live timestamps map to seconds since the
/// Unix epoch, so they order after any video position.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, LIVE_FORMAT) {
        let utc = dt.and_utc();
        return Some(utc.timestamp() as f64 + f64::from(dt.nanosecond()) / 1e9);
    }
    parse_clock(value)
}

fn parse_clock(value: &str) -> Option<f64> {
    let mut parts = value.split(':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let is_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(h) || !is_digits(m) {
        return None;
    }
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if !is_digits(whole) || !(frac.is_empty() || is_digits(frac)) || s.ends_with('.') {
        return None;
    }

    let hours: u64 = h.parse().ok()?;
    let minutes: u64 = m.parse().ok()?;
    let seconds: f64 = s.parse().ok()?;
    if minutes >= 60 || seconds >= 60.0 {
        return None;
    }
    Some((hours * 3600 + minutes * 60) as f64 + seconds)
}
