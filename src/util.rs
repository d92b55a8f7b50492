use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compact amount for labels and legends: `1.25M`, `40K`, `3.5B`.
pub fn format_amount(value: f64) -> String {
    const UNITS: [&str; 5] = ["", "K", "M", "B", "T"];

    if !value.is_finite() {
        return "n/a".to_owned();
    }

    let mut scaled = value.abs();
    let mut unit = 0usize;
    while scaled >= 1000.0 && unit < UNITS.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }

    let sign = if value < 0.0 { "-" } else { "" };
    if unit == 0 {
        if scaled.fract() == 0.0 {
            format!("{sign}{scaled:.0}")
        } else {
            format!("{sign}{scaled:.2}")
        }
    } else {
        let text = format!("{scaled:.2}");
        let text = text.trim_end_matches('0').trim_end_matches('.');
        format!("{sign}{text}{}", UNITS[unit])
    }
}

/// Shortens long account addresses to `head…tail`.
pub fn short_label(name: &str, max_chars: usize) -> String {
    let count = name.chars().count();
    if count <= max_chars || max_chars < 3 {
        return name.to_owned();
    }

    let keep = max_chars - 1;
    let head = keep.div_ceil(2);
    let tail = keep - head;
    let start = name.chars().take(head).collect::<String>();
    let end = name.chars().skip(count - tail).collect::<String>();
    format!("{start}…{end}")
}

/// Deterministic point in `[-1, 1]²` derived from an id.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
