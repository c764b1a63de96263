//! Derived image styles grouped by aspect ratio.

use std::sync::LazyLock;

use regex::Regex;

/// Output styles available per aspect-ratio bucket, keyed by `round(W/H, 2)` with two decimals.
const STYLES_BY_RATIO: &[(&str, &[&str])] = &[
    ("0.75", &["465x620_img"]),
    ("1.00", &["400x400_img", "414x414_img", "448x448_img"]),
    (
        "1.33",
        &[
            "414x312_img",
            "544x409_img",
            "640x481_img",
            "828x623_img",
            "912x686_img",
        ],
    ),
    (
        "1.75",
        &["414x237_img", "533x305_img", "828x473_img", "929x531_img"],
    ),
    ("2.30", &["533x232_img", "1600x696_img"]),
];

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)x(\d+)").expect("static regex should not panic"));

/// Styles sharing the aspect ratio of a `WxH` maximum resolution.
///
/// Returns an empty slice for a missing or malformed resolution, a zero
/// height, or a ratio outside the table.
#[must_use]
pub fn styles_for_resolution(resolution: Option<&str>) -> &'static [&'static str] {
    let Some(ratio) = resolution.and_then(aspect_ratio) else {
        return &[];
    };

    STYLES_BY_RATIO
        .iter()
        .find_map(|(bucket, styles)| (*bucket == ratio).then_some(*styles))
        .unwrap_or_default()
}

/// Every style named by the aspect-ratio table.
pub fn known_styles() -> impl Iterator<Item = &'static str> {
    STYLES_BY_RATIO
        .iter()
        .flat_map(|(_, styles)| styles.iter().copied())
}

fn aspect_ratio(resolution: &str) -> Option<String> {
    let captures = RESOLUTION.captures(resolution)?;
    let width: u32 = captures.get(1)?.as_str().parse().ok()?;
    let height: u32 = captures.get(2)?.as_str().parse().ok()?;
    if height == 0 {
        return None;
    }

    let ratio = (f64::from(width) / f64::from(height) * 100.0).round() / 100.0;
    Some(format!("{ratio:.2}"))
}
