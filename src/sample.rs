//! Parsing of the dominant-color sampler's output.

use crate::error::AccentError;
use crate::palette::Rgb;

/// Parse sampler stdout into a color.
///
/// Two shapes are accepted:
///
/// * a single `(R, G, B)` line, as printed by a ColorThief-style script;
///   surrounding whitespace and the parentheses are optional.
/// * an ImageMagick `histogram:info:` listing, one `COUNT: (R,G,B) ...` line
///   per quantized color. The most frequent color wins; the first listed
///   wins ties.
///
/// Channels must be integers in `0..=255`.
pub fn parse_sample_output(output: &str) -> Result<Rgb, AccentError> {
    let trimmed = output.trim();
    if is_histogram(trimmed) {
        return dominant_histogram_color(trimmed);
    }
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed);
    parse_channels(inner, trimmed)
}

fn is_histogram(output: &str) -> bool {
    output.lines().next().is_some_and(|line| {
        line.split_once(':')
            .is_some_and(|(count, _)| count.trim().parse::<u64>().is_ok())
    })
}

fn dominant_histogram_color(output: &str) -> Result<Rgb, AccentError> {
    let mut best: Option<(u64, Rgb)> = None;
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (count, rest) = line
            .split_once(':')
            .ok_or_else(|| AccentError::SampleParse(format!("`{line}`: missing pixel count")))?;
        let count = count
            .trim()
            .parse::<u64>()
            .map_err(|e| AccentError::SampleParse(format!("`{line}`: {e}")))?;
        let tuple = rest
            .trim_start()
            .strip_prefix('(')
            .and_then(|s| s.split_once(')'))
            .map(|(inner, _)| inner)
            .ok_or_else(|| AccentError::SampleParse(format!("`{line}`: missing color tuple")))?;
        let rgb = parse_channels(tuple, line)?;
        if best.map_or(true, |(top, _)| count > top) {
            best = Some((count, rgb));
        }
    }
    best.map(|(_, rgb)| rgb)
        .ok_or_else(|| AccentError::SampleParse("empty histogram".into()))
}

fn parse_channels(inner: &str, context: &str) -> Result<Rgb, AccentError> {
    let channels = inner
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| AccentError::SampleParse(format!("`{context}`: {e}")))?;

    match channels.as_slice() {
        [r, g, b] => Ok(Rgb::new(*r, *g, *b)),
        _ => Err(AccentError::SampleParse(format!(
            "`{context}`: expected 3 channels, got {}",
            channels.len()
        ))),
    }
}
