//! Default configuration constants and tool invocations.

use crate::process::CommandSpec;

/// Embedded default `autoaccent.toml` written by `autoaccent init`.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/autoaccent.toml");
/// Config file name looked up locally and under the config root.
pub(super) const CONFIG_FILE_NAME: &str = "autoaccent.toml";
/// Directory name under the config and cache roots.
pub(super) const APP_DIR_NAME: &str = "autoaccent";
/// Upper bound on each converter/sampler/gsettings invocation.
pub(super) const DEFAULT_PROCESS_TIMEOUT_SECS: u64 = 10;
/// Quiet period before a burst of settings changes triggers a run.
pub(super) const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// `magick INPUT OUTPUT`: rasterize vector and next-gen formats to JPEG.
pub(super) fn default_converter() -> CommandSpec {
    CommandSpec::new("magick", ["{input}", "{output}"])
}

/// Quantize to a few colors and print their histogram; the most frequent
/// entry is the dominant color.
pub(super) fn default_sampler() -> CommandSpec {
    CommandSpec::new(
        "magick",
        [
            "{input}",
            "-alpha",
            "off",
            "-resize",
            "256x256>",
            "+dither",
            "-colors",
            "8",
            "-depth",
            "8",
            "-format",
            "%c",
            "histogram:info:-",
        ],
    )
}
