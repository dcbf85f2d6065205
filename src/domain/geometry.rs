//! Output geometry for a transcode: the explicit frame size plus an optional
//! symmetric top/bottom crop or pad that keeps the source aspect ratio.
//!
//! Every derived pixel count is truncated toward zero and then forced even
//! (encoders reject odd dimensions). The even correction is applied to each
//! quantity on its own, never to a sum.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Which derivation to use when the source and target aspect ratios differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeometryMode {
    /// Scale to the target width, then crop or pad vertically.
    CropOrPad,
    /// Never crop: narrow the width when the frame would be too tall, letterbox otherwise.
    #[default]
    NoCrop,
}

impl FromStr for GeometryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crop" | "crop_or_pad" => Ok(GeometryMode::CropOrPad),
            "nocrop" | "no_crop" | "letterbox" => Ok(GeometryMode::NoCrop),
            other => Err(format!("unknown geometry mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// Remove this many rows from both the top and the bottom.
    Crop(u32),
    /// Add this many rows of padding to both the top and the bottom.
    Pad(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryOptions {
    pub width: u32,
    pub height: u32,
    pub adjustment: Option<Adjustment>,
}

/// Result of a geometry derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryPlan {
    pub options: GeometryOptions,
    /// New output width the encoding must store before invocation (no-crop only).
    pub width_override: Option<u32>,
    /// Input dimensions could not produce an aspect ratio; literal output size used.
    pub degenerate: bool,
}

/// Dimensions feeding a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub in_width: u32,
    pub in_height: u32,
    pub out_width: u32,
    pub out_height: u32,
}

impl Dimensions {
    pub fn new(in_width: u32, in_height: u32, out_width: u32, out_height: u32) -> Self {
        Self {
            in_width,
            in_height,
            out_width,
            out_height,
        }
    }

    fn aspect(&self) -> Option<f64> {
        let aspect = self.in_width as f64 / self.in_height as f64;
        (aspect.is_finite() && aspect > 0.0).then_some(aspect)
    }

    fn literal(&self) -> GeometryPlan {
        warn!(
            in_width = self.in_width,
            in_height = self.in_height,
            "Couldn't compute aspect ratio from input size, using the output resolution as is"
        );
        GeometryPlan {
            options: GeometryOptions {
                width: self.out_width,
                height: self.out_height,
                adjustment: None,
            },
            width_override: None,
            degenerate: true,
        }
    }
}

/// Derive the geometry for `dims` using `mode`.
pub fn plan(mode: GeometryMode, dims: Dimensions) -> GeometryPlan {
    match mode {
        GeometryMode::CropOrPad => crop_or_pad(dims),
        GeometryMode::NoCrop => no_crop(dims),
    }
}

/// Scale to the output width and crop or pad the height to fit.
pub fn crop_or_pad(dims: Dimensions) -> GeometryPlan {
    let Some(aspect) = dims.aspect() else {
        return dims.literal();
    };

    let height = even(dims.out_width as f64 / aspect);
    let out_height = dims.out_height as u64;

    let adjustment = if height > out_height {
        Some(Adjustment::Crop(half_even(height - out_height)))
    } else if height < out_height {
        Some(Adjustment::Pad(half_even(out_height - height)))
    } else {
        None
    };

    GeometryPlan {
        options: GeometryOptions {
            width: dims.out_width,
            height: clamp_u32(height),
            adjustment,
        },
        width_override: None,
        degenerate: false,
    }
}

/// Like [`crop_or_pad`] but never crops. A frame that would come out too tall
/// keeps the output height and gets a narrower width instead, which the caller
/// has to persist as the encoding's new width.
pub fn no_crop(dims: Dimensions) -> GeometryPlan {
    let Some(aspect) = dims.aspect() else {
        return dims.literal();
    };
    let inverse_aspect = dims.in_height as f64 / dims.in_width as f64;

    let height = even(dims.out_width as f64 / aspect);
    let out_height = dims.out_height as u64;

    if height > out_height {
        let width = clamp_u32(even(dims.out_height as f64 * inverse_aspect));
        return GeometryPlan {
            options: GeometryOptions {
                width,
                height: dims.out_height,
                adjustment: None,
            },
            width_override: Some(width),
            degenerate: false,
        };
    }

    let adjustment =
        (height < out_height).then(|| Adjustment::Pad(half_even(out_height - height)));

    GeometryPlan {
        options: GeometryOptions {
            width: dims.out_width,
            height: clamp_u32(height),
            adjustment,
        },
        width_override: None,
        degenerate: false,
    }
}

/// Truncate toward zero, then drop to the nearest even number.
fn even(value: f64) -> u64 {
    // `as` saturates: negatives and NaN become 0.
    let truncated = value.trunc() as u64;
    truncated - truncated % 2
}

fn half_even(difference: u64) -> u32 {
    clamp_u32(even(difference as f64 / 2.0))
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX - 1)
}

impl GeometryOptions {
    /// Arguments in the classic `-s WxH -padtop N -padbottom N` form.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-s".to_string(), format!("{}x{}", self.width, self.height)];
        match self.adjustment {
            Some(Adjustment::Crop(rows)) => args.extend([
                "-croptop".to_string(),
                rows.to_string(),
                "-cropbottom".to_string(),
                rows.to_string(),
            ]),
            Some(Adjustment::Pad(rows)) => args.extend([
                "-padtop".to_string(),
                rows.to_string(),
                "-padbottom".to_string(),
                rows.to_string(),
            ]),
            None => {}
        }
        args
    }

    /// The same geometry as an ffmpeg filter chain, for builds without the
    /// legacy crop/pad flags.
    pub fn to_filter(&self) -> String {
        let scale = format!("scale={}:{}", self.width, self.height);
        match self.adjustment {
            Some(Adjustment::Crop(rows)) => format!(
                "{},crop={}:{}:0:{}",
                scale,
                self.width,
                self.height.saturating_sub(rows.saturating_mul(2)),
                rows
            ),
            Some(Adjustment::Pad(rows)) => format!(
                "{},pad={}:{}:0:{}",
                scale,
                self.width,
                self.height.saturating_add(rows.saturating_mul(2)),
                rows
            ),
            None => scale,
        }
    }
}

impl fmt::Display for GeometryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(in_w: u32, in_h: u32, out_w: u32, out_h: u32) -> Dimensions {
        Dimensions::new(in_w, in_h, out_w, out_h)
    }

    #[test]
    fn test_crop_or_pad_letterboxes_widescreen_into_4_3() {
        let plan = crop_or_pad(dims(1920, 1080, 640, 480));
        // 640 / (1920 / 1080) lands exactly on 360 in f64.
        assert_eq!(plan.options.width, 640);
        assert_eq!(plan.options.height, 360);
        assert_eq!(plan.options.adjustment, Some(Adjustment::Pad(60)));
        assert_eq!(plan.width_override, None);
        assert!(!plan.degenerate);
    }

    #[test]
    fn test_crop_or_pad_crops_4_3_into_widescreen() {
        let plan = crop_or_pad(dims(640, 480, 1920, 1080));
        assert_eq!(plan.options.width, 1920);
        assert_eq!(plan.options.height, 1440);
        assert_eq!(plan.options.adjustment, Some(Adjustment::Crop(180)));
        assert_eq!(plan.options.to_string(), "-s 1920x1440 -croptop 180 -cropbottom 180");
    }

    #[test]
    fn test_no_crop_narrows_width_instead_of_cropping() {
        let plan = no_crop(dims(640, 480, 1920, 1080));
        assert_eq!(plan.options.width, 810);
        assert_eq!(plan.options.height, 1080);
        assert_eq!(plan.options.adjustment, None);
        assert_eq!(plan.width_override, Some(810));
        assert_eq!(plan.options.to_string(), "-s 810x1080");
    }

    #[test]
    fn test_no_crop_pads_like_crop_or_pad() {
        let plan = no_crop(dims(1920, 1080, 640, 480));
        assert_eq!(plan.options, crop_or_pad(dims(1920, 1080, 640, 480)).options);
        assert_eq!(plan.width_override, None);
    }

    #[test]
    fn test_matching_aspect_has_no_adjustment() {
        for plan in [
            crop_or_pad(dims(1280, 720, 640, 360)),
            no_crop(dims(1280, 720, 640, 360)),
        ] {
            assert_eq!(
                plan.options,
                GeometryOptions {
                    width: 640,
                    height: 360,
                    adjustment: None
                }
            );
            assert_eq!(plan.width_override, None);
        }
    }

    #[test]
    fn test_odd_values_are_evened_independently() {
        // 320 / (300/201) = 214.4 -> 214; (240 - 214) / 2 = 13 -> 12
        let plan = crop_or_pad(dims(300, 201, 320, 240));
        assert_eq!(plan.options.height, 214);
        assert_eq!(plan.options.adjustment, Some(Adjustment::Pad(12)));
    }

    #[test]
    fn test_zero_input_height_falls_back_to_literal_size() {
        for plan in [
            crop_or_pad(dims(1920, 0, 640, 480)),
            no_crop(dims(1920, 0, 640, 480)),
        ] {
            assert!(plan.degenerate);
            assert_eq!(plan.options.to_string(), "-s 640x480");
            assert_eq!(plan.width_override, None);
        }
    }

    #[test]
    fn test_zero_input_width_falls_back_to_literal_size() {
        let plan = no_crop(dims(0, 1080, 640, 480));
        assert!(plan.degenerate);
        assert_eq!(plan.options.adjustment, None);
    }

    #[test]
    fn test_plan_is_idempotent() {
        let d = dims(720, 576, 1280, 720);
        for mode in [GeometryMode::CropOrPad, GeometryMode::NoCrop] {
            assert_eq!(plan(mode, d), plan(mode, d));
        }
    }

    #[test]
    fn test_adjustments_and_heights_are_always_even() {
        let sources = [(1920, 1080), (640, 480), (720, 576), (1080, 1920), (333, 211), (4096, 1716)];
        let targets = [(640, 480), (1280, 720), (320, 240), (853, 480), (1919, 1081)];

        for &(in_w, in_h) in &sources {
            for &(out_w, out_h) in &targets {
                let d = dims(in_w, in_h, out_w, out_h);
                for mode in [GeometryMode::CropOrPad, GeometryMode::NoCrop] {
                    let result = plan(mode, d);
                    if let Some(Adjustment::Crop(n) | Adjustment::Pad(n)) = result.options.adjustment {
                        assert_eq!(n % 2, 0, "odd adjustment for {:?} {:?}", mode, d);
                    }
                    if let Some(width) = result.width_override {
                        assert_eq!(width % 2, 0);
                    }
                }

                let height = crop_or_pad(d).options.height as f64;
                let exact = out_w as f64 / in_w as f64 * in_h as f64;
                assert_eq!(height as u32 % 2, 0);
                assert!(exact - height < 2.0 + 1e-9);
                assert!(height <= exact + 1e-9);
            }
        }
    }

    #[test]
    fn test_filter_chain_matches_flags() {
        let pad = GeometryOptions {
            width: 640,
            height: 360,
            adjustment: Some(Adjustment::Pad(60)),
        };
        assert_eq!(pad.to_filter(), "scale=640:360,pad=640:480:0:60");

        let crop = GeometryOptions {
            width: 1920,
            height: 1440,
            adjustment: Some(Adjustment::Crop(180)),
        };
        assert_eq!(crop.to_filter(), "scale=1920:1440,crop=1920:1080:0:180");
    }

    #[test]
    fn test_geometry_mode_from_str() {
        assert_eq!("crop".parse::<GeometryMode>(), Ok(GeometryMode::CropOrPad));
        assert_eq!("NoCrop".parse::<GeometryMode>(), Ok(GeometryMode::NoCrop));
        assert!("stretch".parse::<GeometryMode>().is_err());
    }
}
