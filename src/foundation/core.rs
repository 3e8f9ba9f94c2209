use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{FrameError, FrameResult};

/// Zero-based frame position as reported to callers.
///
/// Stored positions are signed; accessors clamp them to zero before building a `FrameIndex`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Clamp a signed position to a non-negative index.
    pub fn from_signed(position: i64) -> Self {
        Self(position.max(0) as u64)
    }
}

/// Rational frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds). Must be > 0.
    pub den: u32,
}

impl Fps {
    /// Build a validated frame rate.
    pub fn new(num: u32, den: u32) -> FrameResult<Self> {
        if den == 0 {
            return Err(FrameError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(FrameError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

/// Sample aspect ratio used when no profile is available.
pub const DEFAULT_SAMPLE_ASPECT: f64 = 1.0;

/// Output geometry and timing a frame is created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Sample (pixel) aspect ratio numerator.
    #[serde(default = "one")]
    pub sample_aspect_num: u32,
    /// Sample (pixel) aspect ratio denominator.
    #[serde(default = "one")]
    pub sample_aspect_den: u32,
    /// Frame rate.
    pub fps: Fps,
}

fn one() -> u32 {
    1
}

impl Default for Profile {
    fn default() -> Self {
        // PAL-like geometry.
        Self {
            width: 720,
            height: 576,
            sample_aspect_num: 16,
            sample_aspect_den: 15,
            fps: Fps { num: 25, den: 1 },
        }
    }
}

impl Profile {
    /// Sample aspect ratio as a float, or the global default when `profile` is absent.
    pub fn sar(profile: Option<&Profile>) -> f64 {
        match profile {
            Some(p) if p.sample_aspect_den > 0 => {
                f64::from(p.sample_aspect_num) / f64::from(p.sample_aspect_den)
            }
            _ => DEFAULT_SAMPLE_ASPECT,
        }
    }

    /// Check geometry, aspect and frame rate.
    pub fn validate(&self) -> FrameResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::validation(format!(
                "profile geometry must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.sample_aspect_num == 0 || self.sample_aspect_den == 0 {
            return Err(FrameError::validation(
                "profile sample aspect ratio must be non-zero",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        Ok(())
    }

    /// Parse and validate a profile from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FrameResult<Self> {
        let profile: Profile = serde_json::from_reader(r)
            .map_err(|e| FrameError::validation(format!("parse profile JSON: {e}")))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Parse and validate a profile from a JSON string.
    pub fn from_json_str(s: &str) -> FrameResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse and validate a profile from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FrameResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FrameError::validation(format!("open profile JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
