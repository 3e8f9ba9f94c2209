use crate::foundation::core::Fps;

/// Sample formats a frame's audio can be resolved into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// No preference / not yet known.
    #[default]
    None,
    /// Signed 16-bit interleaved.
    S16,
    /// Signed 32-bit planar.
    S32,
    /// 32-bit float planar.
    Float,
    /// Signed 32-bit interleaved.
    S32le,
    /// 32-bit float interleaved.
    F32le,
    /// Unsigned 8-bit interleaved.
    U8,
}

impl AudioFormat {
    /// Stable integer code stored in a frame's carrier.
    pub fn code(self) -> i64 {
        match self {
            AudioFormat::None => 0,
            AudioFormat::S16 => 1,
            AudioFormat::S32 => 2,
            AudioFormat::Float => 3,
            AudioFormat::S32le => 4,
            AudioFormat::F32le => 5,
            AudioFormat::U8 => 6,
        }
    }

    /// Inverse of [`AudioFormat::code`]; unknown codes map to `None`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => AudioFormat::S16,
            2 => AudioFormat::S32,
            3 => AudioFormat::Float,
            4 => AudioFormat::S32le,
            5 => AudioFormat::F32le,
            6 => AudioFormat::U8,
            _ => AudioFormat::None,
        }
    }

    /// Bytes per single sample of one channel.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            AudioFormat::None => 0,
            AudioFormat::S16 => 2,
            AudioFormat::S32 | AudioFormat::Float | AudioFormat::S32le | AudioFormat::F32le => 4,
            AudioFormat::U8 => 1,
        }
    }

    /// Exact buffer size for `samples` per channel over `channels` channels.
    pub fn buffer_size(self, samples: u32, channels: u32) -> usize {
        self.bytes_per_sample() * samples as usize * channels as usize
    }
}

/// Number of samples from time zero up to the start of frame `position`, rounded to nearest.
pub fn samples_to_position(fps: Fps, frequency: u32, position: i64) -> i64 {
    if fps.num == 0 || fps.den == 0 || frequency == 0 {
        return 0;
    }
    let num = i128::from(position) * i128::from(frequency) * i128::from(fps.den);
    let den = i128::from(fps.num);
    let half = den / 2;
    let rounded = if num < 0 {
        (num - half) / den
    } else {
        (num + half) / den
    };
    rounded as i64
}

/// Number of samples belonging to frame `position` so that consecutive frames tile exactly.
pub fn frame_samples(fps: Fps, frequency: u32, position: i64) -> u32 {
    let n = samples_to_position(fps, frequency, position + 1)
        - samples_to_position(fps, frequency, position);
    n.max(0) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/format/audio.rs"]
mod tests;
