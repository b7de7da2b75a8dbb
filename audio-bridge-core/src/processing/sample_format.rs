use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const S24_MAX: f32 = 8_388_607.0;

/// Native sample representation of an output device.
///
/// `F32Le` is the identity step; the integer formats are narrowing
/// conversions that saturate at full scale instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    F32Le,
    S16Le,
    /// 24-bit samples packed in 3 bytes.
    S24Le,
    S32Le,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::F32Le | Self::S32Le => 4,
            Self::S16Le => 2,
            Self::S24Le => 3,
        }
    }

    pub fn bit_depth(self) -> u16 {
        match self {
            Self::F32Le | Self::S32Le => 32,
            Self::S16Le => 16,
            Self::S24Le => 24,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32Le)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::F32Le => "f32",
            Self::S16Le => "s16",
            Self::S24Le => "s24",
            Self::S32Le => "s32",
        }
    }

    /// Convert normalized `[-1.0, 1.0]` samples into little-endian native bytes.
    ///
    /// Out-of-range input is clamped. `out` must hold
    /// `input.len() * bytes_per_sample()` bytes; returns the bytes written.
    pub fn convert_into(self, input: &[f32], out: &mut [u8]) -> usize {
        let width = self.bytes_per_sample();
        let len = input.len() * width;
        assert!(out.len() >= len, "conversion buffer too small");

        for (&sample, dst) in input.iter().zip(out.chunks_exact_mut(width)) {
            match self {
                Self::F32Le => dst.copy_from_slice(&sample.to_le_bytes()),
                Self::S16Le => {
                    let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    dst.copy_from_slice(&value.to_le_bytes());
                }
                Self::S24Le => {
                    let value = (sample.clamp(-1.0, 1.0) * S24_MAX) as i32;
                    dst.copy_from_slice(&value.to_le_bytes()[..3]);
                }
                Self::S32Le => {
                    let value = (sample.clamp(-1.0, 1.0) as f64 * i32::MAX as f64) as i32;
                    dst.copy_from_slice(&value.to_le_bytes());
                }
            }
        }
        len
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f32" | "f32le" | "float" => Ok(Self::F32Le),
            "s16" | "s16le" => Ok(Self::S16Le),
            "s24" | "s24le" => Ok(Self::S24Le),
            "s32" | "s32le" => Ok(Self::S32Le),
            other => Err(format!("unsupported sample format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn convert(format: SampleFormat, input: &[f32]) -> Vec<u8> {
        let mut out = vec![0u8; input.len() * format.bytes_per_sample()];
        let n = format.convert_into(input, &mut out);
        assert_eq!(n, out.len());
        out
    }

    #[test]
    fn s16_full_scale_saturates() {
        let pcm = convert(SampleFormat::S16Le, &[0.0, 1.0, -1.0, 2.0, -3.0]);
        let values: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(values, vec![0, i16::MAX, -i16::MAX, i16::MAX, -i16::MAX]);
    }

    #[test]
    fn s24_packs_three_bytes() {
        let pcm = convert(SampleFormat::S24Le, &[1.0, -1.0, 5.0]);
        assert_eq!(pcm.len(), 9);
        assert_eq!(&pcm[0..3], &[0xFF, 0xFF, 0x7F]); // 8_388_607
        assert_eq!(&pcm[3..6], &[0x01, 0x00, 0x80]); // -8_388_607
        assert_eq!(&pcm[6..9], &[0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn s32_full_scale_does_not_wrap() {
        let pcm = convert(SampleFormat::S32Le, &[1.0, -1.0, 10.0]);
        let values: Vec<i32> = pcm
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(values, vec![i32::MAX, -i32::MAX, i32::MAX]);
    }

    #[test]
    fn f32_is_identity() {
        let pcm = convert(SampleFormat::F32Le, &[0.25, -0.5]);
        assert_relative_eq!(f32::from_le_bytes([pcm[0], pcm[1], pcm[2], pcm[3]]), 0.25);
        assert_relative_eq!(f32::from_le_bytes([pcm[4], pcm[5], pcm[6], pcm[7]]), -0.5);
    }

    #[test]
    fn half_scale_s16() {
        let pcm = convert(SampleFormat::S16Le, &[0.5]);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 16383);
    }

    #[test]
    fn parse_names() {
        assert_eq!("s16".parse::<SampleFormat>().unwrap(), SampleFormat::S16Le);
        assert_eq!("F32LE".parse::<SampleFormat>().unwrap(), SampleFormat::F32Le);
        assert!("u8".parse::<SampleFormat>().is_err());
        assert_eq!(SampleFormat::S24Le.to_string(), "s24");
    }
}
