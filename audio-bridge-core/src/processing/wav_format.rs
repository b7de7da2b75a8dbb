//! WAV container helpers for the file-backed output device.
//!
//! Generates the 44-byte RIFF header for any [`SampleFormat`] and patches
//! its size fields once the stream length is known.

use super::sample_format::SampleFormat;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;

/// Generate a 44-byte WAV RIFF header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (fmt chunk size)
/// [20-21]  format code: 1 = PCM, 3 = IEEE float
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * block_align
/// [32-33]  block_align = channels * bytes_per_sample
/// [34-35]  bits per sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(
    sample_rate: u32,
    format: SampleFormat,
    channels: u16,
    data_size: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let block_align = channels * format.bytes_per_sample() as u16;
    let byte_rate = sample_rate * block_align as u32;
    let chunk_size = 36 + data_size;
    let format_code = if format.is_float() {
        FORMAT_IEEE_FLOAT
    } else {
        FORMAT_PCM
    };

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&format_code.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&format.bit_depth().to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// RIFF chunk size field (offset 4) for a file of `total_file_size` bytes.
pub fn riff_chunk_size(total_file_size: u64) -> u32 {
    total_file_size.saturating_sub(8).min(u32::MAX as u64) as u32
}

/// Patch the file-size field at offset 4.
pub fn patch_file_size(header: &mut [u8], total_file_size: u64) {
    header[4..8].copy_from_slice(&riff_chunk_size(total_file_size).to_le_bytes());
}

/// Patch the data-size field at offset 40.
pub fn patch_data_size(header: &mut [u8], data_size: u64) {
    let data_size_u32 = data_size.min(u32::MAX as u64) as u32;
    header[40..44].copy_from_slice(&data_size_u32.to_le_bytes());
}
