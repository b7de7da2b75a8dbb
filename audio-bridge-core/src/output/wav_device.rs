use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::config::DeviceConfig;
use crate::models::device_info::{EndpointInfo, EndpointKind};
use crate::models::error::BridgeError;
use crate::processing::wav_format;
use crate::traits::output_device::OutputDevice;

/// Output device that streams native-format samples into a WAV file.
///
/// ```text
/// [44-byte WAV header, sizes patched on close]
/// [interleaved little-endian samples...]
/// ```
///
/// The SHA-256 of the finished file is available from
/// [`checksum`](OutputDevice::checksum) after `close`.
pub struct WavFileDevice {
    file_path: PathBuf,
    file: Option<BufWriter<File>>,
    header: [u8; wav_format::WAV_HEADER_SIZE],
    data_bytes: u64,
    frames_written: u64,
    checksum: Option<String>,
}

impl WavFileDevice {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            file: None,
            header: [0u8; wav_format::WAV_HEADER_SIZE],
            data_bytes: 0,
            frames_written: 0,
            checksum: None,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Sample data bytes written so far (header excluded).
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn finalize(&mut self) -> Result<(), BridgeError> {
        let Some(mut file) = self.file.take() else {
            return Err(BridgeError::DeviceCloseFailed("file is not open".into()));
        };

        let total = self.data_bytes + wav_format::WAV_HEADER_SIZE as u64;
        wav_format::patch_file_size(&mut self.header, total);
        wav_format::patch_data_size(&mut self.header, self.data_bytes);

        let patched = file
            .seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(&self.header))
            .and_then(|_| file.flush());
        patched.map_err(|e| BridgeError::DeviceCloseFailed(format!("failed to finalize WAV: {}", e)))?;
        drop(file);

        self.checksum = Some(sha256_file(&self.file_path)?);
        Ok(())
    }
}

impl OutputDevice for WavFileDevice {
    fn open(&mut self, config: &DeviceConfig) -> Result<(), BridgeError> {
        if self.file.is_some() {
            return Err(BridgeError::DeviceOpenFailed("already open".into()));
        }

        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| BridgeError::DeviceOpenFailed(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&self.file_path).map_err(|e| {
            BridgeError::DeviceOpenFailed(format!("{}: {}", self.file_path.display(), e))
        })?;
        let mut file = BufWriter::new(file);

        self.header = wav_format::generate_wav_header(
            config.sample_rate,
            config.sample_format,
            config.channels,
            0, // patched on close
        );
        file.write_all(&self.header)
            .map_err(|e| BridgeError::DeviceOpenFailed(format!("failed to write header: {}", e)))?;

        self.data_bytes = 0;
        self.frames_written = 0;
        self.checksum = None;
        self.file = Some(file);

        log::info!(
            "WAV output opened: {} ({} Hz, {} ch, {})",
            self.file_path.display(),
            config.sample_rate,
            config.channels,
            config.sample_format
        );
        Ok(())
    }

    fn write(&mut self, data: &[u8], frames: usize) -> Result<usize, BridgeError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| BridgeError::DeviceWriteFailed("file is not open".into()))?;
        file.write_all(data)
            .map_err(|e| BridgeError::DeviceWriteFailed(format!("write failed: {}", e)))?;
        self.data_bytes += data.len() as u64;
        self.frames_written += frames as u64;
        Ok(data.len())
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        self.finalize()?;
        log::info!(
            "WAV output closed: {} ({} frames)",
            self.file_path.display(),
            self.frames_written
        );
        Ok(())
    }

    fn device_info(&self) -> EndpointInfo {
        EndpointInfo::new(
            self.file_path.to_string_lossy(),
            "WAV file",
            EndpointKind::File,
        )
    }

    fn checksum(&self) -> Option<String> {
        self.checksum.clone()
    }
}

/// SHA-256 hex digest of a file, streamed.
fn sha256_file(path: &Path) -> Result<String, BridgeError> {
    let mut file = File::open(path)
        .map_err(|e| BridgeError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| BridgeError::StorageError(format!("failed to hash file: {}", e)))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::sample_format::SampleFormat;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("audio_bridge_test_{}_{}", uuid::Uuid::new_v4(), name))
    }

    fn config(format: SampleFormat) -> DeviceConfig {
        DeviceConfig {
            device_id: "test".into(),
            sample_rate: 48000,
            channels: 2,
            buffer_frames: 480,
            sample_format: format,
        }
    }

    #[test]
    fn writes_patched_wav() {
        let path = temp_file_path("plain.wav");
        let mut device = WavFileDevice::new(&path);
        device.open(&config(SampleFormat::S16Le)).unwrap();

        // 4 stereo frames of s16
        assert_eq!(device.write(&[0u8; 16], 4).unwrap(), 16);
        device.close().unwrap();
        assert!(!device.is_open());
        assert_eq!(device.frames_written(), 4);

        let file_data = fs::read(&path).unwrap();
        assert_eq!(file_data.len(), 44 + 16);
        assert_eq!(&file_data[0..4], b"RIFF");
        assert_eq!(&file_data[8..12], b"WAVE");

        let data_size = u32::from_le_bytes([file_data[40], file_data[41], file_data[42], file_data[43]]);
        assert_eq!(data_size, 16);
        let riff_size = u32::from_le_bytes([file_data[4], file_data[5], file_data[6], file_data[7]]);
        assert_eq!(riff_size, 36 + 16);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn checksum_matches_file_contents() {
        let path = temp_file_path("checksum.wav");
        let mut device = WavFileDevice::new(&path);
        assert!(device.checksum().is_none());

        device.open(&config(SampleFormat::F32Le)).unwrap();
        device.write(&[0x42u8; 8], 1).unwrap();
        device.close().unwrap();

        let expected = hex_encode(&Sha256::digest(fs::read(&path).unwrap()));
        assert_eq!(device.checksum(), Some(expected));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn write_after_close_fails() {
        let path = temp_file_path("closed.wav");
        let mut device = WavFileDevice::new(&path);
        device.open(&config(SampleFormat::S16Le)).unwrap();
        device.close().unwrap();

        assert!(matches!(
            device.write(&[0u8; 4], 1),
            Err(BridgeError::DeviceWriteFailed(_))
        ));
        assert!(matches!(device.close(), Err(BridgeError::DeviceCloseFailed(_))));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn unwritable_path_fails_to_open() {
        let dir = temp_file_path("dir");
        fs::create_dir_all(&dir).unwrap();
        // a directory cannot be created as a file
        let mut device = WavFileDevice::new(&dir);
        assert!(matches!(
            device.open(&config(SampleFormat::S16Le)),
            Err(BridgeError::DeviceOpenFailed(_))
        ));
        fs::remove_dir_all(&dir).ok();
    }
}
