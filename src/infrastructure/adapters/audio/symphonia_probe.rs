//! Symphonia Audio Probe - 基于 symphonia 的音频时长探测
//!
//! 优先使用容器头中的总帧数；没有时（如 MP3）累加数据包时长

use std::io::Cursor;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioProbeError, AudioProbePort};

#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaAudioProbe;

impl SymphoniaAudioProbe {
    pub fn new() -> Self {
        Self
    }
}

impl AudioProbePort for SymphoniaAudioProbe {
    fn duration_secs(&self, data: &[u8], extension_hint: &str) -> Result<f64, AudioProbeError> {
        if data.is_empty() {
            return Err(AudioProbeError::DecodingError("empty audio data".to_string()));
        }

        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if !extension_hint.is_empty() {
            hint.with_extension(extension_hint);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AudioProbeError::UnsupportedFormat(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| AudioProbeError::DecodingError("No audio track found".to_string()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        if let (Some(n_frames), Some(rate)) = (params.n_frames, params.sample_rate) {
            if rate > 0 {
                return Ok(n_frames as f64 / rate as f64);
            }
        }

        let mut total: u64 = 0;
        loop {
            match format.next_packet() {
                Ok(packet) if packet.track_id() == track_id => total += packet.dur,
                Ok(_) => continue,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(AudioProbeError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            }
        }

        if let Some(time_base) = params.time_base {
            let time = time_base.calc_time(total);
            return Ok(time.seconds as f64 + time.frac);
        }
        match params.sample_rate {
            Some(rate) if rate > 0 => Ok(total as f64 / rate as f64),
            _ => Err(AudioProbeError::DecodingError("Unknown sample rate".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 单声道 16 位静音 WAV
    fn create_test_wav(sample_rate: u32, num_samples: usize) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;

        let data_size = num_samples * (bits_per_sample as usize / 8) * num_channels as usize;
        let file_size = 36 + data_size;

        let mut wav = Vec::with_capacity(44 + data_size);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(file_size as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        let block_align = num_channels * (bits_per_sample / 8);
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());
        wav.resize(44 + data_size, 0);
        wav
    }

    #[test]
    fn test_wav_duration() {
        let probe = SymphoniaAudioProbe::new();
        let one_second = create_test_wav(16000, 16000);
        let secs = probe.duration_secs(&one_second, "wav").unwrap();
        assert!((secs - 1.0).abs() < 1e-3);

        let half = create_test_wav(22050, 11025);
        let secs = probe.duration_secs(&half, "wav").unwrap();
        assert!((secs - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let probe = SymphoniaAudioProbe::new();
        assert!(probe.duration_secs(b"definitely not audio", "mp3").is_err());
        assert!(probe.duration_secs(&[], "wav").is_err());
    }
}
