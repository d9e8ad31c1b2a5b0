use std::io::Cursor;

use rubato::{FftFixedIn, Resampler};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::debug;

use crate::error::{GistError, Result};

pub const TARGET_SAMPLE_RATE: u32 = 16000;
const TARGET_CHANNELS: usize = 1;

fn decode_error(message: impl std::fmt::Display) -> GistError {
    GistError::extraction("audio", message)
}

/// Decoding, down-mixing and resampling of audio containers.
pub struct AudioPreprocessor;

impl AudioPreprocessor {
    /// Decode the first audio track of `bytes` into interleaved f32 PCM.
    ///
    /// Works for audio files (MP3, WAV) and for the sound track of MP4 video.
    /// Returns `(samples, sample_rate, channels)`.
    pub fn decode(bytes: &[u8], format_hint: Option<&str>) -> Result<(Vec<f32>, u32, usize)> {
        if bytes.is_empty() {
            return Err(decode_error("Empty audio data"));
        }

        let cursor = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = format_hint {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| decode_error(format!("Failed to probe audio format: {e}")))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| decode_error("No audio tracks found"))?;
        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| decode_error("Sample rate not available"))?;

        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .unwrap_or(0);

        debug!(
            sample_rate,
            channels,
            codec = ?track.codec_params.codec,
            "Decoding audio track"
        );

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| decode_error(format!("Failed to create decoder: {e}")))?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(e) => return Err(decode_error(format!("Failed to read packet: {e}"))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    // Some containers only report the layout once decoding starts.
                    if channels == 0 {
                        channels = decoded.spec().channels.count();
                    }
                    Self::append_samples(&mut samples, decoded);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!("Decode error (skipping): {}", e);
                    continue;
                }
                Err(e) => return Err(decode_error(format!("Failed to decode audio: {e}"))),
            }
        }

        if samples.is_empty() {
            return Err(decode_error("No audio samples decoded"));
        }

        debug!(samples = samples.len(), sample_rate, "Decoded audio");

        Ok((samples, sample_rate, channels.max(1)))
    }

    fn append_samples(samples: &mut Vec<f32>, buffer: AudioBufferRef) {
        match buffer {
            AudioBufferRef::U8(buf) => interleave(samples, &buf),
            AudioBufferRef::U16(buf) => interleave(samples, &buf),
            AudioBufferRef::U24(buf) => interleave(samples, &buf),
            AudioBufferRef::U32(buf) => interleave(samples, &buf),
            AudioBufferRef::S8(buf) => interleave(samples, &buf),
            AudioBufferRef::S16(buf) => interleave(samples, &buf),
            AudioBufferRef::S24(buf) => interleave(samples, &buf),
            AudioBufferRef::S32(buf) => interleave(samples, &buf),
            AudioBufferRef::F32(buf) => interleave(samples, &buf),
            AudioBufferRef::F64(buf) => interleave(samples, &buf),
        }
    }

    /// Length of decoded audio in whole seconds.
    pub fn duration_secs(sample_count: usize, sample_rate: u32, channels: usize) -> u64 {
        let frames = sample_count / channels.max(1);
        frames as u64 / sample_rate.max(1) as u64
    }

    /// Average interleaved channels down to one.
    fn to_mono(samples: Vec<f32>, channels: usize) -> Vec<f32> {
        if channels <= 1 {
            return samples;
        }

        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }

    /// Down-mix and resample to the 16 kHz mono layout whisper expects.
    pub fn resample_to_16khz_mono(
        samples: Vec<f32>,
        sample_rate: u32,
        channels: usize,
    ) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Err(decode_error("Empty samples for resampling"));
        }

        let mono_samples = Self::to_mono(samples, channels);

        if sample_rate == TARGET_SAMPLE_RATE {
            return Ok(mono_samples);
        }

        debug!(from = sample_rate, to = TARGET_SAMPLE_RATE, "Resampling audio");

        let chunk_size = 1024.min(mono_samples.len());

        let mut resampler = FftFixedIn::<f32>::new(
            sample_rate as usize,
            TARGET_SAMPLE_RATE as usize,
            chunk_size,
            2,
            TARGET_CHANNELS,
        )
        .map_err(|e| decode_error(format!("Failed to create resampler: {e}")))?;

        let mut output_samples = Vec::new();
        let mut pos = 0;

        while pos < mono_samples.len() {
            let end = (pos + chunk_size).min(mono_samples.len());
            let chunk = &mono_samples[pos..end];

            let output = if chunk.len() == chunk_size {
                resampler
                    .process(&[chunk.to_vec()], None)
                    .map_err(|e| decode_error(format!("Resampling failed: {e}")))?
            } else {
                let mut padded = vec![0.0; chunk_size];
                padded[..chunk.len()].copy_from_slice(chunk);
                let mut result = resampler
                    .process(&[padded], None)
                    .map_err(|e| decode_error(format!("Resampling failed: {e}")))?;

                let expected_out = ((chunk.len() as f32 / sample_rate as f32)
                    * TARGET_SAMPLE_RATE as f32) as usize;
                result[0].truncate(expected_out);
                result
            };

            output_samples.extend_from_slice(&output[0]);
            pos = end;
        }

        Ok(output_samples)
    }

    /// Encode 16 kHz mono f32 samples as a 16-bit PCM WAV file.
    pub fn encode_wav(samples: &[f32]) -> Vec<u8> {
        const NUM_CHANNELS: u16 = 1;
        const BITS_PER_SAMPLE: u16 = 16;
        const BYTE_RATE: u32 =
            TARGET_SAMPLE_RATE * NUM_CHANNELS as u32 * (BITS_PER_SAMPLE as u32 / 8);
        const BLOCK_ALIGN: u16 = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);

        let data_size = (samples.len() * 2) as u32;
        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&NUM_CHANNELS.to_le_bytes());
        buf.extend_from_slice(&TARGET_SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&BYTE_RATE.to_le_bytes());
        buf.extend_from_slice(&BLOCK_ALIGN.to_le_bytes());
        buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let pcm = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&pcm.to_le_bytes());
        }

        buf
    }
}

fn interleave<S>(samples: &mut Vec<f32>, buf: &AudioBuffer<S>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let channels = buf.spec().channels.count();
    samples.reserve(buf.frames() * channels);
    for frame in 0..buf.frames() {
        for ch in 0..channels {
            samples.push(f32::from_sample(buf.chan(ch)[frame]));
        }
    }
}
