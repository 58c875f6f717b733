//! Audio decode/encode behind the `Transcoder` seam

use std::fs::File;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::config::SampleEncoding;
use crate::error::AudioError;

/// Decoded interleaved samples
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl DecodedAudio {
    /// Samples per channel
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    /// Duration in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let rate = self.sample_rate as u64;
        // Rounded to the nearest millisecond
        (self.frames() as u64 * 1000 + rate / 2) / rate
    }
}

/// Decodes source clips and writes converted clips
pub trait Transcoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedAudio, AudioError>;
    fn encode(&self, audio: &DecodedAudio, path: &Path) -> Result<(), AudioError>;
}

/// Decodes any container symphonia knows and writes WAV with hound
#[derive(Debug, Clone, Copy)]
pub struct SymphoniaTranscoder {
    encoding: SampleEncoding,
}

impl SymphoniaTranscoder {
    pub fn new(encoding: SampleEncoding) -> Self {
        Self { encoding }
    }
}

impl Default for SymphoniaTranscoder {
    fn default() -> Self {
        Self::new(SampleEncoding::Pcm16)
    }
}

impl Transcoder for SymphoniaTranscoder {
    fn decode(&self, path: &Path) -> Result<DecodedAudio, AudioError> {
        let file = File::open(path).map_err(|e| AudioError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::Probe(e.to_string()))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(AudioError::NoTrack)?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params
            .sample_rate
            .ok_or(AudioError::UnknownSampleRate)?;
        let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::Codec(e.to_string()))?;

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(AudioError::Decode(format!("packet: {}", e))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt frame in {}: {}", path.display(), e);
                    continue;
                }
                Err(e) => return Err(AudioError::Decode(e.to_string())),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            channels = spec.channels.count();
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }

        if samples.is_empty() || channels == 0 {
            return Err(AudioError::Empty);
        }

        debug!(
            "Decoded {}: {} Hz, {} channels, {} samples",
            path.display(),
            sample_rate,
            channels,
            samples.len()
        );

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }

    fn encode(&self, audio: &DecodedAudio, path: &Path) -> Result<(), AudioError> {
        let channels = u16::try_from(audio.channels)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| AudioError::Encode(format!("invalid channel count {}", audio.channels)))?;

        let spec = match self.encoding {
            SampleEncoding::Pcm16 => WavSpec {
                channels,
                sample_rate: audio.sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            SampleEncoding::Float32 => WavSpec {
                channels,
                sample_rate: audio.sample_rate,
                bits_per_sample: 32,
                sample_format: SampleFormat::Float,
            },
        };

        let encode_err = |e: hound::Error| AudioError::Encode(e.to_string());
        let mut writer = WavWriter::create(path, spec).map_err(encode_err)?;

        match self.encoding {
            SampleEncoding::Pcm16 => {
                for &sample in &audio.samples {
                    writer
                        .write_sample(to_pcm16(sample))
                        .map_err(encode_err)?;
                }
            }
            SampleEncoding::Float32 => {
                for &sample in &audio.samples {
                    writer.write_sample(sample).map_err(encode_err)?;
                }
            }
        }

        writer.finalize().map_err(encode_err)
    }
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
