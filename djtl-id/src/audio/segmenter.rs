//! Fixed-duration segmenter
//!
//! Decodes any symphonia-supported file packet by packet, downmixes to mono
//! and streams samples into 16-bit WAV files of `chunk_duration` seconds.
//! Only one segment is held open at a time, so multi-hour recordings never
//! sit in memory whole. The final segment may be shorter.
//!
//! Segment bounds are derived from sample counts, so consecutive segments
//! share their boundary exactly.

use super::AudioError;
use crate::models::Segment;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Segmenting result
#[derive(Debug, Clone)]
pub struct SegmentedAudio {
    pub segments: Vec<Segment>,
    pub sample_rate: u32,
    /// Length of the decoded audio in seconds
    pub total_duration: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    chunk_duration: f64,
}

impl Segmenter {
    pub fn new(chunk_duration: f64) -> Result<Self, AudioError> {
        if !chunk_duration.is_finite() || chunk_duration <= 0.0 {
            return Err(AudioError::InvalidChunkDuration(chunk_duration));
        }
        Ok(Self { chunk_duration })
    }

    pub fn chunk_duration(&self) -> f64 {
        self.chunk_duration
    }

    /// Split `input` into `segment_NNNN.wav` files under `out_dir`
    pub fn split(&self, input: &Path, out_dir: &Path) -> Result<SegmentedAudio, AudioError> {
        tracing::debug!(path = %input.display(), chunk_duration = self.chunk_duration, "Segmenting audio");

        let file = File::open(input).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AudioError::NotFound(input.to_path_buf()),
            _ => AudioError::Io(e),
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = input.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AudioError::Decode(format!("Failed to probe {}: {}", input.display(), e)))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::Decode("No audio track found".to_string()))?;
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::Decode(format!("Unsupported codec: {}", e)))?;

        let mut writer: Option<ChunkWriter> = None;
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(AudioError::Decode(format!("Error reading packet: {}", e))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(error = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(AudioError::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count().max(1);

            let chunk_writer = writer.get_or_insert_with(|| {
                ChunkWriter::new(out_dir, spec.rate, self.samples_per_chunk(spec.rate))
            });

            let needed = decoded.capacity() * channels;
            if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
                sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            let Some(buf) = sample_buf.as_mut() else {
                continue;
            };
            buf.copy_interleaved_ref(decoded);

            for frame in buf.samples().chunks(channels) {
                let mono = frame.iter().sum::<f32>() / channels as f32;
                chunk_writer.push(mono)?;
            }
        }

        let Some(writer) = writer else {
            return Err(AudioError::Decode(format!(
                "No audio decoded from {}",
                input.display()
            )));
        };
        let result = writer.finish()?;

        tracing::info!(
            path = %input.display(),
            segments = result.segments.len(),
            total_duration = result.total_duration,
            "Audio segmented"
        );

        Ok(result)
    }

    fn samples_per_chunk(&self, sample_rate: u32) -> u64 {
        ((self.chunk_duration * sample_rate as f64).round() as u64).max(1)
    }
}

/// Streams mono samples into consecutive WAV files
struct ChunkWriter {
    out_dir: PathBuf,
    spec: WavSpec,
    samples_per_chunk: u64,
    current: Option<WavWriter<BufWriter<File>>>,
    current_len: u64,
    total_samples: u64,
    segments: Vec<Segment>,
}

impl ChunkWriter {
    fn new(out_dir: &Path, sample_rate: u32, samples_per_chunk: u64) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            spec: WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            samples_per_chunk,
            current: None,
            current_len: 0,
            total_samples: 0,
            segments: Vec::new(),
        }
    }

    fn segment_path(&self, index: usize) -> PathBuf {
        self.out_dir.join(format!("segment_{:04}.wav", index))
    }

    fn push(&mut self, sample: f32) -> Result<(), AudioError> {
        if self.current.is_none() {
            let path = self.segment_path(self.segments.len());
            self.current = Some(WavWriter::create(path, self.spec)?);
        }
        let Some(writer) = self.current.as_mut() else {
            return Ok(());
        };

        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(scaled)?;
        self.current_len += 1;
        self.total_samples += 1;

        if self.current_len == self.samples_per_chunk {
            self.close_current()?;
        }
        Ok(())
    }

    fn close_current(&mut self) -> Result<(), AudioError> {
        let Some(writer) = self.current.take() else {
            return Ok(());
        };
        writer.finalize()?;

        let index = self.segments.len();
        let rate = self.spec.sample_rate as f64;
        let start_sample = index as u64 * self.samples_per_chunk;
        self.segments.push(Segment {
            index,
            start: start_sample as f64 / rate,
            end: (start_sample + self.current_len) as f64 / rate,
            path: self.segment_path(index),
        });
        self.current_len = 0;
        Ok(())
    }

    fn finish(mut self) -> Result<SegmentedAudio, AudioError> {
        self.close_current()?;
        Ok(SegmentedAudio {
            total_duration: self.total_samples as f64 / self.spec.sample_rate as f64,
            sample_rate: self.spec.sample_rate,
            segments: self.segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_stereo_wav(path: &Path, sample_rate: u32, seconds: f64) {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        let frames = (seconds * sample_rate as f64) as u64;
        for n in 0..frames {
            let v = ((n as f32 * 0.05).sin() * 8000.0) as i16;
            writer.write_sample(v).unwrap();
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_invalid_chunk_duration() {
        assert!(Segmenter::new(0.0).is_err());
        assert!(Segmenter::new(-3.0).is_err());
        assert!(Segmenter::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_split_produces_contiguous_segments() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("set.wav");
        write_stereo_wav(&input, 8000, 5.5);

        let out = dir.path().join("segments");
        std::fs::create_dir(&out).unwrap();
        let result = Segmenter::new(2.0).unwrap().split(&input, &out).unwrap();

        assert_eq!(result.sample_rate, 8000);
        assert_eq!(result.segments.len(), 3);
        assert!((result.total_duration - 5.5).abs() < 1e-9);

        let last = &result.segments[2];
        assert_eq!(last.start, 4.0);
        assert!((last.end - 5.5).abs() < 1e-9);

        for pair in result.segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }

        let reader = hound::WavReader::open(&result.segments[0].path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.duration(), 16000);
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = Segmenter::new(30.0)
            .unwrap()
            .split(&dir.path().join("nope.mp3"), dir.path())
            .unwrap_err();
        assert!(matches!(err, AudioError::NotFound(_)));
    }
}
