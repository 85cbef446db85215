//! Spectral signatures for audio items.
//!
//! Audio is decoded to mono PCM with symphonia, analysed into a mel
//! spectrogram averaged over a fixed number of time bins, and reduced to a
//! contour hash: for each of `hash_size` time segments, one bit per adjacent
//! mel band pair records whether energy rises from the lower band to the
//! upper one. Log-energy differences make the hash insensitive to gain, and
//! the fixed width makes it comparable by Hamming distance.
//!
//! When the container declares its length, only the analysis windows are
//! kept while decoding; otherwise the whole track is buffered.

use std::f64::consts::PI;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::config::FingerprintConfig;
use crate::types::AudioSignature;

/// Analysis frames taken from each time bin.
const FRAMES_PER_BIN: usize = 2;
const MIN_FREQUENCY_HZ: f64 = 20.0;
const MAX_FREQUENCY_HZ: f64 = 8000.0;
const LOG_FLOOR: f64 = 1e-10;

/// An opened audio track, ready to be decoded packet by packet.
struct AudioStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: Option<u32>,
    /// Samples per channel, when the container declares it
    n_frames: Option<u64>,
}

impl AudioStream {
    fn open(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<Self, String> {
        let mss = MediaSourceStream::new(source, Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| format!("cannot probe audio: {e}"))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| "no audio track".to_string())?;
        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate;
        let n_frames = track.codec_params.n_frames;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| format!("unsupported codec: {e}"))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            n_frames,
        })
    }

    /// Decode to the end, handing each mono sample to `sink`.
    ///
    /// Returns the number of samples produced and the sample rate.
    fn for_each_sample<F>(mut self, mut sink: F) -> Result<(usize, u32), String>
    where
        F: FnMut(f32),
    {
        let mut count = 0usize;
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(format!("cannot read packet: {e}")),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Corrupt packet: skip it, keep the rest of the stream
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::trace!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(format!("cannot decode audio: {e}")),
            };

            let spec = *decoded.spec();
            self.sample_rate.get_or_insert(spec.rate);
            let channels = spec.channels.count().max(1);

            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            for frame in buffer.samples().chunks(channels) {
                sink(frame.iter().sum::<f32>() / channels as f32);
                count += 1;
            }
        }

        let sample_rate = self
            .sample_rate
            .ok_or_else(|| "unknown sample rate".to_string())?;
        Ok((count, sample_rate))
    }
}

/// Keeps only the analysis windows of a sample stream.
struct WindowCollector {
    /// Window start offsets, non-decreasing
    starts: Vec<usize>,
    frame_size: usize,
    frames: Vec<Vec<f32>>,
    /// First window not yet full
    next: usize,
    position: usize,
}

impl WindowCollector {
    fn new(starts: Vec<usize>, frame_size: usize) -> Self {
        let frames = starts.iter().map(|_| Vec::with_capacity(frame_size)).collect();
        Self {
            starts,
            frame_size,
            frames,
            next: 0,
            position: 0,
        }
    }

    fn push(&mut self, sample: f32) {
        let i = self.position;
        self.position += 1;

        let mut w = self.next;
        while w < self.starts.len() && self.starts[w] <= i {
            if i < self.starts[w] + self.frame_size {
                self.frames[w].push(sample);
            }
            w += 1;
        }
        while self.next < self.frames.len() && self.frames[self.next].len() == self.frame_size {
            self.next += 1;
        }
    }

    fn is_complete(&self) -> bool {
        self.next == self.frames.len()
    }
}

/// Hann-windowed power spectrum over a fixed frame length.
#[derive(Clone)]
struct Spectrum {
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl Spectrum {
    fn new(frame_size: usize) -> Self {
        let n = frame_size as f64;
        let window = (0..frame_size)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos())
            .collect();
        let fft = FftPlanner::new().plan_fft_forward(frame_size);
        Self { window, fft }
    }

    /// Power at bins `0..=N/2`.
    fn power(&self, frame: &[f32]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = frame
            .iter()
            .zip(&self.window)
            .map(|(x, w)| Complex::new(*x as f64 * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);
        buffer[..=self.window.len() / 2]
            .iter()
            .map(|c| c.norm_sqr())
            .collect()
    }
}

impl fmt::Debug for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spectrum")
            .field("frame_size", &self.window.len())
            .finish()
    }
}

/// Computes [`AudioSignature`]s from mono PCM.
#[derive(Debug, Clone)]
pub struct AcousticAnalyzer {
    hash_size: usize,
    time_bins: usize,
    frame_size: usize,
    spectrum: Spectrum,
}

impl AcousticAnalyzer {
    pub fn new(config: &FingerprintConfig) -> Self {
        Self {
            hash_size: config.hash_size as usize,
            time_bins: config.audio_time_bins.max(config.hash_size as usize),
            frame_size: config.audio_frame_size,
            spectrum: Spectrum::new(config.audio_frame_size),
        }
    }

    /// Width of produced hashes in bits.
    pub fn width(&self) -> usize {
        self.hash_size * self.hash_size
    }

    pub fn analyze_file(&self, path: &Path) -> Result<AudioSignature, String> {
        let ext = path.extension().and_then(|e| e.to_str());
        self.analyze(
            || {
                let file = File::open(path).map_err(|e| format!("cannot open audio: {e}"))?;
                Ok(Box::new(file) as Box<dyn MediaSource>)
            },
            ext,
        )
    }

    pub fn analyze_bytes(
        &self,
        data: Arc<[u8]>,
        extension: Option<&str>,
    ) -> Result<AudioSignature, String> {
        self.analyze(
            || Ok(Box::new(Cursor::new(Arc::clone(&data))) as Box<dyn MediaSource>),
            extension,
        )
    }

    /// Decode and analyse, collecting only the needed windows when the track
    /// length is known up front.
    fn analyze<F>(&self, open: F, extension: Option<&str>) -> Result<AudioSignature, String>
    where
        F: Fn() -> Result<Box<dyn MediaSource>, String>,
    {
        let stream = AudioStream::open(open()?, extension)?;

        if let Some(expected) = stream.n_frames.and_then(|n| usize::try_from(n).ok()) {
            if expected >= self.frame_size {
                let mut collector =
                    WindowCollector::new(self.frame_offsets(expected), self.frame_size);
                let (total, sample_rate) = stream.for_each_sample(|s| collector.push(s))?;
                if total == expected && collector.is_complete() {
                    return self.signature_from_frames(&collector.frames, total, sample_rate);
                }
                tracing::debug!(
                    "Decoded {} samples, header declared {}; decoding again in full",
                    total,
                    expected
                );
                return self.analyze_buffered(AudioStream::open(open()?, extension)?);
            }
        }

        self.analyze_buffered(stream)
    }

    fn analyze_buffered(&self, stream: AudioStream) -> Result<AudioSignature, String> {
        let mut samples = Vec::new();
        let (_, sample_rate) = stream.for_each_sample(|s| samples.push(s))?;
        self.signature(&samples, sample_rate)
    }

    /// Build a signature from mono samples.
    pub fn signature(&self, samples: &[f32], sample_rate: u32) -> Result<AudioSignature, String> {
        if samples.len() < self.frame_size {
            return Err(self.too_short(samples.len()));
        }
        let frames: Vec<&[f32]> = self
            .frame_offsets(samples.len())
            .into_iter()
            .map(|offset| &samples[offset..offset + self.frame_size])
            .collect();
        self.signature_from_frames(&frames, samples.len(), sample_rate)
    }

    /// Start offsets of the analysis windows for a track of `len` samples.
    ///
    /// `FRAMES_PER_BIN` windows per time bin, in stream order. Requires
    /// `len >= frame_size`.
    fn frame_offsets(&self, len: usize) -> Vec<usize> {
        let last = len - self.frame_size;
        (0..self.time_bins)
            .flat_map(|bin| {
                let start = bin * len / self.time_bins;
                let end = (bin + 1) * len / self.time_bins;
                (0..FRAMES_PER_BIN)
                    .map(move |f| (start + (end - start) * f / FRAMES_PER_BIN).min(last))
            })
            .collect()
    }

    fn signature_from_frames<W: AsRef<[f32]>>(
        &self,
        frames: &[W],
        total_samples: usize,
        sample_rate: u32,
    ) -> Result<AudioSignature, String> {
        if sample_rate == 0 {
            return Err("sample rate is zero".to_string());
        }
        if total_samples < self.frame_size {
            return Err(self.too_short(total_samples));
        }

        let n_mels = self.hash_size + 1;
        let filterbank = mel_filterbank(n_mels, self.frame_size, sample_rate);
        let bins = self.mel_time_bins(frames, &filterbank);

        let mut bits = Vec::with_capacity(self.width());
        for segment in 0..self.hash_size {
            let start = segment * self.time_bins / self.hash_size;
            let end = ((segment + 1) * self.time_bins / self.hash_size).max(start + 1);
            let mut mean = vec![0.0f64; n_mels];
            for bin in &bins[start..end] {
                for (m, value) in mean.iter_mut().zip(bin) {
                    *m += value;
                }
            }
            for band in 0..self.hash_size {
                bits.push(mean[band + 1] > mean[band]);
            }
        }

        Ok(AudioSignature {
            hash: hex::encode(pack_bits(&bits)),
            duration_secs: total_samples as f64 / sample_rate as f64,
            sample_rate,
        })
    }

    /// Log-mel energies averaged within each time bin.
    fn mel_time_bins<W: AsRef<[f32]>>(
        &self,
        frames: &[W],
        filterbank: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        frames
            .chunks(FRAMES_PER_BIN)
            .map(|bin_frames| {
                let mut acc = vec![0.0f64; filterbank.len()];
                for frame in bin_frames {
                    let power = self.spectrum.power(frame.as_ref());
                    for (a, filter) in acc.iter_mut().zip(filterbank) {
                        let energy: f64 = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
                        *a += (energy + LOG_FLOOR).ln();
                    }
                }
                for a in acc.iter_mut() {
                    *a /= bin_frames.len() as f64;
                }
                acc
            })
            .collect()
    }

    fn too_short(&self, len: usize) -> String {
        format!(
            "audio too short: {} samples, need at least {}",
            len, self.frame_size
        )
    }
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filters over the `N/2 + 1` spectrum bins.
fn mel_filterbank(n_mels: usize, frame_size: usize, sample_rate: u32) -> Vec<Vec<f64>> {
    let n_bins = frame_size / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;
    let f_max = MAX_FREQUENCY_HZ.min(nyquist);
    let f_min = MIN_FREQUENCY_HZ.min(f_max / 2.0);
    let (mel_min, mel_max) = (hz_to_mel(f_min), hz_to_mel(f_max));
    let edges: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
        .collect();
    let bin_hz = sample_rate as f64 / frame_size as f64;

    (0..n_mels)
        .map(|m| {
            let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
            let mut filter: Vec<f64> = (0..n_bins)
                .map(|k| {
                    let f = k as f64 * bin_hz;
                    if f <= lo || f >= hi {
                        0.0
                    } else if f <= center {
                        (f - lo) / (center - lo)
                    } else {
                        (hi - f) / (hi - center)
                    }
                })
                .collect();
            // Filters narrower than one bin still need a tap
            if filter.iter().all(|w| *w == 0.0) {
                let nearest = ((center / bin_hz).round() as usize).min(n_bins - 1);
                filter[nearest] = 1.0;
            }
            filter
        })
        .collect()
}

/// Pack bits MSB-first into bytes.
fn pack_bits(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, bit)| if *bit { byte | (0x80 >> i) } else { byte })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::hamming_distance;

    /// A deterministic multi-tone signal with energy spread across the mel range.
    fn chord(seconds: f64, sample_rate: u32, gain: f32) -> Vec<f32> {
        let mut seed = 0x2545_f491u32;
        let tones: Vec<(f64, f64)> = (0..40)
            .map(|i| {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let amp = 0.002 + 0.018 * ((seed >> 16) as f64 / 65_535.0);
                let freq = 60.0 * (7500.0f64 / 60.0).powf(i as f64 / 39.0);
                (freq, amp)
            })
            .collect();
        let n = (seconds * sample_rate as f64) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                let v: f64 = tones
                    .iter()
                    .map(|(f, a)| a * (2.0 * PI * f * t).sin())
                    .sum();
                v as f32 * gain
            })
            .collect()
    }

    fn analyzer() -> AcousticAnalyzer {
        AcousticAnalyzer::new(&FingerprintConfig::default())
    }

    #[test]
    fn test_signature_width_and_duration() {
        let sig = analyzer().signature(&chord(2.0, 22_050, 1.0), 22_050).unwrap();
        assert_eq!(sig.hash.len(), 16);
        assert!((sig.duration_secs - 2.0).abs() < 1e-3);
        assert_eq!(sig.sample_rate, 22_050);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let samples = chord(1.0, 16_000, 1.0);
        let a = analyzer().signature(&samples, 16_000).unwrap();
        let b = analyzer().signature(&samples, 16_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gain_change_keeps_hash_close() {
        let loud = analyzer().signature(&chord(1.5, 16_000, 1.0), 16_000).unwrap();
        let quiet = analyzer().signature(&chord(1.5, 16_000, 0.5), 16_000).unwrap();
        let distance = hamming_distance(&loud.hash, &quiet.hash).unwrap();
        assert!(distance <= 8, "distance {distance}");
    }

    #[test]
    fn test_short_audio_is_rejected() {
        let err = analyzer().signature(&[0.0; 100], 44_100).unwrap_err();
        assert!(err.contains("too short"));
    }

    #[test]
    fn test_zero_sample_rate_is_rejected() {
        assert!(analyzer().signature(&[0.0; 4096], 0).is_err());
    }

    #[test]
    fn test_filterbank_has_taps_for_every_band() {
        let bank = mel_filterbank(17, 256, 8_000);
        assert_eq!(bank.len(), 17);
        assert!(bank.iter().all(|f| f.iter().any(|w| *w > 0.0)));
    }

    #[test]
    fn test_pack_bits_msb_first() {
        let bits = [true, false, false, false, false, false, false, true, true];
        assert_eq!(pack_bits(&bits), vec![0x81, 0x80]);
    }

    fn wav_bytes(samples: &[f32], sample_rate: u32) -> Arc<[u8]> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                let v = (s * i16::MAX as f32) as i16;
                writer.write_sample(v).unwrap();
                writer.write_sample(v).unwrap();
            }
            writer.finalize().unwrap();
        }
        Arc::from(cursor.into_inner())
    }

    #[test]
    fn test_decode_garbage_fails() {
        let data: Arc<[u8]> = Arc::from(vec![0u8; 512]);
        assert!(analyzer().analyze_bytes(data, Some("wav")).is_err());
    }

    #[test]
    fn test_collector_keeps_only_analysis_windows() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let starts = vec![0, 10, 10, 500, 990];
        let mut collector = WindowCollector::new(starts.clone(), 10);
        for s in &samples {
            collector.push(*s);
        }

        assert!(collector.is_complete());
        for (frame, start) in collector.frames.iter().zip(&starts) {
            assert_eq!(frame.as_slice(), &samples[*start..start + 10]);
        }
    }

    #[test]
    fn test_collector_incomplete_when_stream_ends_early() {
        let mut collector = WindowCollector::new(vec![0, 95], 10);
        for i in 0..100 {
            collector.push(i as f32);
        }
        assert!(!collector.is_complete());
    }

    #[test]
    fn test_windowed_decode_matches_buffered_decode() {
        let data = wav_bytes(&chord(2.0, 16_000, 0.5), 16_000);
        let a = analyzer();

        let streamed = a.analyze_bytes(Arc::clone(&data), Some("wav")).unwrap();
        let source = Box::new(Cursor::new(Arc::clone(&data)));
        let stream = AudioStream::open(source, Some("wav")).unwrap();
        assert_eq!(stream.n_frames, Some(32_000));
        let buffered = a.analyze_buffered(stream).unwrap();

        assert_eq!(streamed, buffered);
        assert!((streamed.duration_secs - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_offsets_stay_in_bounds() {
        let a = analyzer();
        let offsets = a.frame_offsets(a.frame_size);
        assert_eq!(offsets.len(), a.time_bins * FRAMES_PER_BIN);
        assert!(offsets.iter().all(|o| *o == 0));

        let offsets = a.frame_offsets(100_000);
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert!(offsets.iter().all(|o| o + a.frame_size <= 100_000));
    }
}
