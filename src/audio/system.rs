//! Live audio output streaming the shared software graph.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

use super::software::SharedGraph;
use super::AudioError;
use crate::params::{audio_constants::BLOCK_SIZE, RecordingConfig};

type SharedWriter = Arc<Mutex<hound::WavWriter<std::io::BufWriter<std::fs::File>>>>;

/// Audio output device playing a [`SharedGraph`]
pub struct AudioSystem {
    /// Output stream (kept alive)
    _stream: cpal::Stream,

    /// Optional WAV tee of everything played
    wav_writer: Option<SharedWriter>,

    sample_rate_hz: u32,
}

impl AudioSystem {
    /// Open the default output device and start streaming `graph`
    ///
    /// The graph must run at the device's sample rate; use
    /// [`AudioSystem::device_sample_rate`] to build it.
    pub fn new(
        graph: SharedGraph,
        recording_config: Option<&RecordingConfig>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::OutputError("No audio output device found".into()))?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::OutputError(format!("Failed to get audio config: {}", e)))?;
        let sample_rate_hz = config.sample_rate().0;
        let channels = config.channels() as usize;

        println!(
            "Audio: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate_hz,
            channels
        );

        let wav_writer = match recording_config {
            Some(recording) => {
                let spec = hound::WavSpec {
                    channels: 1,
                    sample_rate: sample_rate_hz,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = hound::WavWriter::create(&recording.audio_path, spec)?;
                Some(Arc::new(Mutex::new(writer)))
            }
            None => None,
        };
        let wav_writer_clone = wav_writer.clone();

        let mut block = [0.0f32; BLOCK_SIZE];
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let frames_needed = data.len() / channels;
                    let mut frame_idx = 0;

                    while frame_idx < frames_needed {
                        let len = (frames_needed - frame_idx).min(BLOCK_SIZE);
                        graph.render_block(&mut block[..len]);

                        for (i, &sample) in block[..len].iter().enumerate() {
                            // Safety limiter: hard clip to ±0.5 to prevent ear damage
                            let sample = sample.clamp(-0.5, 0.5);
                            let out_idx = (frame_idx + i) * channels;
                            data[out_idx..out_idx + channels].fill(sample);

                            if let Some(ref writer) = wav_writer_clone {
                                if let Ok(mut w) = writer.lock() {
                                    let _ = w.write_sample(sample);
                                }
                            }
                        }

                        frame_idx += len;
                    }
                },
                |err| tracing::warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::OutputError(format!("Failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::OutputError(format!("Failed to start audio stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            wav_writer,
            sample_rate_hz,
        })
    }

    /// Sample rate of the default output device
    pub fn device_sample_rate() -> Result<u32, AudioError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| AudioError::OutputError("No audio output device found".into()))?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::OutputError(format!("Failed to get audio config: {}", e)))?;
        Ok(config.sample_rate().0)
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Stop streaming and finalize the WAV tee, if any
    pub fn finish(self) -> Result<(), AudioError> {
        let Self {
            _stream,
            wav_writer,
            ..
        } = self;
        drop(_stream);

        if let Some(writer) = wav_writer {
            let writer = Arc::try_unwrap(writer)
                .map_err(|_| AudioError::OutputError("Recording still in use".into()))?
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            writer.finalize()?;
        }
        Ok(())
    }
}
