//! Offline WAV capture of the software graph.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::software::SoftwareGraph;
use super::AudioError;
use crate::params::audio_constants::BLOCK_SIZE;

/// Mono 32-bit float WAV writer fed from rendered blocks
pub struct WavRecorder {
    writer: hound::WavWriter<BufWriter<File>>,
    samples_written: usize,
}

impl WavRecorder {
    pub fn create(path: &Path, sample_rate_hz: u32) -> Result<Self, AudioError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: sample_rate_hz,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        tracing::debug!(path = %path.display(), sample_rate_hz, "recording started");

        Ok(Self {
            writer,
            samples_written: 0,
        })
    }

    pub fn samples_written(&self) -> usize {
        self.samples_written
    }

    pub fn write_block(&mut self, block: &[f32]) -> Result<(), AudioError> {
        for &sample in block {
            self.writer.write_sample(sample)?;
        }
        self.samples_written += block.len();
        Ok(())
    }

    /// Render `samples` frames from the graph straight into the file
    pub fn record(&mut self, graph: &mut SoftwareGraph, samples: usize) -> Result<(), AudioError> {
        let mut block = [0.0f32; BLOCK_SIZE];
        let mut remaining = samples;

        while remaining > 0 {
            let len = remaining.min(BLOCK_SIZE);
            graph.render_block(&mut block[..len]);
            self.write_block(&block[..len])?;
            remaining -= len;
        }
        Ok(())
    }

    /// Flush the header and close the file; returns the sample count
    pub fn finalize(self) -> Result<usize, AudioError> {
        let samples = self.samples_written;
        self.writer.finalize()?;
        tracing::debug!(samples, "recording finalized");
        Ok(samples)
    }
}
