//! Per-sample signal generators and processors used by the software graph.

use std::f32::consts::TAU;
use std::sync::Arc;

use super::graph::{FilterKind, Waveform};

/// Phase-accumulating oscillator
#[derive(Clone, Debug)]
pub(crate) struct Oscillator {
    waveform: Waveform,
    /// Normalized phase in [0, 1)
    phase: f32,
    sample_rate: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Emit the current sample, then advance by one frame at `frequency`
    pub fn render_sample(&mut self, frequency: f32) -> f32 {
        let value = match self.waveform {
            Waveform::Sine => (self.phase * TAU).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
        };

        self.phase += frequency / self.sample_rate;
        self.phase = self.phase.rem_euclid(1.0);
        // rem_euclid of a tiny negative rounds up to 1.0 in f32
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }
        value
    }
}

/// Second-order filter section (RBJ cookbook coefficients)
#[derive(Clone, Debug)]
pub(crate) struct Biquad {
    kind: FilterKind,
    sample_rate: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    /// (frequency, q) the coefficients were computed for
    tuned: Option<(f32, f32)>,
}

impl Biquad {
    pub fn new(kind: FilterKind, sample_rate: f32) -> Self {
        Self {
            kind,
            sample_rate,
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            tuned: None,
        }
    }

    fn tune(&mut self, frequency: f32, q: f32) {
        let frequency = frequency.clamp(10.0, self.sample_rate * 0.49);
        let q = q.max(1e-4);
        if self.tuned == Some((frequency, q)) {
            return;
        }

        let w0 = TAU * frequency / self.sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let a0 = 1.0 + alpha;

        let (b0, b1, b2) = match self.kind {
            FilterKind::Lowpass => ((1.0 - cos) / 2.0, 1.0 - cos, (1.0 - cos) / 2.0),
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
        self.tuned = Some((frequency, q));
    }

    /// Filter one input sample at the given cutoff and resonance
    pub fn render_sample(&mut self, input: f32, frequency: f32, q: f32) -> f32 {
        self.tune(frequency, q);
        let y = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// One-shot playback cursor over a shared sample buffer
#[derive(Clone, Debug)]
pub(crate) struct BufferPlayer {
    samples: Arc<[f32]>,
    index: usize,
}

impl BufferPlayer {
    pub fn new(samples: Arc<[f32]>) -> Self {
        Self { samples, index: 0 }
    }

    /// Next sample, or `None` once the buffer is exhausted
    pub fn next_sample(&mut self) -> Option<f32> {
        let sample = self.samples.get(self.index).copied()?;
        self.index += 1;
        Some(sample)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.samples.len()
    }
}
