//! Capability set the audio manager needs from a host audio subsystem.
//!
//! Mirrors the shape of a browser audio context: nodes are created, wired
//! together, started/stopped on the audio clock, and their parameters are
//! driven by scheduled automation rather than direct writes.

use super::AudioError;

/// Handle to a node living in an [`AudioGraph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// Handle to a sample buffer living in an [`AudioGraph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
}

/// Automatable node parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    /// Oscillator pitch or filter cutoff (Hz)
    Frequency,
    /// Filter resonance
    Q,
    /// Gain node level (linear)
    Gain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// Clock halted, output silent (waiting for a user gesture)
    Suspended,
    Running,
}

/// One scheduled parameter change, times on the audio clock (seconds)
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Automation {
    /// Jump to `value` at `at`
    SetValue { value: f32, at: f64 },

    /// Ramp linearly from the previous event to `value`, arriving at `end`
    LinearRamp { value: f32, end: f64 },

    /// Ramp exponentially from the previous event to `value`, arriving at `end`
    ExponentialRamp { value: f32, end: f64 },

    /// Approach `target` from `start` with the given time constant
    SetTarget {
        target: f32,
        start: f64,
        time_constant: f64,
    },
}

impl Automation {
    pub fn set_value(value: f32, at: f64) -> Self {
        Self::SetValue { value, at }
    }

    pub fn linear_ramp(value: f32, end: f64) -> Self {
        Self::LinearRamp { value, end }
    }

    pub fn exponential_ramp(value: f32, end: f64) -> Self {
        Self::ExponentialRamp { value, end }
    }

    pub fn set_target(target: f32, start: f64, time_constant: f64) -> Self {
        Self::SetTarget {
            target,
            start,
            time_constant,
        }
    }

    /// Time the event is ordered by on a parameter's timeline
    pub fn time(&self) -> f64 {
        match *self {
            Self::SetValue { at, .. } => at,
            Self::LinearRamp { end, .. } | Self::ExponentialRamp { end, .. } => end,
            Self::SetTarget { start, .. } => start,
        }
    }

    /// Value the event settles on
    pub fn value(&self) -> f32 {
        match *self {
            Self::SetValue { value, .. }
            | Self::LinearRamp { value, .. }
            | Self::ExponentialRamp { value, .. } => value,
            Self::SetTarget { target, .. } => target,
        }
    }

    pub(crate) fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Host audio subsystem
///
/// Implementations own the nodes; callers only hold ids. Node operations on
/// ids the graph no longer knows return [`AudioError::UnknownNode`].
pub trait AudioGraph {
    /// Audio clock (seconds), advances only while running
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> f32;

    fn state(&self) -> ContextState;

    /// Leave the suspended state
    fn resume(&mut self) -> Result<(), AudioError>;

    /// The final output node
    fn destination(&self) -> NodeId;

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeId;

    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32) -> NodeId;

    fn create_gain(&mut self, gain: f32) -> NodeId;

    fn create_buffer(&mut self, samples: Vec<f32>) -> BufferId;

    fn create_buffer_source(&mut self, buffer: BufferId) -> Result<NodeId, AudioError>;

    /// Drop a buffer; sources already playing it finish normally
    fn release_buffer(&mut self, buffer: BufferId) -> Result<(), AudioError>;

    /// Route `from`'s output into `to`'s input
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError>;

    /// Route `from`'s output into one of `to`'s parameters (modulation)
    fn connect_param(&mut self, from: NodeId, to: NodeId, param: Param)
        -> Result<(), AudioError>;

    /// Remove every outgoing connection of `node`
    fn disconnect(&mut self, node: NodeId) -> Result<(), AudioError>;

    /// Start a source node at `when` (each source starts at most once)
    fn start(&mut self, node: NodeId, when: f64) -> Result<(), AudioError>;

    /// Stop a started source node at `when`
    fn stop(&mut self, node: NodeId, when: f64) -> Result<(), AudioError>;

    fn schedule(&mut self, node: NodeId, param: Param, automation: Automation)
        -> Result<(), AudioError>;

    /// Drop every event on the parameter scheduled at or after `from`
    fn cancel_scheduled_values(&mut self, node: NodeId, param: Param, from: f64)
        -> Result<(), AudioError>;
}
