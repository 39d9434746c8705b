//! Reactive soundtrack and sound effects for a race.
//!
//! The manager wires a fixed ambient bus (two detuned sawtooth drones through
//! an LFO-swept lowpass into a master gain) and nudges it as the game moves
//! between states. On top of that it owns one engine voice per racer and
//! fires one-shot impacts, countdown beeps and a percussion beat.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::graph::{
    AudioGraph, Automation, BufferId, ContextState, FilterKind, NodeId, Param, Waveform,
};
use super::state::{Ambience, GameState};
use super::AudioError;
use crate::params::AudioConfig;

/// Drum hit length (seconds)
const DRUM_LENGTH_S: f64 = 0.5;

/// Ambient nodes built once by [`AudioManager::init`]
#[derive(Clone, Copy, Debug)]
struct MasterBus {
    master: NodeId,
    filter: NodeId,
    lfo: NodeId,
    lfo_depth: NodeId,
    drones: [NodeId; 2],
    impact: BufferId,
}

/// One racer's engine sound (oscillator -> lowpass -> gain)
#[derive(Clone, Copy, Debug)]
struct EngineVoice {
    osc: NodeId,
    filter: NodeId,
    gain: NodeId,
}

/// Repeating percussion beat, polled by [`AudioManager::tick`]
#[derive(Clone, Copy, Debug)]
struct BeatTimer {
    next_at: f64,
}

/// Countdown beep pitch (Hz) and peak volume for a count
fn beep_tone(count: u32) -> (f32, f32) {
    match count {
        3 => (440.0, 0.3),
        2 => (550.0, 0.5),
        1 => (660.0, 0.8),
        0 => (880.0, 1.0),
        _ => (440.0, 0.3),
    }
}

/// Game audio manager over any [`AudioGraph`]
pub struct AudioManager<G: AudioGraph> {
    graph: G,
    config: AudioConfig,
    rng: ChaCha8Rng,
    bus: Option<MasterBus>,
    muted: bool,
    engines: HashMap<String, EngineVoice>,
    beat: Option<BeatTimer>,
}

impl<G: AudioGraph> AudioManager<G> {
    /// Create an uninitialized, muted manager
    ///
    /// `seed` drives the impact noise so renders are reproducible.
    pub fn new(graph: G, config: AudioConfig, seed: u64) -> Self {
        Self {
            graph,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            bus: None,
            muted: true,
            engines: HashMap::new(),
            beat: None,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_initialized(&self) -> bool {
        self.bus.is_some()
    }

    pub fn is_beating(&self) -> bool {
        self.beat.is_some()
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    pub fn has_engine(&self, id: &str) -> bool {
        self.engines.contains_key(id)
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// Build the ambient bus and impact buffer (no-op once built)
    pub fn init(&mut self) -> Result<(), AudioError> {
        if self.bus.is_some() {
            return Ok(());
        }

        let graph = &mut self.graph;
        let destination = graph.destination();

        let master = graph.create_gain(0.0);
        graph.connect(master, destination)?;

        let filter = graph.create_filter(FilterKind::Lowpass, 200.0, 1.0);
        graph.connect(filter, master)?;

        let lfo = graph.create_oscillator(Waveform::Sine, 0.2);
        let lfo_depth = graph.create_gain(100.0);
        graph.connect(lfo, lfo_depth)?;
        graph.connect_param(lfo_depth, filter, Param::Frequency)?;
        let now = graph.current_time();
        graph.start(lfo, now)?;

        let drones = [55.0, 55.5].map(|hz| graph.create_oscillator(Waveform::Sawtooth, hz));
        for drone in drones {
            graph.connect(drone, filter)?;
            graph.start(drone, now)?;
        }

        let len = (graph.sample_rate() * self.config.impact_duration_s) as usize;
        let samples = (0..len)
            .map(|i| {
                let envelope = (1.0 - i as f32 / len as f32).powi(4);
                (self.rng.gen::<f32>() * 2.0 - 1.0) * envelope
            })
            .collect();
        let impact = graph.create_buffer(samples);

        self.bus = Some(MasterBus {
            master,
            filter,
            lfo,
            lfo_depth,
            drones,
            impact,
        });

        tracing::debug!(impact_samples = len, "audio bus initialized");
        Ok(())
    }

    /// Release every node the manager created and return to the muted,
    /// uninitialized state (a later `init` builds a fresh bus)
    pub fn teardown(&mut self) {
        self.stop_beat();
        self.reset_engines();

        let Some(bus) = self.bus.take() else {
            return;
        };
        let now = self.graph.current_time();
        for source in [bus.lfo, bus.drones[0], bus.drones[1]] {
            let _ = self.graph.stop(source, now);
        }
        let [drone_a, drone_b] = bus.drones;
        for node in [bus.lfo, bus.lfo_depth, drone_a, drone_b, bus.filter, bus.master] {
            let _ = self.graph.disconnect(node);
        }
        if let Err(e) = self.graph.release_buffer(bus.impact) {
            tracing::warn!("Failed to release impact buffer: {}", e);
        }
        self.muted = true;
        tracing::debug!("audio bus torn down");
    }

    /// Initialize if needed, leave the suspended state and unmute
    pub fn resume(&mut self) {
        if let Err(e) = self.init() {
            tracing::warn!("Audio init failed: {}", e);
            return;
        }
        if self.graph.state() == ContextState::Suspended {
            if let Err(e) = self.graph.resume() {
                tracing::warn!("Failed to resume audio context: {}", e);
            }
        }
        self.muted = false;
        self.apply_volume();
    }

    /// Flip the mute flag and fade the master gain; returns the new state
    ///
    /// The first call on an uninitialized manager resumes it (unmuting) and
    /// then flips, so it ends up muted.
    pub fn toggle_mute(&mut self) -> bool {
        if !self.is_initialized() {
            self.resume();
        }
        self.muted = !self.muted;
        self.apply_volume();
        self.muted
    }

    /// Move the ambient bus to the mood of `state`
    pub fn set_game_state(&mut self, state: GameState) -> Result<(), AudioError> {
        let Some(bus) = self.bus else {
            tracing::trace!(%state, "game state ignored before init");
            return Ok(());
        };
        let now = self.graph.current_time();

        match state.ambience() {
            Ambience::Racing => {
                self.graph.schedule(
                    bus.filter,
                    Param::Frequency,
                    Automation::exponential_ramp(800.0, now + 2.0),
                )?;
                self.graph.schedule(
                    bus.lfo,
                    Param::Frequency,
                    Automation::exponential_ramp(4.0, now + 2.0),
                )?;
                self.start_beat();
            }
            Ambience::Halted => {
                self.graph.schedule(
                    bus.filter,
                    Param::Frequency,
                    Automation::exponential_ramp(150.0, now + 1.0),
                )?;
                self.graph.schedule(
                    bus.lfo,
                    Param::Frequency,
                    Automation::linear_ramp(0.1, now + 1.0),
                )?;
                self.stop_beat();
            }
            Ambience::Idle => {
                self.graph.schedule(
                    bus.filter,
                    Param::Frequency,
                    Automation::exponential_ramp(300.0, now + 2.0),
                )?;
                self.graph.schedule(
                    bus.lfo,
                    Param::Frequency,
                    Automation::exponential_ramp(0.5, now + 2.0),
                )?;
                self.stop_beat();
            }
        }

        tracing::debug!(%state, "soundtrack state changed");
        Ok(())
    }

    /// Create and start an engine voice for `id`
    ///
    /// An existing voice under the same id is released first.
    pub fn add_engine(&mut self, id: &str, is_player: bool) -> Result<(), AudioError> {
        let bus = self.bus.ok_or(AudioError::NotInitialized)?;

        if let Some(old) = self.engines.remove(id) {
            tracing::debug!(id, "replacing engine voice");
            self.release(old);
        }

        let tuning = self.config.engine(is_player);
        let graph = &mut self.graph;
        let osc = graph.create_oscillator(Waveform::Sawtooth, tuning.idle_hz);
        let filter = graph.create_filter(FilterKind::Lowpass, 100.0, 1.0);
        let gain = graph.create_gain(0.0);

        graph.connect(osc, filter)?;
        graph.connect(filter, gain)?;
        graph.connect(gain, bus.master)?;
        let now = graph.current_time();
        graph.start(osc, now)?;

        self.engines
            .insert(id.to_string(), EngineVoice { osc, filter, gain });
        Ok(())
    }

    /// Steer an engine voice towards the sound of `speed_ratio`
    ///
    /// Unknown ids are ignored. `volume_scale` only applies to rivals.
    pub fn update_engine(
        &mut self,
        id: &str,
        speed_ratio: f32,
        volume_scale: f32,
        is_player: bool,
    ) -> Result<(), AudioError> {
        let Some(voice) = self.engines.get(id).copied() else {
            tracing::trace!(id, "update for unknown engine");
            return Ok(());
        };

        // An unvalidated cap may be negative or NaN
        let ratio = speed_ratio.max(0.0).min(self.config.max_speed_ratio.max(0.0));
        let tuning = self.config.engine(is_player);
        let frequency = tuning.frequency(ratio);
        let cutoff = self.config.engine_filter(ratio);
        let volume = match (self.muted, is_player) {
            (true, _) => 0.0,
            (false, true) => tuning.volume(ratio),
            (false, false) => tuning.volume(ratio) * volume_scale,
        };

        let now = self.graph.current_time();
        let tau = self.config.engine_time_constant_s;
        self.graph.schedule(
            voice.osc,
            Param::Frequency,
            Automation::set_target(frequency, now, tau),
        )?;
        self.graph.schedule(
            voice.filter,
            Param::Frequency,
            Automation::set_target(cutoff, now, tau),
        )?;
        self.graph
            .schedule(voice.gain, Param::Gain, Automation::set_target(volume, now, tau))?;
        Ok(())
    }

    /// Stop and release every engine voice
    pub fn reset_engines(&mut self) {
        let voices: Vec<EngineVoice> = self.engines.drain().map(|(_, voice)| voice).collect();
        let count = voices.len();
        for voice in voices {
            self.release(voice);
        }
        if count > 0 {
            tracing::debug!(count, "engine voices released");
        }
    }

    /// Fade every engine voice out, keeping the voices
    pub fn silence_engines(&mut self) -> Result<(), AudioError> {
        if !self.is_initialized() {
            return Ok(());
        }
        let now = self.graph.current_time();
        let tau = self.config.engine_time_constant_s;
        for voice in self.engines.values() {
            self.graph
                .schedule(voice.gain, Param::Gain, Automation::set_target(0.0, now, tau))?;
        }
        Ok(())
    }

    /// Play the impact noise burst at `volume`
    pub fn play_impact(&mut self, volume: f32) -> Result<(), AudioError> {
        let Some(bus) = self.audible_bus("impact") else {
            return Ok(());
        };

        let graph = &mut self.graph;
        let source = graph.create_buffer_source(bus.impact)?;
        let filter = graph.create_filter(FilterKind::Lowpass, 1500.0, 1.0);
        let gain = graph.create_gain(volume);

        graph.connect(source, filter)?;
        graph.connect(filter, gain)?;
        graph.connect(gain, bus.master)?;
        let now = graph.current_time();
        graph.start(source, now)
    }

    /// Beep for a countdown step (0 is the final "go" beep)
    pub fn play_countdown_beep(&mut self, count: u32) -> Result<(), AudioError> {
        let Some(bus) = self.audible_bus("countdown beep") else {
            return Ok(());
        };

        let is_final = count == 0;
        let (frequency, volume) = beep_tone(count);
        let waveform = if is_final {
            Waveform::Square
        } else {
            Waveform::Sine
        };
        let (decay_end, stop_at) = if is_final { (0.8, 1.0) } else { (0.4, 0.5) };

        let graph = &mut self.graph;
        let osc = graph.create_oscillator(waveform, frequency);
        let gain = graph.create_gain(0.0);
        let now = graph.current_time();

        graph.schedule(gain, Param::Gain, Automation::set_value(0.0, now))?;
        graph.schedule(gain, Param::Gain, Automation::linear_ramp(volume, now + 0.05))?;
        graph.schedule(
            gain,
            Param::Gain,
            Automation::exponential_ramp(0.001, now + decay_end),
        )?;

        graph.connect(osc, gain)?;
        graph.connect(gain, bus.master)?;
        graph.start(osc, now)?;
        graph.stop(osc, now + stop_at)
    }

    /// Fade the master gain to match the mute flag
    pub fn update_volume(&mut self) -> Result<(), AudioError> {
        let Some(bus) = self.bus else {
            return Ok(());
        };
        let now = self.graph.current_time();
        let target = if self.muted {
            0.0
        } else {
            self.config.master_volume
        };

        self.graph
            .cancel_scheduled_values(bus.master, Param::Gain, now)?;
        self.graph.schedule(
            bus.master,
            Param::Gain,
            Automation::linear_ramp(target, now + self.config.volume_ramp_s),
        )
    }

    /// Start the percussion beat (no-op while running)
    pub fn start_beat(&mut self) {
        if self.beat.is_some() {
            return;
        }
        let next_at = self.graph.current_time() + self.config.beat_period_s;
        self.beat = Some(BeatTimer { next_at });
        tracing::debug!(next_at, "beat started");
    }

    /// Stop the percussion beat (no-op while stopped)
    pub fn stop_beat(&mut self) {
        if self.beat.take().is_some() {
            tracing::debug!("beat stopped");
        }
    }

    /// Fire every beat that has come due on the audio clock
    ///
    /// Call once per frame. Each drum is scheduled at its exact beat time.
    pub fn tick(&mut self) -> Result<(), AudioError> {
        let Some(mut beat) = self.beat else {
            return Ok(());
        };
        let now = self.graph.current_time();

        let mut skipped = 0u32;
        while beat.next_at <= now {
            let when = beat.next_at;
            beat.next_at += self.config.beat_period_s;
            self.beat = Some(beat);
            if when + DRUM_LENGTH_S <= now {
                skipped += 1;
                continue;
            }
            self.drum_at(when)?;
        }
        if skipped > 0 {
            tracing::debug!(skipped, "dropped beats that finished during a stall");
        }
        Ok(())
    }

    /// Play one drum hit now
    pub fn play_drum(&mut self) -> Result<(), AudioError> {
        let now = self.graph.current_time();
        self.drum_at(now)
    }

    fn drum_at(&mut self, when: f64) -> Result<(), AudioError> {
        let Some(bus) = self.audible_bus("drum") else {
            return Ok(());
        };

        let graph = &mut self.graph;
        let osc = graph.create_oscillator(Waveform::Sine, 150.0);
        let gain = graph.create_gain(0.6);
        let end = when + DRUM_LENGTH_S;

        graph.schedule(osc, Param::Frequency, Automation::set_value(150.0, when))?;
        graph.schedule(osc, Param::Frequency, Automation::exponential_ramp(0.01, end))?;
        graph.schedule(gain, Param::Gain, Automation::set_value(0.6, when))?;
        graph.schedule(gain, Param::Gain, Automation::exponential_ramp(0.01, end))?;

        graph.connect(osc, gain)?;
        graph.connect(gain, bus.master)?;
        graph.start(osc, when)?;
        graph.stop(osc, end)
    }

    /// The bus, if one-shots should sound right now
    fn audible_bus(&self, what: &str) -> Option<MasterBus> {
        if self.muted {
            tracing::trace!(what, "skipped while muted");
            return None;
        }
        if self.bus.is_none() {
            tracing::trace!(what, "skipped before init");
        }
        self.bus
    }

    /// Stop and unwire a voice, ignoring nodes the graph already dropped
    fn release(&mut self, voice: EngineVoice) {
        let now = self.graph.current_time();
        let _ = self.graph.stop(voice.osc, now);
        let _ = self.graph.disconnect(voice.osc);
        let _ = self.graph.disconnect(voice.filter);
        let _ = self.graph.disconnect(voice.gain);
    }

    fn apply_volume(&mut self) {
        if let Err(e) = self.update_volume() {
            tracing::warn!("Failed to update master volume: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::software::SoftwareGraph;

    const RATE: f32 = 1000.0;

    fn manager() -> AudioManager<SoftwareGraph> {
        AudioManager::new(SoftwareGraph::new(RATE), AudioConfig::default(), 7)
    }

    /// Resumed, unmuted manager with the bus built
    fn running() -> AudioManager<SoftwareGraph> {
        let mut audio = manager();
        audio.resume();
        audio
    }

    fn advance(audio: &mut AudioManager<SoftwareGraph>, secs: f32) {
        let mut out = vec![0.0; (secs * RATE).round() as usize];
        audio.graph_mut().render_block(&mut out);
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4 * b.abs().max(1.0)
    }

    fn targets(audio: &AudioManager<SoftwareGraph>, node: NodeId, param: Param) -> Vec<f32> {
        audio
            .graph()
            .pending_automation(node, param)
            .iter()
            .map(Automation::value)
            .collect()
    }

    #[test]
    fn test_starts_muted_and_uninitialized() {
        let audio = manager();
        assert!(audio.is_muted());
        assert!(!audio.is_initialized());
        assert!(!audio.is_beating());
        assert_eq!(audio.engine_count(), 0);
    }

    #[test]
    fn test_init_builds_bus_once() {
        let mut audio = manager();
        audio.init().unwrap();
        let nodes = audio.graph().node_count();

        // destination, master, filter, lfo, lfo depth, two drones
        assert_eq!(nodes, 7);
        let bus = audio.bus.unwrap();
        assert!(audio.graph().contains(bus.lfo_depth));
        assert!(bus.drones.iter().all(|&d| audio.graph().is_playing(d)));
        assert_eq!(
            audio.graph().param_value(bus.drones[1], Param::Frequency),
            Some(55.5)
        );
        audio.init().unwrap();
        assert_eq!(audio.graph().node_count(), nodes);
        assert!(audio.is_muted());
    }

    #[test]
    fn test_resume_unmutes_and_fades_in() {
        let audio = running();
        let bus = audio.bus.unwrap();

        assert!(!audio.is_muted());
        assert_eq!(audio.graph().state(), ContextState::Running);
        assert_eq!(
            audio.graph().pending_automation(bus.master, Param::Gain),
            vec![Automation::linear_ramp(0.25, 0.2)]
        );
    }

    #[test]
    fn test_first_toggle_on_fresh_manager_mutes() {
        let mut audio = manager();
        assert!(audio.toggle_mute());
        assert!(audio.is_initialized());
        assert_eq!(audio.graph().state(), ContextState::Running);
    }

    #[test]
    fn test_toggle_mute_twice_restores_state() {
        let mut audio = running();
        let bus = audio.bus.unwrap();

        assert!(audio.toggle_mute());
        assert_eq!(targets(&audio, bus.master, Param::Gain), vec![0.0]);
        assert!(!audio.toggle_mute());
        assert_eq!(targets(&audio, bus.master, Param::Gain), vec![0.25]);
        assert!(!audio.is_muted());
    }

    #[test]
    fn test_master_volume_settles() {
        let mut audio = running();
        let bus = audio.bus.unwrap();
        advance(&mut audio, 0.3);
        let level = audio.graph().param_value(bus.master, Param::Gain).unwrap();
        assert!(close(level, 0.25));

        audio.toggle_mute();
        advance(&mut audio, 0.3);
        let level = audio.graph().param_value(bus.master, Param::Gain).unwrap();
        assert_eq!(level, 0.0);
    }

    #[test]
    fn test_game_state_before_init_is_noop() {
        let mut audio = manager();
        audio.set_game_state(GameState::Playing).unwrap();
        assert!(!audio.is_beating());
        assert!(!audio.is_initialized());
    }

    #[test]
    fn test_racing_states_open_filter_and_start_beat() {
        let mut audio = running();
        let bus = audio.bus.unwrap();

        audio.set_game_state(GameState::Countdown).unwrap();
        assert!(audio.is_beating());
        assert_eq!(
            audio.graph().pending_automation(bus.filter, Param::Frequency),
            vec![Automation::exponential_ramp(800.0, 2.0)]
        );
        assert_eq!(targets(&audio, bus.lfo, Param::Frequency), vec![4.0]);

        // Second racing state keeps the single timer
        audio.set_game_state(GameState::Playing).unwrap();
        assert!(audio.is_beating());
    }

    #[test]
    fn test_halted_and_idle_states_stop_beat() {
        let mut audio = running();
        let bus = audio.bus.unwrap();

        audio.set_game_state(GameState::Playing).unwrap();
        advance(&mut audio, 2.5);
        audio.set_game_state(GameState::Paused).unwrap();
        assert!(!audio.is_beating());
        assert_eq!(
            audio.graph().pending_automation(bus.lfo, Param::Frequency),
            vec![Automation::linear_ramp(0.1, 3.5)]
        );
        assert_eq!(targets(&audio, bus.filter, Param::Frequency), vec![150.0]);

        audio.set_game_state(GameState::Playing).unwrap();
        audio.set_game_state(GameState::Shop).unwrap();
        assert!(!audio.is_beating());
    }

    #[test]
    fn test_add_engine_before_init_fails() {
        let mut audio = manager();
        assert!(matches!(
            audio.add_engine("player", true),
            Err(AudioError::NotInitialized)
        ));
        assert_eq!(audio.engine_count(), 0);
    }

    #[test]
    fn test_add_engine_registers_voice() {
        let mut audio = running();
        let before = audio.graph().node_count();

        audio.add_engine("player", true).unwrap();
        audio.add_engine("rival-1", false).unwrap();

        assert_eq!(audio.engine_count(), 2);
        assert!(audio.has_engine("rival-1"));
        assert_eq!(audio.graph().node_count(), before + 6);
        let voice = audio.engines["rival-1"];
        assert!(audio.graph().is_playing(voice.osc));
        assert_eq!(
            audio.graph().param_value(voice.osc, Param::Frequency),
            Some(60.0)
        );
    }

    #[test]
    fn test_duplicate_engine_replaces_voice() {
        let mut audio = running();
        let before = audio.graph().node_count();

        audio.add_engine("player", true).unwrap();
        let first = audio.engines["player"];
        audio.add_engine("player", true).unwrap();
        advance(&mut audio, 0.01);

        assert_eq!(audio.engine_count(), 1);
        assert!(!audio.graph().contains(first.osc));
        assert!(!audio.graph().contains(first.filter));
        assert!(!audio.graph().contains(first.gain));
        assert_eq!(audio.graph().node_count(), before + 3);
    }

    #[test]
    fn test_update_engine_targets() {
        let mut audio = running();
        audio.add_engine("player", true).unwrap();
        let voice = audio.engines["player"];

        // Ratio clamps to 1.2
        audio.update_engine("player", 1.5, 1.0, true).unwrap();

        let freq = targets(&audio, voice.osc, Param::Frequency);
        let cutoff = targets(&audio, voice.filter, Param::Frequency);
        let volume = targets(&audio, voice.gain, Param::Gain);
        assert!(close(freq[0], 350.0));
        assert!(close(cutoff[0], 2970.0));
        assert!(close(volume[0], 0.21));
        assert!(matches!(
            audio.graph().pending_automation(voice.gain, Param::Gain)[0],
            Automation::SetTarget { time_constant, .. } if time_constant == 0.1
        ));
    }

    #[test]
    fn test_update_rival_engine_scales_volume() {
        let mut audio = running();
        audio.add_engine("rival", false).unwrap();
        let voice = audio.engines["rival"];

        audio.update_engine("rival", 0.5, 0.5, false).unwrap();

        assert!(close(targets(&audio, voice.osc, Param::Frequency)[0], 235.0));
        assert!(close(targets(&audio, voice.gain, Param::Gain)[0], 0.03));
    }

    #[test]
    fn test_negative_ratio_clamps_to_idle() {
        let mut audio = running();
        audio.add_engine("player", true).unwrap();
        let voice = audio.engines["player"];

        audio.update_engine("player", -3.0, 1.0, true).unwrap();

        assert!(close(targets(&audio, voice.osc, Param::Frequency)[0], 50.0));
        assert!(close(targets(&audio, voice.filter, Param::Frequency)[0], 150.0));
    }

    #[test]
    fn test_unvalidated_speed_cap_does_not_panic() {
        let config = AudioConfig {
            max_speed_ratio: -1.0,
            ..AudioConfig::default()
        };
        let mut audio = AudioManager::new(SoftwareGraph::new(RATE), config, 7);
        audio.resume();
        audio.add_engine("player", true).unwrap();
        let voice = audio.engines["player"];

        audio.update_engine("player", 0.5, 1.0, true).unwrap();
        audio.update_engine("player", f32::NAN, 1.0, true).unwrap();

        assert!(close(targets(&audio, voice.osc, Param::Frequency)[0], 50.0));
    }

    #[test]
    fn test_muted_engine_targets_silence() {
        let mut audio = running();
        audio.add_engine("player", true).unwrap();
        let voice = audio.engines["player"];
        audio.toggle_mute();

        audio.update_engine("player", 1.0, 1.0, true).unwrap();
        assert_eq!(targets(&audio, voice.gain, Param::Gain), vec![0.0]);
    }

    #[test]
    fn test_reset_engines_releases_nodes() {
        let mut audio = running();
        let before = audio.graph().node_count();
        audio.add_engine("player", true).unwrap();
        audio.add_engine("rival", false).unwrap();
        let voice = audio.engines["player"];

        audio.reset_engines();
        advance(&mut audio, 0.01);

        assert_eq!(audio.engine_count(), 0);
        assert_eq!(audio.graph().node_count(), before);
        // Updates after reset are ignored
        audio.update_engine("player", 1.0, 1.0, true).unwrap();
        assert!(!audio.graph().contains(voice.gain));
    }

    #[test]
    fn test_silence_engines_keeps_voices() {
        let mut audio = running();
        audio.add_engine("player", true).unwrap();
        audio.update_engine("player", 1.0, 1.0, true).unwrap();
        let voice = audio.engines["player"];

        audio.silence_engines().unwrap();

        assert_eq!(audio.engine_count(), 1);
        assert_eq!(targets(&audio, voice.gain, Param::Gain), vec![0.0]);
    }

    #[test]
    fn test_one_shots_skipped_while_muted() {
        let mut audio = manager();
        audio.init().unwrap();
        let nodes = audio.graph().node_count();

        audio.play_impact(1.0).unwrap();
        audio.play_countdown_beep(3).unwrap();
        audio.play_drum().unwrap();

        assert_eq!(audio.graph().node_count(), nodes);
    }

    #[test]
    fn test_impact_plays_and_cleans_up() {
        let mut audio = running();
        let nodes = audio.graph().node_count();

        audio.play_impact(0.8).unwrap();
        assert_eq!(audio.graph().node_count(), nodes + 3);

        advance(&mut audio, 0.6);
        assert_eq!(audio.graph().node_count(), nodes);
    }

    #[test]
    fn test_countdown_beep_envelope() {
        let mut audio = running();
        let nodes = audio.graph().node_count();

        audio.play_countdown_beep(0).unwrap();
        assert_eq!(audio.graph().node_count(), nodes + 2);

        advance(&mut audio, 0.9);
        assert_eq!(audio.graph().node_count(), nodes + 2);
        advance(&mut audio, 0.2);
        assert_eq!(audio.graph().node_count(), nodes);
    }

    #[test]
    fn test_beep_tones() {
        assert_eq!(beep_tone(3), (440.0, 0.3));
        assert_eq!(beep_tone(2), (550.0, 0.5));
        assert_eq!(beep_tone(1), (660.0, 0.8));
        assert_eq!(beep_tone(0), (880.0, 1.0));
        assert_eq!(beep_tone(7), (440.0, 0.3));
    }

    #[test]
    fn test_beat_ticks_once_per_period() {
        let mut audio = running();
        let nodes = audio.graph().node_count();
        audio.start_beat();

        audio.tick().unwrap();
        assert_eq!(audio.graph().node_count(), nodes);

        // Just past the first beat
        advance(&mut audio, 0.51);
        audio.tick().unwrap();
        assert_eq!(audio.graph().node_count(), nodes + 2);
        audio.tick().unwrap();
        assert_eq!(audio.graph().node_count(), nodes + 2);

        // Beats at 1.0 and 1.5 come due at once; only the second still rings
        advance(&mut audio, 1.0);
        audio.tick().unwrap();
        assert_eq!(audio.graph().node_count(), nodes + 2);
    }

    #[test]
    fn test_beats_missed_during_stall_are_dropped() {
        let mut audio = running();
        let nodes = audio.graph().node_count();
        audio.start_beat();

        advance(&mut audio, 10.2);
        audio.tick().unwrap();

        // Only the beat at 10.0 is still inside its decay
        assert_eq!(audio.graph().node_count(), nodes + 2);
        assert!(audio.is_beating());

        // The timer keeps its phase: the next beat is at 10.5
        advance(&mut audio, 0.2);
        audio.tick().unwrap();
        assert_eq!(audio.graph().node_count(), nodes + 2);
        // At 10.6 the old drum has been pruned and the 10.5 one is playing
        advance(&mut audio, 0.2);
        audio.tick().unwrap();
        assert_eq!(audio.graph().node_count(), nodes + 2);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut audio = running();
        audio.add_engine("player", true).unwrap();
        audio.set_game_state(GameState::Playing).unwrap();

        audio.teardown();
        advance(&mut audio, 0.01);

        assert!(!audio.is_initialized());
        assert!(audio.is_muted());
        assert!(!audio.is_beating());
        assert_eq!(audio.engine_count(), 0);
        assert_eq!(audio.graph().node_count(), 1);

        // A fresh bus can be built afterwards
        audio.resume();
        assert!(audio.is_initialized());
        assert_eq!(audio.graph().node_count(), 7);
    }

    #[test]
    fn test_repeated_teardown_keeps_one_impact_buffer() {
        let mut audio = running();
        for _ in 0..5 {
            audio.resume();
            assert_eq!(audio.graph().buffer_count(), 1);
            audio.teardown();
            assert_eq!(audio.graph().buffer_count(), 0);
        }

        audio.resume();
        assert_eq!(audio.graph().buffer_count(), 1);
        audio.play_impact(0.5).unwrap();
    }

    #[test]
    fn test_stopped_beat_does_not_fire() {
        let mut audio = running();
        let nodes = audio.graph().node_count();
        audio.start_beat();
        audio.stop_beat();
        audio.stop_beat();

        advance(&mut audio, 1.2);
        audio.tick().unwrap();
        assert_eq!(audio.graph().node_count(), nodes);
    }
}
