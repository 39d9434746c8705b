//! Scripted race session that drives the audio manager like a game loop would.
//!
//! Menu, a three-beep countdown, a race with a player and two rivals
//! (throttle telemetry every frame, one mid-race crash), then the finish and
//! back to the menu. Used by the `render` and `play` commands.

use crate::audio::{AudioError, AudioGraph, AudioManager, GameState, SoftwareGraph, WavRecorder};
use crate::params::{audio_constants::BLOCK_SIZE, AudioConfig, RecordingConfig};

/// Shortest session that fits the whole script (seconds)
pub const MIN_SESSION_SECS: f32 = 10.0;

/// Countdown starts this long into the session (seconds)
const COUNTDOWN_AT: f64 = 1.0;

/// Seconds from the countdown start to the "go" beep
const COUNTDOWN_LEN: f64 = 3.0;

/// Racers in the session: (id, is_player)
const RACERS: [(&str, bool); 3] = [("player", true), ("rival-1", false), ("rival-2", false)];

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// First user gesture: unmute and leave the suspended state
    Resume,
    State(GameState),
    Beep(u32),
    SpawnRacers,
    Impact(f32),
    SilenceEngines,
    ResetEngines,
}

/// Time-ordered script plus per-frame telemetry
pub struct RaceSession {
    events: Vec<(f64, SessionEvent)>,
    next: usize,
    go_at: f64,
    finish_at: f64,
}

impl RaceSession {
    /// Lay out the script over `duration_s` seconds (at least [`MIN_SESSION_SECS`])
    pub fn new(duration_s: f32) -> Self {
        let duration = duration_s.max(MIN_SESSION_SECS) as f64;
        let go_at = COUNTDOWN_AT + COUNTDOWN_LEN;
        let finish_at = duration - 3.0;
        let crash_at = go_at + (finish_at - go_at) * 0.6;

        let mut events = vec![
            (0.0, SessionEvent::Resume),
            (0.0, SessionEvent::State(GameState::Menu)),
            (COUNTDOWN_AT, SessionEvent::State(GameState::Countdown)),
            (COUNTDOWN_AT, SessionEvent::SpawnRacers),
        ];
        for (i, count) in [3, 2, 1, 0].into_iter().enumerate() {
            events.push((COUNTDOWN_AT + i as f64, SessionEvent::Beep(count)));
        }
        events.extend([
            (go_at, SessionEvent::State(GameState::Playing)),
            (crash_at, SessionEvent::Impact(0.8)),
            (finish_at, SessionEvent::State(GameState::Finished)),
            (finish_at, SessionEvent::SilenceEngines),
            (duration - 1.0, SessionEvent::ResetEngines),
            (duration - 1.0, SessionEvent::State(GameState::Menu)),
        ]);
        events.sort_by(|a, b| a.0.total_cmp(&b.0));

        Self {
            events,
            next: 0,
            go_at,
            finish_at,
        }
    }

    pub fn events(&self) -> &[(f64, SessionEvent)] {
        &self.events
    }

    /// Whether racers are on track (telemetry flows) at `t`
    pub fn is_racing(&self, t: f64) -> bool {
        t >= self.go_at && t < self.finish_at
    }

    /// Throttle telemetry for racer `index` at `t`: (speed ratio, volume scale)
    ///
    /// Racers accelerate over a few seconds and weave a little around their
    /// cruising speed; rivals drift in and out of earshot.
    pub fn telemetry(&self, index: usize, t: f64) -> (f32, f32) {
        let race_t = (t - self.go_at).max(0.0) as f32;
        let phase = index as f32 * 1.7;
        let cruise = 1.0 - index as f32 * 0.08;
        let speed = (race_t / 4.0).min(1.0) * cruise + 0.06 * (race_t * 0.9 + phase).sin();
        let scale = 0.6 + 0.4 * (race_t * 0.3 + phase).cos();
        (speed, scale)
    }

    /// Fire every event due at `now`, feed telemetry and poll the beat
    pub fn advance<G: AudioGraph>(
        &mut self,
        audio: &mut AudioManager<G>,
        now: f64,
    ) -> Result<(), AudioError> {
        while let Some((at, event)) = self.events.get(self.next) {
            if *at > now {
                break;
            }
            tracing::debug!(at, ?event, "session event");
            match event {
                SessionEvent::Resume => audio.resume(),
                SessionEvent::State(state) => audio.set_game_state(*state)?,
                SessionEvent::Beep(count) => audio.play_countdown_beep(*count)?,
                SessionEvent::SpawnRacers => {
                    for (id, is_player) in RACERS {
                        audio.add_engine(id, is_player)?;
                    }
                }
                SessionEvent::Impact(volume) => audio.play_impact(*volume)?,
                SessionEvent::SilenceEngines => audio.silence_engines()?,
                SessionEvent::ResetEngines => audio.reset_engines(),
            }
            self.next += 1;
        }

        if self.is_racing(now) {
            for (index, (id, is_player)) in RACERS.into_iter().enumerate() {
                let (speed, scale) = self.telemetry(index, now);
                audio.update_engine(id, speed, scale, is_player)?;
            }
        }

        audio.tick()
    }
}

/// Render a whole session offline into a WAV file; returns the sample count
pub fn record_session(
    config: &AudioConfig,
    recording: &RecordingConfig,
    seed: u64,
) -> Result<usize, AudioError> {
    config.validate().map_err(AudioError::InvalidConfig)?;

    let sample_rate = config.sample_rate_hz;
    let graph = SoftwareGraph::new(sample_rate as f32);
    let mut audio = AudioManager::new(graph, config.clone(), seed);
    audio.init()?;

    let mut session = RaceSession::new(recording.duration_secs);
    let mut recorder = WavRecorder::create(&recording.audio_path, sample_rate)?;
    let total = recording.total_samples(sample_rate);

    // One game-loop frame per block
    while recorder.samples_written() < total {
        let now = audio.graph().current_time();
        session.advance(&mut audio, now)?;
        let len = (total - recorder.samples_written()).min(BLOCK_SIZE);
        recorder.record(audio.graph_mut(), len)?;
    }

    recorder.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AudioManager<SoftwareGraph> {
        AudioManager::new(SoftwareGraph::new(1000.0), AudioConfig::default(), 3)
    }

    fn run_until(session: &mut RaceSession, audio: &mut AudioManager<SoftwareGraph>, t: f64) {
        let mut block = [0.0f32; 10];
        while audio.graph().current_time() < t {
            let now = audio.graph().current_time();
            session.advance(audio, now).unwrap();
            audio.graph_mut().render_block(&mut block);
        }
    }

    #[test]
    fn test_script_is_time_ordered() {
        let session = RaceSession::new(20.0);
        let events = session.events();

        assert!(events.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(events[0], (0.0, SessionEvent::Resume));
        let beeps: Vec<_> = events
            .iter()
            .filter(|(_, e)| matches!(e, SessionEvent::Beep(_)))
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(beeps, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_short_sessions_are_stretched() {
        let session = RaceSession::new(2.0);
        let (last, _) = session.events().last().unwrap();
        assert_eq!(*last, MIN_SESSION_SECS as f64 - 1.0);
    }

    #[test]
    fn test_telemetry_accelerates() {
        let session = RaceSession::new(20.0);
        let (start, _) = session.telemetry(0, 4.0);
        let (cruising, _) = session.telemetry(0, 10.0);

        assert!(start < 0.1);
        assert!(cruising > 0.8);
        for t in [4.0, 6.0, 9.0, 15.0] {
            let (_, scale) = session.telemetry(1, t);
            assert!((0.2..=1.0).contains(&scale));
        }
    }

    #[test]
    fn test_session_drives_manager() {
        let mut session = RaceSession::new(10.0);
        let mut audio = manager();

        run_until(&mut session, &mut audio, 0.5);
        assert!(!audio.is_muted());
        assert!(!audio.is_beating());

        run_until(&mut session, &mut audio, 5.0);
        assert!(audio.is_beating());
        assert_eq!(audio.engine_count(), 3);
        assert!(audio.has_engine("player"));

        run_until(&mut session, &mut audio, 10.0);
        assert!(!audio.is_beating());
        assert_eq!(audio.engine_count(), 0);
    }

    #[test]
    fn test_record_session_writes_wav() {
        let path = std::env::temp_dir().join(format!("neonrace-session-{}.wav", std::process::id()));
        let config = AudioConfig {
            sample_rate_hz: 8000,
            ..AudioConfig::default()
        };
        let recording = RecordingConfig::new(10.0, &path);

        let samples = record_session(&config, &recording, 1).unwrap();
        assert_eq!(samples, 80000);

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 80000);
        let peak = reader
            .into_samples::<f32>()
            .map(|s| s.unwrap().abs())
            .fold(0.0f32, f32::max);
        assert!(peak > 0.0);

        std::fs::remove_file(&path).ok();
    }
}
