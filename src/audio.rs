//! Sound effects and music
//!
//! Everything is synthesized from short note sequences, no sample files.
//! Notes are packed bytes: high nibble octave, low nibble semitone (0x49 is
//! A4 = 440 Hz, 0 is a rest).

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// A monkey grabbed on
    Grab,
    /// A monkey was thrown
    Throw,
    /// The tree fell
    GameOver,
}

impl SoundEffect {
    /// Effect that accompanies a game event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Grabbed { .. } => Some(SoundEffect::Grab),
            GameEvent::Thrown { .. } => Some(SoundEffect::Throw),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::Quit => None,
        }
    }

    /// Note sequence played one note per step
    pub fn notes(self) -> &'static [u8] {
        match self {
            SoundEffect::Grab => &[0x60, 0x30],
            SoundEffect::Throw => &[0x50],
            SoundEffect::GameOver => &[
                0x64, 0x62, 0x60, 0x62, 0x60, 0x5B, 0x59, 0x57, 0x55, 0x54, 0x52, 0x50,
            ],
        }
    }

    /// Seconds per note
    pub fn step_seconds(self) -> f64 {
        match self {
            SoundEffect::Grab => 0.06,
            SoundEffect::Throw => 0.15,
            SoundEffect::GameOver => 0.11,
        }
    }
}

/// Background loop, one note per step, 0 = rest
pub const MUSIC_LOOP: [u8; 32] = [
    0x54, 0, 0x54, 0, 0x54, 0x57, 0, 0x57, 0, 0x57, 0x54, 0, 0x52, 0, 0x54, 0x54, //
    0x54, 0, 0x54, 0, 0x50, 0x52, 0, 0, 0x52, 0x52, 0x54, 0x55, 0x52, 0x54, 0, 0,
];

/// Seconds per music step
pub const MUSIC_STEP_SECONDS: f64 = 0.15;

/// Frequency in Hz of a packed note, `None` for a rest
pub fn note_frequency(note: u8) -> Option<f32> {
    if note == 0 {
        return None;
    }
    let octave = (note >> 4) as i32;
    let semitone = (note & 0x0F) as i32;
    let from_a4 = octave * 12 + semitone - (4 * 12 + 9);
    Some(440.0 * 2f32.powf(from_a4 as f32 / 12.0))
}

/// Where sounds go
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    fn start_music(&mut self);

    fn set_volumes(&mut self, master: f32, sfx: f32, music: f32, muted: bool);

    /// Called once per frame for sinks that schedule ahead
    fn update(&mut self) {}
}

/// Play the sound for every event that has one
pub fn dispatch_events(events: &[GameEvent], sink: &mut impl AudioSink) {
    for effect in events.iter().filter_map(SoundEffect::for_event) {
        sink.play(effect);
    }
}

/// Sink that only logs; used headless and in tests
#[derive(Debug, Default)]
pub struct LogAudio {
    pub played: Vec<SoundEffect>,
    pub music_started: bool,
    muted: bool,
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        if !self.muted {
            log::debug!("sfx {:?}", effect);
        }
        self.played.push(effect);
    }

    fn start_music(&mut self) {
        self.music_started = true;
        log::debug!("music started");
    }

    fn set_volumes(&mut self, _master: f32, _sfx: f32, _music: f32, muted: bool) {
        self.muted = muted;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, MUSIC_LOOP, MUSIC_STEP_SECONDS, SoundEffect, note_frequency};

    /// Seconds of music scheduled ahead of the audio clock
    const LOOKAHEAD: f64 = 0.3;

    /// Web Audio oscillator backend
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        music_volume: f32,
        muted: bool,
        music_on: bool,
        music_pos: usize,
        next_music_time: f64,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                music_volume: 0.5,
                muted: false,
                music_on: false,
                music_pos: 0,
                next_music_time: 0.0,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn volume(&self, channel: f32) -> f32 {
            if self.muted { 0.0 } else { self.master_volume * channel }
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// One plucked note starting at `t`
        fn schedule_note(
            ctx: &AudioContext,
            note: u8,
            t: f64,
            length: f64,
            vol: f32,
            osc_type: OscillatorType,
        ) {
            let Some(freq) = note_frequency(note) else { return };
            let Some((osc, gain)) = Self::create_osc(ctx, freq, osc_type) else {
                return;
            };
            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + length)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + length + 0.02).ok();
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            let vol = self.volume(self.sfx_volume);
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let osc_type = match effect {
                SoundEffect::Grab => OscillatorType::Square,
                SoundEffect::Throw => OscillatorType::Triangle,
                SoundEffect::GameOver => OscillatorType::Sawtooth,
            };
            let step = effect.step_seconds();
            let start = ctx.current_time();
            for (i, note) in effect.notes().iter().enumerate() {
                let t = start + i as f64 * step;
                Self::schedule_note(ctx, *note, t, step * 1.5, vol * 0.3, osc_type);
            }
        }

        fn start_music(&mut self) {
            self.music_on = true;
            self.music_pos = 0;
            self.next_music_time = self.ctx.as_ref().map_or(0.0, |ctx| ctx.current_time());
        }

        fn set_volumes(&mut self, master: f32, sfx: f32, music: f32, muted: bool) {
            self.master_volume = master.clamp(0.0, 1.0);
            self.sfx_volume = sfx.clamp(0.0, 1.0);
            self.music_volume = music.clamp(0.0, 1.0);
            self.muted = muted;
        }

        fn update(&mut self) {
            if !self.music_on {
                return;
            }
            let vol = self.volume(self.music_volume) * 0.2;
            let Some(ctx) = &self.ctx else { return };
            let now = ctx.current_time();
            // After a stall, skip ahead instead of bursting every missed note
            if self.next_music_time < now {
                self.next_music_time = now;
            }
            while self.next_music_time < now + LOOKAHEAD {
                let note = MUSIC_LOOP[self.music_pos];
                if vol > 0.0 {
                    Self::schedule_note(
                        ctx,
                        note,
                        self.next_music_time,
                        MUSIC_STEP_SECONDS * 0.9,
                        vol,
                        OscillatorType::Triangle,
                    );
                }
                self.music_pos = (self.music_pos + 1) % MUSIC_LOOP.len();
                self.next_music_time += MUSIC_STEP_SECONDS;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Side;

    #[test]
    fn test_note_frequency() {
        assert_eq!(note_frequency(0), None);
        assert!((note_frequency(0x49).unwrap() - 440.0).abs() < 1e-3);
        assert!((note_frequency(0x59).unwrap() - 880.0).abs() < 1e-2);
        assert!((note_frequency(0x50).unwrap() - 523.25).abs() < 0.1);
    }

    #[test]
    fn test_events_map_to_effects() {
        let events = [
            GameEvent::Thrown { side: Side::Left },
            GameEvent::Grabbed { count: 1 },
            GameEvent::Quit,
            GameEvent::GameOver { count: 1 },
        ];
        let mut sink = LogAudio::default();
        dispatch_events(&events, &mut sink);
        assert_eq!(
            sink.played,
            vec![SoundEffect::Throw, SoundEffect::Grab, SoundEffect::GameOver]
        );
    }

    #[test]
    fn test_game_over_jingle_descends() {
        let notes = SoundEffect::GameOver.notes();
        let first = note_frequency(notes[0]).unwrap();
        let last = note_frequency(*notes.last().unwrap()).unwrap();
        assert!(first > last);
    }
}
