//! Audio cues using Kira: one short sound per game event, restarted on every trigger.

use anyhow::Result;
use kira::{
    manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
    sound::static_sound::{StaticSoundData, StaticSoundHandle},
    tween::Tween,
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Game events that have a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// A click popped an organism.
    Hit,
    /// A click found nothing.
    Miss,
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cue::Hit => f.write_str("hit"),
            Cue::Miss => f.write_str("miss"),
        }
    }
}

/// Fire-and-forget cue playback.
pub trait CuePlayer {
    /// Play `cue` from the start, cutting off any earlier playback of the same cue.
    fn play(&mut self, cue: Cue);
}

/// Plays nothing. Used when no audio device or sound file is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCues;

impl CuePlayer for SilentCues {
    fn play(&mut self, cue: Cue) {
        log::trace!("(silent) {cue}");
    }
}

/// Kira-backed cue player.
pub struct AudioSystem {
    manager: AudioManager,
    sounds: HashMap<Cue, StaticSoundData>,
    playing: HashMap<Cue, StaticSoundHandle>,
}

impl AudioSystem {
    /// Create a new audio system on the default output device.
    pub fn new() -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())?;
        Ok(Self {
            manager,
            sounds: HashMap::new(),
            playing: HashMap::new(),
        })
    }

    /// Load the sound for `cue` from a file.
    pub fn load_cue(&mut self, cue: Cue, path: &Path) -> Result<()> {
        let sound_data = StaticSoundData::from_file(path)?;
        self.sounds.insert(cue, sound_data);
        Ok(())
    }

    fn restart(&mut self, cue: Cue) -> Result<()> {
        if let Some(mut handle) = self.playing.remove(&cue) {
            let _ = handle.stop(Tween::default());
        }
        if let Some(sound_data) = self.sounds.get(&cue) {
            let handle = self.manager.play(sound_data.clone())?;
            self.playing.insert(cue, handle);
        }
        Ok(())
    }
}

impl CuePlayer for AudioSystem {
    fn play(&mut self, cue: Cue) {
        if let Err(e) = self.restart(cue) {
            log::warn!("Failed to play {cue} cue: {e:#}");
        }
    }
}

/// Open the audio device and load both cues, falling back to [`SilentCues`] on any failure.
pub fn load_cues(hit: &Path, miss: &Path) -> Box<dyn CuePlayer> {
    let load = || -> Result<AudioSystem> {
        let mut audio = AudioSystem::new()?;
        audio.load_cue(Cue::Hit, hit)?;
        audio.load_cue(Cue::Miss, miss)?;
        Ok(audio)
    };
    match load() {
        Ok(audio) => Box::new(audio),
        Err(e) => {
            log::warn!("Audio unavailable ({e:#}); continuing without sound");
            Box::new(SilentCues)
        }
    }
}
