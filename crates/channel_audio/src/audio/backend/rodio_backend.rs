//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform audio playback.
//! Rodio is pure Rust and supports WAV, OGG Vorbis, MP3, and FLAC formats.
//!
//! Buffered resources (sound effects) are decoded once into memory and
//! replayed from that buffer. Streamed resources (music) are decoded from disk
//! while they play and reopened on every restart.
//!
//! # Example
//!
//! ```no_run
//! use channel_audio::audio::backend::{AudioBackend, AudioBackendConfig, ResourceKind};
//! use channel_audio::audio::backend::rodio_backend::RodioBackend;
//! use std::path::Path;
//!
//! let mut backend = RodioBackend::new();
//! backend.initialize(&AudioBackendConfig::default()).unwrap();
//!
//! let voice = backend
//!     .open(Path::new("resources/audio/laser.wav"), ResourceKind::Buffered, false)
//!     .unwrap();
//! backend.set_gain(voice, 0.5).unwrap();
//! backend.play(voice).unwrap();
//!
//! if backend.is_finished(voice) {
//!     backend.release(voice);
//! }
//! backend.shutdown();
//! ```

use super::{AudioBackend, AudioBackendConfig, ResourceKind, VoiceId, VoiceIdGenerator};
use crate::audio::AudioError;
use rodio::source::Buffered;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

type BufferedSource = Buffered<Decoder<Cursor<Vec<u8>>>>;

/// One opened resource and the sink currently playing it
struct RodioVoice {
    path: PathBuf,
    kind: ResourceKind,
    looping: bool,
    gain: f32,
    /// Decoded samples for buffered resources
    buffer: Option<BufferedSource>,
    /// `None` once stopped or drained; recreated on the next play
    sink: Option<Sink>,
}

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Audio output stream (must be kept alive)
    _output_stream: Option<OutputStream>,
    /// Output stream handle for creating sinks
    stream_handle: Option<OutputStreamHandle>,
    /// Opened voices
    voices: HashMap<VoiceId, RodioVoice>,
    ids: VoiceIdGenerator,
    /// Initialization state
    initialized: bool,
}

impl RodioBackend {
    /// Create a new Rodio backend
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            voices: HashMap::new(),
            ids: VoiceIdGenerator::default(),
            initialized: false,
        }
    }

    /// Decode a whole file into a replayable in-memory buffer
    fn load_buffer(path: &Path) -> Result<BufferedSource, AudioError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AudioError::InvalidResource(format!("{}: {}", path.display(), e)))?;
        let decoder = Decoder::new(Cursor::new(bytes))
            .map_err(|e| AudioError::InvalidResource(format!("{}: {}", path.display(), e)))?;
        Ok(decoder.buffered())
    }

    /// Open a streaming decoder over a file
    fn open_stream(path: &Path) -> Result<BufReader<File>, AudioError> {
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| AudioError::InvalidResource(format!("{}: {}", path.display(), e)))
    }

    /// Create a paused sink with the voice's source queued
    fn start_sink(stream_handle: &OutputStreamHandle, voice: &RodioVoice) -> Result<Sink, AudioError> {
        let sink = Sink::try_new(stream_handle)
            .map_err(|e| AudioError::BackendFailure(format!("Failed to create sink: {}", e)))?;
        sink.pause();
        sink.set_volume(voice.gain);

        match (&voice.buffer, voice.looping) {
            (Some(buffer), true) => sink.append(buffer.clone().repeat_infinite()),
            (Some(buffer), false) => sink.append(buffer.clone()),
            (None, true) => {
                let decoder = Decoder::new_looped(Self::open_stream(&voice.path)?)
                    .map_err(|e| AudioError::InvalidResource(format!("{}: {}", voice.path.display(), e)))?;
                sink.append(decoder);
            }
            (None, false) => {
                let decoder = Decoder::new(Self::open_stream(&voice.path)?)
                    .map_err(|e| AudioError::InvalidResource(format!("{}: {}", voice.path.display(), e)))?;
                sink.append(decoder);
            }
        }

        Ok(sink)
    }

    fn voice_mut(&mut self, voice: VoiceId) -> Result<&mut RodioVoice, AudioError> {
        self.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)
    }
}

impl AudioBackend for RodioBackend {
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }

        // Create output stream
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::BackendFailure(format!("Failed to create audio output: {}", e)))?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(stream_handle);
        self.initialized = true;

        log::info!(
            "Rodio audio backend initialized (requested {} Hz, {} channels)",
            config.sample_rate,
            config.channels
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        self.stop_all();

        // Drop stream handle and output
        self.stream_handle = None;
        self._output_stream = None;
        self.initialized = false;

        log::info!("Rodio audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self) {
        // Drained sinks hold nothing worth keeping; play() builds a new one
        for voice in self.voices.values_mut() {
            if voice.sink.as_ref().is_some_and(Sink::empty) {
                voice.sink = None;
            }
        }
    }

    fn open(&mut self, path: &Path, kind: ResourceKind, looping: bool) -> Result<VoiceId, AudioError> {
        let stream_handle = self
            .stream_handle
            .as_ref()
            .ok_or(AudioError::BackendNotInitialized)?;

        let buffer = match kind {
            ResourceKind::Buffered => Some(Self::load_buffer(path)?),
            ResourceKind::Streamed => None,
        };

        let mut voice = RodioVoice {
            path: path.to_path_buf(),
            kind,
            looping,
            gain: 1.0,
            buffer,
            sink: None,
        };
        voice.sink = Some(Self::start_sink(stream_handle, &voice)?);

        let id = self.ids.next();
        log::debug!("Opened {:?} voice {} for {}", voice.kind, id.id, path.display());
        self.voices.insert(id, voice);
        Ok(id)
    }

    fn play(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let stream_handle = self
            .stream_handle
            .as_ref()
            .ok_or(AudioError::BackendNotInitialized)?;
        let entry = self.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;

        let needs_restart = entry.sink.as_ref().map_or(true, Sink::empty);
        if needs_restart {
            entry.sink = Some(Self::start_sink(stream_handle, entry)?);
        }
        if let Some(sink) = &entry.sink {
            sink.play();
        }
        Ok(())
    }

    fn pause(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        if let Some(sink) = &self.voice_mut(voice)?.sink {
            sink.pause();
        }
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        if let Some(entry) = self.voices.get_mut(&voice) {
            if let Some(sink) = entry.sink.take() {
                sink.stop();
            }
        }
        Ok(())
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) -> Result<(), AudioError> {
        let entry = self.voice_mut(voice)?;
        entry.gain = gain;
        if let Some(sink) = &entry.sink {
            sink.set_volume(gain);
        }
        Ok(())
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        self.voices
            .get(&voice)
            .map_or(true, |entry| entry.sink.as_ref().map_or(true, Sink::empty))
    }

    fn release(&mut self, voice: VoiceId) {
        if let Some(entry) = self.voices.remove(&voice) {
            if let Some(sink) = entry.sink {
                sink.stop();
            }
        }
    }

    fn stop_all(&mut self) {
        for (_voice, entry) in self.voices.drain() {
            if let Some(sink) = entry.sink {
                sink.stop();
            }
        }
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
