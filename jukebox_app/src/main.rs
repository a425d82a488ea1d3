//! Jukebox demo application
//!
//! Drives an audio channel registry from a fixed-rate host loop the way a game
//! would: background music on channel 0, repeated effects on channel 1,
//! fire-and-forget explosions, a global volume fade and a track change.
//!
//! Usage: `jukebox [config.toml|config.ron] [resource dir]`

use channel_audio::audio::{AudioChannelRegistry, PlaySettings};
use channel_audio::config::{AudioConfig, Config};
use channel_audio::foundation::logging;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// Configuration constants
const FRAME_TIME: Duration = Duration::from_millis(16);
const TOTAL_FRAMES: u32 = 600;
const MUSIC_CHANNEL: u32 = 0;
const LASER_CHANNEL: u32 = 1;

fn load_config(path: Option<&str>) -> AudioConfig {
    let Some(path) = path else {
        return AudioConfig::default();
    };

    match AudioConfig::load_from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}. Using defaults.", path, e);
            AudioConfig::default()
        }
    }
}

fn resource(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str));
    let resources = PathBuf::from(args.get(2).map_or("resources/audio", String::as_str));

    logging::init_with_level(&config.log_level);
    log::info!("Starting jukebox demo");

    let mut audio = AudioChannelRegistry::new(config);
    if let Some(e) = audio.backend_failure() {
        log::warn!("Running without audio output: {}", e);
    }

    let loop_music = PlaySettings::new().with_looping(true).with_volume(0.7);
    if audio
        .play_music_on_channel(MUSIC_CHANNEL, resource(&resources, "music.mp3"), loop_music)
        .is_none()
    {
        log::warn!("Background music could not be started");
    }

    let start = Instant::now();
    for frame in 0..TOTAL_FRAMES {
        let frame_start = Instant::now();

        if frame % 45 == 0 {
            audio.play_sound_on_channel(LASER_CHANNEL, resource(&resources, "laser.wav"), PlaySettings::new());
        }

        if frame % 120 == 60 {
            audio.play_sound(resource(&resources, "explosion.wav"), PlaySettings::new().with_volume(0.9));
        }

        // Fade the master volume down and back up
        if (240..300).contains(&frame) {
            audio.set_global_volume(1.0 - (frame - 240) as f32 / 120.0);
        } else if (300..360).contains(&frame) {
            audio.set_global_volume(0.5 + (frame - 300) as f32 / 120.0);
        }

        match frame {
            360 => {
                // The old track keeps its voice until it is collected
                audio.stop_music_on_channel(MUSIC_CHANNEL);
                audio.play_music_on_channel(MUSIC_CHANNEL, resource(&resources, "boss.ogg"), loop_music);
            }
            480 => audio.pause_music_on_channel(MUSIC_CHANNEL),
            540 => audio.resume_music_on_channel(MUSIC_CHANNEL),
            _ => {}
        }

        let collected = audio.tick();
        if collected > 0 {
            log::debug!("Frame {}: collected {} instances", frame, collected);
        }

        if frame % 60 == 0 {
            log::info!(
                "t={:.1}s sounds={} musics={} channels={:?} volume={:.2}",
                start.elapsed().as_secs_f32(),
                audio.sound_count(),
                audio.music_count(),
                audio.sound_channels(),
                audio.global_volume()
            );
        }

        if let Some(remaining) = FRAME_TIME.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    audio.clear_all();
    log::info!("Jukebox demo finished");
}
