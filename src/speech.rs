//! Speech synthesis through a platform TTS command.
//!
//! Backends:
//! - `say`: macOS built-in (`say -v <voice> -r <rate> <text>`)
//! - `espeak`: espeak-ng on Linux, which also honors volume and pitch
//! - `auto`: `say` on macOS, `espeak` elsewhere
//!
//! The call blocks until the utterance has finished playing.

use std::process::Command;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::TTSConfig;
use crate::error::SpeechError;

pub const TEST_PHRASE: &str = "Testing voice settings. This is a sample announcement.";

/// Voice parameters passed along with every utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub voice: String,
    pub rate: u32,
    pub volume: f32,
    pub pitch: f32,
    pub pause_between_items: Duration,
}

impl From<&TTSConfig> for VoiceSettings {
    fn from(config: &TTSConfig) -> Self {
        Self {
            voice: config.voice.clone(),
            rate: config.rate.clamp(50, 300),
            volume: config.volume.clamp(0.0, 1.0),
            pitch: config.pitch.clamp(0.5, 2.0),
            pause_between_items: Duration::try_from_secs_f64(config.pause_between_items.max(0.0))
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// Anything that can read an announcement aloud.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str, voice: &VoiceSettings) -> Result<(), SpeechError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Say,
    Espeak,
}

impl Backend {
    pub fn from_name(name: &str) -> Result<Self, SpeechError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "say" => Ok(Self::Say),
            "espeak" | "espeak-ng" => Ok(Self::Espeak),
            "auto" | "" => Ok(if cfg!(target_os = "macos") {
                Self::Say
            } else {
                Self::Espeak
            }),
            other => Err(SpeechError::UnsupportedBackend(other.to_string())),
        }
    }

    fn program(self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::Espeak => "espeak-ng",
        }
    }

    /// Voice used when `tts.voice` is left empty.
    pub fn default_voice(self) -> &'static str {
        match self {
            Self::Say => "Samantha",
            Self::Espeak => "en-us",
        }
    }

    fn voice_name(self, voice: &VoiceSettings) -> String {
        let name = voice.voice.trim();
        if name.is_empty() {
            self.default_voice().to_string()
        } else {
            name.to_string()
        }
    }

    fn speak_args(self, text: &str, voice: &VoiceSettings) -> Vec<String> {
        match self {
            Self::Say => vec![
                "-v".into(),
                self.voice_name(voice),
                "-r".into(),
                voice.rate.to_string(),
                text.into(),
            ],
            Self::Espeak => vec![
                "-v".into(),
                self.voice_name(voice),
                "-s".into(),
                voice.rate.to_string(),
                // espeak amplitude is 0-200 (100 = normal), pitch 0-99 (50 = normal)
                "-a".into(),
                ((voice.volume * 100.0).round() as u32).to_string(),
                "-p".into(),
                ((voice.pitch * 50.0).round() as u32).min(99).to_string(),
                text.into(),
            ],
        }
    }
}

/// Shells out to the configured TTS program.
pub struct CommandSpeaker {
    backend: Backend,
}

impl CommandSpeaker {
    pub fn new(config: &TTSConfig) -> Result<Self, SpeechError> {
        let backend = Backend::from_name(&config.backend)?;
        info!("Speech backend: {}", backend.program());
        Ok(Self { backend })
    }

    /// Voices the backend offers, without numbered variants.
    pub fn list_voices(&self, configured: &str) -> Vec<String> {
        let fallback = if configured.trim().is_empty() {
            self.backend.default_voice()
        } else {
            configured
        };
        let args: &[&str] = match self.backend {
            Backend::Say => &["-v", "?"],
            Backend::Espeak => &["--voices"],
        };

        let output = match Command::new(self.backend.program()).args(args).output() {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                warn!("{} voice listing exited with {}", self.backend.program(), o.status);
                return vec![fallback.to_string()];
            }
            Err(e) => {
                warn!("Error getting voices: {e}");
                return vec![fallback.to_string()];
            }
        };

        let voices = parse_voice_list(self.backend, &String::from_utf8_lossy(&output.stdout));
        if voices.is_empty() {
            vec![fallback.to_string()]
        } else {
            voices
        }
    }

    pub fn test_voice(&self, voice: &VoiceSettings) -> Result<(), SpeechError> {
        self.speak(TEST_PHRASE, voice)
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str, voice: &VoiceSettings) -> Result<(), SpeechError> {
        let program = self.backend.program();
        debug!(
            "Speaking {} chars with {program} (voice: {})",
            text.len(),
            self.backend.voice_name(voice)
        );

        let status = Command::new(program)
            .args(self.backend.speak_args(text, voice))
            .status()
            .map_err(|source| SpeechError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(SpeechError::ExitStatus {
                program: program.to_string(),
                code: status.code(),
            });
        }

        if !voice.pause_between_items.is_zero() {
            thread::sleep(voice.pause_between_items);
        }
        Ok(())
    }
}

fn parse_voice_list(backend: Backend, listing: &str) -> Vec<String> {
    let lines = listing.lines().filter(|l| !l.trim().is_empty());
    let names: Vec<String> = match backend {
        // "Samantha            en_US    # Hello, my name is Samantha."
        Backend::Say => lines
            .filter_map(|l| l.split_whitespace().next())
            .map(str::to_string)
            .collect(),
        // " Pty Language       Age/Gender VoiceName          File                 Other Languages"
        // "  5  en-us           --/M      English_(America)  gmw/en-US"
        Backend::Espeak => lines
            .skip(1)
            .filter_map(|l| l.split_whitespace().nth(1))
            .map(str::to_string)
            .collect(),
    };

    names
        .into_iter()
        .filter(|name| !name.chars().any(|c| c.is_ascii_digit()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> VoiceSettings {
        VoiceSettings::from(&TTSConfig::default())
    }

    #[test]
    fn backend_names() {
        assert_eq!(Backend::from_name("say").unwrap(), Backend::Say);
        assert_eq!(Backend::from_name("espeak-ng").unwrap(), Backend::Espeak);
        assert!(Backend::from_name("auto").is_ok());
        assert!(matches!(
            Backend::from_name("festival"),
            Err(SpeechError::UnsupportedBackend(_))
        ));
    }

    #[test]
    fn settings_are_clamped_from_config() {
        let config = TTSConfig {
            rate: 1000,
            volume: 3.0,
            pitch: 0.1,
            pause_between_items: -1.0,
            ..TTSConfig::default()
        };
        let voice = VoiceSettings::from(&config);
        assert_eq!(voice.rate, 300);
        assert_eq!(voice.volume, 1.0);
        assert_eq!(voice.pitch, 0.5);
        assert!(voice.pause_between_items.is_zero());
    }

    #[test]
    fn say_args() {
        let args = Backend::Say.speak_args("hello", &settings());
        assert_eq!(args, ["-v", "Samantha", "-r", "150", "hello"]);
    }

    #[test]
    fn default_voice_depends_on_backend() {
        let voice = settings();
        assert!(voice.voice.is_empty());

        let espeak = Backend::Espeak.speak_args("hello", &voice);
        assert_eq!(&espeak[..2], ["-v", "en-us"]);
        assert!(!espeak.iter().any(|arg| arg == "Samantha"));

        let say = Backend::Say.speak_args("hello", &voice);
        assert_eq!(&say[..2], ["-v", "Samantha"]);
    }

    #[test]
    fn configured_voice_is_passed_through() {
        let voice = VoiceSettings {
            voice: " en-gb ".into(),
            ..settings()
        };
        assert_eq!(&Backend::Espeak.speak_args("hi", &voice)[..2], ["-v", "en-gb"]);
    }

    #[test]
    fn espeak_args_map_volume_and_pitch() {
        let args = Backend::Espeak.speak_args("hello", &settings());
        assert_eq!(args, ["-v", "en-us", "-s", "150", "-a", "100", "-p", "50", "hello"]);
    }

    #[test]
    fn say_voice_listing_drops_numbered_variants() {
        let listing = "Alex                en_US    # Most people recognize me by my voice.\n\
                       Samantha            en_US    # Hello, my name is Samantha.\n\
                       Voice2              en_US    # numbered\n";
        assert_eq!(parse_voice_list(Backend::Say, listing), ["Alex", "Samantha"]);
    }

    #[test]
    fn espeak_voice_listing_skips_header() {
        let listing = "Pty Language       Age/Gender VoiceName          File\n\
                        5  af              --/M      Afrikaans          gmw/af\n\
                        5  en-us           --/M      English_(America)  gmw/en-US\n";
        assert_eq!(parse_voice_list(Backend::Espeak, listing), ["af", "en-us"]);
    }
}
