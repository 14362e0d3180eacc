//! Announcement plans and the announcer seam.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::phrase::{spell_queue_number, AnnounceError, AnnounceResult};

/// Notification sound played before the spoken number.
pub const DEFAULT_CHIME: &str = "sounds/minimalist-ding-dong.wav";

/// Locales the number is spoken in, in order.
pub const DEFAULT_LOCALES: [&str; 2] = ["en-US", "ms-MY"];

/// Speech rate handed to the synthesizer (1.0 = engine default).
pub const DEFAULT_SPEECH_RATE: f32 = 0.1;

/// Announcement settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnnouncerConfig {
    /// Path or URL of the chime asset
    pub chime: String,
    /// Locales spoken sequentially after the chime
    pub locales: Vec<String>,
    /// Speech rate for every utterance
    pub speech_rate: f32,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            chime: DEFAULT_CHIME.to_string(),
            locales: DEFAULT_LOCALES.iter().map(|l| l.to_string()).collect(),
            speech_rate: DEFAULT_SPEECH_RATE,
        }
    }
}

/// One spoken phrase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub locale: String,
    pub rate: f32,
}

/// Everything a host needs to play one queue call: the chime, then each
/// utterance in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    /// Queue number as displayed
    pub queue_number: String,
    /// Chime asset played first
    pub chime: String,
    /// Utterances spoken after the chime finishes
    pub utterances: Vec<Utterance>,
}

impl Announcement {
    /// Build the announcement for a queue number.
    pub fn for_queue_number(queue_number: &str, config: &AnnouncerConfig) -> AnnounceResult<Self> {
        if config.locales.is_empty() {
            return Err(AnnounceError::NoLocales);
        }

        let spoken = spell_queue_number(queue_number)?;
        let utterances = config
            .locales
            .iter()
            .map(|locale| Utterance {
                text: spoken.clone(),
                locale: locale.clone(),
                rate: config.speech_rate,
            })
            .collect();

        Ok(Self {
            queue_number: queue_number.trim().to_string(),
            chime: config.chime.clone(),
            utterances,
        })
    }
}

/// Plays announcements.
///
/// Implementations must return without waiting for playback. A second call
/// arriving while the first is still speaking may overlap or interrupt it.
pub trait Announcer: Send + Sync {
    fn announce(&self, announcement: &Announcement);
}

/// Announcer that only logs. Used when the host plays the returned plan
/// itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnnouncer;

impl Announcer for TracingAnnouncer {
    fn announce(&self, announcement: &Announcement) {
        tracing::info!(
            queue_number = %announcement.queue_number,
            chime = %announcement.chime,
            utterances = announcement.utterances.len(),
            "Announcing queue number"
        );
    }
}

/// Announcer that keeps every announcement it receives (for testing).
#[derive(Debug, Default, Clone)]
pub struct RecordingAnnouncer {
    announcements: Arc<Mutex<Vec<Announcement>>>,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of announcements received so far, oldest first.
    pub fn announcements(&self) -> Vec<Announcement> {
        match self.announcements.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Queue numbers announced so far, oldest first.
    pub fn queue_numbers(&self) -> Vec<String> {
        self.announcements()
            .into_iter()
            .map(|a| a.queue_number)
            .collect()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, announcement: &Announcement) {
        match self.announcements.lock() {
            Ok(mut guard) => guard.push(announcement.clone()),
            Err(poisoned) => poisoned.into_inner().push(announcement.clone()),
        }
    }
}
