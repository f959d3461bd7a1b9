//! Voice Query Handlers

use crate::application::queries::{ListVoices, VoiceOption};
use crate::domain::voice::{self, VoiceProfile};

/// ListVoices Handler
pub struct ListVoicesHandler {
    default_voice: VoiceProfile,
}

impl ListVoicesHandler {
    pub fn new(default_voice: VoiceProfile) -> Self {
        Self { default_voice }
    }

    pub fn handle(&self, _query: ListVoices) -> Vec<VoiceOption> {
        voice::all_voices()
            .iter()
            .map(|v| VoiceOption {
                label: v.label,
                voice_id: v.voice_id,
                is_default: v.voice_id == self.default_voice.voice_id,
            })
            .collect()
    }
}
