//! Narration requests and the per-target pre-fetch cache.
//!
//! Every request is stamped with the generation current when it was made.
//! Changing target (or leaving the level) bumps the generation, so replies to
//! older requests are dropped when they finally arrive.
//! At most `MAX_PENDING` requests are tracked; the oldest are forgotten first.

use std::collections::HashMap;

use pop_engine::audio::{AudioBuffer, AudioService};
use pop_engine::speech::{SpeechChannel, SpeechId, SpeechReply};

/// Requests the host never answers are forgotten past this many.
pub const MAX_PENDING: usize = 32;

/// Phrases fetched ahead of time for the current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Win,
    FoundOne,
}

/// Why a request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Prefetch(Cue),
    /// Played queued as soon as it arrives.
    Speak,
    /// The win phrase requested after the pre-fetch was missing.
    WinFallback,
    /// Selection feedback spoken before a level starts.
    Announce,
}

#[derive(Debug)]
enum Slot {
    Empty,
    Loading,
    Ready(AudioBuffer),
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    generation: u32,
    purpose: Purpose,
}

/// A reply that is still relevant. `buffer` is `None` when synthesis or decoding failed.
#[derive(Debug)]
pub struct Resolved {
    pub id: SpeechId,
    pub purpose: Purpose,
    pub buffer: Option<AudioBuffer>,
}

#[derive(Debug)]
pub struct NarrationCache {
    generation: u32,
    pending: HashMap<SpeechId, Pending>,
    win: Slot,
    found_one: Slot,
}

impl Default for NarrationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrationCache {
    pub fn new() -> Self {
        Self {
            generation: 0,
            pending: HashMap::new(),
            win: Slot::Empty,
            found_one: Slot::Empty,
        }
    }

    /// Forget the cached phrases and orphan every outstanding request.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.win = Slot::Empty;
        self.found_one = Slot::Empty;
        self.pending.clear();
    }

    /// Start a new generation and request both phrases for it.
    pub fn prefetch(&mut self, speech: &mut SpeechChannel, win_text: String, found_one_text: String) {
        self.invalidate();
        self.track(speech, win_text, Purpose::Prefetch(Cue::Win));
        self.track(speech, found_one_text, Purpose::Prefetch(Cue::FoundOne));
        self.win = Slot::Loading;
        self.found_one = Slot::Loading;
    }

    /// Request `text` for playback as soon as it arrives.
    pub fn speak(&mut self, speech: &mut SpeechChannel, text: String, purpose: Purpose) -> SpeechId {
        self.track(speech, text, purpose)
    }

    fn track(&mut self, speech: &mut SpeechChannel, text: String, purpose: Purpose) -> SpeechId {
        let id = speech.request(text);
        if self.pending.len() >= MAX_PENDING {
            // Ids increase monotonically, so the smallest is the oldest.
            if let Some(oldest) = self.pending.keys().min().copied() {
                log::debug!("forgetting unanswered speech request {:?}", oldest);
                self.pending.remove(&oldest);
            }
        }
        self.pending.insert(
            id,
            Pending {
                generation: self.generation,
                purpose,
            },
        );
        id
    }

    /// The pre-fetched buffer, if it has arrived.
    pub fn cached(&self, cue: Cue) -> Option<&AudioBuffer> {
        match self.slot(cue) {
            Slot::Ready(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Still waiting on the pre-fetch.
    pub fn is_loading(&self, cue: Cue) -> bool {
        matches!(self.slot(cue), Slot::Loading)
    }

    fn slot(&self, cue: Cue) -> &Slot {
        match cue {
            Cue::Win => &self.win,
            Cue::FoundOne => &self.found_one,
        }
    }

    /// Match a host reply to its request and decode it. Returns `None` for
    /// replies that are unknown or belong to an older generation.
    pub fn resolve(&mut self, reply: SpeechReply, audio: &mut AudioService) -> Option<Resolved> {
        let id = reply.id();
        let Some(pending) = self.pending.remove(&id) else {
            log::debug!("dropping reply to unknown or stale speech request {:?}", id);
            return None;
        };
        if pending.generation != self.generation {
            log::debug!("dropping stale narration {:?}", id);
            return None;
        }

        let buffer = match reply {
            SpeechReply::Audio { pcm_base64, .. } => {
                match audio.decode(&pcm_base64).and_then(|bytes| audio.decode_audio_data(&bytes)) {
                    Ok(buffer) => Some(buffer),
                    Err(err) => {
                        log::warn!("narration {:?} could not be decoded: {}", id, err);
                        None
                    }
                }
            }
            SpeechReply::Failed { .. } => {
                log::warn!("narration {:?} failed on the host", id);
                None
            }
        };

        if let Purpose::Prefetch(cue) = pending.purpose {
            let slot = match buffer.clone() {
                Some(buffer) => Slot::Ready(buffer),
                None => Slot::Failed,
            };
            match cue {
                Cue::Win => self.win = slot,
                Cue::FoundOne => self.found_one = slot,
            }
        }

        Some(Resolved {
            id,
            purpose: pending.purpose,
            buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use pop_engine::{AudioConfig, ManualOutput};

    fn audio() -> AudioService {
        AudioService::new(AudioConfig::default(), ManualOutput::new().factory())
    }

    fn pcm() -> String {
        general_purpose::STANDARD.encode(vec![0u8; 480])
    }

    fn ids(speech: &mut SpeechChannel) -> Vec<SpeechId> {
        speech.drain_requests().into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn prefetch_fills_slots_in_any_order() {
        let mut speech = SpeechChannel::new();
        let mut audio = audio();
        let mut cache = NarrationCache::new();
        cache.prefetch(&mut speech, "win".into(), "one".into());
        let ids = ids(&mut speech);
        assert!(cache.is_loading(Cue::Win));

        cache.resolve(SpeechReply::Audio { id: ids[1], pcm_base64: pcm() }, &mut audio);
        assert!(cache.cached(Cue::FoundOne).is_some());
        assert!(cache.is_loading(Cue::Win));

        cache.resolve(SpeechReply::Audio { id: ids[0], pcm_base64: pcm() }, &mut audio);
        assert!(cache.cached(Cue::Win).is_some());
    }

    #[test]
    fn stale_replies_are_dropped() {
        let mut speech = SpeechChannel::new();
        let mut audio = audio();
        let mut cache = NarrationCache::new();
        cache.prefetch(&mut speech, "win A".into(), "one A".into());
        let old = ids(&mut speech);
        cache.prefetch(&mut speech, "win B".into(), "one B".into());

        let resolved = cache.resolve(SpeechReply::Audio { id: old[0], pcm_base64: pcm() }, &mut audio);
        assert!(resolved.is_none());
        assert!(cache.cached(Cue::Win).is_none());
        assert!(cache.is_loading(Cue::Win));
    }

    #[test]
    fn failures_and_bad_payloads_leave_slot_failed() {
        let mut speech = SpeechChannel::new();
        let mut audio = audio();
        let mut cache = NarrationCache::new();
        cache.prefetch(&mut speech, "win".into(), "one".into());
        let ids = ids(&mut speech);

        let r = cache.resolve(SpeechReply::Failed { id: ids[0] }, &mut audio).unwrap();
        assert!(r.buffer.is_none());
        let r = cache
            .resolve(SpeechReply::Audio { id: ids[1], pcm_base64: "!!".into() }, &mut audio)
            .unwrap();
        assert!(r.buffer.is_none());
        assert!(!cache.is_loading(Cue::Win) && cache.cached(Cue::Win).is_none());
        assert!(!cache.is_loading(Cue::FoundOne));
    }

    #[test]
    fn invalidation_orphans_every_purpose() {
        let mut speech = SpeechChannel::new();
        let mut audio = audio();
        let mut cache = NarrationCache::new();
        let announce = cache.speak(&mut speech, "Let's find A".into(), Purpose::Announce);
        let spoken = cache.speak(&mut speech, "Oops".into(), Purpose::Speak);
        cache.invalidate();

        assert!(cache.resolve(SpeechReply::Failed { id: spoken }, &mut audio).is_none());
        assert!(cache.resolve(SpeechReply::Failed { id: announce }, &mut audio).is_none());
    }

    #[test]
    fn unanswered_requests_are_capped() {
        let mut speech = SpeechChannel::new();
        let mut audio = audio();
        let mut cache = NarrationCache::new();
        let first = cache.speak(&mut speech, "Oops".into(), Purpose::Speak);
        let mut last = first;
        for _ in 0..MAX_PENDING {
            last = cache.speak(&mut speech, "Oops".into(), Purpose::Speak);
        }
        assert_eq!(cache.pending.len(), MAX_PENDING);

        assert!(cache.resolve(SpeechReply::Failed { id: first }, &mut audio).is_none());
        let r = cache.resolve(SpeechReply::Failed { id: last }, &mut audio).unwrap();
        assert_eq!(r.purpose, Purpose::Speak);
    }

    #[test]
    fn unknown_reply_is_ignored() {
        let mut audio = audio();
        let mut cache = NarrationCache::new();
        assert!(cache.resolve(SpeechReply::Failed { id: SpeechId(99) }, &mut audio).is_none());
    }
}
