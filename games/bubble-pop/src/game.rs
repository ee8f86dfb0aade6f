//! Bubble Pop: bubbles drift around the screen and the player pops the ones
//! showing the requested letter, number or shape. Narration comes from the
//! host's speech service; the last target pop plays the win phrase, then a
//! short reward screen follows.

use glam::Vec2;
use pop_engine::api::types::EntityId;
use pop_engine::audio::{Completion, PlayMode};
use pop_engine::input::queue::{InputEvent, InputQueue};
use pop_engine::speech::SpeechId;
use pop_engine::systems::motion::integrate_bounded;
use pop_engine::systems::picking::pick_at;
use pop_engine::{EngineContext, Game, GameConfig, GameEvent};

use crate::bubbles::{spawn_level, Bubble, BubbleSnapshot};
use crate::level::LevelSpec;
use crate::narration::{Cue, NarrationCache, Purpose, Resolved};
use crate::phrases::{Language, Phrasebook, Phrases};

/// A popped distractor stays in the scene this long before it is removed.
const POP_REMOVAL_DELAY: f32 = 0.4;
/// Seconds on the reward screen before it continues on its own.
const REWARD_DURATION: f32 = 3.5;
/// Number of reward stickers the host can show.
pub const STICKER_COUNT: u32 = 12;

/// Custom event kinds from the host UI
pub mod custom_events {
    pub const CONTINUE: u32 = 1;
    pub const EXIT: u32 = 2;
    /// a = width, b = height
    pub const RESIZE: u32 = 3;
}

/// Game event kinds to the host UI
pub mod game_events {
    pub const WIN: f32 = 1.0;
    pub const EXIT: f32 = 2.0;
    /// a = targets still to find
    pub const TARGETS_REMAINING: f32 = 3.0;
    /// a = sticker index
    pub const REWARD: f32 = 4.0;
    pub const REWARD_DONE: f32 = 5.0;
    /// The selection phrase is over; the host may start the level.
    pub const ANNOUNCED: f32 = 6.0;
}

/// A phrase the game waits on before moving on.
#[derive(Debug)]
enum Utterance {
    Playing(Completion),
    /// Waiting for the host to synthesize it.
    Fetching(SpeechId),
}

#[derive(Debug)]
enum Phase {
    Idle,
    Playing,
    Transitioning(Utterance),
    Reward { remaining: f32 },
}

pub struct BubblePop {
    phase: Phase,
    level: Option<LevelSpec>,
    pending_level: Option<LevelSpec>,
    bubbles: Vec<Bubble>,
    /// Popped distractors and their seconds left on screen.
    removals: Vec<(EntityId, f32)>,
    narration: NarrationCache,
    announcement: Option<Utterance>,
    phrasebook: Phrasebook,
    language: Language,
    sticker: Option<u32>,
}

impl BubblePop {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            level: None,
            pending_level: None,
            bubbles: Vec::new(),
            removals: Vec::new(),
            narration: NarrationCache::new(),
            announcement: None,
            phrasebook: Phrasebook::default(),
            language: Language::default(),
            sticker: None,
        }
    }

    fn phrases(&self) -> &Phrases {
        self.phrasebook.get(self.language)
    }

    /// Queue a level to start on the next update.
    pub fn request_level(&mut self, spec: LevelSpec) {
        self.pending_level = Some(spec);
    }

    /// Replace whatever is on screen with a fresh level.
    pub fn start_level(&mut self, ctx: &mut EngineContext, mut spec: LevelSpec) {
        if spec.target_count == 0 {
            log::warn!("level requested with no targets, using one");
            spec.target_count = 1;
        }

        ctx.audio.stop_all();
        if self.announcement.take().is_some() {
            log::debug!("level started over a pending announcement");
        }
        let win = self.phrases().win(&spec.target);
        let found_one = self.phrases().found_one(&spec.target);
        self.narration.prefetch(&mut ctx.speech, win, found_one);

        self.clear_bubbles(ctx);
        self.bubbles = spawn_level(ctx, &spec);
        log::info!(
            "level start: {:?} target {:?}, difficulty {}, {} bubbles",
            spec.category,
            spec.target,
            spec.difficulty,
            self.bubbles.len()
        );
        self.level = Some(spec);
        self.phase = Phase::Playing;
        self.sticker = None;
        self.emit_targets_remaining(ctx);
    }

    /// Leave the level: silence, drop narration, clear the screen.
    pub fn exit(&mut self, ctx: &mut EngineContext) {
        ctx.audio.stop_all();
        self.narration.invalidate();
        self.announcement = None;
        self.clear_bubbles(ctx);
        self.pending_level = None;
        self.level = None;
        self.sticker = None;
        self.phase = Phase::Idle;
        ctx.emit_event(GameEvent::new(game_events::EXIT));
    }

    /// Speak the "let's find" phrase for a symbol picked in the selector.
    /// `ANNOUNCED` follows once it has played or could not be played.
    /// A newer announcement replaces one still in flight.
    pub fn announce_selection(&mut self, ctx: &mut EngineContext, symbol: &str) -> SpeechId {
        let text = self.phrases().selected(symbol);
        let id = self.narration.speak(&mut ctx.speech, text, Purpose::Announce);
        self.announcement = Some(Utterance::Fetching(id));
        id
    }

    /// Still fetching or playing the selection phrase.
    pub fn is_announcing(&self) -> bool {
        self.announcement.is_some()
    }

    /// Replace the phrase tables from JSON. The old tables stay on error.
    pub fn load_phrases(&mut self, json: &str) -> Result<(), serde_json::Error> {
        self.phrasebook = Phrasebook::from_json(json)?;
        Ok(())
    }

    /// Switch narration language by code. Returns false for unknown codes.
    pub fn set_language(&mut self, code: &str) -> bool {
        match Language::from_code(code) {
            Some(language) => {
                self.language = language;
                true
            }
            None => {
                log::warn!("unsupported language {:?}", code);
                false
            }
        }
    }

    /// Pop a bubble. Returns false when the pop was ignored.
    pub fn pop(&mut self, ctx: &mut EngineContext, id: EntityId) -> bool {
        if !matches!(self.phase, Phase::Playing) {
            return false;
        }
        let Some(bubble) = self.bubbles.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        if bubble.is_popping {
            return false;
        }
        bubble.is_popping = true;
        let symbol = bubble.symbol.clone();
        let is_target = bubble.is_target;

        if let Some(entity) = ctx.scene.get_mut(id) {
            entity.active = false;
        }
        ctx.audio.play_celebration_sound();

        let target = self.level.as_ref().map(|l| l.target.clone()).unwrap_or_default();
        if is_target {
            let remaining = self.targets_remaining();
            self.emit_targets_remaining(ctx);
            if remaining == 0 {
                self.begin_win(ctx, &target);
            } else {
                self.found_one(ctx, &target);
            }
        } else {
            let text = self.phrases().incorrect(&symbol, &target);
            self.narration.speak(&mut ctx.speech, text, Purpose::Speak);
            self.removals.push((id, POP_REMOVAL_DELAY));
        }
        true
    }

    fn found_one(&mut self, ctx: &mut EngineContext, target: &str) {
        match self.narration.cached(Cue::FoundOne) {
            Some(buffer) => {
                ctx.audio.play_buffer(buffer, PlayMode::Immediate);
            }
            None => {
                let text = self.phrases().found_one(target);
                self.narration.speak(&mut ctx.speech, text, Purpose::Speak);
            }
        }
    }

    fn begin_win(&mut self, ctx: &mut EngineContext, target: &str) {
        ctx.audio.stop_all();
        let wait = match self.narration.cached(Cue::Win) {
            Some(buffer) => Utterance::Playing(ctx.audio.play_buffer(buffer, PlayMode::Immediate)),
            None => {
                if self.narration.is_loading(Cue::Win) {
                    log::debug!("win narration still loading, requesting it again");
                } else {
                    log::debug!("win narration unavailable, requesting it now");
                }
                let text = self.phrases().win(target);
                Utterance::Fetching(self.narration.speak(&mut ctx.speech, text, Purpose::WinFallback))
            }
        };
        self.phase = Phase::Transitioning(wait);
    }

    /// The level is won: tell the host, then show the reward.
    fn finish_level(&mut self, ctx: &mut EngineContext) {
        ctx.emit_event(GameEvent::new(game_events::WIN));
        self.clear_bubbles(ctx);

        ctx.audio.play_celebration_sound();
        let sticker = ctx.rng.next_int(STICKER_COUNT);
        self.sticker = Some(sticker);
        ctx.emit_event(GameEvent::new(game_events::REWARD).with_a(sticker as f32));
        self.phase = Phase::Reward {
            remaining: REWARD_DURATION,
        };
    }

    fn finish_reward(&mut self, ctx: &mut EngineContext) {
        self.phase = Phase::Idle;
        self.level = None;
        ctx.emit_event(GameEvent::new(game_events::REWARD_DONE));
    }

    fn handle_reply(&mut self, ctx: &mut EngineContext, resolved: Resolved) {
        match resolved.purpose {
            Purpose::Prefetch(_) => {}
            Purpose::Speak => {
                if let Some(buffer) = &resolved.buffer {
                    ctx.audio.play_buffer(buffer, PlayMode::Queued);
                }
            }
            Purpose::Announce => {
                let current = matches!(
                    &self.announcement,
                    Some(Utterance::Fetching(id)) if *id == resolved.id
                );
                if !current {
                    log::debug!("dropping superseded announcement {:?}", resolved.id);
                    return;
                }
                self.announcement = match &resolved.buffer {
                    Some(buffer) => Some(Utterance::Playing(
                        ctx.audio.play_buffer(buffer, PlayMode::Queued),
                    )),
                    None => {
                        ctx.emit_event(GameEvent::new(game_events::ANNOUNCED));
                        None
                    }
                };
            }
            Purpose::WinFallback => {
                let waiting = matches!(
                    &self.phase,
                    Phase::Transitioning(Utterance::Fetching(id)) if *id == resolved.id
                );
                if !waiting {
                    return;
                }
                match &resolved.buffer {
                    Some(buffer) => {
                        let done = ctx.audio.play_buffer(buffer, PlayMode::Queued);
                        self.phase = Phase::Transitioning(Utterance::Playing(done));
                    }
                    None => self.finish_level(ctx),
                }
            }
        }
    }

    fn handle_custom(&mut self, ctx: &mut EngineContext, kind: u32, a: f32, b: f32) {
        match kind {
            custom_events::CONTINUE => {
                if matches!(self.phase, Phase::Reward { .. }) {
                    self.finish_reward(ctx);
                }
            }
            custom_events::EXIT => self.exit(ctx),
            custom_events::RESIZE => ctx.resize(a, b),
            other => log::debug!("ignoring custom event {}", other),
        }
    }

    fn tick_removals(&mut self, ctx: &mut EngineContext, dt: f32) {
        let mut expired = Vec::new();
        self.removals.retain_mut(|(id, remaining)| {
            *remaining -= dt;
            if *remaining <= 0.0 {
                expired.push(*id);
                false
            } else {
                true
            }
        });
        for id in expired {
            ctx.despawn(id);
            self.bubbles.retain(|b| b.id != id);
        }
    }

    fn clear_bubbles(&mut self, ctx: &mut EngineContext) {
        ctx.scene.clear();
        self.bubbles.clear();
        self.removals.clear();
    }

    fn emit_targets_remaining(&self, ctx: &mut EngineContext) {
        let remaining = self.targets_remaining() as f32;
        ctx.emit_event(GameEvent::new(game_events::TARGETS_REMAINING).with_a(remaining));
    }

    /// Targets not yet popped.
    pub fn targets_remaining(&self) -> usize {
        self.bubbles.iter().filter(|b| b.is_target && !b.is_popping).count()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn sticker(&self) -> Option<u32> {
        self.sticker
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, Phase::Playing)
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning(_))
    }

    pub fn in_reward(&self) -> bool {
        matches!(self.phase, Phase::Reward { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Bubbles bottom to top as JSON, for drawing labels over the SDF layer.
    pub fn snapshot_json(&self, ctx: &EngineContext) -> String {
        let mut layers: Vec<(i16, BubbleSnapshot)> = self
            .bubbles
            .iter()
            .filter_map(|b| {
                let entity = ctx.scene.get(b.id)?;
                Some((
                    entity.z,
                    BubbleSnapshot {
                        id: b.id,
                        symbol: &b.symbol,
                        x: entity.pos.x,
                        y: entity.pos.y,
                        radius: entity.radius().unwrap_or(0.0),
                        color: b.color,
                        popping: b.is_popping,
                    },
                ))
            })
            .collect();
        layers.sort_by_key(|(z, _)| *z);
        let snapshots: Vec<BubbleSnapshot> = layers.into_iter().map(|(_, s)| s).collect();
        serde_json::to_string(&snapshots).unwrap_or_else(|err| {
            log::error!("failed to serialize bubbles: {}", err);
            "[]".to_string()
        })
    }
}

impl Default for BubblePop {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for BubblePop {
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    fn init(&mut self, _ctx: &mut EngineContext) {
        log::info!("bubble-pop ready, waiting for a level");
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        if let Some(spec) = self.pending_level.take() {
            self.start_level(ctx, spec);
        }

        for event in input.iter() {
            match *event {
                InputEvent::PointerDown { x, y } => {
                    if let Some(id) = pick_at(ctx.scene.iter(), Vec2::new(x, y)) {
                        self.pop(ctx, id);
                    }
                }
                InputEvent::Tap { id } => {
                    self.pop(ctx, id);
                }
                InputEvent::Custom { kind, a, b, .. } => self.handle_custom(ctx, kind, a, b),
            }
        }

        for reply in ctx.speech.drain_replies() {
            if let Some(resolved) = self.narration.resolve(reply, &mut ctx.audio) {
                self.handle_reply(ctx, resolved);
            }
        }

        let dt = ctx.fixed_dt;
        let bounds = ctx.bounds;
        integrate_bounded(ctx.scene.iter_mut(), bounds, dt);
        self.tick_removals(ctx, dt);

        let win_done = matches!(
            &self.phase,
            Phase::Transitioning(Utterance::Playing(done)) if !done.is_pending()
        );
        if win_done {
            self.finish_level(ctx);
        }

        let announced = matches!(
            &self.announcement,
            Some(Utterance::Playing(done)) if !done.is_pending()
        );
        if announced {
            self.announcement = None;
            ctx.emit_event(GameEvent::new(game_events::ANNOUNCED));
        }

        let reward_done = match &mut self.phase {
            Phase::Reward { remaining } => {
                *remaining -= dt;
                *remaining <= 0.0
            }
            _ => false,
        };
        if reward_done {
            self.finish_reward(ctx);
        }
    }
}
