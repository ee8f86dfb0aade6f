use wasm_bindgen::prelude::*;
use pop_engine::*;

mod bubbles;
mod game;
mod level;
mod narration;
mod phrases;

use game::BubblePop;
use level::{Category, LevelSpec};

pop_web::export_game!(BubblePop, "bubble-pop");

/// Start a level. `category` is "letters", "numbers" or "shapes".
#[wasm_bindgen]
pub fn game_start_level(category: &str, target: &str, difficulty: u32, target_count: u32) {
    let Some(category) = Category::parse(category) else {
        log::warn!("unknown category {:?}", category);
        return;
    };
    if target.is_empty() {
        log::warn!("level requested without a target symbol");
        return;
    }
    let spec = LevelSpec::new(category, target, difficulty, target_count);
    with_runner(|r| r.with_game(|g, _| g.request_level(spec)));
}

/// Speak the "let's find" phrase for a symbol picked on the selection screen.
/// Start the level once the `ANNOUNCED` game event arrives.
#[wasm_bindgen]
pub fn game_announce_selection(symbol: &str) {
    with_runner(|r| r.with_game(|g, ctx| {
        g.announce_selection(ctx, symbol);
    }));
}

/// Replace narration phrases from JSON. Returns false when the JSON is invalid.
#[wasm_bindgen]
pub fn game_load_phrases(json: &str) -> bool {
    with_runner(|r| r.with_game(|g, _| match g.load_phrases(json) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("invalid phrase table: {}", err);
            false
        }
    }))
}

#[wasm_bindgen]
pub fn game_set_language(code: &str) -> bool {
    with_runner(|r| r.with_game(|g, _| g.set_language(code)))
}

/// Reseed level generation, e.g. from `Date.now()`.
#[wasm_bindgen]
pub fn game_seed(seed: f64) {
    with_runner(|r| r.reseed(seed as u64));
}

/// Bubbles bottom to top: `[{id, symbol, x, y, radius, color, popping}]`.
#[wasm_bindgen]
pub fn get_bubbles_json() -> String {
    with_runner(|r| r.with_game(|g, ctx| g.snapshot_json(ctx)))
}
