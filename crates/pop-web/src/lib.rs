pub mod runner;
pub mod web_audio;

pub use js_sys;
pub use runner::GameRunner;
pub use web_audio::WebAudioOutput;

/// Generate the `#[wasm_bindgen]` exports shared by every game.
///
/// Generates:
/// - `thread_local!` storage for the GameRunner (audio goes through `WebAudioOutput`)
/// - a `with_runner()` helper the game crate can use for its own exports
/// - lifecycle, input, speech and buffer accessor exports
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
/// use pop_engine::*;
///
/// mod game;
/// use game::MyGame;
///
/// pop_web::export_game!(MyGame, "my-game");
/// ```
///
/// `$game_type` must implement `pop_engine::Game` and have a `new()` constructor.
#[macro_export]
macro_rules! export_game {
    ($game_type:ty, $game_name:literal) => {
        use std::cell::RefCell;

        thread_local! {
            static RUNNER: RefCell<Option<$crate::GameRunner<$game_type>>> = RefCell::new(None);
        }

        fn with_runner<R>(f: impl FnOnce(&mut $crate::GameRunner<$game_type>) -> R) -> R {
            RUNNER.with(|cell| {
                let mut borrow = cell.borrow_mut();
                let runner = borrow.as_mut().expect("Game not initialized. Call game_init() first.");
                f(runner)
            })
        }

        #[wasm_bindgen]
        pub fn game_init() {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let game = <$game_type>::new();
            let runner = $crate::GameRunner::new(game, $crate::WebAudioOutput::factory());

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });

            with_runner(|r| {
                r.init();
                // Fresh layouts per session; game_seed can pin it afterwards.
                r.reseed($crate::js_sys::Date::now() as u64);
            });
            log::info!("{}: initialized", $game_name);
        }

        #[wasm_bindgen]
        pub fn game_tick(dt: f32) {
            with_runner(|r| r.tick(dt));
        }

        #[wasm_bindgen]
        pub fn game_pointer_down(x: f32, y: f32) {
            with_runner(|r| r.push_input(InputEvent::PointerDown { x, y }));
        }

        #[wasm_bindgen]
        pub fn game_pop(id: u32) {
            with_runner(|r| r.push_input(InputEvent::Tap { id: EntityId(id) }));
        }

        #[wasm_bindgen]
        pub fn game_custom_event(kind: u32, a: f32, b: f32, c: f32) {
            with_runner(|r| r.push_input(InputEvent::Custom { kind, a, b, c }));
        }

        /// Call from a user gesture so the browser lets audio start.
        #[wasm_bindgen]
        pub fn game_resume_audio() {
            with_runner(|r| r.resume_audio());
        }

        // ---- Speech ----

        #[wasm_bindgen]
        pub fn get_speech_requests() -> String {
            with_runner(|r| r.speech_requests_json())
        }

        #[wasm_bindgen]
        pub fn game_speech_audio(id: u32, pcm_base64: String) {
            with_runner(|r| {
                r.push_speech_reply(SpeechReply::Audio {
                    id: SpeechId(id),
                    pcm_base64,
                })
            });
        }

        #[wasm_bindgen]
        pub fn game_speech_failed(id: u32) {
            with_runner(|r| r.push_speech_reply(SpeechReply::Failed { id: SpeechId(id) }));
        }

        // ---- Data accessors ----

        #[wasm_bindgen]
        pub fn get_header_ptr() -> *const f32 {
            with_runner(|r| r.header_ptr())
        }

        #[wasm_bindgen]
        pub fn get_sdf_instances_ptr() -> *const f32 {
            with_runner(|r| r.sdf_instances_ptr())
        }

        #[wasm_bindgen]
        pub fn get_sdf_instance_count() -> u32 {
            with_runner(|r| r.sdf_instance_count())
        }

        #[wasm_bindgen]
        pub fn get_game_events_ptr() -> *const f32 {
            with_runner(|r| r.game_events_ptr())
        }

        #[wasm_bindgen]
        pub fn get_game_events_len() -> u32 {
            with_runner(|r| r.game_events_len())
        }

        #[wasm_bindgen]
        pub fn get_world_width() -> f32 {
            with_runner(|r| r.world_width())
        }

        #[wasm_bindgen]
        pub fn get_world_height() -> f32 {
            with_runner(|r| r.world_height())
        }

        // ---- Capacity accessors ----

        #[wasm_bindgen]
        pub fn get_max_sdf_instances() -> u32 {
            with_runner(|r| r.max_sdf_instances())
        }

        #[wasm_bindgen]
        pub fn get_max_events() -> u32 {
            with_runner(|r| r.max_events())
        }

        #[wasm_bindgen]
        pub fn get_buffer_total_floats() -> u32 {
            with_runner(|r| r.buffer_total_floats())
        }
    };
}
