//! Level data: category symbol pools, the level request, and difficulty scaling.

use glam::Vec2;
use serde::{Deserialize, Serialize};

const LETTERS: [&str; 26] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
    "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
];
const NUMBERS: [&str; 10] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];
const SHAPES: [&str; 6] = ["circle", "square", "triangle", "star", "heart", "diamond"];

/// Most distractors a level will ever spawn.
pub const MAX_DISTRACTORS: u32 = 10;

/// Bubble speed per axis at difficulty 0, in units per second (1.2 px per 60 Hz frame).
const BASE_SPEED: f32 = 1.2 * 60.0;
/// Extra speed per difficulty step.
const SPEED_PER_LEVEL: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Letters,
    Numbers,
    Shapes,
}

impl Category {
    /// Parse a host-supplied name ("letters", "NUMBERS", ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "letters" => Some(Category::Letters),
            "numbers" => Some(Category::Numbers),
            "shapes" => Some(Category::Shapes),
            _ => None,
        }
    }

    pub fn pool(self) -> &'static [&'static str] {
        match self {
            Category::Letters => &LETTERS,
            Category::Numbers => &NUMBERS,
            Category::Shapes => &SHAPES,
        }
    }

    /// Symbols a distractor may show: the pool without the target.
    pub fn distractor_pool(self, target: &str) -> Vec<&'static str> {
        self.pool().iter().copied().filter(|s| *s != target).collect()
    }
}

/// What the host asked for when starting a level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSpec {
    pub category: Category,
    pub target: String,
    pub difficulty: u32,
    pub target_count: u32,
}

impl LevelSpec {
    pub fn new(category: Category, target: impl Into<String>, difficulty: u32, target_count: u32) -> Self {
        Self {
            category,
            target: target.into(),
            difficulty,
            target_count,
        }
    }

    pub fn distractor_count(&self) -> u32 {
        distractor_count(self.difficulty)
    }

    /// Maximum speed magnitude per axis, before the random factor in [-0.5, 0.5).
    pub fn speed(&self) -> f32 {
        BASE_SPEED + SPEED_PER_LEVEL * self.difficulty as f32
    }
}

/// Bubble diameters for a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    pub target: f32,
    pub distractor: f32,
}

/// A fifth of the short side is the base size. Targets are larger at the
/// easy difficulties so small hands can hit them.
pub fn sizing(viewport: Vec2, difficulty: u32) -> Sizing {
    let base = viewport.x.min(viewport.y) / 5.0;
    let scale = match difficulty {
        1 => 1.8,
        2 => 1.4,
        _ => 1.1,
    };
    Sizing {
        target: base * scale,
        distractor: base,
    }
}

pub fn distractor_count(difficulty: u32) -> u32 {
    difficulty.saturating_mul(2).saturating_add(2).min(MAX_DISTRACTORS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distractors_grow_with_difficulty_and_cap() {
        assert_eq!(distractor_count(0), 2);
        assert_eq!(distractor_count(1), 4);
        assert_eq!(distractor_count(3), 8);
        assert_eq!(distractor_count(4), 10);
        assert_eq!(distractor_count(50), 10);
        assert_eq!(distractor_count(u32::MAX), 10);
    }

    #[test]
    fn target_scale_by_difficulty() {
        let viewport = Vec2::new(1000.0, 500.0);
        let easy = sizing(viewport, 1);
        assert_eq!(easy.distractor, 100.0);
        assert!((easy.target - 180.0).abs() < 1e-3);
        assert!((sizing(viewport, 2).target - 140.0).abs() < 1e-3);
        assert!((sizing(viewport, 0).target - 110.0).abs() < 1e-3);
        assert!((sizing(viewport, 3).target - 110.0).abs() < 1e-3);
    }

    #[test]
    fn distractor_pool_excludes_target() {
        let pool = Category::Numbers.distractor_pool("5");
        assert_eq!(pool.len(), 9);
        assert!(!pool.contains(&"5"));
        assert!(pool.contains(&"10"));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Category::parse("NUMBERS"), Some(Category::Numbers));
        assert_eq!(Category::parse(" shapes "), Some(Category::Shapes));
        assert_eq!(Category::parse("colours"), None);
    }

    #[test]
    fn speed_scales_per_frame_rate() {
        assert!((LevelSpec::new(Category::Letters, "A", 0, 1).speed() - 72.0).abs() < 1e-3);
        assert!((LevelSpec::new(Category::Letters, "A", 2, 1).speed() - 192.0).abs() < 1e-3);
    }
}
