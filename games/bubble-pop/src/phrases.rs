//! Narration text per language. Templates use `{target}` and `{symbol}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    German,
}

impl Language {
    /// Accepts "en", "de" and region variants like "de-AT".
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Language::English),
            "de" => Some(Language::German),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrases {
    pub win: String,
    pub found_one: String,
    pub incorrect: String,
    pub selected: String,
}

fn fill(template: &str, symbol: &str, target: &str) -> String {
    template.replace("{symbol}", symbol).replace("{target}", target)
}

impl Phrases {
    pub fn english() -> Self {
        Self {
            win: "Hooray! You found all the {target}! Great job!".into(),
            found_one: "You found a {target}! Keep going!".into(),
            incorrect: "Oops, that is {symbol}. Can you find {target}?".into(),
            selected: "Let's find {symbol}!".into(),
        }
    }

    pub fn german() -> Self {
        Self {
            win: "Juhu! Du hast alle {target} gefunden! Super gemacht!".into(),
            found_one: "Du hast ein {target} gefunden! Weiter so!".into(),
            incorrect: "Hoppla, das ist {symbol}. Findest du {target}?".into(),
            selected: "Lass uns {symbol} finden!".into(),
        }
    }

    pub fn win(&self, target: &str) -> String {
        fill(&self.win, target, target)
    }

    pub fn found_one(&self, target: &str) -> String {
        fill(&self.found_one, target, target)
    }

    pub fn incorrect(&self, symbol: &str, target: &str) -> String {
        fill(&self.incorrect, symbol, target)
    }

    pub fn selected(&self, symbol: &str) -> String {
        fill(&self.selected, symbol, symbol)
    }
}

/// Phrases for every supported language. Missing languages in JSON fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrasebook {
    #[serde(default = "Phrases::english")]
    pub en: Phrases,
    #[serde(default = "Phrases::german")]
    pub de: Phrases,
}

impl Default for Phrasebook {
    fn default() -> Self {
        Self {
            en: Phrases::english(),
            de: Phrases::german(),
        }
    }
}

impl Phrasebook {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn get(&self, language: Language) -> &Phrases {
        match language {
            Language::English => &self.en,
            Language::German => &self.de,
        }
    }
}
