use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
pub const MAX_SUGGESTIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Focus,
    SelfCare,
    MicroStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub id: &'static str,
    pub label: &'static str,
    pub why: &'static str,
    pub est_min: u32,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotNow {
    pub message: &'static str,
    pub alternative: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionContext {
    pub greeting: &'static str,
    pub encouragement: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<Suggestion>,
    pub not_now: NotNow,
    pub context: SuggestionContext,
}

/// Raw request body. Ratings stay optional so a missing field can be
/// reported as a 400 rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionRequest {
    pub mood: Option<i64>,
    pub energy: Option<i64>,
    pub focus: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratings {
    pub mood: i64,
    pub energy: i64,
    pub focus: i64,
}

impl Ratings {
    pub fn average(&self) -> f64 {
        (self.mood + self.energy + self.focus) as f64 / 3.0
    }
}

pub const MISSING_RATINGS: &str = "Missing required check-in data";
pub const RATINGS_OUT_OF_RANGE: &str = "Ratings must be between 1 and 5";

impl SuggestionRequest {
    pub fn validate(&self) -> AppResult<Ratings> {
        let (Some(mood), Some(energy), Some(focus)) = (self.mood, self.energy, self.focus) else {
            return Err(AppError::Validation(MISSING_RATINGS.to_string()));
        };

        if [mood, energy, focus]
            .iter()
            .any(|value| !(MIN_RATING..=MAX_RATING).contains(value))
        {
            return Err(AppError::Validation(RATINGS_OUT_OF_RANGE.to_string()));
        }

        Ok(Ratings {
            mood,
            energy,
            focus,
        })
    }
}

pub const NOT_NOW: NotNow = NotNow {
    message: "That's okay too. You can come back when you're ready.",
    alternative: "Would you like to just set a gentle reminder for later?",
};

static CRISIS_SUPPORT: [Suggestion; 1] = [Suggestion {
    id: "crisis-support",
    label: "Consider reaching out for support",
    why: "You don't have to handle everything alone",
    est_min: 0,
    kind: SuggestionKind::SelfCare,
}];

static LOW_MOOD_LOW_ENERGY: [Suggestion; 2] = [
    Suggestion {
        id: "gentle-start",
        label: "Take 5 minutes to organize your space",
        why: "Small actions can help you feel more in control",
        est_min: 5,
        kind: SuggestionKind::MicroStep,
    },
    Suggestion {
        id: "self-care",
        label: "Try a brief breathing exercise",
        why: "This can help ground you in the present moment",
        est_min: 3,
        kind: SuggestionKind::SelfCare,
    },
];

static LOW_FOCUS: [Suggestion; 2] = [
    Suggestion {
        id: "micro-focus",
        label: "Set a 10-minute timer for one small task",
        why: "Short bursts can be easier when focus is challenging",
        est_min: 10,
        kind: SuggestionKind::Focus,
    },
    Suggestion {
        id: "break-first",
        label: "Take a short walk, then try 15 minutes of work",
        why: "Movement can help improve focus and energy",
        est_min: 20,
        kind: SuggestionKind::SelfCare,
    },
];

static GOOD_ENERGY: [Suggestion; 2] = [
    Suggestion {
        id: "momentum",
        label: "Pick your most important task and work for 25 minutes",
        why: "You have good energy right now - use it wisely",
        est_min: 25,
        kind: SuggestionKind::Focus,
    },
    Suggestion {
        id: "prep-tomorrow",
        label: "Spend 10 minutes planning tomorrow",
        why: "Set yourself up for success when energy is available",
        est_min: 10,
        kind: SuggestionKind::MicroStep,
    },
];

static BALANCED: [Suggestion; 2] = [
    Suggestion {
        id: "focused-work",
        label: "Work on your top priority for 20 minutes",
        why: "You seem centered - a good time for focused work",
        est_min: 20,
        kind: SuggestionKind::Focus,
    },
    Suggestion {
        id: "maintain-momentum",
        label: "Complete one small task to build momentum",
        why: "Small wins can carry you through the day",
        est_min: 15,
        kind: SuggestionKind::MicroStep,
    },
];

pub fn select_suggestions(ratings: &Ratings) -> Vec<Suggestion> {
    let Ratings {
        mood,
        energy,
        focus,
    } = *ratings;

    let bucket: &[Suggestion] = if mood == 1 && energy == 1 {
        &CRISIS_SUPPORT
    } else if mood <= 2 && energy <= 2 {
        &LOW_MOOD_LOW_ENERGY
    } else if focus <= 2 {
        &LOW_FOCUS
    } else if energy >= 4 {
        &GOOD_ENERGY
    } else {
        &BALANCED
    };

    bucket.iter().take(MAX_SUGGESTIONS).cloned().collect()
}

pub fn greeting(ratings: &Ratings) -> &'static str {
    let avg = ratings.average();
    if avg <= 2.0 {
        "Thank you for checking in, especially when things feel hard."
    } else if avg <= 3.5 {
        "I see where you're at right now. Let's find something that feels manageable."
    } else {
        "You're feeling pretty good today. Let's make the most of it."
    }
}

pub fn encouragement(ratings: &Ratings) -> &'static str {
    if ratings.mood <= 2 {
        "Remember, small steps count. You don't need to do everything today."
    } else if ratings.focus <= 2 {
        "When focus is challenging, shorter sessions often work better."
    } else if ratings.energy >= 4 {
        "Your energy is strong today. Use it in a way that feels sustainable."
    } else {
        "You're building momentum one small action at a time."
    }
}

pub fn build_response(ratings: &Ratings) -> SuggestionResponse {
    SuggestionResponse {
        suggestions: select_suggestions(ratings),
        not_now: NOT_NOW,
        context: SuggestionContext {
            greeting: greeting(ratings),
            encouragement: encouragement(ratings),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

static QUOTES: [Quote; 7] = [
    Quote {
        text: "Progress is not about perfection, it's about direction.",
        author: "Anonymous",
    },
    Quote {
        text: "Small steps in the right direction can turn out to be the biggest step of your life.",
        author: "Naeem Callaway",
    },
    Quote {
        text: "You are braver than you believe, stronger than you seem, and smarter than you think.",
        author: "A.A. Milne",
    },
    Quote {
        text: "The only way to make sense out of change is to plunge into it, move with it, and join the dance.",
        author: "Alan Watts",
    },
    Quote {
        text: "Be patient with yourself. Nothing in nature blooms all year.",
        author: "Anonymous",
    },
    Quote {
        text: "Your current situation is not your final destination. The best is yet to come.",
        author: "Anonymous",
    },
    Quote {
        text: "Growth begins at the end of your comfort zone.",
        author: "Neale Donald Walsch",
    },
];

/// Rotates through the quote list once per calendar day.
pub fn daily_quote(date: NaiveDate) -> Quote {
    QUOTES[date.ordinal() as usize % QUOTES.len()]
}
