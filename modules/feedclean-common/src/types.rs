use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Classification ---

/// Closed set of content categories. Six come from the oracle; `Muted` is
/// assigned locally when a mute term matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Promotional,
    EngagementBait,
    Entertainment,
    Activity,
    Suggestion,
    Muted,
    Normal,
}

impl Category {
    /// Labeling priority, highest first.
    pub const PRECEDENCE: [Category; 7] = [
        Category::Promotional,
        Category::EngagementBait,
        Category::Entertainment,
        Category::Activity,
        Category::Suggestion,
        Category::Muted,
        Category::Normal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Promotional => "promotional",
            Category::EngagementBait => "engagement_bait",
            Category::Entertainment => "entertainment",
            Category::Activity => "activity",
            Category::Suggestion => "suggestion",
            Category::Muted => "muted",
            Category::Normal => "normal",
        }
    }

    /// Position in [`Category::PRECEDENCE`]; lower wins.
    pub fn precedence(&self) -> usize {
        Self::PRECEDENCE
            .iter()
            .position(|c| c == self)
            .unwrap_or(Self::PRECEDENCE.len())
    }

    /// Lenient parse of an oracle label. Combined labels such as
    /// `"activity, promotional"` resolve to the highest-precedence member;
    /// anything unrecognized reads as `Normal`.
    pub fn from_label(label: &str) -> Self {
        if let Ok(category) = label.parse() {
            return category;
        }
        label
            .split(|c: char| c == ',' || c == '|' || c == '/' || c.is_whitespace())
            .filter_map(|part| part.parse::<Category>().ok())
            .min_by_key(Category::precedence)
            .unwrap_or(Category::Normal)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "promotional" => Ok(Category::Promotional),
            "engagement_bait" => Ok(Category::EngagementBait),
            "entertainment" => Ok(Category::Entertainment),
            "activity" => Ok(Category::Activity),
            "suggestion" => Ok(Category::Suggestion),
            "muted" => Ok(Category::Muted),
            "normal" => Ok(Category::Normal),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

pub const MAX_SCORE: u8 = 10;

/// Score for anything the oracle did not judge (no key, rate limited, error).
pub const FALLBACK_SCORE: u8 = 8;

/// An informativeness judgment. `score` is always within 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    score: u8,
    category: Category,
}

impl ClassificationResult {
    /// Build a result, clamping `score` into 0..=10.
    pub fn new(score: i64, category: Category) -> Self {
        Self {
            score: score.clamp(0, MAX_SCORE as i64) as u8,
            category,
        }
    }

    /// The permissive default every failure path collapses to.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_SCORE as i64, Category::Normal)
    }

    pub fn muted() -> Self {
        Self::new(0, Category::Muted)
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

// --- Items ---

/// Lifecycle of a located item. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Discovered,
    Extracted,
    Muted,
    Classified,
    Hidden,
    Blurred,
    Visible,
}

impl ItemState {
    fn rank(&self) -> u8 {
        match self {
            ItemState::Discovered => 0,
            ItemState::Extracted => 1,
            ItemState::Muted | ItemState::Classified => 2,
            ItemState::Hidden | ItemState::Blurred | ItemState::Visible => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 3
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: ItemState) -> bool {
        next.rank() > self.rank()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
}

pub const UNKNOWN_AUTHOR: &str = "Unknown";

impl Author {
    /// Name shown to the viewer and sent to the oracle.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            UNKNOWN_AUTHOR
        } else {
            &self.name
        }
    }
}

/// One logical feed post. `handle` is borrowed from the document tree and is
/// only meaningful while that tree is alive.
#[derive(Debug, Clone)]
pub struct ContentItem<H> {
    pub identity: String,
    pub handle: H,
    pub text: String,
    pub author: Author,
    pub state: ItemState,
}

impl<H> ContentItem<H> {
    pub fn discovered(identity: String, handle: H) -> Self {
        Self {
            identity,
            handle,
            text: String::new(),
            author: Author::default(),
            state: ItemState::Discovered,
        }
    }

    /// Move to `next`, ignoring backwards transitions.
    pub fn advance(&mut self, next: ItemState) -> bool {
        if self.state.can_advance_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}

// --- Presentation ---

/// How a low-value item is concealed. One global mode per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Hide,
    Blur,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Hide => "hide",
            FilterMode::Blur => "blur",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hide" => Ok(FilterMode::Hide),
            "blur" => Ok(FilterMode::Blur),
            other => Err(format!("unknown filter mode: {other}")),
        }
    }
}
