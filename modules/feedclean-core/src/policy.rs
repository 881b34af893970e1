use feedclean_common::{Category, ClassificationResult, MAX_SCORE};
use serde::Serialize;

/// Lowest score that stays visible.
pub const BADGE_THRESHOLD: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    Hide(HideReason),
    Badge { score: u8 },
}

impl Decision {
    pub fn is_hide(&self) -> bool {
        matches!(self, Decision::Hide(_))
    }
}

/// Why an item is concealed, as shown on its indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HideReason {
    pub category: Category,
    pub score: u8,
    /// Set only when the mute list matched, not for an oracle `muted` label.
    pub mute_match: bool,
}

impl HideReason {
    pub fn muted() -> Self {
        Self {
            category: Category::Muted,
            score: 0,
            mute_match: true,
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self.category {
            Category::Promotional => "Promotional content",
            Category::EngagementBait => "Engagement bait",
            Category::Entertainment => "Entertainment only",
            Category::Activity => "Activity post",
            Category::Suggestion => "People suggestion",
            Category::Muted => "Contains muted words",
            Category::Normal => "Low informativeness",
        }
    }

    pub fn score_label(&self) -> String {
        if self.mute_match {
            "Muted".to_string()
        } else {
            format!("{}/{MAX_SCORE}", self.score)
        }
    }

    /// `"Promotional content (0/10)"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.explanation(), self.score_label())
    }
}

pub fn decide(muted: bool, result: &ClassificationResult) -> Decision {
    if muted {
        return Decision::Hide(HideReason::muted());
    }
    let score = result.score();
    if score == 0 || score < BADGE_THRESHOLD {
        return Decision::Hide(HideReason {
            category: result.category(),
            score,
            mute_match: false,
        });
    }
    Decision::Badge { score }
}
