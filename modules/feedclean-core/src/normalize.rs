// Author name and headline cleanup.
//
// Feed markup repeats the same visible string in several nested spans (one
// for sighted users, one for screen readers), so raw text often comes out
// doubled and decorated with connection degree, timestamps and badges.
// Both cleanups are ordered rule lists so each step can be tested alone.

use regex::Regex;
use std::sync::LazyLock;

static BULLET_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*•.*$").unwrap());
static DEGREE_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+(st|nd|rd|th)\b.*").unwrap());
static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static BULLETS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[·•]+").unwrap());
static SEGMENT_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[•·|\-–—]+\s").unwrap());
static DEGREE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+(st|nd|rd|th)\b").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\b\d+\s*(h|hour|hours|d|day|days|w|week|weeks|mo|month|months|y|year|years)\b|edited|visible to anyone|followers|connections)",
    )
    .unwrap()
});
static GENERIC_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|\b)(premium|influencer|opentowork|open to work)($|\b)").unwrap()
});

pub const MAX_ROLE_CHARS: usize = 160;
pub const ELLIPSIS: char = '…';

/// One step of a cleanup pipeline: `apply` runs only when `applies` holds.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&str) -> bool,
    pub apply: fn(&str) -> String,
}

impl Rule {
    pub fn run(&self, input: &str) -> String {
        if (self.applies)(input) {
            (self.apply)(input)
        } else {
            input.to_string()
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

pub fn run_rules(rules: &[Rule], input: &str) -> String {
    rules
        .iter()
        .fold(input.to_string(), |acc, rule| rule.run(&acc))
}

// --- shared helpers ---

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "AB AB" → "AB" when the string is two identical halves (the odd middle
/// character, usually the joining space, is ignored).
pub fn collapse_duplicate(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mid = chars.len() / 2;
    let first = &chars[..mid];
    let second = &chars[if chars.len() % 2 == 0 { mid } else { mid + 1 }..];
    if first == second {
        first.iter().collect::<String>().trim().to_string()
    } else {
        text.to_string()
    }
}

/// Truncate to `max` characters, appending an ellipsis when anything was cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push(ELLIPSIS);
    out
}

// --- name rules ---

fn always(_: &str) -> bool {
    true
}

fn trim(s: &str) -> String {
    s.trim().to_string()
}

fn has_bullet(s: &str) -> bool {
    s.contains('•')
}

fn strip_bullet_tail(s: &str) -> String {
    BULLET_TAIL_RE.replace(s, "").into_owned()
}

fn has_degree_tail(s: &str) -> bool {
    DEGREE_TAIL_RE.is_match(s)
}

fn strip_degree_tail(s: &str) -> String {
    DEGREE_TAIL_RE.replace(s, "").into_owned()
}

fn squeeze_spaces(s: &str) -> String {
    MULTI_SPACE_RE.replace_all(s, " ").trim().to_string()
}

fn has_repeated_tokens(s: &str) -> bool {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    let half = tokens.len() / 2;
    !tokens.is_empty() && tokens.len() % 2 == 0 && tokens[..half] == tokens[half..]
}

fn keep_first_token_half(s: &str) -> String {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    tokens[..tokens.len() / 2].join(" ")
}

fn compact(s: &str) -> Vec<char> {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_self_concatenated(s: &str) -> bool {
    let chars = compact(s);
    let half = chars.len() / 2;
    !chars.is_empty() && chars.len() % 2 == 0 && chars[..half] == chars[half..]
}

/// Keep the first half of the non-whitespace characters, preserving the
/// spacing the original string had within that half.
fn keep_first_char_half(s: &str) -> String {
    let mut remaining = compact(s).len() / 2;
    let mut out = String::new();
    for c in s.chars() {
        if remaining == 0 {
            break;
        }
        if !c.is_whitespace() {
            remaining -= 1;
        }
        out.push(c);
    }
    out.trim().to_string()
}

fn has_repeated_halves(s: &str) -> bool {
    has_repeated_tokens(s) || is_self_concatenated(s)
}

/// Token halves win outright. A self-concatenated string keeps the first half
/// of its tokens when that half spells the first half of the characters, and
/// falls back to counting characters otherwise.
fn keep_first_half(s: &str) -> String {
    if has_repeated_tokens(s) {
        return keep_first_token_half(s);
    }
    if s.split_whitespace().count() % 2 == 0 {
        let rebuilt = keep_first_token_half(s);
        let chars = compact(s);
        if compact(&rebuilt)[..] == chars[..chars.len() / 2] {
            return rebuilt;
        }
    }
    keep_first_char_half(s)
}

pub const NAME_RULES: &[Rule] = &[
    Rule {
        name: "trim",
        applies: always,
        apply: trim,
    },
    Rule {
        name: "bullet-tail",
        applies: has_bullet,
        apply: strip_bullet_tail,
    },
    Rule {
        name: "connection-degree",
        applies: has_degree_tail,
        apply: strip_degree_tail,
    },
    Rule {
        name: "squeeze-spaces",
        applies: always,
        apply: squeeze_spaces,
    },
    Rule {
        name: "repeated-halves",
        applies: has_repeated_halves,
        apply: keep_first_half,
    },
    Rule {
        name: "trim",
        applies: always,
        apply: trim,
    },
];

pub fn normalize_name(raw: &str) -> String {
    run_rules(NAME_RULES, raw)
}

// --- role rules ---

/// Drops a headline segment that is not really part of the author's role.
#[derive(Clone, Copy)]
pub struct SegmentFilter {
    pub name: &'static str,
    pub drops: fn(segment: &str, author: &str) -> bool,
}

impl std::fmt::Debug for SegmentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentFilter").field("name", &self.name).finish()
    }
}

fn mentions_author(segment: &str, author: &str) -> bool {
    !author.is_empty() && segment.to_lowercase().contains(&author.to_lowercase())
}

fn is_connection_degree(segment: &str, _: &str) -> bool {
    DEGREE_RE.is_match(segment)
}

fn is_post_metadata(segment: &str, _: &str) -> bool {
    META_RE.is_match(segment)
}

fn is_generic_tag(segment: &str, _: &str) -> bool {
    GENERIC_TAG_RE.is_match(segment)
}

pub const ROLE_SEGMENT_FILTERS: &[SegmentFilter] = &[
    SegmentFilter {
        name: "author-name",
        drops: mentions_author,
    },
    SegmentFilter {
        name: "connection-degree",
        drops: is_connection_degree,
    },
    SegmentFilter {
        name: "post-metadata",
        drops: is_post_metadata,
    },
    SegmentFilter {
        name: "generic-tag",
        drops: is_generic_tag,
    },
];

fn normalize_bullets(s: &str) -> String {
    let squeezed = MULTI_SPACE_RE.replace_all(s.trim(), " ");
    BULLETS_RE.replace_all(&squeezed, " • ").trim().to_string()
}

/// Split on bullet/pipe/dash separators, then on sentence boundaries
/// (a period followed by whitespace or an uppercase letter).
pub fn role_segments(s: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for piece in SEGMENT_SPLIT_RE.split(s) {
        let mut start = 0;
        let mut chars = piece.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let boundary = c == '.'
                && chars
                    .peek()
                    .is_some_and(|&(_, next)| next.is_whitespace() || next.is_ascii_uppercase());
            if boundary {
                segments.push(piece[start..i].to_string());
                start = i + c.len_utf8();
            }
        }
        segments.push(piece[start..].to_string());
    }
    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn normalize_role(raw: &str, author: &str) -> String {
    let normalized = normalize_bullets(raw);
    if normalized.is_empty() {
        return String::new();
    }

    let mut seen: Vec<String> = Vec::new();
    let mut kept: Vec<String> = Vec::new();
    for segment in role_segments(&normalized) {
        if ROLE_SEGMENT_FILTERS
            .iter()
            .any(|f| (f.drops)(&segment, author))
        {
            continue;
        }
        let segment = collapse_duplicate(&squeeze_spaces(&segment));
        if segment.is_empty() {
            continue;
        }
        let key = segment.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        kept.push(segment);
    }

    truncate_chars(&kept.join(", "), MAX_ROLE_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_name_tokens_collapse() {
        assert_eq!(normalize_name("John Doe John Doe"), "John Doe");
    }

    #[test]
    fn test_bullet_and_degree_removed() {
        assert_eq!(normalize_name("Jane Smith • 2nd"), "Jane Smith");
        assert_eq!(normalize_name("  Jane Smith 3rd+ degree connection"), "Jane Smith");
    }

    #[test]
    fn test_self_concatenated_name_keeps_spacing() {
        assert_eq!(normalize_name("John DoeJohn Doe"), "John Doe");
        assert_eq!(normalize_name("JohnDoeJohnDoe"), "JohnDoe");
        assert_eq!(normalize_name("Mary AnnMary Ann"), "Mary Ann");
    }

    #[test]
    fn test_repeated_halves_collapse_once() {
        // The token halves are taken as the name; they are not collapsed again.
        assert_eq!(normalize_name("Bo Bo Bo Bo"), "Bo Bo");
        assert_eq!(normalize_name("Ja ne Ja ne"), "Ja ne");
    }

    #[test]
    fn test_plain_name_untouched() {
        assert_eq!(normalize_name("Ada   Lovelace"), "Ada Lovelace");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_each_name_rule_in_isolation() {
        let rule = |name: &str| {
            *NAME_RULES
                .iter()
                .find(|r| r.name == name)
                .expect("rule exists")
        };
        assert_eq!(rule("bullet-tail").run("Jane • Follow"), "Jane");
        assert_eq!(rule("bullet-tail").run("Jane"), "Jane");
        assert_eq!(rule("connection-degree").run("Jane 1st"), "Jane");
        assert_eq!(rule("repeated-halves").run("A B C"), "A B C");
        assert_eq!(rule("repeated-halves").run("Bo Bo"), "Bo");
        assert_eq!(rule("repeated-halves").run("Ab cA b c"), "Ab c");
    }

    #[test]
    fn test_role_duplicates_and_degree_removed() {
        assert_eq!(normalize_role("Engineer • Engineer • 3rd", "Jane"), "Engineer");
    }

    #[test]
    fn test_role_drops_metadata_and_author() {
        let raw = "Staff Engineer at Acme | Rust · Jane Smith · 3rd+ · 2d · Edited · Visible to anyone";
        assert_eq!(normalize_role(raw, "Jane Smith"), "Staff Engineer at Acme, Rust");
    }

    #[test]
    fn test_role_drops_generic_tags_and_reach() {
        let raw = "Premium • Founder @ Tiny Co • 12,400 followers";
        assert_eq!(normalize_role(raw, ""), "Founder @ Tiny Co");
        assert_eq!(normalize_role("#OpenToWork - Data Analyst", ""), "Data Analyst");
    }

    #[test]
    fn test_role_doubled_segment_collapses() {
        assert_eq!(
            normalize_role("Product Designer Product Designer", ""),
            "Product Designer"
        );
    }

    #[test]
    fn test_role_case_insensitive_dedup_keeps_first() {
        assert_eq!(normalize_role("CTO | cto | Advisor", ""), "CTO, Advisor");
    }

    #[test]
    fn test_role_sentence_split() {
        assert_eq!(
            role_segments("Building tools.Helping teams. Speaker"),
            vec!["Building tools", "Helping teams", "Speaker"]
        );
        assert_eq!(role_segments("Ph.d candidate"), vec!["Ph.d candidate"]);
    }

    #[test]
    fn test_role_hyphenated_words_survive() {
        assert_eq!(normalize_role("Co-founder - Acme", ""), "Co-founder, Acme");
    }

    #[test]
    fn test_role_truncated_with_ellipsis() {
        let raw = (0..60)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let role = normalize_role(&raw, "");
        assert_eq!(role.chars().count(), MAX_ROLE_CHARS + 1);
        assert!(role.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_collapse_duplicate_odd_length() {
        assert_eq!(collapse_duplicate("Engineer Engineer"), "Engineer");
        assert_eq!(collapse_duplicate("Engineer"), "Engineer");
    }
}
