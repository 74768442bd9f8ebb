//! Value-list grammars tried in order over a `TOP_VALUES` section.
//!
//! Each grammar either yields at least one cleaned item or reports no match;
//! the extractor stops at the first grammar that matches.

use once_cell::sync::Lazy;
use regex::Regex;

use super::response::MAX_SELECTED_VALUES;

/// A single strategy for splitting a values section into items.
pub trait ValueListGrammar: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the cleaned, non-empty items, or `None` when this grammar does not apply.
    fn parse(&self, section: &str) -> Option<Vec<String>>;
}

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s*(.*)$").expect("numbered item regex"));
static BULLET_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-•*]\s*(.*)$").expect("bullet item regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Collapse whitespace runs, trim, and drop enclosing brackets and markdown
/// emphasis.
pub fn clean_value(raw: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(raw, " ");
    collapsed
        .trim()
        .trim_matches(|c: char| c == '[' || c == ']' || c == '*' || c.is_whitespace())
        .to_string()
}

fn finish(items: Vec<String>) -> Option<Vec<String>> {
    let cleaned: Vec<String> = items
        .iter()
        .map(|s| clean_value(s))
        .filter(|s| !s.is_empty())
        .take(MAX_SELECTED_VALUES)
        .collect();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Marker-led list where items may wrap onto following lines.
///
/// A line matching `item` opens a new entry, a line matching `closer` or a
/// blank line ends the open entry, and any other line continues it.
fn parse_marked_list(section: &str, item: &Regex, closer: Option<&Regex>) -> Option<Vec<String>> {
    let mut items: Vec<String> = Vec::new();
    let mut open = false;
    for line in section.lines() {
        if let Some(caps) = item.captures(line) {
            items.push(caps[1].to_string());
            open = true;
        } else if line.trim().is_empty() || closer.is_some_and(|c| c.is_match(line)) {
            open = false;
        } else if open && let Some(last) = items.last_mut() {
            last.push(' ');
            last.push_str(line.trim());
        }
    }
    finish(items)
}

/// `1. Family Harmony` / `2) Duty`
pub struct NumberedList;

impl ValueListGrammar for NumberedList {
    fn name(&self) -> &'static str {
        "numbered"
    }

    fn parse(&self, section: &str) -> Option<Vec<String>> {
        parse_marked_list(section, &NUMBERED_ITEM, Some(&*BULLET_ITEM))
    }
}

/// `- Family Harmony`, `• Duty`, `* Consensus`
pub struct BulletedList;

impl ValueListGrammar for BulletedList {
    fn name(&self) -> &'static str {
        "bulleted"
    }

    fn parse(&self, section: &str) -> Option<Vec<String>> {
        parse_marked_list(section, &BULLET_ITEM, None)
    }
}

/// `Family Harmony, Duty/Obligation, Group Consensus`
pub struct CommaSeparated;

impl ValueListGrammar for CommaSeparated {
    fn name(&self) -> &'static str {
        "comma"
    }

    fn parse(&self, section: &str) -> Option<Vec<String>> {
        if !section.contains(',') {
            return None;
        }
        finish(section.split(',').map(str::to_string).collect())
    }
}

/// One value per line, no markers.
pub struct LinePerValue;

impl ValueListGrammar for LinePerValue {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn parse(&self, section: &str) -> Option<Vec<String>> {
        finish(section.lines().map(str::to_string).collect())
    }
}

/// Grammars in the order they are tried.
pub fn default_grammars() -> Vec<Box<dyn ValueListGrammar>> {
    vec![
        Box::new(NumberedList),
        Box::new(BulletedList),
        Box::new(CommaSeparated),
        Box::new(LinePerValue),
    ]
}

/// Run `grammars` in order and return the first match along with the grammar name.
pub fn parse_values(
    section: &str,
    grammars: &[Box<dyn ValueListGrammar>],
) -> Option<(&'static str, Vec<String>)> {
    grammars
        .iter()
        .find_map(|g| g.parse(section).map(|items| (g.name(), items)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_items_may_wrap() {
        let section = "1. Family\n   Harmony\n2. Duty/Obligation\n3. Group Consensus";
        assert_eq!(
            NumberedList.parse(section).unwrap(),
            vec!["Family Harmony", "Duty/Obligation", "Group Consensus"]
        );
    }

    #[test]
    fn numbered_accepts_paren_style() {
        let section = "1) [Personal Autonomy]\n2) Self-Determination";
        assert_eq!(
            NumberedList.parse(section).unwrap(),
            vec!["Personal Autonomy", "Self-Determination"]
        );
    }

    #[test]
    fn bulleted_items_strip_brackets_and_wrap() {
        let section = "- [Respect for\n  Authority]\n• Hierarchical Order\n* Rule Following";
        assert_eq!(
            BulletedList.parse(section).unwrap(),
            vec!["Respect for Authority", "Hierarchical Order", "Rule Following"]
        );
    }

    #[test]
    fn bold_items_and_stray_emphasis_are_cleaned() {
        let section = "**\n- **Freedom**\n- **Achievement**";
        assert_eq!(
            BulletedList.parse(section).unwrap(),
            vec!["Freedom", "Achievement"]
        );
        assert_eq!(clean_value("** [Duty] **"), "Duty");
    }

    #[test]
    fn hyphenated_values_are_not_bullets() {
        let section = "Self-Determination, Work-Life Balance";
        assert!(BulletedList.parse(section).is_none());
        assert_eq!(
            CommaSeparated.parse(section).unwrap(),
            vec!["Self-Determination", "Work-Life Balance"]
        );
    }

    #[test]
    fn comma_list_truncates_to_three() {
        let section = "[A], B, C, D, E";
        assert_eq!(CommaSeparated.parse(section).unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn line_grammar_skips_blank_lines() {
        let section = "Future Planning\n   \nTradition & Heritage";
        assert_eq!(
            LinePerValue.parse(section).unwrap(),
            vec!["Future Planning", "Tradition & Heritage"]
        );
    }

    #[test]
    fn first_matching_grammar_wins() {
        let grammars = default_grammars();
        let (name, items) = parse_values("1. A, B\n2. C", &grammars).unwrap();
        assert_eq!(name, "numbered");
        assert_eq!(items, vec!["A, B", "C"]);

        let (name, _) = parse_values("A, B", &grammars).unwrap();
        assert_eq!(name, "comma");
    }

    #[test]
    fn nothing_matches_empty_section() {
        assert!(parse_values("   \n  ", &default_grammars()).is_none());
    }
}
