use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

const TITLE_LIMIT: usize = 80;
const ELLIPSIS: &str = "...";
const UNTITLED: &str = "Untitled ticket";

const BUG_TERMS: &[&str] = &["bug", "error", "fix", "broken", "crash", "fail"];
const FEATURE_TERMS: &[&str] = &["feature", "implement", "add", "new", "create"];
const IMPROVEMENT_TERMS: &[&str] = &["improve", "enhance", "optimi", "refactor", "update"];
const TASK_TERMS: &[&str] = &["task", "todo", "chore", "setup", "configure", "document"];

const URGENT_TERMS: &[&str] = &["urgent", "critical", "asap", "crash"];
const LOW_PRIORITY_TERMS: &[&str] = &[
    "low priority",
    "minor",
    "nice to have",
    "when possible",
    "eventually",
];

const HIGH_COMPLEXITY_TERMS: &[&str] =
    &["integration", "database", "api", "security", "performance"];
const HIGH_COMPLEXITY_WORDS: usize = 100;
const MEDIUM_COMPLEXITY_WORDS: usize = 30;

const LABEL_VOCABULARY: &[&str] = &[
    "api",
    "database",
    "frontend",
    "backend",
    "ui",
    "ux",
    "security",
    "performance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Bug,
    Feature,
    Improvement,
    Task,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bug => "Bug",
            Category::Feature => "Feature",
            Category::Improvement => "Improvement",
            Category::Task => "Task",
            Category::General => "General",
        }
    }

    fn base_priority(&self) -> Priority {
        match self {
            Category::Bug => Priority::High,
            Category::Feature => Priority::Medium,
            Category::Improvement => Priority::Low,
            Category::Task | Category::General => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }

    /// Lower-case name accepted by the tracker's `priority` field.
    pub fn tracker_value(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "Low",
            Complexity::Medium => "Medium",
            Complexity::High => "High",
        }
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(Category, Priority, Complexity);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub priority: Priority,
    pub complexity: Complexity,
    pub labels: BTreeSet<String>,
}

pub fn classify(text: &str) -> ClassificationResult {
    let lowered = text.to_lowercase();

    let category = classify_category(&lowered);
    let priority = classify_priority(&lowered, category);
    let complexity = classify_complexity(&lowered);
    let labels = LABEL_VOCABULARY
        .iter()
        .filter(|label| lowered.contains(*label))
        .map(|label| label.to_string())
        .collect();

    ClassificationResult {
        category,
        priority,
        complexity,
        labels,
    }
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

fn classify_category(lowered: &str) -> Category {
    [
        (BUG_TERMS, Category::Bug),
        (FEATURE_TERMS, Category::Feature),
        (IMPROVEMENT_TERMS, Category::Improvement),
        (TASK_TERMS, Category::Task),
    ]
    .into_iter()
    .find(|(terms, _)| contains_any(lowered, terms))
    .map(|(_, category)| category)
    .unwrap_or(Category::General)
}

// Overrides are applied in sequence; the last matching rule wins.
fn classify_priority(lowered: &str, category: Category) -> Priority {
    let mut priority = category.base_priority();
    if contains_any(lowered, URGENT_TERMS) {
        priority = Priority::Urgent;
    }
    if contains_any(lowered, LOW_PRIORITY_TERMS) {
        priority = Priority::Low;
    }
    priority
}

fn classify_complexity(lowered: &str) -> Complexity {
    let words = lowered.split_whitespace().count();
    if words > HIGH_COMPLEXITY_WORDS || contains_any(lowered, HIGH_COMPLEXITY_TERMS) {
        Complexity::High
    } else if words > MEDIUM_COMPLEXITY_WORDS {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}

/// First sentence of `text`, capped at 80 characters.
pub fn derive_title(text: &str) -> String {
    let first_sentence = text.split('.').next().unwrap_or_default().trim();
    if first_sentence.is_empty() {
        return UNTITLED.to_string();
    }

    if first_sentence.chars().count() <= TITLE_LIMIT {
        return first_sentence.to_string();
    }

    let keep = TITLE_LIMIT - ELLIPSIS.chars().count();
    let mut title: String = first_sentence.chars().take(keep).collect();
    title.truncate(title.trim_end().len());
    title.push_str(ELLIPSIS);
    title
}
