//! Classification rule tables.
//!
//! The classifier is driven entirely by these tables: a rule set maps task
//! categories and application names to weighted keyword lists, and UI
//! element categories to the labels that identify them. The tables are
//! swappable; the defaults below cover common office-style desktop work.

use serde::{Deserialize, Serialize};

/// A weighted keyword contributing evidence toward a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    /// Base weight added to the category confidence on a match
    pub weight: f64,
}

impl Keyword {
    pub fn new(word: &str, weight: f64) -> Self {
        Self {
            word: word.to_string(),
            weight,
        }
    }
}

/// Keywords identifying one task category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRule {
    /// Task category name (e.g. "data_entry")
    pub name: String,
    pub keywords: Vec<Keyword>,
}

/// Keywords identifying one application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRule {
    /// Canonical application name (e.g. "excel")
    pub name: String,
    pub keywords: Vec<Keyword>,
}

/// Labels identifying one category of UI element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiRule {
    /// Element category (e.g. "buttons")
    pub category: String,
    pub labels: Vec<String>,
}

/// A complete, swappable set of classification rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub tasks: Vec<TaskRule>,
    pub applications: Vec<AppRule>,
    pub ui_elements: Vec<UiRule>,
}

impl RuleSet {
    /// Default rule tables for office-style desktop work.
    pub fn default_rules() -> Self {
        Self {
            tasks: vec![
                task(
                    "data_entry",
                    &[
                        ("cell", 0.3),
                        ("row", 0.2),
                        ("column", 0.2),
                        ("spreadsheet", 0.4),
                        ("form", 0.3),
                        ("input", 0.2),
                        ("field", 0.2),
                        ("record", 0.2),
                    ],
                ),
                task(
                    "file_operations",
                    &[
                        ("save", 0.4),
                        ("open", 0.3),
                        ("file", 0.2),
                        ("folder", 0.3),
                        ("rename", 0.4),
                        ("copy", 0.3),
                        ("move", 0.3),
                        ("download", 0.3),
                    ],
                ),
                task(
                    "formatting",
                    &[
                        ("bold", 0.4),
                        ("italic", 0.4),
                        ("font", 0.4),
                        ("style", 0.3),
                        ("align", 0.3),
                        ("indent", 0.3),
                        ("highlight", 0.3),
                        ("border", 0.2),
                    ],
                ),
                task(
                    "navigation",
                    &[
                        ("search", 0.3),
                        ("scroll", 0.3),
                        ("page", 0.2),
                        ("back", 0.2),
                        ("forward", 0.2),
                        ("tab", 0.2),
                        ("bookmark", 0.4),
                        ("address", 0.2),
                    ],
                ),
                task(
                    "calculation",
                    &[
                        ("sum", 0.4),
                        ("average", 0.4),
                        ("formula", 0.5),
                        ("total", 0.3),
                        ("percent", 0.3),
                        ("count", 0.2),
                        ("function", 0.2),
                    ],
                ),
                task(
                    "communication",
                    &[
                        ("email", 0.4),
                        ("send", 0.3),
                        ("reply", 0.4),
                        ("message", 0.3),
                        ("inbox", 0.4),
                        ("meeting", 0.3),
                        ("chat", 0.4),
                    ],
                ),
            ],
            applications: vec![
                app(
                    "excel",
                    &[
                        ("excel", 0.8),
                        ("workbook", 0.5),
                        ("worksheet", 0.5),
                        ("xlsx", 0.6),
                        ("pivot", 0.4),
                    ],
                ),
                app(
                    "word",
                    &[
                        ("word", 0.6),
                        ("document", 0.4),
                        ("docx", 0.6),
                        ("paragraph", 0.3),
                    ],
                ),
                app(
                    "browser",
                    &[
                        ("browser", 0.6),
                        ("http", 0.5),
                        ("www", 0.5),
                        ("chrome", 0.7),
                        ("firefox", 0.7),
                        ("edge", 0.5),
                    ],
                ),
                app(
                    "mail",
                    &[
                        ("outlook", 0.7),
                        ("gmail", 0.7),
                        ("inbox", 0.5),
                        ("compose", 0.4),
                    ],
                ),
                app(
                    "editor",
                    &[
                        ("code", 0.5),
                        ("editor", 0.5),
                        ("vscode", 0.8),
                        ("vim", 0.7),
                        ("syntax", 0.4),
                    ],
                ),
                app(
                    "terminal",
                    &[
                        ("terminal", 0.7),
                        ("shell", 0.6),
                        ("bash", 0.6),
                        ("prompt", 0.3),
                    ],
                ),
            ],
            ui_elements: vec![
                ui(
                    "buttons",
                    &["ok", "cancel", "submit", "apply", "save", "close", "delete"],
                ),
                ui(
                    "menus",
                    &["file", "edit", "view", "insert", "format", "tools", "help"],
                ),
                ui(
                    "fields",
                    &["username", "password", "search", "name", "date", "amount"],
                ),
            ],
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::default_rules()
    }
}

fn task(name: &str, keywords: &[(&str, f64)]) -> TaskRule {
    TaskRule {
        name: name.to_string(),
        keywords: keywords.iter().map(|(w, v)| Keyword::new(w, *v)).collect(),
    }
}

fn app(name: &str, keywords: &[(&str, f64)]) -> AppRule {
    AppRule {
        name: name.to_string(),
        keywords: keywords.iter().map(|(w, v)| Keyword::new(w, *v)).collect(),
    }
}

fn ui(category: &str, labels: &[&str]) -> UiRule {
    UiRule {
        category: category.to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}
