//! Identifier transforms shared by every generated layer.
//!
//! Every raw table or column name goes through [`NamingEngine::forms`], which
//! memoizes the result for the lifetime of the engine. Templates never case or
//! inflect strings themselves, so a name cannot drift between artifacts.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use convert_case::{Case, Casing};
use regex::Regex;

static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid acronym pattern"));
static HUMP_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid hump pattern"));
static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid separator pattern"));

/// Words Python rejects as identifiers and module names.
pub(crate) const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Convert a string to snake_case.
///
/// Splits camel humps and acronyms (`HTTPResponse` -> `http_response`),
/// collapses any run of non-alphanumerics into one underscore and trims
/// leading/trailing underscores. Digits stay attached to the preceding word.
pub fn to_snake_case(s: &str) -> String {
    let s = ACRONYM_BOUNDARY.replace_all(s, "${1}_${2}");
    let s = HUMP_BOUNDARY.replace_all(&s, "${1}_${2}");
    let s = NON_ALNUM.replace_all(&s, "_");
    s.to_lowercase().trim_matches('_').to_string()
}

/// Convert a string to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    to_snake_case(s).to_case(Case::Pascal)
}

/// Convert a string to camelCase
pub fn to_camel_case(s: &str) -> String {
    to_snake_case(s).to_case(Case::Camel)
}

/// Convert a string to a human label ("department_id" -> "Department Id")
pub fn to_title_case(s: &str) -> String {
    to_snake_case(s).to_case(Case::Title)
}

/// The canonical spellings of one raw name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierForms {
    /// Raw name as it appeared in the schema.
    pub raw: String,
    /// Case-converted, not inflected. Used for column attributes.
    pub snake: String,
    pub pascal: String,
    pub snake_singular: String,
    pub snake_plural: String,
    pub pascal_singular: String,
    pub pascal_plural: String,
    pub camel_singular: String,
    pub title: String,
}

/// Irregular nouns and uncountables consulted before the suffix heuristics.
#[derive(Debug, Clone)]
pub struct NamingRules {
    plurals: HashMap<String, String>,
    singulars: HashMap<String, String>,
    uncountable: HashSet<String>,
}

const IRREGULAR: &[(&str, &str)] = &[
    ("agendum", "agenda"),
    ("alumnus", "alumni"),
    ("cactus", "cacti"),
    ("cache", "caches"),
    ("calf", "calves"),
    ("child", "children"),
    ("criterion", "criteria"),
    ("crisis", "crises"),
    ("curriculum", "curricula"),
    ("datum", "data"),
    ("diagnosis", "diagnoses"),
    ("echo", "echoes"),
    ("foot", "feet"),
    ("fungus", "fungi"),
    ("goose", "geese"),
    ("half", "halves"),
    ("hero", "heroes"),
    ("index", "indices"),
    ("knife", "knives"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("louse", "lice"),
    ("man", "men"),
    ("matrix", "matrices"),
    ("medium", "media"),
    ("mouse", "mice"),
    ("movie", "movies"),
    ("niche", "niches"),
    ("nucleus", "nuclei"),
    ("ox", "oxen"),
    ("parenthesis", "parentheses"),
    ("person", "people"),
    ("phenomenon", "phenomena"),
    ("potato", "potatoes"),
    ("quiz", "quizzes"),
    ("shelf", "shelves"),
    ("syllabus", "syllabi"),
    ("thesis", "theses"),
    ("thief", "thieves"),
    ("tomato", "tomatoes"),
    ("tooth", "teeth"),
    ("wife", "wives"),
    ("wolf", "wolves"),
    ("woman", "women"),
];

const UNCOUNTABLE: &[&str] = &[
    "deer",
    "equipment",
    "feedback",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
    "status",
];

impl Default for NamingRules {
    fn default() -> Self {
        let mut rules = NamingRules {
            plurals: HashMap::new(),
            singulars: HashMap::new(),
            uncountable: UNCOUNTABLE.iter().map(|w| w.to_string()).collect(),
        };
        for (singular, plural) in IRREGULAR {
            rules.add_irregular(singular, plural);
        }
        rules
    }
}

impl NamingRules {
    /// Register an irregular pair; later registrations win.
    pub fn add_irregular(&mut self, singular: &str, plural: &str) {
        let singular = singular.to_lowercase();
        let plural = plural.to_lowercase();
        self.plurals.insert(singular.clone(), plural.clone());
        self.singulars.insert(plural, singular);
    }

    pub fn add_uncountable(&mut self, word: &str) {
        self.uncountable.insert(word.to_lowercase());
    }

    /// Pluralize the last word of a snake_case identifier.
    pub fn pluralize(&self, snake: &str) -> String {
        map_last_word(snake, |word| self.pluralize_word(word))
    }

    /// Singularize the last word of a snake_case identifier.
    pub fn singularize(&self, snake: &str) -> String {
        map_last_word(snake, |word| self.singularize_word(word))
    }

    fn pluralize_word(&self, word: &str) -> String {
        if word.is_empty() || self.uncountable.contains(word) || self.singulars.contains_key(word) {
            return word.to_string();
        }
        if let Some(plural) = self.plurals.get(word) {
            return plural.clone();
        }

        if let Some(stem) = word.strip_suffix('y') {
            if stem.chars().last().is_some_and(is_consonant) {
                return format!("{}ies", stem);
            }
        }
        if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
            return format!("{}es", word);
        }
        format!("{}s", word)
    }

    fn singularize_word(&self, word: &str) -> String {
        if word.is_empty() || self.uncountable.contains(word) || self.plurals.contains_key(word) {
            return word.to_string();
        }
        if let Some(singular) = self.singulars.get(word) {
            return singular.clone();
        }

        if word.len() > 3 {
            if let Some(stem) = word.strip_suffix("ies") {
                return format!("{}y", stem);
            }
        }
        // "houses" keeps its 'e'; "buses" and "boxes" drop it
        if !word.ends_with("ouses") {
            for suffix in ["sses", "uses", "shes", "ches", "xes", "zzes"] {
                if word.ends_with(suffix) {
                    return word[..word.len() - 2].to_string();
                }
            }
        }
        if ["ss", "us", "is"].iter().any(|suffix| word.ends_with(suffix)) {
            return word.to_string();
        }
        match word.strip_suffix('s') {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => word.to_string(),
        }
    }
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !"aeiou".contains(c)
}

fn map_last_word(snake: &str, f: impl Fn(&str) -> String) -> String {
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, f(last)),
        None => f(snake),
    }
}

/// Memoizing naming engine. One instance lives for one generation run.
///
/// The cache is behind a `RwLock` so the engine can be shared across threads;
/// computing the same forms twice yields the same value, so a race on the first
/// insert is harmless.
#[derive(Debug, Default)]
pub struct NamingEngine {
    rules: NamingRules,
    cache: RwLock<HashMap<String, Arc<IdentifierForms>>>,
}

impl NamingEngine {
    pub fn new(rules: NamingRules) -> Self {
        Self {
            rules,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn rules(&self) -> &NamingRules {
        &self.rules
    }

    /// All canonical forms of `raw`, computed once and cached.
    pub fn forms(&self, raw: &str) -> Arc<IdentifierForms> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(forms) = cache.get(raw) {
                return Arc::clone(forms);
            }
        }

        let forms = Arc::new(self.compute(raw));
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(raw.to_string()).or_insert(forms))
    }

    /// Number of distinct raw names seen so far.
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn compute(&self, raw: &str) -> IdentifierForms {
        let snake = to_snake_case(raw);
        let snake_singular = self.rules.singularize(&snake);
        let snake_plural = self.rules.pluralize(&snake_singular);

        if !snake.is_empty() && snake_singular == snake_plural {
            tracing::warn!(
                "'{}' has identical singular and plural forms ('{}')",
                raw,
                snake_plural
            );
        }

        IdentifierForms {
            raw: raw.to_string(),
            pascal: snake.to_case(Case::Pascal),
            pascal_singular: snake_singular.to_case(Case::Pascal),
            pascal_plural: snake_plural.to_case(Case::Pascal),
            camel_singular: snake_singular.to_case(Case::Camel),
            title: snake.to_case(Case::Title),
            snake,
            snake_singular,
            snake_plural,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_snake_case("HelloWorld"), "hello_world");
        assert_eq!(to_snake_case("HTTPResponse"), "http_response");
        assert_eq!(to_snake_case("foo--bar!"), "foo_bar");
        assert_eq!(to_snake_case("__order__items__"), "order_items");
        assert_eq!(to_snake_case("Order Items"), "order_items");
        assert_eq!(to_snake_case("address_line1"), "address_line1");
        assert_eq!(to_pascal_case("department_id"), "DepartmentId");
        assert_eq!(to_camel_case("order_item"), "orderItem");
        assert_eq!(to_title_case("department_id"), "Department Id");
    }

    #[test]
    fn test_pluralize_heuristics() {
        let rules = NamingRules::default();
        assert_eq!(rules.pluralize("department"), "departments");
        assert_eq!(rules.pluralize("category"), "categories");
        assert_eq!(rules.pluralize("day"), "days");
        assert_eq!(rules.pluralize("box"), "boxes");
        assert_eq!(rules.pluralize("batch"), "batches");
        assert_eq!(rules.pluralize("wish"), "wishes");
        assert_eq!(rules.pluralize("bus"), "buses");
        assert_eq!(rules.pluralize("person"), "people");
        assert_eq!(rules.pluralize("sales_person"), "sales_people");
        assert_eq!(rules.pluralize("order_item"), "order_items");
        assert_eq!(rules.pluralize("series"), "series");
    }

    #[test]
    fn test_singularize_heuristics() {
        let rules = NamingRules::default();
        assert_eq!(rules.singularize("departments"), "department");
        assert_eq!(rules.singularize("categories"), "category");
        assert_eq!(rules.singularize("boxes"), "box");
        assert_eq!(rules.singularize("addresses"), "address");
        assert_eq!(rules.singularize("buses"), "bus");
        assert_eq!(rules.singularize("houses"), "house");
        assert_eq!(rules.singularize("people"), "person");
        assert_eq!(rules.singularize("order_items"), "order_item");
        assert_eq!(rules.singularize("status"), "status");
        assert_eq!(rules.singularize("address"), "address");
        assert_eq!(rules.singularize("analysis"), "analysis");
        assert_eq!(rules.singularize("person"), "person");
        assert_eq!(rules.singularize("employee"), "employee");
    }

    #[test]
    fn test_custom_rules() {
        let mut rules = NamingRules::default();
        rules.add_irregular("octopus", "octopodes");
        rules.add_uncountable("staff");
        assert_eq!(rules.pluralize("octopus"), "octopodes");
        assert_eq!(rules.singularize("octopodes"), "octopus");
        assert_eq!(rules.pluralize("staff"), "staff");
    }

    #[test]
    fn test_department_forms() {
        let engine = NamingEngine::default();
        let forms = engine.forms("department");
        assert_eq!(forms.snake_singular, "department");
        assert_eq!(forms.snake_plural, "departments");
        assert_eq!(forms.pascal_singular, "Department");
        assert_eq!(forms.pascal_plural, "Departments");
    }

    #[test]
    fn test_plural_table_name_is_singularized() {
        let engine = NamingEngine::default();
        let forms = engine.forms("OrderItems");
        assert_eq!(forms.snake, "order_items");
        assert_eq!(forms.snake_singular, "order_item");
        assert_eq!(forms.pascal_singular, "OrderItem");
        assert_eq!(forms.pascal_plural, "OrderItems");
        assert_eq!(forms.camel_singular, "orderItem");
    }

    #[test]
    fn test_forms_are_cached_and_deterministic() {
        let engine = NamingEngine::default();
        let first = engine.forms("employees");
        let second = engine.forms("employees");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cached_len(), 1);

        let fresh = NamingEngine::default();
        assert_eq!(*fresh.forms("employees"), *first);
    }
}
