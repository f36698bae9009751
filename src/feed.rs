//! Tag listing and text search over normalized cases.

use serde::Serialize;

use crate::models::case::CaseRecord;

/// `{tag, cases}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagFeed<T> {
    pub tag: String,
    pub cases: Vec<T>,
}

/// `{query, results}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults<T> {
    pub query: String,
    pub results: Vec<T>,
}

/// Cases carrying `tag` exactly, in input order.
pub fn cases_by_tag(cases: &[CaseRecord], tag: &str) -> TagFeed<CaseRecord> {
    let tag = tag.trim();
    TagFeed {
        tag: tag.to_string(),
        cases: cases.iter().filter(|c| c.has_tag(tag)).cloned().collect(),
    }
}

fn searchable_fields(case: &CaseRecord) -> impl Iterator<Item = &str> {
    [
        case.title_zh.as_deref(),
        case.short_sentence_zh.as_deref(),
        case.summary_zh.as_deref(),
        case.full_story_zh.as_deref(),
        case.content.as_deref(),
        case.ocr_text.as_deref(),
    ]
    .into_iter()
    .flatten()
    .chain(case.tags.iter().map(String::as_str))
}

/// Case-insensitive substring search over text fields and tags.
/// A blank query matches nothing.
pub fn search_cases(cases: &[CaseRecord], query: &str) -> SearchResults<CaseRecord> {
    let query = query.trim();
    let needle = query.to_lowercase();
    let results = if needle.is_empty() {
        Vec::new()
    } else {
        cases
            .iter()
            .filter(|c| searchable_fields(c).any(|f| f.to_lowercase().contains(&needle)))
            .cloned()
            .collect()
    };
    SearchResults {
        query: query.to_string(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_case;
    use serde_json::json;

    fn fixtures() -> Vec<CaseRecord> {
        vec![
            normalize_case(&json!({ "id": "a", "titleZh": "半夜起床", "tags": ["Night-Waking"] })),
            normalize_case(&json!({ "id": "b", "content": "Forgot the stove again", "tags": ["memory"] })),
            normalize_case(&json!({ "id": "c", "ocrText": "藥袋上寫著 memory clinic" })),
        ]
    }

    #[test]
    fn tag_match_is_exact() {
        let feed = cases_by_tag(&fixtures(), " memory ");
        assert_eq!(feed.tag, "memory");
        assert_eq!(feed.cases.len(), 1);
        assert_eq!(feed.cases[0].id, "b");
        assert!(cases_by_tag(&fixtures(), "night-waking").cases.is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_text_and_tags() {
        let ids = |q: &str| -> Vec<String> {
            search_cases(&fixtures(), q).results.into_iter().map(|c| c.id).collect()
        };
        assert_eq!(ids("MEMORY"), vec!["b", "c"]);
        assert_eq!(ids("forgot"), vec!["b"]);
        assert_eq!(ids("半夜"), vec!["a"]);
        assert_eq!(ids("night-waking"), vec!["a"]);
    }

    #[test]
    fn blank_query_matches_nothing() {
        let results = search_cases(&fixtures(), "   ");
        assert_eq!(results.query, "");
        assert!(results.results.is_empty());
    }

    #[test]
    fn payload_shapes() {
        let json = serde_json::to_value(search_cases(&fixtures(), "stove")).unwrap();
        assert_eq!(json["query"], "stove");
        assert_eq!(json["results"][0]["id"], "b");
        let json = serde_json::to_value(cases_by_tag(&fixtures(), "memory")).unwrap();
        assert_eq!(json["tag"], "memory");
        assert_eq!(json["cases"].as_array().unwrap().len(), 1);
    }
}
