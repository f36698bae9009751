//! Symptom Classifier: maps a case to symptom categories.
//!
//! Stored categories win. Otherwise categories are inferred by substring
//! match over a lowercased blob of title, summary, short sentence and tags.
//! Output always follows category declaration order.

use crate::models::case::CaseRecord;
use crate::models::enums::SymptomCategory;

/// Keyword list per category. `Other` has none and is never suggested.
pub fn category_keywords(category: SymptomCategory) -> &'static [&'static str] {
    match category {
        SymptomCategory::Memory => &[
            "忘記", "記不得", "記不住", "記憶", "重複問", "剛說過", "memory", "forget",
        ],
        SymptomCategory::Orientation => &[
            "迷路", "走失", "分不清", "認不得路", "不知道在哪", "orientation", "wander", "lost",
        ],
        SymptomCategory::Behavior => &[
            "發脾氣", "攻擊", "翻找", "藏東西", "遊走", "不會用", "behavior", "agitation",
        ],
        SymptomCategory::Emotion => &[
            "焦慮", "憂鬱", "哭", "生氣", "害怕", "情緒", "anxiety", "mood",
        ],
        SymptomCategory::Sleep => &[
            "失眠", "睡不著", "半夜", "日夜顛倒", "sleep", "insomnia", "night",
        ],
        SymptomCategory::Interaction => &[
            "不說話", "認不出", "叫錯", "不理人", "社交", "interaction", "social", "semantic",
        ],
        SymptomCategory::Other => &[],
    }
}

fn classification_blob(case: &CaseRecord) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(case.title_zh.as_deref());
    parts.extend(case.summary_zh.as_deref());
    parts.extend(case.short_sentence_zh.as_deref());
    parts.extend(case.tags.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}

/// Inferred categories from the keyword lists, ignoring stored ones.
pub fn suggest_categories_for_case(case: &CaseRecord) -> Vec<SymptomCategory> {
    let blob = classification_blob(case);
    SymptomCategory::ALL
        .iter()
        .copied()
        .filter(|c| category_keywords(*c).iter().any(|k| blob.contains(*k)))
        .collect()
}

/// Stored categories when present, inferred ones otherwise.
pub fn categories_for_case(case: &CaseRecord) -> Vec<SymptomCategory> {
    if case.symptom_categories.is_empty() {
        suggest_categories_for_case(case)
    } else {
        case.symptom_categories.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_case;
    use serde_json::json;

    #[test]
    fn infers_in_declaration_order() {
        let case = normalize_case(&json!({
            "titleZh": "半夜失眠",
            "summaryZh": "又走失，還忘記吃飯",
        }));
        assert_eq!(
            suggest_categories_for_case(&case),
            vec![SymptomCategory::Memory, SymptomCategory::Orientation, SymptomCategory::Sleep]
        );
    }

    #[test]
    fn tags_participate_case_insensitively() {
        let case = normalize_case(&json!({ "tags": ["Memory-Decline"] }));
        assert_eq!(suggest_categories_for_case(&case), vec![SymptomCategory::Memory]);
    }

    #[test]
    fn other_is_never_suggested() {
        let case = normalize_case(&json!({ "titleZh": "其他 other 雜事" }));
        assert!(suggest_categories_for_case(&case).is_empty());
    }

    #[test]
    fn content_is_not_part_of_the_blob() {
        let case = normalize_case(&json!({ "content": "失眠" }));
        assert!(suggest_categories_for_case(&case).is_empty());
    }

    #[test]
    fn stored_categories_take_precedence() {
        let case = normalize_case(&json!({
            "titleZh": "失眠",
            "symptomCategories": ["other"],
        }));
        assert_eq!(categories_for_case(&case), vec![SymptomCategory::Other]);
    }
}
