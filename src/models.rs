use chrono::{NaiveDate, NaiveDateTime};

use crate::extractor::ExtractedCase;

/// A row of the articles table whose category marks it as a case.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub law_type: String,
    pub create_time: Option<NaiveDateTime>,
}

/// A row of the cases table, written once per title.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub title: String,
    pub case_type: Option<String>,
    pub content: Option<String>,
    pub court_name: Option<String>,
    pub judge_date: Option<NaiveDate>,
    pub dispute_point: Option<String>,
    pub judgment_result: Option<String>,
    pub law_type: String,
    pub create_time: Option<NaiveDateTime>,
}

impl CaseRecord {
    pub fn from_source(
        source: &SourceRecord,
        extracted: ExtractedCase,
        content_max_chars: usize,
    ) -> Self {
        Self {
            title: source.title.clone(),
            case_type: extracted.case_type,
            content: source
                .content
                .as_deref()
                .map(|content| truncate_chars(content, content_max_chars)),
            court_name: extracted.court_name,
            judge_date: extracted.judgment_date,
            dispute_point: extracted.dispute_point,
            judgment_result: extracted.judgment_result,
            law_type: source.law_type.clone(),
            create_time: source.create_time,
        }
    }
}

/// Cuts on character boundaries; the length limits are counted in characters, not bytes.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("判决结果如下", 2), "判决");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 5), "");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn case_record_truncates_content_and_keeps_source_fields() {
        let created = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let source = SourceRecord {
            id: 7,
            title: "Case B".to_string(),
            content: Some("案".repeat(6000)),
            law_type: "案例".to_string(),
            create_time: Some(created),
        };
        let extracted = ExtractedCase {
            court_name: Some("Shanghai court".to_string()),
            ..ExtractedCase::default()
        };

        let record = CaseRecord::from_source(&source, extracted, 5000);

        assert_eq!(record.content.as_ref().unwrap().chars().count(), 5000);
        assert_eq!(record.title, "Case B");
        assert_eq!(record.law_type, "案例");
        assert_eq!(record.create_time, Some(created));
        assert_eq!(record.court_name.as_deref(), Some("Shanghai court"));
        assert_eq!(record.case_type, None);
    }

    #[test]
    fn missing_content_stays_missing() {
        let source = SourceRecord {
            id: 1,
            title: "Empty".to_string(),
            content: None,
            law_type: "案例".to_string(),
            create_time: None,
        };

        let record = CaseRecord::from_source(&source, ExtractedCase::default(), 5000);

        assert_eq!(record.content, None);
    }
}
