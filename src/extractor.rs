//! Pulls the structured fields of a case out of its free-text body.
//!
//! Each field owns an ordered list of candidates. A candidate is a regex plus the function
//! that turns its captures into a value; the first candidate that both matches and yields a
//! value wins. Labels are recognised in Chinese and in English.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::truncate_chars;

pub const COURT_NAME_MAX_CHARS: usize = 50;
pub const EXCERPT_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedCase {
    pub case_type: Option<String>,
    pub court_name: Option<String>,
    pub judgment_date: Option<NaiveDate>,
    pub dispute_point: Option<String>,
    pub judgment_result: Option<String>,
}

struct Candidate<T> {
    pattern: Regex,
    extract: fn(&Captures) -> Option<T>,
}

impl<T> Candidate<T> {
    fn try_extract(&self, content: &str) -> Option<T> {
        self.pattern
            .captures(content)
            .and_then(|captures| (self.extract)(&captures))
    }
}

fn candidates<T>(patterns: &[&str], extract: fn(&Captures) -> Option<T>) -> Vec<Candidate<T>> {
    patterns
        .iter()
        .map(|pattern| Candidate {
            pattern: Regex::new(pattern).expect("extractor pattern is valid"),
            extract,
        })
        .collect()
}

fn first_match<T>(candidates: &[Candidate<T>], content: &str) -> Option<T> {
    candidates
        .iter()
        .find_map(|candidate| candidate.try_extract(content))
}

static CASE_TYPE: Lazy<Vec<Candidate<String>>> = Lazy::new(|| {
    candidates(
        &[
            r"(?:案由|(?i:cause of action))[：:]\s*(.+?)(?:\n|$)",
            r"(?:案件类型|(?i:case type))[：:]\s*(.+?)(?:\n|$)",
        ],
        trimmed,
    )
});

static COURT_NAME: Lazy<Vec<Candidate<String>>> = Lazy::new(|| {
    candidates(
        &[
            r"(?:审理法院|(?i:trial court))[：:]\s*(.+?)(?:\n|$)",
            r"(?:法院|(?i:court))[：:]\s*(.+?)(?:\n|$)",
            r"(.+?(?:法院|(?i:court)))",
        ],
        short_court_name,
    )
});

static JUDGMENT_DATE: Lazy<Vec<Candidate<NaiveDate>>> = Lazy::new(|| {
    let mut list = candidates(
        &[r"(?:判决日期|(?i:judgment date))[：:]\s*([0-9]{4}[-年][0-9]{1,2}[-月][0-9]{1,2}日?)"],
        labelled_date,
    );
    list.extend(candidates(
        &[
            r"([0-9]{4})年([0-9]{1,2})月([0-9]{1,2})日",
            r"([0-9]{4})[-/]([0-9]{1,2})[-/]([0-9]{1,2})",
        ],
        date_parts,
    ));
    list
});

static DISPUTE_POINT: Lazy<Vec<Candidate<String>>> = Lazy::new(|| {
    candidates(
        &[
            r"(?s)(?:争议点|(?i:dispute point))[：:]\s*(.+?)(?:\n\n|$)",
            r"(?s)(?:核心争议|(?i:core dispute))[：:]\s*(.+?)(?:\n\n|$)",
            r"(?s)(?:争议焦点|(?i:point of contention))[：:]\s*(.+?)(?:\n\n|$)",
        ],
        excerpt,
    )
});

static JUDGMENT_RESULT: Lazy<Vec<Candidate<String>>> = Lazy::new(|| {
    candidates(
        &[
            r"(?s)(?:判决结果|(?i:judgment result))[：:]\s*(.+?)(?:\n\n|$)",
            r"(?s)(?:判决|(?i:judgment))[：:]\s*(.+?)(?:\n\n|$)",
            r"(?s)(?:裁判结果|(?i:ruling))[：:]\s*(.+?)(?:\n\n|$)",
        ],
        excerpt,
    )
});

fn trimmed(captures: &Captures) -> Option<String> {
    captures.get(1).map(|m| m.as_str().trim().to_string())
}

// Anything this long is a sentence that happens to end in "court", not a court name.
fn short_court_name(captures: &Captures) -> Option<String> {
    trimmed(captures).filter(|name| name.chars().count() < COURT_NAME_MAX_CHARS)
}

fn excerpt(captures: &Captures) -> Option<String> {
    trimmed(captures).map(|text| truncate_chars(&text, EXCERPT_MAX_CHARS))
}

fn labelled_date(captures: &Captures) -> Option<NaiveDate> {
    let raw = captures.get(1)?.as_str();
    let normalized = raw.replace(['年', '月'], "-").replace('日', "");
    let parts: Vec<&str> = normalized.split('-').filter(|p| !p.is_empty()).collect();
    parse_date(&join_padded(&parts))
}

fn date_parts(captures: &Captures) -> Option<NaiveDate> {
    let parts: Vec<&str> = (1..=3)
        .map(|i| captures.get(i).map(|m| m.as_str()))
        .collect::<Option<_>>()?;
    parse_date(&join_padded(&parts))
}

fn join_padded(parts: &[&str]) -> String {
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| if i == 0 { part.to_string() } else { format!("{:0>2}", part) })
        .collect::<Vec<_>>()
        .join("-")
}

/// Full year-month-day first, then year-month (pinned to the first of the month).
fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d"))
        .ok()
}

pub fn extract(content: Option<&str>) -> ExtractedCase {
    let content = match content {
        Some(content) if !content.is_empty() => content,
        _ => return ExtractedCase::default(),
    };

    ExtractedCase {
        case_type: first_match(&CASE_TYPE, content),
        court_name: first_match(&COURT_NAME, content),
        judgment_date: first_match(&JUDGMENT_DATE, content),
        dispute_point: first_match(&DISPUTE_POINT, content),
        judgment_result: first_match(&JUDGMENT_RESULT, content),
    }
}
