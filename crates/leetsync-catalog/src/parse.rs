//! Catalog payload parsers.
//!
//! Pipeline:
//!   response body (JSON)
//!     └─ serde → RawQuestion           (lenient: every field optional)
//!          └─ RawQuestion::into_record → ProblemRecord (strict)
//!
//! The three endpoints wrap the same question object differently:
//!   `/problem/{id}` → the question itself
//!   `/daily`        → `{ "link": …, "question": { … } }`
//!   snapshot dump   → `[ { "data": { "question": { … } } }, … ]`

use std::{collections::BTreeSet, fmt, sync::Arc};

use leetsync_core::{
  ParseError,
  problem::{DEFAULT_DESCRIPTION_LIMIT, Difficulty, ProblemRecord, cap_description},
};
use serde::Deserialize;

use crate::error::Result;

/// Origin prepended to relative links in the daily payload.
pub const LEETCODE_ORIGIN: &str = "https://leetcode.com";

// ─── Description formatting ──────────────────────────────────────────────────

/// Converts the remote's HTML description to plain text.
pub type Sanitizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How raw descriptions become stored descriptions: sanitise, then cap.
#[derive(Clone)]
pub struct DescriptionFormat {
  sanitizer: Sanitizer,
  limit:     usize,
}

impl DescriptionFormat {
  pub fn new(limit: usize) -> Self {
    Self { sanitizer: Arc::new(|s: &str| s.to_owned()), limit }
  }

  pub fn with_sanitizer(
    mut self,
    sanitizer: impl Fn(&str) -> String + Send + Sync + 'static,
  ) -> Self {
    self.sanitizer = Arc::new(sanitizer);
    self
  }

  pub fn limit(&self) -> usize { self.limit }

  pub fn render(&self, content: &str) -> String {
    cap_description(&(self.sanitizer)(content), self.limit)
  }
}

impl Default for DescriptionFormat {
  fn default() -> Self { Self::new(DEFAULT_DESCRIPTION_LIMIT) }
}

impl fmt::Debug for DescriptionFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DescriptionFormat")
      .field("limit", &self.limit)
      .finish_non_exhaustive()
  }
}

// ─── Wire representation ─────────────────────────────────────────────────────

/// Identifiers arrive as either JSON numbers or numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
  Number(i64),
  Text(String),
}

impl RawId {
  fn to_u32(&self, field: &'static str) -> Result<u32, ParseError> {
    let parsed = match self {
      Self::Number(n) => u32::try_from(*n).ok(),
      Self::Text(s) => s.trim().parse::<u32>().ok(),
    };
    match parsed {
      Some(n) if n > 0 => Ok(n),
      _ => Err(ParseError::InvalidField { field, value: self.to_string() }),
    }
  }
}

impl fmt::Display for RawId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => write!(f, "{s:?}"),
    }
  }
}

#[derive(Debug, Deserialize)]
struct RawTag {
  name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
  title:                Option<String>,
  question_id:          Option<RawId>,
  question_frontend_id: Option<RawId>,
  url:                  Option<String>,
  title_slug:           Option<String>,
  difficulty:           Option<String>,
  content:              Option<String>,
  topic_tags:           Option<Vec<RawTag>>,
  is_paid_only:         Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawDaily {
  link:     Option<String>,
  question: Option<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshotItem {
  data: Option<RawSnapshotData>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshotData {
  question: Option<RawQuestion>,
}

impl RawQuestion {
  /// Canonical URL: the explicit `url`, else one derived from the slug.
  fn canonical_url(&self) -> Option<String> {
    self
      .url
      .as_deref()
      .map(str::trim)
      .filter(|u| !u.is_empty())
      .map(absolute_url)
      .or_else(|| {
        self
          .title_slug
          .as_deref()
          .filter(|s| !s.is_empty())
          .map(|slug| format!("{LEETCODE_ORIGIN}/problems/{slug}/"))
      })
  }

  fn into_record(
    self,
    format: &DescriptionFormat,
    url: Option<String>,
  ) -> Result<ProblemRecord, ParseError> {
    let frontend_id = self
      .question_frontend_id
      .as_ref()
      .ok_or(ParseError::MissingField("questionFrontendId"))?
      .to_u32("questionFrontendId")?;
    let problem_id = self
      .question_id
      .as_ref()
      .ok_or(ParseError::MissingField("questionId"))?
      .to_u32("questionId")?;
    let difficulty = Difficulty::parse(
      self
        .difficulty
        .as_deref()
        .ok_or(ParseError::MissingField("difficulty"))?,
    )?;

    let url = match url {
      Some(url) => url,
      None => self.canonical_url().ok_or(ParseError::MissingField("url"))?,
    };
    let title = self
      .title
      .map(|t| t.trim().to_owned())
      .filter(|t| !t.is_empty())
      .ok_or(ParseError::MissingField("title"))?;

    let tags: BTreeSet<String> = self
      .topic_tags
      .unwrap_or_default()
      .into_iter()
      .filter_map(|t| t.name)
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty())
      .collect();

    Ok(ProblemRecord {
      problem_id,
      frontend_id,
      title,
      url,
      difficulty,
      description: format.render(self.content.as_deref().unwrap_or_default()),
      premium: self.is_paid_only.unwrap_or(false),
      tags,
    })
  }
}

fn absolute_url(link: &str) -> String {
  if link.starts_with('/') {
    format!("{LEETCODE_ORIGIN}{link}")
  } else {
    link.to_owned()
  }
}

// ─── Public parsers ──────────────────────────────────────────────────────────

/// Parse the body of `GET /problem/{id}`.
pub fn parse_problem(body: &[u8], format: &DescriptionFormat) -> Result<ProblemRecord> {
  let raw: RawQuestion = serde_json::from_slice(body).map_err(ParseError::from)?;
  Ok(raw.into_record(format, None)?)
}

/// Parse the body of `GET /daily`. The envelope's `link` wins over the
/// question's own URL; relative links are made absolute.
pub fn parse_daily(body: &[u8], format: &DescriptionFormat) -> Result<ProblemRecord> {
  let raw: RawDaily = serde_json::from_slice(body).map_err(ParseError::from)?;
  let question = raw.question.ok_or(ParseError::MissingField("question"))?;
  let link = raw
    .link
    .as_deref()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(absolute_url);
  Ok(question.into_record(format, link)?)
}

/// Parse the full catalog dump. Items without a `data.question` object are
/// skipped; any other malformed item fails the whole snapshot.
pub fn parse_snapshot(
  body: &[u8],
  format: &DescriptionFormat,
) -> Result<Vec<ProblemRecord>> {
  let items: Vec<RawSnapshotItem> =
    serde_json::from_slice(body).map_err(ParseError::from)?;
  let mut records = Vec::with_capacity(items.len());
  for question in items.into_iter().filter_map(|i| i.data?.question) {
    records.push(question.into_record(format, None)?);
  }
  Ok(records)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  fn fmt() -> DescriptionFormat { DescriptionFormat::default() }

  const TWO_SUM: &str = r#"{
    "title": "Two Sum",
    "questionId": "1",
    "questionFrontendId": "1",
    "url": "https://leetcode.com/problems/two-sum/",
    "difficulty": "Easy",
    "content": "Given an array of integers.",
    "topicTags": [{"name": "Array"}, {"name": "Hash Table"}],
    "isPaidOnly": false
  }"#;

  #[test]
  fn single_problem_parses() {
    let r = parse_problem(TWO_SUM.as_bytes(), &fmt()).unwrap();
    assert_eq!(r.frontend_id, 1);
    assert_eq!(r.problem_id, 1);
    assert_eq!(r.title, "Two Sum");
    assert_eq!(r.difficulty, Difficulty::Easy);
    assert_eq!(r.description, "Given an array of integers.");
    assert!(!r.premium);
    assert_eq!(
      r.tags.iter().map(String::as_str).collect::<Vec<_>>(),
      ["Array", "Hash Table"]
    );
  }

  #[test]
  fn numeric_ids_and_premium_flag() {
    let body = br#"{
      "title": "Paid",
      "questionId": 2001,
      "questionFrontendId": 1999,
      "titleSlug": "paid",
      "difficulty": "hard",
      "isPaidOnly": true
    }"#;
    let r = parse_problem(body, &fmt()).unwrap();
    assert_eq!(r.problem_id, 2001);
    assert_eq!(r.frontend_id, 1999);
    assert_eq!(r.url, "https://leetcode.com/problems/paid/");
    assert_eq!(r.difficulty, Difficulty::Hard);
    assert!(r.premium);
    assert!(r.tags.is_empty());
    assert_eq!(r.description, leetsync_core::problem::EMPTY_DESCRIPTION);
  }

  #[test]
  fn unknown_difficulty_is_a_parse_error() {
    let body = TWO_SUM.replace("\"Easy\"", "\"Legendary\"");
    let err = parse_problem(body.as_bytes(), &fmt()).unwrap_err();
    assert!(matches!(
      err,
      Error::Parse(ParseError::UnknownDifficulty(ref d)) if d == "Legendary"
    ));
  }

  #[test]
  fn missing_and_malformed_ids_are_rejected() {
    let body = br#"{"title": "X", "questionId": "1", "difficulty": "Easy", "url": "u"}"#;
    assert!(matches!(
      parse_problem(body, &fmt()),
      Err(Error::Parse(ParseError::MissingField("questionFrontendId")))
    ));

    let body = TWO_SUM.replace("\"questionFrontendId\": \"1\"", "\"questionFrontendId\": \"abc\"");
    assert!(matches!(
      parse_problem(body.as_bytes(), &fmt()),
      Err(Error::Parse(ParseError::InvalidField { field: "questionFrontendId", .. }))
    ));
  }

  #[test]
  fn daily_uses_envelope_link() {
    let body = format!(r#"{{"link": "/problems/two-sum/", "question": {TWO_SUM}}}"#);
    let r = parse_daily(body.as_bytes(), &fmt()).unwrap();
    assert_eq!(r.url, "https://leetcode.com/problems/two-sum/");
    assert_eq!(r.frontend_id, 1);
  }

  #[test]
  fn daily_without_question_is_rejected() {
    let body = br#"{"link": "https://leetcode.com/problems/x/"}"#;
    assert!(matches!(
      parse_daily(body, &fmt()),
      Err(Error::Parse(ParseError::MissingField("question")))
    ));
  }

  #[test]
  fn snapshot_skips_empty_items() {
    let body = format!(
      r#"[
        {{"data": {{"question": {TWO_SUM}}}}},
        {{"data": null}},
        {{"data": {{"question": null}}}},
        {{}}
      ]"#
    );
    let records = parse_snapshot(body.as_bytes(), &fmt()).unwrap();
    assert_eq!(records.len(), 1);
  }

  #[test]
  fn one_bad_difficulty_fails_the_whole_snapshot() {
    let item = |fid: u32, difficulty: &str| {
      format!(
        r#"{{"data": {{"question": {{
          "title": "P{fid}", "questionId": "{fid}", "questionFrontendId": "{fid}",
          "url": "u{fid}", "difficulty": "{difficulty}", "topicTags": []
        }}}}}}"#
      )
    };
    let body = format!(
      "[{}, {}, {}, {}]",
      item(1, "Easy"),
      item(2, "Medium"),
      item(3, "Hard"),
      item(4, "Unknown"),
    );
    let err = parse_snapshot(body.as_bytes(), &fmt()).unwrap_err();
    assert!(matches!(err, Error::Parse(ParseError::UnknownDifficulty(_))));
  }

  #[test]
  fn sanitizer_runs_before_capping() {
    let format = DescriptionFormat::new(5)
      .with_sanitizer(|s| s.replace("<p>", "").replace("</p>", ""));
    let body = TWO_SUM.replace("Given an array of integers.", "<p>Hello world</p>");
    let r = parse_problem(body.as_bytes(), &format).unwrap();
    assert_eq!(r.description, "Hello...");
  }

  #[test]
  fn invalid_json_is_malformed() {
    assert!(matches!(
      parse_problem(b"not json", &fmt()),
      Err(Error::Parse(ParseError::Malformed(_)))
    ));
  }
}
