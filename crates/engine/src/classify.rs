//! Column classifier: tags CSV columns with the geographic roles their
//! names and sample values suggest.

use crate::model::{AdminCodeLevel, ColumnRole, ColumnTag, Table};

/// How many non-missing values to inspect per column.
pub const SAMPLE_SIZE: usize = 5;

/// How many of those values to keep on the tag for display.
const KEPT_SAMPLES: usize = 3;

const ADMIN_CODE_KEYWORDS: &[&str] = &["fips", "geoid", "county"];
const POSTAL_KEYWORDS: &[&str] = &["zip", "postal", "zcta"];
const NAME_KEYWORDS: &[&str] = &["name", "county", "place", "city"];

/// Tag each column of `table` with zero or more roles.
///
/// A keyword hit on the column name is necessary but (except for state
/// references) not sufficient: the sampled values must also pass a shape
/// check. At most one tag per role is emitted per column.
pub fn classify_columns(table: &Table) -> Vec<ColumnTag> {
    let mut tags = Vec::new();

    for (idx, column) in table.columns.iter().enumerate() {
        let lower = column.to_lowercase();
        let samples = table.sample_values(idx, SAMPLE_SIZE);

        if ADMIN_CODE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            // 5-digit county codes take precedence over 2-digit state codes.
            let level = if samples.iter().any(|v| is_digits(v, 5)) {
                Some(AdminCodeLevel::County)
            } else if samples.iter().any(|v| is_digits(v, 2)) {
                Some(AdminCodeLevel::State)
            } else {
                None
            };
            if let Some(level) = level {
                tags.push(tag(column, ColumnRole::AdminCode, Some(level), &samples));
            }
        }

        if POSTAL_KEYWORDS.iter().any(|k| lower.contains(k))
            && samples.iter().any(|v| is_digits(v, 5))
        {
            tags.push(tag(column, ColumnRole::PostalCode, None, &samples));
        }

        if NAME_KEYWORDS.iter().any(|k| lower.contains(k))
            && samples.iter().any(|v| v.chars().count() > 2)
        {
            tags.push(tag(column, ColumnRole::PlaceName, None, &samples));
        }

        // Keyword hit alone is enough here. Deliberately low-precision;
        // the ranker treats state references as weak evidence.
        if lower.contains("state") || lower == "st" {
            tags.push(tag(column, ColumnRole::StateRef, None, &samples));
        }
    }

    tags
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn tag(
    column: &str,
    role: ColumnRole,
    code_level: Option<AdminCodeLevel>,
    samples: &[String],
) -> ColumnTag {
    ColumnTag {
        column: column.to_string(),
        role,
        code_level,
        samples: samples.iter().take(KEPT_SAMPLES).cloned().collect(),
    }
}
