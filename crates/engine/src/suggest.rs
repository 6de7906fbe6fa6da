//! Join-suggestion ranker: scores (csv column, layer, layer column)
//! candidates against the layer catalog and returns the best plans.

use crate::model::{
    AdminCodeLevel, ColumnRole, ColumnTag, Confidence, GeographyLevel, JoinOption, JoinSuggestion,
    LayerDescriptor, MatchKind,
};

/// At most this many suggestions are surfaced.
pub const MAX_SUGGESTIONS: usize = 5;

/// One scoring rule: a (geography, role) combination worth `score` points,
/// with the join option it contributes. Adding a layer type means adding a
/// row here, not touching the ranking loop.
struct ScoreRule {
    geography: GeographyLevel,
    role: ColumnRole,
    code_level: Option<AdminCodeLevel>,
    score: u32,
    layer_column: &'static str,
    kind: MatchKind,
    confidence: Confidence,
}

/// Precision-first: exact identifiers (FIPS, ZIP) outrank name matches.
/// The constants are deliberately coarse — consumers only need an ordering.
const RULES: &[ScoreRule] = &[
    ScoreRule {
        geography: GeographyLevel::County,
        role: ColumnRole::AdminCode,
        code_level: Some(AdminCodeLevel::County),
        score: 10,
        layer_column: "GEOID",
        kind: MatchKind::AdminCode,
        confidence: Confidence::High,
    },
    ScoreRule {
        geography: GeographyLevel::State,
        role: ColumnRole::AdminCode,
        code_level: Some(AdminCodeLevel::State),
        score: 10,
        layer_column: "STATEFP",
        kind: MatchKind::AdminCode,
        confidence: Confidence::High,
    },
    ScoreRule {
        geography: GeographyLevel::ZipCode,
        role: ColumnRole::PostalCode,
        code_level: None,
        score: 9,
        layer_column: "GEOID10",
        kind: MatchKind::PostalCode,
        confidence: Confidence::High,
    },
    ScoreRule {
        geography: GeographyLevel::County,
        role: ColumnRole::PlaceName,
        code_level: None,
        score: 5,
        layer_column: "NAME",
        kind: MatchKind::Name,
        confidence: Confidence::Medium,
    },
];

/// Rank layers against the detected column tags. Layers that score zero are
/// dropped; ties keep catalog order (stable sort); at most
/// [`MAX_SUGGESTIONS`] survive.
pub fn suggest_joins(tags: &[ColumnTag], layers: &[LayerDescriptor]) -> Vec<JoinSuggestion> {
    let mut suggestions: Vec<JoinSuggestion> = Vec::new();

    for layer in layers {
        let mut score = 0u32;
        let mut options = Vec::new();

        for rule in RULES {
            if rule.geography != layer.geography {
                continue;
            }
            for tag in tags.iter().filter(|t| {
                t.role == rule.role
                    && (rule.code_level.is_none() || t.code_level == rule.code_level)
            }) {
                score += rule.score;
                options.push(JoinOption {
                    csv_column: tag.column.clone(),
                    layer_column: rule.layer_column.to_string(),
                    kind: rule.kind,
                    confidence: rule.confidence,
                });
            }
        }

        if score > 0 {
            suggestions.push(JoinSuggestion {
                layer_id: layer.id.clone(),
                geography: layer.geography,
                coverage: layer.coverage.clone(),
                score,
                options,
            });
        }
    }

    suggestions.sort_by(|a, b| b.score.cmp(&a.score));
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
