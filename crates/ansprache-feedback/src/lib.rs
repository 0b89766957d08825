#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Retrospective acceptance analysis over interaction logs.
//!
//! This crate reads the [`InteractionRecord`]s a simulation run produced and
//! summarizes how proposals were received. It only reports; it never touches
//! the live score table.

use ansprache_core::InteractionRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

// Pattern detection thresholds
/// Minimum proposals of one ability in one context before its rejection rate counts
const PATTERN_MIN_PROPOSALS_PER_PAIR: usize = 5;
/// Rejection rate (60%) above which an (ability, context) pair is flagged
const PATTERN_HIGH_REJECTION_THRESHOLD: f64 = 0.6;
/// Minimum proposals in a context before a single-ability streak is flagged
const PATTERN_MIN_PROPOSALS_FOR_STARVATION: usize = 10;
/// Overall acceptance rate (50%) below which the whole run is flagged
const PATTERN_OVERALL_ACCEPTANCE_THRESHOLD: f64 = 0.5;

const REPORT_VERSION: &str = "0.1.0";
/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Accepted/rejected tallies for one grouping key.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceStatistics {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl AcceptanceStatistics {
    fn record(&mut self, accepted: bool) {
        self.total += 1;
        if accepted {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
    }

    /// Acceptance rate (0.0 to 1.0).
    #[must_use]
    pub fn acceptance_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.accepted as f64 / self.total as f64
        }
    }

    /// Rejection rate (0.0 to 1.0).
    #[must_use]
    pub fn rejection_rate(&self) -> f64 {
        debug_assert!(
            self.accepted + self.rejected == self.total,
            "AcceptanceStatistics totals are inconsistent"
        );
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.acceptance_rate()
    }
}

/// Summary of one interaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceReport {
    pub version: String,
    pub ts: String,
    pub interactions: usize,
    pub acceptance_rate: f64,
    pub by_ability: BTreeMap<String, AcceptanceStatistics>,
    pub by_context: BTreeMap<String, AcceptanceStatistics>,
    /// How often each ability was proposed and answered.
    pub usage_counts: BTreeMap<String, u64>,
    pub patterns: Vec<String>,
}

#[derive(Debug)]
pub struct AcceptanceAnalyzer {
    /// Minimum number of interactions before a report is produced
    min_interactions: usize,
}

impl Default for AcceptanceAnalyzer {
    fn default() -> Self {
        Self {
            min_interactions: 10,
        }
    }
}

impl AcceptanceAnalyzer {
    #[must_use]
    pub fn new(min_interactions: usize) -> Self {
        Self { min_interactions }
    }

    /// Aggregate records by a grouping key (e.g. ability, context).
    #[must_use]
    pub fn aggregate(
        &self,
        records: &[InteractionRecord],
        key_fn: impl Fn(&InteractionRecord) -> Option<String>,
    ) -> HashMap<String, AcceptanceStatistics> {
        let mut stats: HashMap<String, AcceptanceStatistics> = HashMap::new();
        for record in records {
            if let Some(key) = key_fn(record) {
                stats.entry(key).or_default().record(record.accepted);
            }
        }
        stats
    }

    #[must_use]
    pub fn summarize(&self, records: &[InteractionRecord]) -> AcceptanceStatistics {
        let mut stats = AcceptanceStatistics::default();
        for record in records {
            stats.record(record.accepted);
        }
        stats
    }

    #[must_use]
    pub fn usage_counts(&self, records: &[InteractionRecord]) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for record in records {
            *counts.entry(record.ability.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Heuristic pattern detection over a log.
    #[must_use]
    pub fn analyze_patterns(&self, records: &[InteractionRecord]) -> Vec<String> {
        let mut patterns = Vec::new();

        if records.len() < self.min_interactions {
            return patterns;
        }

        // Pattern 1: an ability keeps getting rejected in one context
        let by_pair = self.aggregate(records, |r| {
            Some(format!("{}\u{0}{}", r.ability, r.context()))
        });
        let mut flagged: Vec<(String, String, f64)> = by_pair
            .iter()
            .filter(|(_, s)| {
                s.total >= PATTERN_MIN_PROPOSALS_PER_PAIR
                    && s.rejection_rate() > PATTERN_HIGH_REJECTION_THRESHOLD
            })
            .filter_map(|(key, s)| {
                let (ability, ctx) = key.split_once('\u{0}')?;
                Some((ability.to_string(), ctx.to_string(), s.rejection_rate()))
            })
            .collect();
        flagged.sort_by(|a, b| (&a.1, &a.0).cmp(&(&b.1, &b.0)));
        for (ability, ctx, rate) in flagged {
            patterns.push(format!(
                "High rejection rate ({:.1}%) for '{}' in {}",
                rate * 100.0,
                ability,
                ctx
            ));
        }

        // Pattern 2: one ability received every proposal in a context
        let mut per_context: BTreeMap<String, BTreeMap<&str, usize>> = BTreeMap::new();
        for record in records {
            *per_context
                .entry(record.context().to_string())
                .or_default()
                .entry(record.ability.as_str())
                .or_insert(0) += 1;
        }
        for (ctx, abilities) in &per_context {
            let total: usize = abilities.values().sum();
            if abilities.len() == 1 && total >= PATTERN_MIN_PROPOSALS_FOR_STARVATION {
                if let Some(ability) = abilities.keys().next() {
                    patterns.push(format!(
                        "Only '{}' was proposed in {} over {} cycles",
                        ability, ctx, total
                    ));
                }
            }
        }

        // Pattern 3: overall poor reception
        let overall = self.summarize(records);
        if overall.acceptance_rate() < PATTERN_OVERALL_ACCEPTANCE_THRESHOLD {
            patterns.push(format!(
                "Overall acceptance rate is low ({:.1}%)",
                overall.acceptance_rate() * 100.0
            ));
        }

        patterns
    }

    /// Full report, or `None` below `min_interactions`.
    #[must_use]
    pub fn report(&self, records: &[InteractionRecord]) -> Option<AcceptanceReport> {
        if records.len() < self.min_interactions || records.is_empty() {
            return None;
        }
        let overall = self.summarize(records);
        Some(AcceptanceReport {
            version: REPORT_VERSION.to_string(),
            ts: iso8601_now(),
            interactions: records.len(),
            acceptance_rate: overall.acceptance_rate(),
            by_ability: self
                .aggregate(records, |r| Some(r.ability.clone()))
                .into_iter()
                .collect(),
            by_context: self
                .aggregate(records, |r| Some(r.context().to_string()))
                .into_iter()
                .collect(),
            usage_counts: self.usage_counts(records),
            patterns: self.analyze_patterns(records),
        })
    }
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(location: &str, activity: &str, ability: &str, accepted: bool) -> InteractionRecord {
        InteractionRecord {
            ts: Some(iso8601_now()),
            location: location.to_string(),
            activity: activity.to_string(),
            ability: ability.to_string(),
            accepted,
            score_after: None,
        }
    }

    #[test]
    fn statistics_calculate_rates() {
        let stats = AcceptanceStatistics {
            total: 10,
            accepted: 7,
            rejected: 3,
        };
        assert!((stats.acceptance_rate() - 0.7).abs() < 1e-12);
        assert!((stats.rejection_rate() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn statistics_handle_empty_set() {
        let stats = AcceptanceStatistics::default();
        #[allow(clippy::float_cmp)]
        {
            assert_eq!(stats.acceptance_rate(), 0.0);
            assert_eq!(stats.rejection_rate(), 0.0);
        }
    }

    #[test]
    fn aggregates_by_ability() {
        let analyzer = AcceptanceAnalyzer::default();
        let records = vec![
            record("kitchen", "cleaning", "chore_reminder", true),
            record("kitchen", "cleaning", "chore_reminder", false),
            record("living", "rest_relax", "small_talk", true),
        ];
        let by_ability = analyzer.aggregate(&records, |r| Some(r.ability.clone()));
        assert_eq!(by_ability.len(), 2);
        let chores = by_ability.get("chore_reminder").expect("present");
        assert_eq!(chores.total, 2);
        assert_eq!(chores.accepted, 1);
        assert_eq!(analyzer.usage_counts(&records).get("small_talk"), Some(&1));
    }

    #[test]
    fn flags_repeated_rejection_in_context() {
        let analyzer = AcceptanceAnalyzer::new(5);
        let mut records: Vec<InteractionRecord> = (0..6)
            .map(|_| record("bed_room", "rest_relax", "organize_documents", false))
            .collect();
        records.extend((0..6).map(|_| record("kitchen", "cleaning", "chore_reminder", true)));

        let patterns = analyzer.analyze_patterns(&records);
        assert!(patterns
            .iter()
            .any(|p| p.contains("High rejection rate") && p.contains("organize_documents")));
        assert!(!patterns.iter().any(|p| p.contains("chore_reminder") && p.contains("rejection")));
    }

    #[test]
    fn flags_single_ability_streak() {
        let analyzer = AcceptanceAnalyzer::default();
        let records: Vec<InteractionRecord> = (0..12)
            .map(|_| record("living", "use_internet", "check_meeting_time", true))
            .collect();
        let patterns = analyzer.analyze_patterns(&records);
        assert_eq!(
            patterns,
            vec!["Only 'check_meeting_time' was proposed in living/use_internet over 12 cycles"]
        );
    }

    #[test]
    fn flags_low_overall_acceptance() {
        let analyzer = AcceptanceAnalyzer::default();
        let records: Vec<InteractionRecord> = (0..10)
            .map(|i| {
                let ability = if i % 2 == 0 { "small_talk" } else { "call_someone" };
                record("living", "rest_relax", ability, i % 5 == 0)
            })
            .collect();
        let patterns = analyzer.analyze_patterns(&records);
        assert!(patterns
            .iter()
            .any(|p| p.contains("Overall acceptance rate is low")));
    }

    #[test]
    fn report_requires_minimum_interactions() {
        let analyzer = AcceptanceAnalyzer::new(10);
        let records = vec![record("kitchen", "cleaning", "wipe", true)];
        assert!(analyzer.report(&records).is_none());
        assert!(AcceptanceAnalyzer::new(0).report(&[]).is_none());
    }

    #[test]
    fn report_serializes_with_sorted_groups() {
        let analyzer = AcceptanceAnalyzer::new(2);
        let records = vec![
            record("kitchen", "cleaning", "wipe", true),
            record("kitchen", "cleaning", "sweep", false),
            record("bath_room", "cleaning", "wipe", true),
        ];
        let report = analyzer.report(&records).expect("enough data");
        assert_eq!(report.interactions, 3);
        assert_eq!(report.by_ability["wipe"].accepted, 2);
        assert_eq!(report.by_context["kitchen/cleaning"].total, 2);
        let keys: Vec<&String> = report.by_context.keys().collect();
        assert_eq!(keys, vec!["bath_room/cleaning", "kitchen/cleaning"]);

        let json = serde_json::to_string_pretty(&report).expect("serialize");
        assert!(json.contains("\"usage_counts\""));
        let back: AcceptanceReport = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.by_ability, report.by_ability);
    }

    #[test]
    fn fixture_log_produces_report() {
        let text = include_str!("../../../tests/fixtures/interactions/kitchen.jsonl");
        let records = ansprache_core::record::read_jsonl(text.as_bytes()).expect("valid jsonl");
        let report = AcceptanceAnalyzer::new(1).report(&records).expect("report");
        assert!((report.acceptance_rate - 0.5).abs() < 1e-12);
        assert_eq!(report.usage_counts.get("sweep"), Some(&1));
    }
}
