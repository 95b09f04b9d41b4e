//! Performance measurement log and summary.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RingLog;

// ============================================================================
// PerformanceCategory
// ============================================================================

/// Instrumentation categories the bridge subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceCategory {
    /// Document navigation timing.
    #[serde(rename = "navigation")]
    Navigation,
    /// Resource fetch timing.
    #[serde(rename = "resource")]
    Resource,
    /// First paint / first contentful paint.
    #[serde(rename = "paint")]
    Paint,
    /// Layout shift scores.
    #[serde(rename = "layout-shift")]
    LayoutShift,
    /// Largest contentful paint candidates.
    #[serde(rename = "largest-contentful-paint")]
    LargestContentfulPaint,
    /// Main-thread tasks over 50ms.
    #[serde(rename = "longtask")]
    LongTask,
}

impl PerformanceCategory {
    /// Every category, in subscription order.
    pub const ALL: [PerformanceCategory; 6] = [
        PerformanceCategory::Navigation,
        PerformanceCategory::Resource,
        PerformanceCategory::Paint,
        PerformanceCategory::LayoutShift,
        PerformanceCategory::LargestContentfulPaint,
        PerformanceCategory::LongTask,
    ];

    /// Entry type name as the page reports it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Resource => "resource",
            Self::Paint => "paint",
            Self::LayoutShift => "layout-shift",
            Self::LargestContentfulPaint => "largest-contentful-paint",
            Self::LongTask => "longtask",
        }
    }
}

impl fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PerformanceRecord
// ============================================================================

/// One reported measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    /// Category the measurement belongs to.
    pub category: PerformanceCategory,
    /// Entry name (URL for resources, `first-paint` for paints, ...).
    pub name: String,
    /// Start time relative to navigation start, in ms.
    pub start_time: f64,
    /// Duration in ms.
    pub duration: f64,
    /// Category-specific fields (`value` for layout shifts, `size` for LCP,
    /// `domContentLoaded` / `loadEvent` for navigation, ...).
    #[serde(skip_serializing_if = "Value::is_null")]
    pub detail: Value,
}

impl PerformanceRecord {
    /// Creates a record without detail.
    #[must_use]
    pub fn new(
        category: PerformanceCategory,
        name: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            start_time,
            duration,
            detail: Value::Null,
        }
    }

    /// Attaches category-specific detail.
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    fn detail_f64(&self, key: &str) -> Option<f64> {
        self.detail.get(key).and_then(Value::as_f64)
    }
}

// ============================================================================
// PerformanceSummary
// ============================================================================

/// Aggregate view over the performance log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    /// Retained entries per category.
    pub counts: FxHashMap<String, usize>,
    /// `first-paint` start time.
    pub first_paint: Option<f64>,
    /// `first-contentful-paint` start time.
    pub first_contentful_paint: Option<f64>,
    /// Latest largest-contentful-paint candidate.
    pub largest_contentful_paint: Option<f64>,
    /// Sum of layout shift values not caused by recent input.
    pub cumulative_layout_shift: f64,
    /// Long tasks observed.
    pub long_task_count: usize,
    /// Total long-task time in ms.
    pub long_task_time: f64,
    /// Resources observed.
    pub resource_count: usize,
    /// Mean resource duration in ms.
    pub resource_mean_duration: Option<f64>,
    /// Most recent navigation entry.
    pub navigation: Option<NavigationTiming>,
}

/// Timing of the most recent navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTiming {
    /// Navigated URL.
    pub name: String,
    /// Total navigation duration.
    pub duration: f64,
    /// `domContentLoadedEventEnd`, when reported.
    pub dom_content_loaded: Option<f64>,
    /// `loadEventEnd`, when reported.
    pub load_event: Option<f64>,
}

impl PerformanceSummary {
    /// Aggregates every retained entry.
    #[must_use]
    pub fn from_log(log: &RingLog<PerformanceRecord>) -> Self {
        let mut summary = Self::default();
        let mut resource_total = 0.0;

        for entry in log.iter() {
            let record = &entry.record;
            *summary
                .counts
                .entry(record.category.as_str().to_string())
                .or_default() += 1;

            match record.category {
                PerformanceCategory::Paint => match record.name.as_str() {
                    "first-paint" => summary.first_paint = Some(record.start_time),
                    "first-contentful-paint" => {
                        summary.first_contentful_paint = Some(record.start_time);
                    }
                    _ => {}
                },
                PerformanceCategory::LargestContentfulPaint => {
                    let render_time = record
                        .detail_f64("renderTime")
                        .filter(|t| *t > 0.0)
                        .unwrap_or(record.start_time);
                    summary.largest_contentful_paint = Some(render_time);
                }
                PerformanceCategory::LayoutShift => {
                    let had_input = record
                        .detail
                        .get("hadRecentInput")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    if !had_input {
                        summary.cumulative_layout_shift += record.detail_f64("value").unwrap_or(0.0);
                    }
                }
                PerformanceCategory::LongTask => {
                    summary.long_task_count += 1;
                    summary.long_task_time += record.duration;
                }
                PerformanceCategory::Resource => {
                    summary.resource_count += 1;
                    resource_total += record.duration;
                }
                PerformanceCategory::Navigation => {
                    summary.navigation = Some(NavigationTiming {
                        name: record.name.clone(),
                        duration: record.duration,
                        dom_content_loaded: record.detail_f64("domContentLoadedEventEnd"),
                        load_event: record.detail_f64("loadEventEnd"),
                    });
                }
            }
        }

        if summary.resource_count > 0 {
            summary.resource_mean_duration = Some(resource_total / summary.resource_count as f64);
        }

        summary
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_category_wire_names() {
        let json = serde_json::to_string(&PerformanceCategory::LongTask).expect("serialize");
        assert_eq!(json, "\"longtask\"");
        let parsed: PerformanceCategory =
            serde_json::from_str("\"layout-shift\"").expect("parse");
        assert_eq!(parsed, PerformanceCategory::LayoutShift);
    }

    #[test]
    fn test_summary_aggregates() {
        let mut log = RingLog::new(50);
        log.push(PerformanceRecord::new(PerformanceCategory::Paint, "first-paint", 120.0, 0.0));
        log.push(PerformanceRecord::new(
            PerformanceCategory::Paint,
            "first-contentful-paint",
            130.0,
            0.0,
        ));
        log.push(
            PerformanceRecord::new(PerformanceCategory::LayoutShift, "", 200.0, 0.0)
                .with_detail(json!({"value": 0.1, "hadRecentInput": false})),
        );
        log.push(
            PerformanceRecord::new(PerformanceCategory::LayoutShift, "", 210.0, 0.0)
                .with_detail(json!({"value": 0.5, "hadRecentInput": true})),
        );
        log.push(PerformanceRecord::new(PerformanceCategory::LongTask, "self", 300.0, 80.0));
        log.push(PerformanceRecord::new(PerformanceCategory::Resource, "/a.js", 10.0, 20.0));
        log.push(PerformanceRecord::new(PerformanceCategory::Resource, "/b.css", 10.0, 40.0));
        log.push(
            PerformanceRecord::new(PerformanceCategory::LargestContentfulPaint, "", 400.0, 0.0)
                .with_detail(json!({"renderTime": 410.0})),
        );

        let summary = PerformanceSummary::from_log(&log);
        assert_eq!(summary.first_paint, Some(120.0));
        assert_eq!(summary.first_contentful_paint, Some(130.0));
        assert!((summary.cumulative_layout_shift - 0.1).abs() < f64::EPSILON);
        assert_eq!(summary.long_task_count, 1);
        assert_eq!(summary.long_task_time, 80.0);
        assert_eq!(summary.resource_mean_duration, Some(30.0));
        assert_eq!(summary.largest_contentful_paint, Some(410.0));
        assert_eq!(summary.counts.get("resource"), Some(&2));
    }
}
