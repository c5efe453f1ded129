//! Column summaries and chart binning for the visualization step.

use serde_json::Value;

use crate::models::Row;

/// Displayed categories are capped; everything past the cap is dropped
/// from the chart (the summary line still reports full counts).
pub const MAX_CATEGORIES: usize = 20;

/// Upper bound on histogram bins regardless of sample size.
pub const MAX_BINS: usize = 20;

/// Missing-value rule shared by summaries, feature replay and cleaning:
/// null, empty string, or the literal strings "nan"/"NaN". Absent row
/// keys count as missing at the call sites.
pub fn is_missing(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty() || s == "nan" || s == "NaN",
        _ => false,
    }
}

/// Numeric coercion for cells: numbers pass through, strings are parsed.
/// Non-finite results are discarded.
pub fn to_numeric(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Raw material for one column's chart.
#[derive(Debug, Clone, Default)]
pub struct ColumnSummary {
    pub values: Vec<Value>,
    pub missing: usize,
}

impl ColumnSummary {
    pub fn total(&self) -> usize {
        self.values.len() + self.missing
    }

    pub fn missing_percent(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.missing as f64 / self.total() as f64 * 100.0
        }
    }
}

/// Split a column into present values and a missing count.
pub fn summarize(rows: &[Row], column: &str) -> ColumnSummary {
    let mut summary = ColumnSummary::default();
    for row in rows {
        match row.get(column) {
            Some(v) if !is_missing(v) => summary.values.push(v.clone()),
            _ => summary.missing += 1,
        }
    }
    summary
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBin {
    pub label: String,
    pub count: usize,
}

/// Stringified cell text used for grouping and display.
pub fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Group values by exact stringified identity, most frequent first.
///
/// The sort is stable so equal counts keep first-seen order, and the
/// result is capped at [`MAX_CATEGORIES`].
pub fn categorical_bins(values: &[Value]) -> Vec<CategoryBin> {
    let mut bins: Vec<CategoryBin> = Vec::new();
    for v in values {
        let label = value_text(v);
        match bins.iter_mut().find(|b| b.label == label) {
            Some(bin) => bin.count += 1,
            None => bins.push(CategoryBin { label, count: 1 }),
        }
    }
    bins.sort_by(|a, b| b.count.cmp(&a.count));
    bins.truncate(MAX_CATEGORIES);
    bins
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn label(&self) -> String {
        format!("{:.2}-{:.2}", self.lower, self.upper)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid: usize,
}

/// Equal-width histogram with `min(20, ceil(sqrt(n)))` bins.
///
/// Values exactly on the global maximum land in the last bin (the final
/// bin's upper edge is inclusive; interior edges are half-open). Returns
/// `None` when no value coerces to a finite number — a reportable empty
/// state rather than an error.
pub fn histogram(values: &[Value]) -> Option<Histogram> {
    let numeric: Vec<f64> = values.iter().filter_map(to_numeric).collect();
    if numeric.is_empty() {
        return None;
    }

    let n = numeric.len();
    let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = numeric.iter().sum::<f64>() / n as f64;

    // A constant column degenerates to one bin holding everything.
    if max == min {
        return Some(Histogram {
            bins: vec![HistogramBin {
                lower: min,
                upper: max,
                count: n,
            }],
            min,
            max,
            mean,
            valid: n,
        });
    }

    let bin_count = MAX_BINS.min((n as f64).sqrt().ceil() as usize).max(1);
    let width = (max - min) / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for v in &numeric {
        let mut idx = ((v - min) / width) as usize;
        if idx >= bin_count {
            idx = bin_count - 1;
        }
        counts[idx] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count,
        })
        .collect();

    Some(Histogram {
        bins,
        min,
        max,
        mean,
        valid: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_rule_matches_sentinels() {
        assert!(is_missing(&Value::Null));
        assert!(is_missing(&json!("")));
        assert!(is_missing(&json!("nan")));
        assert!(is_missing(&json!("NaN")));
        assert!(!is_missing(&json!("NAN")));
        assert!(!is_missing(&json!(0)));
        assert!(!is_missing(&json!(false)));
    }

    #[test]
    fn summarize_counts_absent_keys_as_missing() {
        let rows: Vec<Row> = vec![
            serde_json::from_value(json!({"a": 1})).unwrap(),
            serde_json::from_value(json!({"b": 2})).unwrap(),
            serde_json::from_value(json!({"a": null})).unwrap(),
        ];
        let s = summarize(&rows, "a");
        assert_eq!(s.values.len(), 1);
        assert_eq!(s.missing, 2);
        assert_eq!(s.total(), 3);
    }

    #[test]
    fn categorical_bins_sorted_with_stable_ties() {
        let values: Vec<Value> = ["b", "a", "a", "c", "b", "d"]
            .iter()
            .map(|s| json!(s))
            .collect();
        let bins = categorical_bins(&values);
        let labels: Vec<&str> = bins.iter().map(|b| b.label.as_str()).collect();
        // a and b tie at 2; b was seen first. c and d tie at 1; c first.
        assert_eq!(labels, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn categorical_bins_capped_at_twenty() {
        let values: Vec<Value> = (0..40).map(|i| json!(format!("cat{i}"))).collect();
        assert_eq!(categorical_bins(&values).len(), MAX_CATEGORIES);
    }

    #[test]
    fn histogram_of_ten_values_has_four_bins() {
        let values: Vec<Value> = (1..=10).map(|i| json!(i)).collect();
        let h = histogram(&values).unwrap();
        // n = 10 → ceil(sqrt(10)) = 4 bins.
        assert_eq!(h.bins.len(), 4);
        assert_eq!(h.bins.iter().map(|b| b.count).sum::<usize>(), 10);
        // Max value sits in the last bin, not a phantom fifth one.
        assert!(h.bins.last().unwrap().count >= 1);
        assert_eq!(h.min, 1.0);
        assert_eq!(h.max, 10.0);
        assert!((h.mean - 5.5).abs() < 1e-9);
    }

    #[test]
    fn histogram_coerces_strings_and_drops_garbage() {
        let values = vec![json!("1.5"), json!("oops"), json!(2.5), json!("inf")];
        let h = histogram(&values).unwrap();
        assert_eq!(h.valid, 2);
    }

    #[test]
    fn histogram_of_constant_column_is_single_bin() {
        let values: Vec<Value> = (0..5).map(|_| json!(7)).collect();
        let h = histogram(&values).unwrap();
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.bins[0].count, 5);
    }

    #[test]
    fn histogram_with_no_numeric_values_is_none() {
        let values = vec![json!("x"), json!("y")];
        assert!(histogram(&values).is_none());
    }
}
