use counter_aggregation::{CounterLabels, DenseTable, TableSummary};
use counter_core::{Counter, DenseRow, Lookup};
use std::fmt::Write;

const RULE_WIDTH: usize = 72;

/// Display the window bounds and per-counter statistics.
pub fn display_summary(summary: &TableSummary, labels: &CounterLabels) {
    print!("{}", render_summary(summary, labels));
}

/// Display the first and last `preview` rows of the table.
pub fn display_table(table: &DenseTable, preview: usize, labels: &CounterLabels) {
    print!("{}", render_table(table, preview, labels));
}

/// Display the answer to one `--second` query.
pub fn display_lookup(lookup: &Lookup, labels: &CounterLabels) {
    println!("{}", render_lookup(lookup, labels));
}

pub fn render_summary(summary: &TableSummary, labels: &CounterLabels) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "Seconds {}..={} ({} rows, {} active, {} idle, longest idle run {})",
        summary.first_second,
        summary.last_second,
        summary.span_seconds,
        summary.active_seconds,
        summary.idle_seconds,
        summary.longest_idle_run
    );
    for counter in Counter::all() {
        let stats = summary.stats(counter);
        let _ = writeln!(
            out,
            "{:<12} total {:>12}  peak {:>10} @ {:<6}  active {:>6}  mean {:.4}/s",
            labels.label(counter),
            stats.total,
            stats.peak.count,
            stats.peak.second,
            stats.active_seconds,
            stats.mean_rate
        );
    }
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

pub fn render_table(table: &DenseTable, preview: usize, labels: &CounterLabels) -> String {
    let mut out = String::new();
    if preview == 0 || table.is_empty() {
        return out;
    }

    let a = labels.label(Counter::A);
    let b = labels.label(Counter::B);
    let _ = writeln!(
        out,
        "{:>8} {:>14} {:>14} {:>14} {:>14}",
        "Seconds",
        format!("{a}_Count"),
        format!("{a}_Cumulative"),
        format!("{b}_Count"),
        format!("{b}_Cumulative")
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    let rows = table.rows();
    if rows.len() <= preview * 2 {
        rows.iter().for_each(|row| write_row(&mut out, row));
    } else {
        let _ = writeln!(out, "=== FIRST {preview} ROWS ===");
        rows[..preview].iter().for_each(|row| write_row(&mut out, row));
        let _ = writeln!(out, "\n=== LAST {preview} ROWS ===");
        rows[rows.len() - preview..]
            .iter()
            .for_each(|row| write_row(&mut out, row));
    }

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "Total rows: {}", rows.len());
    out
}

fn write_row(out: &mut String, row: &DenseRow) {
    let _ = writeln!(
        out,
        "{:>8} {:>14} {:>14} {:>14} {:>14}",
        row.second, row.count_a, row.cumulative_a, row.count_b, row.cumulative_b
    );
}

pub fn render_lookup(lookup: &Lookup, labels: &CounterLabels) -> String {
    match lookup {
        Lookup::Found(sample) => {
            let a = labels.label(Counter::A);
            let b = labels.label(Counter::B);
            format!(
                "{a} Count: {}, {a} Cumulative: {}, {b} Count: {}, {b} Cumulative: {}",
                sample.count_a, sample.cumulative_a, sample.count_b, sample.cumulative_b
            )
        }
        Lookup::OutOfRange { second, lo, hi } => {
            format!("No data for the given second ({second} outside {lo}..={hi})")
        }
        Lookup::NotInteger { input } => format!("Invalid second {input:?}: not an integer"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_aggregation::aggregate;
    use counter_core::Event;
    use chrono::NaiveTime;

    fn table(seconds: std::ops::RangeInclusive<u32>) -> DenseTable {
        let events: Vec<Event> = seconds
            .map(|s| Event::new(NaiveTime::from_num_seconds_from_midnight_opt(s, 0).unwrap(), 1, 2))
            .collect();
        aggregate(&events).unwrap()
    }

    #[test]
    fn test_lookup_found() {
        let table = table(1..=3);
        let text = render_lookup(&table.lookup(2), &CounterLabels::default());
        assert_eq!(
            text,
            "COUN Count: 1, COUN Cumulative: 2, ENER Count: 2, ENER Cumulative: 4"
        );
    }

    #[test]
    fn test_lookup_misses() {
        let table = table(1..=3);
        let labels = CounterLabels::default();
        assert!(render_lookup(&table.lookup(9), &labels).starts_with("No data for the given second"));
        assert!(render_lookup(&table.lookup_str("1.5"), &labels).contains("not an integer"));
    }

    #[test]
    fn test_short_table_printed_whole() {
        let text = render_table(&table(1..=3), 10, &CounterLabels::default());
        assert!(!text.contains("FIRST"));
        assert!(text.contains("COUN_Cumulative"));
        assert!(text.contains("Total rows: 3"));
    }

    #[test]
    fn test_long_table_shows_head_and_tail() {
        let text = render_table(&table(0..=99), 5, &CounterLabels::new("hits", "energy"));
        assert!(text.contains("=== FIRST 5 ROWS ==="));
        assert!(text.contains("=== LAST 5 ROWS ==="));
        assert!(text.contains("hits_Count"));
        assert_eq!(text.lines().filter(|l| l.trim_start().starts_with("50 ")).count(), 0);
        assert!(text.contains("Total rows: 100"));
    }

    #[test]
    fn test_zero_preview_prints_nothing() {
        assert!(render_table(&table(1..=3), 0, &CounterLabels::default()).is_empty());
    }

    #[test]
    fn test_summary_names_counters() {
        let table = table(1..=3);
        let text = render_summary(&TableSummary::from_table(&table), &CounterLabels::default());
        assert!(text.contains("Seconds 1..=3"));
        assert!(text.contains("COUN"));
        assert!(text.contains("ENER"));
    }
}
