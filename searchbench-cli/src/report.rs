use itertools::Itertools;
use searchbench::{
    format_duration, Algorithm, BenchmarkReport, CellOutcome, ColumnKey, PatternKind,
};
use std::fmt::Write;

const CHARACTERISTICS: [(&str, &str); 3] = [
    (
        "Boyer-Moore",
        "Generally performs well, especially for longer patterns, as it can skip portions of the text. \
         Its advantage is most visible when the pattern is absent or occurs late in the text.",
    ),
    (
        "Knuth-Morris-Pratt",
        "Guarantees linear time in the worst case and performs consistently across scenarios.",
    ),
    (
        "Rabin-Karp",
        "Uses a rolling hash, which suits multi-pattern search, but rarely beats the other two on a single pattern.",
    ),
];

/// Renders the report as a Markdown document
pub fn render_markdown(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_markdown(&mut out, report);
    out
}

fn text_index(report: &BenchmarkReport, text_id: &str) -> usize {
    report
        .texts
        .iter()
        .position(|t| t.name == text_id)
        .map_or(0, |i| i + 1)
}

fn column_title(report: &BenchmarkReport, column: &ColumnKey) -> String {
    format!(
        "Text {} ({})",
        text_index(report, &column.text_id),
        column.kind.label()
    )
}

fn cell_text(report: &BenchmarkReport, algorithm: Algorithm, column: &ColumnKey) -> String {
    match report.grid.get(algorithm, column) {
        Some(CellOutcome::Measured(stats)) => format_duration(stats.duration),
        Some(CellOutcome::Failed { .. }) => "failed".to_string(),
        None => "-".to_string(),
    }
}

fn write_markdown(out: &mut String, report: &BenchmarkReport) -> std::fmt::Result {
    let columns = report.grid.columns();
    let rankings = &report.rankings;

    writeln!(out, "# String Searching Algorithms Performance Comparison\n")?;

    writeln!(out, "## Test Environment\n")?;
    for (i, text) in report.texts.iter().enumerate() {
        match &text.error {
            None => writeln!(out, "- File {}: `{}` ({} bytes)", i + 1, text.name, text.bytes)?,
            Some(error) => writeln!(
                out,
                "- File {}: `{}` (failed to load: {})",
                i + 1,
                text.name,
                error
            )?,
        }
    }
    writeln!(
        out,
        "- Repetitions: {} (warm-up {}), statistic: {}, preprocessing: {}\n",
        report.settings.repetitions,
        report.settings.warmup_iterations,
        report.settings.statistic,
        report.settings.preprocessing
    )?;

    writeln!(out, "### Search Patterns:\n")?;
    for (text_id, scenarios) in &report.scenarios.iter().group_by(|s| s.text_id.as_str()) {
        writeln!(out, "**Text {}:**", text_index(report, text_id))?;
        for scenario in scenarios {
            writeln!(
                out,
                "- {} pattern: `{}`",
                scenario.kind.label(),
                scenario.pattern
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Results\n")?;
    writeln!(out, "### Execution Times\n")?;
    writeln!(
        out,
        "| Algorithm | {} | Overall |",
        columns.iter().map(|c| column_title(report, c)).join(" | ")
    )?;
    writeln!(
        out,
        "|:----------|{}|:--------|",
        columns.iter().map(|_| ":---------").join("|")
    )?;
    for entry in &rankings.overall {
        writeln!(
            out,
            "| {} | {} | {} |",
            entry.algorithm.display_name(),
            columns
                .iter()
                .map(|c| cell_text(report, entry.algorithm, c))
                .join(" | "),
            entry.mean.map_or_else(|| "n/a".to_string(), format_duration)
        )?;
    }

    let failures = report.grid.failed_cells();
    if failures > 0 {
        writeln!(out, "\n{} cell(s) failed and are excluded from the rankings.", failures)?;
    }

    writeln!(out, "\n### Fastest Algorithms\n")?;
    for column in columns {
        let title = format!(
            "Text {} ({} pattern)",
            text_index(report, &column.text_id),
            column.kind.label()
        );
        match rankings.winner_for(column) {
            Some(w) => writeln!(
                out,
                "- **{}**: {} - {}",
                title,
                w.algorithm.display_name(),
                format_duration(w.duration)
            )?,
            None => writeln!(out, "- **{}**: no successful measurement", title)?,
        }
    }
    match rankings.fastest_overall {
        Some(w) => writeln!(
            out,
            "- **Overall fastest algorithm**: {} - {}\n",
            w.algorithm.display_name(),
            format_duration(w.duration)
        )?,
        None => writeln!(out, "- **Overall fastest algorithm**: none\n")?,
    }

    writeln!(out, "## Conclusion\n")?;
    writeln!(
        out,
        "Based on measurements of {} on {} text(s) with both existing and fictional patterns:\n",
        report
            .grid
            .algorithms()
            .iter()
            .map(|a| a.display_name())
            .join(", "),
        report.texts.len()
    )?;
    for kind in PatternKind::ALL {
        let noun = kind.label().to_lowercase();
        match rankings.consistent_winner(kind) {
            Some(algorithm) => writeln!(
                out,
                "- For {} patterns, **{}** performs best on every text.",
                noun,
                algorithm.display_name()
            )?,
            None => {
                let per_text = rankings
                    .fastest_per_column
                    .iter()
                    .filter(|c| c.column.kind == kind)
                    .map(|c| {
                        format!(
                            "**{}** on Text {}",
                            c.winner
                                .map_or("none", |w| w.algorithm.display_name()),
                            text_index(report, &c.column.text_id)
                        )
                    })
                    .join(", ");
                writeln!(
                    out,
                    "- For {} patterns, performance varies: {}.",
                    noun, per_text
                )?;
            }
        }
    }
    if let Some(w) = rankings.fastest_overall {
        writeln!(
            out,
            "\nOverall, **{}** has the best average time across all successful cases.",
            w.algorithm.display_name()
        )?;
    }

    writeln!(out, "\n### Algorithm Characteristics\n")?;
    for (name, description) in CHARACTERISTICS {
        writeln!(out, "- **{}**: {}", name, description)?;
    }
    Ok(())
}
