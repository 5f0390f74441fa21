//! Run summary table for the terminal

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{PipelineOutcome, TargetValueMapping};

/// Headline numbers of a finished run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineSummary {
    pub train_rows_in: usize,
    pub train_rows_out: usize,
    pub test_rows: usize,
    pub features_out: usize,
    pub synthetic_rows: usize,
    pub removed_rows: usize,
    /// `(label, before, after)` per target class
    pub class_balance: Vec<(String, usize, usize)>,
}

impl PipelineSummary {
    pub fn from_outcome(outcome: &PipelineOutcome, mapping: &TargetValueMapping) -> Self {
        let stats = &outcome.stats;
        let class_balance = stats
            .resample
            .before
            .iter()
            .map(|(code, before)| {
                let label = mapping
                    .label_for(*code)
                    .map(str::to_string)
                    .unwrap_or_else(|| code.to_string());
                let after = stats.resample.after.get(code).copied().unwrap_or(0);
                (label, *before, after)
            })
            .collect();

        Self {
            train_rows_in: stats.train_rows_in,
            train_rows_out: stats.train_rows_out,
            test_rows: stats.test_rows,
            features_out: stats.n_features(),
            synthetic_rows: stats.resample.synthetic,
            removed_rows: stats.resample.removed,
            class_balance,
        }
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Train rows (split)"),
            Cell::new(self.train_rows_in),
        ]);
        table.add_row(vec![
            Cell::new("🧪 Synthetic rows (SMOTE)"),
            Cell::new(self.synthetic_rows).fg(Color::Cyan),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Removed rows (ENN)"),
            Cell::new(self.removed_rows).fg(if self.removed_rows == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Train rows (final)"),
            Cell::new(self.train_rows_out)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![Cell::new("📋 Test rows"), Cell::new(self.test_rows)]);
        table.add_row(vec![
            Cell::new("🔢 Output features"),
            Cell::new(self.features_out),
        ]);
        for (label, before, after) in &self.class_balance {
            table.add_row(vec![
                Cell::new(format!("⚖️  {}", label)),
                Cell::new(format!("{} → {}", before, after)),
            ]);
        }
        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        // Indent the table
        for line in self.table().to_string().lines() {
            println!("    {}", line);
        }
    }
}
