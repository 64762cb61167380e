// Terminal rendering of dashboard frames

use crate::charts::{BINDINGS, ChartFrame, ChartKind, RenderSurface, WORD_CLOUD_MOUNT};
use crate::words::WeightedWord;
use colored::Colorize;
use std::collections::BTreeMap;

const DEFAULT_BAR_WIDTH: usize = 40;

/// Draws charts as horizontal text bars, one panel per mount
#[derive(Debug, Clone)]
pub struct TextSurface {
    bar_width: usize,
    panels: BTreeMap<String, String>,
    year_label: String,
    prev_enabled: bool,
    next_enabled: bool,
}

impl Default for TextSurface {
    fn default() -> Self {
        Self::new(DEFAULT_BAR_WIDTH)
    }
}

impl TextSurface {
    pub fn new(bar_width: usize) -> Self {
        Self {
            bar_width: bar_width.max(1),
            panels: BTreeMap::new(),
            year_label: String::new(),
            prev_enabled: false,
            next_enabled: false,
        }
    }

    pub fn panel(&self, mount: &str) -> Option<&str> {
        self.panels.get(mount).map(String::as_str)
    }

    pub fn year_label(&self) -> &str {
        &self.year_label
    }

    pub fn nav(&self) -> (bool, bool) {
        (self.prev_enabled, self.next_enabled)
    }

    /// Header with year navigation followed by every non-empty panel in chart order
    pub fn render(&self) -> String {
        let prev = if self.prev_enabled { "<" } else { " " };
        let next = if self.next_enabled { ">" } else { " " };
        let mut out = format!("{} {} {}\n", prev, self.year_label.bold(), next);

        for binding in BINDINGS {
            if let Some(panel) = self.panels.get(binding.mount).filter(|p| !p.is_empty()) {
                out.push('\n');
                out.push_str(panel);
            }
        }
        out
    }

    fn scaled(&self, count: usize, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (count * self.bar_width).div_ceil(max)
    }
}

impl RenderSurface for TextSurface {
    fn draw(&mut self, frame: &ChartFrame) {
        let max = frame.max_count();
        let total: usize = frame.bars.iter().map(|b| b.count).sum();
        let label_width = frame.bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);

        let mut panel = format!("{}\n", frame.mount.underline());
        if let Some(axis) = frame.axis_label {
            panel.push_str(&format!("  ({})\n", axis));
        }

        for bar in &frame.bars {
            let glyphs = "█".repeat(self.scaled(bar.count, max));
            let painted = match frame.kind {
                ChartKind::Bar => glyphs.blue(),
                ChartKind::Row => glyphs.cyan(),
                ChartKind::Pie => glyphs.magenta(),
            };
            let pad = " ".repeat(label_width - bar.label.chars().count());

            match frame.kind {
                ChartKind::Pie if total > 0 => {
                    let pct = bar.count as f64 * 100.0 / total as f64;
                    panel.push_str(&format!("  {}{} {} {} ({:.1}%)\n", bar.label, pad, painted, bar.count, pct));
                }
                _ => panel.push_str(&format!("  {}{} {} {}\n", bar.label, pad, painted, bar.count)),
            }
        }

        self.panels.insert(frame.mount.to_string(), panel);
    }

    fn clear(&mut self, mount: &str) {
        self.panels.remove(mount);
    }

    fn set_year_label(&mut self, label: &str) {
        self.year_label = label.to_string();
    }

    fn set_year_nav(&mut self, prev_enabled: bool, next_enabled: bool) {
        self.prev_enabled = prev_enabled;
        self.next_enabled = next_enabled;
    }
}

/// Word list as a panel of its own, heaviest words first
pub fn render_words(words: &[WeightedWord]) -> String {
    let mut out = format!("{}\n", WORD_CLOUD_MOUNT.underline());
    for w in words {
        out.push_str(&format!("{:>6}  {}\n", w.count, w.word.bold()));
    }
    out
}
