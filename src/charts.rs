// Chart bindings: which group goes to which mount, over which domain

use crate::filter::DimensionKey;
use crate::index::{CrossFilter, Dimension, Group};
use crate::pager::YearPager;
use crate::record::DayOfWeek;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

pub const MONTHLY_MOUNT: &str = "monthly-chart";
pub const HOURLY_MOUNT: &str = "hourly-chart";
pub const DOW_MOUNT: &str = "dow-chart";
pub const TYPES_MOUNT: &str = "types-chart";
pub const WORD_CLOUD_MOUNT: &str = "word-cloud-chart-modal";

const SHORT_MONTHS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Row,
    Pie,
}

/// Key domain of a chart axis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// January 1st to December 31st of one year
    Months { start: NaiveDate, end: NaiveDate },
    /// Integers in `[0, 24)`
    Hours,
    /// Fixed week order, Monday first
    Week,
    /// Whatever keys the group holds
    Observed,
}

/// Static description of one chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartBinding {
    pub mount: &'static str,
    pub dimension: Dimension,
    pub kind: ChartKind,
    pub axis_label: Option<&'static str>,
}

/// The four charts, in redraw order
pub const BINDINGS: [ChartBinding; 4] = [
    ChartBinding {
        mount: MONTHLY_MOUNT,
        dimension: Dimension::Month,
        kind: ChartKind::Bar,
        axis_label: Some("Total Búsquedas"),
    },
    ChartBinding {
        mount: HOURLY_MOUNT,
        dimension: Dimension::Hour,
        kind: ChartKind::Bar,
        axis_label: Some("Total Búsquedas"),
    },
    ChartBinding {
        mount: DOW_MOUNT,
        dimension: Dimension::DayOfWeek,
        kind: ChartKind::Row,
        axis_label: None,
    },
    ChartBinding {
        mount: TYPES_MOUNT,
        dimension: Dimension::SearchType,
        kind: ChartKind::Pie,
        axis_label: None,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub key: DimensionKey,
    pub label: String,
    pub count: usize,
}

/// Everything a surface needs to draw one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub mount: &'static str,
    pub kind: ChartKind,
    pub dimension: Dimension,
    pub domain: Domain,
    pub axis_label: Option<&'static str>,
    pub bars: Vec<Bar>,
}

impl ChartFrame {
    pub fn max_count(&self) -> usize {
        self.bars.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Output side of the dashboard
pub trait RenderSurface {
    fn draw(&mut self, frame: &ChartFrame);
    fn clear(&mut self, mount: &str);
    fn set_year_label(&mut self, label: &str);
    fn set_year_nav(&mut self, prev_enabled: bool, next_enabled: bool);
}

/// Month domain for a year
pub fn year_domain(year: i32) -> Option<Domain> {
    Some(Domain::Months {
        start: NaiveDate::from_ymd_opt(year, 1, 1)?,
        end: NaiveDate::from_ymd_opt(year, 12, 31)?,
    })
}

fn month_label(date: NaiveDate) -> String {
    SHORT_MONTHS[date.month0() as usize].to_string()
}

fn bar(key: DimensionKey, label: String, group: &Group) -> Bar {
    let count = group.get(&key);
    Bar { key, label, count }
}

fn bars_for(domain: &Domain, group: &Group) -> Vec<Bar> {
    match domain {
        Domain::Months { start, .. } => (1..=12)
            .filter_map(|m| NaiveDate::from_ymd_opt(start.year(), m, 1))
            .map(|d| bar(DimensionKey::Month(d), month_label(d), group))
            .collect(),
        Domain::Hours => (0..24)
            .map(|h| bar(DimensionKey::Hour(h), h.to_string(), group))
            .collect(),
        Domain::Week => DayOfWeek::WEEK
            .iter()
            .map(|d| bar(DimensionKey::Day(*d), d.name().to_string(), group))
            .collect(),
        Domain::Observed => group
            .entries
            .iter()
            .map(|e| Bar {
                key: e.key.clone(),
                label: e.key.to_string(),
                count: e.count,
            })
            .collect(),
    }
}

/// Binds index groups to render targets
pub struct ChartBindings;

impl ChartBindings {
    /// Frames for the current index and pager state. Empty when there is nothing to draw.
    pub fn frames(index: &CrossFilter, pager: &YearPager) -> Vec<ChartFrame> {
        if index.is_empty() {
            return Vec::new();
        }

        let mut frames = Vec::with_capacity(BINDINGS.len());
        for binding in BINDINGS {
            let domain = match binding.dimension {
                Dimension::Month => match pager.current_year().and_then(year_domain) {
                    Some(d) => d,
                    None => continue,
                },
                Dimension::Hour => Domain::Hours,
                Dimension::DayOfWeek => Domain::Week,
                Dimension::SearchType => Domain::Observed,
            };

            let group = index.current_group(binding.dimension);
            frames.push(ChartFrame {
                mount: binding.mount,
                kind: binding.kind,
                dimension: binding.dimension,
                bars: bars_for(&domain, &group),
                domain,
                axis_label: binding.axis_label,
            });
        }
        frames
    }

    /// Recompute every group and draw all charts in fixed order
    pub fn redraw_all<R: RenderSurface + ?Sized>(index: &CrossFilter, pager: &YearPager, surface: &mut R) {
        let frames = Self::frames(index, pager);
        debug!(frames = frames.len(), year = ?pager.current_year(), "Redrawing charts");

        if frames.is_empty() {
            Self::clear_all(surface);
            return;
        }
        for frame in &frames {
            surface.draw(frame);
        }
    }

    pub fn clear_all<R: RenderSurface + ?Sized>(surface: &mut R) {
        for binding in BINDINGS {
            surface.clear(binding.mount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawRow, normalize};

    #[derive(Default)]
    struct Recorder {
        drawn: Vec<&'static str>,
        cleared: Vec<String>,
    }

    impl RenderSurface for Recorder {
        fn draw(&mut self, frame: &ChartFrame) {
            self.drawn.push(frame.mount);
        }
        fn clear(&mut self, mount: &str) {
            self.cleared.push(mount.to_string());
        }
        fn set_year_label(&mut self, _label: &str) {}
        fn set_year_nav(&mut self, _prev_enabled: bool, _next_enabled: bool) {}
    }

    fn loaded() -> (CrossFilter, YearPager) {
        let records = normalize(&[
            RawRow::new("2022-11-07 09:00:00", Some("autor"), None),
            RawRow::new("2023-01-02 09:00:00", Some("autor"), None),
            RawRow::new("2023-01-03 18:00:00", Some("titulo"), None),
            RawRow::new("2023-04-09 18:30:00", Some("titulo"), None),
        ]);
        let pager = YearPager::init(&records);
        (CrossFilter::build(records), pager)
    }

    fn frame<'a>(frames: &'a [ChartFrame], mount: &str) -> &'a ChartFrame {
        frames.iter().find(|f| f.mount == mount).unwrap()
    }

    #[test]
    fn test_frames_cover_all_bindings_in_order() {
        let (index, pager) = loaded();
        let frames = ChartBindings::frames(&index, &pager);

        let mounts: Vec<&str> = frames.iter().map(|f| f.mount).collect();
        assert_eq!(mounts, vec![MONTHLY_MOUNT, HOURLY_MOUNT, DOW_MOUNT, TYPES_MOUNT]);
        assert_eq!(frame(&frames, DOW_MOUNT).kind, ChartKind::Row);
        assert_eq!(frame(&frames, TYPES_MOUNT).kind, ChartKind::Pie);
    }

    #[test]
    fn test_monthly_frame_shows_current_year_only() {
        let (index, mut pager) = loaded();

        let frames = ChartBindings::frames(&index, &pager);
        let monthly = frame(&frames, MONTHLY_MOUNT);
        assert_eq!(monthly.domain, year_domain(2022).unwrap());
        assert_eq!(monthly.bars.len(), 12);
        assert_eq!(monthly.bars[10].label, "Nov");
        assert_eq!(monthly.bars[10].count, 1);
        assert_eq!(monthly.bars.iter().map(|b| b.count).sum::<usize>(), 1);

        pager.next();
        let frames = ChartBindings::frames(&index, &pager);
        let monthly = frame(&frames, MONTHLY_MOUNT);
        assert_eq!(monthly.bars[0].label, "Ene");
        assert_eq!(monthly.bars[0].count, 2);
        assert_eq!(monthly.bars[3].count, 1);
    }

    #[test]
    fn test_fixed_domains() {
        let (index, pager) = loaded();
        let frames = ChartBindings::frames(&index, &pager);

        let hourly = frame(&frames, HOURLY_MOUNT);
        assert_eq!(hourly.domain, Domain::Hours);
        assert_eq!(hourly.bars.len(), 24);
        assert_eq!(hourly.bars[9].count, 2);
        assert_eq!(hourly.bars[18].count, 2);
        assert_eq!(hourly.max_count(), 2);

        let dow = frame(&frames, DOW_MOUNT);
        let labels: Vec<&str> = dow.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Lun", "Mar", "Mié", "Jue", "Vie", "Sáb", "Dom"]);
        assert_eq!(dow.bars[0].count, 2);
        assert_eq!(dow.bars[6].count, 1);

        let types = frame(&frames, TYPES_MOUNT);
        assert_eq!(types.domain, Domain::Observed);
        let labels: Vec<&str> = types.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["autor", "titulo"]);
    }

    #[test]
    fn test_redraw_all_draws_or_clears() {
        let (index, pager) = loaded();
        let mut surface = Recorder::default();
        ChartBindings::redraw_all(&index, &pager, &mut surface);
        assert_eq!(surface.drawn.len(), 4);
        assert!(surface.cleared.is_empty());

        let empty = CrossFilter::build(Vec::new());
        let mut surface = Recorder::default();
        ChartBindings::redraw_all(&empty, &YearPager::default(), &mut surface);
        assert!(surface.drawn.is_empty());
        assert_eq!(surface.cleared.len(), 4);
    }
}
