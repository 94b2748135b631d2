//! Timeline geometry: date domain, month ticks, row bucketing and bar sizing.
//!
//! Everything here works in content space (before pan/zoom) and is free of
//! any painter, so the layout rules can be checked without a window.

use std::borrow::Cow;

use chrono::Months;
use itertools::{Itertools, MinMaxResult};

use crate::model::{date_from_ms, ProjectRecord};

/// Height of the header band plus the month scale; project rows start here.
pub const HEADER_HEIGHT: f32 = 190.0;
pub const ROW_HEIGHT: f32 = 72.0;
pub const FOOTER_HEIGHT: f32 = 64.0;

pub const INFO_COLUMN_X: f32 = 28.0;
pub const NAME_COLUMN_WIDTH: f32 = 190.0;
pub const TIMELINE_LEFT: f32 = 320.0;
pub const TIMELINE_RIGHT_MARGIN: f32 = 150.0;
pub const MIN_TIMELINE_WIDTH: f32 = 240.0;

pub const BAR_HEIGHT: f32 = 30.0;
pub const MIN_BAR_WIDTH: f32 = 60.0;
pub const MIN_FILL_WIDTH: f32 = 28.0;
pub const LABEL_INSIDE_MIN_FILL: f32 = 56.0;
pub const LABEL_INSIDE_MIN_PERCENT: f64 = 15.0;

pub const ELLIPSIS: &str = "...";

const MONTH_MS: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;
/// Above this many months the scale labels every n-th month instead.
pub const MAX_MONTH_TICKS: u32 = 24;

/// The [min, max] timestamp span covering every displayed project.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateDomain {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTick {
    pub fraction: f32,
    pub label: String,
    pub emphasized: bool,
}

impl DateDomain {
    /// Min/max over all start and target dates; `None` when no project has
    /// a usable date.
    pub fn from_projects(projects: &[ProjectRecord]) -> Option<Self> {
        let stamps = projects
            .iter()
            .flat_map(|p| [p.start_ms(), p.end_ms()])
            // Unparseable dates stay out of the domain instead of turning it
            // into NaN; those rows keep their info panel but get no bar.
            .filter(|t| t.is_finite());
        match stamps.minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(t) => Some(Self { min: t, max: t }),
            MinMaxResult::MinMax(min, max) => Some(Self { min, max }),
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Proportional position of `ms` inside the domain. NaN in, NaN out.
    pub fn fraction(&self, ms: f64) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            return if ms.is_nan() { f32::NAN } else { 0.0 };
        }
        ((ms - self.min) / span) as f32
    }

    pub fn contains(&self, ms: f64) -> bool {
        ms >= self.min && ms <= self.max
    }

    /// Where the today marker goes, if today falls inside the domain.
    /// Both ends count as inside.
    pub fn today_fraction(&self, now_ms: f64) -> Option<f32> {
        self.contains(now_ms).then(|| self.fraction(now_ms))
    }

    /// Whole months covering the span, at least one.
    pub fn month_count(&self) -> u32 {
        ((self.span() / MONTH_MS).ceil() as u32).max(1)
    }

    /// Evenly spaced month ticks from the domain start; first and last are
    /// emphasized. Long spans are thinned to at most `MAX_MONTH_TICKS` steps.
    pub fn month_ticks(&self) -> Vec<MonthTick> {
        let months = self.month_count();
        let stride = months.div_ceil(MAX_MONTH_TICKS).max(1);
        let start = date_from_ms(self.min);
        (0..months)
            .step_by(stride as usize)
            .chain(std::iter::once(months))
            .map(|i| {
                let label = start
                    .and_then(|d| d.checked_add_months(Months::new(i)))
                    .map(|d| d.format("%b %Y").to_string())
                    .unwrap_or_default();
                MonthTick {
                    fraction: i as f32 / months as f32,
                    label,
                    emphasized: i == 0 || i == months,
                }
            })
            .collect()
    }
}

/// Horizontal placement of the bar area for a given content width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineLayout {
    pub left: f32,
    pub width: f32,
}

impl TimelineLayout {
    pub fn for_content_width(content_width: f32) -> Self {
        Self {
            left: TIMELINE_LEFT,
            width: (content_width - TIMELINE_LEFT - TIMELINE_RIGHT_MARGIN)
                .max(MIN_TIMELINE_WIDTH),
        }
    }

    pub fn x_at(&self, fraction: f32) -> f32 {
        self.left + fraction * self.width
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPlacement {
    InsideFill,
    CenteredInBar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub x: f32,
    pub width: f32,
    pub fill_width: f32,
    pub label: LabelPlacement,
}

impl BarGeometry {
    pub fn compute(domain: &DateDomain, layout: &TimelineLayout, project: &ProjectRecord) -> Self {
        let start_x = layout.x_at(domain.fraction(project.start_ms()));
        let end_x = layout.x_at(domain.fraction(project.end_ms()));
        // f32::max drops NaN, so broken dates still get the minimum width.
        let width = (end_x - start_x).max(MIN_BAR_WIDTH);
        let fill_width = (width * project.completion_fraction())
            .max(MIN_FILL_WIDTH)
            .min(width);
        let label = if fill_width >= LABEL_INSIDE_MIN_FILL
            && project.completion_percentage > LABEL_INSIDE_MIN_PERCENT
        {
            LabelPlacement::InsideFill
        } else {
            LabelPlacement::CenteredInBar
        };
        Self {
            x: start_x,
            width,
            fill_width,
            label,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.width.is_finite()
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

pub fn row_top(index: usize) -> f32 {
    HEADER_HEIGHT + index as f32 * ROW_HEIGHT
}

/// Coarse row bucketing of a content-space y coordinate.
pub fn row_at(content_y: f32, count: usize) -> Option<usize> {
    let row = ((content_y - HEADER_HEIGHT) / ROW_HEIGHT).floor();
    if !row.is_finite() || row < 0.0 {
        return None;
    }
    let row = row as usize;
    (row < count).then_some(row)
}

pub fn content_height(count: usize) -> f32 {
    HEADER_HEIGHT + count as f32 * ROW_HEIGHT + FOOTER_HEIGHT
}

/// Shortens `text` until it plus a literal `...` fits in `max_width`.
/// Text that already fits comes back borrowed and untouched.
pub fn truncate_to_width<'a>(
    text: &'a str,
    max_width: f32,
    measure: impl Fn(&str) -> f32,
) -> Cow<'a, str> {
    if measure(text) <= max_width {
        return Cow::Borrowed(text);
    }
    let mut end = text.len();
    while end > 0 {
        end = text[..end]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let candidate = format!("{}{ELLIPSIS}", text[..end].trim_end());
        if measure(&candidate) <= max_width {
            return Cow::Owned(candidate);
        }
    }
    Cow::Borrowed(ELLIPSIS)
}
