//! Page geometry and pagination rules

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default line height in points, used when a box carries none
pub const LINE_HEIGHT: f32 = 14.0;

/// Slack allowed when comparing accumulated heights against a page
pub const LAYOUT_TOLERANCE: f32 = 0.01;

/// Physical page geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConstraints {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self {
            page_width: 612.0, // US Letter
            page_height: 792.0,
            margin_top: 72.0, // 1 inch
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
        }
    }
}

impl LayoutConstraints {
    /// Get usable content width
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Get usable content height per page
    pub fn content_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    /// Page geometry with default margins around a given content area
    pub fn around_content(content_width: f32, content_height: f32) -> Self {
        let margins = Self::default();
        Self {
            page_width: content_width + margins.margin_left + margins.margin_right,
            page_height: content_height + margins.margin_top + margins.margin_bottom,
            ..margins
        }
    }
}

/// Resolved options consumed by the pagination engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationOptions {
    /// Height of the fragmentainer (page content area)
    pub content_height: f32,
    pub content_width: f32,
    /// Minimum prose lines left at the bottom of a page
    pub orphan_lines: usize,
    /// Minimum prose lines carried to the top of the next page
    pub widow_lines: usize,
    /// Lines of following content a heading must keep with it
    pub min_content_lines: usize,
    /// Minimum list items on each side of a sequence split
    pub min_items_for_split: usize,
    /// Minimum table rows on each side of a table split
    pub min_rows_for_split: usize,
    pub repeat_table_header: bool,
    /// Drop boxes with no height and no children from the output
    pub skip_empty_elements: bool,
    /// Prose split is refused on a partly filled page when the space left
    /// is below this share of the prose height
    pub prose_min_fill_ratio: f32,
    /// Share of a splittable follower a heading must keep with it
    pub heading_follow_ratio: f32,
    /// Room reserved on each side of a line-based split for continuation
    /// markers
    pub line_based_padding: f32,
    /// Line height assumed for boxes that do not report one
    pub default_line_height: f32,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self::from_constraints(&LayoutConstraints::default())
    }
}

impl PaginationOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default rules for the content area of the given page geometry
    pub fn from_constraints(constraints: &LayoutConstraints) -> Self {
        Self {
            content_height: constraints.content_height(),
            content_width: constraints.content_width(),
            orphan_lines: 2,
            widow_lines: 2,
            min_content_lines: 2,
            min_items_for_split: 2,
            min_rows_for_split: 2,
            repeat_table_header: true,
            skip_empty_elements: true,
            prose_min_fill_ratio: 0.6,
            heading_follow_ratio: 1.0 / 3.0,
            line_based_padding: 8.0,
            default_line_height: LINE_HEIGHT,
        }
    }

    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_content_height(mut self, height: f32) -> Self {
        self.content_height = height;
        self
    }

    pub fn with_content_width(mut self, width: f32) -> Self {
        self.content_width = width;
        self
    }

    /// Set orphan and widow line minimums.
    pub fn with_orphans_widows(mut self, orphans: usize, widows: usize) -> Self {
        self.orphan_lines = orphans;
        self.widow_lines = widows;
        self
    }

    pub fn with_min_content_lines(mut self, lines: usize) -> Self {
        self.min_content_lines = lines;
        self
    }

    pub fn with_min_items(mut self, items: usize) -> Self {
        self.min_items_for_split = items;
        self
    }

    pub fn with_min_rows(mut self, rows: usize) -> Self {
        self.min_rows_for_split = rows;
        self
    }

    pub fn with_repeat_table_header(mut self, repeat: bool) -> Self {
        self.repeat_table_header = repeat;
        self
    }

    pub fn with_skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty_elements = skip;
        self
    }

    pub fn with_prose_min_fill_ratio(mut self, ratio: f32) -> Self {
        self.prose_min_fill_ratio = ratio;
        self
    }

    pub fn with_heading_follow_ratio(mut self, ratio: f32) -> Self {
        self.heading_follow_ratio = ratio;
        self
    }

    /// Check ranges before pagination starts
    pub fn validate(&self) -> Result<()> {
        if !self.content_height.is_finite() || self.content_height <= 0.0 {
            return Err(Error::invalid_option(
                "content_height",
                format!("must be a positive length, got {}", self.content_height),
            ));
        }
        if !self.content_width.is_finite() || self.content_width < 0.0 {
            return Err(Error::invalid_option(
                "content_width",
                format!("must be a non-negative length, got {}", self.content_width),
            ));
        }
        for (field, ratio) in [
            ("prose_min_fill_ratio", self.prose_min_fill_ratio),
            ("heading_follow_ratio", self.heading_follow_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::invalid_option(field, format!("must be within 0..=1, got {ratio}")));
            }
        }
        if !self.line_based_padding.is_finite() || self.line_based_padding < 0.0 {
            return Err(Error::invalid_option(
                "line_based_padding",
                format!("must be a non-negative length, got {}", self.line_based_padding),
            ));
        }
        if !self.default_line_height.is_finite() || self.default_line_height <= 0.0 {
            return Err(Error::invalid_option(
                "default_line_height",
                format!("must be a positive length, got {}", self.default_line_height),
            ));
        }
        Ok(())
    }
}
