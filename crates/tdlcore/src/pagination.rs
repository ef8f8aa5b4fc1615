//! Splits the configured tags into keyboard pages
//!
//! A page is `rows_per_page` rows of at most `cols_per_row` tag buttons,
//! followed by a navigation row. When every tag fits on one page the
//! navigation row is a lone `cancel`, otherwise each page gets
//! `prev` / `cancel` / `next` and the session store decides whether a move
//! is possible.

use crate::core::error::{AppError, AppResult};
use crate::session::{CallbackAction, CallbackPayload, SessionId};

pub const PREV_LABEL: &str = "prev";
pub const CANCEL_LABEL: &str = "cancel";
pub const NEXT_LABEL: &str = "next";

/// Keyboard geometry, both dimensions non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    rows_per_page: usize,
    cols_per_row: usize,
}

impl PageLayout {
    pub fn new(rows_per_page: usize, cols_per_row: usize) -> AppResult<Self> {
        if rows_per_page == 0 || cols_per_row == 0 {
            return Err(AppError::Validation(format!(
                "keyboard layout must be at least 1x1, got {}x{}",
                rows_per_page, cols_per_row
            )));
        }
        Ok(Self {
            rows_per_page,
            cols_per_row,
        })
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn cols_per_row(&self) -> usize {
        self.cols_per_row
    }

    /// Tags per page
    pub fn capacity(&self) -> usize {
        self.rows_per_page * self.cols_per_row
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: CallbackPayload,
}

impl Button {
    fn new(label: impl Into<String>, action: CallbackAction, session_id: SessionId) -> Self {
        Self {
            label: label.into(),
            payload: CallbackPayload::new(action, session_id),
        }
    }
}

/// One keyboard screen. The last row is always the navigation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub rows: Vec<Vec<Button>>,
}

impl Page {
    pub fn navigation_row(&self) -> &[Button] {
        self.rows.last().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn tag_rows(&self) -> &[Vec<Button>] {
        match self.rows.split_last() {
            Some((_, tags)) => tags,
            None => &[],
        }
    }

    /// Button labels row by row, handy for logging and assertions
    pub fn labels(&self) -> Vec<Vec<&str>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|button| button.label.as_str()).collect())
            .collect()
    }
}

/// `max(1, ceil(tag_count / capacity))`
pub fn page_count(tag_count: usize, layout: PageLayout) -> usize {
    tag_count.div_ceil(layout.capacity()).max(1)
}

/// Builds page `index`, or `None` when it is past the last page.
pub fn page_at(tags: &[String], layout: PageLayout, session_id: SessionId, index: usize) -> Option<Page> {
    let total = page_count(tags.len(), layout);
    if index >= total {
        return None;
    }

    let start = index * layout.capacity();
    let end = (start + layout.capacity()).min(tags.len());
    let page_tags = tags.get(start..end).unwrap_or_default();

    let mut rows: Vec<Vec<Button>> = page_tags
        .chunks(layout.cols_per_row())
        .enumerate()
        .map(|(row_index, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(col, tag)| {
                    let tag_index = start + row_index * layout.cols_per_row() + col;
                    Button::new(tag.as_str(), CallbackAction::Tag(tag_index), session_id)
                })
                .collect()
        })
        .collect();

    rows.push(navigation_row(total, session_id));
    Some(Page { index, rows })
}

/// Every page for `tags`, in order.
pub fn paginate(tags: &[String], layout: PageLayout, session_id: SessionId) -> Vec<Page> {
    (0..page_count(tags.len(), layout))
        .filter_map(|index| page_at(tags, layout, session_id, index))
        .collect()
}

fn navigation_row(total_pages: usize, session_id: SessionId) -> Vec<Button> {
    let cancel = Button::new(CANCEL_LABEL, CallbackAction::Cancel, session_id);
    if total_pages <= 1 {
        return vec![cancel];
    }
    vec![
        Button::new(PREV_LABEL, CallbackAction::Prev, session_id),
        cancel,
        Button::new(NEXT_LABEL, CallbackAction::Next, session_id),
    ]
}
