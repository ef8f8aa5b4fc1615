//! Pagination properties checked over a range of tag counts and layouts
#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use tdlcore::pagination::{page_count, paginate, CANCEL_LABEL, NEXT_LABEL, PREV_LABEL};
use tdlcore::session::CallbackAction;
use tdlcore::{PageLayout, SessionId};

fn tags(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("tag{}", i)).collect()
}

#[test]
fn test_page_count_matches_pages() {
    let sid = SessionId::new(1, 1, 0);
    for rows in 1..4 {
        for cols in 1..4 {
            let layout = PageLayout::new(rows, cols).unwrap();
            for count in 0..30 {
                let pages = paginate(&tags(count), layout, sid);
                let expected = count.div_ceil(rows * cols).max(1);
                assert_eq!(pages.len(), expected, "{} tags at {}x{}", count, rows, cols);
                assert_eq!(page_count(count, layout), expected);
            }
        }
    }
}

#[test]
fn test_every_tag_once_in_order() {
    let sid = SessionId::new(1, 1, 0);
    for (rows, cols) in [(1, 1), (2, 3), (6, 4), (3, 5)] {
        let layout = PageLayout::new(rows, cols).unwrap();
        for count in [0, 1, 5, 24, 25, 61] {
            let input = tags(count);
            let pages = paginate(&input, layout, sid);

            let labels: Vec<String> = pages
                .iter()
                .flat_map(|page| page.tag_rows().iter().flatten())
                .map(|button| button.label.clone())
                .collect();
            assert_eq!(labels, input);

            let indexes: Vec<CallbackAction> = pages
                .iter()
                .flat_map(|page| page.tag_rows().iter().flatten())
                .map(|button| button.payload.action)
                .collect();
            assert_eq!(indexes, (0..count).map(CallbackAction::Tag).collect::<Vec<_>>());
        }
    }
}

#[test]
fn test_row_and_page_sizes_respect_layout() {
    let sid = SessionId::new(1, 1, 0);
    let layout = PageLayout::new(3, 4).unwrap();
    for page in paginate(&tags(40), layout, sid) {
        assert!(page.tag_rows().len() <= 3);
        assert!(page.tag_rows().iter().all(|row| !row.is_empty() && row.len() <= 4));
    }
}

#[test]
fn test_navigation_row_shape() {
    let sid = SessionId::new(1, 1, 0);
    let layout = PageLayout::new(2, 2).unwrap();

    let single = paginate(&tags(4), layout, sid);
    let nav: Vec<&str> = single[0].navigation_row().iter().map(|b| b.label.as_str()).collect();
    assert_eq!(nav, vec![CANCEL_LABEL]);

    for page in paginate(&tags(9), layout, sid) {
        let nav: Vec<&str> = page.navigation_row().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(nav, vec![PREV_LABEL, CANCEL_LABEL, NEXT_LABEL]);
    }
}

#[test]
fn test_dog_cat_example() {
    let layout = PageLayout::new(6, 4).unwrap();
    let pages = paginate(
        &["dog".to_string(), "cat".to_string()],
        layout,
        SessionId::new(-100, 7, 0),
    );

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].labels(), vec![vec!["dog", "cat"], vec!["cancel"]]);
    assert_eq!(pages[0].rows[0][1].payload.encode(), "tag:1#-100:7:0");
    assert_eq!(pages[0].rows[1][0].payload.encode(), "cancel#-100:7:0");
}

#[test]
fn test_duplicate_tags_are_distinct_buttons() {
    let layout = PageLayout::new(6, 4).unwrap();
    let pages = paginate(&["dog".to_string(), "dog".to_string()], layout, SessionId::new(1, 1, 0));
    let row = &pages[0].tag_rows()[0];

    assert_eq!(row.len(), 2);
    assert_ne!(row[0].payload, row[1].payload);
}
