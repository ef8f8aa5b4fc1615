//! Inline keyboards built from tag pages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tdlcore::pagination::CANCEL_LABEL;
use tdlcore::session::{CallbackAction, CallbackPayload};
use tdlcore::{Page, SessionId};

/// Shorthand for a callback button
fn cb(label: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, data)
}

/// Tag buttons of `page` plus its navigation row
pub fn page_markup(page: &Page) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        page.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| cb(button.label.as_str(), button.payload.encode()))
                    .collect::<Vec<_>>()
            }),
    )
}

/// Lone cancel button shown while a download runs
pub fn cancel_markup(session_id: SessionId) -> InlineKeyboardMarkup {
    let payload = CallbackPayload::new(CallbackAction::Cancel, session_id);
    InlineKeyboardMarkup::new(vec![vec![cb(CANCEL_LABEL, payload.encode())]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tdlcore::pagination::paginate;
    use tdlcore::PageLayout;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("unexpected button kind {:?}", other),
        }
    }

    #[test]
    fn test_page_markup_mirrors_page() {
        let sid = SessionId::new(-100, 5, 1);
        let layout = PageLayout::new(1, 2).unwrap();
        let tags = vec!["dog".to_string(), "cat".to_string(), "bird".to_string()];
        let page = &paginate(&tags, layout, sid)[0];

        let markup = page_markup(page);
        let labels: Vec<Vec<&str>> = markup
            .inline_keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.text.as_str()).collect())
            .collect();

        assert_eq!(labels, vec![vec!["dog", "cat"], vec!["prev", "cancel", "next"]]);
        assert_eq!(callback_data(&markup.inline_keyboard[0][1]), "tag:1#-100:5:1");
        assert_eq!(callback_data(&markup.inline_keyboard[1][2]), "next#-100:5:1");
    }

    #[test]
    fn test_cancel_markup() {
        let markup = cancel_markup(SessionId::new(7, 8, 0));
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0][0].text, "cancel");
        assert_eq!(callback_data(&markup.inline_keyboard[0][0]), "cancel#7:8:0");
    }
}
