//! Plain-text rendering of the session for the terminal front end.

use crate::session::{Card, Session, SessionState, ThumbnailState};

const RULE: &str = "────────────────────────────────────────";

/// Render the submit area: topic, progress, and the inline error.
pub fn render_status(session: &Session) -> String {
    match session.state() {
        SessionState::Idle => "Enter a topic to generate 5 Shorts strategies.".to_string(),
        SessionState::Generating => format!("Generating strategies for '{}'...", session.topic()),
        SessionState::Ready => format!(
            "{} strategies for '{}'.",
            session.cards().len(),
            session.topic()
        ),
        SessionState::Failed { message } => format!("Error: {}", message),
    }
}

/// Render the status line followed by every card.
pub fn render_session(session: &Session) -> String {
    let mut out = render_status(session);
    out.push('\n');

    if session.cards().is_empty() {
        return out;
    }

    out.push_str(&format!("{}\n  GENERATED STRATEGY\n{}\n", RULE, RULE));
    for (index, card) in session.cards().iter().enumerate() {
        out.push_str(&render_card(index, card));
    }
    out
}

/// Render one card. Collapsed cards show only their header.
pub fn render_card(index: usize, card: &Card) -> String {
    let record = &card.record;
    let n = index + 1;
    let marker = if card.expanded { "[-]" } else { "[+]" };

    let mut out = format!(
        "{} Short #{}: {}\n    Problem: {}\n",
        marker, n, record.seo_title, record.problem
    );

    if !card.expanded {
        return out;
    }

    out.push_str(&format!(
        "\n    SCRIPT & DIRECTION\n    \
         The Hook (0-2s): \"{}\"\n    \
         Voiceover: \"{}\"\n    \
         Visual Scenes: {}\n    \
         Cinematic Flow: {}\n",
        record.hook, record.voiceover, record.scenes, record.cinematic_script
    ));

    out.push_str(&format!(
        "\n    SEO METADATA\n    \
         Target Keywords: {}\n    \
         Hashtags: {}\n    \
         Description: {}\n",
        record.keywords.join(", "),
        record.hashtags().join(" "),
        record.description
    ));

    out.push_str(&format!(
        "\n    THUMBNAIL CONCEPT\n    \
         Text Overlay: {}\n    \
         Visual Idea: {}\n    \
         Emotion: {}\n    \
         {}\n\n",
        record.thumbnail_text.to_uppercase(),
        record.thumbnail_image_idea,
        record.emotion,
        render_thumbnail(n, &card.thumbnail)
    ));
    out
}

fn render_thumbnail(n: usize, state: &ThumbnailState) -> String {
    match state {
        ThumbnailState::NoThumbnail => format!("Thumbnail: not generated (`thumb {}`)", n),
        ThumbnailState::GeneratingThumbnail => "Thumbnail: generating...".to_string(),
        ThumbnailState::HasThumbnail(image) => format!(
            "Thumbnail: {}, {} bytes, 9:16 (`uri {}` prints the data URI)",
            image.mime_type(),
            image.decoded_len(),
            n
        ),
        ThumbnailState::ThumbnailFailed { message } => {
            format!("Thumbnail: {} (`thumb {}` to retry)", message, n)
        }
    }
}
