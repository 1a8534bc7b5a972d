use gettextrs::gettext;
use gtk4::prelude::*;

use super::state::AppState;
use crate::game::preload::Progress;

pub(super) fn update_progress(st: &mut AppState, progress: Progress) {
    st.load_progress = progress;
    if progress.is_done() {
        log::debug!("all {} assets settled", progress.total);
    }
    if let Some(bar) = &st.progress_bar {
        bar.set_fraction(progress.fraction());
        bar.set_text(Some(&format!("{}%", progress.percent())));
    }
    update_subtitle(st);
}

pub(super) fn update_subtitle(st: &AppState) {
    let Some(subtitle) = &st.title_subtitle else {
        return;
    };

    if !st.loading_done {
        let percent = st.load_progress.percent().to_string();
        subtitle.set_text(&gettext("Loading {percent}%").replace("{percent}", &percent));
        return;
    }

    let session = &st.session;
    let counter = gettext("{flipped} of {total} flipped")
        .replace("{flipped}", &session.flipped_count().to_string())
        .replace("{total}", &session.image_count().to_string());
    if session.active_card().is_some() {
        subtitle.set_text(&format!("{} | {}", counter, gettext("Tap again for the name")));
    } else if session.is_complete() {
        subtitle.set_text(&format!("{} | {}", counter, gettext("All revealed")));
    } else {
        subtitle.set_text(&counter);
    }
}

pub(super) fn set_restart_enabled(st: &AppState, enabled: bool) {
    if let Some(restart) = &st.restart_button {
        restart.set_visible(enabled);
        restart.set_sensitive(enabled);
    }
}
