use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gtk4 as gtk;
use gtk4::glib;
use gtk4::prelude::*;

use super::board::build_board_grid;
use super::hud::{set_restart_enabled, update_subtitle};
use super::state::AppState;

pub(super) fn rebuild_board(state: &Rc<RefCell<AppState>>) {
    let (board_container, background) = {
        let st = state.borrow();
        (st.board_container.clone(), st.background.clone())
    };
    let Some(board_container) = board_container else {
        return;
    };

    while let Some(child) = board_container.first_child() {
        board_container.remove(&child);
    }
    let grid = build_board_grid(state);
    board_container.append(&grid);

    if let Some(background) = background {
        let st = state.borrow();
        background.set_paintable(st.background_texture());
    }
}

/// Leaves the loading page: holds the full bar briefly, then crossfades
/// into the game page.
pub(super) fn show_game_after_loading(state: &Rc<RefCell<AppState>>) {
    let (hold_ms, fade_ms) = {
        let st = state.borrow();
        (st.config.loading_hold_ms, st.config.loading_fade_ms)
    };

    let state_show = state.clone();
    glib::timeout_add_local_once(Duration::from_millis(hold_ms), move || {
        rebuild_board(&state_show);
        let st = state_show.borrow();
        if let Some(stack) = &st.view_stack {
            stack.set_transition_type(gtk::StackTransitionType::Crossfade);
            stack.set_transition_duration(fade_ms);
            stack.set_visible_child_name("game");
        }
        set_restart_enabled(&st, true);
        update_subtitle(&st);
        log::info!("game ready with {} cards", st.session.card_count());
    });
}
