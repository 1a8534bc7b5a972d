use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::glib;
use gtk4::prelude::*;

use super::state::AppState;

fn try_play(media: &gtk::MediaFile) -> bool {
    media.play();
    if let Some(err) = media.error() {
        log::warn!("background music failed: {err}");
        return false;
    }
    media.is_playing()
}

/// Starts the preloaded music. When the stream refuses to play, one more
/// attempt is made on the first click or tap inside `window`.
pub(super) fn start_music(state: &Rc<RefCell<AppState>>, window: &impl IsA<gtk::Widget>) {
    let (media, looping) = {
        let st = state.borrow();
        (st.assets.audio.clone(), st.config.music_loop)
    };
    let Some(media) = media else {
        return;
    };
    media.set_loop(looping);

    if try_play(&media) {
        log::info!("background music started");
        return;
    }
    log::info!("background music blocked, will play on first interaction");

    let gesture = gtk::GestureClick::new();
    gesture.set_button(0);
    gesture.set_propagation_phase(gtk::PropagationPhase::Capture);
    let fired = Rc::new(Cell::new(false));
    gesture.connect_pressed({
        let window = window.clone().upcast::<gtk::Widget>();
        move |gesture, _, _, _| {
            if fired.replace(true) {
                return;
            }
            if try_play(&media) {
                log::info!("background music started after user interaction");
            }
            let window = window.clone();
            let gesture = gesture.clone();
            glib::idle_add_local_once(move || {
                window.remove_controller(&gesture);
            });
        }
    });
    window.add_controller(gesture);
}
