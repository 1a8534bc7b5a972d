use gettextrs::gettext;
use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;

pub fn show_instructions_dialog(app: &adw::Application) -> adw::AlertDialog {
    let body = gettext(
        "Tap a card to flip it and see its picture.\n\
Tap the same card again to reveal the name.\n\
Only one card moves at a time.",
    );
    let dialog = adw::AlertDialog::new(Some(&gettext("How to Play")), Some(&body));
    dialog.add_response("ok", &gettext("Got it"));
    dialog.set_default_response(Some("ok"));
    dialog.set_close_response("ok");
    dialog.present(app.active_window().as_ref());
    dialog
}

pub fn show_about_dialog(app: &adw::Application) -> adw::AboutDialog {
    let dialog = adw::AboutDialog::builder()
        .application_name("Flipcard")
        .application_icon("io.github.flipcard.Flipcard")
        .version(env!("CARGO_PKG_VERSION"))
        .comments(gettext("Flip the cards, then find out who is behind each picture."))
        .build();
    dialog.add_legal_section("Flipcard", None, gtk::License::MitX11, None);
    dialog.present(app.active_window().as_ref());
    dialog
}
