use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use gettextrs::gettext;
use gio::SimpleAction;
use gtk4 as gtk;
use gtk4::glib;
use gtk4::prelude::*;
use libadwaita as adw;
use adw::prelude::*;

use super::assets::GtkAssetSource;
use super::audio::start_music;
use super::board::{CONTENT_MARGIN, mark_awaiting_name, show_card_front, show_card_name};
use super::dialogs::{show_about_dialog, show_instructions_dialog};
use super::hud::{set_restart_enabled, update_progress, update_subtitle};
use super::scene::{rebuild_board, show_game_after_loading};
use super::state::AppState;
use crate::config::GameConfig;
use crate::game::preload::preload;
use crate::game::session::ClickOutcome;

const APP_ID: &str = "io.github.flipcard.Flipcard";

/// Coalesces rapid clicks on one card: each click restarts that card's
/// debounce timer and only the last one is processed.
pub(super) fn queue_card_click(state: &Rc<RefCell<AppState>>, index: usize) {
    let mut st = state.borrow_mut();
    let Some(slot) = st.click_debounce.get_mut(index) else {
        return;
    };
    if let Some(handle) = slot.take() {
        handle.remove();
    }

    let delay = Duration::from_millis(st.config.click_debounce_ms);
    let state_click = state.clone();
    let handle = glib::timeout_add_local_once(delay, move || {
        if let Some(slot) = state_click.borrow_mut().click_debounce.get_mut(index) {
            *slot = None;
        }
        handle_card_click(&state_click, index);
    });
    st.click_debounce[index] = Some(handle);
}

pub fn handle_card_click(state: &Rc<RefCell<AppState>>, index: usize) {
    let mut st = state.borrow_mut();

    let outcome = st.session.click(index);
    match outcome {
        ClickOutcome::Flipped { card, image_index } => {
            show_card_front(&st, card, image_index);
            update_subtitle(&st);

            let game_id = st.session.game_id();
            let lock = Duration::from_millis(st.config.flip_lock_ms);
            drop(st);
            let state_after_flip = state.clone();
            glib::timeout_add_local_once(lock, move || {
                let mut st = state_after_flip.borrow_mut();
                if st.session.game_id() != game_id {
                    return;
                }
                if st.session.finish_flip(card) {
                    mark_awaiting_name(&st, card);
                }
                update_subtitle(&st);
            });
        }
        ClickOutcome::NameRevealed { card, name, .. } => {
            log::debug!("card {card} revealed name {name:?}");
            show_card_name(&st, card);
            update_subtitle(&st);
        }
        ClickOutcome::Ignored(reason) => {
            log::debug!("click on card {index} ignored: {reason:?}");
        }
    }
}

fn restart_game(state: &Rc<RefCell<AppState>>) {
    {
        let mut st = state.borrow_mut();
        if !st.loading_done {
            return;
        }
        st.cancel_pending_clicks();
        st.session.reset();
        log::info!("new game {}", st.session.game_id());
    }
    rebuild_board(state);
    update_subtitle(&state.borrow());
}

fn start_preload(state: &Rc<RefCell<AppState>>, window: &adw::ApplicationWindow) {
    let state = state.clone();
    let window = window.clone();
    glib::spawn_future_local(async move {
        let (source, image_urls, music_url) = {
            let st = state.borrow();
            (
                GtkAssetSource::new(st.config.load_jitter_ms),
                st.config.image_urls(),
                st.config.music_url(),
            )
        };
        log::info!(
            "preloading {} images from {}",
            image_urls.len(),
            state.borrow().config.asset_dir.display()
        );

        let state_progress = state.clone();
        let loaded = preload(&source, &image_urls, music_url.as_deref(), move |progress| {
            update_progress(&mut state_progress.borrow_mut(), progress);
        })
        .await;

        log::info!(
            "assets settled: {} loaded, {} failed",
            loaded.images.len(),
            loaded.failed.len()
        );
        {
            let mut st = state.borrow_mut();
            st.assets = loaded;
            st.loading_done = true;
        }
        start_music(&state, &window);
        show_game_after_loading(&state);
    });
}

pub fn run() {
    glib::set_prgname(Some(APP_ID));
    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_activate(move |app| {
        load_css();

        let state = Rc::new(RefCell::new(AppState::new(GameConfig::load())));

        let instructions_action = SimpleAction::new("instructions", None);
        instructions_action.connect_activate({
            let app = app.clone();
            move |_, _| {
                show_instructions_dialog(&app);
            }
        });
        app.add_action(&instructions_action);

        let about_action = SimpleAction::new("about", None);
        about_action.connect_activate({
            let app = app.clone();
            move |_, _| {
                show_about_dialog(&app);
            }
        });
        app.add_action(&about_action);

        let quit_action = SimpleAction::new("quit", None);
        quit_action.connect_activate({
            let app = app.clone();
            move |_, _| app.quit()
        });
        app.add_action(&quit_action);

        let title_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
        title_box.set_valign(gtk::Align::Center);
        title_box.set_halign(gtk::Align::Center);
        let title_main = gtk::Label::builder()
            .label("Flipcard")
            .halign(gtk::Align::Center)
            .css_classes(vec!["heading"])
            .build();
        let title_subtitle = gtk::Label::builder()
            .label("")
            .halign(gtk::Align::Center)
            .css_classes(vec!["caption"])
            .build();
        title_box.append(&title_main);
        title_box.append(&title_subtitle);

        let header = adw::HeaderBar::builder().title_widget(&title_box).build();
        header.add_css_class("flat");

        let restart_button = gtk::Button::builder()
            .icon_name("view-refresh-symbolic")
            .build();
        restart_button.set_tooltip_text(Some(&gettext("New Game")));
        restart_button.connect_clicked({
            let state = state.clone();
            move |_| {
                restart_game(&state);
            }
        });

        let menu_model = gio::Menu::new();
        menu_model.append(Some(&gettext("How to Play")), Some("app.instructions"));
        menu_model.append(Some(&gettext("About Flipcard")), Some("app.about"));
        menu_model.append(Some(&gettext("Quit")), Some("app.quit"));
        let menu_button = gtk::MenuButton::builder()
            .icon_name("open-menu-symbolic")
            .menu_model(&menu_model)
            .build();

        let end_box = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        end_box.append(&restart_button);
        end_box.append(&menu_button);
        header.pack_end(&end_box);

        let view_stack = gtk::Stack::new();
        view_stack.set_hexpand(true);
        view_stack.set_vexpand(true);

        let loading_view = build_loading_view(&state);
        view_stack.add_named(&loading_view, Some("loading"));
        let game_view = build_game_view(&state);
        view_stack.add_named(&game_view, Some("game"));
        view_stack.set_visible_child_name("loading");

        let toolbar = adw::ToolbarView::new();
        toolbar.add_top_bar(&header);
        toolbar.set_content(Some(&view_stack));

        let win = adw::ApplicationWindow::builder()
            .application(app)
            .title("Flipcard")
            .icon_name(APP_ID)
            .default_width(720)
            .default_height(760)
            .content(&toolbar)
            .build();
        win.set_size_request(360, 520);
        win.add_css_class("app-window");

        let style_manager = adw::StyleManager::default();
        if style_manager.is_dark() {
            win.add_css_class("theme-dark");
        }
        style_manager.connect_notify_local(Some("dark"), {
            let win = win.clone();
            move |manager, _| {
                if manager.is_dark() {
                    win.add_css_class("theme-dark");
                } else {
                    win.remove_css_class("theme-dark");
                }
            }
        });

        {
            let mut st = state.borrow_mut();
            st.view_stack = Some(view_stack);
            st.restart_button = Some(restart_button);
            st.title_subtitle = Some(title_subtitle);
            set_restart_enabled(&st, false);
            update_subtitle(&st);
        }

        win.connect_close_request({
            let state = state.clone();
            move |_| {
                let mut st = state.borrow_mut();
                st.cancel_pending_clicks();
                if let Some(music) = &st.assets.audio {
                    music.pause();
                }
                gtk::glib::Propagation::Proceed
            }
        });

        win.present();
        start_preload(&state, &win);
    });

    app.run();
}

fn load_css() {
    static RESOURCES_INIT: Once = Once::new();
    RESOURCES_INIT.call_once(|| {
        gio::resources_register_include!("flipcard.gresource")
            .expect("failed to register embedded resources");
    });

    let Some(display) = gtk::gdk::Display::default() else {
        return;
    };

    for resource_path in [
        "/io/github/flipcard/Flipcard/style.css",
        "/io/github/flipcard/Flipcard/style.dark.css",
    ] {
        let provider = gtk::CssProvider::new();
        provider.load_from_resource(resource_path);
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

fn build_loading_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("loading-root");

    let content = gtk::Box::new(gtk::Orientation::Vertical, 6);
    content.set_halign(gtk::Align::Center);
    content.set_valign(gtk::Align::Center);
    content.set_vexpand(true);
    content.set_margin_start(15);
    content.set_margin_end(15);

    let caption = gtk::Label::new(Some(&gettext("Just a moment…")));
    caption.add_css_class("loading-caption");
    caption.set_justify(gtk::Justification::Center);
    caption.set_wrap(true);

    let progress_bar = gtk::ProgressBar::builder()
        .show_text(true)
        .text("0%")
        .fraction(0.0)
        .width_request(280)
        .css_classes(vec!["loading-progress"])
        .build();

    content.append(&caption);
    content.append(&progress_bar);
    root.append(&content);

    state.borrow_mut().progress_bar = Some(progress_bar);

    root
}

fn build_game_view(state: &Rc<RefCell<AppState>>) -> gtk::Overlay {
    let root = gtk::Overlay::new();
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("game-root");

    let background = gtk::Picture::builder()
        .content_fit(gtk::ContentFit::Cover)
        .can_target(false)
        .hexpand(true)
        .vexpand(true)
        .build();
    root.set_child(Some(&background));

    let board_container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    board_container.set_hexpand(true);
    board_container.set_vexpand(true);
    board_container.set_halign(gtk::Align::Fill);
    board_container.set_valign(gtk::Align::Fill);
    board_container.set_margin_top(CONTENT_MARGIN);
    board_container.set_margin_bottom(CONTENT_MARGIN);
    board_container.set_margin_start(CONTENT_MARGIN);
    board_container.set_margin_end(CONTENT_MARGIN);
    root.add_overlay(&board_container);

    {
        let mut st = state.borrow_mut();
        st.background = Some(background);
        st.board_container = Some(board_container);
    }

    root
}
