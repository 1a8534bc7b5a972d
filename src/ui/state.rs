use gtk4 as gtk;
use gtk4::gdk;
use gtk4::glib;

use crate::config::GameConfig;
use crate::game::preload::{Preloaded, Progress};
use crate::game::session::Session;

/// Widgets making up one card on the board.
#[derive(Clone)]
pub struct CardWidgets {
    pub button: gtk::Button,
    pub faces: gtk::Stack,
    pub front: gtk::Picture,
    pub name_area: gtk::DrawingArea,
}

pub struct AppState {
    pub config: GameConfig,
    pub session: Session,

    pub view_stack: Option<gtk::Stack>,
    pub restart_button: Option<gtk::Button>,
    pub title_subtitle: Option<gtk::Label>,
    pub progress_bar: Option<gtk::ProgressBar>,
    pub board_container: Option<gtk::Box>,
    pub background: Option<gtk::Picture>,
    pub card_widgets: Vec<CardWidgets>,
    pub click_debounce: Vec<Option<glib::SourceId>>,

    // Preloaded assets, keyed by URL
    pub assets: Preloaded<gdk::Texture, gtk::MediaFile>,
    pub load_progress: Progress,
    pub loading_done: bool,
}

impl AppState {
    pub fn new(config: GameConfig) -> Self {
        let session = Session::new(config.card_count, config.image_count, config.names.clone());
        let total = config.image_urls().len() + 1;
        AppState {
            config,
            session,
            view_stack: None,
            restart_button: None,
            title_subtitle: None,
            progress_bar: None,
            board_container: None,
            background: None,
            card_widgets: Vec::new(),
            click_debounce: Vec::new(),
            assets: Preloaded::default(),
            load_progress: Progress {
                completed: 0,
                total,
            },
            loading_done: false,
        }
    }

    pub fn card_texture(&self, image_index: usize) -> Option<&gdk::Texture> {
        self.assets.image(&self.config.card_image_url(image_index))
    }

    pub fn card_back_texture(&self) -> Option<&gdk::Texture> {
        self.assets.image(&self.config.card_back_url())
    }

    pub fn background_texture(&self) -> Option<&gdk::Texture> {
        self.assets.image(&self.config.background_url())
    }

    pub fn cancel_pending_clicks(&mut self) {
        for slot in &mut self.click_debounce {
            if let Some(handle) = slot.take() {
                handle.remove();
            }
        }
    }
}
