use std::cell::RefCell;
use std::f64::consts::{FRAC_PI_2, PI};
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::gdk;
use gtk4::pango;
use gtk4::prelude::*;

use super::app::queue_card_click;
use super::state::{AppState, CardWidgets};
use crate::game::session::CardPhase;

pub const CONTENT_MARGIN: i32 = 12;
pub const CARD_GAP: i32 = 16;
const MAX_COLUMNS: usize = 3;
const CARD_RATIO: f32 = 2.0 / 3.0;

fn rounded_rect(cr: &cairo::Context, x: f64, y: f64, width: f64, height: f64, radius: f64) {
    let radius = radius.min(width / 2.0).min(height / 2.0);
    cr.new_sub_path();
    cr.arc(x + width - radius, y + radius, radius, -FRAC_PI_2, 0.0);
    cr.arc(x + width - radius, y + height - radius, radius, 0.0, FRAC_PI_2);
    cr.arc(x + radius, y + height - radius, radius, FRAC_PI_2, PI);
    cr.arc(x + radius, y + radius, radius, PI, 3.0 * FRAC_PI_2);
    cr.close_path();
}

fn centered_layout(cr: &cairo::Context, text: &str, family: &str, size: f64) -> pango::Layout {
    let layout = pangocairo::functions::create_layout(cr);
    let mut font_desc = pango::FontDescription::new();
    font_desc.set_family(family);
    font_desc.set_weight(pango::Weight::Bold);
    font_desc.set_size((size * pango::SCALE as f64) as i32);
    layout.set_font_description(Some(&font_desc));
    layout.set_alignment(pango::Alignment::Center);
    layout.set_text(text);
    layout
}

/// Face drawn in place of the card back when its image failed to load.
fn build_fallback_back() -> gtk::DrawingArea {
    let area = gtk::DrawingArea::builder()
        .hexpand(true)
        .vexpand(true)
        .css_classes(vec!["card-fallback"])
        .build();
    area.set_draw_func(|area, cr, width, height| {
        let min_dim = width.min(height) as f64;
        cr.set_antialias(cairo::Antialias::Best);
        let layout = centered_layout(cr, "?", "Cantarell, Noto Sans, sans", min_dim * 0.34);
        let fg = area.style_context().color();
        cr.set_source_rgba(
            fg.red() as f64,
            fg.green() as f64,
            fg.blue() as f64,
            fg.alpha() as f64,
        );
        let (text_width, text_height) = layout.pixel_size();
        cr.move_to(
            (width as f64 - text_width as f64) / 2.0,
            (height as f64 - text_height as f64) / 2.0,
        );
        pangocairo::functions::show_layout(cr, &layout);
    });
    area
}

fn build_name_overlay(state: &Rc<RefCell<AppState>>, index: usize) -> gtk::DrawingArea {
    let area = gtk::DrawingArea::builder()
        .hexpand(true)
        .vexpand(true)
        .can_target(false)
        .build();

    let state_draw = state.clone();
    area.set_draw_func(move |_, cr, width, height| {
        let st = state_draw.borrow();
        let Some(card) = st.session.card(index) else {
            return;
        };
        if card.phase != CardPhase::NameRevealed {
            return;
        }
        let Some(name) = card.name.as_deref().filter(|name| !name.is_empty()) else {
            return;
        };

        let tint = card
            .name_index
            .and_then(|i| st.config.name_color(i))
            .and_then(|color| gdk::RGBA::parse(color).ok())
            .unwrap_or(gdk::RGBA::WHITE);

        cr.set_antialias(cairo::Antialias::Best);
        let min_dim = width.min(height) as f64;
        let layout = centered_layout(cr, name, "Cantarell, Noto Sans, sans", min_dim * 0.11);
        let (text_width, text_height) = layout.pixel_size();
        let pad_x = min_dim * 0.06;
        let pad_y = min_dim * 0.03;
        let pill_width = (text_width as f64 + pad_x * 2.0).min(width as f64 * 0.92);
        let pill_height = text_height as f64 + pad_y * 2.0;
        let pill_x = (width as f64 - pill_width) / 2.0;
        let pill_y = height as f64 - pill_height - min_dim * 0.08;

        rounded_rect(cr, pill_x, pill_y, pill_width, pill_height, pill_height / 2.0);
        cr.set_source_rgba(
            tint.red() as f64,
            tint.green() as f64,
            tint.blue() as f64,
            0.92,
        );
        let _ = cr.fill_preserve();
        cr.set_source_rgba(1.0, 1.0, 1.0, 0.85);
        cr.set_line_width(2.0);
        let _ = cr.stroke();

        cr.set_source_rgba(0.16, 0.12, 0.2, 1.0);
        cr.move_to((width as f64 - text_width as f64) / 2.0, pill_y + pad_y);
        pangocairo::functions::show_layout(cr, &layout);
    });
    area
}

fn build_card(state: &Rc<RefCell<AppState>>, index: usize) -> CardWidgets {
    let (back_texture, flip_ms) = {
        let st = state.borrow();
        (st.card_back_texture().cloned(), st.config.flip_lock_ms)
    };

    let faces = gtk::Stack::builder()
        .transition_type(gtk::StackTransitionType::RotateLeftRight)
        .transition_duration(flip_ms.min(u32::MAX as u64) as u32)
        .hexpand(true)
        .vexpand(true)
        .build();

    let back: gtk::Widget = match back_texture {
        Some(texture) => gtk::Picture::builder()
            .paintable(&texture)
            .content_fit(gtk::ContentFit::Cover)
            .css_classes(vec!["card-face"])
            .build()
            .upcast(),
        None => build_fallback_back().upcast(),
    };
    faces.add_named(&back, Some("back"));

    let front = gtk::Picture::builder()
        .content_fit(gtk::ContentFit::Cover)
        .css_classes(vec!["card-face"])
        .build();
    faces.add_named(&front, Some("front"));
    faces.set_visible_child_name("back");

    let name_area = build_name_overlay(state, index);
    let overlay = gtk::Overlay::new();
    overlay.set_child(Some(&faces));
    overlay.add_overlay(&name_area);

    let button = gtk::Button::builder()
        .css_classes(vec!["flip-card"])
        .hexpand(true)
        .vexpand(true)
        .build();
    button.set_child(Some(&overlay));

    let state_click = state.clone();
    button.connect_clicked(move |_| {
        queue_card_click(&state_click, index);
    });

    CardWidgets {
        button,
        faces,
        front,
        name_area,
    }
}

pub fn build_board_grid(state: &Rc<RefCell<AppState>>) -> gtk::Grid {
    let grid = gtk::Grid::new();
    grid.add_css_class("card-row");
    grid.set_row_spacing(CARD_GAP as u32);
    grid.set_column_spacing(CARD_GAP as u32);
    grid.set_halign(gtk::Align::Center);
    grid.set_valign(gtk::Align::Center);
    grid.set_hexpand(true);
    grid.set_vexpand(true);
    grid.set_row_homogeneous(true);
    grid.set_column_homogeneous(true);

    let card_count = state.borrow().session.card_count();
    let columns = card_count.clamp(1, MAX_COLUMNS);

    let mut cards = Vec::with_capacity(card_count);
    for index in 0..card_count {
        let card = build_card(state, index);

        let aspect_frame = gtk::AspectFrame::builder()
            .ratio(CARD_RATIO)
            .obey_child(false)
            .halign(gtk::Align::Fill)
            .valign(gtk::Align::Fill)
            .hexpand(true)
            .vexpand(true)
            .build();
        aspect_frame.set_child(Some(&card.button));
        aspect_frame.set_size_request(120, 180);

        let x = (index % columns) as i32;
        let y = (index / columns) as i32;
        grid.attach(&aspect_frame, x, y, 1, 1);
        cards.push(card);
    }

    let mut st = state.borrow_mut();
    st.click_debounce = cards.iter().map(|_| None).collect();
    st.card_widgets = cards;

    grid
}

/// Shows the flipped face. A missing image leaves the face blank.
pub(super) fn show_card_front(st: &AppState, index: usize, image_index: usize) {
    let Some(card) = st.card_widgets.get(index) else {
        return;
    };
    match st.card_texture(image_index) {
        Some(texture) => card.front.set_paintable(Some(texture)),
        None => {
            let url = st.config.card_image_url(image_index);
            log::debug!(
                "{url} is {:?}, card {index} flips blank",
                st.assets.state_of(&url)
            );
        }
    }
    card.button.add_css_class("flipped");
    card.faces.set_visible_child_name("front");
}

pub(super) fn mark_awaiting_name(st: &AppState, index: usize) {
    if let Some(card) = st.card_widgets.get(index) {
        card.button.add_css_class("needs-click");
    }
}

pub(super) fn show_card_name(st: &AppState, index: usize) {
    if let Some(card) = st.card_widgets.get(index) {
        card.button.remove_css_class("needs-click");
        card.button.add_css_class("show-name");
        card.name_area.queue_draw();
    }
}
