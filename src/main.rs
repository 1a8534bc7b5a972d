mod config;
mod game;
mod ui;

use gettextrs::{LocaleCategory, bind_textdomain_codeset, bindtextdomain, setlocale, textdomain};

const GETTEXT_PACKAGE: &str = "flipcard";
const LOCALEDIR: &str = match option_env!("FLIPCARD_LOCALEDIR") {
    Some(dir) => dir,
    None => "/usr/share/locale",
};

static GLIB_LOGGER: glib::GlibLogger = glib::GlibLogger::new(
    glib::GlibLoggerFormat::Plain,
    glib::GlibLoggerDomain::CrateTarget,
);

fn init_logging() {
    if log::set_logger(&GLIB_LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn init_i18n() {
    setlocale(LocaleCategory::LcAll, "");
    if let Err(err) = bindtextdomain(GETTEXT_PACKAGE, LOCALEDIR) {
        log::warn!("failed to bind text domain: {err}");
    }
    if let Err(err) = bind_textdomain_codeset(GETTEXT_PACKAGE, "UTF-8") {
        log::warn!("failed to set text domain codeset: {err}");
    }
    if let Err(err) = textdomain(GETTEXT_PACKAGE) {
        log::warn!("failed to switch text domain: {err}");
    }
}

fn main() {
    init_logging();
    init_i18n();
    ui::app::run();
}
