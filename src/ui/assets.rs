use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use gtk4 as gtk;
use gtk4::gdk;
use gtk4::gio;
use gtk4::glib;
use gtk4::prelude::*;
use rand::Rng;

use crate::game::preload::{AssetError, AssetSource};

/// Loads textures and media files from disk on the GLib main loop.
pub struct GtkAssetSource {
    jitter_ms: u64,
}

impl GtkAssetSource {
    pub fn new(jitter_ms: u64) -> Self {
        GtkAssetSource { jitter_ms }
    }

    fn start_delay(&self) -> Duration {
        if self.jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..self.jitter_ms))
    }
}

impl AssetSource for GtkAssetSource {
    type Image = gdk::Texture;
    type Audio = gtk::MediaFile;

    fn load_image(&self, url: &str) -> LocalBoxFuture<'static, Result<gdk::Texture, AssetError>> {
        let url = url.to_string();
        let delay = self.start_delay();
        async move {
            glib::timeout_future(delay).await;
            let file = gio::File::for_path(&url);
            let (bytes, _etag) = file.load_bytes_future().await.map_err(|err| AssetError::Io {
                url: url.clone(),
                message: err.to_string(),
            })?;
            let texture = gdk::Texture::from_bytes(&bytes).map_err(|err| AssetError::Decode {
                url: url.clone(),
                message: err.to_string(),
            })?;
            log::debug!("loaded {url} ({}x{})", texture.width(), texture.height());
            Ok(texture)
        }
        .boxed_local()
    }

    fn load_audio(&self, url: &str) -> LocalBoxFuture<'static, Result<gtk::MediaFile, AssetError>> {
        let url = url.to_string();
        async move {
            if !std::path::Path::new(&url).exists() {
                return Err(AssetError::Io {
                    url,
                    message: "no such file".to_string(),
                });
            }
            let media = gtk::MediaFile::for_filename(&url);
            wait_until_prepared(&media)
                .await
                .map_err(|message| AssetError::Media {
                    url: url.clone(),
                    message,
                })?;
            log::debug!("prepared {url}");
            Ok(media)
        }
        .boxed_local()
    }
}

fn prepared_outcome(media: &gtk::MediaFile) -> Option<Result<(), String>> {
    if let Some(err) = media.error() {
        Some(Err(err.to_string()))
    } else if media.is_prepared() {
        Some(Ok(()))
    } else {
        None
    }
}

async fn wait_until_prepared(media: &gtk::MediaFile) -> Result<(), String> {
    if let Some(outcome) = prepared_outcome(media) {
        return outcome;
    }

    let (sender, receiver) = oneshot::channel();
    let sender = Rc::new(RefCell::new(Some(sender)));
    let handlers = ["prepared", "error"].map(|property| {
        let sender = sender.clone();
        media.connect_notify_local(Some(property), move |media, _| {
            if let Some(outcome) = prepared_outcome(media)
                && let Some(sender) = sender.borrow_mut().take()
            {
                let _ = sender.send(outcome);
            }
        })
    });

    let outcome = receiver
        .await
        .unwrap_or_else(|_| Err("media stream went away".to_string()));
    for handler in handlers {
        media.disconnect(handler);
    }
    outcome
}
