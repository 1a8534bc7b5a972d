use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use futures::future::{LocalBoxFuture, join_all};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetError {
    Io { url: String, message: String },
    Decode { url: String, message: String },
    Media { url: String, message: String },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io { url, message } => write!(f, "failed to read {url}: {message}"),
            AssetError::Decode { url, message } => write!(f, "failed to decode {url}: {message}"),
            AssetError::Media { url, message } => {
                write!(f, "failed to prepare media {url}: {message}")
            }
        }
    }
}

impl std::error::Error for AssetError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Loaded,
    Failed,
}

/// Where preloaded assets come from. Each call is one load attempt; the
/// preloader never retries.
pub trait AssetSource {
    type Image;
    type Audio;

    fn load_image(&self, url: &str) -> LocalBoxFuture<'static, Result<Self::Image, AssetError>>;
    fn load_audio(&self, url: &str) -> LocalBoxFuture<'static, Result<Self::Audio, AssetError>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Integer percentage, rounded down. Only a fully settled batch reports 100.
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.completed.min(self.total) * 100 / self.total) as u8
    }

    pub fn fraction(self) -> f64 {
        f64::from(self.percent()) / 100.0
    }

    pub fn is_done(self) -> bool {
        self.completed >= self.total
    }
}

#[derive(Debug)]
pub struct ProgressTracker {
    completed: usize,
    total: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        ProgressTracker {
            completed: 0,
            total,
        }
    }

    pub fn settle_one(&mut self) -> Progress {
        self.completed = (self.completed + 1).min(self.total);
        self.progress()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed,
            total: self.total,
        }
    }
}

pub struct Preloaded<I, A> {
    pub images: HashMap<String, I>,
    pub audio: Option<A>,
    pub failed: Vec<String>,
}

impl<I, A> Default for Preloaded<I, A> {
    fn default() -> Self {
        Preloaded {
            images: HashMap::new(),
            audio: None,
            failed: Vec::new(),
        }
    }
}

impl<I, A> Preloaded<I, A> {
    pub fn image(&self, url: &str) -> Option<&I> {
        self.images.get(url)
    }

    pub fn state_of(&self, url: &str) -> AssetState {
        if self.images.contains_key(url) {
            AssetState::Loaded
        } else if self.failed.iter().any(|failed| failed == url) {
            AssetState::Failed
        } else {
            AssetState::Pending
        }
    }
}

struct Settlement<F> {
    tracker: RefCell<ProgressTracker>,
    on_progress: RefCell<F>,
}

impl<F: FnMut(Progress)> Settlement<F> {
    fn record(&self) {
        let progress = self.tracker.borrow_mut().settle_one();
        let mut on_progress = self.on_progress.borrow_mut();
        (*on_progress)(progress);
    }
}

/// Attempts every image and the audio clip once and waits for all of them
/// to settle. Failures are logged and left out of the result; they still
/// count towards progress.
///
/// The audio slot is always part of the total. Without an audio URL it
/// settles immediately as absent.
pub async fn preload<S, F>(
    source: &S,
    image_urls: &[String],
    audio_url: Option<&str>,
    on_progress: F,
) -> Preloaded<S::Image, S::Audio>
where
    S: AssetSource,
    F: FnMut(Progress),
{
    let settlement = Settlement {
        tracker: RefCell::new(ProgressTracker::new(image_urls.len() + 1)),
        on_progress: RefCell::new(on_progress),
    };

    let audio_load = async {
        let result = match audio_url {
            Some(url) => match source.load_audio(url).await {
                Ok(audio) => Some(audio),
                Err(err) => {
                    log::warn!("{err}");
                    None
                }
            },
            None => {
                log::debug!("no background music configured");
                None
            }
        };
        settlement.record();
        result
    };

    let image_loads = image_urls.iter().map(|url| {
        let settlement = &settlement;
        async move {
            let result = source.load_image(url).await;
            if let Err(err) = &result {
                log::warn!("{err}");
            }
            settlement.record();
            (url.clone(), result)
        }
    });

    let (audio, image_results) = futures::join!(audio_load, join_all(image_loads));

    let mut images = HashMap::with_capacity(image_results.len());
    let mut failed = Vec::new();
    for (url, result) in image_results {
        match result {
            Ok(image) => {
                images.insert(url, image);
            }
            Err(_) => failed.push(url),
        }
    }

    Preloaded {
        images,
        audio,
        failed,
    }
}
