//! Navigation side effects the pipeline triggers: login redirects and
//! the hard reload that follows a tenant switch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use inline_colorization::*;
use tracing::{info, warn};

pub trait Navigator: Send + Sync {
    /// Path of the page currently shown, e.g. "/customers/42".
    fn current_path(&self) -> String;
    /// Hard redirect; `target` may carry a query string.
    fn redirect(&self, target: &str);
    /// Throw away in-memory state and start the page again.
    fn reload(&self);
}

/// Keeps the navigation history in memory. Used by tests and by embedders
/// that poll for pending redirects.
pub struct RecordingNavigator {
    path: Mutex<String>,
    redirects: Mutex<Vec<String>>,
    reloads: AtomicUsize,
}

impl RecordingNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        RecordingNavigator {
            path: Mutex::new(path.into()),
            redirects: Mutex::new(Vec::new()),
            reloads: AtomicUsize::new(0),
        }
    }

    pub fn set_path(&self, path: impl Into<String>) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = path.into();
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn redirect(&self, target: &str) {
        info!("Redirecting to '{}'", target);
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.to_string());
        // Like a browser, we are now on the target page.
        let path = target.split('?').next().unwrap_or(target);
        self.set_path(path);
    }

    fn reload(&self) {
        info!("Reloading");
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tells a terminal user what a browser would have done.
pub struct ConsoleNavigator {
    path: String,
}

impl ConsoleNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        ConsoleNavigator { path: path.into() }
    }
}

impl Navigator for ConsoleNavigator {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn redirect(&self, target: &str) {
        warn!("Session requires attention; redirect to '{}'", target);
        eprintln!(
            "{style_bold}{color_yellow}Login required{color_reset}{style_reset}: run `salessync-client login` (would redirect to {})",
            target
        );
    }

    fn reload(&self) {
        eprintln!("{color_cyan}Tenant switched{color_reset}: start a new session to apply it.");
    }
}
