use tracing::{debug, warn};

use super::traits::ScreenOrientation;

/// Landscape lock held while the player is fullscreen.
pub struct OrientationLock {
    screen: Option<Box<dyn ScreenOrientation>>,
    locked: bool,
}

impl OrientationLock {
    pub fn new(screen: Option<Box<dyn ScreenOrientation>>) -> Self {
        Self {
            screen,
            locked: false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock_landscape(&mut self) {
        let Some(screen) = self.screen.as_mut() else {
            return;
        };
        if !screen.supports_lock() {
            debug!("Orientation lock not supported");
            return;
        }
        match screen.lock_landscape() {
            Ok(()) => self.locked = true,
            Err(e) => warn!("Failed to lock orientation: {}", e),
        }
    }

    pub fn release(&mut self) {
        if !self.locked {
            return;
        }
        if let Some(screen) = self.screen.as_mut() {
            screen.unlock();
        }
        self.locked = false;
    }
}
