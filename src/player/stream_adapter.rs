use std::rc::Rc;
use tracing::{debug, info, warn};

use super::listeners::EventSender;
use super::traits::{DecodeSession, HlsBackend, MediaElement};
use super::types::{DecodeConfig, DecodeError, DecodeErrorKind, SourceKind};
use crate::constants::{HLS_EXTENSION, HLS_MIME_TYPE};
use crate::utils::StreamError;

/// Whether `url` points at a segmented-stream manifest.
pub fn is_manifest_url(url: &str) -> bool {
    url.contains(HLS_EXTENSION) || url.contains(HLS_MIME_TYPE)
}

/// What the adapter did about a decode session error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRecovery {
    /// Non-fatal, or no session to act on
    Ignored,
    RestartedLoad,
    RecoveredMedia,
    /// Session destroyed and forgotten
    Dropped,
}

/// Routes manifest URLs to native playback or a library decode session.
///
/// At most one library session is kept; it is reused across source swaps.
pub struct StreamAdapter {
    backend: Box<dyn HlsBackend>,
    config: DecodeConfig,
    session: Option<Rc<dyn DecodeSession>>,
}

impl StreamAdapter {
    pub fn new(backend: Box<dyn HlsBackend>, config: DecodeConfig) -> Self {
        Self {
            backend,
            config,
            session: None,
        }
    }

    /// Whether manifests can be played at all, given native support.
    pub fn can_decode(&self, native_supported: bool) -> bool {
        native_supported || self.backend.is_supported()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Put `url` on `element`.
    ///
    /// Non-manifest URLs are left to the player and reported as
    /// [`SourceKind::Passthrough`].
    pub fn load(
        &mut self,
        element: &mut dyn MediaElement,
        url: &str,
        events: &EventSender,
    ) -> Result<SourceKind, StreamError> {
        if !is_manifest_url(url) {
            return Ok(SourceKind::Passthrough);
        }

        if let Some(session) = self.session.clone() {
            match reuse(session.as_ref(), element, url) {
                Ok(()) => {
                    debug!("Reused decode session for {}", url);
                    return Ok(SourceKind::Library);
                }
                Err(e) => {
                    warn!("Decode session reuse failed, recreating: {}", e);
                    session.destroy();
                    self.session = None;
                    element.set_decode_session(None);
                }
            }
        }

        if element.can_play_type(HLS_MIME_TYPE) {
            debug!("Using native manifest playback for {}", url);
            element.set_src(url);
            return Ok(SourceKind::Native);
        }

        if !self.backend.is_supported() {
            return Err(StreamError::UnsupportedFormat);
        }

        let session = self.backend.create_session(&self.config)?;
        session.on_error(events.decoder_callback());
        if let Err(e) = session
            .attach_media(element)
            .and_then(|()| session.load_source(url))
        {
            session.destroy();
            return Err(e);
        }

        info!("Created decode session for {}", url);
        element.set_decode_session(Some(session.clone()));
        self.session = Some(session);
        Ok(SourceKind::Library)
    }

    /// React to a decode session error. A dropped session is also detached
    /// from `element`.
    pub fn handle_decode_error(
        &mut self,
        element: &mut dyn MediaElement,
        error: &DecodeError,
    ) -> DecodeRecovery {
        if !error.fatal {
            debug!("Non-fatal decode error ({:?}): {}", error.kind, error.details);
            return DecodeRecovery::Ignored;
        }
        let Some(session) = self.session.clone() else {
            debug!("Fatal decode error with no session: {}", error.details);
            return DecodeRecovery::Ignored;
        };

        match error.kind {
            DecodeErrorKind::Network => {
                warn!("Fatal network error, restarting load: {}", error.details);
                session.start_load();
                DecodeRecovery::RestartedLoad
            }
            DecodeErrorKind::Media => {
                warn!("Fatal media error, recovering: {}", error.details);
                session.recover_media_error();
                DecodeRecovery::RecoveredMedia
            }
            DecodeErrorKind::Other => {
                warn!("Fatal decode error, dropping session: {}", error.details);
                session.destroy();
                self.session = None;
                if element
                    .decode_session()
                    .is_some_and(|attached| same_session(&attached, &session))
                {
                    element.set_decode_session(None);
                }
                DecodeRecovery::Dropped
            }
        }
    }

    /// Destroy the stored session and whatever session `element` still holds,
    /// each distinct session once.
    pub fn teardown(&mut self, element: &mut dyn MediaElement) {
        let stored = self.session.take();
        let attached = element.decode_session();
        element.set_decode_session(None);

        if let Some(session) = &stored {
            session.destroy();
        }
        if let Some(session) = attached
            && !stored.as_ref().is_some_and(|s| same_session(s, &session))
        {
            session.destroy();
        }
    }
}

fn reuse(
    session: &dyn DecodeSession,
    element: &mut dyn MediaElement,
    url: &str,
) -> Result<(), StreamError> {
    session.stop_load()?;
    session.detach_media()?;
    session.attach_media(element)?;
    session.load_source(url)
}

fn same_session(a: &Rc<dyn DecodeSession>, b: &Rc<dyn DecodeSession>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
