use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::traits::{DecodeErrorCallback, EventCallback, ListenerId, MediaPlayer};
use super::types::{DecodeError, EventKind, PlayerEvent};

/// Everything a player or decode session can report to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    Player(PlayerEvent),
    Decoder(DecodeError),
}

/// Sender handed to player and decoder callbacks.
///
/// Messages are tagged with the generation of the player they came from so
/// the controller can drop anything emitted by a torn-down instance.
#[derive(Debug, Clone)]
pub struct EventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, SessionMessage)>,
}

impl EventSender {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, SessionMessage)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn send(&self, message: SessionMessage) {
        if self.tx.send((self.generation, message)).is_err() {
            trace!("Controller gone, dropping message");
        }
    }

    pub fn player_callback(&self) -> EventCallback {
        let sender = self.clone();
        Box::new(move |event| sender.send(SessionMessage::Player(event)))
    }

    pub fn decoder_callback(&self) -> DecodeErrorCallback {
        let sender = self.clone();
        Box::new(move |error| sender.send(SessionMessage::Decoder(error)))
    }
}

/// Subscriptions held on the current player, tagged by event kind.
///
/// Binding a kind that is already bound unsubscribes the old listener first,
/// so a kind never has two live handlers.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    bound: Vec<(EventKind, ListenerId)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, player: &mut dyn MediaPlayer, kind: EventKind, callback: EventCallback) {
        self.unbind(player, kind);
        let id = player.on(kind, callback);
        trace!("Bound {} listener {:?}", kind, id);
        self.bound.push((kind, id));
    }

    pub fn bind_all(&mut self, player: &mut dyn MediaPlayer, sender: &EventSender) {
        for kind in EventKind::ALL {
            self.bind(player, kind, sender.player_callback());
        }
    }

    pub fn unbind(&mut self, player: &mut dyn MediaPlayer, kind: EventKind) -> bool {
        let Some(pos) = self.bound.iter().position(|(k, _)| *k == kind) else {
            return false;
        };
        let (kind, id) = self.bound.remove(pos);
        player.off(kind, id)
    }

    /// Unsubscribe everything. Returns how many listeners were removed.
    pub fn clear(&mut self, player: &mut dyn MediaPlayer) -> usize {
        let count = self.bound.len();
        for (kind, id) in self.bound.drain(..) {
            if !player.off(kind, id) {
                debug!("Listener {:?} for {} was already gone", id, kind);
            }
        }
        count
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockPlayer;

    #[test]
    fn test_rebinding_replaces_listener() {
        let (mut player, handle) = MockPlayer::new(false);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = EventSender::new(1, tx);
        let mut registry = ListenerRegistry::new();

        registry.bind(&mut player, EventKind::Play, sender.player_callback());
        registry.bind(&mut player, EventKind::Play, sender.player_callback());

        assert_eq!(registry.len(), 1);
        assert_eq!(handle.listener_count(), 1);

        handle.emit(PlayerEvent::Play);
        assert_eq!(rx.try_recv().unwrap(), (1, SessionMessage::Player(PlayerEvent::Play)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clear_silences_player() {
        let (mut player, handle) = MockPlayer::new(false);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = ListenerRegistry::new();

        registry.bind_all(&mut player, &EventSender::new(7, tx));
        assert_eq!(handle.listener_count(), EventKind::ALL.len());

        assert_eq!(registry.clear(&mut player), EventKind::ALL.len());
        assert!(registry.is_empty());
        assert_eq!(handle.listener_count(), 0);

        handle.emit(PlayerEvent::Ended);
        assert!(rx.try_recv().is_err());
    }
}
