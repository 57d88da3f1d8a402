use std::sync::mpsc::{self, Receiver, Sender};

use super::state::PlaybackSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A registered observer. Receives the snapshot current at subscription time
/// and then every published one. Dropping it ends the subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: Receiver<PlaybackSnapshot>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The newest snapshot published since the last call, skipping older ones.
    pub fn latest(&self) -> Option<PlaybackSnapshot> {
        self.rx.try_iter().last()
    }

    /// The next snapshot in publication order, if one is queued.
    #[cfg(test)]
    pub fn try_next(&self) -> Option<PlaybackSnapshot> {
        self.rx.try_recv().ok()
    }
}

#[derive(Default)]
pub(super) struct Subscribers {
    next_id: u64,
    senders: Vec<(SubscriptionId, Sender<PlaybackSnapshot>)>,
}

impl Subscribers {
    pub(super) fn add(&mut self, initial: PlaybackSnapshot) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = mpsc::channel();
        // Receiver is alive here; this cannot fail.
        let _ = tx.send(initial);
        self.senders.push((id, tx));
        Subscription { id, rx }
    }

    pub(super) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.senders.len();
        self.senders.retain(|(sid, _)| *sid != id);
        self.senders.len() != before
    }

    /// Send `snapshot` to every live observer, forgetting disconnected ones.
    pub(super) fn publish(&mut self, snapshot: &PlaybackSnapshot) {
        self.senders.retain(|(_, tx)| tx.send(snapshot.clone()).is_ok());
    }

    pub(super) fn clear(&mut self) {
        self.senders.clear();
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.senders.len()
    }
}
