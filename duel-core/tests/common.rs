use duel_core::{
    Channel, Inbound, ManualClock, Session, SessionConfig, SessionEvent, SessionEventHandler,
    TransportError,
};
use duel_types::{BroadcastEvent, PresenceEntry, RoundPhase};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const ROOM_ID: &str = "wordle-test123";
pub const START_MS: i64 = 1_700_000_000_000;

/// Channel that keeps everything a session sends so a test can route it.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<BroadcastEvent>>>,
    tracked: Arc<Mutex<Vec<PresenceEntry>>>,
    closed: Arc<AtomicBool>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the events sent since the last call.
    pub fn take_sent(&self) -> Vec<BroadcastEvent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn tracked(&self) -> Vec<PresenceEntry> {
        self.tracked.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Channel for RecordingChannel {
    fn track(&self, presence: &PresenceEntry) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.tracked.lock().unwrap().push(presence.clone());
        Ok(())
    }

    fn send(&self, event: &BroadcastEvent) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn unsubscribe(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Event collector for testing event emissions
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&SessionEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl SessionEventHandler for EventCollector {
    fn handle_event(&mut self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// One participant: the session plus handles to what it sent and published.
pub struct Peer {
    pub session: Session<RecordingChannel>,
    pub channel: RecordingChannel,
    pub events: EventCollector,
}

impl Peer {
    pub fn new(id: &str, name: &str, joined_at: i64, clock: &ManualClock) -> Self {
        let channel = RecordingChannel::new();
        let events = EventCollector::new();
        let mut session = Session::new(
            ROOM_ID,
            PresenceEntry::new(id, name, joined_at),
            channel.clone(),
            Arc::new(clock.clone()),
            SessionConfig::default(),
        );
        session.add_event_handler(Box::new(events.clone()));
        session.handle_inbound(Inbound::Subscribed);

        Self {
            session,
            channel,
            events,
        }
    }

    pub fn entry(&self) -> PresenceEntry {
        self.session.presence().local_entry().clone()
    }

    pub fn id(&self) -> String {
        self.session.local_id().to_string()
    }
}

/// Two sessions wired back to back. Alice joined first and hosts.
pub struct Pair {
    pub clock: ManualClock,
    pub alice: Peer,
    pub bob: Peer,
}

impl Pair {
    pub fn new() -> Self {
        let clock = ManualClock::new(START_MS);
        let alice = Peer::new("player-alice01", "Alice", START_MS, &clock);
        let bob = Peer::new("player-bob0002", "Bob", START_MS + 500, &clock);

        let mut pair = Self { clock, alice, bob };
        pair.sync_presence();
        pair
    }

    /// Deliver the same presence snapshot of both peers to both peers.
    pub fn sync_presence(&mut self) {
        let snapshot = vec![self.alice.entry(), self.bob.entry()];
        self.alice
            .session
            .handle_inbound(Inbound::PresenceSync(snapshot.clone()));
        self.bob.session.handle_inbound(Inbound::PresenceSync(snapshot));
    }

    /// Route sent events to the other peer until nobody has anything left
    /// to say. Returns how many events were delivered.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            let from_alice = self.alice.channel.take_sent();
            let from_bob = self.bob.channel.take_sent();
            if from_alice.is_empty() && from_bob.is_empty() {
                return delivered;
            }

            let alice_id = self.alice.id();
            let bob_id = self.bob.id();
            for event in from_alice {
                delivered += 1;
                self.bob.session.handle_inbound(Inbound::Broadcast {
                    from: alice_id.clone(),
                    event,
                });
            }
            for event in from_bob {
                delivered += 1;
                self.alice.session.handle_inbound(Inbound::Broadcast {
                    from: bob_id.clone(),
                    event,
                });
            }
        }
    }

    /// Hand `events` to Alice as if Bob had just sent them. Used to deliver
    /// traffic late or out of order instead of through [`Pair::pump`].
    pub fn deliver_to_alice(&mut self, events: Vec<BroadcastEvent>) {
        let from = self.bob.id();
        for event in events {
            self.alice.session.handle_inbound(Inbound::Broadcast {
                from: from.clone(),
                event,
            });
        }
    }

    /// Hand `events` to Bob as if Alice had just sent them.
    pub fn deliver_to_bob(&mut self, events: Vec<BroadcastEvent>) {
        let from = self.alice.id();
        for event in events {
            self.bob.session.handle_inbound(Inbound::Broadcast {
                from: from.clone(),
                event,
            });
        }
    }

    /// Host starts a fresh game; both peers end up setting words.
    pub fn start_game(&mut self) {
        self.alice.session.start_game().unwrap();
        self.pump();
        assert_eq!(self.alice.session.phase(), RoundPhase::WordSetting);
        assert_eq!(self.bob.session.phase(), RoundPhase::WordSetting);
    }

    /// Alice picks `for_bob`, Bob picks `for_alice`, then play begins.
    pub fn set_words(&mut self, for_bob: &str, for_alice: &str) {
        self.alice.session.submit_word(for_bob).unwrap();
        self.pump();
        self.bob.session.submit_word(for_alice).unwrap();
        self.pump();
        assert_eq!(self.alice.session.phase(), RoundPhase::PlayingRound);
        assert_eq!(self.bob.session.phase(), RoundPhase::PlayingRound);
    }

    pub fn guesses(peer: &mut Peer, clock: &ManualClock, words: &[&str]) {
        for word in words {
            clock.advance(1_000);
            peer.session.submit_guess(word).unwrap();
        }
    }

    pub fn alice_guesses(&mut self, words: &[&str]) {
        Self::guesses(&mut self.alice, &self.clock, words);
        self.pump();
    }

    pub fn bob_guesses(&mut self, words: &[&str]) {
        Self::guesses(&mut self.bob, &self.clock, words);
        self.pump();
    }

    pub fn assert_in_sync(&self) {
        assert_eq!(
            self.alice.session.state(),
            self.bob.session.state(),
            "replicas diverged"
        );
    }
}
