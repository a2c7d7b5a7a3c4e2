use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::{Channel, Inbound, Key, Session};

/// Local actions a front end can queue for the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartGame,
    StartRound,
    SubmitWord(String),
    SubmitGuess(String),
    PressKey(Key),
    Leave,
}

/// Runs a [`Session`] on its own task: transport traffic, queued commands and
/// the countdown tick are handled one at a time, so the replica never sees
/// two mutations interleave. Pending transport traffic is drained before
/// commands.
pub struct SessionDriver<C: Channel> {
    session: Session<C>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    commands: mpsc::UnboundedReceiver<Command>,
    shutdown: watch::Receiver<bool>,
}

impl<C: Channel> SessionDriver<C> {
    pub fn new(
        session: Session<C>,
        inbound: mpsc::UnboundedReceiver<Inbound>,
        commands: mpsc::UnboundedReceiver<Command>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            session,
            inbound,
            commands,
            shutdown,
        }
    }

    /// Drive until the transport closes, a `Leave` command arrives, or
    /// shutdown is signalled. Always unsubscribes before handing the session
    /// back.
    pub async fn run(mut self) -> Session<C> {
        let mut ticker = interval(self.session.config().tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                inbound = self.inbound.recv() => match inbound {
                    Some(inbound) => self.session.handle_inbound(inbound),
                    None => {
                        info!("Transport for room {} closed", self.session.room_id());
                        break;
                    }
                },
                Some(command) = self.commands.recv() => {
                    if command == Command::Leave {
                        break;
                    }
                    self.execute(command);
                }
                _ = ticker.tick() => {
                    self.session.tick();
                }
                _ = self.shutdown.changed() => {
                    info!("Shutting down session for room {}", self.session.room_id());
                    break;
                }
            }
        }

        self.session.leave();
        self.session
    }

    fn execute(&mut self, command: Command) {
        let result = match command {
            Command::StartGame => self.session.start_game(),
            Command::StartRound => self.session.start_round(),
            Command::SubmitWord(word) => self.session.submit_word(&word),
            Command::SubmitGuess(guess) => self.session.submit_guess(&guess),
            Command::PressKey(key) => self.session.press_key(key),
            Command::Leave => Ok(()),
        };

        // Rejections are already published on the session's event bus.
        if let Err(e) = result {
            debug!("Command failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, SessionConfig, TransportError};
    use duel_types::{BroadcastEvent, PresenceEntry, RoundPhase};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct TestChannel {
        tracked: Arc<Mutex<Vec<PresenceEntry>>>,
        sent: Arc<Mutex<Vec<BroadcastEvent>>>,
        closed: Arc<AtomicBool>,
    }

    impl Channel for TestChannel {
        fn track(&self, presence: &PresenceEntry) -> Result<(), TransportError> {
            self.tracked.lock().unwrap().push(presence.clone());
            Ok(())
        }

        fn send(&self, event: &BroadcastEvent) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn unsubscribe(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn session(channel: TestChannel) -> Session<TestChannel> {
        let clock = Arc::new(ManualClock::new(1_000));
        Session::join("wordle-test123", "a", "Alice", channel, clock, SessionConfig::default())
    }

    #[test]
    fn test_driver_stops_when_transport_closes() {
        let channel = TestChannel::default();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (_command_tx, command_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        inbound_tx.send(Inbound::Subscribed).unwrap();
        inbound_tx
            .send(Inbound::PresenceSync(vec![
                PresenceEntry::new("a", "Alice", 1_000),
                PresenceEntry::new("b", "Bob", 2_000),
            ]))
            .unwrap();
        drop(inbound_tx);

        let driver = SessionDriver::new(session(channel.clone()), inbound_rx, command_rx, shutdown_rx);
        let session = tokio_test::block_on(driver.run());

        assert!(session.is_host());
        assert_eq!(session.opponent_id(), Some("b"));
        assert_eq!(channel.tracked.lock().unwrap().len(), 1);
        assert!(channel.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_commands_and_shutdown() {
        let channel = TestChannel::default();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = SessionDriver::new(session(channel.clone()), inbound_rx, command_rx, shutdown_rx);
        let handle = tokio::spawn(driver.run());

        inbound_tx.send(Inbound::Subscribed).unwrap();
        inbound_tx
            .send(Inbound::PresenceSync(vec![
                PresenceEntry::new("a", "Alice", 1_000),
                PresenceEntry::new("b", "Bob", 2_000),
            ]))
            .unwrap();
        command_tx.send(Command::StartGame).unwrap();

        // Let the driver drain what is queued before signalling shutdown.
        while channel.sent.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        shutdown_tx.send(true).unwrap();

        let session = handle.await.unwrap();
        assert_eq!(session.phase(), RoundPhase::WordSetting);
        assert_eq!(session.state().current_round, 1);
        assert!(channel.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_leave_command_ends_the_loop() {
        let channel = TestChannel::default();
        let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        command_tx.send(Command::Leave).unwrap();
        let driver = SessionDriver::new(session(channel.clone()), inbound_rx, command_rx, shutdown_rx);
        let session = driver.run().await;

        assert!(!session.is_subscribed());
        assert!(channel.closed.load(Ordering::SeqCst));
    }
}
