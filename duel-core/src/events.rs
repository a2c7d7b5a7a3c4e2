use duel_types::{GameError, PlayerId, RoundOutcome, RoundPhase};

/// Notifications a session publishes for whatever renders it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged {
        from: RoundPhase,
        to: RoundPhase,
    },
    HostElected {
        host_id: PlayerId,
        is_local: bool,
    },
    PlayerJoined {
        player_id: PlayerId,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    RoundStarted {
        round: u32,
        round_end_time: i64,
    },
    RoundEnded {
        outcome: RoundOutcome,
    },
    /// The pair broke up before the round finished.
    RoundAbandoned {
        round: u32,
    },
    InputRejected {
        error: GameError,
    },
    TimeRemaining {
        seconds: u64,
    },
}

/// Event handler trait for processing session events
pub trait SessionEventHandler: Send {
    fn handle_event(&mut self, event: &SessionEvent);
}

/// Simple event bus for distributing session events
#[derive(Default)]
pub struct SessionEventBus {
    handlers: Vec<Box<dyn SessionEventHandler>>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: SessionEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(&event);
        }
    }
}
