use duel_types::{PlayerId, PresenceEntry};
use std::collections::BTreeMap;
use tracing::info;

/// Live membership of a room as seen by one client, plus who is host.
///
/// The host is the earliest joiner in the first snapshot this client sees
/// (a client alone in the room hosts). It stays fixed until a snapshot no
/// longer contains it; then the earliest remaining joiner takes over.
#[derive(Debug, Clone)]
pub struct Presence {
    local: PresenceEntry,
    entries: BTreeMap<PlayerId, PresenceEntry>,
    host_id: Option<PlayerId>,
}

/// What changed between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceChange {
    pub joined: Vec<PresenceEntry>,
    pub left: Vec<PlayerId>,
    /// Set when this snapshot elected or re-elected a host.
    pub new_host: Option<PlayerId>,
}

impl Presence {
    pub fn new(local: PresenceEntry) -> Self {
        Self {
            local,
            entries: BTreeMap::new(),
            host_id: None,
        }
    }

    pub fn local_id(&self) -> &str {
        &self.local.id
    }

    pub fn local_entry(&self) -> &PresenceEntry {
        &self.local
    }

    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    pub fn is_host(&self) -> bool {
        self.host_id.as_deref() == Some(self.local.id.as_str())
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PresenceEntry> {
        self.entries.values()
    }

    /// The other player, only when the room holds exactly us and them.
    pub fn opponent_id(&self) -> Option<&str> {
        if self.entries.len() != 2 || !self.entries.contains_key(&self.local.id) {
            return None;
        }
        self.entries
            .keys()
            .find(|id| **id != self.local.id)
            .map(String::as_str)
    }

    /// Replace the membership with a fresh snapshot from the transport.
    pub fn apply_snapshot(&mut self, snapshot: Vec<PresenceEntry>) -> PresenceChange {
        let mut next = BTreeMap::new();
        for entry in snapshot {
            next.entry(entry.id.clone()).or_insert(entry);
        }

        let joined = next
            .values()
            .filter(|entry| !self.entries.contains_key(&entry.id))
            .cloned()
            .collect();
        let left = self
            .entries
            .keys()
            .filter(|id| !next.contains_key(*id))
            .cloned()
            .collect();

        self.entries = next;

        let needs_election = match &self.host_id {
            None => true,
            Some(host) => !self.entries.contains_key(host) && *host != self.local.id,
        };

        let new_host = if needs_election {
            let elected = self.elect();
            match &self.host_id {
                None => info!("Host elected: {} (local: {})", elected, elected == self.local.id),
                Some(old) => info!("Host {} left, re-elected {}", old, elected),
            }
            self.host_id = Some(elected.clone());
            Some(elected)
        } else {
            None
        };

        PresenceChange {
            joined,
            left,
            new_host,
        }
    }

    /// Earliest joiner wins, ties broken by id. The local client is always a
    /// candidate even before its own presence shows up in a snapshot.
    fn elect(&self) -> PlayerId {
        self.entries
            .values()
            .chain(std::iter::once(&self.local))
            .min_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)))
            .map(|entry| entry.id.clone())
            .unwrap_or_else(|| self.local.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, joined_at: i64) -> PresenceEntry {
        PresenceEntry::new(id, id.to_uppercase(), joined_at)
    }

    #[test]
    fn test_first_client_hosts() {
        let mut presence = Presence::new(entry("a", 100));
        let change = presence.apply_snapshot(vec![]);
        assert_eq!(change.new_host.as_deref(), Some("a"));
        assert!(presence.is_host());
        assert_eq!(presence.opponent_id(), None);

        let change = presence.apply_snapshot(vec![entry("a", 100)]);
        assert!(change.new_host.is_none());
        assert_eq!(change.joined, vec![entry("a", 100)]);
    }

    #[test]
    fn test_second_client_defers_to_earlier_joiner() {
        let mut presence = Presence::new(entry("b", 200));
        presence.apply_snapshot(vec![entry("a", 100), entry("b", 200)]);
        assert!(!presence.is_host());
        assert_eq!(presence.host_id(), Some("a"));
        assert_eq!(presence.opponent_id(), Some("a"));
    }

    #[test]
    fn test_host_is_not_re_evaluated_on_join() {
        let mut presence = Presence::new(entry("a", 100));
        presence.apply_snapshot(vec![entry("a", 100)]);

        // A peer with an earlier clock joins later; the host stays put
        let change = presence.apply_snapshot(vec![entry("a", 100), entry("b", 50)]);
        assert!(change.new_host.is_none());
        assert!(presence.is_host());
        assert_eq!(presence.opponent_id(), Some("b"));
    }

    #[test]
    fn test_host_leaving_triggers_re_election() {
        let mut presence = Presence::new(entry("b", 200));
        presence.apply_snapshot(vec![entry("a", 100), entry("b", 200)]);
        assert!(!presence.is_host());

        let change = presence.apply_snapshot(vec![entry("b", 200)]);
        assert_eq!(change.left, vec!["a".to_string()]);
        assert_eq!(change.new_host.as_deref(), Some("b"));
        assert!(presence.is_host());
        assert_eq!(presence.opponent_id(), None);
    }

    #[test]
    fn test_opponent_requires_exactly_two() {
        let mut presence = Presence::new(entry("a", 100));
        presence.apply_snapshot(vec![entry("a", 100), entry("b", 200), entry("c", 300)]);
        assert_eq!(presence.count(), 3);
        assert_eq!(presence.opponent_id(), None);

        // Two entries that do not include us is not a pairing either
        let mut outsider = Presence::new(entry("c", 300));
        outsider.apply_snapshot(vec![entry("a", 100), entry("b", 200)]);
        assert_eq!(outsider.opponent_id(), None);
    }

    #[test]
    fn test_duplicate_entries_collapse() {
        let mut presence = Presence::new(entry("a", 100));
        presence.apply_snapshot(vec![entry("a", 100), entry("a", 100), entry("b", 200)]);
        assert_eq!(presence.count(), 2);
    }
}
