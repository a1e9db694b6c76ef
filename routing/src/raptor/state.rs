use hashbrown::HashMap;

use common::types::{Timestamp, UniqueId};

use crate::journey::Span;

/// How a stop ended up in the marking queue.
///
/// A stop reached by a ride may relax its outgoing walking transfers in the
/// next round; a stop reached by a walk may only do so when transfer hopping
/// is allowed. Arrival dominates: an arrival mark is never displaced by a
/// transfer mark for the same stop.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum MarkSource {
    Arrival,
    Transfer,
}

/// The tentative best path to one stop.
///
/// In the forward search `arrival_time` is the earliest known arrival at
/// `stop` and `spans` lead from an origin to it. In the reverse search
/// `arrival_time` is the latest time one can still leave `stop` and make the
/// destination, and `spans` describe the onward path from `stop`.
///
/// `spans` is empty exactly for unmoved terminal stops, whose time is the
/// search's reference time.
#[derive(Debug, Clone)]
pub(crate) struct RoundSegment<ID> {
    pub(crate) stop: ID,
    pub(crate) arrival_time: Timestamp,
    pub(crate) spans: Vec<Span<ID>>,
}

impl<ID: UniqueId> RoundSegment<ID> {
    fn unmoved(stop: ID, time_reference: Timestamp) -> Self {
        Self {
            stop,
            arrival_time: time_reference,
            spans: Vec::new(),
        }
    }
}

/// The mutable per-search state shared by both directions: the label store,
/// the two marking queues and the trip-scan bookkeeping. All of it lives for
/// exactly one search call.
pub(crate) struct SearchState<ID> {
    labels: HashMap<ID, RoundSegment<ID>>,
    marked: HashMap<ID, MarkSource>,
    marked_next: HashMap<ID, MarkSource>,
    // lowest (forward) / highest (reverse) stop sequence at which each trip
    // was already boarded and scanned; persists across rounds
    scanned_from_sequence: HashMap<ID, u32>,
}

impl<ID: UniqueId> SearchState<ID> {
    pub(crate) fn new() -> Self {
        Self {
            labels: HashMap::new(),
            marked: HashMap::new(),
            marked_next: HashMap::new(),
            scanned_from_sequence: HashMap::new(),
        }
    }

    /// Labels a terminal stop with the reference time and marks it for the
    /// first round.
    pub(crate) fn seed(&mut self, stop: ID, time_reference: Timestamp) {
        self.labels
            .insert(stop.clone(), RoundSegment::unmoved(stop.clone(), time_reference));
        self.marked.insert(stop, MarkSource::Arrival);
    }

    pub(crate) fn label(&self, stop: &ID) -> Option<&RoundSegment<ID>> {
        self.labels.get(stop)
    }

    /// The label of a stop taken out of the marking queue. Every marked stop
    /// was labelled when it was marked, so a miss is an invariant violation.
    pub(crate) fn marked_label(&self, stop: &ID) -> &RoundSegment<ID> {
        self.labels.get(stop).unwrap_or_else(|| {
            panic!("marked stop {stop} has no label; stops must be labelled before they are marked")
        })
    }

    pub(crate) fn store(&mut self, segment: RoundSegment<ID>) {
        self.labels.insert(segment.stop.clone(), segment);
    }

    /// Marks a stop for the next round as reached by a ride. Overwrites any
    /// transfer mark.
    pub(crate) fn mark_arrival(&mut self, stop: ID) {
        self.marked_next.insert(stop, MarkSource::Arrival);
    }

    /// Marks a stop for the next round as reached by a walk, unless it is
    /// already marked.
    pub(crate) fn mark_transfer(&mut self, stop: ID) {
        self.marked_next.entry(stop).or_insert(MarkSource::Transfer);
    }

    pub(crate) fn has_marked(&self) -> bool {
        !self.marked.is_empty()
    }

    /// Drains the current round's marks, ordered by stop id so that a search
    /// over the same inputs always visits stops in the same order.
    pub(crate) fn take_marked(&mut self) -> Vec<(ID, MarkSource)> {
        let mut marked: Vec<(ID, MarkSource)> = self.marked.drain().collect();
        marked.sort_by(|(a, _), (b, _)| a.cmp(b));
        marked
    }

    /// Promotes the accumulated next-round marks to the current round.
    pub(crate) fn advance_round(&mut self) {
        std::mem::swap(&mut self.marked, &mut self.marked_next);
        self.marked_next.clear();
    }

    pub(crate) fn scanned_sequence(&self, trip: &ID) -> Option<u32> {
        self.scanned_from_sequence.get(trip).copied()
    }

    pub(crate) fn record_scan(&mut self, trip: ID, stop_sequence: u32) {
        self.scanned_from_sequence.insert(trip, stop_sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_labels_and_marks() {
        let mut state = SearchState::new();
        state.seed("a".to_string(), 100);

        let label = state.marked_label(&"a".to_string());
        assert_eq!(label.arrival_time, 100);
        assert!(label.spans.is_empty());
        assert!(state.has_marked());
    }

    #[test]
    #[should_panic(expected = "has no label")]
    fn test_missing_label_for_marked_stop_panics() {
        let state = SearchState::<String>::new();
        state.marked_label(&"ghost".to_string());
    }

    #[test]
    fn test_arrival_mark_dominates_transfer_mark() {
        let mut state = SearchState::<String>::new();

        state.mark_transfer("a".to_string());
        state.mark_arrival("a".to_string());
        // a transfer mark must not displace the arrival mark
        state.mark_transfer("a".to_string());
        state.mark_arrival("b".to_string());
        state.mark_transfer("c".to_string());

        state.advance_round();
        let marked = state.take_marked();

        assert_eq!(
            marked,
            vec![
                ("a".to_string(), MarkSource::Arrival),
                ("b".to_string(), MarkSource::Arrival),
                ("c".to_string(), MarkSource::Transfer),
            ]
        );
    }

    #[test]
    fn test_take_marked_is_sorted_and_drains() {
        let mut state = SearchState::<u32>::new();
        state.seed(3, 0);
        state.seed(1, 0);
        state.seed(2, 0);

        let marked: Vec<u32> = state.take_marked().into_iter().map(|(id, _)| id).collect();
        assert_eq!(marked, vec![1, 2, 3]);
        assert!(!state.has_marked());
    }

    #[test]
    fn test_scan_bookkeeping_persists_across_rounds() {
        let mut state = SearchState::<String>::new();
        assert_eq!(state.scanned_sequence(&"t1".to_string()), None);

        state.record_scan("t1".to_string(), 7);
        state.advance_round();
        assert_eq!(state.scanned_sequence(&"t1".to_string()), Some(7));

        // a later boarding further upstream replaces the recorded sequence
        state.record_scan("t1".to_string(), 3);
        assert_eq!(state.scanned_sequence(&"t1".to_string()), Some(3));
    }
}
