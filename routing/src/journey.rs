use std::fmt::{Debug, Formatter};
use std::slice::Iter;

use hashbrown::HashSet;
use itertools::Itertools;
use serde::Serialize;

use common::types::{Timestamp, UniqueId};

/// The vehicle run a ride used, pinned to one service day.
#[derive(Serialize, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ViaTrip<ID> {
    /// May repeat across service days.
    pub trip_id: ID,
    /// Scoped to one service day; globally unique.
    pub trip_service_id: ID,
    pub boarding_sequence: u32,
    pub alight_sequence: u32,
}

/// One contiguous movement within a route: either riding a vehicle or
/// walking between two stops.
#[derive(Serialize, Clone, Eq, PartialEq, Hash)]
pub enum Span<ID> {
    #[serde(rename = "ride")]
    Ride {
        boarding_stop: ID,
        alight_stop: ID,
        trip: ViaTrip<ID>,
        boarding_time: Timestamp,
        alight_time: Timestamp,
    },
    #[serde(rename = "transfer")]
    Transfer {
        start: ID,
        end: ID,
        departure_time: Timestamp,
        arrival_time: Timestamp,
    },
}

impl<ID: UniqueId> Span<ID> {
    pub fn start(&self) -> &ID {
        match self {
            Span::Ride { boarding_stop: start, .. } | Span::Transfer { start, .. } => start,
        }
    }

    pub fn end(&self) -> &ID {
        match self {
            Span::Ride { alight_stop: end, .. } | Span::Transfer { end, .. } => end,
        }
    }

    pub fn departure_time(&self) -> Timestamp {
        match self {
            Span::Ride { boarding_time, .. } => *boarding_time,
            Span::Transfer { departure_time, .. } => *departure_time,
        }
    }

    pub fn arrival_time(&self) -> Timestamp {
        match self {
            Span::Ride { alight_time, .. } => *alight_time,
            Span::Transfer { arrival_time, .. } => *arrival_time,
        }
    }

    pub fn trip(&self) -> Option<&ViaTrip<ID>> {
        match self {
            Span::Ride { trip, .. } => Some(trip),
            Span::Transfer { .. } => None,
        }
    }

    pub fn is_ride(&self) -> bool {
        matches!(self, Span::Ride { .. })
    }
}

impl<ID: Debug> Debug for Span<ID> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Span::Ride {
                boarding_stop,
                alight_stop,
                trip,
                boarding_time,
                alight_time,
            } => f.write_fmt(format_args!(
                "{boarding_stop:?} @{boarding_time} ---{:?}---> {alight_stop:?} @{alight_time}",
                trip.trip_id
            )),
            Span::Transfer {
                start,
                end,
                departure_time,
                arrival_time,
            } => f.write_fmt(format_args!(
                "{start:?} ---walk({}s)---> {end:?}",
                arrival_time - departure_time
            )),
        }
    }
}

/// A canonical summary of a span chain, used to deduplicate journeys that
/// describe the same trip chain. Walking spans contribute an empty trip slot.
pub(crate) fn fingerprint<ID: UniqueId>(spans: &[Span<ID>]) -> String {
    spans
        .iter()
        .map(|span| {
            let trip_id = span
                .trip()
                .map(|trip| trip.trip_id.to_string())
                .unwrap_or_default();
            format!("{}|{}|{}", span.start(), trip_id, span.end())
        })
        .join("->")
}

/// A finalized route between one origin and one destination stop.
///
/// Journeys always begin and end with a ride: access and egress walks are
/// modeled outside the routing core.
#[derive(Serialize, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Journey<ID> {
    pub from_stop: ID,
    pub to_stop: ID,
    pub departure_time: Timestamp,
    pub arrival_time: Timestamp,
    pub legs: Vec<Span<ID>>,
}

impl<ID: UniqueId> Journey<ID> {
    fn from_spans(spans: Vec<Span<ID>>) -> Self {
        let first = spans.first().expect("a journey must have at least one leg");
        let last = spans.last().expect("a journey must have at least one leg");

        let from_stop = first.start().clone();
        let departure_time = first.departure_time();
        let to_stop = last.end().clone();
        let arrival_time = last.arrival_time();

        Self {
            from_stop,
            to_stop,
            departure_time,
            arrival_time,
            legs: spans,
        }
    }

    pub fn legs(&self) -> Iter<Span<ID>> {
        self.legs.iter()
    }

    pub fn duration_seconds(&self) -> i64 {
        self.arrival_time - self.departure_time
    }

    pub fn ride_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_ride()).count()
    }
}

/// Collects complete journeys as the searches discover them.
///
/// A span chain becomes a journey if it is non-empty, begins and ends with a
/// ride, and its fingerprint has not been seen before. Journeys keep their
/// discovery order; callers sort.
pub(crate) struct JourneyCollector<ID> {
    journeys: Vec<Journey<ID>>,
    seen_fingerprints: HashSet<String>,
}

impl<ID: UniqueId> JourneyCollector<ID> {
    pub(crate) fn new() -> Self {
        Self {
            journeys: Vec::new(),
            seen_fingerprints: HashSet::new(),
        }
    }

    /// Offers a label's span chain. Returns whether a journey was accepted.
    pub(crate) fn offer(&mut self, spans: &[Span<ID>]) -> bool {
        let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
            // an empty chain means we were already at the terminal stop
            return false;
        };
        if !first.is_ride() || !last.is_ride() {
            return false;
        }

        let fingerprint = fingerprint(spans);
        if self.seen_fingerprints.contains(&fingerprint) {
            return false;
        }

        // the label is still live search state, so copy its spans
        self.journeys.push(Journey::from_spans(spans.to_vec()));
        self.seen_fingerprints.insert(fingerprint);

        true
    }

    pub(crate) fn into_journeys(self) -> Vec<Journey<ID>> {
        self.journeys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ride(from: &str, to: &str, trip: &str, departure: Timestamp, arrival: Timestamp) -> Span<String> {
        Span::Ride {
            boarding_stop: from.to_string(),
            alight_stop: to.to_string(),
            trip: ViaTrip {
                trip_id: trip.to_string(),
                trip_service_id: format!("{trip}-svc"),
                boarding_sequence: 1,
                alight_sequence: 2,
            },
            boarding_time: departure,
            alight_time: arrival,
        }
    }

    fn walk(from: &str, to: &str, departure: Timestamp, arrival: Timestamp) -> Span<String> {
        Span::Transfer {
            start: from.to_string(),
            end: to.to_string(),
            departure_time: departure,
            arrival_time: arrival,
        }
    }

    #[test]
    fn test_fingerprint_format() {
        let spans = vec![
            ride("a", "b", "t1", 0, 10),
            walk("b", "c", 10, 15),
            ride("c", "d", "t2", 20, 30),
        ];

        assert_eq!(fingerprint(&spans), "a|t1|b->b||c->c|t2|d");
    }

    #[test]
    fn test_collector_rejects_empty_and_walk_boundaries() {
        let mut collector = JourneyCollector::<String>::new();

        assert!(!collector.offer(&[]));
        assert!(!collector.offer(&[walk("a", "b", 0, 5)]));
        assert!(!collector.offer(&[walk("a", "b", 0, 5), ride("b", "c", "t1", 10, 20)]));
        assert!(!collector.offer(&[ride("a", "b", "t1", 0, 10), walk("b", "c", 10, 15)]));

        assert!(collector.into_journeys().is_empty());
    }

    #[test]
    fn test_collector_accepts_and_deduplicates() {
        let mut collector = JourneyCollector::<String>::new();
        let spans = vec![ride("a", "b", "t1", 5, 10), ride("b", "c", "t2", 20, 30)];

        assert!(collector.offer(&spans));
        // the same trip chain again is a duplicate
        assert!(!collector.offer(&spans));
        // a different trip between the same stops is not
        assert!(collector.offer(&[ride("a", "b", "t9", 50, 60), ride("b", "c", "t2", 70, 80)]));

        let journeys = collector.into_journeys();
        assert_eq!(journeys.len(), 2);

        let journey = &journeys[0];
        assert_eq!(journey.from_stop, "a");
        assert_eq!(journey.to_stop, "c");
        assert_eq!(journey.departure_time, 5);
        assert_eq!(journey.arrival_time, 30);
        assert_eq!(journey.duration_seconds(), 25);
        assert_eq!(journey.ride_count(), 2);
        assert_eq!(journey.legs().count(), 2);
    }

    #[test]
    fn test_walks_between_rides_are_kept() {
        let mut collector = JourneyCollector::<String>::new();
        let spans = vec![
            ride("a", "b", "t1", 0, 10),
            walk("b", "c", 10, 15),
            ride("c", "d", "t2", 20, 30),
        ];

        assert!(collector.offer(&spans));
        let journeys = collector.into_journeys();
        assert_eq!(journeys[0].legs.len(), 3);
        assert_eq!(journeys[0].ride_count(), 2);
    }
}
