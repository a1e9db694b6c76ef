use std::borrow::Cow;

use hashbrown::{HashMap, HashSet};

use common::types::timetable::{Stop, StopTime, Transfer};
use common::types::UniqueId;
use common::util::logging::run_timed;

use super::SearchInput;

const LOG_TARGET: &str = "raptor::prepare";

/// The search input plus the lookup indices both searches scan over.
///
/// Index values point into the caller's slices instead of copying payloads;
/// all entity access goes back through the capability traits. Indices the
/// caller supplied through `PrecomputedIndexes` stay borrowed, the rest is
/// built here in a single pass over the raw lists.
pub(crate) struct PreparedInput<'a, ID: UniqueId> {
    from_stop_ids: HashSet<ID>,
    to_stop_ids: HashSet<ID>,
    transfers_by_from_stop: Cow<'a, HashMap<ID, Vec<usize>>>,
    stop_times_by_stop: Cow<'a, HashMap<ID, Vec<usize>>>,
    // within each value, ordering equals input ordering, which the input
    // contract fixes to ascending stop sequence
    stop_times_by_trip_service: Cow<'a, HashMap<ID, Vec<usize>>>,
}

impl<'a, ID: UniqueId> PreparedInput<'a, ID> {
    pub(crate) fn build<S, T, ST>(input: &SearchInput<'a, ID, S, T, ST>) -> Self
    where
        S: Stop<ID>,
        T: Transfer<ID>,
        ST: StopTime<ID>,
    {
        run_timed(LOG_TARGET, "index preparation", || {
            let from_stop_ids = input
                .from_stops
                .iter()
                .map(|stop| stop.unique_id().clone())
                .collect();
            let to_stop_ids = input
                .to_stops
                .iter()
                .map(|stop| stop.unique_id().clone())
                .collect();

            let transfers_by_from_stop = match input.precomputed.transfers_by_from_stop {
                Some(prepared) => Cow::Borrowed(prepared),
                None => {
                    let mut by_from_stop: HashMap<ID, Vec<usize>> = HashMap::new();
                    for (index, transfer) in input.transfers.iter().enumerate() {
                        by_from_stop
                            .entry(transfer.from_unique_stop_id().clone())
                            .or_default()
                            .push(index);
                    }
                    Cow::Owned(by_from_stop)
                }
            };

            // both stop-time indices come out of one pass when missing
            let (stop_times_by_stop, stop_times_by_trip_service) = match (
                input.precomputed.stop_times_by_stop,
                input.precomputed.stop_times_by_trip_service,
            ) {
                (Some(by_stop), Some(by_trip_service)) => {
                    (Cow::Borrowed(by_stop), Cow::Borrowed(by_trip_service))
                }
                (prepared_by_stop, prepared_by_trip_service) => {
                    let mut by_stop: HashMap<ID, Vec<usize>> = HashMap::new();
                    let mut by_trip_service: HashMap<ID, Vec<usize>> = HashMap::new();

                    for (index, stop_time) in input.stop_times.iter().enumerate() {
                        if prepared_by_stop.is_none() {
                            by_stop
                                .entry(stop_time.unique_stop_id().clone())
                                .or_default()
                                .push(index);
                        }
                        if prepared_by_trip_service.is_none() {
                            by_trip_service
                                .entry(stop_time.unique_trip_service_id().clone())
                                .or_default()
                                .push(index);
                        }
                    }

                    (
                        prepared_by_stop
                            .map(Cow::Borrowed)
                            .unwrap_or(Cow::Owned(by_stop)),
                        prepared_by_trip_service
                            .map(Cow::Borrowed)
                            .unwrap_or(Cow::Owned(by_trip_service)),
                    )
                }
            };

            Self {
                from_stop_ids,
                to_stop_ids,
                transfers_by_from_stop,
                stop_times_by_stop,
                stop_times_by_trip_service,
            }
        })
    }

    pub(crate) fn is_from_stop(&self, stop: &ID) -> bool {
        self.from_stop_ids.contains(stop)
    }

    pub(crate) fn is_to_stop(&self, stop: &ID) -> bool {
        self.to_stop_ids.contains(stop)
    }

    /// Indices of all transfers walkable out of `stop`, in input order.
    pub(crate) fn transfers_from(&self, stop: &ID) -> &[usize] {
        self.transfers_by_from_stop
            .get(stop)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Indices of all stop times calling at `stop`, in input order.
    pub(crate) fn stop_times_at(&self, stop: &ID) -> &[usize] {
        self.stop_times_by_stop
            .get(stop)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Indices of a trip service's stop times, ascending by stop sequence.
    pub(crate) fn trip_service_stop_times(&self, trip_service: &ID) -> &[usize] {
        self.stop_times_by_trip_service
            .get(trip_service)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raptor::{PrecomputedIndexes, SearchMode};
    use common::types::timetable::{StopRecord, StopTimeRecord, TransferRecord};

    fn stop_time(stop: &str, trip: &str, sequence: u32) -> StopTimeRecord<String> {
        StopTimeRecord {
            unique_stop_id: stop.to_string(),
            unique_trip_id: trip.to_string(),
            unique_trip_service_id: format!("{trip}-svc"),
            stop_sequence: sequence,
            arrival_time_seconds: i64::from(sequence) * 60,
            departure_time_seconds: i64::from(sequence) * 60 + 30,
        }
    }

    fn input_with<'a>(
        stops: &'a [StopRecord<String>],
        transfers: &'a [TransferRecord<String>],
        stop_times: &'a [StopTimeRecord<String>],
        precomputed: PrecomputedIndexes<'a, String>,
    ) -> SearchInput<'a, String, StopRecord<String>, TransferRecord<String>, StopTimeRecord<String>>
    {
        SearchInput {
            from_stops: &stops[..1],
            to_stops: &stops[1..],
            transfers,
            stop_times,
            mode: SearchMode::DepartAt,
            time_reference: 0,
            maximum_transfers: 4,
            allow_transfer_hopping: false,
            precomputed,
        }
    }

    #[test]
    fn test_indices_built_from_raw_lists() {
        let stops = vec![
            StopRecord { unique_id: "a".to_string() },
            StopRecord { unique_id: "b".to_string() },
        ];
        let transfers = vec![
            TransferRecord {
                from_unique_stop_id: "a".to_string(),
                to_unique_stop_id: "b".to_string(),
                minimum_transfer_time_seconds: 60,
            },
            TransferRecord {
                from_unique_stop_id: "a".to_string(),
                to_unique_stop_id: "c".to_string(),
                minimum_transfer_time_seconds: 90,
            },
        ];
        let stop_times = vec![
            stop_time("a", "t1", 1),
            stop_time("b", "t1", 2),
            stop_time("b", "t2", 1),
        ];

        let input = input_with(&stops, &transfers, &stop_times, PrecomputedIndexes::default());
        let prepared = PreparedInput::build(&input);

        assert!(prepared.is_from_stop(&"a".to_string()));
        assert!(prepared.is_to_stop(&"b".to_string()));
        assert!(!prepared.is_to_stop(&"a".to_string()));

        assert_eq!(prepared.transfers_from(&"a".to_string()), &[0, 1]);
        assert_eq!(prepared.transfers_from(&"b".to_string()), &[] as &[usize]);

        assert_eq!(prepared.stop_times_at(&"b".to_string()), &[1, 2]);
        assert_eq!(prepared.trip_service_stop_times(&"t1-svc".to_string()), &[0, 1]);
        assert_eq!(prepared.trip_service_stop_times(&"t2-svc".to_string()), &[2]);
    }

    #[test]
    fn test_supplied_indices_are_adopted_verbatim() {
        let stops = vec![
            StopRecord { unique_id: "a".to_string() },
            StopRecord { unique_id: "b".to_string() },
        ];
        let stop_times = vec![stop_time("a", "t1", 1), stop_time("b", "t1", 2)];

        // deliberately different from what a fresh build would produce, to
        // show that supplied indices win
        let by_stop = HashMap::from([("a".to_string(), vec![1usize])]);
        let by_trip_service = HashMap::from([("t1-svc".to_string(), vec![1usize, 0])]);
        let by_from_stop = HashMap::from([("b".to_string(), vec![0usize])]);

        let input = input_with(
            &stops,
            &[],
            &stop_times,
            PrecomputedIndexes {
                transfers_by_from_stop: Some(&by_from_stop),
                stop_times_by_stop: Some(&by_stop),
                stop_times_by_trip_service: Some(&by_trip_service),
            },
        );
        let prepared = PreparedInput::build(&input);

        assert_eq!(prepared.stop_times_at(&"a".to_string()), &[1]);
        assert_eq!(prepared.stop_times_at(&"b".to_string()), &[] as &[usize]);
        assert_eq!(prepared.trip_service_stop_times(&"t1-svc".to_string()), &[1, 0]);
        assert_eq!(prepared.transfers_from(&"b".to_string()), &[0]);
    }

    #[test]
    fn test_partial_supply_builds_only_whats_missing() {
        let stops = vec![
            StopRecord { unique_id: "a".to_string() },
            StopRecord { unique_id: "b".to_string() },
        ];
        let stop_times = vec![stop_time("a", "t1", 1), stop_time("b", "t1", 2)];
        let by_stop = HashMap::from([("a".to_string(), vec![0usize])]);

        let input = input_with(
            &stops,
            &[],
            &stop_times,
            PrecomputedIndexes {
                transfers_by_from_stop: None,
                stop_times_by_stop: Some(&by_stop),
                stop_times_by_trip_service: None,
            },
        );
        let prepared = PreparedInput::build(&input);

        // adopted
        assert_eq!(prepared.stop_times_at(&"a".to_string()), &[0]);
        assert_eq!(prepared.stop_times_at(&"b".to_string()), &[] as &[usize]);
        // built
        assert_eq!(prepared.trip_service_stop_times(&"t1-svc".to_string()), &[0, 1]);
    }
}
