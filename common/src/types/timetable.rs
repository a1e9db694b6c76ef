use serde::{Deserialize, Serialize};

use crate::types::{Timestamp, UniqueId};

/// A boardable location. Parent stations must already be expanded onto their
/// child stops before routing; the core never looks at station hierarchies.
pub trait Stop<ID: UniqueId> {
    fn unique_id(&self) -> &ID;
}

/// A walking connection between two stops.
pub trait Transfer<ID: UniqueId> {
    fn from_unique_stop_id(&self) -> &ID;
    fn to_unique_stop_id(&self) -> &ID;
    fn minimum_transfer_time_seconds(&self) -> u32;
}

/// One scheduled call of a vehicle at a stop.
///
/// Stop times must already be filtered to the requested service day (GTFS
/// calendars are not interpreted here) and, per trip service id, be ordered
/// ascending by stop sequence with non-decreasing times.
pub trait StopTime<ID: UniqueId> {
    fn unique_stop_id(&self) -> &ID;
    /// The trip this call belongs to. May repeat across service days.
    fn unique_trip_id(&self) -> &ID;
    /// The trip scoped to one service day. Globally unique.
    fn unique_trip_service_id(&self) -> &ID;
    /// Strictly increasing along a trip; need not start at 1.
    fn stop_sequence(&self) -> u32;
    fn arrival_time_seconds(&self) -> Timestamp;
    fn departure_time_seconds(&self) -> Timestamp;
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
pub struct StopRecord<ID> {
    pub unique_id: ID,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct TransferRecord<ID> {
    pub from_unique_stop_id: ID,
    pub to_unique_stop_id: ID,
    pub minimum_transfer_time_seconds: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct StopTimeRecord<ID> {
    pub unique_stop_id: ID,
    pub unique_trip_id: ID,
    pub unique_trip_service_id: ID,
    pub stop_sequence: u32,
    pub arrival_time_seconds: Timestamp,
    pub departure_time_seconds: Timestamp,
}

impl<ID: UniqueId> Stop<ID> for StopRecord<ID> {
    fn unique_id(&self) -> &ID {
        &self.unique_id
    }
}

impl<ID: UniqueId> Transfer<ID> for TransferRecord<ID> {
    fn from_unique_stop_id(&self) -> &ID {
        &self.from_unique_stop_id
    }

    fn to_unique_stop_id(&self) -> &ID {
        &self.to_unique_stop_id
    }

    fn minimum_transfer_time_seconds(&self) -> u32 {
        self.minimum_transfer_time_seconds
    }
}

impl<ID: UniqueId> StopTime<ID> for StopTimeRecord<ID> {
    fn unique_stop_id(&self) -> &ID {
        &self.unique_stop_id
    }

    fn unique_trip_id(&self) -> &ID {
        &self.unique_trip_id
    }

    fn unique_trip_service_id(&self) -> &ID {
        &self.unique_trip_service_id
    }

    fn stop_sequence(&self) -> u32 {
        self.stop_sequence
    }

    fn arrival_time_seconds(&self) -> Timestamp {
        self.arrival_time_seconds
    }

    fn departure_time_seconds(&self) -> Timestamp {
        self.departure_time_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_accessors() {
        let stop_time = StopTimeRecord {
            unique_stop_id: "feed1:stop_a".to_string(),
            unique_trip_id: "feed1:trip_1".to_string(),
            unique_trip_service_id: "feed1:trip_1:20250823".to_string(),
            stop_sequence: 5,
            arrival_time_seconds: 100,
            departure_time_seconds: 130,
        };

        assert_eq!(stop_time.unique_stop_id(), "feed1:stop_a");
        assert_eq!(stop_time.unique_trip_id(), "feed1:trip_1");
        assert_eq!(stop_time.unique_trip_service_id(), "feed1:trip_1:20250823");
        assert_eq!(stop_time.stop_sequence(), 5);
        assert_eq!(stop_time.arrival_time_seconds(), 100);
        assert_eq!(stop_time.departure_time_seconds(), 130);
    }

    #[test]
    fn test_records_work_with_integer_ids() {
        let transfer = TransferRecord {
            from_unique_stop_id: 7u32,
            to_unique_stop_id: 9u32,
            minimum_transfer_time_seconds: 120,
        };

        assert_eq!(*transfer.from_unique_stop_id(), 7);
        assert_eq!(*transfer.to_unique_stop_id(), 9);
        assert_eq!(transfer.minimum_transfer_time_seconds(), 120);
    }
}
