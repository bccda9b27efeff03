//! Classification of requests into priority classes

use room_alloc_core::{Class, Request};

/// A stay of at most this many minutes is a short turn
pub const TURN_THRESHOLD_MINUTES: i64 = 120;

/// Classify a single request
///
/// Hub requests (no origin) and short turns are secondary, everything else is
/// primary.
pub fn classify(request: &Request) -> Class {
    let hub = request.origin().map_or(true, |origin| origin.trim().is_empty());
    let short_turn = match (request.arrival(), request.departure()) {
        (Some(arrival), Some(departure)) => {
            (departure - arrival).num_minutes() <= TURN_THRESHOLD_MINUTES
        }
        _ => false,
    };
    if hub || short_turn {
        Class::Secondary
    } else {
        Class::Primary
    }
}

/// Split a batch into `(primary, secondary)`, keeping input order in each
pub fn partition(requests: Vec<Request>) -> (Vec<Request>, Vec<Request>) {
    requests
        .into_iter()
        .partition(|request| classify(request) == Class::Primary)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use room_alloc_core::RequestId;

    use super::*;

    fn at(hour: u32, min: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2025, 3, 1)?.and_hms_opt(hour, min, 0)
    }

    fn request(id: u32, arr: (u32, u32), dep: (u32, u32), origin: Option<&str>) -> Request {
        Request::new(
            RequestId(id),
            at(arr.0, arr.1),
            at(dep.0, dep.1),
            origin.map(String::from),
        )
    }

    #[test]
    fn long_stay_with_origin_is_primary() {
        assert_eq!(classify(&request(1, (8, 0), (12, 0), Some("FRA"))), Class::Primary);
    }

    #[test]
    fn hub_requests_are_secondary() {
        assert_eq!(classify(&request(1, (8, 0), (18, 0), None)), Class::Secondary);
        assert_eq!(classify(&request(2, (8, 0), (18, 0), Some(" \t"))), Class::Secondary);
    }

    #[test]
    fn turn_threshold_is_inclusive() {
        assert_eq!(classify(&request(1, (8, 0), (10, 0), Some("FRA"))), Class::Secondary);
        assert_eq!(classify(&request(2, (8, 0), (10, 1), Some("FRA"))), Class::Primary);
    }

    #[test]
    fn missing_times_do_not_make_a_turn() {
        let request = Request::new(RequestId(1), at(8, 0), None, Some("FRA".into()));
        assert_eq!(classify(&request), Class::Primary);
    }

    #[test]
    fn partition_keeps_order() {
        let batch = vec![
            request(1, (8, 0), (18, 0), Some("FRA")),
            request(2, (8, 0), (9, 0), Some("FRA")),
            request(3, (8, 0), (18, 0), Some("CDG")),
            request(4, (8, 0), (18, 0), None),
        ];
        let (primary, secondary) = partition(batch);
        let ids = |list: &[Request]| list.iter().map(|r| r.id().0).collect::<Vec<_>>();
        assert_eq!(ids(&primary), vec![1, 3]);
        assert_eq!(ids(&secondary), vec![2, 4]);
    }
}
