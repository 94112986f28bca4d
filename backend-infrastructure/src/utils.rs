use chrono::{DateTime, Utc};

/// `now`, unless the clock stepped back behind `last`.
pub fn monotonic_timestamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(last) if last > now => last,
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn monotonic_timestamp_never_goes_backwards() {
        let now = Utc::now();
        let ahead = now + Duration::seconds(5);
        assert_eq!(monotonic_timestamp(Some(ahead), now), ahead);
        assert_eq!(monotonic_timestamp(Some(now), ahead), ahead);
        assert_eq!(monotonic_timestamp(None, now), now);
    }
}
