//! Query-string normalization. Everything here is pure: no I/O, no clock
//! reads except what the caller passes in.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use super::error::ParamError;
use crate::db::models::Statistic;

pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 31;

/// Split on commas, trim, drop empty tokens, de-duplicate keeping the first
/// occurrence.
fn split_dedup(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(*s))
        .map(str::to_owned)
        .collect()
}

/// `None` means "all sensors", including when the input yields no ids.
pub fn parse_sensor_ids(raw: Option<&str>) -> Option<Vec<String>> {
    let ids = split_dedup(raw?);
    (!ids.is_empty()).then_some(ids)
}

/// Empty result means "all metrics".
pub fn parse_metric_names(raw: Option<&str>) -> Vec<String> {
    raw.map(split_dedup).unwrap_or_default()
}

/// Case-insensitive; absent or empty input selects the average. Whitespace
/// alone is not empty and is rejected.
pub fn parse_statistic(raw: Option<&str>) -> Result<Statistic, ParamError> {
    let raw = match raw {
        None | Some("") => return Ok(Statistic::Avg),
        Some(raw) => raw,
    };
    match raw.trim().to_lowercase().as_str() {
        "average" => Ok(Statistic::Avg),
        "min" => Ok(Statistic::Min),
        "max" => Ok(Statistic::Max),
        "sum" => Ok(Statistic::Sum),
        _ => Err(ParamError::InvalidStatistic(raw.to_owned())),
    }
}

/// `[now - days, now]`, with `days` in `1..=31` and one day when absent.
pub fn compute_date_range(
    days: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ParamError> {
    let days = match days {
        Some(d) if !(MIN_DAYS..=MAX_DAYS).contains(&d) => {
            return Err(ParamError::DaysOutOfRange(d))
        }
        Some(d) => d,
        None => 1,
    };
    Ok((now - Duration::days(days), now))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 8, 30, 0).unwrap()
    }

    #[test]
    fn sensor_ids_trim_and_dedup_in_first_seen_order() {
        let ids = parse_sensor_ids(Some(" b, a ,b,,c, a ")).unwrap();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn sensor_ids_absent_when_nothing_left() {
        assert_eq!(parse_sensor_ids(None), None);
        assert_eq!(parse_sensor_ids(Some("")), None);
        assert_eq!(parse_sensor_ids(Some(" , ,")), None);
    }

    #[test]
    fn metric_names_empty_not_absent() {
        assert!(parse_metric_names(None).is_empty());
        assert!(parse_metric_names(Some("")).is_empty());
        assert!(parse_metric_names(Some("  ,")).is_empty());
    }

    #[test]
    fn metric_names_dedup_and_keep_unknown_names() {
        let m = parse_metric_names(Some("humidity,temperature, humidity,voltage"));
        assert_eq!(m, vec!["humidity", "temperature", "voltage"]);
    }

    #[test]
    fn statistic_accepts_any_casing() {
        for (raw, want) in [
            ("average", Statistic::Avg),
            ("AVERAGE", Statistic::Avg),
            ("Min", Statistic::Min),
            ("mAx", Statistic::Max),
            ("SUM", Statistic::Sum),
        ] {
            assert_eq!(parse_statistic(Some(raw)).unwrap(), want, "{raw}");
        }
    }

    #[test]
    fn statistic_defaults_to_average() {
        assert_eq!(parse_statistic(None).unwrap(), Statistic::Avg);
        assert_eq!(parse_statistic(Some("")).unwrap(), Statistic::Avg);
    }

    #[test]
    fn statistic_rejects_unknown_alias() {
        let err = parse_statistic(Some("median")).unwrap_err();
        assert_eq!(err, ParamError::InvalidStatistic("median".into()));
        assert!(err.to_string().contains("average, min, max, sum"));
        assert!(parse_statistic(Some("avg")).is_err());
        assert_eq!(
            parse_statistic(Some("   ")).unwrap_err(),
            ParamError::InvalidStatistic("   ".into())
        );
    }

    #[test]
    fn statistic_ignores_surrounding_whitespace() {
        assert_eq!(parse_statistic(Some(" max ")).unwrap(), Statistic::Max);
    }

    #[test]
    fn date_range_defaults_to_one_day() {
        let (start, end) = compute_date_range(None, now()).unwrap();
        assert_eq!(end, now());
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let (start, _) = compute_date_range(Some(1), now()).unwrap();
        assert_eq!(start, now() - Duration::days(1));
        let (start, _) = compute_date_range(Some(31), now()).unwrap();
        assert_eq!(start, now() - Duration::days(31));
    }

    #[test]
    fn date_range_rejects_out_of_range_days() {
        assert_eq!(
            compute_date_range(Some(0), now()).unwrap_err(),
            ParamError::DaysOutOfRange(0)
        );
        assert_eq!(
            compute_date_range(Some(32), now()).unwrap_err(),
            ParamError::DaysOutOfRange(32)
        );
        assert!(compute_date_range(Some(-3), now()).is_err());
    }
}
