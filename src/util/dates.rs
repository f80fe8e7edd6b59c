/*!
 Date conversion between plist time and calendar time.

 Plist dates are seconds relative to the reference epoch, 2001-01-01T00:00:00Z.
 The XML format writes them as UTC timestamps with the fractional seconds
 truncated.
*/

use chrono::{DateTime, NaiveDateTime, Utc};

/// Seconds between the unix epoch and the plist reference epoch
pub const REFERENCE_EPOCH_OFFSET: i64 = 978_307_200;

/// The timestamp pattern used by `<date>` elements
pub const XML_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render reference-epoch seconds as an XML plist timestamp
///
/// Fractional seconds are truncated. Returns `None` when the instant falls
/// outside the representable calendar range.
pub fn format_xml_date(seconds: f64) -> Option<String> {
    let unix = (seconds.trunc() as i64).checked_add(REFERENCE_EPOCH_OFFSET)?;
    let date = DateTime::<Utc>::from_timestamp(unix, 0)?;
    Some(date.format(XML_DATE_FORMAT).to_string())
}

/// Parse an XML plist timestamp into reference-epoch seconds
pub fn parse_xml_date(text: &str) -> Option<f64> {
    let date = NaiveDateTime::parse_from_str(text, XML_DATE_FORMAT).ok()?;
    Some((date.and_utc().timestamp() - REFERENCE_EPOCH_OFFSET) as f64)
}

#[cfg(test)]
mod tests {
    use crate::util::dates::{format_xml_date, parse_xml_date};

    #[test]
    fn can_format_reference_epoch() {
        assert_eq!(
            format_xml_date(0.0),
            Some("2001-01-01T00:00:00Z".to_string())
        );
    }

    #[test]
    fn can_truncate_fractional_seconds() {
        assert_eq!(
            format_xml_date(1.9),
            Some("2001-01-01T00:00:01Z".to_string())
        );
        assert_eq!(
            format_xml_date(-0.5),
            Some("2001-01-01T00:00:00Z".to_string())
        );
    }

    #[test]
    fn can_round_trip_whole_seconds() {
        let seconds = 700_000_000.0;
        let text = format_xml_date(seconds).unwrap();
        assert_eq!(parse_xml_date(&text), Some(seconds));
    }

    #[test]
    fn can_parse_known_timestamp() {
        assert_eq!(parse_xml_date("2001-01-01T00:01:00Z"), Some(60.0));
        assert_eq!(parse_xml_date("1970-01-01T00:00:00Z"), Some(-978_307_200.0));
    }

    #[test]
    fn can_reject_malformed_timestamp() {
        assert_eq!(parse_xml_date("2001-01-01 00:00:00"), None);
        assert_eq!(parse_xml_date("not a date"), None);
    }
}
