use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Non-breaking space, as es-CO uses between symbol and amount
const NBSP: char = '\u{a0}';

/// Rendered when a date cannot be parsed
pub const INVALID_DATE: &str = "Invalid Date";

/// Format a date for display in es-CO, in the local time zone.
///
/// `"2024-03-15T14:30:00"` becomes `"15 de marzo de 2024, 02:30 p. m."`.
pub fn format_date(value: &str) -> String {
    format_date_in(value, &Local)
}

/// Same as [`format_date`] but rendered in an explicit time zone.
pub fn format_date_in<Tz: TimeZone>(value: &str, tz: &Tz) -> String {
    match parse_date(value, tz) {
        Some(instant) => render_date(&instant.with_timezone(tz)),
        None => INVALID_DATE.to_string(),
    }
}

/// Parse the date forms the backend and the CLI produce.
///
/// Offsets are honoured; date-times without one are wall-clock time in
/// `tz`; bare dates are midnight UTC.
fn parse_date<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    const LOCAL_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            // A wall-clock time skipped by a DST jump reads as one hour later
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn render_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };
    let period = if dt.hour() < 12 { "a." } else { "p." };
    format!(
        "{} de {} de {}, {:02}:{:02}{NBSP}{}{NBSP}m.",
        dt.day(),
        MONTHS_ES[dt.month0() as usize],
        dt.year(),
        hour12,
        dt.minute(),
        period,
    )
}

/// Format an amount as Colombian pesos.
///
/// No decimals are shown unless the amount has cents: `1500000.0` becomes
/// `"$ 1.500.000"` and `1500.5` becomes `"$ 1.500,5"`.
pub fn format_price(amount: f64) -> String {
    if amount.is_nan() {
        return "NaN".to_string();
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    if amount.is_infinite() {
        return format!("{sign}${NBSP}∞");
    }

    let abs = amount.abs();
    let mut whole = abs.trunc();
    let mut fraction = ((abs - whole) * 100.0).round() as u64;
    if fraction == 100 {
        whole += 1.0;
        fraction = 0;
    }

    let mut digits = group_thousands(&format!("{:.0}", whole));
    if fraction != 0 {
        let fraction = format!("{:02}", fraction);
        digits.push(',');
        digits.push_str(fraction.trim_end_matches('0'));
    }

    let sign = if whole == 0.0 && fraction == 0 { "" } else { sign };
    format!("{sign}${NBSP}{digits}")
}

fn group_thousands(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Format a Colombian phone number for display.
/// Mobile numbers become `300 123 4567`, with `+57` kept when present.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 => format!("{} {} {}", &digits[0..3], &digits[3..6], &digits[6..10]),
        12 if digits.starts_with("57") => format!(
            "+57 {} {} {}",
            &digits[2..5],
            &digits[5..8],
            &digits[8..12]
        ),
        _ => phone.to_string(), // Return original if can't format
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}
