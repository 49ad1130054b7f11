//! Alert message template.

use chrono::NaiveDate;

use crate::domain::{FareClass, ScheduleType, TrainResult, format_travel_date};

/// Render the Markdown alert for one train.
///
/// Interpolated values are escaped, so `inter_county` or a train name with
/// `*` in it cannot unbalance the message's own emphasis.
pub fn format_alert(
    train: &TrainResult,
    date: NaiveDate,
    schedule_type: ScheduleType,
    booking_url: &str,
) -> String {
    let mut message = String::new();
    message.push_str("🚂 *TRAIN AVAILABLE ALERT!* 🚂\n\n");
    message.push_str(&format!(
        "*Date:* {}\n",
        escape_markdown(&format_travel_date(date))
    ));
    message.push_str(&format!(
        "*Train:* {} ({})\n",
        escape_markdown(&train.display_name),
        escape_markdown(schedule_type.as_str())
    ));
    message.push_str(&format!(
        "*Departure:* {}\n",
        escape_markdown(train.departure_time.as_deref().unwrap_or("N/A"))
    ));
    message.push_str(&format!(
        "*Arrival:* {}\n",
        escape_markdown(train.arrival_time.as_deref().unwrap_or("N/A"))
    ));

    for class in [FareClass::First, FareClass::Economy] {
        message.push('\n');
        message.push_str(&class_line(train, class));
        message.push('\n');
    }

    message.push_str(&format!(
        "\n*Book Now:* {}\n",
        escape_markdown(booking_url)
    ));
    message
}

/// Backslash-escape the characters Telegram's legacy Markdown treats as
/// entity delimiters.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '[' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn class_line(train: &TrainResult, class: FareClass) -> String {
    match train.class(class) {
        Some(availability) if availability.has_prices() => format!(
            "*{}:* {} seats available (adult {}, child {})",
            class.label(),
            availability.seat_count,
            escape_markdown(&availability.adult_price),
            escape_markdown(&availability.child_price)
        ),
        Some(availability) => format!(
            "*{}:* {} seats available",
            class.label(),
            availability.seat_count
        ),
        None => format!("*{}:* 0 seats available", class.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FareClassAvailability;

    fn train() -> TrainResult {
        TrainResult {
            display_name: "Train 03:00 pm".to_string(),
            departure_time: Some("03:00 pm".to_string()),
            arrival_time: None,
            classes: vec![
                FareClassAvailability::new(FareClass::First, 4).with_prices("KES 4,500", "KES 2,250"),
            ],
        }
    }

    #[test]
    fn alert_contains_all_fields() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let message = format_alert(
            &train(),
            date,
            ScheduleType::Express,
            "https://metickets.krc.co.ke",
        );

        assert!(message.starts_with("🚂 *TRAIN AVAILABLE ALERT!* 🚂"));
        assert!(message.contains("*Date:* 02/01/2026\n"));
        assert!(message.contains("*Train:* Train 03:00 pm (express)\n"));
        assert!(message.contains("*Departure:* 03:00 pm\n"));
        assert!(message.contains("*Arrival:* N/A\n"));
        assert!(message.contains(
            "*First Class:* 4 seats available (adult KES 4,500, child KES 2,250)\n"
        ));
        assert!(message.contains("*Economy:* 0 seats available\n"));
        assert!(message.ends_with("*Book Now:* https://metickets.krc.co.ke\n"));
    }

    /// Every `_` and `*` that is not part of the template is preceded by a
    /// backslash.
    fn has_unescaped(message: &str, marker: char) -> bool {
        const TEMPLATE: [&str; 8] = [
            "*TRAIN AVAILABLE ALERT!*",
            "*Date:*",
            "*Train:*",
            "*Departure:*",
            "*Arrival:*",
            "*First Class:*",
            "*Economy:*",
            "*Book Now:*",
        ];
        let mut stripped = message.to_string();
        for t in TEMPLATE {
            stripped = stripped.replace(t, "");
        }
        let chars: Vec<char> = stripped.chars().collect();
        chars
            .iter()
            .enumerate()
            .any(|(i, &c)| c == marker && (i == 0 || chars[i - 1] != '\\'))
    }

    #[test]
    fn inter_county_underscore_is_escaped() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let message = format_alert(&train(), date, ScheduleType::InterCounty, "https://x.test");

        assert!(message.contains("*Train:* Train 03:00 pm (inter\\_county)\n"));
        assert!(!has_unescaped(&message, '_'));
    }

    #[test]
    fn interpolated_values_are_escaped() {
        let mut train = train();
        train.display_name = "Night *Special* [SGR]".to_string();
        train.classes[0] = FareClassAvailability::new(FareClass::First, 2)
            .with_prices("KES_4500", "`2250`");
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let message = format_alert(&train, date, ScheduleType::Express, "https://x.test/book_now");

        assert!(message.contains("Night \\*Special\\* \\[SGR]"));
        assert!(message.contains("(adult KES\\_4500, child \\`2250\\`)"));
        assert!(message.contains("https://x.test/book\\_now"));
        assert!(!has_unescaped(&message, '_'));
        assert!(!has_unescaped(&message, '*'));
    }

    #[test]
    fn escape_markdown_leaves_plain_text() {
        assert_eq!(escape_markdown("KES 4,500 (03:00 pm)"), "KES 4,500 (03:00 pm)");
        assert_eq!(escape_markdown("a_b*c[d`e"), "a\\_b\\*c\\[d\\`e");
    }
}
