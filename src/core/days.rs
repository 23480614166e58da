//! Weekday mask utilities
//!
//! Days are numbered 1 (Monday) through 7 (Sunday). A days-mask stores day `d`
//! in bit `d - 1`, so the full week is `0b111_1111`. Stored masks use this
//! layout as-is.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

/// Short weekday names, Monday first
pub const DAY_NAMES: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

/// Mask with every weekday set
pub const ALL_DAYS_MASK: u8 = 0b111_1111;

/// Bit for a single weekday (1 = Monday). Out-of-range days yield 0.
pub fn weekday_bit(weekday: u32) -> u8 {
    match weekday {
        1..=7 => 1 << (weekday - 1),
        _ => 0,
    }
}

pub fn days_to_mask(days: &[u32]) -> u8 {
    days.iter().fold(0, |mask, &day| mask | weekday_bit(day))
}

pub fn mask_to_days(mask: u8) -> Vec<&'static str> {
    DAY_NAMES
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, name)| *name)
        .collect()
}

pub fn mask_matches(mask: u8, weekday: u32) -> bool {
    mask & weekday_bit(weekday) != 0
}

/// Weekday number (1..=7) for a short day name
pub fn day_index_from_name(name: &str) -> Option<u32> {
    DAY_NAMES
        .iter()
        .position(|d| *d == name)
        .map(|i| i as u32 + 1)
}

/// Zero-padded `HH:MM`
pub fn format_hhmm(hour: u32, minute: u32) -> String {
    format!("{hour:02}:{minute:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_to_mask() {
        assert_eq!(days_to_mask(&[1, 3, 5]), 0b0010101);
        assert_eq!(days_to_mask(&[1, 3, 5]), 21);
        assert_eq!(days_to_mask(&[1, 2, 3, 4, 5, 6, 7]), ALL_DAYS_MASK);
        assert_eq!(days_to_mask(&[]), 0);
        assert_eq!(days_to_mask(&[0, 8, 7]), 0b1000000);
    }

    #[test]
    fn test_mask_to_days() {
        assert_eq!(mask_to_days(21), vec!["Пн", "Ср", "Пт"]);
        assert_eq!(mask_to_days(ALL_DAYS_MASK).len(), 7);
        assert!(mask_to_days(0).is_empty());
    }

    #[test]
    fn test_mask_matches_every_mask_and_weekday() {
        for mask in 1..=ALL_DAYS_MASK {
            for weekday in 1..=7u32 {
                let bit_set = (mask >> (weekday - 1)) & 1 == 1;
                assert_eq!(mask_matches(mask, weekday), bit_set, "mask={mask:#09b} weekday={weekday}");
            }
        }
    }

    #[test]
    fn test_day_index_from_name() {
        assert_eq!(day_index_from_name("Пн"), Some(1));
        assert_eq!(day_index_from_name("Вс"), Some(7));
        assert_eq!(day_index_from_name("Mon"), None);
    }

    #[test]
    fn test_format_hhmm() {
        assert_eq!(format_hhmm(7, 5), "07:05");
        assert_eq!(format_hhmm(23, 59), "23:59");
    }
}
