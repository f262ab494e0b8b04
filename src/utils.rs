use chrono::{Days, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.checked_sub_days(Days::new(1))
}

/// Last day of calendar quarter `quarter` (1-4).
pub fn quarter_end_date(year: i32, quarter: u32) -> Option<NaiveDate> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    last_day_of_month(year, quarter * 3)
}

/// End date of a reporting period: the quarter end for quarterly periods,
/// December 31st otherwise.
pub fn period_end_date(year: i32, quarter: Option<u32>) -> Option<NaiveDate> {
    match quarter {
        Some(q) => quarter_end_date(year, q),
        None => last_day_of_month(year, 12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2023, 2), NaiveDate::from_ymd_opt(2023, 2, 28));
        assert_eq!(last_day_of_month(2024, 2), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(last_day_of_month(2023, 12), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(last_day_of_month(2023, 13), None);
    }

    #[test]
    fn test_quarter_end_date() {
        assert_eq!(quarter_end_date(2023, 1), NaiveDate::from_ymd_opt(2023, 3, 31));
        assert_eq!(quarter_end_date(2023, 2), NaiveDate::from_ymd_opt(2023, 6, 30));
        assert_eq!(quarter_end_date(2023, 3), NaiveDate::from_ymd_opt(2023, 9, 30));
        assert_eq!(quarter_end_date(2023, 4), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(quarter_end_date(2023, 0), None);
        assert_eq!(quarter_end_date(2023, 5), None);
    }

    #[test]
    fn test_period_end_date() {
        assert_eq!(period_end_date(2022, None), NaiveDate::from_ymd_opt(2022, 12, 31));
        assert_eq!(period_end_date(2022, Some(2)), NaiveDate::from_ymd_opt(2022, 6, 30));
    }
}
