use crate::calendar::MonthKey;
use crate::models::{Category, MonthRecord, MonthSummary, MonthlyPoint, TotalAndAverage};

/// Anything that can sit in a grid cell: typed text or parsed minutes.
pub trait CellValue {
    /// Minutes held by the cell, or `None` when it is empty or not a
    /// non-negative whole number.
    fn minutes(&self) -> Option<u32>;
}

impl CellValue for Option<u32> {
    fn minutes(&self) -> Option<u32> {
        *self
    }
}

impl CellValue for u32 {
    fn minutes(&self) -> Option<u32> {
        Some(*self)
    }
}

impl CellValue for str {
    fn minutes(&self) -> Option<u32> {
        crate::models::parse_cell(self).ok().flatten()
    }
}

impl CellValue for String {
    fn minutes(&self) -> Option<u32> {
        self.as_str().minutes()
    }
}

impl<T: CellValue + ?Sized> CellValue for &T {
    fn minutes(&self) -> Option<u32> {
        (**self).minutes()
    }
}

pub fn compute_total_and_average<T: CellValue>(series: &[T]) -> TotalAndAverage {
    let (total, count) = series
        .iter()
        .filter_map(|value| value.minutes())
        .fold((0u64, 0u64), |(sum, count), value| {
            (sum.saturating_add(u64::from(value)), count + 1)
        });

    let average = if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    };

    TotalAndAverage { total, average }
}

pub fn summarize(record: &MonthRecord) -> MonthSummary {
    let stats = |category| compute_total_and_average(&record.series(category));
    MonthSummary {
        programming: stats(Category::Programming),
        fitness: stats(Category::Fitness),
        work: stats(Category::Work),
    }
}

/// Per-month programming and fitness totals, oldest month first.
pub fn aggregate_across_months<'a, I>(records: I) -> Vec<MonthlyPoint>
where
    I: IntoIterator<Item = (&'a MonthKey, &'a MonthRecord)>,
{
    let mut points: Vec<(MonthKey, MonthlyPoint)> = records
        .into_iter()
        .map(|(key, record)| {
            let point = MonthlyPoint {
                label: key.short_label(),
                programming: record.category_total(Category::Programming),
                fitness: record.category_total(Category::Fitness),
            };
            (*key, point)
        })
        .collect();

    points.sort_by_key(|(key, _)| *key);
    points.into_iter().map(|(_, point)| point).collect()
}

/// All programming minutes across the given records, in hours rounded to
/// two decimals.
pub fn total_hours<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a MonthRecord>,
{
    let minutes: u64 = records
        .into_iter()
        .map(|record| record.category_total(Category::Programming))
        .sum();
    (minutes as f64 / 60.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Month;
    use crate::models::DayEntry;

    fn record_with(
        key: &MonthKey,
        programming: &[(usize, u32)],
        fitness: &[(usize, u32)],
    ) -> MonthRecord {
        let mut record = MonthRecord::empty(key);
        for &(day, value) in programming {
            record.days[day].set(Category::Programming, Some(value));
        }
        for &(day, value) in fitness {
            record.days[day].set(Category::Fitness, Some(value));
        }
        record
    }

    #[test]
    fn empty_series_has_zero_average() {
        let empty: [Option<u32>; 0] = [];
        let stats = compute_total_and_average(&empty);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average, 0.0);
    }

    #[test]
    fn text_series_skips_blank_and_invalid_cells() {
        let stats = compute_total_and_average(&["10", "", "5", "abc"]);
        assert_eq!(stats.total, 15);
        assert_eq!(stats.average, 7.5);

        let owned = vec!["-3".to_string(), "4".to_string()];
        let stats = compute_total_and_average(&owned);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.average, 4.0);
    }

    #[test]
    fn summary_covers_each_category() {
        let key = MonthKey::new(Month::April, 2024).unwrap();
        let mut record = record_with(&key, &[(0, 60), (1, 30)], &[(2, 45)]);
        record.days[29] = DayEntry {
            programming: None,
            fitness: None,
            work: Some(480),
        };

        let summary = summarize(&record);
        assert_eq!(summary.programming.total, 90);
        assert_eq!(summary.programming.average, 45.0);
        assert_eq!(summary.fitness.total, 45);
        assert_eq!(summary.work.total, 480);
        assert_eq!(summary.work.average, 480.0);
    }

    #[test]
    fn aggregation_sorts_chronologically() {
        let dec = MonthKey::new(Month::December, 2023).unwrap();
        let jan = MonthKey::new(Month::January, 2024).unwrap();
        let nov = MonthKey::new(Month::November, 2023).unwrap();
        let records = vec![
            (dec, record_with(&dec, &[(0, 10)], &[])),
            (jan, record_with(&jan, &[(0, 20), (5, 5)], &[(3, 15)])),
            (nov, record_with(&nov, &[], &[(1, 40)])),
        ];

        let points = aggregate_across_months(records.iter().map(|(k, r)| (k, r)));
        let labels: Vec<_> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Nov23", "Dec23", "Jan24"]);
        assert_eq!(points[0].fitness, 40);
        assert_eq!(points[2].programming, 25);
        assert_eq!(points[2].fitness, 15);
    }

    #[test]
    fn total_hours_rounds_to_two_decimals() {
        let key = MonthKey::new(Month::May, 2024).unwrap();
        let a = record_with(&key, &[(0, 50), (1, 50)], &[(2, 600)]);
        let b = record_with(&key, &[(3, 10)], &[]);
        assert_eq!(total_hours([&a, &b]), 1.83);
        assert_eq!(total_hours(std::iter::empty::<&MonthRecord>()), 0.0);
    }
}
