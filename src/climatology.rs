//! Seasonal means of diagnostic time series.
//!
//! Seasons follow the shelf-sea convention: spring is March to May, summer June to September,
//! autumn October and November, and winter December to February. A winter is labelled with the
//! year of its December.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::errors::{DiagnosticsError, Result};
use crate::field::{insert_axis_index, nanmean, ArrND, Field};
use crate::variable::Dim;

/// Meteorological season, or `All` for the whole year.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    #[default]
    All,
}

impl Season {
    /// The four seasons in calendar order.
    pub const SEASONS: [Season; 4] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
            Season::All => "all",
        }
    }

    /// The season a calendar month belongs to.
    ///
    /// # Examples
    /// ```
    /// use stratos::climatology::Season;
    ///
    /// assert_eq!(Season::of_month(2), Season::Winter);
    /// assert_eq!(Season::of_month(9), Season::Summer);
    /// ```
    pub fn of_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=9 => Season::Summer,
            10 | 11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    /// The concrete seasons covered by `self`.
    pub fn members(&self) -> &'static [Season] {
        match self {
            Season::Spring => &[Season::Spring],
            Season::Summer => &[Season::Summer],
            Season::Autumn => &[Season::Autumn],
            Season::Winter => &[Season::Winter],
            Season::All => &Self::SEASONS,
        }
    }

    /// First and last day of the season in `year`. `All` spans the calendar year.
    pub fn date_range(&self, year: i32) -> Result<DateRange> {
        let (start, end) = match self {
            Season::Spring => (ymd(year, 3, 1)?, ymd(year, 5, 31)?),
            Season::Summer => (ymd(year, 6, 1)?, ymd(year, 9, 30)?),
            Season::Autumn => (ymd(year, 10, 1)?, ymd(year, 11, 30)?),
            Season::Winter => {
                let march = ymd(year + 1, 3, 1)?;
                let end = march.pred_opt().ok_or(DiagnosticsError::InvalidDate {
                    year: year + 1,
                    month: 2,
                    day: 28,
                })?;
                (ymd(year, 12, 1)?, end)
            }
            Season::All => (ymd(year, 1, 1)?, ymd(year, 12, 31)?),
        };
        Ok(DateRange {
            year,
            season: *self,
            start,
            end,
        })
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DiagnosticsError::InvalidDate {
        year,
        month,
        day,
    })
}

/// Inclusive range of days of one season in one year.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub year: i32,
    pub season: Season,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Date ranges of `season` for every year in `years`, ordered by year and then by season.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use stratos::climatology::{get_date_ranges, Season};
///
/// let ranges = get_date_ranges(&[2003], Season::Winter).unwrap();
/// assert_eq!(ranges[0].start, NaiveDate::from_ymd_opt(2003, 12, 1).unwrap());
/// assert_eq!(ranges[0].end, NaiveDate::from_ymd_opt(2004, 2, 29).unwrap());
/// ```
pub fn get_date_ranges(years: &[i32], season: Season) -> Result<Vec<DateRange>> {
    years
        .iter()
        .flat_map(|&year| season.members().iter().map(move |s| s.date_range(year)))
        .collect()
}

/// Mean of a field over one date range.
#[derive(Clone, Debug)]
pub struct SeasonalMean<const MD: usize> {
    pub year: i32,
    pub season: Season,
    /// Number of time records averaged.
    pub count: usize,
    pub mean: ArrND<MD, f64>,
}

/// Skip-missing mean over the records `indices` of the leading axis of `field`.
fn mean_over<const ND: usize, const MD: usize>(
    field: &ArrND<ND, f64>,
    indices: &[usize],
) -> ArrND<MD, f64> {
    ArrND::from_fn(field.shape().remove_axis::<MD>(0), |idx| {
        let values: Vec<f64> = indices
            .iter()
            .map(|&t| field[insert_axis_index::<MD, ND>(idx, 0, t)])
            .collect();
        nanmean(&values)
    })
}

fn check_time_axis<const ND: usize>(
    times: &[NaiveDateTime],
    field: &ArrND<ND, f64>,
) -> Result<()> {
    let found = field.shape()[0];
    if found != times.len() {
        return Err(DiagnosticsError::ShapeMismatch {
            field: "climatology input".to_string(),
            axis: Dim::Time,
            expected: times.len(),
            found,
        });
    }
    Ok(())
}

/// Mean of `field` over every `season` of every year covered by `times`.
///
/// The leading axis of `field` is time, labelled by `times`. Winters starting in the year before
/// the first record are included, so January and February of the first year are not lost.
/// Seasons without records are dropped. `MD` must be `ND - 1`.
pub fn multiyear_averages<const ND: usize, const MD: usize>(
    times: &[NaiveDateTime],
    field: &ArrND<ND, f64>,
    season: Season,
) -> Result<Vec<SeasonalMean<MD>>> {
    check_time_axis(times, field)?;
    let (first, last) = match (
        times.iter().map(|t| t.year()).min(),
        times.iter().map(|t| t.year()).max(),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(Vec::new()),
    };
    let years: Vec<i32> = (first - 1..=last).collect();

    let mut res = Vec::new();
    for range in get_date_ranges(&years, season)? {
        let indices: Vec<usize> = times
            .iter()
            .enumerate()
            .filter(|(_, t)| range.contains(t.date()))
            .map(|(i, _)| i)
            .collect();
        trace!(
            "{} {}: {} records",
            range.season.name(),
            range.year,
            indices.len()
        );
        if indices.is_empty() {
            continue;
        }
        res.push(SeasonalMean {
            year: range.year,
            season: range.season,
            count: indices.len(),
            mean: mean_over(field, &indices),
        });
    }
    Ok(res)
}

/// Mean of `field` per season over all years, in calendar order. Seasons without records are
/// dropped. `MD` must be `ND - 1`.
pub fn seasonal_climatology<const ND: usize, const MD: usize>(
    times: &[NaiveDateTime],
    field: &ArrND<ND, f64>,
) -> Result<Vec<(Season, ArrND<MD, f64>)>> {
    check_time_axis(times, field)?;
    let mut res = Vec::new();
    for season in Season::SEASONS {
        let indices: Vec<usize> = times
            .iter()
            .enumerate()
            .filter(|(_, t)| Season::of_month(t.month()) == season)
            .map(|(i, _)| i)
            .collect();
        trace!("{}: {} records", season.name(), indices.len());
        if !indices.is_empty() {
            res.push((season, mean_over(field, &indices)));
        }
    }
    Ok(res)
}
