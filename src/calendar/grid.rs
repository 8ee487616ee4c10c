use chrono::{Datelike, Days, NaiveDate};

/// Week columns in one year grid.
pub const WEEK_COLUMNS: usize = 53;

/// Upper bound on drawn columns. A leap year starting on a Saturday has its
/// Dec 31 in an extra, unlabeled column.
pub const MAX_COLUMNS: usize = WEEK_COLUMNS + 1;

/// Weekday rows in one year grid, Sunday first.
pub const DAYS_PER_WEEK: usize = 7;

/// Three-letter month abbreviations, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One day placed on a year grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub year: i32,
    pub column: usize,
    pub row: usize,
    pub date: NaiveDate,
    /// Day total, `None` when nothing was read that day.
    pub total: Option<u64>,
}

/// A candidate position on the grid. `date` is `None` past Dec 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub column: usize,
    pub row: usize,
    pub date: Option<NaiveDate>,
}

/// The 53x7 week grid of one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearGrid {
    year: i32,
    anchor: NaiveDate,
}

impl YearGrid {
    /// Returns `None` for years chrono cannot represent.
    pub fn new(year: i32) -> Option<Self> {
        Some(Self {
            year,
            anchor: grid_anchor(year)?,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The Sunday on or before January 1st.
    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Date at the top of `column`, if it still belongs to the year.
    pub fn column_start(&self, column: usize) -> Option<NaiveDate> {
        self.date_at(column, 0)
    }

    /// Date at (`column`, `row`), or `None` once past December 31st.
    /// Columns beyond `MAX_COLUMNS` are never dated.
    pub fn date_at(&self, column: usize, row: usize) -> Option<NaiveDate> {
        if column >= MAX_COLUMNS || row >= DAYS_PER_WEEK {
            return None;
        }
        let index = (column * DAYS_PER_WEEK + row) as u64;
        self.anchor
            .checked_add_days(Days::new(index))
            .filter(|date| date.year() <= self.year)
    }

    /// Number of columns that hold dates of the year: `WEEK_COLUMNS`, plus
    /// one when Dec 31 spills past the regular grid.
    pub fn columns(&self) -> usize {
        if self.column_start(WEEK_COLUMNS).is_some() {
            MAX_COLUMNS
        } else {
            WEEK_COLUMNS
        }
    }

    /// All `columns() * DAYS_PER_WEEK` candidate slots, column-major.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.columns()).flat_map(move |column| {
            (0..DAYS_PER_WEEK).map(move |row| Slot {
                column,
                row,
                date: self.date_at(column, row),
            })
        })
    }
}

/// The Sunday on or before January 1st of `year`.
pub fn grid_anchor(year: i32) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let lead = jan1.weekday().num_days_from_sunday();
    jan1.checked_sub_days(Days::new(u64::from(lead)))
}

/// Tracks the last labeled month while walking a year's columns.
///
/// Column 0 is always labeled January. Inner columns get a label whenever
/// the date at the top of the column falls in a different month than the
/// last label. The final regular column, and the spill column after it, are
/// never labeled.
#[derive(Debug, Clone, Copy)]
pub struct MonthLabeler {
    last_month: u32,
}

impl Default for MonthLabeler {
    fn default() -> Self {
        Self { last_month: 1 }
    }
}

impl MonthLabeler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the label to draw above `column`, if any.
    pub fn observe(
        &mut self,
        column: usize,
        column_start: Option<NaiveDate>,
    ) -> Option<&'static str> {
        if column == 0 {
            self.last_month = 1;
            return Some(MONTH_NAMES[0]);
        }
        if column >= WEEK_COLUMNS - 1 {
            return None;
        }

        let month = column_start?.month();
        if month == self.last_month {
            return None;
        }
        self.last_month = month;
        Some(MONTH_NAMES[month as usize - 1])
    }
}
