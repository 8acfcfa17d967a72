use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const PT_MONTHS: [&str; 12] = [
    "JANEIRO",
    "FEVEREIRO",
    "MARÇO",
    "ABRIL",
    "MAIO",
    "JUNHO",
    "JULHO",
    "AGOSTO",
    "SETEMBRO",
    "OUTUBRO",
    "NOVEMBRO",
    "DEZEMBRO",
];

const PT_MONTHS_SHORT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Month used as the denominator window of the percentage KPIs.
/// `month` is 0-based (0 = janeiro).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct ReferencePeriod {
    month: u32,
    year: i32,
}

#[derive(Deserialize)]
struct RawPeriod {
    month: u32,
    year: i32,
}

impl TryFrom<RawPeriod> for ReferencePeriod {
    type Error = AppError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        ReferencePeriod::new(raw.month, raw.year)
    }
}

impl ReferencePeriod {
    pub fn new(month: u32, year: i32) -> Result<Self, AppError> {
        if month > 11 || NaiveDate::from_ymd_opt(year, month + 1, 1).is_none() {
            return Err(AppError::InvalidReferencePeriod { month, year });
        }
        // Next month must exist too, for last_day().
        let (ny, nm) = if month == 11 { (year + 1, 1) } else { (year, month + 2) };
        if NaiveDate::from_ymd_opt(ny, nm, 1).is_none() {
            return Err(AppError::InvalidReferencePeriod { month, year });
        }
        Ok(ReferencePeriod { month, year })
    }

    /// Accepts "MARÇO", "marco", "Março" or a 1-based number ("3").
    pub fn from_month_name(name: &str, year: i32) -> Result<Self, AppError> {
        let trimmed = name.trim();
        if let Ok(n) = trimmed.parse::<u32>() {
            return ReferencePeriod::new(n.clamp(1, 12) - 1, year);
        }
        let wanted = fold_accents(&trimmed.to_uppercase());
        PT_MONTHS
            .iter()
            .position(|m| fold_accents(m) == wanted)
            .ok_or_else(|| AppError::Custom(format!("Mês desconhecido: {}", name)))
            .and_then(|idx| ReferencePeriod::new(idx as u32, year))
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (y, m) = if self.month == 11 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 2)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .map(|next| next - Duration::days(1))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.month0() == self.month && date.year() == self.year
    }

    /// Same as `contains`, None never matches.
    pub fn contains_opt(&self, date: Option<NaiveDate>) -> bool {
        date.is_some_and(|d| self.contains(d))
    }

    /// Last day worth measuring: today for the current month, otherwise the
    /// month's last day.
    pub fn measurement_end(&self, today: NaiveDate) -> NaiveDate {
        if self.contains(today) {
            today
        } else {
            self.last_day()
        }
    }

    /// "MARÇO/2024"
    pub fn label(&self) -> String {
        format!("{}/{}", month_name(self.month), self.year)
    }
}

pub fn month_name(month0: u32) -> &'static str {
    PT_MONTHS.get(month0 as usize).copied().unwrap_or("DESCONHECIDO")
}

pub fn month_short_name(month0: u32) -> &'static str {
    PT_MONTHS_SHORT.get(month0 as usize).copied().unwrap_or("?")
}

/// Days 1..=last of the period, with `last` capped at today for the current
/// month.
pub fn period_days(period: &ReferencePeriod, today: NaiveDate) -> Vec<NaiveDate> {
    let mut result = Vec::new();
    let mut current = period.first_day();
    let end = period.measurement_end(today);

    while current <= end {
        result.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    result
}

/// "DD/MM"
pub fn day_label(date: NaiveDate) -> String {
    format!("{:02}/{:02}", date.day(), date.month())
}

pub fn date_in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'Á' | 'À' | 'Â' | 'Ã' => 'A',
            'É' | 'Ê' => 'E',
            'Í' => 'I',
            'Ó' | 'Ô' | 'Õ' => 'O',
            'Ú' => 'U',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}
