//! Human-readable labels for forecast responses.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::period::Period;

/// Response language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

const MONTHS_RU: [&str; 12] = [
    "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль", "Август", "Сентябрь",
    "Октябрь", "Ноябрь", "Декабрь",
];

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

impl Locale {
    /// `"<Month> <Year>"`, e.g. `"Июнь 2025"`.
    pub fn month_name(&self, period: Period) -> String {
        let names = match self {
            Locale::Ru => &MONTHS_RU,
            Locale::En => &MONTHS_EN,
        };
        format!("{} {}", names[(period.month() - 1) as usize], period.year())
    }

    /// Label for the requested horizon.
    pub fn horizon_label(&self, horizon: usize) -> String {
        match self {
            Locale::Ru => format!("{horizon} месяцев"),
            Locale::En if horizon == 1 => "1 month".to_string(),
            Locale::En => format!("{horizon} months"),
        }
    }
}

impl FromStr for Locale {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ru" | "ru_ru" | "russian" => Ok(Locale::Ru),
            "en" | "en_us" | "en_gb" | "english" => Ok(Locale::En),
            _ => Err(ForecastError::InvalidParameter {
                param: "locale".into(),
                value: s.into(),
                reason: "expected 'ru' or 'en'".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_names() {
        let june = Period::new(2025, 6).unwrap();
        assert_eq!(Locale::Ru.month_name(june), "Июнь 2025");
        assert_eq!(Locale::En.month_name(june), "June 2025");
        let dec = Period::new(2024, 12).unwrap();
        assert_eq!(Locale::Ru.month_name(dec), "Декабрь 2024");
    }

    #[test]
    fn test_horizon_label() {
        assert_eq!(Locale::Ru.horizon_label(3), "3 месяцев");
        assert_eq!(Locale::En.horizon_label(1), "1 month");
        assert_eq!(Locale::En.horizon_label(6), "6 months");
    }

    #[test]
    fn test_parse() {
        assert_eq!("RU".parse::<Locale>().unwrap(), Locale::Ru);
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }
}
