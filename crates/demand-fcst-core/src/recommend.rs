//! Purchasing recommendations derived from a forecast path.

use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::period::Period;
use crate::stats::{mean, population_std_dev};

/// Relative change above which growth is considered strong.
pub const STRONG_GROWTH: f64 = 0.15;
/// Relative change above which growth is considered moderate.
pub const MODERATE_GROWTH: f64 = 0.05;
/// Relative change below which demand is considered declining.
pub const DECLINE: f64 = -0.05;
/// Coefficient of variation above which demand is considered volatile.
pub const HIGH_VOLATILITY: f64 = 0.30;

/// A single recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongGrowth,
    ModerateGrowth,
    DecliningDemand,
    HighVolatility,
    SummerSeason,
    YearEndDemand,
    /// Emitted with the default forecast
    InsufficientData,
    /// Emitted with the default forecast
    CollectMoreData,
}

impl Recommendation {
    pub fn message(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Recommendation::StrongGrowth, Locale::Ru) => {
                "📈 Сильный рост спроса. Рекомендуем увеличить закупки на 15-20%"
            }
            (Recommendation::StrongGrowth, Locale::En) => {
                "📈 Strong demand growth. Consider increasing purchases by 15-20%"
            }
            (Recommendation::ModerateGrowth, Locale::Ru) => {
                "📊 Умеренный рост спроса. Оптимизируйте запасы для избежания дефицита"
            }
            (Recommendation::ModerateGrowth, Locale::En) => {
                "📊 Moderate demand growth. Optimize stock levels to avoid shortages"
            }
            (Recommendation::DecliningDemand, Locale::Ru) => {
                "📉 Снижение спроса. Сократите закупки и рассмотрите акции для стимулирования продаж"
            }
            (Recommendation::DecliningDemand, Locale::En) => {
                "📉 Declining demand. Reduce purchases and consider promotions to stimulate sales"
            }
            (Recommendation::HighVolatility, Locale::Ru) => {
                "⚠️ Высокая волатильность спроса. Рекомендуем гибкую стратегию закупок"
            }
            (Recommendation::HighVolatility, Locale::En) => {
                "⚠️ High demand volatility. A flexible purchasing strategy is recommended"
            }
            (Recommendation::SummerSeason, Locale::Ru) => {
                "☀️ Сезонный всплеск летом. Увеличьте запасы сезонных товаров"
            }
            (Recommendation::SummerSeason, Locale::En) => {
                "☀️ Summer seasonal peak. Increase stock of seasonal goods"
            }
            (Recommendation::YearEndDemand, Locale::Ru) => {
                "🎄 Предновогодний спрос. Подготовьте дополнительные запасы и персонал"
            }
            (Recommendation::YearEndDemand, Locale::En) => {
                "🎄 Year-end demand. Prepare additional stock and staff"
            }
            (Recommendation::InsufficientData, Locale::Ru) => {
                "Недостаточно данных для точного прогноза. Используется прогноз по умолчанию."
            }
            (Recommendation::InsufficientData, Locale::En) => {
                "Not enough data for an accurate forecast. Using the default forecast."
            }
            (Recommendation::CollectMoreData, Locale::Ru) => {
                "Рекомендуем собрать больше исторических данных для улучшения точности."
            }
            (Recommendation::CollectMoreData, Locale::En) => {
                "Collect more historical data to improve accuracy."
            }
        }
    }
}

/// Derive recommendations from a forecast path.
///
/// Emitted in a fixed order: at most one trend item, then volatility, then
/// summer, then year end. `points` pairs each month with its predicted volume.
pub fn derive_recommendations(points: &[(Period, f64)]) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let volumes: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

    if let (Some(&first), Some(&last)) = (volumes.first(), volumes.last()) {
        // A zero first month has no defined relative change.
        if first.abs() > f64::EPSILON {
            let trend = (last - first) / first;
            if trend > STRONG_GROWTH {
                out.push(Recommendation::StrongGrowth);
            } else if trend > MODERATE_GROWTH {
                out.push(Recommendation::ModerateGrowth);
            } else if trend < DECLINE {
                out.push(Recommendation::DecliningDemand);
            }
        }
    }

    if volumes.len() > 1 {
        let m = mean(&volumes);
        if m.abs() > f64::EPSILON && population_std_dev(&volumes) / m > HIGH_VOLATILITY {
            out.push(Recommendation::HighVolatility);
        }
    }

    let months: Vec<u32> = points.iter().map(|(p, _)| p.month()).collect();
    if months.iter().any(|m| (6..=8).contains(m)) {
        out.push(Recommendation::SummerSeason);
    }
    if months.iter().any(|m| (11..=12).contains(m)) {
        out.push(Recommendation::YearEndDemand);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(start: (i32, u32), volumes: &[f64]) -> Vec<(Period, f64)> {
        let p = Period::new(start.0, start.1).unwrap();
        volumes
            .iter()
            .enumerate()
            .map(|(i, &v)| (p.plus_months(i as u32), v))
            .collect()
    }

    #[test]
    fn test_trend_boundaries() {
        use Recommendation::*;
        let spring = (2025, 3);
        assert_eq!(derive_recommendations(&path(spring, &[100.0, 116.0])), vec![StrongGrowth]);
        assert_eq!(derive_recommendations(&path(spring, &[100.0, 110.0])), vec![ModerateGrowth]);
        assert_eq!(derive_recommendations(&path(spring, &[100.0, 94.0])), vec![DecliningDemand]);
        assert!(derive_recommendations(&path(spring, &[100.0, 103.0])).is_empty());
    }

    #[test]
    fn test_exact_thresholds_are_exclusive() {
        let spring = (2025, 3);
        assert_eq!(
            derive_recommendations(&path(spring, &[100.0, 115.0])),
            vec![Recommendation::ModerateGrowth]
        );
        assert!(derive_recommendations(&path(spring, &[100.0, 105.0])).is_empty());
        assert!(derive_recommendations(&path(spring, &[100.0, 95.0])).is_empty());
    }

    #[test]
    fn test_volatility() {
        // Flat endpoints isolate the volatility rule.
        let recs = derive_recommendations(&path((2025, 3), &[100.0, 200.0, 100.0]));
        assert_eq!(recs, vec![Recommendation::HighVolatility]);

        let recs = derive_recommendations(&path((2025, 3), &[100.0, 200.0, 50.0]));
        assert!(recs.contains(&Recommendation::HighVolatility));

        let recs = derive_recommendations(&path((2025, 3), &[100.0, 105.0, 98.0]));
        assert!(!recs.contains(&Recommendation::HighVolatility));
    }

    #[test]
    fn test_single_month_has_no_volatility() {
        assert!(derive_recommendations(&path((2025, 3), &[100.0])).is_empty());
    }

    #[test]
    fn test_seasonal_flags() {
        let recs = derive_recommendations(&path((2025, 6), &[100.0, 100.0, 100.0]));
        assert_eq!(recs, vec![Recommendation::SummerSeason]);

        let recs = derive_recommendations(&path((2025, 11), &[100.0, 100.0]));
        assert_eq!(recs, vec![Recommendation::YearEndDemand]);

        let recs = derive_recommendations(&path((2025, 3), &[100.0, 100.0, 100.0]));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_order() {
        use Recommendation::*;
        // Jul..Dec, rising sharply with a spike.
        let recs = derive_recommendations(&path(
            (2025, 7),
            &[100.0, 400.0, 120.0, 130.0, 140.0, 150.0],
        ));
        assert_eq!(recs, vec![StrongGrowth, HighVolatility, SummerSeason, YearEndDemand]);
    }

    #[test]
    fn test_zero_first_month_skips_trend() {
        let recs = derive_recommendations(&path((2025, 3), &[0.0, 0.0]));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_messages() {
        assert!(Recommendation::StrongGrowth.message(Locale::Ru).contains("Сильный рост"));
        assert!(Recommendation::YearEndDemand.message(Locale::En).contains("Year-end"));
    }
}
