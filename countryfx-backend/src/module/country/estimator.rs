//! Economic estimate per candidate
//!
//! The figure is `population × U / rate` with `U` drawn uniformly from
//! [`MULTIPLIER_RANGE`] on every call. Refreshing identical inputs yields a
//! different value each time; the caller supplies the RNG.

use rand::Rng;
use std::ops::Range;

use super::types::{Candidate, Estimate, ExchangeRateTable};

pub const MULTIPLIER_RANGE: Range<f64> = 1000.0..2000.0;

pub fn estimate<R: Rng>(candidate: &Candidate, rates: &ExchangeRateTable, rng: &mut R) -> Estimate {
    let Some(code) = candidate.currency_code.as_ref() else {
        return Estimate {
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: Some(0.0),
        };
    };

    match rates.get(code).copied().filter(|rate| *rate != 0.0) {
        Some(rate) => {
            let multiplier = rng.gen_range(MULTIPLIER_RANGE);
            Estimate {
                currency_code: Some(code.clone()),
                exchange_rate: Some(rate),
                estimated_gdp: Some(candidate.population as f64 * multiplier / rate),
            }
        }
        // zero rates are treated as unknown
        None => Estimate {
            currency_code: Some(code.clone()),
            exchange_rate: None,
            estimated_gdp: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn candidate(population: i64, currency_code: Option<&str>) -> Candidate {
        Candidate {
            name: "Testland".to_string(),
            capital: None,
            region: None,
            population,
            currency_code: currency_code.map(str::to_string),
            flag_url: None,
        }
    }

    fn rates() -> ExchangeRateTable {
        [("NGN".to_string(), 1600.5), ("EUR".to_string(), 0.92), ("XXX".to_string(), 0.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_no_currency_estimates_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let est = estimate(&candidate(5_000, None), &rates(), &mut rng);
        assert_eq!(est, Estimate { currency_code: None, exchange_rate: None, estimated_gdp: Some(0.0) });
    }

    #[test]
    fn test_priced_currency_within_multiplier_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let population = 206_139_587;

        for _ in 0..500 {
            let est = estimate(&candidate(population, Some("NGN")), &rates(), &mut rng);
            assert_eq!(est.currency_code.as_deref(), Some("NGN"));
            assert_eq!(est.exchange_rate, Some(1600.5));

            let gdp = est.estimated_gdp.unwrap();
            assert!(gdp > 0.0);
            let multiplier = gdp * 1600.5 / population as f64;
            assert!(multiplier >= 999.999 && multiplier < 2000.001, "multiplier {}", multiplier);
        }
    }

    #[test]
    fn test_each_call_draws_a_new_multiplier() {
        let mut rng = StdRng::seed_from_u64(42);
        let c = candidate(1_000_000, Some("EUR"));
        let first = estimate(&c, &rates(), &mut rng).estimated_gdp;
        let second = estimate(&c, &rates(), &mut rng).estimated_gdp;
        assert_ne!(first, second);
    }

    #[test]
    fn test_unknown_currency_keeps_code() {
        let mut rng = StdRng::seed_from_u64(1);
        let est = estimate(&candidate(10, Some("ABC")), &rates(), &mut rng);
        assert_eq!(est, Estimate { currency_code: Some("ABC".into()), exchange_rate: None, estimated_gdp: None });
    }

    #[test]
    fn test_zero_rate_treated_as_unknown() {
        let mut rng = StdRng::seed_from_u64(1);
        let est = estimate(&candidate(10, Some("XXX")), &rates(), &mut rng);
        assert_eq!(est, Estimate { currency_code: Some("XXX".into()), exchange_rate: None, estimated_gdp: None });
    }

    #[test]
    fn test_zero_population_priced_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let est = estimate(&candidate(0, Some("EUR")), &rates(), &mut rng);
        assert_eq!(est.estimated_gdp, Some(0.0));
        assert_eq!(est.exchange_rate, Some(0.92));
    }
}
