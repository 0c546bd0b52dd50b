//! Internal rate of return: the discount rate at which the net present value
//! of a dated cash-flow sequence is zero.

use chrono::NaiveDate;

use crate::constants::DAYS_PER_YEAR;

const MAX_NEWTON_ITERATIONS: u32 = 100;
const TOLERANCE: f64 = 1e-10;
// Rates below -100% are meaningless; the lower bracket stays just above it.
const MIN_RATE: f64 = -0.999_999;

/// Calculates the IRR for cash flows at the given dates (actual/365 year
/// fractions from the first date). Returns `f64::NAN` when the input is
/// degenerate or no root can be found; callers absorb that into a neutral
/// value for display.
pub fn calculate(dates: &[NaiveDate], values: &[f64]) -> f64 {
    if dates.len() != values.len() || dates.len() < 2 {
        return f64::NAN;
    }

    let first = dates[0];
    let times: Vec<f64> = dates
        .iter()
        .map(|d| (*d - first).num_days() as f64 / DAYS_PER_YEAR)
        .collect();

    // Newton-Raphson from a small positive guess.
    let mut rate = 0.05;
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let npv = net_present_value(&times, values, rate);
        let derivative = npv_derivative(&times, values, rate);

        if !npv.is_finite() || !derivative.is_finite() || derivative.abs() < f64::EPSILON {
            break;
        }

        let next = rate - npv / derivative;
        if !next.is_finite() || next <= MIN_RATE {
            break;
        }
        if (next - rate).abs() < TOLERANCE {
            return next;
        }
        rate = next;
    }

    bisect(&times, values)
}

fn net_present_value(times: &[f64], values: &[f64], rate: f64) -> f64 {
    times
        .iter()
        .zip(values)
        .map(|(t, v)| v / (1.0 + rate).powf(*t))
        .sum()
}

fn npv_derivative(times: &[f64], values: &[f64], rate: f64) -> f64 {
    times
        .iter()
        .zip(values)
        .map(|(t, v)| -t * v / (1.0 + rate).powf(t + 1.0))
        .sum()
}

/// Fallback: scan for a sign change, then bisect.
fn bisect(times: &[f64], values: &[f64]) -> f64 {
    let mut lower = MIN_RATE;
    let mut f_lower = net_present_value(times, values, lower);

    let mut upper = None;

    // Step the upper bound geometrically up to 1000000% per year.
    let mut candidate = lower;
    let mut step = 0.1;
    while candidate < 10_000.0 {
        candidate += step;
        step *= 1.5;
        let f_candidate = net_present_value(times, values, candidate);
        if !f_candidate.is_finite() {
            return f64::NAN;
        }
        if f_lower.signum() != f_candidate.signum() {
            upper = Some(candidate);
            break;
        }
        lower = candidate;
        f_lower = f_candidate;
    }

    let Some(mut upper) = upper else {
        return f64::NAN;
    };

    for _ in 0..200 {
        let mid = (lower + upper) / 2.0;
        let f_mid = net_present_value(times, values, mid);
        if f_mid.abs() < TOLERANCE || (upper - lower) / 2.0 < TOLERANCE {
            return mid;
        }
        if f_mid.signum() == f_lower.signum() {
            lower = mid;
            f_lower = f_mid;
        } else {
            upper = mid;
        }
    }

    (lower + upper) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn one_year_ten_percent() {
        let dates = vec![date("2020-01-01"), date("2020-12-31")];
        let values = vec![-1000.0, 1100.0];
        let irr = calculate(&dates, &values);
        // 365 days, so exactly one year on the actual/365 basis
        assert!((irr - 0.1).abs() < 1e-6, "irr was {irr}");
    }

    #[test]
    fn negative_rate_for_a_loss() {
        let dates = vec![date("2020-01-01"), date("2020-12-31")];
        let values = vec![-1000.0, 900.0];
        let irr = calculate(&dates, &values);
        assert!((irr + 0.1).abs() < 1e-6, "irr was {irr}");
    }

    #[test]
    fn intermediate_flows() {
        let dates = vec![date("2020-01-01"), date("2020-07-01"), date("2020-12-31")];
        let values = vec![-1000.0, 500.0, 600.0];
        let irr = calculate(&dates, &values);
        // NPV at the returned rate must vanish
        let t1 = (dates[1] - dates[0]).num_days() as f64 / 365.0;
        let t2 = (dates[2] - dates[0]).num_days() as f64 / 365.0;
        let npv = -1000.0 + 500.0 / (1.0 + irr).powf(t1) + 600.0 / (1.0 + irr).powf(t2);
        assert!(npv.abs() < 1e-6);
    }

    #[test]
    fn degenerate_input_is_nan() {
        assert!(calculate(&[], &[]).is_nan());
        assert!(calculate(&[date("2020-01-01")], &[100.0]).is_nan());
        // All-positive flows have no root
        let dates = vec![date("2020-01-01"), date("2020-12-31")];
        assert!(calculate(&dates, &[100.0, 100.0]).is_nan());
    }
}
