use crate::models::rate::{QuoteLine, RateEntry};

/// Price of a shipment whose carrier has no usable rate.
pub const FALLBACK_COST: f64 = 7.00;

/// Parcel attributes that drive the price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceInput {
    pub weight: f64,
    pub cod_amount: f64,
    pub insured: bool,
    pub express: bool,
    pub packages: i64,
}

impl PriceInput {
    pub fn new(weight: f64, cod_amount: f64, insured: bool) -> Self {
        Self {
            weight,
            cod_amount,
            insured,
            express: false,
            packages: 1,
        }
    }
}

/// Cost of one shipment.
///
/// Fees are accumulated in order: base plus weight, then the cod surcharge,
/// then insurance as a percentage of the running total, then the express
/// surcharge. The sum is multiplied by the package count and rounded to
/// cents. A missing or inactive rate yields [`FALLBACK_COST`].
pub fn quote(rate: Option<&RateEntry>, input: &PriceInput) -> f64 {
    let Some(rate) = rate.filter(|r| r.active) else {
        return FALLBACK_COST;
    };

    let mut cost = rate.base_fee + input.weight * rate.per_kg;
    if input.cod_amount > 0.0 {
        cost += rate.cod_fee;
    }
    if input.insured {
        cost += cost * rate.insurance_pct / 100.0;
    }
    if input.express {
        cost += rate.express_fee;
    }
    cost *= input.packages.max(1) as f64;

    round_cents(cost)
}

/// Round half-up to two decimals.
///
/// The value is first snapped to a micro-cent grid so binary noise such as
/// `7.0999999` does not decide the rounding direction.
pub fn round_cents(value: f64) -> f64 {
    let cents = (value * 100.0 * 1e6).round() / 1e6;
    cents.round() / 100.0
}

pub fn eta_window(carrier: &str, express: bool) -> &'static str {
    if express {
        "24h"
    } else if matches!(carrier, "DHL" | "UPS") {
        "24-48h"
    } else {
        "48-72h"
    }
}

/// Quote every given rate, cheapest first.
pub fn compare(rates: &[RateEntry], input: &PriceInput) -> Vec<QuoteLine> {
    let mut lines: Vec<QuoteLine> = rates
        .iter()
        .filter(|rate| rate.active)
        .map(|rate| QuoteLine {
            carrier: rate.carrier.clone(),
            cost: quote(Some(rate), input),
            eta_window: eta_window(&rate.carrier, input.express),
        })
        .collect();

    lines.sort_by(|a, b| a.cost.total_cmp(&b.cost).then_with(|| a.carrier.cmp(&b.carrier)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rate::DEFAULT_RATES;

    fn rate(carrier: &str) -> RateEntry {
        let (_, base_fee, per_kg, cod_fee, insurance_pct, express_fee) = DEFAULT_RATES
            .iter()
            .copied()
            .find(|r| r.0 == carrier)
            .unwrap();
        RateEntry {
            carrier: carrier.to_string(),
            base_fee,
            per_kg,
            cod_fee,
            insurance_pct,
            express_fee,
            active: true,
        }
    }

    fn default_rates() -> Vec<RateEntry> {
        DEFAULT_RATES.iter().map(|r| rate(r.0)).collect()
    }

    #[test]
    fn brt_two_kilos() {
        let cost = quote(Some(&rate("BRT")), &PriceInput::new(2.0, 0.0, false));
        assert_eq!(cost, 7.10);
    }

    #[test]
    fn dhl_with_cod_and_insurance() {
        // (8.50 + 1.20 + 3.50) * 1.02
        let cost = quote(Some(&rate("DHL")), &PriceInput::new(1.0, 50.0, true));
        assert_eq!(cost, 13.46);
    }

    #[test]
    fn express_and_packages_multiply() {
        let input = PriceInput {
            express: true,
            packages: 3,
            ..PriceInput::new(1.0, 0.0, false)
        };
        // (5.20 + 0.85 + 5.50) * 3
        assert_eq!(quote(Some(&rate("SDA")), &input), 34.65);
    }

    #[test]
    fn package_count_below_one_counts_as_one() {
        let single = quote(Some(&rate("GLS")), &PriceInput::new(3.0, 0.0, false));
        let zero = quote(
            Some(&rate("GLS")),
            &PriceInput {
                packages: 0,
                ..PriceInput::new(3.0, 0.0, false)
            },
        );
        assert_eq!(single, zero);
    }

    #[test]
    fn unknown_or_inactive_carrier_falls_back() {
        assert_eq!(quote(None, &PriceInput::new(5.0, 0.0, false)), FALLBACK_COST);

        let mut ups = rate("UPS");
        ups.active = false;
        assert_eq!(quote(Some(&ups), &PriceInput::new(5.0, 0.0, false)), FALLBACK_COST);
    }

    #[test]
    fn rounding_is_half_up_on_cents() {
        assert_eq!(round_cents(1.005), 1.01);
        assert_eq!(round_cents(2.675), 2.68);
        assert_eq!(round_cents(7.0999999999), 7.10);
    }

    #[test]
    fn comparison_is_sorted_with_eta() {
        let lines = compare(&default_rates(), &PriceInput::new(1.0, 0.0, false));

        assert_eq!(lines.len(), 6);
        assert!(lines.windows(2).all(|w| w[0].cost <= w[1].cost));
        assert_eq!(lines[0].carrier, "Poste Italiane");

        let dhl = lines.iter().find(|l| l.carrier == "DHL").unwrap();
        assert_eq!(dhl.eta_window, "24-48h");
        let brt = lines.iter().find(|l| l.carrier == "BRT").unwrap();
        assert_eq!(brt.eta_window, "48-72h");

        let express = compare(
            &default_rates(),
            &PriceInput {
                express: true,
                ..PriceInput::new(1.0, 0.0, false)
            },
        );
        assert!(express.iter().all(|l| l.eta_window == "24h"));
    }
}
