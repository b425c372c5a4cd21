use rand::Rng;

/// Placeholder resolution expressions. `{target}` is substituted everywhere.
pub const MATH_TEMPLATES: [&str; 10] = [
    "price > {target}",
    "price < {target}",
    "price >= {target}",
    "price <= {target}",
    "price * 1.1 > {target}",
    "price * 0.9 < {target}",
    "(price + {target}) / 2 > price",
    "price > {target} * 0.95",
    "price < {target} * 1.05",
    "price > {target} AND price < {target} * 1.2",
];

/// Pick a random template and fill in `target_value` with two decimals.
///
/// Decorative only: the text is shown in the dashboard for strategies that
/// arrived without logic. It has no bearing on settlement, which happens in
/// the backend and the router contract.
pub fn math_template<R: Rng + ?Sized>(target_value: f64, rng: &mut R) -> String {
    let template = MATH_TEMPLATES[rng.gen_range(0..MATH_TEMPLATES.len())];
    template.replace("{target}", &format_target(target_value))
}

/// Two decimals, with ties rounded away from zero (`710.125` gives `710.13`).
/// `{:.2}` alone would round the tie to even.
pub fn format_target(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn every_placeholder_is_replaced() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let text = math_template(764.676, &mut rng);
            assert!(!text.contains("{target}"), "unreplaced placeholder in {text}");
            assert!(text.contains("764.68"), "target missing from {text}");
            assert!(text.contains("price"));
        }
    }

    #[test]
    fn ties_round_away_from_zero() {
        assert_eq!(format_target(710.125), "710.13");
        assert_eq!(format_target(0.375), "0.38");
        assert_eq!(format_target(-2.5), "-2.50");
        assert_eq!(format_target(695.16), "695.16");
        assert_eq!(format_target(0.0), "0.00");
    }

    #[test]
    fn all_templates_reachable() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(math_template(1.0, &mut rng));
        }
        assert_eq!(seen.len(), MATH_TEMPLATES.len());
    }
}
