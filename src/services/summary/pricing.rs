use crate::services::openrouter::catalog::ModelPricing;

pub const MIN_COST: f64 = 0.0001;

/// Splits tokens evenly between input and output prices.
pub fn calculate_cost(token_count: i64, pricing: &ModelPricing) -> f64 {
    let half = token_count as f64 / 2.0;
    let total = half * pricing.input + half * pricing.output;
    total.max(MIN_COST)
}

/// A summary of an unsummarized thread is assumed to be a fifth of it.
pub fn estimated_summary_tokens(complete_tokens: i64) -> i64 {
    ((complete_tokens as f64 * 0.2).floor() as i64).max(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_small_costs() {
        assert_eq!(calculate_cost(10, &ModelPricing::default()), MIN_COST);
        assert_eq!(calculate_cost(0, &ModelPricing { input: 0.0, output: 0.0 }), MIN_COST);
    }

    #[test]
    fn splits_tokens_between_input_and_output() {
        let pricing = ModelPricing { input: 0.00001, output: 0.00003 };
        let cost = calculate_cost(1000, &pricing);
        assert!((cost - 0.02).abs() < 1e-12);
    }

    #[test]
    fn summary_estimate_has_floor() {
        assert_eq!(estimated_summary_tokens(50), 100);
        assert_eq!(estimated_summary_tokens(1000), 200);
        assert_eq!(estimated_summary_tokens(1234), 246);
    }
}
