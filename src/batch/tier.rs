//! Tier selection

use crate::domain::{DayBucket, PullRequest, Tier, TokenBudget};
use crate::error::EngineError;
use crate::utils::{estimate_commits_tokens, estimate_prs_tokens};

/// Check `0 < merge_target <= single_call_limit <= mega_threshold`.
pub fn validate_budget(budget: &TokenBudget) -> Result<(), EngineError> {
    let reason = if budget.single_call_limit == 0 {
        "single_call_limit must be greater than zero".to_string()
    } else if budget.merge_target == 0 {
        "merge_target must be greater than zero".to_string()
    } else if budget.merge_target > budget.single_call_limit {
        format!(
            "merge_target ({}) must not exceed single_call_limit ({})",
            budget.merge_target, budget.single_call_limit
        )
    } else if budget.single_call_limit > budget.mega_threshold {
        format!(
            "single_call_limit ({}) must not exceed mega_threshold ({})",
            budget.single_call_limit, budget.mega_threshold
        )
    } else {
        return Ok(());
    };
    Err(EngineError::InvalidBudget { reason })
}

/// Total estimated tokens for the window: every filtered, safety-cropped
/// commit plus every PR. Only bucket commits are counted, so PRs already
/// attached to buckets are not counted twice.
pub fn window_tokens(buckets: &[DayBucket], pull_requests: &[PullRequest]) -> usize {
    buckets.iter().map(|b| estimate_commits_tokens(&b.commits)).sum::<usize>()
        + estimate_prs_tokens(pull_requests)
}

/// One-time tier decision for a repository's run.
pub fn select_tier(total_tokens: usize, budget: &TokenBudget) -> Tier {
    if total_tokens < budget.single_call_limit {
        Tier::Single
    } else if total_tokens < budget.mega_threshold {
        Tier::DayMerge
    } else {
        Tier::Hybrid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let budget = TokenBudget::default();
        assert_eq!(select_tier(0, &budget), Tier::Single);
        assert_eq!(select_tier(99_999, &budget), Tier::Single);
        assert_eq!(select_tier(100_000, &budget), Tier::DayMerge);
        assert_eq!(select_tier(699_999, &budget), Tier::DayMerge);
        assert_eq!(select_tier(700_000, &budget), Tier::Hybrid);
    }

    #[test]
    fn test_default_budget_is_valid() {
        assert!(validate_budget(&TokenBudget::default()).is_ok());
    }

    #[test]
    fn test_rejects_inconsistent_budgets() {
        let merge_too_big =
            TokenBudget { single_call_limit: 100, merge_target: 200, mega_threshold: 1_000 };
        let mega_too_small =
            TokenBudget { single_call_limit: 100, merge_target: 90, mega_threshold: 50 };
        let zero = TokenBudget { single_call_limit: 0, merge_target: 0, mega_threshold: 0 };

        for budget in [merge_too_big, mega_too_small, zero] {
            assert!(matches!(validate_budget(&budget), Err(EngineError::InvalidBudget { .. })));
        }
    }
}
