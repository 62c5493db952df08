const PRO_TIPS: &[&str] = &[
    "Take regular breaks to maintain productivity.",
    "Prioritize tasks using the Eisenhower Matrix.",
    "Set specific goals for each work session.",
    "Eliminate distractions by turning off notifications.",
    "Use the Pomodoro Technique to manage time effectively.",
    "Frame your product as a transformation tool, not a utility. Sell the future state, not the feature list.",
    "Mine competitors' 1-star reviews to find your unique value proposition.",
    "Start with a premium offer and down-sell later; reverse funnels attract high-intent buyers.",
    "Use customer interviews to uncover needs customers cannot yet name.",
    "Use a rolling 13-week cash flow model to forecast liquidity gaps early.",
    "Pre-sell services with milestone-based billing to fund delivery without touching reserves.",
    "Map the customer journey and remove friction at every stage.",
    "Showcase real results from real users; social proof builds trust faster than ads.",
    "Create a value ladder of offerings that ascend in price and depth.",
    "A/B test landing pages, emails and ad creatives before scaling spend.",
    "Factor invoices through fintech platforms to unlock cash early.",
    "Split your bank accounts into profit-first envelopes and automate the transfers.",
    "Automate onboarding with forms that route clients by budget or goals.",
    "Auto-generate invoices from form submissions and log them in your finance tracker.",
    "Bundle your core service with templates or tools to raise perceived value.",
    "Use LaTeX to generate premium-looking invoices that signal professionalism.",
    "Let feedback on actual usage shape your pricing tiers.",
    "Tag every campaign link with UTM parameters to trace each conversion path.",
    "Write SOPs into an internal wiki so knowledge is searchable and versioned.",
    "Keep a pool of pre-vetted freelancers to scale without recruiting lag.",
    "Collect feedback automatically after every project and feed it into delivery.",
    "Test demand with a landing page before building anything.",
    "Time-block similar tasks together to cut context switching.",
    "Keep a decision log so you remember why choices were made.",
    "Apply inversion: ask how the business could fail, then avoid those paths.",
    "Balance safe bets with a few high-risk, high-reward experiments.",
    "Document everything as if you will sell the business tomorrow.",
];

pub fn tip_count() -> usize {
    PRO_TIPS.len()
}

/// Deterministic pick, wrapping around the list.
pub fn pro_tip_at(seed: usize) -> &'static str {
    PRO_TIPS[seed % PRO_TIPS.len()]
}

pub fn pro_tip() -> &'static str {
    let seed = chrono::Utc::now().timestamp_subsec_nanos() as usize;
    pro_tip_at(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pro_tip_at_wraps() {
        assert_eq!(pro_tip_at(0), pro_tip_at(tip_count()));
        assert_ne!(pro_tip_at(0), pro_tip_at(1));
    }

    #[test]
    fn test_pro_tip_is_from_list() {
        let tip = pro_tip();
        assert!(PRO_TIPS.contains(&tip));
    }
}
