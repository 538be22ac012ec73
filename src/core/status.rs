//! Turns the outcome of a mint attempt into the single status line shown under the mint button.
//!
//! Contract reverts and wallet errors only reach us as free-form text, so failures are
//! classified by substring against an ordered rule table. The first rule with a matching
//! pattern wins.

/// Shown when the mint button is used without a connected wallet
pub const CONNECT_WALLET_MESSAGE: &str = "Please connect your wallet first!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintErrorKind {
    NotEligible,
    ConditionNotMet,
    InsufficientBalance,
    NotWhitelisted,
    QuantityLimit,
    PeriodEnded,
    NotStarted,
    UserRejected,
    Network,
    Unknown,
}

impl MintErrorKind {
    pub fn message(self) -> &'static str {
        match self {
            MintErrorKind::NotEligible => "❌ Wallet not eligible: You either already minted your Signal ID or are not on the whitelist.",
            MintErrorKind::ConditionNotMet => "❌ Claim condition not met: Please ensure you meet all requirements to mint.",
            MintErrorKind::InsufficientBalance => "❌ Insufficient LUCIA balance: You need more LUCIA tokens to complete the mint.",
            MintErrorKind::NotWhitelisted => "❌ Not whitelisted: Your wallet is not on the Verified Signal role holders list.",
            MintErrorKind::QuantityLimit => "❌ Too many requested: You can only mint one Signal ID per transaction.",
            MintErrorKind::PeriodEnded => "❌ Mint period ended: The minting period has concluded.",
            MintErrorKind::NotStarted => "❌ Mint not started: The minting period hasn't begun yet.",
            MintErrorKind::UserRejected => "❌ Transaction rejected: You declined the transaction in your wallet.",
            MintErrorKind::Network => "❌ Network error: Please check your connection and try again.",
            // Mentions whitelisting even when the cause is something else; kept as worded.
            MintErrorKind::Unknown => "❌ Minting failed: Please ensure you're whitelisted and haven't already minted. Contact support if the issue persists.",
        }
    }
}

/// One row of the classification table
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub patterns: &'static [&'static str],
    pub kind: MintErrorKind,
}

impl ClassificationRule {
    pub fn matches(&self, raw_error: &str) -> bool {
        self.patterns.iter().any(|p| raw_error.contains(p))
    }
}

/// Checked top to bottom; case-sensitive.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule { patterns: &["DropClaimExceedLimit"], kind: MintErrorKind::NotEligible },
    ClassificationRule { patterns: &["ClaimConditionNotMet"], kind: MintErrorKind::ConditionNotMet },
    ClassificationRule { patterns: &["InsufficientBalance", "insufficient funds"], kind: MintErrorKind::InsufficientBalance },
    ClassificationRule { patterns: &["NotInAllowlist", "not allowed"], kind: MintErrorKind::NotWhitelisted },
    ClassificationRule { patterns: &["MaxQuantityPerTransactionExceeded"], kind: MintErrorKind::QuantityLimit },
    ClassificationRule { patterns: &["ClaimPeriodEnded", "claim ended"], kind: MintErrorKind::PeriodEnded },
    ClassificationRule { patterns: &["ClaimPeriodNotStarted", "not started"], kind: MintErrorKind::NotStarted },
    ClassificationRule { patterns: &["rejected", "denied"], kind: MintErrorKind::UserRejected },
    ClassificationRule { patterns: &["network", "RPC"], kind: MintErrorKind::Network },
];

pub fn classify_kind(raw_error: &str) -> MintErrorKind {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(raw_error))
        .map(|rule| rule.kind)
        .unwrap_or(MintErrorKind::Unknown)
}

/// User-facing message for a raw failure text. Never fails.
pub fn classify(raw_error: &str) -> &'static str {
    classify_kind(raw_error).message()
}

/// Presentation category of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Error,
    Info,
}

impl StatusTone {
    pub fn from_message(message: &str) -> Self {
        if message.contains('✅') || message.contains("Successfully") {
            StatusTone::Success
        } else if message.contains('❌') || message.contains("failed") || message.contains("not eligible") {
            StatusTone::Error
        } else {
            StatusTone::Info
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            StatusTone::Success => "status-success",
            StatusTone::Error => "status-error",
            StatusTone::Info => "status-info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintStatus {
    pub message: String,
    pub tone: StatusTone,
}

impl MintStatus {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let tone = StatusTone::from_message(&message);
        Self { message, tone }
    }

    pub fn connect_wallet() -> Self {
        Self::new(CONNECT_WALLET_MESSAGE)
    }

    pub fn failure(raw_error: &str) -> Self {
        Self::new(classify(raw_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceed_limit_wins_regardless_of_context() {
        for raw in [
            "DropClaimExceedLimit",
            "execution reverted: DropClaimExceedLimit(1, 1)",
            "network RPC rejected DropClaimExceedLimit insufficient funds",
        ] {
            assert_eq!(classify_kind(raw), MintErrorKind::NotEligible, "input: {}", raw);
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // every pair of rules: a message containing both patterns resolves to the earlier rule
        for (i, earlier) in CLASSIFICATION_RULES.iter().enumerate() {
            for later in &CLASSIFICATION_RULES[i + 1..] {
                let raw = format!("{} / {}", later.patterns[0], earlier.patterns[0]);
                assert_eq!(classify_kind(&raw), earlier.kind, "input: {}", raw);
            }
        }
    }

    #[test]
    fn test_every_pattern_maps_to_its_rule() {
        for rule in CLASSIFICATION_RULES {
            for pattern in rule.patterns {
                assert_eq!(classify_kind(pattern), rule.kind, "pattern: {}", pattern);
            }
        }
    }

    #[test]
    fn test_unmatched_falls_back() {
        assert_eq!(classify("unknown revert reason 0xdead"), MintErrorKind::Unknown.message());
        assert_eq!(classify(""), MintErrorKind::Unknown.message());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(classify_kind("Insufficient Funds"), MintErrorKind::Unknown);
        assert_eq!(classify_kind("rpc timeout"), MintErrorKind::Unknown);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let raw = "execution reverted: ClaimPeriodEnded";
        assert_eq!(classify(raw), classify(raw));
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(classify_kind("execution reverted: NotInAllowlist"), MintErrorKind::NotWhitelisted);
        assert_eq!(classify_kind("insufficient funds for gas"), MintErrorKind::InsufficientBalance);
        assert_eq!(classify_kind("User rejected the request"), MintErrorKind::UserRejected);
        assert_eq!(classify_kind("RPC connection failed: HTTP 503"), MintErrorKind::Network);
    }

    #[test]
    fn test_status_tone() {
        assert_eq!(MintStatus::new("✅ Successfully minted").tone, StatusTone::Success);
        assert_eq!(MintStatus::failure("boom").tone, StatusTone::Error);
        assert_eq!(MintStatus::connect_wallet().tone, StatusTone::Info);
        assert_eq!(StatusTone::from_message("Minting failed"), StatusTone::Error);
        assert_eq!(StatusTone::from_message("Wallet not eligible"), StatusTone::Error);
        assert_eq!(StatusTone::from_message("Minting in progress"), StatusTone::Info);
    }
}
