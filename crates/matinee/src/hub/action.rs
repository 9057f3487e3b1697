//! Callback payload decoding.
//!
//! Payloads arrive as delimited strings and are decoded exactly once, at
//! the boundary, into a tagged action. Handlers never re-parse the string.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalKind {
    BotCreation,
    PremiumCard,
    MonthlyCard,
}

impl ApprovalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalKind::BotCreation => "bot_creation",
            ApprovalKind::PremiumCard => "premium_card",
            ApprovalKind::MonthlyCard => "monthly_card",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bot_creation" => Some(ApprovalKind::BotCreation),
            "premium_card" => Some(ApprovalKind::PremiumCard),
            "monthly_card" => Some(ApprovalKind::MonthlyCard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    CreateNewBot,
    AgreeToPay,
    Paid,
    PaidPremiumCard,
    PaidDeposit,
    SettingsBot,
    SelectBot(usize),
    ChangeToken(String),
    ChangeUsername(String),
    PayMonthly(String),
    PayWithCardMonthly,
    PayWithBalanceMonthly,
    BuyPremium,
    PayWithCard,
    PayWithBalance,
    AdminBotList,
    ToggleBot(String),
    CheckSubscription,
    Approve { user_id: i64, kind: ApprovalKind },
    ApproveDeposit { user_id: i64, amount: u64 },
}

impl CallbackAction {
    /// Decodes a raw payload. `None` means the payload is unknown or
    /// malformed; approval payloads in particular are positional and are
    /// rejected on bad arity or a non-numeric amount.
    pub fn decode(data: &str) -> Option<Self> {
        // The deposit prefix shadows the generic one; check it first.
        if let Some(rest) = data.strip_prefix("admin_approve_deposit:") {
            let (user_id, amount) = rest.split_once(':')?;
            return Some(CallbackAction::ApproveDeposit {
                user_id: user_id.parse().ok()?,
                amount: amount.parse().ok()?,
            });
        }
        if let Some(rest) = data.strip_prefix("admin_approve:") {
            let (user_id, kind) = rest.split_once(':')?;
            return Some(CallbackAction::Approve {
                user_id: user_id.parse().ok()?,
                kind: ApprovalKind::parse(kind)?,
            });
        }

        if let Some(index) = data.strip_prefix("select_bot_") {
            return Some(CallbackAction::SelectBot(index.parse().ok()?));
        }
        if let Some(username) = data.strip_prefix("change_token_") {
            return Some(CallbackAction::ChangeToken(username.to_owned()));
        }
        if let Some(username) = data.strip_prefix("change_username_") {
            return Some(CallbackAction::ChangeUsername(username.to_owned()));
        }
        if let Some(username) = data.strip_prefix("pay_monthly_") {
            return Some(CallbackAction::PayMonthly(username.to_owned()));
        }
        if let Some(username) = data.strip_prefix("toggle_bot_") {
            return Some(CallbackAction::ToggleBot(username.to_owned()));
        }

        match data {
            "create_new_bot" => Some(CallbackAction::CreateNewBot),
            "i_agree_to_pay" => Some(CallbackAction::AgreeToPay),
            "i_paid" => Some(CallbackAction::Paid),
            "i_paid_premium_card" => Some(CallbackAction::PaidPremiumCard),
            "i_paid_deposit" => Some(CallbackAction::PaidDeposit),
            "settings_bot" => Some(CallbackAction::SettingsBot),
            "pay_with_card_monthly" => Some(CallbackAction::PayWithCardMonthly),
            "pay_with_balance_monthly" => Some(CallbackAction::PayWithBalanceMonthly),
            "buy_premium" => Some(CallbackAction::BuyPremium),
            "pay_with_card" => Some(CallbackAction::PayWithCard),
            "pay_with_balance" => Some(CallbackAction::PayWithBalance),
            "admin_bot_list" => Some(CallbackAction::AdminBotList),
            "check_subscription" => Some(CallbackAction::CheckSubscription),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_deposit_approval_before_generic_approval() {
        assert_eq!(
            CallbackAction::decode("admin_approve_deposit:555:25000"),
            Some(CallbackAction::ApproveDeposit {
                user_id: 555,
                amount: 25000
            })
        );
    }

    #[test]
    fn decodes_generic_approval_subtypes() {
        assert_eq!(
            CallbackAction::decode("admin_approve:777:bot_creation"),
            Some(CallbackAction::Approve {
                user_id: 777,
                kind: ApprovalKind::BotCreation
            })
        );
        assert_eq!(
            CallbackAction::decode("admin_approve:777:premium_card"),
            Some(CallbackAction::Approve {
                user_id: 777,
                kind: ApprovalKind::PremiumCard
            })
        );
    }

    #[test]
    fn rejects_malformed_approvals() {
        assert_eq!(CallbackAction::decode("admin_approve:777"), None);
        assert_eq!(CallbackAction::decode("admin_approve:notanid:bot_creation"), None);
        assert_eq!(CallbackAction::decode("admin_approve_deposit:555:lots"), None);
        assert_eq!(CallbackAction::decode("admin_approve:777:unknown_kind"), None);
    }

    #[test]
    fn keeps_underscores_in_usernames() {
        assert_eq!(
            CallbackAction::decode("change_token_my_movie_bot"),
            Some(CallbackAction::ChangeToken("my_movie_bot".to_owned()))
        );
    }

    #[test]
    fn unknown_payloads_decode_to_none() {
        assert_eq!(CallbackAction::decode("definitely_not_a_thing"), None);
    }
}
