//! Per-user wizard state for the hub's payment and provisioning workflows.
//!
//! One tagged enum covers every step; a user with no entry in the session
//! table is idle. Abandoned state persists until overwritten or cancelled.

pub const BOT_CREATION_PRICE: u64 = 30_000;
pub const MONTHLY_PRICE: u64 = 20_000;
pub const PREMIUM_PRICE: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    BotCreation,
    Monthly,
    PremiumCard,
    Deposit { amount: u64 },
}

impl PaymentKind {
    pub fn amount(&self) -> u64 {
        match self {
            PaymentKind::BotCreation => BOT_CREATION_PRICE,
            PaymentKind::Monthly => MONTHLY_PRICE,
            PaymentKind::PremiumCard => PREMIUM_PRICE,
            PaymentKind::Deposit { amount } => *amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Top-up wizard: the next text message is the amount.
    AwaitingDepositAmount,
    /// The next photo is forwarded to the admin as payment proof.
    AwaitingProof { payment: PaymentKind },
    /// `/token <credential>` capture. `rename` is set when the token of an
    /// existing bot is being replaced rather than a new bot created.
    AwaitingToken { rename: Option<String> },
    /// Username capture, verified live against the credential's identity.
    /// `token` is absent on the rename path; the ledger record's stored
    /// credential is used instead.
    AwaitingUsername {
        token: Option<String>,
        rename: Option<String>,
    },
    /// Hub admin is adding a gating channel.
    AwaitingChannelId,
}
