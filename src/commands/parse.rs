//! Positional argument grammars
//!
//! Every parser splits on whitespace, requires an exact token count and
//! coerces typed fields. Failure is always the bare [`Malformed`] signal;
//! there are no partial results. Amounts are arbitrary-precision and carry
//! no sign check here, feasibility belongs to the ledger.

use crate::account::Authorization;
use num_bigint::BigInt;

/// The message does not fit the command's grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Malformed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    pub amount: BigInt,
    pub beneficiary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminTransferArgs {
    pub amount: BigInt,
    pub sender: String,
    pub beneficiary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeArgs {
    pub beneficiary: String,
    pub level: Authorization,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringTransferArgs {
    pub amount_per_tick: BigInt,
    pub sender: String,
    pub beneficiary: String,
    pub tick_count: u64,
}

/// Split `message` into exactly `N` whitespace-separated tokens.
pub fn split_exact<const N: usize>(message: &str) -> Result<[&str; N], Malformed> {
    let tokens: Vec<&str> = message.split_whitespace().collect();
    <[&str; N]>::try_from(tokens).map_err(|_| Malformed)
}

fn amount(text: &str) -> Result<BigInt, Malformed> {
    text.parse().map_err(|_| Malformed)
}

/// `transfer AMOUNT BENEFICIARY`
pub fn parse_transfer(message: &str) -> Result<TransferArgs, Malformed> {
    let [_, amount_text, beneficiary] = split_exact::<3>(message)?;
    Ok(TransferArgs {
        amount: amount(amount_text)?,
        beneficiary: beneficiary.to_string(),
    })
}

/// `admin-transfer AMOUNT SENDER BENEFICIARY`
pub fn parse_admin_transfer(message: &str) -> Result<AdminTransferArgs, Malformed> {
    let [_, amount_text, sender, beneficiary] = split_exact::<4>(message)?;
    Ok(AdminTransferArgs {
        amount: amount(amount_text)?,
        sender: sender.to_string(),
        beneficiary: beneficiary.to_string(),
    })
}

/// `print-money AMOUNT BENEFICIARY`, same shape as a transfer
pub fn parse_print_money(message: &str) -> Result<TransferArgs, Malformed> {
    parse_transfer(message)
}

/// `authorize BENEFICIARY citizen|admin|developer`
pub fn parse_authorization(message: &str) -> Result<AuthorizeArgs, Malformed> {
    let [_, beneficiary, level] = split_exact::<3>(message)?;
    Ok(AuthorizeArgs {
        beneficiary: beneficiary.to_string(),
        level: level.parse().map_err(|_| Malformed)?,
    })
}

/// `admin-create-recurring-transfer AMOUNT_PER_TICK SENDER BENEFICIARY TICK_COUNT`
pub fn parse_recurring_transfer(message: &str) -> Result<RecurringTransferArgs, Malformed> {
    let [_, amount_text, sender, beneficiary, ticks] = split_exact::<5>(message)?;
    Ok(RecurringTransferArgs {
        amount_per_tick: amount(amount_text)?,
        sender: sender.to_string(),
        beneficiary: beneficiary.to_string(),
        tick_count: ticks.parse().map_err(|_| Malformed)?,
    })
}

/// Commands whose only argument is an account name, e.g. `admin-open NAME`
pub fn parse_account_name(message: &str) -> Result<String, Malformed> {
    let [_, name] = split_exact::<2>(message)?;
    Ok(name.to_string())
}
