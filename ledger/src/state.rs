use std::collections::HashMap;

use oasis_core_common::{EpochTime, PublicKey, Quantity};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Spendable balance and replay-protection nonce.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralAccount {
    pub balance: Quantity,
    pub nonce: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePool {
    pub balance: Quantity,
}

/// Bonded and debonding stake. `debonding` entries are keyed by the epoch
/// at which they mature back into the general account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    pub active: SharePool,
    pub debonding: HashMap<EpochTime, Quantity>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub general: GeneralAccount,
    pub escrow: EscrowAccount,
}

/// Token accounts and escrow bookkeeping, shared by the registry (stake
/// threshold checks) and roothash (block-reward disbursement).
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    accounts: HashMap<PublicKey, Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            accounts: HashMap::new(),
        }
    }

    /// Seed an account balance during genesis. Overwrites any prior value,
    /// so callers must only invoke this once per account during
    /// `apply_genesis`.
    pub fn set_account(&mut self, owner: PublicKey, account: Account) {
        self.accounts.insert(owner, account);
    }

    pub fn account(&self, owner: &PublicKey) -> Account {
        self.accounts.get(owner).cloned().unwrap_or_default()
    }

    fn account_mut(&mut self, owner: PublicKey) -> &mut Account {
        self.accounts.entry(owner).or_default()
    }

    pub fn general_balance(&self, owner: &PublicKey) -> Quantity {
        self.account(owner).general.balance
    }

    pub fn escrow_active_balance(&self, owner: &PublicKey) -> Quantity {
        self.account(owner).escrow.active.balance
    }

    pub fn transfer(&mut self, from: PublicKey, to: PublicKey, amount: Quantity) -> Result<(), LedgerError> {
        {
            let src = self.account_mut(from);
            src.general.balance = src
                .general
                .balance
                .checked_sub(&amount)
                .ok_or(LedgerError::InsufficientBalance)?;
        }
        let dst = self.account_mut(to);
        dst.general.balance = dst.general.balance + amount;
        Ok(())
    }

    pub fn add_escrow(&mut self, owner: PublicKey, amount: Quantity) -> Result<(), LedgerError> {
        let account = self.account_mut(owner);
        account.general.balance = account
            .general
            .balance
            .checked_sub(&amount)
            .ok_or(LedgerError::InsufficientBalance)?;
        account.escrow.active.balance = account.escrow.active.balance + amount;
        Ok(())
    }

    /// Move `amount` from active escrow into debonding, maturing at
    /// `current_epoch + debonding_interval`.
    pub fn reclaim_escrow(
        &mut self,
        owner: PublicKey,
        amount: Quantity,
        current_epoch: EpochTime,
        debonding_interval: EpochTime,
    ) -> Result<(), LedgerError> {
        let account = self.account_mut(owner);
        account.escrow.active.balance = account
            .escrow
            .active
            .balance
            .checked_sub(&amount)
            .ok_or(LedgerError::InsufficientEscrowBalance)?;
        let release_epoch = current_epoch + debonding_interval;
        let entry = account.escrow.debonding.entry(release_epoch).or_insert_with(Quantity::default);
        *entry = *entry + amount;
        Ok(())
    }

    /// Move every debonding entry maturing at or before `epoch` back into
    /// the general account. Called once per epoch transition.
    pub fn release_debonding(&mut self, epoch: EpochTime) {
        for account in self.accounts.values_mut() {
            let matured: Vec<EpochTime> = account
                .escrow
                .debonding
                .keys()
                .copied()
                .filter(|release_epoch| *release_epoch <= epoch)
                .collect();
            for release_epoch in matured {
                if let Some(amount) = account.escrow.debonding.remove(&release_epoch) {
                    account.general.balance = account.general.balance + amount;
                }
            }
        }
    }

    pub fn burn(&mut self, owner: PublicKey, amount: Quantity) -> Result<(), LedgerError> {
        let account = self.account_mut(owner);
        account.general.balance = account
            .general
            .balance
            .checked_sub(&amount)
            .ok_or(LedgerError::InsufficientBalance)?;
        Ok(())
    }

    pub fn withdraw(&mut self, from: PublicKey, to: PublicKey, amount: Quantity) -> Result<(), LedgerError> {
        self.transfer(from, to, amount)
    }

    /// Distribute `fee_pool + block_reward` proportionally to each
    /// validator's recorded voting power. A zero-fee, zero-reward epoch
    /// with no voting power recorded is a no-op.
    pub fn disburse_fees(
        &mut self,
        fee_pool: Quantity,
        block_reward: Quantity,
        voting_power: &[(PublicKey, u64)],
    ) {
        let total = fee_pool + block_reward;
        if total.is_zero() || voting_power.is_empty() {
            return;
        }
        let total_power: u128 = voting_power.iter().map(|(_, power)| *power as u128).sum();
        if total_power == 0 {
            return;
        }
        for (validator, power) in voting_power {
            let share = total.as_u128() * (*power as u128) / total_power;
            let account = self.account_mut(*validator);
            account.general.balance = account.general.balance + Quantity::new(share);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(byte: u8) -> PublicKey {
        PublicKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_transfer() {
        let mut ledger = Ledger::new();
        ledger.set_account(
            key(1),
            Account {
                general: GeneralAccount {
                    balance: Quantity::new(100),
                    nonce: 0,
                },
                escrow: EscrowAccount::default(),
            },
        );
        ledger.transfer(key(1), key(2), Quantity::new(40)).unwrap();
        assert_eq!(ledger.general_balance(&key(1)), Quantity::new(60));
        assert_eq!(ledger.general_balance(&key(2)), Quantity::new(40));
        assert!(ledger.transfer(key(1), key(2), Quantity::new(1000)).is_err());
    }

    #[test]
    fn test_escrow_and_reclaim_debonding() {
        let mut ledger = Ledger::new();
        ledger.set_account(
            key(1),
            Account {
                general: GeneralAccount {
                    balance: Quantity::new(100),
                    nonce: 0,
                },
                escrow: EscrowAccount::default(),
            },
        );
        ledger.add_escrow(key(1), Quantity::new(50)).unwrap();
        assert_eq!(ledger.escrow_active_balance(&key(1)), Quantity::new(50));

        ledger.reclaim_escrow(key(1), Quantity::new(20), 10, 5).unwrap();
        assert_eq!(ledger.escrow_active_balance(&key(1)), Quantity::new(30));

        ledger.release_debonding(14);
        assert_eq!(ledger.general_balance(&key(1)), Quantity::new(50));
        ledger.release_debonding(15);
        assert_eq!(ledger.general_balance(&key(1)), Quantity::new(70));
    }

    #[test]
    fn test_disburse_fees_zero_is_noop() {
        let mut ledger = Ledger::new();
        ledger.disburse_fees(Quantity::new(0), Quantity::new(0), &[(key(1), 1)]);
        assert_eq!(ledger.general_balance(&key(1)), Quantity::new(0));
    }

    #[test]
    fn test_disburse_fees_proportional() {
        let mut ledger = Ledger::new();
        ledger.disburse_fees(
            Quantity::new(90),
            Quantity::new(0),
            &[(key(1), 1), (key(2), 2)],
        );
        assert_eq!(ledger.general_balance(&key(1)), Quantity::new(30));
        assert_eq!(ledger.general_balance(&key(2)), Quantity::new(60));
    }
}
