use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use oasis_core_common::{EpochTime, PublicKey};
use oasis_core_ledger::Account;
use oasis_core_registry::types::{MultiSignedNode, SignedEntity, SignedRuntime};

/// The chain's bootstrap state: consensus parameters, initial ledger
/// accounts and every signed entity/runtime/node registration to apply
/// before the first normal block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisDocument {
    /// Number of consensus blocks per epoch. Must be positive unless
    /// `debug_allow_zero_epoch_interval` is set.
    pub epoch_interval: i64,
    pub base_epoch: EpochTime,
    /// Top-level switch gating every other `debug_*` flag below.
    pub debug_mode: bool,
    pub debug_allow_zero_epoch_interval: bool,
    pub debug_bypass_stake: bool,
    pub ledger_accounts: BTreeMap<PublicKey, Account>,
    pub entities: Vec<SignedEntity>,
    pub runtimes: Vec<SignedRuntime>,
    pub nodes: Vec<MultiSignedNode>,
}

impl Default for GenesisDocument {
    fn default() -> Self {
        GenesisDocument {
            epoch_interval: 1,
            base_epoch: 0,
            debug_mode: false,
            debug_allow_zero_epoch_interval: false,
            debug_bypass_stake: false,
            ledger_accounts: BTreeMap::new(),
            entities: Vec::new(),
            runtimes: Vec::new(),
            nodes: Vec::new(),
        }
    }
}
