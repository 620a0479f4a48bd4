use oasis_core_common::PublicKey;

/// What a pending `SubmitTx` request is told by the watcher.
///
/// `NewLeader` means the caller's transport target changed (including the
/// very first time a leader becomes known) and it should resubmit;
/// `Output` is the final, one-shot delivery of the matched result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    NewLeader(PublicKey),
    Output { output: Vec<u8>, ok: bool },
}

/// The result of a successfully delivered `SubmitTx` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitResult {
    pub output: Vec<u8>,
    pub ok: bool,
}
