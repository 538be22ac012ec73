use super::abi::Address;
use super::allowlist::AllowlistProver;
use super::contract::{ClaimCondition, ContractRef};
use super::status::MintStatus;
use super::transaction::{build_claim, MintError, TransactionSender, TxResult};

/// The UI never offers a quantity selector
pub const MINT_QUANTITY: u128 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum MintOutcome {
    #[default]
    Idle,
    Submitted,
    Success(TxResult),
    Failure {
        raw_error: String,
        message: String,
    },
}

/// Page-session state of the mint flow: who is connected, what is in flight, what to show
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MintSession {
    account: Option<Account>,      // set by connect, restore and accountsChanged
    outcome: MintOutcome,          // Submitted while a claim is in flight
    status: Option<MintStatus>,    // line shown under the mint card
}

impl MintSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(address: Address) -> Self {
        Self {
            account: Some(Account { address }),
            ..Self::default()
        }
    }

    pub fn set_account(&mut self, address: Option<Address>) {
        self.account = address.map(|address| Account { address });
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn outcome(&self) -> &MintOutcome {
        &self.outcome
    }

    pub fn status(&self) -> Option<&MintStatus> {
        self.status.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.outcome, MintOutcome::Submitted)
    }

    pub fn can_submit(&self) -> bool {
        self.account.is_some() && !self.is_pending()
    }

    /// Enter `Submitted`, clearing the previous status. Returns the recipient.
    ///
    /// Without an account the status becomes the connect-wallet prompt and the
    /// outcome is left untouched.
    pub fn begin(&mut self) -> Result<Address, MintError> {
        if self.is_pending() {
            return Err(MintError::AlreadyPending);
        }
        let Some(account) = self.account else {
            self.status = Some(MintStatus::connect_wallet());
            return Err(MintError::NotConnected);
        };

        self.status = None;
        self.outcome = MintOutcome::Submitted;
        Ok(account.address)
    }

    /// Record the terminal result of a submission
    pub fn resolve(&mut self, result: Result<TxResult, MintError>, success_message: &str) {
        match result {
            Ok(tx) => {
                log::info!("Mint transaction: {:?}", tx);
                self.status = Some(MintStatus::new(success_message));
                self.outcome = MintOutcome::Success(tx);
            }
            Err(err) => {
                let raw_error = err.to_string();
                log::error!("Mint error: {}", raw_error);
                let status = MintStatus::failure(&raw_error);
                let message = status.message.clone();
                self.status = Some(status);
                self.outcome = MintOutcome::Failure { raw_error, message };
            }
        }
    }
}

/// Somewhere the session lives; lets the flow run against a plain value or a UI signal
pub trait SessionHandle {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut MintSession) -> R) -> R;
}

impl SessionHandle for MintSession {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut MintSession) -> R) -> R {
        f(self)
    }
}

/// Claim one token to the connected account and reconcile the result into the session.
///
/// The session is only borrowed between awaits, never across them.
///
/// # Parameters
/// * `handle` - where the session lives
/// * `prover` - looks up the account's allowlist entry when the phase has one
/// * `sender` - signs, broadcasts and confirms the claim
/// * `contract` - collection being minted from
/// * `condition` - active claim phase as last read
/// * `success_message` - status line shown once the claim is mined
///
/// # Returns
/// The session's outcome after the attempt. A missing account or a submission
/// already in flight leaves the outcome as it was.
pub async fn submit_mint<H, P, S>(
    handle: &mut H,
    prover: &P,
    sender: &S,
    contract: &ContractRef,
    condition: &ClaimCondition,
    success_message: &str,
) -> MintOutcome
where
    H: SessionHandle,
    P: AllowlistProver,
    S: TransactionSender,
{
    let recipient = match handle.with_session(|s| s.begin()) {
        Ok(address) => address,
        Err(e) => {
            log::warn!("Mint not submitted: {}", e);
            return handle.with_session(|s| s.outcome().clone());
        }
    };

    let result = match prover.proof_for(contract, condition, &recipient).await {
        Ok(proof) => {
            let request = build_claim(contract, &recipient, MINT_QUANTITY, condition, &proof);
            log::info!(
                "Submitting claim of {} token(s) to {} ({} proof nodes)",
                MINT_QUANTITY,
                recipient,
                proof.proof.len()
            );
            sender.send(&request).await
        }
        Err(e) => Err(MintError::from(e)),
    };

    handle.with_session(|s| {
        s.resolve(result, success_message);
        s.outcome().clone()
    })
}
