// Reentrancy tests: a ledger that calls back into the vault mid-release

use quorum_vault::ledger::{AssetLedger, LedgerError, MemoryLedger};
use quorum_vault::{
    Address, Amount, AssetId, CustodyConfig, CustodyError, CustodyResult, Vault,
};
use quorum_vault::custody::Release;
use std::sync::{Arc, Mutex};

/// Ledger that re-executes the same proposal while releasing funds
struct ReentrantLedger {
    inner: MemoryLedger,
    vault: Mutex<Option<Vault>>,
    attacker: Address,
    index: usize,
    observed: Mutex<Vec<CustodyResult<Release>>>,
}

impl ReentrantLedger {
    fn new(attacker: Address, index: usize) -> Self {
        Self {
            inner: MemoryLedger::new(),
            vault: Mutex::new(None),
            attacker,
            index,
            observed: Mutex::new(Vec::new()),
        }
    }

    fn reenter(&self) {
        let vault = self.vault.lock().unwrap().clone();
        if let Some(vault) = vault {
            let result = vault.execute(&self.attacker, self.index);
            self.observed.lock().unwrap().push(result);
        }
    }
}

impl AssetLedger for ReentrantLedger {
    fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.inner.transfer_from(token, spender, from, amount)
    }

    fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.reenter();
        self.inner.transfer(token, from, to, amount)
    }

    fn balance_of(&self, token: &Address, account: &Address) -> Amount {
        self.inner.balance_of(token, account)
    }

    fn send_native(&self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.reenter();
        self.inner.send_native(to, amount)
    }

    fn native_balance_of(&self, account: &Address) -> Amount {
        self.inner.native_balance_of(account)
    }
}

fn owners() -> Vec<Address> {
    ["alice", "bob", "carol"]
        .iter()
        .map(|l| Address::from_label(l))
        .collect()
}

#[test]
fn test_reentrant_native_execution_sees_executed() {
    let owners = owners();
    let ledger = Arc::new(ReentrantLedger::new(owners[1], 0));
    let vault = Vault::new(CustodyConfig::unanimous(owners.clone()), ledger.clone()).unwrap();
    *ledger.vault.lock().unwrap() = Some(vault.clone());

    vault.deposit(&owners[0], AssetId::Native, 200, 200).unwrap();
    let index = vault.propose(&owners[0], AssetId::Native, 100).unwrap();
    for owner in &owners {
        vault.confirm(owner, index).unwrap();
    }

    vault.execute(&owners[0], index).unwrap();

    let observed = ledger.observed.lock().unwrap();
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0], Err(CustodyError::AlreadyExecuted(index)));
    assert_eq!(vault.native_balance(), 100);
    assert_eq!(ledger.native_balance_of(&owners[0]), 100);
    assert_eq!(ledger.native_balance_of(&owners[1]), 0);
}

#[test]
fn test_reentrant_external_execution_sees_executed() {
    let owners = owners();
    let ledger = Arc::new(ReentrantLedger::new(owners[2], 0));
    let config = CustodyConfig::unanimous(owners.clone());
    let custody = config.custody_account;
    let vault = Vault::new(config, ledger.clone()).unwrap();
    *ledger.vault.lock().unwrap() = Some(vault.clone());

    let token = Address::from_label("usdc");
    let asset = AssetId::External(token);
    vault.register_asset(&owners[0], asset).unwrap();
    ledger.inner.mint(&token, &owners[0], 100).unwrap();
    ledger.inner.approve(&token, &owners[0], &custody, 100);
    vault.deposit(&owners[0], asset, 100, 0).unwrap();

    let index = vault.propose(&owners[0], asset, 60).unwrap();
    for owner in &owners {
        vault.confirm(owner, index).unwrap();
    }

    vault.execute(&owners[1], index).unwrap();

    let observed = ledger.observed.lock().unwrap();
    assert_eq!(observed.as_slice(), &[Err(CustodyError::AlreadyExecuted(index))]);
    assert_eq!(vault.custody_holdings(&asset), 40);
    assert_eq!(vault.holdings_of(&asset, &owners[1]), 60);
    assert_eq!(vault.holdings_of(&asset, &owners[2]), 0);
}

/// Ledger that deposits native value into the vault while a native release
/// is in flight, then refuses the release
struct DepositingLedger {
    vault: Mutex<Option<Vault>>,
    depositor: Address,
    deposits: Vec<Amount>,
    observed: Mutex<Vec<CustodyResult<()>>>,
}

impl AssetLedger for DepositingLedger {
    fn transfer_from(&self, _: &Address, _: &Address, _: &Address, _: Amount) -> Result<(), LedgerError> {
        Ok(())
    }

    fn transfer(&self, _: &Address, _: &Address, _: &Address, _: Amount) -> Result<(), LedgerError> {
        Ok(())
    }

    fn balance_of(&self, _: &Address, _: &Address) -> Amount {
        0
    }

    fn send_native(&self, _: &Address, _: Amount) -> Result<(), LedgerError> {
        let vault = self.vault.lock().unwrap().clone();
        if let Some(vault) = vault {
            for amount in &self.deposits {
                let result = vault.deposit(&self.depositor, AssetId::Native, *amount, *amount);
                self.observed.lock().unwrap().push(result);
            }
        }
        Err(LedgerError::Rejected("recipient refused value".to_string()))
    }

    fn native_balance_of(&self, _: &Address) -> Amount {
        0
    }
}

#[test]
fn test_deposit_during_failed_release_keeps_value() {
    let owners = owners();
    let ledger = Arc::new(DepositingLedger {
        vault: Mutex::new(None),
        depositor: Address::from_label("depositor"),
        deposits: vec![Amount::MAX, Amount::MAX - 100],
        observed: Mutex::new(Vec::new()),
    });
    let vault = Vault::new(CustodyConfig::unanimous(owners.clone()), ledger.clone()).unwrap();
    *ledger.vault.lock().unwrap() = Some(vault.clone());

    vault.deposit(&owners[0], AssetId::Native, 100, 100).unwrap();
    let index = vault.propose(&owners[0], AssetId::Native, 100).unwrap();
    for owner in &owners {
        vault.confirm(owner, index).unwrap();
    }

    let result = vault.execute(&owners[0], index);

    assert!(matches!(result, Err(CustodyError::ExternalTransferFailed { .. })));
    let observed = ledger.observed.lock().unwrap();
    assert!(matches!(observed[0], Err(CustodyError::InvalidAmount(_))));
    assert_eq!(observed[1], Ok(()));
    assert_eq!(vault.native_balance(), Amount::MAX);
    assert!(!vault.transaction(index).unwrap().is_executed());
}
