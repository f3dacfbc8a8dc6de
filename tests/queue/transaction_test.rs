// Transaction queue tests: proposals and their initial state

use quorum_vault::ledger::MemoryLedger;
use quorum_vault::{Address, AssetId, CustodyConfig, CustodyError, CustodyEvent, Vault};
use std::sync::Arc;

fn owners() -> Vec<Address> {
    ["alice", "bob", "carol"]
        .iter()
        .map(|l| Address::from_label(l))
        .collect()
}

fn setup() -> Vault {
    Vault::new(
        CustodyConfig::unanimous(owners()),
        Arc::new(MemoryLedger::new()),
    )
    .unwrap()
}

// ============================================================================
// PROPOSALS
// ============================================================================

#[test]
fn test_propose_appends_transaction() {
    let vault = setup();
    assert_eq!(vault.transaction_count(), 0);

    let index = vault.propose(&owners()[0], AssetId::Native, 100).unwrap();

    assert_eq!(index, 0);
    assert_eq!(vault.transaction_count(), 1);
}

#[test]
fn test_new_proposal_fields() {
    let vault = setup();
    let token = AssetId::External(Address::from_label("usdc"));

    let index = vault.propose(&owners()[1], token, 42).unwrap();
    let tx = vault.transaction(index).unwrap();

    assert_eq!(tx.index(), index);
    assert_eq!(tx.asset(), &token);
    assert_eq!(tx.amount(), 42);
    assert_eq!(tx.proposer(), &owners()[1]);
    assert_eq!(tx.confirmations(), 0);
    assert!(!tx.is_executed());
    assert!(tx.executed_by().is_none());
    assert!(tx.executed_at().is_none());
}

#[test]
fn test_indices_follow_proposal_order() {
    let vault = setup();

    for expected in 0..5 {
        let index = vault.propose(&owners()[expected % 3], AssetId::Native, 1).unwrap();
        assert_eq!(index, expected);
    }
    assert_eq!(vault.transaction_count(), 5);
}

#[test]
fn test_non_owner_cannot_propose() {
    let vault = setup();
    let stranger = Address::from_label("mallory");

    assert_eq!(
        vault.propose(&stranger, AssetId::Native, 1),
        Err(CustodyError::Unauthorized { caller: stranger })
    );
    assert_eq!(vault.transaction_count(), 0);
}

#[test]
fn test_propose_emits_event() {
    let vault = setup();
    vault.propose(&owners()[0], AssetId::Native, 7).unwrap();

    assert_eq!(
        vault.poll_events(),
        vec![CustodyEvent::TransactionProposed {
            index: 0,
            asset: AssetId::Native,
            amount: 7,
        }]
    );
}

#[test]
fn test_propose_needs_no_balance() {
    let vault = setup();
    assert_eq!(vault.native_balance(), 0);

    assert!(vault.propose(&owners()[0], AssetId::Native, 1_000_000).is_ok());
}

#[test]
fn test_propose_unregistered_asset_allowed() {
    let vault = setup();
    let token = AssetId::External(Address::from_label("unlisted"));

    let index = vault.propose(&owners()[0], token, 10).unwrap();
    assert_eq!(vault.transaction(index).unwrap().asset(), &token);
    assert!(!vault.is_registered(&token));
}

#[test]
fn test_missing_transaction() {
    let vault = setup();
    assert_eq!(
        vault.transaction(0).unwrap_err(),
        CustodyError::TransactionNotFound(0)
    );
}

#[test]
fn test_pending_and_executable_lists() {
    let vault = setup();
    vault.propose(&owners()[0], AssetId::Native, 1).unwrap();
    vault.propose(&owners()[0], AssetId::Native, 2).unwrap();
    for owner in owners() {
        vault.confirm(&owner, 1).unwrap();
    }

    assert_eq!(vault.pending_transactions().len(), 2);
    let executable = vault.executable_transactions();
    assert_eq!(executable.len(), 1);
    assert_eq!(executable[0].index(), 1);
}
