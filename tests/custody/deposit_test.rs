// Deposit tests: native and external deposits into custody

use quorum_vault::ledger::MemoryLedger;
use quorum_vault::{Address, AssetId, CustodyConfig, CustodyError, CustodyEvent, Vault};
use std::sync::Arc;

struct Fixture {
    vault: Vault,
    ledger: Arc<MemoryLedger>,
    owners: Vec<Address>,
    token: Address,
    custody: Address,
}

fn setup() -> Fixture {
    let owners: Vec<Address> = ["alice", "bob", "carol"]
        .iter()
        .map(|l| Address::from_label(l))
        .collect();
    let ledger = Arc::new(MemoryLedger::new());
    let config = CustodyConfig::unanimous(owners.clone());
    let custody = config.custody_account;
    let vault = Vault::new(config, ledger.clone()).unwrap();

    Fixture {
        vault,
        ledger,
        owners,
        token: Address::from_label("usdc"),
        custody,
    }
}

// ============================================================================
// NATIVE DEPOSITS
// ============================================================================

#[test]
fn test_native_deposit_increases_balance() {
    let f = setup();
    assert_eq!(f.vault.native_balance(), 0);

    f.vault.deposit(&f.owners[0], AssetId::Native, 100, 100).unwrap();

    assert_eq!(f.vault.native_balance(), 100);
    assert_eq!(f.vault.custody_holdings(&AssetId::Native), 100);
}

#[test]
fn test_native_deposits_accumulate() {
    let f = setup();

    f.vault.deposit(&f.owners[0], AssetId::Native, 30, 30).unwrap();
    f.vault.deposit(&f.owners[1], AssetId::Native, 12, 12).unwrap();

    assert_eq!(f.vault.native_balance(), 42);
}

#[test]
fn test_anyone_can_deposit() {
    let f = setup();
    let outsider = Address::from_label("donor");

    f.vault.deposit(&outsider, AssetId::Native, 5, 5).unwrap();
    assert_eq!(f.vault.native_balance(), 5);
}

#[test]
fn test_zero_native_deposit_rejected() {
    let f = setup();
    f.vault.deposit(&f.owners[0], AssetId::Native, 10, 10).unwrap();

    let result = f.vault.deposit(&f.owners[0], AssetId::Native, 0, 0);

    assert!(matches!(result, Err(CustodyError::InvalidAmount(_))));
    assert_eq!(f.vault.native_balance(), 10);
}

#[test]
fn test_native_value_must_match_amount() {
    let f = setup();

    let short = f.vault.deposit(&f.owners[0], AssetId::Native, 100, 99);
    let over = f.vault.deposit(&f.owners[0], AssetId::Native, 100, 101);

    assert!(matches!(short, Err(CustodyError::InvalidAmount(_))));
    assert!(matches!(over, Err(CustodyError::InvalidAmount(_))));
    assert_eq!(f.vault.native_balance(), 0);
}

#[test]
fn test_native_overflow_rejected() {
    let f = setup();
    f.vault.deposit(&f.owners[0], AssetId::Native, u64::MAX, u64::MAX).unwrap();

    let result = f.vault.deposit(&f.owners[0], AssetId::Native, 1, 1);

    assert!(matches!(result, Err(CustodyError::InvalidAmount(_))));
    assert_eq!(f.vault.native_balance(), u64::MAX);
}

#[test]
fn test_native_deposit_emits_event() {
    let f = setup();
    f.vault.deposit(&f.owners[0], AssetId::Native, 100, 100).unwrap();

    assert_eq!(
        f.vault.poll_events(),
        vec![CustodyEvent::NativeDeposited { amount: 100 }]
    );
}

// ============================================================================
// EXTERNAL DEPOSITS
// ============================================================================

#[test]
fn test_external_deposit_pulls_into_custody() {
    let f = setup();
    let asset = AssetId::External(f.token);
    f.vault.register_asset(&f.owners[0], asset).unwrap();
    f.ledger.mint(&f.token, &f.owners[0], 100).unwrap();
    f.ledger.approve(&f.token, &f.owners[0], &f.custody, 100);

    assert_eq!(f.vault.custody_holdings(&asset), 0);
    f.vault.deposit(&f.owners[0], asset, 60, 0).unwrap();

    assert_eq!(f.vault.custody_holdings(&asset), 60);
    assert_eq!(f.vault.holdings_of(&asset, &f.owners[0]), 40);
    assert_eq!(f.ledger.allowance(&f.token, &f.owners[0], &f.custody), 40);
    assert_eq!(f.vault.native_balance(), 0);
}

#[test]
fn test_external_deposit_emits_event() {
    let f = setup();
    let asset = AssetId::External(f.token);
    f.vault.register_asset(&f.owners[0], asset).unwrap();
    f.ledger.mint(&f.token, &f.owners[0], 10).unwrap();
    f.ledger.approve(&f.token, &f.owners[0], &f.custody, 10);
    f.vault.poll_events();

    f.vault.deposit(&f.owners[0], asset, 10, 0).unwrap();

    assert_eq!(
        f.vault.poll_events(),
        vec![CustodyEvent::AssetDeposited { asset, amount: 10 }]
    );
}

#[test]
fn test_mixed_deposit_rejected_before_registration_check() {
    let f = setup();
    let asset = AssetId::External(f.token);

    let result = f.vault.deposit(&f.owners[0], asset, 10, 10);

    assert_eq!(
        result,
        Err(CustodyError::MixedAssetDeposit { asset, attached: 10 })
    );
}

#[test]
fn test_unregistered_asset_deposit_rejected() {
    let f = setup();
    let asset = AssetId::External(f.token);
    f.ledger.mint(&f.token, &f.owners[0], 10).unwrap();
    f.ledger.approve(&f.token, &f.owners[0], &f.custody, 10);

    let result = f.vault.deposit(&f.owners[0], asset, 10, 0);

    assert_eq!(result, Err(CustodyError::AssetNotRegistered(asset)));
    assert_eq!(f.vault.custody_holdings(&asset), 0);
}

#[test]
fn test_zero_external_deposit_rejected() {
    let f = setup();
    let asset = AssetId::External(f.token);
    f.vault.register_asset(&f.owners[0], asset).unwrap();

    let result = f.vault.deposit(&f.owners[0], asset, 0, 0);
    assert!(matches!(result, Err(CustodyError::InvalidAmount(_))));
}

#[test]
fn test_deposit_without_allowance_fails() {
    let f = setup();
    let asset = AssetId::External(f.token);
    f.vault.register_asset(&f.owners[0], asset).unwrap();
    f.ledger.mint(&f.token, &f.owners[0], 100).unwrap();
    f.ledger.approve(&f.token, &f.owners[0], &f.custody, 5);
    f.vault.poll_events();

    let result = f.vault.deposit(&f.owners[0], asset, 50, 0);

    assert!(matches!(
        result,
        Err(CustodyError::ExternalTransferFailed { asset: a, .. }) if a == asset
    ));
    assert_eq!(f.vault.custody_holdings(&asset), 0);
    assert_eq!(f.vault.holdings_of(&asset, &f.owners[0]), 100);
    assert!(f.vault.poll_events().is_empty());
}

#[test]
fn test_deposit_without_funds_fails() {
    let f = setup();
    let asset = AssetId::External(f.token);
    f.vault.register_asset(&f.owners[0], asset).unwrap();
    f.ledger.approve(&f.token, &f.owners[0], &f.custody, 50);

    let result = f.vault.deposit(&f.owners[0], asset, 50, 0);

    assert!(matches!(result, Err(CustodyError::ExternalTransferFailed { .. })));
}
