//! End-to-end scenarios through the engine façade.

use std::io::Write;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use nxd_bridge::{BridgeMode, TransferStatus};
use nxd_engine::{Engine, EngineConfig, EngineError, EngineEvent, ErrorKind};
use nxd_ledger::LedgerError;
use nxd_nullables::{NullClock, NullStore};
use nxd_staking::{StakePhase, RATE_SCALE};
use nxd_types::{Address, Amount, CallContext, TransferId};

const USER1: Address = Address::new([0x11; 20]);
const USER2: Address = Address::new([0x22; 20]);
const RELAY: Address = Address::new([0x33; 20]);

fn tokens(whole: u128) -> Amount {
    Amount::from_tokens(whole, 18).unwrap()
}

fn config(initial_supply: u64) -> EngineConfig {
    EngineConfig {
        initial_supply,
        reward_rate: 0,
        initial_reward_reserve: 0,
        ..EngineConfig::default()
    }
}

fn deploy(cfg: &EngineConfig, clock: &NullClock) -> Engine {
    Engine::deploy(cfg, clock.now()).expect("deploy")
}

fn at(caller: Address, clock: &NullClock) -> CallContext {
    CallContext::new(caller, clock.now())
}

// ── Token scenarios ─────────────────────────────────────────────────────

#[test]
fn deployment_credits_scaled_supply_to_owner() {
    let clock = NullClock::new(1_000);
    let cfg = EngineConfig::default();
    let engine = deploy(&cfg, &clock);

    assert_eq!(engine.ledger().name(), "Quantum Zero-Chain Token");
    assert_eq!(engine.ledger().symbol(), "NXD");
    assert_eq!(engine.ledger().decimals(), 18);
    assert_eq!(engine.total_supply(), tokens(1_000_000_000));
    assert_eq!(engine.balance_of(&cfg.owner), tokens(999_000_000));
    assert_eq!(
        engine.staking().reward_reserve(engine.ledger()),
        tokens(1_000_000)
    );
    assert!(engine.ledger().is_minter(&engine.bridge().custody()));
    assert!(matches!(
        engine.events().last().map(|r| &r.event),
        Some(EngineEvent::RewardsFunded { .. })
    ));
}

#[test]
fn default_deployment_pays_staking_rewards() {
    let clock = NullClock::new(0);
    let cfg = EngineConfig::default();
    let mut engine = deploy(&cfg, &clock);
    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(1))
        .unwrap();
    engine.stake(&at(USER1, &clock), tokens(1)).unwrap();

    clock.advance(1);
    let paid = engine.claim(&at(USER1, &clock)).unwrap();
    assert_eq!(paid, Amount::new(u128::from(cfg.reward_rate)));
    assert!(!engine.is_halted());
    assert_eq!(engine.balance_of(&USER1), paid);

    engine
        .transfer(&at(cfg.owner, &clock), &USER2, tokens(1))
        .unwrap();
}

#[test]
fn transfers_between_users_preserve_supply() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000_000);
    let mut engine = deploy(&cfg, &clock);

    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(100))
        .unwrap();
    assert_eq!(engine.balance_of(&USER1), tokens(100));

    engine
        .transfer(&at(USER1, &clock), &USER2, tokens(50))
        .unwrap();
    assert_eq!(engine.balance_of(&USER1), tokens(50));
    assert_eq!(engine.balance_of(&USER2), tokens(50));
    assert_eq!(engine.total_supply(), tokens(1_000_000));
}

#[test]
fn transfer_from_empty_account_fails_without_effect() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000_000);
    let mut engine = deploy(&cfg, &clock);
    let before = engine.state().clone();

    let err = engine
        .transfer(&at(USER1, &clock), &cfg.owner, tokens(1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert_eq!(err.to_string(), "ledger error: NXD: insufficient balance");
    assert_eq!(engine.state(), &before);
}

#[test]
fn burn_reduces_balance_and_supply() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000_000);
    let mut engine = deploy(&cfg, &clock);

    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(200))
        .unwrap();
    engine.burn(&at(USER1, &clock), tokens(100)).unwrap();

    assert_eq!(engine.balance_of(&USER1), tokens(100));
    assert_eq!(engine.total_supply(), tokens(999_900));
}

#[test]
fn mint_requires_owner_or_minter() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000);
    let mut engine = deploy(&cfg, &clock);

    let err = engine
        .mint(&at(USER1, &clock), &USER1, tokens(5))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(engine.total_supply(), tokens(1_000));

    assert!(engine
        .set_minter(&at(cfg.owner, &clock), &USER1, true)
        .unwrap());
    engine.mint(&at(USER1, &clock), &USER2, tokens(5)).unwrap();
    assert_eq!(engine.total_supply(), tokens(1_005));

    // non-owner cannot change the registry
    let err = engine
        .set_minter(&at(USER1, &clock), &USER2, true)
        .unwrap_err();
    assert!(matches!(err, EngineError::Ledger(LedgerError::Unauthorized { .. })));
}

#[test]
fn allowance_flow() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000);
    let mut engine = deploy(&cfg, &clock);

    engine
        .approve(&at(cfg.owner, &clock), &USER1, tokens(30))
        .unwrap();
    engine
        .transfer_from(&at(USER1, &clock), &cfg.owner, &USER2, tokens(20))
        .unwrap();
    assert_eq!(engine.ledger().allowance(&cfg.owner, &USER1), tokens(10));
    assert_eq!(engine.balance_of(&USER2), tokens(20));

    let err = engine
        .transfer_from(&at(USER1, &clock), &cfg.owner, &USER2, tokens(11))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientAllowance);
    assert_eq!(engine.ledger().allowance(&cfg.owner, &USER1), tokens(10));

    let remaining = engine
        .increase_allowance(&at(cfg.owner, &clock), &USER1, tokens(5))
        .unwrap();
    assert_eq!(remaining, tokens(15));
    let remaining = engine
        .decrease_allowance(&at(cfg.owner, &clock), &USER1, tokens(100))
        .unwrap();
    assert_eq!(remaining, Amount::ZERO);
}

#[test]
fn ownership_transfer_moves_admin_rights() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000);
    let mut engine = deploy(&cfg, &clock);

    engine
        .transfer_ownership(&at(cfg.owner, &clock), &USER1)
        .unwrap();
    assert_eq!(engine.ledger().owner(), USER1);
    assert!(engine
        .set_minter(&at(cfg.owner, &clock), &USER2, true)
        .is_err());
    assert!(engine
        .set_minter(&at(USER1, &clock), &USER2, true)
        .unwrap());
}

// ── Staking ─────────────────────────────────────────────────────────────

#[test]
fn stake_then_unstake_at_same_time_returns_principal() {
    let clock = NullClock::new(1_000);
    let cfg = EngineConfig {
        reward_rate: 1_000_000_000,
        ..config(1_000)
    };
    let mut engine = deploy(&cfg, &clock);
    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(100))
        .unwrap();

    engine.stake(&at(USER1, &clock), tokens(40)).unwrap();
    assert_eq!(engine.balance_of(&USER1), tokens(60));
    assert_eq!(engine.staking().total_staked(), tokens(40));

    let receipt = engine.unstake(&at(USER1, &clock), tokens(40)).unwrap();
    assert_eq!(receipt.principal, tokens(40));
    assert_eq!(receipt.reward, Amount::ZERO);
    assert_eq!(engine.balance_of(&USER1), tokens(100));
    assert_eq!(engine.staking().stake_of(&USER1).phase, StakePhase::Settled);
}

#[test]
fn funded_rewards_accrue_linearly() {
    let clock = NullClock::new(1_000);
    // 0.1% of principal per second
    let cfg = EngineConfig {
        reward_rate: (RATE_SCALE / 1_000) as u64,
        ..config(10_000)
    };
    let mut engine = deploy(&cfg, &clock);
    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(1_000))
        .unwrap();
    engine
        .fund_rewards(&at(cfg.owner, &clock), tokens(100))
        .unwrap();

    engine.stake(&at(USER1, &clock), tokens(1_000)).unwrap();
    clock.advance(10);
    assert_eq!(
        engine.pending_reward(&USER1, clock.now()).unwrap(),
        tokens(10)
    );

    let paid = engine.claim(&at(USER1, &clock)).unwrap();
    assert_eq!(paid, tokens(10));
    assert_eq!(engine.balance_of(&USER1), tokens(10));

    clock.advance(5);
    let claimable = engine.checkpoint(&at(USER1, &clock)).unwrap();
    assert_eq!(claimable, tokens(5));

    let receipt = engine.unstake(&at(USER1, &clock), tokens(1_000)).unwrap();
    assert_eq!(receipt.reward, tokens(5));
    assert_eq!(engine.balance_of(&USER1), tokens(1_015));
    assert_eq!(engine.staking().reward_reserve(engine.ledger()), tokens(85));
}

#[test]
fn underfunded_pool_halts_engine_until_resumed() {
    let clock = NullClock::new(1_000);
    let cfg = EngineConfig {
        reward_rate: (RATE_SCALE / 1_000) as u64,
        ..config(10_000)
    };
    let mut engine = deploy(&cfg, &clock);
    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(1_000))
        .unwrap();
    engine.stake(&at(USER1, &clock), tokens(1_000)).unwrap();
    clock.advance(10);

    let err = engine.claim(&at(USER1, &clock)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PoolUnderfunded);
    assert!(engine.is_halted());
    assert!(engine.halt_reason().unwrap().starts_with("claim:"));
    assert!(matches!(
        engine.events().last().map(|r| &r.event),
        Some(EngineEvent::Halted { .. })
    ));

    // mutating calls are refused, queries still work
    let err = engine
        .transfer(&at(cfg.owner, &clock), &USER2, tokens(1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Halted);
    assert_eq!(engine.staking().total_staked(), tokens(1_000));
    assert_eq!(engine.balance_of(&USER1), Amount::ZERO);

    // only the owner may resume
    assert!(engine.resume(&at(USER1, &clock)).is_err());
    assert!(engine.is_halted());
    engine.resume(&at(cfg.owner, &clock)).unwrap();
    assert!(!engine.is_halted());

    engine
        .fund_rewards(&at(cfg.owner, &clock), tokens(50))
        .unwrap();
    assert_eq!(engine.claim(&at(USER1, &clock)).unwrap(), tokens(10));
}

// ── Bridge ──────────────────────────────────────────────────────────────

#[test]
fn release_twice_with_same_id_fails_second_time() {
    let clock = NullClock::new(1_000);
    let cfg = EngineConfig {
        bridge_mode: BridgeMode::BurnMint,
        ..config(1_000)
    };
    let mut engine = deploy(&cfg, &clock);
    let id = TransferId::new([7; 32]);

    engine
        .bridge_release(&at(cfg.owner, &clock), id, &USER1, tokens(25))
        .unwrap();
    assert_eq!(engine.balance_of(&USER1), tokens(25));
    assert_eq!(engine.total_supply(), tokens(1_025));

    let err = engine
        .bridge_release(&at(cfg.owner, &clock), id, &USER1, tokens(25))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyCompleted);
    assert_eq!(engine.balance_of(&USER1), tokens(25));
    assert_eq!(engine.total_supply(), tokens(1_025));
    assert_eq!(
        engine.bridge().transfer(&id).map(|t| t.status),
        Some(TransferStatus::Completed)
    );
}

#[test]
fn lock_release_round_trip() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000);
    let mut engine = deploy(&cfg, &clock);
    let custody = engine.bridge().custody();
    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(100))
        .unwrap();

    let id = engine
        .bridge_lock(&at(USER1, &clock), tokens(60), 1, [0xAB; 32])
        .unwrap();
    assert_eq!(engine.balance_of(&custody), tokens(60));
    assert_eq!(engine.bridge().pending().len(), 1);

    engine.bridge_confirm(&at(cfg.owner, &clock), &id).unwrap();
    assert!(engine.bridge().pending().is_empty());

    // tokens come back from the counterpart chain to another user
    let inbound = TransferId::new([1; 32]);
    engine
        .bridge_release(&at(cfg.owner, &clock), inbound, &USER2, tokens(60))
        .unwrap();
    assert_eq!(engine.balance_of(&custody), Amount::ZERO);
    assert_eq!(engine.balance_of(&USER2), tokens(60));
    assert_eq!(engine.total_supply(), tokens(1_000));
}

#[test]
fn revert_refunds_outbound_lock() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000);
    let mut engine = deploy(&cfg, &clock);
    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(10))
        .unwrap();

    let id = engine
        .bridge_lock(&at(USER1, &clock), tokens(10), 5, [0; 32])
        .unwrap();
    assert_eq!(engine.balance_of(&USER1), Amount::ZERO);

    engine.bridge_revert(&at(cfg.owner, &clock), &id).unwrap();
    assert_eq!(engine.balance_of(&USER1), tokens(10));

    let err = engine
        .bridge_revert(&at(cfg.owner, &clock), &id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyCompleted);
}

#[test]
fn relay_needs_operator_or_capability() {
    let clock = NullClock::new(1_000);
    let cfg = EngineConfig {
        bridge_mode: BridgeMode::BurnMint,
        ..config(1_000)
    };
    let mut engine = deploy(&cfg, &clock);
    let id = TransferId::new([2; 32]);

    let err = engine
        .bridge_release(&at(RELAY, &clock), id, &USER1, tokens(1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    engine
        .set_permissions(
            &at(cfg.owner, &clock),
            &RELAY,
            nxd_ledger::Permissions::RELAY,
            true,
        )
        .unwrap();
    engine
        .bridge_register_inbound(&at(RELAY, &clock), id, &USER1, tokens(1))
        .unwrap();
    let err = engine
        .bridge_release(&at(RELAY, &clock), id, &USER1, tokens(2))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferMismatch);
    engine
        .bridge_release(&at(RELAY, &clock), id, &USER1, tokens(1))
        .unwrap();
    assert_eq!(engine.balance_of(&USER1), tokens(1));
}

#[test]
fn lock_limit_from_config_is_enforced() {
    let clock = NullClock::new(1_000);
    let cfg = EngineConfig {
        max_lock_per_transfer: Some(10),
        ..config(1_000)
    };
    let mut engine = deploy(&cfg, &clock);
    let err = engine
        .bridge_lock(&at(cfg.owner, &clock), tokens(11), 1, [0; 32])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockLimitExceeded);
    assert!(engine
        .bridge_lock(&at(cfg.owner, &clock), tokens(10), 1, [0; 32])
        .is_ok());
}

// ── Persistence, config, events ─────────────────────────────────────────

#[test]
fn state_survives_reload_from_store() {
    let clock = NullClock::new(1_000);
    let cfg = EngineConfig {
        reward_rate: 1_000_000_000,
        ..config(1_000)
    };
    let store = Arc::new(NullStore::new());
    let mut engine = deploy(&cfg, &clock);
    engine.attach_store(store.clone()).unwrap();

    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(100))
        .unwrap();
    engine.stake(&at(USER1, &clock), tokens(40)).unwrap();
    let id = engine
        .bridge_lock(&at(USER1, &clock), tokens(10), 9, [4; 32])
        .unwrap();

    let reloaded = Engine::load(store.clone()).unwrap();
    assert_eq!(reloaded.state(), engine.state());
    assert_eq!(
        reloaded.bridge().transfer(&id).map(|t| t.status),
        Some(TransferStatus::Pending)
    );
    assert!(!reloaded.is_halted());
}

#[test]
fn halt_status_is_persisted() {
    let clock = NullClock::new(1_000);
    let cfg = EngineConfig {
        reward_rate: (RATE_SCALE / 1_000) as u64,
        ..config(1_000)
    };
    let store = Arc::new(NullStore::new());
    let mut engine = deploy(&cfg, &clock);
    engine.attach_store(store.clone()).unwrap();
    engine.stake(&at(cfg.owner, &clock), tokens(100)).unwrap();
    clock.advance(100);
    assert!(engine.claim(&at(cfg.owner, &clock)).is_err());
    assert!(engine.is_halted());

    let mut reloaded = Engine::load(store).unwrap();
    assert!(reloaded.is_halted());
    assert_eq!(reloaded.halt_reason(), engine.halt_reason());

    // the journal numbering picks up after the halt event
    let last = engine.events().last().map(|r| r.seq).unwrap();
    reloaded.resume(&at(cfg.owner, &clock)).unwrap();
    assert_eq!(reloaded.events()[0].seq, last + 1);
}

#[test]
fn load_from_empty_store_reports_not_deployed() {
    let store = Arc::new(NullStore::new());
    assert!(matches!(Engine::load(store), Err(EngineError::NotDeployed)));
}

#[test]
fn deploy_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
name = "Test Token"
symbol = "TST"
decimals = 6
initial_supply = 500
initial_reward_reserve = 50
bridge_mode = "burn_mint"
bridge_operator = "0x{}"
"#,
        "33".repeat(20)
    )
    .unwrap();

    let cfg = EngineConfig::from_toml_file(file.path()).unwrap();
    let engine = Engine::deploy(&cfg, NullClock::new(0).now()).unwrap();
    assert_eq!(engine.ledger().symbol(), "TST");
    assert_eq!(engine.total_supply(), Amount::new(500_000_000));
    assert_eq!(engine.balance_of(&cfg.owner), Amount::new(450_000_000));
    assert_eq!(
        engine.staking().reward_reserve(engine.ledger()),
        Amount::new(50_000_000)
    );
    assert_eq!(engine.bridge().operator(), RELAY);
    assert_eq!(engine.bridge().mode(), BridgeMode::BurnMint);
}

#[test]
fn subscribers_see_committed_events_only() {
    let clock = NullClock::new(1_000);
    let cfg = config(1_000);
    let mut engine = deploy(&cfg, &clock);
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    engine.subscribe(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    engine
        .transfer(&at(cfg.owner, &clock), &USER1, tokens(1))
        .unwrap();
    assert!(engine
        .transfer(&at(USER2, &clock), &USER1, tokens(1))
        .is_err());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}
