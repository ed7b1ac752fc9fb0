//! Tests for the SQLite-backed contract.

use tempfile::NamedTempFile;

use stakes_server::db::SqliteContract;
use stakes_tictactoe::{Address, Board, Contract, ContractError, GameStatus, Receipt};

const X: u64 = 1;
const O: u64 = 2;

fn alice() -> Address {
    Address::new("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM")
}

fn bob() -> Address {
    Address::new("ST1SJ3DTE5DN7X54YDH5D64R3BCB6A2AG2ZQ8YPD5")
}

/// Creates a temporary database file and a funded contract over it. The file
/// handle must stay in scope to keep the database alive.
fn setup_test_db() -> (NamedTempFile, SqliteContract) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let mut contract = SqliteContract::open(db_path).expect("Failed to open contract");
    contract.fund(&alice(), 10_000).expect("fund alice");
    contract.fund(&bob(), 10_000).expect("fund bob");
    (db_file, contract)
}

fn rejection(result: Result<Receipt, ContractError>) -> u32 {
    result
        .expect_err("call should be rejected")
        .rejection()
        .expect("rejected by the rules")
        .code()
}

#[test]
fn test_sequential_ids_start_at_zero() {
    let (_db, mut contract) = setup_test_db();
    for expected in 0..3 {
        let receipt = contract.create_game(&alice(), 100, 0, X).expect("create");
        assert_eq!(receipt.game_id, expected);
    }
    let ids: Vec<u64> = contract
        .list_games()
        .expect("list")
        .iter()
        .map(|game| *game.id())
        .collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn test_player_one_wins_and_collects() {
    let (_db, mut contract) = setup_test_db();
    contract.create_game(&alice(), 100, 0, X).expect("create");
    contract.join_game(&bob(), 0, 3, O).expect("join");
    contract.play(&alice(), 0, 1, X).expect("play");
    contract.play(&bob(), 0, 4, O).expect("play");
    let receipt = contract.play(&alice(), 0, 2, X).expect("winning play");
    assert_eq!(receipt.events.len(), 2);

    let game = contract.get_game(0).expect("query").expect("game exists");
    assert_eq!(
        *game.board(),
        Board::from_wire(&[1, 1, 1, 2, 2, 0, 0, 0, 0]).unwrap()
    );
    assert!(!*game.is_player_one_turn());
    assert_eq!(game.status(), GameStatus::Won(alice()));
    assert_eq!(contract.balance(&alice()).unwrap(), 10_100);
    assert_eq!(contract.balance(&bob()).unwrap(), 9_900);
}

#[test]
fn test_rejections_leave_database_untouched() {
    let (_db, mut contract) = setup_test_db();
    contract.create_game(&alice(), 100, 0, X).expect("create");
    let before = contract.list_games().unwrap();

    assert_eq!(rejection(contract.create_game(&alice(), 0, 1, X)), 100);
    assert_eq!(rejection(contract.join_game(&bob(), 0, 0, O)), 101);
    assert_eq!(rejection(contract.join_game(&alice(), 0, 1, O)), 103);
    assert_eq!(rejection(contract.play(&alice(), 0, 1, X)), 104);
    assert_eq!(rejection(contract.play(&alice(), 9, 1, X)), 105);

    assert_eq!(contract.list_games().unwrap(), before);
    assert_eq!(contract.balance(&alice()).unwrap(), 9_900);
    assert_eq!(contract.balance(&bob()).unwrap(), 10_000);
}

#[test]
fn test_insufficient_balance_rolls_back() {
    let (_db, mut contract) = setup_test_db();
    assert_eq!(rejection(contract.create_game(&alice(), 20_000, 0, X)), 1);
    assert!(contract.get_game(0).unwrap().is_none());
    assert_eq!(contract.balance(&alice()).unwrap(), 10_000);

    let receipt = contract.create_game(&alice(), 100, 0, X).expect("create");
    assert_eq!(receipt.game_id, 0);
}

#[test]
fn test_state_survives_reopen() {
    let (db, mut contract) = setup_test_db();
    contract.create_game(&alice(), 100, 4, X).expect("create");
    contract.join_game(&bob(), 0, 0, O).expect("join");
    drop(contract);

    let db_path = db.path().to_str().expect("Invalid path").to_string();
    let mut reopened = SqliteContract::open(db_path).expect("reopen");
    let game = reopened.get_game(0).unwrap().expect("game exists");
    assert_eq!(*game.player_two(), Some(bob()));
    assert!(*game.is_player_one_turn());
    assert_eq!(reopened.balance(&bob()).unwrap(), 9_900);

    let receipt = reopened.create_game(&bob(), 50, 0, X).expect("create");
    assert_eq!(receipt.game_id, 1);
}

#[test]
fn test_draw_refunds_both_players() {
    let (_db, mut contract) = setup_test_db();
    contract.create_game(&alice(), 100, 0, X).expect("create");
    contract.join_game(&bob(), 0, 1, O).expect("join");
    for (player, index, mv) in [
        (alice(), 2, X),
        (bob(), 4, O),
        (alice(), 3, X),
        (bob(), 5, O),
        (alice(), 7, X),
        (bob(), 6, O),
    ] {
        contract.play(&player, 0, index, mv).expect("play");
    }
    let receipt = contract.play(&alice(), 0, 8, X).expect("final play");
    assert_eq!(receipt.transfer_count(), 2);

    let game = contract.get_game(0).unwrap().expect("game exists");
    assert_eq!(game.status(), GameStatus::Drawn);
    assert_eq!(contract.balance(&alice()).unwrap(), 10_000);
    assert_eq!(contract.balance(&bob()).unwrap(), 10_000);
    assert_eq!(rejection(contract.play(&bob(), 0, 0, O)), 106);
}

#[test]
fn test_fund_rejects_zero() {
    let (_db, mut contract) = setup_test_db();
    let error = contract.fund(&alice(), 0).expect_err("zero fund");
    assert_eq!(error.rejection().map(|e| e.code()), Some(3));
    assert_eq!(contract.balance(&alice()).unwrap(), 10_000);
}

#[test]
fn test_caller_named_like_escrow_is_a_separate_account() {
    let (_db, mut contract) = setup_test_db();
    contract.create_game(&alice(), 100, 0, X).expect("create");
    contract.join_game(&bob(), 0, 3, O).expect("join");

    let impostor = Address::new("escrow:0");
    assert_eq!(contract.balance(&impostor).unwrap(), 0);
    assert_eq!(rejection(contract.create_game(&impostor, 200, 1, X)), 1);
    assert_eq!(contract.list_games().unwrap().len(), 1);

    contract.play(&alice(), 0, 1, X).expect("play");
    contract.play(&bob(), 0, 4, O).expect("play");
    contract.play(&alice(), 0, 2, X).expect("winning play");
    assert_eq!(contract.balance(&alice()).unwrap(), 10_100);
    assert_eq!(contract.balance(&impostor).unwrap(), 0);
}

#[test]
fn test_balances_conserved_across_a_game() {
    let (_db, mut contract) = setup_test_db();
    let total = |contract: &SqliteContract| {
        contract.balance(&alice()).unwrap() + contract.balance(&bob()).unwrap()
    };
    assert_eq!(total(&contract), 20_000);

    contract.create_game(&alice(), 300, 0, X).expect("create");
    contract.join_game(&bob(), 0, 3, O).expect("join");
    assert_eq!(total(&contract), 19_400);

    contract.play(&alice(), 0, 1, X).expect("play");
    assert_eq!(rejection(contract.play(&alice(), 0, 2, X)), 104);
    contract.play(&bob(), 0, 4, O).expect("play");
    contract.play(&alice(), 0, 2, X).expect("winning play");
    assert_eq!(total(&contract), 20_000);
    assert_eq!(contract.balance(&alice()).unwrap(), 10_300);
}

#[test]
fn test_fund_past_column_range_is_invalid_amount() {
    let (_db, mut contract) = setup_test_db();
    let error = contract
        .fund(&alice(), i64::MAX as u64)
        .expect_err("balance would exceed the column");
    assert_eq!(error.rejection().map(|e| e.code()), Some(3));
    assert_eq!(contract.balance(&alice()).unwrap(), 10_000);

    let balance = contract.fund(&alice(), i64::MAX as u64 - 10_000).expect("fund to the limit");
    assert_eq!(balance, i64::MAX as u64);
}

#[test]
fn test_seed_marks_the_address_once() {
    let (db, mut contract) = setup_test_db();
    let carol = Address::new("carol");
    assert_eq!(contract.seed(&carol, 100).unwrap(), Some(100));
    contract.create_game(&carol, 100, 0, X).expect("stake everything");
    assert_eq!(contract.seed(&carol, 100).unwrap(), None);
    drop(contract);

    let db_path = db.path().to_str().expect("Invalid path").to_string();
    let mut reopened = SqliteContract::open(db_path).expect("reopen");
    assert_eq!(reopened.seed(&carol, 100).unwrap(), None);
    assert_eq!(reopened.balance(&carol).unwrap(), 0);
    assert_eq!(reopened.seed(&alice(), 50).unwrap(), Some(10_050));
}
