use chrono::NaiveDate;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    CalculateMethod, CategoryKind, CreateTransactionCmd, Engine, EngineError, Money, StatsFilter,
    TransactionListFilter, TransactionTypeKind, UpdateTransactionCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

struct Fixture {
    engine: Engine,
    db: DatabaseConnection,
    bank: Uuid,
    rent: Uuid,
    fees: Uuid,
}

/// Bank "Main" holding 100.00, a `subtract` category "Rent" and an `add`
/// category "Fees".
async fn fixture() -> Fixture {
    let (engine, db) = engine_with_db().await;
    let bank = engine.create_bank("Main", Money::new(100_00)).await.unwrap();
    let rent = engine
        .create_category("Rent", CategoryKind::Expense, CalculateMethod::Debit)
        .await
        .unwrap();
    let fees = engine
        .create_category("Fees", CategoryKind::Income, CalculateMethod::Credit)
        .await
        .unwrap();
    Fixture {
        engine,
        db,
        bank: bank.id,
        rent: rent.id,
        fees: fees.id,
    }
}

async fn balance(engine: &Engine, bank: Uuid) -> Money {
    engine.bank(bank).await.unwrap().balance
}

#[tokio::test]
async fn debit_reduces_balance() {
    let f = fixture().await;

    let tx = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(30_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();

    assert_eq!(tx.amount, Money::new(30_00));
    assert_eq!(tx.created_by, "alice");
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(70_00));
}

#[tokio::test]
async fn overdraft_is_rejected_and_balance_kept() {
    let f = fixture().await;
    f.engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(30_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();

    let err = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(100_00),
            day(2),
            "alice",
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert!(!err.is_retryable());
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(70_00));
    let (items, _) = f
        .engine
        .list_transactions_page(&TransactionListFilter::default(), 10, None)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn update_recomputes_from_stored_amount() {
    let f = fixture().await;
    let tx = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(30_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();

    let updated = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(tx.id, "bob").amount(Money::new(50_00)))
        .await
        .unwrap();

    assert_eq!(updated.amount, Money::new(50_00));
    assert_eq!(updated.created_by, "alice");
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(50_00));
}

#[tokio::test]
async fn delete_restores_balance() {
    let f = fixture().await;
    let tx = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(30_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();
    f.engine
        .update_transaction(UpdateTransactionCmd::new(tx.id, "alice").amount(Money::new(50_00)))
        .await
        .unwrap();

    f.engine.delete_transaction(tx.id, "alice").await.unwrap();

    assert_eq!(balance(&f.engine, f.bank).await, Money::new(100_00));
    let err = f.engine.transaction(tx.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn credit_on_empty_bank() {
    let f = fixture().await;
    let empty = f.engine.create_bank("Petty", Money::ZERO).await.unwrap();

    f.engine
        .create_transaction(CreateTransactionCmd::new(
            empty.id,
            f.fees,
            Money::new(200_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();

    assert_eq!(balance(&f.engine, empty.id).await, Money::new(200_00));
}

#[tokio::test]
async fn debit_to_exactly_zero_is_allowed() {
    let f = fixture().await;
    f.engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(100_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, f.bank).await, Money::ZERO);
}

#[tokio::test]
async fn non_positive_amount_is_rejected() {
    let f = fixture().await;
    for amount in [0, -5_00] {
        let err = f
            .engine
            .create_transaction(CreateTransactionCmd::new(
                f.bank,
                f.rent,
                Money::new(amount),
                day(1),
                "alice",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(100_00));
}

#[tokio::test]
async fn unknown_references_are_not_found() {
    let f = fixture().await;

    let err = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            Uuid::new_v4(),
            f.rent,
            Money::new(1_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            Uuid::new_v4(),
            Money::new(1_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(Uuid::new_v4(), "alice").amount(Money::new(1_00)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = f
        .engine
        .delete_transaction(Uuid::new_v4(), "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn blank_actor_is_rejected() {
    let f = fixture().await;
    let err = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(1_00),
            day(1),
            "  ",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn moving_between_banks_equals_delete_then_create() {
    let f = fixture().await;
    let savings = f
        .engine
        .create_bank("Savings", Money::new(40_00))
        .await
        .unwrap();
    let tx = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(30_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();

    let moved = f
        .engine
        .update_transaction(
            UpdateTransactionCmd::new(tx.id, "alice")
                .bank_id(savings.id)
                .amount(Money::new(25_00)),
        )
        .await
        .unwrap();

    assert_eq!(moved.bank_id, savings.id);
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(100_00));
    assert_eq!(balance(&f.engine, savings.id).await, Money::new(15_00));
}

#[tokio::test]
async fn move_rejected_when_destination_lacks_funds() {
    let f = fixture().await;
    let savings = f
        .engine
        .create_bank("Savings", Money::new(10_00))
        .await
        .unwrap();
    let tx = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(30_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();

    let err = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(tx.id, "alice").bank_id(savings.id))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(70_00));
    assert_eq!(balance(&f.engine, savings.id).await, Money::new(10_00));
    assert_eq!(f.engine.transaction(tx.id).await.unwrap().bank_id, f.bank);
}

#[tokio::test]
async fn move_rejected_when_source_reversal_goes_negative() {
    let f = fixture().await;
    let savings = f.engine.create_bank("Savings", Money::ZERO).await.unwrap();
    let income = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.fees,
            Money::new(50_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();
    f.engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(120_00),
            day(2),
            "alice",
        ))
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(30_00));

    let err = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(income.id, "alice").bank_id(savings.id))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(30_00));
    assert_eq!(balance(&f.engine, savings.id).await, Money::ZERO);
}

#[tokio::test]
async fn same_bank_update_checks_only_final_balance() {
    let f = fixture().await;
    let income = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.fees,
            Money::new(200_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();
    f.engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(250_00),
            day(2),
            "alice",
        ))
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(50_00));

    // Reversing the 200.00 alone would go negative; the net change is +50.00.
    f.engine
        .update_transaction(UpdateTransactionCmd::new(income.id, "alice").amount(Money::new(250_00)))
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(100_00));
}

#[tokio::test]
async fn changing_category_flips_the_sign() {
    let f = fixture().await;
    let tx = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(30_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();

    f.engine
        .update_transaction(UpdateTransactionCmd::new(tx.id, "alice").category_id(f.fees))
        .await
        .unwrap();

    assert_eq!(balance(&f.engine, f.bank).await, Money::new(130_00));
}

#[tokio::test]
async fn delete_rejected_when_reversal_goes_negative() {
    let f = fixture().await;
    let income = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.fees,
            Money::new(50_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();
    f.engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(120_00),
            day(2),
            "alice",
        ))
        .await
        .unwrap();

    let err = f
        .engine
        .delete_transaction(income.id, "alice")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(30_00));
    assert!(f.engine.transaction(income.id).await.is_ok());
}

#[tokio::test]
async fn metadata_update_keeps_balance() {
    let f = fixture().await;
    let supplies = f
        .engine
        .create_transaction_type(TransactionTypeKind::Expense, "Supplies")
        .await
        .unwrap();
    let tx = f
        .engine
        .create_transaction(
            CreateTransactionCmd::new(f.bank, f.rent, Money::new(30_00), day(1), "alice")
                .note("march"),
        )
        .await
        .unwrap();

    let updated = f
        .engine
        .update_transaction(
            UpdateTransactionCmd::new(tx.id, "alice")
                .date(day(5))
                .note("")
                .expense_type_id(Some(supplies.id)),
        )
        .await
        .unwrap();

    assert_eq!(updated.date, day(5));
    assert_eq!(updated.note, None);
    assert_eq!(updated.expense_type_id, Some(supplies.id));
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(70_00));
}

#[tokio::test]
async fn interleaved_debits_never_overdraw() {
    let f = fixture().await;
    let first = f.engine.clone();
    let second = f.engine.clone();

    let (a, b) = tokio::join!(
        first.create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(70_00),
            day(1),
            "alice",
        )),
        second.create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(70_00),
            day(1),
            "bob",
        )),
    );

    let outcomes = [a, b];
    let ok = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    assert!(outcomes.iter().any(|r| matches!(
        r,
        Err(EngineError::InsufficientFunds(_)) | Err(EngineError::Conflict(_))
    )));
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(30_00));
}

/// File-backed database behind a real pool, so scopes run on separate
/// connections and contend for the SQLite write lock.
async fn pooled_engine() -> (Engine, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("bursary-{}.db", Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", path.display()));
    options.max_connections(4).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    (engine, path)
}

fn remove_db_files(path: &std::path::Path) {
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pooled_concurrent_debits_keep_the_ledger_consistent() {
    let (engine, path) = pooled_engine().await;
    let bank = engine.create_bank("Main", Money::new(100_00)).await.unwrap();
    let rent = engine
        .create_category("Rent", CategoryKind::Expense, CalculateMethod::Debit)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for n in 0..30 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .create_transaction(CreateTransactionCmd::new(
                    bank.id,
                    rent.id,
                    Money::new(10_00),
                    day(1),
                    format!("clerk-{n}"),
                ))
                .await
        }));
    }

    let mut posted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => posted += 1,
            Err(EngineError::InsufficientFunds(_)) => {}
            Err(err) => {
                assert!(err.is_retryable(), "unexpected error: {err:?}");
                assert!(matches!(err, EngineError::Conflict(_)));
            }
        }
    }

    assert!(posted <= 10);
    let stored = engine.bank(bank.id).await.unwrap().balance;
    assert!(!stored.is_negative());
    assert_eq!(stored, Money::new(100_00 - 10_00 * posted));
    assert_eq!(engine.verify_balances().await.unwrap(), vec![]);

    remove_db_files(&path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pooled_duplicate_names_are_existing_key() {
    let (engine, path) = pooled_engine().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.create_bank("Petty cash", Money::ZERO).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => assert!(
                matches!(err, EngineError::ExistingKey(_) | EngineError::Conflict(_)),
                "unexpected error: {err:?}"
            ),
        }
    }
    assert!(created <= 1);
    assert_eq!(engine.banks().await.unwrap().len(), created);

    remove_db_files(&path);
}

#[tokio::test]
async fn out_of_band_balance_change_is_repaired() {
    let f = fixture().await;
    let tx = f
        .engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            f.rent,
            Money::new(30_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();

    // Simulate a writer outside the engine bumping the stored balance.
    let backend = f.db.get_database_backend();
    f.db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE banks SET balance_minor = balance_minor + 1 WHERE id = ?",
        vec![f.bank.to_string().into()],
    ))
    .await
    .unwrap();

    let drifts = f.engine.verify_balances().await.unwrap();
    assert_eq!(drifts.len(), 1);
    assert_eq!(drifts[0].stored, Money::new(70_01));
    assert_eq!(drifts[0].expected, Money::new(70_00));

    let fixed = f.engine.recompute_balances().await.unwrap();
    assert_eq!(fixed.len(), 1);
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(70_00));
    assert!(f.engine.verify_balances().await.unwrap().is_empty());

    f.engine.delete_transaction(tx.id, "alice").await.unwrap();
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(100_00));
}

#[tokio::test]
async fn registries_reject_duplicate_names() {
    let f = fixture().await;

    let err = f
        .engine
        .create_category("  rent ", CategoryKind::Expense, CalculateMethod::Debit)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = f
        .engine
        .create_bank("MAIN", Money::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    f.engine
        .create_transaction_type(TransactionTypeKind::Income, "Tuition")
        .await
        .unwrap();
    let err = f
        .engine
        .create_transaction_type(TransactionTypeKind::Income, "tuition")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    // Income and expense types are separate namespaces.
    f.engine
        .create_transaction_type(TransactionTypeKind::Expense, "Tuition")
        .await
        .unwrap();

    let err = f
        .engine
        .create_bank("Negative", Money::new(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn method_of_unused_category_can_change() {
    let f = fixture().await;
    let refunds = f
        .engine
        .create_category("Refunds", CategoryKind::Expense, CalculateMethod::Debit)
        .await
        .unwrap();

    let updated = f
        .engine
        .update_category(
            refunds.id,
            None,
            Some(CategoryKind::Income),
            Some(CalculateMethod::Credit),
        )
        .await
        .unwrap();
    assert_eq!(updated.calculate_method, CalculateMethod::Credit);
    assert_eq!(updated.kind, CategoryKind::Income);
    assert_eq!(
        f.engine.category(refunds.id).await.unwrap().calculate_method,
        CalculateMethod::Credit
    );

    // The new method drives the next posting.
    f.engine
        .create_transaction(CreateTransactionCmd::new(
            f.bank,
            refunds.id,
            Money::new(5_00),
            day(1),
            "alice",
        ))
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, f.bank).await, Money::new(105_00));
}

#[tokio::test]
async fn referenced_rows_cannot_be_deleted() {
    let f = fixture().await;
    let tuition = f
        .engine
        .create_transaction_type(TransactionTypeKind::Income, "Tuition")
        .await
        .unwrap();
    let tx = f
        .engine
        .create_transaction(
            CreateTransactionCmd::new(f.bank, f.fees, Money::new(10_00), day(1), "alice")
                .income_type_id(tuition.id),
        )
        .await
        .unwrap();

    let err = f.engine.delete_category(f.fees).await.unwrap_err();
    assert!(matches!(err, EngineError::ReferentialConflict(_)));
    let err = f.engine.delete_bank(f.bank).await.unwrap_err();
    assert!(matches!(err, EngineError::ReferentialConflict(_)));
    let err = f
        .engine
        .delete_transaction_type(TransactionTypeKind::Income, tuition.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ReferentialConflict(_)));
    let err = f
        .engine
        .update_category(f.fees, None, None, Some(CalculateMethod::Debit))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ReferentialConflict(_)));

    f.engine.delete_transaction(tx.id, "alice").await.unwrap();
    f.engine.delete_category(f.fees).await.unwrap();
    f.engine
        .delete_transaction_type(TransactionTypeKind::Income, tuition.id)
        .await
        .unwrap();
    assert_eq!(f.engine.categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn rename_keeps_balance() {
    let f = fixture().await;
    let renamed = f.engine.rename_bank(f.bank, "Operating").await.unwrap();
    assert_eq!(renamed.name, "Operating");
    assert_eq!(renamed.balance, Money::new(100_00));

    let category = f
        .engine
        .update_category(f.rent, Some("Housing"), None, None)
        .await
        .unwrap();
    assert_eq!(category.name, "Housing");
    assert_eq!(category.calculate_method, CalculateMethod::Debit);

    let tuition = f
        .engine
        .create_transaction_type(TransactionTypeKind::Income, "Tuition")
        .await
        .unwrap();
    let grants = f
        .engine
        .create_transaction_type(TransactionTypeKind::Income, "Grants")
        .await
        .unwrap();
    let err = f
        .engine
        .rename_transaction_type(TransactionTypeKind::Income, grants.id, "TUITION")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    let renamed = f
        .engine
        .rename_transaction_type(TransactionTypeKind::Income, tuition.id, "tuition")
        .await
        .unwrap();
    assert_eq!(renamed.name, "tuition");
    assert_eq!(renamed.id, tuition.id);
    let err = f
        .engine
        .rename_transaction_type(TransactionTypeKind::Expense, tuition.id, "Books")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn list_pages_newest_first() {
    let f = fixture().await;
    let mut ids = Vec::new();
    for d in 1..=5 {
        let tx = f
            .engine
            .create_transaction(CreateTransactionCmd::new(
                f.bank,
                f.fees,
                Money::new(1_00),
                day(d),
                "alice",
            ))
            .await
            .unwrap();
        ids.push(tx.id);
    }
    ids.reverse();

    let filter = TransactionListFilter::default();
    let (first, cursor) = f
        .engine
        .list_transactions_page(&filter, 2, None)
        .await
        .unwrap();
    let cursor = cursor.expect("more pages");
    let (second, cursor) = f
        .engine
        .list_transactions_page(&filter, 2, Some(&cursor))
        .await
        .unwrap();
    let cursor = cursor.expect("more pages");
    let (third, cursor) = f
        .engine
        .list_transactions_page(&filter, 2, Some(&cursor))
        .await
        .unwrap();
    assert!(cursor.is_none());

    let seen: Vec<Uuid> = first
        .iter()
        .chain(&second)
        .chain(&third)
        .map(|tx| tx.id)
        .collect();
    assert_eq!(seen, ids);

    let ranged = TransactionListFilter {
        from: Some(day(2)),
        to: Some(day(4)),
        ..Default::default()
    };
    let (items, _) = f
        .engine
        .list_transactions_page(&ranged, 10, None)
        .await
        .unwrap();
    assert_eq!(
        items.iter().map(|tx| tx.date).collect::<Vec<_>>(),
        vec![day(3), day(2)]
    );

    let err = f
        .engine
        .list_transactions_page(&filter, 2, Some("not-a-cursor"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn statistics_split_by_category_type() {
    let f = fixture().await;
    let savings = f
        .engine
        .create_bank("Savings", Money::new(10_00))
        .await
        .unwrap();
    for (bank, category, amount, d) in [
        (f.bank, f.fees, 50_00, 1),
        (f.bank, f.rent, 30_00, 2),
        (savings.id, f.fees, 5_00, 3),
    ] {
        f.engine
            .create_transaction(CreateTransactionCmd::new(
                bank,
                category,
                Money::new(amount),
                day(d),
                "alice",
            ))
            .await
            .unwrap();
    }

    let totals = f.engine.totals(&StatsFilter::default()).await.unwrap();
    assert_eq!(totals.transaction_count, 3);
    assert_eq!(totals.total_income, Money::new(55_00));
    assert_eq!(totals.total_expense, Money::new(30_00));
    assert_eq!(totals.net, Money::new(25_00));

    let march_first = StatsFilter {
        to: Some(day(2)),
        ..Default::default()
    };
    let totals = f.engine.totals(&march_first).await.unwrap();
    assert_eq!(totals.transaction_count, 1);
    assert_eq!(totals.total_expense, Money::ZERO);

    let banks = f
        .engine
        .bank_summaries(&StatsFilter::default())
        .await
        .unwrap();
    assert_eq!(banks.len(), 2);
    assert_eq!(banks[0].name, "Main");
    assert_eq!(banks[0].balance, Money::new(120_00));
    assert_eq!(banks[0].credits, Money::new(50_00));
    assert_eq!(banks[0].debits, Money::new(30_00));
    assert_eq!(banks[1].transaction_count, 1);

    let categories = f
        .engine
        .category_summaries(&StatsFilter::default())
        .await
        .unwrap();
    assert_eq!(categories[0].name, "Fees");
    assert_eq!(categories[0].total, Money::new(55_00));
    assert_eq!(categories[1].transaction_count, 1);
}
