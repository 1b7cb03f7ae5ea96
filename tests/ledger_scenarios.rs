use campussplit::ledger::{LedgerEngine, NewEqualSplitExpense, NewExpense};
use campussplit::money::Money;
use campussplit::schemas::{Category, Group, Member};
use campussplit::store::{LedgerStore, MemoryStore};

async fn engine_with_group(member_ids: &[&str]) -> LedgerEngine<MemoryStore> {
    let engine = LedgerEngine::new(MemoryStore::new());
    let group = Group {
        id: "trip".into(),
        name: "Semester trip".into(),
        members: member_ids
            .iter()
            .map(|id| Member {
                id: (*id).into(),
                display_name: id.to_uppercase(),
                avatar_url: None,
            })
            .collect(),
    };
    engine.store().insert_group(&group).await.unwrap();
    engine
}

fn equal_split(amount: i64, paid_by: &str, participants: &[&str]) -> NewEqualSplitExpense {
    NewEqualSplitExpense {
        description: "dinner".into(),
        amount: Money::from_minor(amount),
        paid_by: paid_by.into(),
        category: Category::Food,
        notes: None,
        receipt_ref: None,
        participants: participants.iter().map(|s| (*s).to_string()).collect(),
    }
}

#[actix_web::test]
async fn dinner_expense_then_settlement() {
    let engine = engine_with_group(&["a", "b", "c"]).await;

    // A pays 30.00 for dinner, split equally among all three.
    let expense = engine
        .record_equal_split_expense("trip", equal_split(3000, "a", &["a", "b", "c"]))
        .await
        .unwrap();
    assert_eq!(expense.shares.len(), 3);

    let net = engine.balances("trip").await.unwrap();
    assert_eq!(net["a"], Money::from_minor(2000));
    assert_eq!(net["b"], Money::from_minor(-1000));
    assert_eq!(net["c"], Money::from_minor(-1000));

    // B pays A back their 10.00.
    engine
        .record_settlement("trip", "b", "a", Money::from_minor(1000))
        .await
        .unwrap();

    let net = engine.balances("trip").await.unwrap();
    assert_eq!(net["a"], Money::from_minor(1000));
    assert_eq!(net["b"], Money::ZERO);
    assert_eq!(net["c"], Money::from_minor(-1000));

    let pairs = engine.pairwise_balances("trip").await.unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].debtor, "c");
    assert_eq!(pairs[0].creditor, "a");
    assert_eq!(pairs[0].amount, Money::from_minor(1000));
}

#[actix_web::test]
async fn residual_cents_go_to_first_participants() {
    let engine = engine_with_group(&["a", "b", "c"]).await;

    // 10.00 across three people: 3.34 / 3.33 / 3.33, first in the given
    // order absorbs the extra cent.
    let expense = engine
        .record_equal_split_expense("trip", equal_split(1000, "a", &["b", "c", "a"]))
        .await
        .unwrap();

    let owed = |member: &str| {
        expense
            .shares
            .iter()
            .find(|s| s.member_id == member)
            .unwrap()
            .amount_owed
    };
    assert_eq!(owed("b"), Money::from_minor(334));
    assert_eq!(owed("c"), Money::from_minor(333));
    assert_eq!(owed("a"), Money::from_minor(333));

    let total: Money = expense.shares.iter().map(|s| s.amount_owed).sum();
    assert_eq!(total, Money::from_minor(1000));
}

#[actix_web::test]
async fn balances_conserve_across_mixed_history() {
    let engine = engine_with_group(&["a", "b", "c", "d"]).await;

    engine
        .record_equal_split_expense("trip", equal_split(1999, "a", &["a", "b", "c", "d"]))
        .await
        .unwrap();
    engine
        .record_expense(
            "trip",
            NewExpense {
                description: "fuel".into(),
                amount: Money::from_minor(4550),
                paid_by: "b".into(),
                category: Category::Travel,
                notes: Some("split by seat".into()),
                receipt_ref: None,
                shares: [
                    ("a".to_string(), Money::from_minor(2000)),
                    ("c".to_string(), Money::from_minor(2550)),
                ]
                .into_iter()
                .collect(),
            },
        )
        .await
        .unwrap();
    engine
        .record_settlement("trip", "c", "b", Money::from_minor(1200))
        .await
        .unwrap();

    let net = engine.balances("trip").await.unwrap();
    let total: Money = net.values().copied().sum();
    assert_eq!(total, Money::ZERO);

    // Reads are idempotent: same history, same answer.
    assert_eq!(net, engine.balances("trip").await.unwrap());
}

#[actix_web::test]
async fn rejected_calls_leave_no_trace() {
    let engine = engine_with_group(&["a", "b"]).await;

    assert!(engine
        .record_expense(
            "trip",
            NewExpense {
                description: "bad split".into(),
                amount: Money::from_minor(1000),
                paid_by: "a".into(),
                category: Category::Other,
                notes: None,
                receipt_ref: None,
                shares: [("b".to_string(), Money::from_minor(9000))]
                    .into_iter()
                    .collect(),
            },
        )
        .await
        .is_err());
    assert!(engine
        .record_settlement("trip", "a", "a", Money::from_minor(100))
        .await
        .is_err());

    assert!(engine.store().list_expenses("trip").await.unwrap().is_empty());
    assert!(engine
        .store()
        .list_settlements("trip")
        .await
        .unwrap()
        .is_empty());

    let net = engine.balances("trip").await.unwrap();
    assert!(net.values().all(|m| *m == Money::ZERO));
}

#[actix_web::test]
async fn expenses_are_scoped_to_their_group() {
    let engine = engine_with_group(&["a", "b"]).await;
    let other = Group {
        id: "lab".into(),
        name: "Lab supplies".into(),
        members: vec![
            Member {
                id: "a".into(),
                display_name: "A".into(),
                avatar_url: None,
            },
            Member {
                id: "b".into(),
                display_name: "B".into(),
                avatar_url: None,
            },
        ],
    };
    engine.store().insert_group(&other).await.unwrap();

    engine
        .record_equal_split_expense("trip", equal_split(2000, "a", &["a", "b"]))
        .await
        .unwrap();

    let net = engine.balances("lab").await.unwrap();
    assert!(net.values().all(|m| *m == Money::ZERO));
}
