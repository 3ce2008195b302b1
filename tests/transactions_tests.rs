// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use homeledger::commands::categories::create_category;
use homeledger::commands::debts::{archive_debt, create_debt};
use homeledger::commands::transactions::{self, create_expense, get_expense};
use homeledger::commands::users::create_user;
use homeledger::commands::Session;
use homeledger::config::Settings;
use homeledger::error::LedgerError;
use homeledger::models::{DebtDraft, DebtType, ExpenseDraft, PaymentMode, User};
use homeledger::{cli, db, utils};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> (Connection, Session) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    create_user(&conn, "priya", false).unwrap();
    let user = utils::find_user(&conn, "priya").unwrap();
    create_category(&conn, &user, "Groceries").unwrap();
    let session = Session {
        user,
        settings: Settings::default(),
    };
    (conn, session)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn add_debt(conn: &Connection, user: &User) -> i64 {
    create_debt(
        conn,
        user,
        &DebtDraft {
            name: "Phone EMI".into(),
            debt_type: DebtType::Emi,
            lender: None,
            principal_amount: dec("30000"),
            interest_rate: None,
            tenure_months: 6,
            emi_amount: dec("5000"),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            emi_already_paid: 0,
            amount_already_paid: Decimal::ZERO,
            is_active: true,
        },
    )
    .unwrap()
}

fn run_tx(conn: &Connection, session: &Session, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["homeledger", "tx"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("tx", tx_m)) => transactions::handle(conn, session, tx_m),
        _ => panic!("no tx subcommand"),
    }
}

#[test]
fn list_limit_respected() {
    let (conn, session) = setup();
    for day in ["2025-01-01", "2025-01-02", "2025-01-03"] {
        run_tx(
            &conn,
            &session,
            &["add", "--date", day, "--amount", "10", "--category", "groceries"],
        )
        .unwrap();
    }
    let matches = cli::build_cli().get_matches_from(["homeledger", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = transactions::query_rows(&conn, &session.user, list_m).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, "2025-01-03");
            assert_eq!(rows[0].amount, "10.00");
            assert_eq!(rows[0].category, "groceries");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn cli_debt_payment_needs_matching_category() {
    let (conn, session) = setup();
    let debt = add_debt(&conn, &session.user).to_string();

    let err = run_tx(
        &conn,
        &session,
        &["add", "--date", "2025-02-01", "--amount", "5000", "--category", "groceries", "--debt", &debt],
    )
    .unwrap_err();
    assert!(err.to_string().contains("category"));

    let err = run_tx(
        &conn,
        &session,
        &["add", "--date", "2025-02-01", "--amount", "5000", "--category", "debt"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("debt"));

    run_tx(
        &conn,
        &session,
        &["add", "--date", "2025-02-01", "--amount", "5000", "--mode", "upi", "--category", "debt", "--debt", &debt],
    )
    .unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
}

#[test]
fn negative_amount_rejected() {
    let (conn, session) = setup();
    let draft = ExpenseDraft {
        category_id: None,
        debt_id: None,
        amount: dec("-1"),
        payment_mode: PaymentMode::Cash,
        expense_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        note: String::new(),
    };
    let err = create_expense(&conn, &session.user, &draft).unwrap_err();
    assert!(err.validation().unwrap().has_field("amount"));
}

#[test]
fn edit_keeps_the_link_consistent() {
    let (conn, session) = setup();
    let debt = add_debt(&conn, &session.user);
    let debt_s = debt.to_string();
    run_tx(
        &conn,
        &session,
        &["add", "--date", "2025-02-01", "--amount", "5000", "--category", "debt", "--debt", &debt_s],
    )
    .unwrap();
    let id: i64 = conn
        .query_row("SELECT id FROM expenses", [], |r| r.get(0))
        .unwrap();
    let id_s = id.to_string();

    // Unlinking alone leaves a debt-category payment without a debt
    assert!(run_tx(&conn, &session, &["edit", "--id", &id_s, "--unlink-debt"]).is_err());

    run_tx(
        &conn,
        &session,
        &["edit", "--id", &id_s, "--unlink-debt", "--category", "groceries", "--note", "moved"],
    )
    .unwrap();
    let e = get_expense(&conn, &session.user, id).unwrap();
    assert_eq!(e.debt_id, None);
    assert_eq!(e.note, "moved");
    assert_eq!(e.amount.to_string(), "5000.00");
}

#[test]
fn removing_a_payment_keeps_the_debt() {
    let (conn, session) = setup();
    let debt = add_debt(&conn, &session.user);
    let debt_s = debt.to_string();
    run_tx(
        &conn,
        &session,
        &["add", "--date", "2025-02-01", "--amount", "5000", "--category", "debt", "--debt", &debt_s],
    )
    .unwrap();
    let id: i64 = conn
        .query_row("SELECT id FROM expenses", [], |r| r.get(0))
        .unwrap();
    run_tx(&conn, &session, &["rm", "--id", &id.to_string()]).unwrap();
    let debts: i64 = conn
        .query_row("SELECT COUNT(*) FROM debts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(debts, 1);
}

#[test]
fn payments_of_archived_debts_stay_editable() {
    let (conn, session) = setup();
    let debt = add_debt(&conn, &session.user);
    let debt_s = debt.to_string();
    run_tx(
        &conn,
        &session,
        &["add", "--date", "2025-02-01", "--amount", "5000", "--category", "debt", "--debt", &debt_s],
    )
    .unwrap();
    let id: i64 = conn
        .query_row("SELECT id FROM expenses", [], |r| r.get(0))
        .unwrap();
    archive_debt(&conn, &session.user, debt).unwrap();

    run_tx(&conn, &session, &["edit", "--id", &id.to_string(), "--note", "last one"]).unwrap();
    let e = get_expense(&conn, &session.user, id).unwrap();
    assert_eq!(e.debt_id, Some(debt));
    assert_eq!(e.note, "last one");

    let mut draft = e.draft();
    draft.note = String::new();
    let err = create_expense(&conn, &session.user, &draft).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { entity: "Debt", .. }));
}
