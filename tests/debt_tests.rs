// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use homeledger::commands::debts::{self, create_debt, delete_debt, get_debt, update_debt};
use homeledger::commands::transactions::{create_expense, delete_expense};
use homeledger::commands::users::create_user;
use homeledger::commands::Session;
use homeledger::config::Settings;
use homeledger::error::LedgerError;
use homeledger::ledger::{DebtStatus, InterestModel, PaymentQuery, debt_ledger};
use homeledger::models::{DebtDraft, DebtType, ExpenseDraft, PaymentMode, User};
use homeledger::{cli, db, utils};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> (Connection, User) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    create_user(&conn, "priya", false).unwrap();
    let user = utils::find_user(&conn, "priya").unwrap();
    (conn, user)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn loan() -> DebtDraft {
    DebtDraft {
        name: "Home Loan".into(),
        debt_type: DebtType::Loan,
        lender: Some("City Bank".into()),
        principal_amount: dec("12000.00"),
        interest_rate: Some(dec("1.00")),
        tenure_months: 12,
        emi_amount: dec("1100.00"),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        emi_already_paid: 0,
        amount_already_paid: dec("0.00"),
        is_active: true,
    }
}

fn emi_payment(conn: &Connection, user: &User, debt_id: Option<i64>, month: u32) -> ExpenseDraft {
    ExpenseDraft {
        category_id: Some(utils::id_for_category(conn, user, "debt").unwrap()),
        debt_id,
        amount: dec("1100.00"),
        payment_mode: PaymentMode::Bank,
        expense_date: NaiveDate::from_ymd_opt(2025, month, 5).unwrap(),
        note: String::new(),
    }
}

#[test]
fn new_loan_ledger() {
    let (conn, user) = setup();
    let id = create_debt(&conn, &user, &loan()).unwrap();
    let debt = get_debt(&conn, &user, id).unwrap();
    let l = debt_ledger(&conn, &debt, InterestModel::Monthly).unwrap();

    assert_eq!(l.monthly_interest.to_string(), "120.00");
    assert_eq!(l.total_interest.to_string(), "1440.00");
    assert_eq!(l.gross_amount.to_string(), "13440.00");
    assert_eq!(l.net_paid.to_string(), "0.00");
    assert_eq!(l.net_remaining.to_string(), "13440.00");
    assert_eq!(l.status, DebtStatus::Active);
    assert_eq!(l.emi_remaining, 12);
}

#[test]
fn twelve_linked_payments_close_the_loan() {
    let (conn, user) = setup();
    let id = create_debt(&conn, &user, &loan()).unwrap();
    for month in 1..=12 {
        create_expense(&conn, &user, &emi_payment(&conn, &user, Some(id), month)).unwrap();
    }
    let agg = conn.sum_debt_payments(id).unwrap();
    assert_eq!(agg.count, 12);
    assert_eq!(agg.total.to_string(), "13200.00");

    let debt = get_debt(&conn, &user, id).unwrap();
    let l = debt_ledger(&conn, &debt, InterestModel::Monthly).unwrap();
    assert_eq!(l.total_emi_paid, 12);
    assert_eq!(l.status, DebtStatus::Closed);
    assert_eq!(l.net_paid.to_string(), "13200.00");
    assert_eq!(l.net_remaining.to_string(), "240.00");

    // No writes in between: identical snapshot
    let again = debt_ledger(&conn, &debt, InterestModel::Monthly).unwrap();
    assert_eq!(l, again);
}

#[test]
fn no_rate_means_principal_only() {
    let (conn, user) = setup();
    let mut d = loan();
    d.interest_rate = None;
    let id = create_debt(&conn, &user, &d).unwrap();
    create_expense(&conn, &user, &emi_payment(&conn, &user, Some(id), 2)).unwrap();
    let debt = get_debt(&conn, &user, id).unwrap();
    assert_eq!(debt.interest_rate, None);
    let l = debt_ledger(&conn, &debt, InterestModel::Monthly).unwrap();
    assert_eq!(l.monthly_interest.to_string(), "0.00");
    assert_eq!(l.gross_amount.to_string(), "12000.00");
    assert_eq!(l.net_remaining.to_string(), "10900.00");
}

#[test]
fn opening_emis_beyond_tenure_rejected() {
    let (conn, user) = setup();
    let mut d = loan();
    d.emi_already_paid = 15;
    let err = create_debt(&conn, &user, &d).unwrap_err();
    let v = err.validation().expect("validation error");
    assert!(v.has_field("emi_already_paid"));

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM debts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);

    d.emi_already_paid = 12;
    assert!(create_debt(&conn, &user, &d).is_ok());
}

#[test]
fn debt_payment_without_debt_rejected() {
    let (conn, user) = setup();
    let err = create_expense(&conn, &user, &emi_payment(&conn, &user, None, 1)).unwrap_err();
    assert!(err.validation().unwrap().has_field("debt"));
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn delete_blocked_while_payments_linked() {
    let (conn, user) = setup();
    let id = create_debt(&conn, &user, &loan()).unwrap();
    let payment =
        create_expense(&conn, &user, &emi_payment(&conn, &user, Some(id), 1)).unwrap();

    match delete_debt(&conn, &user, id) {
        Err(LedgerError::DeleteBlocked { debt_id, linked }) => {
            assert_eq!(debt_id, id);
            assert_eq!(linked, 1);
        }
        other => panic!("expected DeleteBlocked, got {:?}", other),
    }
    assert_eq!(get_debt(&conn, &user, id).unwrap().name, "Home Loan");

    delete_expense(&conn, &user, payment).unwrap();
    assert!(get_debt(&conn, &user, id).is_ok());
    delete_debt(&conn, &user, id).unwrap();
    assert!(matches!(
        get_debt(&conn, &user, id),
        Err(LedgerError::NotFound { .. })
    ));
}

#[test]
fn other_users_debts_are_not_found() {
    let (conn, user) = setup();
    let id = create_debt(&conn, &user, &loan()).unwrap();
    let admin = utils::find_user(&conn, "admin").unwrap();
    assert!(matches!(
        get_debt(&conn, &admin, id),
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(
        create_expense(&conn, &admin, &emi_payment(&conn, &admin, Some(id), 1)),
        Err(LedgerError::NotFound { .. })
    ));
}

#[test]
fn aggregate_ignores_links_outside_debt_category() {
    let (conn, user) = setup();
    let id = create_debt(&conn, &user, &loan()).unwrap();
    // Bypasses the gate on purpose
    conn.execute(
        "INSERT INTO expenses(user_id, category_id, debt_id, amount, payment_mode, expense_date)
         VALUES (?1, NULL, ?2, '500.00', 'cash', '2025-02-01')",
        params![user.id, id],
    )
    .unwrap();
    let agg = conn.sum_debt_payments(id).unwrap();
    assert_eq!(agg.count, 0);
    assert_eq!(agg.total.to_string(), "0.00");
}

#[test]
fn update_reruns_the_gate() {
    let (conn, user) = setup();
    let id = create_debt(&conn, &user, &loan()).unwrap();
    let mut d = get_debt(&conn, &user, id).unwrap().draft();
    d.emi_amount = Decimal::ZERO;
    d.tenure_months = 0;
    let err = update_debt(&conn, &user, id, &d).unwrap_err();
    let v = err.validation().unwrap();
    assert!(v.has_field("emi_amount"));
    assert!(v.has_field("tenure_months"));
    assert_eq!(
        get_debt(&conn, &user, id).unwrap().emi_amount.to_string(),
        "1100.00"
    );
}

#[test]
fn archived_debts_leave_the_list() {
    let (conn, user) = setup();
    let keep = create_debt(&conn, &user, &loan()).unwrap();
    let gone = create_debt(&conn, &user, &loan()).unwrap();
    debts::archive_debt(&conn, &user, gone).unwrap();
    let (rows, totals) = debts::debt_rows(&conn, &user, true, InterestModel::Monthly).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, keep);
    assert_eq!(totals.principal.to_string(), "12000.00");
    assert_eq!(totals.net_remaining.to_string(), "13440.00");
}

#[test]
fn cli_add_defaults_opening_amount() {
    let (conn, user) = setup();
    let session = Session {
        user,
        settings: Settings::default(),
    };
    let matches = cli::build_cli().get_matches_from([
        "homeledger",
        "debt",
        "add",
        "--name",
        " Bike EMI ",
        "--type",
        "emi",
        "--principal",
        "60000",
        "--tenure",
        "24",
        "--emi",
        "2750.50",
        "--start",
        "2024-06-10",
        "--emi-paid",
        "3",
    ]);
    if let Some(("debt", debt_m)) = matches.subcommand() {
        debts::handle(&conn, &session, debt_m).unwrap();
    } else {
        panic!("debt command not parsed");
    }

    let list = debts::list_debts(&conn, &session.user, false).unwrap();
    assert_eq!(list.len(), 1);
    let d = &list[0];
    assert_eq!(d.name, "Bike EMI");
    assert_eq!(d.debt_type, DebtType::Emi);
    assert_eq!(d.amount_already_paid.to_string(), "8251.50");
    assert_eq!(d.interest_rate, None);

    let l = debt_ledger(&conn, d, InterestModel::Monthly).unwrap();
    assert_eq!(l.total_emi_paid, 3);
    assert_eq!(l.emi_remaining, 21);
}

#[test]
fn cli_edit_can_deactivate() {
    let (conn, user) = setup();
    let id = create_debt(&conn, &user, &loan()).unwrap();
    let session = Session {
        user,
        settings: Settings::default(),
    };
    let id_s = id.to_string();
    let matches = cli::build_cli().get_matches_from([
        "homeledger",
        "debt",
        "edit",
        "--id",
        id_s.as_str(),
        "--active",
        "false",
        "--rate",
        "none",
    ]);
    if let Some(("debt", debt_m)) = matches.subcommand() {
        debts::handle(&conn, &session, debt_m).unwrap();
    } else {
        panic!("debt command not parsed");
    }
    let d = get_debt(&conn, &session.user, id).unwrap();
    assert!(!d.is_active);
    assert_eq!(d.interest_rate, None);
    assert!(debts::list_debts(&conn, &session.user, false).unwrap().is_empty());
    assert_eq!(debts::list_debts(&conn, &session.user, true).unwrap().len(), 1);
}

#[test]
fn oversized_terms_rejected_before_write() {
    let (conn, user) = setup();
    let mut d = loan();
    d.principal_amount = dec("100000000000000000000.00");
    d.tenure_months = 1_000_000_000_000;
    let err = create_debt(&conn, &user, &d).unwrap_err();
    let v = err.validation().unwrap();
    assert!(v.has_field("principal_amount"));
    assert!(v.has_field("tenure_months"));
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM debts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);

    d = loan();
    d.principal_amount = dec("9999999999.99");
    d.interest_rate = Some(dec("999.99"));
    d.tenure_months = i32::MAX as i64;
    let id = create_debt(&conn, &user, &d).unwrap();
    let debt = get_debt(&conn, &user, id).unwrap();
    for model in [InterestModel::Monthly, InterestModel::Annual] {
        let l = debt_ledger(&conn, &debt, model).unwrap();
        assert_eq!(l.status, DebtStatus::Active);
        assert!(l.net_remaining > debt.principal_amount);
    }
}

#[test]
fn ledger_survives_rows_written_around_the_gate() {
    let (conn, user) = setup();
    conn.execute(
        "INSERT INTO debts(user_id, name, debt_type, principal_amount, interest_rate,
             tenure_months, emi_amount, start_date, emi_already_paid)
         VALUES (?1, 'Imported', 'LOAN', '100000000000000000000.00', '1.00',
             1000000000000, '1.00', '2025-01-01', ?2)",
        params![user.id, i64::MAX],
    )
    .unwrap();
    let (rows, totals) = debts::debt_rows(&conn, &user, true, InterestModel::Monthly).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, "Closed");
    assert!(totals.net_remaining > Decimal::ZERO);
}

#[test]
fn cli_opening_amount_overflow_is_a_field_error() {
    let (conn, user) = setup();
    let session = Session {
        user,
        settings: Settings::default(),
    };
    let matches = cli::build_cli().get_matches_from([
        "homeledger",
        "debt",
        "add",
        "--name",
        "Huge",
        "--type",
        "loan",
        "--principal",
        "1000",
        "--tenure",
        "9223372036854775807",
        "--emi",
        "79228162514264337593543950335",
        "--start",
        "2025-01-01",
        "--emi-paid",
        "9223372036854775807",
    ]);
    let Some(("debt", debt_m)) = matches.subcommand() else {
        panic!("debt command not parsed");
    };
    let err = debts::handle(&conn, &session, debt_m).unwrap_err();
    let v = err.downcast_ref::<LedgerError>().unwrap().validation().unwrap();
    assert!(v.has_field("emi_amount"));
    assert!(v.has_field("amount_already_paid"));
    assert!(v.has_field("tenure_months"));
}
