// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn number(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .allow_negative_numbers(true)
        .help(help)
}

fn debt_id(required: bool) -> Arg {
    Arg::new("id")
        .long("id")
        .required(required)
        .value_parser(value_parser!(i64))
        .help("Debt id")
}

fn debt_term_args(cmd: Command, adding: bool) -> Command {
    cmd.arg(
        Arg::new("name")
            .long("name")
            .required(adding)
            .help("e.g. Home Loan, Bike EMI"),
    )
    .arg(
        Arg::new("type")
            .long("type")
            .help("LOAN | EMI | BORROW | OTHER")
            .default_value(if adding { Some("LOAN") } else { None }),
    )
    .arg(Arg::new("lender").long("lender").help("Bank or person name"))
    .arg(number("principal", "principal", "Total loan amount").required(adding))
    .arg(number("rate", "rate", "Interest rate (%)"))
    .arg(
        number("tenure", "tenure", "Total months")
            .required(adding)
            .value_parser(value_parser!(i64)),
    )
    .arg(number("emi", "emi", "Monthly EMI amount").required(adding))
    .arg(
        Arg::new("start")
            .long("start")
            .required(adding)
            .help("Start date YYYY-MM-DD"),
    )
    .arg(
        number("emi_paid", "emi-paid", "Number of EMIs already paid")
            .value_parser(value_parser!(i64)),
    )
    .arg(number(
        "amount_paid",
        "amount-paid",
        "Amount already paid (defaults to EMIs paid x EMI amount)",
    ))
}

fn expense_args(cmd: Command, adding: bool) -> Command {
    cmd.arg(
        Arg::new("date")
            .long("date")
            .required(adding)
            .help("YYYY-MM-DD"),
    )
    .arg(number("amount", "amount", "Expense amount").required(adding))
    .arg(
        Arg::new("mode")
            .long("mode")
            .help("cash | upi | card | bank")
            .default_value(if adding { Some("cash") } else { None }),
    )
    .arg(Arg::new("category").long("category"))
    .arg(
        Arg::new("debt")
            .long("debt")
            .value_parser(value_parser!(i64))
            .help("Debt id this payment repays"),
    )
    .arg(Arg::new("note").long("note"))
}

pub fn build_cli() -> Command {
    Command::new("homeledger")
        .about("Expense categories, transactions, and debt/EMI tracking")
        .version(crate_version!())
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .help("Act as this user (defaults to $HOMELEDGER_USER or the default_user setting)"),
        )
        .subcommand(Command::new("init").about("Initialize database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("superuser")
                                .long("superuser")
                                .action(ArgAction::SetTrue)
                                .help("Categories owned by this user are global"),
                        ),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("category")
                .about("Manage expense categories")
                .subcommand(Command::new("add").arg(Arg::new("name").long("name").required(true)))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand(
            Command::new("debt")
                .about("Track loans and EMIs")
                .subcommand(debt_term_args(Command::new("add"), true))
                .subcommand(json_flags(Command::new("info").arg(debt_id(true))))
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Include inactive debts"),
                    ),
                ))
                .subcommand(
                    debt_term_args(Command::new("edit").arg(debt_id(true)), false).arg(
                        Arg::new("active")
                            .long("active")
                            .help("true | false"),
                    ),
                )
                .subcommand(
                    Command::new("archive")
                        .about("Hide a debt from lists, keeping its payments")
                        .arg(debt_id(true)),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a debt that has no linked payments")
                        .arg(debt_id(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record expenses and EMI payments")
                .subcommand(expense_args(Command::new("add"), true))
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("debt")
                                .long("debt")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    expense_args(
                        Command::new("edit").arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        ),
                        false,
                    )
                    .arg(
                        Arg::new("no_category")
                            .long("no-category")
                            .action(ArgAction::SetTrue)
                            .conflicts_with("category"),
                    )
                    .arg(
                        Arg::new("unlink_debt")
                            .long("unlink-debt")
                            .action(ArgAction::SetTrue)
                            .conflicts_with("debt"),
                    ),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("report").about("Summaries").subcommand(json_flags(
                Command::new("dashboard")
                    .arg(Arg::new("date").long("date").help("Reference day YYYY-MM-DD (default today)")),
            )),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("expenses")
                        .arg(Arg::new("format").long("format").default_value("csv"))
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    Command::new("debts")
                        .arg(Arg::new("format").long("format").default_value("csv"))
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("value").long("value").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check data integrity"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        build_cli().debug_assert();
    }
}
