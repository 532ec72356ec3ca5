// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

pub fn build_cli() -> Command {
    Command::new("ledgerclip")
        .about("Personal-finance ledger: balances, duplicate detection, category cascades")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("owner")
                .long("user")
                .value_name("LOGIN")
                .global(true)
                .default_value("default")
                .help("Login of the ledger owner (created on first use)"),
        )
        .subcommand(Command::new("init").about("Create the database if needed"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(Command::new("add").arg(req("login", "User login")))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("access")
                .about("Manage bank connections")
                .subcommand(
                    Command::new("add")
                        .arg(req("vendor", "Bank connector name"))
                        .arg(req("login", "Login at the bank"))
                        .arg(opt("label", "Display label")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm")
                        .about("Delete an access with its accounts and transactions")
                        .arg(req("id", "Access id").value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts and balances")
                .subcommand(
                    Command::new("add")
                        .arg(req("access", "Owning access id").value_parser(value_parser!(i64)))
                        .arg(req("label", "Account label"))
                        .arg(req("type", "Account type (checking, savings, card, loan, market)"))
                        .arg(opt("currency", "ISO currency code, defaults to the default-currency setting"))
                        .arg(opt("initial-balance", "Balance at import date")
                                .default_value("0")
                                .allow_negative_numbers(true))
                        .arg(opt("import-date", "YYYY-MM-DD, defaults to today")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(req("label", "Account label")))
                .subcommand(json_flags(
                    Command::new("balance")
                        .about("Show balances and outstanding sums")
                        .arg(opt("account", "Restrict to one account label")),
                ))
                .subcommand(
                    Command::new("recompute")
                        .about("Force a balance recompute")
                        .arg(req("account", "Account label")),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(req("label", "Category label"))
                        .arg(opt("color", "Display color, e.g. #ff8800")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm")
                        .about("Delete a category, moving its transactions")
                        .arg(req("label", "Category label"))
                        .arg(opt(
                            "replace-with",
                            "Category receiving the transactions; omit to leave them uncategorized",
                        )),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly category thresholds")
                .subcommand(
                    Command::new("set")
                        .arg(req("month", "YYYY-MM"))
                        .arg(req("category", "Category label"))
                        .arg(req("amount", "Threshold").allow_negative_numbers(true)),
                )
                .subcommand(Command::new("list").arg(opt("month", "YYYY-MM"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .arg(req("date", "YYYY-MM-DD[ HH:MM[:SS]]"))
                        .arg(opt("debit-date", "Date the bank debits it, if later; YYYY-MM-DD[ HH:MM[:SS]]"))
                        .arg(req("account", "Account label"))
                        .arg(req("amount", "Signed amount").allow_negative_numbers(true))
                        .arg(req("label", "Label"))
                        .arg(opt("category", "Category label"))
                        .arg(opt("custom-label", "Your own label"))
                        .arg(opt("type", "Transaction type").default_value("unknown"))
                        .arg(
                            Arg::new("pending")
                                .long("pending")
                                .action(ArgAction::SetTrue)
                                .help("Not yet settled"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(opt("account", "Account label"))
                        .arg(opt("category", "Category label"))
                        .arg(opt("limit", "Max rows").value_parser(value_parser!(usize))),
                ))
                .subcommand(
                    Command::new("categorize")
                        .arg(req("id", "Transaction id").value_parser(value_parser!(i64)))
                        .arg(opt("category", "Category label; omit for none")),
                )
                .subcommand(
                    Command::new("label")
                        .arg(req("id", "Transaction id").value_parser(value_parser!(i64)))
                        .arg(opt("custom-label", "New custom label; omit to clear")),
                )
                .subcommand(
                    Command::new("redate")
                        .about("Change the date of a manually created transaction")
                        .arg(req("id", "Transaction id").value_parser(value_parser!(i64)))
                        .arg(req("date", "YYYY-MM-DD[ HH:MM[:SS]]")),
                ),
        )
        .subcommand(
            Command::new("duplicates")
                .about("Duplicate candidates")
                .subcommand(json_flags(
                    Command::new("find").arg(opt("account", "Account label")),
                ))
                .subcommand(
                    Command::new("dismiss")
                        .about("Mark a pair as not a duplicate")
                        .arg(req("first", "Transaction id").value_parser(value_parser!(i64)))
                        .arg(req("second", "Transaction id").value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("rules")
                .about("Categorization rules applied on import")
                .subcommand(
                    Command::new("add")
                        .arg(req("pattern", "Regex matched against label and memo"))
                        .arg(opt("category", "Category label"))
                        .arg(opt("label-rewrite", "Replacement label")),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(req("id", "Rule id"))),
        )
        .subcommand(
            Command::new("import")
                .about("Import data")
                .subcommand(
                    Command::new("transactions")
                        .arg(req("path", "CSV file: date,label,amount,category,account,type,pending,custom_label,debit_date")),
                ),
        )
        .subcommand(
            Command::new("settings")
                .about("Per-user settings")
                .subcommand(Command::new("get").arg(opt("key", "Setting key; omit for all")))
                .subcommand(
                    Command::new("set")
                        .arg(req("key", "Setting key"))
                        .arg(req("value", "New value").allow_hyphen_values(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Report ledger consistency problems"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        build_cli().debug_assert();
    }
}
