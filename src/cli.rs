// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

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
            .help("Print as JSON lines"),
    )
}

fn user_arg() -> Arg {
    Arg::new("user").long("user").required(true).help("Username")
}

pub fn build_cli() -> Command {
    Command::new("pocketledger")
        .about("Personal-finance ledger with budgets, accounts, and investment tracking")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("email").long("email").required(true))
                        .arg(Arg::new("username").long("username").required(true))
                        .arg(Arg::new("password").long("password").required(true)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("account")
                .about("Manage cash accounts")
                .subcommand(
                    Command::new("add")
                        .arg(user_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(json_flags(Command::new("list").arg(user_arg())))
                .subcommand(
                    Command::new("rm")
                        .arg(user_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(
                    Command::new("use")
                        .about("Select the active account")
                        .arg(user_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage spending categories")
                .subcommand(
                    Command::new("add")
                        .arg(user_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list").arg(user_arg()))
                .subcommand(
                    Command::new("rm")
                        .arg(user_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and manage transactions")
                .subcommand(
                    Command::new("add")
                        .arg(user_arg())
                        .arg(Arg::new("account").long("account").help(
                            "Account name; defaults to the active account",
                        ))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(clap::value_parser!(i64)),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(Command::new("rm").arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ))
                .subcommand(
                    json_flags(Command::new("list"))
                        .arg(user_arg())
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(clap::value_parser!(usize)),
                        ),
                ),
        )
        .subcommand(
            Command::new("transfer")
                .about("Move funds between accounts")
                .arg(user_arg())
                .arg(Arg::new("from").long("from").required(true))
                .arg(Arg::new("to").long("to").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("date").long("date"))
                .arg(Arg::new("description").long("description"))
                .arg(
                    Arg::new("to-investment")
                        .long("to-investment")
                        .action(ArgAction::SetTrue)
                        .help("Treat --to as an investment account"),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Manage category budgets")
                .subcommand(
                    Command::new("set")
                        .arg(user_arg())
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(json_flags(Command::new("list").arg(user_arg()))),
        )
        .subcommand(
            Command::new("invest")
                .about("Investment accounts, assets, and trades")
                .subcommand(
                    Command::new("account")
                        .subcommand(
                            Command::new("add")
                                .arg(user_arg())
                                .arg(Arg::new("name").long("name").required(true)),
                        )
                        .subcommand(json_flags(Command::new("list").arg(user_arg())))
                        .subcommand(
                            Command::new("rm")
                                .arg(user_arg())
                                .arg(Arg::new("name").long("name").required(true)),
                        )
                        .subcommand(
                            Command::new("use")
                                .arg(user_arg())
                                .arg(Arg::new("name").long("name").required(true)),
                        ),
                )
                .subcommand(
                    Command::new("asset")
                        .subcommand(json_flags(Command::new("list")))
                        .subcommand(Command::new("rm").arg(
                            Arg::new("name").long("name").required(true),
                        )),
                )
                .subcommand(
                    json_flags(Command::new("positions"))
                        .arg(user_arg())
                        .arg(Arg::new("account").long("account")),
                )
                .subcommand(trade_cmd("buy"))
                .subcommand(trade_cmd("sell"))
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(clap::value_parser!(i64)),
                        )
                        .arg(Arg::new("quantity").long("quantity").required(true)),
                )
                .subcommand(Command::new("rm").arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ))
                .subcommand(
                    Command::new("price")
                        .subcommand(
                            Command::new("fetch")
                                .about("Pull daily closes from the market-data feed")
                                .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today")),
                        )
                        .subcommand(
                            Command::new("set")
                                .arg(Arg::new("asset").long("asset").required(true))
                                .arg(Arg::new("value").long("value").required(true)),
                        ),
                ),
        )
}

fn trade_cmd(name: &'static str) -> Command {
    Command::new(name)
        .arg(user_arg())
        .arg(Arg::new("account").long("account").help(
            "Investment account name; defaults to the active one",
        ))
        .arg(Arg::new("asset").long("asset").required(true))
        .arg(Arg::new("quantity").long("quantity").required(true))
        .arg(Arg::new("price").long("price").required(true))
        .arg(Arg::new("date").long("date"))
}
