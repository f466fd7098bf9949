// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    )
}

fn window_args(cmd: Command) -> Command {
    cmd.arg(arg!(--tenant <TENANT> "Vendor / tenant identifier").required(true))
        .arg(arg!(--from <DATE> "First day of the window, YYYY-MM-DD").required(true))
        .arg(arg!(--to <DATE> "Last day of the window, YYYY-MM-DD").required(true))
}

pub fn build_cli() -> Command {
    Command::new("settleclip")
        .about("Vendor settlement reconciliation for marketplace bookings")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database if it does not exist"))
        .subcommand(
            Command::new("config")
                .about("Engine settings")
                .subcommand(Command::new("show").about("Show effective settings"))
                .subcommand(
                    Command::new("set")
                        .about("Change one setting")
                        .arg(arg!(--key <KEY> "currency, decimal_places or page_size").required(true))
                        .arg(arg!(--value <VALUE>).required(true)),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Load raw records from CSV")
                .subcommand(
                    Command::new("appointments")
                        .about("Import appointment service lines")
                        .arg(arg!(--path <CSV>).required(true)),
                )
                .subcommand(
                    Command::new("transfers")
                        .about("Import recorded transfers")
                        .arg(arg!(--path <CSV>).required(true)),
                ),
        )
        .subcommand(
            Command::new("transfer")
                .about("Recorded money movements between platform and vendor")
                .subcommand(
                    Command::new("add")
                        .about("Record one transfer")
                        .arg(arg!(--tenant <TENANT>).required(true))
                        .arg(
                            arg!(--"type" <TYPE> "payment_to_vendor or payment_to_admin")
                                .required(true),
                        )
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--date <DATE> "Payment date or RFC 3339 timestamp").required(true))
                        .arg(arg!(--method <METHOD> "Payment method").required(false))
                        .arg(arg!(--reference <TXN_ID> "Bank or gateway reference").required(false)),
                )
                .subcommand(json_flags(window_args(
                    Command::new("list").about("List transfers in a window"),
                ))),
        )
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand(json_flags(
                    window_args(Command::new("settlement").about("Settlement report for one vendor"))
                        .arg(arg!(--search <TEXT> "Filter lines by booking, service, method, mode or status").required(false))
                        .arg(
                            arg!(--page <N> "Page of lines to show, starting at 1")
                                .required(false)
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(
                            arg!(--"page-size" <N> "Lines per page")
                                .required(false)
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(json_flags(window_args(
            Command::new("doctor").about("List bookings that need operator review"),
        )))
}
