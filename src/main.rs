// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use ledgerclip::{cli, commands, db, logging, utils};

fn main() -> Result<()> {
    logging::init_tracing();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;
    let login = matches
        .get_one::<String>("owner")
        .context("missing --user")?;
    let user_id = utils::user_id_for_login(&conn, login)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("access", sub)) => commands::accesses::handle(&conn, user_id, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&mut conn, user_id, sub)?,
        Some(("category", sub)) => commands::categories::handle(&mut conn, user_id, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, user_id, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, user_id, sub)?,
        Some(("duplicates", sub)) => commands::duplicates::handle(&conn, user_id, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, user_id, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&conn, user_id, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn, user_id)?,
        Some(("rules", sub)) => commands::rules::handle(&conn, user_id, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
