use std::{env, env::VarError};

/// There's no real CLI for the service, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print. A database URL can carry credentials, so it is left out
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "LPS_DB_MAX_CONNECTIONS",
        "LPS_RUN_MIGRATIONS",
        "LPS_ACCRUAL_ADDRESS",
        "ACCRUAL_SYSTEM_ADDRESS",
        "LPS_ACCRUAL_TIMEOUT_MS",
        "LPS_SYNC_DISPATCH_INTERVAL_MS",
        "LPS_SYNC_MAX_WORKERS",
        "LPS_SYNC_MAX_ATTEMPTS",
        "LPS_SYNC_RETRY_DELAY_MS",
        "LPS_SYNC_MAX_RETRY_DELAY_MS",
        "LPS_SYNC_POLL_DELAY_MS",
        "LPS_SYNC_UNKNOWN_ORDER_DELAY_MS",
        "LPS_SYNC_RESCAN_INTERVAL_SECS",
        "LPS_SHUTDOWN_GRACE_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that may contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
