use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "FSB_HOST",
        "FSB_PORT",
        "FSB_JWT_ALGORITHM",
        "FSB_SESSION_LIFETIME_MINUTES",
        "FSB_APPLE_CLIENT_ID",
        "FSB_APPLE_ISSUER",
        "FSB_APPLE_JWKS_URL",
        "FSB_PLAID_ENV",
        "FSB_PLAID_PRODUCTS",
        "FSB_PLAID_COUNTRY_CODES",
        "FSB_PLAID_CLIENT_NAME",
        "FSB_PLAID_LANGUAGE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
