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
    const DISPLAY_ENVS: [&str; 17] = [
        "RUST_LOG",
        "CCSHUB_HOST",
        "CCSHUB_PORT",
        "CCSHUB_DATABASE_URL",
        "CCSHUB_JWT_EXPIRATION_MS",
        "CCSHUB_OIDC_REGISTRATION_ID",
        "CCSHUB_OIDC_CLIENT_ID",
        "CCSHUB_OIDC_AUTHORIZATION_URI",
        "CCSHUB_OIDC_TOKEN_URI",
        "CCSHUB_OIDC_USER_INFO_URI",
        "CCSHUB_OIDC_END_SESSION_URI",
        "CCSHUB_OIDC_SCOPES",
        "CCSHUB_OIDC_REDIRECT_BASE",
        "CCSHUB_SECURE_COOKIES",
        "CCSHUB_FRONTEND_DEV_ORIGIN",
        "CCSHUB_FRONTEND_PROD_ORIGIN",
        "CCSHUB_FRONTEND_PROD_LOGOUT_ORIGIN",
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
