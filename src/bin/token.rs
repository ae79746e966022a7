//! covert-auth token inspection tool
//!
//! Usage: covert-auth-token [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>  Build a random field and session ticket from a client config
//!   -k, --keygen         Generate a static key pair and a matching client config
//!   -h, --help           Print help information

use std::env;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};

use covert_auth::auth::{
    make_random_field, make_session_ticket, unix_seconds, verify_random_field, AuthConfig,
    SessionContext, SystemClock, UID_SIZE,
};
use covert_auth::crypto::{random_bytes, OsEntropy, PublicKey, StaticSecret};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; RUST_LOG overrides the default level (e.g. RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "-h" | "--help" => {
            print_usage();
        }
        "-k" | "--keygen" => {
            generate_keys()?;
        }
        "-c" | "--config" => {
            if args.len() < 3 {
                eprintln!("Error: --config requires a file path");
                return Ok(());
            }
            build_tokens(&args[2])?;
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
        }
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"covert-auth-token - build disguised ClientHello authentication tokens

USAGE:
    covert-auth-token [OPTIONS]

OPTIONS:
    -c, --config <FILE>  Build a random field and session ticket from a client config
    -k, --keygen         Generate a static key pair and a matching client config
    -h, --help           Print help information

CONFIGURATION FILE FORMAT (JSON):
    {{
        "uid": "<base64, 16 bytes>",
        "public_key": "<base64, 32 bytes>",
        "proxy_method": "shadowsocks",
        "encryption_method": "aes-gcm",
        "ticket_time_hint": 3600
    }}

EXAMPLES:
    Generate keys and a client config:
        covert-auth-token --keygen > client.json

    Print tokens for the current time:
        covert-auth-token --config client.json
"#
    );
}

fn generate_keys() -> anyhow::Result<()> {
    let secret = StaticSecret::generate(&OsEntropy)?;
    let public = PublicKey::from(&secret);
    let uid: [u8; UID_SIZE] = random_bytes(&OsEntropy)?;

    let config = AuthConfig::new(uid, public.to_bytes(), "shadowsocks");

    eprintln!(
        "# Static private key (base64, keep on the server): {}",
        STANDARD.encode(secret.to_bytes())
    );
    eprintln!("# Static public key (base64): {}", STANDARD.encode(public.as_bytes()));
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn build_tokens(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    tracing::info!(
        proxy_method = %config.proxy_method,
        ticket_time_hint = config.ticket_time_hint,
        "building tokens"
    );

    let ctx = SessionContext::from_config(&config, Arc::new(OsEntropy))?;

    let random = make_random_field(&ctx)?;
    let ticket = make_session_ticket(&ctx)?;

    let now = unix_seconds(&SystemClock)?;
    match verify_random_field(&config.uid, &random, now) {
        Some(bucket) => tracing::info!(bucket, "random field verifies against uid"),
        None => anyhow::bail!("random field failed self-verification"),
    }

    println!("session_id:     {:08x}", ctx.session_id());
    println!("random:         {}", hex::encode(random));
    println!("session_ticket: {}", hex::encode(ticket));
    Ok(())
}

fn load_config(path: &str) -> anyhow::Result<AuthConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AuthConfig = serde_json::from_str(&content)?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}
