use std::env;
use std::fs;

use anyhow::{bail, Context};
use payum_token::{
    GatewayTokenFactory, MemoryTokenStorage, PlainUrlGenerator, QueryParams,
    SimpleStorageRegistry, Token, TokenPaths, UrlTokenFactory,
};

const DEFAULT_BASE_URL: &str = "http://localhost";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!(
            "Usage: {} <payment-name> <capture|authorize|refund|cancel|payout|notify|sync> [after-url]",
            args[0]
        );
        return Ok(());
    }

    let payment_name = &args[1];
    let action = args[2].as_str();
    let after_path = args.get(3).map(String::as_str);

    let base_url = env::var("PAYUM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let paths = match env::var("PAYUM_TOKEN_PATHS") {
        Ok(file) => {
            let content =
                fs::read_to_string(&file).with_context(|| format!("Error reading {}", file))?;
            serde_json::from_str(&content).with_context(|| format!("Error parsing {}", file))?
        }
        Err(_) => TokenPaths::default(),
    };

    let factory = GatewayTokenFactory::new(
        UrlTokenFactory::new(
            MemoryTokenStorage::new(),
            SimpleStorageRegistry::new(),
            PlainUrlGenerator::with_base_url(base_url),
        ),
        paths,
    );

    let after = after_path.map(|path| (path, QueryParams::new()));
    let token: Token = match (action, after_path) {
        ("capture", Some(path)) => {
            factory.create_capture_token(payment_name, None, path, QueryParams::new())?
        }
        ("authorize", Some(path)) => {
            factory.create_authorize_token(payment_name, None, path, QueryParams::new())?
        }
        ("capture" | "authorize", None) => bail!("Action {} requires an after url", action),
        ("refund", _) => factory.create_refund_token(payment_name, None, after)?,
        ("cancel", _) => factory.create_cancel_token(payment_name, None, after)?,
        ("payout", _) => factory.create_payout_token(payment_name, None, after)?,
        ("notify", _) => factory.create_notify_token(payment_name, None)?,
        ("sync", _) => factory.create_sync_token(payment_name, None)?,
        (other, _) => bail!("Unknown action {}", other),
    };

    println!("{}", serde_json::to_string_pretty(&token)?);
    Ok(())
}
