use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use escrow_crypto::{Keypair, TransitionSigner};
use escrow_ledger::{InMemoryLedger, SettlementEvent};
use escrow_protocol::LedgerService;
use escrow_sdk::EscrowCoordinator;
use escrow_types::{EscrowRecord, Identity};

use crate::cli::*;
use crate::config::CliConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Keygen(args) => cmd_keygen(args, format),
        Command::Derive(args) => cmd_derive(args, &config, format),
        Command::Decode(args) => cmd_decode(args, format),
        Command::Simulate(args) => cmd_simulate(args, &config, format).await,
    }
}

fn print_json(value: serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn record_json(record: &EscrowRecord) -> serde_json::Value {
    json!({
        "initializer": record.initializer().to_hex(),
        "taker": record.taker().to_hex(),
        "amount": record.amount(),
    })
}

fn event_json(event: &SettlementEvent) -> serde_json::Value {
    json!({
        "seq": event.seq,
        "tx": event.tx_id.to_string(),
        "kind": event.kind.to_string(),
        "address": event.address.to_hex(),
        "actor": event.actor.to_hex(),
        "amount": event.amount,
    })
}

fn cmd_keygen(args: KeygenArgs, format: OutputFormat) -> anyhow::Result<()> {
    let keypair = Keypair::generate();
    let identity = keypair.identity();
    let secret = args.show_secret.then(|| hex::encode(keypair.secret_bytes()));
    match format {
        OutputFormat::Json => print_json(json!({
            "identity": identity.to_hex(),
            "secret": secret,
        })),
        OutputFormat::Text => {
            println!("{} Generated identity", "✓".green().bold());
            println!("  Identity: {}", identity.to_hex().cyan());
            if let Some(secret) = secret {
                println!("  Secret:   {}", secret.red());
                println!("  {}", "Keep the secret offline; anyone holding it can sign as you.".dimmed());
            }
            Ok(())
        }
    }
}

fn cmd_derive(args: DeriveArgs, config: &CliConfig, format: OutputFormat) -> anyhow::Result<()> {
    let text = args.initializer.trim();
    let text = text.strip_prefix(Identity::PREFIX).unwrap_or(text);
    let bytes = hex::decode(text).context("initializer is not valid hex")?;
    let deriver = config.client.deriver()?;
    let (address, bump) = deriver.derive(&bytes)?;
    match format {
        OutputFormat::Json => print_json(json!({
            "initializer": hex::encode(&bytes),
            "address": address.to_hex(),
            "bump": bump.value(),
            "label": String::from_utf8_lossy(deriver.label()),
        })),
        OutputFormat::Text => {
            println!("Escrow slot for {}", hex::encode(&bytes).cyan());
            println!("  Address: {}", address.to_string().yellow().bold());
            println!("  Bump:    {}", bump);
            Ok(())
        }
    }
}

fn cmd_decode(args: DecodeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = hex::decode(args.hex.trim()).context("record is not valid hex")?;
    let record = EscrowRecord::decode(&bytes).context("malformed record")?;
    match format {
        OutputFormat::Json => print_json(record_json(&record)),
        OutputFormat::Text => {
            println!("Escrow record ({} bytes)", bytes.len());
            println!("  Initializer: {}", record.initializer().to_hex().cyan());
            println!("  Taker:       {}", record.taker().to_hex().cyan());
            println!("  Amount:      {}", record.amount().to_string().bold());
            Ok(())
        }
    }
}

async fn cmd_simulate(args: SimulateArgs, config: &CliConfig, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = Arc::new(InMemoryLedger::new(config.ledger.clone(), config.client.deriver()?));
    let (transport, service) = LedgerService::spawn(Arc::clone(&ledger), 16);
    let coordinator = EscrowCoordinator::with_config(transport, &config.client)?;

    let initializer = Keypair::generate();
    let taker = Keypair::generate();
    let overhead = config.ledger.record_overhead();
    let funding = args
        .amount
        .checked_add(overhead)
        .context("amount plus storage overhead overflows")?;
    ledger.airdrop(&initializer.identity(), funding)?;

    let address = coordinator
        .initialize(&initializer, &taker.identity().to_string(), args.amount)
        .await?;
    let record = coordinator
        .lookup_by_initializer(&initializer.identity())
        .await?;
    let custody = ledger.custody(&address)?.unwrap_or_default();
    match args.settle {
        Settle::Claim => coordinator.claim(&address, &taker).await?,
        Settle::Cancel => coordinator.cancel(&address, &initializer).await?,
    }
    let after = coordinator.find(&address).await?;

    drop(coordinator);
    service.await.context("ledger service task failed")?;

    let history = ledger.history(&address)?;
    let settled = ledger.settlement_of(&address)?;
    let initializer_balance = ledger.balance(&initializer.identity())?;
    let taker_balance = ledger.balance(&taker.identity())?;

    match format {
        OutputFormat::Json => print_json(json!({
            "address": address.to_hex(),
            "record": record_json(&record),
            "overhead": overhead,
            "custody": custody,
            "active_after": after.is_some(),
            "settled_by": settled.map(|kind| kind.to_string()),
            "journal": history.iter().map(event_json).collect::<Vec<_>>(),
            "balances": {
                "initializer": initializer_balance,
                "taker": taker_balance,
            },
        })),
        OutputFormat::Text => {
            println!("{} Escrow opened at {}", "✓".green().bold(), address.to_string().yellow());
            println!("  Initializer: {}", record.initializer().short_id().cyan());
            println!("  Taker:       {}", record.taker().short_id().cyan());
            println!("  Amount:      {} (+{} storage overhead)", record.amount().to_string().bold(), overhead);
            println!("  Custody:     {}", custody);
            println!();
            println!("Journal:");
            for event in &history {
                println!(
                    "  #{} {:<9} by {} amount {}  {}",
                    event.seq,
                    event.kind.to_string().green(),
                    event.actor.short_id(),
                    event.amount,
                    event.tx_id.to_string().dimmed(),
                );
            }
            println!();
            let status = match settled {
                Some(kind) if after.is_none() => kind.to_string().green(),
                _ => "active".red(),
            };
            println!("Record after settlement: {}", status);
            println!("  Initializer balance: {}", initializer_balance);
            println!("  Taker balance:       {}", taker_balance);
            Ok(())
        }
    }
}
