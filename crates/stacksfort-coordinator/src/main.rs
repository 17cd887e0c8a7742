//! StacksFort signature coordinator CLI
//!
//! Hash proposals, sign and recover locally, and collect owner signatures into
//! a namespaced snapshot that persists between invocations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stacksfort_common::crypto::wallet::{address_of, parse_private_key, sign_hash};
use stacksfort_common::crypto::{classify, AddressClass};
use stacksfort_common::display::{
    abbreviate_address, format_relative_time, format_stx_amount, format_token_amount,
    format_transaction_kind,
};
use stacksfort_common::{
    Network, SignatureOrder, SignatureValidator, SignerSet, StacksAddress, TransactionKind,
    TransactionProposal, VERSION,
};
use stacksfort_coordinator::{
    Clock, ClockKind, Coordinator, CoordinatorConfig, ManualClock, SnapshotFile, SubmitOutcome,
    SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "stacksfort")]
#[command(about = "Collect and track owner signatures for StacksFort multisig vaults", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Storage namespace (overrides STACKSFORT_NAMESPACE)")]
    namespace: Option<String>,

    #[arg(long, global = true, help = "Snapshot directory (overrides STACKSFORT_DATA_DIR)")]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "mainnet or testnet (overrides STACKSFORT_NETWORK)")]
    network: Option<Network>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Print the canonical hash of a proposal")]
    Hash {
        #[arg(short, long, help = "Proposal JSON file")]
        proposal: PathBuf,
    },
    #[command(about = "Print the address controlled by a private key")]
    Address {
        #[arg(short = 'k', long, help = "Private key (hex, optional 01 suffix)")]
        private_key: String,
    },
    #[command(about = "Classify an address as mainnet, testnet or invalid")]
    Classify {
        #[arg(help = "Address to check")]
        address: String,
    },
    #[command(about = "Sign a proposal's canonical hash with a private key")]
    Sign {
        #[arg(short, long, help = "Proposal JSON file")]
        proposal: PathBuf,
        #[arg(short = 'k', long, help = "Private key (hex, optional 01 suffix)")]
        private_key: String,
    },
    #[command(about = "Recover the signer of a signature over a proposal")]
    Recover {
        #[arg(short, long, help = "Proposal JSON file")]
        proposal: PathBuf,
        #[arg(short, long, help = "Signature (130 hex characters)")]
        signature: String,
    },
    #[command(about = "Submit an owner signature for a proposal")]
    Submit {
        #[arg(short, long, help = "Proposal JSON file")]
        proposal: PathBuf,
        #[arg(long, help = "Signer set JSON file")]
        signers: PathBuf,
        #[arg(short, long, help = "Signature (130 hex characters)")]
        signature: String,
        #[arg(long, help = "Current time or block height for the expiration check")]
        now: Option<u64>,
    },
    #[command(about = "Show signing progress for a proposal")]
    Status {
        #[arg(short, long, help = "Proposal JSON file")]
        proposal: PathBuf,
        #[arg(long, help = "Signer set JSON file")]
        signers: PathBuf,
        #[arg(long, help = "Current time or block height for the expiration check")]
        now: Option<u64>,
        #[arg(long, help = "Print the summary as JSON", default_value_t = false)]
        json: bool,
    },
    #[command(about = "List stored signatures for a transaction")]
    List {
        #[arg(long, help = "Transaction id")]
        tx_id: u64,
        #[arg(long, default_value_t = SignatureOrder::Insertion, help = "insertion, asc or desc")]
        order: SignatureOrder,
    },
    #[command(about = "Check whether an address has signed a transaction")]
    HasSigned {
        #[arg(long, help = "Transaction id")]
        tx_id: u64,
        #[arg(long, help = "Signer address")]
        signer: StacksAddress,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let mut config = CoordinatorConfig::load()?;
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(network) = cli.network {
        config.network = network;
    }
    info!("StacksFort coordinator v{}", VERSION);
    debug!(?config, "Loaded configuration");

    match cli.command {
        Command::Hash { proposal } => {
            let proposal = read_proposal(&proposal).await?;
            println!("{}", stacksfort_common::crypto::hash(&proposal)?);
        }
        Command::Address { private_key } => {
            let key = parse_private_key(&private_key)?;
            println!("{}", address_of(&key, config.network));
        }
        Command::Classify { address } => match classify(&address) {
            AddressClass::Mainnet => println!("mainnet"),
            AddressClass::Testnet => println!("testnet"),
            AddressClass::Invalid => bail!("{address:?} is not a valid Stacks address"),
        },
        Command::Sign {
            proposal,
            private_key,
        } => {
            let proposal = read_proposal(&proposal).await?;
            let key = parse_private_key(&private_key)?;
            let hash = stacksfort_common::crypto::hash(&proposal)?;
            let signature = sign_hash(&key, &hash)?;
            println!("signer:    {}", address_of(&key, config.network));
            println!("hash:      {hash}");
            println!("signature: {signature}");
        }
        Command::Recover {
            proposal,
            signature,
        } => {
            let proposal = read_proposal(&proposal).await?;
            let hash = stacksfort_common::crypto::hash(&proposal)?;
            let signer = SignatureValidator::new(config.network).validate_hex(&hash, &signature)?;
            println!("{signer}");
        }
        Command::Submit {
            proposal,
            signers,
            signature,
            now,
        } => {
            let proposal = read_proposal(&proposal).await?;
            let signers = read_signers(&signers).await?;
            let snapshot = SnapshotFile::new(config.snapshot_path());
            let store = Arc::new(snapshot.load_store(&config.namespace).await?);
            let coordinator = Coordinator::new(Arc::clone(&store), clock_for(&config, now)?);

            let submission = coordinator.submit_signature_hex(&proposal, &signature, &signers)?;
            match submission.outcome {
                SubmitOutcome::Inserted => {
                    snapshot.save(store.as_ref()).await?;
                    println!(
                        "Signature from {} recorded for transaction #{}",
                        submission.signer, proposal.id
                    );
                }
                SubmitOutcome::AlreadyPresent => {
                    println!(
                        "{} has already signed transaction #{}",
                        submission.signer, proposal.id
                    );
                }
            }
            println!(
                "Status: {}",
                coordinator.get_status(&proposal, &signers)
            );
        }
        Command::Status {
            proposal,
            signers,
            now,
            json,
        } => {
            let proposal = read_proposal(&proposal).await?;
            let signers = read_signers(&signers).await?;
            let store = Arc::new(
                SnapshotFile::new(config.snapshot_path())
                    .load_store(&config.namespace)
                    .await?,
            );
            let coordinator = Coordinator::new(store, clock_for(&config, now)?);
            let summary = coordinator.summary(&proposal, &signers)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            let clock = coordinator.clock();
            println!(
                "Transaction #{} ({})",
                summary.id,
                format_transaction_kind(proposal.kind)
            );
            println!("  amount:     {}", format_amount(&proposal));
            println!("  recipient:  {}", abbreviate_address(&proposal.recipient, 4));
            if let Some(token) = &proposal.token {
                println!("  token:      {token}");
            }
            println!("  hash:       {}", summary.hash);
            println!("  status:     {}", summary.status);
            println!(
                "  signatures: {}/{}",
                summary.signatures.len(),
                summary.threshold
            );
            if summary.status.can_execute() && proposal.is_signable_at(clock.now()) {
                println!("  ready to execute");
            }
            if !summary.status.is_terminal() && !proposal.is_signable_at(clock.now()) {
                println!("  expired at: {}", proposal.expiration);
            }
            for record in &summary.signatures {
                println!(
                    "    {}  {}",
                    abbreviate_address(&record.signer.to_string(), 4),
                    format_relative_time(record.timestamp, clock.timestamp_millis())
                );
            }
            for address in &summary.awaiting {
                println!("    {}  awaiting", abbreviate_address(&address.to_string(), 4));
            }
        }
        Command::List { tx_id, order } => {
            let store = SnapshotFile::new(config.snapshot_path())
                .load_store(&config.namespace)
                .await?;
            let coordinator = Coordinator::new(Arc::new(store), SystemClock);
            let now_ms = coordinator.clock().timestamp_millis();
            for record in coordinator.get_signatures(tx_id, order) {
                println!(
                    "{}  {}  {}",
                    record.signer,
                    record.signature,
                    format_relative_time(record.timestamp, now_ms)
                );
            }
        }
        Command::HasSigned { tx_id, signer } => {
            let store = SnapshotFile::new(config.snapshot_path())
                .load_store(&config.namespace)
                .await?;
            let coordinator = Coordinator::new(Arc::new(store), SystemClock);
            println!("{}", coordinator.has_signed(tx_id, &signer));
        }
    }

    Ok(())
}

async fn read_proposal(path: &Path) -> Result<TransactionProposal> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading proposal {}", path.display()))?;
    Ok(TransactionProposal::from_json(&json)?)
}

async fn read_signers(path: &Path) -> Result<SignerSet> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading signer set {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing signer set {}", path.display()))
}

/// `--now` always wins; a block-height clock has no default
fn clock_for(config: &CoordinatorConfig, now: Option<u64>) -> Result<Arc<dyn Clock>> {
    match (now, config.clock) {
        (Some(now), _) => Ok(Arc::new(ManualClock::new(now))),
        (None, ClockKind::Unix) => Ok(Arc::new(SystemClock)),
        (None, ClockKind::BlockHeight) => {
            bail!("--now is required when STACKSFORT_CLOCK=block-height")
        }
    }
}

fn format_amount(proposal: &TransactionProposal) -> String {
    match proposal.kind {
        TransactionKind::NativeTransfer => format_stx_amount(proposal.amount),
        TransactionKind::TokenTransfer => format_token_amount(proposal.amount, 0),
    }
}
