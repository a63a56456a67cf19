use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use ballast_crypto::{chash160, UnitHasher};
use ballast_proof::{
    BallChainOutcome, BallChainVerifier, HistoryOutcome, LightHistory, LightHistoryVerifier,
    VerifierConfig, WitnessList, WitnessProof, WitnessProofOutcome, WitnessProofVerifier,
};
use ballast_types::{Address, BallHash, BallRecord, Definition, Joint, Unit, UnitHash};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cli::*;

const DEFAULT_CONFIG: &str = "ballast.toml";

/// Contents of `ballast.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// The client's witness list. Proof inputs never supply it.
    pub witnesses: Vec<Address>,
    /// Balls accepted as stable without proof.
    pub trusted_balls: Vec<BallHash>,
    pub verifier: VerifierConfig,
}

impl CliConfig {
    fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn load_witnesses(&mut self, path: &Path) -> anyhow::Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        self.witnesses = serde_json::from_str(&text)
            .with_context(|| format!("invalid witness list in {}", path.display()))?;
        debug!(path = %path.display(), "loaded witness list");
        Ok(())
    }

    fn witness_list(&self) -> anyhow::Result<WitnessList> {
        if self.witnesses.is_empty() {
            bail!("no witness list: set `witnesses` in {DEFAULT_CONFIG} or pass --witnesses");
        }
        Ok(WitnessList::new(self.witnesses.clone())?)
    }

    fn trusted(&self, extra: &[String]) -> anyhow::Result<BTreeSet<BallHash>> {
        let mut trusted: BTreeSet<BallHash> = self.trusted_balls.iter().cloned().collect();
        for ball in extra {
            trusted.insert(
                BallHash::from_base64(ball).with_context(|| format!("invalid trusted ball {ball}"))?,
            );
        }
        Ok(trusted)
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.witnesses {
        config.load_witnesses(path)?;
    }
    let format = cli.format;
    match cli.command {
        Command::UnitHash(args) => {
            let report = unit_hash_report(&read_input(&args.input)?)?;
            emit(format, &report, print_unit_hash)?;
            if !report.matches {
                bail!("declared unit hash does not match its content");
            }
            Ok(())
        }
        Command::Chash(args) => {
            let report = chash_report(read_input(&args.input)?)?;
            emit(format, &report, |r| println!("{}", r.chash.as_str().yellow().bold()))
        }
        Command::VerifyWitnessProof(args) => {
            let outcome = verify_witness_proof(&config, &read_input(&args.input)?)?;
            emit(format, &outcome, print_witness_proof)
        }
        Command::VerifyBallChain(args) => {
            let outcome = verify_ball_chain(&config, &read_input(&args.input)?, &args.trusted)?;
            emit(format, &outcome, print_ball_chain)
        }
        Command::VerifyHistory(args) => {
            let outcome = verify_history(&config, &read_input(&args.input)?, &args.trusted)?;
            emit(format, &outcome, print_history)
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<Value> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("cannot read stdin")?;
        text
    } else {
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl Fn(&T)) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct UnitHashReport {
    declared: UnitHash,
    computed: UnitHash,
    content_hash: UnitHash,
    matches: bool,
}

fn unit_hash_report(input: &Value) -> anyhow::Result<UnitHashReport> {
    let unit: Unit = if input.get("unit").is_some_and(Value::is_object) {
        serde_json::from_value::<Joint>(input.clone())?.unit
    } else {
        serde_json::from_value(input.clone())?
    };
    let computed = UnitHasher::unit_hash(&unit)?;
    Ok(UnitHashReport {
        matches: computed == unit.unit,
        content_hash: UnitHasher::content_hash(&unit)?,
        declared: unit.unit,
        computed,
    })
}

fn print_unit_hash(report: &UnitHashReport) {
    if report.matches {
        println!("{} {}", "✓".green().bold(), report.computed.as_str().yellow());
    } else {
        println!("{} hash mismatch", "✗".red().bold());
        println!("  Declared: {}", report.declared.as_str().yellow());
        println!("  Computed: {}", report.computed.as_str().yellow());
    }
    println!("  Content hash: {}", report.content_hash.as_str().dimmed());
}

#[derive(Debug, Serialize)]
struct ChashReport {
    chash: Address,
}

fn chash_report(input: Value) -> anyhow::Result<ChashReport> {
    let definition = Definition::try_from(input).context("input is not an address definition")?;
    Ok(ChashReport {
        chash: chash160(&definition)?,
    })
}

fn witness_verifier(config: &CliConfig) -> anyhow::Result<WitnessProofVerifier<'static>> {
    Ok(WitnessProofVerifier::new(
        config.witness_list()?,
        config.verifier.clone(),
    ))
}

fn verify_witness_proof(config: &CliConfig, input: &Value) -> anyhow::Result<WitnessProofOutcome> {
    let proof: WitnessProof = serde_json::from_value(input.clone()).context("malformed witness proof")?;
    let outcome = witness_verifier(config)?
        .verify(&proof)
        .context("witness proof rejected")?;
    Ok(outcome)
}

fn print_witness_proof(outcome: &WitnessProofOutcome) {
    println!("{} Witness proof verified", "✓".green().bold());
    println!("  Witnesses found: {}", outcome.found_witnesses.len().to_string().bold());
    println!("  Witness units: {}", outcome.witness_joints.len());
    println!("  Checkpoints: {}", outcome.checkpoints.len().to_string().bold());
    for (unit, ball) in &outcome.checkpoints {
        println!("    {} → {}", unit.as_str().yellow(), ball.as_str().cyan());
    }
}

fn ball_records(input: &Value) -> anyhow::Result<Vec<BallRecord>> {
    let records = match input.get("proofchain_balls") {
        Some(records) => records.clone(),
        None => input.clone(),
    };
    serde_json::from_value(records).context("malformed ball chain")
}

fn verify_ball_chain(
    config: &CliConfig,
    input: &Value,
    extra_trusted: &[String],
) -> anyhow::Result<BallChainOutcome> {
    let records = ball_records(input)?;
    let trusted = config.trusted(extra_trusted)?;
    BallChainVerifier::verify_chain(&records, &trusted).context("ball chain rejected")
}

fn print_ball_chain(outcome: &BallChainOutcome) {
    println!(
        "{} Ball chain verified ({} records)",
        "✓".green().bold(),
        outcome.records_verified
    );
    for (unit, ball) in &outcome.proven {
        let marker = if outcome.nonserial.contains(unit) { " (nonserial)" } else { "" };
        println!("  {} → {}{}", unit.as_str().yellow(), ball.as_str().cyan(), marker.red());
    }
}

fn verify_history(
    config: &CliConfig,
    input: &Value,
    extra_trusted: &[String],
) -> anyhow::Result<HistoryOutcome> {
    let history: LightHistory = serde_json::from_value(input.clone()).context("malformed light history")?;
    let verifier = LightHistoryVerifier::new(witness_verifier(config)?)
        .with_trusted_balls(config.trusted(extra_trusted)?);
    verifier.verify(&history).context("light history rejected")
}

fn print_history(outcome: &HistoryOutcome) {
    println!("{} Light history verified", "✓".green().bold());
    println!("  Checkpoints: {}", outcome.checkpoints().len());
    println!("  Proven balls: {}", outcome.proven_balls.len());
    for joint in &outcome.joints {
        let status = if joint.is_stable { "stable".green() } else { "unstable".yellow() };
        match &joint.ball {
            Some(ball) => println!("  {} {} {}", joint.unit.as_str().yellow(), status, ball.as_str().cyan()),
            None => println!("  {} {}", joint.unit.as_str().yellow(), status),
        }
    }
}

#[cfg(test)]
mod tests {
    use ballast_proof::SeedMode;
    use ballast_types::MciBound;

    use super::*;

    fn fixture_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../ballast-proof/tests/fixtures/light_history.json")
    }

    fn fixture() -> Value {
        read_input(&fixture_path()).unwrap()
    }

    /// Configuration holding the recorded mainnet witnesses.
    fn mainnet_config() -> CliConfig {
        CliConfig {
            witnesses: serde_json::from_value(fixture()["witnesses"].clone()).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn config_parses_all_sections() {
        let config = CliConfig::from_toml_str(
            r#"
            witnesses = []
            trusted_balls = ["lsC49OVxAU2d/Y7wr80LDPScq/MpNT8EuWLBQhXU514="]

            [verifier]
            seed = "ledger"
            allow_references = true
            "#,
        )
        .unwrap();
        assert_eq!(config.trusted_balls.len(), 1);
        assert_eq!(config.verifier.seed, SeedMode::Ledger);
        assert!(config.verifier.allow_references);
        assert_eq!(config.verifier.max_stable_mci, MciBound::Unbounded);
    }

    #[test]
    fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG);
        let config = CliConfig {
            trusted_balls: vec![BallHash::from_digest([5; 32])],
            verifier: VerifierConfig::ledger(77),
            ..Default::default()
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(CliConfig::load(Some(path.as_path())).unwrap(), config);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(dir.path().join("absent.toml").as_path())).is_err());
    }

    #[test]
    fn witnesses_come_from_configuration_only() {
        assert_eq!(mainnet_config().witness_list().unwrap().as_slice().len(), 12);
        // The fixture carries its own `witnesses`, which must not be used.
        assert!(CliConfig::default().witness_list().is_err());
        assert!(verify_history(&CliConfig::default(), &fixture(), &[]).is_err());
        assert!(verify_witness_proof(&CliConfig::default(), &fixture()).is_err());
    }

    #[test]
    fn witness_file_overrides_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("witnesses.json");
        std::fs::write(&path, fixture()["witnesses"].to_string()).unwrap();
        let mut config = CliConfig::default();
        config.load_witnesses(&path).unwrap();
        assert_eq!(config, mainnet_config());

        std::fs::write(&path, "[\"NOTANADDRESS\"]").unwrap();
        assert!(config.load_witnesses(&path).is_err());
    }

    #[test]
    fn unit_hash_accepts_joint_or_unit() {
        let input = fixture();
        let joint = &input["joints"][0];
        let from_joint = unit_hash_report(joint).unwrap();
        let from_unit = unit_hash_report(&joint["unit"]).unwrap();
        assert!(from_joint.matches);
        assert_eq!(from_joint.computed, from_unit.computed);
    }

    #[test]
    fn chash_of_witness_definition() {
        let input = fixture();
        let author = &input["witness_change_and_definition_joints"][0]["unit"]["authors"][0];
        let report = chash_report(author["definition"].clone()).unwrap();
        assert_eq!(report.chash.as_str(), author["address"].as_str().unwrap());
    }

    #[test]
    fn history_from_fixture() {
        let outcome = verify_history(&mainnet_config(), &fixture(), &[]).unwrap();
        assert_eq!(outcome.checkpoints().len(), 7);
        assert!(outcome.joints.iter().all(|j| j.is_stable));
    }

    #[test]
    fn ball_chain_needs_trust() {
        let input = fixture();
        assert!(verify_ball_chain(&CliConfig::default(), &input, &[]).is_err());
        let head = input["proofchain_balls"][0]["ball"].as_str().unwrap().to_string();
        let outcome = verify_ball_chain(&CliConfig::default(), &input, &[head]).unwrap();
        assert_eq!(outcome.records_verified, 8);
    }

    #[test]
    fn bad_trusted_ball_is_rejected() {
        assert!(CliConfig::default().trusted(&["nope".to_string()]).is_err());
    }
}
