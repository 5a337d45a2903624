//! Command-line tests
//!
//! Fixtures are written to a temporary directory: three variant sequins on
//! `chrev1` with expected allele frequencies 0.5, 0.25 and 0.125, and a call
//! set detecting the first two plus one false positive.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ANNOTATION: &str = "\
track name=sequins
chrev1\t0\t1000\tD_1_1
chrev1\t1000\t2000\tD_1_2
chrev1\t2000\t3000\tD_1_3
";

const MIXTURE: &str = "\
ID\tLength\tMix A
D_1_1_R\t1000\t1
D_1_1_V\t1000\t1
D_1_2_R\t1000\t3
D_1_2_V\t1000\t1
D_1_3_R\t1000\t7
D_1_3_V\t1000\t1
";

const REFERENCE: &str = "\
##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
chrev1\t100\tD_1_1\tA\tG\t.\tPASS\t.
chrev1\t1100\tD_1_2\tC\tT\t.\tPASS\t.
chrev1\t2100\tD_1_3\tGA\tG\t.\tPASS\t.
";

const CALLS: &str = "\
##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE
chrev1\t100\t.\tA\tG\t60\tPASS\tPVAL=0.001\tGT:AD\t0/1:50,50
chrev1\t1100\t.\tC\tT\t40\tPASS\tPVAL=0.01\tGT:AD\t0/1:75,25
chrev1\t1500\t.\tA\tC\t10\tPASS\tPVAL=0.2\tGT:AD\t0/1:90,10
chrUn\t10\t.\tA\tC\t10\tPASS\t.\tGT:AD\t0/1:5,5
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for (name, content) in [
            ("sequins.bed", ANNOTATION),
            ("mixture.tsv", MIXTURE),
            ("sequins.vcf", REFERENCE),
            ("calls.vcf", CALLS),
        ] {
            fs::write(dir.path().join(name), content).unwrap();
        }
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn discover(&self) -> Command {
        let mut cmd = Command::cargo_bin("sequin-qc").unwrap();
        cmd.arg("discover")
            .arg(self.path("calls.vcf"))
            .arg("--annotation")
            .arg(self.path("sequins.bed"))
            .arg("--mixture")
            .arg(self.path("mixture.tsv"))
            .arg("--reference")
            .arg(self.path("sequins.vcf"));
        cmd
    }
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

#[test]
fn test_discover_text_summary() {
    let fixture = Fixture::new();

    fixture
        .discover()
        .assert()
        .success()
        .stdout(predicate::str::contains("Synthetic accuracy"))
        .stdout(predicate::str::contains("TP     2"))
        .stdout(predicate::str::contains("Detection Sensitivity: 0.2500 (D_1_2)"))
        .stdout(predicate::str::contains("Log2 regression"));
}

#[test]
fn test_discover_json_summary() {
    let fixture = Fixture::new();

    let output = fixture
        .discover()
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let total = &summary["synthetic"]["total"];
    assert_eq!(total["tp"], 2);
    assert_eq!(total["fp"], 1);
    assert_eq!(total["fn"], 1);
    assert_eq!(total["nr"], 3);
    assert_eq!(summary["design"], "somatic");
    assert_eq!(summary["counters"]["untracked"], 1);
    assert_eq!(summary["limit"]["id"], "D_1_2");
    assert_eq!(summary["roc_score"], "p_value");
}

#[test]
fn test_discover_writes_tables() {
    let fixture = Fixture::new();
    let sequins = fixture.path("out_sequins.tsv");
    let detected = fixture.path("out_detected.tsv");

    fixture
        .discover()
        .arg("--sequins")
        .arg(&sequins)
        .arg("--detected")
        .arg(&detected)
        .assert()
        .success();

    let rows = read_rows(&sequins);
    assert_eq!(rows[0][0], "ID");
    assert_eq!(rows.len(), 4);
    let labels: Vec<&str> = rows[1..].iter().map(|r| r[3].as_str()).collect();
    assert_eq!(labels, vec!["TP", "TP", "FN"]);
    assert_eq!(rows[3][0], "D_1_3_2100_Deletion");
    assert_eq!(rows[3][4], "NA");

    let rows = read_rows(&detected);
    assert_eq!(rows.len(), 4);
    let fp = rows.iter().find(|r| r[3] == "FP").unwrap();
    assert_eq!(fp[0], "D_1_2");
    assert_eq!(fp[2], "1500");
}

#[test]
fn test_discover_tsv_prints_sequin_table() {
    let fixture = Fixture::new();

    fixture
        .discover()
        .args(["--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ID\tChrID\tPosition\tLabel"))
        .stdout(predicate::str::contains("D_1_1_100_SNP\tchrev1\t100\tTP\t50\t50\t100"));
}

#[test]
fn test_discover_synthetic_prefix_override() {
    let fixture = Fixture::new();

    let output = fixture
        .discover()
        .args(["--synthetic-prefix", "chrUn", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["counters"]["synthetic"], 1);
    assert_eq!(summary["synthetic"]["total"]["fp"], 1);
}

#[test]
fn test_discover_config_file() {
    let fixture = Fixture::new();
    let config = fixture.path("config.json");
    fs::write(&config, r#"{"synthetic_prefixes": ["chrev"], "primary_mixture": "MixA"}"#)
        .unwrap();

    fixture
        .discover()
        .arg("--config")
        .arg(&config)
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tp\": 2"));
}

#[test]
fn test_discover_fails_on_disjoint_reference() {
    let fixture = Fixture::new();
    fs::write(
        fixture.path("sequins.bed"),
        "chrev1\t0\t1000\tOTHER_1\n",
    )
    .unwrap();

    fixture
        .discover()
        .assert()
        .failure()
        .stderr(predicate::str::contains("No sequin found"));
}

#[test]
fn test_discover_requires_reference() {
    let fixture = Fixture::new();

    Command::cargo_bin("sequin-qc")
        .unwrap()
        .arg("discover")
        .arg(fixture.path("calls.vcf"))
        .arg("--annotation")
        .arg(fixture.path("sequins.bed"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--reference"));
}

#[test]
fn test_reference_listing() {
    let fixture = Fixture::new();

    Command::cargo_bin("sequin-qc")
        .unwrap()
        .arg("reference")
        .arg("--annotation")
        .arg(fixture.path("sequins.bed"))
        .arg("--mixture")
        .arg(fixture.path("mixture.tsv"))
        .args(["--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "id\tchrom\tstart\tend\tlength\tMixA\tallele_frequency",
        ))
        .stdout(predicate::str::contains("D_1_2\tchrev1\t1001\t2000\t1000\t4\t0.25"));
}

#[test]
fn test_reference_requires_a_source() {
    Command::cargo_bin("sequin-qc")
        .unwrap()
        .arg("reference")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--annotation or --mixture"));
}

#[test]
fn test_discover_verbose_reports_detection_per_chromosome() {
    let fixture = Fixture::new();

    fixture
        .discover()
        .arg("--verbose")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "chrev1: detected 2 of 3 catalogued variants",
        ));
}

#[test]
fn test_reference_text_reports_coverage() {
    let fixture = Fixture::new();

    Command::cargo_bin("sequin-qc")
        .unwrap()
        .arg("reference")
        .arg("--annotation")
        .arg(fixture.path("sequins.bed"))
        .arg("--mixture")
        .arg(fixture.path("mixture.tsv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("chrev1: 3000 bases covered"));
}

#[test]
fn test_reference_json_abundance() {
    let fixture = Fixture::new();

    let output = Command::cargo_bin("sequin-qc")
        .unwrap()
        .arg("reference")
        .arg("--annotation")
        .arg(fixture.path("sequins.bed"))
        .arg("--mixture")
        .arg(fixture.path("mixture.tsv"))
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let sequin = listing["sequins"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == "D_1_2")
        .unwrap();
    let abundance = sequin["abundance"].as_f64().unwrap();
    assert!((abundance - 0.004).abs() < 1e-12);
}
