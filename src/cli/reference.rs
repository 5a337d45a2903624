use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use crate::catalog::registry::{ReferenceRegistry, RegistryBuilder};
use crate::cli::{parse_mixture, OutputFormat};
use crate::core::sequin::SequinData;
use crate::core::types::{Mixture, SequinKind};
use crate::parsing::{bed, mixture};
use crate::utils::validation::format_na;

#[derive(Args)]
pub struct ReferenceArgs {
    /// Sequin coordinates (BED)
    #[arg(long)]
    pub annotation: Option<PathBuf>,

    /// Sequin concentrations per mixture (TSV/CSV)
    #[arg(long)]
    pub mixture: Option<PathBuf>,

    /// Kind of sequins described by the reference
    #[arg(long, value_enum, default_value = "variant")]
    pub kind: SequinKind,

    /// Mixture used for allele frequencies
    #[arg(long, default_value = "A", value_parser = parse_mixture)]
    pub primary_mixture: Mixture,
}

/// Merge an annotation and a mixture table into a validated registry
///
/// # Errors
///
/// Returns an error if neither source is given, a file cannot be parsed, or
/// no sequin survives the merge.
pub fn load_registry(
    annotation_path: Option<&Path>,
    mixture_path: Option<&Path>,
    kind: SequinKind,
    primary: Mixture,
) -> anyhow::Result<ReferenceRegistry> {
    if annotation_path.is_none() && mixture_path.is_none() {
        anyhow::bail!("At least one of --annotation or --mixture is required");
    }

    let mut builder = RegistryBuilder::new(kind).with_primary_mixture(primary);

    if let Some(path) = annotation_path {
        let records = bed::parse_bed_file(path)?;
        info!(regions = records.len(), path = %path.display(), "Loaded annotation");
        for record in records {
            builder.add_annotation(record);
        }
    }

    if let Some(path) = mixture_path {
        let records = mixture::parse_mixture_file(path)?;
        info!(records = records.len(), path = %path.display(), "Loaded mixture");
        for record in records {
            builder.add_mixture_record(record);
        }
    }

    Ok(builder.build()?)
}

/// Execute reference subcommand
///
/// # Errors
///
/// Returns an error if the registry cannot be built.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ReferenceArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = load_registry(
        args.annotation.as_deref(),
        args.mixture.as_deref(),
        args.kind,
        args.primary_mixture,
    )?;

    if verbose {
        eprintln!(
            "Validated {} sequins on {} chromosomes",
            registry.len(),
            registry.index().chromosomes().count()
        );
    }

    match format {
        OutputFormat::Text => print_text(&registry),
        OutputFormat::Json => print_json(&registry)?,
        OutputFormat::Tsv => print_tsv(&registry),
    }

    Ok(())
}

fn allele_frequency(registry: &ReferenceRegistry, sequin: &SequinData) -> f64 {
    registry
        .find_allele_frequency(sequin.id.as_str())
        .unwrap_or(f64::NAN)
}

fn concentrations(sequin: &SequinData) -> String {
    if sequin.mixes.is_empty() {
        return "-".to_string();
    }
    sequin
        .mixes
        .iter()
        .map(|(mixture, concentration)| format!("{mixture}={concentration}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_text(registry: &ReferenceRegistry) {
    println!(
        "{} sequins ({:?}, primary mixture {})",
        registry.len(),
        registry.kind(),
        registry.primary_mixture()
    );
    if registry.kind() == SequinKind::Variant {
        let design = if registry.is_germline_design() {
            "germline"
        } else {
            "somatic"
        };
        println!("Design: {design}");
    }
    for chrom in registry.index().chromosomes() {
        println!("{chrom}: {} bases covered", registry.index().covered_bases(chrom));
    }
    println!();

    for sequin in registry.iter() {
        println!("{}", sequin.id);
        println!("   Locus: {}:{}", sequin.chrom, sequin.locus);
        println!("   Length: {}", sequin.length);
        println!("   Concentration: {}", concentrations(sequin));
        let frequency = allele_frequency(registry, sequin);
        if !frequency.is_nan() {
            println!("   Allele frequency: {frequency:.4}");
        }
    }
}

fn print_json(registry: &ReferenceRegistry) -> anyhow::Result<()> {
    let sequins: Vec<serde_json::Value> = registry
        .iter()
        .map(|s| {
            let frequency = allele_frequency(registry, s);
            let frequency = (!frequency.is_nan()).then_some(frequency);
            serde_json::json!({
                "id": s.id,
                "chrom": s.chrom,
                "start": s.locus.start,
                "end": s.locus.end,
                "length": s.length,
                "mixes": s.mixes,
                "alleles": s.alleles,
                "allele_frequency": frequency,
                "abundance": s.abundance(registry.primary_mixture()),
            })
        })
        .collect();

    let output = serde_json::json!({
        "kind": registry.kind(),
        "primary_mixture": registry.primary_mixture(),
        "germline": registry.is_germline_design(),
        "sequins": sequins,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(registry: &ReferenceRegistry) {
    let mixtures = [Mixture::MixA, Mixture::MixB, Mixture::MixF, Mixture::MixG];
    let used: Vec<Mixture> = mixtures
        .into_iter()
        .filter(|m| registry.iter().any(|s| s.mixes.contains_key(m)))
        .collect();

    let mut header = vec![
        "id".to_string(),
        "chrom".to_string(),
        "start".to_string(),
        "end".to_string(),
        "length".to_string(),
    ];
    header.extend(used.iter().map(ToString::to_string));
    header.push("allele_frequency".to_string());
    println!("{}", header.join("\t"));

    for sequin in registry.iter() {
        let mut row = vec![
            sequin.id.to_string(),
            sequin.chrom.clone(),
            sequin.locus.start.to_string(),
            sequin.locus.end.to_string(),
            sequin.length.to_string(),
        ];
        row.extend(
            used.iter()
                .map(|m| format_na(sequin.concentration(*m).unwrap_or(f64::NAN))),
        );
        row.push(format_na(allele_frequency(registry, sequin)));
        println!("{}", row.join("\t"));
    }
}
