use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use crate::catalog::store::VariantStore;
use crate::catalog::ReferenceContext;
use crate::cli::reference::load_registry;
use crate::cli::{parse_mixture, OutputFormat};
use crate::core::types::{Mixture, Region, SequinKind};
use crate::matching::detection::{detected_records, sequin_records, write_records, DetectionRecord};
use crate::matching::engine::{AnalysisConfig, Classifier};
use crate::matching::regression::LinearFit;
use crate::matching::summary::{Accuracy, Design, DiscoverySummary, Sources, VariantCounts};
use crate::parsing::{self, vcf, InputFormat};

#[derive(Args)]
pub struct DiscoverArgs {
    /// Called variants (VCF, optionally gzipped, or the tabular call format)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Sequin coordinates (BED)
    #[arg(long)]
    pub annotation: Option<PathBuf>,

    /// Catalogued sequin variants (VCF)
    #[arg(long, required = true)]
    pub reference: PathBuf,

    /// Sequin concentrations per mixture (TSV/CSV)
    #[arg(long)]
    pub mixture: Option<PathBuf>,

    /// Kind of sequins described by the reference
    #[arg(long, value_enum, default_value = "variant")]
    pub kind: SequinKind,

    /// Input format (auto-detected from the file name by default)
    #[arg(long, value_enum)]
    pub input_format: Option<InputFormat>,

    /// Write one row per catalogued sequin variant (TP/FN) to this file
    #[arg(long)]
    pub sequins: Option<PathBuf>,

    /// Write one row per tracked called variant (TP/FP) to this file
    #[arg(long)]
    pub detected: Option<PathBuf>,

    /// Analysis configuration (JSON); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Prefix of the synthetic chromosome(s); may be repeated
    #[arg(long = "synthetic-prefix")]
    pub synthetic_prefixes: Vec<String>,

    /// Mixture used for expected allele frequencies
    #[arg(long, value_parser = parse_mixture)]
    pub primary_mixture: Option<Mixture>,
}

/// Execute discover subcommand
///
/// # Errors
///
/// Returns an error if any input cannot be read, the registry or catalogue is
/// empty, or an output file cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: DiscoverArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = load_config(&args)?;

    let registry = load_registry(
        args.annotation.as_deref(),
        args.mixture.as_deref(),
        args.kind,
        config.primary_mixture,
    )?;

    let catalogue: VariantStore = vcf::read_vcf_file(&args.reference)?
        .collect::<Result<_, _>>()
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.reference.display()))?;
    if catalogue.is_empty() {
        anyhow::bail!(
            "No catalogued variants found in {}",
            args.reference.display()
        );
    }

    if verbose {
        eprintln!(
            "Loaded {} sequins and {} catalogued variants",
            registry.len(),
            catalogue.len()
        );
    }

    let context = ReferenceContext::new(registry, catalogue, config.synthetic_prefixes.clone());

    let records = parsing::read_variants(&args.input, args.input_format)?;
    let mut classifier = Classifier::new(&context, config);
    classifier.run(records)?;
    let stats = classifier.finish();

    if verbose {
        for (chrom, chrom_stats) in stats.chromosomes_in(Region::Synthetic) {
            eprintln!(
                "{chrom}: detected {} of {} catalogued variants",
                chrom_stats.detected(),
                chrom_stats.histogram.len()
            );
        }
    }

    let sequins = sequin_records(&stats, &context);
    if let Some(path) = &args.sequins {
        write_table(path, &sequins)?;
    }
    if let Some(path) = &args.detected {
        write_table(path, &detected_records(&stats, &context))?;
    }

    let summary = DiscoverySummary::new(&stats, &context).with_sources(Sources {
        reference: Some(args.reference.display().to_string()),
        annotation: args.annotation.as_ref().map(|p| p.display().to_string()),
        mixture: args.mixture.as_ref().map(|p| p.display().to_string()),
        query: Some(args.input.display().to_string()),
    });

    match format {
        OutputFormat::Text => print_text(&summary),
        OutputFormat::Json => println!("{}", summary.to_json()?),
        OutputFormat::Tsv => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_records(&mut out, &sequins)?;
            out.flush()?;
        }
    }

    Ok(())
}

fn load_config(args: &DiscoverArgs) -> anyhow::Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            AnalysisConfig::from_json(&text)
                .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    if !args.synthetic_prefixes.is_empty() {
        config.synthetic_prefixes.clone_from(&args.synthetic_prefixes);
    }
    if let Some(mixture) = args.primary_mixture {
        config.primary_mixture = mixture;
    }

    Ok(config)
}

fn write_table(path: &Path, records: &[DetectionRecord]) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_records(&mut writer, records)?;
    writer.flush()?;
    info!(rows = records.len(), path = %path.display(), "Wrote table");
    Ok(())
}

fn print_counts(label: &str, counts: &VariantCounts) {
    println!(
        "   {label}: {} SNPs, {} indels, {} total",
        counts.snps, counts.indels, counts.total
    );
}

fn print_accuracy(label: &str, accuracy: &Accuracy) {
    let c = &accuracy.confusion;
    let m = &accuracy.metrics;
    println!(
        "   {label:<6} TP {:>5}  FP {:>5}  FN {:>5}  Sn {:.4}  Pc {:.4}  F1 {:.4}  FDR {:.4}",
        c.tp, c.fp, c.fn_, m.sensitivity, m.precision, m.f1, m.fdr
    );
}

fn print_fit(label: &str, fit: &LinearFit) {
    println!("   {label} (n = {})", fit.n);
    println!("      Slope:       {:.4}", fit.slope);
    println!("      Correlation: {:.4}", fit.r);
    println!("      R2:          {:.4}", fit.r2);
    println!("      F-statistic: {:.4}", fit.f);
    println!("      P-value:     {:.4e}", fit.p);
    println!("      SSM: {:.4}, DF: {}", fit.ssm, fit.ssm_df);
    println!("      SSE: {:.4}, DF: {}", fit.sse, fit.sse_df);
    println!("      SST: {:.4}, DF: {}", fit.sst, fit.sst_df);
}

fn print_text(summary: &DiscoverySummary) {
    let source = |s: &Option<String>| s.clone().unwrap_or_else(|| "-".to_string());

    println!("sequin-qc {} ({})", summary.version, summary.created_at);
    println!("Called variants: {}", source(&summary.sources.query));
    println!("Reference variants: {}", source(&summary.sources.reference));
    println!("Reference annotation: {}", source(&summary.sources.annotation));
    println!("Reference mixture: {}", source(&summary.sources.mixture));
    println!();

    println!("Reference variants");
    print_counts("Synthetic", &summary.reference_synthetic);
    print_counts("Genomic", &summary.reference_genomic);
    println!();

    println!("Called variants");
    print_counts("Synthetic", &summary.query_synthetic);
    print_counts("Genomic", &summary.query_genomic);
    println!();

    println!("Synthetic accuracy");
    print_accuracy("Total", &summary.synthetic.total);
    print_accuracy("SNP", &summary.synthetic.snp);
    print_accuracy("Indel", &summary.synthetic.indel);
    println!();

    if summary.reference_genomic.total > 0 {
        println!("Genomic accuracy");
        print_accuracy("Total", &summary.genomic.total);
        print_accuracy("SNP", &summary.genomic.snp);
        print_accuracy("Indel", &summary.genomic.indel);
        println!();
    }

    if summary.design == Design::Somatic {
        match (&summary.limit.id, summary.limit.abundance) {
            (Some(id), Some(abundance)) => {
                println!("Detection Sensitivity: {abundance:.4} ({id})");
            }
            _ => println!("Detection Sensitivity: NA"),
        }
        println!();

        println!("Log2 regression of observed on expected allele frequency");
        print_fit("Total", &summary.regression.total);
        print_fit("SNP", &summary.regression.snp);
        print_fit("Indel", &summary.regression.indel);
        println!();
    }

    let c = &summary.counters;
    println!(
        "Processed {} records ({} synthetic, {} genomic, {} untracked, {} skipped)",
        c.processed, c.synthetic, c.genomic, c.untracked, c.skipped
    );
}
