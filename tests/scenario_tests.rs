//! End-to-end classification scenarios
//!
//! Each test builds a small sequin reference in memory, streams a set of
//! called variants through the classifier and checks the resulting
//! confusion counts, detection limit and regression.

use std::collections::BTreeSet;

use sequin_qc::catalog::registry::{merge, AnnotationRecord};
use sequin_qc::core::locus::Locus;
use sequin_qc::core::variant::Variant;
use sequin_qc::matching::engine::classify_all;
use sequin_qc::matching::regression::{DetectionLimit, LinearAccumulator, LinearFit};
use sequin_qc::matching::scoring::Confusion;
use sequin_qc::{
    AnalysisConfig, DiscoverySummary, Mixture, ReferenceContext, RegistryBuilder, SequinId,
    SequinKind, VariantStore,
};

const SEQUIN_LENGTH: u64 = 1000;

/// One variant sequin per (reference, variant) concentration pair, each
/// carrying a single SNP at offset 100 of its region on `chrev1`
fn make_context(concentrations: &[(f64, f64)]) -> (ReferenceContext, Vec<Variant>) {
    let mut builder = RegistryBuilder::new(SequinKind::Variant);
    let mut catalogue = Vec::new();

    for (i, (reference, variant)) in concentrations.iter().enumerate() {
        let id = format!("D_1_{i}");
        let start = i as u64 * SEQUIN_LENGTH + 1;

        builder.add(format!("{id}_R"), SEQUIN_LENGTH, *reference, Mixture::MixA);
        builder.add(format!("{id}_V"), SEQUIN_LENGTH, *variant, Mixture::MixA);
        builder.add_annotation(AnnotationRecord {
            id: id.clone().into(),
            chrom: "chrev1".to_string(),
            locus: Locus::new(start, start + SEQUIN_LENGTH - 1),
        });
        catalogue.push(Variant::new("chrev1", start + 99, "A", "G").with_id(id));
    }

    let store: VariantStore = catalogue.iter().cloned().collect();
    let context = ReferenceContext::new(
        builder.build().unwrap(),
        store,
        vec!["chrev".to_string()],
    );
    (context, catalogue)
}

fn ids(names: &[&str]) -> BTreeSet<SequinId> {
    names.iter().map(|&n| SequinId::from(n)).collect()
}

fn query(catalogued: &Variant, ref_depth: u64, alt_depth: u64) -> Variant {
    Variant::new(
        catalogued.chrom.clone(),
        catalogued.locus.start,
        catalogued.reference.clone(),
        catalogued.alternate.clone(),
    )
    .with_depths(ref_depth, alt_depth)
}

#[test]
fn test_merge_law() {
    let m = ids(&["A", "B", "C"]);
    let a = ids(&["B", "C", "D"]);

    assert_eq!(merge(&m, &a).unwrap(), ids(&["B", "C"]));
    assert_eq!(merge(&BTreeSet::new(), &a).unwrap(), a);
    assert_eq!(merge(&m, &BTreeSet::new()).unwrap(), m);
    assert!(merge(&ids(&["A"]), &ids(&["B"])).is_err());
    assert!(merge(&BTreeSet::new(), &BTreeSet::new()).is_err());
}

#[test]
fn test_registry_drops_single_source_ids() {
    let mut builder = RegistryBuilder::new(SequinKind::Variant);
    builder.add("D_1_1_R", 500, 1.0, Mixture::MixA);
    builder.add("D_1_1_V", 500, 1.0, Mixture::MixA);
    builder.add("D_9_9_R", 500, 1.0, Mixture::MixA);
    builder.add_annotation(AnnotationRecord {
        id: "D_1_1".into(),
        chrom: "chrev1".to_string(),
        locus: Locus::new(1, 500),
    });
    builder.add_annotation(AnnotationRecord {
        id: "D_2_2".into(),
        chrom: "chrev1".to_string(),
        locus: Locus::new(501, 1000),
    });

    let registry = builder.build().unwrap();
    let validated: Vec<&str> = registry.ids().map(SequinId::as_str).collect();
    assert_eq!(validated, vec!["D_1_1"]);
    assert!(registry.lookup_by_id("D_9_9").is_none());
    assert!(registry.lookup_by_id("D_2_2").is_none());
}

#[test]
fn test_perfect_recall() {
    let (context, catalogue) = make_context(&[(1.0, 1.0), (3.0, 1.0), (7.0, 1.0)]);
    let queries = catalogue.iter().map(|v| Ok(query(v, 10, 10)));

    let stats = classify_all(&context, AnalysisConfig::default(), queries).unwrap();
    let total = stats.synthetic.total;
    assert_eq!(total.tp, total.nr);
    assert_eq!(total.nr, 3);
    assert_eq!(total.fp, 0);
    assert_eq!(total.fn_, 0);
    assert!((total.sensitivity() - 1.0).abs() < 1e-12);
}

#[test]
fn test_zero_overlap() {
    let (context, _) = make_context(&[(1.0, 1.0), (1.0, 1.0)]);
    let queries: Vec<_> = (0..5)
        .map(|i| Ok(Variant::new("chrev1", 10 + i, "C", "T")))
        .collect();

    let stats = classify_all(&context, AnalysisConfig::default(), queries).unwrap();
    let total = stats.synthetic.total;
    assert_eq!(total.tp, 0);
    assert_eq!(total.fp, 5);
    assert_eq!(total.fn_, total.nr);
    assert_eq!(total.nr, 2);
}

#[test]
fn test_partial_match() {
    let (context, catalogue) = make_context(&[(1.0, 1.0); 10]);

    let queries: Vec<_> = catalogue
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if i < 6 {
                Ok(query(v, 5, 5))
            } else {
                // Same position, different alternate allele
                Ok(Variant::new(v.chrom.clone(), v.locus.start, "A", "T"))
            }
        })
        .collect();

    let stats = classify_all(&context, AnalysisConfig::default(), queries).unwrap();
    let total = stats.synthetic.total;
    assert_eq!((total.tp, total.fp, total.fn_, total.nr), (6, 4, 4, 10));
    assert_eq!(stats.synthetic.snp, total);
    assert_eq!(stats.synthetic.indel, Confusion::default());
}

#[test]
fn test_confusion_law_holds_per_chromosome() {
    let (context, catalogue) = make_context(&[(1.0, 1.0), (3.0, 1.0), (7.0, 1.0), (15.0, 1.0)]);
    let queries = vec![
        Ok(query(&catalogue[0], 10, 10)),
        Ok(query(&catalogue[0], 12, 8)),
        Ok(Variant::new("chrev1", 50, "G", "GA")),
        Ok(query(&catalogue[3], 30, 2)),
    ];

    let stats = classify_all(&context, AnalysisConfig::default(), queries).unwrap();
    for chrom in stats.chroms.values() {
        for c in [chrom.confusion.total, chrom.confusion.snp, chrom.confusion.indel] {
            assert_eq!(c.tp + c.fn_, c.nr);
            assert!(c.nr >= c.fn_);
        }
    }
    assert_eq!(stats.synthetic.total.tp, 2);
    assert_eq!(stats.counters.repeated, 1);
}

#[test]
fn test_detection_limit() {
    let mut limit = DetectionLimit::default();
    limit.observe(&SequinId::from("S_high"), 2.0);
    limit.observe(&SequinId::from("S_low"), 0.5);

    assert_eq!(limit.abundance, Some(0.5));
    assert_eq!(limit.id, Some(SequinId::from("S_low")));
}

#[test]
fn test_detection_limit_from_classification() {
    // Expected allele frequencies 0.5, 0.25, 0.125
    let (context, catalogue) = make_context(&[(1.0, 1.0), (3.0, 1.0), (7.0, 1.0)]);
    let queries = vec![Ok(query(&catalogue[0], 10, 10)), Ok(query(&catalogue[1], 30, 10))];

    let stats = classify_all(&context, AnalysisConfig::default(), queries).unwrap();
    assert_eq!(stats.limit.abundance, Some(0.25));
    assert_eq!(stats.limit.id, Some(SequinId::from("D_1_1")));
}

#[test]
fn test_regression_identity() {
    let fit = LinearFit::fit(&[1.0, 2.0, 4.0], &[1.0, 2.0, 4.0]);
    assert!((fit.slope - 1.0).abs() < 1e-12);
    assert!((fit.r - 1.0).abs() < 1e-12);
    assert!((fit.r2 - 1.0).abs() < 1e-12);

    let mut accumulator = LinearAccumulator::new();
    for (i, value) in [2.0, 4.0, 16.0].into_iter().enumerate() {
        accumulator.add(SequinId::new(format!("S{i}")), value, value);
    }
    let log_fit = accumulator.fit_log2();
    assert_eq!(log_fit.n, 3);
    assert!((log_fit.slope - 1.0).abs() < 1e-12);
    assert!((log_fit.r2 - 1.0).abs() < 1e-12);
}

#[test]
fn test_summary_of_somatic_run() {
    let (context, catalogue) = make_context(&[(1.0, 1.0), (3.0, 1.0), (7.0, 1.0)]);
    let queries = catalogue.iter().zip([(10, 10), (30, 10), (70, 10)]).map(|(v, (r, a))| {
        Ok(query(v, r, a))
    });

    let stats = classify_all(&context, AnalysisConfig::default(), queries).unwrap();
    let summary = DiscoverySummary::new(&stats, &context);

    assert_eq!(summary.reference_synthetic.total, 3);
    assert_eq!(summary.synthetic.total.confusion.tp, 3);
    assert_eq!(summary.regression.total.n, 3);
    assert!((summary.regression.total.slope - 1.0).abs() < 1e-9);
    assert_eq!(summary.limit.abundance, Some(0.125));
}
