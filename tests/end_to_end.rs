use projection_search::{search_projections, ArrayDataset, Dataset, Mode, Payload, SearchParams};

/// S1 — perfect classification box: a tight cluster on columns (0, 1)
/// gets isolated from background rows whose first coordinate never
/// enters the cluster's range, so the found box must have purity 1.0.
#[test]
fn perfect_classification_box_is_found_with_full_purity() {
    let mut features = Vec::new();
    let mut labels = Vec::new();

    // 15 rows tightly inside [0.2, 0.4] x [0.6, 0.8].
    for k in 0..15 {
        let x1 = 0.25 + (k as f64) * 0.006;
        let x2 = 0.65 + (k as f64) * 0.006;
        features.push(x1);
        features.push(x2);
        labels.push(1u32);
    }
    // 85 background rows whose x1 is always above 0.4, so they can never
    // satisfy the cluster's x1 range regardless of x2.
    for k in 0..85 {
        let x1 = 0.41 + (k as f64) * 0.0069;
        let x2 = ((k as f64) * 0.0111) % 1.0;
        features.push(x1);
        features.push(x2);
        labels.push(0u32);
    }

    let dataset = ArrayDataset::classification(features, 2, labels, 2);
    let params = SearchParams {
        bin_size: 5,
        support: 10,
        purity: 0.95,
        mode: Mode::LowVariance,
        num_threads: 1,
    };

    let outcome = search_projections(&dataset, params).unwrap();
    let boxes = outcome.feature_map.get(0, 1);
    assert_eq!(boxes.len(), 1, "expected exactly one surviving box in slot (0,1)");

    let found = &boxes[0];
    match &found.payload {
        Payload::Classification { class_label, pos, neg } => {
            assert_eq!(*class_label, 1);
            assert_eq!(*neg, 0, "box must be perfectly pure");
            assert!(*pos >= 10);
            assert_eq!(found.payload.purity().unwrap(), 1.0);
        }
        _ => panic!("expected a classification payload"),
    }
    assert!(found.att1_range.0 >= 0.2 && found.att1_range.1 <= 0.4);
    assert!(found.att2_range.0 >= 0.6 && found.att2_range.1 <= 0.8);
}

/// S2 — numeric low-variance: 50 rows with `x1` near zero carry a
/// near-constant output; the rest is spread widely. The best low-variance
/// box on (0, 1) should land on that cluster, with mean near 5 and SSE
/// far below what the spread background would contribute.
#[test]
fn numeric_low_variance_box_finds_the_planted_cluster() {
    let mut features = Vec::new();
    let mut targets = Vec::new();

    for k in 0..50 {
        let x1 = (k as f64) * 0.002; // [0, 0.098]
        let x2 = ((k as f64) * 0.031) % 1.0;
        let eps = if k % 2 == 0 { 0.01 } else { -0.01 };
        features.push(x1);
        features.push(x2);
        targets.push(5.0 + eps);
    }
    for k in 0..150 {
        let x1 = 0.2 + (k as f64) * 0.0053; // [0.2, ~0.995]
        let x2 = (((k + 50) as f64) * 0.031) % 1.0;
        features.push(x1);
        features.push(x2);
        targets.push((k as f64 * 0.137) % 10.0);
    }

    let dataset = ArrayDataset::numeric(features, 2, targets);
    let params = SearchParams {
        bin_size: 5,
        support: 20,
        purity: 0.5,
        mode: Mode::LowVariance,
        num_threads: 1,
    };

    let outcome = search_projections(&dataset, params).unwrap();
    let boxes = outcome.feature_map.get(0, 1);
    assert!(!boxes.is_empty(), "expected at least one box on (0,1)");

    let best = boxes
        .iter()
        .min_by(|a, b| {
            let sse = |p: &Payload| match p {
                Payload::Numeric { sum_sq_error, .. } => *sum_sq_error,
                _ => f64::INFINITY,
            };
            sse(&a.payload).partial_cmp(&sse(&b.payload)).unwrap()
        })
        .unwrap();

    match &best.payload {
        Payload::Numeric { total, mean, sum_sq_error } => {
            assert!(*total >= 20);
            assert!((*mean - 5.0).abs() < 0.5, "mean was {mean}");
            assert!(*sum_sq_error < 1.0, "sum_sq_error was {sum_sq_error}");
        }
        _ => panic!("expected a numeric payload"),
    }
}

/// S3 — tie handling: a column pinned to a single constant value never
/// contributes a usable interval as the inner (A) axis, so slots keyed on
/// that column as `att1` come back empty rather than erroring.
#[test]
fn constant_column_yields_no_boxes_as_the_inner_axis() {
    let rows = 40;
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for r in 0..rows {
        features.push(0.5); // column 0: always tied
        features.push((r as f64) / rows as f64); // column 1: varies
        labels.push(if r % 2 == 0 { 1u32 } else { 0u32 });
    }

    let dataset = ArrayDataset::classification(features, 2, labels, 2);
    let params = SearchParams {
        bin_size: 4,
        support: 4,
        purity: 0.5,
        mode: Mode::LowVariance,
        num_threads: 1,
    };

    let outcome = search_projections(&dataset, params).unwrap();
    assert!(outcome.feature_map.get(0, 1).is_empty());
}

/// S5 — thread equivalence: the same search with one worker thread and
/// with four must return the same set of boxes, independent of ordering.
#[test]
fn thread_count_does_not_change_the_set_of_boxes_found() {
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for k in 0..15 {
        let x1 = 0.25 + (k as f64) * 0.006;
        let x2 = 0.65 + (k as f64) * 0.006;
        features.push(x1);
        features.push(x2);
        labels.push(1u32);
    }
    for k in 0..85 {
        let x1 = 0.41 + (k as f64) * 0.0069;
        let x2 = ((k as f64) * 0.0111) % 1.0;
        features.push(x1);
        features.push(x2);
        labels.push(0u32);
    }
    let dataset = ArrayDataset::classification(features, 2, labels, 2);

    let mut params = SearchParams {
        bin_size: 5,
        support: 10,
        purity: 0.95,
        mode: Mode::LowVariance,
        num_threads: 1,
    };

    let single = search_projections(&dataset, params).unwrap();
    params.num_threads = 4;
    let multi = search_projections(&dataset, params).unwrap();

    assert_eq!(single.feature_map.num_projections(), multi.feature_map.num_projections());

    let key = |p: &Payload| match p {
        Payload::Classification { class_label, pos, neg } => (*class_label, *pos, *neg, 0u32),
        Payload::Numeric { total, .. } => (0, *total, 0, 1),
    };

    for i in 0..dataset.cols() {
        for j in 0..dataset.cols() {
            let mut a: Vec<_> = single.feature_map.get(i, j).iter().map(|b| (b.att1_range, b.att2_range, key(&b.payload))).collect();
            let mut b: Vec<_> = multi.feature_map.get(i, j).iter().map(|b| (b.att1_range, b.att2_range, key(&b.payload))).collect();
            a.sort_by(|x, y| x.partial_cmp(y).unwrap());
            b.sort_by(|x, y| x.partial_cmp(y).unwrap());
            assert_eq!(a, b, "mismatch in slot ({i},{j})");
        }
    }
}

/// S6 — invalid params: a zero bin size is rejected before any search runs.
#[test]
fn zero_bin_size_is_rejected_up_front() {
    let dataset = ArrayDataset::numeric(vec![0.0, 1.0, 2.0, 3.0], 1, vec![0.0, 1.0, 2.0, 3.0]);
    let params = SearchParams {
        bin_size: 0,
        support: 1,
        purity: 0.5,
        mode: Mode::LowVariance,
        num_threads: 1,
    };
    let err = search_projections(&dataset, params).unwrap_err();
    assert!(matches!(err, projection_search::Error::InvalidBinSize { .. }));
}
