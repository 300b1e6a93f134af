use anyhow::anyhow;
use float_cmp::assert_approx_eq;
use std::path::PathBuf;

use crate::{
    load, optimize, parse_constraints, ConstraintKind, DirectorySource, EnvSource, Error, Options,
};

const RECORDS: &str = "\
# x1 + x2 = 1
1.0 1.0 1.0
# x1 >= 0, x2 >= 0
1.0 0.0 0.0
0.0 2.0 0.0   # scaled on purpose
";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gradproj-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn parse_records() {
    let constraints = parse_constraints(RECORDS, 2, 1).unwrap();

    assert_eq!(constraints.len(), 3);
    assert_eq!(constraints.num_equality(), 1);
    assert_eq!(constraints.num_inequality(), 2);

    let (n, b) = constraints.equality_rows().next().unwrap();
    assert_approx_eq!(f64, n[0], 1.0 / 2f64.sqrt(), epsilon = 1e-15);
    assert_approx_eq!(f64, b, 1.0 / 2f64.sqrt(), epsilon = 1e-15);

    let rows = constraints.inequality_rows().collect::<Vec<_>>();
    assert_eq!(rows[1].0, 2);
    assert_eq!(rows[1].1, &[0.0, 1.0]);
}

#[test]
fn wrong_field_count() {
    let text = "1.0 1.0 1.0\n1.0 0.0\n";

    match parse_constraints(text, 2, 1) {
        Err(Error::Load(msg)) => assert!(msg.contains("line 2"), "{}", msg),
        other => panic!("unexpected result: {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn record_spans_lines() {
    let text = "1.0 1.0\n  1.0\n1.0 0.0 # first bound\n0.0\n0.0 2.0 0.0\n";

    let constraints = parse_constraints(text, 2, 1).unwrap();
    assert_eq!(constraints.len(), 3);
    assert_eq!(constraints.inequality_rows().next().unwrap().1, &[1.0, 0.0]);

    match parse_constraints("1.0 0.0\n0.0\n0.0\n1.0\n", 2, 0) {
        Err(Error::Load(msg)) => assert!(msg.contains("line 3"), "{}", msg),
        other => panic!("unexpected result: {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn malformed_number() {
    let err = parse_constraints("1.0 x 0.0\n", 2, 0).unwrap_err();
    assert!(matches!(err, Error::Load(_)));
}

#[test]
fn too_many_equalities() {
    let err = parse_constraints("1.0 1.0 1.0\n", 2, 2).unwrap_err();
    assert!(matches!(err, Error::Load(_)));
}

#[test]
fn zero_normal() {
    let err = parse_constraints("0.0 0.0 1.0\n", 2, 0).unwrap_err();
    assert!(matches!(err, Error::Load(_)));
}

#[test]
fn selector_names() {
    assert_eq!("general".parse::<ConstraintKind>().unwrap(), ConstraintKind::General);
    assert_eq!("smoopy".parse::<ConstraintKind>().unwrap(), ConstraintKind::Regularized);
    assert_eq!("Spherical".parse::<ConstraintKind>().unwrap(), ConstraintKind::Spherical);
    assert!(matches!("polar".parse::<ConstraintKind>(), Err(Error::Load(_))));

    assert_eq!(ConstraintKind::Regularized.file_name(), "constraints.dat.reg");
    assert_eq!(ConstraintKind::Spherical.env_var(), "CONSDAT_SPHERY");
}

#[test]
fn directory_source() {
    let dir = scratch_dir("dir");
    std::fs::write(dir.join("constraints.dat.reg"), RECORDS).unwrap();
    let source = DirectorySource::new(&dir);

    let constraints = load(&source, ConstraintKind::Regularized, 2, 1).unwrap();
    assert_eq!(constraints.len(), 3);

    // No file for the general variant.
    let err = load(&source, ConstraintKind::General, 2, 1).unwrap_err();
    assert!(matches!(err, Error::Load(_)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn env_source() {
    let dir = scratch_dir("env");
    let path = dir.join("sphery.dat");
    std::fs::write(&path, RECORDS).unwrap();

    std::env::set_var("CONSDAT_SPHERY", &path);
    let constraints = load(&EnvSource::new(), ConstraintKind::Spherical, 2, 1).unwrap();
    assert_eq!(constraints.len(), 3);

    std::env::remove_var("CONSDAT");
    let err = load(&EnvSource::new(), ConstraintKind::General, 2, 1).unwrap_err();
    match err {
        Error::Load(msg) => assert!(msg.contains("CONSDAT"), "{}", msg),
        other => panic!("unexpected error: {}", other),
    }

    std::env::remove_var("CONSDAT_SMOOPY");
    std::fs::write(dir.join("constraints.dat.reg"), RECORDS).unwrap();
    let source = EnvSource::with_fallback(&dir);
    let constraints = load(&source, ConstraintKind::Regularized, 2, 1).unwrap();
    assert_eq!(constraints.len(), 3);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn closure_source_error() {
    let source = |kind: ConstraintKind| -> anyhow::Result<String> {
        Err(anyhow!("no dataset for {}", kind))
    };

    match load(&source, ConstraintKind::General, 2, 0) {
        Err(Error::Load(msg)) => assert!(msg.contains("no dataset for general"), "{}", msg),
        other => panic!("unexpected result: {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn load_and_optimize() {
    let source = |_: ConstraintKind| -> anyhow::Result<String> { Ok(RECORDS.to_string()) };
    let constraints = load(&source, ConstraintKind::General, 2, 1).unwrap();

    // min (x1 - 2)^2 + x2^2 on the segment x1 + x2 = 1, x >= 0
    let objective = |x: &[f64]| -> (f64, Vec<f64>) {
        ((x[0] - 2.0).powi(2) + x[1].powi(2), vec![2.0 * (x[0] - 2.0), 2.0 * x[1]])
    };
    let opt = Options::default();
    let s = optimize(&objective, &constraints, &[0.5, 0.5], None, &opt, None, None).unwrap();

    assert!(s.converged());
    assert_approx_eq!(f64, s.x[0], 1.0, epsilon = 1e-9);
    assert_approx_eq!(f64, s.x[1], 0.0, epsilon = 1e-9);
    assert_eq!(s.active, vec![0, 2]);
}
