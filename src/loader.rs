use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use log::debug;

use crate::constraint::ConstraintSet;
use crate::error::{Error, Result};

/// Constraint dataset variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    General,
    /// Smoothed/regularized constraints.
    Regularized,
    Spherical,
}

impl ConstraintKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ConstraintKind::General => "constraints.dat",
            ConstraintKind::Regularized => "constraints.dat.reg",
            ConstraintKind::Spherical => "constraints.dat.sphery",
        }
    }

    /// Name of the environment variable holding the dataset path.
    pub fn env_var(&self) -> &'static str {
        match self {
            ConstraintKind::General => "CONSDAT",
            ConstraintKind::Regularized => "CONSDAT_SMOOPY",
            ConstraintKind::Spherical => "CONSDAT_SPHERY",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::General => "general",
            ConstraintKind::Regularized => "regularized",
            ConstraintKind::Spherical => "spherical",
        };
        f.write_str(name)
    }
}

impl FromStr for ConstraintKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(ConstraintKind::General),
            "regularized" | "smoopy" | "reg" => Ok(ConstraintKind::Regularized),
            "spherical" | "sphery" => Ok(ConstraintKind::Spherical),
            other => Err(Error::Load(format!("unknown constraint set '{}'", other))),
        }
    }
}

/// Resolves a constraint dataset variant to its contents.
pub trait ConstraintSource {
    fn read(&self, kind: ConstraintKind) -> anyhow::Result<String>;
}

impl<F> ConstraintSource for F
where
    F: Fn(ConstraintKind) -> anyhow::Result<String>,
{
    fn read(&self, kind: ConstraintKind) -> anyhow::Result<String> {
        self(kind)
    }
}

/// Reads `<dir>/<file name of kind>`.
pub struct DirectorySource {
    pub dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ConstraintSource for DirectorySource {
    fn read(&self, kind: ConstraintKind) -> anyhow::Result<String> {
        let path = self.dir.join(kind.file_name());
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
    }
}

/// Reads the file named by the environment variable of the kind,
/// optionally falling back to a directory when it is unset.
#[derive(Default)]
pub struct EnvSource {
    fallback: Option<DirectorySource>,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(dir: impl Into<PathBuf>) -> Self {
        Self {
            fallback: Some(DirectorySource::new(dir)),
        }
    }
}

impl ConstraintSource for EnvSource {
    fn read(&self, kind: ConstraintKind) -> anyhow::Result<String> {
        match std::env::var_os(kind.env_var()) {
            Some(path) => {
                let path = PathBuf::from(path);
                std::fs::read_to_string(&path).with_context(|| {
                    format!("reading {} (from ${})", path.display(), kind.env_var())
                })
            }
            None => match self.fallback.as_ref() {
                Some(dir) => dir.read(kind),
                None => Err(anyhow!("environment variable {} is not set", kind.env_var())),
            },
        }
    }
}

/// Resolves `kind` through `source` and parses the records.
pub fn load(
    source: &dyn ConstraintSource,
    kind: ConstraintKind,
    dim: usize,
    num_equality: usize,
) -> Result<ConstraintSet> {
    let text = source
        .read(kind)
        .map_err(|err| Error::Load(format!("{} constraints: {:#}", kind, err)))?;
    let constraints = parse_constraints(&text, dim, num_equality)?;
    debug!(
        "loaded {} {} constraints ({} equality)",
        constraints.len(),
        kind,
        constraints.num_equality()
    );
    Ok(constraints)
}

/// Parses whitespace-delimited constraint records.
///
/// Each record is `dim` normal components followed by the right-hand
/// side, and may span lines. Text after `#` is ignored. The first
/// `num_equality` records are equality constraints.
pub fn parse_constraints(text: &str, dim: usize, num_equality: usize) -> Result<ConstraintSet> {
    if dim == 0 {
        return Err(Error::Load("dimension must be positive".to_string()));
    }
    let fields = text.lines().enumerate().flat_map(|(lineno, line)| {
        let line = line.split('#').next().unwrap_or_default();
        line.split_whitespace().map(move |field| (lineno + 1, field))
    });

    let mut normals = Vec::new();
    let mut rhs = Vec::new();
    let mut record = Vec::with_capacity(dim + 1);
    let mut start = 0;
    for (lineno, field) in fields {
        if record.is_empty() {
            start = lineno;
        }
        let v = field
            .parse::<f64>()
            .map_err(|err| Error::Load(format!("line {}: field '{}': {}", lineno, field, err)))?;
        record.push(v);
        if record.len() == dim + 1 {
            normals.extend_from_slice(&record[..dim]);
            rhs.push(record[dim]);
            record.clear();
        }
    }
    if !record.is_empty() {
        return Err(Error::Load(format!(
            "line {}: expected {} fields, found {}",
            start,
            dim + 1,
            record.len()
        )));
    }

    if num_equality > rhs.len() {
        return Err(Error::Load(format!(
            "{} equality constraints requested but only {} records found",
            num_equality,
            rhs.len()
        )));
    }

    ConstraintSet::new(dim, num_equality, normals, rhs).map_err(|err| match err {
        Error::InvalidInput(msg) => Error::Load(msg),
        other => other,
    })
}
