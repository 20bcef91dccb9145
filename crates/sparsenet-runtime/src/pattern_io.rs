//! Pattern files on disk.
//!
//! A pattern file holds exactly N whitespace-separated `0`/`1` tokens.
//! Sets of patterns live in one directory as `<index>_<variant>`.

use rand::Rng;
use sparsenet_core::error::{Result, SparsenetError};
use sparsenet_core::pattern::{format_pattern, parse_pattern, random_pattern};
use sparsenet_core::types::Pattern;
use std::path::{Path, PathBuf};

/// File name of pattern `index`, variant `variant`, inside a pattern set.
pub fn pattern_file_name(index: usize, variant: usize) -> String {
    format!("{index}_{variant}")
}

/// Load a pattern of `neurons` units from `path`.
pub fn load_pattern_file(path: &Path, neurons: usize) -> Result<Pattern> {
    let text = std::fs::read_to_string(path).map_err(|e| SparsenetError::io(path, e))?;
    parse_pattern(&text, neurons).map_err(|e| {
        tracing::debug!(path = %path.display(), error = %e, "pattern file rejected");
        e
    })
}

/// Write `pattern` to `path`, one line per `width` units.
pub fn write_pattern_file(path: &Path, pattern: &Pattern, width: usize) -> Result<()> {
    std::fs::write(path, format_pattern(pattern, width)).map_err(|e| SparsenetError::io(path, e))
}

/// Write `count × variants` random patterns into `dir` and return their paths.
///
/// Indices and variants both start at 1.
pub fn generate_pattern_set<R: Rng + ?Sized>(
    dir: &Path,
    count: usize,
    variants: usize,
    neurons: usize,
    sparseness: f64,
    width: usize,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| SparsenetError::io(dir, e))?;

    let mut written = Vec::with_capacity(count * variants);
    for index in 1..=count {
        for variant in 1..=variants {
            let pattern = random_pattern(neurons, sparseness, rng)?;
            let path = dir.join(pattern_file_name(index, variant));
            write_pattern_file(&path, &pattern, width)?;
            written.push(path);
        }
    }
    tracing::info!(dir = %dir.display(), files = written.len(), "generated pattern set");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sparsenet_core::error::ParseError;

    #[test]
    fn write_then_load_reproduces_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let p = random_pattern(64, 0.2, &mut rng).unwrap();
        let path = dir.path().join("1_1");
        write_pattern_file(&path, &p, 8).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 8);
        assert_eq!(load_pattern_file(&path, 64).unwrap(), p);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");
        match load_pattern_file(&path, 4).unwrap_err() {
            SparsenetError::Io { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short");
        std::fs::write(&path, "1 0 1\n").unwrap();
        assert!(matches!(
            load_pattern_file(&path, 4),
            Err(SparsenetError::Parse(ParseError::TokenCount { expected: 4, found: 3 }))
        ));
    }

    #[test]
    fn generated_set_uses_index_variant_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let paths = generate_pattern_set(dir.path(), 3, 2, 25, 0.3, 5, &mut rng).unwrap();
        assert_eq!(paths.len(), 6);
        assert!(dir.path().join("3_2").exists());
        assert_eq!(load_pattern_file(&dir.path().join("2_1"), 25).unwrap().len(), 25);
    }
}
