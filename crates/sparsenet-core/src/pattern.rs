//! Pattern store - loading, noise and activity statistics of binary patterns.
//!
//! Patterns travel as whitespace-separated `0`/`1` tokens, exactly N of them,
//! in row-major order when the network has a spatial layout. Line breaks are
//! cosmetic.

use crate::error::{ConfigError, ParseError, Result, SparsenetError};
use crate::types::{NetworkState, Pattern};
use rand::Rng;
use std::fmt::Write as _;
use std::io::Read;

/// Parse a pattern of exactly `neurons` binary tokens.
pub fn parse_pattern(text: &str, neurons: usize) -> Result<Pattern> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != neurons {
        return Err(ParseError::TokenCount {
            expected: neurons,
            found: tokens.len(),
        }
        .into());
    }

    let units = tokens
        .iter()
        .enumerate()
        .map(|(index, token)| match token.parse::<u8>() {
            Ok(0) => Ok(false),
            Ok(1) => Ok(true),
            _ => Err(ParseError::NonBinaryToken {
                index,
                token: token.to_string(),
            }),
        })
        .collect::<std::result::Result<Vec<bool>, ParseError>>()?;

    Ok(Pattern::new(units))
}

/// Read and parse a pattern from any reader.
pub fn read_pattern<R: Read>(mut reader: R, neurons: usize) -> Result<Pattern> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| SparsenetError::io("<reader>", e))?;
    parse_pattern(&text, neurons)
}

/// Render a pattern as tokens, breaking the line every `width` units.
///
/// `width == 0` writes everything on one line.
pub fn format_pattern(pattern: &Pattern, width: usize) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 1);
    for (i, &unit) in pattern.units().iter().enumerate() {
        let _ = write!(out, "{} ", u8::from(unit));
        if width > 0 && (i + 1) % width == 0 {
            out.push('\n');
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Random pattern: each unit is active with probability `sparseness`.
pub fn random_pattern<R: Rng + ?Sized>(
    neurons: usize,
    sparseness: f64,
    rng: &mut R,
) -> Result<Pattern> {
    if !(0.0..=1.0).contains(&sparseness) {
        return Err(SparsenetError::out_of_range("sparseness", 0.0, 1.0, sparseness));
    }
    let units = (0..neurons).map(|_| rng.gen::<f64>() < sparseness).collect();
    Ok(Pattern::new(units))
}

/// Initial condition with noise.
///
/// Each unit independently, with probability `noise`, is replaced by a fresh
/// Bernoulli draw with the pattern's own activity; otherwise it is copied.
/// Global activity is preserved in expectation.
pub fn apply_noise<R: Rng + ?Sized>(
    pattern: &Pattern,
    noise: f64,
    rng: &mut R,
) -> Result<NetworkState> {
    if !(0.0..=1.0).contains(&noise) {
        return Err(SparsenetError::out_of_range("noise", 0.0, 1.0, noise));
    }
    let activity = pattern.activity();
    let units = pattern
        .units()
        .iter()
        .map(|&unit| {
            if rng.gen::<f64>() < noise {
                rng.gen::<f64>() < activity
            } else {
                unit
            }
        })
        .collect();
    Ok(NetworkState::new(units))
}

/// Analytic threshold for patterns of activity `a`:
/// `(1 - 2a) / (2 sqrt(a (1 - a)))`.
pub fn theta_zero(activity: f64) -> Result<f64> {
    if activity <= 0.0 || activity >= 1.0 {
        return Err(ConfigError::DegeneratePattern { activity }.into());
    }
    Ok((1.0 - 2.0 * activity) / (2.0 * (activity * (1.0 - activity)).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parse_accepts_line_breaks() {
        let p = parse_pattern("1 0 0\n1 1 0\n", 6).unwrap();
        assert_eq!(p, Pattern::from_bits(&[1, 0, 0, 1, 1, 0]));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = parse_pattern("1 0 1", 4).unwrap_err();
        assert!(matches!(
            err,
            SparsenetError::Parse(ParseError::TokenCount { expected: 4, found: 3 })
        ));

        let err = parse_pattern("1 0 1 0 1", 4).unwrap_err();
        assert!(matches!(
            err,
            SparsenetError::Parse(ParseError::TokenCount { expected: 4, found: 5 })
        ));
    }

    #[test]
    fn parse_rejects_non_binary_tokens() {
        let err = parse_pattern("1 0 2 0", 4).unwrap_err();
        match err {
            SparsenetError::Parse(ParseError::NonBinaryToken { index, token }) => {
                assert_eq!(index, 2);
                assert_eq!(token, "2");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_pattern("1 x 0 0", 4).is_err());
    }

    #[test]
    fn format_then_parse_reproduces_pattern() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = random_pattern(35, 0.3, &mut rng).unwrap();
        let text = format_pattern(&p, 7);
        assert_eq!(text.lines().count(), 5);
        assert_eq!(parse_pattern(&text, 35).unwrap(), p);
    }

    #[test]
    fn zero_noise_copies_the_pattern() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = random_pattern(500, 0.3, &mut rng).unwrap();
        let state = apply_noise(&p, 0.0, &mut rng).unwrap();
        assert_eq!(state.units(), p.units());
    }

    #[test]
    fn full_noise_keeps_activity_but_loses_the_pattern() {
        let mut rng = StdRng::seed_from_u64(2);
        let p = random_pattern(20_000, 0.3, &mut rng).unwrap();
        let state = apply_noise(&p, 1.0, &mut rng).unwrap();

        let a = p.activity();
        assert!((state.activity() - a).abs() < 0.02);

        // Independence: P(state=1 | pattern=1) ~ P(state=1 | pattern=0) ~ a
        let (mut on, mut on_hits, mut off, mut off_hits) = (0usize, 0usize, 0usize, 0usize);
        for (&pu, &su) in p.units().iter().zip(state.units()) {
            if pu {
                on += 1;
                on_hits += su as usize;
            } else {
                off += 1;
                off_hits += su as usize;
            }
        }
        let p_on = on_hits as f64 / on as f64;
        let p_off = off_hits as f64 / off as f64;
        assert!((p_on - p_off).abs() < 0.03, "p_on={p_on}, p_off={p_off}");
    }

    #[test]
    fn noise_out_of_range_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = Pattern::from_bits(&[1, 0]);
        assert!(apply_noise(&p, 1.5, &mut rng).is_err());
    }

    #[test]
    fn theta_zero_vanishes_at_half_activity() {
        assert!(theta_zero(0.5).unwrap().abs() < 1e-12);
        assert!(theta_zero(0.2).unwrap() > 0.0);
        assert!(theta_zero(0.0).is_err());
        assert!(theta_zero(1.0).is_err());
    }
}
