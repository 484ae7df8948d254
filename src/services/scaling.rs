//! Proportional rewriting of ingredient amounts for a requested portion count.
//!
//! Lines are expected to look like `"<amount> <unit> <name>"`. Anything that
//! does not (for example "salt to taste") passes through verbatim; this is a
//! best-effort heuristic, not a unit converter.

/// Result of scaling a single ingredient line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaledLine {
    /// The leading amount parsed and was multiplied by the serving factor.
    Scaled { amount: f64, rest: String },
    /// The line had no leading number (or nothing after it) and is kept as-is.
    Passthrough(String),
}

impl ScaledLine {
    pub fn text(&self) -> String {
        match self {
            ScaledLine::Scaled { amount, rest } => format!("{} {}", format_amount(*amount), rest),
            ScaledLine::Passthrough(line) => line.clone(),
        }
    }
}

/// Serving count used as the scaling denominator. Unset or non-positive counts
/// are treated as 1.
pub fn base_servings(servings: Option<i32>) -> i32 {
    servings.filter(|s| *s > 0).unwrap_or(1)
}

/// Requested portion count from the raw `servings` parameter. Absent,
/// non-numeric or < 1 falls back to `base`.
pub fn requested_servings(raw: Option<&str>, base: i32) -> i32 {
    raw.and_then(|s| s.trim().parse::<i32>().ok())
        .filter(|s| *s >= 1)
        .unwrap_or(base)
}

/// Scale one line by `factor`. The factor is applied unrounded; only the
/// resulting amount is rounded to two decimals.
pub fn scale_line(line: &str, factor: f64) -> ScaledLine {
    let line = line.trim();
    let Some((amount, rest)) = line.split_once(char::is_whitespace) else {
        return ScaledLine::Passthrough(line.to_string());
    };
    let rest = rest.trim_start();
    if rest.is_empty() {
        return ScaledLine::Passthrough(line.to_string());
    }
    let Some(amount) = parse_amount(amount) else {
        return ScaledLine::Passthrough(line.to_string());
    };

    let rest = match rest.split_once(char::is_whitespace) {
        Some((unit, name)) if !name.trim().is_empty() => format!("{} {}", unit, name.trim_start()),
        Some((unit, _)) => unit.to_string(),
        None => rest.to_string(),
    };

    ScaledLine::Scaled {
        amount: round2(amount * factor),
        rest,
    }
}

/// Scale every non-blank line from `base` servings to `requested` servings.
pub fn scale_lines<S: AsRef<str>>(lines: &[S], base: i32, requested: i32) -> Vec<ScaledLine> {
    let factor = f64::from(requested) / f64::from(base.max(1));
    lines
        .iter()
        .map(|l| l.as_ref())
        .filter(|l| !l.trim().is_empty())
        .map(|l| scale_line(l, factor))
        .collect()
}

/// Accepts `,` as the decimal separator. Non-finite values are rejected.
fn parse_amount(token: &str) -> Option<f64> {
    token
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Two decimals at most, without trailing zeros or a trailing point.
pub fn format_amount(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
