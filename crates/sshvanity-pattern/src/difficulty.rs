//! Difficulty calculation for vanity patterns

use sshvanity_crypto::encoding::ENCODED_LEN;

use crate::matcher::fixed_lead_in;
use crate::PatternType;

/// Size of the base64 alphabet
const ALPHABET_SIZE: f64 = 64.0;

/// Calculate the difficulty (expected number of attempts) for a pattern.
///
/// Only the 43 characters after the shared lead-in vary between keys; a pattern
/// that falls entirely inside the lead-in matches every key. Regex patterns have
/// no estimate and return NaN.
pub fn calculate_difficulty(pattern: &str, pattern_type: PatternType, case_insensitive: bool) -> f64 {
    if pattern_type == PatternType::Regex {
        return f64::NAN;
    }
    if !pattern.is_ascii() {
        return f64::INFINITY;
    }

    let lead_in = fixed_lead_in();
    let random_len = ENCODED_LEN - lead_in.len();

    let (lead_in_cmp, pattern_cmp) = if case_insensitive {
        (lead_in.to_ascii_lowercase(), pattern.to_ascii_lowercase())
    } else {
        (lead_in.clone(), pattern.to_string())
    };

    // Per-key chance of a match
    let odds = match pattern_type {
        PatternType::Prefix => {
            let overlap = pattern_cmp.len().min(lead_in_cmp.len());
            if pattern_cmp[..overlap] != lead_in_cmp[..overlap] {
                return f64::INFINITY;
            }
            match_odds(&pattern[overlap..], case_insensitive)
        }
        PatternType::Suffix => {
            let start = pattern.len().saturating_sub(random_len);
            if !lead_in_cmp.ends_with(&pattern_cmp[..start]) {
                return f64::INFINITY;
            }
            match_odds(&pattern[start..], case_insensitive)
        }
        PatternType::Contains => {
            if lead_in_cmp.contains(&pattern_cmp) {
                return 1.0;
            }

            // Placements entirely inside the random part
            let positions = (random_len + 1).saturating_sub(pattern.len());
            let mut odds = positions as f64 * match_odds(pattern, case_insensitive);

            // Placements whose first `k` characters fall on the end of the lead-in
            for k in 1..pattern.len().min(lead_in.len() + 1) {
                if pattern.len() - k <= random_len
                    && lead_in_cmp.ends_with(&pattern_cmp[..k])
                {
                    odds += match_odds(&pattern[k..], case_insensitive);
                }
            }
            odds
        }
        PatternType::Regex => return f64::NAN,
    };

    if odds > 0.0 {
        (1.0 / odds).max(1.0)
    } else {
        f64::INFINITY
    }
}

/// Chance that `chars` turns up at one fixed spot in the random part
fn match_odds(chars: &str, case_insensitive: bool) -> f64 {
    let mut odds = ALPHABET_SIZE.powi(-(chars.len() as i32));

    if case_insensitive {
        // Each letter matches two of the 64 symbols
        let num_letters = chars.chars().filter(|c| c.is_ascii_alphabetic()).count();
        odds *= 2.0_f64.powi(num_letters as i32);
    }

    odds
}

/// Format difficulty as human-readable string
pub fn format_difficulty(difficulty: f64) -> String {
    if difficulty.is_nan() {
        "unknown".to_string()
    } else if difficulty.is_infinite() {
        "impossible".to_string()
    } else if difficulty >= 1e15 {
        format!("{:.2}P", difficulty / 1e15)
    } else if difficulty >= 1e12 {
        format!("{:.2}T", difficulty / 1e12)
    } else if difficulty >= 1e9 {
        format!("{:.2}G", difficulty / 1e9)
    } else if difficulty >= 1e6 {
        format!("{:.2}M", difficulty / 1e6)
    } else if difficulty >= 1e3 {
        format!("{:.2}K", difficulty / 1e3)
    } else {
        format!("{:.0}", difficulty)
    }
}

/// Estimate time to 50% probability of finding a match
pub fn estimate_time_50pct(difficulty: f64, keys_per_second: f64) -> f64 {
    // For large difficulty, ln(0.5) / ln(1 - 1/difficulty) approximates difficulty * ln(2)
    (difficulty * std::f64::consts::LN_2) / keys_per_second
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    if seconds.is_nan() {
        "unknown".to_string()
    } else if !seconds.is_finite() {
        "forever".to_string()
    } else if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else if seconds < 86400.0 * 365.0 {
        format!("{:.1}d", seconds / 86400.0)
    } else {
        format!("{:.1}y", seconds / (86400.0 * 365.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_difficulty() {
        let diff = calculate_difficulty("abcd", PatternType::Suffix, false);
        assert_eq!(diff, 16_777_216.0); // 64^4
    }

    #[test]
    fn test_contains_is_easier_than_suffix() {
        let suffix = calculate_difficulty("abcd", PatternType::Suffix, false);
        let contains = calculate_difficulty("abcd", PatternType::Contains, false);
        assert_eq!(contains, suffix / 40.0); // 43 - 4 + 1 positions
    }

    #[test]
    fn test_prefix_counts_only_chars_after_lead_in() {
        let diff = calculate_difficulty(
            "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIab",
            PatternType::Prefix,
            false,
        );
        assert_eq!(diff, 4096.0);
        assert_eq!(calculate_difficulty("ssh-ed", PatternType::Prefix, false), 1.0);
        assert!(calculate_difficulty("abc", PatternType::Prefix, false).is_infinite());
    }

    #[test]
    fn test_lead_in_substring_is_trivial() {
        assert_eq!(calculate_difficulty("C3Nza", PatternType::Contains, false), 1.0);
    }

    #[test]
    fn test_contains_across_lead_in_boundary() {
        // "AAAAI" ends the lead-in, so only "xyz" has to come up at the first
        // random position
        let diff = calculate_difficulty("AAAAIxyz", PatternType::Contains, false);
        assert!(diff <= 262_144.0); // 64^3
        assert!(diff > 262_143.0);

        let inside_only = calculate_difficulty("Ixyz", PatternType::Contains, false);
        assert!(inside_only < 262_144.0);
        assert!(inside_only > 64.0f64.powi(3) / 41.0);
    }

    #[test]
    fn test_long_suffix_must_agree_with_lead_in() {
        let tail = "A".repeat(43);
        let reaching = format!("I{}", tail);
        let clashing = format!("Z{}", tail);
        assert_eq!(
            calculate_difficulty(&reaching, PatternType::Suffix, false),
            calculate_difficulty(&tail, PatternType::Suffix, false)
        );
        assert!(calculate_difficulty(&clashing, PatternType::Suffix, false).is_infinite());
    }

    #[test]
    fn test_regex_difficulty_unknown() {
        let diff = calculate_difficulty("ab+c", PatternType::Regex, false);
        assert!(diff.is_nan());
        assert_eq!(format_difficulty(diff), "unknown");
        assert_eq!(format_duration(estimate_time_50pct(diff, 1000.0)), "unknown");
    }

    #[test]
    fn test_case_insensitive_reduces_difficulty() {
        let case_sensitive = calculate_difficulty("dead", PatternType::Suffix, false);
        let case_insensitive = calculate_difficulty("dead", PatternType::Suffix, true);
        assert_eq!(case_insensitive, case_sensitive / 16.0);
    }

    #[test]
    fn test_format_difficulty() {
        assert_eq!(format_difficulty(1000.0), "1.00K");
        assert_eq!(format_difficulty(1500000.0), "1.50M");
        assert_eq!(format_difficulty(1e12), "1.00T");
        assert_eq!(format_difficulty(f64::INFINITY), "impossible");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.5), "500ms");
        assert_eq!(format_duration(30.0), "30.0s");
        assert_eq!(format_duration(120.0), "2.0m");
        assert_eq!(format_duration(7200.0), "2.0h");
    }
}
