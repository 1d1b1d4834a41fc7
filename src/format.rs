/// Human-readable byte counts for the comparison cards and the cache bar
use std::time::Duration;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Format a byte count as B, KB (one decimal) or MB (two decimals)
pub fn human_bytes(n: u64) -> String {
    if n < KIB {
        format!("{} B", n)
    } else if n < MIB {
        format!("{:.1} KB", n as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", n as f64 / MIB as f64)
    }
}

/// Same as [`human_bytes`], with a dash for absent values
pub fn human_bytes_opt(n: Option<u64>) -> String {
    n.map(human_bytes).unwrap_or_else(|| "—".to_string())
}

/// Milliseconds with one decimal, or a placeholder
pub fn millis(d: Option<Duration>) -> String {
    match d {
        Some(d) => format!("{:.1} ms", d.as_secs_f64() * 1000.0),
        None => "— ms".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_boundaries() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(1024), "1.0 KB");
        assert_eq!(human_bytes(1536), "1.5 KB");
        assert_eq!(human_bytes(MIB - 1), "1024.0 KB");
        assert_eq!(human_bytes(MIB), "1.00 MB");
        assert_eq!(human_bytes(5 * MIB / 2), "2.50 MB");
    }

    #[test]
    fn test_formatting_is_pure() {
        for n in [0, 17, 2048, 4000, 3 * MIB + 12345] {
            assert_eq!(human_bytes(n), human_bytes(n));
        }
    }

    #[test]
    fn test_absent_values() {
        assert_eq!(human_bytes_opt(None), "—");
        assert_eq!(human_bytes_opt(Some(4000)), "3.9 KB");
        assert_eq!(millis(None), "— ms");
        assert_eq!(millis(Some(Duration::from_micros(12_340))), "12.3 ms");
    }
}
