//! Human readable sizes.

const KIB: f64 = 1024.0;
const MIB: f64 = 1_048_576.0;
const GIB: f64 = 1_073_741_824.0;

/// Format a byte count as `"x.xx GB"`, `"x.xx MB"`, `"x.xx KB"`, or
/// `"0 bytes"`.
pub fn format_size(bytes: u64) -> String {
    let value = bytes as f64;
    if value >= GIB {
        format!("{} GB", group_thousands(value / GIB))
    } else if value >= MIB {
        format!("{} MB", group_thousands(value / MIB))
    } else if bytes > 0 {
        format!("{} KB", group_thousands(value / KIB))
    } else {
        "0 bytes".to_string()
    }
}

/// Two decimals with `,` between thousands.
fn group_thousands(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{grouped}.{fraction}")
}
