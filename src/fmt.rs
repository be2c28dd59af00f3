/// Format a signed amount for display: two decimal places, thousands
/// separators, sign ahead of the currency symbol ("-$1,234.56").
pub fn money(val: f64) -> String {
    let cents = format!("{:.2}", val.abs());
    let (units, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.char_indices() {
        if i != 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if val < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}
