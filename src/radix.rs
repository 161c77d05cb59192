use std::fmt;

/// Bases a result is shown in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Binary,
    Hex,
}

impl Radix {
    pub const ALL: [Radix; 3] = [Radix::Decimal, Radix::Binary, Radix::Hex];

    pub fn label(self) -> &'static str {
        match self {
            Radix::Decimal => "dec",
            Radix::Binary => "bin",
            Radix::Hex => "hex",
        }
    }

    // Binary and hex show the two's-complement bit pattern of the value.
    pub fn format(self, value: i64) -> String {
        match self {
            Radix::Decimal => value.to_string(),
            Radix::Binary => format!("{:b}", value),
            Radix::Hex => format!("{:x}", value),
        }
    }
}

impl fmt::Display for Radix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Renders `value` once per radix, one `label: digits` line each.
pub fn render(value: i64) -> String {
    Radix::ALL
        .iter()
        .map(|radix| format!("{}: {}", radix, radix.format(value)))
        .collect::<Vec<_>>()
        .join("\n")
}
