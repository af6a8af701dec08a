use core::fmt;
use log::error;

/// Maximum number of columns in a row.
pub const MAX_COLUMNS: usize = 4;

/// Column separator in the log file.
pub const SEPARATOR: &str = ", ";

/// One field of a log row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    /// Header label.
    Label(&'static str),

    /// Averaged reading.
    Value(f64),

    /// Integer flag.
    Flag(u8),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Field::Label(label) => f.write_str(label),
            Field::Value(value) if value.is_nan() => f.write_str("NaN"),
            Field::Value(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            Field::Value(value) => write!(f, "{value}"),
            Field::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// Fixed-shape row of the log file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: heapless::Vec<Field, MAX_COLUMNS>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Fields past `MAX_COLUMNS` are dropped.
    pub fn push(&mut self, field: Field) {
        if let Err(field) = self.fields.push(field) {
            error!("Row is full, dropping {field}");
        }
    }

    /// Fields in column order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize as one log line, trailing newline included.
    pub fn to_line(&self) -> String {
        let mut line = self.to_string();
        line.push('\n');
        line
    }
}

impl FromIterator<Field> for Row {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        let mut row = Row::new();
        for field in iter {
            row.push(field);
        }
        row
    }
}

/// Comma-space joined fields, without the newline.
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(SEPARATOR)?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}
