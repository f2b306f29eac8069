/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
use std::fmt;

/// dBASE-III header fields, as stored on disk (32 bytes).
#[derive(Debug, Default, Clone)]
pub struct AttributeHeader {
    pub version: u8,
    pub year: u32,
    pub month: u8,
    pub day: u8,
    pub num_records: u32,
    pub num_fields: u32,
    pub bytes_in_header: u16,
    pub bytes_in_record: u16,
    pub incomplete_tansaction: u8,
    pub encryption_flag: u8,
    pub mdx_flag: u8,
    pub language_driver_id: u8,
}

/// One column descriptor: name, dBASE type code, on-disk width, decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeField {
    pub name: String,
    pub field_type: char,
    pub field_length: u8,
    pub decimal_count: u8,
}

impl AttributeField {
    /// `F` columns always render with `%.15f` (dbfFileParser.c), so their
    /// decimal count is fixed at construction rather than caller-chosen.
    pub fn new(name: &str, field_type: char, field_length: u8, decimal_count: u8) -> AttributeField {
        AttributeField {
            name: name.to_string(),
            field_type,
            field_length,
            decimal_count: if field_type == 'F' { 15 } else { decimal_count.min(15) },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateData {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl fmt::Display for DateData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Null,
    Int(i32),
    Real(f64),
    Bool(bool),
    Date(DateData),
    Text(String),
}

/// Renders an `N`/`F` value the way the writer measures/emits it:
/// integers with `%d`, reals with up to 15 decimal digits.
pub fn render_real(v: f64, decimal_count: u8) -> String {
    let decimals = decimal_count.min(15) as usize;
    format!("{:.*}", decimals, v)
}

pub fn render_bool(v: bool) -> char {
    if v { 'T' } else { 'F' }
}

/// The in-memory dBASE attribute table attached to a `Shapefile`.
#[derive(Debug, Default, Clone)]
pub struct ShapefileAttributes {
    pub header: AttributeHeader,
    pub fields: Vec<AttributeField>,
    records: Vec<Vec<FieldData>>,
    pub is_deleted: Vec<bool>,
}

impl ShapefileAttributes {
    pub fn add_field(&mut self, field: &AttributeField) {
        self.fields.push(field.clone());
        self.header.num_fields = self.fields.len() as u32;
    }

    pub fn add_record(&mut self, record: Vec<FieldData>, deleted: bool) {
        self.records.push(record);
        self.is_deleted.push(deleted);
        self.header.num_records = self.records.len() as u32;
    }

    pub fn get_record(&self, index: usize) -> &Vec<FieldData> {
        &self.records[index]
    }

    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Two-pass column-width discovery: scans every row to find the
    /// widest rendered value for each field, capping `C` at 255.
    pub fn compute_field_widths(&mut self) {
        for (k, field) in self.fields.iter_mut().enumerate() {
            let mut width = field.field_length as usize;
            if field.field_type == 'L' {
                field.field_length = 1;
                continue;
            }
            for row in &self.records {
                let rendered_len = match &row[k] {
                    FieldData::Null => 0,
                    FieldData::Int(v) => v.to_string().len(),
                    FieldData::Real(v) => render_real(*v, field.decimal_count).len(),
                    FieldData::Bool(_) => 1,
                    FieldData::Date(_) => 8,
                    FieldData::Text(v) => v.len(),
                };
                if rendered_len > width {
                    width = rendered_len;
                }
            }
            if field.field_type == 'C' && width > 255 {
                width = 255;
            }
            field.field_length = width as u8;
        }
    }

    /// Checks field count and names against another table's schema
    /// (used when concatenating multiple input files).
    pub fn schema_matches(&self, other: &ShapefileAttributes) -> bool {
        if self.fields.len() != other.fields.len() {
            return false;
        }
        self.fields
            .iter()
            .zip(other.fields.iter())
            .all(|(a, b)| a.name == b.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compute_field_widths_real() {
        let mut attrs = ShapefileAttributes::default();
        attrs.add_field(&AttributeField::new("VAL", 'F', 1, 2));
        attrs.add_record(vec![FieldData::Real(3.14159)], false);
        attrs.add_record(vec![FieldData::Real(100.1)], false);
        attrs.compute_field_widths();
        // decimal_count is forced to 15 for 'F' regardless of the 2 passed
        // in, so both rows render 15 decimals; "100.1" is the widest integer
        // part, giving "100.100000000000000".len() == 19
        assert_eq!(attrs.fields[0].decimal_count, 15);
        assert_eq!(attrs.fields[0].field_length, 19);
    }

    #[test]
    fn test_f_field_forces_15_decimals() {
        let f = AttributeField::new("VAL", 'F', 10, 2);
        assert_eq!(f.decimal_count, 15);
        let n = AttributeField::new("COUNT", 'N', 10, 0);
        assert_eq!(n.decimal_count, 0);
    }

    #[test]
    fn test_schema_mismatch() {
        let mut a = ShapefileAttributes::default();
        a.add_field(&AttributeField::new("NAME", 'C', 10, 0));
        let mut b = ShapefileAttributes::default();
        b.add_field(&AttributeField::new("OTHER", 'C', 10, 0));
        assert!(!a.schema_matches(&b));
    }

    #[test]
    fn test_render_real_caps_at_15() {
        let s = render_real(1.0, 20);
        assert_eq!(s.split('.').nth(1).unwrap().len(), 15);
    }
}
