/*
This code is part of the GRTS spatial sampling engine.
License: MIT

Notes: The logic behind reading and writing the ESRI Shapefile family
(.shp, .shx, .dbf, .prj).
*/

pub mod attributes;
pub mod geometry;

use self::attributes::*;
use self::geometry::*;
use crate::error::{GrtsError, GrtsWarning, Result, WarningSink};
use crate::io_utils::{ByteOrderReader, Endianness};
use crate::structures::Point2D;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use chrono::prelude::*;
use std::f64;
use std::fmt;
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct ShapefileHeader {
    file_code: i32,
    pub file_length: i32,
    pub version: i32,
    pub shape_type: ShapeType,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub m_min: f64,
    pub m_max: f64,
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "file_code: {}, file_length: {}, version: {}, shape_type: {}",
            self.file_code, self.file_length, self.version, self.shape_type
        )
    }
}

/// `Shapefile` is an in-memory ESRI Shapefile: geometries plus the
/// attached dBASE attribute table and (optional) projection text.
#[derive(Default, Clone)]
pub struct Shapefile {
    pub file_name: String,
    file_mode: FileMode,
    pub header: ShapefileHeader,
    pub num_records: usize,
    pub records: Vec<ShapefileGeometry>,
    pub attributes: ShapefileAttributes,
    pub projection: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum FileMode {
    #[default]
    Read,
    Write,
}

impl Shapefile {
    pub fn read(file_name: &str) -> Result<Shapefile> {
        Shapefile::read_with_sink(file_name, &mut crate::error::DiscardWarnings)
    }

    pub fn read_with_sink<S: WarningSink>(file_name: &str, sink: &mut S) -> Result<Shapefile> {
        let mut sf = Shapefile {
            file_name: file_name.to_string(),
            file_mode: FileMode::Read,
            ..Default::default()
        };
        sf.read_file(sink)?;
        Ok(sf)
    }

    pub fn new(file_name: &str, file_type: ShapeType) -> Result<Shapefile> {
        let new_file_name = if file_name.contains('.') {
            file_name.to_string()
        } else {
            format!("{}.shp", file_name)
        };
        let mut sf = Shapefile {
            file_name: new_file_name,
            file_mode: FileMode::Write,
            ..Default::default()
        };
        sf.header.shape_type = file_type;
        Ok(sf)
    }

    pub fn initialize_using_file(
        file_name: &str,
        other: &Shapefile,
        shape_type: ShapeType,
        copy_fields: bool,
    ) -> Result<Shapefile> {
        let new_file_name = if file_name.contains('.') {
            file_name.to_string()
        } else {
            format!("{}.shp", file_name)
        };
        let mut sf = Shapefile {
            file_name: new_file_name,
            file_mode: FileMode::Write,
            projection: other.projection.clone(),
            ..Default::default()
        };
        sf.header.shape_type = shape_type;
        if copy_fields {
            sf.attributes.fields = other.attributes.fields.clone();
        }
        Ok(sf)
    }

    pub fn get_total_num_parts(&self) -> usize {
        self.records.iter().map(|r| r.num_parts as usize).sum()
    }

    pub fn get_total_num_points(&self) -> usize {
        self.records.iter().map(|r| r.num_points as usize).sum()
    }

    pub fn get_short_filename(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string()
    }

    pub fn get_record(&self, index: usize) -> &ShapefileGeometry {
        &self.records[index]
    }

    pub fn add_record(&mut self, geometry: ShapefileGeometry) -> Result<()> {
        if self.file_mode == FileMode::Read {
            return Err(GrtsError::InvalidGeometry("file opened in read-only mode".into()));
        }
        if geometry.shape_type != self.header.shape_type {
            return Err(GrtsError::InvalidGeometry(
                "attempt to add a record of the wrong shape type".into(),
            ));
        }
        self.records.push(geometry);
        self.num_records += 1;
        Ok(())
    }

    pub fn add_point_record(&mut self, x: f64, y: f64) -> Result<()> {
        if self.header.shape_type != ShapeType::Point {
            return Err(GrtsError::InvalidGeometry(
                "attempt to add a point record to a non-point shapefile".into(),
            ));
        }
        let mut sfg = ShapefileGeometry::new(ShapeType::Point);
        sfg.add_point(Point2D { x, y });
        self.records.push(sfg);
        self.num_records += 1;
        Ok(())
    }

    fn read_file<S: WarningSink>(&mut self, sink: &mut S) -> Result<()> {
        let mut f = File::open(&self.file_name)?;
        let metadata = fs::metadata(&self.file_name)?;
        let file_size = metadata.len() as usize;
        let mut buffer = vec![0u8; file_size];
        f.read_exact(&mut buffer)?;

        if file_size < 100 {
            return Err(GrtsError::Truncated { expected: 100, found: file_size });
        }

        let mut bor = ByteOrderReader::<Cursor<Vec<u8>>>::new(Cursor::new(buffer), Endianness::BigEndian);
        bor.seek(0);
        self.header.file_code = bor.read_i32()?;
        if self.header.file_code != 9994 {
            return Err(GrtsError::BadMagic { expected: 9994, found: self.header.file_code });
        }
        bor.seek(24);
        self.header.file_length = bor.read_i32()?;

        bor.set_byte_order(Endianness::LittleEndian);
        self.header.version = bor.read_i32()?;
        if self.header.version != 1000 {
            return Err(GrtsError::UnsupportedVersion(self.header.version));
        }
        let st = bor.read_i32()?;
        self.header.shape_type =
            ShapeType::from_int(st).ok_or(GrtsError::UnknownShapeType(st))?;

        self.header.x_min = bor.read_f64()?;
        self.header.y_min = bor.read_f64()?;
        self.header.x_max = bor.read_f64()?;
        self.header.y_max = bor.read_f64()?;
        self.header.z_min = bor.read_f64()?;
        self.header.z_max = bor.read_f64()?;
        self.header.m_min = bor.read_f64()?;
        self.header.m_max = bor.read_f64()?;

        let mut record_number = 0usize;
        while bor.pos() < file_size {
            record_number += 1;
            if file_size - bor.pos() < 8 {
                return Err(GrtsError::Truncated { expected: bor.pos() + 8, found: file_size });
            }
            bor.set_byte_order(Endianness::BigEndian);
            bor.inc_pos(4);
            let content_length = bor.read_i32()? * 2;
            if content_length < 0 || bor.pos() + content_length as usize > file_size {
                return Err(GrtsError::Truncated {
                    expected: bor.pos() + content_length.max(0) as usize,
                    found: file_size,
                });
            }
            bor.set_byte_order(Endianness::LittleEndian);
            let tag = bor.read_i32()?;
            let shape_type = ShapeType::from_int(tag).ok_or(GrtsError::UnknownShapeType(tag))?;

            if shape_type == ShapeType::Null {
                return Err(GrtsError::InvalidGeometry(format!(
                    "record {} is a Null shape, which is treated as malformed input",
                    record_number
                )));
            }

            let mut sfg = read_geometry_record(&mut bor, shape_type, content_length)?;

            if sfg.num_parts >= 0 && (sfg.num_parts as usize) > sfg.points.len() {
                return Err(GrtsError::InvalidGeometry(format!(
                    "record {}: npoints < nparts",
                    record_number
                )));
            }
            if !sfg.box_contains_vertices() {
                sink.warn(GrtsWarning::InconsistentBox { record: record_number });
                sfg.recompute_box();
            }

            self.records.push(sfg);
        }

        self.num_records = self.records.len();

        let prj_file = Path::new(&self.file_name).with_extension("prj");
        if let Ok(f) = File::open(&prj_file) {
            let reader = BufReader::new(f);
            for line in reader.lines() {
                self.projection.push_str(&format!("{}\n", line?));
            }
        }

        self.read_dbf(sink)?;

        Ok(())
    }

    fn read_dbf<S: WarningSink>(&mut self, sink: &mut S) -> Result<()> {
        let dbf_file = Path::new(&self.file_name).with_extension("dbf");
        let mut f = File::open(&dbf_file)?;
        let metadata = fs::metadata(&dbf_file)?;
        let file_size = metadata.len() as usize;
        let mut buffer = vec![0u8; file_size];
        f.read_exact(&mut buffer)?;
        if file_size < 32 {
            return Err(GrtsError::Truncated { expected: 32, found: file_size });
        }
        let mut bor = ByteOrderReader::<Cursor<Vec<u8>>>::new(Cursor::new(buffer), Endianness::LittleEndian);

        self.attributes.header.version = bor.read_u8()?;
        self.attributes.header.year = 1900u32 + bor.read_u8()? as u32;
        self.attributes.header.month = bor.read_u8()?;
        self.attributes.header.day = bor.read_u8()?;
        self.attributes.header.num_records = bor.read_u32()?;
        self.attributes.header.bytes_in_header = bor.read_u16()?;
        self.attributes.header.bytes_in_record = bor.read_u16()?;
        bor.inc_pos(2);
        self.attributes.header.incomplete_tansaction = bor.read_u8()?;
        self.attributes.header.encryption_flag = bor.read_u8()?;
        bor.inc_pos(4);
        bor.inc_pos(8);
        self.attributes.header.mdx_flag = bor.read_u8()?;
        self.attributes.header.language_driver_id = bor.read_u8()?;
        bor.inc_pos(2);

        self.attributes.fields = vec![];
        loop {
            let name = bor.read_utf8(11).replace(char::from(0), "");
            let field_type = char::from(bor.read_u8()?);
            bor.inc_pos(4);
            let field_length = bor.read_u8()?;
            let decimal_count = bor.read_u8()?;
            bor.inc_pos(14);

            let field_data = AttributeField::new(&name, field_type, field_length, decimal_count);
            self.attributes.add_field(&field_data);

            if bor.peek_u8()? == 0x0d {
                break;
            }
        }

        bor.inc_pos(1); // terminator byte

        let num_fields = self.attributes.fields.len();
        let num_records = self.attributes.header.num_records;
        let record_width: usize = 1 + self
            .attributes
            .fields
            .iter()
            .map(|f| f.field_length as usize)
            .sum::<usize>();
        for record_idx in 0..num_records {
            if file_size - bor.pos() < record_width {
                return Err(GrtsError::Truncated { expected: bor.pos() + record_width, found: file_size });
            }
            let flag = bor.read_u8()?;
            let deleted = flag != 0x20;
            if deleted {
                sink.warn(GrtsWarning::DeletedRecord { record: record_idx as usize });
            }
            let mut row: Vec<FieldData> = Vec::with_capacity(num_fields);
            for j in 0..num_fields {
                let raw = bor.read_utf8(self.attributes.fields[j].field_length as usize);
                let trimmed = raw.replace(char::from(0), "").trim().to_string();
                let blank_or_unset = trimmed.replace(' ', "").replace('?', "").is_empty();
                if blank_or_unset {
                    row.push(FieldData::Null);
                    continue;
                }
                match self.attributes.fields[j].field_type {
                    'N' | 'F' => {
                        if self.attributes.fields[j].decimal_count == 0 {
                            row.push(FieldData::Int(trimmed.parse::<i32>().unwrap_or(0)));
                        } else {
                            row.push(FieldData::Real(trimmed.parse::<f64>().unwrap_or(0.0)));
                        }
                    }
                    'L' => row.push(FieldData::Bool(trimmed.to_lowercase().contains('t'))),
                    _ => row.push(FieldData::Text(trimmed)),
                }
            }
            self.attributes.add_record(row, deleted);
        }

        Ok(())
    }

    pub fn write(&mut self) -> Result<()> {
        if self.file_mode == FileMode::Read {
            return Err(GrtsError::InvalidGeometry("file opened in read-only mode".into()));
        }
        self.num_records = self.records.len();
        if self.num_records == 0 {
            return Err(GrtsError::InvalidGeometry("shapefile has no records to write".into()));
        }

        self.write_shp()?;
        self.write_shx()?;
        self.write_prj()?;
        self.write_dbf()?;
        Ok(())
    }

    fn write_shp(&mut self) -> Result<()> {
        let f = File::create(&self.file_name)?;
        let mut writer = BufWriter::new(f);

        writer.write_i32::<BigEndian>(9994)?;
        for _ in 0..5 {
            writer.write_i32::<BigEndian>(0)?;
        }

        let mut size = 100i32;
        for record in &self.records {
            size += 8 + record.get_length();
        }
        writer.write_i32::<BigEndian>(size / 2)?;
        writer.write_i32::<LittleEndian>(1000)?;
        writer.write_i32::<LittleEndian>(self.header.shape_type.to_int())?;

        self.calculate_extent();
        writer.write_f64::<LittleEndian>(self.header.x_min)?;
        writer.write_f64::<LittleEndian>(self.header.y_min)?;
        writer.write_f64::<LittleEndian>(self.header.x_max)?;
        writer.write_f64::<LittleEndian>(self.header.y_max)?;
        writer.write_f64::<LittleEndian>(self.header.z_min)?;
        writer.write_f64::<LittleEndian>(self.header.z_max)?;
        writer.write_f64::<LittleEndian>(self.header.m_min)?;
        writer.write_f64::<LittleEndian>(self.header.m_max)?;

        for (i, record) in self.records.iter().enumerate() {
            writer.write_i32::<BigEndian>(i as i32 + 1)?;
            writer.write_i32::<BigEndian>(record.get_length() / 2)?;
            write_geometry_record(&mut writer, record)?;
        }

        Ok(())
    }

    fn write_shx(&self) -> Result<()> {
        let index_file = Path::new(&self.file_name).with_extension("shx");
        let f = File::create(&index_file)?;
        let mut writer = BufWriter::new(f);

        writer.write_i32::<BigEndian>(9994)?;
        for _ in 0..5 {
            writer.write_i32::<BigEndian>(0)?;
        }
        let file_length = (100 + 8 * self.num_records) as i32 / 2;
        writer.write_i32::<BigEndian>(file_length)?;
        writer.write_i32::<LittleEndian>(1000)?;
        writer.write_i32::<LittleEndian>(self.header.shape_type.to_int())?;
        writer.write_f64::<LittleEndian>(self.header.x_min)?;
        writer.write_f64::<LittleEndian>(self.header.y_min)?;
        writer.write_f64::<LittleEndian>(self.header.x_max)?;
        writer.write_f64::<LittleEndian>(self.header.y_max)?;
        writer.write_f64::<LittleEndian>(self.header.z_min)?;
        writer.write_f64::<LittleEndian>(self.header.z_max)?;
        writer.write_f64::<LittleEndian>(self.header.m_min)?;
        writer.write_f64::<LittleEndian>(self.header.m_max)?;

        let mut pos = 100i32;
        for record in &self.records {
            writer.write_i32::<BigEndian>(pos / 2)?;
            writer.write_i32::<BigEndian>(record.get_length() / 2)?;
            pos += 8 + record.get_length();
        }
        Ok(())
    }

    fn write_prj(&self) -> Result<()> {
        if !self.projection.is_empty() {
            let prj_file = Path::new(&self.file_name).with_extension("prj");
            let f = File::create(&prj_file)?;
            let mut writer = BufWriter::new(f);
            writer.write_all(self.projection.as_bytes())?;
        }
        Ok(())
    }

    fn write_dbf(&mut self) -> Result<()> {
        self.attributes.compute_field_widths();

        let dbf_file = Path::new(&self.file_name).with_extension("dbf");
        let f = File::create(&dbf_file)?;
        let mut writer = BufWriter::new(f);

        self.attributes.header.version = 3;
        writer.write_u8(3)?;
        let now = Local::now();
        writer.write_u8((now.year() - 1900) as u8)?;
        writer.write_u8(now.month() as u8)?;
        writer.write_u8(now.day() as u8)?;

        let num_records = self.attributes.num_records() as u32;
        self.attributes.header.num_records = num_records;
        writer.write_u32::<LittleEndian>(num_records)?;

        let header_size = 32u16 + self.attributes.fields.len() as u16 * 32u16 + 1u16;
        self.attributes.header.bytes_in_header = header_size;
        writer.write_u16::<LittleEndian>(header_size)?;

        let bytes_in_record: u16 =
            1 + self.attributes.fields.iter().map(|f| f.field_length as u16).sum::<u16>();
        self.attributes.header.bytes_in_record = bytes_in_record;
        writer.write_u16::<LittleEndian>(bytes_in_record)?;

        for _ in 0..17 {
            writer.write_u8(0)?;
        }
        writer.write_u8(0x1B)?;
        writer.write_u8(0)?;
        writer.write_u8(0)?;

        for field in &self.attributes.fields {
            let mut name_bytes = field.name.clone();
            if name_bytes.len() > 10 {
                name_bytes.truncate(10);
            }
            for _ in name_bytes.len()..11 {
                name_bytes.push(char::from(0));
            }
            writer.write_all(name_bytes.as_bytes())?;
            writer.write_u8(field.field_type as u8)?;
            for _ in 0..4 {
                writer.write_u8(0)?;
            }
            writer.write_u8(field.field_length)?;
            writer.write_u8(field.decimal_count)?;
            for _ in 0..14 {
                writer.write_u8(0)?;
            }
        }
        writer.write_u8(0x0D)?;

        for i in 0..self.attributes.num_records() {
            writer.write_u8(if self.attributes.is_deleted[i] { 0x2A } else { 0x20 })?;
            let rec = self.attributes.get_record(i);
            for (j, field) in self.attributes.fields.iter().enumerate() {
                let fl = field.field_length as usize;
                match &rec[j] {
                    FieldData::Null => {
                        writer.write_all(" ".repeat(fl).as_bytes())?;
                    }
                    FieldData::Int(v) => {
                        write_left_justified(&mut writer, &v.to_string(), fl)?;
                    }
                    FieldData::Real(v) => {
                        let rendered = render_real(*v, field.decimal_count);
                        write_left_justified(&mut writer, &rendered, fl)?;
                    }
                    FieldData::Bool(v) => {
                        writer.write_all(render_bool(*v).to_string().as_bytes())?;
                    }
                    FieldData::Date(v) => {
                        writer.write_all(format!("{}", v).as_bytes())?;
                    }
                    FieldData::Text(v) => {
                        write_left_justified(&mut writer, v, fl)?;
                    }
                }
            }
        }

        writer.write_u8(0x1A)?;
        Ok(())
    }

    fn calculate_extent(&mut self) {
        self.header.x_min = f64::INFINITY;
        self.header.x_max = f64::NEG_INFINITY;
        self.header.y_min = f64::INFINITY;
        self.header.y_max = f64::NEG_INFINITY;
        self.header.z_min = f64::INFINITY;
        self.header.z_max = f64::NEG_INFINITY;
        self.header.m_min = f64::INFINITY;
        self.header.m_max = f64::NEG_INFINITY;
        for sg in &self.records {
            if sg.x_min < self.header.x_min { self.header.x_min = sg.x_min; }
            if sg.x_max > self.header.x_max { self.header.x_max = sg.x_max; }
            if sg.y_min < self.header.y_min { self.header.y_min = sg.y_min; }
            if sg.y_max > self.header.y_max { self.header.y_max = sg.y_max; }
            if sg.has_z_data() {
                if sg.z_min < self.header.z_min { self.header.z_min = sg.z_min; }
                if sg.z_max > self.header.z_max { self.header.z_max = sg.z_max; }
            }
            if sg.has_m_data() {
                if sg.m_min < self.header.m_min { self.header.m_min = sg.m_min; }
                if sg.m_max > self.header.m_max { self.header.m_max = sg.m_max; }
            }
        }
        if !self.records.iter().any(|r| r.has_z_data()) {
            self.header.z_min = 0.0;
            self.header.z_max = 0.0;
        }
        if !self.records.iter().any(|r| r.has_m_data()) {
            self.header.m_min = 0.0;
            self.header.m_max = 0.0;
        }
    }
}

fn write_left_justified<W: Write>(writer: &mut W, s: &str, width: usize) -> Result<()> {
    if s.len() < width {
        let pad = " ".repeat(width - s.len());
        writer.write_all(format!("{}{}", s, pad).as_bytes())?;
    } else {
        writer.write_all(s[0..width].as_bytes())?;
    }
    Ok(())
}

fn read_geometry_record<R: Read + Seek>(
    bor: &mut ByteOrderReader<R>,
    shape_type: ShapeType,
    content_length: i32,
) -> Result<ShapefileGeometry> {
    let mut sfg = ShapefileGeometry::new(shape_type);
    match shape_type {
        ShapeType::Point => {
            sfg.add_point(Point2D { x: bor.read_f64()?, y: bor.read_f64()? });
        }
        ShapeType::PointM => {
            let p = Point2D { x: bor.read_f64()?, y: bor.read_f64()? };
            sfg.add_pointm(p, bor.read_f64()?);
        }
        ShapeType::PointZ => {
            let p = Point2D { x: bor.read_f64()?, y: bor.read_f64()? };
            let z = bor.read_f64()?;
            let m = bor.read_f64()?;
            sfg.add_pointz(p, m, z);
        }
        ShapeType::PolyLine | ShapeType::Polygon | ShapeType::MultiPoint => {
            read_bbox_into(bor, &mut sfg)?;
            let num_parts = if shape_type == ShapeType::MultiPoint { 0 } else { bor.read_i32()? };
            let num_points = bor.read_i32()?;
            sfg.num_parts = num_parts;
            for _ in 0..num_parts {
                sfg.parts.push(bor.read_i32()?);
            }
            for _ in 0..num_points {
                sfg.points.push(Point2D { x: bor.read_f64()?, y: bor.read_f64()? });
            }
            sfg.num_points = num_points;
        }
        ShapeType::PolyLineM | ShapeType::PolygonM | ShapeType::MultiPointM => {
            read_bbox_into(bor, &mut sfg)?;
            let num_parts = if shape_type == ShapeType::MultiPointM { 0 } else { bor.read_i32()? };
            let num_points = bor.read_i32()?;
            sfg.num_parts = num_parts;
            for _ in 0..num_parts {
                sfg.parts.push(bor.read_i32()?);
            }
            for _ in 0..num_points {
                sfg.points.push(Point2D { x: bor.read_f64()?, y: bor.read_f64()? });
            }
            sfg.num_points = num_points;
            sfg.m_min = bor.read_f64()?;
            sfg.m_max = bor.read_f64()?;
            for _ in 0..num_points {
                sfg.m_array.push(bor.read_f64()?);
            }
        }
        ShapeType::PolyLineZ | ShapeType::PolygonZ | ShapeType::MultiPointZ => {
            read_bbox_into(bor, &mut sfg)?;
            let num_parts = if shape_type == ShapeType::MultiPointZ { 0 } else { bor.read_i32()? };
            let num_points = bor.read_i32()?;
            sfg.num_parts = num_parts;
            for _ in 0..num_parts {
                sfg.parts.push(bor.read_i32()?);
            }
            for _ in 0..num_points {
                sfg.points.push(Point2D { x: bor.read_f64()?, y: bor.read_f64()? });
            }
            sfg.num_points = num_points;
            sfg.z_min = bor.read_f64()?;
            sfg.z_max = bor.read_f64()?;
            for _ in 0..num_points {
                sfg.z_array.push(bor.read_f64()?);
            }
            let length_without_m = geometry_length_without_m(shape_type, num_parts, num_points);
            if content_length != length_without_m {
                sfg.m_min = bor.read_f64()?;
                sfg.m_max = bor.read_f64()?;
                for _ in 0..num_points {
                    sfg.m_array.push(bor.read_f64()?);
                }
            }
        }
        ShapeType::Null => unreachable!("Null records are rejected before this point"),
    }
    Ok(sfg)
}

fn read_bbox_into<R: Read + Seek>(bor: &mut ByteOrderReader<R>, sfg: &mut ShapefileGeometry) -> Result<()> {
    sfg.x_min = bor.read_f64()?;
    sfg.y_min = bor.read_f64()?;
    sfg.x_max = bor.read_f64()?;
    sfg.y_max = bor.read_f64()?;
    Ok(())
}

fn geometry_length_without_m(shape_type: ShapeType, num_parts: i32, num_points: i32) -> i32 {
    match shape_type {
        ShapeType::PolyLineZ | ShapeType::PolygonZ => {
            44 + 4 * num_parts + 16 * num_points + 16 + 8 * num_points
        }
        ShapeType::MultiPointZ => 40 + 16 * num_points + 16 + 8 * num_points,
        _ => unreachable!(),
    }
}

fn write_geometry_record<W: Write>(writer: &mut W, record: &ShapefileGeometry) -> Result<()> {
    writer.write_i32::<LittleEndian>(record.shape_type.to_int())?;
    match record.shape_type {
        ShapeType::Point => {
            writer.write_f64::<LittleEndian>(record.points[0].x)?;
            writer.write_f64::<LittleEndian>(record.points[0].y)?;
        }
        ShapeType::PointM => {
            writer.write_f64::<LittleEndian>(record.points[0].x)?;
            writer.write_f64::<LittleEndian>(record.points[0].y)?;
            writer.write_f64::<LittleEndian>(record.m_array[0])?;
        }
        ShapeType::PointZ => {
            writer.write_f64::<LittleEndian>(record.points[0].x)?;
            writer.write_f64::<LittleEndian>(record.points[0].y)?;
            writer.write_f64::<LittleEndian>(record.z_array[0])?;
            writer.write_f64::<LittleEndian>(record.m_array[0])?;
        }
        ShapeType::PolyLine | ShapeType::Polygon => {
            write_bbox(writer, record)?;
            writer.write_i32::<LittleEndian>(record.num_parts)?;
            writer.write_i32::<LittleEndian>(record.num_points)?;
            for part in &record.parts {
                writer.write_i32::<LittleEndian>(*part)?;
            }
            for pt in &record.points {
                writer.write_f64::<LittleEndian>(pt.x)?;
                writer.write_f64::<LittleEndian>(pt.y)?;
            }
        }
        ShapeType::MultiPoint => {
            write_bbox(writer, record)?;
            writer.write_i32::<LittleEndian>(record.num_points)?;
            for pt in &record.points {
                writer.write_f64::<LittleEndian>(pt.x)?;
                writer.write_f64::<LittleEndian>(pt.y)?;
            }
        }
        ShapeType::PolyLineZ | ShapeType::PolygonZ => {
            write_bbox(writer, record)?;
            writer.write_i32::<LittleEndian>(record.num_parts)?;
            writer.write_i32::<LittleEndian>(record.num_points)?;
            for part in &record.parts {
                writer.write_i32::<LittleEndian>(*part)?;
            }
            for pt in &record.points {
                writer.write_f64::<LittleEndian>(pt.x)?;
                writer.write_f64::<LittleEndian>(pt.y)?;
            }
            writer.write_f64::<LittleEndian>(record.z_min)?;
            writer.write_f64::<LittleEndian>(record.z_max)?;
            for z in &record.z_array {
                writer.write_f64::<LittleEndian>(*z)?;
            }
            if record.has_m_data() {
                writer.write_f64::<LittleEndian>(record.m_min)?;
                writer.write_f64::<LittleEndian>(record.m_max)?;
                for m in &record.m_array {
                    writer.write_f64::<LittleEndian>(*m)?;
                }
            }
        }
        ShapeType::MultiPointZ => {
            write_bbox(writer, record)?;
            writer.write_i32::<LittleEndian>(record.num_points)?;
            for pt in &record.points {
                writer.write_f64::<LittleEndian>(pt.x)?;
                writer.write_f64::<LittleEndian>(pt.y)?;
            }
            writer.write_f64::<LittleEndian>(record.z_min)?;
            writer.write_f64::<LittleEndian>(record.z_max)?;
            for z in &record.z_array {
                writer.write_f64::<LittleEndian>(*z)?;
            }
            if record.has_m_data() {
                writer.write_f64::<LittleEndian>(record.m_min)?;
                writer.write_f64::<LittleEndian>(record.m_max)?;
                for m in &record.m_array {
                    writer.write_f64::<LittleEndian>(*m)?;
                }
            }
        }
        ShapeType::PolyLineM | ShapeType::PolygonM => {
            write_bbox(writer, record)?;
            writer.write_i32::<LittleEndian>(record.num_parts)?;
            writer.write_i32::<LittleEndian>(record.num_points)?;
            for part in &record.parts {
                writer.write_i32::<LittleEndian>(*part)?;
            }
            for pt in &record.points {
                writer.write_f64::<LittleEndian>(pt.x)?;
                writer.write_f64::<LittleEndian>(pt.y)?;
            }
            writer.write_f64::<LittleEndian>(record.m_min)?;
            writer.write_f64::<LittleEndian>(record.m_max)?;
            for m in &record.m_array {
                writer.write_f64::<LittleEndian>(*m)?;
            }
        }
        ShapeType::MultiPointM => {
            write_bbox(writer, record)?;
            writer.write_i32::<LittleEndian>(record.num_points)?;
            for pt in &record.points {
                writer.write_f64::<LittleEndian>(pt.x)?;
                writer.write_f64::<LittleEndian>(pt.y)?;
            }
            writer.write_f64::<LittleEndian>(record.m_min)?;
            writer.write_f64::<LittleEndian>(record.m_max)?;
            for m in &record.m_array {
                writer.write_f64::<LittleEndian>(*m)?;
            }
        }
        ShapeType::Null => {}
    }
    Ok(())
}

fn write_bbox<W: Write>(writer: &mut W, record: &ShapefileGeometry) -> Result<()> {
    writer.write_f64::<LittleEndian>(record.x_min)?;
    writer.write_f64::<LittleEndian>(record.y_min)?;
    writer.write_f64::<LittleEndian>(record.x_max)?;
    writer.write_f64::<LittleEndian>(record.y_max)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::CollectWarnings;

    #[test]
    fn test_s1_round_trip_single_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("point.shp");
        let path_str = path.to_str().unwrap();

        let mut sf = Shapefile::new(path_str, ShapeType::Point).unwrap();
        sf.attributes.add_field(&AttributeField::new("name", 'C', 10, 0));
        sf.attributes.add_field(&AttributeField::new("n", 'N', 5, 0));
        sf.add_point_record(0.5, 0.25).unwrap();
        sf.attributes.add_record(vec![FieldData::Text("a".to_string()), FieldData::Int(7)], false);
        sf.write().unwrap();

        let mut sink = CollectWarnings::default();
        let reloaded = Shapefile::read_with_sink(path_str, &mut sink).unwrap();
        assert_eq!(reloaded.header.shape_type, ShapeType::Point);
        assert_eq!(reloaded.num_records, 1);
        assert_eq!(reloaded.records[0].points[0].x, 0.5);
        assert_eq!(reloaded.records[0].points[0].y, 0.25);
        assert_eq!(reloaded.attributes.get_record(0)[0], FieldData::Text("a".to_string()));
        assert_eq!(reloaded.attributes.get_record(0)[1], FieldData::Int(7));
    }

    #[test]
    fn test_null_shape_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("null.shp");
        let path_str = path.to_str().unwrap().to_string();

        // hand-craft a minimal shapefile containing a single Null record
        let f = File::create(&path).unwrap();
        let mut writer = BufWriter::new(f);
        writer.write_i32::<BigEndian>(9994).unwrap();
        for _ in 0..5 {
            writer.write_i32::<BigEndian>(0).unwrap();
        }
        writer.write_i32::<BigEndian>((100 + 12) / 2).unwrap();
        writer.write_i32::<LittleEndian>(1000).unwrap();
        writer.write_i32::<LittleEndian>(ShapeType::Point.to_int()).unwrap();
        for _ in 0..8 {
            writer.write_f64::<LittleEndian>(0.0).unwrap();
        }
        writer.write_i32::<BigEndian>(1).unwrap();
        writer.write_i32::<BigEndian>(2).unwrap();
        writer.write_i32::<LittleEndian>(0).unwrap(); // Null shape tag
        drop(writer);

        // also write a minimal, empty dbf so read_file doesn't fail on that first
        let dbf_path = Path::new(&path_str).with_extension("dbf");
        let f = File::create(&dbf_path).unwrap();
        let mut writer = BufWriter::new(f);
        writer.write_u8(3).unwrap();
        writer.write_u8(0).unwrap();
        writer.write_u8(1).unwrap();
        writer.write_u8(1).unwrap();
        writer.write_u32::<LittleEndian>(0).unwrap();
        writer.write_u16::<LittleEndian>(33).unwrap();
        writer.write_u16::<LittleEndian>(1).unwrap();
        for _ in 0..20 {
            writer.write_u8(0).unwrap();
        }
        writer.write_u8(0x0D).unwrap();
        writer.write_u8(0x1A).unwrap();
        drop(writer);

        let result = Shapefile::read(&path_str);
        assert!(matches!(result, Err(GrtsError::InvalidGeometry(_))));
    }

    #[test]
    fn test_truncated_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.shp");
        let path_str = path.to_str().unwrap().to_string();

        // an .shp file with fewer than the 100-byte fixed header
        let f = File::create(&path).unwrap();
        let mut writer = BufWriter::new(f);
        writer.write_i32::<BigEndian>(9994).unwrap();
        writer.write_i32::<BigEndian>(0).unwrap();
        drop(writer);

        let result = Shapefile::read(&path_str);
        assert!(matches!(result, Err(GrtsError::Truncated { .. })));
    }
}
