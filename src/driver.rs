/*
This code is part of the GRTS spatial sampling engine.
License: MIT

Notes: a thin facade over the codec, grid, sampler and address modules.
Mirrors the external library surface: read/write helpers, grid-sizing,
and the multi-file union adapter that treats every `*.shp` in a
directory as a single logical dataset.
*/
use rand::Rng;
use std::fs;

use crate::address::{self, Address};
use crate::algorithms::point_in_polygon_parts;
use crate::config::GrtsConfig;
use crate::error::{GrtsError, Result, WarningSink};
use crate::grid::{self, GridResult, RecordGeometry};
use crate::sampler;
use crate::shapefile::attributes::{AttributeField, FieldData, ShapefileAttributes};
use crate::shapefile::geometry::{ShapeType, ShapefileGeometry};
use crate::shapefile::Shapefile;
use crate::structures::{BoundingBox, Point2D};

/// Reads a named shapefile, or if `path` is `None`, unions every `*.shp`
/// file found in the current working directory into one in-memory
/// dataset. Union requires every member to share a shape type and a
/// dBASE schema; record numbers are reassigned densely across the union.
pub fn read_shapefile<S: WarningSink>(path: Option<&str>, sink: &mut S) -> Result<Shapefile> {
    match path {
        Some(p) => Shapefile::read_with_sink(p, sink),
        None => union_shapefiles_in_cwd(sink),
    }
}

fn union_shapefiles_in_cwd<S: WarningSink>(sink: &mut S) -> Result<Shapefile> {
    let mut paths: Vec<String> = fs::read_dir(".")?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "shp").unwrap_or(false))
        .filter_map(|p| p.to_str().map(|s| s.to_string()))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(GrtsError::InvalidGeometry("no .shp files found in working directory".into()));
    }

    let mut merged = Shapefile::read_with_sink(&paths[0], sink)?;
    for p in &paths[1..] {
        let next = Shapefile::read_with_sink(p, sink)?;
        if next.header.shape_type != merged.header.shape_type {
            return Err(GrtsError::SchemaMismatch(format!(
                "{} has shape type {} but {} has {}",
                p, next.header.shape_type, paths[0], merged.header.shape_type
            )));
        }
        if !merged.attributes.schema_matches(&next.attributes) {
            return Err(GrtsError::SchemaMismatch(format!(
                "{} has a dBASE schema that disagrees with {}",
                p, paths[0]
            )));
        }
        for rec in next.records {
            merged.records.push(rec);
        }
        for i in 0..next.attributes.num_records() {
            merged
                .attributes
                .add_record(next.attributes.get_record(i).clone(), next.attributes.is_deleted[i]);
        }
    }
    merged.num_records = merged.records.len();
    Ok(merged)
}

/// Convenience accessor rejecting non-point inputs.
pub fn read_points<S: WarningSink>(path: Option<&str>, sink: &mut S) -> Result<(Vec<f64>, Vec<f64>)> {
    let sf = read_shapefile(path, sink)?;
    if sf.header.shape_type.base_shape_type() != ShapeType::Point {
        return Err(GrtsError::InvalidGeometry("dataset is not a point shapefile".into()));
    }
    let xs = sf.records.iter().map(|r| r.points[0].x).collect();
    let ys = sf.records.iter().map(|r| r.points[0].y).collect();
    Ok((xs, ys))
}

pub fn read_dbf<S: WarningSink>(path: Option<&str>, sink: &mut S) -> Result<ShapefileAttributes> {
    let sf = read_shapefile(path, sink)?;
    Ok(sf.attributes)
}

pub fn write_shapefile_point(
    xs: &[f64],
    ys: &[f64],
    prj_src: Option<&str>,
    fields: &[Vec<FieldData>],
    field_defs: &[AttributeField],
    out_prefix: &str,
) -> Result<()> {
    let mut sf = Shapefile::new(out_prefix, ShapeType::Point)?;
    if let Some(prj_path) = prj_src {
        sf.projection = fs::read_to_string(prj_path)?;
    }
    for f in field_defs {
        sf.attributes.add_field(f);
    }
    for i in 0..xs.len() {
        sf.add_point_record(xs[i], ys[i])?;
    }
    for row in fields {
        sf.attributes.add_record(row.clone(), false);
    }
    sf.write()
}

pub fn write_shapefile_polygon(
    nparts: &[i32],
    npoints: &[i32],
    parts: &[i32],
    xs: &[f64],
    ys: &[f64],
    prj_src: Option<&str>,
    fields: &[Vec<FieldData>],
    field_defs: &[AttributeField],
    out_prefix: &str,
) -> Result<()> {
    let mut sf = Shapefile::new(out_prefix, ShapeType::Polygon)?;
    if let Some(prj_path) = prj_src {
        sf.projection = fs::read_to_string(prj_path)?;
    }
    for f in field_defs {
        sf.attributes.add_field(f);
    }

    let mut point_offset = 0usize;
    let mut part_offset = 0usize;
    for r in 0..nparts.len() {
        let mut sfg = ShapefileGeometry::new(ShapeType::Polygon);
        let this_nparts = nparts[r] as usize;
        let this_npoints = npoints[r] as usize;
        let record_parts = &parts[part_offset..part_offset + this_nparts];
        let record_points: Vec<Point2D> = (point_offset..point_offset + this_npoints)
            .map(|i| Point2D::new(xs[i], ys[i]))
            .collect();
        for (p, &start) in record_parts.iter().enumerate() {
            let end = if p + 1 < record_parts.len() {
                record_parts[p + 1] as usize
            } else {
                this_npoints
            };
            sfg.add_part(&record_points[start as usize..end]);
        }
        sf.add_record(sfg)?;
        point_offset += this_npoints;
        part_offset += this_nparts;
    }
    for row in fields {
        sf.attributes.add_record(row.clone(), false);
    }
    sf.write()
}

pub fn write_dbf(field_defs: &[AttributeField], rows: &[Vec<FieldData>], out_prefix: &str) -> Result<()> {
    let mut attrs = ShapefileAttributes::default();
    for f in field_defs {
        attrs.add_field(f);
    }
    for row in rows {
        attrs.add_record(row.clone(), false);
    }
    attrs.compute_field_widths();

    // write_dbf alone (no companion .shp) reuses the Shapefile writer by
    // routing through a throwaway point shapefile whose geometry is
    // discarded by the caller; simplest to call the private writer via a
    // minimal Shapefile wrapper.
    let path = if out_prefix.contains('.') {
        out_prefix.to_string()
    } else {
        format!("{}.dbf", out_prefix)
    };
    write_dbf_standalone(&attrs, &path)
}

fn write_dbf_standalone(attrs: &ShapefileAttributes, path: &str) -> Result<()> {
    use byteorder::{LittleEndian, WriteBytesExt};
    use chrono::prelude::*;
    use std::io::{BufWriter, Write};

    let mut attrs = attrs.clone();
    attrs.compute_field_widths();

    let f = fs::File::create(path)?;
    let mut writer = BufWriter::new(f);

    writer.write_u8(3)?;
    let now = Local::now();
    writer.write_u8((now.year() - 1900) as u8)?;
    writer.write_u8(now.month() as u8)?;
    writer.write_u8(now.day() as u8)?;
    writer.write_u32::<LittleEndian>(attrs.num_records() as u32)?;
    let header_size = 32u16 + attrs.fields.len() as u16 * 32u16 + 1u16;
    writer.write_u16::<LittleEndian>(header_size)?;
    let bytes_in_record: u16 = 1 + attrs.fields.iter().map(|f| f.field_length as u16).sum::<u16>();
    writer.write_u16::<LittleEndian>(bytes_in_record)?;
    for _ in 0..20 {
        writer.write_u8(0)?;
    }
    for field in &attrs.fields {
        let mut name_bytes = field.name.clone();
        name_bytes.truncate(10);
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
    for i in 0..attrs.num_records() {
        writer.write_u8(if attrs.is_deleted[i] { 0x2A } else { 0x20 })?;
        let rec = attrs.get_record(i);
        for (j, field) in attrs.fields.iter().enumerate() {
            let fl = field.field_length as usize;
            let rendered = match &rec[j] {
                FieldData::Null => " ".repeat(fl),
                FieldData::Int(v) => format!("{:<width$}", v, width = fl),
                FieldData::Real(v) => format!(
                    "{:<width$}",
                    crate::shapefile::attributes::render_real(*v, field.decimal_count),
                    width = fl
                ),
                FieldData::Bool(v) => crate::shapefile::attributes::render_bool(*v).to_string(),
                FieldData::Date(v) => format!("{}", v),
                FieldData::Text(v) => format!("{:<width$}", v, width = fl),
            };
            writer.write_all(rendered.as_bytes())?;
        }
    }
    writer.write_u8(0x1A)?;
    Ok(())
}

/// A self-contained summary of the grid the sampler will draw from.
#[derive(Debug, Clone)]
pub struct GridSpec {
    pub level: u32,
    pub dx: f64,
    pub dy: f64,
    pub xc: Vec<f64>,
    pub yc: Vec<f64>,
    pub weights: Vec<f64>,
    pub sint: f64,
}

impl From<GridResult> for GridSpec {
    fn from(g: GridResult) -> GridSpec {
        GridSpec { level: g.level, dx: g.dx, dy: g.dy, xc: g.xc, yc: g.yc, weights: g.weights, sint: g.sint }
    }
}

/// Reads the dataset (or unions the directory), builds its bounding box
/// and a per-cell weight closure from the declared weight field(s), and
/// runs the adaptive refinement loop.
pub fn num_levels<R: Rng, S: WarningSink>(
    path: Option<&str>,
    n_samples: f64,
    cfg: &GrtsConfig,
    weight_field: Option<&str>,
    rng: &mut R,
    sink: &mut S,
) -> Result<GridSpec> {
    let sf = read_shapefile(path, sink)?;
    let bbox = dataset_bbox(&sf);
    let base_type = sf.header.shape_type.base_shape_type();
    let weight_col = weight_field.and_then(|name| sf.attributes.fields.iter().position(|f| f.name == name));

    let record_weight = |_record: &ShapefileGeometry, idx: usize| -> f64 {
        weight_col
            .map(|col| match &sf.attributes.get_record(idx)[col] {
                FieldData::Real(v) => *v,
                FieldData::Int(v) => *v as f64,
                _ => 1.0,
            })
            .unwrap_or(1.0)
    };

    // Owned per-record part storage; `RecordGeometry` itself only borrows
    // slices, so this lives for the whole refinement loop.
    let parts_storage: Vec<Vec<Vec<Point2D>>> = sf
        .records
        .iter()
        .map(|r| {
            let nparts = r.num_parts.max(1) as usize;
            (0..nparts)
                .map(|p| {
                    let (start, end) = r.part_range(p);
                    r.points[start..end].to_vec()
                })
                .collect()
        })
        .collect();
    let directions_storage: Vec<Vec<i32>> = sf
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| (0..parts_storage[i].len()).map(|p| r.ring_direction(p)).collect())
        .collect();

    let result = grid::build_grid(
        bbox,
        n_samples,
        cfg,
        |cell| {
            let mut total = 0.0;
            for (i, record) in sf.records.iter().enumerate() {
                if !record.get_bounding_box().overlaps(cell) {
                    continue;
                }
                let part_refs: Vec<&[Point2D]> = parts_storage[i].iter().map(|p| p.as_slice()).collect();
                let geom = match base_type {
                    ShapeType::Polygon => {
                        RecordGeometry::Polygon { rings: part_refs, directions: directions_storage[i].clone() }
                    }
                    ShapeType::PolyLine => RecordGeometry::Polyline { parts: part_refs },
                    _ => RecordGeometry::Point(record.points[0]),
                };
                total += grid::cell_weight(cell, &geom, record_weight(record, i));
            }
            total
        },
        rng,
    );
    Ok(result.into())
}

fn dataset_bbox(sf: &Shapefile) -> BoundingBox {
    let mut bbox = sf.records[0].get_bounding_box();
    for r in &sf.records[1..] {
        bbox.expand_to(r.get_bounding_box());
    }
    bbox
}

/// Builds one hierarchical address per grid cell.
pub fn construct_addresses(xc: &[f64], yc: &[f64], dx: f64, dy: f64, nlev: u32) -> Vec<Address> {
    xc.iter().zip(yc.iter()).map(|(&x, &y)| address::construct_address(x, y, dx, dy, nlev)).collect()
}

pub use crate::address::randomize_addresses;
pub use crate::sampler::{get_record_ids, pick_grid_cells};

/// Union of the bounding boxes of the named records.
pub fn get_shape_box<S: WarningSink>(path: Option<&str>, ids: &[usize], sink: &mut S) -> Result<BoundingBox> {
    let sf = read_shapefile(path, sink)?;
    if ids.is_empty() {
        return Err(GrtsError::InvalidGeometry("no record ids given".into()));
    }
    let mut bbox = sf.records[ids[0]].get_bounding_box();
    for &id in &ids[1..] {
        bbox.expand_to(sf.records[id].get_bounding_box());
    }
    Ok(bbox)
}

/// Draws one rejection-sampled interior point per `(cell, record)` pair.
pub fn pick_area_sample_points<R: Rng, S: WarningSink>(
    path: Option<&str>,
    record_ids: &[usize],
    xc: &[f64],
    yc: &[f64],
    dx: f64,
    dy: f64,
    max_try: u32,
    rng: &mut R,
    sink: &mut S,
) -> Result<(Vec<bool>, Vec<f64>, Vec<f64>)> {
    let sf = read_shapefile(path, sink)?;
    let mut failed = Vec::with_capacity(record_ids.len());
    let mut xs = Vec::with_capacity(record_ids.len());
    let mut ys = Vec::with_capacity(record_ids.len());
    for (i, &rec_id) in record_ids.iter().enumerate() {
        let record = &sf.records[rec_id];
        let nparts = record.num_parts.max(1) as usize;
        let rings: Vec<Vec<Point2D>> = (0..nparts)
            .map(|p| {
                let (start, end) = record.part_range(p);
                record.points[start..end].to_vec()
            })
            .collect();
        let ring_refs: Vec<&[Point2D]> = rings.iter().map(|r| r.as_slice()).collect();
        let cell = BoundingBox::new(xc[i], xc[i] + dx, yc[i], yc[i] + dy);
        let outcome = sampler::pick_area_sample_point(record.get_bounding_box(), cell, &ring_refs, max_try, rng);
        failed.push(outcome.no_point_found);
        xs.push(outcome.x);
        ys.push(outcome.y);
    }
    Ok((failed, xs, ys))
}

/// Draws one arc-length sampled point per `(cell, record)` pair along a
/// polyline record.
pub fn pick_linear_sample_points<R: Rng, S: WarningSink>(
    path: Option<&str>,
    record_ids: &[usize],
    xc: &[f64],
    yc: &[f64],
    dx: f64,
    dy: f64,
    rng: &mut R,
    sink: &mut S,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let sf = read_shapefile(path, sink)?;
    let mut xs = Vec::with_capacity(record_ids.len());
    let mut ys = Vec::with_capacity(record_ids.len());
    for (i, &rec_id) in record_ids.iter().enumerate() {
        let record = &sf.records[rec_id];
        let nparts = record.num_parts.max(1) as usize;
        let parts: Vec<Vec<Point2D>> = (0..nparts)
            .map(|p| {
                let (start, end) = record.part_range(p);
                record.points[start..end].to_vec()
            })
            .collect();
        let part_refs: Vec<&[Point2D]> = parts.iter().map(|p| p.as_slice()).collect();
        let cell = BoundingBox::new(xc[i], xc[i] + dx, yc[i], yc[i] + dy);
        match sampler::pick_linear_sample_point(cell, &part_refs, 1.0, rng) {
            Some((x, y)) => {
                xs.push(x);
                ys.push(y);
            }
            None => {
                xs.push(f64::NAN);
                ys.push(f64::NAN);
            }
        }
    }
    Ok((xs, ys))
}

/// Independent Random Sample over polyline records, one draw per id.
pub fn linear_sample_irs<R: Rng, S: WarningSink>(
    path: Option<&str>,
    ids: &[usize],
    rng: &mut R,
    sink: &mut S,
) -> Result<(Vec<f64>, Vec<f64>, Vec<usize>)> {
    let sf = read_shapefile(path, sink)?;
    let mut xs = Vec::with_capacity(ids.len());
    let mut ys = Vec::with_capacity(ids.len());
    let mut kept_ids = Vec::with_capacity(ids.len());
    for &id in ids {
        let record = &sf.records[id];
        let nparts = record.num_parts.max(1) as usize;
        let parts: Vec<Vec<Point2D>> = (0..nparts)
            .map(|p| {
                let (start, end) = record.part_range(p);
                record.points[start..end].to_vec()
            })
            .collect();
        let part_refs: Vec<&[Point2D]> = parts.iter().map(|p| p.as_slice()).collect();
        if let Some((x, y)) = sampler::linear_sample_irs(&part_refs, rng) {
            xs.push(x);
            ys.push(y);
            kept_ids.push(id);
        }
    }
    Ok((xs, ys, kept_ids))
}

/// Whether each query point falls inside the (possibly multi-part,
/// multi-ring) polygon described by `poly_x`/`poly_y`.
pub fn point_in_polygon_object(pt_x: &[f64], pt_y: &[f64], poly_x: &[f64], poly_y: &[f64]) -> Vec<bool> {
    let ring: Vec<Point2D> = poly_x.iter().zip(poly_y.iter()).map(|(&x, &y)| Point2D::new(x, y)).collect();
    pt_x.iter()
        .zip(pt_y.iter())
        .map(|(&x, &y)| point_in_polygon_parts(Point2D::new(x, y), &[&ring]))
        .collect()
}

/// For each query point, which record (if any) of a polygon dataset
/// contains it, and that record's declared weight.
pub fn point_in_polygon_file<S: WarningSink>(
    path: Option<&str>,
    x: &[f64],
    y: &[f64],
    weight_field: Option<&str>,
    sink: &mut S,
) -> Result<(Vec<f64>, Vec<Option<usize>>)> {
    let sf = read_shapefile(path, sink)?;
    if sf.header.shape_type.base_shape_type() != ShapeType::Polygon {
        return Err(GrtsError::InvalidGeometry("dataset is not a polygon shapefile".into()));
    }
    let weight_col = weight_field.and_then(|name| sf.attributes.fields.iter().position(|f| f.name == name));

    let mut weight_at_point = Vec::with_capacity(x.len());
    let mut containing_id = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        let p = Point2D::new(x[i], y[i]);
        let mut found: Option<usize> = None;
        for (rec_idx, record) in sf.records.iter().enumerate() {
            if !record.get_bounding_box().is_point_in_box(p.x, p.y) {
                continue;
            }
            let nparts = record.num_parts.max(1) as usize;
            let rings: Vec<Vec<Point2D>> = (0..nparts)
                .map(|pn| {
                    let (start, end) = record.part_range(pn);
                    record.points[start..end].to_vec()
                })
                .collect();
            let ring_refs: Vec<&[Point2D]> = rings.iter().map(|r| r.as_slice()).collect();
            if point_in_polygon_parts(p, &ring_refs) {
                found = Some(rec_idx);
                break;
            }
        }
        match found {
            Some(id) => {
                let w = weight_col
                    .map(|col| match &sf.attributes.get_record(id)[col] {
                        FieldData::Real(v) => *v,
                        FieldData::Int(v) => *v as f64,
                        _ => 1.0,
                    })
                    .unwrap_or(1.0);
                weight_at_point.push(w);
                containing_id.push(Some(id));
            }
            None => {
                weight_at_point.push(0.0);
                containing_id.push(None);
            }
        }
    }
    Ok((weight_at_point, containing_id))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::DiscardWarnings;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_point_in_polygon_object_unit_square() {
        let poly_x = vec![0.0, 0.0, 1.0, 1.0, 0.0];
        let poly_y = vec![0.0, 1.0, 1.0, 0.0, 0.0];
        let hits = point_in_polygon_object(&[0.5, 1.5], &[0.5, 0.5], &poly_x, &poly_y);
        assert_eq!(hits, vec![true, false]);
    }

    #[test]
    fn test_write_then_read_point_shapefile_driver() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("pts").to_str().unwrap().to_string();
        let field_defs = vec![AttributeField::new("ID", 'N', 5, 0)];
        let fields = vec![vec![FieldData::Int(1)], vec![FieldData::Int(2)]];
        write_shapefile_point(&[1.0, 2.0], &[3.0, 4.0], None, &fields, &field_defs, &prefix).unwrap();

        let mut sink = DiscardWarnings;
        let (xs, ys) = read_points(Some(&format!("{}.shp", prefix)), &mut sink).unwrap();
        assert_eq!(xs, vec![1.0, 2.0]);
        assert_eq!(ys, vec![3.0, 4.0]);
    }

    #[test]
    fn test_num_levels_unit_square_polygon() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("poly").to_str().unwrap().to_string();
        write_shapefile_polygon(
            &[1],
            &[5],
            &[0],
            &[0.0, 0.0, 1.0, 1.0, 0.0],
            &[0.0, 1.0, 1.0, 0.0, 0.0],
            None,
            &[],
            &[],
            &prefix,
        )
        .unwrap();

        let mut cfg = GrtsConfig::default();
        cfg.shift_grid = false;
        cfg.max_level = 6;
        let mut rng = SmallRng::seed_from_u64(11);
        let mut sink = DiscardWarnings;
        let spec = num_levels(Some(&format!("{}.shp", prefix)), 4.0, &cfg, None, &mut rng, &mut sink).unwrap();
        assert!(spec.level >= 1);
        let total: f64 = spec.weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
