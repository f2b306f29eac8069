/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
use rand::Rng;

use crate::config::GrtsConfig;
use crate::structures::BoundingBox;

/// Output of the adaptive grid refinement loop.
#[derive(Debug, Clone)]
pub struct GridResult {
    pub level: u32,
    pub dx: f64,
    pub dy: f64,
    /// Lower-left x corner of every cell, `n*n` long, x varying fastest.
    pub xc: Vec<f64>,
    /// Lower-left y corner of every cell, `n*n` long, x varying fastest.
    pub yc: Vec<f64>,
    pub weights: Vec<f64>,
    pub sint: f64,
}

fn seq(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

fn start_level(n_samples: f64) -> u32 {
    if n_samples <= 1.0 {
        return 1;
    }
    (n_samples.ln() / 4f64.ln()).ceil().max(1.0) as u32
}

/// Builds and adaptively refines the quadtree grid over `bbox` until
/// every cell's inclusion weight falls within the target interval.
/// `cell_weight_fn` returns the total weight contributed by all records
/// to a given cell, aggregated over whatever records overlap it.
pub fn build_grid<F, R>(
    bbox: BoundingBox,
    n_samples: f64,
    cfg: &GrtsConfig,
    mut cell_weight_fn: F,
    rng: &mut R,
) -> GridResult
where
    F: FnMut(BoundingBox) -> f64,
    R: Rng,
{
    let x_range = bbox.get_width();
    let y_range = bbox.get_height();
    let ext = x_range.max(y_range);
    let grid_x_min = bbox.min_x - ext * 0.04;
    let grid_y_min = bbox.min_y - ext * 0.04;
    let grid_side = ext * 1.08;

    let mut level = cfg.start_level.unwrap_or_else(|| start_level(n_samples));
    if level < 1 {
        level = 1;
    }

    let mut prev_max_weight: Option<f64> = None;
    let mut stall_count = 0u32;

    loop {
        let n = 1usize << level;
        let dx = grid_side / n as f64;
        let dy = grid_side / n as f64;

        let mut x_corners = seq(grid_x_min, grid_x_min + grid_side, n + 1);
        let mut y_corners = seq(grid_y_min, grid_y_min + grid_side, n + 1);
        x_corners.truncate(n);
        y_corners.truncate(n);

        if cfg.shift_grid {
            for x in x_corners.iter_mut() {
                *x += rng.gen_range(0.0..dx);
            }
            for y in y_corners.iter_mut() {
                *y += rng.gen_range(0.0..dy);
            }
        }

        let mut xc = Vec::with_capacity(n * n);
        let mut yc = Vec::with_capacity(n * n);
        let mut weights = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                let cell = BoundingBox::new(x_corners[i], x_corners[i] + dx, y_corners[j], y_corners[j] + dy);
                xc.push(x_corners[i]);
                yc.push(y_corners[j]);
                weights.push(cell_weight_fn(cell));
            }
        }

        let total: f64 = weights.iter().sum();
        let sint = if n_samples > 0.0 { total / n_samples } else { total };
        let max_weight = weights.iter().cloned().fold(0.0f64, f64::max);

        let result = GridResult { level, dx, dy, xc, yc, weights, sint };

        let any_over = result.weights.iter().any(|&w| sint > 0.0 && w / sint > 1.0);
        if !any_over {
            return result;
        }
        if level >= cfg.max_level {
            return result;
        }

        if let Some(prev) = prev_max_weight {
            if (max_weight - prev).abs() < 1e-12 {
                stall_count += 1;
                if stall_count >= 2 {
                    if cfg.verbose {
                        println!("grid refinement stalled at level {}", level);
                    }
                    return result;
                }
            } else {
                stall_count = 0;
            }
        }
        prev_max_weight = Some(max_weight);

        let mut inc = 1u32;
        if sint > 0.0 {
            for &w in &result.weights {
                if w > 0.0 {
                    let this_inc = (w / sint).log(4.0).ceil().max(1.0) as u32;
                    if this_inc > inc {
                        inc = this_inc;
                    }
                }
            }
        }
        if level + inc > cfg.max_level {
            inc = cfg.max_level - level;
        }
        if inc == 0 {
            return result;
        }
        level += inc;
        if cfg.verbose {
            println!("refining to level {}", level);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_s4_unit_square_convergence() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let mut cfg = GrtsConfig::default();
        cfg.shift_grid = false;
        cfg.max_level = 6;
        let mut rng = SmallRng::seed_from_u64(42);
        let result = build_grid(bbox, 4.0, &cfg, |cell| {
            // uniform weight-1 unit square polygon
            let sq = [
                crate::structures::Point2D::new(0.0, 0.0),
                crate::structures::Point2D::new(0.0, 1.0),
                crate::structures::Point2D::new(1.0, 1.0),
                crate::structures::Point2D::new(1.0, 0.0),
                crate::structures::Point2D::new(0.0, 0.0),
            ];
            crate::algorithms::clipped_polygon_area(&[&sq], &[1], cell)
        }, &mut rng);
        assert!(result.level >= 2);
        let total_weight: f64 = result.weights.iter().sum();
        assert!((total_weight - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_determinism_without_shift() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let mut cfg = GrtsConfig::default();
        cfg.shift_grid = false;
        cfg.max_level = 4;
        let mut rng1 = SmallRng::seed_from_u64(7);
        let mut rng2 = SmallRng::seed_from_u64(7);
        let f = |cell: BoundingBox| cell.get_width() * cell.get_height();
        let r1 = build_grid(bbox, 4.0, &cfg, f, &mut rng1);
        let r2 = build_grid(bbox, 4.0, &cfg, f, &mut rng2);
        assert_eq!(r1.weights, r2.weights);
    }
}
