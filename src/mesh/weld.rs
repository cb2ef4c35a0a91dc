//! Samenvoegen van vertices en triangulatie van polygonen.

use std::collections::HashMap;

/// Standaardafstand waarbinnen vertices samengevoegd worden.
pub const DEFAULT_WELD_EPSILON: f64 = 0.0001;

/// Uitkomst van [`weld_vertices`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Welded {
    /// Overgebleven punten.
    pub points: Vec<[f64; 3]>,
    /// Oude index → nieuwe index.
    pub remap: Vec<u32>,
    /// Nieuwe index → eerste oude index die erin opging.
    pub sources: Vec<usize>,
}

impl Welded {
    #[must_use]
    pub fn merged(&self) -> usize {
        self.remap.len().saturating_sub(self.points.len())
    }
}

/// Voegt punten samen die binnen `eps` van een eerder punt liggen.
///
/// Punten worden in een raster met celgrootte `eps` gehasht; alleen de 27
/// naburige cellen worden doorzocht.
#[must_use]
pub fn weld_vertices(points: &[[f64; 3]], eps: f64) -> Welded {
    if !eps.is_finite() || eps <= 0.0 {
        return Welded {
            points: points.to_vec(),
            remap: (0..points.len() as u32).collect(),
            sources: (0..points.len()).collect(),
        };
    }

    let inv = 1.0 / eps;
    let eps_squared = eps * eps;

    fn quantize(value: f64, inv: f64) -> Option<i64> {
        if !value.is_finite() {
            return None;
        }
        let q = (value * inv).floor();
        Some(q.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }

    let mut buckets: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    let mut welded = Welded {
        points: Vec::with_capacity(points.len()),
        remap: Vec::with_capacity(points.len()),
        sources: Vec::with_capacity(points.len()),
    };

    for (source, p) in points.iter().copied().enumerate() {
        // niet-eindige punten krijgen altijd een eigen vertex
        let key = match (quantize(p[0], inv), quantize(p[1], inv), quantize(p[2], inv)) {
            (Some(kx), Some(ky), Some(kz)) => Some((kx, ky, kz)),
            _ => None,
        };

        let found = key.and_then(|key| {
            neighbour_cells(key)
                .filter_map(|cell| buckets.get(&cell))
                .flatten()
                .copied()
                .find(|candidate| {
                    distance_squared(welded.points[*candidate as usize], p) <= eps_squared
                })
        });

        let index = match found {
            Some(existing) => existing,
            None => {
                let index = welded.points.len() as u32;
                welded.points.push(p);
                welded.sources.push(source);
                if let Some(key) = key {
                    buckets.entry(key).or_default().push(index);
                }
                index
            }
        };
        welded.remap.push(index);
    }

    welded
}

fn neighbour_cells(key: (i64, i64, i64)) -> impl Iterator<Item = (i64, i64, i64)> {
    (-1i64..=1).flat_map(move |dx| {
        (-1i64..=1).flat_map(move |dy| {
            (-1i64..=1).map(move |dz| (key.0 + dx, key.1 + dy, key.2 + dz))
        })
    })
}

fn distance_squared(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Trianguleert polygonen met ear clipping in het vlak van hun normaal. Geeft
/// de driehoeksindices terug en per driehoek de index van de polygoon waar hij
/// uit kwam. De winding van de polygoon blijft behouden.
#[must_use]
pub fn triangulate_polygons(points: &[[f64; 3]], polygons: &[Vec<u32>]) -> (Vec<u32>, Vec<usize>) {
    let mut triangles = Vec::new();
    let mut origins = Vec::new();
    for (polygon_index, polygon) in polygons.iter().enumerate() {
        let mut ring: Vec<u32> = Vec::with_capacity(polygon.len());
        for &index in polygon {
            if ring.last() != Some(&index) {
                ring.push(index);
            }
        }
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            continue;
        }
        for triangle in earclip_ring(points, &ring) {
            triangles.extend_from_slice(&triangle);
            origins.push(polygon_index);
        }
    }
    (triangles, origins)
}

fn earclip_ring(points: &[[f64; 3]], ring: &[u32]) -> Vec<[u32; 3]> {
    if ring.len() == 3 {
        return vec![[ring[0], ring[1], ring[2]]];
    }
    let Some(projected) = project_ring(points, ring) else {
        return fan(ring, &(0..ring.len()).collect::<Vec<_>>());
    };
    let is_ccw = signed_area(&projected) > 0.0;

    let mut remaining: Vec<usize> = (0..ring.len()).collect();
    let mut triangles = Vec::with_capacity(ring.len() - 2);
    // begin bij de tweede hoek: een convexe polygoon geeft zo dezelfde waaier als vanaf ring[0]
    let mut cursor = 1usize;
    let mut misses = 0usize;

    while remaining.len() > 3 {
        let count = remaining.len();
        let position = cursor % count;
        let prev = remaining[(position + count - 1) % count];
        let ear = remaining[position];
        let next = remaining[(position + 1) % count];

        if is_ear(&projected, &remaining, [prev, ear, next], is_ccw) {
            triangles.push([ring[prev], ring[ear], ring[next]]);
            remaining.remove(position);
            cursor = position;
            misses = 0;
            continue;
        }

        cursor = position + 1;
        misses += 1;
        if misses >= count {
            // geen oor meer (zelfdoorsnijdend of ontaard): rest als waaier
            log::warn!("ear clipping vond geen oor in polygoon van {} punten", ring.len());
            triangles.extend(fan(ring, &remaining));
            return triangles;
        }
    }

    triangles.push([ring[remaining[0]], ring[remaining[1]], ring[remaining[2]]]);
    triangles
}

fn fan(ring: &[u32], remaining: &[usize]) -> Vec<[u32; 3]> {
    (1..remaining.len().saturating_sub(1))
        .map(|i| [ring[remaining[0]], ring[remaining[i]], ring[remaining[i + 1]]])
        .collect()
}

fn is_ear(projected: &[[f64; 2]], remaining: &[usize], corner: [usize; 3], is_ccw: bool) -> bool {
    let [a, b, c] = corner.map(|index| projected[index]);
    let cross = orient2d(a, b, c);
    let convex = if is_ccw { cross > 0.0 } else { cross < 0.0 };
    if !convex {
        return false;
    }
    remaining
        .iter()
        .filter(|index| !corner.contains(*index))
        .all(|index| !point_in_triangle(a, b, c, projected[*index], is_ccw))
}

/// Projecteert de ring op het coördinatenvlak loodrecht op de grootste
/// component van de Newell-normaal.
fn project_ring(points: &[[f64; 3]], ring: &[u32]) -> Option<Vec<[f64; 2]>> {
    let corners: Vec<[f64; 3]> = ring
        .iter()
        .map(|index| points.get(*index as usize).copied())
        .collect::<Option<_>>()?;

    let mut normal = [0.0f64; 3];
    for (i, current) in corners.iter().enumerate() {
        let next = corners[(i + 1) % corners.len()];
        normal[0] += (current[1] - next[1]) * (current[2] + next[2]);
        normal[1] += (current[2] - next[2]) * (current[0] + next[0]);
        normal[2] += (current[0] - next[0]) * (current[1] + next[1]);
    }
    let magnitude = normal.map(f64::abs);
    if !magnitude.iter().all(|m| m.is_finite()) || magnitude.iter().all(|m| *m == 0.0) {
        return None;
    }
    let (u, v) = if magnitude[2] >= magnitude[0] && magnitude[2] >= magnitude[1] {
        (0, 1)
    } else if magnitude[1] >= magnitude[0] {
        (2, 0)
    } else {
        (1, 2)
    };
    Some(corners.iter().map(|p| [p[u], p[v]]).collect())
}

fn signed_area(points: &[[f64; 2]]) -> f64 {
    let mut area = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        area += a[0] * b[1] - b[0] * a[1];
    }
    0.5 * area
}

fn orient2d(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn point_in_triangle(a: [f64; 2], b: [f64; 2], c: [f64; 2], p: [f64; 2], is_ccw: bool) -> bool {
    let ab = orient2d(a, b, p);
    let bc = orient2d(b, c, p);
    let ca = orient2d(c, a, p);
    if is_ccw {
        ab >= 0.0 && bc >= 0.0 && ca >= 0.0
    } else {
        ab <= 0.0 && bc <= 0.0 && ca <= 0.0
    }
}

/// Verwijdert driehoeken met herhaalde indices of (bijna) nul oppervlakte.
/// `origins` wordt parallel gefilterd.
#[must_use]
pub fn cull_degenerate_triangles(
    points: &[[f64; 3]],
    triangles: &[u32],
    origins: &[usize],
    eps: f64,
) -> (Vec<u32>, Vec<usize>, usize) {
    let mut out = Vec::with_capacity(triangles.len());
    let mut kept_origins = Vec::with_capacity(origins.len());
    let mut removed = 0usize;
    let threshold = eps * eps * eps * eps;

    for (tri, origin) in triangles.chunks_exact(3).zip(origins) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        if i0 == i1 || i1 == i2 || i0 == i2 {
            removed += 1;
            continue;
        }
        let (Some(a), Some(b), Some(c)) = (
            points.get(i0 as usize),
            points.get(i1 as usize),
            points.get(i2 as usize),
        ) else {
            removed += 1;
            continue;
        };
        let area2 = cross_length_squared(*a, *b, *c);
        if !area2.is_finite() || area2 <= threshold {
            removed += 1;
            continue;
        }
        out.extend_from_slice(&[i0, i1, i2]);
        kept_origins.push(*origin);
    }

    (out, kept_origins, removed)
}

fn cross_length_squared(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let cross = [
        ab[1] * ac[2] - ab[2] * ac[1],
        ab[2] * ac[0] - ab[0] * ac[2],
        ab[0] * ac[1] - ab[1] * ac[0],
    ];
    cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_points_are_welded() {
        let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.00005, 0.0, 0.0]];
        let welded = weld_vertices(&points, DEFAULT_WELD_EPSILON);
        assert_eq!(welded.points.len(), 2);
        assert_eq!(welded.remap, vec![0, 1, 0]);
        assert_eq!(welded.sources, vec![0, 1]);
        assert_eq!(welded.merged(), 1);
    }

    #[test]
    fn points_across_cell_boundary_still_weld() {
        let points = [[0.000099, 0.0, 0.0], [0.000101, 0.0, 0.0]];
        let welded = weld_vertices(&points, DEFAULT_WELD_EPSILON);
        assert_eq!(welded.points.len(), 1);
    }

    fn projected_area(points: &[[f64; 3]], triangles: &[u32]) -> f64 {
        triangles
            .chunks_exact(3)
            .map(|t| {
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| points[i as usize]);
                0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]))
            })
            .sum()
    }

    #[test]
    fn convex_quad_splits_like_a_fan() {
        let points = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let (triangles, origins) = triangulate_polygons(&points, &[vec![0, 1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(triangles, vec![0, 1, 2, 0, 2, 3, 4, 5, 6]);
        assert_eq!(origins, vec![0, 0, 1]);
    }

    #[test]
    fn concave_polygon_stays_inside_its_outline() {
        // L-vorm met oppervlakte 3; een waaier vanuit hoek 0 zou 4 geven
        let points = [
            [2.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
        ];
        let (triangles, origins) = triangulate_polygons(&points, &[vec![0, 1, 2, 3, 4, 5]]);
        assert_eq!(origins, vec![0; 4]);
        assert!((projected_area(&points, &triangles) - 3.0).abs() < 1e-12);
        // alle driehoeken houden de winding van de polygoon
        for t in triangles.chunks_exact(3) {
            assert!(projected_area(&points, t) > 0.0);
        }
    }

    #[test]
    fn clockwise_concave_polygon_keeps_its_winding() {
        let points = [
            [2.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [1.0, 2.0, 0.0],
            [1.0, 1.0, 0.0],
            [2.0, 1.0, 0.0],
        ];
        let (triangles, _) = triangulate_polygons(&points, &[vec![0, 1, 2, 3, 4, 5]]);
        assert_eq!(triangles.len(), 12);
        assert!((projected_area(&points, &triangles) + 3.0).abs() < 1e-12);
        for t in triangles.chunks_exact(3) {
            assert!(projected_area(&points, t) < 0.0);
        }
    }

    #[test]
    fn polygon_in_vertical_plane_is_projected() {
        let points = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 0.0, 2.0],
            [0.0, 0.0, 2.0],
        ];
        let (triangles, _) = triangulate_polygons(&points, &[vec![0, 1, 2, 3, 4, 5]]);
        assert_eq!(triangles.len(), 12);
        assert!(!triangles.chunks_exact(3).any(|t| t.contains(&1) && t.contains(&4)));
    }

    #[test]
    fn collapsed_triangles_are_culled() {
        let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let (kept, origins, removed) =
            cull_degenerate_triangles(&points, &[0, 1, 2, 0, 1, 3, 0, 0, 3], &[0, 1, 2], 1e-4);
        assert_eq!(kept, vec![0, 1, 3]);
        assert_eq!(origins, vec![1]);
        assert_eq!(removed, 2);
    }
}
