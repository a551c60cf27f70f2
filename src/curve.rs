//! Interpolating spline and tube extrusion for wire geometry.
//!
//! [`CatmullRomCurve`] passes exactly through every anchor and has a
//! continuous tangent. Segment `k` is a cubic Hermite between anchors `k` and
//! `k + 1` with tangents `tension * (p[k+1] - p[k-1])` and
//! `tension * (p[k+2] - p[k])`, so neighbouring segments share the tangent at
//! their common anchor. `tension = 0.5` is the classic Catmull-Rom spline.
//!
//! Degenerate input is cleaned before any math runs: consecutive duplicate
//! anchors are dropped, tension is clamped to `[MIN_TENSION, 1]`, and
//! zero-length derivatives fall back to the segment chord.
//!
//! At zero tension every inner anchor becomes a corner, so tension has a
//! positive floor.

use glam::{Quat, Vec3};

use crate::error::FieldError;

/// Smallest tension a curve accepts. Tangents at inner anchors vanish at 0.
pub const MIN_TENSION: f32 = 0.01;

/// Anchors closer than this are treated as duplicates.
const DUPLICATE_EPSILON: f32 = 1e-6;

/// Number of samples in the arc-length lookup table.
const ARC_LENGTH_DIVISIONS: usize = 200;

/// Smooth path through an ordered list of anchors.
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    anchors: Vec<Vec3>,
    tension: f32,
    closed: bool,
    /// Cumulative length at `t = i / ARC_LENGTH_DIVISIONS`.
    arc_lengths: Vec<f32>,
}

impl CatmullRomCurve {
    /// Fit a curve through `anchors`.
    ///
    /// Fails if an anchor is non-finite or fewer than two distinct anchors remain
    /// after removing consecutive duplicates.
    pub fn new(anchors: &[Vec3], tension: f32, closed: bool) -> Result<Self, FieldError> {
        if let Some(bad) = anchors.iter().find(|p| !p.is_finite()) {
            return Err(FieldError::InvalidParameter {
                name: "anchor",
                value: bad.x + bad.y + bad.z,
            });
        }

        let mut cleaned: Vec<Vec3> = Vec::with_capacity(anchors.len());
        for &p in anchors {
            if cleaned
                .last()
                .map_or(true, |last: &Vec3| last.distance_squared(p) > DUPLICATE_EPSILON * DUPLICATE_EPSILON)
            {
                cleaned.push(p);
            }
        }
        // A closed loop must not repeat its first anchor at the end.
        if closed && cleaned.len() > 2 && cleaned[0].distance(cleaned[cleaned.len() - 1]) <= DUPLICATE_EPSILON {
            cleaned.pop();
        }
        if cleaned.len() < 2 {
            return Err(FieldError::TooFewAnchors(cleaned.len()));
        }

        let clamped = if tension.is_finite() {
            tension.clamp(MIN_TENSION, 1.0)
        } else {
            0.5
        };
        if clamped != tension {
            log::warn!("curve tension {} out of range, using {}", tension, clamped);
        }
        let tension = clamped;

        let mut curve = Self {
            anchors: cleaned,
            tension,
            closed,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_arc_lengths();
        Ok(curve)
    }

    /// Anchors after duplicate removal.
    pub fn anchors(&self) -> &[Vec3] {
        &self.anchors
    }

    pub fn tension(&self) -> f32 {
        self.tension
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of cubic segments.
    pub fn segment_count(&self) -> usize {
        if self.closed {
            self.anchors.len()
        } else {
            self.anchors.len() - 1
        }
    }

    /// Curve parameter at which the curve passes through anchor `index`.
    pub fn anchor_parameter(&self, index: usize) -> f32 {
        index as f32 / self.segment_count() as f32
    }

    /// Point at parameter `t` in `[0, 1]` (clamped).
    pub fn point(&self, t: f32) -> Vec3 {
        let (segment, w) = self.locate(t);
        let [p0, p1, p2, p3] = self.control_points(segment);
        let (m1, m2) = self.tangents(p0, p1, p2, p3);
        hermite(p1, p2, m1, m2, w)
    }

    /// Unit tangent at parameter `t`.
    ///
    /// Where the derivative vanishes (coincident neighbours around an anchor)
    /// the segment chord is returned instead.
    pub fn tangent(&self, t: f32) -> Vec3 {
        let (segment, w) = self.locate(t);
        let [p0, p1, p2, p3] = self.control_points(segment);
        let (m1, m2) = self.tangents(p0, p1, p2, p3);
        let d = hermite_derivative(p1, p2, m1, m2, w);
        if d.length_squared() > 1e-12 {
            d.normalize()
        } else {
            // Consecutive anchors are distinct, so the chord is never zero.
            (p2 - p1).normalize()
        }
    }

    /// Total curve length.
    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at arc-length fraction `u` in `[0, 1]`.
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.arc_to_t(u))
    }

    /// Tangent at arc-length fraction `u` in `[0, 1]`.
    pub fn tangent_at(&self, u: f32) -> Vec3 {
        self.tangent(self.arc_to_t(u))
    }

    /// `divisions + 1` points evenly spaced in parameter.
    pub fn sample(&self, divisions: usize) -> Vec<Vec3> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| self.point(i as f32 / divisions as f32))
            .collect()
    }

    /// Map arc-length fraction to curve parameter.
    fn arc_to_t(&self, u: f32) -> f32 {
        let total = self.length();
        if total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }
        let target = u.clamp(0.0, 1.0) * total;
        let lengths = &self.arc_lengths;

        let i = match lengths.binary_search_by(|l| l.total_cmp(&target)) {
            Ok(i) => return i as f32 / ARC_LENGTH_DIVISIONS as f32,
            Err(i) => i.clamp(1, lengths.len() - 1),
        };
        let before = lengths[i - 1];
        let span = lengths[i] - before;
        let frac = if span > 0.0 { (target - before) / span } else { 0.0 };
        ((i - 1) as f32 + frac) / ARC_LENGTH_DIVISIONS as f32
    }

    fn compute_arc_lengths(&self) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(ARC_LENGTH_DIVISIONS + 1);
        let mut total = 0.0;
        let mut last = self.point(0.0);
        lengths.push(0.0);
        for i in 1..=ARC_LENGTH_DIVISIONS {
            let p = self.point(i as f32 / ARC_LENGTH_DIVISIONS as f32);
            total += p.distance(last);
            lengths.push(total);
            last = p;
        }
        lengths
    }

    /// Segment index and local weight for parameter `t`.
    fn locate(&self, t: f32) -> (usize, f32) {
        let segments = self.segment_count();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let p = t * segments as f32;
        let mut segment = p.floor() as usize;
        let mut w = p - segment as f32;
        if segment >= segments {
            segment = segments - 1;
            w = 1.0;
        }
        (segment, w)
    }

    fn control_points(&self, segment: usize) -> [Vec3; 4] {
        let pts = &self.anchors;
        let n = pts.len();

        if self.closed {
            let at = |offset: isize| pts[(segment as isize + offset).rem_euclid(n as isize) as usize];
            return [at(-1), at(0), at(1), at(2)];
        }

        let p1 = pts[segment];
        let p2 = pts[segment + 1];
        let p0 = if segment > 0 {
            pts[segment - 1]
        } else {
            // Reflect across the first anchor.
            p1 * 2.0 - p2
        };
        let p3 = if segment + 2 < n {
            pts[segment + 2]
        } else {
            p2 * 2.0 - p1
        };
        [p0, p1, p2, p3]
    }

    fn tangents(&self, p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> (Vec3, Vec3) {
        (self.tension * (p2 - p0), self.tension * (p3 - p1))
    }
}

fn hermite(p1: Vec3, p2: Vec3, m1: Vec3, m2: Vec3, w: f32) -> Vec3 {
    let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * m1 - m2;
    let c3 = 2.0 * p1 - 2.0 * p2 + m1 + m2;
    p1 + m1 * w + c2 * (w * w) + c3 * (w * w * w)
}

fn hermite_derivative(p1: Vec3, p2: Vec3, m1: Vec3, m2: Vec3, w: f32) -> Vec3 {
    let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * m1 - m2;
    let c3 = 2.0 * p1 - 2.0 * p2 + m1 + m2;
    m1 + c2 * (2.0 * w) + c3 * (3.0 * w * w)
}

/// Triangle mesh of a thin tube swept along a curve.
///
/// Ring `i` sits at arc-length fraction `i / tubular_segments`. Each ring holds
/// `radial_segments + 1` vertices (the seam is duplicated for UVs).
#[derive(Debug, Clone, Default)]
pub struct TubeMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TubeMesh {
    /// Sweep a circle of `radius` along `curve`.
    ///
    /// Frames are propagated by parallel transport, which avoids the flips and
    /// NaNs of Frenet frames on straight or inflecting stretches.
    pub fn build(curve: &CatmullRomCurve, tubular_segments: u32, radius: f32, radial_segments: u32) -> Self {
        let tubular = tubular_segments.max(1) as usize;
        let radial = radial_segments.max(3) as usize;

        let (normals, binormals) = parallel_transport_frames(curve, tubular);

        let ring = radial + 1;
        let mut mesh = TubeMesh {
            positions: Vec::with_capacity((tubular + 1) * ring),
            normals: Vec::with_capacity((tubular + 1) * ring),
            uvs: Vec::with_capacity((tubular + 1) * ring),
            indices: Vec::with_capacity(tubular * radial * 6),
        };

        for i in 0..=tubular {
            let u = i as f32 / tubular as f32;
            let center = curve.point_at(u);
            let (n, b) = (normals[i], binormals[i]);

            for j in 0..=radial {
                let v = j as f32 / radial as f32 * std::f32::consts::TAU;
                let normal = (-v.cos() * n + v.sin() * b).normalize_or_zero();
                let p = center + normal * radius;
                mesh.positions.push(p.to_array());
                mesh.normals.push(normal.to_array());
                mesh.uvs.push([u, j as f32 / radial as f32]);
            }
        }

        for i in 1..=tubular {
            for j in 1..=radial {
                let a = (ring * (i - 1) + (j - 1)) as u32;
                let b = (ring * i + (j - 1)) as u32;
                let c = (ring * i + j) as u32;
                let d = (ring * (i - 1) + j) as u32;
                mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Normal and binormal at `segments + 1` evenly spaced arc positions.
fn parallel_transport_frames(curve: &CatmullRomCurve, segments: usize) -> (Vec<Vec3>, Vec<Vec3>) {
    let tangents: Vec<Vec3> = (0..=segments)
        .map(|i| curve.tangent_at(i as f32 / segments as f32))
        .collect();

    // Start from the axis least aligned with the first tangent.
    let t0 = tangents[0];
    let abs = t0.abs();
    let axis = if abs.x <= abs.y && abs.x <= abs.z {
        Vec3::X
    } else if abs.y <= abs.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let mut normal = t0.cross(axis).normalize_or_zero();
    if normal == Vec3::ZERO {
        normal = t0.any_orthonormal_vector();
    }

    let mut normals = Vec::with_capacity(segments + 1);
    let mut binormals = Vec::with_capacity(segments + 1);
    normals.push(normal);
    binormals.push(t0.cross(normal));

    for i in 1..=segments {
        let (prev, next) = (tangents[i - 1], tangents[i]);
        let axis = prev.cross(next);
        if axis.length_squared() > 1e-12 {
            let angle = prev.dot(next).clamp(-1.0, 1.0).acos();
            normal = Quat::from_axis_angle(axis.normalize(), angle) * normal;
        }
        // Re-orthogonalize against drift.
        normal = (normal - next * normal.dot(next)).normalize_or_zero();
        if normal == Vec3::ZERO {
            normal = next.any_orthonormal_vector();
        }
        normals.push(normal);
        binormals.push(next.cross(normal));
    }

    (normals, binormals)
}
