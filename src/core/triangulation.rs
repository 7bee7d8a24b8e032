//! Delaunay triangulation of integer sample positions.
//!
//! The convex hull is fanned into triangles first, then every remaining
//! point is inserted by splitting the triangle or edge it falls on, and
//! Lawson edge flips restore empty circumcircles after each insertion. The
//! triangles therefore always tile the whole hull. Sample positions are
//! integer (pixel, line) pairs, so orientation and in-circle tests are
//! evaluated exactly in `i128` for coordinate spans below 2^31.

/// Point in sample coordinates: `x` is the range pixel, `y` the azimuth line
pub type Point = (i64, i64);

/// No neighbor across an edge
const NONE: usize = usize::MAX;

/// Triangulation result. Triangles index into `points` and are
/// counter-clockwise with a strictly positive area.
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    pub points: Vec<Point>,
    pub triangles: Vec<[usize; 3]>,
}

/// Twice the signed area of `(a, b, c)`; positive when counter-clockwise
pub fn orient(a: Point, b: Point, c: Point) -> i128 {
    let (abx, aby) = ((b.0 - a.0) as i128, (b.1 - a.1) as i128);
    let (acx, acy) = ((c.0 - a.0) as i128, (c.1 - a.1) as i128);
    abx * acy - aby * acx
}

/// Positive when `d` lies strictly inside the circumcircle of the
/// counter-clockwise triangle `(a, b, c)`
fn in_circle(a: Point, b: Point, c: Point, d: Point) -> i128 {
    let (adx, ady) = ((a.0 - d.0) as i128, (a.1 - d.1) as i128);
    let (bdx, bdy) = ((b.0 - d.0) as i128, (b.1 - d.1) as i128);
    let (cdx, cdy) = ((c.0 - d.0) as i128, (c.1 - d.1) as i128);

    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;

    ad * (bdx * cdy - cdx * bdy) - bd * (adx * cdy - cdx * ady) + cd * (adx * bdy - bdx * ady)
}

/// Strict convex hull of points sorted by `(x, y)`, as counter-clockwise
/// indices. Points lying on a hull edge are not hull vertices. Returns
/// nothing when the points are collinear.
fn hull_indices(points: &[Point]) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let mut hull: Vec<usize> = Vec::with_capacity(n + 1);
    for i in 0..n {
        while hull.len() >= 2 && orient(points[hull[hull.len() - 2]], points[hull[hull.len() - 1]], points[i]) <= 0 {
            hull.pop();
        }
        hull.push(i);
    }
    let lower = hull.len() + 1;
    for i in (0..n - 1).rev() {
        while hull.len() >= lower && orient(points[hull[hull.len() - 2]], points[hull[hull.len() - 1]], points[i]) <= 0 {
            hull.pop();
        }
        hull.push(i);
    }
    // The chain closes on the first point
    hull.pop();

    if hull.len() < 3 {
        return Vec::new();
    }
    hull
}

/// Counter-clockwise convex hull vertices of a point set
pub fn convex_hull(input: &[Point]) -> Vec<Point> {
    let mut points: Vec<Point> = input.to_vec();
    points.sort_unstable();
    points.dedup();
    hull_indices(&points).into_iter().map(|i| points[i]).collect()
}

#[derive(Debug, Clone, Copy)]
enum Location {
    Inside(usize),
    /// Triangle and the index of the vertex opposite the edge
    OnEdge(usize, usize),
}

/// Triangles with edge adjacency. `neighbors[t][i]` is the triangle across
/// the edge opposite `vertices[t][i]`.
struct Mesh<'a> {
    points: &'a [Point],
    vertices: Vec<[usize; 3]>,
    neighbors: Vec<[usize; 3]>,
}

impl<'a> Mesh<'a> {
    /// Fan triangulation of a convex hull from its first vertex
    fn fan(points: &'a [Point], hull: &[usize]) -> Self {
        let count = hull.len() - 2;
        let mut vertices = Vec::with_capacity(2 * points.len());
        let mut neighbors = Vec::with_capacity(2 * points.len());
        for k in 0..count {
            vertices.push([hull[0], hull[k + 1], hull[k + 2]]);
            let next = if k + 1 < count { k + 1 } else { NONE };
            let prev = if k > 0 { k - 1 } else { NONE };
            neighbors.push([NONE, next, prev]);
        }
        Self { points, vertices, neighbors }
    }

    fn point(&self, v: usize) -> Point {
        self.points[v]
    }

    fn replace_neighbor(&mut self, t: usize, old: usize, new: usize) {
        if t == NONE {
            return;
        }
        if let Some(slot) = self.neighbors[t].iter_mut().find(|n| **n == old) {
            *slot = new;
        }
    }

    /// Flip every queued edge that fails the empty-circumcircle test,
    /// queueing the edges around each flip
    fn legalize(&mut self, mut stack: Vec<(usize, usize)>) {
        while let Some((t, i)) = stack.pop() {
            let u = self.neighbors[t][i];
            if u == NONE {
                continue;
            }
            let Some(j) = self.neighbors[u].iter().position(|&n| n == t) else {
                continue;
            };

            let p = self.vertices[t][i];
            let q = self.vertices[t][(i + 1) % 3];
            let r = self.vertices[t][(i + 2) % 3];
            let s = self.vertices[u][j];
            if in_circle(self.point(p), self.point(q), self.point(r), self.point(s)) <= 0 {
                continue;
            }

            let across_pq = self.neighbors[t][(i + 2) % 3];
            let across_rp = self.neighbors[t][(i + 1) % 3];
            let across_qs = self.neighbors[u][(j + 1) % 3];
            let across_sr = self.neighbors[u][(j + 2) % 3];

            self.vertices[t] = [p, q, s];
            self.neighbors[t] = [across_qs, u, across_pq];
            self.vertices[u] = [p, s, r];
            self.neighbors[u] = [across_sr, across_rp, t];
            self.replace_neighbor(across_qs, u, t);
            self.replace_neighbor(across_rp, t, u);

            stack.extend([(t, 0), (t, 2), (u, 0), (u, 1)]);
        }
    }

    /// `Ok` when `p` is inside or on the boundary of `t`, otherwise the
    /// index of an edge that separates them
    fn classify(&self, t: usize, p: Point) -> Result<Location, usize> {
        let v = self.vertices[t];
        let mut on_edge = None;
        for i in 0..3 {
            let o = orient(self.point(v[(i + 1) % 3]), self.point(v[(i + 2) % 3]), p);
            if o < 0 {
                return Err(i);
            }
            if o == 0 {
                on_edge = Some(i);
            }
        }
        Ok(match on_edge {
            Some(i) => Location::OnEdge(t, i),
            None => Location::Inside(t),
        })
    }

    /// Walk towards `p` from `start`, scanning every triangle if the walk
    /// runs off the hull or cycles
    fn locate(&self, p: Point, start: usize) -> Option<Location> {
        let mut t = start;
        for _ in 0..self.vertices.len() {
            match self.classify(t, p) {
                Ok(location) => return Some(location),
                Err(i) if self.neighbors[t][i] != NONE => t = self.neighbors[t][i],
                Err(_) => break,
            }
        }
        (0..self.vertices.len()).find_map(|t| self.classify(t, p).ok())
    }

    /// Insert vertex `v`; returns a triangle incident to it
    fn insert(&mut self, v: usize, start: usize) -> Option<usize> {
        match self.locate(self.point(v), start)? {
            Location::Inside(t) => {
                self.split_triangle(t, v);
                Some(t)
            }
            Location::OnEdge(t, i) => {
                self.split_edge(t, i, v)?;
                Some(t)
            }
        }
    }

    fn split_triangle(&mut self, t: usize, v: usize) {
        let [a, b, c] = self.vertices[t];
        let [across_bc, across_ca, across_ab] = self.neighbors[t];
        let t1 = self.vertices.len();
        let t2 = t1 + 1;

        self.vertices[t] = [a, b, v];
        self.neighbors[t] = [t1, t2, across_ab];
        self.vertices.push([b, c, v]);
        self.neighbors.push([t2, t, across_bc]);
        self.vertices.push([c, a, v]);
        self.neighbors.push([t, t1, across_ca]);
        self.replace_neighbor(across_bc, t, t1);
        self.replace_neighbor(across_ca, t, t2);

        self.legalize(vec![(t, 2), (t1, 2), (t2, 2)]);
    }

    /// Split the edge opposite vertex `i` of `t`, and the triangle across
    /// it when the edge is interior
    fn split_edge(&mut self, t: usize, i: usize, v: usize) -> Option<()> {
        let a = self.vertices[t][i];
        let q = self.vertices[t][(i + 1) % 3];
        let r = self.vertices[t][(i + 2) % 3];
        let across_aq = self.neighbors[t][(i + 2) % 3];
        let across_ra = self.neighbors[t][(i + 1) % 3];
        let u = self.neighbors[t][i];
        let t2 = self.vertices.len();

        if u == NONE {
            self.vertices[t] = [a, q, v];
            self.neighbors[t] = [NONE, t2, across_aq];
            self.vertices.push([a, v, r]);
            self.neighbors.push([NONE, across_ra, t]);
            self.replace_neighbor(across_ra, t, t2);
            self.legalize(vec![(t, 2), (t2, 1)]);
            return Some(());
        }

        let j = self.neighbors[u].iter().position(|&n| n == t)?;
        let s = self.vertices[u][j];
        let across_qs = self.neighbors[u][(j + 1) % 3];
        let across_sr = self.neighbors[u][(j + 2) % 3];
        let u2 = t2 + 1;

        self.vertices[t] = [a, q, v];
        self.neighbors[t] = [u2, t2, across_aq];
        self.vertices.push([a, v, r]);
        self.neighbors.push([u, across_ra, t]);
        self.vertices[u] = [s, r, v];
        self.neighbors[u] = [t2, u2, across_sr];
        self.vertices.push([s, v, q]);
        self.neighbors.push([t, across_qs, u]);
        self.replace_neighbor(across_ra, t, t2);
        self.replace_neighbor(across_qs, u, u2);

        self.legalize(vec![(t, 2), (t2, 1), (u, 2), (u2, 1)]);
        Some(())
    }
}

/// Triangulate a point set. Duplicate points are merged; the returned
/// triangulation refers to the de-duplicated `points`.
///
/// Fewer than three points, or an entirely collinear set, yields no
/// triangles.
pub fn triangulate(input: &[Point]) -> Triangulation {
    let mut points: Vec<Point> = input.to_vec();
    points.sort_unstable();
    points.dedup();

    let hull = hull_indices(&points);
    if hull.is_empty() {
        return Triangulation { points, triangles: Vec::new() };
    }

    let mut on_hull = vec![false; points.len()];
    for &h in &hull {
        on_hull[h] = true;
    }

    let mut mesh = Mesh::fan(&points, &hull);
    let fan_edges = (0..mesh.vertices.len()).flat_map(|t| (0..3).map(move |i| (t, i))).collect();
    mesh.legalize(fan_edges);

    // Sorted order keeps consecutive insertions close, so walks stay short
    let mut last = 0;
    for v in (0..points.len()).filter(|&v| !on_hull[v]) {
        match mesh.insert(v, last) {
            Some(t) => last = t,
            None => log::warn!("Sample {:?} could not be placed in the triangulation", points[v]),
        }
    }

    let triangles = mesh.vertices;
    log::debug!("Triangulated {} points into {} triangles", points.len(), triangles.len());
    Triangulation { points, triangles }
}
