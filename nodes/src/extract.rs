//! Converts the node builder's internal lists into the flat vertex, seg,
//! subsector and node arrays the rest of the game consumes.
//!
//! The GL path is the interesting one: builder subsectors arrive as bags of
//! segs, and each has to be reordered into a closed boundary polygon before
//! the renderer can use it, with synthetic segs bridging any gaps.

use super::build::{BspTree, BuildSeg};
use super::types::{Child, LevelGeometry, Linedef, Node, Seg, Subsector, Vertex, VertexId,
                   VertexRef};
use super::util::parse_child_id;
use log::{info, warn};
use math::{point_to_angle, Angle, Fixed, ANGLE_MAX};
use std::f64::MAX;
use vec_map::VecMap;

impl BspTree {
    /// Flattens the tree into final arrays, closing every subsector on the
    /// GL path, then rebinds linedef endpoints to the final vertex array.
    ///
    /// Inputs are trusted: a builder defect (dangling partner, out-of-range
    /// child) degrades the output silently rather than failing. `check::verify`
    /// makes such degradation visible to debug builds and tests.
    pub fn extract(&self, lines: &mut [Linedef]) -> LevelGeometry {
        let vertices: Vec<Vertex> = self
            .vertices
            .iter()
            .map(|vertex| Vertex {
                x: vertex.x,
                y: vertex.y,
            })
            .collect();

        let nodes = self.flatten_nodes();
        let (segs, subsectors) = if self.gl_nodes {
            self.close_subsectors()
        } else {
            self.translate_segs()
        };

        info!(
            "Extracted {} segs, {} nodes, {} subsectors.",
            segs.len(),
            nodes.len(),
            subsectors.len()
        );

        patch_linedefs(lines, &vertices);

        LevelGeometry {
            vertices,
            segs,
            subsectors,
            nodes,
        }
    }

    fn flatten_nodes(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .map(|node| Node {
                x: node.x,
                y: node.y,
                dx: node.dx,
                dy: node.dy,
                bbox: node.bbox,
                children: [
                    resolve_child(node.children[0]),
                    resolve_child(node.children[1]),
                ],
            })
            .collect()
    }

    /// GL path: closes subsectors one by one, in builder order, into a shared
    /// growable seg buffer, then resolves partner links in a second pass.
    fn close_subsectors(&self) -> (Vec<Seg>, Vec<Subsector>) {
        let mut out = GlSegs::with_capacity(self.segs.len() * 5 / 4);
        let mut subsectors = Vec::with_capacity(self.subsectors.len());

        for subsector in 0..self.subsectors.len() {
            let num_lines = self.close_subsector(subsector, &mut out);
            subsectors.push(Subsector {
                first_line: out.segs.len() - num_lines,
                num_lines,
                poly: None,
            });
        }

        out.resolve_partners();
        (out.segs, subsectors)
    }

    /// Plain path: the builder already emitted subsectors as contiguous runs
    /// in final order, so segs translate one-for-one with no reordering, no
    /// synthetic segs and no partners.
    fn translate_segs(&self) -> (Vec<Seg>, Vec<Subsector>) {
        let segs = self
            .seg_list
            .iter()
            .map(|&seg_num| {
                let seg = &self.segs[seg_num];
                Seg {
                    v1: seg.v1,
                    v2: seg.v2,
                    front_sector: seg.front_sector,
                    back_sector: seg.back_sector,
                    linedef: seg.linedef,
                    sidedef: seg.sidedef,
                    partner: None,
                    poly_seg: false,
                }
            })
            .collect();
        let subsectors = self
            .subsectors
            .iter()
            .map(|subsector| Subsector {
                first_line: subsector.first_line,
                num_lines: subsector.num_lines,
                poly: None,
            })
            .collect();
        (segs, subsectors)
    }

    /// Orders one subsector's segs into a connected cyclic boundary and
    /// emits them, bridging gaps with connecting segs. Returns how many segs
    /// the subsector ended up with.
    fn close_subsector(&self, subsector: usize, out: &mut GlSegs) -> usize {
        let first = self.subsectors[subsector].first_line;
        let max = first + self.subsectors[subsector].num_lines;

        // Average the endpoints to find the midpoint, and check whether all
        // segs lie on the same splitting plane. A subsector whose segs are
        // fully collinear exists in only one dimension (outward-facing lines
        // in the void can produce one) and cannot be ordered by angle.
        let mut accum_x = 0.0;
        let mut accum_y = 0.0;
        let mut diff_planes = false;
        let first_plane = self.seg_at(first).plane;
        for i in first..max {
            let seg = self.seg_at(i);
            accum_x += f64::from(self.vertices[seg.v1].x.to_bits())
                + f64::from(self.vertices[seg.v2].x.to_bits());
            accum_y += f64::from(self.vertices[seg.v1].y.to_bits())
                + f64::from(self.vertices[seg.v2].y.to_bits());
            if seg.plane != first_plane {
                diff_planes = true;
            }
        }
        let num_lines = (max - first) as f64;
        let mid_x = Fixed::from_bits((accum_x / num_lines / 2.0) as i32);
        let mid_y = Fixed::from_bits((accum_y / num_lines / 2.0) as i32);

        let first_seg_num = self.seg_list[first];
        let seg = &self.segs[first_seg_num];
        let mut prev_angle = point_to_angle(
            self.vertices[seg.v1].x - mid_x,
            self.vertices[seg.v1].y - mid_y,
        );
        out.push_seg(first_seg_num, seg);
        let mut count = 1;
        let mut prev = first_seg_num;
        let first_vert = seg.v1;

        if diff_planes {
            // Emit the remaining segs ordered by the angle from the midpoint
            // to their start vertex, always preferring a seg that chains
            // directly onto the previous one. Ties keep the first match in
            // scan order.
            for _ in first + 1..max {
                let mut best_diff = ANGLE_MAX;
                let mut best = None;
                for j in first..max {
                    let seg_num = self.seg_list[j];
                    if out.stored.contains_key(seg_num) {
                        continue;
                    }
                    let seg = &self.segs[seg_num];
                    let angle = point_to_angle(
                        self.vertices[seg.v1].x - mid_x,
                        self.vertices[seg.v1].y - mid_y,
                    );
                    let diff = prev_angle - angle;
                    if seg.v1 == self.segs[prev].v2 {
                        best_diff = diff;
                        best = Some(seg_num);
                        break;
                    }
                    if diff < best_diff && diff > Angle(0) {
                        best_diff = diff;
                        best = Some(seg_num);
                    }
                }
                let seg_num = match best {
                    Some(seg_num) => seg_num,
                    None => {
                        warn!(
                            "No seg continues the boundary of subsector {}; \
                             leaving the gap for the closing pass.",
                            subsector
                        );
                        continue;
                    }
                };
                let seg = &self.segs[seg_num];
                if self.segs[prev].v2 != seg.v1 {
                    out.push_connecting_seg(self.segs[prev].v2, seg.v1);
                    count += 1;
                }
                prev_angle = prev_angle - best_diff;
                out.push_seg(seg_num, seg);
                count += 1;
                prev = seg_num;
                if seg.v2 == first_vert {
                    break;
                }
            }
        } else {
            // Three sweeps along the shared line reconstruct an order for a
            // collinear subsector: out along one side, back along the other,
            // then out again for whatever the first sweep could not reach.
            count += self.sweep_degenerate(subsector, true, 0.0, &mut prev, out);
            count += self.sweep_degenerate(subsector, false, MAX, &mut prev, out);
            count += self.sweep_degenerate(subsector, true, -MAX, &mut prev, out);
        }

        if self.segs[prev].v2 != first_vert {
            out.push_connecting_seg(self.segs[prev].v2, first_vert);
            count += 1;
        }

        count
    }

    /// One distance-ordered sweep over a collinear subsector, restricted to
    /// the segs facing one side of the shared plane. The distance along the
    /// line is a dot product with the first seg's direction; each pick moves
    /// the threshold so every seg is taken at most once. Returns the number
    /// of segs emitted.
    fn sweep_degenerate(
        &self,
        subsector: usize,
        forward: bool,
        mut last_dot: f64,
        prev: &mut usize,
        out: &mut GlSegs,
    ) -> usize {
        let first = self.subsectors[subsector].first_line;
        let max = first + self.subsectors[subsector].num_lines;
        let mut count = 0;

        let seg = self.seg_at(first);
        let x1 = f64::from(self.vertices[seg.v1].x.to_bits());
        let y1 = f64::from(self.vertices[seg.v1].y.to_bits());
        let dx = f64::from(self.vertices[seg.v2].x.to_bits()) - x1;
        let dy = f64::from(self.vertices[seg.v2].y.to_bits()) - y1;
        let want_side = seg.plane_front ^ !forward;

        for _ in first + 1..max {
            let mut best_dot = if forward { MAX } else { -MAX };
            let mut best = None;
            for j in first + 1..max {
                let seg_num = self.seg_list[j];
                let seg = &self.segs[seg_num];
                if seg.plane_front != want_side || out.stored.contains_key(seg_num) {
                    continue;
                }
                let dx2 = f64::from(self.vertices[seg.v1].x.to_bits()) - x1;
                let dy2 = f64::from(self.vertices[seg.v1].y.to_bits()) - y1;
                let dot = dx * dx2 + dy * dy2;
                if forward {
                    if dot < best_dot && dot > last_dot {
                        best_dot = dot;
                        best = Some(seg_num);
                    }
                } else if dot > best_dot && dot < last_dot {
                    best_dot = dot;
                    best = Some(seg_num);
                }
            }
            if let Some(seg_num) = best {
                let seg = &self.segs[seg_num];
                if self.segs[*prev].v2 != seg.v1 {
                    out.push_connecting_seg(self.segs[*prev].v2, seg.v1);
                    count += 1;
                }
                out.push_seg(seg_num, seg);
                count += 1;
                *prev = seg_num;
                last_dot = best_dot;
            }
        }

        count
    }

    fn seg_at(&self, index: usize) -> &BuildSeg {
        &self.segs[self.seg_list[index]]
    }
}

/// The growable seg buffer shared by all subsectors on the GL path, together
/// with the bookkeeping partner resolution needs.
struct GlSegs {
    segs: Vec<Seg>,
    /// Builder partner index of each emitted seg, translated once every
    /// subsector is closed.
    pending_partners: Vec<Option<usize>>,
    /// Where each emitted builder seg landed, keyed by builder index. Also
    /// serves as the placed-seg marker while a subsector is being ordered.
    stored: VecMap<usize>,
}

impl GlSegs {
    fn with_capacity(capacity: usize) -> GlSegs {
        GlSegs {
            segs: Vec::with_capacity(capacity),
            pending_partners: Vec::with_capacity(capacity),
            stored: VecMap::new(),
        }
    }

    /// Emits one private seg and records where it landed so later partner
    /// references can find it.
    fn push_seg(&mut self, seg_num: usize, seg: &BuildSeg) {
        let (linedef, sidedef) = match seg.linedef {
            Some(linedef) => (Some(linedef), seg.sidedef),
            None => (None, None),
        };
        self.segs.push(Seg {
            v1: seg.v1,
            v2: seg.v2,
            front_sector: seg.front_sector,
            back_sector: seg.back_sector,
            linedef,
            sidedef,
            partner: None,
            poly_seg: false,
        });
        self.pending_partners.push(seg.partner);
        self.stored.insert(seg_num, self.segs.len() - 1);
    }

    /// Emits a synthetic seg bridging a gap in a subsector boundary. It
    /// carries no map data at all.
    fn push_connecting_seg(&mut self, v1: VertexId, v2: VertexId) {
        self.segs.push(Seg {
            v1,
            v2,
            front_sector: None,
            back_sector: None,
            linedef: None,
            sidedef: None,
            partner: None,
            poly_seg: false,
        });
        self.pending_partners.push(None);
    }

    /// Translates every recorded builder partner index into the position its
    /// seg was emitted at. This has to run after all subsectors are closed:
    /// a partner may be emitted later than the seg referencing it.
    fn resolve_partners(&mut self) {
        for (position, pending) in self.pending_partners.iter().enumerate() {
            let partner = match *pending {
                Some(partner) => partner,
                None => continue,
            };
            match self.stored.get(partner) {
                Some(&stored) => self.segs[position].partner = Some(stored),
                None => warn!(
                    "Seg {} references partner {}, which was never emitted.",
                    position, partner
                ),
            }
        }
    }
}

fn resolve_child(id: u32) -> Child {
    let (index, is_subsector) = parse_child_id(id);
    if is_subsector {
        Child::Subsector(index)
    } else {
        Child::Node(index)
    }
}

/// Rebinds every linedef endpoint to the final vertex array. The final array
/// preserves builder vertex order, so a builder handle maps to the same
/// index.
pub fn patch_linedefs(lines: &mut [Linedef], vertices: &[Vertex]) {
    for line in lines {
        line.v1 = patch_vertex_ref(line.v1, vertices);
        line.v2 = patch_vertex_ref(line.v2, vertices);
    }
}

fn patch_vertex_ref(vertex: VertexRef, vertices: &[Vertex]) -> VertexRef {
    match vertex {
        VertexRef::Build(index) => {
            debug_assert!(index < vertices.len());
            VertexRef::Level(index)
        }
        resolved @ VertexRef::Level(_) => resolved,
    }
}

#[cfg(test)]
mod test {
    use super::super::build::{BspTree, BuildNode, BuildSeg, BuildSubsector, BuildVertex};
    use super::super::check::verify;
    use super::super::types::{Child, Linedef, Subsector, VertexRef};
    use super::super::util::child_id;
    use super::patch_linedefs;
    use math::{BoundingBox, Fixed};

    fn vertex(x: i32, y: i32) -> BuildVertex {
        BuildVertex {
            x: Fixed::from_int(x),
            y: Fixed::from_int(y),
        }
    }

    fn seg(v1: usize, v2: usize, linedef: usize, plane: usize) -> BuildSeg {
        BuildSeg {
            v1,
            v2,
            linedef: Some(linedef),
            sidedef: Some(linedef),
            front_sector: Some(0),
            back_sector: None,
            partner: None,
            plane,
            plane_front: true,
        }
    }

    fn gl_tree(
        vertices: Vec<BuildVertex>,
        segs: Vec<BuildSeg>,
        subsectors: Vec<BuildSubsector>,
    ) -> BspTree {
        let seg_list = (0..segs.len()).collect();
        BspTree {
            vertices,
            segs,
            seg_list,
            subsectors,
            nodes: vec![],
            gl_nodes: true,
        }
    }

    fn quad_tree() -> BspTree {
        gl_tree(
            vec![vertex(0, 0), vertex(64, 0), vertex(64, 64), vertex(0, 64)],
            vec![seg(0, 1, 0, 0), seg(1, 2, 1, 1), seg(2, 3, 2, 2), seg(3, 0, 3, 3)],
            vec![BuildSubsector {
                first_line: 0,
                num_lines: 4,
            }],
        )
    }

    #[test]
    fn closes_a_quad_without_connecting_segs() {
        let tree = quad_tree();
        let geometry = tree.extract(&mut []);

        assert_eq!(geometry.segs.len(), 4);
        assert_eq!(
            geometry.subsectors,
            vec![Subsector {
                first_line: 0,
                num_lines: 4,
                poly: None,
            }]
        );
        for (i, seg) in geometry.segs.iter().enumerate() {
            assert_eq!(seg.linedef, Some(i));
            assert!(!seg.poly_seg);
        }
        for (build, out) in tree.vertices.iter().zip(&geometry.vertices) {
            assert_eq!((build.x, build.y), (out.x, out.y));
        }
        verify(&geometry).unwrap();
    }

    #[test]
    fn bridges_a_gap_with_one_connecting_seg() {
        // Two chained segs, then one whose start vertex does not continue
        // the chain.
        let tree = gl_tree(
            vec![vertex(0, 0), vertex(64, 0), vertex(64, 64), vertex(0, 64)],
            vec![seg(0, 1, 0, 0), seg(1, 2, 1, 1), seg(3, 0, 2, 2)],
            vec![BuildSubsector {
                first_line: 0,
                num_lines: 3,
            }],
        );
        let geometry = tree.extract(&mut []);

        assert_eq!(geometry.segs.len(), 4);
        let connecting: Vec<_> = geometry
            .segs
            .iter()
            .filter(|seg| seg.linedef.is_none())
            .collect();
        assert_eq!(connecting.len(), 1);
        assert_eq!((connecting[0].v1, connecting[0].v2), (2, 3));
        assert_eq!(connecting[0].front_sector, None);
        assert_eq!(connecting[0].back_sector, None);
        assert_eq!(connecting[0].partner, None);
        verify(&geometry).unwrap();
    }

    #[test]
    fn orders_a_degenerate_subsector() {
        // Five collinear segs along y = 0: out along one side of the shared
        // line, back along the other.
        let mut segs = vec![
            seg(0, 1, 0, 9),
            seg(1, 2, 1, 9),
            seg(2, 3, 2, 9),
            seg(3, 4, 3, 9),
            seg(4, 0, 4, 9),
        ];
        segs[4].plane_front = false;
        let tree = gl_tree(
            vec![
                vertex(0, 0),
                vertex(16, 0),
                vertex(32, 0),
                vertex(48, 0),
                vertex(64, 0),
            ],
            segs,
            vec![BuildSubsector {
                first_line: 0,
                num_lines: 5,
            }],
        );
        let geometry = tree.extract(&mut []);

        assert_eq!(geometry.segs.len(), 5);
        let mut linedefs: Vec<_> = geometry.segs.iter().map(|seg| seg.linedef).collect();
        linedefs.sort();
        assert_eq!(
            linedefs,
            vec![Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
        verify(&geometry).unwrap();
    }

    #[test]
    fn bridges_gaps_in_a_degenerate_subsector() {
        let mut segs = vec![seg(0, 1, 0, 7), seg(2, 3, 1, 7), seg(3, 0, 2, 7)];
        segs[2].plane_front = false;
        let tree = gl_tree(
            vec![vertex(0, 0), vertex(16, 0), vertex(32, 0), vertex(48, 0)],
            segs,
            vec![BuildSubsector {
                first_line: 0,
                num_lines: 3,
            }],
        );
        let geometry = tree.extract(&mut []);

        assert_eq!(geometry.segs.len(), 4);
        let connecting: Vec<_> = geometry
            .segs
            .iter()
            .filter(|seg| seg.linedef.is_none())
            .collect();
        assert_eq!(connecting.len(), 1);
        assert_eq!((connecting[0].v1, connecting[0].v2), (1, 2));
        verify(&geometry).unwrap();
    }

    #[test]
    fn mapless_seg_loses_sidedef_but_keeps_sectors() {
        let mut tree = quad_tree();
        tree.segs[1].linedef = None;
        tree.segs[1].sidedef = Some(3);
        tree.segs[1].front_sector = Some(1);
        tree.segs[1].back_sector = Some(2);
        let geometry = tree.extract(&mut []);

        let seg = geometry
            .segs
            .iter()
            .find(|seg| (seg.v1, seg.v2) == (1, 2))
            .unwrap();
        assert_eq!(seg.linedef, None);
        assert_eq!(seg.sidedef, None);
        assert_eq!(seg.front_sector, Some(1));
        assert_eq!(seg.back_sector, Some(2));
    }

    #[test]
    fn resolves_partner_links_across_subsectors() {
        // Two squares sharing the edge between vertices 1 and 2; the shared
        // edge's two segs are partners and live in different subsectors, so
        // the second one is not yet emitted when the first is pushed.
        let vertices = vec![
            vertex(0, 0),
            vertex(64, 0),
            vertex(64, 64),
            vertex(0, 64),
            vertex(128, 0),
            vertex(128, 64),
        ];
        let mut segs = vec![
            seg(0, 1, 0, 0),
            seg(1, 2, 1, 1),
            seg(2, 3, 2, 2),
            seg(3, 0, 3, 3),
            seg(1, 4, 4, 4),
            seg(4, 5, 5, 5),
            seg(5, 2, 6, 6),
            seg(2, 1, 1, 1),
        ];
        segs[1].partner = Some(7);
        segs[7].partner = Some(1);
        segs[7].plane_front = false;
        let tree = gl_tree(
            vertices,
            segs,
            vec![
                BuildSubsector {
                    first_line: 0,
                    num_lines: 4,
                },
                BuildSubsector {
                    first_line: 4,
                    num_lines: 4,
                },
            ],
        );
        let geometry = tree.extract(&mut []);

        assert_eq!(geometry.segs.len(), 8);
        let right = geometry
            .segs
            .iter()
            .position(|seg| (seg.v1, seg.v2) == (1, 2))
            .unwrap();
        let left = geometry
            .segs
            .iter()
            .position(|seg| (seg.v1, seg.v2) == (2, 1))
            .unwrap();
        assert_eq!(geometry.segs[right].partner, Some(left));
        assert_eq!(geometry.segs[left].partner, Some(right));
        verify(&geometry).unwrap();
    }

    #[test]
    fn resolves_tagged_node_children() {
        let mut tree = quad_tree();
        tree.nodes = vec![BuildNode {
            x: Fixed::from_int(64),
            y: Fixed::from_int(0),
            dx: Fixed::from_int(0),
            dy: Fixed::from_int(64),
            bbox: [BoundingBox::default(), BoundingBox::default()],
            children: [child_id(3, true), child_id(1, false)],
        }];
        let geometry = tree.extract(&mut []);

        assert_eq!(geometry.nodes.len(), 1);
        let node = &geometry.nodes[0];
        assert_eq!(node.children, [Child::Subsector(3), Child::Node(1)]);
        assert_eq!((node.x, node.dy), (Fixed::from_int(64), Fixed::from_int(64)));
    }

    #[test]
    fn single_seg_subsector_closes_on_itself() {
        let tree = gl_tree(
            vec![vertex(0, 0), vertex(64, 0)],
            vec![seg(0, 1, 0, 0)],
            vec![BuildSubsector {
                first_line: 0,
                num_lines: 1,
            }],
        );
        let geometry = tree.extract(&mut []);

        assert_eq!(geometry.segs.len(), 2);
        assert_eq!(geometry.segs[1].linedef, None);
        assert_eq!((geometry.segs[1].v1, geometry.segs[1].v2), (1, 0));
        verify(&geometry).unwrap();
    }

    #[test]
    fn plain_path_translates_segs_directly() {
        let mut tree = quad_tree();
        tree.gl_nodes = false;
        tree.segs[2].partner = Some(1);
        let geometry = tree.extract(&mut []);

        assert_eq!(geometry.segs.len(), tree.segs.len());
        for (build, out) in tree.segs.iter().zip(&geometry.segs) {
            assert_eq!((build.v1, build.v2), (out.v1, out.v2));
            assert_eq!(build.linedef, out.linedef);
            assert_eq!(build.sidedef, out.sidedef);
            assert_eq!(build.front_sector, out.front_sector);
            assert_eq!(out.partner, None);
            assert!(!out.poly_seg);
        }
        assert_eq!(
            geometry.subsectors,
            vec![Subsector {
                first_line: 0,
                num_lines: 4,
                poly: None,
            }]
        );
    }

    #[test]
    fn rebinds_linedef_endpoints() {
        let tree = quad_tree();
        let mut lines = vec![
            Linedef {
                v1: VertexRef::Build(0),
                v2: VertexRef::Build(1),
            },
            Linedef {
                v1: VertexRef::Build(3),
                v2: VertexRef::Build(2),
            },
        ];
        let geometry = tree.extract(&mut lines);

        assert_eq!(lines[0].v1, VertexRef::Level(0));
        assert_eq!(lines[0].v2, VertexRef::Level(1));
        assert_eq!(lines[1].v1, VertexRef::Level(3));
        assert_eq!(lines[1].v2, VertexRef::Level(2));

        // Patching again leaves resolved references alone.
        patch_linedefs(&mut lines, &geometry.vertices);
        assert_eq!(lines[0].v1, VertexRef::Level(0));
    }
}
