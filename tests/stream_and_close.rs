//! End-to-end streaming: cells in, closed graph and skeleton out.

use proptest::prelude::*;
use reeb_graph::prelude::*;

fn assert_arcs_monotone(g: &ReebGraph) {
    for a in g.arc_ids() {
        let low = g.low_node(a).unwrap();
        let high = g.high_node(a).unwrap();
        let (lv, hv) = (g.scalar_value(low).unwrap(), g.scalar_value(high).unwrap());
        assert!(
            lv < hv || (lv == hv && g.vertex_id(low).unwrap() < g.vertex_id(high).unwrap()),
            "arc {a} is not ascending"
        );
    }
}

#[test]
fn single_triangle_end_to_end() {
    let mut g = ReebGraph::new();
    g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
    g.close_stream();

    assert_eq!(g.num_nodes(), 3);
    assert_eq!(g.num_arcs(), 2);
    assert_eq!(g.num_loops(), 0);
    assert_eq!(g.num_connected_components(), 1);
    assert_arcs_monotone(&g);
    g.debug_validate();

    let skeleton = g.skeleton();
    assert_eq!(skeleton.num_arcs(), 1);
    assert_eq!(skeleton.arc_endpoints(&skeleton.arcs[0]), (0, 2));
    assert_eq!(skeleton.arcs[0].interior, vec![1]);
}

#[test]
fn tetrahedron_boundary_is_a_sphere() {
    // The four faces of one tetrahedron bound a topological sphere: one
    // component, no loops.
    let values = [0.0, 1.0, 2.0, 3.0];
    let faces = [[0u64, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    let mut g = ReebGraph::new();
    for f in faces {
        g.stream_triangle(
            f[0],
            values[f[0] as usize],
            f[1],
            values[f[1] as usize],
            f[2],
            values[f[2] as usize],
        )
        .unwrap();
    }
    g.close_stream();

    assert_eq!(g.num_loops(), 0);
    assert_eq!(g.num_connected_components(), 1);
    assert_arcs_monotone(&g);
    g.debug_validate();
}

#[test]
fn solid_tetrahedron_matches_its_boundary_topology() {
    let mut g = ReebGraph::new();
    g.stream_tetrahedron(0, 0.0, 1, 1.0, 2, 2.0, 3, 3.0).unwrap();
    g.close_stream();
    assert_eq!(g.num_loops(), 0);
    assert_eq!(g.num_connected_components(), 1);
    g.debug_validate();
}

#[test]
fn disconnected_components_are_counted() {
    let mut g = ReebGraph::new();
    g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
    g.stream_triangle(10, 5.0, 11, 6.0, 12, 7.0).unwrap();
    g.close_stream();
    assert_eq!(g.num_connected_components(), 2);
    assert_eq!(g.num_loops(), 0);
}

#[test]
fn streaming_after_close_fails() {
    let mut g = ReebGraph::new();
    g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
    g.close_stream();
    assert_eq!(
        g.stream_triangle(3, 0.0, 4, 1.0, 5, 2.0),
        Err(ReebGraphError::StreamClosed)
    );
    assert_eq!(
        g.stream_tetrahedron(3, 0.0, 4, 1.0, 5, 2.0, 6, 3.0),
        Err(ReebGraphError::StreamClosed)
    );
}

#[test]
fn build_equals_streaming_topologically() {
    // The build driver finalizes vertices early, absorbing regular nodes
    // in-stream; loop and component counts must not change.
    let mut mesh = TriangleMesh::new();
    mesh.push(0, 1, 2);
    mesh.push(1, 2, 3);
    mesh.push(2, 3, 4);
    let field = VertexScalars(vec![0.0, 1.0, 2.0, 3.0, 4.0]);

    let mut built = ReebGraph::new();
    built.build(&mesh, &field).unwrap();

    let mut streamed = ReebGraph::new();
    streamed.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
    streamed.stream_triangle(1, 1.0, 2, 2.0, 3, 3.0).unwrap();
    streamed.stream_triangle(2, 2.0, 3, 3.0, 4, 4.0).unwrap();
    streamed.close_stream();

    assert_eq!(built.num_loops(), streamed.num_loops());
    assert_eq!(
        built.num_connected_components(),
        streamed.num_connected_components()
    );
    built.debug_validate();
    streamed.debug_validate();
}

#[test]
fn clone_is_independent() {
    let mut g = ReebGraph::new();
    g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
    let mut copy = g.clone();
    copy.stream_triangle(2, 2.0, 3, 3.0, 4, 4.0).unwrap();
    assert_eq!(g.num_nodes(), 3);
    assert_eq!(copy.num_nodes(), 5);
}

proptest! {
    #[test]
    fn streamed_fans_keep_invariants(values in prop::collection::vec(-100.0f64..100.0, 3..24)) {
        let mut g = ReebGraph::new();
        for (i, w) in values.windows(3).enumerate() {
            let v = i as u64;
            g.stream_triangle(v, w[0], v + 1, w[1], v + 2, w[2]).unwrap();
        }
        g.close_stream();
        prop_assert_eq!(g.num_nodes(), values.len());
        prop_assert_eq!(g.num_connected_components(), 1);
        assert_arcs_monotone(&g);
        g.debug_validate();
    }
}
