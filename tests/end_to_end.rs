use std::cell::RefCell;
use std::rc::Rc;

use commit_constellation::data::{
    DataProvider, DataSet, JsonFileProvider, RelationshipRecord, RepositoryRecord, StaticProvider,
    UserRecord, fetch_all,
};
use commit_constellation::graph::{NodeKind, build_from};
use commit_constellation::interaction::DragController;
use commit_constellation::physics::{Simulation, SimulationConfig, SimulationState};
use commit_constellation::render::{EdgeView, Emphasis, NodeView, Renderer, Scene};
use commit_constellation::scale::scale;
use commit_constellation::style::{GraphStyle, StyleConfig};
use eframe::egui::vec2;

fn config() -> SimulationConfig {
    SimulationConfig {
        max_duration_secs: None,
        ..SimulationConfig::default()
    }
}

#[test]
fn single_relationship_scenario() {
    let data = DataSet {
        repositories: vec![RepositoryRecord {
            name: "r1".to_owned(),
            commit_count: 10,
        }],
        users: vec![UserRecord {
            hashed_email: "u1".to_owned(),
            name: "n1".to_owned(),
            commit_count: 5,
            any_commit_reference: None,
        }],
        relationships: vec![RelationshipRecord {
            repository_id: "r1".to_owned(),
            user_hashed_email: "u1".to_owned(),
            user_name: "n1".to_owned(),
            commit_count: 5,
        }],
    };
    let provider = StaticProvider::new(data);
    let graph = build_from(&fetch_all(&provider).expect("complete data")).expect("graph");

    let ids = graph
        .nodes()
        .iter()
        .map(|node| node.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, ["r1", "u1n1"]);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.edges()[0].source, "r1");
    assert_eq!(graph.edges()[0].target, "u1n1");
    assert_eq!(scale(&[5.0], 5.0, 15.0, 4.0), 15.0);

    let style = GraphStyle::compute(&graph, &StyleConfig::default());
    let mut simulation =
        Simulation::for_graph(&graph, &style.radii(), config()).expect("valid graph");
    assert_eq!(simulation.run_until_settled(), SimulationState::Converged);

    let r1 = simulation.position("r1").expect("r1");
    let u1 = simulation.position("u1n1").expect("u1n1");
    let rest = 30.0 + style.nodes[0].radius + style.nodes[1].radius;
    let distance = (r1 - u1).length();
    assert!(
        (distance - rest).abs() < rest * 0.5,
        "distance {distance}, rest length {rest}"
    );
}

#[derive(Default)]
struct FrameCounter {
    frames: usize,
    nodes: usize,
    edges: usize,
}

impl Renderer for FrameCounter {
    fn render(&mut self, nodes: &[NodeView<'_>], edges: &[EdgeView<'_>]) {
        self.frames += 1;
        self.nodes = nodes.len();
        self.edges = edges.len();
    }
}

#[test]
fn sample_data_settles_and_renders() {
    let provider = StaticProvider::sample();
    let graph = build_from(&fetch_all(&provider).expect("sample data")).expect("graph");
    assert_eq!(graph.report().dropped_relationships, 1);
    assert!(
        graph
            .edges()
            .iter()
            .all(|edge| graph.node(&edge.source).is_some() && graph.node(&edge.target).is_some())
    );

    let style = GraphStyle::compute(&graph, &StyleConfig::default());
    let mut simulation =
        Simulation::for_graph(&graph, &style.radii(), config()).expect("valid graph");
    let published = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&published);
    simulation.subscribe(move |_| *counter.borrow_mut() += 1);

    assert_eq!(simulation.run_until_settled(), SimulationState::Converged);
    assert_eq!(*published.borrow(), simulation.stats().step);

    let scene = Scene::new(graph, style);
    let mut renderer = FrameCounter::default();
    scene.render(&mut renderer, &simulation.snapshot(), Emphasis::default());
    assert_eq!(renderer.frames, 1);
    assert_eq!(renderer.nodes, scene.graph().node_count());
    assert_eq!(renderer.edges, scene.graph().edge_count());
}

#[test]
fn dragging_a_settled_layout_moves_neighbours() {
    let provider = StaticProvider::sample();
    let graph = build_from(&fetch_all(&provider).expect("sample data")).expect("graph");
    let style = GraphStyle::compute(&graph, &StyleConfig::default());
    let mut simulation =
        Simulation::for_graph(&graph, &style.radii(), config()).expect("valid graph");
    simulation.run_until_settled();

    let repository = graph
        .nodes()
        .iter()
        .find(|node| node.kind == NodeKind::Repository)
        .expect("repository");
    let neighbour = graph
        .neighbors(&repository.id)
        .into_iter()
        .next()
        .expect("connected repository")
        .to_owned();
    let before = simulation.position(&neighbour).expect("neighbour");

    let mut drag = DragController::new();
    assert!(drag.on_drag_start(&mut simulation, &repository.id));
    let target = simulation.position(&repository.id).expect("repository") + vec2(250.0, 0.0);
    drag.on_drag_move(&mut simulation, &repository.id, target);
    for _ in 0..60 {
        simulation.step();
    }
    assert_eq!(simulation.position(&repository.id), Some(target));
    let after = simulation.position(&neighbour).expect("neighbour");
    assert!((after - target).length() < (before - target).length());

    drag.on_drag_end(&mut simulation, &repository.id);
    assert_eq!(simulation.run_until_settled(), SimulationState::Converged);
}

#[test]
fn json_document_flows_through_the_pipeline() {
    let provider = JsonFileProvider::from_json_str(
        r#"{
            "repositories": [{"name": "octo/app", "n_commits": 120}, {"name": 7}],
            "users": [{"hashed_email": "9f", "name": "Rae", "n_commits": 120, "any_commit_url": "c/1"}],
            "relationships": [
                {"repository_name": "octo/app", "user_hashed_email": "9f", "user_name": "Rae", "n_commits": 120},
                {"repository_name": "octo/gone", "user_hashed_email": "9f", "user_name": "Rae", "n_commits": 3}
            ],
            "profiles": {"c/1": {"author": {"html_url": "https://github.com/rae"}}}
        }"#,
    )
    .expect("valid document");
    assert_eq!(provider.skipped_records(), 1);

    let graph = build_from(&fetch_all(&provider).expect("complete data")).expect("graph");
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.report().dropped_relationships, 1);

    let user = graph.node("9fRae").expect("user node");
    let reference = user.commit_reference.as_deref().expect("commit reference");
    let profile = provider.resolve_profile(reference).expect("profile");
    assert_eq!(profile.profile_url, "https://github.com/rae");
}
