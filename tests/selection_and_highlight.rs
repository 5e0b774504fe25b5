use flow_atlas::catalog::{FlowRecord, ProcessStep, StepType};
use flow_atlas::graph::{DisplayMode, GraphModel, build_graph};
use flow_atlas::highlight::{self, Emphasis, HighlightState};
use flow_atlas::interaction::{InteractionController, Selection, SelectionEvent};
use pretty_assertions::assert_eq;

fn flows() -> Vec<FlowRecord> {
    vec![
        FlowRecord::new("F1", "SYS-A", "SYS-B", "NOMINT")
            .with_step(ProcessStep::new(StepType::Delivery, "IF-1"))
            .with_step(ProcessStep::new(StepType::Reception, "IF-2")),
        FlowRecord::new("F2", "SYS-B", "SYS-C", "APERAK")
            .with_step(ProcessStep::new(StepType::Delivery, "IF-3")),
    ]
}

fn model(mode: DisplayMode) -> GraphModel {
    build_graph(&flows(), &[], mode)
}

#[test]
fn flow_focus_covers_its_route_and_nothing_else() {
    for mode in [DisplayMode::Overview, DisplayMode::Technical] {
        let model = model(mode);
        let state = highlight::focus(&model, Some("flow-F1"));

        for edge in model.edges() {
            let highlighted = state.highlighted_edges().contains(&edge.id);
            if edge.belongs_to_flow("F1") {
                assert!(highlighted, "{} should be highlighted in {mode:?}", edge.id);
            }
            if edge.belongs_to_flow("F2") {
                assert!(!highlighted, "{} leaked into F1's highlight in {mode:?}", edge.id);
            }
        }
        assert_eq!(state.node_emphasis("flow-F1"), Emphasis::Selected);
    }
}

#[test]
fn technical_flow_focus_reaches_both_systems() {
    let model = model(DisplayMode::Technical);
    let state = highlight::focus(&model, Some("flow-F1"));

    for id in ["SYS-A", "IF-1", "IF-2", "SYS-B"] {
        assert_eq!(state.node_emphasis(id), Emphasis::Connected, "{id}");
    }
    assert_eq!(state.node_emphasis("SYS-C"), Emphasis::Dimmed);
    assert_eq!(state.node_emphasis("IF-3"), Emphasis::Dimmed);
}

#[test]
fn clearing_focus_leaves_no_residue() {
    let model = model(DisplayMode::Overview);
    let focused = highlight::focus(&model, Some("SYS-B"));
    assert!(focused.is_active());

    let cleared = highlight::focus(&model, None);
    assert_eq!(cleared, HighlightState::default());
    for node in model.nodes() {
        assert_eq!(cleared.node_emphasis(node.id()), Emphasis::Neutral);
    }
    for edge in model.edges() {
        assert_eq!(cleared.edge_emphasis(&edge.id), Emphasis::Neutral);
    }
}

#[test]
fn refocusing_replaces_the_previous_highlight() {
    let model = model(DisplayMode::Overview);
    let _ = highlight::focus(&model, Some("SYS-A"));
    let again = highlight::focus(&model, Some("SYS-C"));

    assert_eq!(again, highlight::focus(&model, Some("SYS-C")));
    assert_eq!(again.node_emphasis("SYS-A"), Emphasis::Dimmed);
}

#[test]
fn system_then_system_leaves_no_flow_selected() {
    let model = model(DisplayMode::Overview);
    let mut controller = InteractionController::default();

    controller.click(&model, "flow-F1");
    assert_eq!(controller.selection(), &Selection::flow("F1"));

    let events = controller.click(&model, "SYS-A");
    assert_eq!(
        events,
        vec![
            SelectionEvent::SelectFlow(None),
            SelectionEvent::SelectSystem(Some("SYS-A".to_owned())),
        ]
    );

    controller.click(&model, "SYS-B");
    assert_eq!(controller.selection(), &Selection::system("SYS-B"));
}

#[test]
fn selecting_a_flow_clears_the_system() {
    let model = model(DisplayMode::Technical);
    let mut controller = InteractionController::default();

    controller.click(&model, "SYS-A");
    let events = controller.click(&model, "flow-F2");
    assert_eq!(
        events,
        vec![
            SelectionEvent::SelectSystem(None),
            SelectionEvent::SelectFlow(Some("F2".to_owned())),
        ]
    );
    assert_eq!(controller.selection(), &Selection::flow("F2"));
}

#[test]
fn clicking_the_focused_node_again_clears_it() {
    let model = model(DisplayMode::Overview);
    let mut controller = InteractionController::default();

    controller.click(&model, "SYS-C");
    let events = controller.click(&model, "SYS-C");
    assert_eq!(events, vec![SelectionEvent::SelectSystem(None)]);
    assert_eq!(controller.focus(), None);
    assert!(controller.selection().is_empty());
}

#[test]
fn filtered_out_flow_regains_highlight_when_restored() {
    let full = model(DisplayMode::Overview);
    let filtered = build_graph(&flows()[1..], &[], DisplayMode::Overview);
    let mut controller = InteractionController::default();
    controller.sync_external(&full, &Selection::flow("F1"));

    controller.sync_external(&filtered, &Selection::flow("F1"));
    controller.retain_focus(&filtered);
    let hidden = highlight::focus(&filtered, controller.highlight_target());
    assert!(!hidden.is_active());

    controller.sync_external(&full, &Selection::flow("F1"));
    controller.retain_focus(&full);
    let restored = highlight::focus(&full, controller.highlight_target());
    assert_eq!(restored.node_emphasis("flow-F1"), Emphasis::Selected);
    assert_eq!(controller.selection(), &Selection::flow("F1"));
}
