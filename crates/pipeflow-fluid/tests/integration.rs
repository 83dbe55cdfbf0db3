//! End-to-end tests: pipe nodes laid out in a block region, stepped through
//! a shared pipeline with listeners that behave like real pipe types.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use pipeflow_core::direction::{Direction, DirectionSet};
use pipeflow_core::id::NodeId;
use pipeflow_core::test_utils::*;
use pipeflow_core::world::{BlockAccess, BlockPos, BuildableRegion};
use pipeflow_fluid::*;

// ===========================================================================
// Helpers
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Air,
    Pipe,
    Tank,
}

/// Sides of `pos` that touch something able to hold fluid.
fn connected_sides(world: &impl BlockAccess<BlockState = Block>, pos: BlockPos) -> DirectionSet {
    Direction::ALL
        .into_iter()
        .filter(|&d| world.block_state(pos.offset(d)) != Block::Air)
        .collect()
}

fn pipe_at(world: &MemoryRegion<Block>, node: NodeId, pos: BlockPos, config: &FlowConfig) -> PipeNode {
    let mut pipe = PipeNode::new(
        NodeContext { node, pos },
        FlowContext::from_config(config),
        water(),
    );
    pipe.set_connected(connected_sides(world, pos));
    pipe
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn straight_run_delivers_towards_the_tank() {
    let mut world = MemoryRegion::new(Block::Air);
    let pos = BlockPos::new(0, 64, 0);
    world.set_block_state(pos, Block::Pipe, None);
    world.set_block_state(pos.offset(Direction::West), Block::Pipe, None);
    world.set_block_state(pos.offset(Direction::East), Block::Tank, None);

    let config = FlowConfig::default();
    let mut pipeline = FlowPipeline::from_config(&config);
    let mut pipe = pipe_at(&world, make_node_id(), pos, &config);
    assert_eq!(
        pipe.connected(),
        [Direction::West, Direction::East].into_iter().collect::<DirectionSet>()
    );

    // Wooden-pipe style: never push back towards the source.
    pipeline.listeners_mut().on_side_check(|event| {
        event.sides_mut().disallow(&[Direction::West]);
    });

    let mut delivered = 0;
    for _ in 0..10 {
        pipe.step(&mut pipeline, Direction::West, 10).unwrap();
        delivered += pipe.drain_section(Direction::East, u32::MAX).amount;
    }
    // The first step only fills the west section.
    assert_eq!(delivered, 90);
    assert_eq!(pipe.total() + u64::from(delivered), 100);
}

#[test]
fn filter_listener_rejects_other_fluids() {
    let config = FlowConfig::default();
    let mut pipeline = FlowPipeline::from_config(&config);
    pipeline.listeners_mut().on_try_insert(|event| {
        if event.fluid().kind == water() {
            InsertVerdict::Accept
        } else {
            InsertVerdict::Reject
        }
    });

    let node = NodeContext {
        node: make_node_id(),
        pos: BlockPos::ORIGIN,
    };
    let request = |kind| FlowRequest {
        node,
        flow: FlowContext::from_config(&config),
        from: Direction::Up,
        fluid: stack(kind, 20),
        connected: DirectionSet::ALL,
        total_offered: [0; 6],
        centre_space: 100,
    };

    assert!(!pipeline.run(request(water())).unwrap().is_cancelled());
    assert!(pipeline.run(request(lava())).unwrap().is_cancelled());
    assert!(pipeline.run(request(oil())).unwrap().is_cancelled());
}

#[test]
fn iron_pipe_style_single_output() {
    let config = FlowConfig {
        seed: 99,
        ..FlowConfig::default()
    };
    let mut pipeline = FlowPipeline::from_config(&config);
    pipeline
        .listeners_mut()
        .on_side_check(|event| event.sides_mut().disallow_all_except(Direction::Down));

    let world = MemoryRegion::new(Block::Pipe);
    let mut pipe = pipe_at(&world, make_node_id(), BlockPos::ORIGIN, &config);
    pipe.fill_section(Direction::North, 30);

    for _ in 0..3 {
        let summary = pipe.step(&mut pipeline, Direction::North, 0).unwrap();
        assert_eq!(summary.destinations, vec![Direction::Down]);
    }
    assert_eq!(pipe.section(Direction::Down), 30);
    assert_eq!(pipe.section(Direction::North), 0);
}

#[test]
fn listeners_see_node_context() {
    let seen: Rc<RefCell<BTreeMap<BlockPos, u32>>> = Rc::default();
    let mut pipeline = FlowPipeline::new(1);
    let log = seen.clone();
    pipeline.listeners_mut().on_pre_move_to_centre(move |event| {
        log.borrow_mut()
            .insert(event.base().node.pos, event.fluid().amount);
    });

    let world = MemoryRegion::new(Block::Pipe);
    let config = FlowConfig::default();
    let ids = make_node_ids(3);
    for (i, &id) in ids.iter().enumerate() {
        let pos = BlockPos::new(i as i32, 0, 0);
        let mut pipe = pipe_at(&world, id, pos, &config);
        pipe.fill_section(Direction::Up, 3 * (i as u32 + 1));
        pipe.step(&mut pipeline, Direction::Up, 0).unwrap();
    }

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[&BlockPos::new(2, 0, 0)], 9);
}

#[test]
fn faulty_listener_stops_the_node_and_reports_the_stage() {
    let mut pipeline = FlowPipeline::new(1);
    pipeline.set_log_violations(false);
    pipeline.listeners_mut().on_move_to_centre(|event| {
        let i = Direction::South.index();
        event.fluid_entering_centre_mut()[i] += 1;
    });

    let world = MemoryRegion::new(Block::Pipe);
    let mut pipe = pipe_at(&world, make_node_id(), BlockPos::ORIGIN, &FlowConfig::default());
    pipe.fill_section(Direction::South, 5);
    let before = pipe.clone();

    let err = pipe.step(&mut pipeline, Direction::South, 5).unwrap_err();
    match &err {
        FlowError::Integrity { stage, node, .. } => {
            assert_eq!(*stage, StageKind::OnMoveToCentre);
            assert_eq!(*node, before.context().node);
        }
    }
    assert!(err.to_string().contains("fluidEnteringCentre[3](=6)"));
    assert_eq!(pipe, before);
}

#[test]
fn priorities_steer_between_outputs() {
    let mut pipeline = FlowPipeline::new(11);
    pipeline.listeners_mut().on_side_check(|event| {
        event.sides_mut().disallow(&[Direction::Up]);
        event.sides_mut().increase_priority_by(Direction::East, 2);
        event.sides_mut().increase_priority_by(Direction::South, 2);
    });
    pipeline.listeners_mut().on_side_check_with_priority(ListenerPriority::Post, |event| {
        // Runs last: the best tier is still East and South.
        let best = event.sides().highest_priority_allowed();
        assert_eq!(
            best,
            [Direction::South, Direction::East].into_iter().collect::<DirectionSet>()
        );
    });

    let world = MemoryRegion::new(Block::Pipe);
    let mut pipe = pipe_at(&world, make_node_id(), BlockPos::ORIGIN, &FlowConfig::default());
    pipe.fill_section(Direction::Up, 10);
    let summary = pipe.step(&mut pipeline, Direction::Up, 0).unwrap();

    let mut destinations = summary.destinations.clone();
    destinations.sort();
    assert_eq!(destinations, vec![Direction::South, Direction::East]);
    assert_eq!(summary.total_pushed(), 10);
    assert_eq!(pipe.section(Direction::South) + pipe.section(Direction::East), 10);
}
